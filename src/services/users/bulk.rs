//! 批量创建教师账号
//!
//! 每个地址独立处理，前面成功的账号不会因为后面的失败而回滚。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::{UserService, account_error_response, ensure_can_manage, normalize_email};
use crate::config::{AppConfig, Argon2Config};
use crate::errors::{AttendanceError, Result};
use crate::models::users::{
    entities::{User, UserRole},
    requests::{BulkCreateTeachersRequest, NewUser},
    responses::{BatchItemResult, BatchResultResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::password::hash_password_async;
use crate::utils::validate::{validate_email, validate_password_simple};

/// 按行拆分，去掉空白，丢弃不含 `@` 的行
pub fn parse_bulk_emails(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains('@'))
        .map(normalize_email)
        .collect()
}

/// 邮箱 `@` 之前的部分
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

pub async fn create_teachers(
    storage: &dyn Storage,
    caller: &User,
    req: BulkCreateTeachersRequest,
    argon2: &Argon2Config,
) -> Result<Vec<BatchItemResult>> {
    ensure_can_manage(caller, &UserRole::Teacher)?;
    validate_password_simple(&req.password).map_err(AttendanceError::validation)?;

    let emails = parse_bulk_emails(&req.emails);
    if emails.is_empty() {
        return Err(AttendanceError::validation(
            "No email addresses found in the submitted text",
        ));
    }

    let mut results = Vec::with_capacity(emails.len());
    for email in emails {
        if let Err(msg) = validate_email(&email) {
            results.push(BatchItemResult::failed(email, msg));
            continue;
        }

        let password_hash = match hash_password_async(req.password.clone(), argon2.clone()).await
        {
            Ok(hash) => hash,
            Err(e) => {
                results.push(BatchItemResult::failed(email, e.message()));
                continue;
            }
        };

        let full_name = local_part(&email).to_string();
        match storage
            .create_user(NewUser {
                email: email.clone(),
                full_name,
                password_hash,
                role: UserRole::Teacher,
            })
            .await
        {
            Ok(user) => results.push(BatchItemResult::ok(email, user.id)),
            Err(e) => {
                warn!("Bulk creation of {} failed: {}", email, e);
                results.push(BatchItemResult::failed(email, e.message()));
            }
        }
    }

    Ok(results)
}

pub async fn bulk_create_teachers(
    service: &UserService,
    body: BulkCreateTeachersRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match create_teachers(storage.as_ref(), &caller, body, &AppConfig::get().argon2).await {
        Ok(results) => {
            let response = BatchResultResponse::from(results);
            info!(
                "Bulk teacher creation by {}: {} created, {} failed",
                caller.id, response.success_count, response.failure_count
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                response,
                "Bulk creation finished",
            )))
        }
        Err(AttendanceError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, msg))),
        Err(e) => Ok(account_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{cheap_argon2, fixture};

    #[test]
    fn test_parse_bulk_emails() {
        let text = "  amy@school.test \n\nnot an address\r\nBob@School.Test\n   \n@\n";
        assert_eq!(
            parse_bulk_emails(text),
            vec!["amy@school.test", "bob@school.test", "@"]
        );
        assert!(parse_bulk_emails("").is_empty());
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("amy.lee@school.test"), "amy.lee");
    }

    #[tokio::test]
    async fn test_per_item_results_without_rollback() {
        let f = fixture().await;
        let req = BulkCreateTeachersRequest {
            emails: "amy@school.test\nanna@school.test\nbad@\ncid@school.test".to_string(),
            password: "Passw0rd".to_string(),
        };

        let results = create_teachers(f.storage.as_ref(), &f.admin, req, &cheap_argon2())
            .await
            .unwrap();

        let flags: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        // anna 已存在
        assert!(results[1].error.is_some());

        let amy = f
            .storage
            .get_user_by_email("amy@school.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(amy.full_name, "amy");
        assert_eq!(amy.role, UserRole::Teacher);
        assert_eq!(results[0].user_id, Some(amy.id));
    }

    #[tokio::test]
    async fn test_bulk_requires_teacher_management() {
        let f = fixture().await;
        let req = BulkCreateTeachersRequest {
            emails: "x@school.test".to_string(),
            password: "Passw0rd".to_string(),
        };
        let err = create_teachers(f.storage.as_ref(), &f.principal, req, &cheap_argon2())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_bulk_rejects_empty_text_and_weak_password() {
        let f = fixture().await;
        let empty = BulkCreateTeachersRequest {
            emails: "no addresses here".to_string(),
            password: "Passw0rd".to_string(),
        };
        assert!(matches!(
            create_teachers(f.storage.as_ref(), &f.admin, empty, &cheap_argon2()).await,
            Err(AttendanceError::Validation(_))
        ));

        let weak = BulkCreateTeachersRequest {
            emails: "x@school.test".to_string(),
            password: "short".to_string(),
        };
        assert!(matches!(
            create_teachers(f.storage.as_ref(), &f.admin, weak, &cheap_argon2()).await,
            Err(AttendanceError::Validation(_))
        ));
    }
}
