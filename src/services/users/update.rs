use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{
    UserService, account_error_response, forget_cached_user, load_managed_user, normalize_email,
};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::User, requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::validate::{validate_email, validate_full_name};

/// 规范化并校验可编辑字段
fn prepare_update(
    update: UpdateUserRequest,
) -> std::result::Result<UpdateUserRequest, (ErrorCode, &'static str)> {
    let email = update.email.map(|e| normalize_email(&e));
    if let Some(email) = &email {
        validate_email(email).map_err(|m| (ErrorCode::UserEmailInvalid, m))?;
    }
    let full_name = update.full_name.map(|n| n.trim().to_string());
    if let Some(full_name) = &full_name {
        validate_full_name(full_name).map_err(|m| (ErrorCode::UserNameInvalid, m))?;
    }
    Ok(UpdateUserRequest { email, full_name })
}

pub async fn edit_account(
    storage: &dyn Storage,
    caller: &User,
    user_id: i64,
    update: UpdateUserRequest,
) -> Result<User> {
    load_managed_user(storage, caller, user_id).await?;
    storage
        .update_user(user_id, update)
        .await?
        .ok_or_else(|| AttendanceError::not_found(format!("User {user_id} not found")))
}

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let update = match prepare_update(update_data) {
        Ok(update) => update,
        Err((code, msg)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
        }
    };

    let storage = service.get_storage(request)?;
    match edit_account(storage.as_ref(), &caller, user_id, update).await {
        Ok(user) => {
            forget_cached_user(request, user_id).await;
            info!("User {} updated by {}", user_id, caller.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "User updated successfully",
            )))
        }
        Err(e @ AttendanceError::DatabaseOperation(_)) => {
            error!("User update failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(ErrorCode::UserUpdateFailed, e.message())))
        }
        Err(e) => Ok(account_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::fixture;

    fn rename(full_name: &str) -> UpdateUserRequest {
        UpdateUserRequest {
            email: None,
            full_name: Some(full_name.to_string()),
        }
    }

    #[test]
    fn test_prepare_update_normalizes() {
        let update = prepare_update(UpdateUserRequest {
            email: Some(" Anna@School.TEST ".to_string()),
            full_name: Some("  Anna Lee ".to_string()),
        })
        .unwrap();
        assert_eq!(update.email.as_deref(), Some("anna@school.test"));
        assert_eq!(update.full_name.as_deref(), Some("Anna Lee"));

        assert_eq!(
            prepare_update(UpdateUserRequest {
                email: Some("broken".to_string()),
                full_name: None,
            })
            .unwrap_err()
            .0,
            ErrorCode::UserEmailInvalid
        );
    }

    #[tokio::test]
    async fn test_admin_edits_teacher() {
        let f = fixture().await;
        let user = edit_account(f.storage.as_ref(), &f.admin, f.teacher.id, rename("Anna Lee"))
            .await
            .unwrap();
        assert_eq!(user.full_name, "Anna Lee");
        assert_eq!(user.email, f.teacher.email);
    }

    #[tokio::test]
    async fn test_admin_cannot_edit_principal() {
        let f = fixture().await;
        let err = edit_account(f.storage.as_ref(), &f.admin, f.principal.id, rename("X"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_email_collision() {
        let f = fixture().await;
        let err = edit_account(
            f.storage.as_ref(),
            &f.admin,
            f.teacher.id,
            UpdateUserRequest {
                email: Some(f.other_teacher.email.clone()),
                full_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));
    }
}
