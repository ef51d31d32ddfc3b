use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{
    UserService, account_error_response, ensure_can_manage, forget_cached_user, load_managed_user,
};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::{User, UserRole},
        requests::DeleteUsersQuery,
        responses::{BatchItemResult, BatchResultResponse},
    },
};
use crate::services::current_user;
use crate::storage::Storage;

/// 删除单个账号，不能删除自己
pub async fn remove_account(storage: &dyn Storage, caller: &User, user_id: i64) -> Result<User> {
    if caller.id == user_id {
        return Err(AttendanceError::validation("Cannot delete current user"));
    }
    let target = load_managed_user(storage, caller, user_id).await?;
    if !storage.delete_user(user_id).await? {
        return Err(AttendanceError::not_found(format!("User {user_id} not found")));
    }
    Ok(target)
}

/// 删除某角色的全部账号，逐个记录结果
pub async fn remove_accounts_by_role(
    storage: &dyn Storage,
    caller: &User,
    role: UserRole,
) -> Result<Vec<BatchItemResult>> {
    ensure_can_manage(caller, &role)?;

    let mut results = Vec::new();
    for user in storage.list_users_by_role(role).await? {
        let item = match storage.delete_user(user.id).await {
            Ok(true) => BatchItemResult::ok(user.email, user.id),
            Ok(false) => BatchItemResult::failed(user.email, "User not found"),
            Err(e) => BatchItemResult::failed(user.email, e.message()),
        };
        results.push(item);
    }
    Ok(results)
}

pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match remove_account(storage.as_ref(), &caller, user_id).await {
        Ok(user) => {
            forget_cached_user(request, user_id).await;
            info!("User {} ({}) deleted by {}", user.email, user.role, caller.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Err(AttendanceError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CanNotDeleteCurrentUser, msg))),
        Err(e @ AttendanceError::DatabaseOperation(_)) => {
            error!("User deletion failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(ErrorCode::UserDeleteFailed, e.message())))
        }
        Err(e) => Ok(account_error_response(&e)),
    }
}

pub async fn delete_users_by_role(
    service: &UserService,
    query: DeleteUsersQuery,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match remove_accounts_by_role(storage.as_ref(), &caller, query.role).await {
        Ok(results) => {
            for item in results.iter().filter(|r| r.success) {
                if let Some(id) = item.user_id {
                    forget_cached_user(request, id).await;
                }
            }
            let response = BatchResultResponse::from(results);
            info!(
                "{} {} accounts deleted by {} ({} failed)",
                response.success_count, query.role, caller.id, response.failure_count
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Accounts deleted")))
        }
        Err(e) => {
            if !matches!(e, AttendanceError::Authorization(_)) {
                error!("Bulk deletion of {} accounts failed: {}", query.role, e);
            }
            Ok(account_error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::fixture;

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let f = fixture().await;
        let err = remove_account(f.storage.as_ref(), &f.admin, f.admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_teacher_cascades_assignments() {
        let f = fixture().await;
        remove_account(f.storage.as_ref(), &f.admin, f.teacher.id)
            .await
            .unwrap();

        assert!(f.storage.get_user_by_id(f.teacher.id).await.unwrap().is_none());
        assert!(
            f.storage
                .list_teacher_class_ids(f.teacher.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_delete_checks_management() {
        let f = fixture().await;
        assert!(matches!(
            remove_account(f.storage.as_ref(), &f.admin, f.superadmin.id).await,
            Err(AttendanceError::Authorization(_))
        ));
        assert!(matches!(
            remove_account(f.storage.as_ref(), &f.admin, 777).await,
            Err(AttendanceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_all_teachers() {
        let f = fixture().await;
        let results = remove_accounts_by_role(f.storage.as_ref(), &f.admin, UserRole::Teacher)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert!(
            f.storage
                .list_users_by_role(UserRole::Teacher)
                .await
                .unwrap()
                .is_empty()
        );
        // 其他角色不受影响
        assert!(f.storage.get_user_by_id(f.principal.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_all_principals() {
        let f = fixture().await;
        assert!(matches!(
            remove_accounts_by_role(f.storage.as_ref(), &f.admin, UserRole::Principal).await,
            Err(AttendanceError::Authorization(_))
        ));
    }
}
