use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{UserService, account_error_response, ensure_can_manage};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    ApiResponse,
    users::{
        entities::User,
        requests::{UserListParams, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::services::current_user;
use crate::storage::Storage;

/// 未指定角色时列出调用者能管理的全部角色
pub async fn list_managed_users(
    storage: &dyn Storage,
    caller: &User,
    params: UserListParams,
) -> Result<UserListResponse> {
    let roles = match params.role {
        Some(role) => {
            ensure_can_manage(caller, &role)?;
            vec![role]
        }
        None => caller.role.managed_roles().to_vec(),
    };
    if roles.is_empty() {
        return Err(AttendanceError::authorization("No manageable accounts"));
    }

    let (page, size) = params.pagination.normalized();
    storage
        .list_users_with_pagination(UserListQuery {
            page,
            size,
            roles,
            search: params.search,
        })
        .await
}

pub async fn list_users(
    service: &UserService,
    query: UserListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match list_managed_users(storage.as_ref(), &caller, query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "User list retrieved successfully",
        ))),
        Err(e) => {
            if !matches!(e, AttendanceError::Authorization(_)) {
                error!("Failed to retrieve user list: {}", e);
            }
            Ok(account_error_response(&e))
        }
    }
}
