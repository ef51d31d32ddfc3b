use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, account_error_response, load_managed_user};
use crate::models::{ApiResponse, users::responses::UserResponse};
use crate::services::current_user;

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 自己的账号直接返回
    if caller.id == user_id {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user: caller },
            "User retrieved successfully",
        )));
    }

    let storage = service.get_storage(request)?;
    match load_managed_user(storage.as_ref(), &caller, user_id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User retrieved successfully",
        ))),
        Err(e) => Ok(account_error_response(&e)),
    }
}
