use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::responses::{RefreshTokenResponse, UserInfoResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::utils::jwt::{self, JwtUtils};

use super::AuthService;

fn expired_response() -> HttpResponse {
    // 清除无效的 refresh token cookie
    HttpResponse::Unauthorized()
        .cookie(JwtUtils::create_empty_refresh_token_cookie())
        .json(ApiResponse::error_empty(
            ErrorCode::RefreshTokenInvalid,
            "Login expired or invalid, please login again",
        ))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();
    let Some(refresh_token) = jwt::JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let user_id = match JwtUtils::verify_refresh_token(&refresh_token)
        .and_then(|claims| claims.user_id())
    {
        Ok(id) => id,
        Err(e) => {
            tracing::info!("Refresh token rejected: {}", e);
            return Ok(expired_response());
        }
    };

    // 以当前角色签发，角色变更或账号删除后旧的 refresh token 不再有效
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(expired_response()),
        Err(e) => {
            tracing::error!("Failed to load user {} for refresh: {}", user_id, e);
            return Ok(ApiResponse::from_error(&e));
        }
    };

    match JwtUtils::generate_access_token(user.id, user.role.as_str()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            tracing::error!("Failed to generate access token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to generate token",
                )),
            )
        }
    }
}

pub async fn handle_get_user(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match current_user(request) {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserInfoResponse { user },
            "User information retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
