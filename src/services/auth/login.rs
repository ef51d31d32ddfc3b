use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
};
use crate::utils::jwt;
use crate::utils::password::verify_password;

use super::AuthService;

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();
    let email = login_request.email.trim().to_lowercase();

    // 1. 根据邮箱获取用户信息
    match storage.get_user_by_email(&email).await {
        Ok(Some(user)) => {
            // 2. 验证密码
            if !verify_password(&login_request.password, &user.password_hash) {
                tracing::info!("Failed login attempt for {}", email);
                return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                    ErrorCode::AuthFailed,
                    "Email or password is incorrect",
                )));
            }

            // 3. 更新最后登录时间
            if let Err(e) = storage.update_last_login(user.id).await {
                tracing::warn!("Failed to update last login for user {}: {}", user.id, e);
            }

            // 4. 生成令牌对
            let remember = login_request.remember_me.then(|| {
                chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry)
            });
            match user.generate_token_pair(remember) {
                Ok(token_pair) => {
                    tracing::info!("User {} ({}) logged in", user.email, user.role);

                    let refresh_cookie = jwt::JwtUtils::create_refresh_token_cookie(
                        &token_pair.refresh_token,
                        login_request.remember_me,
                    );
                    let response = LoginResponse {
                        access_token: token_pair.access_token,
                        expires_in: config.jwt.access_token_expiry * 60, // 转换为秒
                        user,
                    };

                    Ok(HttpResponse::Ok()
                        .cookie(refresh_cookie)
                        .json(ApiResponse::success(response, "Login successful")))
                }
                Err(e) => {
                    tracing::error!("Failed to generate JWT token: {}", e);
                    Ok(
                        HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                            ErrorCode::InternalServerError,
                            "Login failed, unable to generate token",
                        )),
                    )
                }
            }
        }
        Ok(None) => Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Email or password is incorrect",
        ))),
        Err(e) => {
            tracing::error!("Login lookup failed: {}", e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}
