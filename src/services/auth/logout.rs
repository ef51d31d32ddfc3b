use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::cache::user_cache_key;
use crate::models::ApiResponse;
use crate::services::cache_from_request;
use crate::utils::jwt::JwtUtils;

/// 处理用户登出
///
/// 不要求 access token 仍然有效：用户 ID 从 refresh token 中读取，
/// 以便清除缓存中的用户信息。
pub async fn handle_logout(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let user_id = JwtUtils::extract_refresh_token_from_cookie(request)
        .and_then(|token| JwtUtils::verify_refresh_token(&token).ok())
        .and_then(|claims| claims.user_id().ok());

    if let (Some(user_id), Some(cache)) = (user_id, cache_from_request(request)) {
        cache.remove(&user_cache_key(user_id)).await;
        tracing::debug!("Cleared cached user {}", user_id);
    }

    // max_age=0 会让浏览器删除该 cookie
    let empty_cookie = JwtUtils::create_empty_refresh_token_cookie();

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::<()>::success_empty("Logged out")))
}
