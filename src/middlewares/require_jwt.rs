/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>`，通过后把当前用户放入请求扩展，
 * 处理程序用 [`RequireJWT::extract_user_claims`] 等方法读取。
 *
 * ```rust,ignore
 * web::scope("/api/v1/attendance")
 *     .wrap(RequireJWT)
 *     .route("/today", web::get().to(today));
 * ```
 *
 * 用户信息先查缓存（键为 `user:{id}`），未命中再查存储并回填。
 */

use crate::cache::{CacheResult, ObjectCache, user_cache_key};
use crate::config::AppConfig;
use crate::models::users::entities::User;
use crate::models::ErrorCode;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

// 提取并验证 JWT access token，返回当前用户
async fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<User, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let user_id = claims
        .user_id()
        .map_err(|_| "Invalid user ID in JWT".to_string())?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| "Cache not configured".to_string())?;

    let key = user_cache_key(user_id);
    match cache.get_json::<User>(&key).await {
        CacheResult::Found(user) => return Ok(user),
        CacheResult::ExistsButNoValue => cache.remove(&key).await,
        CacheResult::NotFound => debug!("User {} not found in cache", user_id),
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| "Storage not configured".to_string())?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| "Failed to retrieve user from storage".to_string())?
        .ok_or_else(|| "User not found".to_string())?;

    // 令牌中的角色与当前角色不一致时要求重新登录
    if claims.role != user.role.as_str() {
        return Err("Role changed, please login again".to_string());
    }

    cache
        .insert_json(key, &user, AppConfig::get().cache.default_ttl)
        .await;

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // CORS 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    actix_web::HttpResponse::NoContent()
                        .finish()
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req).await {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 当前用户，只能在 RequireJWT 保护的路由中使用
    pub fn extract_user_claims(req: &HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }
}
