pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
#[cfg(test)]
mod testing;
pub mod users;

pub use assignments::AssignmentService;
pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use users::UserService;

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::NaiveDate;

use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub(crate) fn storage_from_request(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Storage not configured"))
}

pub(crate) fn cache_from_request(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

/// RequireJWT 放入请求扩展的当前用户，缺失时给出 401 响应
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        ))
    })
}

/// 学校所在时区的今天
pub fn school_today() -> NaiveDate {
    (chrono::Utc::now() + AppConfig::get().school_offset()).date_naive()
}
