use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError, QueryPayloadError},
};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

/// JSON 请求体解析失败时返回统一格式
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Invalid JSON payload for {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid request body: {err}"),
    ));
    InternalError::from_response(err, response).into()
}

/// 查询参数解析失败时返回统一格式
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Invalid query string for {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid query parameters: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
