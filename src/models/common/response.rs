use actix_web::{HttpResponse, http::StatusCode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::AttendanceError;
use crate::models::ErrorCode;

// 统一的API响应结构
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// 把业务错误转换为带状态码的 HTTP 响应
    pub fn from_error(err: &AttendanceError) -> HttpResponse {
        let code = ErrorCode::from(err);
        let status = match code {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        HttpResponse::build(status).json(Self::error_empty(code, err.message()))
    }
}
