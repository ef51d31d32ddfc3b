pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod common;
pub mod dashboard;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

use crate::errors::AttendanceError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// 0 表示成功，1xxx 通用错误，2xxx 认证，3xxx 用户，4xxx 班级与分配，5xxx 考勤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    InternalServerError = 1500,

    AuthFailed = 2000,
    RefreshTokenInvalid = 2001,

    UserNotFound = 3000,
    UserEmailInvalid = 3001,
    UserPasswordInvalid = 3002,
    UserNameInvalid = 3003,
    UserEmailAlreadyExists = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,
    CanNotDeleteCurrentUser = 3008,
    UserRoleNotManageable = 3009,

    ClassNotFound = 4000,
    ClassInvalid = 4001,
    ClassAlreadyExists = 4002,
    ClassPermissionDenied = 4003,
    AssignmentInvalid = 4004,
    InchargeConflict = 4005,

    AttendanceCountInvalid = 5000,
    AttendanceNotIncharge = 5001,
    AttendanceDataIntegrity = 5002,
}

impl From<&AttendanceError> for ErrorCode {
    fn from(err: &AttendanceError) -> Self {
        match err {
            AttendanceError::Validation(_) | AttendanceError::DateParse(_) => ErrorCode::BadRequest,
            AttendanceError::NotFound(_) => ErrorCode::NotFound,
            AttendanceError::Authentication(_) => ErrorCode::Unauthorized,
            AttendanceError::Authorization(_) => ErrorCode::Forbidden,
            AttendanceError::Conflict(_) => ErrorCode::Conflict,
            AttendanceError::DataIntegrity(_) => ErrorCode::AttendanceDataIntegrity,
            AttendanceError::CacheConnection(_)
            | AttendanceError::CachePluginNotFound(_)
            | AttendanceError::DatabaseConfig(_)
            | AttendanceError::DatabaseConnection(_)
            | AttendanceError::DatabaseOperation(_)
            | AttendanceError::FileOperation(_)
            | AttendanceError::Serialization(_) => ErrorCode::InternalServerError,
        }
    }
}
