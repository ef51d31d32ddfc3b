//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_attendance_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AttendanceError {
            $($variant(String),)*
        }

        impl AttendanceError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AttendanceError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AttendanceError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendanceError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendance_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E010", "Date Parse Error"),
    Authentication("E011", "Authentication Error"),
    Authorization("E012", "Authorization Error"),
    Conflict("E013", "Conflict Error"),
    DataIntegrity("E014", "Data Integrity Error"),
}

impl AttendanceError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AttendanceError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        AttendanceError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        AttendanceError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(err: serde_json::Error) -> Self {
        AttendanceError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AttendanceError {
    fn from(err: chrono::ParseError) -> Self {
        AttendanceError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AttendanceError::cache_connection("test").code(), "E001");
        assert_eq!(AttendanceError::database_config("test").code(), "E003");
        assert_eq!(AttendanceError::validation("test").code(), "E007");
        assert_eq!(AttendanceError::data_integrity("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            AttendanceError::conflict("test").error_type(),
            "Conflict Error"
        );
        assert_eq!(
            AttendanceError::data_integrity("test").error_type(),
            "Data Integrity Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = AttendanceError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_format_simple() {
        let err = AttendanceError::data_integrity("class 3 has no students");
        let formatted = err.format_simple();
        assert!(formatted.contains("Data Integrity Error"));
        assert!(formatted.contains("class 3 has no students"));
    }

    #[test]
    fn test_from_db_err() {
        let err: AttendanceError = sea_orm::DbErr::Custom("boom".to_string()).into();
        assert_eq!(err.code(), "E005");
        assert!(err.message().contains("boom"));
    }
}
