use super::entities::User;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 用户响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserResponse {
    pub user: User,
}

// 用户列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListResponse {
    pub items: Vec<User>,
    pub pagination: PaginationInfo,
}

/// 批量操作中单个账号的结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct BatchItemResult {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn ok(email: impl Into<String>, user_id: i64) -> Self {
        Self {
            email: email.into(),
            success: true,
            user_id: Some(user_id),
            error: None,
        }
    }

    pub fn failed(email: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            success: false,
            user_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct BatchResultResponse {
    pub results: Vec<BatchItemResult>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl From<Vec<BatchItemResult>> for BatchResultResponse {
    fn from(results: Vec<BatchItemResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        Self {
            results,
            success_count,
            failure_count,
        }
    }
}
