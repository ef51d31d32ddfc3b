use super::entities::UserRole;
use crate::models::assignments::requests::AssignmentInput;
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 用户查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserListParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub role: Option<UserRole>,
    pub search: Option<String>,
}

// 用户创建请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    /// 仅教师账号可携带初始班级分配
    #[serde(default)]
    pub assignments: Option<Vec<AssignmentInput>>,
}

/// 批量创建教师，`emails` 为按行分隔的邮箱文本
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct BulkCreateTeachersRequest {
    pub emails: String,
    pub password: String,
}

// 用户更新请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

// 按角色批量删除
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct DeleteUsersQuery {
    pub role: UserRole,
}

// 存储层新建用户
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: UserRole,
}

// 用户列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct UserListQuery {
    pub page: i64,
    pub size: i64,
    /// 为空时不过滤
    pub roles: Vec<UserRole>,
    pub search: Option<String>,
}
