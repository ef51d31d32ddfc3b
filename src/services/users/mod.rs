//! 账号管理
//!
//! 谁能管理谁由 [`UserRole::managed_roles`] 决定，超级管理员账号不能通过接口创建。

pub mod bulk;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::user_cache_key;
use crate::errors::{AttendanceError, Result};
use crate::models::ErrorCode;
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::{
    BulkCreateTeachersRequest, CreateUserRequest, DeleteUsersQuery, UpdateUserRequest,
    UserListParams,
};
use crate::storage::Storage;
use crate::utils::validate::{validate_email, validate_full_name, validate_password_simple};

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 获取用户列表
    pub async fn list_users(
        &self,
        query: UserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_users(self, query, request).await
    }

    // 创建用户
    pub async fn create_user(
        &self,
        user_data: CreateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_user(self, user_data, request).await
    }

    // 批量创建教师
    pub async fn bulk_create_teachers(
        &self,
        body: BulkCreateTeachersRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        bulk::bulk_create_teachers(self, body, request).await
    }

    // 根据ID获取用户
    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_user(self, user_id, request).await
    }

    // 更新用户信息
    pub async fn update_user(
        &self,
        user_id: i64,
        update_data: UpdateUserRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_user(self, user_id, update_data, request).await
    }

    // 删除用户
    pub async fn delete_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_user(self, user_id, request).await
    }

    // 删除某角色的全部账号
    pub async fn delete_users_by_role(
        &self,
        query: DeleteUsersQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_users_by_role(self, query, request).await
    }
}

/// 邮箱统一去空白、转小写
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 新账号字段校验，失败时给出对应的错误码
pub(crate) fn check_account_fields(
    email: &str,
    full_name: &str,
    password: &str,
) -> std::result::Result<(), (ErrorCode, String)> {
    validate_email(email).map_err(|m| (ErrorCode::UserEmailInvalid, m.to_string()))?;
    validate_full_name(full_name).map_err(|m| (ErrorCode::UserNameInvalid, m.to_string()))?;
    validate_password_simple(password).map_err(|m| (ErrorCode::UserPasswordInvalid, m))?;
    Ok(())
}

/// 调用者必须能管理该角色
pub(crate) fn ensure_can_manage(caller: &User, target: &UserRole) -> Result<()> {
    if caller.role.can_manage(target) {
        Ok(())
    } else {
        Err(AttendanceError::authorization(format!(
            "{} accounts cannot manage {} accounts",
            caller.role, target
        )))
    }
}

/// 读取可管理的目标账号
pub(crate) async fn load_managed_user(
    storage: &dyn Storage,
    caller: &User,
    user_id: i64,
) -> Result<User> {
    let target = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found(format!("User {user_id} not found")))?;
    ensure_can_manage(caller, &target.role)?;
    Ok(target)
}

/// 账号变更后清除认证缓存
pub(crate) async fn forget_cached_user(request: &HttpRequest, user_id: i64) {
    if let Some(cache) = super::cache_from_request(request) {
        cache.remove(&user_cache_key(user_id)).await;
    }
}

/// 账号相关错误转为响应
pub(crate) fn account_error_response(err: &AttendanceError) -> HttpResponse {
    use crate::models::ApiResponse;
    match err {
        AttendanceError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, msg.as_str())),
        AttendanceError::Authorization(msg) => HttpResponse::Forbidden().json(
            ApiResponse::error_empty(ErrorCode::UserRoleNotManageable, msg.as_str()),
        ),
        AttendanceError::Conflict(msg) => HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::UserEmailAlreadyExists, msg.as_str()),
        ),
        _ => ApiResponse::from_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Anna@School.Test "), "anna@school.test");
    }

    #[test]
    fn test_check_account_fields_codes() {
        assert_eq!(
            check_account_fields("nope", "Anna", "Passw0rd").unwrap_err().0,
            ErrorCode::UserEmailInvalid
        );
        assert_eq!(
            check_account_fields("a@school.test", "  ", "Passw0rd").unwrap_err().0,
            ErrorCode::UserNameInvalid
        );
        assert_eq!(
            check_account_fields("a@school.test", "Anna", "short").unwrap_err().0,
            ErrorCode::UserPasswordInvalid
        );
        assert!(check_account_fields("a@school.test", "Anna", "Passw0rd").is_ok());
    }
}
