//! 教师班级分配

pub mod list;
pub mod mine;
pub mod replace;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{AttendanceError, Result};
use crate::models::assignments::requests::ReplaceAssignmentsRequest;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 某教师的分配
    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        teacher_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_assignments(self, request, teacher_id).await
    }

    // 整体替换某教师的分配
    pub async fn replace_assignments(
        &self,
        request: &HttpRequest,
        teacher_id: i64,
        body: ReplaceAssignmentsRequest,
    ) -> ActixResult<HttpResponse> {
        replace::replace_assignments(self, request, teacher_id, body).await
    }

    // 当前教师自己的班级
    pub async fn my_classes(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        mine::my_classes(self, request).await
    }
}

/// 目标账号必须是教师，且调用者能管理教师账号
pub(crate) async fn load_teacher(
    storage: &dyn Storage,
    caller: &User,
    teacher_id: i64,
) -> Result<User> {
    if !caller.role.can_manage(&UserRole::Teacher) {
        return Err(AttendanceError::authorization(
            "Only account managers can change teacher assignments",
        ));
    }
    let target = storage
        .get_user_by_id(teacher_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found(format!("User {teacher_id} not found")))?;
    if target.role != UserRole::Teacher {
        return Err(AttendanceError::validation(
            "Class assignments can only be given to teachers",
        ));
    }
    Ok(target)
}

/// 分配相关错误转为响应
pub(crate) fn assignment_error_response(err: &AttendanceError) -> HttpResponse {
    match err {
        AttendanceError::Validation(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::AssignmentInvalid, msg.as_str())),
        AttendanceError::NotFound(msg) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ClassNotFound, msg.as_str())),
        AttendanceError::Conflict(msg) => HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::InchargeConflict, msg.as_str())),
        AttendanceError::Authorization(msg) => HttpResponse::Forbidden()
            .json(ApiResponse::error_empty(ErrorCode::ClassPermissionDenied, msg.as_str())),
        _ => ApiResponse::from_error(err),
    }
}
