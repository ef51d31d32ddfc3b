use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::{AssignmentService, load_teacher};
use crate::errors::AttendanceError;
use crate::models::assignments::responses::AssignmentListResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    teacher_id: i64,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    let result = match load_teacher(storage.as_ref(), &caller, teacher_id).await {
        Ok(teacher) => storage.list_assignments_for_teacher(teacher.id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AssignmentListResponse { teacher_id, items },
            "Assignments retrieved successfully",
        ))),
        Err(AttendanceError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::UserNotFound, msg))),
        Err(e @ (AttendanceError::Validation(_) | AttendanceError::Authorization(_))) => {
            Ok(super::assignment_error_response(&e))
        }
        Err(e) => {
            error!("Failed to list assignments of {}: {}", teacher_id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}
