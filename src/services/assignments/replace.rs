use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::{AssignmentService, assignment_error_response, load_teacher};
use crate::errors::{AttendanceError, Result};
use crate::models::assignments::{
    entities::AssignedClass, requests::ReplaceAssignmentsRequest,
    responses::AssignmentListResponse,
};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::storage::Storage;

/// 在一个事务中替换教师的全部分配
pub async fn reassign_teacher(
    storage: &dyn Storage,
    caller: &User,
    teacher_id: i64,
    body: ReplaceAssignmentsRequest,
) -> Result<Vec<AssignedClass>> {
    let teacher = load_teacher(storage, caller, teacher_id).await?;
    storage.replace_assignments(teacher.id, body.assignments).await
}

pub async fn replace_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    teacher_id: i64,
    body: ReplaceAssignmentsRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    // 先确认目标教师，区分“用户不存在”和“班级不存在”
    let teacher = match load_teacher(storage.as_ref(), &caller, teacher_id).await {
        Ok(teacher) => teacher,
        Err(AttendanceError::NotFound(msg)) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::UserNotFound, msg)));
        }
        Err(e) => return Ok(assignment_error_response(&e)),
    };

    match storage.replace_assignments(teacher.id, body.assignments).await {
        Ok(items) => {
            info!(
                "Assignments of teacher {} replaced by {} ({} classes)",
                teacher_id,
                caller.id,
                items.len()
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                AssignmentListResponse { teacher_id, items },
                "Assignments updated successfully",
            )))
        }
        Err(e) => {
            if matches!(e, AttendanceError::DatabaseOperation(_)) {
                error!("Failed to replace assignments of {}: {}", teacher_id, e);
            }
            Ok(assignment_error_response(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::requests::AssignmentInput;
    use crate::services::testing::fixture;

    fn input(class_id: i64, is_incharge: bool) -> AssignmentInput {
        AssignmentInput {
            class_id,
            is_incharge,
        }
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_set() {
        let f = fixture().await;
        let items = reassign_teacher(
            f.storage.as_ref(),
            &f.admin,
            f.teacher.id,
            ReplaceAssignmentsRequest {
                assignments: vec![input(f.class_b.id, true)],
            },
        )
        .await
        .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].class.id, f.class_b.id);
        assert!(items[0].is_incharge);
        assert!(
            f.storage
                .get_assignment(f.teacher.id, f.class_a.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_second_incharge_is_rejected() {
        let f = fixture().await;
        let err = reassign_teacher(
            f.storage.as_ref(),
            &f.admin,
            f.other_teacher.id,
            ReplaceAssignmentsRequest {
                assignments: vec![input(f.class_a.id, true)],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));

        // 非班主任的任课分配不冲突
        let items = reassign_teacher(
            f.storage.as_ref(),
            &f.admin,
            f.other_teacher.id,
            ReplaceAssignmentsRequest {
                assignments: vec![input(f.class_a.id, false)],
            },
        )
        .await
        .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_target_must_be_teacher() {
        let f = fixture().await;
        let err = reassign_teacher(
            f.storage.as_ref(),
            &f.superadmin,
            f.principal.id,
            ReplaceAssignmentsRequest {
                assignments: vec![input(f.class_a.id, false)],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_principal_cannot_assign() {
        let f = fixture().await;
        let err = reassign_teacher(
            f.storage.as_ref(),
            &f.principal,
            f.other_teacher.id,
            ReplaceAssignmentsRequest {
                assignments: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_duplicate_class_ids() {
        let f = fixture().await;
        let err = reassign_teacher(
            f.storage.as_ref(),
            &f.admin,
            f.other_teacher.id,
            ReplaceAssignmentsRequest {
                assignments: vec![input(f.class_b.id, false), input(f.class_b.id, true)],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }
}
