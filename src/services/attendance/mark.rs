use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use tracing::{error, info};

use super::AttendanceService;
use crate::errors::{AttendanceError, Result};
use crate::models::attendance::{
    requests::{MarkAttendanceRequest, UpsertAttendance},
    responses::MarkAttendanceResponse,
};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, school_today};
use crate::storage::Storage;

/// 班主任登记某天的出勤人数，同一天重复登记以最后一次为准
pub async fn record_attendance(
    storage: &dyn Storage,
    caller: &User,
    class_id: i64,
    present_count: i32,
    date: NaiveDate,
) -> Result<MarkAttendanceResponse> {
    let class = storage
        .get_class_by_id(class_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found(format!("Class {class_id} not found")))?;

    let is_incharge = storage
        .get_assignment(caller.id, class_id)
        .await?
        .is_some_and(|a| a.is_incharge);
    if !is_incharge {
        return Err(AttendanceError::authorization(
            "Only the incharge teacher can mark attendance for this class",
        ));
    }

    if !(0..=class.total_students).contains(&present_count) {
        return Err(AttendanceError::validation(format!(
            "Present count must be between 0 and {}",
            class.total_students
        )));
    }

    let record = storage
        .upsert_attendance(UpsertAttendance {
            class_id,
            attendance_date: date,
            present_count,
            marked_by: caller.id,
        })
        .await?;

    Ok(MarkAttendanceResponse {
        absent_count: class.total_students - record.present_count,
        record,
    })
}

pub async fn mark_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    class_id: i64,
    body: MarkAttendanceRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match record_attendance(
        storage.as_ref(),
        &user,
        class_id,
        body.present_count,
        school_today(),
    )
    .await
    {
        Ok(marked) => {
            info!(
                "Attendance for class {} on {} marked by {}: {}",
                class_id, marked.record.attendance_date, user.id, marked.record.present_count
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                marked,
                "Attendance marked successfully",
            )))
        }
        Err(AttendanceError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ClassNotFound, msg))),
        Err(AttendanceError::Authorization(msg)) => {
            info!("User {} denied marking class {}", user.id, class_id);
            Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::AttendanceNotIncharge,
                msg,
            )))
        }
        Err(AttendanceError::Validation(msg)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::AttendanceCountInvalid, msg),
        )),
        Err(e) => {
            error!("Failed to mark attendance for class {}: {}", class_id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}
