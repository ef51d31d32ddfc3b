use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{Days, NaiveDate};
use tracing::{error, info};

use super::AttendanceService;
use super::trends::check_counts;
use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use crate::models::attendance::responses::{HistoryItem, HistoryResponse};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, school_today};
use crate::storage::Storage;

/// 历史记录回看的天数
pub const HISTORY_DAYS: u64 = 7;

/// 百分比，保留一位小数
pub fn percentage_one_decimal(present: i32, total: i32) -> Result<f64> {
    check_counts(present, total)?;
    let raw = f64::from(present) * 100.0 / f64::from(total);
    Ok((raw * 10.0).round() / 10.0)
}

pub async fn class_history(
    storage: &dyn Storage,
    caller: &User,
    class_id: i64,
    today: NaiveDate,
    threshold: f64,
) -> Result<HistoryResponse> {
    let class = storage
        .get_class_by_id(class_id)
        .await?
        .ok_or_else(|| AttendanceError::not_found(format!("Class {class_id} not found")))?;

    if !caller.role.is_privileged() && storage.get_assignment(caller.id, class_id).await?.is_none()
    {
        return Err(AttendanceError::authorization(
            "You are not assigned to this class",
        ));
    }

    let since = today.checked_sub_days(Days::new(HISTORY_DAYS)).unwrap_or(today);
    let items = storage
        .list_class_attendance_since(class_id, since)
        .await?
        .into_iter()
        .map(|record| {
            let percentage = percentage_one_decimal(record.present_count, class.total_students)?;
            Ok(HistoryItem {
                attendance_date: record.attendance_date,
                present_count: record.present_count,
                total_students: class.total_students,
                absent_count: class.total_students - record.present_count,
                percentage,
                below_threshold: percentage < threshold,
                marked_at: record.marked_at,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HistoryResponse {
        class_label: class.label(),
        class: class.class_ref(),
        threshold,
        items,
    })
}

pub async fn get_history(
    service: &AttendanceService,
    request: &HttpRequest,
    class_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;
    let threshold = AppConfig::get().attendance.low_attendance_threshold;

    match class_history(storage.as_ref(), &user, class_id, school_today(), threshold).await {
        Ok(history) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            history,
            "Attendance history retrieved successfully",
        ))),
        Err(AttendanceError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ClassNotFound, msg))),
        Err(AttendanceError::Authorization(msg)) => {
            info!("User {} denied history of class {}", user.id, class_id);
            Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::ClassPermissionDenied,
                msg,
            )))
        }
        Err(e) => {
            error!("Failed to load history for class {}: {}", class_id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::requests::UpsertAttendance;
    use crate::services::testing::fixture;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    async fn mark(storage: &dyn Storage, class_id: i64, date: NaiveDate, present: i32, by: i64) {
        storage
            .upsert_attendance(UpsertAttendance {
                class_id,
                attendance_date: date,
                present_count: present,
                marked_by: by,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_percentage_one_decimal() {
        assert_eq!(percentage_one_decimal(15, 20).unwrap(), 75.0);
        assert_eq!(percentage_one_decimal(2, 3).unwrap(), 66.7);
        assert_eq!(percentage_one_decimal(1, 3).unwrap(), 33.3);
        assert!(percentage_one_decimal(1, 0).is_err());
    }

    #[tokio::test]
    async fn test_history_window_and_order() {
        let f = fixture().await;
        let s = f.storage.as_ref();
        let by = f.teacher.id;
        mark(s, f.class_a.id, day(1), 20, by).await; // 早于窗口
        mark(s, f.class_a.id, day(3), 14, by).await;
        mark(s, f.class_a.id, day(8), 15, by).await;
        mark(s, f.class_a.id, day(10), 18, by).await;

        let history = class_history(s, &f.teacher, f.class_a.id, day(10), 75.0)
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = history.items.iter().map(|i| i.attendance_date).collect();
        assert_eq!(dates, vec![day(10), day(8), day(3)]);
        assert_eq!(history.class_label, "Class 5A");

        assert_eq!(history.items[1].percentage, 75.0);
        assert!(!history.items[1].below_threshold);
        assert_eq!(history.items[2].percentage, 70.0);
        assert!(history.items[2].below_threshold);
        assert_eq!(history.items[2].absent_count, 6);
    }

    #[tokio::test]
    async fn test_history_access() {
        let f = fixture().await;
        let s = f.storage.as_ref();

        // 任课教师即可查看，不要求班主任
        assert!(class_history(s, &f.teacher, f.class_b.id, day(10), 75.0).await.is_ok());
        assert!(class_history(s, &f.principal, f.class_b.id, day(10), 75.0).await.is_ok());
        assert!(matches!(
            class_history(s, &f.other_teacher, f.class_a.id, day(10), 75.0).await,
            Err(AttendanceError::Authorization(_))
        ));
        assert!(matches!(
            class_history(s, &f.admin, 4242, day(10), 75.0).await,
            Err(AttendanceError::NotFound(_))
        ));
    }
}
