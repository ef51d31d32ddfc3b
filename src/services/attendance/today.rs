use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use tracing::error;

use super::AttendanceService;
use super::fetch::{DateRange, fetch_records};
use super::scope::resolve_scope;
use super::trends::check_counts;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::attendance::responses::{TodayAttendanceItem, TodayAttendanceResponse};
use crate::services::{current_user, school_today};
use crate::storage::AttendanceSource;

/// 今天已登记的班级，按年级、班号排序
pub async fn build_today<S>(
    source: &S,
    caller_id: i64,
    is_privileged: bool,
    today: NaiveDate,
) -> Result<TodayAttendanceResponse>
where
    S: AttendanceSource + ?Sized,
{
    let scope = resolve_scope(source, caller_id, is_privileged).await?;
    let records = fetch_records(source, DateRange::single_day(today), &scope).await?;

    let mut items = records
        .into_iter()
        .map(|item| {
            check_counts(item.record.present_count, item.class.total_students)?;
            Ok(TodayAttendanceItem {
                class_label: item.class.label(),
                present_count: item.record.present_count,
                total_students: item.class.total_students,
                absent_count: item.class.total_students - item.record.present_count,
                marked_at: item.record.marked_at,
                class: item.class,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    items.sort_by(|a, b| {
        (a.class.class_number, &a.class.section).cmp(&(b.class.class_number, &b.class.section))
    });

    Ok(TodayAttendanceResponse { date: today, items })
}

pub async fn get_today(
    service: &AttendanceService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match build_today(storage.as_ref(), user.id, user.role.is_privileged(), school_today()).await {
        Ok(today) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            today,
            "Today's attendance retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to load today's attendance for user {}: {}", user.id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeSource, record};
    use super::*;
    use crate::errors::AttendanceError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_today_sorted_by_class_number() {
        let source = FakeSource::new(vec![
            record(1, 10, "A", 30, day(5), 30),
            record(2, 2, "B", 20, day(5), 15),
            record(3, 2, "A", 25, day(5), 20),
            record(4, 1, "A", 25, day(4), 20),
        ]);

        let today = build_today(&source, 1, true, day(5)).await.unwrap();
        let labels: Vec<&str> = today.items.iter().map(|i| i.class_label.as_str()).collect();

        assert_eq!(labels, vec!["Class 2A", "Class 2B", "Class 10A"]);
        assert_eq!(today.items[1].absent_count, 5);
        assert_eq!(today.date, day(5));
    }

    #[tokio::test]
    async fn test_today_scoped_to_teacher() {
        let source = FakeSource::new(vec![
            record(1, 5, "A", 20, day(5), 10),
            record(2, 3, "B", 20, day(5), 12),
        ])
        .with_assignments(7, vec![2]);

        let today = build_today(&source, 7, false, day(5)).await.unwrap();
        assert_eq!(today.items.len(), 1);
        assert_eq!(today.items[0].class.class_id, 2);
    }

    #[tokio::test]
    async fn test_unassigned_teacher_sees_nothing() {
        let source = FakeSource::new(vec![record(1, 5, "A", 20, day(5), 10)]);

        let today = build_today(&source, 7, false, day(5)).await.unwrap();
        assert!(today.items.is_empty());
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let source = FakeSource::new(vec![record(1, 5, "A", 20, day(5), 25)]);

        let err = build_today(&source, 1, true, day(5)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::DataIntegrity(_)));
    }
}
