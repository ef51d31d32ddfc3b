use std::collections::HashMap;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use tracing::error;

use super::AssignmentService;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::assignments::responses::{MyClassItem, MyClassesResponse};
use crate::services::{current_user, school_today};
use crate::storage::Storage;

/// 教师的班级及当天已登记的人数
pub async fn classes_of(
    storage: &dyn Storage,
    teacher_id: i64,
    today: NaiveDate,
) -> Result<MyClassesResponse> {
    let assigned = storage.list_assignments_for_teacher(teacher_id).await?;
    if assigned.is_empty() {
        return Ok(MyClassesResponse {
            date: today,
            items: Vec::new(),
        });
    }

    let class_ids: Vec<i64> = assigned.iter().map(|a| a.class.id).collect();
    let marked: HashMap<i64, i32> = storage
        .list_attendance_between(today, today, Some(class_ids))
        .await?
        .into_iter()
        .map(|r| (r.record.class_id, r.record.present_count))
        .collect();

    let items = assigned
        .into_iter()
        .map(|assignment| MyClassItem {
            today_present: marked.get(&assignment.class.id).copied(),
            assignment,
        })
        .collect();

    Ok(MyClassesResponse { date: today, items })
}

pub async fn my_classes(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match classes_of(storage.as_ref(), user.id, school_today()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Classes retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to load classes of teacher {}: {}", user.id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::requests::UpsertAttendance;
    use crate::services::testing::fixture;

    #[tokio::test]
    async fn test_today_present_only_when_marked() {
        let f = fixture().await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        f.storage
            .upsert_attendance(UpsertAttendance {
                class_id: f.class_a.id,
                attendance_date: today,
                present_count: 17,
                marked_by: f.teacher.id,
            })
            .await
            .unwrap();

        let mine = classes_of(f.storage.as_ref(), f.teacher.id, today).await.unwrap();
        assert_eq!(mine.items.len(), 2);

        let by_class: HashMap<i64, Option<i32>> = mine
            .items
            .iter()
            .map(|i| (i.assignment.class.id, i.today_present))
            .collect();
        assert_eq!(by_class[&f.class_a.id], Some(17));
        assert_eq!(by_class[&f.class_b.id], None);
    }

    #[tokio::test]
    async fn test_no_assignments() {
        let f = fixture().await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let mine = classes_of(f.storage.as_ref(), f.other_teacher.id, today)
            .await
            .unwrap();
        assert!(mine.items.is_empty());
    }
}
