//! 出勤趋势聚合
//!
//! 把按 (班级, 日期) 的扁平记录转成以日期为行、以班级标签为列的稀疏表。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::NaiveDate;
use tracing::error;

use super::AttendanceService;
use super::fetch::{DateRange, fetch_records};
use super::scope::resolve_scope;
use crate::errors::{AttendanceError, Result};
use crate::models::ApiResponse;
use crate::models::attendance::{
    entities::AttendanceWithClass,
    responses::{TrendResponse, TrendRow},
};
use crate::services::{current_user, school_today};
use crate::storage::AttendanceSource;

/// 聚合结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrendTable {
    /// 字符串排序，"Class 10A" 排在 "Class 1C" 之前
    pub labels: Vec<String>,
    /// 按记录出现顺序（日期升序）
    pub rows: Vec<TrendRow>,
}

/// 行标签，如 `Jan 5`
pub fn date_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// `round(present / total * 100)`，四舍五入到整数
///
/// 人数为 0 或出勤数越界时返回 DataIntegrity 错误。
pub fn attendance_percentage(present: i32, total: i32) -> Result<i64> {
    check_counts(present, total)?;
    let (p, t) = (i64::from(present), i64::from(total));
    Ok((200 * p + t) / (2 * t))
}

pub(crate) fn check_counts(present: i32, total: i32) -> Result<()> {
    if total <= 0 {
        return Err(AttendanceError::data_integrity(format!(
            "class has {total} students"
        )));
    }
    if !(0..=total).contains(&present) {
        return Err(AttendanceError::data_integrity(format!(
            "present count {present} outside 0..={total}"
        )));
    }
    Ok(())
}

/// 透视记录，任一记录异常则整体失败
pub fn build_trend_table(records: &[AttendanceWithClass]) -> Result<TrendTable> {
    let mut rows: Vec<TrendRow> = Vec::new();
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut labels: BTreeSet<String> = BTreeSet::new();

    for item in records {
        let percentage =
            attendance_percentage(item.record.present_count, item.class.total_students).map_err(
                |e| {
                    AttendanceError::data_integrity(format!(
                        "class {} on {}: {}",
                        item.class.class_id,
                        item.record.attendance_date,
                        e.message()
                    ))
                },
            )?;
        let class_label = item.class.label();
        let date = date_label(item.record.attendance_date);

        let idx = *row_index.entry(date.clone()).or_insert_with(|| {
            rows.push(TrendRow {
                date,
                values: BTreeMap::new(),
            });
            rows.len() - 1
        });
        rows[idx].values.insert(class_label.clone(), percentage);
        labels.insert(class_label);
    }

    Ok(TrendTable {
        labels: labels.into_iter().collect(),
        rows,
    })
}

/// 解析范围、拉取记录、聚合，最多两次存储调用
pub async fn compute_trends<S>(
    source: &S,
    caller_id: i64,
    is_privileged: bool,
    today: NaiveDate,
) -> Result<TrendResponse>
where
    S: AttendanceSource + ?Sized,
{
    let range = DateRange::trailing_week(today);
    let scope = resolve_scope(source, caller_id, is_privileged).await?;
    let records = fetch_records(source, range, &scope).await?;
    let table = build_trend_table(&records)?;

    Ok(TrendResponse {
        start_date: range.start,
        end_date: range.end,
        labels: table.labels,
        rows: table.rows,
    })
}

pub async fn get_trends(
    service: &AttendanceService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request)?;

    match compute_trends(storage.as_ref(), user.id, user.role.is_privileged(), school_today()).await
    {
        Ok(trends) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            trends,
            "Attendance trends retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to compute attendance trends for user {}: {}", user.id, e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeSource, record};
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn row(date: &str, cells: &[(&str, i64)]) -> TrendRow {
        TrendRow {
            date: date.to_string(),
            values: cells
                .iter()
                .map(|(label, value)| (label.to_string(), *value))
                .collect(),
        }
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(attendance_percentage(18, 24).unwrap(), 75);
        assert_eq!(attendance_percentage(1, 8).unwrap(), 13); // 12.5
        assert_eq!(attendance_percentage(1, 3).unwrap(), 33);
        assert_eq!(attendance_percentage(2, 3).unwrap(), 67);
        assert_eq!(attendance_percentage(0, 30).unwrap(), 0);
        assert_eq!(attendance_percentage(30, 30).unwrap(), 100);
    }

    #[test]
    fn test_percentage_rejects_bad_counts() {
        assert!(matches!(
            attendance_percentage(0, 0),
            Err(AttendanceError::DataIntegrity(_))
        ));
        assert!(matches!(
            attendance_percentage(21, 20),
            Err(AttendanceError::DataIntegrity(_))
        ));
        assert!(matches!(
            attendance_percentage(-1, 20),
            Err(AttendanceError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_date_label_has_no_padding() {
        assert_eq!(date_label(day(5)), "Jan 5");
        assert_eq!(
            date_label(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()),
            "Dec 25"
        );
    }

    #[test]
    fn test_same_date_merges_into_one_row() {
        let records = vec![
            record(1, 5, "A", 20, day(2), 10),
            record(2, 3, "B", 25, day(2), 25),
            record(1, 5, "A", 20, day(4), 20),
        ];
        let table = build_trend_table(&records).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].values.len(), 2);
        // 只有一个班级的日期只有一个键
        assert_eq!(table.rows[1], row("Jan 4", &[("Class 5A", 100)]));
    }

    #[test]
    fn test_labels_sort_as_strings() {
        let records = vec![
            record(1, 10, "A", 10, day(1), 5),
            record(2, 2, "B", 10, day(1), 5),
            record(3, 1, "C", 10, day(1), 5),
        ];
        let table = build_trend_table(&records).unwrap();
        assert_eq!(table.labels, vec!["Class 10A", "Class 1C", "Class 2B"]);
    }

    #[test]
    fn test_rows_follow_fetch_order() {
        let records = vec![
            record(1, 5, "A", 20, day(1), 10),
            record(1, 5, "A", 20, day(3), 10),
            record(1, 5, "A", 20, day(6), 10),
        ];
        let dates: Vec<String> = build_trend_table(&records)
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec!["Jan 1", "Jan 3", "Jan 6"]);
    }

    #[test]
    fn test_one_bad_record_fails_the_whole_table() {
        let records = vec![
            record(1, 5, "A", 20, day(1), 10),
            record(2, 3, "B", 0, day(1), 0),
        ];
        let err = build_trend_table(&records).unwrap_err();
        assert!(matches!(err, AttendanceError::DataIntegrity(_)));
        assert!(err.message().contains("class 2"));
    }

    #[tokio::test]
    async fn test_week_scenario() {
        let source = FakeSource::new(vec![
            record(1, 5, "A", 20, day(1), 15),
            record(2, 3, "B", 25, day(1), 20),
            record(1, 5, "A", 20, day(3), 20),
        ]);
        let response = compute_trends(&source, 1, true, day(7)).await.unwrap();

        assert_eq!(response.start_date, day(1));
        assert_eq!(response.end_date, day(7));
        assert_eq!(response.labels, vec!["Class 3B", "Class 5A"]);
        assert_eq!(
            response.rows,
            vec![
                row("Jan 1", &[("Class 5A", 75), ("Class 3B", 80)]),
                row("Jan 3", &[("Class 5A", 100)]),
            ]
        );
        // 3B 在 1 月 3 日没有键，而不是 0
        assert!(!response.rows[1].values.contains_key("Class 3B"));

        // 图表直接使用的扁平结构
        assert_eq!(
            serde_json::to_value(&response.rows[0]).unwrap(),
            serde_json::json!({ "date": "Jan 1", "Class 5A": 75, "Class 3B": 80 })
        );
        assert_eq!(
            serde_json::to_value(&response.rows[1]).unwrap(),
            serde_json::json!({ "date": "Jan 3", "Class 5A": 100 })
        );
    }

    #[tokio::test]
    async fn test_teacher_only_sees_assigned_classes() {
        let source = FakeSource::new(vec![
            record(1, 5, "A", 20, day(1), 15),
            record(2, 3, "B", 25, day(1), 20),
            record(3, 4, "C", 10, day(2), 10),
        ])
        .with_assignments(42, vec![2, 3]);

        let response = compute_trends(&source, 42, false, day(7)).await.unwrap();

        assert_eq!(source.last_filter(), Some(Some(vec![2, 3])));
        assert_eq!(response.labels, vec!["Class 3B", "Class 4C"]);
        for row in &response.rows {
            assert!(!row.values.contains_key("Class 5A"));
        }
    }

    #[tokio::test]
    async fn test_privileged_caller_is_not_filtered() {
        let source = FakeSource::new(vec![record(1, 5, "A", 20, day(1), 15)]);

        compute_trends(&source, 1, true, day(7)).await.unwrap();

        assert_eq!(source.assignment_calls(), 0);
        assert_eq!(source.last_filter(), Some(None));
    }

    #[tokio::test]
    async fn test_teacher_without_assignments_never_fetches() {
        let source = FakeSource::new(vec![record(1, 5, "A", 20, day(1), 15)]);

        let response = compute_trends(&source, 99, false, day(7)).await.unwrap();

        assert!(response.rows.is_empty());
        assert!(response.labels.is_empty());
        assert_eq!(source.assignment_calls(), 1);
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_whole() {
        let source = FakeSource::failing();
        let err = compute_trends(&source, 1, true, day(7)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::DatabaseOperation(_)));
    }
}
