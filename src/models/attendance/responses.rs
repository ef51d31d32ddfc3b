use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use super::entities::{AttendanceRecord, ClassRef};

/// 今日考勤中的一个班级
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct TodayAttendanceItem {
    pub class: ClassRef,
    pub class_label: String,
    pub present_count: i32,
    pub total_students: i32,
    pub absent_count: i32,
    pub marked_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct TodayAttendanceResponse {
    pub date: chrono::NaiveDate,
    pub items: Vec<TodayAttendanceItem>,
}

/// 趋势表中的一行：日期标签加上各班级的出勤百分比
///
/// 某班当天没有记录时不出现对应键，不能当作 0 处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendRow {
    pub date: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, i64>,
}

/// 近 7 天趋势
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct TrendResponse {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// 按字符串排序的班级标签
    pub labels: Vec<String>,
    #[ts(type = "Array<{ date: string } & Record<string, number>>")]
    pub rows: Vec<TrendRow>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct MarkAttendanceResponse {
    pub record: AttendanceRecord,
    pub absent_count: i32,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct HistoryItem {
    pub attendance_date: chrono::NaiveDate,
    pub present_count: i32,
    pub total_students: i32,
    pub absent_count: i32,
    /// 保留一位小数
    pub percentage: f64,
    pub below_threshold: bool,
    pub marked_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct HistoryResponse {
    pub class: ClassRef,
    pub class_label: String,
    pub threshold: f64,
    pub items: Vec<HistoryItem>,
}
