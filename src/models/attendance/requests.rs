use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct MarkAttendanceRequest {
    pub present_count: i32,
}

// 存储层 upsert 参数
#[derive(Debug, Clone)]
pub struct UpsertAttendance {
    pub class_id: i64,
    pub attendance_date: chrono::NaiveDate,
    pub present_count: i32,
    pub marked_by: i64,
}
