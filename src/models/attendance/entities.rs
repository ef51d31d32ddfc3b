use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::classes::entities::class_label;

// 考勤记录，每个班级每天一条
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceRecord {
    pub id: i64,
    pub class_id: i64,
    pub attendance_date: chrono::NaiveDate,
    pub present_count: i32,
    pub marked_by: Option<i64>,
    pub marked_at: chrono::DateTime<chrono::Utc>,
}

/// 考勤计算所需的班级静态信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct ClassRef {
    pub class_id: i64,
    pub class_number: i32,
    pub section: String,
    pub total_students: i32,
}

impl ClassRef {
    pub fn label(&self) -> String {
        class_label(self.class_number, &self.section)
    }
}

/// 考勤记录与所属班级
#[derive(Debug, Clone)]
pub struct AttendanceWithClass {
    pub record: AttendanceRecord,
    pub class: ClassRef,
}
