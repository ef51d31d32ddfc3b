use super::entities::AssignedClass;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentListResponse {
    pub teacher_id: i64,
    pub items: Vec<AssignedClass>,
}

/// 教师自己的班级
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct MyClassItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub assignment: AssignedClass,
    /// 今天已登记的出勤人数
    pub today_present: Option<i32>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct MyClassesResponse {
    pub date: chrono::NaiveDate,
    pub items: Vec<MyClassItem>,
}
