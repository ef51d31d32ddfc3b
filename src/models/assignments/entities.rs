use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::classes::entities::Class;

// 教师班级分配
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct TeacherAssignment {
    pub id: i64,
    pub teacher_id: i64,
    pub class_id: i64,
    /// 班主任，唯一可以登记该班考勤的教师
    pub is_incharge: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 分配连同班级信息
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignedClass {
    pub class: Class,
    pub is_incharge: bool,
}
