use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentInput {
    pub class_id: i64,
    #[serde(default)]
    pub is_incharge: bool,
}

// 整体替换教师的班级分配
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct ReplaceAssignmentsRequest {
    pub assignments: Vec<AssignmentInput>,
}
