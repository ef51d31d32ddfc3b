use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::attendance::entities::ClassRef;

// 班级实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub class_number: i32,
    pub section: String,
    pub total_students: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Class {
    pub fn label(&self) -> String {
        class_label(self.class_number, &self.section)
    }

    pub fn class_ref(&self) -> ClassRef {
        ClassRef {
            class_id: self.id,
            class_number: self.class_number,
            section: self.section.clone(),
            total_students: self.total_students,
        }
    }
}

/// 班级显示名，如 `Class 5A`
pub fn class_label(class_number: i32, section: &str) -> String {
    format!("Class {class_number}{section}")
}
