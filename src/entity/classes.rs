//! 班级实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "classes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_number: i32,
    pub section: String,
    pub total_students: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::teacher_assignments::Entity")]
    TeacherAssignments,
    #[sea_orm(has_many = "super::attendance_records::Entity")]
    AttendanceRecords,
}

impl Related<super::teacher_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherAssignments.def()
    }
}

impl Related<super::attendance_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_class(self) -> crate::models::classes::entities::Class {
        use chrono::{DateTime, Utc};

        crate::models::classes::entities::Class {
            id: self.id,
            class_number: self.class_number,
            section: self.section,
            total_students: self.total_students,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn into_class_ref(self) -> crate::models::attendance::entities::ClassRef {
        crate::models::attendance::entities::ClassRef {
            class_id: self.id,
            class_number: self.class_number,
            section: self.section,
            total_students: self.total_students,
        }
    }
}
