//! 考勤记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub class_id: i64,
    pub attendance_date: Date,
    pub present_count: i32,
    pub marked_by: Option<i64>,
    pub marked_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::classes::Entity",
        from = "Column::ClassId",
        to = "super::classes::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::MarkedBy",
        to = "super::users::Column::Id"
    )]
    MarkedBy,
}

impl Related<super::classes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_record(self) -> crate::models::attendance::entities::AttendanceRecord {
        use chrono::{DateTime, Utc};

        crate::models::attendance::entities::AttendanceRecord {
            id: self.id,
            class_id: self.class_id,
            attendance_date: self.attendance_date,
            present_count: self.present_count,
            marked_by: self.marked_by,
            marked_at: DateTime::<Utc>::from_timestamp(self.marked_at, 0).unwrap_or_default(),
        }
    }
}
