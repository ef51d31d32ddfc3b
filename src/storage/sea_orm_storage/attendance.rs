use super::SeaOrmStorage;
use crate::entity::attendance_records::{ActiveModel, Column, Entity as AttendanceRecords};
use crate::entity::classes::Entity as Classes;
use crate::errors::{AttendanceError, Result};
use crate::models::attendance::{
    entities::{AttendanceRecord, AttendanceWithClass},
    requests::UpsertAttendance,
};
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, sea_query::OnConflict,
};

impl SeaOrmStorage {
    /// 日期区间内的考勤记录连同班级
    pub async fn list_attendance_between_impl(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        class_ids: Option<Vec<i64>>,
    ) -> Result<Vec<AttendanceWithClass>> {
        let mut select =
            AttendanceRecords::find().filter(Column::AttendanceDate.between(start, end));

        match class_ids {
            Some(ids) if ids.is_empty() => return Ok(Vec::new()),
            Some(ids) => select = select.filter(Column::ClassId.is_in(ids)),
            None => {}
        }

        let rows = select
            .order_by_asc(Column::AttendanceDate)
            .order_by_asc(Column::ClassId)
            .find_also_related(Classes)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, class)| {
                class.map(|c| AttendanceWithClass {
                    record: record.into_record(),
                    class: c.into_class_ref(),
                })
            })
            .collect())
    }

    /// 写入当天考勤，已存在则覆盖（后写入者生效）
    pub async fn upsert_attendance_impl(&self, req: UpsertAttendance) -> Result<AttendanceRecord> {
        let model = ActiveModel {
            class_id: Set(req.class_id),
            attendance_date: Set(req.attendance_date),
            present_count: Set(req.present_count),
            marked_by: Set(Some(req.marked_by)),
            marked_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        AttendanceRecords::insert(model)
            .on_conflict(
                OnConflict::columns([Column::ClassId, Column::AttendanceDate])
                    .update_columns([Column::PresentCount, Column::MarkedBy, Column::MarkedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("保存考勤失败: {e}")))?;

        self.get_attendance_impl(req.class_id, req.attendance_date)
            .await?
            .ok_or_else(|| AttendanceError::database_operation("保存后未找到考勤记录"))
    }

    pub async fn get_attendance_impl(
        &self,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let result = AttendanceRecords::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::AttendanceDate.eq(date))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?;

        Ok(result.map(|m| m.into_record()))
    }

    pub async fn list_class_attendance_since_impl(
        &self,
        class_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = AttendanceRecords::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::AttendanceDate.gte(since))
            .order_by_desc(Column::AttendanceDate)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤历史失败: {e}")))?;

        Ok(records.into_iter().map(|m| m.into_record()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classes::requests::CreateClassRequest;
    use crate::models::users::{entities::UserRole, requests::NewUser};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    async fn setup() -> (SeaOrmStorage, i64, i64, i64) {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let teacher = storage
            .create_user_impl(NewUser {
                email: "t@school.test".to_string(),
                full_name: "t".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Teacher,
            })
            .await
            .unwrap();
        let a = storage
            .create_class_impl(CreateClassRequest {
                class_number: 5,
                section: "A".to_string(),
                total_students: 20,
            })
            .await
            .unwrap();
        let b = storage
            .create_class_impl(CreateClassRequest {
                class_number: 3,
                section: "B".to_string(),
                total_students: 25,
            })
            .await
            .unwrap();
        (storage, teacher.id, a.id, b.id)
    }

    fn mark(class_id: i64, date: NaiveDate, present: i32, by: i64) -> UpsertAttendance {
        UpsertAttendance {
            class_id,
            attendance_date: date,
            present_count: present,
            marked_by: by,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_day() {
        let (storage, teacher, class_a, _) = setup().await;

        storage
            .upsert_attendance_impl(mark(class_a, day(1), 15, teacher))
            .await
            .unwrap();
        let record = storage
            .upsert_attendance_impl(mark(class_a, day(1), 18, teacher))
            .await
            .unwrap();
        assert_eq!(record.present_count, 18);

        let rows = storage
            .list_attendance_between_impl(day(1), day(1), None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.present_count, 18);
        assert_eq!(rows[0].class.total_students, 20);
    }

    #[tokio::test]
    async fn test_between_is_inclusive_filtered_and_date_ordered() {
        let (storage, teacher, class_a, class_b) = setup().await;
        for (class_id, d, present) in [
            (class_a, 3, 20),
            (class_b, 1, 20),
            (class_a, 1, 15),
            (class_a, 8, 10),
        ] {
            storage
                .upsert_attendance_impl(mark(class_id, day(d), present, teacher))
                .await
                .unwrap();
        }

        let rows = storage
            .list_attendance_between_impl(day(1), day(7), None)
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.record.attendance_date).collect();
        assert_eq!(dates, vec![day(1), day(1), day(3)]);

        let only_b = storage
            .list_attendance_between_impl(day(1), day(7), Some(vec![class_b]))
            .await
            .unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].class.class_id, class_b);

        let none = storage
            .list_attendance_between_impl(day(1), day(7), Some(vec![]))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_history_since_is_newest_first() {
        let (storage, teacher, class_a, _) = setup().await;
        for d in [1, 2, 5] {
            storage
                .upsert_attendance_impl(mark(class_a, day(d), 10 + d as i32, teacher))
                .await
                .unwrap();
        }

        let history = storage
            .list_class_attendance_since_impl(class_a, day(2))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = history.iter().map(|r| r.attendance_date).collect();
        assert_eq!(dates, vec![day(5), day(2)]);
    }
}
