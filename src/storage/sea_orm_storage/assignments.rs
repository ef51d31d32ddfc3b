use std::collections::HashSet;

use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::teacher_assignments::{ActiveModel, Column, Entity as TeacherAssignments};
use crate::errors::{AttendanceError, Result};
use crate::models::assignments::{
    entities::{AssignedClass, TeacherAssignment},
    requests::AssignmentInput,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait};

impl SeaOrmStorage {
    /// 教师的班级分配，按年级、班号排序
    pub async fn list_assignments_for_teacher_impl(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<AssignedClass>> {
        let rows = TeacherAssignments::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .find_also_related(Classes)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师分配失败: {e}")))?;

        let mut items: Vec<AssignedClass> = rows
            .into_iter()
            .filter_map(|(assignment, class)| {
                class.map(|c| AssignedClass {
                    class: c.into_class(),
                    is_incharge: assignment.is_incharge,
                })
            })
            .collect();
        items.sort_by(|a, b| {
            (a.class.class_number, &a.class.section).cmp(&(b.class.class_number, &b.class.section))
        });

        Ok(items)
    }

    pub async fn get_assignment_impl(
        &self,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<Option<TeacherAssignment>> {
        let result = TeacherAssignments::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .filter(Column::ClassId.eq(class_id))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师分配失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    pub async fn list_teacher_class_ids_impl(&self, teacher_id: i64) -> Result<Vec<i64>> {
        TeacherAssignments::find()
            .select_only()
            .column(Column::ClassId)
            .filter(Column::TeacherId.eq(teacher_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师班级失败: {e}")))
    }

    /// 整体替换教师的分配
    ///
    /// 班级必须存在；一个班级只能有一名班主任，与其他教师冲突时整体失败。
    pub async fn replace_assignments_impl(
        &self,
        teacher_id: i64,
        inputs: Vec<AssignmentInput>,
    ) -> Result<Vec<AssignedClass>> {
        let mut seen = HashSet::new();
        if let Some(dup) = inputs.iter().find(|a| !seen.insert(a.class_id)) {
            return Err(AttendanceError::validation(format!(
                "班级 {} 重复分配",
                dup.class_id
            )));
        }

        let class_ids: Vec<i64> = inputs.iter().map(|a| a.class_id).collect();
        let incharge_ids: Vec<i64> = inputs
            .iter()
            .filter(|a| a.is_incharge)
            .map(|a| a.class_id)
            .collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("开启事务失败: {e}")))?;

        if !class_ids.is_empty() {
            let existing: HashSet<i64> = Classes::find()
                .select_only()
                .column(ClassColumn::Id)
                .filter(ClassColumn::Id.is_in(class_ids.clone()))
                .into_tuple::<i64>()
                .all(&txn)
                .await
                .map_err(|e| AttendanceError::database_operation(format!("查询班级失败: {e}")))?
                .into_iter()
                .collect();

            if let Some(missing) = class_ids.iter().find(|id| !existing.contains(id)) {
                return Err(AttendanceError::not_found(format!("班级 {missing} 不存在")));
            }
        }

        if !incharge_ids.is_empty() {
            let taken = TeacherAssignments::find()
                .filter(Column::ClassId.is_in(incharge_ids))
                .filter(Column::IsIncharge.eq(true))
                .filter(Column::TeacherId.ne(teacher_id))
                .one(&txn)
                .await
                .map_err(|e| {
                    AttendanceError::database_operation(format!("查询班主任失败: {e}"))
                })?;

            if let Some(other) = taken {
                return Err(AttendanceError::conflict(format!(
                    "班级 {} 已有班主任",
                    other.class_id
                )));
            }
        }

        TeacherAssignments::delete_many()
            .filter(Column::TeacherId.eq(teacher_id))
            .exec(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("清除教师分配失败: {e}")))?;

        if !inputs.is_empty() {
            let now = chrono::Utc::now().timestamp();
            let models = inputs.into_iter().map(|a| ActiveModel {
                teacher_id: Set(teacher_id),
                class_id: Set(a.class_id),
                is_incharge: Set(a.is_incharge),
                created_at: Set(now),
                ..Default::default()
            });
            TeacherAssignments::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AttendanceError::conflict(format!("班级已有班主任: {e}"))
                    } else {
                        AttendanceError::database_operation(format!("写入教师分配失败: {e}"))
                    }
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("提交事务失败: {e}")))?;

        self.list_assignments_for_teacher_impl(teacher_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classes::requests::CreateClassRequest;
    use crate::models::users::{entities::UserRole, requests::NewUser};

    async fn setup() -> (SeaOrmStorage, i64, i64, i64, i64) {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let mut teacher_ids = Vec::new();
        for email in ["a@school.test", "b@school.test"] {
            let user = storage
                .create_user_impl(NewUser {
                    email: email.to_string(),
                    full_name: email.to_string(),
                    password_hash: "hash".to_string(),
                    role: UserRole::Teacher,
                })
                .await
                .unwrap();
            teacher_ids.push(user.id);
        }
        let mut class_ids = Vec::new();
        for (number, section) in [(5, "A"), (3, "B")] {
            let class = storage
                .create_class_impl(CreateClassRequest {
                    class_number: number,
                    section: section.to_string(),
                    total_students: 20,
                })
                .await
                .unwrap();
            class_ids.push(class.id);
        }
        (
            storage,
            teacher_ids[0],
            teacher_ids[1],
            class_ids[0],
            class_ids[1],
        )
    }

    fn input(class_id: i64, is_incharge: bool) -> AssignmentInput {
        AssignmentInput {
            class_id,
            is_incharge,
        }
    }

    #[tokio::test]
    async fn test_replace_sets_and_clears_assignments() {
        let (storage, teacher, _, class_5a, class_3b) = setup().await;

        let items = storage
            .replace_assignments_impl(teacher, vec![input(class_5a, true), input(class_3b, false)])
            .await
            .unwrap();
        // 按年级排序，3B 在前
        assert_eq!(items[0].class.id, class_3b);
        assert!(items[1].is_incharge);

        let mut ids = storage.list_teacher_class_ids_impl(teacher).await.unwrap();
        ids.sort();
        let mut expected = vec![class_5a, class_3b];
        expected.sort();
        assert_eq!(ids, expected);

        let items = storage.replace_assignments_impl(teacher, vec![]).await.unwrap();
        assert!(items.is_empty());
        assert!(storage.list_teacher_class_ids_impl(teacher).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_incharge_is_rejected_and_nothing_changes() {
        let (storage, first, second, class_5a, class_3b) = setup().await;
        storage
            .replace_assignments_impl(first, vec![input(class_5a, true)])
            .await
            .unwrap();
        storage
            .replace_assignments_impl(second, vec![input(class_3b, false)])
            .await
            .unwrap();

        let err = storage
            .replace_assignments_impl(second, vec![input(class_5a, true)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));

        // 失败时原有分配保持不变
        assert_eq!(
            storage.list_teacher_class_ids_impl(second).await.unwrap(),
            vec![class_3b]
        );

        // 非班主任分配不受限制
        storage
            .replace_assignments_impl(second, vec![input(class_5a, false)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_database_rejects_second_incharge_row() {
        let (storage, first, second, class_5a, _) = setup().await;
        storage
            .replace_assignments_impl(first, vec![input(class_5a, true)])
            .await
            .unwrap();

        // 绕过服务层检查，直接写入第二名班主任
        let err = TeacherAssignments::insert(ActiveModel {
            teacher_id: Set(second),
            class_id: Set(class_5a),
            is_incharge: Set(true),
            created_at: Set(0),
            ..Default::default()
        })
        .exec(&storage.db)
        .await
        .unwrap_err();
        assert!(is_unique_violation(&err));

        // 非班主任行仍可写入
        TeacherAssignments::insert(ActiveModel {
            teacher_id: Set(second),
            class_id: Set(class_5a),
            is_incharge: Set(false),
            created_at: Set(0),
            ..Default::default()
        })
        .exec(&storage.db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_class_and_duplicates_fail() {
        let (storage, teacher, _, class_5a, _) = setup().await;

        let err = storage
            .replace_assignments_impl(teacher, vec![input(9999, false)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NotFound(_)));

        let err = storage
            .replace_assignments_impl(teacher, vec![input(class_5a, false), input(class_5a, true)])
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deleting_teacher_cascades_assignments() {
        let (storage, teacher, _, class_5a, _) = setup().await;
        storage
            .replace_assignments_impl(teacher, vec![input(class_5a, true)])
            .await
            .unwrap();

        storage.delete_user_impl(teacher).await.unwrap();
        assert!(storage.get_assignment_impl(teacher, class_5a).await.unwrap().is_none());
    }
}
