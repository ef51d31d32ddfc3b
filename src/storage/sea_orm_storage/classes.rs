use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes};
use crate::errors::{AttendanceError, Result};
use crate::models::classes::{entities::Class, requests::CreateClassRequest};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_number: Set(req.class_number),
            section: Set(req.section.clone()),
            total_students: Set(req.total_students),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AttendanceError::conflict(format!(
                    "班级已存在: {}{}",
                    req.class_number, req.section
                ))
            } else {
                AttendanceError::database_operation(format!("创建班级失败: {e}"))
            }
        })?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 列出全部班级
    pub async fn list_classes_impl(&self) -> Result<Vec<Class>> {
        let classes = Classes::find()
            .order_by_asc(Column::ClassNumber)
            .order_by_asc(Column::Section)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询班级列表失败: {e}")))?;

        Ok(classes.into_iter().map(|m| m.into_class()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(number: i32, section: &str, total: i32) -> CreateClassRequest {
        CreateClassRequest {
            class_number: number,
            section: section.to_string(),
            total_students: total,
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_number_then_section() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        for req in [class(10, "A", 30), class(2, "B", 25), class(2, "A", 20)] {
            storage.create_class_impl(req).await.unwrap();
        }

        let labels: Vec<String> = storage
            .list_classes_impl()
            .await
            .unwrap()
            .iter()
            .map(|c| c.label())
            .collect();
        assert_eq!(labels, vec!["Class 2A", "Class 2B", "Class 10A"]);
    }

    #[tokio::test]
    async fn test_duplicate_class_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        storage.create_class_impl(class(5, "A", 20)).await.unwrap();
        let err = storage.create_class_impl(class(5, "A", 22)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));
    }
}
