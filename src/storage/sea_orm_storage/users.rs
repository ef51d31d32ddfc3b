use super::{SeaOrmStorage, is_unique_violation};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();
        let email = req.email.clone();

        let model = ActiveModel {
            email: Set(req.email),
            full_name: Set(req.full_name),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AttendanceError::conflict(format!("邮箱已被使用: {email}"))
            } else {
                AttendanceError::database_operation(format!("创建用户失败: {e}"))
            }
        })?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.max(1) as u64;
        let size = query.size.clamp(1, 100) as u64;

        let mut select = Users::find();

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Email.contains(&escaped))
                    .add(Column::FullName.contains(&escaped)),
            );
        }

        // 角色筛选
        if !query.roles.is_empty() {
            select = select.filter(
                Column::Role.is_in(query.roles.iter().map(|r| r.to_string())),
            );
        }

        select = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.map_err(|e| {
            AttendanceError::database_operation(format!("查询用户总数失败: {e}"))
        })?;

        let users = paginator.fetch_page(page - 1).await.map_err(|e| {
            AttendanceError::database_operation(format!("查询用户列表失败: {e}"))
        })?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }

    /// 列出某角色的全部用户
    pub async fn list_users_by_role_impl(&self, role: UserRole) -> Result<Vec<User>> {
        let users = Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(users.into_iter().map(|m| m.into_user()).collect())
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AttendanceError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户姓名、邮箱
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(email) = update.email {
            model.email = Set(email);
        }

        if let Some(full_name) = update.full_name {
            model.full_name = Set(full_name);
        }

        model.update(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AttendanceError::conflict("邮箱已被使用")
            } else {
                AttendanceError::database_operation(format!("更新用户失败: {e}"))
            }
        })?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户，分配关系随外键级联删除
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self) -> Result<u64> {
        Users::find()
            .count(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计用户数量失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: email.split('@').next().unwrap_or_default().to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let user = storage
            .create_user_impl(new_user("ana@school.test", UserRole::Teacher))
            .await
            .unwrap();

        assert_eq!(user.full_name, "ana");
        assert_eq!(user.role, UserRole::Teacher);

        let by_email = storage
            .get_user_by_email_impl("ana@school.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        storage
            .create_user_impl(new_user("dup@school.test", UserRole::Teacher))
            .await
            .unwrap();
        let err = storage
            .create_user_impl(new_user("dup@school.test", UserRole::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_roles_and_search() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        for (email, role) in [
            ("t1@school.test", UserRole::Teacher),
            ("t2@school.test", UserRole::Teacher),
            ("p1@school.test", UserRole::Principal),
            ("root@school.test", UserRole::Superadmin),
        ] {
            storage.create_user_impl(new_user(email, role)).await.unwrap();
        }

        let teachers = storage
            .list_users_with_pagination_impl(UserListQuery {
                page: 1,
                size: 10,
                roles: vec![UserRole::Teacher],
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(teachers.pagination.total, 2);

        let managed = storage
            .list_users_with_pagination_impl(UserListQuery {
                page: 1,
                size: 10,
                roles: vec![UserRole::Teacher, UserRole::Principal],
                search: Some("p1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(managed.items.len(), 1);
        assert_eq!(managed.items[0].email, "p1@school.test");
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let user = storage
            .create_user_impl(new_user("old@school.test", UserRole::Teacher))
            .await
            .unwrap();

        let updated = storage
            .update_user_impl(
                user.id,
                UpdateUserRequest {
                    email: Some("new@school.test".to_string()),
                    full_name: Some("New Name".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "new@school.test");
        assert_eq!(updated.full_name, "New Name");

        assert!(storage.delete_user_impl(user.id).await.unwrap());
        assert!(!storage.delete_user_impl(user.id).await.unwrap());
        assert!(
            storage
                .update_user_impl(
                    user.id,
                    UpdateUserRequest {
                        email: None,
                        full_name: None
                    }
                )
                .await
                .unwrap()
                .is_none()
        );
    }
}
