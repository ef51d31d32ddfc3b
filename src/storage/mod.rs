use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{
    assignments::{
        entities::{AssignedClass, TeacherAssignment},
        requests::AssignmentInput,
    },
    attendance::{
        entities::{AttendanceRecord, AttendanceWithClass},
        requests::UpsertAttendance,
    },
    classes::{entities::Class, requests::CreateClassRequest},
    users::{
        entities::{User, UserRole},
        requests::{NewUser, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 考勤汇总只依赖的两类查询
#[async_trait::async_trait]
pub trait AttendanceSource: Send + Sync {
    /// 教师被分配的班级 ID
    async fn list_teacher_class_ids(&self, teacher_id: i64) -> Result<Vec<i64>>;

    /// 闭区间 `[start, end]` 内的考勤记录连同班级信息，按日期升序
    ///
    /// `class_ids` 为 `None` 时不过滤班级。
    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        class_ids: Option<Vec<i64>>,
    ) -> Result<Vec<AttendanceWithClass>>;
}

#[async_trait::async_trait]
pub trait Storage: AttendanceSource {
    /// 用户管理方法
    // 创建用户，邮箱重复时返回 Conflict
    async fn create_user(&self, user: NewUser) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 列出某角色的全部用户
    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户数量
    async fn count_users(&self) -> Result<u64>;

    /// 班级管理方法
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class>;
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 按年级、班号排序
    async fn list_classes(&self) -> Result<Vec<Class>>;

    /// 教师分配方法
    async fn list_assignments_for_teacher(&self, teacher_id: i64) -> Result<Vec<AssignedClass>>;
    async fn get_assignment(
        &self,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<Option<TeacherAssignment>>;
    // 在一个事务中替换教师的全部分配
    async fn replace_assignments(
        &self,
        teacher_id: i64,
        assignments: Vec<AssignmentInput>,
    ) -> Result<Vec<AssignedClass>>;

    /// 考勤方法
    // 以 (class_id, attendance_date) 为键写入，已存在则覆盖
    async fn upsert_attendance(&self, record: UpsertAttendance) -> Result<AttendanceRecord>;
    async fn get_attendance(
        &self,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>>;
    // 从 since 起的记录，按日期倒序
    async fn list_class_attendance_since(
        &self,
        class_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
