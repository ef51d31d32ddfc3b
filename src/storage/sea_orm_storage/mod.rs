//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod attendance;
mod classes;
mod users;

use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 使用已有连接构造并运行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// 内存 SQLite，单连接保证所有查询看到同一个库
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AttendanceError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true);
        // 连接关闭后内存库即丢失，不能回收
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| {
                AttendanceError::database_connection(format!("SQLite 内存库连接失败: {e}"))
            })?;

        Self::from_connection(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)).await
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| AttendanceError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-16000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| {
                AttendanceError::database_connection(format!("SQLite 连接失败: {e}"))
            })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt).await.map_err(|e| {
            AttendanceError::database_connection(format!("无法连接到数据库: {e}"))
        })
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(AttendanceError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

/// 唯一约束冲突（SQLite、PostgreSQL、MySQL 的报错文本各不相同）
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("UNIQUE constraint failed")
        || msg.contains("duplicate key value")
        || msg.contains("Duplicate entry")
}

// Storage trait 实现
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
use crate::storage::{AttendanceSource, Storage};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
impl AttendanceSource for SeaOrmStorage {
    async fn list_teacher_class_ids(&self, teacher_id: i64) -> Result<Vec<i64>> {
        self.list_teacher_class_ids_impl(teacher_id).await
    }

    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        class_ids: Option<Vec<i64>>,
    ) -> Result<Vec<AttendanceWithClass>> {
        self.list_attendance_between_impl(start, end, class_ids)
            .await
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        self.list_users_by_role_impl(role).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users(&self) -> Result<u64> {
        self.count_users_impl().await
    }

    // 班级模块
    async fn create_class(&self, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn list_classes(&self) -> Result<Vec<Class>> {
        self.list_classes_impl().await
    }

    // 分配模块
    async fn list_assignments_for_teacher(&self, teacher_id: i64) -> Result<Vec<AssignedClass>> {
        self.list_assignments_for_teacher_impl(teacher_id).await
    }

    async fn get_assignment(
        &self,
        teacher_id: i64,
        class_id: i64,
    ) -> Result<Option<TeacherAssignment>> {
        self.get_assignment_impl(teacher_id, class_id).await
    }

    async fn replace_assignments(
        &self,
        teacher_id: i64,
        assignments: Vec<AssignmentInput>,
    ) -> Result<Vec<AssignedClass>> {
        self.replace_assignments_impl(teacher_id, assignments).await
    }

    // 考勤模块
    async fn upsert_attendance(&self, record: UpsertAttendance) -> Result<AttendanceRecord> {
        self.upsert_attendance_impl(record).await
    }

    async fn get_attendance(
        &self,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        self.get_attendance_impl(class_id, date).await
    }

    async fn list_class_attendance_since(
        &self,
        class_id: i64,
        since: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        self.list_class_attendance_since_impl(class_id, since).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("attendance.db").unwrap(),
            "sqlite://attendance.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/school").unwrap(),
            "postgres://u:p@localhost/school"
        );
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }

    #[tokio::test]
    async fn test_in_memory_runs_migrations() {
        let storage = SeaOrmStorage::in_memory().await.expect("in-memory storage");
        assert_eq!(storage.count_users().await.unwrap(), 0);
        assert!(storage.list_classes().await.unwrap().is_empty());
    }
}
