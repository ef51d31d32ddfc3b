//! 服务层测试夹具：内存 SQLite 加上各角色账号和两个班级

use std::sync::Arc;

use crate::models::assignments::requests::AssignmentInput;
use crate::models::classes::{entities::Class, requests::CreateClassRequest};
use crate::models::users::{
    entities::{User, UserRole},
    requests::NewUser,
};
use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

pub struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub superadmin: User,
    pub admin: User,
    pub principal: User,
    /// 5A 的班主任，同时任教 3B
    pub teacher: User,
    /// 没有任何分配
    pub other_teacher: User,
    pub class_a: Class,
    pub class_b: Class,
}

async fn user(storage: &Arc<dyn Storage>, email: &str, role: UserRole) -> User {
    storage
        .create_user(NewUser {
            email: email.to_string(),
            full_name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: "hash".to_string(),
            role,
        })
        .await
        .unwrap()
}

async fn class(storage: &Arc<dyn Storage>, number: i32, section: &str, total: i32) -> Class {
    storage
        .create_class(CreateClassRequest {
            class_number: number,
            section: section.to_string(),
            total_students: total,
        })
        .await
        .unwrap()
}

pub async fn fixture() -> Fixture {
    let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await.unwrap());

    let superadmin = user(&storage, "root@school.test", UserRole::Superadmin).await;
    let admin = user(&storage, "office@school.test", UserRole::Admin).await;
    let principal = user(&storage, "principal@school.test", UserRole::Principal).await;
    let teacher = user(&storage, "anna@school.test", UserRole::Teacher).await;
    let other_teacher = user(&storage, "ben@school.test", UserRole::Teacher).await;

    let class_a = class(&storage, 5, "A", 20).await;
    let class_b = class(&storage, 3, "B", 25).await;

    storage
        .replace_assignments(
            teacher.id,
            vec![
                AssignmentInput {
                    class_id: class_a.id,
                    is_incharge: true,
                },
                AssignmentInput {
                    class_id: class_b.id,
                    is_incharge: false,
                },
            ],
        )
        .await
        .unwrap();

    Fixture {
        storage,
        superadmin,
        admin,
        principal,
        teacher,
        other_teacher,
        class_a,
        class_b,
    }
}

/// 测试用的低成本哈希参数
pub fn cheap_argon2() -> crate::config::Argon2Config {
    crate::config::Argon2Config {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}
