use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Superadmin, // 超级管理员
    Admin,      // 管理员
    Principal,  // 校长
    Teacher,    // 教师
}

impl UserRole {
    pub const SUPERADMIN: &'static str = "superadmin";
    pub const ADMIN: &'static str = "admin";
    pub const PRINCIPAL: &'static str = "principal";
    pub const TEACHER: &'static str = "teacher";

    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Superadmin, &Self::Admin, &Self::Principal, &Self::Teacher]
    }

    /// 可管理账号的角色
    pub fn manager_roles() -> &'static [&'static UserRole] {
        &[&Self::Superadmin, &Self::Admin]
    }

    /// 可查看全部班级
    pub fn is_privileged(&self) -> bool {
        match self {
            UserRole::Superadmin | UserRole::Admin | UserRole::Principal => true,
            UserRole::Teacher => false,
        }
    }

    /// 当前角色可以创建、编辑、删除的账号角色
    pub fn managed_roles(&self) -> &'static [UserRole] {
        match self {
            UserRole::Superadmin => &[UserRole::Admin, UserRole::Principal, UserRole::Teacher],
            UserRole::Admin => &[UserRole::Teacher],
            UserRole::Principal | UserRole::Teacher => &[],
        }
    }

    pub fn can_manage(&self, target: &UserRole) -> bool {
        self.managed_roles().contains(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => Self::SUPERADMIN,
            UserRole::Admin => Self::ADMIN,
            UserRole::Principal => Self::PRINCIPAL,
            UserRole::Teacher => Self::TEACHER,
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<UserRole>().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: superadmin, admin, principal, teacher"
            ))
        })
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::SUPERADMIN => Ok(UserRole::Superadmin),
            UserRole::ADMIN => Ok(UserRole::Admin),
            UserRole::PRINCIPAL => Ok(UserRole::Principal),
            UserRole::TEACHER => Ok(UserRole::Teacher),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    // 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> Result<crate::utils::jwt::TokenPair, String> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            self.role.as_str(),
            refresh_token_expiry,
        )
        .map_err(|e| format!("生成 token 对失败: {e}"))
    }
}
