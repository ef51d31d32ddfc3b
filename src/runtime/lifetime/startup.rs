use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::storage::Storage;
use crate::utils::password::hash_password_async;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_SUPERADMIN_EMAIL: &str = "superadmin@school.local";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }
    if get_object_cache_plugin(cache_type).is_none() {
        warn!("Cache backend '{}' not found in registry", cache_type);
    }

    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = build_cache("moka").await {
            return Ok(cache);
        }
    }

    Err(AttendanceError::cache_plugin_not_found(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 数据库中没有任何账号时创建超级管理员
async fn seed_superadmin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!("Database already has {} user(s), skipping seed", count);
            return;
        }
        Ok(_) => info!("No users found in database, creating superadmin account..."),
        Err(e) => {
            warn!("Failed to count users: {}, skipping seed", e);
            return;
        }
    }

    let email = std::env::var("SUPERADMIN_EMAIL")
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|_| DEFAULT_SUPERADMIN_EMAIL.to_string());

    // 优先从环境变量读取密码，否则生成随机密码
    let password = std::env::var("SUPERADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  SUPERADMIN_PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated password for {}: {}", email, pwd);
        warn!("  Please save this password or set SUPERADMIN_PASSWORD");
        warn!("==========================================================");
        pwd
    });

    let password_hash =
        match hash_password_async(password, AppConfig::get().argon2.clone()).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Failed to hash superadmin password: {}, skipping seed", e);
                return;
            }
        };

    let full_name = email.split('@').next().unwrap_or("superadmin").to_string();
    match storage
        .create_user(NewUser {
            email,
            full_name,
            password_hash,
            role: UserRole::Superadmin,
        })
        .await
    {
        Ok(user) => info!(
            "Superadmin account created (ID: {}, email: {})",
            user.id, user.email
        ),
        Err(e) => warn!("Failed to create superadmin account: {}", e),
    }
}

/// 准备服务器启动的上下文：存储、初始账号和缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    crate::cache::register::register_builtin_plugins();
    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_superadmin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_password_length_and_charset() {
        let pwd = generate_random_password(16);
        assert_eq!(pwd.chars().count(), 16);
        assert!(pwd.is_ascii());
    }
}
