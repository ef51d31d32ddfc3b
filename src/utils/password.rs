use crate::config::{AppConfig, Argon2Config};
use crate::errors::{AttendanceError, Result};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// 按给定参数哈希密码（Argon2id）
pub fn hash_password_with(password: &str, config: &Argon2Config) -> Result<String> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        None,
    )
    .map_err(|e| AttendanceError::validation(format!("Argon2 参数错误: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AttendanceError::validation(format!("密码哈希失败: {e}")))?;
    Ok(hash.to_string())
}

/// 哈希密码
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with(password, &AppConfig::get().argon2)
}

/// 在阻塞线程池中哈希，避免占用 actix worker
pub async fn hash_password_async(password: String, config: Argon2Config) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password_with(&password, &config))
        .await
        .map_err(|e| AttendanceError::validation(format!("密码哈希任务失败: {e}")))?
}

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(_) => false,
    }
}
