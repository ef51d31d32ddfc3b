//! 对象缓存
//!
//! 后端通过 [`register`] 中的插件表按名称构造，启动时由配置选择。

pub mod object_cache;
pub mod register;
mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 已认证用户的缓存键
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}
