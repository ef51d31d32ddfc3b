//! 班级范围解析
//!
//! 有特权的调用者不受限制；教师只能访问被分配的班级。

use crate::errors::Result;
use crate::storage::AttendanceSource;

/// 调用者可以访问的班级
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassScope {
    /// 不过滤
    All,
    /// 仅限这些班级，可能为空
    Only(Vec<i64>),
}

impl ClassScope {
    /// 没有任何可访问的班级
    pub fn is_empty(&self) -> bool {
        matches!(self, ClassScope::Only(ids) if ids.is_empty())
    }

    /// 转为存储层的过滤条件
    pub fn as_filter(&self) -> Option<Vec<i64>> {
        match self {
            ClassScope::All => None,
            ClassScope::Only(ids) => Some(ids.clone()),
        }
    }
}

pub async fn resolve_scope<S>(source: &S, caller_id: i64, is_privileged: bool) -> Result<ClassScope>
where
    S: AttendanceSource + ?Sized,
{
    if is_privileged {
        return Ok(ClassScope::All);
    }

    let mut ids = source.list_teacher_class_ids(caller_id).await?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ClassScope::Only(ids))
}
