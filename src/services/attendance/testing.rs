//! 测试用的内存考勤数据源

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::errors::{AttendanceError, Result};
use crate::models::attendance::entities::{AttendanceRecord, AttendanceWithClass, ClassRef};
use crate::storage::AttendanceSource;

pub fn record(
    class_id: i64,
    class_number: i32,
    section: &str,
    total_students: i32,
    date: NaiveDate,
    present_count: i32,
) -> AttendanceWithClass {
    AttendanceWithClass {
        record: AttendanceRecord {
            id: class_id * 1000 + i64::from(date.ordinal()),
            class_id,
            attendance_date: date,
            present_count,
            marked_by: Some(1),
            marked_at: chrono::Utc::now(),
        },
        class: ClassRef {
            class_id,
            class_number,
            section: section.to_string(),
            total_students,
        },
    }
}

/// 记录调用次数与过滤条件
pub struct FakeSource {
    records: Vec<AttendanceWithClass>,
    assignments: HashMap<i64, Vec<i64>>,
    fail: bool,
    assignment_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    last_filter: Mutex<Option<Option<Vec<i64>>>>,
}

impl FakeSource {
    pub fn new(records: Vec<AttendanceWithClass>) -> Self {
        Self {
            records,
            assignments: HashMap::new(),
            fail: false,
            assignment_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            last_filter: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_assignments(mut self, teacher_id: i64, class_ids: Vec<i64>) -> Self {
        self.assignments.insert(teacher_id, class_ids);
        self
    }

    pub fn assignment_calls(&self) -> usize {
        self.assignment_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// 最近一次拉取的过滤条件，`None` 表示从未拉取
    pub fn last_filter(&self) -> Option<Option<Vec<i64>>> {
        self.last_filter.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttendanceSource for FakeSource {
    async fn list_teacher_class_ids(&self, teacher_id: i64) -> Result<Vec<i64>> {
        self.assignment_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.assignments.get(&teacher_id).cloned().unwrap_or_default())
    }

    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        class_ids: Option<Vec<i64>>,
    ) -> Result<Vec<AttendanceWithClass>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().unwrap() = Some(class_ids.clone());
        if self.fail {
            return Err(AttendanceError::database_operation("connection reset"));
        }

        let mut rows: Vec<AttendanceWithClass> = self
            .records
            .iter()
            .filter(|r| (start..=end).contains(&r.record.attendance_date))
            .filter(|r| {
                class_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&r.class.class_id))
            })
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.record.attendance_date);
        Ok(rows)
    }
}
