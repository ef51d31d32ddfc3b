//! 考勤服务
//!
//! 汇总逻辑分为三步：[`scope`] 解析调用者可见的班级，[`fetch`] 拉取记录，
//! [`trends`] 透视成趋势表。今日考勤与趋势共用前两步。

pub mod fetch;
pub mod history;
pub mod mark;
pub mod scope;
#[cfg(test)]
mod testing;
pub mod today;
pub mod trends;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendance::requests::MarkAttendanceRequest;
use crate::storage::Storage;

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
}

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 今日考勤
    pub async fn get_today(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        today::get_today(self, request).await
    }

    // 近 7 天趋势
    pub async fn get_trends(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        trends::get_trends(self, request).await
    }

    // 登记今日考勤
    pub async fn mark_attendance(
        &self,
        request: &HttpRequest,
        class_id: i64,
        body: MarkAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        mark::mark_attendance(self, request, class_id, body).await
    }

    // 班级近期历史
    pub async fn get_history(
        &self,
        request: &HttpRequest,
        class_id: i64,
    ) -> ActixResult<HttpResponse> {
        history::get_history(self, request, class_id).await
    }
}
