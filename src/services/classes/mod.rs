pub mod create;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::classes::requests::CreateClassRequest;
use crate::storage::Storage;

pub struct ClassService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_from_request(request),
        }
    }

    // 获取班级列表
    pub async fn list_classes(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_classes(self, request).await
    }

    pub async fn create_class(
        &self,
        request: &HttpRequest,
        class_data: CreateClassRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_class(self, request, class_data).await
    }
}
