use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::error;

use super::ClassService;
use crate::models::{ApiResponse, classes::responses::ClassListResponse};

pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_classes().await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassListResponse { items },
            "Class list retrieved successfully",
        ))),
        Err(e) => {
            error!("Failed to list classes: {}", e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}
