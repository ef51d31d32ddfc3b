use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::ClassService;
use crate::errors::AttendanceError;
use crate::models::classes::{requests::CreateClassRequest, responses::ClassResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::current_user;
use crate::utils::validate::validate_class_identity;

/// 班号去空白并转大写，人数必须为正
fn prepare_class(mut class_data: CreateClassRequest) -> Result<CreateClassRequest, &'static str> {
    class_data.section = class_data.section.trim().to_uppercase();
    validate_class_identity(class_data.class_number, &class_data.section)?;
    if class_data.total_students <= 0 {
        return Err("Total students must be a positive integer");
    }
    Ok(class_data)
}

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let class_data = match prepare_class(class_data) {
        Ok(data) => data,
        Err(msg) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ClassInvalid, msg)));
        }
    };

    let storage = service.get_storage(request)?;
    match storage.create_class(class_data).await {
        Ok(class) => {
            info!("{} created by {}", class.label(), caller.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                ClassResponse { class },
                "Class created successfully",
            )))
        }
        Err(AttendanceError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::ClassAlreadyExists, msg))),
        Err(e) => {
            error!("Class creation failed: {}", e);
            Ok(ApiResponse::from_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(number: i32, section: &str, total: i32) -> CreateClassRequest {
        CreateClassRequest {
            class_number: number,
            section: section.to_string(),
            total_students: total,
        }
    }

    #[test]
    fn test_prepare_class_normalizes_section() {
        let prepared = prepare_class(req(5, " a ", 30)).unwrap();
        assert_eq!(prepared.section, "A");
    }

    #[test]
    fn test_prepare_class_rejects_invalid() {
        assert!(prepare_class(req(0, "A", 30)).is_err());
        assert!(prepare_class(req(5, "", 30)).is_err());
        assert!(prepare_class(req(5, "A", 0)).is_err());
        assert!(prepare_class(req(5, "A-1", 30)).is_err());
    }
}
