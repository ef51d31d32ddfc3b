use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::services::AssignmentService;

static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

pub async fn my_classes(req: HttpRequest) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.my_classes(&req).await
}

// 配置路由
pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new(&UserRole::Teacher))
                    .route("/me", web::get().to(my_classes)),
            ),
    );
}
