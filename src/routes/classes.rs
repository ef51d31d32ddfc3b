use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::classes::requests::CreateClassRequest;
use crate::models::users::entities::UserRole;
use crate::services::ClassService;

// 懒加载的全局 ClassService 实例
static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);

pub async fn list_classes(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_classes(&req).await
}

pub async fn create_class(
    req: HttpRequest,
    class_data: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    CLASS_SERVICE
        .create_class(&req, class_data.into_inner())
        .await
}

// 配置路由
pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_classes))
                    .route(
                        web::post()
                            .to(create_class)
                            // 仅账号管理员可以建班
                            .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles())),
                    ),
            ),
    );
}
