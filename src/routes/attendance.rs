use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::MarkAttendanceRequest;
use crate::models::users::entities::UserRole;
use crate::services::AttendanceService;
use crate::utils::SafeClassIdI64;

// 懒加载的全局 AttendanceService 实例
static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn today(req: HttpRequest) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_today(&req).await
}

pub async fn trends(req: HttpRequest) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_trends(&req).await
}

pub async fn mark_attendance(
    req: HttpRequest,
    class_id: SafeClassIdI64,
    body: web::Json<MarkAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .mark_attendance(&req, class_id.0, body.into_inner())
        .await
}

pub async fn history(req: HttpRequest, class_id: SafeClassIdI64) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.get_history(&req, class_id.0).await
}

// 配置路由
pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .wrap(middlewares::RequireJWT)
            .route("/today", web::get().to(today))
            .route("/trends", web::get().to(trends))
            .route("/classes/{class_id}/history", web::get().to(history))
            .service(
                web::resource("/classes/{class_id}").route(
                    web::put()
                        .to(mark_attendance)
                        // 只有班主任能登记，具体班级在服务中校验
                        .wrap(middlewares::RequireRole::new(&UserRole::Teacher)),
                ),
            ),
    );
}
