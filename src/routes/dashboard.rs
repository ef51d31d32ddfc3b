use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::services::DashboardService;

static DASHBOARD_SERVICE: Lazy<DashboardService> = Lazy::new(DashboardService::new_lazy);

pub async fn dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    DASHBOARD_SERVICE.get_dashboard(&req).await
}

pub fn configure_dashboard_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/dashboard")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(dashboard)),
    );
}
