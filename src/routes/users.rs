use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::assignments::requests::ReplaceAssignmentsRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::{
    BulkCreateTeachersRequest, CreateUserRequest, DeleteUsersQuery, UpdateUserRequest,
    UserListParams,
};
use crate::services::{AssignmentService, UserService};
use crate::utils::SafeIDI64;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

// HTTP处理程序
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<UserListParams>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    user_data: web::Json<CreateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.create_user(user_data.into_inner(), &req).await
}

pub async fn bulk_create_teachers(
    req: HttpRequest,
    body: web::Json<BulkCreateTeachersRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE.bulk_create_teachers(body.into_inner(), &req).await
}

pub async fn delete_users_by_role(
    req: HttpRequest,
    query: web::Query<DeleteUsersQuery>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .delete_users_by_role(query.into_inner(), &req)
        .await
}

pub async fn get_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.get_user(user_id.0, &req).await
}

pub async fn update_user(
    req: HttpRequest,
    user_id: SafeIDI64,
    update_data: web::Json<UpdateUserRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_user(user_id.0, update_data.into_inner(), &req)
        .await
}

pub async fn delete_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    USER_SERVICE.delete_user(user_id.0, &req).await
}

pub async fn list_assignments(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.list_assignments(&req, user_id.0).await
}

pub async fn replace_assignments(
    req: HttpRequest,
    user_id: SafeIDI64,
    body: web::Json<ReplaceAssignmentsRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .replace_assignments(&req, user_id.0, body.into_inner())
        .await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::manager_roles()))
                    .route("", web::get().to(list_users))
                    .route("", web::post().to(create_user))
                    .route("", web::delete().to(delete_users_by_role))
                    .route("/bulk", web::post().to(bulk_create_teachers))
                    .route("/{id}", web::get().to(get_user))
                    .route("/{id}", web::put().to(update_user))
                    .route("/{id}", web::delete().to(delete_user))
                    .route("/{id}/assignments", web::get().to(list_assignments))
                    .route("/{id}/assignments", web::put().to(replace_assignments)),
            ),
    );
}
