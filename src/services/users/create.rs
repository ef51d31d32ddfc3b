use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info, warn};

use super::{
    UserService, account_error_response, check_account_fields, ensure_can_manage, normalize_email,
};
use crate::config::{AppConfig, Argon2Config};
use crate::errors::AttendanceError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, NewUser},
        responses::UserResponse,
    },
};
use crate::services::assignments::assignment_error_response;
use crate::services::current_user;
use crate::storage::Storage;
use crate::utils::password::hash_password_async;

/// 创建失败的阶段
#[derive(Debug)]
pub enum CreateFailure {
    Account(AttendanceError),
    Assignments(AttendanceError),
}

impl From<AttendanceError> for CreateFailure {
    fn from(err: AttendanceError) -> Self {
        CreateFailure::Account(err)
    }
}

/// 创建账号，字段需事先通过 [`check_account_fields`]
///
/// 教师可以附带初始班级分配；分配失败时撤销已创建的账号。
pub async fn create_account(
    storage: &dyn Storage,
    caller: &User,
    req: CreateUserRequest,
    argon2: &Argon2Config,
) -> std::result::Result<User, CreateFailure> {
    ensure_can_manage(caller, &req.role)?;

    let assignments = req.assignments.unwrap_or_default();
    if !assignments.is_empty() && req.role != UserRole::Teacher {
        return Err(CreateFailure::Assignments(AttendanceError::validation(
            "Only teacher accounts can have class assignments",
        )));
    }

    let password_hash = hash_password_async(req.password, argon2.clone()).await?;
    let user = storage
        .create_user(NewUser {
            email: normalize_email(&req.email),
            full_name: req.full_name.trim().to_string(),
            password_hash,
            role: req.role,
        })
        .await?;

    if !assignments.is_empty()
        && let Err(e) = storage.replace_assignments(user.id, assignments).await
    {
        warn!("Assignments for new teacher {} rejected: {}", user.email, e);
        if let Err(cleanup) = storage.delete_user(user.id).await {
            error!("Failed to roll back user {}: {}", user.id, cleanup);
        }
        return Err(CreateFailure::Assignments(e));
    }

    Ok(user)
}

pub async fn create_user(
    service: &UserService,
    user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let caller = match current_user(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err((code, msg)) = check_account_fields(
        &normalize_email(&user_data.email),
        &user_data.full_name,
        &user_data.password,
    ) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(code, msg)));
    }

    let storage = service.get_storage(request)?;
    match create_account(storage.as_ref(), &caller, user_data, &AppConfig::get().argon2).await {
        Ok(user) => {
            info!("User {} ({}) created by {}", user.email, user.role, caller.id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created successfully")))
        }
        Err(CreateFailure::Assignments(e)) => Ok(assignment_error_response(&e)),
        Err(CreateFailure::Account(e @ AttendanceError::DatabaseOperation(_))) => {
            error!("User creation failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::error_empty(ErrorCode::UserCreationFailed, e.message())))
        }
        Err(CreateFailure::Account(e)) => Ok(account_error_response(&e)),
    }
}
