//! 按角色组合仪表盘

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::models::dashboard::{DashboardPanel, DashboardResponse};
use crate::models::users::entities::{User, UserRole};
use crate::services::current_user;

pub struct DashboardService;

impl DashboardService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub async fn get_dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match current_user(request) {
            Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                compose_dashboard(user),
                "Dashboard retrieved successfully",
            ))),
            Err(resp) => Ok(resp),
        }
    }
}

pub fn portal_title(role: UserRole) -> &'static str {
    match role {
        UserRole::Superadmin => "Super Admin Portal",
        UserRole::Admin => "Admin Portal",
        UserRole::Principal => "Principal Portal",
        UserRole::Teacher => "Teacher Portal",
    }
}

/// 角色对应的面板，新增角色时必须在这里补充
pub fn panels_for(role: UserRole) -> Vec<DashboardPanel> {
    let manage = |role: UserRole| DashboardPanel::AccountManagement {
        roles: role.managed_roles().to_vec(),
    };
    match role {
        UserRole::Superadmin | UserRole::Admin => vec![
            manage(role),
            DashboardPanel::TodayAttendance,
            DashboardPanel::AttendanceTrends,
        ],
        UserRole::Principal => vec![
            DashboardPanel::TodayAttendance,
            DashboardPanel::AttendanceTrends,
        ],
        UserRole::Teacher => vec![DashboardPanel::MyClasses, DashboardPanel::AttendanceTrends],
    }
}

pub fn compose_dashboard(user: User) -> DashboardResponse {
    DashboardResponse {
        role: user.role,
        portal_title: portal_title(user.role).to_string(),
        panels: panels_for(user.role),
        user,
    }
}
