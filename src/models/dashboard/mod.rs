use serde::Serialize;
use ts_rs::TS;

use crate::models::users::entities::{User, UserRole};

/// 仪表盘面板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum DashboardPanel {
    /// 账号管理，列出可管理的角色
    AccountManagement { roles: Vec<UserRole> },
    TodayAttendance,
    AttendanceTrends,
    /// 教师自己的班级与考勤登记
    MyClasses,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DashboardResponse {
    pub role: UserRole,
    pub portal_title: String,
    pub user: User,
    pub panels: Vec<DashboardPanel>,
}
