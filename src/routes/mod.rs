pub mod assignments;

pub mod attendance;

pub mod auth;

pub mod classes;

pub mod dashboard;

pub mod users;

pub use assignments::configure_assignments_routes;
pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use users::configure_user_routes;
