//! 预导入模块，方便使用

pub use super::attendance_records::{
    ActiveModel as AttendanceRecordActiveModel, Entity as AttendanceRecords,
    Model as AttendanceRecordModel,
};
pub use super::classes::{ActiveModel as ClassActiveModel, Entity as Classes, Model as ClassModel};
pub use super::teacher_assignments::{
    ActiveModel as TeacherAssignmentActiveModel, Entity as TeacherAssignments,
    Model as TeacherAssignmentModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
