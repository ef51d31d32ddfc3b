use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::LastLogin).big_integer().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建班级表
        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Classes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Classes::ClassNumber).integer().not_null())
                    .col(ColumnDef::new(Classes::Section).string().not_null())
                    .col(
                        ColumnDef::new(Classes::TotalStudents)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Classes::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Classes::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建教师分配表
        manager
            .create_table(
                Table::create()
                    .table(TeacherAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeacherAssignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::TeacherId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::IsIncharge)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TeacherAssignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherAssignments::Table, TeacherAssignments::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TeacherAssignments::Table, TeacherAssignments::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考勤记录表
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::ClassId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::AttendanceDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::PresentCount)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::MarkedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::MarkedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceRecords::Table, AttendanceRecords::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceRecords::Table, AttendanceRecords::MarkedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_classes_number_section")
                    .table(Classes::Table)
                    .col(Classes::ClassNumber)
                    .col(Classes::Section)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_teacher_assignments_teacher_class")
                    .table(TeacherAssignments::Table)
                    .col(TeacherAssignments::TeacherId)
                    .col(TeacherAssignments::ClassId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teacher_assignments_class_id")
                    .table(TeacherAssignments::Table)
                    .col(TeacherAssignments::ClassId)
                    .to_owned(),
            )
            .await?;

        // 每个班级最多一名班主任
        let one_incharge = match manager.get_database_backend() {
            // MySQL 不支持部分索引，用生成列承载班主任的班级 ID
            DbBackend::MySql => {
                "ALTER TABLE teacher_assignments \
                 ADD COLUMN incharge_class_id BIGINT \
                 GENERATED ALWAYS AS (IF(is_incharge, class_id, NULL)) STORED, \
                 ADD UNIQUE INDEX uq_teacher_assignments_incharge (incharge_class_id)"
            }
            _ => {
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_teacher_assignments_incharge \
                 ON teacher_assignments (class_id) WHERE is_incharge"
            }
        };
        manager
            .get_connection()
            .execute_unprepared(one_incharge)
            .await?;

        // 同一班级每天只有一条考勤记录，upsert 依赖此索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_attendance_records_class_date")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::ClassId)
                    .col(AttendanceRecords::AttendanceDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_records_date")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::AttendanceDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeacherAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Classes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    FullName,
    PasswordHash,
    Role,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Classes {
    #[sea_orm(iden = "classes")]
    Table,
    Id,
    ClassNumber,
    Section,
    TotalStudents,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TeacherAssignments {
    #[sea_orm(iden = "teacher_assignments")]
    Table,
    Id,
    TeacherId,
    ClassId,
    IsIncharge,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AttendanceRecords {
    #[sea_orm(iden = "attendance_records")]
    Table,
    Id,
    ClassId,
    AttendanceDate,
    PresentCount,
    MarkedBy,
    MarkedAt,
}
