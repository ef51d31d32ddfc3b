use chrono::{Days, NaiveDate};

use super::scope::ClassScope;
use crate::errors::Result;
use crate::models::attendance::entities::AttendanceWithClass;
use crate::storage::AttendanceSource;

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// 趋势天数（含今天）
    pub const TREND_DAYS: u64 = 7;

    /// 截止到今天的 7 天
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today
                .checked_sub_days(Days::new(Self::TREND_DAYS - 1))
                .unwrap_or(today),
            end: today,
        }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }
}

/// 按范围拉取考勤记录，结果按日期升序
///
/// 范围为空时直接返回，不访问存储。
pub async fn fetch_records<S>(
    source: &S,
    range: DateRange,
    scope: &ClassScope,
) -> Result<Vec<AttendanceWithClass>>
where
    S: AttendanceSource + ?Sized,
{
    if scope.is_empty() {
        return Ok(Vec::new());
    }

    source
        .list_attendance_between(range.start, range.end, scope.as_filter())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_week_covers_seven_days() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let range = DateRange::trailing_week(today);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, today);
    }

    #[test]
    fn test_trailing_week_crosses_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let range = DateRange::trailing_week(today);
        // 2024 年是闰年
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
    }
}
