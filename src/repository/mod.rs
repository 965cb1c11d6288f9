// ==========================================
// 志愿者排班系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: 日期列存 `%Y-%m-%d`，时刻列存 `%H:%M`，解析失败立即报错（不猜测）
// ==========================================

pub mod assignment_repo;
pub mod duty_type_repo;
pub mod error;
pub mod event_repo;
pub mod person_repo;

// 重导出核心仓储
pub use assignment_repo::{
    AssignedPersonRow, AssignmentDetailRow, AssignmentRepository, ShiftOccupancyRow,
};
pub use duty_type_repo::DutyTypeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use event_repo::{EventRepository, ShiftRepository, TaskRepository};
pub use person_repo::PersonRepository;

use chrono::{NaiveDate, NaiveTime};

// ==========================================
// 文本列解析辅助（统一失败语义）
// ==========================================

/// 将文本列解析失败转为 rusqlite 转换错误（在 query_row 闭包内可用 `?` 传播）
fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(message),
    )
}

/// 解析日期列（`%Y-%m-%d`）
pub(crate) fn parse_date_col(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("无效的日期 '{}': {}", raw, e)))
}

/// 解析时刻列（`%H:%M`）
pub(crate) fn parse_time_col(idx: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|e| conversion_error(idx, format!("无效的时刻 '{}': {}", raw, e)))
}

/// 通过解析函数解析枚举列（SCREAMING_SNAKE_CASE 状态值）
pub(crate) fn parse_enum_col<T>(
    idx: usize,
    raw: &str,
    parse: fn(&str) -> Option<T>,
    what: &str,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| conversion_error(idx, format!("无效的{} '{}'", what, raw)))
}
