// ==========================================
// 志愿者排班系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排班决策支持核心 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 评分参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AttendanceStatus, EventStatus, PersonStatus, WarningSeverity};

// 领域实体
pub use domain::{
    Assignment, Competency, DutyType, Event, EventCopyMode, Person, PersonUpdate, Shift, Task,
    TimeWindow,
};

// 引擎
pub use engine::{
    AvailabilityEngine, CandidateInfo, CandidateRanker, FairnessScorer, PersonScore,
    PlanValidator, PlanWarning, ProposalContext, ProposalGenerator, ProposalOutcome,
    ReportEngine,
};

// 配置
pub use config::{ConfigManager, ScoringProfile};

// API
pub use api::{ApiError, ApiResult, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "志愿者排班系统";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
