// ==========================================
// 志愿者排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod duty_type;
pub mod event;
pub mod person;
pub mod time_window;
pub mod types;

// 重导出核心类型
pub use assignment::{Assignment, AttendanceLogRow, EventAssignmentRow};
pub use duty_type::DutyType;
pub use event::{Event, EventCopyMode, EventUpdate, Shift, ShiftUpdate, Task, TaskUpdate};
pub use person::{Competency, Person, PersonUpdate};
pub use time_window::TimeWindow;
pub use types::{AttendanceStatus, EventStatus, PersonStatus, WarningSeverity};
