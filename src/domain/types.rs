// ==========================================
// 志愿者排班系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 人员状态 (Person Status)
// ==========================================
// 只有 ACTIVE / PASSIVE 可被排班
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonStatus {
    Active,  // 现役
    Passive, // 预备
    Resting, // 休眠
    Exited,  // 退出
}

impl PersonStatus {
    /// 是否可被排入班次
    pub fn is_schedulable(&self) -> bool {
        matches!(self, PersonStatus::Active | PersonStatus::Passive)
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(PersonStatus::Active),
            "PASSIVE" => Some(PersonStatus::Passive),
            "RESTING" => Some(PersonStatus::Resting),
            "EXITED" => Some(PersonStatus::Exited),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PersonStatus::Active => "ACTIVE",
            PersonStatus::Passive => "PASSIVE",
            PersonStatus::Resting => "RESTING",
            PersonStatus::Exited => "EXITED",
        }
    }
}

impl fmt::Display for PersonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 活动状态 (Event Status)
// ==========================================
// COMPLETED 后排班操作关闭；复盘只看 COMPLETED / ACTIVE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Planning,  // 筹备中
    Active,    // 进行中
    Completed, // 已结束
    Cancelled, // 已取消
}

impl EventStatus {
    /// 排班操作（指派/清空/自动提案）是否允许
    pub fn is_editable(&self) -> bool {
        !matches!(self, EventStatus::Completed)
    }

    /// 是否进入复盘范围（出勤登记/工时统计）
    pub fn is_reviewable(&self) -> bool {
        matches!(self, EventStatus::Completed | EventStatus::Active)
    }

    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLANNING" => Some(EventStatus::Planning),
            "ACTIVE" => Some(EventStatus::Active),
            "COMPLETED" => Some(EventStatus::Completed),
            "CANCELLED" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EventStatus::Planning => "PLANNING",
            EventStatus::Active => "ACTIVE",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 出勤状态 (Attendance Status)
// ==========================================
// DONE_VIA_SUBSTITUTE 必须携带 substitute_person_id（写入层强制）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Planned,           // 已排班（默认）
    Done,              // 已完成
    DoneViaSubstitute, // 由替班者完成
    NoShow,            // 未出勤
    Excused,           // 请假
}

impl AttendanceStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLANNED" => Some(AttendanceStatus::Planned),
            "DONE" => Some(AttendanceStatus::Done),
            "DONE_VIA_SUBSTITUTE" => Some(AttendanceStatus::DoneViaSubstitute),
            "NO_SHOW" => Some(AttendanceStatus::NoShow),
            "EXCUSED" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Planned => "PLANNED",
            AttendanceStatus::Done => "DONE",
            AttendanceStatus::DoneViaSubstitute => "DONE_VIA_SUBSTITUTE",
            AttendanceStatus::NoShow => "NO_SHOW",
            AttendanceStatus::Excused => "EXCUSED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 校验告警级别 (Warning Severity)
// ==========================================
// HARD: 计划不可用（冲突/违规）; SOFT: 建议关注
// 展示层据此渲染图标，核心层不依赖字符串前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSeverity {
    Hard,
    Soft,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningSeverity::Hard => write!(f, "HARD"),
            WarningSeverity::Soft => write!(f, "SOFT"),
        }
    }
}
