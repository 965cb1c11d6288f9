// ==========================================
// 志愿者排班系统 - 活动/任务/班次领域模型
// ==========================================
// 层级: Event -> Task (绑定勤务类型) -> Shift (时间槽位)
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::domain::types::EventStatus;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Event - 活动
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: i64,                // 活动ID
    pub name: String,                 // 活动名称
    pub start_date: NaiveDate,        // 开始日期
    pub end_date: Option<NaiveDate>,  // 结束日期（单日活动为空）
    pub status: EventStatus,          // 活动状态
}

impl Event {
    /// 排班操作是否允许（COMPLETED 后关闭）
    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    /// 是否进入复盘范围
    pub fn is_reviewable(&self) -> bool {
        self.status.is_reviewable()
    }
}

/// 活动部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
    }
}

// ==========================================
// EventCopyMode - 活动复制模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCopyMode {
    StructureOnly, // 只复制任务结构
    WithShifts,    // 复制任务与班次（日期随新开始日平移）
    Full,          // 连同排班一起复制（出勤状态重置为 PLANNED）
}

// ==========================================
// Task - 任务
// ==========================================
// 一个任务是某勤务类型在一个活动中的具体实例
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i64,                // 任务ID
    pub event_id: i64,               // 所属活动
    pub duty_type_id: i64,           // 勤务类型
    pub name: String,                // 任务名称
    pub description: Option<String>, // 说明
}

/// 任务部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub duty_type_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.duty_type_id.is_none() && self.name.is_none() && self.description.is_none()
    }
}

// ==========================================
// Shift - 班次
// ==========================================
// 时间约定: end_time <= start_time 表示跨入次日（TimeWindow 统一规约）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub shift_id: i64,         // 班次ID
    pub task_id: i64,          // 所属任务
    pub shift_date: NaiveDate, // 班次日期
    pub start_time: NaiveTime, // 开始时刻
    pub end_time: NaiveTime,   // 结束时刻
    pub required_people: i64,  // 需求人数 (>=1)
}

impl Shift {
    /// 规约后的时间窗
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::from_shift(self.shift_date, self.start_time, self.end_time)
    }
}

/// 班次部分更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftUpdate {
    #[serde(default)]
    pub shift_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub required_people: Option<i64>,
}

impl ShiftUpdate {
    pub fn is_empty(&self) -> bool {
        self.shift_date.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.required_people.is_none()
    }
}
