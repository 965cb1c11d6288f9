// ==========================================
// 志愿者排班系统 - 排班记录领域模型
// ==========================================
// 不变式: attendance_status = DONE_VIA_SUBSTITUTE 时 substitute_person_id 非空，
//         其余状态 substitute_person_id 必须为空（写入层强制，校验器兜底）
// ==========================================

use crate::domain::types::{AttendanceStatus, PersonStatus};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Assignment - 排班记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: i64,                  // 排班ID
    pub shift_id: i64,                       // 班次
    pub person_id: i64,                      // 被排人员
    pub substitute_person_id: Option<i64>,   // 实际替班人员
    pub attendance_status: AttendanceStatus, // 出勤状态
}

// ==========================================
// EventAssignmentRow - 活动内排班行（时间冲突检测输入）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAssignmentRow {
    pub person_id: i64,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ==========================================
// AttendanceLogRow - 历史出勤行（公平分/工时统计输入）
// ==========================================
// 每个人员按"最近活动优先"展开其全部出勤行（含担任替班者的行）；
// 无任何历史的人员以出勤字段全空的单行出现。
// 出勤状态保留原始字符串，解析失败按"无贡献"处理（防御上游脏数据）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceLogRow {
    pub person_id: i64,                      // 主体人员（评分对象）
    pub display_name: String,                // 显示名
    pub status: PersonStatus,                // 人员状态
    pub assigned_person_id: Option<i64>,     // 该排班的被排人员
    pub substitute_person_id: Option<i64>,   // 该排班的替班人员
    pub attendance_status: Option<String>,   // 出勤状态（原始字符串）
    pub event_start_date: Option<NaiveDate>, // 所属活动开始日期
    pub shift_date: Option<NaiveDate>,       // 班次日期
    pub start_time: Option<NaiveTime>,       // 班次开始时刻
    pub end_time: Option<NaiveTime>,         // 班次结束时刻
}
