// ==========================================
// 志愿者排班系统 - 工时与出勤统计引擎
// ==========================================
// 职责: 按人员汇总已完成工时与出勤结果（复盘报表）
// 统计口径: 本人完成 + 担任替班者完成计入工时；跨午夜班次按规约后窗口计时
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::domain::types::AttendanceStatus;
use crate::repository::AssignmentRepository;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// TimeFilter - 统计时间范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    All,         // 全部历史
    CurrentYear, // 仅当年（按活动开始日期）
}

// ==========================================
// MemberSummaryRow - 人员汇总行
// ==========================================
#[derive(Debug, Clone)]
pub struct MemberSummaryRow {
    pub person_id: i64,        // 人员ID
    pub name: String,          // 显示名
    pub total_hours: f64,      // 已完成工时（小时）
    pub total_done: i64,       // 本人完成次数
    pub total_substitute: i64, // 替班完成次数
    pub total_excused: i64,    // 请假次数
    pub total_no_show: i64,    // 未出勤次数
}

// ==========================================
// ReportEngine - 统计引擎
// ==========================================
pub struct ReportEngine {
    assignment_repo: Arc<AssignmentRepository>,
}

impl ReportEngine {
    /// 创建新的 ReportEngine 实例
    pub fn new(assignment_repo: Arc<AssignmentRepository>) -> Self {
        Self { assignment_repo }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 人员工时与出勤汇总（工时降序，同工时按姓名）
    ///
    /// 只统计 ACTIVE / PASSIVE 人员；无任何记录的人员以全零行出现。
    ///
    /// # 参数
    /// - `filter`: 统计时间范围
    /// - `today`: 当前日期（CurrentYear 过滤的年份基准）
    #[instrument(skip(self))]
    pub fn member_summary(
        &self,
        filter: TimeFilter,
        today: NaiveDate,
    ) -> Result<Vec<MemberSummaryRow>, Box<dyn Error>> {
        let rows = self.assignment_repo.attendance_log()?;

        let mut order: Vec<i64> = Vec::new();
        let mut summary: HashMap<i64, MemberSummaryRow> = HashMap::new();

        for row in rows {
            if !row.status.is_schedulable() {
                continue;
            }

            let person_id = row.person_id;
            if !summary.contains_key(&person_id) {
                order.push(person_id);
                summary.insert(
                    person_id,
                    MemberSummaryRow {
                        person_id,
                        name: row.display_name.clone(),
                        total_hours: 0.0,
                        total_done: 0,
                        total_substitute: 0,
                        total_excused: 0,
                        total_no_show: 0,
                    },
                );
            }

            let Some(status_raw) = row.attendance_status.as_deref() else {
                continue;
            };
            if filter == TimeFilter::CurrentYear {
                let in_year = row
                    .event_start_date
                    .map(|d| d.year() == today.year())
                    .unwrap_or(false);
                if !in_year {
                    continue;
                }
            }
            // 脏数据（无法解析的出勤状态）无贡献
            let Some(status) = AttendanceStatus::from_db_str(status_raw) else {
                continue;
            };

            let hours = match (row.shift_date, row.start_time, row.end_time) {
                (Some(date), Some(start), Some(end)) => {
                    TimeWindow::from_shift(date, start, end).duration_hours()
                }
                _ => 0.0,
            };

            let Some(entry) = summary.get_mut(&person_id) else {
                continue;
            };
            if row.substitute_person_id == Some(person_id) {
                // 作为替班者: 只有"替班完成"产生工时
                if status == AttendanceStatus::DoneViaSubstitute {
                    entry.total_substitute += 1;
                    entry.total_hours += hours;
                }
            } else if row.assigned_person_id == Some(person_id) {
                match status {
                    AttendanceStatus::Done => {
                        entry.total_done += 1;
                        entry.total_hours += hours;
                    }
                    AttendanceStatus::Excused => entry.total_excused += 1,
                    AttendanceStatus::NoShow => entry.total_no_show += 1,
                    _ => {}
                }
            }
        }

        let mut result: Vec<MemberSummaryRow> = order
            .into_iter()
            .filter_map(|person_id| summary.remove(&person_id))
            .collect();
        result.sort_by(|a, b| {
            b.total_hours
                .total_cmp(&a.total_hours)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(result)
    }
}
