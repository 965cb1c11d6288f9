// ==========================================
// 志愿者排班系统 - 排班校验引擎
// ==========================================
// 职责: 对活动最终排班状态做只读一致性检查
// 输出: 结构化告警（级别 + 文案 + 关联主体），展示层据级别渲染图标
// 检查顺序: 占用 -> 限制违规 -> 时间冲突/过载 -> 队长合规 -> 数据一致性
// ==========================================

use crate::domain::person::MAX_RESTRICTIONS_PER_PERSON;
use crate::domain::time_window::TimeWindow;
use crate::domain::types::{AttendanceStatus, WarningSeverity};
use crate::repository::assignment_repo::AssignmentDetailRow;
use crate::repository::{AssignmentRepository, PersonRepository};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// PlanWarning - 排班告警
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanWarning {
    pub severity: WarningSeverity, // 告警级别
    pub message: String,           // 展示文案
    pub shift_ids: Vec<i64>,       // 关联班次
    pub person_ids: Vec<i64>,      // 关联人员
}

impl PlanWarning {
    fn hard(message: String, shift_ids: Vec<i64>, person_ids: Vec<i64>) -> Self {
        Self {
            severity: WarningSeverity::Hard,
            message,
            shift_ids,
            person_ids,
        }
    }

    fn soft(message: String, shift_ids: Vec<i64>, person_ids: Vec<i64>) -> Self {
        Self {
            severity: WarningSeverity::Soft,
            message,
            shift_ids,
            person_ids,
        }
    }
}

// ==========================================
// PlanValidator - 排班校验引擎
// ==========================================
pub struct PlanValidator {
    assignment_repo: Arc<AssignmentRepository>,
    person_repo: Arc<PersonRepository>,
}

impl PlanValidator {
    /// 创建新的 PlanValidator 实例
    pub fn new(
        assignment_repo: Arc<AssignmentRepository>,
        person_repo: Arc<PersonRepository>,
    ) -> Self {
        Self {
            assignment_repo,
            person_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 校验活动排班，累加全部适用的告警（只读，无副作用）
    ///
    /// 同一班次/人员可能出现在多条告警中（检查互不排斥）
    #[instrument(skip(self))]
    pub fn validate(&self, event_id: i64) -> Result<Vec<PlanWarning>, Box<dyn Error>> {
        let mut warnings = Vec::new();

        // ==========================================
        // 检查 1: 班次占用（空班优先于人手不足，0 人只报"空班"）
        // ==========================================
        let occupancy = self.assignment_repo.list_shift_occupancy(event_id)?;
        for shift in &occupancy {
            if shift.assigned_count == 0 {
                warnings.push(PlanWarning::hard(
                    format!(
                        "班次 '{}' ({}) 完全无人值守。",
                        shift.task_name,
                        shift.start_time.format("%H:%M")
                    ),
                    vec![shift.shift_id],
                    vec![],
                ));
            } else if shift.assigned_count < shift.required_people {
                warnings.push(PlanWarning::soft(
                    format!(
                        "班次 '{}' ({}) 人手不足 ({}/{})。",
                        shift.task_name,
                        shift.start_time.format("%H:%M"),
                        shift.assigned_count,
                        shift.required_people
                    ),
                    vec![shift.shift_id],
                    vec![],
                ));
            }
        }

        // ==========================================
        // 检查 2: 限制违规（逐条排班检查; 限制可能在排班之后才添加）
        // ==========================================
        let details = self.assignment_repo.list_event_assignment_details(event_id)?;

        let mut restrictions_cache: HashMap<i64, HashSet<i64>> = HashMap::new();
        let mut person_order: Vec<i64> = Vec::new();
        let mut person_rows: HashMap<i64, Vec<&AssignmentDetailRow>> = HashMap::new();

        for row in &details {
            if !restrictions_cache.contains_key(&row.person_id) {
                restrictions_cache
                    .insert(row.person_id, self.person_repo.get_restrictions(row.person_id)?);
            }
            if restrictions_cache[&row.person_id].contains(&row.duty_type_id) {
                warnings.push(PlanWarning::hard(
                    format!(
                        "{} 被排入 '{}'，但该勤务类型在其限制清单内。",
                        row.display_name, row.task_name
                    ),
                    vec![row.shift_id],
                    vec![row.person_id],
                ));
            }

            if !person_rows.contains_key(&row.person_id) {
                person_order.push(row.person_id);
            }
            person_rows.entry(row.person_id).or_default().push(row);
        }

        // ==========================================
        // 检查 3: 人员维度: 时间冲突 / 连班 / 过载
        // ==========================================
        for person_id in &person_order {
            let rows = &person_rows[person_id];
            let name = &rows[0].display_name;

            let mut windows: Vec<(TimeWindow, &AssignmentDetailRow)> = rows
                .iter()
                .map(|row| {
                    (
                        TimeWindow::from_shift(row.shift_date, row.start_time, row.end_time),
                        *row,
                    )
                })
                .collect();
            windows.sort_by_key(|(window, _)| window.start);

            for i in 0..windows.len() {
                let (current, current_row) = &windows[i];
                for (other, other_row) in windows.iter().skip(i + 1) {
                    if current.conflicts_with(other) {
                        warnings.push(PlanWarning::hard(
                            format!(
                                "{} 有时间重叠的班次: '{}' 与 '{}'。",
                                name, current_row.task_name, other_row.task_name
                            ),
                            vec![current_row.shift_id, other_row.shift_id],
                            vec![*person_id],
                        ));
                    }
                    if current.end == other.start {
                        warnings.push(PlanWarning::soft(
                            format!(
                                "{} 连续值守（无休息间隔）: '{}' -> '{}'。",
                                name, current_row.task_name, other_row.task_name
                            ),
                            vec![current_row.shift_id, other_row.shift_id],
                            vec![*person_id],
                        ));
                    }
                }
            }

            if rows.len() > 2 {
                warnings.push(PlanWarning::soft(
                    format!("{} 被排了 {} 个班次（建议不超过 2 个）。", name, rows.len()),
                    rows.iter().map(|row| row.shift_id).collect(),
                    vec![*person_id],
                ));
            }
        }

        // ==========================================
        // 检查 4: 队长合规（有人值守但无队长）
        // ==========================================
        let occupancy_by_id: HashMap<i64, _> =
            occupancy.iter().map(|shift| (shift.shift_id, shift)).collect();
        for shift_id in self.assignment_repo.shifts_missing_team_leader(event_id)? {
            if let Some(shift) = occupancy_by_id.get(&shift_id) {
                warnings.push(PlanWarning::soft(
                    format!(
                        "班次 '{}' ({}) 未配队长。",
                        shift.task_name,
                        shift.start_time.format("%H:%M")
                    ),
                    vec![shift_id],
                    vec![],
                ));
            }
        }

        // ==========================================
        // 检查 5: 数据一致性巡检（容忍脏数据，报告而不中断）
        // ==========================================
        for assignment in self.assignment_repo.list_full_for_event(event_id)? {
            if assignment.attendance_status == AttendanceStatus::DoneViaSubstitute
                && assignment.substitute_person_id.is_none()
            {
                warnings.push(PlanWarning::soft(
                    format!(
                        "排班 #{} 标记为替班完成，但缺少替班人员记录。",
                        assignment.assignment_id
                    ),
                    vec![assignment.shift_id],
                    vec![assignment.person_id],
                ));
            }
        }

        for person_id in &person_order {
            let restriction_count = restrictions_cache[person_id].len();
            if restriction_count > MAX_RESTRICTIONS_PER_PERSON {
                let name = &person_rows[person_id][0].display_name;
                warnings.push(PlanWarning::soft(
                    format!(
                        "{} 的受限勤务类型超过上限 ({}/{})。",
                        name, restriction_count, MAX_RESTRICTIONS_PER_PERSON
                    ),
                    vec![],
                    vec![*person_id],
                ));
            }
        }

        Ok(warnings)
    }
}
