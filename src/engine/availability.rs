// ==========================================
// 志愿者排班系统 - 可用性过滤引擎
// ==========================================
// 红线: 时间硬冲突的人员一律不返回（即使作为低优先候选）
// ==========================================
// 职责: 计算某班次的可排候选人
// 输入: shift_id
// 输出: CandidateInfo 列表（含软告警与胜任标记）
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::domain::types::PersonStatus;
use crate::repository::error::RepositoryError;
use crate::repository::{
    AssignmentRepository, PersonRepository, ShiftRepository, TaskRepository,
};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CandidateInfo - 候选人信息
// ==========================================
#[derive(Debug, Clone)]
pub struct CandidateInfo {
    pub person_id: i64,            // 人员ID
    pub display_name: String,      // 显示名
    pub status: PersonStatus,      // 人员状态
    pub has_competence: bool,      // 是否具备该班次勤务类型的胜任
    pub is_team_leader: bool,      // 胜任是否为队长级
    pub warnings: Vec<String>,     // 软告警（连班/多班次）
}

impl CandidateInfo {
    /// 告警拼接文本（展示层直接使用）
    pub fn warning_text(&self) -> String {
        self.warnings.join(", ")
    }
}

// ==========================================
// AvailabilityEngine - 可用性过滤引擎
// ==========================================
pub struct AvailabilityEngine {
    shift_repo: Arc<ShiftRepository>,
    task_repo: Arc<TaskRepository>,
    person_repo: Arc<PersonRepository>,
    assignment_repo: Arc<AssignmentRepository>,
}

impl AvailabilityEngine {
    /// 创建新的 AvailabilityEngine 实例
    pub fn new(
        shift_repo: Arc<ShiftRepository>,
        task_repo: Arc<TaskRepository>,
        person_repo: Arc<PersonRepository>,
        assignment_repo: Arc<AssignmentRepository>,
    ) -> Self {
        Self {
            shift_repo,
            task_repo,
            person_repo,
            assignment_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算某班次的可排候选人
    ///
    /// 规则:
    /// 1) 结构过滤: 状态 ACTIVE/PASSIVE、未对该勤务类型设限、未在本班次上
    /// 2) 时间硬冲突（活动内其他排班与本班次时间窗重叠）: 整体排除
    /// 3) 首尾相接: 保留并附加"连班无休"软告警
    /// 4) 活动内已有 >= 2 个班次: 附加"N 个班次"软告警
    /// 5) 附加勤务胜任与队长标记
    ///
    /// 返回顺序为手工指派选人器的默认展示序:
    /// (队长 desc, 胜任 desc, 无告警 desc, 显示名 asc)
    ///
    /// # 错误
    /// - 班次不存在: NotFound（快速失败）
    /// - 班次的任务链断裂: 返回空列表（正常的"无可排"状态）
    #[instrument(skip(self))]
    pub fn available_candidates(
        &self,
        shift_id: i64,
    ) -> Result<Vec<CandidateInfo>, Box<dyn Error>> {
        let shift = self
            .shift_repo
            .find_by_id(shift_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Shift".to_string(),
                id: shift_id.to_string(),
            })?;

        // 任务链断裂时不是错误，而是"无可排"
        let task = match self.task_repo.find_by_id(shift.task_id)? {
            Some(task) => task,
            None => return Ok(Vec::new()),
        };

        let new_window = shift.time_window();

        let potential = self
            .person_repo
            .list_candidates_for_duty(task.duty_type_id, shift_id)?;
        if potential.is_empty() {
            return Ok(Vec::new());
        }

        // 活动内既有排班: 时间窗与班次数一次性装载
        let mut person_schedule: HashMap<i64, Vec<TimeWindow>> = HashMap::new();
        let mut duties_count: HashMap<i64, i64> = HashMap::new();
        for row in self.assignment_repo.list_for_event(task.event_id)? {
            let window = TimeWindow::from_shift(row.shift_date, row.start_time, row.end_time);
            person_schedule.entry(row.person_id).or_default().push(window);
            *duties_count.entry(row.person_id).or_insert(0) += 1;
        }

        let mut candidates = Vec::new();
        for person in potential {
            let mut has_conflict = false;
            let mut consecutive_warning = false;

            if let Some(windows) = person_schedule.get(&person.person_id) {
                for other in windows {
                    if new_window.conflicts_with(other) {
                        has_conflict = true;
                        break;
                    }
                    if new_window.back_to_back_with(other) {
                        consecutive_warning = true;
                    }
                }
            }

            // 硬冲突: 整体排除
            if has_conflict {
                continue;
            }

            let mut warnings = Vec::new();
            if consecutive_warning {
                warnings.push("连班无休".to_string());
            }
            let duties = duties_count.get(&person.person_id).copied().unwrap_or(0);
            if duties >= 2 {
                warnings.push(format!("已有 {} 个班次", duties));
            }

            let competency = self
                .person_repo
                .get_competency(person.person_id, task.duty_type_id)?;

            candidates.push(CandidateInfo {
                person_id: person.person_id,
                display_name: person.display_name,
                status: person.status,
                has_competence: competency.is_some(),
                is_team_leader: competency.map(|c| c.is_team_leader).unwrap_or(false),
                warnings,
            });
        }

        candidates.sort_by(|a, b| {
            b.is_team_leader
                .cmp(&a.is_team_leader)
                .then(b.has_competence.cmp(&a.has_competence))
                .then(b.warnings.is_empty().cmp(&a.warnings.is_empty()))
                .then(a.display_name.cmp(&b.display_name))
        });

        Ok(candidates)
    }
}
