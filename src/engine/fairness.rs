// ==========================================
// 志愿者排班系统 - 公平分引擎
// ==========================================
// 职责: 由历史出勤记录计算人员公平分
// 计分: 替班完成 +1 / 本人完成 +1 / 未出勤 -2 / 其余 0
// 红线: 上游脏数据（无法解析的出勤状态）按"无贡献"处理，不中断计算
// ==========================================

use crate::domain::types::{AttendanceStatus, PersonStatus};
use crate::repository::AssignmentRepository;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// PersonScore - 人员公平分
// ==========================================
#[derive(Debug, Clone)]
pub struct PersonScore {
    pub person_id: i64,       // 人员ID
    pub name: String,         // 显示名
    pub status: PersonStatus, // 人员状态
    pub total_score: i64,     // 总分
}

// ==========================================
// FairnessScorer - 公平分引擎
// ==========================================
pub struct FairnessScorer {
    assignment_repo: Arc<AssignmentRepository>,
}

impl FairnessScorer {
    /// 创建新的 FairnessScorer 实例
    pub fn new(assignment_repo: Arc<AssignmentRepository>) -> Self {
        Self { assignment_repo }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算公平分排行（总分降序）
    ///
    /// # 参数
    /// - `include_inactive`: false 时仅保留 ACTIVE/PASSIVE 人员
    /// - `limit`: 每人只计入最近 N 条出勤记录（None 为全量）
    ///
    /// 计数窗口规则: 出勤行按"最近活动优先"逐条计数，计数超过 limit 后
    /// 该人员后续行不再产生分数贡献（历史仍被遍历，贡献被跳过）。
    #[instrument(skip(self))]
    pub fn historical_scores(
        &self,
        include_inactive: bool,
        limit: Option<u32>,
    ) -> Result<Vec<PersonScore>, Box<dyn Error>> {
        let mut scores = self.score_table(limit)?;
        if !include_inactive {
            scores.retain(|s| s.status.is_schedulable());
        }
        scores.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        Ok(scores)
    }

    /// 公平分查找表（person_id -> 总分，包含全部人员）
    ///
    /// 供候选人评分器使用，不排序
    pub fn score_lookup(&self, limit: Option<u32>) -> Result<HashMap<i64, i64>, Box<dyn Error>> {
        let scores = self.score_table(limit)?;
        Ok(scores
            .into_iter()
            .map(|s| (s.person_id, s.total_score))
            .collect())
    }

    /// 遍历历史出勤行并累加分数（首次出现顺序）
    fn score_table(&self, limit: Option<u32>) -> Result<Vec<PersonScore>, Box<dyn Error>> {
        let rows = self.assignment_repo.attendance_log()?;

        let mut order: Vec<i64> = Vec::new();
        let mut scores: HashMap<i64, PersonScore> = HashMap::new();
        let mut counted: HashMap<i64, u32> = HashMap::new();

        for row in rows {
            let person_id = row.person_id;
            if !scores.contains_key(&person_id) {
                order.push(person_id);
                scores.insert(
                    person_id,
                    PersonScore {
                        person_id,
                        name: row.display_name.clone(),
                        status: row.status,
                        total_score: 0,
                    },
                );
                counted.insert(person_id, 0);
            }

            // 无出勤历史的人员以空行出现，保持 0 分
            let Some(status_raw) = row.attendance_status.as_deref() else {
                continue;
            };

            // 计数先于贡献: 超出窗口的行仍被计数、不再计分
            let counter = counted.entry(person_id).or_insert(0);
            *counter += 1;
            if let Some(limit) = limit {
                if *counter > limit {
                    continue;
                }
            }

            let delta = if row.substitute_person_id == Some(person_id) {
                // 作为替班者完成他人班次
                1
            } else if row.assigned_person_id == Some(person_id) {
                match AttendanceStatus::from_db_str(status_raw) {
                    Some(AttendanceStatus::Done) => 1,
                    Some(AttendanceStatus::NoShow) => -2,
                    // PLANNED / EXCUSED / DONE_VIA_SUBSTITUTE(本人) / 脏数据: 无贡献
                    _ => 0,
                }
            } else {
                0
            };

            if let Some(entry) = scores.get_mut(&person_id) {
                entry.total_score += delta;
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|person_id| scores.remove(&person_id))
            .collect())
    }
}
