// ==========================================
// 志愿者排班系统 - 自动提案引擎
// ==========================================
// 职责: 两遍贪心填充活动的全部班次
// 第 1 遍: 为缺队长的班次配队长; 第 2 遍: 补齐剩余空位
// 红线: 运行期计数只存在于 ProposalContext，运行结束前不回读存储;
//       同一活动的两次提案运行不得交错（排他由调用方保证）
// 约定: 不清空既有排班（需要重排时调用方先执行"重置排班"）
// ==========================================

use crate::domain::time_window::TimeWindow;
use crate::engine::availability::{AvailabilityEngine, CandidateInfo};
use crate::engine::fairness::FairnessScorer;
use crate::engine::ranking::{CandidateRanker, ProposalContext};
use crate::repository::{AssignmentRepository, ShiftRepository};
use rand::Rng;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// ProposalOutcome - 提案结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ProposalOutcome {
    pub run_id: Uuid,        // 本次运行ID（日志关联）
    pub assigned_count: i64, // 已排人数
    pub required_count: i64, // 总需求人数
}

// ==========================================
// ProposalGenerator - 自动提案引擎
// ==========================================
pub struct ProposalGenerator {
    shift_repo: Arc<ShiftRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    availability: AvailabilityEngine,
    fairness: FairnessScorer,
    ranker: CandidateRanker,
}

impl ProposalGenerator {
    /// 创建新的 ProposalGenerator 实例
    pub fn new(
        shift_repo: Arc<ShiftRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        availability: AvailabilityEngine,
        fairness: FairnessScorer,
        ranker: CandidateRanker,
    ) -> Self {
        Self {
            shift_repo,
            assignment_repo,
            availability,
            fairness,
            ranker,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成活动的排班提案（非幂等，提交即写入）
    ///
    /// 班次遍历顺序: (日期, 开始时刻)。每个班次:
    /// - 候选为空或最佳分低于淘汰阈值: 跳过/停止补位（留给校验器报告缺口）
    /// - 与最佳分差距在带宽内的候选构成 top tier，从中等概率随机抽取
    ///
    /// # 参数
    /// - `history_limit`: 公平分只计最近 N 条出勤记录（None 为全量）
    /// - `rng`: 随机源（注入以便测试固定种子）
    ///
    /// # 返回
    /// (已排人数, 总需求人数) 的运行结果
    #[instrument(skip(self, rng))]
    pub fn generate(
        &self,
        event_id: i64,
        history_limit: Option<u32>,
        rng: &mut impl Rng,
    ) -> Result<ProposalOutcome, Box<dyn Error>> {
        let run_id = Uuid::new_v4();

        // 历史公平分快照: 包含非现役人员，整个运行期共用一份
        let history = self.fairness.score_lookup(history_limit)?;
        let mut ctx = ProposalContext::new();

        let shifts = self.shift_repo.list_for_event(event_id)?;
        tracing::info!(%run_id, shift_count = shifts.len(), "开始生成排班提案");

        // ==========================================
        // 第 1 遍: 队长遴选
        // ==========================================
        for shift in &shifts {
            let assigned = self.assignment_repo.list_for_shift(shift.shift_id)?;
            let has_team_leader = assigned.iter().any(|p| p.is_team_leader);
            let is_full = assigned.len() as i64 >= shift.required_people;
            if has_team_leader || is_full {
                continue;
            }

            let window = shift.time_window();
            let candidates: Vec<CandidateInfo> = self
                .availability
                .available_candidates(shift.shift_id)?
                .into_iter()
                .filter(|c| c.is_team_leader)
                .collect();
            if candidates.is_empty() {
                continue;
            }

            let scored = self.score_all(candidates, &window, &history, &ctx, true);
            let best = scored[0].0;
            if best < self.ranker.profile().disqualify_threshold {
                tracing::debug!(%run_id, shift_id = shift.shift_id, best, "队长候选全部淘汰，跳过");
                continue;
            }

            let band = self.ranker.profile().team_leader_tier_band;
            let chosen = Self::pick_from_top_tier(&scored, best - band, rng);
            self.assignment_repo.create(chosen.person_id, shift.shift_id)?;
            ctx.record(chosen.person_id, window);
            tracing::debug!(
                %run_id,
                shift_id = shift.shift_id,
                person_id = chosen.person_id,
                score = best,
                "队长已派"
            );
        }

        // ==========================================
        // 第 2 遍: 剩余空位补齐
        // ==========================================
        for shift in &shifts {
            let assigned_count = self.assignment_repo.count_for_shift(shift.shift_id)?;
            let open_slots = shift.required_people - assigned_count;
            if open_slots <= 0 {
                continue;
            }

            let window = shift.time_window();
            for _ in 0..open_slots {
                let candidates = self.availability.available_candidates(shift.shift_id)?;
                if candidates.is_empty() {
                    break;
                }

                let scored = self.score_all(candidates, &window, &history, &ctx, false);
                let best = scored[0].0;
                if best < self.ranker.profile().disqualify_threshold {
                    tracing::debug!(%run_id, shift_id = shift.shift_id, best, "补位候选全部淘汰，停止该班次");
                    break;
                }

                let band = self.ranker.profile().fill_tier_band;
                let chosen = Self::pick_from_top_tier(&scored, best - band, rng);
                self.assignment_repo.create(chosen.person_id, shift.shift_id)?;
                ctx.record(chosen.person_id, window);
            }
        }

        let (required_count, assigned_count) = self.assignment_repo.staffing_summary(event_id)?;
        tracing::info!(%run_id, assigned_count, required_count, "排班提案生成完成");

        Ok(ProposalOutcome {
            run_id,
            assigned_count,
            required_count,
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 为全部候选打分并按分数降序排列
    ///
    /// 分数相同的候选保持可用性引擎的展示序（稳定排序），
    /// 固定随机种子时整个运行可复现。
    fn score_all(
        &self,
        candidates: Vec<CandidateInfo>,
        window: &TimeWindow,
        history: &HashMap<i64, i64>,
        ctx: &ProposalContext,
        seeking_team_leader: bool,
    ) -> Vec<(i64, CandidateInfo)> {
        let mut scored: Vec<(i64, CandidateInfo)> = candidates
            .into_iter()
            .map(|c| {
                let historical = history.get(&c.person_id).copied().unwrap_or(0);
                let score =
                    self.ranker
                        .score_candidate(&c, window, historical, ctx, seeking_team_leader);
                (score, c)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
    }

    /// 从 top tier（分数 >= 下限）中等概率随机抽取
    fn pick_from_top_tier<'a, R: Rng>(
        scored: &'a [(i64, CandidateInfo)],
        floor: i64,
        rng: &mut R,
    ) -> &'a CandidateInfo {
        let tier: Vec<&CandidateInfo> = scored
            .iter()
            .take_while(|(score, _)| *score >= floor)
            .map(|(_, c)| c)
            .collect();
        tier[rng.random_range(0..tier.len())]
    }
}
