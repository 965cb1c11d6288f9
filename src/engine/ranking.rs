// ==========================================
// 志愿者排班系统 - 候选人评分引擎
// ==========================================
// 职责: 自动提案期间的候选人打分（纯函数）
// 红线: 提案运行期状态只存在于调用方传入的 ProposalContext，
//       不允许任何进程级可变状态（并行的独立运行互不干扰）
// ==========================================

use crate::config::ScoringProfile;
use crate::domain::time_window::TimeWindow;
use crate::domain::types::PersonStatus;
use crate::engine::availability::CandidateInfo;
use std::collections::HashMap;

// ==========================================
// ProposalContext - 提案运行上下文
// ==========================================
// 承载一次提案运行内已选定但逻辑上"未提交"的状态:
// 每人已派班次数 + 已派班次时间窗。运行期间不回读存储。
#[derive(Debug, Default)]
pub struct ProposalContext {
    duties: HashMap<i64, i64>,
    windows: HashMap<i64, Vec<TimeWindow>>,
}

impl ProposalContext {
    /// 新建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 某人在本次运行中已派的班次数
    pub fn duty_count(&self, person_id: i64) -> i64 {
        self.duties.get(&person_id).copied().unwrap_or(0)
    }

    /// 某人在本次运行中已派的班次时间窗
    pub fn windows(&self, person_id: i64) -> &[TimeWindow] {
        self.windows
            .get(&person_id)
            .map(|w| w.as_slice())
            .unwrap_or(&[])
    }

    /// 记录一次派班
    pub fn record(&mut self, person_id: i64, window: TimeWindow) {
        *self.duties.entry(person_id).or_insert(0) += 1;
        self.windows.entry(person_id).or_default().push(window);
    }
}

// ==========================================
// CandidateRanker - 候选人评分引擎
// ==========================================
pub struct CandidateRanker {
    profile: ScoringProfile,
}

impl CandidateRanker {
    /// 创建新的 CandidateRanker 实例
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    /// 评分参数
    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 候选人综合评分
    ///
    /// 公式:
    /// ```text
    /// base             = 历史公平分 * history_weight (-10)
    /// fairness_malus   = 运行内已派班次数 * duty_malus (25)
    ///                    已派 >= overload_threshold(2) 时追加 overload_malus (10000)
    /// consecutive_malus= 每个与本班次首尾相接的已派班次 consecutive_malus (10000)
    /// status_bonus     = ACTIVE 人员 active_bonus (5)
    /// competence_bonus = 非队长遴选且具备胜任 competence_bonus (3)
    /// tl_waste_malus   = 非队长遴选且是队长 tl_waste_malus (500)
    /// final = base - fairness_malus - consecutive_malus
    ///         + status_bonus + competence_bonus - tl_waste_malus
    /// ```
    ///
    /// # 参数
    /// - `candidate`: 候选人（可用性引擎输出）
    /// - `shift_window`: 待排班次的时间窗
    /// - `historical_score`: 候选人的历史公平分（公平分引擎查表，缺省 0）
    /// - `ctx`: 本次提案运行的上下文
    /// - `seeking_team_leader`: 是否队长遴选
    pub fn score_candidate(
        &self,
        candidate: &CandidateInfo,
        shift_window: &TimeWindow,
        historical_score: i64,
        ctx: &ProposalContext,
        seeking_team_leader: bool,
    ) -> i64 {
        let base = historical_score * self.profile.history_weight;

        let duties = ctx.duty_count(candidate.person_id);
        let mut fairness_malus = duties * self.profile.duty_malus;
        if duties >= self.profile.overload_threshold {
            fairness_malus += self.profile.overload_malus;
        }

        let mut consecutive_malus = 0;
        for window in ctx.windows(candidate.person_id) {
            if shift_window.back_to_back_with(window) {
                consecutive_malus += self.profile.consecutive_malus;
            }
        }

        let status_bonus = if candidate.status == PersonStatus::Active {
            self.profile.active_bonus
        } else {
            0
        };

        let competence_bonus = if !seeking_team_leader && candidate.has_competence {
            self.profile.competence_bonus
        } else {
            0
        };

        let tl_waste_malus = if !seeking_team_leader && candidate.is_team_leader {
            self.profile.tl_waste_malus
        } else {
            0
        };

        base - fairness_malus - consecutive_malus + status_bonus + competence_bonus
            - tl_waste_malus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn candidate(person_id: i64, status: PersonStatus, competence: bool, tl: bool) -> CandidateInfo {
        CandidateInfo {
            person_id,
            display_name: format!("P{}", person_id),
            status,
            has_competence: competence,
            is_team_leader: tl,
            warnings: Vec::new(),
        }
    }

    fn window(date: (i32, u32, u32), start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::from_shift(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    fn ranker() -> CandidateRanker {
        CandidateRanker::new(ScoringProfile::default())
    }

    #[test]
    fn test_lower_history_scores_higher() {
        // 历史分越低，基础分越高（少服勤者优先）
        let ranker = ranker();
        let ctx = ProposalContext::new();
        let w = window((2026, 6, 12), (18, 0), (21, 0));
        let c = candidate(1, PersonStatus::Active, false, false);

        let low_history = ranker.score_candidate(&c, &w, -3, &ctx, false);
        let high_history = ranker.score_candidate(&c, &w, 5, &ctx, false);
        assert!(low_history > high_history);
    }

    #[test]
    fn test_second_duty_costs_25_points() {
        let ranker = ranker();
        let w1 = window((2026, 6, 12), (10, 0), (12, 0));
        let w2 = window((2026, 6, 12), (18, 0), (21, 0));
        let c = candidate(1, PersonStatus::Active, false, false);

        let fresh = ProposalContext::new();
        let mut loaded = ProposalContext::new();
        loaded.record(1, w1);

        let score_fresh = ranker.score_candidate(&c, &w2, 0, &fresh, false);
        let score_loaded = ranker.score_candidate(&c, &w2, 0, &loaded, false);
        assert_eq!(score_fresh - score_loaded, 25);
    }

    #[test]
    fn test_two_duties_effectively_disqualify() {
        let ranker = ranker();
        let w = window((2026, 6, 13), (18, 0), (21, 0));
        let c = candidate(1, PersonStatus::Active, false, false);

        let mut ctx = ProposalContext::new();
        ctx.record(1, window((2026, 6, 12), (10, 0), (12, 0)));
        ctx.record(1, window((2026, 6, 12), (14, 0), (16, 0)));

        let score = ranker.score_candidate(&c, &w, 0, &ctx, false);
        assert!(score < ranker.profile().disqualify_threshold);
    }

    #[test]
    fn test_back_to_back_proposed_shift_disqualifies() {
        let ranker = ranker();
        let c = candidate(1, PersonStatus::Active, false, false);

        let mut ctx = ProposalContext::new();
        ctx.record(1, window((2026, 6, 12), (18, 0), (21, 0)));

        let adjoining = window((2026, 6, 12), (21, 0), (23, 0));
        let score = ranker.score_candidate(&c, &adjoining, 0, &ctx, false);
        assert!(score < ranker.profile().disqualify_threshold);

        let separated = window((2026, 6, 12), (22, 0), (23, 30));
        // 重叠窗口不会出现在候选中（可用性引擎已排除），这里只验证相接罚分
        assert!(ranker.score_candidate(&c, &separated, 0, &ctx, false) > -100);
    }

    #[test]
    fn test_team_leader_wasted_on_plain_slot() {
        let ranker = ranker();
        let ctx = ProposalContext::new();
        let w = window((2026, 6, 12), (18, 0), (21, 0));

        let tl = candidate(1, PersonStatus::Active, true, true);
        let plain = candidate(2, PersonStatus::Active, true, false);

        // 普通补位: 队长被压到后面
        let tl_fill = ranker.score_candidate(&tl, &w, 0, &ctx, false);
        let plain_fill = ranker.score_candidate(&plain, &w, 0, &ctx, false);
        assert!(plain_fill > tl_fill);
        assert_eq!(plain_fill - tl_fill, 500);

        // 队长遴选: 胜任加分与浪费罚分均不适用
        let tl_seek = ranker.score_candidate(&tl, &w, 0, &ctx, true);
        assert_eq!(tl_seek, 5);
    }

    #[test]
    fn test_passive_loses_status_bonus() {
        let ranker = ranker();
        let ctx = ProposalContext::new();
        let w = window((2026, 6, 12), (18, 0), (21, 0));

        let active = candidate(1, PersonStatus::Active, false, false);
        let passive = candidate(2, PersonStatus::Passive, false, false);

        let a = ranker.score_candidate(&active, &w, 0, &ctx, false);
        let p = ranker.score_candidate(&passive, &w, 0, &ctx, false);
        assert_eq!(a - p, 5);
    }

    #[test]
    fn test_independent_contexts_do_not_interfere() {
        // 两个独立运行的上下文互不影响（回归: 进程级状态）
        let ranker = ranker();
        let w = window((2026, 6, 12), (18, 0), (21, 0));
        let c = candidate(1, PersonStatus::Active, false, false);

        let mut run_a = ProposalContext::new();
        run_a.record(1, window((2026, 6, 12), (10, 0), (12, 0)));
        let run_b = ProposalContext::new();

        assert!(
            ranker.score_candidate(&c, &w, 0, &run_b, false)
                > ranker.score_candidate(&c, &w, 0, &run_a, false)
        );
    }
}
