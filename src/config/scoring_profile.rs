// ==========================================
// 志愿者排班系统 - 评分参数
// ==========================================
// 候选人评分启发式的全部量级集中在此，不在引擎内散落硬编码。
// 大额罚分（10000 级）承担"接近硬排除"的角色；淘汰阈值与其配套，
// 只要求保持"禁用级罚分压倒其他项"的相对关系，绝对值可调。
// ==========================================

use serde::{Deserialize, Serialize};

/// 评分参数（持久化对象）
///
/// 存储位置: settings 表（key='scoring_profile'，JSON）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    /// 历史公平分权重（负值: 历史分越低，基础分越高 => 少服勤者优先）
    pub history_weight: i64,

    /// 本次活动内每个已有班次的公平罚分
    pub duty_malus: i64,

    /// 触发"过载"罚分的班次数
    pub overload_threshold: i64,

    /// 过载罚分（禁用级）
    pub overload_malus: i64,

    /// 每个首尾相接班次的连班罚分（禁用级）
    pub consecutive_malus: i64,

    /// ACTIVE 状态加分
    pub active_bonus: i64,

    /// 普通补位时的胜任加分（找队长时不适用）
    pub competence_bonus: i64,

    /// 普通补位时占用队长的浪费罚分（把队长留给需要的班次）
    pub tl_waste_malus: i64,

    /// 淘汰阈值: 最佳分低于此值时放弃该班次
    pub disqualify_threshold: i64,

    /// 队长遴选的 top tier 带宽（与最佳分的最大差距）
    pub team_leader_tier_band: i64,

    /// 普通补位的 top tier 带宽（更宽 => 多次运行结果更多样）
    pub fill_tier_band: i64,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self {
            history_weight: -10,
            duty_malus: 25,
            overload_threshold: 2,
            overload_malus: 10_000,
            consecutive_malus: 10_000,
            active_bonus: 5,
            competence_bonus: 3,
            tl_waste_malus: 500,
            disqualify_threshold: -5_000,
            team_leader_tier_band: 5,
            fill_tier_band: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_magnitudes() {
        let profile = ScoringProfile::default();
        // 禁用级罚分必须压倒淘汰阈值与小额调整项
        assert!(profile.overload_malus > -profile.disqualify_threshold);
        assert!(profile.consecutive_malus > -profile.disqualify_threshold);
        assert!(profile.team_leader_tier_band < profile.fill_tier_band);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let profile: ScoringProfile = serde_json::from_str(r#"{"duty_malus": 40}"#).unwrap();
        assert_eq!(profile.duty_malus, 40);
        assert_eq!(profile.history_weight, -10);
        assert_eq!(profile.disqualify_threshold, -5_000);
    }
}
