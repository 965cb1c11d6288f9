// ==========================================
// FairnessScorer 集成测试
// ==========================================
// 测试目标: 公平分计分规则
// 覆盖范围: 各出勤状态的分数贡献、替班加分、计数窗口、非现役过滤
// ==========================================


use test_helpers::*;
use volunteer_shift_aps::domain::types::{AttendanceStatus, EventStatus, PersonStatus};
use volunteer_shift_aps::PlanningApi;

/// 创建单班次已结束活动并返回排班ID
fn seed_attended_shift(
    api: &PlanningApi,
    event_name: &str,
    start: chrono::NaiveDate,
    person_id: i64,
) -> i64 {
    let duty = seed_duty_type(api, &format!("勤务-{}", event_name));
    let event_id = seed_event(api, event_name, start, EventStatus::Completed);
    let task_id = seed_task(api, event_id, duty, &format!("任务-{}", event_name));
    let shift_id = seed_shift(api, task_id, start, time(18, 0), time(22, 0), 1);
    assign(api, person_id, shift_id)
}

#[test]
fn test_done_scores_plus_one() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Anna S.", PersonStatus::Active);
    let a = seed_attended_shift(&api, "E1", date(2025, 5, 1), p);
    api.assignments()
        .update_status(a, AttendanceStatus::Done, None)
        .unwrap();

    let scores = api.ranking_report(false, None).unwrap();
    let entry = scores.iter().find(|s| s.person_id == p).unwrap();
    assert_eq!(entry.total_score, 1);
}

#[test]
fn test_no_show_scores_minus_two() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Ben M.", PersonStatus::Active);
    let a = seed_attended_shift(&api, "E1", date(2025, 5, 1), p);
    api.assignments()
        .update_status(a, AttendanceStatus::NoShow, None)
        .unwrap();

    let scores = api.ranking_report(false, None).unwrap();
    let entry = scores.iter().find(|s| s.person_id == p).unwrap();
    assert_eq!(entry.total_score, -2);
}

#[test]
fn test_planned_and_excused_contribute_nothing() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Carla W.", PersonStatus::Active);
    let a1 = seed_attended_shift(&api, "E1", date(2025, 5, 1), p);
    let a2 = seed_attended_shift(&api, "E2", date(2025, 6, 1), p);
    // a1 保持 PLANNED
    let _ = a1;
    api.assignments()
        .update_status(a2, AttendanceStatus::Excused, None)
        .unwrap();

    let scores = api.ranking_report(false, None).unwrap();
    let entry = scores.iter().find(|s| s.person_id == p).unwrap();
    assert_eq!(entry.total_score, 0);
}

#[test]
fn test_substitute_gets_credit_primary_does_not() {
    let (_tmp, api) = create_test_api();
    let primary = seed_person(&api, "David K.", PersonStatus::Active);
    let substitute = seed_person(&api, "Eva F.", PersonStatus::Active);
    let a = seed_attended_shift(&api, "E1", date(2025, 5, 1), primary);
    api.assignments()
        .update_status(a, AttendanceStatus::DoneViaSubstitute, Some(substitute))
        .unwrap();

    let scores = api.ranking_report(false, None).unwrap();
    let primary_entry = scores.iter().find(|s| s.person_id == primary).unwrap();
    let substitute_entry = scores.iter().find(|s| s.person_id == substitute).unwrap();
    // 被替者无贡献，替班者 +1
    assert_eq!(primary_entry.total_score, 0);
    assert_eq!(substitute_entry.total_score, 1);
}

#[test]
fn test_limit_counts_most_recent_first() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Frank H.", PersonStatus::Active);

    // 旧活动: DONE(+1); 新活动: NO_SHOW(-2)
    let old = seed_attended_shift(&api, "旧活动", date(2024, 5, 1), p);
    let recent = seed_attended_shift(&api, "新活动", date(2026, 5, 1), p);
    api.assignments()
        .update_status(old, AttendanceStatus::Done, None)
        .unwrap();
    api.assignments()
        .update_status(recent, AttendanceStatus::NoShow, None)
        .unwrap();

    // 全量: -1
    let all = api.ranking_report(false, None).unwrap();
    assert_eq!(all.iter().find(|s| s.person_id == p).unwrap().total_score, -1);

    // 窗口 1: 只计最近一条（NO_SHOW）
    let limited = api.ranking_report(false, Some(1)).unwrap();
    assert_eq!(
        limited.iter().find(|s| s.person_id == p).unwrap().total_score,
        -2
    );
}

#[test]
fn test_include_inactive_filter() {
    let (_tmp, api) = create_test_api();
    seed_person(&api, "Gerd G.", PersonStatus::Active);
    let resting = seed_person(&api, "Rita R.", PersonStatus::Resting);
    let exited = seed_person(&api, "Emil E.", PersonStatus::Exited);

    let active_only = api.ranking_report(false, None).unwrap();
    assert!(active_only.iter().all(|s| s.person_id != resting));
    assert!(active_only.iter().all(|s| s.person_id != exited));

    let everyone = api.ranking_report(true, None).unwrap();
    assert!(everyone.iter().any(|s| s.person_id == resting));
    assert!(everyone.iter().any(|s| s.person_id == exited));
}

#[test]
fn test_person_without_history_has_zero_score() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Hans N.", PersonStatus::Passive);

    let scores = api.ranking_report(false, None).unwrap();
    let entry = scores.iter().find(|s| s.person_id == p).unwrap();
    assert_eq!(entry.total_score, 0);
}

#[test]
fn test_report_sorted_by_score_descending() {
    let (_tmp, api) = create_test_api();
    let hero = seed_person(&api, "Ida H.", PersonStatus::Active);
    let slacker = seed_person(&api, "Jan L.", PersonStatus::Active);

    let a1 = seed_attended_shift(&api, "E1", date(2025, 5, 1), hero);
    let a2 = seed_attended_shift(&api, "E2", date(2025, 6, 1), hero);
    let a3 = seed_attended_shift(&api, "E3", date(2025, 7, 1), slacker);
    api.assignments()
        .update_status(a1, AttendanceStatus::Done, None)
        .unwrap();
    api.assignments()
        .update_status(a2, AttendanceStatus::Done, None)
        .unwrap();
    api.assignments()
        .update_status(a3, AttendanceStatus::NoShow, None)
        .unwrap();

    let scores = api.ranking_report(false, None).unwrap();
    let pos_hero = scores.iter().position(|s| s.person_id == hero).unwrap();
    let pos_slacker = scores.iter().position(|s| s.person_id == slacker).unwrap();
    assert!(pos_hero < pos_slacker);

    for pair in scores.windows(2) {
        assert!(pair[0].total_score >= pair[1].total_score);
    }
}
