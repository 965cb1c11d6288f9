// ==========================================
// AvailabilityEngine 集成测试
// ==========================================
// 测试目标: 候选人过滤规则
// 覆盖范围: 限制排除、时间冲突排除、连班告警、多班次告警、默认展示序
// ==========================================


use test_helpers::*;
use volunteer_shift_aps::domain::types::{EventStatus, PersonStatus};
use volunteer_shift_aps::ApiError;

/// 基础场景: 一个活动、勤务类型"吧台"、一个任务
struct Scenario {
    event_id: i64,
    bar: i64,
    task_id: i64,
}

fn base_scenario(api: &volunteer_shift_aps::PlanningApi) -> Scenario {
    let bar = seed_duty_type(api, "测试吧台");
    let event_id = seed_event(api, "夏季活动", date(2026, 6, 12), EventStatus::Planning);
    let task_id = seed_task(api, event_id, bar, "吧台 - 主舞台");
    Scenario { event_id, bar, task_id }
}

#[test]
fn test_restricted_person_never_appears() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_id = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 2);

    let p = seed_person(&api, "Paula R.", PersonStatus::Active);
    // 同时持有胜任与限制: 限制必须压倒胜任
    api.persons()
        .set_competencies(p, &[(s.bar, true)])
        .unwrap();
    api.persons().set_restrictions(p, &[s.bar]).unwrap();

    let free = seed_person(&api, "Nora F.", PersonStatus::Active);

    let candidates = api.available_candidates(shift_id).unwrap();
    assert!(candidates.iter().all(|c| c.person_id != p));
    assert!(candidates.iter().any(|c| c.person_id == free));
}

#[test]
fn test_overlapping_assignment_fully_excludes() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_a = seed_shift(&api, s.task_id, date(2026, 6, 12), time(10, 0), time(14, 0), 1);
    let shift_b = seed_shift(&api, s.task_id, date(2026, 6, 12), time(13, 0), time(17, 0), 1);

    let p = seed_person(&api, "Otto B.", PersonStatus::Active);
    assign(&api, p, shift_a);

    // [10,14) 与 [13,17) 重叠: 整体排除
    let candidates = api.available_candidates(shift_b).unwrap();
    assert!(candidates.iter().all(|c| c.person_id != p));
}

#[test]
fn test_back_to_back_kept_with_warning() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_a = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 1);
    let shift_b = seed_shift(&api, s.task_id, date(2026, 6, 12), time(21, 0), time(23, 0), 1);

    let q = seed_person(&api, "Quirin A.", PersonStatus::Active);
    assign(&api, q, shift_a);

    // [18,21) 与 [21,23) 首尾相接: 保留 + 软告警
    let candidates = api.available_candidates(shift_b).unwrap();
    let entry = candidates
        .iter()
        .find(|c| c.person_id == q)
        .expect("首尾相接的候选必须保留");
    assert!(entry.warnings.iter().any(|w| w.contains("连班")));
}

#[test]
fn test_touching_windows_are_not_overlap() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_a = seed_shift(&api, s.task_id, date(2026, 6, 12), time(10, 0), time(14, 0), 1);
    let shift_b = seed_shift(&api, s.task_id, date(2026, 6, 12), time(14, 0), time(18, 0), 1);

    let p = seed_person(&api, "Tina T.", PersonStatus::Active);
    assign(&api, p, shift_a);

    let candidates = api.available_candidates(shift_b).unwrap();
    assert!(candidates.iter().any(|c| c.person_id == p));
}

#[test]
fn test_midnight_crossing_same_date_conflict() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    // 22:00-02:00 跨午夜
    let night = seed_shift(&api, s.task_id, date(2026, 6, 12), time(22, 0), time(2, 0), 1);
    // 同一日历日录入的 00:00-04:00（同一夜）
    let small_hours = seed_shift(&api, s.task_id, date(2026, 6, 12), time(0, 0), time(4, 0), 1);

    let p = seed_person(&api, "Mia N.", PersonStatus::Active);
    assign(&api, p, night);

    let candidates = api.available_candidates(small_hours).unwrap();
    assert!(candidates.iter().all(|c| c.person_id != p));
}

#[test]
fn test_already_on_shift_excluded() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_id = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 2);

    let p = seed_person(&api, "Ralf D.", PersonStatus::Active);
    assign(&api, p, shift_id);

    let candidates = api.available_candidates(shift_id).unwrap();
    assert!(candidates.iter().all(|c| c.person_id != p));
}

#[test]
fn test_non_schedulable_statuses_excluded() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_id = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 2);

    seed_person(&api, "Alba A.", PersonStatus::Active);
    seed_person(&api, "Pia P.", PersonStatus::Passive);
    seed_person(&api, "Rita R.", PersonStatus::Resting);
    seed_person(&api, "Emil E.", PersonStatus::Exited);

    let candidates = api.available_candidates(shift_id).unwrap();
    let names: Vec<&str> = candidates.iter().map(|c| c.display_name.as_str()).collect();
    assert!(names.contains(&"Alba A."));
    assert!(names.contains(&"Pia P."));
    assert!(!names.contains(&"Rita R."));
    assert!(!names.contains(&"Emil E."));
}

#[test]
fn test_multiple_duties_warning() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_a = seed_shift(&api, s.task_id, date(2026, 6, 12), time(8, 0), time(10, 0), 1);
    let shift_b = seed_shift(&api, s.task_id, date(2026, 6, 12), time(12, 0), time(14, 0), 1);
    let shift_c = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(20, 0), 1);

    let p = seed_person(&api, "Willi W.", PersonStatus::Active);
    assign(&api, p, shift_a);
    assign(&api, p, shift_b);

    let candidates = api.available_candidates(shift_c).unwrap();
    let entry = candidates.iter().find(|c| c.person_id == p).unwrap();
    assert!(entry.warnings.iter().any(|w| w.contains("2 个班次")));
}

#[test]
fn test_default_display_sort() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_id = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 4);

    // 故意用倒序名字检验排序键优先级
    let plain = seed_person(&api, "Zara Z.", PersonStatus::Active);
    let competent = seed_person(&api, "Yves Y.", PersonStatus::Active);
    let leader = seed_person(&api, "Xenia X.", PersonStatus::Active);
    api.persons()
        .set_competencies(competent, &[(s.bar, false)])
        .unwrap();
    api.persons()
        .set_competencies(leader, &[(s.bar, true)])
        .unwrap();

    let candidates = api.available_candidates(shift_id).unwrap();
    let ids: Vec<i64> = candidates.iter().map(|c| c.person_id).collect();
    assert_eq!(ids, vec![leader, competent, plain]);
}

#[test]
fn test_unknown_shift_fails_fast() {
    let (_tmp, api) = create_test_api();
    let result = api.available_candidates(9999);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_event_with_no_candidates_is_empty_not_error() {
    let (_tmp, api) = create_test_api();
    let s = base_scenario(&api);
    let shift_id = seed_shift(&api, s.task_id, date(2026, 6, 12), time(18, 0), time(21, 0), 2);

    let candidates = api.available_candidates(shift_id).unwrap();
    assert!(candidates.is_empty());

    // event_id 在场景中存在但无人可排，同样是空列表
    let _ = s.event_id;
}
