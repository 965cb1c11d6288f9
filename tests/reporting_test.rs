// ==========================================
// ReportEngine 集成测试
// ==========================================
// 测试目标: 工时与出勤汇总
// 覆盖范围: 跨午夜计时、替班工时归属、出勤计数、年度过滤
// ==========================================


use test_helpers::*;
use volunteer_shift_aps::domain::types::{AttendanceStatus, EventStatus, PersonStatus};
use volunteer_shift_aps::engine::TimeFilter;
use volunteer_shift_aps::PlanningApi;

fn seed_shift_with_assignment(
    api: &PlanningApi,
    event_name: &str,
    event_start: chrono::NaiveDate,
    start: chrono::NaiveTime,
    end: chrono::NaiveTime,
    person_id: i64,
) -> i64 {
    let duty = seed_duty_type(api, &format!("勤务-{}", event_name));
    let event_id = seed_event(api, event_name, event_start, EventStatus::Completed);
    let task_id = seed_task(api, event_id, duty, &format!("任务-{}", event_name));
    let shift_id = seed_shift(api, task_id, event_start, start, end, 1);
    assign(api, person_id, shift_id)
}

#[test]
fn test_midnight_crossing_shift_counts_four_hours() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Anna S.", PersonStatus::Active);
    let a = seed_shift_with_assignment(&api, "E1", date(2026, 6, 12), time(22, 0), time(2, 0), p);
    api.assignments()
        .update_status(a, AttendanceStatus::Done, None)
        .unwrap();

    let summary = api
        .member_summary(TimeFilter::All, date(2026, 8, 1))
        .unwrap();
    let entry = summary.iter().find(|r| r.person_id == p).unwrap();
    assert_eq!(entry.total_done, 1);
    assert!((entry.total_hours - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_substitute_hours_go_to_substitute() {
    let (_tmp, api) = create_test_api();
    let primary = seed_person(&api, "Ben M.", PersonStatus::Active);
    let substitute = seed_person(&api, "Carla W.", PersonStatus::Active);
    let a = seed_shift_with_assignment(&api, "E1", date(2026, 6, 12), time(18, 0), time(22, 0), primary);
    api.assignments()
        .update_status(a, AttendanceStatus::DoneViaSubstitute, Some(substitute))
        .unwrap();

    let summary = api
        .member_summary(TimeFilter::All, date(2026, 8, 1))
        .unwrap();
    let primary_entry = summary.iter().find(|r| r.person_id == primary).unwrap();
    let substitute_entry = summary.iter().find(|r| r.person_id == substitute).unwrap();

    assert_eq!(primary_entry.total_done, 0);
    assert!(primary_entry.total_hours.abs() < f64::EPSILON);
    assert_eq!(substitute_entry.total_substitute, 1);
    assert!((substitute_entry.total_hours - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_excused_and_no_show_counted_without_hours() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "David K.", PersonStatus::Active);
    let a1 = seed_shift_with_assignment(&api, "E1", date(2026, 5, 1), time(18, 0), time(22, 0), p);
    let a2 = seed_shift_with_assignment(&api, "E2", date(2026, 6, 1), time(18, 0), time(22, 0), p);
    api.assignments()
        .update_status(a1, AttendanceStatus::Excused, None)
        .unwrap();
    api.assignments()
        .update_status(a2, AttendanceStatus::NoShow, None)
        .unwrap();

    let summary = api
        .member_summary(TimeFilter::All, date(2026, 8, 1))
        .unwrap();
    let entry = summary.iter().find(|r| r.person_id == p).unwrap();
    assert_eq!(entry.total_excused, 1);
    assert_eq!(entry.total_no_show, 1);
    assert_eq!(entry.total_done, 0);
    assert!(entry.total_hours.abs() < f64::EPSILON);
}

#[test]
fn test_current_year_filter_excludes_older_events() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Eva F.", PersonStatus::Active);
    let old = seed_shift_with_assignment(&api, "旧活动", date(2024, 6, 12), time(18, 0), time(22, 0), p);
    let recent = seed_shift_with_assignment(&api, "新活动", date(2026, 6, 12), time(18, 0), time(22, 0), p);
    api.assignments()
        .update_status(old, AttendanceStatus::Done, None)
        .unwrap();
    api.assignments()
        .update_status(recent, AttendanceStatus::Done, None)
        .unwrap();

    let all = api.member_summary(TimeFilter::All, date(2026, 8, 1)).unwrap();
    assert_eq!(all.iter().find(|r| r.person_id == p).unwrap().total_done, 2);

    let this_year = api
        .member_summary(TimeFilter::CurrentYear, date(2026, 8, 1))
        .unwrap();
    assert_eq!(
        this_year.iter().find(|r| r.person_id == p).unwrap().total_done,
        1
    );
}

#[test]
fn test_inactive_members_not_reported() {
    let (_tmp, api) = create_test_api();
    seed_person(&api, "Frank H.", PersonStatus::Resting);
    let active = seed_person(&api, "Gerd G.", PersonStatus::Active);

    let summary = api
        .member_summary(TimeFilter::All, date(2026, 8, 1))
        .unwrap();
    assert!(summary.iter().any(|r| r.person_id == active));
    assert_eq!(summary.len(), 1);
}
