// ==========================================
// 仓储层集成测试
// ==========================================
// 测试目标: 数据访问约束
// 覆盖范围: 受保护勤务类型、限制上限、出勤不变式、部分更新、活动复制
// ==========================================


use test_helpers::*;
use volunteer_shift_aps::domain::event::EventCopyMode;
use volunteer_shift_aps::domain::person::PersonUpdate;
use volunteer_shift_aps::domain::types::{AttendanceStatus, EventStatus, PersonStatus};
use volunteer_shift_aps::repository::RepositoryError;

// ==========================================
// 勤务类型保护
// ==========================================

#[test]
fn test_protected_duty_type_refuses_delete_and_rename() {
    let (_tmp, api) = create_test_api();
    let bar = api
        .duty_types()
        .find_by_name("吧台")
        .unwrap()
        .expect("建表种子必须存在");
    assert!(bar.is_protected);

    let delete = api.duty_types().delete(bar.duty_type_id);
    assert!(matches!(
        delete,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));

    let rename = api.duty_types().update(bar.duty_type_id, "新名字", None);
    assert!(matches!(
        rename,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));

    // 改说明允许
    api.duty_types()
        .update(bar.duty_type_id, "吧台", Some("新的说明"))
        .unwrap();

    // 种子行仍然齐全
    let all = api.duty_types().list_all().unwrap();
    assert!(all.iter().filter(|d| d.is_protected).count() >= 2);
}

#[test]
fn test_duty_type_in_use_refuses_delete() {
    let (_tmp, api) = create_test_api();
    let duty = seed_duty_type(&api, "安保");
    let event_id = seed_event(&api, "活动", date(2026, 6, 12), EventStatus::Planning);
    seed_task(&api, event_id, duty, "安保 - 入口");

    let result = api.duty_types().delete(duty);
    assert!(matches!(
        result,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));
}

// ==========================================
// 活动列表
// ==========================================

#[test]
fn test_reviewable_events_are_completed_or_active() {
    let (_tmp, api) = create_test_api();
    seed_event(&api, "筹备中", date(2026, 9, 1), EventStatus::Planning);
    let running = seed_event(&api, "进行中", date(2026, 8, 1), EventStatus::Active);
    let archived = seed_event(&api, "已结束", date(2026, 7, 1), EventStatus::Completed);
    seed_event(&api, "已取消", date(2026, 6, 1), EventStatus::Cancelled);

    let reviewable = api.events().list_reviewable().unwrap();
    let ids: Vec<i64> = reviewable.iter().map(|e| e.event_id).collect();
    // 开始日期倒序
    assert_eq!(ids, vec![running, archived]);

    assert_eq!(api.events().list_all().unwrap().len(), 4);
}

// ==========================================
// 限制上限
// ==========================================

#[test]
fn test_restriction_cap_enforced() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Anna S.", PersonStatus::Active);
    let duties: Vec<i64> = (0..4)
        .map(|i| seed_duty_type(&api, &format!("勤务 {}", i)))
        .collect();

    // 3 个允许
    api.persons().set_restrictions(p, &duties[..3]).unwrap();
    assert_eq!(api.persons().get_restrictions(p).unwrap().len(), 3);

    // 4 个拒绝，且原有数据保持不变
    let result = api.persons().set_restrictions(p, &duties);
    assert!(matches!(
        result,
        Err(RepositoryError::BusinessRuleViolation(_))
    ));
    assert_eq!(api.persons().get_restrictions(p).unwrap().len(), 3);
}

// ==========================================
// 胜任查询
// ==========================================

#[test]
fn test_competency_map_roundtrip() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Ben M.", PersonStatus::Active);
    let bar = seed_duty_type(&api, "吧台勤务");
    let security = seed_duty_type(&api, "安保勤务");

    api.persons()
        .set_competencies(p, &[(bar, true), (security, false)])
        .unwrap();

    let map = api.persons().get_competencies(p).unwrap();
    assert_eq!(map.get(&bar), Some(&true));
    assert_eq!(map.get(&security), Some(&false));

    // 显示名唯一，可反查
    let found = api.persons().find_by_display_name("Ben M.").unwrap().unwrap();
    assert_eq!(found.person_id, p);
}

// ==========================================
// 出勤不变式
// ==========================================

#[test]
fn test_substitute_status_requires_substitute_id() {
    let (_tmp, api) = create_test_api();
    let duty = seed_duty_type(&api, "勤务");
    let event_id = seed_event(&api, "活动", date(2026, 6, 12), EventStatus::Active);
    let task_id = seed_task(&api, event_id, duty, "任务");
    let shift_id = seed_shift(&api, task_id, date(2026, 6, 12), time(18, 0), time(22, 0), 1);
    let p = seed_person(&api, "Ben M.", PersonStatus::Active);
    let sub = seed_person(&api, "Carla W.", PersonStatus::Active);
    let a = assign(&api, p, shift_id);

    // 替班状态缺替班人员: 拒绝
    let missing = api
        .assignments()
        .update_status(a, AttendanceStatus::DoneViaSubstitute, None);
    assert!(matches!(missing, Err(RepositoryError::FieldValueError { .. })));

    // 非替班状态携带替班人员: 拒绝
    let extra = api
        .assignments()
        .update_status(a, AttendanceStatus::Done, Some(sub));
    assert!(matches!(extra, Err(RepositoryError::FieldValueError { .. })));

    // 合法写入
    api.assignments()
        .update_status(a, AttendanceStatus::DoneViaSubstitute, Some(sub))
        .unwrap();
    let stored = api.assignments().find_by_id(a).unwrap().unwrap();
    assert_eq!(stored.attendance_status, AttendanceStatus::DoneViaSubstitute);
    assert_eq!(stored.substitute_person_id, Some(sub));
}

#[test]
fn test_remove_single_assignment() {
    let (_tmp, api) = create_test_api();
    let duty = seed_duty_type(&api, "勤务");
    let event_id = seed_event(&api, "活动", date(2026, 6, 12), EventStatus::Planning);
    let task_id = seed_task(&api, event_id, duty, "任务");
    let shift_id = seed_shift(&api, task_id, date(2026, 6, 12), time(18, 0), time(22, 0), 2);
    let p1 = seed_person(&api, "Anna S.", PersonStatus::Active);
    let p2 = seed_person(&api, "Ben M.", PersonStatus::Active);
    assign(&api, p1, shift_id);
    assign(&api, p2, shift_id);

    api.assignments().remove(p1, shift_id).unwrap();

    let remaining = api.assignments().list_for_shift(shift_id).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].person_id, p2);
}

// ==========================================
// 部分更新
// ==========================================

#[test]
fn test_person_partial_update_touches_only_set_fields() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Anna S.", PersonStatus::Active);

    api.persons()
        .update(
            p,
            &PersonUpdate {
                status: Some(PersonStatus::Resting),
                notes: Some(Some("休假到 2026-09-01".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

    let stored = api.persons().find_by_id(p).unwrap().unwrap();
    assert_eq!(stored.status, PersonStatus::Resting);
    assert_eq!(stored.notes.as_deref(), Some("休假到 2026-09-01"));
    // 未设置字段不变
    assert_eq!(stored.display_name, "Anna S.");
    assert_eq!(stored.first_name, "Anna");
}

#[test]
fn test_empty_update_is_noop() {
    let (_tmp, api) = create_test_api();
    let p = seed_person(&api, "Ben M.", PersonStatus::Active);
    api.persons().update(p, &PersonUpdate::default()).unwrap();
    let stored = api.persons().find_by_id(p).unwrap().unwrap();
    assert_eq!(stored.display_name, "Ben M.");
}

#[test]
fn test_duplicate_display_name_rejected() {
    let (_tmp, api) = create_test_api();
    seed_person(&api, "Anna S.", PersonStatus::Active);
    let p2 = seed_person(&api, "Ben M.", PersonStatus::Active);

    let result = api.persons().update(
        p2,
        &PersonUpdate {
            display_name: Some("Anna S.".to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueConstraintViolation(_))
    ));
}

// ==========================================
// 活动复制
// ==========================================

/// 复制场景: 2026-06-12 起、一任务、两班次（其中一个次日）、一条排班
fn copy_scenario(api: &volunteer_shift_aps::PlanningApi) -> (i64, i64) {
    let duty = seed_duty_type(api, "吧台勤务");
    let event_id = seed_event(api, "夏季音乐节", date(2026, 6, 12), EventStatus::Completed);
    let task_id = seed_task(api, event_id, duty, "吧台");
    let s1 = seed_shift(api, task_id, date(2026, 6, 12), time(18, 0), time(22, 0), 2);
    seed_shift(api, task_id, date(2026, 6, 13), time(18, 0), time(22, 0), 2);
    let p = seed_person(api, "Anna S.", PersonStatus::Active);
    let a = assign(api, p, s1);
    api.assignments()
        .update_status(a, AttendanceStatus::Done, None)
        .unwrap();
    (event_id, p)
}

#[test]
fn test_copy_structure_only() {
    let (_tmp, api) = create_test_api();
    let (source, _p) = copy_scenario(&api);

    let copy = api
        .events()
        .copy_event(source, "冬季活动", date(2026, 12, 4), EventCopyMode::StructureOnly)
        .unwrap();

    let event = api.events().find_by_id(copy).unwrap().unwrap();
    assert_eq!(event.status, EventStatus::Planning);
    assert_eq!(event.start_date, date(2026, 12, 4));

    let tasks = api.tasks().list_for_event(copy).unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(api.shifts().list_for_task(tasks[0].task_id).unwrap().is_empty());
}

#[test]
fn test_copy_with_shifts_moves_dates_by_delta() {
    let (_tmp, api) = create_test_api();
    let (source, _p) = copy_scenario(&api);

    let copy = api
        .events()
        .copy_event(source, "冬季活动", date(2026, 12, 4), EventCopyMode::WithShifts)
        .unwrap();

    let shifts = api.shifts().list_for_event(copy).unwrap();
    assert_eq!(shifts.len(), 2);
    // 源活动 06-12 -> 新活动 12-04: 班次日期整体平移
    assert_eq!(shifts[0].shift_date, date(2026, 12, 4));
    assert_eq!(shifts[1].shift_date, date(2026, 12, 5));
    // 排班不复制
    let (_required, assigned) = api.assignments().staffing_summary(copy).unwrap();
    assert_eq!(assigned, 0);
}

#[test]
fn test_copy_full_resets_attendance() {
    let (_tmp, api) = create_test_api();
    let (source, p) = copy_scenario(&api);

    let copy = api
        .events()
        .copy_event(source, "冬季活动", date(2026, 12, 4), EventCopyMode::Full)
        .unwrap();

    let assignments = api.assignments().list_full_for_event(copy).unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].person_id, p);
    assert_eq!(assignments[0].attendance_status, AttendanceStatus::Planned);
    assert_eq!(assignments[0].substitute_person_id, None);
}
