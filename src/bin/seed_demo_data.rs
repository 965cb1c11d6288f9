// ==========================================
// 志愿者排班系统 - 演示数据生成工具
// ==========================================
// 用途: 初始化/重置数据库并填充一个多日活动的演示数据，
//       随后跑一轮自动提案并打印校验结果
// 用法: cargo run --bin seed_demo_data [db_path]
// ==========================================

use chrono::NaiveDate;
use volunteer_shift_aps::domain::event::{Event, Shift, Task};
use volunteer_shift_aps::domain::person::Person;
use volunteer_shift_aps::domain::types::{EventStatus, PersonStatus, WarningSeverity};
use volunteer_shift_aps::{logging, PlanningApi};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "volunteer_shift_demo.db".to_string());
    tracing::info!(db_path, "初始化演示数据库");

    let api = PlanningApi::new(&db_path)?;

    // ==========================================
    // 人员
    // ==========================================
    let person = |first: &str, last: &str, display: &str, status: PersonStatus| Person {
        person_id: 0,
        first_name: first.to_string(),
        last_name: last.to_string(),
        display_name: display.to_string(),
        birth_date: None,
        email: None,
        phone: None,
        status,
        entry_date: None,
        exit_date: None,
        notes: None,
    };

    let persons = api.persons();
    let anna = persons.create(&person("Anna", "Schmidt", "Anna S.", PersonStatus::Active))?;
    let ben = persons.create(&person("Ben", "Müller", "Ben M.", PersonStatus::Active))?;
    let carla = persons.create(&person("Carla", "Weber", "Carla W.", PersonStatus::Passive))?;
    let david = persons.create(&person("David", "Klein", "David K.", PersonStatus::Active))?;
    let eva = persons.create(&person("Eva", "Fischer", "Eva F.", PersonStatus::Active))?;
    let frank = persons.create(&person("Frank", "Huber", "Frank H.", PersonStatus::Resting))?;

    // 勤务类型（"吧台"/"收银台"由建表种子提供）
    let duty_types = api.duty_types();
    let bar = duty_types
        .find_by_name("吧台")?
        .map(|d| d.duty_type_id)
        .ok_or("受保护勤务类型种子缺失")?;
    let security = duty_types.create("安保", Some("入口与场内秩序"))?;

    // 胜任与限制
    persons.set_competencies(anna, &[(bar, true), (security, false)])?;
    persons.set_competencies(ben, &[(bar, false)])?;
    persons.set_competencies(david, &[(security, true)])?;
    persons.set_competencies(eva, &[(bar, false), (security, false)])?;
    persons.set_restrictions(carla, &[security])?;
    persons.set_restrictions(frank, &[bar])?;

    // ==========================================
    // 多日活动
    // ==========================================
    let events = api.events();
    let summer_fest = events.create(&Event {
        event_id: 0,
        name: "夏季音乐节".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 6, 12).ok_or("无效日期")?,
        end_date: NaiveDate::from_ymd_opt(2026, 6, 14),
        status: EventStatus::Planning,
    })?;

    let tasks = api.tasks();
    let bar_task = tasks.create(&Task {
        task_id: 0,
        event_id: summer_fest,
        duty_type_id: bar,
        name: "吧台 - 主舞台".to_string(),
        description: None,
    })?;
    let security_task = tasks.create(&Task {
        task_id: 0,
        event_id: summer_fest,
        duty_type_id: security,
        name: "安保 - 入口".to_string(),
        description: None,
    })?;

    let shifts = api.shifts();
    let shift = |task_id, date: NaiveDate, start: (u32, u32), end: (u32, u32), required| Shift {
        shift_id: 0,
        task_id,
        shift_date: date,
        start_time: chrono::NaiveTime::from_hms_opt(start.0, start.1, 0).expect("无效时刻"),
        end_time: chrono::NaiveTime::from_hms_opt(end.0, end.1, 0).expect("无效时刻"),
        required_people: required,
    };

    for day in 12..=14 {
        let date = NaiveDate::from_ymd_opt(2026, 6, day).ok_or("无效日期")?;
        shifts.create(&shift(bar_task, date, (18, 0), (22, 0), 2))?;
        // 跨午夜晚班
        shifts.create(&shift(bar_task, date, (22, 0), (2, 0), 2))?;
        shifts.create(&shift(security_task, date, (17, 0), (23, 0), 1))?;
    }

    // ==========================================
    // 自动提案 + 校验
    // ==========================================
    let outcome = api.generate_proposal(summer_fest, None, Some(42))?;
    tracing::info!(
        run_id = %outcome.run_id,
        assigned = outcome.assigned_count,
        required = outcome.required_count,
        "自动提案完成"
    );

    for warning in api.validate_plan(summer_fest)? {
        let icon = match warning.severity {
            WarningSeverity::Hard => "🔴",
            WarningSeverity::Soft => "⚠️",
        };
        println!("{} {}", icon, warning.message);
    }

    // 手工指派选人器预览: 最后一个班次的候选列表
    if let Some(last_shift) = api.shifts().list_for_event(summer_fest)?.last() {
        println!("班次 #{} 的可排候选:", last_shift.shift_id);
        for candidate in api.available_candidates(last_shift.shift_id)? {
            let role = if candidate.is_team_leader {
                "队长"
            } else if candidate.has_competence {
                "胜任"
            } else {
                "-"
            };
            println!(
                "  {} [{}] {} {}",
                candidate.display_name,
                candidate.status,
                role,
                candidate.warning_text()
            );
        }
    }

    println!(
        "演示数据就绪: {} (人员 {} 名, 已排 {}/{})",
        db_path,
        persons.list_all()?.len(),
        outcome.assigned_count,
        outcome.required_count
    );
    Ok(())
}
