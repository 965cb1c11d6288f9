// ==========================================
// 志愿者排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少偶发 busy 错误
// - 建表与受保护勤务类型种子数据集中在一处
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema 版本（PRAGMA user_version）
///
/// 说明：
/// - 版本号用于迁移门控；旧库在 `run_migrations` 中逐级升级。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接、建表并执行迁移（应用启动统一入口）
pub fn init_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    create_schema(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// 创建基础表结构（幂等）
///
/// 约束：
/// - 状态字段存储 SCREAMING_SNAKE_CASE 字符串（与 domain::types 对齐）
/// - 时间字段存储文本: 日期 `%Y-%m-%d`，时刻 `%H:%M`
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            person_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            display_name TEXT NOT NULL UNIQUE,
            birth_date TEXT,
            email TEXT,
            phone TEXT,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            entry_date TEXT,
            exit_date TEXT,
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS duty_types (
            duty_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            is_protected INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS person_duty_restrictions (
            person_id INTEGER NOT NULL,
            duty_type_id INTEGER NOT NULL,
            PRIMARY KEY (person_id, duty_type_id),
            FOREIGN KEY (person_id) REFERENCES persons (person_id) ON DELETE CASCADE,
            FOREIGN KEY (duty_type_id) REFERENCES duty_types (duty_type_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS person_competencies (
            person_id INTEGER NOT NULL,
            duty_type_id INTEGER NOT NULL,
            is_team_leader INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (person_id, duty_type_id),
            FOREIGN KEY (person_id) REFERENCES persons (person_id) ON DELETE CASCADE,
            FOREIGN KEY (duty_type_id) REFERENCES duty_types (duty_type_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS events (
            event_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            status TEXT NOT NULL DEFAULT 'PLANNING'
        );

        CREATE TABLE IF NOT EXISTS tasks (
            task_id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL,
            duty_type_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            FOREIGN KEY (event_id) REFERENCES events (event_id) ON DELETE CASCADE,
            FOREIGN KEY (duty_type_id) REFERENCES duty_types (duty_type_id)
        );

        CREATE TABLE IF NOT EXISTS shifts (
            shift_id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id INTEGER NOT NULL,
            shift_date TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            required_people INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY (task_id) REFERENCES tasks (task_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS assignments (
            assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
            shift_id INTEGER NOT NULL,
            person_id INTEGER NOT NULL,
            substitute_person_id INTEGER,
            attendance_status TEXT NOT NULL DEFAULT 'PLANNED',
            FOREIGN KEY (shift_id) REFERENCES shifts (shift_id) ON DELETE CASCADE,
            FOREIGN KEY (person_id) REFERENCES persons (person_id),
            FOREIGN KEY (substitute_person_id) REFERENCES persons (person_id)
        );

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    // 受保护勤务类型种子数据（重复执行不产生新行）
    let protected_duties: [(&str, &str); 2] = [
        ("吧台", "吧台售卖与收银"),
        ("收银台", "中央收银/兑换代币"),
    ];
    for (name, description) in protected_duties {
        conn.execute(
            "INSERT OR IGNORE INTO duty_types (name, description, is_protected) VALUES (?1, ?2, 1)",
            rusqlite::params![name, description],
        )?;
    }

    Ok(())
}

/// 读取 schema 版本（PRAGMA user_version）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// 执行数据库迁移（逐级升级到 CURRENT_SCHEMA_VERSION）
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let current = read_schema_version(conn)?;
    if current >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!(
        from = current,
        to = CURRENT_SCHEMA_VERSION,
        "执行数据库迁移"
    );

    // v0 -> v1: 初始版本，无结构变更（占位，后续迁移在此追加）
    conn.execute_batch(&format!("PRAGMA user_version = {}", CURRENT_SCHEMA_VERSION))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        create_schema(&conn).unwrap();

        // 受保护勤务类型只出现一次
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM duty_types WHERE is_protected = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_migrations_set_user_version() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
