// ==========================================
// 志愿者排班系统 - 活动/任务/班次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: events / tasks / shifts 表的数据访问，活动复制
// ==========================================

use crate::domain::event::{
    Event, EventCopyMode, EventUpdate, Shift, ShiftUpdate, Task, TaskUpdate,
};
use crate::domain::types::EventStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_date_col, parse_enum_col, parse_time_col};
use chrono::{Duration, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// EventRepository - 活动仓储
// ==========================================
pub struct EventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EventRepository {
    /// 创建新的 EventRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
        let start_raw: String = row.get(2)?;
        let end_date = match row.get::<_, Option<String>>(3)? {
            Some(s) => Some(parse_date_col(3, &s)?),
            None => None,
        };
        let status_raw: String = row.get(4)?;
        Ok(Event {
            event_id: row.get(0)?,
            name: row.get(1)?,
            start_date: parse_date_col(2, &start_raw)?,
            end_date,
            status: parse_enum_col(4, &status_raw, EventStatus::from_db_str, "活动状态")?,
        })
    }

    /// 新建活动（忽略传入实体的 event_id，返回自增ID）
    pub fn create(&self, event: &Event) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO events (name, start_date, end_date, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                event.name,
                event.start_date.format("%Y-%m-%d").to_string(),
                event.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
                event.status.to_db_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 部分更新
    pub fn update(&self, event_id: i64, update: &EventUpdate) -> RepositoryResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(v) = &update.name {
            sets.push("name = ?");
            values.push(Value::Text(v.clone()));
        }
        if let Some(v) = &update.start_date {
            sets.push("start_date = ?");
            values.push(Value::Text(v.format("%Y-%m-%d").to_string()));
        }
        if let Some(v) = &update.end_date {
            sets.push("end_date = ?");
            values.push(match v {
                Some(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
                None => Value::Null,
            });
        }
        if let Some(v) = &update.status {
            sets.push("status = ?");
            values.push(Value::Text(v.to_db_str().to_string()));
        }

        values.push(Value::Integer(event_id));
        let sql = format!("UPDATE events SET {} WHERE event_id = ?", sets.join(", "));

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Event".to_string(),
                id: event_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除活动（任务/班次/排班级联删除）
    pub fn delete(&self, event_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM events WHERE event_id = ?1", params![event_id])?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, event_id: i64) -> RepositoryResult<Option<Event>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT event_id, name, start_date, end_date, status FROM events WHERE event_id = ?1",
                params![event_id],
                Self::row_to_event,
            )
            .optional()?;
        Ok(result)
    }

    /// 全部活动（开始日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Event>> {
        self.list_where("1 = 1")
    }

    /// 复盘范围内的活动（COMPLETED / ACTIVE，开始日期倒序）
    pub fn list_reviewable(&self) -> RepositoryResult<Vec<Event>> {
        self.list_where("status IN ('COMPLETED', 'ACTIVE')")
    }

    fn list_where(&self, condition: &str) -> RepositoryResult<Vec<Event>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT event_id, name, start_date, end_date, status FROM events WHERE {} ORDER BY start_date DESC",
            condition
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_event)?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// 复制活动（事务内完成）
    ///
    /// 规则:
    /// - 新活动状态重置为 PLANNING
    /// - 班次日期随新开始日整体平移
    /// - Full 模式复制排班，出勤状态重置为 PLANNED、替班清空
    ///
    /// # 返回
    /// 新活动ID
    pub fn copy_event(
        &self,
        source_event_id: i64,
        new_name: &str,
        new_start_date: NaiveDate,
        mode: EventCopyMode,
    ) -> RepositoryResult<i64> {
        let source = self.find_by_id(source_event_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "Event".to_string(),
                id: source_event_id.to_string(),
            }
        })?;

        let delta: Duration = new_start_date - source.start_date;
        let new_end_date = source.end_date.map(|d| d + delta);

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO events (name, start_date, end_date, status) VALUES (?1, ?2, ?3, 'PLANNING')",
            params![
                new_name,
                new_start_date.format("%Y-%m-%d").to_string(),
                new_end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )?;
        let new_event_id = tx.last_insert_rowid();

        // 任务结构
        let tasks: Vec<(i64, i64, String, Option<String>)> = {
            let mut stmt = tx.prepare(
                "SELECT task_id, duty_type_id, name, description FROM tasks WHERE event_id = ?1",
            )?;
            let rows = stmt.query_map(params![source_event_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        for (old_task_id, duty_type_id, task_name, description) in tasks {
            tx.execute(
                "INSERT INTO tasks (event_id, duty_type_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                params![new_event_id, duty_type_id, task_name, description],
            )?;
            let new_task_id = tx.last_insert_rowid();

            if mode == EventCopyMode::StructureOnly {
                continue;
            }

            let shifts: Vec<(i64, String, String, String, i64)> = {
                let mut stmt = tx.prepare(
                    r#"
                    SELECT shift_id, shift_date, start_time, end_time, required_people
                    FROM shifts WHERE task_id = ?1
                    "#,
                )?;
                let rows = stmt.query_map(params![old_task_id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?;
                rows.collect::<rusqlite::Result<_>>()?
            };

            for (old_shift_id, date_raw, start_time, end_time, required_people) in shifts {
                let old_date = parse_date_col(1, &date_raw)?;
                let new_date = old_date + delta;

                tx.execute(
                    r#"
                    INSERT INTO shifts (task_id, shift_date, start_time, end_time, required_people)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        new_task_id,
                        new_date.format("%Y-%m-%d").to_string(),
                        start_time,
                        end_time,
                        required_people,
                    ],
                )?;
                let new_shift_id = tx.last_insert_rowid();

                if mode != EventCopyMode::Full {
                    continue;
                }

                // 出勤状态重置为 PLANNED、替班清空
                tx.execute(
                    r#"
                    INSERT INTO assignments (shift_id, person_id, attendance_status)
                    SELECT ?1, person_id, 'PLANNED' FROM assignments WHERE shift_id = ?2
                    "#,
                    params![new_shift_id, old_shift_id],
                )?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            source_event_id,
            new_event_id,
            mode = ?mode,
            "活动复制完成"
        );
        Ok(new_event_id)
    }
}

// ==========================================
// TaskRepository - 任务仓储
// ==========================================
pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
        Ok(Task {
            task_id: row.get(0)?,
            event_id: row.get(1)?,
            duty_type_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
        })
    }

    /// 新建任务，返回自增ID
    pub fn create(&self, task: &Task) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO tasks (event_id, duty_type_id, name, description) VALUES (?1, ?2, ?3, ?4)",
            params![task.event_id, task.duty_type_id, task.name, task.description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 部分更新
    pub fn update(&self, task_id: i64, update: &TaskUpdate) -> RepositoryResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(v) = &update.duty_type_id {
            sets.push("duty_type_id = ?");
            values.push(Value::Integer(*v));
        }
        if let Some(v) = &update.name {
            sets.push("name = ?");
            values.push(Value::Text(v.clone()));
        }
        if let Some(v) = &update.description {
            sets.push("description = ?");
            values.push(match v {
                Some(s) => Value::Text(s.clone()),
                None => Value::Null,
            });
        }

        values.push(Value::Integer(task_id));
        let sql = format!("UPDATE tasks SET {} WHERE task_id = ?", sets.join(", "));

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Task".to_string(),
                id: task_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除任务（班次/排班级联删除）
    pub fn delete(&self, task_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, task_id: i64) -> RepositoryResult<Option<Task>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT task_id, event_id, duty_type_id, name, description FROM tasks WHERE task_id = ?1",
                params![task_id],
                Self::row_to_task,
            )
            .optional()?;
        Ok(result)
    }

    /// 活动内全部任务（按名称排序）
    pub fn list_for_event(&self, event_id: i64) -> RepositoryResult<Vec<Task>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT task_id, event_id, duty_type_id, name, description
            FROM tasks WHERE event_id = ?1 ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], Self::row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

// ==========================================
// ShiftRepository - 班次仓储
// ==========================================
pub struct ShiftRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShiftRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_shift(row: &Row<'_>) -> rusqlite::Result<Shift> {
        let date_raw: String = row.get(2)?;
        let start_raw: String = row.get(3)?;
        let end_raw: String = row.get(4)?;
        Ok(Shift {
            shift_id: row.get(0)?,
            task_id: row.get(1)?,
            shift_date: parse_date_col(2, &date_raw)?,
            start_time: parse_time_col(3, &start_raw)?,
            end_time: parse_time_col(4, &end_raw)?,
            required_people: row.get(5)?,
        })
    }

    /// 新建班次，返回自增ID
    pub fn create(&self, shift: &Shift) -> RepositoryResult<i64> {
        if shift.required_people < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "required_people".to_string(),
                message: "需求人数必须 >= 1".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO shifts (task_id, shift_date, start_time, end_time, required_people)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                shift.task_id,
                shift.shift_date.format("%Y-%m-%d").to_string(),
                shift.start_time.format("%H:%M").to_string(),
                shift.end_time.format("%H:%M").to_string(),
                shift.required_people,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 部分更新
    pub fn update(&self, shift_id: i64, update: &ShiftUpdate) -> RepositoryResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        if matches!(update.required_people, Some(n) if n < 1) {
            return Err(RepositoryError::FieldValueError {
                field: "required_people".to_string(),
                message: "需求人数必须 >= 1".to_string(),
            });
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(v) = &update.shift_date {
            sets.push("shift_date = ?");
            values.push(Value::Text(v.format("%Y-%m-%d").to_string()));
        }
        if let Some(v) = &update.start_time {
            sets.push("start_time = ?");
            values.push(Value::Text(v.format("%H:%M").to_string()));
        }
        if let Some(v) = &update.end_time {
            sets.push("end_time = ?");
            values.push(Value::Text(v.format("%H:%M").to_string()));
        }
        if let Some(v) = &update.required_people {
            sets.push("required_people = ?");
            values.push(Value::Integer(*v));
        }

        values.push(Value::Integer(shift_id));
        let sql = format!("UPDATE shifts SET {} WHERE shift_id = ?", sets.join(", "));

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Shift".to_string(),
                id: shift_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除班次（排班级联删除）
    pub fn delete(&self, shift_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM shifts WHERE shift_id = ?1", params![shift_id])?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, shift_id: i64) -> RepositoryResult<Option<Shift>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT shift_id, task_id, shift_date, start_time, end_time, required_people
                FROM shifts WHERE shift_id = ?1
                "#,
                params![shift_id],
                Self::row_to_shift,
            )
            .optional()?;
        Ok(result)
    }

    /// 任务内全部班次（按日期、开始时刻排序）
    pub fn list_for_task(&self, task_id: i64) -> RepositoryResult<Vec<Shift>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT shift_id, task_id, shift_date, start_time, end_time, required_people
            FROM shifts WHERE task_id = ?1
            ORDER BY shift_date, start_time
            "#,
        )?;
        let rows = stmt.query_map(params![task_id], Self::row_to_shift)?;
        let mut shifts = Vec::new();
        for row in rows {
            shifts.push(row?);
        }
        Ok(shifts)
    }

    /// 活动内全部班次（按日期、开始时刻排序，即提案生成的遍历顺序）
    pub fn list_for_event(&self, event_id: i64) -> RepositoryResult<Vec<Shift>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.shift_id, s.task_id, s.shift_date, s.start_time, s.end_time, s.required_people
            FROM shifts s
            JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
            ORDER BY s.shift_date, s.start_time
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], Self::row_to_shift)?;
        let mut shifts = Vec::new();
        for row in rows {
            shifts.push(row?);
        }
        Ok(shifts)
    }
}
