// ==========================================
// 志愿者排班系统 - 人员数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: persons / person_duty_restrictions / person_competencies 表的数据访问
// ==========================================

use crate::domain::person::{Competency, Person, PersonUpdate, MAX_RESTRICTIONS_PER_PERSON};
use crate::domain::types::PersonStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_date_col, parse_enum_col};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const PERSON_COLUMNS: &str = "person_id, first_name, last_name, display_name, birth_date, \
                              email, phone, status, entry_date, exit_date, notes";

// ==========================================
// PersonRepository - 人员仓储
// ==========================================
pub struct PersonRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PersonRepository {
    /// 创建新的 PersonRepository 实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射（列顺序与 PERSON_COLUMNS 一致）
    fn row_to_person(row: &Row<'_>) -> rusqlite::Result<Person> {
        let birth_date = match row.get::<_, Option<String>>(4)? {
            Some(s) => Some(parse_date_col(4, &s)?),
            None => None,
        };
        let status_raw: String = row.get(7)?;
        let entry_date = match row.get::<_, Option<String>>(8)? {
            Some(s) => Some(parse_date_col(8, &s)?),
            None => None,
        };
        let exit_date = match row.get::<_, Option<String>>(9)? {
            Some(s) => Some(parse_date_col(9, &s)?),
            None => None,
        };

        Ok(Person {
            person_id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            display_name: row.get(3)?,
            birth_date,
            email: row.get(5)?,
            phone: row.get(6)?,
            status: parse_enum_col(7, &status_raw, PersonStatus::from_db_str, "人员状态")?,
            entry_date,
            exit_date,
            notes: row.get(10)?,
        })
    }

    // ==========================================
    // 人员 CRUD
    // ==========================================

    /// 新建人员（忽略传入实体的 person_id，返回自增ID）
    pub fn create(&self, person: &Person) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO persons (
                first_name, last_name, display_name, birth_date,
                email, phone, status, entry_date, exit_date, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                person.first_name,
                person.last_name,
                person.display_name,
                person.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                person.email,
                person.phone,
                person.status.to_db_str(),
                person.entry_date.map(|d| d.format("%Y-%m-%d").to_string()),
                person.exit_date.map(|d| d.format("%Y-%m-%d").to_string()),
                person.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 部分更新（只更新被显式设置的字段）
    pub fn update(&self, person_id: i64, update: &PersonUpdate) -> RepositoryResult<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let text = |v: &str| Value::Text(v.to_string());
        let opt_text = |v: &Option<String>| match v {
            Some(s) => Value::Text(s.clone()),
            None => Value::Null,
        };
        let opt_date = |v: &Option<chrono::NaiveDate>| match v {
            Some(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
            None => Value::Null,
        };

        if let Some(v) = &update.first_name {
            sets.push("first_name = ?");
            values.push(text(v));
        }
        if let Some(v) = &update.last_name {
            sets.push("last_name = ?");
            values.push(text(v));
        }
        if let Some(v) = &update.display_name {
            sets.push("display_name = ?");
            values.push(text(v));
        }
        if let Some(v) = &update.birth_date {
            sets.push("birth_date = ?");
            values.push(opt_date(v));
        }
        if let Some(v) = &update.email {
            sets.push("email = ?");
            values.push(opt_text(v));
        }
        if let Some(v) = &update.phone {
            sets.push("phone = ?");
            values.push(opt_text(v));
        }
        if let Some(v) = &update.status {
            sets.push("status = ?");
            values.push(text(v.to_db_str()));
        }
        if let Some(v) = &update.entry_date {
            sets.push("entry_date = ?");
            values.push(opt_date(v));
        }
        if let Some(v) = &update.exit_date {
            sets.push("exit_date = ?");
            values.push(opt_date(v));
        }
        if let Some(v) = &update.notes {
            sets.push("notes = ?");
            values.push(opt_text(v));
        }

        values.push(Value::Integer(person_id));
        let sql = format!("UPDATE persons SET {} WHERE person_id = ?", sets.join(", "));

        let conn = self.get_conn()?;
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Person".to_string(),
                id: person_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除人员（限制/胜任记录级联删除）
    pub fn delete(&self, person_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM persons WHERE person_id = ?1", params![person_id])?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, person_id: i64) -> RepositoryResult<Option<Person>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM persons WHERE person_id = ?1", PERSON_COLUMNS);
        let result = conn
            .query_row(&sql, params![person_id], Self::row_to_person)
            .optional()?;
        Ok(result)
    }

    /// 按显示名查询
    pub fn find_by_display_name(&self, display_name: &str) -> RepositoryResult<Option<Person>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM persons WHERE display_name = ?1",
            PERSON_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![display_name], Self::row_to_person)
            .optional()?;
        Ok(result)
    }

    /// 全部人员（按姓名排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Person>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM persons ORDER BY last_name, first_name",
            PERSON_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::row_to_person)?;
        let mut persons = Vec::new();
        for row in rows {
            persons.push(row?);
        }
        Ok(persons)
    }

    // ==========================================
    // 勤务限制
    // ==========================================

    /// 读取人员的受限勤务类型集合
    pub fn get_restrictions(&self, person_id: i64) -> RepositoryResult<HashSet<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT duty_type_id FROM person_duty_restrictions WHERE person_id = ?1",
        )?;
        let rows = stmt.query_map(params![person_id], |row| row.get::<_, i64>(0))?;
        let mut restrictions = HashSet::new();
        for row in rows {
            restrictions.insert(row?);
        }
        Ok(restrictions)
    }

    /// 覆盖式写入受限勤务类型（整体替换，超出上限拒绝）
    pub fn set_restrictions(&self, person_id: i64, duty_type_ids: &[i64]) -> RepositoryResult<()> {
        let unique: HashSet<i64> = duty_type_ids.iter().copied().collect();
        if unique.len() > MAX_RESTRICTIONS_PER_PERSON {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "每人最多 {} 个受限勤务类型，收到 {} 个",
                MAX_RESTRICTIONS_PER_PERSON,
                unique.len()
            )));
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM person_duty_restrictions WHERE person_id = ?1",
            params![person_id],
        )?;
        for duty_type_id in &unique {
            tx.execute(
                "INSERT INTO person_duty_restrictions (person_id, duty_type_id) VALUES (?1, ?2)",
                params![person_id, duty_type_id],
            )?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    // ==========================================
    // 勤务胜任
    // ==========================================

    /// 读取人员的胜任映射 (duty_type_id -> 是否队长)
    pub fn get_competencies(&self, person_id: i64) -> RepositoryResult<HashMap<i64, bool>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT duty_type_id, is_team_leader FROM person_competencies WHERE person_id = ?1",
        )?;
        let rows = stmt.query_map(params![person_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, bool>(1)?))
        })?;
        let mut competencies = HashMap::new();
        for row in rows {
            let (duty_type_id, is_team_leader) = row?;
            competencies.insert(duty_type_id, is_team_leader);
        }
        Ok(competencies)
    }

    /// 覆盖式写入胜任记录
    pub fn set_competencies(
        &self,
        person_id: i64,
        competencies: &[(i64, bool)],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM person_competencies WHERE person_id = ?1",
            params![person_id],
        )?;
        for (duty_type_id, is_team_leader) in competencies {
            tx.execute(
                r#"
                INSERT INTO person_competencies (person_id, duty_type_id, is_team_leader)
                VALUES (?1, ?2, ?3)
                "#,
                params![person_id, duty_type_id, is_team_leader],
            )?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 单条胜任记录查询
    pub fn get_competency(
        &self,
        person_id: i64,
        duty_type_id: i64,
    ) -> RepositoryResult<Option<Competency>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT person_id, duty_type_id, is_team_leader
                FROM person_competencies
                WHERE person_id = ?1 AND duty_type_id = ?2
                "#,
                params![person_id, duty_type_id],
                |row| {
                    Ok(Competency {
                        person_id: row.get(0)?,
                        duty_type_id: row.get(1)?,
                        is_team_leader: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ==========================================
    // 候选人查询
    // ==========================================

    /// 某勤务类型的结构性候选人
    ///
    /// 过滤条件:
    /// - 状态 ACTIVE / PASSIVE
    /// - 未对该勤务类型设限
    /// - 尚未被排入指定班次
    ///
    /// 时间冲突不在此过滤（由可用性引擎基于活动内排班判定）
    pub fn list_candidates_for_duty(
        &self,
        duty_type_id: i64,
        excluding_shift_id: i64,
    ) -> RepositoryResult<Vec<Person>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM persons p
            WHERE p.status IN ('ACTIVE', 'PASSIVE')
              AND NOT EXISTS (
                  SELECT 1 FROM person_duty_restrictions r
                  WHERE r.person_id = p.person_id AND r.duty_type_id = ?1
              )
              AND NOT EXISTS (
                  SELECT 1 FROM assignments a
                  WHERE a.person_id = p.person_id AND a.shift_id = ?2
              )
            ORDER BY p.display_name
            "#,
            PERSON_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![duty_type_id, excluding_shift_id], Self::row_to_person)?;
        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        Ok(candidates)
    }
}
