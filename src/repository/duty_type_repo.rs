// ==========================================
// 志愿者排班系统 - 勤务类型数据仓储
// ==========================================
// 红线: 受保护勤务类型不可删除/改名
// ==========================================

use crate::domain::duty_type::DutyType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// DutyTypeRepository - 勤务类型仓储
// ==========================================
pub struct DutyTypeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DutyTypeRepository {
    /// 创建新的 DutyTypeRepository 实例
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

    fn row_to_duty_type(row: &Row<'_>) -> rusqlite::Result<DutyType> {
        Ok(DutyType {
            duty_type_id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            is_protected: row.get(3)?,
        })
    }

    /// 新建勤务类型，返回自增ID
    pub fn create(&self, name: &str, description: Option<&str>) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO duty_types (name, description, is_protected) VALUES (?1, ?2, 0)",
            params![name, description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 更新名称与说明
    ///
    /// 受保护类型允许改说明，不允许改名
    pub fn update(
        &self,
        duty_type_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> RepositoryResult<()> {
        let existing = self.find_by_id(duty_type_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "DutyType".to_string(),
                id: duty_type_id.to_string(),
            }
        })?;

        if existing.is_protected && existing.name != name {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "受保护勤务类型 '{}' 不允许改名",
                existing.name
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE duty_types SET name = ?1, description = ?2 WHERE duty_type_id = ?3",
            params![name, description, duty_type_id],
        )?;
        Ok(())
    }

    /// 删除勤务类型
    ///
    /// 受保护类型、仍被引用的类型均拒绝删除
    pub fn delete(&self, duty_type_id: i64) -> RepositoryResult<()> {
        let existing = self.find_by_id(duty_type_id)?.ok_or_else(|| {
            RepositoryError::NotFound {
                entity: "DutyType".to_string(),
                id: duty_type_id.to_string(),
            }
        })?;

        if existing.is_protected {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "受保护勤务类型 '{}' 不允许删除",
                existing.name
            )));
        }
        if self.is_in_use(duty_type_id)? {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "勤务类型 '{}' 仍被任务引用，不允许删除",
                existing.name
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM duty_types WHERE duty_type_id = ?1",
            params![duty_type_id],
        )?;
        Ok(())
    }

    /// 是否仍被任务引用
    pub fn is_in_use(&self, duty_type_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE duty_type_id = ?1",
            params![duty_type_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 按ID查询
    pub fn find_by_id(&self, duty_type_id: i64) -> RepositoryResult<Option<DutyType>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT duty_type_id, name, description, is_protected
                FROM duty_types WHERE duty_type_id = ?1
                "#,
                params![duty_type_id],
                Self::row_to_duty_type,
            )
            .optional()?;
        Ok(result)
    }

    /// 按名称查询
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<DutyType>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT duty_type_id, name, description, is_protected
                FROM duty_types WHERE name = ?1
                "#,
                params![name],
                Self::row_to_duty_type,
            )
            .optional()?;
        Ok(result)
    }

    /// 全部勤务类型（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<DutyType>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT duty_type_id, name, description, is_protected
            FROM duty_types ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map([], Self::row_to_duty_type)?;
        let mut duty_types = Vec::new();
        for row in rows {
            duty_types.push(row?);
        }
        Ok(duty_types)
    }
}
