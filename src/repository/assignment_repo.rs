// ==========================================
// 志愿者排班系统 - 排班数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: assignments 表的数据访问与排班相关联合查询
// 不变式: DONE_VIA_SUBSTITUTE 必须携带替班人员，其余状态替班必须为空
// ==========================================

use crate::domain::assignment::{Assignment, AttendanceLogRow, EventAssignmentRow};
use crate::domain::types::{AttendanceStatus, PersonStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_date_col, parse_enum_col, parse_time_col};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// 联合查询行类型
// ==========================================

/// 班次上已排人员（含该班次勤务类型的胜任标记）
#[derive(Debug, Clone)]
pub struct AssignedPersonRow {
    pub person_id: i64,
    pub display_name: String,
    pub has_competence: bool,
    pub is_team_leader: bool,
}

/// 班次占用概览（校验器检查 1 的输入）
#[derive(Debug, Clone)]
pub struct ShiftOccupancyRow {
    pub shift_id: i64,
    pub task_name: String,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub required_people: i64,
    pub assigned_count: i64,
}

/// 活动内排班明细（校验器检查 2/3 的输入）
#[derive(Debug, Clone)]
pub struct AssignmentDetailRow {
    pub assignment_id: i64,
    pub person_id: i64,
    pub display_name: String,
    pub shift_id: i64,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub task_name: String,
    pub duty_type_id: i64,
}

// ==========================================
// AssignmentRepository - 排班仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    /// 创建新的 AssignmentRepository 实例
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

    fn row_to_assignment(row: &Row<'_>) -> rusqlite::Result<Assignment> {
        let status_raw: String = row.get(4)?;
        Ok(Assignment {
            assignment_id: row.get(0)?,
            shift_id: row.get(1)?,
            person_id: row.get(2)?,
            substitute_person_id: row.get(3)?,
            attendance_status: parse_enum_col(
                4,
                &status_raw,
                AttendanceStatus::from_db_str,
                "出勤状态",
            )?,
        })
    }

    // ==========================================
    // 排班写入
    // ==========================================

    /// 新建排班（出勤状态默认 PLANNED），返回自增ID
    pub fn create(&self, person_id: i64, shift_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO assignments (person_id, shift_id) VALUES (?1, ?2)",
            params![person_id, shift_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 将人员从班次移除
    pub fn remove(&self, person_id: i64, shift_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM assignments WHERE person_id = ?1 AND shift_id = ?2",
            params![person_id, shift_id],
        )?;
        Ok(())
    }

    /// 清空活动内全部排班（"重置排班"）
    pub fn delete_for_event(&self, event_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            r#"
            DELETE FROM assignments WHERE shift_id IN (
                SELECT s.shift_id FROM shifts s
                JOIN tasks t ON s.task_id = t.task_id
                WHERE t.event_id = ?1
            )
            "#,
            params![event_id],
        )?;
        Ok(deleted)
    }

    /// 登记出勤结果
    ///
    /// # 参数
    /// - `status`: 目标出勤状态
    /// - `substitute_person_id`: 替班人员（仅 DONE_VIA_SUBSTITUTE 允许且必填）
    pub fn update_status(
        &self,
        assignment_id: i64,
        status: AttendanceStatus,
        substitute_person_id: Option<i64>,
    ) -> RepositoryResult<()> {
        match (status, substitute_person_id) {
            (AttendanceStatus::DoneViaSubstitute, None) => {
                return Err(RepositoryError::FieldValueError {
                    field: "substitute_person_id".to_string(),
                    message: "出勤状态 DONE_VIA_SUBSTITUTE 必须指定替班人员".to_string(),
                });
            }
            (AttendanceStatus::DoneViaSubstitute, Some(_)) => {}
            (_, Some(_)) => {
                return Err(RepositoryError::FieldValueError {
                    field: "substitute_person_id".to_string(),
                    message: format!("出勤状态 {} 不允许携带替班人员", status),
                });
            }
            (_, None) => {}
        }

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE assignments SET attendance_status = ?1, substitute_person_id = ?2
            WHERE assignment_id = ?3
            "#,
            params![status.to_db_str(), substitute_person_id, assignment_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Assignment".to_string(),
                id: assignment_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 排班读取
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, assignment_id: i64) -> RepositoryResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                r#"
                SELECT assignment_id, shift_id, person_id, substitute_person_id, attendance_status
                FROM assignments WHERE assignment_id = ?1
                "#,
                params![assignment_id],
                Self::row_to_assignment,
            )
            .optional()?;
        Ok(result)
    }

    /// 班次上已排人员（含该班次勤务类型的胜任/队长标记，按显示名排序）
    pub fn list_for_shift(&self, shift_id: i64) -> RepositoryResult<Vec<AssignedPersonRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.person_id,
                p.display_name,
                CASE WHEN pc.person_id IS NOT NULL THEN 1 ELSE 0 END AS has_competence,
                COALESCE(pc.is_team_leader, 0) AS is_team_leader
            FROM assignments a
            JOIN persons p ON a.person_id = p.person_id
            JOIN shifts s ON a.shift_id = s.shift_id
            JOIN tasks t ON s.task_id = t.task_id
            LEFT JOIN person_competencies pc
                ON p.person_id = pc.person_id AND t.duty_type_id = pc.duty_type_id
            WHERE a.shift_id = ?1
            ORDER BY p.display_name
            "#,
        )?;
        let rows = stmt.query_map(params![shift_id], |row| {
            Ok(AssignedPersonRow {
                person_id: row.get(0)?,
                display_name: row.get(1)?,
                has_competence: row.get(2)?,
                is_team_leader: row.get(3)?,
            })
        })?;
        let mut assigned = Vec::new();
        for row in rows {
            assigned.push(row?);
        }
        Ok(assigned)
    }

    /// 班次上已排人数
    pub fn count_for_shift(&self, shift_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM assignments WHERE shift_id = ?1",
            params![shift_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 活动内全部排班行（时间冲突检测输入）
    pub fn list_for_event(&self, event_id: i64) -> RepositoryResult<Vec<EventAssignmentRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.person_id, s.shift_date, s.start_time, s.end_time
            FROM assignments a
            JOIN shifts s ON a.shift_id = s.shift_id
            JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |row| {
            let date_raw: String = row.get(1)?;
            let start_raw: String = row.get(2)?;
            let end_raw: String = row.get(3)?;
            Ok(EventAssignmentRow {
                person_id: row.get(0)?,
                shift_date: parse_date_col(1, &date_raw)?,
                start_time: parse_time_col(2, &start_raw)?,
                end_time: parse_time_col(3, &end_raw)?,
            })
        })?;
        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row?);
        }
        Ok(assignments)
    }

    /// 活动内全部排班实体（数据一致性巡检输入）
    pub fn list_full_for_event(&self, event_id: i64) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.assignment_id, a.shift_id, a.person_id, a.substitute_person_id, a.attendance_status
            FROM assignments a
            JOIN shifts s ON a.shift_id = s.shift_id
            JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
            ORDER BY a.assignment_id
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], Self::row_to_assignment)?;
        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(row?);
        }
        Ok(assignments)
    }

    /// 活动排班明细（人员 + 班次时间 + 任务/勤务类型）
    ///
    /// 排序: 显示名、日期、开始时刻（校验器按人分组的遍历顺序）
    pub fn list_event_assignment_details(
        &self,
        event_id: i64,
    ) -> RepositoryResult<Vec<AssignmentDetailRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                a.assignment_id, p.person_id, p.display_name,
                s.shift_id, s.shift_date, s.start_time, s.end_time,
                t.name, t.duty_type_id
            FROM assignments a
            JOIN persons p ON a.person_id = p.person_id
            JOIN shifts s ON a.shift_id = s.shift_id
            JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
            ORDER BY p.display_name, s.shift_date, s.start_time
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |row| {
            let date_raw: String = row.get(4)?;
            let start_raw: String = row.get(5)?;
            let end_raw: String = row.get(6)?;
            Ok(AssignmentDetailRow {
                assignment_id: row.get(0)?,
                person_id: row.get(1)?,
                display_name: row.get(2)?,
                shift_id: row.get(3)?,
                shift_date: parse_date_col(4, &date_raw)?,
                start_time: parse_time_col(5, &start_raw)?,
                end_time: parse_time_col(6, &end_raw)?,
                task_name: row.get(7)?,
                duty_type_id: row.get(8)?,
            })
        })?;
        let mut details = Vec::new();
        for row in rows {
            details.push(row?);
        }
        Ok(details)
    }

    /// 班次占用概览（按日期、开始时刻排序）
    pub fn list_shift_occupancy(&self, event_id: i64) -> RepositoryResult<Vec<ShiftOccupancyRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                s.shift_id, t.name, s.shift_date, s.start_time, s.required_people,
                (SELECT COUNT(*) FROM assignments a WHERE a.shift_id = s.shift_id) AS assigned_count
            FROM shifts s
            JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
            ORDER BY s.shift_date, s.start_time
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |row| {
            let date_raw: String = row.get(2)?;
            let start_raw: String = row.get(3)?;
            Ok(ShiftOccupancyRow {
                shift_id: row.get(0)?,
                task_name: row.get(1)?,
                shift_date: parse_date_col(2, &date_raw)?,
                start_time: parse_time_col(3, &start_raw)?,
                required_people: row.get(4)?,
                assigned_count: row.get(5)?,
            })
        })?;
        let mut occupancy = Vec::new();
        for row in rows {
            occupancy.push(row?);
        }
        Ok(occupancy)
    }

    /// 活动人力盘点
    ///
    /// # 返回
    /// (总需求人数, 已排人数)
    pub fn staffing_summary(&self, event_id: i64) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let summary = conn.query_row(
            r#"
            SELECT
                (SELECT COALESCE(SUM(s.required_people), 0)
                 FROM shifts s JOIN tasks t ON s.task_id = t.task_id
                 WHERE t.event_id = ?1) AS total_required,
                (SELECT COALESCE(COUNT(a.assignment_id), 0)
                 FROM assignments a
                 JOIN shifts s ON a.shift_id = s.shift_id
                 JOIN tasks t ON s.task_id = t.task_id
                 WHERE t.event_id = ?1) AS total_assigned
            "#,
            params![event_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(summary)
    }

    /// 有人值守但无队长的班次（队长合规检查）
    pub fn shifts_missing_team_leader(&self, event_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.shift_id
            FROM shifts s JOIN tasks t ON s.task_id = t.task_id
            WHERE t.event_id = ?1
              AND (SELECT COUNT(a.assignment_id) FROM assignments a WHERE a.shift_id = s.shift_id) > 0
              AND NOT EXISTS (
                  SELECT 1 FROM assignments a
                  JOIN person_competencies pc ON a.person_id = pc.person_id
                  WHERE a.shift_id = s.shift_id
                    AND pc.duty_type_id = t.duty_type_id
                    AND pc.is_team_leader = 1
              )
            ORDER BY s.shift_date, s.start_time
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |row| row.get::<_, i64>(0))?;
        let mut shift_ids = Vec::new();
        for row in rows {
            shift_ids.push(row?);
        }
        Ok(shift_ids)
    }

    /// 历史出勤行（公平分/工时统计输入）
    ///
    /// 每个人员按"最近活动优先"展开其全部出勤行（含担任替班者的行）；
    /// 无任何历史的人员以出勤字段全空的单行出现。
    pub fn attendance_log(&self) -> RepositoryResult<Vec<AttendanceLogRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.person_id, p.display_name, p.status,
                a.person_id, a.substitute_person_id, a.attendance_status,
                e.start_date, s.shift_date, s.start_time, s.end_time
            FROM persons p
            LEFT JOIN assignments a
                ON p.person_id = a.person_id OR p.person_id = a.substitute_person_id
            LEFT JOIN shifts s ON a.shift_id = s.shift_id
            LEFT JOIN tasks t ON s.task_id = t.task_id
            LEFT JOIN events e ON t.event_id = e.event_id
            ORDER BY p.person_id, e.start_date DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let status_raw: String = row.get(2)?;
            let event_start_date = match row.get::<_, Option<String>>(6)? {
                Some(s) => Some(parse_date_col(6, &s)?),
                None => None,
            };
            let shift_date = match row.get::<_, Option<String>>(7)? {
                Some(s) => Some(parse_date_col(7, &s)?),
                None => None,
            };
            let start_time = match row.get::<_, Option<String>>(8)? {
                Some(s) => Some(parse_time_col(8, &s)?),
                None => None,
            };
            let end_time = match row.get::<_, Option<String>>(9)? {
                Some(s) => Some(parse_time_col(9, &s)?),
                None => None,
            };
            Ok(AttendanceLogRow {
                person_id: row.get(0)?,
                display_name: row.get(1)?,
                status: parse_enum_col(2, &status_raw, PersonStatus::from_db_str, "人员状态")?,
                assigned_person_id: row.get(3)?,
                substitute_person_id: row.get(4)?,
                attendance_status: row.get(5)?,
                event_start_date,
                shift_date,
                start_time,
                end_time,
            })
        })?;
        let mut log = Vec::new();
        for row in rows {
            log.push(row?);
        }
        Ok(log)
    }
}
