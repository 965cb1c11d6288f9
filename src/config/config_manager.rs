// ==========================================
// 志愿者排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: settings 表 (key-value)
// ==========================================

use crate::config::scoring_profile::ScoringProfile;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 评分参数的存储键
const SCORING_PROFILE_KEY: &str = "scoring_profile";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(result)
    }

    /// 写入配置值（upsert）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取评分参数
    ///
    /// 未配置或 JSON 损坏时回退到默认参数（损坏时记录告警）
    pub fn get_scoring_profile(&self) -> RepositoryResult<ScoringProfile> {
        match self.get_value(SCORING_PROFILE_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(profile) => Ok(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "评分参数 JSON 解析失败，回退默认值");
                    Ok(ScoringProfile::default())
                }
            },
            None => Ok(ScoringProfile::default()),
        }
    }

    /// 写入评分参数
    pub fn set_scoring_profile(&self, profile: &ScoringProfile) -> RepositoryResult<()> {
        let raw = serde_json::to_string(profile)
            .map_err(|e| RepositoryError::InternalError(format!("评分参数序列化失败: {}", e)))?;
        self.set_value(SCORING_PROFILE_KEY, &raw)
    }
}
