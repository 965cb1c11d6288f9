// ==========================================
// 志愿者排班系统 - 人员领域模型
// ==========================================
// 约束: 每人最多 3 个受限勤务类型（写入层强制，校验器兜底）
// ==========================================

use crate::domain::types::PersonStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 每人受限勤务类型上限
pub const MAX_RESTRICTIONS_PER_PERSON: usize = 3;

// ==========================================
// Person - 人员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub person_id: i64,                // 人员ID
    pub first_name: String,            // 名
    pub last_name: String,             // 姓
    pub display_name: String,          // 显示名（全局唯一）
    pub birth_date: Option<NaiveDate>, // 出生日期
    pub email: Option<String>,         // 邮箱
    pub phone: Option<String>,         // 电话
    pub status: PersonStatus,          // 人员状态
    pub entry_date: Option<NaiveDate>, // 加入日期
    pub exit_date: Option<NaiveDate>,  // 退出日期
    pub notes: Option<String>,         // 备注
}

// ==========================================
// PersonUpdate - 部分更新
// ==========================================
// 只更新被显式设置的字段，取代动态拼接 SET 子句
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub email: Option<Option<String>>,
    #[serde(default)]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<PersonStatus>,
    #[serde(default)]
    pub entry_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub exit_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

impl PersonUpdate {
    /// 是否没有任何待更新字段
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.display_name.is_none()
            && self.birth_date.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.status.is_none()
            && self.entry_date.is_none()
            && self.exit_date.is_none()
            && self.notes.is_none()
    }
}

// ==========================================
// Competency - 勤务胜任记录
// ==========================================
// is_team_leader: 是否具备该勤务类型的队长资质
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competency {
    pub person_id: i64,
    pub duty_type_id: i64,
    pub is_team_leader: bool,
}
