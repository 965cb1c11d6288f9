// ==========================================
// 志愿者排班系统 - 勤务类型领域模型
// ==========================================
// is_protected: 受保护类型不可删除/改名（核心数据不被常规流程抽空）
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyType {
    pub duty_type_id: i64,           // 勤务类型ID
    pub name: String,                // 名称（全局唯一）
    pub description: Option<String>, // 说明
    pub is_protected: bool,          // 受保护标记
}
