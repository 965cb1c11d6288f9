// ==========================================
// 志愿者排班系统 - 排班业务接口
// ==========================================
// 职责: 装配仓储与引擎（共享一条连接），执行活动状态门控
// 红线: 同一活动的提案生成不得并发触发（排他由展示层保证，
//       接口内部不加锁）
// ==========================================

use crate::config::{ConfigManager, ScoringProfile};
use crate::domain::event::Event;
use crate::domain::types::AttendanceStatus;
use crate::engine::{
    AvailabilityEngine, CandidateInfo, CandidateRanker, FairnessScorer, MemberSummaryRow,
    PersonScore, PlanValidator, PlanWarning, ProposalGenerator, ProposalOutcome, ReportEngine,
    TimeFilter,
};
use crate::repository::{
    AssignmentRepository, DutyTypeRepository, EventRepository, PersonRepository, ShiftRepository,
    TaskRepository,
};
use crate::api::error::{ApiError, ApiResult};
use chrono::NaiveDate;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// PlanningApi - 排班业务接口
// ==========================================
pub struct PlanningApi {
    person_repo: Arc<PersonRepository>,
    duty_type_repo: Arc<DutyTypeRepository>,
    event_repo: Arc<EventRepository>,
    task_repo: Arc<TaskRepository>,
    shift_repo: Arc<ShiftRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    config: ConfigManager,
}

impl PlanningApi {
    /// 打开数据库（建表 + 迁移）并创建接口实例
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::init_database(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接装配（全部仓储共享该连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            person_repo: Arc::new(PersonRepository::from_connection(conn.clone())),
            duty_type_repo: Arc::new(DutyTypeRepository::from_connection(conn.clone())),
            event_repo: Arc::new(EventRepository::from_connection(conn.clone())),
            task_repo: Arc::new(TaskRepository::from_connection(conn.clone())),
            shift_repo: Arc::new(ShiftRepository::from_connection(conn.clone())),
            assignment_repo: Arc::new(AssignmentRepository::from_connection(conn.clone())),
            config: ConfigManager::from_connection(conn),
        }
    }

    // ==========================================
    // 仓储访问（展示层 CRUD 入口）
    // ==========================================

    pub fn persons(&self) -> Arc<PersonRepository> {
        self.person_repo.clone()
    }

    pub fn duty_types(&self) -> Arc<DutyTypeRepository> {
        self.duty_type_repo.clone()
    }

    pub fn events(&self) -> Arc<EventRepository> {
        self.event_repo.clone()
    }

    pub fn tasks(&self) -> Arc<TaskRepository> {
        self.task_repo.clone()
    }

    pub fn shifts(&self) -> Arc<ShiftRepository> {
        self.shift_repo.clone()
    }

    pub fn assignments(&self) -> Arc<AssignmentRepository> {
        self.assignment_repo.clone()
    }

    // ==========================================
    // 引擎装配
    // ==========================================

    fn availability_engine(&self) -> AvailabilityEngine {
        AvailabilityEngine::new(
            self.shift_repo.clone(),
            self.task_repo.clone(),
            self.person_repo.clone(),
            self.assignment_repo.clone(),
        )
    }

    fn fairness_scorer(&self) -> FairnessScorer {
        FairnessScorer::new(self.assignment_repo.clone())
    }

    fn proposal_generator(&self) -> ApiResult<ProposalGenerator> {
        let profile = self.config.get_scoring_profile()?;
        Ok(ProposalGenerator::new(
            self.shift_repo.clone(),
            self.assignment_repo.clone(),
            self.availability_engine(),
            self.fairness_scorer(),
            CandidateRanker::new(profile),
        ))
    }

    // ==========================================
    // 业务入口
    // ==========================================

    /// 手工指派选人器: 某班次的可排候选人（默认展示序）
    pub fn available_candidates(&self, shift_id: i64) -> ApiResult<Vec<CandidateInfo>> {
        Ok(self.availability_engine().available_candidates(shift_id)?)
    }

    /// 公平分排行报表
    ///
    /// # 参数
    /// - `include_inactive`: 是否包含非现役人员
    /// - `limit`: 每人只计最近 N 条出勤记录（None 为全量）
    pub fn ranking_report(
        &self,
        include_inactive: bool,
        limit: Option<u32>,
    ) -> ApiResult<Vec<PersonScore>> {
        Ok(self
            .fairness_scorer()
            .historical_scores(include_inactive, limit)?)
    }

    /// 生成活动排班提案
    ///
    /// 不清空既有排班（重排先调用 `reset_planning`）
    ///
    /// # 参数
    /// - `history_limit`: 公平分计数窗口
    /// - `seed`: 随机种子（None 使用系统熵；固定种子可复现）
    pub fn generate_proposal(
        &self,
        event_id: i64,
        history_limit: Option<u32>,
        seed: Option<u64>,
    ) -> ApiResult<ProposalOutcome> {
        self.editable_event(event_id)?;

        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Ok(self
            .proposal_generator()?
            .generate(event_id, history_limit, &mut rng)?)
    }

    /// 重置排班（清空活动内全部排班记录）
    ///
    /// # 返回
    /// 删除的记录数
    pub fn reset_planning(&self, event_id: i64) -> ApiResult<usize> {
        self.editable_event(event_id)?;
        Ok(self.assignment_repo.delete_for_event(event_id)?)
    }

    /// 校验活动排班（只读，对任意状态的活动可用）
    pub fn validate_plan(&self, event_id: i64) -> ApiResult<Vec<PlanWarning>> {
        self.existing_event(event_id)?;
        let validator = PlanValidator::new(self.assignment_repo.clone(), self.person_repo.clone());
        Ok(validator.validate(event_id)?)
    }

    /// 登记出勤结果（复盘）
    ///
    /// 仅 COMPLETED / ACTIVE 活动可登记
    pub fn record_attendance(
        &self,
        assignment_id: i64,
        status: AttendanceStatus,
        substitute_person_id: Option<i64>,
    ) -> ApiResult<()> {
        let assignment = self
            .assignment_repo
            .find_by_id(assignment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Assignment (id={})", assignment_id)))?;

        let event = self.event_for_shift(assignment.shift_id)?;
        if !event.is_reviewable() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "活动 '{}' 状态为 {}，不在复盘范围内",
                event.name, event.status
            )));
        }

        self.assignment_repo
            .update_status(assignment_id, status, substitute_person_id)?;
        Ok(())
    }

    /// 人员工时与出勤汇总
    pub fn member_summary(
        &self,
        filter: TimeFilter,
        today: NaiveDate,
    ) -> ApiResult<Vec<MemberSummaryRow>> {
        let engine = ReportEngine::new(self.assignment_repo.clone());
        Ok(engine.member_summary(filter, today)?)
    }

    /// 活动人力盘点 (总需求人数, 已排人数)
    pub fn staffing_summary(&self, event_id: i64) -> ApiResult<(i64, i64)> {
        self.existing_event(event_id)?;
        Ok(self.assignment_repo.staffing_summary(event_id)?)
    }

    /// 读取评分参数
    pub fn scoring_profile(&self) -> ApiResult<ScoringProfile> {
        Ok(self.config.get_scoring_profile()?)
    }

    /// 写入评分参数
    pub fn set_scoring_profile(&self, profile: &ScoringProfile) -> ApiResult<()> {
        Ok(self.config.set_scoring_profile(profile)?)
    }

    // ==========================================
    // 门控辅助
    // ==========================================

    fn existing_event(&self, event_id: i64) -> ApiResult<Event> {
        self.event_repo
            .find_by_id(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Event (id={})", event_id)))
    }

    fn editable_event(&self, event_id: i64) -> ApiResult<Event> {
        let event = self.existing_event(event_id)?;
        if !event.is_editable() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "活动 '{}' 已结束，排班操作已关闭",
                event.name
            )));
        }
        Ok(event)
    }

    /// 班次 -> 任务 -> 活动 链路解析
    fn event_for_shift(&self, shift_id: i64) -> ApiResult<Event> {
        let shift = self
            .shift_repo
            .find_by_id(shift_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Shift (id={})", shift_id)))?;
        let task = self
            .task_repo
            .find_by_id(shift.task_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Task (id={})", shift.task_id)))?;
        self.existing_event(task.event_id)
    }
}
