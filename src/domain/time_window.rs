// ==========================================
// 志愿者排班系统 - 班次时间窗
// ==========================================
// 红线: 跨午夜规约只在这里实现一次
// 约定: end_time <= start_time 表示班次跨入次日（end +24h）
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// TimeWindow - 规约后的半开区间 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// 由班次三要素构造时间窗，应用跨午夜规约
    ///
    /// # 参数
    /// - `date`: 班次日期
    /// - `start_time`: 开始时刻
    /// - `end_time`: 结束时刻（<= start_time 时视为次日）
    pub fn from_shift(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        let start = date.and_time(start_time);
        let mut end = date.and_time(end_time);
        if end <= start {
            end += Duration::days(1);
        }
        TimeWindow { start, end }
    }

    /// 严格重叠判定: self.start < other.end && self.end > other.start
    ///
    /// 首尾相接（18:00-21:00 与 21:00-23:00）不算重叠
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// 首尾相接判定
    pub fn abuts(&self, other: &TimeWindow) -> bool {
        self.start == other.end || self.end == other.start
    }

    /// 是否跨入次日
    pub fn crosses_midnight(&self) -> bool {
        self.end.date() > self.start.date()
    }

    /// 整体平移 24 小时
    fn shifted_next_day(&self) -> TimeWindow {
        TimeWindow {
            start: self.start + Duration::days(1),
            end: self.end + Duration::days(1),
        }
    }

    /// 班次冲突判定（重叠即冲突）
    ///
    /// 在严格重叠之上处理一个录入惯例: 跨午夜班次（如 22:00-02:00）之后的
    /// 凌晨时段常被录在同一日历日（00:00-04:00）。此时把未跨午夜的一侧
    /// 平移 24 小时后再比较，使两个物理上同一夜的窗口能够命中。
    /// 双方都跨午夜、或日期不同的窗口不做平移（相邻两晚不是冲突）。
    pub fn conflicts_with(&self, other: &TimeWindow) -> bool {
        if self.overlaps(other) {
            return true;
        }
        if let Some((crossing, plain)) = Self::alias_pair(self, other) {
            return crossing.overlaps(&plain.shifted_next_day());
        }
        false
    }

    /// 连班（无休息间隔）判定，与 `conflicts_with` 同一套平移规则
    pub fn back_to_back_with(&self, other: &TimeWindow) -> bool {
        if self.abuts(other) {
            return true;
        }
        if let Some((crossing, plain)) = Self::alias_pair(self, other) {
            return crossing.abuts(&plain.shifted_next_day());
        }
        false
    }

    /// 平移规则适用时返回 (跨午夜窗口, 同日历日未跨午夜窗口)
    fn alias_pair<'a>(
        a: &'a TimeWindow,
        b: &'a TimeWindow,
    ) -> Option<(&'a TimeWindow, &'a TimeWindow)> {
        if a.crosses_midnight() && !b.crosses_midnight() && a.start.date() == b.start.date() {
            Some((a, b))
        } else if b.crosses_midnight() && !a.crosses_midnight() && b.start.date() == a.start.date()
        {
            Some((b, a))
        } else {
            None
        }
    }

    /// 时长（小时，跨午夜班次按规约后窗口计算）
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}
