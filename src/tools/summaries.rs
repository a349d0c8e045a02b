//! Summary MCP Tools
//!
//! Daily and weekly rollups built from stored diary snapshots.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::diary::DiaryEntryResponse;
use super::goals::goal_for_date;
use crate::db::Database;
use crate::error::NutritionResult;
use crate::models::{round2, DiaryEntry};
use crate::nutrition::{daily_summary as summarize_day, weekly_rollup, Adherence, TagBreakdown};

/// Response for daily_summary
#[derive(Debug, Serialize)]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub goal_calories: f64,
    pub goal_protein: f64,
    pub goal_carbs: f64,
    pub goal_fat: f64,
    pub goal_fiber: f64,
    pub has_goal: bool,
    pub adherence: Adherence,
    pub tag_breakdown: TagBreakdown,
    pub entries: Vec<DiaryEntryResponse>,
}

/// One day in a weekly summary
#[derive(Debug, Serialize)]
pub struct WeekDaySummary {
    pub date: NaiveDate,
    pub weekday: String,
    pub total_calories: f64,
    pub routine_percent: f64,
    pub contextual_percent: f64,
    pub mostly_routine: Option<bool>,
}

/// Response for weekly_summary
#[derive(Debug, Serialize)]
pub struct WeeklySummaryResponse {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<WeekDaySummary>,
    /// Monday-first; `null` for days with nothing logged
    pub routine_days: Vec<Option<bool>>,
    pub mostly_routine_days: usize,
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Totals, goal adherence and tag breakdown for one day
pub fn daily_summary(db: &Database, user_id: i64, date: NaiveDate) -> NutritionResult<DailySummaryResponse> {
    let (entries, goal) = db.with_conn(|conn| {
        let entries = DiaryEntry::list_for_date(conn, user_id, date)?;
        let goal = goal_for_date(conn, user_id, date)?;
        Ok((entries, goal))
    })?;

    let summary = summarize_day(date, &entries, goal.as_ref());
    let totals = summary.totals.rounded();
    let target = summary.goal.rounded();
    tracing::debug!(user_id, date = %date, entries = entries.len(), "daily summary");

    Ok(DailySummaryResponse {
        date,
        total_calories: totals.calories,
        total_protein: totals.protein,
        total_carbs: totals.carbs,
        total_fat: totals.fat,
        total_fiber: totals.fiber,
        goal_calories: target.calories,
        goal_protein: target.protein,
        goal_carbs: target.carbs,
        goal_fat: target.fat,
        goal_fiber: target.fiber,
        has_goal: goal.is_some(),
        adherence: summary.adherence.rounded(),
        tag_breakdown: summary.breakdown.rounded(),
        entries: entries.into_iter().map(DiaryEntryResponse::from).collect(),
    })
}

/// Routine share per day for the Monday-first week containing `date`
pub fn weekly_summary(db: &Database, user_id: i64, date: NaiveDate) -> NutritionResult<WeeklySummaryResponse> {
    let start = week_start(date);
    let end = start + Duration::days(6);

    let entries = db.with_conn(|conn| DiaryEntry::list_for_range(conn, user_id, start, end))?;
    let rollup = weekly_rollup(start, &entries);
    tracing::debug!(user_id, week_start = %start, entries = entries.len(), "weekly summary");

    let routine_days: Vec<Option<bool>> = rollup.iter().map(|d| d.mostly_routine).collect();
    let days = rollup
        .iter()
        .map(|d| WeekDaySummary {
            date: d.date,
            weekday: d.date.format("%A").to_string(),
            total_calories: round2(d.breakdown.total_calories),
            routine_percent: round2(d.breakdown.routine_percent),
            contextual_percent: round2(d.breakdown.contextual_percent),
            mostly_routine: d.mostly_routine,
        })
        .collect();

    Ok(WeeklySummaryResponse {
        week_start: start,
        week_end: end,
        days,
        mostly_routine_days: routine_days.iter().filter(|d| **d == Some(true)).count(),
        routine_days,
    })
}
