//! Goal MCP Tools
//!
//! Daily nutrient targets. Setting a goal replaces the active one.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{Database, DbResult};
use crate::error::{NutritionError, NutritionResult};
use crate::models::{Nutrition, NutritionGoal, NutritionGoalCreate};
use crate::nutrition::validation::{parse_date, validate_profile};

/// Input for set_goal
#[derive(Debug, Clone, Default)]
pub struct SetGoalRequest {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoalResponse {
    pub id: i64,
    pub target: Nutrition,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<NutritionGoal> for GoalResponse {
    fn from(goal: NutritionGoal) -> Self {
        Self {
            id: goal.id,
            target: goal.target.rounded(),
            start_date: goal.start_date,
            end_date: goal.end_date,
            is_active: goal.is_active,
            created_at: goal.created_at,
        }
    }
}

/// Response for set_goal
#[derive(Debug, Serialize)]
pub struct SetGoalResponse {
    pub goal: GoalResponse,
    /// Number of previously active goals that were deactivated
    pub replaced: usize,
}

/// Response for get_goal
#[derive(Debug, Serialize)]
pub struct GetGoalResponse {
    pub goal: GoalResponse,
    pub date: NaiveDate,
    /// Whether the goal's window includes `date`
    pub covers_date: bool,
}

/// The goal that applies to `date`, if any
pub fn goal_for_date(conn: &rusqlite::Connection, user_id: i64, date: NaiveDate) -> DbResult<Option<NutritionGoal>> {
    Ok(NutritionGoal::get_active(conn, user_id)?.filter(|goal| goal.covers(date)))
}

/// Set a new goal, deactivating the previous one in the same transaction
pub fn set_goal(
    db: &Database,
    user_id: i64,
    request: SetGoalRequest,
    today: NaiveDate,
) -> NutritionResult<SetGoalResponse> {
    let target = Nutrition::new(
        request.calories,
        request.protein,
        request.carbs,
        request.fat,
        request.fiber,
    );
    validate_profile(&target, "goal")?;

    let start_date = request.start_date.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let end_date = request.end_date.as_deref().map(parse_date).transpose()?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err(NutritionError::invalid(format!(
                "end_date {} is before start_date {}",
                end, start_date
            )));
        }
    }

    let (goal, replaced) = db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let replaced = NutritionGoal::deactivate_all(&tx, user_id)?;
        let goal = NutritionGoal::create(
            &tx,
            &NutritionGoalCreate {
                owner_id: user_id,
                target,
                start_date,
                end_date,
            },
        )?;
        tx.commit()?;
        Ok((goal, replaced))
    })?;

    tracing::info!(goal_id = goal.id, user_id, replaced, "nutrition goal set");

    Ok(SetGoalResponse {
        goal: goal.into(),
        replaced,
    })
}

/// Get the active goal and whether it applies to `date`
pub fn get_goal(db: &Database, user_id: i64, date: NaiveDate) -> NutritionResult<GetGoalResponse> {
    let goal = db
        .with_conn(|conn| NutritionGoal::get_active(conn, user_id))?
        .ok_or(NutritionError::GoalNotFound)?;

    Ok(GetGoalResponse {
        covers_date: goal.covers(date),
        goal: goal.into(),
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SetGoalRequest {
        SetGoalRequest {
            calories: 2200.0,
            protein: 160.0,
            carbs: 220.0,
            fat: 70.0,
            fiber: 30.0,
            ..Default::default()
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn test_set_goal_replaces_previous() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(get_goal(&db, 1, day(1)), Err(NutritionError::GoalNotFound)));

        let first = set_goal(&db, 1, request(), day(1)).unwrap();
        assert_eq!(first.replaced, 0);
        assert_eq!(first.goal.start_date, day(1));

        let second = set_goal(&db, 1, SetGoalRequest { calories: 1800.0, ..request() }, day(5)).unwrap();
        assert_eq!(second.replaced, 1);

        let active = get_goal(&db, 1, day(6)).unwrap();
        assert_eq!(active.goal.id, second.goal.id);
        assert_eq!(active.goal.target.calories, 1800.0);
        assert!(active.covers_date);
        assert!(!get_goal(&db, 1, day(2)).unwrap().covers_date);
    }

    #[test]
    fn test_set_goal_validation() {
        let db = Database::in_memory().unwrap();
        let err = set_goal(&db, 1, SetGoalRequest { protein: -5.0, ..request() }, day(1)).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(_)));

        let backwards = SetGoalRequest {
            start_date: Some("2025-04-10".to_string()),
            end_date: Some("2025-04-01".to_string()),
            ..request()
        };
        assert!(matches!(set_goal(&db, 1, backwards, day(1)), Err(NutritionError::InvalidInput(_))));
        assert!(matches!(get_goal(&db, 1, day(1)), Err(NutritionError::GoalNotFound)));
    }

    #[test]
    fn test_goal_for_date_respects_window() {
        let db = Database::in_memory().unwrap();
        set_goal(
            &db,
            1,
            SetGoalRequest { end_date: Some("2025-04-30".to_string()), ..request() },
            day(10),
        )
        .unwrap();

        let conn = db.get_conn().unwrap();
        assert!(goal_for_date(&conn, 1, day(15)).unwrap().is_some());
        assert!(goal_for_date(&conn, 1, day(9)).unwrap().is_none());
        assert!(goal_for_date(&conn, 2, day(15)).unwrap().is_none());
    }
}
