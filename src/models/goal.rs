//! Nutrition Goal model
//!
//! Daily nutrient targets with an active date window.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::diary_entry::DATE_FORMAT;
use super::Nutrition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionGoal {
    pub id: i64,
    pub owner_id: i64,
    pub target: Nutrition,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionGoalCreate {
    pub owner_id: i64,
    pub target: Nutrition,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

fn parse_date(raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

impl NutritionGoal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let start: String = row.get("start_date")?;
        let end: Option<String> = row.get("end_date")?;
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            target: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
                fiber: row.get("fiber")?,
            },
            start_date: parse_date(&start)?,
            end_date: end.as_deref().map(parse_date).transpose()?,
            is_active: row.get::<_, i32>("is_active")? != 0,
            created_at: row.get("created_at")?,
        })
    }

    /// Whether the goal's window covers `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| date <= end)
    }

    /// Insert a new active goal. Callers deactivate the previous one first.
    pub fn create(conn: &Connection, data: &NutritionGoalCreate) -> DbResult<Self> {
        let t = &data.target;
        conn.execute(
            r#"
            INSERT INTO nutrition_goals (
                owner_id, calories, protein, carbs, fat, fiber, start_date, end_date, is_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)
            "#,
            params![
                data.owner_id,
                t.calories,
                t.protein,
                t.carbs,
                t.fat,
                t.fiber,
                data.start_date.format(DATE_FORMAT).to_string(),
                data.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM nutrition_goals WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(goal) => Ok(Some(goal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The owner's active goal, if any
    pub fn get_active(conn: &Connection, owner_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM nutrition_goals WHERE owner_id = ?1 AND is_active = 1 ORDER BY id DESC LIMIT 1",
        )?;

        let result = stmt.query_row([owner_id], Self::from_row);
        match result {
            Ok(goal) => Ok(Some(goal)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deactivate all of an owner's goals, returning how many changed
    pub fn deactivate_all(conn: &Connection, owner_id: i64) -> DbResult<usize> {
        let rows = conn.execute(
            "UPDATE nutrition_goals SET is_active = 0 WHERE owner_id = ?1 AND is_active = 1",
            [owner_id],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_active_goal_and_window() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
            let goal = NutritionGoal::create(
                conn,
                &NutritionGoalCreate {
                    owner_id: 1,
                    target: Nutrition::new(2000.0, 150.0, 200.0, 70.0, 30.0),
                    start_date: start,
                    end_date: Some(end),
                },
            )?;
            assert!(goal.covers(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()));
            assert!(!goal.covers(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));

            assert_eq!(NutritionGoal::get_active(conn, 1)?.unwrap().id, goal.id);
            assert!(NutritionGoal::get_active(conn, 2)?.is_none());

            assert_eq!(NutritionGoal::deactivate_all(conn, 1)?, 1);
            assert!(NutritionGoal::get_active(conn, 1)?.is_none());
            Ok(())
        })
        .unwrap();
    }
}
