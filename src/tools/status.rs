//! NutriLog Status Tool
//!
//! Provides runtime status information about the NutriLog service and the
//! logging guide served to assistants.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::error::NutritionResult;
use crate::models::{DiaryEntry, Food, Recipe};
use crate::nutrition::{MAX_QUANTITY_GRAMS, ROUTINE_DAY_THRESHOLD_PERCENT};

/// Diary logging instructions for AI assistants
pub const LOGGING_INSTRUCTIONS: &str = r#"
# NutriLog Logging Instructions

NutriLog tracks what you eat against reference foods, your own recipes and
one-off inline foods. Every quantity is in grams.

## Foods

Foods store nutrient values **per 100 grams**: calories (kcal), protein,
carbs, fat and fiber (g). Convert package labels before adding:

**Formula:** `(value_per_serving / serving_grams) * 100`

Each food carries a tag:
- `routine` - planned, everyday foods
- `contextual` - ad hoc foods (eating out, treats)
- `general` - neither; counts toward totals only

## Recipes

A recipe is a list of foods with gram quantities. Its nutrition is always
computed from the ingredients, so editing a food changes every recipe that
uses it. Recipes you create are private unless created as `shared`.

## Logging an entry

`log_entry` takes exactly one source:

| Source | Fields |
|--------|--------|
| Food | `food_id` + `quantity_grams` |
| Recipe portion | `recipe_id` + `quantity_grams` (scaled from the recipe's per-100g values) |
| Recipe with custom amounts | `recipe_id` + `custom_ingredients` listing **every** ingredient with its grams |
| Inline food | `inline_food` (per-100g values, optional tag, default `routine`) + `quantity_grams` |

Custom ingredients must cover the whole recipe and name only its foods.
Partial overrides are rejected.

`meal_type` is one of breakfast, lunch, dinner, snack. `date` is
YYYY-MM-DD and defaults to today.

## History is frozen

Nutrition is computed once when an entry is logged and stored with it.
Editing or deleting a food or recipe later never changes logged entries.
Only `update_entry` with a new `quantity_grams`, `date` or
`custom_ingredients` recomputes an entry, using current catalog values.
Changing `meal_type` or `notes` keeps the stored nutrition.

## Summaries

- `daily_summary` - totals, goal targets, adherence percent per nutrient
  (0 when the goal value is 0) and the routine/contextual calorie split.
- `weekly_summary` - Monday-first week; a day counts as routine when more
  than 75% of its calories are routine. Days with nothing logged are `null`.

## Notes

- Dates use ISO format: YYYY-MM-DD
- Quantities must be greater than 0 and at most 100000 g
- Deleted entries are hidden from every read and summary
"#;

/// Row counts shown in the status
#[derive(Debug, Clone, Serialize)]
pub struct CatalogCounts {
    pub foods: i64,
    pub recipes: i64,
    pub diary_entries: i64,
}

/// Runtime status of the NutriLog service
#[derive(Debug, Clone, Serialize)]
pub struct NutriLogStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub counts: CatalogCounts,

    /// Engine limits
    pub max_quantity_grams: f64,
    pub routine_day_threshold_percent: f64,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> NutritionResult<NutriLogStatus> {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let counts = db.with_conn(|conn| {
            Ok(CatalogCounts {
                foods: Food::count(conn, None)?,
                recipes: Recipe::count(conn)?,
                diary_entries: DiaryEntry::count(conn)?,
            })
        })?;

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        Ok(NutriLogStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            counts,
            max_quantity_grams: MAX_QUANTITY_GRAMS,
            routine_day_threshold_percent: ROUTINE_DAY_THRESHOLD_PERCENT,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts() {
        let db = Database::in_memory().unwrap();
        let tracker = StatusTracker::new(PathBuf::from("/nonexistent/nutrilog.db"));
        let status = tracker.get_status(&db).unwrap();
        assert_eq!(status.counts.foods, 0);
        assert_eq!(status.counts.diary_entries, 0);
        assert!(status.database_size_bytes.is_none());
        assert_eq!(status.process_id, std::process::id());
    }
}
