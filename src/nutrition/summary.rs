//! Daily and weekly summaries
//!
//! Folds stored diary snapshots into totals, goal adherence and the
//! routine/contextual calorie breakdown. Works only on persisted snapshots;
//! nothing here touches the catalogs.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{round2, CategoryTag, DiaryEntry, Nutrition, NutritionGoal};

/// A day counts as mostly routine only above this share of calories.
/// The comparison is strict: exactly 75% does not qualify.
pub const ROUTINE_DAY_THRESHOLD_PERCENT: f64 = 75.0;

/// Percent of target reached per nutrient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Adherence {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl Adherence {
    pub fn rounded(&self) -> Self {
        Self {
            calories: round2(self.calories),
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fat: round2(self.fat),
            fiber: round2(self.fiber),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TagBreakdown {
    pub routine_calories: f64,
    pub contextual_calories: f64,
    pub total_calories: f64,
    pub routine_percent: f64,
    pub contextual_percent: f64,
}

impl TagBreakdown {
    pub fn rounded(&self) -> Self {
        Self {
            routine_calories: round2(self.routine_calories),
            contextual_calories: round2(self.contextual_calories),
            total_calories: round2(self.total_calories),
            routine_percent: round2(self.routine_percent),
            contextual_percent: round2(self.contextual_percent),
        }
    }
}

/// One day of a weekly rollup
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayRollup {
    pub date: NaiveDate,
    pub breakdown: TagBreakdown,
    /// `None` when nothing was logged that day
    pub mostly_routine: Option<bool>,
}

/// Unrounded daily summary
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub totals: Nutrition,
    pub goal: Nutrition,
    pub adherence: Adherence,
    pub breakdown: TagBreakdown,
}

pub fn daily_totals(entries: &[DiaryEntry]) -> Nutrition {
    entries.iter().map(|e| e.snapshot.nutrition).sum()
}

/// `actual / target * 100`, or 0 when the target is 0
pub fn adherence(actual: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }
    actual / target * 100.0
}

pub fn adherence_for(totals: &Nutrition, target: &Nutrition) -> Adherence {
    Adherence {
        calories: adherence(totals.calories, target.calories),
        protein: adherence(totals.protein, target.protein),
        carbs: adherence(totals.carbs, target.carbs),
        fat: adherence(totals.fat, target.fat),
        fiber: adherence(totals.fiber, target.fiber),
    }
}

/// Calories split by resolved tag. General and untagged calories count
/// toward the total only.
pub fn tag_breakdown<'e, I>(entries: I) -> TagBreakdown
where
    I: IntoIterator<Item = &'e DiaryEntry>,
{
    let mut breakdown = TagBreakdown::default();

    for entry in entries {
        let calories = entry.snapshot.nutrition.calories;
        breakdown.total_calories += calories;
        match entry.snapshot.resolved_tag() {
            Some(CategoryTag::Routine) => breakdown.routine_calories += calories,
            Some(CategoryTag::Contextual) => breakdown.contextual_calories += calories,
            Some(CategoryTag::General) | None => {}
        }
    }

    if breakdown.total_calories > 0.0 {
        breakdown.routine_percent = breakdown.routine_calories / breakdown.total_calories * 100.0;
        breakdown.contextual_percent =
            breakdown.contextual_calories / breakdown.total_calories * 100.0;
    }

    breakdown
}

pub fn daily_summary(date: NaiveDate, entries: &[DiaryEntry], goal: Option<&NutritionGoal>) -> DailySummary {
    let totals = daily_totals(entries);
    let target = goal.map(|g| g.target).unwrap_or_default();

    DailySummary {
        date,
        totals,
        goal: target,
        adherence: adherence_for(&totals, &target),
        breakdown: tag_breakdown(entries),
    }
}

/// Seven consecutive days starting at `start`. Entries outside the window
/// are ignored.
pub fn weekly_rollup(start: NaiveDate, entries: &[DiaryEntry]) -> Vec<DayRollup> {
    (0..7)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let breakdown = tag_breakdown(entries.iter().filter(|e| e.date == date));
            let mostly_routine = if breakdown.total_calories > 0.0 {
                Some(breakdown.routine_percent > ROUTINE_DAY_THRESHOLD_PERCENT)
            } else {
                None
            };
            DayRollup {
                date,
                breakdown,
                mostly_routine,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntrySource, InlineFood, MealType, NutritionSnapshot};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn entry(date: NaiveDate, calories: f64, food_tag: Option<CategoryTag>, recipe_tag: Option<CategoryTag>) -> DiaryEntry {
        DiaryEntry {
            id: 0,
            owner_id: 1,
            date,
            meal_type: MealType::Lunch,
            source: EntrySource::Inline {
                food: InlineFood {
                    name: "x".to_string(),
                    description: None,
                    calories,
                    protein: 0.0,
                    carbs: 0.0,
                    fat: 0.0,
                    fiber: 0.0,
                    tag: food_tag,
                },
            },
            quantity_grams: 100.0,
            snapshot: NutritionSnapshot {
                nutrition: Nutrition::new(calories, calories / 10.0, 0.0, 0.0, 0.0),
                food_tag,
                recipe_tag,
            },
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_adherence_guard() {
        assert_eq!(adherence(500.0, 0.0), 0.0);
        assert_eq!(adherence(0.0, 0.0), 0.0);
        assert_eq!(adherence(1500.0, 2000.0), 75.0);
        let a = adherence_for(&Nutrition::new(1000.0, 50.0, 0.0, 0.0, 0.0), &Nutrition::zero());
        assert_eq!(a, Adherence::default());
    }

    #[test]
    fn test_tag_breakdown_percentages() {
        let entries = vec![
            entry(day(3), 330.0, Some(CategoryTag::Routine), None),
            entry(day(3), 399.0, None, Some(CategoryTag::Contextual)),
        ];
        let breakdown = tag_breakdown(&entries).rounded();
        assert_eq!(breakdown.routine_percent, 45.27);
        assert_eq!(breakdown.contextual_percent, 54.73);
        assert_eq!(breakdown.total_calories, 729.0);
        assert!((tag_breakdown(&entries).routine_percent + tag_breakdown(&entries).contextual_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_food_tag_beats_recipe_tag() {
        let entries = vec![entry(day(3), 100.0, Some(CategoryTag::Contextual), Some(CategoryTag::Routine))];
        let breakdown = tag_breakdown(&entries);
        assert_eq!(breakdown.contextual_percent, 100.0);
        assert_eq!(breakdown.routine_percent, 0.0);
    }

    #[test]
    fn test_general_counts_toward_total_only() {
        let entries = vec![
            entry(day(3), 300.0, Some(CategoryTag::Routine), None),
            entry(day(3), 100.0, Some(CategoryTag::General), None),
        ];
        let breakdown = tag_breakdown(&entries);
        assert_eq!(breakdown.routine_percent, 75.0);
        assert_eq!(breakdown.contextual_percent, 0.0);
        assert_eq!(tag_breakdown(&Vec::<DiaryEntry>::new()), TagBreakdown::default());
    }

    #[test]
    fn test_weekly_boundary() {
        let entries = vec![
            // exactly 75%
            entry(day(3), 300.0, Some(CategoryTag::Routine), None),
            entry(day(3), 100.0, Some(CategoryTag::Contextual), None),
            // 80%
            entry(day(4), 400.0, Some(CategoryTag::Routine), None),
            entry(day(4), 100.0, None, Some(CategoryTag::Contextual)),
            // outside the window
            entry(day(10), 500.0, Some(CategoryTag::Routine), None),
        ];

        let week = weekly_rollup(day(3), &entries);
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day(3));
        assert_eq!(week[6].date, day(9));
        assert_eq!(week[0].mostly_routine, Some(false));
        assert_eq!(week[1].mostly_routine, Some(true));
        assert!(week[2..].iter().all(|d| d.mostly_routine.is_none()));
    }

    #[test]
    fn test_daily_summary() {
        let entries = vec![
            entry(day(3), 1000.0, Some(CategoryTag::Routine), None),
            entry(day(3), 500.0, None, None),
        ];
        let goal = NutritionGoal {
            id: 1,
            owner_id: 1,
            target: Nutrition::new(2000.0, 150.0, 0.0, 70.0, 30.0),
            start_date: day(1),
            end_date: None,
            is_active: true,
            created_at: String::new(),
        };

        let summary = daily_summary(day(3), &entries, Some(&goal));
        assert_eq!(summary.totals.calories, 1500.0);
        assert_eq!(summary.adherence.calories, 75.0);
        assert_eq!(summary.adherence.protein, 100.0);
        assert_eq!(summary.adherence.carbs, 0.0);

        let no_goal = daily_summary(day(3), &entries, None);
        assert_eq!(no_goal.goal, Nutrition::zero());
        assert_eq!(no_goal.adherence, Adherence::default());
    }
}
