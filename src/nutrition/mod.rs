//! Nutrition computation engine
//!
//! Scaling, batched food lookup, recipe aggregation, consumption resolution
//! and summaries. Catalog access goes through the traits in [`catalog`].

pub mod catalog;
pub mod lookup;
pub mod recipe;
pub mod resolver;
pub mod scaler;
pub mod summary;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{FoodCatalog, RecipeCatalog};
pub use lookup::{cancellable, BatchFoodLookup, FoodMap};
pub use recipe::{RecipeNutrition, RecipeNutritionAggregator, RecipeWithIngredients};
pub use resolver::{ConsumptionResolver, ConsumptionSource, LogEntryRequest, ResolvedConsumption};
pub use scaler::{scale, validate_quantity, MAX_QUANTITY_GRAMS};
pub use summary::{
    adherence, adherence_for, daily_summary, daily_totals, tag_breakdown, weekly_rollup, Adherence,
    DailySummary, DayRollup, TagBreakdown, ROUTINE_DAY_THRESHOLD_PERCENT,
};
