//! Read-only catalog interfaces consumed by the engine
//!
//! The engine never reaches into the food or recipe tables directly. It
//! depends on these traits, which `db::SqliteCatalog` implements for the
//! server and in-memory fakes implement for tests.

use async_trait::async_trait;

use crate::error::NutritionResult;
use crate::models::{Food, Recipe, RecipeIngredient};

#[async_trait]
pub trait FoodCatalog: Send + Sync {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Food>>;

    /// All foods whose id is in `ids`, in one retrieval. Missing ids are
    /// omitted rather than reported; `BatchFoodLookup` does the checking.
    async fn get_by_ids(&self, ids: &[i64]) -> NutritionResult<Vec<Food>>;
}

#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Recipe>>;

    async fn get_ingredients(&self, recipe_id: i64) -> NutritionResult<Vec<RecipeIngredient>>;
}
