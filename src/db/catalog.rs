//! SQLite-backed catalogs
//!
//! Adapts the food and recipe tables to the engine's read-only catalog
//! traits. Queries run on the blocking pool.

use async_trait::async_trait;

use super::{Database, DbResult};
use crate::error::NutritionResult;
use crate::models::{Food, Recipe, RecipeIngredient};
use crate::nutrition::{FoodCatalog, RecipeCatalog};

#[derive(Clone)]
pub struct SqliteCatalog {
    db: Database,
}

impl SqliteCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn query<T, F>(&self, f: F) -> NutritionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> DbResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || db.with_conn(f)).await?;
        Ok(result?)
    }
}

#[async_trait]
impl FoodCatalog for SqliteCatalog {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Food>> {
        self.query(move |conn| Food::get_by_id(conn, id)).await
    }

    async fn get_by_ids(&self, ids: &[i64]) -> NutritionResult<Vec<Food>> {
        let ids = ids.to_vec();
        self.query(move |conn| Food::get_by_ids(conn, &ids)).await
    }
}

#[async_trait]
impl RecipeCatalog for SqliteCatalog {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Recipe>> {
        self.query(move |conn| Recipe::get_by_id(conn, id)).await
    }

    async fn get_ingredients(&self, recipe_id: i64) -> NutritionResult<Vec<RecipeIngredient>> {
        self.query(move |conn| RecipeIngredient::get_for_recipe(conn, recipe_id)).await
    }
}
