//! In-memory catalogs for engine tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::catalog::{FoodCatalog, RecipeCatalog};
use super::lookup::FoodMap;
use super::recipe::RecipeWithIngredients;
use crate::error::NutritionResult;
use crate::models::{CategoryTag, Food, Nutrition, Recipe, RecipeIngredient};

#[derive(Default)]
pub(crate) struct FakeCatalog {
    foods: HashMap<i64, Food>,
    recipes: HashMap<i64, RecipeWithIngredients>,
    batch_calls: AtomicUsize,
    last_batch: Mutex<Vec<i64>>,
    delay: Option<Duration>,
}

impl FakeCatalog {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add_food(&mut self, id: i64, name: &str, nutrition: Nutrition, tag: CategoryTag) {
        self.foods.insert(
            id,
            Food {
                id,
                name: name.to_string(),
                brand: None,
                nutrition,
                tag,
                notes: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
        );
    }

    pub fn add_recipe(
        &mut self,
        id: i64,
        name: &str,
        owner_id: Option<i64>,
        tag: CategoryTag,
        ingredients: &[(i64, f64)],
    ) -> RecipeWithIngredients {
        let recipe = RecipeWithIngredients {
            recipe: Recipe {
                id,
                name: name.to_string(),
                owner_id,
                tag,
                notes: None,
                created_at: String::new(),
                updated_at: String::new(),
            },
            ingredients: ingredients
                .iter()
                .enumerate()
                .map(|(i, (food_id, grams))| RecipeIngredient {
                    id: id * 100 + i as i64,
                    recipe_id: id,
                    food_id: *food_id,
                    quantity_grams: *grams,
                    position: i as i64,
                })
                .collect(),
        };
        self.recipes.insert(id, recipe.clone());
        recipe
    }

    pub fn remove_food(&mut self, id: i64) {
        self.foods.remove(&id);
    }

    pub fn food_map(&self) -> FoodMap {
        self.foods.clone()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn last_batch(&self) -> Vec<i64> {
        self.last_batch.lock().unwrap().clone()
    }
}

#[async_trait]
impl FoodCatalog for FakeCatalog {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Food>> {
        Ok(self.foods.get(&id).cloned())
    }

    async fn get_by_ids(&self, ids: &[i64]) -> NutritionResult<Vec<Food>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = ids.to_vec();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ids.iter().filter_map(|id| self.foods.get(id).cloned()).collect())
    }
}

#[async_trait]
impl RecipeCatalog for FakeCatalog {
    async fn get_by_id(&self, id: i64) -> NutritionResult<Option<Recipe>> {
        Ok(self.recipes.get(&id).map(|r| r.recipe.clone()))
    }

    async fn get_ingredients(&self, recipe_id: i64) -> NutritionResult<Vec<RecipeIngredient>> {
        Ok(self
            .recipes
            .get(&recipe_id)
            .map(|r| r.ingredients.clone())
            .unwrap_or_default())
    }
}
