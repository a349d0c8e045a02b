//! Recipe nutrition aggregation
//!
//! A recipe's nutrition is never stored. It is derived from its ingredients:
//! total = sum of each ingredient's profile scaled to its grams, and the
//! per-100g profile is that total normalized by the summed ingredient weight.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::catalog::FoodCatalog;
use super::lookup::{BatchFoodLookup, FoodMap};
use super::scaler;
use crate::error::{NutritionError, NutritionResult};
use crate::models::{Nutrition, Recipe, RecipeIngredient};

/// A recipe together with its ingredient rows
#[derive(Debug, Clone)]
pub struct RecipeWithIngredients {
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

/// Derived nutrition for one recipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecipeNutrition {
    pub recipe_id: i64,
    pub total_weight: f64,
    pub total: Nutrition,
    pub per_100g: Nutrition,
}

impl RecipeNutrition {
    /// Copy rounded for output
    pub fn rounded(&self) -> Self {
        Self {
            recipe_id: self.recipe_id,
            total_weight: crate::models::round2(self.total_weight),
            total: self.total.rounded(),
            per_100g: self.per_100g.rounded(),
        }
    }
}

/// Normalize a total to 100g. Zero weight yields a zero profile.
pub fn per_100g(total: &Nutrition, total_weight: f64) -> Nutrition {
    if total_weight <= 0.0 {
        return Nutrition::zero();
    }
    total.scale(100.0 / total_weight)
}

/// Sum scaled ingredients using already-fetched foods
pub fn aggregate(
    recipe_id: i64,
    ingredients: &[RecipeIngredient],
    foods: &FoodMap,
) -> NutritionResult<RecipeNutrition> {
    let mut total = Nutrition::zero();
    let mut total_weight = 0.0;

    for ingredient in ingredients {
        let food = foods
            .get(&ingredient.food_id)
            .ok_or(NutritionError::FoodNotFound(ingredient.food_id))?;
        total = total + scaler::scale(&food.nutrition, ingredient.quantity_grams)?;
        total_weight += ingredient.quantity_grams;
    }

    Ok(RecipeNutrition {
        recipe_id,
        total_weight,
        total,
        per_100g: per_100g(&total, total_weight),
    })
}

pub struct RecipeNutritionAggregator<'a> {
    lookup: BatchFoodLookup<'a>,
}

impl<'a> RecipeNutritionAggregator<'a> {
    pub fn new(foods: &'a dyn FoodCatalog) -> Self {
        Self {
            lookup: BatchFoodLookup::new(foods),
        }
    }

    pub async fn compute_recipe_nutrition(
        &self,
        recipe: &RecipeWithIngredients,
        cancel: &CancellationToken,
    ) -> NutritionResult<RecipeNutrition> {
        let ids: Vec<i64> = recipe.ingredients.iter().map(|i| i.food_id).collect();
        let foods = self.lookup.fetch(&ids, cancel).await?;
        aggregate(recipe.recipe.id, &recipe.ingredients, &foods)
    }

    /// Derive nutrition for every recipe with one lookup over the union of
    /// their ingredient ids. Output order follows input order.
    pub async fn enrich_many(
        &self,
        recipes: &[RecipeWithIngredients],
        cancel: &CancellationToken,
    ) -> NutritionResult<Vec<RecipeNutrition>> {
        let ids: Vec<i64> = recipes
            .iter()
            .flat_map(|r| r.ingredients.iter().map(|i| i.food_id))
            .collect();
        let foods = self.lookup.fetch(&ids, cancel).await?;

        recipes
            .iter()
            .map(|r| aggregate(r.recipe.id, &r.ingredients, &foods))
            .collect()
    }
}
