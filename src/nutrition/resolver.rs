//! Consumption resolution
//!
//! Computes the nutrition snapshot stored on a diary entry. Exactly one
//! branch runs per call, chosen by the `ConsumptionSource` variant. The
//! result is persisted and never recomputed for reads.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::catalog::{FoodCatalog, RecipeCatalog};
use super::lookup::{cancellable, BatchFoodLookup};
use super::recipe::{RecipeNutritionAggregator, RecipeWithIngredients};
use super::scaler::{self, validate_quantity};
use super::validation::{parse_date, parse_meal_type, validate_name, validate_profile};
use crate::error::{NutritionError, NutritionResult};
use crate::models::{
    CategoryTag, CustomIngredient, EntrySource, InlineFood, MealType, Nutrition, NutritionSnapshot,
};

/// Where consumed nutrition comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumptionSource {
    Food { food_id: i64, grams: f64 },
    RecipeProportional { recipe_id: i64, grams: f64 },
    RecipeCustom { recipe_id: i64, ingredients: Vec<CustomIngredient> },
    Inline { food: InlineFood, grams: f64 },
}

impl ConsumptionSource {
    /// Rebuild a source from what an entry stored
    pub fn from_entry(source: &EntrySource, quantity_grams: f64) -> Self {
        match source {
            EntrySource::Food { food_id } => ConsumptionSource::Food {
                food_id: *food_id,
                grams: quantity_grams,
            },
            EntrySource::Recipe {
                recipe_id,
                custom_ingredients: Some(ingredients),
            } => ConsumptionSource::RecipeCustom {
                recipe_id: *recipe_id,
                ingredients: ingredients.clone(),
            },
            EntrySource::Recipe { recipe_id, .. } => ConsumptionSource::RecipeProportional {
                recipe_id: *recipe_id,
                grams: quantity_grams,
            },
            EntrySource::Inline { food } => ConsumptionSource::Inline {
                food: food.clone(),
                grams: quantity_grams,
            },
        }
    }

    pub fn to_entry_source(&self) -> EntrySource {
        match self {
            ConsumptionSource::Food { food_id, .. } => EntrySource::Food { food_id: *food_id },
            ConsumptionSource::RecipeProportional { recipe_id, .. } => EntrySource::Recipe {
                recipe_id: *recipe_id,
                custom_ingredients: None,
            },
            ConsumptionSource::RecipeCustom { recipe_id, ingredients } => EntrySource::Recipe {
                recipe_id: *recipe_id,
                custom_ingredients: Some(ingredients.clone()),
            },
            ConsumptionSource::Inline { food, .. } => EntrySource::Inline { food: food.clone() },
        }
    }

    /// Shape checks that need no catalog access
    pub fn validate(&self) -> NutritionResult<()> {
        match self {
            ConsumptionSource::Food { grams, .. } | ConsumptionSource::RecipeProportional { grams, .. } => {
                validate_quantity(*grams, "quantity_grams")?;
            }
            ConsumptionSource::RecipeCustom { ingredients, .. } => {
                if ingredients.is_empty() {
                    return Err(NutritionError::invalid("custom_ingredients cannot be empty"));
                }
                let mut seen = HashSet::new();
                for (i, ingredient) in ingredients.iter().enumerate() {
                    validate_quantity(
                        ingredient.quantity_grams,
                        &format!("custom_ingredients[{}].quantity_grams", i),
                    )?;
                    if !seen.insert(ingredient.food_id) {
                        return Err(NutritionError::invalid(format!(
                            "custom_ingredients lists food {} more than once",
                            ingredient.food_id
                        )));
                    }
                }
            }
            ConsumptionSource::Inline { food, grams } => {
                validate_quantity(*grams, "quantity_grams")?;
                validate_name(&food.name, "inline_food.name")?;
                validate_profile(&food.profile(), "inline_food")?;
            }
        }
        Ok(())
    }
}

/// Log request payload as received from the request layer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogEntryRequest {
    pub food_id: Option<i64>,
    pub recipe_id: Option<i64>,
    pub date: Option<String>,
    pub meal_type: String,
    pub quantity_grams: Option<f64>,
    pub custom_ingredients: Option<Vec<CustomIngredient>>,
    pub inline_food: Option<InlineFood>,
    pub notes: Option<String>,
}

impl LogEntryRequest {
    /// Exactly one of `food_id`, `recipe_id`, `inline_food` must be set.
    /// With custom ingredients the weight is their sum and `quantity_grams`
    /// is ignored.
    pub fn source(&self) -> NutritionResult<ConsumptionSource> {
        let present = [
            self.food_id.is_some(),
            self.recipe_id.is_some(),
            self.inline_food.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();

        if present != 1 {
            return Err(NutritionError::invalid(
                "exactly one of food_id, recipe_id or inline_food is required",
            ));
        }
        if self.custom_ingredients.is_some() && self.recipe_id.is_none() {
            return Err(NutritionError::invalid(
                "custom_ingredients can only be used with recipe_id",
            ));
        }

        let grams = || {
            self.quantity_grams
                .ok_or_else(|| NutritionError::invalid("quantity_grams is required"))
        };

        Ok(match (self.food_id, self.recipe_id, &self.inline_food) {
            (Some(food_id), _, _) => ConsumptionSource::Food { food_id, grams: grams()? },
            (_, Some(recipe_id), _) => match &self.custom_ingredients {
                Some(ingredients) => ConsumptionSource::RecipeCustom {
                    recipe_id,
                    ingredients: ingredients.clone(),
                },
                None => ConsumptionSource::RecipeProportional { recipe_id, grams: grams()? },
            },
            (_, _, Some(food)) => ConsumptionSource::Inline {
                food: food.clone(),
                grams: grams()?,
            },
            (None, None, None) => {
                return Err(NutritionError::invalid(
                    "exactly one of food_id, recipe_id or inline_food is required",
                ))
            }
        })
    }

    pub fn meal_type(&self) -> NutritionResult<MealType> {
        parse_meal_type(&self.meal_type)
    }

    /// Requested date, or `today` when omitted
    pub fn date(&self, today: NaiveDate) -> NutritionResult<NaiveDate> {
        self.date.as_deref().map_or(Ok(today), parse_date)
    }
}

/// Output of a resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedConsumption {
    pub snapshot: NutritionSnapshot,
    pub total_weight: f64,
}

pub struct ConsumptionResolver<'a> {
    foods: &'a dyn FoodCatalog,
    recipes: &'a dyn RecipeCatalog,
}

impl<'a> ConsumptionResolver<'a> {
    pub fn new(foods: &'a dyn FoodCatalog, recipes: &'a dyn RecipeCatalog) -> Self {
        Self { foods, recipes }
    }

    pub async fn resolve(
        &self,
        user_id: i64,
        source: &ConsumptionSource,
        cancel: &CancellationToken,
    ) -> NutritionResult<ResolvedConsumption> {
        source.validate()?;

        match source {
            ConsumptionSource::Food { food_id, grams } => {
                tracing::debug!(food_id, grams, "resolving food entry");
                let food = cancellable(cancel, self.foods.get_by_id(*food_id))
                    .await?
                    .ok_or(NutritionError::FoodNotFound(*food_id))?;

                Ok(ResolvedConsumption {
                    snapshot: NutritionSnapshot {
                        nutrition: scaler::scale(&food.nutrition, *grams)?,
                        food_tag: Some(food.tag),
                        recipe_tag: None,
                    },
                    total_weight: *grams,
                })
            }

            ConsumptionSource::RecipeProportional { recipe_id, grams } => {
                tracing::debug!(recipe_id, grams, "resolving proportional recipe entry");
                let recipe = self.load_recipe(user_id, *recipe_id, cancel).await?;
                let derived = RecipeNutritionAggregator::new(self.foods)
                    .compute_recipe_nutrition(&recipe, cancel)
                    .await?;

                Ok(ResolvedConsumption {
                    snapshot: NutritionSnapshot {
                        nutrition: scaler::scale(&derived.per_100g, *grams)?,
                        food_tag: None,
                        recipe_tag: Some(recipe.recipe.tag),
                    },
                    total_weight: *grams,
                })
            }

            ConsumptionSource::RecipeCustom { recipe_id, ingredients } => {
                tracing::debug!(recipe_id, count = ingredients.len(), "resolving custom recipe entry");
                let recipe = self.load_recipe(user_id, *recipe_id, cancel).await?;
                check_custom_coverage(&recipe, ingredients)?;

                let ids: Vec<i64> = ingredients.iter().map(|i| i.food_id).collect();
                let foods = BatchFoodLookup::new(self.foods).fetch(&ids, cancel).await?;

                let mut nutrition = Nutrition::zero();
                let mut total_weight = 0.0;
                for ingredient in ingredients {
                    let food = foods
                        .get(&ingredient.food_id)
                        .ok_or(NutritionError::FoodNotFound(ingredient.food_id))?;
                    nutrition = nutrition + scaler::scale(&food.nutrition, ingredient.quantity_grams)?;
                    total_weight += ingredient.quantity_grams;
                }

                Ok(ResolvedConsumption {
                    snapshot: NutritionSnapshot {
                        nutrition,
                        food_tag: None,
                        recipe_tag: Some(recipe.recipe.tag),
                    },
                    total_weight,
                })
            }

            ConsumptionSource::Inline { food, grams } => {
                tracing::debug!(name = %food.name, grams, "resolving inline entry");
                Ok(ResolvedConsumption {
                    snapshot: NutritionSnapshot {
                        nutrition: scaler::scale(&food.profile(), *grams)?,
                        food_tag: Some(food.tag.unwrap_or(CategoryTag::Routine)),
                        recipe_tag: None,
                    },
                    total_weight: *grams,
                })
            }
        }
    }

    /// Fetch a recipe the user may log, with its ingredients
    async fn load_recipe(
        &self,
        user_id: i64,
        recipe_id: i64,
        cancel: &CancellationToken,
    ) -> NutritionResult<RecipeWithIngredients> {
        let recipe = cancellable(cancel, self.recipes.get_by_id(recipe_id))
            .await?
            .ok_or(NutritionError::RecipeNotFound(recipe_id))?;

        if !recipe.is_visible_to(user_id) {
            tracing::warn!(recipe_id, user_id, "recipe belongs to another user");
            return Err(NutritionError::Forbidden(format!(
                "recipe {} belongs to another user",
                recipe_id
            )));
        }

        let ingredients = cancellable(cancel, self.recipes.get_ingredients(recipe_id)).await?;
        Ok(RecipeWithIngredients { recipe, ingredients })
    }
}

/// Custom quantities must name only the recipe's foods and cover all of them
fn check_custom_coverage(
    recipe: &RecipeWithIngredients,
    custom: &[CustomIngredient],
) -> NutritionResult<()> {
    let expected: HashSet<i64> = recipe.ingredients.iter().map(|i| i.food_id).collect();

    if let Some(foreign) = custom.iter().find(|c| !expected.contains(&c.food_id)) {
        return Err(NutritionError::invalid(format!(
            "food {} is not an ingredient of recipe {}",
            foreign.food_id, recipe.recipe.id
        )));
    }
    if custom.len() != expected.len() {
        return Err(NutritionError::invalid(format!(
            "custom_ingredients must cover all {} ingredients of recipe {} (got {})",
            expected.len(),
            recipe.recipe.id,
            custom.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::testing::FakeCatalog;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn catalog() -> FakeCatalog {
        let mut catalog = FakeCatalog::default();
        catalog.add_food(1, "Chicken", Nutrition::new(165.0, 31.0, 0.0, 3.6, 0.0), CategoryTag::Routine);
        catalog.add_food(2, "Rice", Nutrition::new(130.0, 2.7, 28.0, 0.3, 0.4), CategoryTag::General);
        catalog.add_food(3, "Cake", Nutrition::new(390.0, 5.0, 50.0, 19.0, 1.0), CategoryTag::Contextual);
        catalog.add_recipe(10, "Chicken rice", None, CategoryTag::Routine, &[(1, 200.0), (2, 150.0)]);
        catalog.add_recipe(11, "Private bowl", Some(7), CategoryTag::Contextual, &[(1, 100.0)]);
        catalog
    }

    async fn resolve(catalog: &FakeCatalog, user_id: i64, source: ConsumptionSource) -> NutritionResult<ResolvedConsumption> {
        ConsumptionResolver::new(catalog, catalog)
            .resolve(user_id, &source, &CancellationToken::new())
            .await
    }

    fn custom(pairs: &[(i64, f64)]) -> Vec<CustomIngredient> {
        pairs
            .iter()
            .map(|(food_id, quantity_grams)| CustomIngredient { food_id: *food_id, quantity_grams: *quantity_grams })
            .collect()
    }

    #[tokio::test]
    async fn test_food_source() {
        let catalog = catalog();
        let resolved = resolve(&catalog, 1, ConsumptionSource::Food { food_id: 1, grams: 150.0 }).await.unwrap();
        assert!(close(resolved.snapshot.nutrition.calories, 247.5));
        assert_eq!(resolved.snapshot.food_tag, Some(CategoryTag::Routine));
        assert_eq!(resolved.snapshot.recipe_tag, None);
        assert_eq!(resolved.total_weight, 150.0);
    }

    #[tokio::test]
    async fn test_recipe_proportional() {
        let catalog = catalog();
        let resolved = resolve(&catalog, 1, ConsumptionSource::RecipeProportional { recipe_id: 10, grams: 175.0 })
            .await
            .unwrap();
        // 150 kcal per 100g
        assert!(close(resolved.snapshot.nutrition.calories, 262.5));
        assert_eq!(resolved.snapshot.recipe_tag, Some(CategoryTag::Routine));
        assert_eq!(resolved.snapshot.resolved_tag(), Some(CategoryTag::Routine));
        assert_eq!(catalog.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_recipe_custom() {
        let catalog = catalog();
        let resolved = resolve(
            &catalog,
            1,
            ConsumptionSource::RecipeCustom { recipe_id: 10, ingredients: custom(&[(2, 100.0), (1, 100.0)]) },
        )
        .await
        .unwrap();
        assert!(close(resolved.snapshot.nutrition.calories, 295.0));
        assert!(close(resolved.snapshot.nutrition.protein, 33.7));
        assert_eq!(resolved.total_weight, 200.0);
        assert_eq!(catalog.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_partial_set_rejected() {
        let catalog = catalog();
        let err = resolve(
            &catalog,
            1,
            ConsumptionSource::RecipeCustom { recipe_id: 10, ingredients: custom(&[(1, 100.0)]) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(_)));
        assert_eq!(catalog.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_foreign_food_rejected() {
        let catalog = catalog();
        let err = resolve(
            &catalog,
            1,
            ConsumptionSource::RecipeCustom { recipe_id: 10, ingredients: custom(&[(1, 100.0), (3, 50.0)]) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(ref msg) if msg.contains("food 3")));
    }

    #[tokio::test]
    async fn test_custom_shape_checked_before_lookup() {
        let catalog = catalog();
        for ingredients in [custom(&[]), custom(&[(1, 0.0), (2, 10.0)]), custom(&[(1, 10.0), (1, 20.0)])] {
            let err = resolve(&catalog, 1, ConsumptionSource::RecipeCustom { recipe_id: 10, ingredients })
                .await
                .unwrap_err();
            assert!(matches!(err, NutritionError::InvalidInput(_)));
        }
        assert_eq!(catalog.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_private_recipe_forbidden() {
        let catalog = catalog();
        let source = ConsumptionSource::RecipeProportional { recipe_id: 11, grams: 100.0 };
        let err = resolve(&catalog, 1, source.clone()).await.unwrap_err();
        assert!(matches!(err, NutritionError::Forbidden(_)));

        let resolved = resolve(&catalog, 7, source).await.unwrap();
        assert!(close(resolved.snapshot.nutrition.calories, 165.0));
    }

    #[tokio::test]
    async fn test_dangling_references() {
        let mut catalog = catalog();
        let err = resolve(&catalog, 1, ConsumptionSource::Food { food_id: 42, grams: 10.0 }).await.unwrap_err();
        assert!(matches!(err, NutritionError::FoodNotFound(42)));

        let err = resolve(&catalog, 1, ConsumptionSource::RecipeProportional { recipe_id: 99, grams: 10.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, NutritionError::RecipeNotFound(99)));

        catalog.remove_food(2);
        let err = resolve(&catalog, 1, ConsumptionSource::RecipeProportional { recipe_id: 10, grams: 100.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, NutritionError::FoodNotFound(2)));
    }

    #[tokio::test]
    async fn test_inline_defaults_to_routine() {
        let catalog = catalog();
        let food = InlineFood {
            name: "Street taco".to_string(),
            description: None,
            calories: 220.0,
            protein: 9.0,
            carbs: 20.0,
            fat: 11.0,
            fiber: 2.0,
            tag: None,
        };
        let resolved = resolve(&catalog, 1, ConsumptionSource::Inline { food: food.clone(), grams: 50.0 })
            .await
            .unwrap();
        assert!(close(resolved.snapshot.nutrition.calories, 110.0));
        assert_eq!(resolved.snapshot.food_tag, Some(CategoryTag::Routine));

        let tagged = InlineFood { tag: Some(CategoryTag::Contextual), ..food };
        let resolved = resolve(&catalog, 1, ConsumptionSource::Inline { food: tagged, grams: 50.0 })
            .await
            .unwrap();
        assert_eq!(resolved.snapshot.food_tag, Some(CategoryTag::Contextual));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let catalog = catalog();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = ConsumptionResolver::new(&catalog, &catalog)
            .resolve(1, &ConsumptionSource::RecipeProportional { recipe_id: 10, grams: 100.0 }, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, NutritionError::Cancelled));
    }

    #[test]
    fn test_request_requires_exactly_one_source() {
        let base = LogEntryRequest {
            meal_type: "lunch".to_string(),
            quantity_grams: Some(100.0),
            ..Default::default()
        };
        assert!(base.source().is_err());

        let both = LogEntryRequest { food_id: Some(1), recipe_id: Some(2), ..base.clone() };
        assert!(matches!(both.source(), Err(NutritionError::InvalidInput(_))));

        let stray_custom = LogEntryRequest {
            food_id: Some(1),
            custom_ingredients: Some(custom(&[(1, 10.0)])),
            ..base.clone()
        };
        assert!(stray_custom.source().is_err());

        let food = LogEntryRequest { food_id: Some(1), ..base.clone() };
        assert_eq!(food.source().unwrap(), ConsumptionSource::Food { food_id: 1, grams: 100.0 });

        let custom_recipe = LogEntryRequest {
            recipe_id: Some(3),
            quantity_grams: None,
            custom_ingredients: Some(custom(&[(1, 10.0)])),
            ..base.clone()
        };
        assert!(matches!(custom_recipe.source().unwrap(), ConsumptionSource::RecipeCustom { recipe_id: 3, .. }));

        let missing_grams = LogEntryRequest { recipe_id: Some(3), quantity_grams: None, ..base };
        assert!(missing_grams.source().is_err());
    }

    #[test]
    fn test_request_date_and_meal() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let request = LogEntryRequest { meal_type: "Snack".to_string(), ..Default::default() };
        assert_eq!(request.date(today).unwrap(), today);
        assert_eq!(request.meal_type().unwrap(), MealType::Snack);

        let dated = LogEntryRequest { date: Some("2025-05-30".to_string()), ..request };
        assert_eq!(dated.date(today).unwrap(), NaiveDate::from_ymd_opt(2025, 5, 30).unwrap());
    }

    #[test]
    fn test_source_survives_storage() {
        let source = ConsumptionSource::RecipeCustom { recipe_id: 4, ingredients: custom(&[(1, 30.0)]) };
        assert_eq!(ConsumptionSource::from_entry(&source.to_entry_source(), 30.0), source);

        let source = ConsumptionSource::RecipeProportional { recipe_id: 4, grams: 80.0 };
        assert_eq!(ConsumptionSource::from_entry(&source.to_entry_source(), 80.0), source);
    }
}
