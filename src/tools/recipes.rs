//! Recipe MCP Tools
//!
//! Tools for composing recipes from catalog foods. Recipe nutrition is
//! derived from the ingredients on every read.

use std::collections::HashSet;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::db::{Database, SqliteCatalog};
use crate::error::{NutritionError, NutritionResult};
use crate::models::{
    round2, CategoryTag, Food, Nutrition, Recipe, RecipeCreate, RecipeIngredient,
    RecipeIngredientCreate, RecipeIngredientDetail,
};
use crate::nutrition::validation::{clamp_page, parse_tag, validate_name};
use crate::nutrition::{validate_quantity, RecipeNutritionAggregator, RecipeWithIngredients};

/// Input for create_recipe
#[derive(Debug, Clone)]
pub struct CreateRecipeRequest {
    pub name: String,
    /// Shared recipes have no owner and are visible to everyone
    pub shared: bool,
    pub tag: Option<String>,
    pub notes: Option<String>,
    pub ingredients: Vec<RecipeIngredientCreate>,
}

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub ingredient_count: usize,
    pub created_at: String,
}

/// Full recipe detail with derived nutrition
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub shared: bool,
    pub tag: CategoryTag,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub total_weight: f64,
    pub total: Nutrition,
    pub per_100g: Nutrition,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub shared: bool,
    pub tag: CategoryTag,
    pub ingredient_count: usize,
    pub total_weight: f64,
    pub total_calories: f64,
    pub calories_per_100g: f64,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn ensure_visible(recipe: &Recipe, user_id: i64) -> NutritionResult<()> {
    if recipe.is_visible_to(user_id) {
        return Ok(());
    }
    tracing::warn!(recipe_id = recipe.id, user_id, "recipe belongs to another user");
    Err(NutritionError::Forbidden(format!(
        "recipe {} belongs to another user",
        recipe.id
    )))
}

/// Create a recipe with its ingredients in one transaction.
///
/// Any failure, including a missing food, rolls back the recipe row too.
pub fn create_recipe(
    db: &Database,
    user_id: i64,
    request: CreateRecipeRequest,
) -> NutritionResult<CreateRecipeResponse> {
    let name = validate_name(&request.name, "name")?;
    let tag = request.tag.as_deref().map(parse_tag).transpose()?.unwrap_or_default();

    let mut seen = HashSet::new();
    for (i, ingredient) in request.ingredients.iter().enumerate() {
        validate_quantity(ingredient.quantity_grams, &format!("ingredients[{}].quantity_grams", i))?;
        if !seen.insert(ingredient.food_id) {
            return Err(NutritionError::invalid(format!(
                "ingredients lists food {} more than once",
                ingredient.food_id
            )));
        }
    }

    let mut conn = db.get_conn()?;
    let tx = conn.transaction()?;

    let recipe = Recipe::create(
        &tx,
        &RecipeCreate {
            name,
            owner_id: if request.shared { None } else { Some(user_id) },
            tag,
            notes: request.notes,
        },
    )?;

    for (position, ingredient) in request.ingredients.iter().enumerate() {
        if Food::get_by_id(&tx, ingredient.food_id)?.is_none() {
            return Err(NutritionError::FoodNotFound(ingredient.food_id));
        }
        RecipeIngredient::create(&tx, recipe.id, position as i64, ingredient)?;
    }

    tx.commit()?;
    tracing::info!(
        recipe_id = recipe.id,
        user_id,
        ingredients = request.ingredients.len(),
        "recipe created"
    );

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        ingredient_count: request.ingredients.len(),
        created_at: recipe.created_at,
    })
}

/// Get a recipe with ingredients and derived nutrition
pub async fn get_recipe(
    db: &Database,
    user_id: i64,
    id: i64,
    cancel: &CancellationToken,
) -> NutritionResult<RecipeDetail> {
    let (recipe, ingredients, details) = db.with_conn(|conn| {
        let recipe = Recipe::get_by_id(conn, id)?;
        let ingredients = RecipeIngredient::get_for_recipe(conn, id)?;
        let details = RecipeIngredient::get_details_for_recipe(conn, id)?;
        Ok((recipe, ingredients, details))
    })?;
    let recipe = recipe.ok_or(NutritionError::RecipeNotFound(id))?;
    ensure_visible(&recipe, user_id)?;

    let catalog = SqliteCatalog::new(db.clone());
    let with_ingredients = RecipeWithIngredients { recipe, ingredients };
    let nutrition = RecipeNutritionAggregator::new(&catalog)
        .compute_recipe_nutrition(&with_ingredients, cancel)
        .await?
        .rounded();

    let recipe = with_ingredients.recipe;
    Ok(RecipeDetail {
        id: recipe.id,
        name: recipe.name,
        shared: recipe.owner_id.is_none(),
        tag: recipe.tag,
        ingredients: details,
        total_weight: nutrition.total_weight,
        total: nutrition.total,
        per_100g: nutrition.per_100g,
        notes: recipe.notes,
        created_at: recipe.created_at,
        updated_at: recipe.updated_at,
    })
}

/// List the user's own and shared recipes with derived nutrition
pub async fn list_recipes(
    db: &Database,
    user_id: i64,
    query: Option<&str>,
    limit: i64,
    offset: i64,
    cancel: &CancellationToken,
) -> NutritionResult<ListRecipesResponse> {
    let (limit, offset) = clamp_page(limit, offset);

    let (recipes, mut ingredients, total) = db.with_conn(|conn| {
        let recipes = Recipe::list_visible(conn, user_id, query, limit, offset)?;
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let ingredients = RecipeIngredient::get_for_recipes(conn, &ids)?;
        let total = Recipe::count_visible(conn, user_id, query)?;
        Ok((recipes, ingredients, total))
    })?;

    let recipes: Vec<RecipeWithIngredients> = recipes
        .into_iter()
        .map(|recipe| RecipeWithIngredients {
            ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
            recipe,
        })
        .collect();

    let catalog = SqliteCatalog::new(db.clone());
    let enriched = RecipeNutritionAggregator::new(&catalog)
        .enrich_many(&recipes, cancel)
        .await?;

    let summaries = recipes
        .iter()
        .zip(enriched)
        .map(|(r, nutrition)| RecipeSummary {
            id: r.recipe.id,
            name: r.recipe.name.clone(),
            shared: r.recipe.owner_id.is_none(),
            tag: r.recipe.tag,
            ingredient_count: r.ingredients.len(),
            total_weight: round2(nutrition.total_weight),
            total_calories: round2(nutrition.total.calories),
            calories_per_100g: round2(nutrition.per_100g.calories),
        })
        .collect();

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Delete a recipe the user owns. Diary entries logged against it keep
/// their snapshots.
pub fn delete_recipe(db: &Database, user_id: i64, id: i64) -> NutritionResult<RecipeDeleteSuccessResponse> {
    let conn = db.get_conn()?;

    let recipe = Recipe::get_by_id(&conn, id)?.ok_or(NutritionError::RecipeNotFound(id))?;
    if recipe.owner_id != Some(user_id) {
        tracing::warn!(recipe_id = id, user_id, "refusing to delete recipe not owned by user");
        return Err(NutritionError::Forbidden(format!(
            "recipe {} is not owned by this user",
            id
        )));
    }

    Recipe::delete(&conn, id)?;
    tracing::info!(recipe_id = id, user_id, "recipe deleted");

    Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    })
}
