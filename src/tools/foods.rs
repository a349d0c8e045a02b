//! Food MCP Tools
//!
//! Tools for managing the reference food catalog. Editing a food never
//! touches diary entries; those keep the snapshot taken when logged.

use serde::Serialize;

use crate::db::Database;
use crate::error::{NutritionError, NutritionResult};
use crate::models::{CategoryTag, Food, FoodCreate, FoodUpdate, Nutrition};
use crate::nutrition::validation::{clamp_page, parse_tag, validate_name, validate_profile};

/// Response for add_food
#[derive(Debug, Serialize)]
pub struct AddFoodResponse {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub tag: CategoryTag,
    pub created_at: String,
}

/// Food summary for list and search results
#[derive(Debug, Serialize)]
pub struct FoodSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub calories_per_100g: f64,
    pub tag: CategoryTag,
}

impl From<&Food> for FoodSummary {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            brand: food.brand.clone(),
            calories_per_100g: crate::models::round2(food.nutrition.calories),
            tag: food.tag,
        }
    }
}

/// Full food detail
#[derive(Debug, Serialize)]
pub struct FoodDetail {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub per_100g: Nutrition,
    pub tag: CategoryTag,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub recipe_usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

/// Response for search_foods
#[derive(Debug, Serialize)]
pub struct SearchFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: usize,
}

/// Response for list_foods
#[derive(Debug, Serialize)]
pub struct ListFoodsResponse {
    pub items: Vec<FoodSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_food
#[derive(Debug, Serialize)]
pub struct UpdateFoodResponse {
    pub success: bool,
    pub updated_at: String,
}

/// Response for delete_food blocked
#[derive(Debug, Serialize)]
pub struct DeleteFoodBlockedResponse {
    pub error: String,
    pub recipe_usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

/// Response for successful delete_food
#[derive(Debug, Serialize)]
pub struct DeleteFoodSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Add a new food. Nutrient values are per 100g.
pub fn add_food(db: &Database, mut data: FoodCreate) -> NutritionResult<AddFoodResponse> {
    data.name = validate_name(&data.name, "name")?;
    validate_profile(&data.nutrition(), "food")?;

    let food = db.with_conn(|conn| Food::create(conn, &data))?;
    tracing::info!(food_id = food.id, name = %food.name, "food added");

    Ok(AddFoodResponse {
        id: food.id,
        name: food.name,
        brand: food.brand,
        tag: food.tag,
        created_at: food.created_at,
    })
}

/// Search foods by name or brand
pub fn search_foods(db: &Database, query: &str, limit: i64) -> NutritionResult<SearchFoodsResponse> {
    let (limit, _) = clamp_page(limit, 0);
    let foods = db.with_conn(|conn| Food::search(conn, query.trim(), limit))?;

    let items: Vec<FoodSummary> = foods.iter().map(FoodSummary::from).collect();
    let total = items.len();

    Ok(SearchFoodsResponse { items, total })
}

/// Get a food with its recipe usage
pub fn get_food(db: &Database, id: i64) -> NutritionResult<FoodDetail> {
    let (food, usage, recipes) = db.with_conn(|conn| {
        let food = Food::get_by_id(conn, id)?;
        let usage = Food::get_recipe_usage_count(conn, id)?;
        let recipes = Food::get_used_in_recipes(conn, id)?;
        Ok((food, usage, recipes))
    })?;
    let food = food.ok_or(NutritionError::FoodNotFound(id))?;

    Ok(FoodDetail {
        id: food.id,
        name: food.name,
        brand: food.brand,
        per_100g: food.nutrition.rounded(),
        tag: food.tag,
        notes: food.notes,
        created_at: food.created_at,
        updated_at: food.updated_at,
        recipe_usage_count: usage,
        used_in_recipes: recipes,
    })
}

/// List foods with optional tag filter and pagination
pub fn list_foods(
    db: &Database,
    tag: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> NutritionResult<ListFoodsResponse> {
    let (limit, offset) = clamp_page(limit, offset);
    let tag = tag.map(parse_tag).transpose()?;

    let (foods, total) = db.with_conn(|conn| {
        let foods = Food::list(conn, tag, sort_by, sort_order, limit, offset)?;
        let total = Food::count(conn, tag)?;
        Ok((foods, total))
    })?;

    Ok(ListFoodsResponse {
        items: foods.iter().map(FoodSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update a food. Logged diary entries are unaffected.
pub fn update_food(db: &Database, id: i64, mut data: FoodUpdate) -> NutritionResult<UpdateFoodResponse> {
    if let Some(name) = &data.name {
        data.name = Some(validate_name(name, "name")?);
    }
    let nutrients = [
        ("calories", data.calories),
        ("protein", data.protein),
        ("carbs", data.carbs),
        ("fat", data.fat),
        ("fiber", data.fiber),
    ];
    for (field, value) in nutrients {
        if let Some(value) = value {
            if !value.is_finite() || value < 0.0 {
                return Err(NutritionError::invalid(format!(
                    "{} must be a non-negative number (got {})",
                    field, value
                )));
            }
        }
    }

    let updated = db
        .with_conn(|conn| Food::update(conn, id, &data))?
        .ok_or(NutritionError::FoodNotFound(id))?;
    tracing::info!(food_id = id, "food updated");

    Ok(UpdateFoodResponse {
        success: true,
        updated_at: updated.updated_at,
    })
}

/// Delete a food (blocked while any recipe uses it)
pub fn delete_food(
    db: &Database,
    id: i64,
) -> NutritionResult<Result<DeleteFoodSuccessResponse, DeleteFoodBlockedResponse>> {
    let conn = db.get_conn()?;

    if Food::get_by_id(&conn, id)?.is_none() {
        return Err(NutritionError::FoodNotFound(id));
    }

    let usage = Food::get_recipe_usage_count(&conn, id)?;
    if usage > 0 {
        let used_in_recipes = Food::get_used_in_recipes(&conn, id)?;
        return Ok(Err(DeleteFoodBlockedResponse {
            error: format!("Cannot delete food: used in {} recipe(s)", used_in_recipes.len()),
            recipe_usage_count: usage,
            used_in_recipes,
        }));
    }

    Food::delete(&conn, id)?;
    tracing::info!(food_id = id, "food deleted");

    Ok(Ok(DeleteFoodSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chicken() -> FoodCreate {
        FoodCreate {
            name: "  Chicken breast ".to_string(),
            brand: None,
            calories: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
            fiber: 0.0,
            tag: CategoryTag::Routine,
            notes: None,
        }
    }

    #[test]
    fn test_add_and_get_food() {
        let db = Database::in_memory().unwrap();
        let added = add_food(&db, chicken()).unwrap();
        assert_eq!(added.name, "Chicken breast");

        let detail = get_food(&db, added.id).unwrap();
        assert_eq!(detail.per_100g.calories, 165.0);
        assert_eq!(detail.recipe_usage_count, 0);

        assert!(matches!(get_food(&db, 999), Err(NutritionError::FoodNotFound(999))));
    }

    #[test]
    fn test_add_rejects_bad_values() {
        let db = Database::in_memory().unwrap();
        let err = add_food(&db, FoodCreate { protein: -1.0, ..chicken() }).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(_)));
        let err = add_food(&db, FoodCreate { name: " ".to_string(), ..chicken() }).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(_)));
    }

    #[test]
    fn test_list_and_search() {
        let db = Database::in_memory().unwrap();
        add_food(&db, chicken()).unwrap();
        add_food(&db, FoodCreate { name: "Cake".to_string(), tag: CategoryTag::Contextual, ..chicken() }).unwrap();

        assert_eq!(search_foods(&db, "cake", 10).unwrap().total, 1);
        let listed = list_foods(&db, Some("routine"), "name", "asc", 50, 0).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items[0].name, "Chicken breast");
        assert!(list_foods(&db, Some("weekly"), "name", "asc", 50, 0).is_err());
    }

    #[test]
    fn test_update_food() {
        let db = Database::in_memory().unwrap();
        let added = add_food(&db, chicken()).unwrap();
        update_food(&db, added.id, FoodUpdate { calories: Some(200.0), ..Default::default() }).unwrap();
        assert_eq!(get_food(&db, added.id).unwrap().per_100g.calories, 200.0);

        let err = update_food(&db, added.id, FoodUpdate { fat: Some(f64::NAN), ..Default::default() }).unwrap_err();
        assert!(matches!(err, NutritionError::InvalidInput(_)));
        assert!(matches!(
            update_food(&db, 999, FoodUpdate::default()),
            Err(NutritionError::FoodNotFound(999))
        ));
    }

    #[test]
    fn test_delete_food() {
        let db = Database::in_memory().unwrap();
        let added = add_food(&db, chicken()).unwrap();
        assert!(delete_food(&db, added.id).unwrap().is_ok());
        assert!(matches!(delete_food(&db, added.id), Err(NutritionError::FoodNotFound(_))));
    }
}
