//! Recipe Ingredient model
//!
//! Links a food to a recipe with a gram quantity.

use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;

/// A recipe ingredient linking a food to a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub food_id: i64,
    pub quantity_grams: f64,
    pub position: i64,
}

/// Ingredient as supplied when creating a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub food_id: i64,
    pub quantity_grams: f64,
}

/// Ingredient with the food's name for detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub food_id: i64,
    pub food_name: String,
    pub quantity_grams: f64,
}

impl RecipeIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            food_id: row.get("food_id")?,
            quantity_grams: row.get("quantity_grams")?,
            position: row.get("position")?,
        })
    }

    /// Add an ingredient to a recipe
    pub fn create(
        conn: &Connection,
        recipe_id: i64,
        position: i64,
        data: &RecipeIngredientCreate,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, food_id, quantity_grams, position)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![recipe_id, data.food_id, data.quantity_grams, position],
        )?;

        Ok(Self {
            id: conn.last_insert_rowid(),
            recipe_id,
            food_id: data.food_id,
            quantity_grams: data.quantity_grams,
            position,
        })
    }

    /// Get all ingredients for a recipe, in recipe order
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY position, id",
        )?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Ingredients for many recipes in one query, grouped by recipe id
    pub fn get_for_recipes(
        conn: &Connection,
        recipe_ids: &[i64],
    ) -> DbResult<HashMap<i64, Vec<Self>>> {
        let mut grouped: HashMap<i64, Vec<Self>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders = (1..=recipe_ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT * FROM recipe_ingredients WHERE recipe_id IN ({}) ORDER BY recipe_id, position, id",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(recipe_ids.iter()), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for ingredient in rows {
            grouped.entry(ingredient.recipe_id).or_default().push(ingredient);
        }

        Ok(grouped)
    }

    /// Get ingredients with food names for a recipe
    pub fn get_details_for_recipe(
        conn: &Connection,
        recipe_id: i64,
    ) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.food_id, f.name AS food_name, ri.quantity_grams
            FROM recipe_ingredients ri
            INNER JOIN foods f ON ri.food_id = f.id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.position, ri.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    food_id: row.get("food_id")?,
                    food_name: row.get("food_name")?,
                    quantity_grams: row.get("quantity_grams")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{CategoryTag, Food, FoodCreate, Recipe, RecipeCreate};

    #[test]
    fn test_grouped_fetch_keeps_order() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let food = |name: &str| FoodCreate {
                name: name.to_string(),
                brand: None,
                calories: 100.0,
                protein: 1.0,
                carbs: 1.0,
                fat: 1.0,
                fiber: 0.0,
                tag: CategoryTag::General,
                notes: None,
            };
            let a = Food::create(conn, &food("a"))?;
            let b = Food::create(conn, &food("b"))?;
            let recipe = Recipe::create(
                conn,
                &RecipeCreate { name: "r".to_string(), owner_id: None, tag: CategoryTag::General, notes: None },
            )?;
            RecipeIngredient::create(conn, recipe.id, 1, &RecipeIngredientCreate { food_id: b.id, quantity_grams: 50.0 })?;
            RecipeIngredient::create(conn, recipe.id, 0, &RecipeIngredientCreate { food_id: a.id, quantity_grams: 20.0 })?;

            let grouped = RecipeIngredient::get_for_recipes(conn, &[recipe.id, 999])?;
            let ingredients = &grouped[&recipe.id];
            assert_eq!(ingredients.len(), 2);
            assert_eq!(ingredients[0].food_id, a.id);
            assert!(!grouped.contains_key(&999));

            let details = RecipeIngredient::get_details_for_recipe(conn, recipe.id)?;
            assert_eq!(details[1].food_name, "b");
            Ok(())
        })
        .unwrap();
    }
}
