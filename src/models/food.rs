//! Food model
//!
//! A reference food with nutrient values per 100 grams.

use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{CategoryTag, Nutrition};

/// A catalog food. `nutrition` is always per 100g.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub nutrition: Nutrition,
    pub tag: CategoryTag,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCreate {
    pub name: String,
    pub brand: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub tag: CategoryTag,
    pub notes: Option<String>,
}

impl FoodCreate {
    pub fn nutrition(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs, self.fat, self.fiber)
    }
}

/// Data for updating a food
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub tag: Option<CategoryTag>,
    pub notes: Option<String>,
}

impl Food {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
                fiber: row.get("fiber")?,
            },
            tag: CategoryTag::from_str(row.get::<_, String>("tag")?.as_str()),
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new food into the database
    pub fn create(conn: &Connection, data: &FoodCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO foods (name, brand, calories, protein, carbs, fat, fiber, tag, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                data.name,
                data.brand,
                data.calories,
                data.protein,
                data.carbs,
                data.fat,
                data.fiber,
                data.tag.as_str(),
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a food by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM foods WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(food) => Ok(Some(food)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch every food whose id is in `ids` with one query.
    ///
    /// Missing ids are simply absent from the result.
    pub fn get_by_ids(conn: &Connection, ids: &[i64]) -> DbResult<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT * FROM foods WHERE id IN ({}) ORDER BY id", placeholders);

        let mut stmt = conn.prepare(&sql)?;
        let foods = stmt
            .query_map(params_from_iter(ids.iter()), Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(foods)
    }

    /// Search foods by name or brand
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM foods
            WHERE name LIKE ?1 OR brand LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let foods = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(foods)
    }

    /// List foods with optional tag filter
    pub fn list(
        conn: &Connection,
        tag: Option<CategoryTag>,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            "calories" => "calories",
            _ => "name",
        };

        let sql = if tag.is_some() {
            format!(
                "SELECT * FROM foods WHERE tag = ?1 ORDER BY {} {} LIMIT ?2 OFFSET ?3",
                sort_col, order
            )
        } else {
            format!(
                "SELECT * FROM foods ORDER BY {} {} LIMIT ?1 OFFSET ?2",
                sort_col, order
            )
        };

        let mut stmt = conn.prepare(&sql)?;

        let foods = if let Some(tag) = tag {
            stmt.query_map(params![tag.as_str(), limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(foods)
    }

    /// Update a food. Diary snapshots are stored separately and are not touched.
    pub fn update(conn: &Connection, id: i64, data: &FoodUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(brand, "brand");
        add_update!(calories, "calories");
        add_update!(protein, "protein");
        add_update!(carbs, "carbs");
        add_update!(fat, "fat");
        add_update!(fiber, "fiber");
        add_update!(notes, "notes");

        if let Some(tag) = data.tag {
            updates.push(format!("tag = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(tag.as_str().to_string()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE foods SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Number of recipe ingredient rows referencing this food
    pub fn get_recipe_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE food_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Names of recipes using this food
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.name FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recipe_id
            WHERE ri.food_id = ?1
            ORDER BY r.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Count foods (optionally filtered by tag)
    pub fn count(conn: &Connection, tag: Option<CategoryTag>) -> DbResult<i64> {
        let count: i64 = if let Some(tag) = tag {
            conn.query_row(
                "SELECT COUNT(*) FROM foods WHERE tag = ?1",
                [tag.as_str()],
                |row| row.get(0),
            )?
        } else {
            conn.query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?
        };
        Ok(count)
    }

    /// Delete a food.
    ///
    /// Fails with a foreign key error while recipe ingredients still reference
    /// it. Returns Ok(false) if the food does not exist.
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM foods WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn chicken() -> FoodCreate {
        FoodCreate {
            name: "Chicken breast".to_string(),
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
    fn test_create_and_get() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let food = Food::create(conn, &chicken())?;
            assert_eq!(food.nutrition.calories, 165.0);
            assert_eq!(food.tag, CategoryTag::Routine);
            assert!(Food::get_by_id(conn, food.id)?.is_some());
            assert!(Food::get_by_id(conn, food.id + 100)?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_get_by_ids_skips_missing() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let a = Food::create(conn, &chicken())?;
            let b = Food::create(conn, &FoodCreate { name: "Rice".to_string(), ..chicken() })?;
            let found = Food::get_by_ids(conn, &[a.id, b.id, 999])?;
            assert_eq!(found.len(), 2);
            assert!(Food::get_by_ids(conn, &[])?.is_empty());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_and_search() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let food = Food::create(conn, &chicken())?;
            let updated = Food::update(
                conn,
                food.id,
                &FoodUpdate { calories: Some(200.0), tag: Some(CategoryTag::Contextual), ..Default::default() },
            )?
            .unwrap();
            assert_eq!(updated.nutrition.calories, 200.0);
            assert_eq!(updated.tag, CategoryTag::Contextual);
            assert_eq!(Food::search(conn, "chick", 10)?.len(), 1);
            assert_eq!(Food::count(conn, Some(CategoryTag::Routine))?, 0);
            Ok(())
        })
        .unwrap();
    }
}
