//! Recipe model
//!
//! A user-composed food. Nutrition is always derived from the ingredients.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::CategoryTag;

/// A recipe. `owner_id` of `None` marks a shared recipe visible to everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub owner_id: Option<i64>,
    pub tag: CategoryTag,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for inserting a recipe row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub tag: CategoryTag,
    pub notes: Option<String>,
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            owner_id: row.get("owner_id")?,
            tag: CategoryTag::from_str(row.get::<_, String>("tag")?.as_str()),
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Whether `user_id` may read and log this recipe
    pub fn is_visible_to(&self, user_id: i64) -> bool {
        self.owner_id.map_or(true, |owner| owner == user_id)
    }

    /// Insert a new recipe into the database
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (name, owner_id, tag, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![data.name, data.owner_id, data.tag.as_str(), data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes visible to a user: their own plus shared ones
    pub fn list_visible(
        conn: &Connection,
        user_id: i64,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query.unwrap_or(""));
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM recipes
            WHERE (owner_id IS NULL OR owner_id = ?1) AND name LIKE ?2
            ORDER BY name ASC
            LIMIT ?3 OFFSET ?4
            "#,
        )?;

        let recipes = stmt
            .query_map(params![user_id, search_pattern, limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Count recipes visible to a user, with the same name filter as `list_visible`
    pub fn count_visible(conn: &Connection, user_id: i64, query: Option<&str>) -> DbResult<i64> {
        let search_pattern = format!("%{}%", query.unwrap_or(""));
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE (owner_id IS NULL OR owner_id = ?1) AND name LIKE ?2",
            params![user_id, search_pattern],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count every recipe
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a recipe (cascades to its ingredient rows)
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
