//! Diary Entry model
//!
//! A logged consumption event carrying the nutrition snapshot computed when
//! it was written.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{CategoryTag, Nutrition};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Meal slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }
}

/// One per-ingredient gram override for a recipe entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomIngredient {
    pub food_id: i64,
    pub quantity_grams: f64,
}

/// An ad-hoc food defined inside the log request, values per 100g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineFood {
    pub name: String,
    pub description: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    pub tag: Option<CategoryTag>,
}

impl InlineFood {
    pub fn profile(&self) -> Nutrition {
        Nutrition::new(self.calories, self.protein, self.carbs, self.fat, self.fiber)
    }
}

/// Consumed nutrition cached on an entry at write time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionSnapshot {
    pub nutrition: Nutrition,
    pub food_tag: Option<CategoryTag>,
    pub recipe_tag: Option<CategoryTag>,
}

impl NutritionSnapshot {
    /// Food tag wins over recipe tag
    pub fn resolved_tag(&self) -> Option<CategoryTag> {
        self.food_tag.or(self.recipe_tag)
    }
}

/// What an entry was logged against, kept so an explicit update can
/// recompute the snapshot without the caller resending the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntrySource {
    Food {
        food_id: i64,
    },
    Recipe {
        recipe_id: i64,
        custom_ingredients: Option<Vec<CustomIngredient>>,
    },
    Inline {
        food: InlineFood,
    },
}

impl EntrySource {
    fn type_str(&self) -> &'static str {
        match self {
            EntrySource::Food { .. } => "food",
            EntrySource::Recipe { .. } => "recipe",
            EntrySource::Inline { .. } => "inline",
        }
    }
}

/// A diary entry as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: i64,
    pub owner_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub source: EntrySource,
    pub quantity_grams: f64,
    pub snapshot: NutritionSnapshot,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for inserting a diary entry
#[derive(Debug, Clone)]
pub struct DiaryEntryCreate {
    pub owner_id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub source: EntrySource,
    pub quantity_grams: f64,
    pub snapshot: NutritionSnapshot,
    pub notes: Option<String>,
}

/// Columns rewritten by an explicit recompute
#[derive(Debug, Clone)]
pub struct SnapshotUpdate {
    pub date: NaiveDate,
    pub source: EntrySource,
    pub quantity_grams: f64,
    pub snapshot: NutritionSnapshot,
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, name: &str) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|text| serde_json::from_str(&text).map_err(|e| conversion_error(0, e)))
        .transpose()
}

fn tag_column(row: &Row, name: &str) -> rusqlite::Result<Option<CategoryTag>> {
    let raw: Option<String> = row.get(name)?;
    Ok(raw.as_deref().map(CategoryTag::from_str))
}

/// Split a source into (food_id, recipe_id, custom JSON, inline JSON) columns
fn source_columns(
    source: &EntrySource,
) -> DbResult<(Option<i64>, Option<i64>, Option<String>, Option<String>)> {
    Ok(match source {
        EntrySource::Food { food_id } => (Some(*food_id), None, None, None),
        EntrySource::Recipe { recipe_id, custom_ingredients } => {
            let custom = custom_ingredients
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            (None, Some(*recipe_id), custom, None)
        }
        EntrySource::Inline { food } => (None, None, None, Some(serde_json::to_string(food)?)),
    })
}

impl DiaryEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let raw_date: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
            .map_err(|e| conversion_error(0, e))?;

        let raw_meal: String = row.get("meal_type")?;
        let meal_type = MealType::parse(&raw_meal).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(0, format!("meal_type '{}'", raw_meal), Type::Text)
        })?;

        let source_type: String = row.get("source_type")?;
        let source = match source_type.as_str() {
            "food" => EntrySource::Food {
                food_id: row.get("food_id")?,
            },
            "recipe" => EntrySource::Recipe {
                recipe_id: row.get("recipe_id")?,
                custom_ingredients: json_column(row, "custom_ingredients")?,
            },
            _ => EntrySource::Inline {
                food: json_column(row, "inline_food")?.ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(0, "inline_food".to_string(), Type::Null)
                })?,
            },
        };

        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            date,
            meal_type,
            source,
            quantity_grams: row.get("quantity_grams")?,
            snapshot: NutritionSnapshot {
                nutrition: Nutrition {
                    calories: row.get("calories")?,
                    protein: row.get("protein")?,
                    carbs: row.get("carbs")?,
                    fat: row.get("fat")?,
                    fiber: row.get("fiber")?,
                },
                food_tag: tag_column(row, "food_tag")?,
                recipe_tag: tag_column(row, "recipe_tag")?,
            },
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new diary entry with its precomputed snapshot
    pub fn create(conn: &Connection, data: &DiaryEntryCreate) -> DbResult<Self> {
        let (food_id, recipe_id, custom, inline) = source_columns(&data.source)?;
        let n = &data.snapshot.nutrition;

        conn.execute(
            r#"
            INSERT INTO diary_entries (
                owner_id, date, meal_type, source_type, food_id, recipe_id,
                custom_ingredients, inline_food, quantity_grams,
                calories, protein, carbs, fat, fiber, food_tag, recipe_tag, notes
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                data.owner_id,
                data.date.format(DATE_FORMAT).to_string(),
                data.meal_type.as_str(),
                data.source.type_str(),
                food_id,
                recipe_id,
                custom,
                inline,
                data.quantity_grams,
                n.calories,
                n.protein,
                n.carbs,
                n.fat,
                n.fiber,
                data.snapshot.food_tag.map(|t| t.as_str()),
                data.snapshot.recipe_tag.map(|t| t.as_str()),
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a live (not soft-deleted) entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM diary_entries WHERE id = ?1 AND deleted_at IS NULL")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Live entries for an owner on one date
    pub fn list_for_date(conn: &Connection, owner_id: i64, date: NaiveDate) -> DbResult<Vec<Self>> {
        Self::list_for_range(conn, owner_id, date, date)
    }

    /// Live entries for an owner between two dates, inclusive
    pub fn list_for_range(
        conn: &Connection,
        owner_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM diary_entries
            WHERE owner_id = ?1 AND date >= ?2 AND date <= ?3 AND deleted_at IS NULL
            ORDER BY date, id
            "#,
        )?;

        let entries = stmt
            .query_map(
                params![
                    owner_id,
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string(),
                ],
                Self::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Rewrite the snapshot after an explicit quantity/date/ingredient change
    pub fn update_snapshot(conn: &Connection, id: i64, data: &SnapshotUpdate) -> DbResult<Option<Self>> {
        let (food_id, recipe_id, custom, inline) = source_columns(&data.source)?;
        let n = &data.snapshot.nutrition;

        conn.execute(
            r#"
            UPDATE diary_entries SET
                date = ?1, source_type = ?2, food_id = ?3, recipe_id = ?4,
                custom_ingredients = ?5, inline_food = ?6, quantity_grams = ?7,
                calories = ?8, protein = ?9, carbs = ?10, fat = ?11, fiber = ?12,
                food_tag = ?13, recipe_tag = ?14, updated_at = datetime('now')
            WHERE id = ?15 AND deleted_at IS NULL
            "#,
            params![
                data.date.format(DATE_FORMAT).to_string(),
                data.source.type_str(),
                food_id,
                recipe_id,
                custom,
                inline,
                data.quantity_grams,
                n.calories,
                n.protein,
                n.carbs,
                n.fat,
                n.fiber,
                data.snapshot.food_tag.map(|t| t.as_str()),
                data.snapshot.recipe_tag.map(|t| t.as_str()),
                id,
            ],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Update fields that never affect nutrition
    pub fn update_details(
        conn: &Connection,
        id: i64,
        meal_type: Option<MealType>,
        notes: Option<&str>,
    ) -> DbResult<Option<Self>> {
        conn.execute(
            r#"
            UPDATE diary_entries SET
                meal_type = COALESCE(?1, meal_type),
                notes = COALESCE(?2, notes),
                updated_at = datetime('now')
            WHERE id = ?3 AND deleted_at IS NULL
            "#,
            params![meal_type.map(|m| m.as_str()), notes, id],
        )?;

        Self::get_by_id(conn, id)
    }

    /// Soft-delete an entry. Returns false if it was already gone.
    pub fn soft_delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "UPDATE diary_entries SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
            [id],
        )?;
        Ok(rows > 0)
    }

    /// Count live entries
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM diary_entries WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
