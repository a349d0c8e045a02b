//! Diary MCP Tools
//!
//! Logging, reading, updating and removing diary entries. Every write that
//! affects nutrition goes through the consumption resolver; reads return the
//! stored snapshot as-is.

use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::db::{Database, SqliteCatalog};
use crate::error::{NutritionError, NutritionResult};
use crate::models::{
    round2, CategoryTag, CustomIngredient, DiaryEntry, DiaryEntryCreate, EntrySource, MealType,
    Nutrition, SnapshotUpdate,
};
use crate::nutrition::validation::{parse_date, parse_meal_type};
use crate::nutrition::{daily_totals, ConsumptionResolver, ConsumptionSource, LogEntryRequest};

/// A diary entry as returned to callers. Nutrient values are rounded here.
#[derive(Debug, Serialize)]
pub struct DiaryEntryResponse {
    pub id: i64,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub source: EntrySource,
    pub quantity_grams: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_tag: Option<CategoryTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_tag: Option<CategoryTag>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DiaryEntry> for DiaryEntryResponse {
    fn from(entry: DiaryEntry) -> Self {
        let n = entry.snapshot.nutrition.rounded();
        Self {
            id: entry.id,
            date: entry.date,
            meal_type: entry.meal_type,
            source: entry.source,
            quantity_grams: round2(entry.quantity_grams),
            calories: n.calories,
            protein: n.protein,
            carbs: n.carbs,
            fat: n.fat,
            fiber: n.fiber,
            food_tag: entry.snapshot.food_tag,
            recipe_tag: entry.snapshot.recipe_tag,
            notes: entry.notes,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Response for list_entries
#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub date: NaiveDate,
    pub entries: Vec<DiaryEntryResponse>,
    pub count: usize,
    pub totals: Nutrition,
}

/// Response for update_entry
#[derive(Debug, Serialize)]
pub struct UpdateEntryResponse {
    pub entry: DiaryEntryResponse,
    /// Whether the nutrition snapshot was recomputed
    pub recomputed: bool,
}

/// Response for delete_entry
#[derive(Debug, Serialize)]
pub struct DeleteEntryResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Changes accepted by update_entry. Only date, quantity and custom
/// ingredient changes recompute the snapshot.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdateRequest {
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub quantity_grams: Option<f64>,
    pub custom_ingredients: Option<Vec<CustomIngredient>>,
    pub notes: Option<String>,
}

/// Load a live entry and check the caller owns it
fn owned_entry(db: &Database, user_id: i64, id: i64) -> NutritionResult<DiaryEntry> {
    let entry = db
        .with_conn(|conn| DiaryEntry::get_by_id(conn, id))?
        .ok_or(NutritionError::EntryNotFound(id))?;

    if entry.owner_id != user_id {
        tracing::warn!(entry_id = id, user_id, "diary entry belongs to another user");
        return Err(NutritionError::Forbidden(format!(
            "diary entry {} belongs to another user",
            id
        )));
    }
    Ok(entry)
}

/// Log a consumption event, computing and storing its snapshot
pub async fn log_entry(
    db: &Database,
    user_id: i64,
    request: LogEntryRequest,
    today: NaiveDate,
    cancel: &CancellationToken,
) -> NutritionResult<DiaryEntryResponse> {
    let meal_type = request.meal_type()?;
    let date = request.date(today)?;
    let source = request.source()?;

    let catalog = SqliteCatalog::new(db.clone());
    let resolved = ConsumptionResolver::new(&catalog, &catalog)
        .resolve(user_id, &source, cancel)
        .await?;

    let entry = db.with_conn(|conn| {
        DiaryEntry::create(
            conn,
            &DiaryEntryCreate {
                owner_id: user_id,
                date,
                meal_type,
                source: source.to_entry_source(),
                quantity_grams: resolved.total_weight,
                snapshot: resolved.snapshot,
                notes: request.notes.clone(),
            },
        )
    })?;

    tracing::info!(
        entry_id = entry.id,
        user_id,
        date = %date,
        calories = entry.snapshot.nutrition.calories,
        "diary entry logged"
    );

    Ok(entry.into())
}

pub fn get_entry(db: &Database, user_id: i64, id: i64) -> NutritionResult<DiaryEntryResponse> {
    owned_entry(db, user_id, id).map(DiaryEntryResponse::from)
}

/// All live entries for one date
pub fn list_entries(db: &Database, user_id: i64, date: NaiveDate) -> NutritionResult<ListEntriesResponse> {
    let entries = db.with_conn(|conn| DiaryEntry::list_for_date(conn, user_id, date))?;
    let totals = daily_totals(&entries).rounded();
    let count = entries.len();

    Ok(ListEntriesResponse {
        date,
        entries: entries.into_iter().map(DiaryEntryResponse::from).collect(),
        count,
        totals,
    })
}

/// Update an entry.
///
/// Date, quantity or custom ingredient changes re-run the resolver against
/// the current catalog. Meal type and notes edits leave the snapshot alone.
pub async fn update_entry(
    db: &Database,
    user_id: i64,
    id: i64,
    update: EntryUpdateRequest,
    cancel: &CancellationToken,
) -> NutritionResult<UpdateEntryResponse> {
    let entry = owned_entry(db, user_id, id)?;

    let meal_type = update.meal_type.as_deref().map(parse_meal_type).transpose()?;
    let date = update.date.as_deref().map(parse_date).transpose()?;

    let date_changed = date.map_or(false, |d| d != entry.date);
    let recompute = date_changed || update.quantity_grams.is_some() || update.custom_ingredients.is_some();

    let snapshot_update = if recompute {
        let source = recompute_source(&entry, &update)?;
        let catalog = SqliteCatalog::new(db.clone());
        let resolved = ConsumptionResolver::new(&catalog, &catalog)
            .resolve(user_id, &source, cancel)
            .await?;

        Some(SnapshotUpdate {
            date: date.unwrap_or(entry.date),
            source: source.to_entry_source(),
            quantity_grams: resolved.total_weight,
            snapshot: resolved.snapshot,
        })
    } else {
        None
    };

    let updated = db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        if let Some(data) = &snapshot_update {
            DiaryEntry::update_snapshot(&tx, id, data)?;
        }
        let updated = DiaryEntry::update_details(&tx, id, meal_type, update.notes.as_deref())?;
        tx.commit()?;
        Ok(updated)
    })?;
    let updated = updated.ok_or(NutritionError::EntryNotFound(id))?;

    tracing::info!(entry_id = id, user_id, recomputed = recompute, "diary entry updated");

    Ok(UpdateEntryResponse {
        entry: updated.into(),
        recomputed: recompute,
    })
}

/// Apply the requested quantity or ingredient change to the stored source
fn recompute_source(entry: &DiaryEntry, update: &EntryUpdateRequest) -> NutritionResult<ConsumptionSource> {
    let mut source = entry.source.clone();

    if let Some(custom) = &update.custom_ingredients {
        match &mut source {
            EntrySource::Recipe { custom_ingredients, .. } => *custom_ingredients = Some(custom.clone()),
            _ => {
                return Err(NutritionError::invalid(
                    "custom_ingredients can only be set on recipe entries",
                ))
            }
        }
    }

    let is_custom = matches!(source, EntrySource::Recipe { custom_ingredients: Some(_), .. });
    if is_custom && update.quantity_grams.is_some() {
        return Err(NutritionError::invalid(
            "quantity_grams cannot be set on a custom-ingredient entry; update custom_ingredients instead",
        ));
    }

    let grams = update.quantity_grams.unwrap_or(entry.quantity_grams);
    Ok(ConsumptionSource::from_entry(&source, grams))
}

/// Soft-delete an entry
pub fn delete_entry(db: &Database, user_id: i64, id: i64) -> NutritionResult<DeleteEntryResponse> {
    owned_entry(db, user_id, id)?;

    if !db.with_conn(|conn| DiaryEntry::soft_delete(conn, id))? {
        return Err(NutritionError::EntryNotFound(id));
    }
    tracing::info!(entry_id = id, user_id, "diary entry deleted");

    Ok(DeleteEntryResponse {
        success: true,
        deleted_id: id,
    })
}
