//! NutriLog MCP Server Implementation
//!
//! Exposes the nutrition engine as MCP tools over stdio.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::Database;
use crate::error::{ErrorKind, NutritionError, NutritionResult};
use crate::models::{CustomIngredient, FoodCreate, FoodUpdate, InlineFood, RecipeIngredientCreate};
use crate::nutrition::validation::{parse_date, parse_tag};
use crate::nutrition::LogEntryRequest;
use crate::tools::diary::{self, EntryUpdateRequest};
use crate::tools::goals::{self, SetGoalRequest};
use crate::tools::recipes::{self, CreateRecipeRequest};
use crate::tools::status::StatusTracker;
use crate::tools::{foods, summaries};

/// NutriLog MCP Service
#[derive(Clone)]
pub struct NutriLogService {
    status_tracker: Arc<StatusTracker>,
    database: Database,
    /// Every request acts as this user
    user_id: i64,
    tool_router: ToolRouter<NutriLogService>,
}

impl NutriLogService {
    pub fn new(database_path: PathBuf, database: Database, user_id: i64) -> Self {
        Self {
            status_tracker: Arc::new(StatusTracker::new(database_path)),
            database,
            user_id,
            tool_router: Self::tool_router(),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn date_or_today(raw: Option<&str>) -> NutritionResult<NaiveDate> {
    raw.map(parse_date).transpose().map(|d| d.unwrap_or_else(today))
}

/// Map an engine error onto an MCP error, keeping its kind in `data`
pub(crate) fn to_mcp_error(e: NutritionError) -> McpError {
    let kind = e.kind();
    let data = Some(json!({ "kind": kind.as_str() }));
    let message = e.to_string();
    match kind {
        ErrorKind::InvalidInput => McpError::invalid_params(message, data),
        ErrorKind::NotFound => McpError::resource_not_found(message, data),
        ErrorKind::Forbidden => McpError::invalid_request(message, data),
        ErrorKind::Cancelled => McpError::internal_error(message, data),
        ErrorKind::Internal => {
            tracing::error!(error = %message, "tool failed");
            McpError::internal_error(message, data)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn respond<T: Serialize>(result: NutritionResult<T>) -> Result<CallToolResult, McpError> {
    to_json(&result.map_err(to_mcp_error)?)
}

// ============================================================================
// Shared Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParam {
    pub food_id: i64,
    /// Grams of this food
    pub quantity_grams: f64,
}

impl From<IngredientParam> for RecipeIngredientCreate {
    fn from(p: IngredientParam) -> Self {
        RecipeIngredientCreate {
            food_id: p.food_id,
            quantity_grams: p.quantity_grams,
        }
    }
}

impl From<IngredientParam> for CustomIngredient {
    fn from(p: IngredientParam) -> Self {
        CustomIngredient {
            food_id: p.food_id,
            quantity_grams: p.quantity_grams,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InlineFoodParams {
    pub name: String,
    pub description: Option<String>,
    /// Values per 100g
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    /// routine, contextual or general (default routine)
    pub tag: Option<String>,
}

impl InlineFoodParams {
    fn into_inline_food(self) -> NutritionResult<InlineFood> {
        Ok(InlineFood {
            tag: self.tag.as_deref().map(parse_tag).transpose()?,
            name: self.name,
            description: self.description,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber: self.fiber,
        })
    }
}

fn default_search_limit() -> i64 { 20 }
fn default_list_limit() -> i64 { 50 }
fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodParams {
    pub name: String,
    pub brand: Option<String>,
    /// Values per 100g
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    /// routine, contextual or general (default general)
    pub tag: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    pub tag: Option<String>,
    /// name, calories or created_at
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    pub id: i64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub tag: Option<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    /// Shared recipes are visible to every user
    #[serde(default)]
    pub shared: bool,
    /// routine, contextual or general (default general)
    pub tag: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientParam>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Optional name filter
    pub query: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

// ============================================================================
// Diary Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogEntryParams {
    pub food_id: Option<i64>,
    pub recipe_id: Option<i64>,
    pub inline_food: Option<InlineFoodParams>,
    /// breakfast, lunch, dinner or snack
    pub meal_type: String,
    /// Date (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
    pub quantity_grams: Option<f64>,
    /// Full per-ingredient grams for a recipe entry
    pub custom_ingredients: Option<Vec<IngredientParam>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEntriesParams {
    /// Date (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateEntryParams {
    pub id: i64,
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub quantity_grams: Option<f64>,
    pub custom_ingredients: Option<Vec<IngredientParam>>,
    pub notes: Option<String>,
}

// ============================================================================
// Goal and Summary Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalParams {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    /// Date (YYYY-MM-DD), defaults to today
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// Date (YYYY-MM-DD), defaults to today
    pub date: Option<String>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl NutriLogService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriLog service including build info, database counts, and process information")]
    async fn nutrilog_status(&self) -> Result<CallToolResult, McpError> {
        respond(self.status_tracker.get_status(&self.database))
    }

    #[tool(description = "Get step-by-step instructions for logging foods, recipes and diary entries. Call this when starting a logging session or when unsure how to use the tools.")]
    fn logging_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::LOGGING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(LOGGING_INSTRUCTIONS)]))
    }

    // --- Foods ---

    #[tool(description = "Create a reference food with nutrient values per 100g")]
    fn add_food(&self, Parameters(p): Parameters<AddFoodParams>) -> Result<CallToolResult, McpError> {
        let result = p
            .tag
            .as_deref()
            .map(parse_tag)
            .transpose()
            .and_then(|tag| {
                foods::add_food(
                    &self.database,
                    FoodCreate {
                        name: p.name,
                        brand: p.brand,
                        calories: p.calories,
                        protein: p.protein,
                        carbs: p.carbs,
                        fat: p.fat,
                        fiber: p.fiber,
                        tag: tag.unwrap_or_default(),
                        notes: p.notes,
                    },
                )
            });
        respond(result)
    }

    #[tool(description = "Search foods by name or brand")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        respond(foods::search_foods(&self.database, &p.query, p.limit))
    }

    #[tool(description = "Get full details for a food including the recipes that use it")]
    fn get_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(foods::get_food(&self.database, p.id))
    }

    #[tool(description = "List foods with optional tag filter, sorting, and pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        respond(foods::list_foods(
            &self.database,
            p.tag.as_deref(),
            &p.sort_by,
            &p.sort_order,
            p.limit,
            p.offset,
        ))
    }

    #[tool(description = "Update a food. Recipes reflect the change immediately; logged diary entries keep their stored nutrition.")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        let result = p
            .tag
            .as_deref()
            .map(parse_tag)
            .transpose()
            .and_then(|tag| {
                foods::update_food(
                    &self.database,
                    p.id,
                    FoodUpdate {
                        name: p.name,
                        brand: p.brand,
                        calories: p.calories,
                        protein: p.protein,
                        carbs: p.carbs,
                        fat: p.fat,
                        fiber: p.fiber,
                        tag,
                        notes: p.notes,
                    },
                )
            });
        respond(result)
    }

    #[tool(description = "Delete a food (only allowed if not used in any recipes)")]
    fn delete_food(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        match foods::delete_food(&self.database, p.id).map_err(to_mcp_error)? {
            Ok(success) => to_json(&success),
            Err(blocked) => to_json(&blocked),
        }
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe from foods and gram quantities. Nutrition is always derived from the ingredients.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let request = CreateRecipeRequest {
            name: p.name,
            shared: p.shared,
            tag: p.tag,
            notes: p.notes,
            ingredients: p.ingredients.into_iter().map(Into::into).collect(),
        };
        respond(recipes::create_recipe(&self.database, self.user_id, request))
    }

    #[tool(description = "Get a recipe with its ingredients and computed nutrition (total and per 100g)")]
    async fn get_recipe(
        &self,
        Parameters(p): Parameters<IdParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        respond(recipes::get_recipe(&self.database, self.user_id, p.id, &ctx.ct).await)
    }

    #[tool(description = "List your recipes and shared recipes with computed nutrition")]
    async fn list_recipes(
        &self,
        Parameters(p): Parameters<ListRecipesParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            recipes::list_recipes(&self.database, self.user_id, p.query.as_deref(), p.limit, p.offset, &ctx.ct)
                .await,
        )
    }

    #[tool(description = "Delete one of your recipes. Diary entries logged from it are kept.")]
    fn delete_recipe(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(recipes::delete_recipe(&self.database, self.user_id, p.id))
    }

    // --- Diary ---

    #[tool(description = "Log a diary entry from exactly one source: food_id, recipe_id (with quantity_grams or custom_ingredients), or inline_food. Nutrition is computed once and stored.")]
    async fn log_entry(
        &self,
        Parameters(p): Parameters<LogEntryParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let inline_food = p
            .inline_food
            .map(InlineFoodParams::into_inline_food)
            .transpose()
            .map_err(to_mcp_error)?;
        let request = LogEntryRequest {
            food_id: p.food_id,
            recipe_id: p.recipe_id,
            date: p.date,
            meal_type: p.meal_type,
            quantity_grams: p.quantity_grams,
            custom_ingredients: p
                .custom_ingredients
                .map(|list| list.into_iter().map(Into::into).collect()),
            inline_food,
            notes: p.notes,
        };
        respond(diary::log_entry(&self.database, self.user_id, request, today(), &ctx.ct).await)
    }

    #[tool(description = "Get a diary entry with its stored nutrition")]
    fn get_entry(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diary::get_entry(&self.database, self.user_id, p.id))
    }

    #[tool(description = "List diary entries for a date with totals")]
    fn list_entries(&self, Parameters(p): Parameters<ListEntriesParams>) -> Result<CallToolResult, McpError> {
        respond(
            date_or_today(p.date.as_deref())
                .and_then(|date| diary::list_entries(&self.database, self.user_id, date)),
        )
    }

    #[tool(description = "Update a diary entry. Changing date, quantity_grams or custom_ingredients recomputes nutrition from the current catalog; meal_type and notes do not.")]
    async fn update_entry(
        &self,
        Parameters(p): Parameters<UpdateEntryParams>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let update = EntryUpdateRequest {
            date: p.date,
            meal_type: p.meal_type,
            quantity_grams: p.quantity_grams,
            custom_ingredients: p
                .custom_ingredients
                .map(|list| list.into_iter().map(Into::into).collect()),
            notes: p.notes,
        };
        respond(diary::update_entry(&self.database, self.user_id, p.id, update, &ctx.ct).await)
    }

    #[tool(description = "Delete a diary entry")]
    fn delete_entry(&self, Parameters(p): Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        respond(diary::delete_entry(&self.database, self.user_id, p.id))
    }

    // --- Goals ---

    #[tool(description = "Set daily nutrient targets, replacing the active goal")]
    fn set_goal(&self, Parameters(p): Parameters<SetGoalParams>) -> Result<CallToolResult, McpError> {
        let request = SetGoalRequest {
            calories: p.calories,
            protein: p.protein,
            carbs: p.carbs,
            fat: p.fat,
            fiber: p.fiber,
            start_date: p.start_date,
            end_date: p.end_date,
        };
        respond(goals::set_goal(&self.database, self.user_id, request, today()))
    }

    #[tool(description = "Get the active goal and whether it applies to a date")]
    fn get_goal(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        respond(
            date_or_today(p.date.as_deref())
                .and_then(|date| goals::get_goal(&self.database, self.user_id, date)),
        )
    }

    // --- Summaries ---

    #[tool(description = "Daily totals, goal adherence percent per nutrient, and routine/contextual calorie split")]
    fn daily_summary(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        respond(
            date_or_today(p.date.as_deref())
                .and_then(|date| summaries::daily_summary(&self.database, self.user_id, date)),
        )
    }

    #[tool(description = "Routine share per day for the Monday-first week containing a date")]
    fn weekly_summary(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        respond(
            date_or_today(p.date.as_deref())
                .and_then(|date| summaries::weekly_summary(&self.database, self.user_id, date)),
        )
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriLogService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrilog".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriLog".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriLog - food, recipe and diary nutrition tracking. \
                 Call logging_instructions before logging entries. \
                 All quantities are grams; food values are per 100g."
                    .into(),
            ),
        }
    }
}
