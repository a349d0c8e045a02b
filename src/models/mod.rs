//! Data models
//!
//! Rust structs representing database entities.

mod diary_entry;
mod food;
mod goal;
mod nutrition;
mod recipe;
mod recipe_ingredient;
mod tag;

pub use diary_entry::{
    CustomIngredient, DiaryEntry, DiaryEntryCreate, EntrySource, InlineFood, MealType,
    NutritionSnapshot, SnapshotUpdate, DATE_FORMAT,
};
pub use food::{Food, FoodCreate, FoodUpdate};
pub use goal::{NutritionGoal, NutritionGoalCreate};
pub use nutrition::{round2, Nutrition};
pub use recipe::{Recipe, RecipeCreate};
pub use recipe_ingredient::{RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail};
pub use tag::CategoryTag;
