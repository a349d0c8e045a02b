//! Engine error taxonomy
//!
//! Every failure is classifiable as bad input, a dangling reference, an
//! ownership violation, a cancelled request, or an internal fault, so the
//! request layer can pick a status without matching on individual variants.

use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Food not found with id: {0}")]
    FoodNotFound(i64),

    #[error("Recipe not found with id: {0}")]
    RecipeNotFound(i64),

    #[error("Diary entry not found with id: {0}")]
    EntryNotFound(i64),

    #[error("No active nutrition goal")]
    GoalNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`NutritionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl NutritionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        NutritionError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NutritionError::InvalidInput(_) => ErrorKind::InvalidInput,
            NutritionError::FoodNotFound(_)
            | NutritionError::RecipeNotFound(_)
            | NutritionError::EntryNotFound(_)
            | NutritionError::GoalNotFound => ErrorKind::NotFound,
            NutritionError::Forbidden(_) => ErrorKind::Forbidden,
            NutritionError::Cancelled => ErrorKind::Cancelled,
            NutritionError::Database(_) | NutritionError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for NutritionError {
    fn from(e: rusqlite::Error) -> Self {
        NutritionError::Database(DbError::Sqlite(e))
    }
}

impl From<r2d2::Error> for NutritionError {
    fn from(e: r2d2::Error) -> Self {
        NutritionError::Database(DbError::Connection(e))
    }
}

impl From<tokio::task::JoinError> for NutritionError {
    fn from(e: tokio::task::JoinError) -> Self {
        NutritionError::Internal(format!("blocking task failed: {}", e))
    }
}

pub type NutritionResult<T> = Result<T, NutritionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(NutritionError::invalid("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(NutritionError::FoodNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(NutritionError::RecipeNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(NutritionError::Forbidden("x".into()).kind(), ErrorKind::Forbidden);
        assert_eq!(
            NutritionError::from(DbError::Sqlite(rusqlite::Error::InvalidQuery)).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_name_the_reference() {
        assert_eq!(NutritionError::FoodNotFound(42).to_string(), "Food not found with id: 42");
    }
}
