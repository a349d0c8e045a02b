//! Input validation helpers
//!
//! Run before any catalog lookup or write so bad requests leave no side
//! effects behind.

use chrono::NaiveDate;

use crate::error::{NutritionError, NutritionResult};
use crate::models::{CategoryTag, MealType, Nutrition, DATE_FORMAT};

pub fn parse_date(raw: &str) -> NutritionResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        NutritionError::invalid(format!("date must be formatted YYYY-MM-DD (got '{}')", raw))
    })
}

pub fn parse_meal_type(raw: &str) -> NutritionResult<MealType> {
    MealType::parse(raw).ok_or_else(|| {
        NutritionError::invalid(format!(
            "meal_type must be breakfast, lunch, dinner or snack (got '{}')",
            raw
        ))
    })
}

pub fn parse_tag(raw: &str) -> NutritionResult<CategoryTag> {
    CategoryTag::parse(raw).ok_or_else(|| {
        NutritionError::invalid(format!(
            "tag must be routine, contextual or general (got '{}')",
            raw
        ))
    })
}

/// Trimmed, non-empty name
pub fn validate_name(raw: &str, field: &str) -> NutritionResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(NutritionError::invalid(format!("{} cannot be empty", field)));
    }
    Ok(name.to_string())
}

/// Nutrient values must be finite and non-negative
pub fn validate_profile(profile: &Nutrition, field: &str) -> NutritionResult<()> {
    const NAMES: [&str; 5] = ["calories", "protein", "carbs", "fat", "fiber"];
    for (name, value) in NAMES.iter().zip(profile.values()) {
        if !value.is_finite() || value < 0.0 {
            return Err(NutritionError::invalid(format!(
                "{}.{} must be a non-negative number (got {})",
                field, name, value
            )));
        }
    }
    Ok(())
}

/// Clamp list paging the same way for every listing
pub fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, 200), offset.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-03-09").unwrap(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert!(parse_date("09/03/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }

    #[test]
    fn test_validate_profile() {
        assert!(validate_profile(&Nutrition::new(1.0, 0.0, 0.0, 0.0, 0.0), "food").is_ok());
        let err = validate_profile(&Nutrition::new(1.0, -2.0, 0.0, 0.0, 0.0), "food").unwrap_err();
        assert!(err.to_string().contains("food.protein"));
        assert!(validate_profile(&Nutrition::new(f64::NAN, 0.0, 0.0, 0.0, 0.0), "food").is_err());
    }

    #[test]
    fn test_names_and_enums() {
        assert_eq!(validate_name("  Oats ", "name").unwrap(), "Oats");
        assert!(validate_name("   ", "name").is_err());
        assert_eq!(parse_meal_type("Dinner").unwrap(), MealType::Dinner);
        assert!(parse_meal_type("brunch").is_err());
        assert!(parse_tag("weekly").is_err());
        assert_eq!(clamp_page(0, -3), (1, 0));
        assert_eq!(clamp_page(500, 10), (200, 10));
    }
}
