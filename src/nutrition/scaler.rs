//! Nutrient scaling
//!
//! Turns a per-100g profile and a gram quantity into consumed nutrition.

use crate::error::{NutritionError, NutritionResult};
use crate::models::Nutrition;

/// Upper bound on any single quantity; larger values are input mistakes
pub const MAX_QUANTITY_GRAMS: f64 = 100_000.0;

/// Reject non-finite, non-positive and oversized quantities
pub fn validate_quantity(grams: f64, field: &str) -> NutritionResult<f64> {
    if !grams.is_finite() || grams <= 0.0 {
        return Err(NutritionError::invalid(format!(
            "{} must be greater than 0 (got {})",
            field, grams
        )));
    }
    if grams > MAX_QUANTITY_GRAMS {
        return Err(NutritionError::invalid(format!(
            "{} must not exceed {}g (got {})",
            field, MAX_QUANTITY_GRAMS, grams
        )));
    }
    Ok(grams)
}

/// Scale a per-100g profile to `grams`. No rounding happens here.
pub fn scale(profile: &Nutrition, grams: f64) -> NutritionResult<Nutrition> {
    let grams = validate_quantity(grams, "quantity_grams")?;
    Ok(profile.scale(grams / 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scale_is_linear_per_field() {
        let chicken = Nutrition::new(165.0, 31.0, 0.0, 3.6, 0.0);
        let scaled = scale(&chicken, 150.0).unwrap();
        assert!(close(scaled.calories, 247.5));
        assert!(close(scaled.protein, 46.5));
        assert!(close(scaled.fat, 5.4));
        assert_eq!(scaled.carbs, 0.0);
    }

    #[test]
    fn test_scale_keeps_full_precision() {
        let profile = Nutrition::new(33.333, 1.111, 0.0, 0.0, 0.0);
        let scaled = scale(&profile, 3.0).unwrap();
        assert!(close(scaled.calories, 0.99999));
    }

    #[test]
    fn test_rejects_bad_quantities() {
        let profile = Nutrition::new(100.0, 0.0, 0.0, 0.0, 0.0);
        for grams in [0.0, -5.0, f64::NAN, f64::INFINITY, MAX_QUANTITY_GRAMS + 1.0] {
            let err = scale(&profile, grams).unwrap_err();
            assert!(matches!(err, NutritionError::InvalidInput(_)), "grams {}", grams);
        }
        assert!(scale(&profile, MAX_QUANTITY_GRAMS).is_ok());
    }
}
