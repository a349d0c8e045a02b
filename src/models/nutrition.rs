//! Shared nutrition data structure
//!
//! Used for per-100g food profiles, derived recipe totals, diary snapshots
//! and goal targets.

use serde::{Deserialize, Serialize};

/// A nutrient vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,     // kcal
    pub protein: f64,      // grams
    pub carbs: f64,        // grams
    pub fat: f64,          // grams
    pub fiber: f64,        // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64, fiber: f64) -> Self {
        Self { calories, protein, carbs, fat, fiber }
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
            fiber: self.fiber * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
            fiber: self.fiber + other.fiber,
        }
    }

    /// Copy with every field rounded to two decimals.
    ///
    /// Only response builders call this; sums are always taken over the
    /// unrounded values.
    pub fn rounded(&self) -> Self {
        Self {
            calories: round2(self.calories),
            protein: round2(self.protein),
            carbs: round2(self.carbs),
            fat: round2(self.fat),
            fiber: round2(self.fiber),
        }
    }

    pub fn values(&self) -> [f64; 5] {
        [self.calories, self.protein, self.carbs, self.fat, self.fiber]
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(247.499), 247.5);
        assert_eq!(round2(45.2537), 45.25);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_sum_and_scale() {
        let a = Nutrition::new(100.0, 10.0, 20.0, 5.0, 1.0);
        let b = Nutrition::new(50.0, 5.0, 0.0, 2.5, 0.5);
        let total: Nutrition = vec![a, b].into_iter().sum();
        assert_eq!(total, Nutrition::new(150.0, 15.0, 20.0, 7.5, 1.5));
        assert_eq!(total * 2.0, Nutrition::new(300.0, 30.0, 40.0, 15.0, 3.0));
    }

    #[test]
    fn test_rounded_leaves_original_untouched() {
        let n = Nutrition::new(1.005_1, 2.344, 0.0, 0.0, 0.0);
        let r = n.rounded();
        assert_eq!(r.calories, 1.01);
        assert_eq!(r.protein, 2.34);
        assert_eq!(n.calories, 1.005_1);
    }
}
