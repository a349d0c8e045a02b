//! Category tags
//!
//! Classifies foods and recipes as routine (planned), contextual (ad hoc)
//! or general for the routine-vs-contextual calorie breakdown.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTag {
    Routine,
    Contextual,
    #[default]
    General,
}

impl CategoryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::Routine => "routine",
            CategoryTag::Contextual => "contextual",
            CategoryTag::General => "general",
        }
    }

    /// Strict parse; unknown strings are `None` so callers can reject them
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "routine" => Some(CategoryTag::Routine),
            "contextual" => Some(CategoryTag::Contextual),
            "general" => Some(CategoryTag::General),
            _ => None,
        }
    }

    /// Lenient parse for values read back from the database
    pub fn from_str(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(CategoryTag::parse("Routine"), Some(CategoryTag::Routine));
        assert_eq!(CategoryTag::parse(" contextual "), Some(CategoryTag::Contextual));
        assert_eq!(CategoryTag::parse("weekly"), None);
        assert_eq!(CategoryTag::from_str("weekly"), CategoryTag::General);
    }
}
