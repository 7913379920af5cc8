use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Headline categories supported by the news API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 7] = [
        NewsCategory::Business,
        NewsCategory::Entertainment,
        NewsCategory::General,
        NewsCategory::Health,
        NewsCategory::Science,
        NewsCategory::Sports,
        NewsCategory::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Business => "business",
            NewsCategory::Entertainment => "entertainment",
            NewsCategory::General => "general",
            NewsCategory::Health => "health",
            NewsCategory::Science => "science",
            NewsCategory::Sports => "sports",
            NewsCategory::Technology => "technology",
        }
    }
}

impl Display for NewsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = String;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        NewsCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Body of `PUT /api/usercategory`
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySelection {
    pub categories: Vec<NewsCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Sports".parse::<NewsCategory>(), Ok(NewsCategory::Sports));
        assert_eq!(
            "technology".parse::<NewsCategory>(),
            Ok(NewsCategory::Technology)
        );
        assert!("weather".parse::<NewsCategory>().is_err());
    }

    #[test]
    fn test_serialization_matches_api_names() {
        let json = serde_json::to_string(&NewsCategory::Entertainment).unwrap();
        assert_eq!(json, "\"entertainment\"");
        for category in NewsCategory::ALL {
            assert_eq!(category.to_string(), category.as_str());
        }
    }
}
