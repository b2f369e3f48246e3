//! # Category Classifier Module
//!
//! Maps an ingredient name to a shopping-aisle category by keyword matching.
//!
//! Keywords match anywhere in the lower-cased name, so "strawberry" lands in
//! produce via "berry". Categories are tested in a fixed precedence order and
//! the first hit wins: a name matching both dairy and produce keywords
//! ("strawberry yogurt") is dairy.

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords identifying meat and fish
pub const MEAT_KEYWORDS: &[&str] = &["chicken", "beef", "pork", "fish", "salmon", "turkey"];
/// Keywords identifying dairy products
pub const DAIRY_KEYWORDS: &[&str] = &["milk", "cheese", "yogurt", "butter"];
/// Keywords identifying fresh produce
pub const PRODUCE_KEYWORDS: &[&str] = &["apple", "banana", "orange", "berry", "grape"];
/// Keywords identifying grains and bakery items
pub const GRAINS_KEYWORDS: &[&str] = &["bread", "pasta", "rice", "cereal"];

fn keyword_pattern(keywords: &[&str]) -> String {
    let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    format!("(?:{})", alternatives.join("|"))
}

// Compiled once; names are lower-cased before matching
lazy_static! {
    static ref CATEGORY_PATTERNS: Vec<(Category, Regex)> = [
        (Category::Meat, MEAT_KEYWORDS),
        (Category::Dairy, DAIRY_KEYWORDS),
        (Category::Produce, PRODUCE_KEYWORDS),
        (Category::Grains, GRAINS_KEYWORDS),
    ]
    .iter()
    .map(|(category, keywords)| {
        let regex = Regex::new(&keyword_pattern(keywords))
            .expect("Category keyword pattern should be valid");
        (*category, regex)
    })
    .collect();
}

/// Shopping category, declared in display precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meat,
    Dairy,
    Produce,
    Grains,
    Other,
}

impl Category {
    /// All categories in precedence order
    pub const ALL: [Category; 5] = [
        Category::Meat,
        Category::Dairy,
        Category::Produce,
        Category::Grains,
        Category::Other,
    ];

    /// Lower-case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meat => "meat",
            Category::Dairy => "dairy",
            Category::Produce => "produce",
            Category::Grains => "grains",
            Category::Other => "other",
        }
    }

    /// Position in the display precedence order
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strategy for assigning a category to an ingredient name
///
/// The keyword heuristic is the only implementation today; a structured
/// tagging scheme can replace it without touching sort callers.
pub trait CategoryClassifier {
    fn classify(&self, name: &str) -> Category;
}

/// Substring keyword classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl CategoryClassifier for KeywordClassifier {
    fn classify(&self, name: &str) -> Category {
        classify(name)
    }
}

/// Classify an ingredient name with the default keyword sets
///
/// # Examples
///
/// ```rust
/// use smartmeal::category::{classify, Category};
///
/// assert_eq!(classify("Salmon fillet"), Category::Meat);
/// assert_eq!(classify("strawberry"), Category::Produce);
/// assert_eq!(classify("strawberry yogurt"), Category::Dairy);
/// assert_eq!(classify("olive oil"), Category::Other);
/// ```
pub fn classify(name: &str) -> Category {
    let lower = name.to_lowercase();
    let category = CATEGORY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&lower))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other);

    trace!("Classified '{}' as {}", name, category);
    category
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_keyword_set() {
        for keyword in MEAT_KEYWORDS {
            assert_eq!(classify(keyword), Category::Meat, "{keyword}");
        }
        for keyword in DAIRY_KEYWORDS {
            assert_eq!(classify(keyword), Category::Dairy, "{keyword}");
        }
        for keyword in PRODUCE_KEYWORDS {
            assert_eq!(classify(keyword), Category::Produce, "{keyword}");
        }
        for keyword in GRAINS_KEYWORDS {
            assert_eq!(classify(keyword), Category::Grains, "{keyword}");
        }
    }

    #[test]
    fn test_substring_matching() {
        assert_eq!(classify("strawberry"), Category::Produce);
        assert_eq!(classify("Chicken Breast"), Category::Meat);
        assert_eq!(classify("brown rice"), Category::Grains);
        assert_eq!(classify("buttermilk"), Category::Dairy);
        // "pineapple" contains "apple"
        assert_eq!(classify("pineapple"), Category::Produce);
    }

    #[test]
    fn test_precedence_order() {
        // dairy is checked before produce
        assert_eq!(classify("strawberry yogurt"), Category::Dairy);
        // meat is checked before grains
        assert_eq!(classify("chicken fried rice"), Category::Meat);
        // dairy is checked before grains
        assert_eq!(classify("garlic butter bread"), Category::Dairy);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("BEEF"), Category::Meat);
        assert_eq!(classify("Cheddar Cheese"), Category::Dairy);
    }

    #[test]
    fn test_default_other() {
        assert_eq!(classify("olive oil"), Category::Other);
        assert_eq!(classify("salt"), Category::Other);
        assert_eq!(classify(""), Category::Other);
    }

    #[test]
    fn test_rank_follows_precedence() {
        let ranks: Vec<usize> = Category::ALL.iter().map(Category::rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
        assert!(Category::Meat < Category::Other);
    }

    #[test]
    fn test_classifier_trait() {
        let classifier = KeywordClassifier;
        assert_eq!(classifier.classify("turkey"), Category::Meat);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Produce.to_string(), "produce");
        assert_eq!(serde_json::to_string(&Category::Grains).unwrap(), "\"grains\"");
    }
}
