//! # Sort and Filter Module
//!
//! Display ordering for shopping lists and dietary filtering for recipe
//! collections.
//!
//! Both sorts are stable: items comparing equal keep their consolidation
//! order. Dietary filtering is a name-substring heuristic, not a structured
//! tag match; it sits behind [`RecipeTagMatcher`] so it can be replaced.

use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::category::{CategoryClassifier, KeywordClassifier};
use crate::consolidation::ShoppingList;
use crate::ingredient_model::Recipe;

/// Tag value that disables recipe filtering
pub const ALL_RECIPES_TAG: &str = "all";

/// Display order for a shopping list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Alphabetical,
    Category,
}

impl SortOrder {
    /// Sort a list in this order using the default classifier
    pub fn apply(&self, list: &ShoppingList) -> ShoppingList {
        match self {
            SortOrder::Alphabetical => sort_alphabetical(list),
            SortOrder::Category => sort_by_category(list),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alphabetical" | "name" => Ok(SortOrder::Alphabetical),
            "category" => Ok(SortOrder::Category),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Sort items by case-insensitive name
pub fn sort_alphabetical(list: &ShoppingList) -> ShoppingList {
    let mut items = list.items().to_vec();
    items.sort_by_cached_key(|item| item.name.trim().to_lowercase());
    ShoppingList::from_items(items)
}

/// Sort items by category precedence (meat, dairy, produce, grains, other)
pub fn sort_by_category(list: &ShoppingList) -> ShoppingList {
    sort_by_category_with(list, &KeywordClassifier)
}

/// Sort items by category precedence using a custom classifier
pub fn sort_by_category_with(list: &ShoppingList, classifier: &dyn CategoryClassifier) -> ShoppingList {
    let mut items = list.items().to_vec();
    items.sort_by_cached_key(|item| classifier.classify(&item.name).rank());
    ShoppingList::from_items(items)
}

/// Decides whether a recipe carries a dietary tag
pub trait RecipeTagMatcher {
    fn matches(&self, recipe: &Recipe, tag: &str) -> bool;
}

/// Matches when the recipe name contains the tag, ignoring case
///
/// A recipe named "Vegan-Free Chicken" matches "vegan"; that false positive
/// is accepted behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSubstringMatcher;

impl RecipeTagMatcher for NameSubstringMatcher {
    fn matches(&self, recipe: &Recipe, tag: &str) -> bool {
        recipe
            .recipe_name
            .to_lowercase()
            .contains(&tag.to_lowercase())
    }
}

/// Keep recipes whose name contains `tag`; `"all"` keeps everything in order
pub fn filter_recipes_by_tag<'a>(recipes: &'a [Recipe], tag: &str) -> Vec<&'a Recipe> {
    filter_recipes_with(recipes, tag, &NameSubstringMatcher)
}

/// Filter recipes with a custom tag matcher
pub fn filter_recipes_with<'a>(
    recipes: &'a [Recipe],
    tag: &str,
    matcher: &dyn RecipeTagMatcher,
) -> Vec<&'a Recipe> {
    let tag = tag.trim();
    if tag.eq_ignore_ascii_case(ALL_RECIPES_TAG) {
        return recipes.iter().collect();
    }

    let filtered: Vec<&Recipe> = recipes
        .iter()
        .filter(|recipe| matcher.matches(recipe, tag))
        .collect();

    debug!("Filter '{}' kept {} of {} recipes", tag, filtered.len(), recipes.len());
    filtered
}
