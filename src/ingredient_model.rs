//! # Ingredient and Recipe Data Model
//!
//! This module defines the data structures consumed by the grocery engine:
//! ingredients as produced by the recipe service, recipes, and the pantry
//! inventory the user already has on hand.
//!
//! ## Core Concepts
//!
//! - **Ingredient**: A named item with a free-form quantity string ("2 lbs", "1 cup")
//! - **Identity key**: The trimmed, lower-cased name. Two ingredients are the same
//!   item for merge and pantry purposes when their keys match; quantity is ignored
//! - **Recipe**: A named list of ingredients plus instruction steps
//! - **Pantry**: The set of ingredient keys the user already has
//!
//! ## Usage
//!
//! ```rust
//! use smartmeal::ingredient_model::{Ingredient, PantryInventory};
//!
//! let garlic = Ingredient::new("Garlic", "2 cloves");
//! assert_eq!(garlic.key(), "garlic");
//!
//! let pantry = PantryInventory::from_input("garlic, rice");
//! assert!(pantry.contains("  GARLIC "));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Quantity used when the producer omits one
pub const DEFAULT_QUANTITY: &str = "some";

/// Minimum estimated cooking time in minutes
pub const MIN_COOKING_MINUTES: usize = 15;

/// Estimated minutes per instruction step
pub const MINUTES_PER_STEP: usize = 5;

fn default_quantity() -> String {
    DEFAULT_QUANTITY.to_string()
}

/// Normalize an ingredient name into its identity key
pub fn ingredient_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// An ingredient as returned by the recipe service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Display name, casing preserved as supplied (e.g., "Chicken Breast")
    pub name: String,

    /// Opaque quantity text (e.g., "2 lbs", "to taste")
    #[serde(default = "default_quantity")]
    pub quantity: String,
}

/// A recipe as returned by the recipe service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique name within one generation batch
    pub recipe_name: String,

    /// Ingredients in the order the recipe lists them
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    /// Preparation steps
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// Rough difficulty derived from the number of instruction steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Up to 4 steps
    Easy,
    /// 5 to 7 steps
    Medium,
    /// More than 7 steps
    Hard,
}

/// Ingredient names the user already has, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PantryInventory {
    keys: HashSet<String>,
}

impl Ingredient {
    /// Create a new ingredient
    pub fn new(name: &str, quantity: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: quantity.to_string(),
        }
    }

    /// Identity key used for merging and pantry lookups
    pub fn key(&self) -> String {
        ingredient_key(&self.name)
    }

    /// Check whether two ingredients refer to the same item
    pub fn same_item(&self, other: &Ingredient) -> bool {
        self.key() == other.key()
    }
}

impl Recipe {
    /// Create a new recipe
    pub fn new(recipe_name: &str, ingredients: Vec<Ingredient>, instructions: Vec<String>) -> Self {
        Self {
            recipe_name: recipe_name.to_string(),
            ingredients,
            instructions,
        }
    }

    /// Number of instruction steps
    pub fn step_count(&self) -> usize {
        self.instructions.len()
    }

    /// Estimated cooking time: 5 minutes per step, at least 15 minutes
    pub fn estimated_minutes(&self) -> usize {
        (self.step_count() * MINUTES_PER_STEP).max(MIN_COOKING_MINUTES)
    }

    /// Difficulty level derived from the step count
    pub fn difficulty(&self) -> Difficulty {
        match self.step_count() {
            0..=4 => Difficulty::Easy,
            5..=7 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl Difficulty {
    /// Get a human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl PantryInventory {
    /// Create an empty pantry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pantry from free-text input separated by commas
    ///
    /// Blank entries are dropped, so `"chicken, rice ,, onion"` yields three items.
    pub fn from_input(input: &str) -> Self {
        Self::from_names(parse_ingredient_input(input))
    }

    /// Build a pantry from a list of names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = names
            .into_iter()
            .map(|name| ingredient_key(name.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }

    /// Check whether the pantry holds an ingredient with this name
    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&ingredient_key(name))
    }

    /// Number of distinct pantry items
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the pantry is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pantry keys in sorted order, as sent to the grocery-list service
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys.iter().cloned().collect();
        names.sort();
        names
    }
}

/// Split comma-separated ingredient input into trimmed, non-empty names
pub fn parse_ingredient_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.quantity)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} mins, {})",
            self.recipe_name,
            self.estimated_minutes(),
            self.difficulty()
        )?;

        for ingredient in &self.ingredients {
            writeln!(f, "  • {}", ingredient)?;
        }

        Ok(())
    }
}
