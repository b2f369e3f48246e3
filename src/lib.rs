//! # SmartMeal Grocery Engine
//!
//! Turns selected recipes into a consolidated shopping list: ingredients are
//! merged by name, items already in the pantry are left out, and each entry
//! can be checked off while shopping. Lists can be viewed alphabetically or
//! grouped by grocery aisle category.
//!
//! Recipes and weekly meal plans come from an external generation service
//! reached through [`recipe_client::RecipeServiceClient`]; everything else
//! runs locally and never fails on empty input.

pub mod category;
pub mod config;
pub mod consolidation;
pub mod errors;
pub mod ingredient_model;
pub mod localization;
pub mod recipe_client;
pub mod session;
pub mod shopping_progress;
pub mod sort_filter;
