//! # Consolidation Engine
//!
//! Merges the ingredient requirements of several recipes into one shopping
//! list, removes what the pantry already covers, and reports a summary.
//!
//! ## Algorithm
//!
//! 1. Flatten ingredients from all recipes, in selection order
//! 2. Group occurrences by identity key (trimmed, lower-cased name); the first
//!    occurrence supplies the display name
//! 3. Merge each group's quantities according to the [`QuantityMergePolicy`]
//! 4. Groups found in the pantry become skipped ingredients; the rest become
//!    shopping items with sequential [`ItemId`]s in first-seen order
//!
//! Quantities are opaque text. No unit parsing or arithmetic is attempted.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ingredient_model::{ingredient_key, Ingredient, PantryInventory, Recipe};

/// Separator placed between distinct quantities of a merged ingredient
pub const QUANTITY_SEPARATOR: &str = ", ";

/// Stable identity of a shopping item within one consolidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How differing quantities of the same ingredient are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuantityMergePolicy {
    /// Join distinct quantity strings in first-seen order ("2 cups, 1 tbsp")
    #[default]
    Concatenate,
    /// Keep the first-seen quantity; the occurrence count is still recorded
    KeepFirst,
}

impl FromStr for QuantityMergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concatenate" => Ok(QuantityMergePolicy::Concatenate),
            "keep-first" | "keep_first" => Ok(QuantityMergePolicy::KeepFirst),
            other => Err(format!("unknown quantity merge policy: {other}")),
        }
    }
}

/// One line of the shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Identity used by progress tracking; survives re-sorting
    pub id: ItemId,
    /// Display name from the first occurrence
    pub name: String,
    /// Merged quantity text
    pub quantity: String,
    /// Number of recipe occurrences merged into this item
    pub occurrences: usize,
}

impl ShoppingItem {
    /// Identity key of the item's name
    pub fn key(&self) -> String {
        ingredient_key(&self.name)
    }

    /// The item as a plain ingredient
    pub fn to_ingredient(&self) -> Ingredient {
        Ingredient::new(&self.name, &self.quantity)
    }
}

impl fmt::Display for ShoppingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.quantity)
    }
}

/// Deduplicated, pantry-subtracted list of items to buy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Reordered copy of an existing list; identities must stay unique
    pub(crate) fn from_items(items: Vec<ShoppingItem>) -> Self {
        Self { items }
    }

    /// Items in consolidation order
    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShoppingItem> {
        self.items.iter()
    }

    /// Look up an item by identity
    pub fn get(&self, id: ItemId) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Check whether an identity belongs to this list
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Item identities in consolidation order
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// The list as plain ingredients, as the grocery-list service returns them
    pub fn to_ingredients(&self) -> Vec<Ingredient> {
        self.items.iter().map(ShoppingItem::to_ingredient).collect()
    }
}

impl<'a> IntoIterator for &'a ShoppingList {
    type Item = &'a ShoppingItem;
    type IntoIter = std::slice::Iter<'a, ShoppingItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Counts describing a consolidation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationSummary {
    /// Ingredient occurrences across all recipes, before merging
    pub total_recipe_ingredients: usize,
    /// Entries in the resulting shopping list
    pub total_items_needed: usize,
    /// Distinct ingredient names already covered by the pantry
    pub items_already_available: usize,
    /// Merged ingredients excluded because the pantry has them
    pub skipped_ingredients: Vec<Ingredient>,
    /// True when nothing needs to be bought
    pub is_empty: bool,
}

impl ConsolidationSummary {
    /// Distinct ingredient names requested across all recipes
    pub fn distinct_ingredients_requested(&self) -> usize {
        self.total_items_needed + self.items_already_available
    }
}

/// Result of a consolidation: the shopping list and its summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consolidation {
    pub list: ShoppingList,
    pub summary: ConsolidationSummary,
}

/// Occurrences of one ingredient key, in first-seen order
struct IngredientGroup {
    name: String,
    key: String,
    quantities: Vec<String>,
    occurrences: usize,
}

impl IngredientGroup {
    fn new(ingredient: &Ingredient, key: String) -> Self {
        Self {
            name: ingredient.name.trim().to_string(),
            key,
            quantities: vec![ingredient.quantity.trim().to_string()],
            occurrences: 1,
        }
    }

    fn absorb(&mut self, ingredient: &Ingredient) {
        self.occurrences += 1;
        let quantity = ingredient.quantity.trim();
        if !self.quantities.iter().any(|q| q == quantity) {
            self.quantities.push(quantity.to_string());
        }
    }

    fn merged_quantity(&self, policy: QuantityMergePolicy) -> String {
        match policy {
            QuantityMergePolicy::Concatenate => self.quantities.join(QUANTITY_SEPARATOR),
            QuantityMergePolicy::KeepFirst => self.quantities.first().cloned().unwrap_or_default(),
        }
    }
}

/// Consolidation engine configured with a quantity merge policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Consolidator {
    policy: QuantityMergePolicy,
}

impl Consolidator {
    /// Create a consolidator with the given merge policy
    pub fn new(policy: QuantityMergePolicy) -> Self {
        Self { policy }
    }

    /// The configured merge policy
    pub fn policy(&self) -> QuantityMergePolicy {
        self.policy
    }

    /// Consolidate the ingredients of the selected recipes against a pantry
    ///
    /// An empty selection produces an empty list with `is_empty = true`.
    pub fn consolidate(&self, recipes: &[Recipe], pantry: &PantryInventory) -> Consolidation {
        info!("Consolidating {} recipes against {} pantry items", recipes.len(), pantry.len());
        self.consolidate_ingredients(recipes.iter().flat_map(|recipe| recipe.ingredients.iter()), pantry)
    }

    /// Consolidate an already flattened ingredient sequence against a pantry
    ///
    /// Used for weekly-plan grocery lists, which arrive pre-flattened.
    pub fn consolidate_ingredients<'a, I>(&self, ingredients: I, pantry: &PantryInventory) -> Consolidation
    where
        I: IntoIterator<Item = &'a Ingredient>,
    {
        let mut groups: Vec<IngredientGroup> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();
        let mut total_recipe_ingredients = 0;

        for ingredient in ingredients {
            total_recipe_ingredients += 1;
            let key = ingredient.key();

            match index_by_key.get(&key) {
                Some(&index) => groups[index].absorb(ingredient),
                None => {
                    index_by_key.insert(key.clone(), groups.len());
                    groups.push(IngredientGroup::new(ingredient, key));
                }
            }
        }

        let mut items = Vec::new();
        let mut skipped_ingredients = Vec::new();

        for group in &groups {
            let quantity = group.merged_quantity(self.policy);

            if pantry.contains(&group.key) {
                debug!("Skipping '{}': already in pantry", group.name);
                skipped_ingredients.push(Ingredient::new(&group.name, &quantity));
            } else {
                let id = ItemId(items.len() as u32 + 1);
                items.push(ShoppingItem {
                    id,
                    name: group.name.clone(),
                    quantity,
                    occurrences: group.occurrences,
                });
            }
        }

        let summary = ConsolidationSummary {
            total_recipe_ingredients,
            total_items_needed: items.len(),
            items_already_available: skipped_ingredients.len(),
            skipped_ingredients,
            is_empty: items.is_empty(),
        };

        info!(
            "Consolidated {} ingredient occurrences into {} items ({} already available)",
            summary.total_recipe_ingredients, summary.total_items_needed, summary.items_already_available
        );

        Consolidation {
            list: ShoppingList { items },
            summary,
        }
    }
}

/// Consolidate recipes with the default merge policy
pub fn consolidate(recipes: &[Recipe], pantry: &PantryInventory) -> Consolidation {
    Consolidator::default().consolidate(recipes, pantry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn recipe(name: &str, ingredients: &[(&str, &str)]) -> Recipe {
        Recipe::new(
            name,
            ingredients.iter().map(|(n, q)| Ingredient::new(n, q)).collect(),
            vec![],
        )
    }

    #[test]
    fn test_empty_selection_is_not_an_error() {
        let result = consolidate(&[], &PantryInventory::new());

        assert!(result.list.is_empty());
        assert!(result.summary.is_empty);
        assert_eq!(result.summary.total_recipe_ingredients, 0);
        assert_eq!(result.summary.total_items_needed, 0);
        assert_eq!(result.summary.items_already_available, 0);
        assert!(result.summary.skipped_ingredients.is_empty());
    }

    #[test]
    fn test_case_insensitive_merge() {
        let recipes = vec![
            recipe("Stir Fry", &[("Garlic", "2 cloves")]),
            recipe("Pasta", &[("garlic", "2 cloves")]),
        ];
        let result = consolidate(&recipes, &PantryInventory::new());

        assert_eq!(result.list.len(), 1);
        let item = &result.list.items()[0];
        assert_eq!(item.name, "Garlic");
        assert_eq!(item.quantity, "2 cloves");
        assert_eq!(item.occurrences, 2);
        assert_eq!(result.summary.total_recipe_ingredients, 2);
    }

    #[test]
    fn test_concatenates_distinct_quantities() {
        let recipes = vec![
            recipe("A", &[("Milk", "2 cups")]),
            recipe("B", &[("milk ", "1 tbsp"), ("MILK", "2 cups")]),
        ];
        let result = consolidate(&recipes, &PantryInventory::new());

        assert_eq!(result.list.len(), 1);
        assert_eq!(result.list.items()[0].quantity, "2 cups, 1 tbsp");
        assert_eq!(result.list.items()[0].occurrences, 3);
    }

    #[test]
    fn test_keep_first_policy() {
        let recipes = vec![
            recipe("A", &[("Milk", "2 cups")]),
            recipe("B", &[("milk", "1 tbsp")]),
        ];
        let result = Consolidator::new(QuantityMergePolicy::KeepFirst)
            .consolidate(&recipes, &PantryInventory::new());

        assert_eq!(result.list.items()[0].quantity, "2 cups");
        assert_eq!(result.list.items()[0].occurrences, 2);
    }

    #[test]
    fn test_pantry_subtraction() {
        let recipes = vec![recipe("Chicken Rice", &[("Rice", "1 cup"), ("Chicken", "1 lb")])];
        let pantry = PantryInventory::from_names(["rice"]);
        let result = consolidate(&recipes, &pantry);

        let names: Vec<&str> = result.list.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken"]);
        assert_eq!(result.summary.items_already_available, 1);
        assert_eq!(result.summary.skipped_ingredients, vec![Ingredient::new("Rice", "1 cup")]);
        assert!(!result.summary.is_empty);
    }

    #[test]
    fn test_pantry_covers_everything() {
        let recipes = vec![recipe("Toast", &[("Bread", "2 slices"), ("Butter", "1 tbsp")])];
        let pantry = PantryInventory::from_input("bread, butter");
        let result = consolidate(&recipes, &pantry);

        assert!(result.list.is_empty());
        assert!(result.summary.is_empty);
        assert_eq!(result.summary.items_already_available, 2);
        assert_eq!(result.summary.total_recipe_ingredients, 2);
    }

    #[test]
    fn test_first_seen_order_and_ids() {
        let recipes = vec![
            recipe("A", &[("Onion", "1"), ("Salt", "pinch")]),
            recipe("B", &[("Pepper", "pinch"), ("onion", "2")]),
        ];
        let pantry = PantryInventory::from_names(["salt"]);
        let result = consolidate(&recipes, &pantry);

        let names: Vec<&str> = result.list.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Onion", "Pepper"]);
        assert_eq!(result.list.ids(), vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn test_distinct_name_invariant() {
        let recipes = vec![
            recipe("A", &[("Rice", "1 cup"), ("Chicken", "1 lb"), ("Garlic", "2")]),
            recipe("B", &[("rice", "2 cups"), ("Beef", "1 lb"), ("GARLIC", "1")]),
            recipe("C", &[("Salt", "pinch"), ("Beef ", "200g")]),
        ];
        let pantry = PantryInventory::from_names(["rice", "salt", "flour"]);
        let result = consolidate(&recipes, &pantry);

        let distinct: HashSet<String> = recipes
            .iter()
            .flat_map(|r| r.ingredients.iter().map(Ingredient::key))
            .collect();

        assert_eq!(
            result.list.len() + result.summary.items_already_available,
            distinct.len()
        );
        assert_eq!(result.summary.distinct_ingredients_requested(), distinct.len());
        assert_eq!(result.summary.total_recipe_ingredients, 8);
    }

    #[test]
    fn test_consolidate_flat_ingredients() {
        let grocery = vec![
            Ingredient::new("Eggs", "12"),
            Ingredient::new("eggs", "6"),
            Ingredient::new("Spinach", "1 bag"),
        ];
        let result = Consolidator::default().consolidate_ingredients(&grocery, &PantryInventory::new());

        assert_eq!(result.list.len(), 2);
        assert_eq!(result.list.items()[0].quantity, "12, 6");
    }

    #[test]
    fn test_list_lookup() {
        let recipes = vec![recipe("A", &[("Apple", "2")])];
        let result = consolidate(&recipes, &PantryInventory::new());

        assert!(result.list.contains(ItemId(1)));
        assert!(!result.list.contains(ItemId(2)));
        assert_eq!(result.list.get(ItemId(1)).map(|i| i.name.as_str()), Some("Apple"));
        assert_eq!(result.list.to_ingredients(), vec![Ingredient::new("Apple", "2")]);
    }

    #[test]
    fn test_merge_policy_parsing() {
        assert_eq!(
            "concatenate".parse::<QuantityMergePolicy>(),
            Ok(QuantityMergePolicy::Concatenate)
        );
        assert_eq!(
            "Keep-First".parse::<QuantityMergePolicy>(),
            Ok(QuantityMergePolicy::KeepFirst)
        );
        assert!("sum".parse::<QuantityMergePolicy>().is_err());
    }
}
