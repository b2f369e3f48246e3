//! # Shopping Session
//!
//! One user's working state: the pantry snapshot, the generated recipes and
//! which of them are selected, the current shopping list with its checked
//! items, and the latest status message.
//!
//! ## Lifecycle
//!
//! - The pantry snapshot is taken from the ingredients submitted with the last
//!   successful recipe generation
//! - Each consolidation replaces the shopping list wholesale and resets
//!   progress
//! - Failed requests only update the status message; recipes, list and
//!   progress stay as they were
//! - Nothing is persisted; dropping the session discards everything

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::consolidation::{Consolidation, ConsolidationSummary, Consolidator, ItemId, ShoppingList};
use crate::errors::GroceryError;
use crate::ingredient_model::{parse_ingredient_input, PantryInventory, Recipe};
use crate::localization::LocalizationManager;
use crate::recipe_client::{PlanPreferences, RecipeServiceClient, RequestKind, WeeklyPlan};
use crate::shopping_progress::{Progress, ProgressTracker};
use crate::sort_filter::{filter_recipes_by_tag, SortOrder, ALL_RECIPES_TAG};

/// Outcome class of the last user-visible status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// User-visible status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Per-user grocery session
pub struct Session {
    created_at: DateTime<Utc>,
    language: String,
    localization: LocalizationManager,
    consolidator: Consolidator,
    pantry: PantryInventory,
    recipes: Vec<Recipe>,
    selected: Vec<String>,
    diet_filter: String,
    weekly_plan: Option<WeeklyPlan>,
    summary: Option<ConsolidationSummary>,
    remote_summary: Option<ConsolidationSummary>,
    tracker: ProgressTracker,
    sort_order: SortOrder,
    status: Option<StatusMessage>,
}

impl Session {
    /// Start an empty session
    pub fn new(config: &AppConfig, localization: LocalizationManager) -> Self {
        Self {
            created_at: Utc::now(),
            language: config.language.clone(),
            localization,
            consolidator: Consolidator::new(config.quantity_merge),
            pantry: PantryInventory::new(),
            recipes: Vec::new(),
            selected: Vec::new(),
            diet_filter: ALL_RECIPES_TAG.to_string(),
            weekly_plan: None,
            summary: None,
            remote_summary: None,
            tracker: ProgressTracker::default(),
            sort_order: config.default_sort,
            status: None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time elapsed since the session started
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    pub fn pantry(&self) -> &PantryInventory {
        &self.pantry
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn weekly_plan(&self) -> Option<&WeeklyPlan> {
        self.weekly_plan.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    fn t(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.localization
            .get_message_in_language_with_args(key, &self.language, args)
    }

    fn set_success(&mut self, text: String) {
        info!(status = %text, session_age_secs = self.age().num_seconds(), "Status updated");
        self.status = Some(StatusMessage {
            kind: StatusKind::Success,
            text,
        });
    }

    fn set_error(&mut self, text: String) {
        warn!(status = %text, session_age_secs = self.age().num_seconds(), "Status updated");
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text,
        });
    }

    /// Status text for a failed request of the given kind
    fn failure_message(&self, kind: RequestKind, err: &GroceryError) -> String {
        match err {
            GroceryError::RequestInFlight(kind) => {
                let request = kind.to_string();
                self.t("error-request-in-flight", &[("request", request.as_str())])
            }
            GroceryError::Validation(msg) => msg.clone(),
            GroceryError::Protocol(_) => self.t("error-unexpected-format", &[]),
            other => {
                let key = match kind {
                    RequestKind::Recipes => "error-recipes-failed",
                    RequestKind::GroceryList => "error-grocery-list-failed",
                    RequestKind::WeeklyPlan => "error-weekly-plan-failed",
                };
                let message = other.user_message();
                self.t(key, &[("message", message.as_str())])
            }
        }
    }

    /// Generate recipes from comma-separated on-hand ingredients
    ///
    /// On success the recipes replace the previous batch, the selection is
    /// cleared, and the submitted ingredients become the pantry snapshot.
    pub async fn request_recipes(
        &mut self,
        client: &RecipeServiceClient,
        ingredient_input: &str,
        dietary_preferences: &[String],
    ) -> Result<usize, GroceryError> {
        let ingredients = parse_ingredient_input(ingredient_input);
        if ingredients.is_empty() {
            let err = GroceryError::Validation(self.t("error-no-ingredients", &[]));
            self.set_error(err.user_message());
            return Err(err);
        }

        match client.generate_recipes(&ingredients, dietary_preferences).await {
            Ok(recipes) => {
                let count = recipes.len();
                self.pantry = PantryInventory::from_names(&ingredients);
                self.recipes = recipes;
                self.selected.clear();
                self.diet_filter = ALL_RECIPES_TAG.to_string();

                let count_text = count.to_string();
                let text = self.t("recipes-generated", &[("count", count_text.as_str())]);
                self.set_success(text);
                Ok(count)
            }
            Err(err) => {
                let text = self.failure_message(RequestKind::Recipes, &err);
                self.set_error(text);
                Err(err)
            }
        }
    }

    /// Replace the recipe batch directly, e.g. from a saved response
    pub fn load_recipes(&mut self, recipes: Vec<Recipe>, pantry: PantryInventory) {
        info!(recipes_count = recipes.len(), pantry_count = pantry.len(), "Loaded recipes");
        self.recipes = recipes;
        self.pantry = pantry;
        self.selected.clear();
    }

    /// Select or deselect a recipe by name; returns the new selection state
    pub fn toggle_recipe_selection(&mut self, recipe_name: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|name| name == recipe_name) {
            self.selected.remove(pos);
            return false;
        }

        if self.recipes.iter().any(|r| r.recipe_name == recipe_name) {
            self.selected.push(recipe_name.to_string());
            true
        } else {
            false
        }
    }

    pub fn is_selected(&self, recipe_name: &str) -> bool {
        self.selected.iter().any(|name| name == recipe_name)
    }

    /// Selected recipes in the order they were selected
    pub fn selected_recipes(&self) -> Vec<Recipe> {
        self.selected
            .iter()
            .filter_map(|name| self.recipes.iter().find(|r| &r.recipe_name == name))
            .cloned()
            .collect()
    }

    /// Set the dietary tag used by [`Session::visible_recipes`]
    pub fn set_diet_filter(&mut self, tag: &str) {
        self.diet_filter = tag.to_string();
    }

    /// Recipes passing the current dietary filter
    pub fn visible_recipes(&self) -> Vec<&Recipe> {
        filter_recipes_by_tag(&self.recipes, &self.diet_filter)
    }

    /// Install a new list and its summary; progress starts over
    fn install(&mut self, consolidation: Consolidation) -> &ConsolidationSummary {
        let Consolidation { list, summary } = consolidation;
        self.tracker.replace_list(list);
        self.remote_summary = None;
        self.summary.insert(summary)
    }

    /// Build the shopping list locally from the selected recipes
    pub fn consolidate_selected(&mut self) -> Result<&ConsolidationSummary, GroceryError> {
        let selected = self.selected_recipes();
        if selected.is_empty() {
            let err = GroceryError::Validation(self.t("error-no-recipes-selected", &[]));
            self.set_error(err.user_message());
            return Err(err);
        }

        let consolidation = self.consolidator.consolidate(&selected, &self.pantry);
        let count_text = consolidation.list.len().to_string();
        let text = self.t("grocery-list-generated", &[("count", count_text.as_str())]);
        self.set_success(text);

        Ok(self.install(consolidation))
    }

    /// Ask the service for the grocery list of the selected recipes
    ///
    /// The returned items go through local consolidation to assign item
    /// identities, and the summary always describes the installed list. A
    /// summary sent by the service is kept apart in
    /// [`Session::remote_summary`].
    pub async fn request_grocery_list(
        &mut self,
        client: &RecipeServiceClient,
    ) -> Result<usize, GroceryError> {
        let selected = self.selected_recipes();
        if selected.is_empty() {
            let err = GroceryError::Validation(self.t("error-no-recipes-selected", &[]));
            self.set_error(err.user_message());
            return Err(err);
        }

        match client.generate_grocery_list(&selected, &self.pantry).await {
            Ok(response) => {
                let consolidation = self
                    .consolidator
                    .consolidate_ingredients(&response.grocery_list, &self.pantry);

                let count = consolidation.list.len();
                self.install(consolidation);
                self.remote_summary = response.summary;

                let count_text = count.to_string();
                let text = self.t("grocery-list-generated", &[("count", count_text.as_str())]);
                self.set_success(text);
                Ok(count)
            }
            Err(err) => {
                let text = self.failure_message(RequestKind::GroceryList, &err);
                self.set_error(text);
                Err(err)
            }
        }
    }

    /// Generate a weekly plan and shop for its consolidated grocery list
    pub async fn request_weekly_plan(
        &mut self,
        client: &RecipeServiceClient,
        preferences: &PlanPreferences,
    ) -> Result<usize, GroceryError> {
        match client.generate_weekly_plan(preferences).await {
            Ok(plan) => {
                let consolidation = self
                    .consolidator
                    .consolidate_ingredients(&plan.consolidated_grocery_list, &self.pantry);
                let count = consolidation.list.len();
                self.install(consolidation);
                self.weekly_plan = Some(plan);

                let count_text = count.to_string();
                let text = self.t("weekly-plan-generated", &[("count", count_text.as_str())]);
                self.set_success(text);
                Ok(count)
            }
            Err(err) => {
                let text = self.failure_message(RequestKind::WeeklyPlan, &err);
                self.set_error(text);
                Err(err)
            }
        }
    }

    /// The current shopping list in consolidation order
    pub fn shopping_list(&self) -> &ShoppingList {
        self.tracker.list()
    }

    /// Summary of the current consolidation, if one has happened
    pub fn summary(&self) -> Option<&ConsolidationSummary> {
        self.summary.as_ref()
    }

    /// Summary as computed by the service for the last remote grocery list
    pub fn remote_summary(&self) -> Option<&ConsolidationSummary> {
        self.remote_summary.as_ref()
    }

    /// Localized one-line description of the current summary
    pub fn summary_message(&self) -> Option<String> {
        let summary = self.summary.as_ref()?;
        let needed = summary.total_items_needed.to_string();
        let available = summary.items_already_available.to_string();

        let message = if summary.is_empty {
            self.t("summary-all-available", &[("available", available.as_str())])
        } else {
            self.t(
                "summary-items-needed",
                &[("needed", needed.as_str()), ("available", available.as_str())],
            )
        };
        Some(message)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    /// The current shopping list in the selected display order
    pub fn sorted_list(&self) -> ShoppingList {
        self.sort_order.apply(self.tracker.list())
    }

    /// Flip an item's checked state; unknown items are ignored
    pub fn toggle_item(&mut self, id: ItemId) -> bool {
        self.tracker.toggle(id)
    }

    pub fn is_item_checked(&self, id: ItemId) -> bool {
        self.tracker.is_checked(id)
    }

    /// Uncheck every item
    pub fn clear_checked(&mut self) {
        self.tracker.clear();
    }

    pub fn progress(&self) -> Progress {
        self.tracker.progress()
    }

    /// Localized progress line, e.g. "2 of 5 items collected (40% complete)"
    pub fn progress_message(&self) -> String {
        let progress = self.progress();
        let checked = progress.checked_count.to_string();
        let total = progress.total_count.to_string();
        let percent = progress.rounded_percentage().to_string();
        self.t(
            "progress-status",
            &[
                ("checked", checked.as_str()),
                ("total", total.as_str()),
                ("percent", percent.as_str()),
            ],
        )
    }

    /// Localized shopping-time estimate
    pub fn shopping_time_message(&self) -> String {
        let minutes = self.tracker.estimated_shopping_minutes().to_string();
        self.t("shopping-time", &[("minutes", minutes.as_str())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient_model::Ingredient;

    fn session() -> Session {
        let localization = LocalizationManager::new().unwrap();
        Session::new(&AppConfig::default(), localization)
    }

    fn recipe(name: &str, ingredients: &[(&str, &str)]) -> Recipe {
        Recipe::new(
            name,
            ingredients.iter().map(|(n, q)| Ingredient::new(n, q)).collect(),
            vec![],
        )
    }

    fn loaded_session() -> Session {
        let mut session = session();
        session.load_recipes(
            vec![
                recipe("Chicken Rice", &[("Chicken", "1 lb"), ("Rice", "1 cup")]),
                recipe("Vegan Curry", &[("Tofu", "200g"), ("rice", "2 cups")]),
            ],
            PantryInventory::from_names(["rice"]),
        );
        session
    }

    #[test]
    fn test_recipe_selection_toggle() {
        let mut session = loaded_session();

        assert!(session.toggle_recipe_selection("Vegan Curry"));
        assert!(session.toggle_recipe_selection("Chicken Rice"));
        assert!(session.is_selected("Vegan Curry"));

        let names: Vec<String> = session
            .selected_recipes()
            .into_iter()
            .map(|r| r.recipe_name)
            .collect();
        assert_eq!(names, vec!["Vegan Curry", "Chicken Rice"]);

        assert!(!session.toggle_recipe_selection("Vegan Curry"));
        assert!(!session.is_selected("Vegan Curry"));
        assert!(!session.toggle_recipe_selection("Unknown Recipe"));
    }

    #[test]
    fn test_consolidate_requires_selection() {
        let mut session = loaded_session();
        let result = session.consolidate_selected();

        assert!(matches!(result, Err(GroceryError::Validation(_))));
        let status = session.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("select at least one recipe"));
    }

    #[test]
    fn test_consolidate_selected_subtracts_pantry() {
        let mut session = loaded_session();
        session.toggle_recipe_selection("Chicken Rice");
        session.toggle_recipe_selection("Vegan Curry");

        let summary = session.consolidate_selected().unwrap().clone();
        assert_eq!(summary.total_recipe_ingredients, 4);
        assert_eq!(summary.total_items_needed, 2);
        assert_eq!(summary.items_already_available, 1);

        let names: Vec<&str> = session.shopping_list().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken", "Tofu"]);
        assert_eq!(session.status().unwrap().kind, StatusKind::Success);
        assert_eq!(
            session.summary_message().unwrap(),
            "🛒 2 items to buy, 1 already in your pantry."
        );
    }

    #[test]
    fn test_progress_survives_resorting() {
        let mut session = loaded_session();
        session.toggle_recipe_selection("Vegan Curry");
        session.toggle_recipe_selection("Chicken Rice");
        session.consolidate_selected().unwrap();

        // Tofu is first in consolidation order
        let tofu = session.shopping_list().items()[0].id;
        session.toggle_item(tofu);

        session.set_sort_order(SortOrder::Category);
        let sorted = session.sorted_list();
        assert_eq!(sorted.items()[0].name, "Chicken");
        assert!(session.is_item_checked(tofu));
        assert!(!session.is_item_checked(sorted.items()[0].id));
        assert_eq!(session.progress().checked_count, 1);
        assert_eq!(session.progress_message(), "1 of 2 items collected (50% complete)");
    }

    #[test]
    fn test_new_consolidation_resets_progress() {
        let mut session = loaded_session();
        session.toggle_recipe_selection("Chicken Rice");
        session.consolidate_selected().unwrap();
        for id in session.shopping_list().ids() {
            session.toggle_item(id);
        }
        assert!(session.progress().is_complete());

        session.toggle_recipe_selection("Vegan Curry");
        session.consolidate_selected().unwrap();
        assert_eq!(session.progress().checked_count, 0);
        assert_eq!(session.progress().total_count, 2);
    }

    #[test]
    fn test_everything_in_pantry_is_celebrated() {
        let mut session = session();
        session.load_recipes(
            vec![recipe("Plain Rice", &[("Rice", "1 cup")])],
            PantryInventory::from_names(["rice"]),
        );
        session.toggle_recipe_selection("Plain Rice");

        let summary = session.consolidate_selected().unwrap();
        assert!(summary.is_empty);
        assert!(session.summary_message().unwrap().contains("already have everything"));
        assert_eq!(session.progress().percentage, 0.0);
    }

    #[test]
    fn test_diet_filter() {
        let mut session = loaded_session();
        assert_eq!(session.visible_recipes().len(), 2);

        session.set_diet_filter("vegan");
        let visible: Vec<&str> = session
            .visible_recipes()
            .iter()
            .map(|r| r.recipe_name.as_str())
            .collect();
        assert_eq!(visible, vec!["Vegan Curry"]);
    }

    #[test]
    fn test_clear_checked() {
        let mut session = loaded_session();
        session.toggle_recipe_selection("Chicken Rice");
        session.consolidate_selected().unwrap();
        for id in session.shopping_list().ids() {
            session.toggle_item(id);
        }

        session.clear_checked();
        assert_eq!(session.progress().percentage, 0.0);
        assert_eq!(session.shopping_time_message(), "Estimated shopping time: 15 minutes");
    }

    #[test]
    fn test_consolidate_returns_installed_summary() {
        let mut session = loaded_session();
        session.toggle_recipe_selection("Chicken Rice");

        let returned = session.consolidate_selected().unwrap().clone();
        assert_eq!(session.summary(), Some(&returned));
        assert_eq!(returned.total_items_needed, session.shopping_list().len());
        assert!(session.remote_summary().is_none());
    }

    #[test]
    fn test_session_age_counts_from_creation() {
        let before = Utc::now();
        let session = session();

        assert!(session.created_at() >= before);
        assert!(session.created_at() <= Utc::now());
        assert!(session.age() >= Duration::zero());
        assert!(session.age() < Duration::minutes(1));
    }
}
