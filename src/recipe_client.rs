//! # Recipe Service Client
//!
//! HTTP boundary to the external recipe and meal-plan generation service.
//!
//! Every failure is translated into a [`GroceryError`] carrying a readable
//! message; nothing here touches session state. At most one request of each
//! [`RequestKind`] may be outstanding at a time; a second one is rejected
//! before any network I/O.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::consolidation::ConsolidationSummary;
use crate::errors::GroceryError;
use crate::ingredient_model::{parse_ingredient_input, Ingredient, PantryInventory, Recipe};

const USER_AGENT: &str = concat!("smartmeal/", env!("CARGO_PKG_VERSION"));

/// Days of a weekly plan in calendar order
pub const PLAN_DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Meal slots of a plan day in serving order
pub const PLAN_MEALS: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// Kinds of request sent to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Recipes,
    GroceryList,
    WeeklyPlan,
}

impl RequestKind {
    fn index(&self) -> usize {
        match self {
            RequestKind::Recipes => 0,
            RequestKind::GroceryList => 1,
            RequestKind::WeeklyPlan => 2,
        }
    }

    /// Path of the endpoint serving this request kind
    pub fn path(&self) -> &'static str {
        match self {
            RequestKind::Recipes => "/recipes",
            RequestKind::GroceryList => "/grocery-list",
            RequestKind::WeeklyPlan => "/weekly-plan",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestKind::Recipes => "recipe",
            RequestKind::GroceryList => "grocery list",
            RequestKind::WeeklyPlan => "weekly plan",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Serialize)]
struct RecipeRequest<'a> {
    ingredients: &'a [String],
    dietary_preferences: &'a [String],
}

#[derive(Debug, Serialize)]
struct GroceryListRequest<'a> {
    meal_plan: &'a [Recipe],
    pantry_ingredients: Vec<String>,
}

/// Body of a successful recipe generation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipesPayload {
    Wrapped { recipes: Vec<Recipe> },
    Bare(Vec<Recipe>),
}

/// Grocery list computed by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroceryListResponse {
    pub grocery_list: Vec<Ingredient>,
    #[serde(default)]
    pub summary: Option<ConsolidationSummary>,
}

/// Preferences for a weekly meal plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPreferences {
    pub dietary: Vec<String>,
    pub budget: f64,
    pub nutrition_goals: String,
    pub servings: u32,
    pub meal_types: Vec<String>,
}

impl Default for PlanPreferences {
    fn default() -> Self {
        Self {
            dietary: Vec::new(),
            budget: 100.0,
            nutrition_goals: "balanced".to_string(),
            servings: 2,
            meal_types: PLAN_MEALS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl PlanPreferences {
    fn validate(&self) -> Result<(), GroceryError> {
        if self.meal_types.is_empty() {
            return Err(GroceryError::Validation("Select at least one meal type".to_string()));
        }
        if self.servings == 0 {
            return Err(GroceryError::Validation("Servings must be at least 1".to_string()));
        }
        if self.budget.is_nan() || self.budget <= 0.0 {
            return Err(GroceryError::Validation("Budget must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// A generated 7-day meal plan
///
/// Only `consolidated_grocery_list` feeds consolidation; the budget and
/// nutrition summaries are kept as the service sent them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeeklyPlan {
    #[serde(default)]
    pub weekly_plan: BTreeMap<String, BTreeMap<String, Recipe>>,
    #[serde(default)]
    pub budget_summary: Option<Value>,
    #[serde(default)]
    pub nutrition_summary: Option<Value>,
    #[serde(default)]
    pub consolidated_grocery_list: Vec<Ingredient>,
}

impl WeeklyPlan {
    /// Recipe planned for a day and meal, if any
    pub fn meal(&self, day: &str, meal: &str) -> Option<&Recipe> {
        self.weekly_plan.get(day)?.get(meal)
    }

    /// Planned meals in calendar and serving order
    pub fn meals_in_order(&self) -> Vec<(&'static str, &'static str, &Recipe)> {
        PLAN_DAYS
            .iter()
            .flat_map(|day| PLAN_MEALS.iter().map(move |meal| (*day, *meal)))
            .filter_map(|(day, meal)| self.meal(day, meal).map(|recipe| (day, meal, recipe)))
            .collect()
    }
}

/// Clears an in-flight flag when the request finishes, however it ends
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Client for the recipe generation service
pub struct RecipeServiceClient {
    http_client: Client,
    base_url: String,
    in_flight: [AtomicBool; 3],
}

impl RecipeServiceClient {
    /// Create a client from application configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            in_flight: Default::default(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether a request of this kind is outstanding
    pub fn is_in_flight(&self, kind: RequestKind) -> bool {
        self.in_flight[kind.index()].load(Ordering::Acquire)
    }

    fn begin(&self, kind: RequestKind) -> Result<InFlightGuard<'_>, GroceryError> {
        let flag = &self.in_flight[kind.index()];
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!(request = %kind, "Rejected request while another is in flight");
                GroceryError::RequestInFlight(kind)
            })?;
        Ok(InFlightGuard { flag })
    }

    /// Ask the service for recipes using the given on-hand ingredients
    ///
    /// Blank ingredient names are dropped; an empty list is rejected before
    /// any request is sent.
    pub async fn generate_recipes(
        &self,
        ingredients: &[String],
        dietary_preferences: &[String],
    ) -> Result<Vec<Recipe>, GroceryError> {
        let ingredients: Vec<String> = ingredients
            .iter()
            .flat_map(|item| parse_ingredient_input(item))
            .collect();
        if ingredients.is_empty() {
            return Err(GroceryError::Validation("Please enter some ingredients!".to_string()));
        }

        let _guard = self.begin(RequestKind::Recipes)?;
        info!(
            ingredients_count = ingredients.len(),
            dietary_count = dietary_preferences.len(),
            "Requesting recipes"
        );

        let request = RecipeRequest {
            ingredients: &ingredients,
            dietary_preferences,
        };
        let body = self.post(RequestKind::Recipes, &request).await?;
        let recipes = parse_recipes_payload(&body)?;

        info!(recipes_count = recipes.len(), "Received recipes");
        Ok(recipes)
    }

    /// Ask the service for a grocery list covering the given recipes
    pub async fn generate_grocery_list(
        &self,
        meal_plan: &[Recipe],
        pantry: &PantryInventory,
    ) -> Result<GroceryListResponse, GroceryError> {
        if meal_plan.is_empty() {
            return Err(GroceryError::Validation(
                "Please select at least one recipe to generate a grocery list!".to_string(),
            ));
        }

        let _guard = self.begin(RequestKind::GroceryList)?;
        info!(
            recipes_count = meal_plan.len(),
            pantry_count = pantry.len(),
            "Requesting grocery list"
        );

        let request = GroceryListRequest {
            meal_plan,
            pantry_ingredients: pantry.names(),
        };
        let body = self.post(RequestKind::GroceryList, &request).await?;
        let response: GroceryListResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Unexpected grocery list response");
            GroceryError::Protocol("Received unexpected response format from server".to_string())
        })?;

        info!(items_count = response.grocery_list.len(), "Received grocery list");
        Ok(response)
    }

    /// Ask the service for a 7-day meal plan
    pub async fn generate_weekly_plan(
        &self,
        preferences: &PlanPreferences,
    ) -> Result<WeeklyPlan, GroceryError> {
        preferences.validate()?;

        let _guard = self.begin(RequestKind::WeeklyPlan)?;
        info!(
            budget = preferences.budget,
            servings = preferences.servings,
            goal = %preferences.nutrition_goals,
            "Requesting weekly plan"
        );

        let body = self.post(RequestKind::WeeklyPlan, preferences).await?;
        let plan: WeeklyPlan = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Unexpected weekly plan response");
            GroceryError::Protocol("Received unexpected response format from server".to_string())
        })?;

        info!(
            meals_count = plan.meals_in_order().len(),
            grocery_items = plan.consolidated_grocery_list.len(),
            "Received weekly plan"
        );
        Ok(plan)
    }

    /// POST a JSON body and return the response text of a successful reply
    async fn post<T: Serialize + ?Sized>(&self, kind: RequestKind, body: &T) -> Result<String, GroceryError> {
        let url = format!("{}{}", self.base_url, kind.path());
        debug!(url = %url, "Sending request");

        let response = self
            .http_client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(status = %status, body_len = text.len(), "Received response");

        if !status.is_success() {
            let message = error_message_from_body(status, &text);
            warn!(status = status.as_u16(), message = %message, "Service returned an error");
            return Err(GroceryError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

/// Extract a readable message from an error response
///
/// A JSON body yields its `error` field, then its `message` field, and
/// otherwise the status line. A non-JSON body is shown as text when it is
/// not blank.
pub fn error_message_from_body(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ["error", "message"]
            .iter()
            .find_map(|field| json.get(*field).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| status_line(status)),
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status_line(status)
            } else {
                trimmed.to_string()
            }
        }
    }
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Status")
    )
}

/// Parse recipes from `{"recipes": [...]}` or a bare array
pub fn parse_recipes_payload(body: &str) -> Result<Vec<Recipe>, GroceryError> {
    match serde_json::from_str::<RecipesPayload>(body) {
        Ok(RecipesPayload::Wrapped { recipes }) | Ok(RecipesPayload::Bare(recipes)) => Ok(recipes),
        Err(e) => {
            warn!(error = %e, "Unexpected recipe response");
            Err(GroceryError::Protocol(
                "Received unexpected response format from server".to_string(),
            ))
        }
    }
}

/// Load recipes saved from a recipe-service response
pub fn load_recipes_file(path: &Path) -> Result<Vec<Recipe>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read recipes file {}", path.display()))?;
    let recipes = parse_recipes_payload(&content)
        .with_context(|| format!("Failed to parse recipes file {}", path.display()))?;
    Ok(recipes)
}
