use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use smartmeal::category::classify;
use smartmeal::config::AppConfig;
use smartmeal::consolidation::ItemId;
use smartmeal::errors::GroceryError;
use smartmeal::ingredient_model::{parse_ingredient_input, PantryInventory};
use smartmeal::localization::LocalizationManager;
use smartmeal::recipe_client::{load_recipes_file, PlanPreferences, RecipeServiceClient};
use smartmeal::session::Session;
use smartmeal::sort_filter::SortOrder;

#[derive(Parser)]
#[command(
    name = "smartmeal",
    about = "Consolidate recipe ingredients into a shopping list",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a shopping list locally from a saved recipes file
    Consolidate {
        /// JSON file with `{"recipes": [...]}` or a bare recipe array
        #[arg(long)]
        recipes: PathBuf,

        /// Comma-separated ingredients already on hand
        #[arg(long, default_value = "")]
        pantry: String,

        /// Recipe names to shop for (all visible recipes if omitted)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Only consider recipes whose name contains this tag
        #[arg(long, default_value = "all")]
        diet: String,

        /// Display order: alphabetical or category
        #[arg(long)]
        sort: Option<String>,

        /// Item numbers to mark as collected
        #[arg(long = "check")]
        check: Vec<u32>,
    },

    /// Generate recipes from on-hand ingredients
    Recipes {
        /// Comma-separated ingredients on hand
        #[arg(long)]
        ingredients: String,

        /// Comma-separated dietary preferences
        #[arg(long, default_value = "")]
        diet: String,

        /// Save the generated recipes for later consolidation
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Ask the service for the grocery list of saved recipes
    GroceryList {
        /// JSON file with the recipes to shop for
        #[arg(long)]
        recipes: PathBuf,

        /// Comma-separated ingredients already on hand
        #[arg(long, default_value = "")]
        pantry: String,

        /// Recipe names to shop for (all if omitted)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Display order: alphabetical or category
        #[arg(long)]
        sort: Option<String>,
    },

    /// Generate a 7-day meal plan and its grocery list
    Plan {
        /// Weekly budget
        #[arg(long, default_value = "100")]
        budget: f64,

        /// Servings per meal
        #[arg(long, default_value = "2")]
        servings: u32,

        /// Nutrition goal, e.g. balanced or high-protein
        #[arg(long, default_value = "balanced")]
        goal: String,

        /// Comma-separated dietary preferences
        #[arg(long, default_value = "")]
        diet: String,

        /// Comma-separated meal types to plan
        #[arg(long, default_value = "breakfast, lunch, dinner")]
        meals: String,

        /// Display order: alphabetical or category
        #[arg(long)]
        sort: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!(api = %config.api_base_url, timeout_secs = config.request_timeout_secs, "Starting SmartMeal");

    let localization = LocalizationManager::new().context("Failed to load message catalog")?;
    let mut session = Session::new(&config, localization);

    match cli.command {
        Commands::Consolidate {
            recipes,
            pantry,
            select,
            diet,
            sort,
            check,
        } => {
            apply_sort(&mut session, sort.as_deref())?;
            load_session(&mut session, &recipes, &pantry, &diet, &select)?;

            let result = session.consolidate_selected().map(|_| ());
            report_status(&session, result)?;

            for id in check {
                session.toggle_item(ItemId(id));
            }
            print_list(&session);
        }
        Commands::Recipes {
            ingredients,
            diet,
            save,
        } => {
            let client = RecipeServiceClient::new(&config)?;
            let dietary = parse_ingredient_input(&diet);

            let result = session.request_recipes(&client, &ingredients, &dietary).await;
            report_status(&session, result)?;

            for recipe in session.recipes() {
                println!("\n{}", recipe);
            }
            if let Some(path) = save {
                save_recipes(&session, &path)?;
            }
        }
        Commands::GroceryList {
            recipes,
            pantry,
            select,
            sort,
        } => {
            apply_sort(&mut session, sort.as_deref())?;
            load_session(&mut session, &recipes, &pantry, "all", &select)?;

            let client = RecipeServiceClient::new(&config)?;
            let result = session.request_grocery_list(&client).await;
            report_status(&session, result)?;
            print_list(&session);
        }
        Commands::Plan {
            budget,
            servings,
            goal,
            diet,
            meals,
            sort,
        } => {
            apply_sort(&mut session, sort.as_deref())?;
            let preferences = PlanPreferences {
                dietary: parse_ingredient_input(&diet),
                budget,
                nutrition_goals: goal,
                servings,
                meal_types: parse_ingredient_input(&meals)
                    .into_iter()
                    .map(|meal| meal.to_lowercase())
                    .collect(),
            };

            let client = RecipeServiceClient::new(&config)?;
            let result = session.request_weekly_plan(&client, &preferences).await;
            report_status(&session, result)?;

            if let Some(plan) = session.weekly_plan() {
                for (day, meal, recipe) in plan.meals_in_order() {
                    println!("{:<10} {:<10} {}", day, meal, recipe.recipe_name);
                }
            }
            print_list(&session);
        }
    }

    Ok(())
}

fn apply_sort(session: &mut Session, sort: Option<&str>) -> Result<()> {
    if let Some(sort) = sort {
        let order = sort.parse::<SortOrder>().map_err(anyhow::Error::msg)?;
        session.set_sort_order(order);
    }
    Ok(())
}

/// Load saved recipes and select the requested ones
fn load_session(
    session: &mut Session,
    recipes_path: &Path,
    pantry: &str,
    diet: &str,
    select: &[String],
) -> Result<()> {
    let recipes = load_recipes_file(recipes_path)?;
    session.load_recipes(recipes, PantryInventory::from_input(pantry));
    session.set_diet_filter(diet);

    let names: Vec<String> = if select.is_empty() {
        session
            .visible_recipes()
            .iter()
            .map(|recipe| recipe.recipe_name.clone())
            .collect()
    } else {
        select.to_vec()
    };

    for name in &names {
        if !session.toggle_recipe_selection(name) {
            eprintln!("Unknown recipe: {}", name);
        }
    }
    Ok(())
}

fn save_recipes(session: &Session, path: &Path) -> Result<()> {
    let body = serde_json::json!({ "recipes": session.recipes() });
    let content = serde_json::to_string_pretty(&body)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Saved recipes");
    Ok(())
}

/// Print the success status, or fail the command with the error status
fn report_status<T>(session: &Session, result: Result<T, GroceryError>) -> Result<()> {
    let status = session.status().map(|status| status.text.clone());

    match result {
        Ok(_) => {
            if let Some(text) = status {
                println!("{}", text);
            }
            Ok(())
        }
        Err(err) => bail!(status.unwrap_or_else(|| err.user_message())),
    }
}

fn print_list(session: &Session) {
    if session.summary().is_none() {
        return;
    }

    if let Some(summary) = session.summary_message() {
        println!("{}", summary);
    }

    let list = session.sorted_list();
    for item in &list {
        let mark = if session.is_item_checked(item.id) { "x" } else { " " };
        match session.sort_order() {
            SortOrder::Category => println!("[{}] {} {} ({})", mark, item.id, item, classify(&item.name)),
            SortOrder::Alphabetical => println!("[{}] {} {}", mark, item.id, item),
        }
    }

    if !list.is_empty() {
        println!("{}", session.progress_message());
        println!("{}", session.shopping_time_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartmeal::ingredient_model::{Ingredient, Recipe};

    fn session() -> Session {
        let localization = LocalizationManager::new().unwrap();
        Session::new(&AppConfig::default(), localization)
    }

    #[test]
    fn test_failed_operation_fails_command() {
        let mut session = session();
        let result = session.consolidate_selected().map(|_| ());

        let err = report_status(&session, result).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please select at least one recipe to generate a grocery list!"
        );
    }

    #[test]
    fn test_successful_operation_passes() {
        let mut session = session();
        session.load_recipes(
            vec![Recipe::new("Toast", vec![Ingredient::new("Bread", "2 slices")], vec![])],
            PantryInventory::new(),
        );
        session.toggle_recipe_selection("Toast");
        let result = session.consolidate_selected().map(|_| ());

        assert!(report_status(&session, result).is_ok());
    }
}
