mod backend;
mod commands;
mod config;
mod logging;
mod openfoodfacts;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::backend::BackendClient;
use crate::commands::{
    Measurements, cmd_bmi, cmd_bodyfat, cmd_calories, cmd_chat, cmd_dashboard, cmd_export,
    cmd_food_add, cmd_food_days, cmd_food_delete, cmd_food_log, cmd_food_recognize,
    cmd_food_search, cmd_goals_calories, cmd_goals_clear, cmd_goals_set, cmd_goals_show,
    cmd_health, cmd_import, cmd_macros, cmd_units, cmd_weight_delete, cmd_weight_history,
    cmd_weight_log,
};
use crate::config::Config;
use crate::openfoodfacts::OpenFoodFactsClient;
use macromate_core::service::MacroMateService;

#[derive(Parser)]
#[command(
    name = "macromate",
    version,
    about = "Fitness calculators with a local weight and food log",
    long_about = "MacroMate: BMI, calorie, macro and body-fat calculators, a weight and \
body-fat progress dashboard, and a daily food log. Data stays in a local SQLite file."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate body-mass index
    Bmi {
        /// Height (cm, or inches with --unit imperial)
        height: f64,
        /// Weight (kg, or lbs with --unit imperial)
        weight: f64,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate BMR, TDEE and calories per weight goal
    Calories {
        /// Age in years
        age: u32,
        /// Height (cm, or inches with --unit imperial)
        height: f64,
        /// Weight (kg, or lbs with --unit imperial)
        weight: f64,
        /// Sex: male or female
        #[arg(short, long, default_value = "male")]
        sex: String,
        /// Activity level: sedentary, light, moderate, active (very_active) or extreme
        #[arg(short, long, default_value = "sedentary")]
        activity: String,
        /// Weight goal, e.g. maintain, mild_loss, weight_loss, weight_gain
        #[arg(short, long)]
        goal: Option<String>,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Save the goal's calories as your daily calorie goal
        #[arg(long)]
        save: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Split a calorie budget into protein, carbs and fat
    Macros {
        /// Daily calories
        calories: i64,
        /// Body weight in kg, for goal-based protein
        #[arg(short, long)]
        weight: Option<f64>,
        /// Weight goal used with --weight (default: maintain)
        #[arg(short, long)]
        goal: Option<String>,
        /// Custom split as protein/carbs/fat percentages, e.g. 30/40/30
        #[arg(long)]
        split: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Estimate body fat from tape measurements via the prediction backend
    Bodyfat {
        /// Weight (kg, or lbs with --unit imperial)
        #[arg(long)]
        weight: f64,
        /// Age in years
        #[arg(long)]
        age: Option<f64>,
        /// Height (cm, or inches with --unit imperial)
        #[arg(long)]
        height: Option<f64>,
        /// Neck circumference
        #[arg(long)]
        neck: Option<f64>,
        /// Abdomen circumference
        #[arg(long)]
        abdomen: Option<f64>,
        /// Forearm circumference
        #[arg(long)]
        forearm: Option<f64>,
        /// Wrist circumference
        #[arg(long)]
        wrist: Option<f64>,
        /// Interpret a known body-fat percentage instead of predicting one
        #[arg(long)]
        percent: Option<f64>,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Save the result to the progress dashboard
        #[arg(long, requires = "target")]
        save: bool,
        /// Target body-fat percentage (required with --save)
        #[arg(long)]
        target: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage weight and body-fat goals
    Goals {
        #[command(subcommand)]
        action: GoalsAction,
    },
    /// Track weight over time
    Weight {
        #[command(subcommand)]
        action: WeightAction,
    },
    /// Show weight and body-fat progress
    Dashboard {
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Include the full weight log
        #[arg(long)]
        log: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log food and review daily intake
    Food {
        #[command(subcommand)]
        action: FoodAction,
    },
    /// Ask the fitness chatbot a question
    Chat {
        /// Your question
        #[arg(required = true)]
        query: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the prediction backend is reachable
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set the default unit system
    Units {
        /// metric or imperial
        system: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export goals, weight log and food log as JSON
    Export {
        /// Output file (default: stdout)
        file: Option<PathBuf>,
        /// Report a written file as JSON (stdout output is always JSON)
        #[arg(long)]
        json: bool,
    },
    /// Import a JSON export (replaces goals and weight log, merges food log)
    Import {
        /// Path to the JSON file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Announce the listening address as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsAction {
    /// Set current and goal weight; restarts the weight log
    Set {
        /// Current weight (kg, or lbs with --unit imperial)
        #[arg(long)]
        current: f64,
        /// Goal weight (kg, or lbs with --unit imperial)
        #[arg(long)]
        goal: f64,
        /// Current body-fat percentage
        #[arg(long)]
        current_bf: Option<f64>,
        /// Target body-fat percentage
        #[arg(long)]
        target_bf: Option<f64>,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Update the goals without restarting the weight log
        #[arg(long)]
        keep_log: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current goals and daily nutrition goals
    Show {
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove goals and the weight log
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the daily calorie goal used by the food log
    Calories {
        /// Daily calories
        calories: i64,
        /// Goal type, e.g. maintain, weight_loss (default: keep current)
        #[arg(short, long)]
        goal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightAction {
    /// Record a weigh-in
    Log {
        /// Weight value
        value: f64,
        /// Body-fat percentage
        #[arg(short, long)]
        body_fat: Option<f64>,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weigh-ins
    History {
        /// Only the most recent N entries
        #[arg(short, long)]
        days: Option<u32>,
        /// Unit system: metric or imperial (default: saved preference)
        #[arg(short, long)]
        unit: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a weigh-in by ID
    Delete {
        /// Entry ID to delete
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodAction {
    /// Add a food item with known nutrition
    Add {
        /// Food name
        name: String,
        /// Calories
        #[arg(short, long)]
        calories: f64,
        /// Protein in grams
        #[arg(short, long, default_value = "0")]
        protein: f64,
        /// Carbohydrates in grams
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat in grams
        #[arg(short, long, default_value = "0")]
        fat: f64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search `OpenFoodFacts` for a food
    Search {
        /// Search query
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Pick a result and add it to the food log
        #[arg(long)]
        log: bool,
        /// Serving size in grams when logging (default: 100g)
        #[arg(short, long)]
        serving: Option<String>,
        /// Meal type when logging
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date when logging (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the food log for a day, grouped by meal
    Log {
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food item by ID
    Delete {
        /// Item ID to delete
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent days with logged food
    Days {
        /// Number of days to list
        #[arg(short, long, default_value = "7")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recognize a dish from a photo via the prediction backend
    Recognize {
        /// Image file (.jpg, .png or .webp)
        image: PathBuf,
        /// Add a recognized dish to the food log
        #[arg(long)]
        log: bool,
        /// Meal type when logging
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date when logging (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    logging::init(level);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = MacroMateService::new(&config.db_path)?;
    tracing::debug!(db = %config.db_path.display(), backend = %config.backend_url, "configuration loaded");

    match cli.command {
        Commands::Bmi {
            height,
            weight,
            unit,
            json,
        } => cmd_bmi(&svc, height, weight, unit.as_deref(), json),
        Commands::Calories {
            age,
            height,
            weight,
            sex,
            activity,
            goal,
            unit,
            save,
            json,
        } => cmd_calories(
            &svc,
            age,
            height,
            weight,
            &sex,
            &activity,
            goal.as_deref(),
            unit.as_deref(),
            save,
            json,
        ),
        Commands::Macros {
            calories,
            weight,
            goal,
            split,
            json,
        } => cmd_macros(calories, weight, goal.as_deref(), split.as_deref(), json),
        Commands::Bodyfat {
            weight,
            age,
            height,
            neck,
            abdomen,
            forearm,
            wrist,
            percent,
            unit,
            save,
            target,
            json,
        } => {
            let backend = BackendClient::new(&config.backend_url)?;
            let measurements = Measurements {
                age,
                weight,
                height,
                neck,
                abdomen,
                forearm,
                wrist,
            };
            cmd_bodyfat(
                &svc,
                &backend,
                &measurements,
                percent,
                unit.as_deref(),
                save,
                target,
                json,
            )
            .await
        }
        Commands::Goals { action } => match action {
            GoalsAction::Set {
                current,
                goal,
                current_bf,
                target_bf,
                unit,
                keep_log,
                json,
            } => cmd_goals_set(
                &svc,
                current,
                goal,
                current_bf,
                target_bf,
                unit.as_deref(),
                keep_log,
                json,
            ),
            GoalsAction::Show { unit, json } => cmd_goals_show(&svc, unit.as_deref(), json),
            GoalsAction::Clear { json } => cmd_goals_clear(&svc, json),
            GoalsAction::Calories {
                calories,
                goal,
                json,
            } => cmd_goals_calories(&svc, calories, goal.as_deref(), json),
        },
        Commands::Weight { action } => match action {
            WeightAction::Log {
                value,
                body_fat,
                date,
                unit,
                json,
            } => cmd_weight_log(&svc, value, body_fat, date, unit.as_deref(), json),
            WeightAction::History { days, unit, json } => {
                cmd_weight_history(&svc, days, unit.as_deref(), json)
            }
            WeightAction::Delete { id, json } => cmd_weight_delete(&svc, id, json),
        },
        Commands::Dashboard { unit, log, json } => {
            cmd_dashboard(&svc, unit.as_deref(), log, json)
        }
        Commands::Food { action } => match action {
            FoodAction::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                meal,
                date,
                json,
            } => cmd_food_add(&svc, &name, calories, protein, carbs, fat, &meal, date, json),
            FoodAction::Search {
                query,
                limit,
                log,
                serving,
                meal,
                date,
                json,
            } => {
                let off = OpenFoodFactsClient::new()?;
                cmd_food_search(
                    &svc,
                    &off,
                    &query,
                    limit,
                    log,
                    serving.as_deref(),
                    &meal,
                    date,
                    json,
                )
                .await
            }
            FoodAction::Log { date, json } => cmd_food_log(&svc, date, json),
            FoodAction::Delete { id, json } => cmd_food_delete(&svc, id, json),
            FoodAction::Days { limit, json } => cmd_food_days(&svc, limit, json),
            FoodAction::Recognize {
                image,
                log,
                meal,
                date,
                json,
            } => {
                let backend = BackendClient::new(&config.backend_url)?;
                cmd_food_recognize(&svc, &backend, &image, log, &meal, date, json).await
            }
        },
        Commands::Chat { query, json } => {
            let backend = BackendClient::new(&config.backend_url)?;
            cmd_chat(&backend, &query.join(" "), json).await
        }
        Commands::Health { json } => {
            let backend = BackendClient::new(&config.backend_url)?;
            cmd_health(&backend, json).await
        }
        Commands::Units { system, json } => cmd_units(&svc, system.as_deref(), json),
        Commands::Export { file, json } => cmd_export(&svc, file.as_deref(), json),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Serve { port, bind, json } => {
            server::start_server(svc, port, &bind, json).await
        }
    }
}
