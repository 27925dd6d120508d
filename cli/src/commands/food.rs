use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::path::Path;
use std::process;

use crate::backend::BackendClient;
use crate::openfoodfacts::OpenFoodFactsClient;
use macromate_core::api::{FoodPrediction, PredictionCandidate, humanize_label};
use macromate_core::models::{
    DailyLog, FoodLogItem, NewFoodLogItem, validate_food_item, validate_meal_type,
};
use macromate_core::service::MacroMateService;

use super::helpers::{
    format_food_item, json_error, no_neg_zero, parse_date, parse_serving, print_candidate_table,
    print_json, prompt_choice,
};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_add(
    svc: &MacroMateService,
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let item = svc.log_food(&NewFoodLogItem {
        date: parse_date(date)?,
        meal_type: meal.to_string(),
        name: name.to_string(),
        calories,
        protein_g: protein,
        carbs_g: carbs,
        fat_g: fat,
    })?;

    if json {
        return print_json(&item);
    }
    println!("Added to {} on {}:", item.meal_type, item.date);
    println!("  {}", format_food_item(&item));
    Ok(())
}

/// Search OpenFoodFacts. With `log`, pick a result and add one serving.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn cmd_food_search(
    svc: &MacroMateService,
    off: &OpenFoodFactsClient,
    query: &str,
    limit: usize,
    log: bool,
    serving: Option<&str>,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let results = off.search(query, limit).await?;

    if results.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No results found for '{query}'");
        }
        process::exit(2);
    }

    if !log {
        if json {
            return print_json(&results);
        }
        print_candidate_table(&results);
        return Ok(());
    }

    let serving_g = serving.map_or(Ok(100.0), parse_serving)?;
    let date = parse_date(date)?;
    let idx = if results.len() == 1 {
        0
    } else {
        print_candidate_table(&results);
        prompt_choice(results.len())?
    };
    let candidate = &results[idx];
    let new_item = candidate.to_food_item(serving_g, meal, date);
    if new_item.calories <= 0.0 {
        bail!(
            "A {serving_g}g serving of {} has no measurable calories ({} kcal/100g); use a larger serving",
            candidate.display_name(),
            candidate.calories_per_100g
        );
    }
    let item = svc.log_food(&new_item)?;

    if json {
        return print_json(&item);
    }
    println!("Logged {serving_g:.0}g to {} on {}:", item.meal_type, item.date);
    println!("  {}", format_food_item(&item));
    Ok(())
}

fn print_daily_log(log: &DailyLog) {
    println!("=== {} ===\n", log.date);

    for meal in &log.meals {
        let label = meal.meal_type.to_uppercase();
        let sub_cal = no_neg_zero(meal.subtotal.calories);
        println!("  {label} ({sub_cal:.0} kcal)");
        for item in &meal.items {
            println!("    {}", format_food_item(item));
        }
        println!();
    }

    let t = &log.totals;
    let g = &log.goals;
    let r = &log.progress.remaining;
    println!(
        "  TOTAL:     {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        t.calories, t.protein_g, t.carbs_g, t.fat_g
    );
    println!(
        "  GOAL:      {} kcal | P:{}g C:{}g F:{}g",
        g.calories, g.protein_g, g.carbs_g, g.fat_g
    );
    println!(
        "  REMAINING: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        r.calories, r.protein_g, r.carbs_g, r.fat_g
    );
    println!("  ({:.0}% of calorie goal)", log.progress.calories_pct);
}

pub(crate) fn cmd_food_log(svc: &MacroMateService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let log = svc.daily_log(date)?;

    if json {
        return print_json(&log);
    }

    if log.meals.is_empty() {
        eprintln!("No food logged for {}", log.date);
        process::exit(2);
    }

    print_daily_log(&log);
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &MacroMateService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_food(id)? {
        if json {
            println!("{}", json_error(&format!("Food item {id} not found")));
        } else {
            eprintln!("Food item {id} not found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted food item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_food_days(svc: &MacroMateService, limit: u32, json: bool) -> Result<()> {
    let dates = svc.get_food_log_dates(i64::from(limit))?;

    if json {
        return print_json(&dates);
    }
    if dates.is_empty() {
        eprintln!("No food logged yet");
        process::exit(2);
    }
    for date in &dates {
        let log = svc.daily_log(parse_date(Some(date.clone()))?)?;
        println!(
            "{date}  {:>5.0} kcal  ({:.0}% of goal)",
            log.totals.calories, log.progress.calories_pct
        );
    }
    Ok(())
}

/// What happened to a prediction when `--log` was given.
#[derive(Debug)]
enum LogOutcome {
    Logged(FoodLogItem),
    Skipped(String),
}

/// Log a recognized dish. Predictions that are not a usable log item (not
/// recognized, or no calorie data for the dish) are skipped with a reason.
fn log_prediction(
    svc: &MacroMateService,
    prediction: &FoodPrediction,
    meal: &str,
    date: NaiveDate,
) -> Result<LogOutcome> {
    let Some(item) = prediction.to_food_item(meal, date) else {
        return Ok(LogOutcome::Skipped(
            "the dish was not recognized with enough confidence".to_string(),
        ));
    };
    if let Err(e) = validate_food_item(&item) {
        return Ok(LogOutcome::Skipped(format!(
            "no usable nutrition data for {} ({e})",
            item.name
        )));
    }
    Ok(LogOutcome::Logged(svc.log_food(&item)?))
}

/// Human-readable lines for a prediction. The top-level confidence is already
/// a percentage; the top matches carry fractions.
fn describe_prediction(prediction: &FoodPrediction) -> Vec<String> {
    let mut lines = Vec::new();
    match prediction {
        FoodPrediction::Recognized {
            food,
            confidence,
            macros,
            top_3,
        } => {
            lines.push(format!(
                "Recognized: {} ({confidence:.1}% confidence)",
                humanize_label(food)
            ));
            lines.push(format!(
                "  Per {}: {:.0} kcal | P:{:.1}g C:{:.1}g F:{:.1}g",
                macros.serving, macros.calories, macros.protein, macros.carbs, macros.fat
            ));
            lines.extend(alternatives(top_3));
        }
        FoodPrediction::Unknown {
            message,
            best_guess,
            confidence,
            suggestion,
            top_3,
        } => {
            lines.push(message.clone());
            lines.push(format!(
                "  Best guess: {} ({confidence:.1}% confidence)",
                humanize_label(best_guess)
            ));
            if let Some(suggestion) = suggestion {
                lines.push(format!("  {suggestion}"));
            }
            lines.extend(alternatives(top_3));
        }
        FoodPrediction::Error { error } => lines.push(format!("Prediction failed: {error}")),
    }
    lines
}

fn alternatives(top: &[PredictionCandidate]) -> Vec<String> {
    if top.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["  Top matches:".to_string()];
    for (i, candidate) in top.iter().enumerate() {
        lines.push(format!(
            "    {}. {} ({:.1}%)",
            i + 1,
            humanize_label(&candidate.name),
            candidate.confidence * 100.0
        ));
    }
    lines
}

/// Classify a food photo, optionally logging a recognized dish.
pub(crate) async fn cmd_food_recognize(
    svc: &MacroMateService,
    backend: &BackendClient,
    image: &Path,
    log: bool,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    if log {
        validate_meal_type(meal)?;
    }
    let bytes = std::fs::read(image)
        .with_context(|| format!("Failed to read image {}", image.display()))?;
    let file_name = image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image.jpg");
    let prediction = backend.predict_food(bytes, file_name).await?;

    let outcome = if log && !matches!(prediction, FoodPrediction::Error { .. }) {
        Some(log_prediction(svc, &prediction, meal, date)?)
    } else {
        None
    };

    if json {
        let (logged, skipped) = match &outcome {
            Some(LogOutcome::Logged(item)) => (Some(item), None),
            Some(LogOutcome::Skipped(reason)) => (None, Some(reason.as_str())),
            None => (None, None),
        };
        let value = serde_json::json!({
            "prediction": prediction,
            "logged": logged,
            "not_logged_reason": skipped,
        });
        return print_json(&value);
    }

    let lines = describe_prediction(&prediction);
    if let FoodPrediction::Error { .. } = prediction {
        for line in lines {
            eprintln!("{line}");
        }
        process::exit(1);
    }
    for line in lines {
        println!("{line}");
    }

    match outcome {
        Some(LogOutcome::Logged(item)) => {
            println!("\nLogged to {}: {}", item.meal_type, format_food_item(&item));
        }
        Some(LogOutcome::Skipped(reason)) => eprintln!("\nWarning: not logged: {reason}"),
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::parse_food_prediction;

    #[test]
    fn test_food_add_validates_meal() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let err = cmd_food_add(
            &svc, "Toast", 120.0, 4.0, 20.0, 2.0, "brunch", None, true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("brunch"));
    }

    #[test]
    fn test_food_add_and_log() {
        let svc = MacroMateService::new_in_memory().unwrap();
        cmd_food_add(
            &svc,
            "Oatmeal",
            150.0,
            5.0,
            27.0,
            3.0,
            "Breakfast",
            Some("2024-06-15".to_string()),
            true,
        )
        .unwrap();
        let log = svc
            .daily_log(chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
            .unwrap();
        assert_eq!(log.meals.len(), 1);
        assert_eq!(log.meals[0].meal_type, "breakfast");
        assert!((log.totals.calories - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_food_add_rejects_negative_macros() {
        let svc = MacroMateService::new_in_memory().unwrap();
        assert!(cmd_food_add(&svc, "Bad", 100.0, -1.0, 0.0, 0.0, "lunch", None, true).is_err());
    }

    const RECOGNIZED_ENVELOPE: &str = r#"{
        "success": true,
        "data": {
            "status": "recognized",
            "food": "chicken_biryani",
            "confidence": 87.3,
            "macros": {"calories": 290, "protein": 12, "carbs": 38, "fat": 10, "serving": "1 cup"},
            "top_3": [
                {"name": "chicken_biryani", "confidence": 0.873},
                {"name": "pulao", "confidence": 0.09}
            ]
        }
    }"#;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_log_recognized_prediction() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let prediction = parse_food_prediction(200, RECOGNIZED_ENVELOPE).unwrap();

        let outcome = log_prediction(&svc, &prediction, "Lunch", day()).unwrap();
        let item = match outcome {
            LogOutcome::Logged(item) => item,
            other => panic!("expected the dish to be logged, got {other:?}"),
        };
        assert_eq!(item.name, "Chicken Biryani");
        assert_eq!(item.meal_type, "lunch");

        let log = svc.daily_log(day()).unwrap();
        assert!((log.totals.calories - 290.0).abs() < f64::EPSILON);
        assert!((log.totals.protein_g - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_calorie_prediction_is_skipped() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let body = r#"{"status": "recognized", "food": "mystery_dish", "confidence": 91.0,
            "macros": {"calories": 0, "protein": 0, "carbs": 0, "fat": 0, "serving": "1 serving"}}"#;
        let prediction = parse_food_prediction(200, body).unwrap();

        let outcome = log_prediction(&svc, &prediction, "dinner", day()).unwrap();
        let reason = match outcome {
            LogOutcome::Skipped(reason) => reason,
            other => panic!("expected the dish to be skipped, got {other:?}"),
        };
        assert!(reason.contains("Mystery Dish"));
        assert!(svc.get_food_log_dates(10).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_prediction_is_skipped() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let body = r#"{"status": "unknown", "message": "Low confidence. Food not recognized.",
            "best_guess": "samosa", "confidence": 41.0}"#;
        let prediction = parse_food_prediction(200, body).unwrap();
        let outcome = log_prediction(&svc, &prediction, "snack", day()).unwrap();
        assert!(matches!(outcome, LogOutcome::Skipped(_)));
    }

    #[test]
    fn test_describe_prediction_percentages() {
        let prediction = parse_food_prediction(200, RECOGNIZED_ENVELOPE).unwrap();
        let lines = describe_prediction(&prediction);
        assert_eq!(lines[0], "Recognized: Chicken Biryani (87.3% confidence)");
        assert_eq!(lines[1], "  Per 1 cup: 290 kcal | P:12.0g C:38.0g F:10.0g");
        assert_eq!(lines[2], "  Top matches:");
        assert_eq!(lines[3], "    1. Chicken Biryani (87.3%)");
        assert_eq!(lines[4], "    2. Pulao (9.0%)");
    }

    #[test]
    fn test_describe_unknown_prediction() {
        let body = r#"{"status": "unknown", "message": "Low confidence. Food not recognized.",
            "best_guess": "pav_bhaji", "confidence": 41.0,
            "suggestion": "Try taking a clearer photo with better lighting."}"#;
        let prediction = parse_food_prediction(200, body).unwrap();
        let lines = describe_prediction(&prediction);
        assert_eq!(lines[1], "  Best guess: Pav Bhaji (41.0% confidence)");
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_recognize_missing_file() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let backend = BackendClient::new("http://127.0.0.1:1").unwrap();
        let err = cmd_food_recognize(
            &svc,
            &backend,
            Path::new("/nonexistent/plate.jpg"),
            false,
            "lunch",
            None,
            true,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read image"));
    }
}
