use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macromate_core::calculators::UnitSystem;
use macromate_core::models::FoodLogItem;
use macromate_core::openfoodfacts::FoodCandidate;
use macromate_core::service::MacroMateService;

pub(crate) fn parse_serving(s: &str) -> Result<f64> {
    let trimmed = s.trim_end_matches('g').trim();
    let value: f64 = trimmed.parse().with_context(|| {
        format!("Invalid serving size: '{s}'. Use a number like '150' or '150g'")
    })?;
    if value <= 0.0 {
        bail!("Serving size must be greater than 0");
    }
    Ok(value)
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today()),
        Some(s) => match s.as_str() {
            "today" => Ok(today()),
            "yesterday" => Ok(today() - chrono::Duration::days(1)),
            "tomorrow" => Ok(today() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `--unit` when given, else the stored default unit system.
pub(crate) fn resolve_unit(svc: &MacroMateService, unit: Option<&str>) -> Result<UnitSystem> {
    match unit {
        Some(u) => u.parse(),
        None => svc.default_unit(),
    }
}

/// Format a kilogram value in the requested unit system, e.g. `81.6 kg`
/// or `180.0 lbs`.
pub(crate) fn format_weight(kg: f64, unit: UnitSystem) -> String {
    let value = no_neg_zero(unit.weight_from_kg(kg));
    format!("{value:.1} {}", unit.weight_unit())
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_candidate_table(foods: &[FoodCandidate]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "C/100g")]
        carbs: String,
        #[tabled(rename = "F/100g")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            name: truncate(&f.name, 35),
            brand: f
                .brand
                .as_deref()
                .map(|b| truncate(b, 20))
                .unwrap_or_default(),
            calories: format!("{:.0}", f.calories_per_100g),
            protein: format!("{:.1}", f.protein_per_100g),
            carbs: format!("{:.1}", f.carbs_per_100g),
            fat: format!("{:.1}", f.fat_per_100g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_food_item(item: &FoodLogItem) -> String {
    let id = item.id;
    let name = &item.name;
    let cal = no_neg_zero(item.calories);
    let p = no_neg_zero(item.protein_g);
    let c = no_neg_zero(item.carbs_g);
    let f = no_neg_zero(item.fat_g);
    format!("[{id}] {name} | {cal:.0} kcal | P:{p:.1}g C:{c:.1}g F:{f:.1}g")
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serving() {
        assert!((parse_serving("150").unwrap() - 150.0).abs() < f64::EPSILON);
        assert!((parse_serving("150g").unwrap() - 150.0).abs() < f64::EPSILON);
        assert!((parse_serving("87.5g").unwrap() - 87.5).abs() < f64::EPSILON);
        assert!((parse_serving("150 ").unwrap() - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_serving_invalid() {
        assert!(parse_serving("a bowl").is_err());
        assert!(parse_serving("0").is_err());
        assert!(parse_serving("-50g").is_err());
    }

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None).unwrap(), today());
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = today();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(parse_date(Some("15/01/2024".to_string())).is_err());
    }

    #[test]
    fn test_resolve_unit() {
        let svc = MacroMateService::new_in_memory().unwrap();
        assert_eq!(resolve_unit(&svc, None).unwrap(), UnitSystem::Metric);
        assert_eq!(
            resolve_unit(&svc, Some("imperial")).unwrap(),
            UnitSystem::Imperial
        );
        assert!(resolve_unit(&svc, Some("stone")).is_err());

        svc.set_default_unit(UnitSystem::Imperial).unwrap();
        assert_eq!(resolve_unit(&svc, None).unwrap(), UnitSystem::Imperial);
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(80.0, UnitSystem::Metric), "80.0 kg");
        assert_eq!(format_weight(80.0, UnitSystem::Imperial), "176.4 lbs");
    }

    #[test]
    fn test_format_food_item() {
        let item = FoodLogItem {
            id: 7,
            date: "2024-06-15".to_string(),
            meal_type: "lunch".to_string(),
            name: "Chicken Curry".to_string(),
            calories: 240.0,
            protein_g: 20.0,
            carbs_g: 8.0,
            fat_g: 14.0,
            timestamp: String::new(),
        };
        assert_eq!(
            format_food_item(&item),
            "[7] Chicken Curry | 240 kcal | P:20.0g C:8.0g F:14.0g"
        );
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("No profile"), r#"{"error":"No profile"}"#);
        assert_eq!(json_error(r#"say "hi""#), r#"{"error":"say \"hi\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
