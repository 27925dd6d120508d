use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculators::{CalorieGoal, DailyGoals, DailyProgress};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub current_weight_kg: f64,
    pub goal_weight_kg: f64,
    pub current_body_fat_pct: Option<f64>,
    pub target_body_fat_pct: Option<f64>,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<i64>,
    #[serde(default)]
    pub goal_type: CalorieGoal,
    #[serde(default)]
    pub updated_at: String,
}

/// User-entered goal fields. Everything else on [`Profile`] is derived or
/// carried over by the service.
#[derive(Debug, Clone)]
pub struct GoalSettings {
    pub current_weight_kg: f64,
    pub goal_weight_kg: f64,
    pub current_body_fat_pct: Option<f64>,
    pub target_body_fat_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightLogEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_pct: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWeightLogEntry {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub body_fat_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FoodLogItem {
    pub id: i64,
    pub date: String,
    pub meal_type: String,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct NewFoodLogItem {
    pub date: NaiveDate,
    pub meal_type: String,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MacroTotals {
    #[must_use]
    pub fn of_items<'a>(items: impl IntoIterator<Item = &'a FoodLogItem>) -> Self {
        items.into_iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein_g: acc.protein_g + item.protein_g,
            carbs_g: acc.carbs_g + item.carbs_g,
            fat_g: acc.fat_g + item.fat_g,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealGroup {
    pub meal_type: String,
    pub items: Vec<FoodLogItem>,
    pub subtotal: MacroTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyLog {
    pub date: String,
    pub meals: Vec<MealGroup>,
    pub totals: MacroTotals,
    pub goals: DailyGoals,
    pub progress: DailyProgress,
}

// --- Export / Import types ---
//
// Field names follow the camelCase JSON the web client kept in local storage
// (`macromate_progress` and `macromate_foodlog_<date>`), so an existing browser
// dump can be imported as-is.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProfile {
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    #[serde(default)]
    pub current_body_fat: Option<f64>,
    #[serde(default)]
    pub target_body_fat: Option<f64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportWeightEntry {
    pub date: String,
    pub weight: f64,
    #[serde(default)]
    pub body_fat: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFoodItem {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meal_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    #[serde(default)]
    pub profile: ExportProfile,
    #[serde(default)]
    pub weight_log: Vec<ExportWeightEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub food_log: BTreeMap<String, Vec<ExportFoodItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct ImportSummary {
    pub profile_imported: bool,
    pub weight_entries_imported: i64,
    pub food_items_imported: i64,
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

pub fn validate_meal_type(meal: &str) -> anyhow::Result<String> {
    let lower = meal.to_lowercase();
    if MEAL_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        anyhow::bail!(
            "Invalid meal type '{meal}'. Must be one of: {}",
            MEAL_TYPES.join(", ")
        )
    }
}

pub fn parse_iso_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{date}'. Must be YYYY-MM-DD"))
}

pub fn validate_weight(weight_kg: f64) -> Result<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    Ok(())
}

pub fn validate_body_fat(pct: f64) -> Result<()> {
    if !pct.is_finite() || pct <= 0.0 || pct >= 100.0 {
        bail!("Body fat percentage must be between 0 and 100");
    }
    Ok(())
}

pub fn validate_goal_settings(goals: &GoalSettings) -> Result<()> {
    validate_weight(goals.current_weight_kg)?;
    validate_weight(goals.goal_weight_kg)?;
    if let Some(bf) = goals.current_body_fat_pct {
        validate_body_fat(bf)?;
    }
    if let Some(bf) = goals.target_body_fat_pct {
        validate_body_fat(bf)?;
    }
    Ok(())
}

/// Validate a food log item: name must not be empty, calories must be positive,
/// macros must not be negative.
pub fn validate_food_item(item: &NewFoodLogItem) -> Result<()> {
    if item.name.trim().is_empty() {
        bail!("Food name is required");
    }
    if !item.calories.is_finite() || item.calories <= 0.0 {
        bail!("Calories must be greater than 0");
    }
    for (label, value) in [
        ("protein", item.protein_g),
        ("carbs", item.carbs_g),
        ("fat", item.fat_g),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("{label} must not be negative");
        }
    }
    validate_meal_type(&item.meal_type)?;
    Ok(())
}

/// Validate an imported weight entry: weight > 0, valid date, body fat in range.
pub fn validate_export_weight_entry(entry: &ExportWeightEntry) -> Result<()> {
    validate_weight(entry.weight)?;
    if let Some(bf) = entry.body_fat {
        validate_body_fat(bf)?;
    }
    parse_iso_date(&entry.date).map_err(|_| {
        anyhow::anyhow!(
            "Invalid weight entry date '{}'. Must be YYYY-MM-DD",
            entry.date
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, calories: f64) -> NewFoodLogItem {
        NewFoodLogItem {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            meal_type: "lunch".to_string(),
            name: name.to_string(),
            calories,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
        }
    }

    #[test]
    fn test_valid_meal_types() {
        assert_eq!(validate_meal_type("breakfast").unwrap(), "breakfast");
        assert_eq!(validate_meal_type("lunch").unwrap(), "lunch");
        assert_eq!(validate_meal_type("dinner").unwrap(), "dinner");
        assert_eq!(validate_meal_type("snack").unwrap(), "snack");
    }

    #[test]
    fn test_meal_type_case_insensitive() {
        assert_eq!(validate_meal_type("Lunch").unwrap(), "lunch");
        assert_eq!(validate_meal_type("BREAKFAST").unwrap(), "breakfast");
    }

    #[test]
    fn test_invalid_meal_type() {
        assert!(validate_meal_type("brunch").is_err());
        assert!(validate_meal_type("").is_err());
    }

    #[test]
    fn test_validate_food_item_valid() {
        assert!(validate_food_item(&item("Oatmeal", 150.0)).is_ok());
    }

    #[test]
    fn test_validate_food_item_empty_name() {
        assert!(validate_food_item(&item("   ", 150.0)).is_err());
    }

    #[test]
    fn test_validate_food_item_zero_calories() {
        assert!(validate_food_item(&item("Water", 0.0)).is_err());
    }

    #[test]
    fn test_validate_food_item_negative_macro() {
        let mut bad = item("Oatmeal", 150.0);
        bad.fat_g = -1.0;
        assert!(validate_food_item(&bad).is_err());
    }

    #[test]
    fn test_validate_weight() {
        assert!(validate_weight(72.5).is_ok());
        assert!(validate_weight(0.0).is_err());
        assert!(validate_weight(-5.0).is_err());
        assert!(validate_weight(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_body_fat() {
        assert!(validate_body_fat(18.0).is_ok());
        assert!(validate_body_fat(0.0).is_err());
        assert!(validate_body_fat(100.0).is_err());
    }

    #[test]
    fn test_macro_totals_of_items() {
        let items = vec![
            FoodLogItem {
                id: 1,
                date: "2024-06-15".to_string(),
                meal_type: "lunch".to_string(),
                name: "Rice".to_string(),
                calories: 205.0,
                protein_g: 4.3,
                carbs_g: 45.0,
                fat_g: 0.4,
                timestamp: String::new(),
            },
            FoodLogItem {
                id: 2,
                date: "2024-06-15".to_string(),
                meal_type: "lunch".to_string(),
                name: "Chicken Breast".to_string(),
                calories: 165.0,
                protein_g: 31.0,
                carbs_g: 0.0,
                fat_g: 3.6,
                timestamp: String::new(),
            },
        ];
        let totals = MacroTotals::of_items(&items);
        assert!((totals.calories - 370.0).abs() < 1e-9);
        assert!((totals.protein_g - 35.3).abs() < 1e-9);
        assert!((totals.carbs_g - 45.0).abs() < 1e-9);
        assert!((totals.fat_g - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_export_weight_entry() {
        let ok = ExportWeightEntry {
            date: "2024-06-15".to_string(),
            weight: 80.0,
            body_fat: Some(22.0),
        };
        assert!(validate_export_weight_entry(&ok).is_ok());

        let bad_date = ExportWeightEntry {
            date: "15/06/2024".to_string(),
            ..ok.clone()
        };
        assert!(validate_export_weight_entry(&bad_date).is_err());

        let bad_weight = ExportWeightEntry { weight: 0.0, ..ok };
        assert!(validate_export_weight_entry(&bad_weight).is_err());
    }

    #[test]
    fn test_progress_data_reads_browser_blob() {
        let json = r#"{
            "profile": {
                "currentWeight": 82.0,
                "goalWeight": 75.0,
                "currentBodyFat": 24.5,
                "targetBodyFat": null,
                "startDate": "2024-05-01"
            },
            "weightLog": [
                {"date": "2024-05-01", "weight": 84.0, "bodyFat": null},
                {"date": "2024-06-01", "weight": 82.0, "bodyFat": 24.5}
            ]
        }"#;
        let data: ProgressData = serde_json::from_str(json).unwrap();
        assert_eq!(data.profile.current_weight, Some(82.0));
        assert_eq!(data.profile.start_date.as_deref(), Some("2024-05-01"));
        assert!(data.profile.target_body_fat.is_none());
        assert_eq!(data.weight_log.len(), 2);
        assert_eq!(data.weight_log[1].body_fat, Some(24.5));
        assert!(data.food_log.is_empty());
    }
}
