use anyhow::{Context, Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use crate::backend::BackendClient;
use macromate_core::api::{BodyFatPrediction, BodyFatRequest};
use macromate_core::calculators::{
    ActivityLevel, AdjustmentType, CalorieGoal, CalorieInput, MacroBreakdown, MacroTarget, Sex,
    UnitSystem, calculate_bmi, calculate_calories, fixed_macro_split, goal_macros,
    interpret_body_fat, parse_macro_split,
};
use macromate_core::service::MacroMateService;

use super::helpers::{format_weight, print_json, resolve_unit, today};

pub(crate) fn cmd_bmi(
    svc: &MacroMateService,
    height: f64,
    weight: f64,
    unit: Option<&str>,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let result = calculate_bmi(height, weight, unit)?;

    if json {
        return print_json(&result);
    }

    let bmi = result.bmi;
    let label = &result.category_label;
    println!("BMI: {bmi:.1} ({label})");
    println!(
        "Healthy range for your height: {} to {}",
        format_weight(result.ideal_weight_range.min, unit),
        format_weight(result.ideal_weight_range.max, unit)
    );
    match result.adjustment_type {
        AdjustmentType::Gain => println!(
            "To reach the healthy range: gain {}",
            format_weight(result.weight_adjustment, unit)
        ),
        AdjustmentType::Lose => println!(
            "To reach the healthy range: lose {}",
            format_weight(result.weight_adjustment, unit)
        ),
        AdjustmentType::Maintain => println!("You are within the healthy range"),
    }
    println!("\n{}", result.recommendation);
    if !result.risk_factors.is_empty() {
        println!("\nRisk factors:");
        for risk in &result.risk_factors {
            println!("  - {risk}");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_calories(
    svc: &MacroMateService,
    age: u32,
    height: f64,
    weight: f64,
    sex: &str,
    activity: &str,
    goal: Option<&str>,
    unit: Option<&str>,
    save: bool,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let input = CalorieInput {
        age,
        height_cm: unit.height_to_cm(height),
        weight_kg: unit.weight_to_kg(weight),
        sex: sex.parse::<Sex>()?,
        activity: activity.parse::<ActivityLevel>()?,
    };
    let report = calculate_calories(&input)?;
    let goal = goal.map(str::parse::<CalorieGoal>).transpose()?;

    let saved = if save {
        let goal = goal.unwrap_or(report.recommended_goal);
        Some(svc.set_calorie_goal(report.calories_for(goal), goal)?)
    } else {
        None
    };

    if json {
        let value = serde_json::json!({
            "report": report,
            "saved": saved,
        });
        return print_json(&value);
    }

    println!("BMR:  {} kcal/day", report.bmr);
    println!(
        "TDEE: {} kcal/day ({}, x{})",
        report.tdee, report.activity_label, report.activity_multiplier
    );
    println!();

    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "kg/week")]
        rate: String,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let rows: Vec<GoalRow> = report
        .goals
        .iter()
        .map(|g| {
            let highlighted = goal.unwrap_or(report.recommended_goal);
            let marker = if g.goal == highlighted { " *" } else { "" };
            GoalRow {
                goal: format!("{}{marker}", g.label),
                rate: format!("{:+.2}", g.kg_per_week),
                calories: g.calories.to_string(),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    println!("\nBMI {:.1}: {}", report.bmi, report.recommendation);

    if let Some(profile) = saved {
        let calories = profile.daily_calorie_goal.unwrap_or_default();
        println!(
            "\nSaved daily goal: {calories} kcal ({})",
            profile.goal_type.label()
        );
    }

    Ok(())
}

pub(crate) fn cmd_macros(
    calories: i64,
    weight: Option<f64>,
    goal: Option<&str>,
    split: Option<&str>,
    json: bool,
) -> Result<()> {
    if calories <= 0 {
        bail!("Calories must be greater than 0");
    }

    if let Some(split) = split {
        let (p, c, f) = parse_macro_split(split)?;
        let target = MacroTarget::from_percentages(calories, p, c, f)?;
        if json {
            return print_json(&target);
        }
        println!("{calories} kcal/day at {p}/{c}/{f}");
        println!(
            "  Protein: {:.0}g  Carbs: {:.0}g  Fat: {:.0}g",
            target.protein_g, target.carbs_g, target.fat_g
        );
        return Ok(());
    }

    let goal = goal
        .map(str::parse::<CalorieGoal>)
        .transpose()?
        .unwrap_or_default();
    let breakdown = match weight {
        Some(w) if w > 0.0 => goal_macros(calories, w, goal),
        Some(_) => bail!("Weight must be greater than 0"),
        None => fixed_macro_split(calories),
    };

    if json {
        return print_json(&breakdown);
    }

    print_macro_breakdown(&breakdown);
    Ok(())
}

fn print_macro_breakdown(breakdown: &MacroBreakdown) {
    #[derive(Tabled)]
    struct MacroRow {
        #[tabled(rename = "Macro")]
        name: &'static str,
        #[tabled(rename = "Grams")]
        grams: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "%")]
        pct: String,
    }

    let rows = [
        ("Protein", breakdown.protein),
        ("Carbs", breakdown.carbs),
        ("Fat", breakdown.fat),
    ]
    .map(|(name, m)| MacroRow {
        name,
        grams: format!("{}g", m.grams),
        calories: m.calories.to_string(),
        pct: format!("{}%", m.percentage),
    });

    println!("{} kcal/day", breakdown.calories);
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Tape measurements for a remote body-fat prediction. All lengths share the
/// unit of `height` (cm or inches).
pub(crate) struct Measurements {
    pub age: Option<f64>,
    pub weight: f64,
    pub height: Option<f64>,
    pub neck: Option<f64>,
    pub abdomen: Option<f64>,
    pub forearm: Option<f64>,
    pub wrist: Option<f64>,
}

fn required(name: &str, value: Option<f64>) -> Result<f64> {
    value.with_context(|| format!("--{name} is required unless --percent is given"))
}

impl Measurements {
    fn to_request(&self, unit: UnitSystem) -> Result<BodyFatRequest> {
        Ok(BodyFatRequest {
            age: required("age", self.age)?,
            weight: self.weight,
            height: required("height", self.height)?,
            neck: required("neck", self.neck)?,
            abdomen: required("abdomen", self.abdomen)?,
            forearm: required("forearm", self.forearm)?,
            wrist: required("wrist", self.wrist)?,
            unit,
        })
    }
}

/// Body-fat estimate. With `percent` the value is interpreted locally,
/// otherwise the backend's regression model predicts it.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn cmd_bodyfat(
    svc: &MacroMateService,
    backend: &BackendClient,
    measurements: &Measurements,
    percent: Option<f64>,
    unit: Option<&str>,
    save: bool,
    target: Option<f64>,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    if save && target.is_none() {
        bail!("--target is required with --save");
    }
    let weight_kg = unit.weight_to_kg(measurements.weight);

    let prediction = if let Some(pct) = percent {
        let report = interpret_body_fat(pct, weight_kg)?;
        BodyFatPrediction {
            body_fat_percentage: report.body_fat_percentage,
            category: report.category_label,
            health_status: report.health_status,
            recommendation: report.recommendation,
            body_composition: report.body_composition,
            risk_factors: report.risk_factors,
            mae: None,
            calculation_date: None,
        }
    } else {
        let req = measurements.to_request(unit)?;
        backend.predict_body_fat(&req).await?
    };

    let dashboard = match (save, target) {
        (true, Some(target)) => Some(svc.save_body_fat_result(
            weight_kg,
            prediction.body_fat_percentage,
            target,
            today(),
        )?),
        _ => None,
    };

    if json {
        let value = serde_json::json!({
            "prediction": prediction,
            "dashboard": dashboard,
        });
        return print_json(&value);
    }

    let pct = prediction.body_fat_percentage;
    print!("Body fat: {pct:.1}%");
    if let Some(mae) = prediction.mae {
        print!(" (model error +/- {mae:.1}%)");
    }
    println!();
    println!("Category: {}", prediction.category);
    let composition = &prediction.body_composition;
    println!(
        "Fat mass: {}  Lean mass: {}",
        format_weight(composition.fat_mass, unit),
        format_weight(composition.lean_body_mass, unit)
    );
    println!("\n{}", prediction.recommendation);
    if !prediction.risk_factors.is_empty() {
        println!("\nRisk factors:");
        for risk in &prediction.risk_factors {
            println!("  - {risk}");
        }
    }
    if let Some(dashboard) = dashboard {
        println!(
            "\nSaved to dashboard. Body fat progress: {}%",
            dashboard.body_fat_progress.unwrap_or(0)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurements() -> Measurements {
        Measurements {
            age: Some(35.0),
            weight: 82.0,
            height: Some(178.0),
            neck: Some(38.0),
            abdomen: Some(90.0),
            forearm: Some(29.0),
            wrist: Some(17.5),
        }
    }

    #[test]
    fn test_measurements_to_request() {
        let req = measurements().to_request(UnitSystem::Metric).unwrap();
        assert!((req.abdomen - 90.0).abs() < f64::EPSILON);
        assert_eq!(req.unit, UnitSystem::Metric);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_measurements_missing_field() {
        let mut m = measurements();
        m.neck = None;
        let err = m.to_request(UnitSystem::Metric).unwrap_err();
        assert!(err.to_string().contains("--neck"));
    }

    #[test]
    fn test_cmd_calories_save_sets_goal() {
        let svc = MacroMateService::new_in_memory().unwrap();
        svc.set_goals(
            &macromate_core::models::GoalSettings {
                current_weight_kg: 80.0,
                goal_weight_kg: 75.0,
                current_body_fat_pct: None,
                target_body_fat_pct: None,
            },
            today(),
        )
        .unwrap();

        cmd_calories(
            &svc,
            30,
            180.0,
            80.0,
            "male",
            "moderate",
            Some("weight_loss"),
            Some("metric"),
            true,
            true,
        )
        .unwrap();

        let profile = svc.get_profile().unwrap().unwrap();
        assert_eq!(profile.goal_type, CalorieGoal::WeightLoss);
        assert!(profile.daily_calorie_goal.unwrap() > 0);
    }

    #[test]
    fn test_cmd_calories_rejects_unknown_activity() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let err = cmd_calories(
            &svc, 30, 180.0, 80.0, "male", "couch", None, None, false, true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("couch"));
    }

    #[test]
    fn test_cmd_macros_validation() {
        assert!(cmd_macros(0, None, None, None, true).is_err());
        assert!(cmd_macros(2000, None, None, Some("30/40/20"), true).is_err());
        assert!(cmd_macros(2000, Some(-1.0), None, None, true).is_err());
        assert!(cmd_macros(2000, Some(80.0), Some("weight_loss"), None, true).is_ok());
    }

    #[tokio::test]
    async fn test_cmd_bodyfat_offline_save() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let backend = BackendClient::new("http://127.0.0.1:1").unwrap();
        cmd_bodyfat(
            &svc,
            &backend,
            &measurements(),
            Some(22.0),
            Some("metric"),
            true,
            Some(15.0),
            true,
        )
        .await
        .unwrap();

        let profile = svc.get_profile().unwrap().unwrap();
        assert_eq!(profile.current_body_fat_pct, Some(22.0));
        assert_eq!(profile.target_body_fat_pct, Some(15.0));
    }

    #[tokio::test]
    async fn test_cmd_bodyfat_save_requires_target() {
        let svc = MacroMateService::new_in_memory().unwrap();
        let backend = BackendClient::new("http://127.0.0.1:1").unwrap();
        let err = cmd_bodyfat(
            &svc,
            &backend,
            &measurements(),
            Some(22.0),
            None,
            true,
            None,
            true,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("--target"));
    }
}
