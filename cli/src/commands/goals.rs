use anyhow::Result;
use std::process;

use macromate_core::calculators::{CalorieGoal, UnitSystem};
use macromate_core::models::{GoalSettings, Profile};
use macromate_core::service::MacroMateService;

use super::helpers::{format_weight, json_error, print_json, resolve_unit, today};

fn print_profile(profile: &Profile, unit: UnitSystem) {
    println!(
        "Weight: {} -> goal {}",
        format_weight(profile.current_weight_kg, unit),
        format_weight(profile.goal_weight_kg, unit)
    );
    match (profile.current_body_fat_pct, profile.target_body_fat_pct) {
        (Some(current), Some(target)) => println!("Body fat: {current:.1}% -> target {target:.1}%"),
        (Some(current), None) => println!("Body fat: {current:.1}%"),
        (None, Some(target)) => println!("Body fat target: {target:.1}%"),
        (None, None) => {}
    }
    println!("Tracking since {}", profile.start_date.format("%Y-%m-%d"));
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_goals_set(
    svc: &MacroMateService,
    current: f64,
    goal: f64,
    current_bf: Option<f64>,
    target_bf: Option<f64>,
    unit: Option<&str>,
    keep_log: bool,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let settings = GoalSettings {
        current_weight_kg: unit.weight_to_kg(current),
        goal_weight_kg: unit.weight_to_kg(goal),
        current_body_fat_pct: current_bf,
        target_body_fat_pct: target_bf,
    };

    if keep_log {
        let profile = svc.update_goals(&settings, today())?;
        if json {
            return print_json(&profile);
        }
        println!("Goals updated");
        print_profile(&profile, unit);
        return Ok(());
    }

    let dashboard = svc.set_goals(&settings, today())?;
    if json {
        return print_json(&dashboard);
    }
    println!("Goals set. Your weight log starts today");
    print_profile(&dashboard.profile, unit);
    Ok(())
}

pub(crate) fn cmd_goals_show(svc: &MacroMateService, unit: Option<&str>, json: bool) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let Some(profile) = svc.get_profile()? else {
        if json {
            println!("{}", json_error("No goals set"));
        } else {
            eprintln!("No goals set. Use `macromate goals set` to start tracking.");
        }
        process::exit(2);
    };
    let daily = svc.daily_goals()?;

    if json {
        let value = serde_json::json!({
            "profile": profile,
            "daily_goals": daily,
        });
        return print_json(&value);
    }

    print_profile(&profile, unit);
    let source = if profile.daily_calorie_goal.is_some() {
        profile.goal_type.label()
    } else {
        "default"
    };
    println!(
        "Daily goal: {} kcal | P:{}g C:{}g F:{}g ({source})",
        daily.calories, daily.protein_g, daily.carbs_g, daily.fat_g
    );
    Ok(())
}

pub(crate) fn cmd_goals_clear(svc: &MacroMateService, json: bool) -> Result<()> {
    let cleared = svc.clear_progress()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": cleared }));
    } else if cleared {
        println!("Cleared goals and weight log");
    } else {
        println!("Nothing to clear");
    }

    Ok(())
}

pub(crate) fn cmd_goals_calories(
    svc: &MacroMateService,
    calories: i64,
    goal_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let goal_type = match goal_type {
        Some(g) => g.parse::<CalorieGoal>()?,
        None => svc
            .get_profile()?
            .map(|p| p.goal_type)
            .unwrap_or_default(),
    };
    let profile = svc.set_calorie_goal(calories, goal_type)?;
    let daily = svc.daily_goals()?;

    if json {
        return print_json(&daily);
    }

    println!(
        "Daily goal set to {calories} kcal ({})",
        profile.goal_type.label()
    );
    println!(
        "  Protein: {}g  Carbs: {}g  Fat: {}g",
        daily.protein_g, daily.carbs_g, daily.fat_g
    );
    Ok(())
}

pub(crate) fn cmd_units(svc: &MacroMateService, system: Option<&str>, json: bool) -> Result<()> {
    let unit = match system {
        Some(s) => {
            let unit: UnitSystem = s.parse()?;
            svc.set_default_unit(unit)?;
            unit
        }
        None => svc.default_unit()?,
    };

    if json {
        println!("{}", serde_json::json!({ "unit_system": unit }));
        return Ok(());
    }
    let name = match unit {
        UnitSystem::Metric => "metric (kg, cm)",
        UnitSystem::Imperial => "imperial (lbs, inches)",
    };
    if system.is_some() {
        println!("Default unit system set to {name}");
    } else {
        println!("Default unit system: {name}");
    }

    Ok(())
}
