use anyhow::Result;
use std::process;

use macromate_core::service::MacroMateService;

use super::helpers::{format_weight, json_error, resolve_unit, today};
use super::weight::print_weight_table;

const BAR_WIDTH: usize = 30;

/// `[#########.....................]  30%`
fn progress_bar(percent: i64) -> String {
    let pct = usize::try_from(percent.clamp(0, 100)).unwrap_or(0);
    let filled = pct * BAR_WIDTH / 100;
    format!(
        "[{}{}] {pct:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}

pub(crate) fn cmd_dashboard(
    svc: &MacroMateService,
    unit: Option<&str>,
    show_log: bool,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let Some(dashboard) = svc.dashboard(today())? else {
        if json {
            println!("{}", json_error("No goals set"));
        } else {
            eprintln!("No goals set. Use `macromate goals set` to start tracking.");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let profile = &dashboard.profile;
    println!(
        "=== Progress (day {} since {}) ===\n",
        dashboard.days_tracked,
        profile.start_date.format("%Y-%m-%d")
    );

    println!(
        "  Weight    {}  now {}, goal {}",
        progress_bar(dashboard.weight_progress),
        format_weight(profile.current_weight_kg, unit),
        format_weight(profile.goal_weight_kg, unit)
    );
    let diff = dashboard.weight_difference_kg;
    if diff.abs() < 0.05 {
        println!("            Goal weight reached");
    } else {
        let direction = if diff > 0.0 { "to lose" } else { "to gain" };
        println!("            {} {direction}", format_weight(diff.abs(), unit));
    }

    if let (Some(progress), Some(current)) =
        (dashboard.body_fat_progress, profile.current_body_fat_pct)
    {
        let target = profile
            .target_body_fat_pct
            .map_or_else(|| "no target".to_string(), |t| format!("target {t:.1}%"));
        println!(
            "  Body fat  {}  now {current:.1}%, {target}",
            progress_bar(progress)
        );
        if let Some(diff) = dashboard.body_fat_difference {
            println!("            {:.1} points to go", diff.abs());
        }
    }

    if let Some(latest) = &dashboard.latest_entry {
        println!(
            "\n  Last weigh-in: {} on {}",
            format_weight(latest.weight_kg, unit),
            latest.date.format("%Y-%m-%d")
        );
    }

    if show_log && !dashboard.weight_log.is_empty() {
        println!();
        print_weight_table(&dashboard.weight_log, unit);
    }

    Ok(())
}
