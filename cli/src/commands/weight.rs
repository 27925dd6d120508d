use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macromate_core::calculators::UnitSystem;
use macromate_core::models::WeightLogEntry;
use macromate_core::service::MacroMateService;

use super::helpers::{format_weight, json_error, no_neg_zero, parse_date, resolve_unit};

pub(crate) fn cmd_weight_log(
    svc: &MacroMateService,
    value: f64,
    body_fat: Option<f64>,
    date: Option<String>,
    unit: Option<&str>,
    json: bool,
) -> Result<()> {
    if value <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    let unit = resolve_unit(svc, unit)?;
    let weight_kg = no_neg_zero(unit.weight_to_kg(value));
    if unit == UnitSystem::Imperial {
        eprintln!("Converting {value:.1} lbs -> {weight_kg:.2} kg");
    }

    let date = parse_date(date)?;
    let entry = svc.add_weight_entry(date, weight_kg, body_fat)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print!(
            "Logged {} for {}",
            format_weight(entry.weight_kg, unit),
            entry.date.format("%Y-%m-%d")
        );
        if let Some(bf) = entry.body_fat_pct {
            print!(" ({bf:.1}% body fat)");
        }
        println!();
    }

    Ok(())
}

pub(crate) fn print_weight_table(entries: &[WeightLogEntry], unit: UnitSystem) {
    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Change")]
        change: String,
        #[tabled(rename = "Body fat")]
        body_fat: String,
    }

    let mut previous: Option<f64> = None;
    let rows: Vec<WeightRow> = entries
        .iter()
        .map(|e| {
            let change = previous.map_or_else(
                || "-".to_string(),
                |p| format!("{:+.1}", no_neg_zero(unit.weight_from_kg(e.weight_kg - p))),
            );
            previous = Some(e.weight_kg);
            WeightRow {
                id: e.id,
                date: e.date.format("%Y-%m-%d").to_string(),
                weight: format_weight(e.weight_kg, unit),
                change,
                body_fat: e
                    .body_fat_pct
                    .map_or_else(|| "-".to_string(), |bf| format!("{bf:.1}%")),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_weight_history(
    svc: &MacroMateService,
    days: Option<u32>,
    unit: Option<&str>,
    json: bool,
) -> Result<()> {
    let unit = resolve_unit(svc, unit)?;
    let entries = svc.get_weight_log(days.map(i64::from))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `macromate weight log` to record your weight.");
    } else {
        print_weight_table(&entries, unit);
    }

    Ok(())
}

pub(crate) fn cmd_weight_delete(svc: &MacroMateService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_weight_entry(id)? {
        if json {
            println!("{}", json_error(&format!("Weight entry {id} not found")));
        } else {
            eprintln!("Weight entry {id} not found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted weight entry {id}");
    }

    Ok(())
}
