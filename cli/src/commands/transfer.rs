use anyhow::{Context, Result};
use std::path::Path;

use macromate_core::models::ProgressData;
use macromate_core::service::MacroMateService;

use super::helpers::{print_json, today};

/// Write the progress blob to `file`, or stdout when no file is given.
pub(crate) fn cmd_export(svc: &MacroMateService, file: Option<&Path>, json: bool) -> Result<()> {
    let data = svc.export_progress()?;
    let body = serde_json::to_string_pretty(&data)?;

    match file {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if json {
                return print_json(&export_summary(&data, path));
            }
            eprintln!(
                "Exported {} weight entries and {} days of food to {}",
                data.weight_log.len(),
                data.food_log.len(),
                path.display()
            );
        }
        None => println!("{body}"),
    }
    Ok(())
}

fn export_summary(data: &ProgressData, path: &Path) -> serde_json::Value {
    serde_json::json!({
        "file": path.display().to_string(),
        "goals_exported": data.profile.current_weight.is_some(),
        "weight_entries": data.weight_log.len(),
        "food_days": data.food_log.len(),
    })
}

pub(crate) fn cmd_import(svc: &MacroMateService, file: &Path, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data: ProgressData = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid progress file {}", file.display()))?;

    let summary = svc.import_progress(&data, today())?;

    if json {
        return print_json(&summary);
    }

    if summary.profile_imported {
        println!(
            "Imported goals and {} weight entries",
            summary.weight_entries_imported
        );
    } else {
        println!("No goals in file; existing goals kept");
    }
    println!("Imported {} food items", summary.food_items_imported);
    Ok(())
}
