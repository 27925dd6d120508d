use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;

use crate::calculators::{CalorieGoal, DailyGoals, UnitSystem};
use crate::db::Database;
use crate::models::{
    self, DailyLog, ExportFoodItem, ExportProfile, ExportWeightEntry, FoodLogItem, GoalSettings,
    ImportSummary, NewFoodLogItem, NewWeightLogEntry, Profile, ProgressData, WeightLogEntry,
};
use crate::progress::Dashboard;

const UNIT_SETTING: &str = "unit_system";

/// An exported blob that passed validation and can be written as is.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    profile: Option<Profile>,
    weight_entries: Vec<NewWeightLogEntry>,
    food_items: Vec<(NewFoodLogItem, Option<String>)>,
}

/// Progress-tracking and food-log operations over a [`Database`].
///
/// Holds the rules the web dashboard applied to its stored blob: setting goals
/// restarts the log, the profile follows the latest weigh-in, and the last
/// remaining entry cannot be deleted.
pub struct MacroMateService {
    db: Database,
}

impl MacroMateService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    // --- Profile & goals ---

    pub fn get_profile(&self) -> Result<Option<Profile>> {
        self.db.get_profile()
    }

    fn require_profile(&self) -> Result<Profile> {
        match self.db.get_profile()? {
            Some(profile) => Ok(profile),
            None => bail!("No goals set yet. Set your current and goal weight first"),
        }
    }

    /// Start tracking from scratch: the profile is rewritten with
    /// `start_date = today` and the log restarts with a single entry.
    /// A saved calorie goal carries over.
    pub fn set_goals(&self, goals: &GoalSettings, today: NaiveDate) -> Result<Dashboard> {
        models::validate_goal_settings(goals)?;
        let previous = self.db.get_profile()?;

        let profile = Profile {
            current_weight_kg: goals.current_weight_kg,
            goal_weight_kg: goals.goal_weight_kg,
            current_body_fat_pct: goals.current_body_fat_pct,
            target_body_fat_pct: goals.target_body_fat_pct,
            start_date: today,
            daily_calorie_goal: previous.as_ref().and_then(|p| p.daily_calorie_goal),
            goal_type: previous.map(|p| p.goal_type).unwrap_or_default(),
            updated_at: String::new(),
        };
        self.db.save_profile(&profile)?;
        let cleared = self.db.clear_weight_log()?;
        self.db.insert_weight_entry(&NewWeightLogEntry {
            date: today,
            weight_kg: goals.current_weight_kg,
            body_fat_pct: goals.current_body_fat_pct,
        })?;
        tracing::info!(cleared, "goals set, weight log restarted");

        self.require_dashboard(today)
    }

    /// Overwrite the goal fields without touching the weight log.
    pub fn update_goals(&self, goals: &GoalSettings, today: NaiveDate) -> Result<Profile> {
        models::validate_goal_settings(goals)?;
        let previous = self.db.get_profile()?;
        let profile = Profile {
            current_weight_kg: goals.current_weight_kg,
            goal_weight_kg: goals.goal_weight_kg,
            current_body_fat_pct: goals.current_body_fat_pct,
            target_body_fat_pct: goals.target_body_fat_pct,
            start_date: previous.as_ref().map_or(today, |p| p.start_date),
            daily_calorie_goal: previous.as_ref().and_then(|p| p.daily_calorie_goal),
            goal_type: previous.map(|p| p.goal_type).unwrap_or_default(),
            updated_at: String::new(),
        };
        self.db.save_profile(&profile)
    }

    /// Store the daily calorie goal picked from the calorie calculator.
    /// Food-log macro goals are derived from it and the goal type.
    pub fn set_calorie_goal(&self, calories: i64, goal_type: CalorieGoal) -> Result<Profile> {
        if calories <= 0 {
            bail!("Calorie goal must be greater than 0");
        }
        let mut profile = self.require_profile()?;
        profile.daily_calorie_goal = Some(calories);
        profile.goal_type = goal_type;
        self.db.save_profile(&profile)
    }

    /// Remove the profile and the whole weight log.
    pub fn clear_progress(&self) -> Result<bool> {
        let had_profile = self.db.clear_profile()?;
        let entries = self.db.clear_weight_log()?;
        Ok(had_profile || entries > 0)
    }

    // --- Weight log ---

    pub fn get_weight_log(&self, days: Option<i64>) -> Result<Vec<WeightLogEntry>> {
        self.db.get_weight_log(days)
    }

    /// Record a weigh-in. The profile's current weight becomes this entry's
    /// weight; current body fat only changes when the entry has one.
    pub fn add_weight_entry(
        &self,
        date: NaiveDate,
        weight_kg: f64,
        body_fat_pct: Option<f64>,
    ) -> Result<WeightLogEntry> {
        models::validate_weight(weight_kg)?;
        if let Some(bf) = body_fat_pct {
            models::validate_body_fat(bf)?;
        }
        let mut profile = self.require_profile()?;

        let entry = self.db.insert_weight_entry(&NewWeightLogEntry {
            date,
            weight_kg,
            body_fat_pct,
        })?;

        profile.current_weight_kg = weight_kg;
        if body_fat_pct.is_some() {
            profile.current_body_fat_pct = body_fat_pct;
        }
        self.db.save_profile(&profile)?;
        Ok(entry)
    }

    /// Delete a weigh-in. Returns `false` when no entry has this id. The last
    /// remaining entry cannot be deleted.
    pub fn delete_weight_entry(&self, id: i64) -> Result<bool> {
        if self.db.get_weight_entry(id)?.is_none() {
            return Ok(false);
        }
        if self.db.count_weight_entries()? <= 1 {
            bail!("Cannot delete the only entry. At least one entry is needed to track progress");
        }
        self.db.delete_weight_entry(id)?;

        let latest = self.db.get_weight_log(None)?.pop();
        if let (Some(mut profile), Some(latest)) = (self.db.get_profile()?, latest) {
            profile.current_weight_kg = latest.weight_kg;
            if latest.body_fat_pct.is_some() {
                profile.current_body_fat_pct = latest.body_fat_pct;
            }
            self.db.save_profile(&profile)?;
        }
        Ok(true)
    }

    /// "Save to dashboard" from the body-fat calculator.
    ///
    /// Keeps any existing current/goal weight and start date (defaulting them
    /// to the measured weight and `today`), records the measured and target
    /// body fat, and seeds the log when it is empty.
    pub fn save_body_fat_result(
        &self,
        weight_kg: f64,
        body_fat_pct: f64,
        target_body_fat_pct: f64,
        today: NaiveDate,
    ) -> Result<Dashboard> {
        models::validate_weight(weight_kg)?;
        models::validate_body_fat(body_fat_pct)?;
        models::validate_body_fat(target_body_fat_pct)?;

        let existing = self.db.get_profile()?;
        let profile = match existing {
            Some(mut profile) => {
                profile.current_body_fat_pct = Some(body_fat_pct);
                profile.target_body_fat_pct = Some(target_body_fat_pct);
                profile
            }
            None => Profile {
                current_weight_kg: weight_kg,
                goal_weight_kg: weight_kg,
                current_body_fat_pct: Some(body_fat_pct),
                target_body_fat_pct: Some(target_body_fat_pct),
                start_date: today,
                daily_calorie_goal: None,
                goal_type: CalorieGoal::Maintain,
                updated_at: String::new(),
            },
        };
        self.db.save_profile(&profile)?;

        if self.db.count_weight_entries()? == 0 {
            self.db.insert_weight_entry(&NewWeightLogEntry {
                date: today,
                weight_kg,
                body_fat_pct: Some(body_fat_pct),
            })?;
        }

        self.require_dashboard(today)
    }

    // --- Dashboard ---

    /// The dashboard, or `None` before any goals are set.
    pub fn dashboard(&self, today: NaiveDate) -> Result<Option<Dashboard>> {
        let Some(profile) = self.db.get_profile()? else {
            return Ok(None);
        };
        let log = self.db.get_weight_log(None)?;
        Ok(Some(Dashboard::build(profile, log, today)))
    }

    fn require_dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let profile = self.require_profile()?;
        let log = self.db.get_weight_log(None)?;
        Ok(Dashboard::build(profile, log, today))
    }

    // --- Food log ---

    pub fn daily_goals(&self) -> Result<DailyGoals> {
        Ok(DailyGoals::from_profile(self.db.get_profile()?.as_ref()))
    }

    pub fn daily_log(&self, date: NaiveDate) -> Result<DailyLog> {
        let goals = self.daily_goals()?;
        self.db.build_daily_log(date, goals)
    }

    pub fn log_food(&self, item: &NewFoodLogItem) -> Result<FoodLogItem> {
        models::validate_food_item(item)?;
        let meal_type = models::validate_meal_type(&item.meal_type)?;
        self.db.insert_food_item(&NewFoodLogItem {
            meal_type,
            ..item.clone()
        })
    }

    pub fn delete_food(&self, id: i64) -> Result<bool> {
        self.db.delete_food_item(id)
    }

    pub fn get_food_log_dates(&self, limit: i64) -> Result<Vec<String>> {
        self.db.get_food_log_dates(limit)
    }

    // --- Preferences ---

    pub fn default_unit(&self) -> Result<UnitSystem> {
        match self.db.get_setting(UNIT_SETTING)? {
            Some(value) => value.parse(),
            None => Ok(UnitSystem::Metric),
        }
    }

    pub fn set_default_unit(&self, unit: UnitSystem) -> Result<()> {
        let value = match unit {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        };
        self.db.set_setting(UNIT_SETTING, value)
    }

    // --- Export / Import ---

    pub fn export_progress(&self) -> Result<ProgressData> {
        let profile = self
            .db
            .get_profile()?
            .map(|p| ExportProfile {
                current_weight: Some(p.current_weight_kg),
                goal_weight: Some(p.goal_weight_kg),
                current_body_fat: p.current_body_fat_pct,
                target_body_fat: p.target_body_fat_pct,
                start_date: Some(p.start_date.format("%Y-%m-%d").to_string()),
                daily_calorie_goal: p.daily_calorie_goal,
                goal_type: Some(p.goal_type.key().to_string()),
            })
            .unwrap_or_default();

        let weight_log = self
            .db
            .get_weight_log(None)?
            .into_iter()
            .map(|e| ExportWeightEntry {
                date: e.date.format("%Y-%m-%d").to_string(),
                weight: e.weight_kg,
                body_fat: e.body_fat_pct,
            })
            .collect();

        let mut food_log: BTreeMap<String, Vec<ExportFoodItem>> = BTreeMap::new();
        for item in self.db.get_all_food_items()? {
            food_log
                .entry(item.date.clone())
                .or_default()
                .push(ExportFoodItem {
                    name: item.name,
                    calories: item.calories,
                    protein: item.protein_g,
                    carbs: item.carbs_g,
                    fat: item.fat_g,
                    meal_type: item.meal_type,
                    timestamp: Some(item.timestamp),
                });
        }

        Ok(ProgressData {
            profile,
            weight_log,
            food_log,
        })
    }

    /// Replace the profile and weight log with an exported blob and merge its
    /// food log. Everything is validated before anything is written.
    pub fn import_progress(&self, data: &ProgressData, today: NaiveDate) -> Result<ImportSummary> {
        let prepared = Self::prepare_import(data, today)?;
        self.apply_import(prepared)
    }

    /// Validate an exported blob without touching the store. Errors here are
    /// problems with the blob itself.
    pub fn prepare_import(data: &ProgressData, today: NaiveDate) -> Result<PreparedImport> {
        let profile = Self::profile_from_export(&data.profile, today)?;

        let mut weight_entries = Vec::with_capacity(data.weight_log.len());
        for entry in &data.weight_log {
            models::validate_export_weight_entry(entry)?;
            weight_entries.push(NewWeightLogEntry {
                date: models::parse_iso_date(&entry.date)?,
                weight_kg: entry.weight,
                body_fat_pct: entry.body_fat,
            });
        }
        if profile.is_some() && weight_entries.is_empty() {
            tracing::warn!("imported profile has an empty weight log");
        }

        let mut food_items = Vec::new();
        for (date, items) in &data.food_log {
            let day = models::parse_iso_date(date)?;
            for item in items {
                let new_item = NewFoodLogItem {
                    date: day,
                    meal_type: models::validate_meal_type(&item.meal_type)?,
                    name: item.name.trim().to_string(),
                    calories: item.calories,
                    protein_g: item.protein,
                    carbs_g: item.carbs,
                    fat_g: item.fat,
                };
                models::validate_food_item(&new_item)
                    .map_err(|e| anyhow::anyhow!("Food item '{}' on {date}: {e}", item.name))?;
                food_items.push((new_item, item.timestamp.clone()));
            }
        }

        Ok(PreparedImport {
            profile,
            weight_entries,
            food_items,
        })
    }

    /// Write a validated blob. Food items already present are skipped: same
    /// date, name and timestamp, or for items without a timestamp the same
    /// date, name, calories and meal.
    pub fn apply_import(&self, prepared: PreparedImport) -> Result<ImportSummary> {
        let PreparedImport {
            profile,
            weight_entries,
            food_items,
        } = prepared;

        let profile_imported = profile.is_some();
        let mut weight_entries_imported = 0;
        if let Some(profile) = profile {
            self.db.save_profile(&profile)?;
            self.db.clear_weight_log()?;
            for entry in &weight_entries {
                self.db.insert_weight_entry(entry)?;
                weight_entries_imported += 1;
            }
        }

        // Existing untimed matches still available to absorb a blob item
        let mut unclaimed: HashMap<(String, String, u64, String), i64> = HashMap::new();
        let mut food_items_imported = 0;
        for (item, timestamp) in food_items {
            let date = item.date.format("%Y-%m-%d").to_string();
            let timestamp = match timestamp {
                Some(ts) => {
                    if self.db.food_item_exists(&date, &item.name, &ts)? {
                        continue;
                    }
                    ts
                }
                None => {
                    let key = (
                        date.clone(),
                        item.name.clone(),
                        item.calories.to_bits(),
                        item.meal_type.clone(),
                    );
                    let remaining = match unclaimed.entry(key) {
                        Entry::Occupied(e) => e.into_mut(),
                        Entry::Vacant(e) => e.insert(self.db.count_matching_food_items(
                            &date,
                            &item.name,
                            item.calories,
                            &item.meal_type,
                        )?),
                    };
                    if *remaining > 0 {
                        *remaining -= 1;
                        continue;
                    }
                    chrono::Local::now().to_rfc3339()
                }
            };
            self.db.insert_food_item_at(&item, &timestamp)?;
            food_items_imported += 1;
        }

        tracing::info!(
            profile_imported,
            weight_entries_imported,
            food_items_imported,
            "progress imported"
        );

        Ok(ImportSummary {
            profile_imported,
            weight_entries_imported,
            food_items_imported,
        })
    }

    /// `None` when the blob carries no profile (both weights missing).
    fn profile_from_export(p: &ExportProfile, today: NaiveDate) -> Result<Option<Profile>> {
        let (current, goal) = match (p.current_weight, p.goal_weight) {
            (None, None) => return Ok(None),
            (Some(current), Some(goal)) => (current, goal),
            _ => bail!("Imported profile needs both currentWeight and goalWeight"),
        };
        models::validate_goal_settings(&GoalSettings {
            current_weight_kg: current,
            goal_weight_kg: goal,
            current_body_fat_pct: p.current_body_fat,
            target_body_fat_pct: p.target_body_fat,
        })?;
        let start_date = match &p.start_date {
            Some(d) => models::parse_iso_date(d)?,
            None => today,
        };
        let goal_type = match &p.goal_type {
            Some(g) => g.parse()?,
            None => CalorieGoal::Maintain,
        };
        if p.daily_calorie_goal.is_some_and(|c| c <= 0) {
            bail!("Imported calorie goal must be greater than 0");
        }

        Ok(Some(Profile {
            current_weight_kg: current,
            goal_weight_kg: goal,
            current_body_fat_pct: p.current_body_fat,
            target_body_fat_pct: p.target_body_fat,
            start_date,
            daily_calorie_goal: p.daily_calorie_goal,
            goal_type,
            updated_at: String::new(),
        }))
    }
}
