use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};

use crate::calculators::{DailyGoals, daily_progress};
use crate::models::{
    DailyLog, FoodLogItem, MEAL_TYPES, MacroTotals, MealGroup, NewFoodLogItem, NewWeightLogEntry,
    Profile, WeightLogEntry,
};

const SCHEMA_VERSION: i64 = 3;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    current_weight_kg REAL NOT NULL,
                    goal_weight_kg REAL NOT NULL,
                    current_body_fat_pct REAL,
                    target_body_fat_pct REAL,
                    start_date TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    weight_kg REAL NOT NULL,
                    body_fat_pct REAL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS food_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    name TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein_g REAL NOT NULL DEFAULT 0,
                    carbs_g REAL NOT NULL DEFAULT 0,
                    fat_g REAL NOT NULL DEFAULT 0,
                    timestamp TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_weight_log_date ON weight_log(date);
                CREATE INDEX IF NOT EXISTS idx_food_log_date ON food_log(date);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            // Calorie goal saved from the calorie calculator
            self.conn.execute_batch(
                "ALTER TABLE profile ADD COLUMN daily_calorie_goal INTEGER;
                 ALTER TABLE profile ADD COLUMN goal_type TEXT NOT NULL DEFAULT 'maintain';
                 PRAGMA user_version = 2;",
            )?;
        }

        if version < 3 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                PRAGMA user_version = 3;",
            )?;
        }

        if version < SCHEMA_VERSION {
            tracing::info!(from = version, to = SCHEMA_VERSION, "migrated database schema");
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn parse_date_column(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        let start_date: String = row.get(4)?;
        let goal_type: String = row.get(7)?;
        Ok(Profile {
            current_weight_kg: row.get(0)?,
            goal_weight_kg: row.get(1)?,
            current_body_fat_pct: row.get(2)?,
            target_body_fat_pct: row.get(3)?,
            start_date: Self::parse_date_column(4, &start_date)?,
            updated_at: row.get(5)?,
            daily_calorie_goal: row.get(6)?,
            goal_type: goal_type.parse().unwrap_or_default(),
        })
    }

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightLogEntry> {
        let date_str: String = row.get(1)?;
        Ok(WeightLogEntry {
            id: row.get(0)?,
            date: Self::parse_date_column(1, &date_str)?,
            weight_kg: row.get(2)?,
            body_fat_pct: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn food_item_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodLogItem> {
        Ok(FoodLogItem {
            id: row.get(0)?,
            date: row.get(1)?,
            meal_type: row.get(2)?,
            name: row.get(3)?,
            calories: row.get(4)?,
            protein_g: row.get(5)?,
            carbs_g: row.get(6)?,
            fat_g: row.get(7)?,
            timestamp: row.get(8)?,
        })
    }

    // --- Profile ---

    /// Write the single profile row, replacing whatever was there.
    pub fn save_profile(&self, profile: &Profile) -> Result<Profile> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO profile (id, current_weight_kg, goal_weight_kg, current_body_fat_pct,
                                  target_body_fat_pct, start_date, updated_at,
                                  daily_calorie_goal, goal_type)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                current_weight_kg = excluded.current_weight_kg,
                goal_weight_kg = excluded.goal_weight_kg,
                current_body_fat_pct = excluded.current_body_fat_pct,
                target_body_fat_pct = excluded.target_body_fat_pct,
                start_date = excluded.start_date,
                updated_at = excluded.updated_at,
                daily_calorie_goal = excluded.daily_calorie_goal,
                goal_type = excluded.goal_type",
            params![
                profile.current_weight_kg,
                profile.goal_weight_kg,
                profile.current_body_fat_pct,
                profile.target_body_fat_pct,
                profile.start_date.format("%Y-%m-%d").to_string(),
                now,
                profile.daily_calorie_goal,
                profile.goal_type.key(),
            ],
        )?;
        self.get_profile()?
            .context("Profile not found after save")
    }

    pub fn get_profile(&self) -> Result<Option<Profile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT current_weight_kg, goal_weight_kg, current_body_fat_pct, target_body_fat_pct,
                        start_date, updated_at, daily_calorie_goal, goal_type
                 FROM profile WHERE id = 1",
                [],
                Self::profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    pub fn clear_profile(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM profile", [])?;
        Ok(rows > 0)
    }

    // --- Weight Log ---

    pub fn insert_weight_entry(&self, entry: &NewWeightLogEntry) -> Result<WeightLogEntry> {
        let now = Local::now().to_rfc3339();
        let date_str = entry.date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO weight_log (date, weight_kg, body_fat_pct, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![date_str, entry.weight_kg, entry.body_fat_pct, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_weight_entry(id)?
            .context("Inserted weight entry could not be read back")
    }

    /// `None` only when no row has this id; query failures are errors.
    pub fn get_weight_entry(&self, id: i64) -> Result<Option<WeightLogEntry>> {
        let entry = self
            .conn
            .query_row(
                "SELECT id, date, weight_kg, body_fat_pct, created_at
                 FROM weight_log WHERE id = ?1",
                params![id],
                Self::weight_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// The weight log sorted by date ascending. With `days`, only the most
    /// recent `days` entries are kept.
    pub fn get_weight_log(&self, days: Option<i64>) -> Result<Vec<WeightLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, weight_kg, body_fat_pct, created_at FROM (
                SELECT id, date, weight_kg, body_fat_pct, created_at
                FROM weight_log
                ORDER BY date DESC, id DESC
                LIMIT ?1
             )
             ORDER BY date ASC, id ASC",
        )?;
        // LIMIT -1 means no limit in SQLite
        let limit = days.unwrap_or(-1);
        let entries = stmt
            .query_map(params![limit], Self::weight_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count_weight_entries(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM weight_log", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn delete_weight_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM weight_log WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn clear_weight_log(&self) -> Result<i64> {
        let rows = self.conn.execute("DELETE FROM weight_log", [])?;
        Ok(i64::try_from(rows)?)
    }

    // --- Food Log ---

    pub fn insert_food_item(&self, item: &NewFoodLogItem) -> Result<FoodLogItem> {
        self.insert_food_item_at(item, &Local::now().to_rfc3339())
    }

    /// Insert with an explicit timestamp (imports keep the original one).
    pub fn insert_food_item_at(&self, item: &NewFoodLogItem, timestamp: &str) -> Result<FoodLogItem> {
        let date_str = item.date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO food_log (date, meal_type, name, calories, protein_g, carbs_g, fat_g, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                date_str,
                item.meal_type,
                item.name.trim(),
                item.calories,
                item.protein_g,
                item.carbs_g,
                item.fat_g,
                timestamp,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_food_item(id)
    }

    pub fn get_food_item(&self, id: i64) -> Result<FoodLogItem> {
        self.conn
            .query_row(
                "SELECT id, date, meal_type, name, calories, protein_g, carbs_g, fat_g, timestamp
                 FROM food_log WHERE id = ?1",
                params![id],
                Self::food_item_from_row,
            )
            .context("Food log item not found")
    }

    pub fn get_food_log(&self, date: NaiveDate) -> Result<Vec<FoodLogItem>> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, date, meal_type, name, calories, protein_g, carbs_g, fat_g, timestamp
             FROM food_log WHERE date = ?1
             ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![date_str], Self::food_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn get_all_food_items(&self) -> Result<Vec<FoodLogItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, meal_type, name, calories, protein_g, carbs_g, fat_g, timestamp
             FROM food_log ORDER BY date, id",
        )?;
        let items = stmt
            .query_map([], Self::food_item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn delete_food_item(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_log WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Dates that have food logged, newest first.
    pub fn get_food_log_dates(&self, limit: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date FROM food_log
             ORDER BY date DESC
             LIMIT ?1",
        )?;
        let dates = stmt
            .query_map(params![limit], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(dates)
    }

    pub fn food_item_exists(&self, date: &str, name: &str, timestamp: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM food_log WHERE date = ?1 AND name = ?2 AND timestamp = ?3)",
            params![date, name, timestamp],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Food items on `date` with this name, calorie count and meal.
    pub fn count_matching_food_items(
        &self,
        date: &str,
        name: &str,
        calories: f64,
        meal_type: &str,
    ) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM food_log
             WHERE date = ?1 AND name = ?2 AND calories = ?3 AND meal_type = ?4",
            params![date, name, calories, meal_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // --- Daily Log ---

    pub fn build_daily_log(&self, date: NaiveDate, goals: DailyGoals) -> Result<DailyLog> {
        let items = self.get_food_log(date)?;
        let mut meals: Vec<MealGroup> = Vec::new();

        for meal_type in MEAL_TYPES {
            let meal_items: Vec<FoodLogItem> = items
                .iter()
                .filter(|i| i.meal_type == *meal_type)
                .cloned()
                .collect();

            if meal_items.is_empty() {
                continue;
            }

            let subtotal = MacroTotals::of_items(&meal_items);
            meals.push(MealGroup {
                meal_type: (*meal_type).to_string(),
                items: meal_items,
                subtotal,
            });
        }

        let totals = MacroTotals::of_items(&items);
        let progress = daily_progress(&totals, &goals);

        Ok(DailyLog {
            date: date.format("%Y-%m-%d").to_string(),
            meals,
            totals,
            goals,
            progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::CalorieGoal;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn sample_profile() -> Profile {
        Profile {
            current_weight_kg: 85.0,
            goal_weight_kg: 78.0,
            current_body_fat_pct: Some(24.0),
            target_body_fat_pct: Some(16.0),
            start_date: date("2024-06-01"),
            daily_calorie_goal: None,
            goal_type: CalorieGoal::Maintain,
            updated_at: String::new(),
        }
    }

    fn food(d: &str, meal: &str, name: &str, calories: f64) -> NewFoodLogItem {
        NewFoodLogItem {
            date: date(d),
            meal_type: meal.to_string(),
            name: name.to_string(),
            calories,
            protein_g: 10.0,
            carbs_g: 20.0,
            fat_g: 5.0,
        }
    }

    #[test]
    fn test_profile_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_profile().unwrap().is_none());

        let saved = db.save_profile(&sample_profile()).unwrap();
        assert!((saved.current_weight_kg - 85.0).abs() < f64::EPSILON);
        assert_eq!(saved.start_date, date("2024-06-01"));
        assert_eq!(saved.current_body_fat_pct, Some(24.0));
        assert!(!saved.updated_at.is_empty());
        assert_eq!(saved.goal_type, CalorieGoal::Maintain);
    }

    #[test]
    fn test_profile_overwrite() {
        let db = Database::open_in_memory().unwrap();
        db.save_profile(&sample_profile()).unwrap();

        let mut updated = sample_profile();
        updated.current_weight_kg = 83.5;
        updated.target_body_fat_pct = None;
        updated.daily_calorie_goal = Some(2100);
        updated.goal_type = CalorieGoal::MildLoss;
        db.save_profile(&updated).unwrap();

        let profile = db.get_profile().unwrap().unwrap();
        assert!((profile.current_weight_kg - 83.5).abs() < f64::EPSILON);
        assert!(profile.target_body_fat_pct.is_none());
        assert_eq!(profile.daily_calorie_goal, Some(2100));
        assert_eq!(profile.goal_type, CalorieGoal::MildLoss);
    }

    #[test]
    fn test_clear_profile() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.clear_profile().unwrap());
        db.save_profile(&sample_profile()).unwrap();
        assert!(db.clear_profile().unwrap());
        assert!(db.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_weight_log_sorted_by_date() {
        let db = Database::open_in_memory().unwrap();
        for (d, w) in [("2024-06-10", 84.0), ("2024-06-01", 86.0), ("2024-06-05", 85.0)] {
            db.insert_weight_entry(&NewWeightLogEntry {
                date: date(d),
                weight_kg: w,
                body_fat_pct: None,
            })
            .unwrap();
        }

        let log = db.get_weight_log(None).unwrap();
        let dates: Vec<String> = log.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-05", "2024-06-10"]);
    }

    #[test]
    fn test_weight_log_allows_duplicate_dates() {
        let db = Database::open_in_memory().unwrap();
        let entry = NewWeightLogEntry {
            date: date("2024-06-01"),
            weight_kg: 86.0,
            body_fat_pct: Some(25.0),
        };
        let first = db.insert_weight_entry(&entry).unwrap();
        let second = db.insert_weight_entry(&entry).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(db.count_weight_entries().unwrap(), 2);
    }

    #[test]
    fn test_weight_log_days_keeps_latest() {
        let db = Database::open_in_memory().unwrap();
        for (d, w) in [
            ("2024-06-01", 86.0),
            ("2024-06-02", 85.8),
            ("2024-06-03", 85.5),
            ("2024-06-04", 85.1),
        ] {
            db.insert_weight_entry(&NewWeightLogEntry {
                date: date(d),
                weight_kg: w,
                body_fat_pct: None,
            })
            .unwrap();
        }

        let log = db.get_weight_log(Some(2)).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].date, date("2024-06-03"));
        assert_eq!(log[1].date, date("2024-06-04"));
    }

    #[test]
    fn test_delete_weight_entry() {
        let db = Database::open_in_memory().unwrap();
        let entry = db
            .insert_weight_entry(&NewWeightLogEntry {
                date: date("2024-06-01"),
                weight_kg: 86.0,
                body_fat_pct: None,
            })
            .unwrap();
        assert!(db.delete_weight_entry(entry.id).unwrap());
        assert!(!db.delete_weight_entry(entry.id).unwrap());
        assert!(db.get_weight_entry(entry.id).unwrap().is_none());
    }

    #[test]
    fn test_get_weight_entry_query_failure_is_error() {
        let db = Database::open_in_memory().unwrap();
        db.conn.execute("DROP TABLE weight_log", []).unwrap();
        // A broken store must not look like a missing row
        assert!(db.get_weight_entry(1).is_err());
    }

    #[test]
    fn test_clear_weight_log() {
        let db = Database::open_in_memory().unwrap();
        for d in ["2024-06-01", "2024-06-02"] {
            db.insert_weight_entry(&NewWeightLogEntry {
                date: date(d),
                weight_kg: 80.0,
                body_fat_pct: None,
            })
            .unwrap();
        }
        assert_eq!(db.clear_weight_log().unwrap(), 2);
        assert!(db.get_weight_log(None).unwrap().is_empty());
    }

    #[test]
    fn test_food_log_by_date() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&food("2024-06-15", "breakfast", "Oatmeal", 150.0))
            .unwrap();
        db.insert_food_item(&food("2024-06-15", "lunch", "  Dal  ", 220.0))
            .unwrap();
        db.insert_food_item(&food("2024-06-16", "lunch", "Rice", 205.0))
            .unwrap();

        let items = db.get_food_log(date("2024-06-15")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Oatmeal");
        assert_eq!(items[1].name, "Dal");
        assert!(!items[0].timestamp.is_empty());

        let dates = db.get_food_log_dates(10).unwrap();
        assert_eq!(dates, vec!["2024-06-16", "2024-06-15"]);
    }

    #[test]
    fn test_delete_food_item() {
        let db = Database::open_in_memory().unwrap();
        let item = db
            .insert_food_item(&food("2024-06-15", "snack", "Apple", 95.0))
            .unwrap();
        assert!(db.delete_food_item(item.id).unwrap());
        assert!(!db.delete_food_item(item.id).unwrap());
        assert!(db.get_food_log(date("2024-06-15")).unwrap().is_empty());
    }

    #[test]
    fn test_food_item_exists() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item_at(
            &food("2024-06-15", "snack", "Apple", 95.0),
            "2024-06-15T10:00:00+00:00",
        )
        .unwrap();
        assert!(
            db.food_item_exists("2024-06-15", "Apple", "2024-06-15T10:00:00+00:00")
                .unwrap()
        );
        assert!(
            !db.food_item_exists("2024-06-15", "Apple", "2024-06-15T11:00:00+00:00")
                .unwrap()
        );
    }

    #[test]
    fn test_build_daily_log() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food_item(&food("2024-06-15", "dinner", "Paneer Tikka", 300.0))
            .unwrap();
        db.insert_food_item(&food("2024-06-15", "breakfast", "Oatmeal", 150.0))
            .unwrap();
        db.insert_food_item(&food("2024-06-15", "breakfast", "Banana", 105.0))
            .unwrap();

        let log = db
            .build_daily_log(date("2024-06-15"), DailyGoals::default())
            .unwrap();
        assert_eq!(log.date, "2024-06-15");
        assert_eq!(log.meals.len(), 2);
        assert_eq!(log.meals[0].meal_type, "breakfast");
        assert_eq!(log.meals[0].items.len(), 2);
        assert!((log.meals[0].subtotal.calories - 255.0).abs() < f64::EPSILON);
        assert_eq!(log.meals[1].meal_type, "dinner");
        assert!((log.totals.calories - 555.0).abs() < f64::EPSILON);
        assert!((log.totals.protein_g - 30.0).abs() < f64::EPSILON);
        assert!((log.progress.remaining.calories - 1445.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_build_daily_log_empty() {
        let db = Database::open_in_memory().unwrap();
        let log = db
            .build_daily_log(date("2024-06-15"), DailyGoals::default())
            .unwrap();
        assert!(log.meals.is_empty());
        assert!(log.totals.calories.abs() < f64::EPSILON);
        assert_eq!(log.goals.calories, 2000);
    }

    #[test]
    fn test_settings() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_setting("unit_system").unwrap().is_none());
        db.set_setting("unit_system", "imperial").unwrap();
        assert_eq!(
            db.get_setting("unit_system").unwrap().as_deref(),
            Some("imperial")
        );
        db.set_setting("unit_system", "metric").unwrap();
        assert_eq!(
            db.get_setting("unit_system").unwrap().as_deref(),
            Some("metric")
        );
        assert!(db.delete_setting("unit_system").unwrap());
        assert!(!db.delete_setting("unit_system").unwrap());
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macromate.db");
        {
            let db = Database::open(&path).unwrap();
            db.save_profile(&sample_profile()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(db.get_profile().unwrap().is_some());
    }
}
