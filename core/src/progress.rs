use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Profile, WeightLogEntry};

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of the distance from `start` to `goal` already covered, as a whole
/// percentage capped at 100. Distance is absolute, so direction is ignored.
#[must_use]
pub fn progress_percent(start: f64, current: f64, goal: f64) -> i64 {
    let total = (goal - start).abs();
    if total < f64::EPSILON || !total.is_finite() {
        return 0;
    }
    let covered = (current - start).abs();
    ((covered / total * 100.0).round() as i64).min(100)
}

/// Weight progress. The start point is the first log entry, or the profile's
/// current weight when the log is empty.
#[must_use]
pub fn weight_progress(profile: &Profile, log: &[WeightLogEntry]) -> i64 {
    if profile.current_weight_kg <= 0.0 || profile.goal_weight_kg <= 0.0 {
        return 0;
    }
    let start = log
        .first()
        .map_or(profile.current_weight_kg, |entry| entry.weight_kg);
    progress_percent(start, profile.current_weight_kg, profile.goal_weight_kg)
}

/// Body-fat progress, `None` when no current body fat is known.
#[must_use]
pub fn body_fat_progress(profile: &Profile, log: &[WeightLogEntry]) -> Option<i64> {
    let current = profile.current_body_fat_pct?;
    let Some(target) = profile.target_body_fat_pct else {
        return Some(0);
    };
    let start = log
        .first()
        .and_then(|entry| entry.body_fat_pct)
        .unwrap_or(current);
    Some(progress_percent(start, current, target))
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub profile: Profile,
    pub weight_log: Vec<WeightLogEntry>,
    pub latest_entry: Option<WeightLogEntry>,
    pub weight_progress: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_progress: Option<i64>,
    /// Current minus goal weight, kg.
    pub weight_difference_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_fat_difference: Option<f64>,
    pub days_tracked: i64,
}

impl Dashboard {
    /// Assemble the dashboard from a profile and its date-sorted weight log.
    #[must_use]
    pub fn build(profile: Profile, weight_log: Vec<WeightLogEntry>, today: NaiveDate) -> Self {
        let weight_progress = weight_progress(&profile, &weight_log);
        let body_fat_progress = body_fat_progress(&profile, &weight_log);
        let weight_difference_kg = round1(profile.current_weight_kg - profile.goal_weight_kg);
        let body_fat_difference = profile
            .current_body_fat_pct
            .zip(profile.target_body_fat_pct)
            .map(|(current, target)| round1(current - target));
        let days_tracked = (today - profile.start_date).num_days().max(0);
        let latest_entry = weight_log.last().cloned();

        Self {
            profile,
            weight_log,
            latest_entry,
            weight_progress,
            body_fat_progress,
            weight_difference_kg,
            body_fat_difference,
            days_tracked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::CalorieGoal;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn profile(current: f64, goal: f64) -> Profile {
        Profile {
            current_weight_kg: current,
            goal_weight_kg: goal,
            current_body_fat_pct: None,
            target_body_fat_pct: None,
            start_date: date("2024-06-01"),
            daily_calorie_goal: None,
            goal_type: CalorieGoal::Maintain,
            updated_at: String::new(),
        }
    }

    fn entry(id: i64, d: &str, weight: f64, bf: Option<f64>) -> WeightLogEntry {
        WeightLogEntry {
            id,
            date: date(d),
            weight_kg: weight,
            body_fat_pct: bf,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(90.0, 85.0, 80.0), 50);
        assert_eq!(progress_percent(90.0, 90.0, 80.0), 0);
        assert_eq!(progress_percent(90.0, 80.0, 80.0), 100);
        // Overshooting the goal still caps at 100
        assert_eq!(progress_percent(90.0, 75.0, 80.0), 100);
        // Gaining toward a higher goal
        assert_eq!(progress_percent(60.0, 63.0, 66.0), 50);
    }

    #[test]
    fn test_progress_percent_start_equals_goal() {
        assert_eq!(progress_percent(80.0, 80.0, 80.0), 0);
        assert_eq!(progress_percent(80.0, 82.0, 80.0), 0);
    }

    #[test]
    fn test_weight_progress_uses_first_entry() {
        let p = profile(86.0, 80.0);
        let log = vec![
            entry(1, "2024-06-01", 92.0, None),
            entry(2, "2024-06-08", 86.0, None),
        ];
        // (92 - 86) / (92 - 80) = 50 %
        assert_eq!(weight_progress(&p, &log), 50);
    }

    #[test]
    fn test_weight_progress_empty_log() {
        let p = profile(86.0, 80.0);
        assert_eq!(weight_progress(&p, &[]), 0);
    }

    #[test]
    fn test_body_fat_progress() {
        let mut p = profile(86.0, 80.0);
        assert_eq!(body_fat_progress(&p, &[]), None);

        p.current_body_fat_pct = Some(22.0);
        assert_eq!(body_fat_progress(&p, &[]), Some(0));

        p.target_body_fat_pct = Some(15.0);
        let log = vec![
            entry(1, "2024-06-01", 90.0, Some(25.0)),
            entry(2, "2024-06-08", 86.0, Some(22.0)),
        ];
        // (25 - 22) / (25 - 15) = 30 %
        assert_eq!(body_fat_progress(&p, &log), Some(30));
    }

    #[test]
    fn test_body_fat_progress_falls_back_to_profile() {
        let mut p = profile(86.0, 80.0);
        p.current_body_fat_pct = Some(22.0);
        p.target_body_fat_pct = Some(15.0);
        let log = vec![entry(1, "2024-06-01", 90.0, None)];
        assert_eq!(body_fat_progress(&p, &log), Some(0));
    }

    #[test]
    fn test_dashboard_build() {
        let mut p = profile(86.04, 80.0);
        p.current_body_fat_pct = Some(22.0);
        p.target_body_fat_pct = Some(15.0);
        let log = vec![
            entry(1, "2024-06-01", 92.0, Some(25.0)),
            entry(2, "2024-06-08", 86.04, Some(22.0)),
        ];
        let dashboard = Dashboard::build(p, log, date("2024-06-15"));
        assert_eq!(dashboard.weight_progress, 50);
        assert_eq!(dashboard.body_fat_progress, Some(30));
        assert!((dashboard.weight_difference_kg - 6.0).abs() < 1e-9);
        assert_eq!(dashboard.body_fat_difference, Some(7.0));
        assert_eq!(dashboard.days_tracked, 14);
        assert_eq!(dashboard.latest_entry.unwrap().id, 2);
    }
}
