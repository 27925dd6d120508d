//! Closed-form fitness arithmetic: BMI, BMR/TDEE, calorie goals, macro splits,
//! body-fat interpretation and daily goal progress.
//!
//! Everything here is pure. Inputs are validated and reported as `anyhow`
//! errors with user-facing text; nothing touches the store or the network.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::models::{MacroTotals, Profile};

pub const CM_PER_INCH: f64 = 2.54;
pub const KG_PER_LB: f64 = 0.453_592;
pub const LBS_PER_KG: f64 = 2.20462;

/// Energy stored in one kilogram of body mass, used to turn a weekly weight
/// change into a daily calorie offset.
pub const KCAL_PER_KG: f64 = 7700.0;

pub const DEFAULT_CALORIE_GOAL: i64 = 2000;
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// --- Units ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    #[must_use]
    pub fn height_to_cm(self, height: f64) -> f64 {
        match self {
            Self::Metric => height,
            Self::Imperial => height * CM_PER_INCH,
        }
    }

    #[must_use]
    pub fn weight_to_kg(self, weight: f64) -> f64 {
        match self {
            Self::Metric => weight,
            Self::Imperial => weight * KG_PER_LB,
        }
    }

    #[must_use]
    pub fn weight_from_kg(self, kg: f64) -> f64 {
        match self {
            Self::Metric => kg,
            Self::Imperial => kg * LBS_PER_KG,
        }
    }

    #[must_use]
    pub fn weight_unit(self) -> &'static str {
        match self {
            Self::Metric => "kg",
            Self::Imperial => "lbs",
        }
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "metric" | "si" => Ok(Self::Metric),
            "imperial" | "us" => Ok(Self::Imperial),
            _ => bail!("Invalid unit system '{s}'. Must be metric or imperial"),
        }
    }
}

// --- BMI ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    SeverelyUnderweight,
    Underweight,
    Normal,
    Overweight,
    ModeratelyObese,
    SeverelyObese,
    MorbidlyObese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 16.0 {
            Self::SeverelyUnderweight
        } else if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else if bmi < 35.0 {
            Self::ModeratelyObese
        } else if bmi < 40.0 {
            Self::SeverelyObese
        } else {
            Self::MorbidlyObese
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SeverelyUnderweight => "Severely Underweight",
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::ModeratelyObese => "Moderately Obese",
            Self::SeverelyObese => "Severely Obese",
            Self::MorbidlyObese => "Morbidly Obese",
        }
    }

    /// Short status code shared with the web client's colour coding.
    #[must_use]
    pub fn health_status(self) -> &'static str {
        match self {
            Self::SeverelyUnderweight => "critical",
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::ModeratelyObese => "obese1",
            Self::SeverelyObese => "obese2",
            Self::MorbidlyObese => "obese3",
        }
    }

    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::SeverelyUnderweight => {
                "You probably need to gain weight! Please consult with a healthcare provider immediately."
            }
            Self::Underweight => {
                "You probably need to gain weight! Consider consulting with a nutritionist for a healthy weight gain plan."
            }
            Self::Normal => {
                "Great! Your weight is in the healthy range. Maintain your current lifestyle."
            }
            Self::Overweight => {
                "You probably need to lose weight. Consider a balanced diet and regular exercise."
            }
            Self::ModeratelyObese => {
                "You probably need to lose weight. Please consider consulting with a healthcare provider for a personalized plan."
            }
            Self::SeverelyObese => {
                "You probably need to lose weight urgently. Please consult with a healthcare provider immediately."
            }
            Self::MorbidlyObese => {
                "You probably need to lose weight urgently. Please seek immediate medical attention."
            }
        }
    }

    #[must_use]
    pub fn is_underweight(self) -> bool {
        matches!(self, Self::SeverelyUnderweight | Self::Underweight)
    }

    #[must_use]
    pub fn risk_factors(self) -> Vec<&'static str> {
        match self {
            Self::Normal => Vec::new(),
            Self::SeverelyUnderweight | Self::Underweight => vec![
                "Weakened immune system",
                "Osteoporosis",
                "Fertility issues",
                "Delayed wound healing",
            ],
            Self::Overweight | Self::ModeratelyObese => OVERWEIGHT_RISKS.to_vec(),
            Self::SeverelyObese | Self::MorbidlyObese => {
                let mut risks = OVERWEIGHT_RISKS.to_vec();
                risks.extend(["Stroke", "Fatty liver disease"]);
                risks
            }
        }
    }
}

const OVERWEIGHT_RISKS: [&str; 5] = [
    "Type 2 diabetes",
    "Heart disease",
    "High blood pressure",
    "Sleep apnea",
    "Certain cancers",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Gain,
    Lose,
    Maintain,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiResult {
    pub bmi: f64,
    pub category: BmiCategory,
    pub category_label: String,
    pub health_status: String,
    pub recommendation: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    /// Healthy weight range (BMI 18.5 to 24.9) for this height, in kg.
    pub ideal_weight_range: WeightRange,
    pub weight_adjustment: f64,
    pub adjustment_type: AdjustmentType,
    pub risk_factors: Vec<String>,
}

/// Body-mass index from a height and weight in the given unit system.
///
/// Imperial input is inches and pounds. The ideal range and adjustment are
/// always reported in kilograms, rounded to one decimal.
pub fn calculate_bmi(height: f64, weight: f64, unit: UnitSystem) -> Result<BmiResult> {
    if !height.is_finite() || height <= 0.0 {
        bail!("Height must be greater than 0");
    }
    if !weight.is_finite() || weight <= 0.0 {
        bail!("Weight must be greater than 0");
    }

    let height_cm = unit.height_to_cm(height);
    let weight_kg = unit.weight_to_kg(weight);
    let height_m = height_cm / 100.0;
    let bmi = weight_kg / (height_m * height_m);
    let category = BmiCategory::from_bmi(bmi);

    let ideal_min = 18.5 * height_m * height_m;
    let ideal_max = 24.9 * height_m * height_m;

    let (adjustment, adjustment_type) = if category == BmiCategory::Normal {
        (0.0, AdjustmentType::Maintain)
    } else if category.is_underweight() {
        (ideal_min - weight_kg, AdjustmentType::Gain)
    } else {
        (weight_kg - ideal_max, AdjustmentType::Lose)
    };

    Ok(BmiResult {
        bmi: round1(bmi),
        category,
        category_label: category.label().to_string(),
        health_status: category.health_status().to_string(),
        recommendation: category.recommendation().to_string(),
        height_cm: round1(height_cm),
        weight_kg: round1(weight_kg),
        ideal_weight_range: WeightRange {
            min: round1(ideal_min),
            max: round1(ideal_max),
        },
        weight_adjustment: round1(adjustment.abs()),
        adjustment_type,
        risk_factors: category
            .risk_factors()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

// --- BMR / TDEE ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => bail!("Invalid sex '{s}'. Must be male or female"),
        }
    }
}

/// Basal metabolic rate (kcal/day) by the Mifflin-St Jeor equation.
///
/// `10 x weight_kg + 6.25 x height_cm - 5 x age`, then `+5` for men and
/// `-161` for women.
#[must_use]
pub fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    pub const ALL: [Self; 5] = [
        Self::Sedentary,
        Self::LightlyActive,
        Self::ModeratelyActive,
        Self::VeryActive,
        Self::ExtremelyActive,
    ];

    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::LightlyActive => 1.375,
            Self::ModeratelyActive => 1.55,
            Self::VeryActive => 1.725,
            Self::ExtremelyActive => 1.9,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sedentary => "Sedentary (little or no exercise)",
            Self::LightlyActive => "Lightly active (exercise 1-3 days/week)",
            Self::ModeratelyActive => "Moderately active (exercise 3-5 days/week)",
            Self::VeryActive => "Very active (exercise 6-7 days/week)",
            Self::ExtremelyActive => "Extremely active (physical job or twice-daily training)",
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::LightlyActive => "lightly_active",
            Self::ModeratelyActive => "moderately_active",
            Self::VeryActive => "very_active",
            Self::ExtremelyActive => "extremely_active",
        }
    }

    /// Parse an activity key, falling back to sedentary for anything unknown.
    /// The HTTP API accepts whatever the form sends this way.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        // Short spellings accepted on the command line
        let key = match normalized.as_str() {
            "light" => "lightly_active",
            "moderate" => "moderately_active",
            "active" => "very_active",
            "extreme" => "extremely_active",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|level| level.key() == key)
            .ok_or_else(|| {
                let keys: Vec<&str> = Self::ALL.iter().map(|l| l.key()).collect();
                anyhow::anyhow!(
                    "Invalid activity level '{s}'. Must be one of: {}",
                    keys.join(", ")
                )
            })
    }
}

// --- Calorie goals ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalorieGoal {
    #[default]
    Maintain,
    MildLoss,
    WeightLoss,
    ExtremeLoss,
    MildGain,
    WeightGain,
    ExtremeGain,
}

impl CalorieGoal {
    pub const ALL: [Self; 7] = [
        Self::Maintain,
        Self::MildLoss,
        Self::WeightLoss,
        Self::ExtremeLoss,
        Self::MildGain,
        Self::WeightGain,
        Self::ExtremeGain,
    ];

    /// Weekly body-weight change this goal aims for, in kg (negative = loss).
    #[must_use]
    pub fn kg_per_week(self) -> f64 {
        match self {
            Self::Maintain => 0.0,
            Self::MildLoss => -0.25,
            Self::WeightLoss => -0.5,
            Self::ExtremeLoss => -1.0,
            Self::MildGain => 0.25,
            Self::WeightGain => 0.5,
            Self::ExtremeGain => 1.0,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Maintain => "maintain",
            Self::MildLoss => "mild_loss",
            Self::WeightLoss => "weight_loss",
            Self::ExtremeLoss => "extreme_loss",
            Self::MildGain => "mild_gain",
            Self::WeightGain => "weight_gain",
            Self::ExtremeGain => "extreme_gain",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Maintain => "Maintain weight",
            Self::MildLoss => "Mild weight loss (0.25 kg/week)",
            Self::WeightLoss => "Weight loss (0.5 kg/week)",
            Self::ExtremeLoss => "Extreme weight loss (1 kg/week)",
            Self::MildGain => "Mild weight gain (0.25 kg/week)",
            Self::WeightGain => "Weight gain (0.5 kg/week)",
            Self::ExtremeGain => "Extreme weight gain (1 kg/week)",
        }
    }

    #[must_use]
    pub fn is_loss(self) -> bool {
        self.kg_per_week() < 0.0
    }

    #[must_use]
    pub fn is_gain(self) -> bool {
        self.kg_per_week() > 0.0
    }

    /// Protein target in grams per kg of body weight for this goal.
    #[must_use]
    pub fn protein_per_kg(self) -> f64 {
        if self.is_loss() {
            2.1
        } else if self.is_gain() {
            1.9
        } else {
            1.8
        }
    }

    /// Daily calories for this goal: TDEE offset by the weekly change spread
    /// over seven days.
    #[must_use]
    pub fn daily_calories(self, tdee: f64) -> i64 {
        (tdee + KCAL_PER_KG * self.kg_per_week() / 7.0).round() as i64
    }
}

impl fmt::Display for CalorieGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CalorieGoal {
    type Err = anyhow::Error;

    /// Accepts `mild_loss`, `mild-loss` and the web client's `mildLoss`.
    fn from_str(s: &str) -> Result<Self> {
        let squashed: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|goal| goal.key().replace('_', "") == squashed)
            .ok_or_else(|| {
                let keys: Vec<&str> = Self::ALL.iter().map(|g| g.key()).collect();
                anyhow::anyhow!(
                    "Invalid goal type '{s}'. Must be one of: {}",
                    keys.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone)]
pub struct CalorieInput {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub sex: Sex,
    pub activity: ActivityLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalCalories {
    pub goal: CalorieGoal,
    pub label: String,
    pub kg_per_week: f64,
    pub calories: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalorieReport {
    pub bmr: i64,
    pub tdee: i64,
    pub activity_level: ActivityLevel,
    pub activity_label: String,
    pub activity_multiplier: f64,
    pub goals: Vec<GoalCalories>,
    pub bmi: f64,
    pub recommended_goal: CalorieGoal,
    pub recommendation: String,
    pub maintenance_macros: MacroBreakdown,
}

impl CalorieReport {
    #[must_use]
    pub fn calories_for(&self, goal: CalorieGoal) -> i64 {
        self.goals
            .iter()
            .find(|g| g.goal == goal)
            .map_or(self.tdee, |g| g.calories)
    }
}

pub fn calculate_calories(input: &CalorieInput) -> Result<CalorieReport> {
    if input.age == 0 || input.age > 120 {
        bail!("Age must be between 1 and 120");
    }
    if !input.height_cm.is_finite() || input.height_cm <= 0.0 {
        bail!("Height must be greater than 0");
    }
    if !input.weight_kg.is_finite() || input.weight_kg <= 0.0 {
        bail!("Weight must be greater than 0");
    }

    let bmr = mifflin_st_jeor(input.weight_kg, input.height_cm, input.age, input.sex);
    let tdee = bmr * input.activity.multiplier();

    let goals = CalorieGoal::ALL
        .into_iter()
        .map(|goal| GoalCalories {
            goal,
            label: goal.label().to_string(),
            kg_per_week: goal.kg_per_week(),
            calories: goal.daily_calories(tdee),
        })
        .collect();

    let height_m = input.height_cm / 100.0;
    let bmi = input.weight_kg / (height_m * height_m);
    let (recommended_goal, recommendation) = if bmi < 18.5 {
        (
            CalorieGoal::WeightGain,
            "You probably need to gain weight! Focus on nutrient-dense, calorie-rich foods and consider strength training.",
        )
    } else if bmi < 25.0 {
        (
            CalorieGoal::Maintain,
            "Your weight appears to be in a healthy range. Focus on maintaining your current weight with balanced nutrition and regular exercise.",
        )
    } else {
        (
            CalorieGoal::WeightLoss,
            "You probably need to lose weight. Consider creating a moderate calorie deficit combined with regular physical activity.",
        )
    };

    let tdee_rounded = tdee.round() as i64;
    Ok(CalorieReport {
        bmr: bmr.round() as i64,
        tdee: tdee_rounded,
        activity_level: input.activity,
        activity_label: input.activity.label().to_string(),
        activity_multiplier: input.activity.multiplier(),
        goals,
        bmi: round1(bmi),
        recommended_goal,
        recommendation: recommendation.to_string(),
        maintenance_macros: fixed_macro_split(tdee_rounded),
    })
}

// --- Macros ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroAmount {
    pub grams: i64,
    pub calories: i64,
    pub percentage: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroBreakdown {
    pub calories: i64,
    pub protein: MacroAmount,
    pub carbs: MacroAmount,
    pub fat: MacroAmount,
}

/// The calorie calculator's default split: 25 % protein, 45 % carbs, 30 % fat.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fixed_macro_split(calories: i64) -> MacroBreakdown {
    let cal = calories as f64;
    let amount = |pct: i64, kcal_per_g: f64| {
        let kcal = cal * pct as f64 / 100.0;
        MacroAmount {
            grams: (kcal / kcal_per_g).round() as i64,
            calories: kcal.round() as i64,
            percentage: pct,
        }
    };
    MacroBreakdown {
        calories,
        protein: amount(25, 4.0),
        carbs: amount(45, 4.0),
        fat: amount(30, 9.0),
    }
}

/// Body-weight driven macros for a calorie goal.
///
/// Protein is set per kg of body weight, fat takes 25 % of calories and
/// carbs fill whatever is left (never below zero). Reported calories and
/// percentages come from the rounded grams, so they need not sum exactly.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn goal_macros(calories: i64, weight_kg: f64, goal: CalorieGoal) -> MacroBreakdown {
    let protein_g = (weight_kg * goal.protein_per_kg()).round() as i64;
    let fat_budget = (calories as f64 * 0.25).round() as i64;
    let fat_g = (fat_budget as f64 / 9.0).round() as i64;
    let carbs_budget = (calories - protein_g * 4 - fat_budget).max(0);
    let carbs_g = (carbs_budget as f64 / 4.0).round() as i64;

    let protein_cal = protein_g * 4;
    let carbs_cal = carbs_g * 4;
    let fat_cal = fat_g * 9;

    let share = |kcal: i64| {
        if calories > 0 {
            (kcal as f64 / calories as f64 * 100.0).round() as i64
        } else {
            0
        }
    };

    MacroBreakdown {
        calories,
        protein: MacroAmount {
            grams: protein_g,
            calories: protein_cal,
            percentage: share(protein_cal),
        },
        carbs: MacroAmount {
            grams: carbs_g,
            calories: carbs_cal,
            percentage: share(carbs_cal),
        },
        fat: MacroAmount {
            grams: fat_g,
            calories: fat_cal,
            percentage: share(fat_cal),
        },
    }
}

/// A calorie target split by explicit percentages.
#[derive(Debug, Clone, Serialize)]
pub struct MacroTarget {
    pub calories: i64,
    pub protein_pct: i64,
    pub carbs_pct: i64,
    pub fat_pct: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl MacroTarget {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_percentages(
        calories: i64,
        protein_pct: i64,
        carbs_pct: i64,
        fat_pct: i64,
    ) -> Result<Self> {
        if calories <= 0 {
            bail!("Calories must be greater than 0");
        }
        validate_macro_split(protein_pct, carbs_pct, fat_pct)?;
        let cal = calories as f64;
        Ok(Self {
            calories,
            protein_pct,
            carbs_pct,
            fat_pct,
            protein_g: cal * protein_pct as f64 / 100.0 / 4.0,
            carbs_g: cal * carbs_pct as f64 / 100.0 / 4.0,
            fat_g: cal * fat_pct as f64 / 100.0 / 9.0,
        })
    }
}

pub fn validate_macro_split(protein: i64, carbs: i64, fat: i64) -> Result<()> {
    if protein < 0 || carbs < 0 || fat < 0 {
        bail!("Macro percentages must be non-negative");
    }
    if protein > 100 || carbs > 100 || fat > 100 {
        bail!("Each macro percentage must be between 0 and 100");
    }
    let sum = protein + carbs + fat;
    if sum != 100 {
        bail!("Macro percentages must sum to 100 (got {sum})");
    }
    Ok(())
}

/// Parse a `protein/carbs/fat` split such as `30/40/30`.
pub fn parse_macro_split(split: &str) -> Result<(i64, i64, i64)> {
    let parts: Vec<&str> = split.split('/').map(str::trim).collect();
    let [p, c, f] = parts.as_slice() else {
        bail!("Invalid macro split '{split}'. Expected protein/carbs/fat, e.g. 30/40/30");
    };
    let parse = |s: &str| {
        s.parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid macro percentage '{s}'"))
    };
    let (p, c, f) = (parse(*p)?, parse(*c)?, parse(*f)?);
    validate_macro_split(p, c, f)?;
    Ok((p, c, f))
}

// --- Body fat ---

pub const BODY_FAT_MIN_PCT: f64 = 3.0;
pub const BODY_FAT_MAX_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFatCategory {
    Essential,
    Athlete,
    Fitness,
    Average,
    High,
}

impl BodyFatCategory {
    #[must_use]
    pub fn from_pct(pct: f64) -> Self {
        if pct < 6.0 {
            Self::Essential
        } else if pct < 14.0 {
            Self::Athlete
        } else if pct < 18.0 {
            Self::Fitness
        } else if pct < 25.0 {
            Self::Average
        } else {
            Self::High
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Essential => "Essential Fat",
            Self::Athlete => "Athletes",
            Self::Fitness => "Fitness",
            Self::Average => "Average",
            Self::High => "Above Average",
        }
    }

    #[must_use]
    pub fn health_status(self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Athlete => "athlete",
            Self::Fitness => "fitness",
            Self::Average => "average",
            Self::High => "high",
        }
    }

    #[must_use]
    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Essential => {
                "This is extremely low body fat. Essential fat only - consult a healthcare provider."
            }
            Self::Athlete => "Excellent! Athletic body fat range. Great for performance and aesthetics.",
            Self::Fitness => "Great! You have a fit and healthy body fat percentage.",
            Self::Average => {
                "Average body fat range. Consider regular exercise to improve fitness."
            }
            Self::High => {
                "Consider a combination of diet and exercise to reduce body fat percentage."
            }
        }
    }

    #[must_use]
    pub fn risk_factors(self) -> Vec<&'static str> {
        match self {
            Self::Essential => vec![
                "Hormone disruption",
                "Weakened immune system",
                "Loss of muscle mass",
            ],
            Self::High => vec![
                "Cardiovascular disease",
                "Type 2 diabetes",
                "High blood pressure",
            ],
            Self::Athlete | Self::Fitness | Self::Average => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    pub total_weight: f64,
    pub fat_mass: f64,
    pub lean_body_mass: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyFatReport {
    pub body_fat_percentage: f64,
    pub lean_mass_percentage: f64,
    pub category: BodyFatCategory,
    pub category_label: String,
    pub health_status: String,
    pub recommendation: String,
    pub body_composition: BodyComposition,
    pub risk_factors: Vec<String>,
}

/// Interpret a body-fat percentage for a person of `total_weight_kg`.
///
/// The percentage is clamped to 3..=50 first, matching what the regression
/// backend reports.
pub fn interpret_body_fat(pct: f64, total_weight_kg: f64) -> Result<BodyFatReport> {
    if !pct.is_finite() {
        bail!("Body fat percentage must be a number");
    }
    if !total_weight_kg.is_finite() || total_weight_kg <= 0.0 {
        bail!("Weight must be greater than 0");
    }
    let pct = pct.clamp(BODY_FAT_MIN_PCT, BODY_FAT_MAX_PCT);
    let category = BodyFatCategory::from_pct(pct);
    let fat_mass = pct / 100.0 * total_weight_kg;

    Ok(BodyFatReport {
        body_fat_percentage: round1(pct),
        lean_mass_percentage: round1(100.0 - pct),
        category,
        category_label: category.label().to_string(),
        health_status: category.health_status().to_string(),
        recommendation: category.recommendation().to_string(),
        body_composition: BodyComposition {
            total_weight: round1(total_weight_kg),
            fat_mass: round1(fat_mass),
            lean_body_mass: round1(total_weight_kg - fat_mass),
        },
        risk_factors: category
            .risk_factors()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

// --- Daily goals and progress ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyGoals {
    pub calories: i64,
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
    pub goal_type: CalorieGoal,
}

impl Default for DailyGoals {
    fn default() -> Self {
        Self {
            calories: DEFAULT_CALORIE_GOAL,
            protein_g: 126,
            carbs_g: 244,
            fat_g: 56,
            goal_type: CalorieGoal::Maintain,
        }
    }
}

impl DailyGoals {
    /// Food-log goals for a profile, or the stock 2000 kcal goals without one.
    #[must_use]
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };
        let calories = profile.daily_calorie_goal.unwrap_or(DEFAULT_CALORIE_GOAL);
        let weight = if profile.current_weight_kg > 0.0 {
            profile.current_weight_kg
        } else {
            DEFAULT_WEIGHT_KG
        };
        let macros = goal_macros(calories, weight, profile.goal_type);
        Self {
            calories,
            protein_g: macros.protein.grams,
            carbs_g: macros.carbs.grams,
            fat_g: macros.fat.grams,
            goal_type: profile.goal_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyProgress {
    pub calories_pct: f64,
    pub protein_pct: f64,
    pub carbs_pct: f64,
    pub fat_pct: f64,
    pub remaining: MacroTotals,
}

#[allow(clippy::cast_precision_loss)]
fn goal_pct(eaten: f64, goal: i64) -> f64 {
    if goal <= 0 {
        return 0.0;
    }
    (eaten / goal as f64 * 100.0).min(100.0)
}

#[allow(clippy::cast_precision_loss)]
fn goal_remaining(eaten: f64, goal: i64) -> f64 {
    (goal as f64 - eaten).max(0.0)
}

#[must_use]
pub fn daily_progress(totals: &MacroTotals, goals: &DailyGoals) -> DailyProgress {
    DailyProgress {
        calories_pct: goal_pct(totals.calories, goals.calories),
        protein_pct: goal_pct(totals.protein_g, goals.protein_g),
        carbs_pct: goal_pct(totals.carbs_g, goals.carbs_g),
        fat_pct: goal_pct(totals.fat_g, goals.fat_g),
        remaining: MacroTotals {
            calories: goal_remaining(totals.calories, goals.calories),
            protein_g: goal_remaining(totals.protein_g, goals.protein_g),
            carbs_g: goal_remaining(totals.carbs_g, goals.carbs_g),
            fat_g: goal_remaining(totals.fat_g, goals.fat_g),
        },
    }
}
