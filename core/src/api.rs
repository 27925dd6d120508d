//! JSON wire types shared by the prediction-backend client and the local
//! HTTP server. Every response travels inside an [`ApiEnvelope`].

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculators::{
    ActivityLevel, BodyComposition, CalorieGoal, CalorieInput, Sex, UnitSystem,
};
use crate::models::NewFoodLogItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The payload of a successful envelope, or the server's error text.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("Response did not include any data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "Request failed without an error message".to_string())),
        }
    }
}

// --- Calculator requests ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmiRequest {
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub unit: UnitSystem,
}

fn default_gender() -> String {
    "male".to_string()
}

fn default_activity() -> String {
    "sedentary".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieRequest {
    pub height: f64,
    pub weight: f64,
    pub age: u32,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default = "default_activity")]
    pub activity_level: String,
}

impl CalorieRequest {
    /// Forms post free text, so anything but "male" counts as female and an
    /// unknown activity level counts as sedentary.
    #[must_use]
    pub fn to_input(&self) -> CalorieInput {
        let sex = if self.gender.eq_ignore_ascii_case("male") {
            Sex::Male
        } else {
            Sex::Female
        };
        CalorieInput {
            age: self.age,
            height_cm: self.height,
            weight_kg: self.weight,
            sex,
            activity: ActivityLevel::parse_lenient(&self.activity_level),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroRequest {
    pub calories: i64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub goal_type: Option<CalorieGoal>,
    /// `protein/carbs/fat` percentages, e.g. `30/40/30`.
    #[serde(default)]
    pub split: Option<String>,
}

// --- Body fat ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyFatRequest {
    pub age: f64,
    pub weight: f64,
    pub height: f64,
    pub neck: f64,
    pub abdomen: f64,
    pub forearm: f64,
    pub wrist: f64,
    #[serde(default)]
    pub unit: UnitSystem,
}

impl BodyFatRequest {
    pub fn validate(&self) -> Result<()> {
        if !self.age.is_finite() || self.age <= 0.0 || self.age > 120.0 {
            bail!("Age must be between 1 and 120");
        }
        for (label, value) in [
            ("Weight", self.weight),
            ("Height", self.height),
            ("Neck", self.neck),
            ("Abdomen", self.abdomen),
            ("Forearm", self.forearm),
            ("Wrist", self.wrist),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("{label} must be greater than 0");
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        self.unit.weight_to_kg(self.weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyFatPrediction {
    pub body_fat_percentage: f64,
    pub category: String,
    pub health_status: String,
    pub recommendation: String,
    pub body_composition: BodyComposition,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Mean absolute error of the regression model, in percentage points.
    #[serde(default)]
    pub mae: Option<f64>,
    #[serde(default)]
    pub calculation_date: Option<String>,
}

// --- Food recognition ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodMacros {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default = "default_serving")]
    pub serving: String,
}

fn default_serving() -> String {
    "1 serving".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionCandidate {
    pub name: String,
    /// Fraction in `0.0..=1.0`.
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FoodPrediction {
    Recognized {
        food: String,
        /// Percentage, already scaled by the backend.
        confidence: f64,
        macros: FoodMacros,
        #[serde(default)]
        top_3: Vec<PredictionCandidate>,
    },
    Unknown {
        message: String,
        best_guess: String,
        confidence: f64,
        #[serde(default)]
        suggestion: Option<String>,
        #[serde(default)]
        top_3: Vec<PredictionCandidate>,
    },
    Error {
        error: String,
    },
}

impl FoodPrediction {
    /// A log item for a recognized food, `None` for the other outcomes.
    #[must_use]
    pub fn to_food_item(&self, meal_type: &str, date: NaiveDate) -> Option<NewFoodLogItem> {
        let Self::Recognized { food, macros, .. } = self else {
            return None;
        };
        Some(NewFoodLogItem {
            date,
            meal_type: meal_type.to_string(),
            name: humanize_label(food),
            calories: macros.calories,
            protein_g: macros.protein,
            carbs_g: macros.carbs,
            fat_g: macros.fat,
        })
    }
}

/// `chicken_biryani` -> `Chicken Biryani`
#[must_use]
pub fn humanize_label(label: &str) -> String {
    label
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// --- Chat & health ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub query: String,
    pub response: String,
    #[serde(rename = "type", default)]
    pub reply_type: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub processing_time_ms: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatbot_available: Option<bool>,
}
