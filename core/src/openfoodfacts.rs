use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::NewFoodLogItem;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub products: Vec<ProductData>,
}

#[derive(Debug, Deserialize)]
pub struct ProductData {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub code: Option<String>,
    pub nutriments: Option<Nutriments>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    pub energy_kcal_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub fat_100g: Option<f64>,
}

/// A food search hit with nutrition per 100 g.
#[derive(Debug, Clone, Serialize)]
pub struct FoodCandidate {
    pub name: String,
    pub brand: Option<String>,
    pub barcode: Option<String>,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

impl FoodCandidate {
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.brand {
            Some(brand) => format!("{} ({brand})", self.name),
            None => self.name.clone(),
        }
    }

    /// Scale the per-100 g values to a serving and turn it into a log item.
    #[must_use]
    pub fn to_food_item(&self, serving_g: f64, meal_type: &str, date: NaiveDate) -> NewFoodLogItem {
        let factor = serving_g / 100.0;
        let scaled = |v: f64| (v * factor * 10.0).round() / 10.0;
        NewFoodLogItem {
            date,
            meal_type: meal_type.to_string(),
            name: self.display_name(),
            calories: scaled(self.calories_per_100g),
            protein_g: scaled(self.protein_per_100g),
            carbs_g: scaled(self.carbs_per_100g),
            fat_g: scaled(self.fat_per_100g),
        }
    }
}

#[must_use]
pub fn product_to_candidate(p: ProductData) -> Option<FoodCandidate> {
    let name = p.product_name.filter(|n| !n.is_empty())?;
    let nutriments = p.nutriments?;
    let calories = nutriments.energy_kcal_100g?;

    Some(FoodCandidate {
        name,
        brand: p.brands.filter(|b| !b.is_empty()),
        barcode: p.code.filter(|c| !c.is_empty()),
        calories_per_100g: calories,
        protein_per_100g: nutriments.proteins_100g.unwrap_or(0.0),
        carbs_per_100g: nutriments.carbohydrates_100g.unwrap_or(0.0),
        fat_per_100g: nutriments.fat_100g.unwrap_or(0.0),
    })
}
