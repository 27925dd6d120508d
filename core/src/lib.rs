pub mod api;
pub mod calculators;
pub mod db;
pub mod models;
pub mod openfoodfacts;
pub mod progress;
pub mod service;
