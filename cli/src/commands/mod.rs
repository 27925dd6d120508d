mod calc;
mod chat;
mod dashboard;
mod food;
mod goals;
mod helpers;
mod transfer;
mod weight;

pub(crate) use calc::{Measurements, cmd_bmi, cmd_bodyfat, cmd_calories, cmd_macros};
pub(crate) use chat::{cmd_chat, cmd_health};
pub(crate) use dashboard::cmd_dashboard;
pub(crate) use food::{
    cmd_food_add, cmd_food_days, cmd_food_delete, cmd_food_log, cmd_food_recognize,
    cmd_food_search,
};
pub(crate) use goals::{
    cmd_goals_calories, cmd_goals_clear, cmd_goals_set, cmd_goals_show, cmd_units,
};
pub(crate) use transfer::{cmd_export, cmd_import};
pub(crate) use weight::{cmd_weight_delete, cmd_weight_history, cmd_weight_log};
