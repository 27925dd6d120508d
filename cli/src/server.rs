use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use macromate_core::api::{ApiEnvelope, BmiRequest, CalorieRequest, HealthStatus, MacroRequest};
use macromate_core::calculators::{
    CalorieGoal, MacroTarget, calculate_bmi, calculate_calories, fixed_macro_split, goal_macros,
    parse_macro_split,
};
use macromate_core::models::{
    DailyLog, FoodLogItem, GoalSettings, ImportSummary, NewFoodLogItem, Profile, ProgressData,
    WeightLogEntry, parse_iso_date, validate_body_fat, validate_food_item, validate_goal_settings,
    validate_meal_type, validate_weight,
};
use macromate_core::progress::Dashboard;
use macromate_core::service::MacroMateService;

const BODY_LIMIT: usize = 5 * 1024 * 1024; // 5 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<MacroMateService>>,
}

impl AppState {
    fn svc(&self) -> MutexGuard<'_, MacroMateService> {
        self.svc.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request types ---

#[derive(Deserialize)]
struct GoalsRequest {
    current_weight: f64,
    goal_weight: f64,
    current_body_fat: Option<f64>,
    target_body_fat: Option<f64>,
    /// Update the goals without restarting the weight log.
    #[serde(default)]
    keep_log: bool,
}

#[derive(Deserialize)]
struct CalorieGoalRequest {
    calories: i64,
    goal_type: Option<CalorieGoal>,
}

#[derive(Deserialize)]
struct CreateWeightRequest {
    date: Option<String>,
    weight: f64,
    body_fat: Option<f64>,
}

#[derive(Deserialize)]
struct WeightLogQuery {
    days: Option<i64>,
}

#[derive(Deserialize)]
struct CreateFoodRequest {
    date: Option<String>,
    meal_type: String,
    name: String,
    calories: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carbs: f64,
    #[serde(default)]
    fat: f64,
}

#[derive(Deserialize)]
struct FoodDatesQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct Deleted {
    deleted: i64,
}

#[derive(Serialize)]
struct Cleared {
    cleared: bool,
}

type ApiResult<T> = Result<Json<ApiEnvelope<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiEnvelope::ok(data)))
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    PayloadTooLarge,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ApiEnvelope::<()>::err(message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

// --- Extractors ---
//
// axum's own extractors reject with plain text; these wrap them so every
// failure reaches the client as an envelope.

struct ApiJson<T>(T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

struct ApiPath<T>(T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

struct ApiQuery<T>(T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

fn bad_request(err: anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err:#}"))
}

fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate, ApiError> {
    match date {
        Some(d) => parse_iso_date(d).map_err(bad_request),
        None => Ok(Local::now().date_naive()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::debug!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "request"
    );
    response
}

// --- Health & calculators ---

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Local::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chatbot_available: None,
    })
}

async fn calculate_bmi_handler(ApiJson(req): ApiJson<BmiRequest>) -> ApiResult<serde_json::Value> {
    let result = calculate_bmi(req.height, req.weight, req.unit).map_err(bad_request)?;
    ok(serde_json::to_value(result).context("failed to serialize BMI result")?)
}

async fn calculate_calories_handler(
    ApiJson(req): ApiJson<CalorieRequest>,
) -> ApiResult<serde_json::Value> {
    let report = calculate_calories(&req.to_input()).map_err(bad_request)?;
    ok(serde_json::to_value(report).context("failed to serialize calorie report")?)
}

async fn calculate_macros_handler(ApiJson(req): ApiJson<MacroRequest>) -> ApiResult<serde_json::Value> {
    if req.calories <= 0 {
        return Err(ApiError::BadRequest(
            "Calories must be greater than 0".to_string(),
        ));
    }

    let value = if let Some(split) = req.split.as_deref() {
        let (p, c, f) = parse_macro_split(split).map_err(bad_request)?;
        let target = MacroTarget::from_percentages(req.calories, p, c, f).map_err(bad_request)?;
        serde_json::to_value(target)
    } else if let Some(weight) = req.weight {
        validate_weight(weight).map_err(bad_request)?;
        let goal = req.goal_type.unwrap_or_default();
        serde_json::to_value(goal_macros(req.calories, weight, goal))
    } else {
        serde_json::to_value(fixed_macro_split(req.calories))
    };

    ok(value.context("failed to serialize macros")?)
}

// --- Progress ---

async fn get_progress(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let dashboard = state.svc().dashboard(today()).context("database error")?;
    match dashboard {
        Some(d) => ok(d),
        None => Err(ApiError::NotFound("No goals set".to_string())),
    }
}

async fn set_progress(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GoalsRequest>,
) -> ApiResult<Dashboard> {
    let settings = GoalSettings {
        current_weight_kg: req.current_weight,
        goal_weight_kg: req.goal_weight,
        current_body_fat_pct: req.current_body_fat,
        target_body_fat_pct: req.target_body_fat,
    };
    validate_goal_settings(&settings).map_err(bad_request)?;

    let svc = state.svc();
    let today = today();
    if req.keep_log {
        svc.update_goals(&settings, today)
            .context("failed to update goals")?;
        let dashboard = svc.dashboard(today).context("database error")?;
        return dashboard
            .map_or_else(|| Err(ApiError::NotFound("No goals set".to_string())), ok);
    }
    ok(svc.set_goals(&settings, today).context("failed to set goals")?)
}

async fn clear_progress(State(state): State<AppState>) -> ApiResult<Cleared> {
    let cleared = state.svc().clear_progress().context("database error")?;
    ok(Cleared { cleared })
}

async fn set_calorie_goal(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CalorieGoalRequest>,
) -> ApiResult<Profile> {
    if req.calories <= 0 {
        return Err(ApiError::BadRequest(
            "Calorie goal must be greater than 0".to_string(),
        ));
    }
    let svc = state.svc();
    let Some(profile) = svc.get_profile().context("database error")? else {
        return Err(ApiError::NotFound("No goals set".to_string()));
    };
    let goal_type = req.goal_type.unwrap_or(profile.goal_type);
    ok(svc
        .set_calorie_goal(req.calories, goal_type)
        .context("failed to save calorie goal")?)
}

async fn get_weight_log(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WeightLogQuery>,
) -> ApiResult<Vec<WeightLogEntry>> {
    if params.days.is_some_and(|d| d <= 0) {
        return Err(ApiError::BadRequest(
            "days must be greater than 0".to_string(),
        ));
    }
    ok(state
        .svc()
        .get_weight_log(params.days)
        .context("database error")?)
}

async fn create_weight(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateWeightRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<WeightLogEntry>>), ApiError> {
    validate_weight(req.weight).map_err(bad_request)?;
    if let Some(bf) = req.body_fat {
        validate_body_fat(bf).map_err(bad_request)?;
    }
    let date = parse_date_or_today(req.date.as_deref())?;

    let svc = state.svc();
    if svc.get_profile().context("database error")?.is_none() {
        return Err(ApiError::NotFound("No goals set".to_string()));
    }
    let entry = svc
        .add_weight_entry(date, req.weight, req.body_fat)
        .context("failed to insert weight entry")?;
    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(entry))))
}

async fn delete_weight(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Deleted> {
    let svc = state.svc();
    let entries = svc.get_weight_log(None).context("database error")?;
    if !entries.iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("Weight entry {id} not found")));
    }
    if entries.len() <= 1 {
        return Err(ApiError::BadRequest(
            "Cannot delete the only entry. At least one entry is needed to track progress"
                .to_string(),
        ));
    }
    svc.delete_weight_entry(id).context("database error")?;
    ok(Deleted { deleted: id })
}

// --- Food log ---

async fn get_food_log(
    State(state): State<AppState>,
    ApiPath(date_str): ApiPath<String>,
) -> ApiResult<DailyLog> {
    let date = parse_iso_date(&date_str).map_err(bad_request)?;
    ok(state.svc().daily_log(date).context("database error")?)
}

async fn get_food_dates(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<FoodDatesQuery>,
) -> ApiResult<Vec<String>> {
    let limit = params.limit.unwrap_or(30).clamp(1, 365);
    ok(state
        .svc()
        .get_food_log_dates(limit)
        .context("database error")?)
}

async fn create_food(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateFoodRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<FoodLogItem>>), ApiError> {
    let item = NewFoodLogItem {
        date: parse_date_or_today(req.date.as_deref())?,
        meal_type: validate_meal_type(&req.meal_type).map_err(bad_request)?,
        name: req.name,
        calories: req.calories,
        protein_g: req.protein,
        carbs_g: req.carbs,
        fat_g: req.fat,
    };
    validate_food_item(&item).map_err(bad_request)?;

    let created = state
        .svc()
        .log_food(&item)
        .context("failed to insert food item")?;
    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(created))))
}

async fn delete_food(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Deleted> {
    if state.svc().delete_food(id).context("database error")? {
        ok(Deleted { deleted: id })
    } else {
        Err(ApiError::NotFound(format!("Food item {id} not found")))
    }
}

// --- Export / Import ---

async fn export_data(State(state): State<AppState>) -> ApiResult<ProgressData> {
    ok(state
        .svc()
        .export_progress()
        .context("failed to export data")?)
}

async fn import_data(
    State(state): State<AppState>,
    ApiJson(data): ApiJson<ProgressData>,
) -> ApiResult<ImportSummary> {
    // Every row is validated before anything is written
    let prepared = MacroMateService::prepare_import(&data, today()).map_err(bad_request)?;
    ok(state
        .svc()
        .apply_import(prepared)
        .context("failed to import data")?)
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/calculate/bmi", post(calculate_bmi_handler))
        .route("/api/calculate/calories", post(calculate_calories_handler))
        .route("/api/calculate/macros", post(calculate_macros_handler))
        .route(
            "/api/progress",
            get(get_progress).put(set_progress).delete(clear_progress),
        )
        .route("/api/progress/calorie-goal", put(set_calorie_goal))
        .route(
            "/api/progress/weight",
            get(get_weight_log).post(create_weight),
        )
        .route("/api/progress/weight/{id}", delete(delete_weight))
        .route("/api/foodlog", get(get_food_dates).post(create_food))
        .route("/api/foodlog/{date}", get(get_food_log))
        .route("/api/foodlog/item/{id}", delete(delete_food))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    svc: MacroMateService,
    port: u16,
    bind: &str,
    json: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
    };
    let app = build_router(state);

    if bind != "127.0.0.1" && bind != "localhost" {
        eprintln!(
            "Warning: Listening on {bind}. The API has no authentication, so any device on your network can read and change your data."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    let url = format!("http://{bind}:{port}");
    if json {
        println!(
            "{}",
            serde_json::json!({"listening": url, "version": env!("CARGO_PKG_VERSION")})
        );
    } else {
        eprintln!("Listening on {url}");
    }
    tracing::info!(bind, port, "server started");
    axum::serve(listener, app).await?;

    Ok(())
}
