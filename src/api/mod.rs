use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    AllocationResult, Assumptions, Category, CategoryTally, LifeExpectancy, LifeTable,
    LookupError, PersonProfile, Population, Sex, TimeStats, category_tally, compute, grid_cells,
    render_text_grid, time_stats,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_HOURS_PER_DAY: f64 = 24.0;
const MAX_DAYS_PER_WEEK: f64 = 7.0;
const MAX_VISIT_DAYS_PER_MONTH: f64 = 30.44;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliSex {
    Male,
    Female,
}

impl From<CliSex> for Sex {
    fn from(value: CliSex) -> Self {
        match value {
            CliSex::Male => Sex::Male,
            CliSex::Female => Sex::Female,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiSex {
    #[serde(alias = "m", alias = "Male")]
    Male,
    #[serde(alias = "f", alias = "Female")]
    Female,
}

impl From<ApiSex> for CliSex {
    fn from(value: ApiSex) -> Self {
        match value {
            ApiSex::Male => CliSex::Male,
            ApiSex::Female => CliSex::Female,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiPopulation {
    Male,
    Female,
    #[serde(alias = "parents", alias = "all")]
    General,
}

impl From<ApiPopulation> for Population {
    fn from(value: ApiPopulation) -> Self {
        match value {
            ApiPopulation::Male => Population::Male,
            ApiPopulation::Female => Population::Female,
            ApiPopulation::General => Population::General,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AllocatePayload {
    birth_date: Option<String>,
    #[serde(alias = "gender")]
    sex: Option<ApiSex>,
    #[serde(alias = "parentFatherBirthDate")]
    father_birth_date: Option<String>,
    #[serde(alias = "parentMotherBirthDate")]
    mother_birth_date: Option<String>,

    retirement_age: Option<f64>,
    sleep_hours_per_day: Option<f64>,
    work_days_per_week: Option<f64>,
    work_hours_per_day: Option<f64>,
    child_birth_age: Option<f64>,
    child_raising_years: Option<f64>,
    child_hours_per_day: Option<f64>,
    parent_visit_days_per_month: Option<f64>,

    today: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LifeExpectancyQuery {
    population: Option<ApiPopulation>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lifegrid",
    about = "Life in months: split the rest of a lifetime into sleep, work, family and free time"
)]
pub struct Cli {
    #[arg(long, help = "Birth date as YYYY-MM-DD")]
    pub birth_date: Option<String>,
    #[arg(long, value_enum, default_value_t = CliSex::Male)]
    pub sex: CliSex,
    #[arg(long, help = "Father's birth date as YYYY-MM-DD")]
    pub father_birth_date: Option<String>,
    #[arg(long, help = "Mother's birth date as YYYY-MM-DD")]
    pub mother_birth_date: Option<String>,
    #[arg(long, default_value_t = 60.0)]
    pub retirement_age: f64,
    #[arg(long, default_value_t = 8.0)]
    pub sleep_hours_per_day: f64,
    #[arg(long, default_value_t = 5.0)]
    pub work_days_per_week: f64,
    #[arg(long, default_value_t = 8.0)]
    pub work_hours_per_day: f64,
    #[arg(long, default_value_t = 30.0, help = "Age at the birth of your first child")]
    pub child_birth_age: f64,
    #[arg(
        long,
        default_value_t = 18.0,
        help = "Years spent raising a child before they leave home"
    )]
    pub child_raising_years: f64,
    #[arg(long, default_value_t = 5.0)]
    pub child_hours_per_day: f64,
    #[arg(long, default_value_t = 1.0)]
    pub parent_visit_days_per_month: f64,
    #[arg(long, help = "Pin the current date (YYYY-MM-DD) instead of reading the clock")]
    pub today: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("birthDate is required")]
    MissingBirthDate,
    #[error("{field} must be a date formatted YYYY-MM-DD, got {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("{field} must be >= 0")]
    Negative { field: &'static str },
    #[error("{field} must be between 0 and {max}")]
    OutOfRange { field: &'static str, max: f64 },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("life expectancy lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Validated inputs for one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    pub profile: PersonProfile,
    pub assumptions: Assumptions,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateResponse {
    pub today: NaiveDate,
    pub life_expectancy: LifeExpectancy,
    pub parent_life_expectancy: LifeExpectancy,
    pub allocation: AllocationResult,
    pub retirement_month_index: Option<u32>,
    pub cells: Vec<Category>,
    pub tally: CategoryTally,
    pub time_stats: TimeStats,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    table: Arc<LifeTable>,
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, InputError> {
    let value = finite_or_zero(value);
    if value < 0.0 {
        return Err(InputError::Negative { field });
    }
    Ok(value)
}

fn bounded(field: &'static str, value: f64, max: f64) -> Result<f64, InputError> {
    let value = finite_or_zero(value);
    if !(0.0..=max).contains(&value) {
        return Err(InputError::OutOfRange { field, max });
    }
    Ok(value)
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, InputError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| InputError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

pub fn build_request(cli: &Cli) -> Result<AllocationRequest, InputError> {
    let birth_date = parse_date("birthDate", cli.birth_date.as_deref())?
        .ok_or(InputError::MissingBirthDate)?;
    let father_birth_date = parse_date("fatherBirthDate", cli.father_birth_date.as_deref())?;
    let mother_birth_date = parse_date("motherBirthDate", cli.mother_birth_date.as_deref())?;
    let today = parse_date("today", cli.today.as_deref())?;

    let assumptions = Assumptions {
        retirement_age: non_negative("retirementAge", cli.retirement_age)?,
        sleep_hours_per_day: bounded(
            "sleepHoursPerDay",
            cli.sleep_hours_per_day,
            MAX_HOURS_PER_DAY,
        )?,
        work_days_per_week: bounded(
            "workDaysPerWeek",
            cli.work_days_per_week,
            MAX_DAYS_PER_WEEK,
        )?,
        work_hours_per_day: bounded(
            "workHoursPerDay",
            cli.work_hours_per_day,
            MAX_HOURS_PER_DAY,
        )?,
        child_birth_age: non_negative("childBirthAge", cli.child_birth_age)?,
        child_raising_years: non_negative("childRaisingYears", cli.child_raising_years)?,
        child_hours_per_day: bounded(
            "childHoursPerDay",
            cli.child_hours_per_day,
            MAX_HOURS_PER_DAY,
        )?,
        parent_visit_days_per_month: bounded(
            "parentVisitDaysPerMonth",
            cli.parent_visit_days_per_month,
            MAX_VISIT_DAYS_PER_MONTH,
        )?,
    };

    Ok(AllocationRequest {
        profile: PersonProfile {
            birth_date,
            sex: cli.sex.into(),
            father_birth_date,
            mother_birth_date,
        },
        assumptions,
        today,
    })
}

/// Looks up both life expectancies and runs the engine. A failed lookup
/// stops the computation before the engine is invoked.
pub fn allocate(
    table: &LifeTable,
    request: &AllocationRequest,
    now: NaiveDateTime,
) -> Result<AllocateResponse, LookupError> {
    let life_expectancy = table.lookup(request.profile.sex.into())?;
    let parent_life_expectancy = table.lookup(Population::General)?;

    let (today, now) = match request.today {
        Some(day) => (day, day.and_time(NaiveTime::MIN)),
        None => (now.date(), now),
    };

    let allocation = compute(
        &request.profile,
        &request.assumptions,
        &life_expectancy,
        &parent_life_expectancy,
        today,
    );
    debug!(
        elapsed_months = allocation.elapsed_months,
        total_months = allocation.total_months,
        "allocation computed"
    );

    let cells = grid_cells(&allocation)
        .into_iter()
        .map(|cell| cell.category)
        .collect();
    let tally = category_tally(&allocation);
    let time_stats = time_stats(request.profile.birth_date, life_expectancy.age, now);

    Ok(AllocateResponse {
        today,
        retirement_month_index: allocation.retirement_month_index,
        life_expectancy,
        parent_life_expectancy,
        allocation,
        cells,
        tally,
        time_stats,
    })
}

pub fn run_cli(cli: &Cli) -> Result<String, RunError> {
    let request = build_request(cli)?;
    let response = allocate(&LifeTable::default(), &request, Local::now().naive_local())?;
    match cli.format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&response)?)),
        OutputFormat::Text => Ok(render_text_report(&response)),
    }
}

fn render_text_report(response: &AllocateResponse) -> String {
    let a = &response.allocation;
    let life = &response.life_expectancy;
    let mut out = String::new();
    out.push_str(&format!(
        "Life expectancy {} ({} {}, {})\n",
        life.age, life.source, life.year, life.country
    ));
    out.push_str(&format!(
        "Months lived {} of {}, {} remaining\n",
        a.elapsed_months, a.total_months, a.remaining_months
    ));
    for (label, months) in [
        ("sleep", a.sleep_months),
        ("work", a.work_months),
        ("child", a.child_months),
        ("parents", a.parent_months),
        ("free", a.free_months),
    ] {
        out.push_str(&format!("  {label:<8}{months:>8.1} months\n"));
    }
    let detail = &a.parents_detail;
    if detail.father_remaining_years > 0.0 {
        out.push_str(&format!(
            "  father has about {:.1} years left\n",
            detail.father_remaining_years
        ));
    }
    if detail.mother_remaining_years > 0.0 {
        out.push_str(&format!(
            "  mother has about {:.1} years left\n",
            detail.mother_remaining_years
        ));
    }
    out.push_str(&format!(
        "  visits sized on {} ({:.1} years)\n",
        detail.label.as_str(),
        detail.effective_years
    ));
    match a.retirement_month_index {
        Some(index) => out.push_str(&format!("Retirement at month {index} (R)\n")),
        None => out.push_str("Retirement not reached\n"),
    }
    out.push('\n');
    out.push_str(&render_text_grid(a));
    out
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "lifegrid HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router(LifeTable::default())).await
}

fn router(table: LifeTable) -> Router {
    let state = AppState {
        table: Arc::new(table),
    };
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/life-expectancy", get(life_expectancy_handler))
        .route(
            "/api/allocate",
            get(allocate_get_handler).post(allocate_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn life_expectancy_handler(
    State(state): State<AppState>,
    Query(query): Query<LifeExpectancyQuery>,
) -> Response {
    let population = query
        .population
        .map(Population::from)
        .unwrap_or(Population::General);
    match state.table.lookup(population) {
        Ok(life) => json_response(StatusCode::OK, life),
        Err(err) => lookup_failure(&err),
    }
}

async fn allocate_get_handler(
    State(state): State<AppState>,
    Query(payload): Query<AllocatePayload>,
) -> Response {
    allocate_handler_impl(&state.table, payload, Local::now().naive_local())
}

async fn allocate_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<AllocatePayload>,
) -> Response {
    allocate_handler_impl(&state.table, payload, Local::now().naive_local())
}

fn allocate_handler_impl(
    table: &LifeTable,
    payload: AllocatePayload,
    now: NaiveDateTime,
) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected allocation input");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    match allocate(table, &request, now) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => lookup_failure(&err),
    }
}

fn lookup_failure(err: &LookupError) -> Response {
    warn!(error = %err, "life expectancy lookup failed");
    error_response(
        StatusCode::BAD_GATEWAY,
        "Life expectancy data is unavailable, please try again later",
    )
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<AllocationRequest, String> {
    let payload = serde_json::from_str::<AllocatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload).map_err(|e| e.to_string())
}

fn request_from_payload(payload: AllocatePayload) -> Result<AllocationRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.birth_date {
        cli.birth_date = Some(v);
    }
    if let Some(v) = payload.sex {
        cli.sex = v.into();
    }
    if let Some(v) = payload.father_birth_date {
        cli.father_birth_date = Some(v);
    }
    if let Some(v) = payload.mother_birth_date {
        cli.mother_birth_date = Some(v);
    }

    if let Some(v) = payload.retirement_age {
        cli.retirement_age = v;
    }
    if let Some(v) = payload.sleep_hours_per_day {
        cli.sleep_hours_per_day = v;
    }
    if let Some(v) = payload.work_days_per_week {
        cli.work_days_per_week = v;
    }
    if let Some(v) = payload.work_hours_per_day {
        cli.work_hours_per_day = v;
    }
    if let Some(v) = payload.child_birth_age {
        cli.child_birth_age = v;
    }
    if let Some(v) = payload.child_raising_years {
        cli.child_raising_years = v;
    }
    if let Some(v) = payload.child_hours_per_day {
        cli.child_hours_per_day = v;
    }
    if let Some(v) = payload.parent_visit_days_per_month {
        cli.parent_visit_days_per_month = v;
    }

    if let Some(v) = payload.today {
        cli.today = Some(v);
    }

    build_request(&cli)
}

fn default_cli_for_api() -> Cli {
    let defaults = Assumptions::default();
    Cli {
        birth_date: None,
        sex: CliSex::Male,
        father_birth_date: None,
        mother_birth_date: None,
        retirement_age: defaults.retirement_age,
        sleep_hours_per_day: defaults.sleep_hours_per_day,
        work_days_per_week: defaults.work_days_per_week,
        work_hours_per_day: defaults.work_hours_per_day,
        child_birth_age: defaults.child_birth_age,
        child_raising_years: defaults.child_raising_years,
        child_hours_per_day: defaults.child_hours_per_day,
        parent_visit_days_per_month: defaults.parent_visit_days_per_month,
        today: None,
        format: OutputFormat::Json,
    }
}
