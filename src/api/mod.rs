pub mod form;

use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Configuration, DEFAULT_MAX_ACCUMULATION_YEARS, DEFAULT_MAX_WITHDRAWAL_YEARS, LocaleCurrency, Period, ProjectionError,
    ProjectionOptions, ReportRow, Summary, project, render_table, report_rows, retirement_index,
    summarize,
};
use form::{ConfigError, ConfigurationForm, FormField};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliLocale {
    PtBr,
    EnUs,
}

impl From<CliLocale> for LocaleCurrency {
    fn from(value: CliLocale) -> Self {
        match value {
            CliLocale::PtBr => LocaleCurrency::PtBr,
            CliLocale::EnUs => LocaleCurrency::EnUs,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiLocale {
    #[serde(alias = "ptBr", alias = "pt_br", alias = "brl")]
    PtBr,
    #[serde(alias = "enUs", alias = "en_us", alias = "usd")]
    EnUs,
}

impl From<ApiLocale> for CliLocale {
    fn from(value: ApiLocale) -> Self {
        match value {
            ApiLocale::PtBr => CliLocale::PtBr,
            ApiLocale::EnUs => CliLocale::EnUs,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    salary: Option<f64>,
    #[serde(alias = "initialInvestiment")]
    initial_investment: Option<f64>,
    #[serde(alias = "monthlyInvestiment")]
    monthly_investment: Option<f64>,
    #[serde(alias = "monthlyInvestimentReadjustment")]
    monthly_investment_readjustment: Option<f64>,
    investment_return_percentage: Option<f64>,
    taxes_percentage: Option<f64>,
    inflation_percentage: Option<f64>,
    current_age: Option<f64>,
    retirement_age: Option<f64>,

    start_year: Option<i32>,
    max_accumulation_years: Option<u32>,
    max_withdrawal_years: Option<u32>,
    locale: Option<ApiLocale>,
}

#[derive(Parser, Debug)]
#[command(
    name = "retire",
    about = "Month-by-month retirement projection: save until retirement, then draw an inflation-adjusted salary",
    allow_negative_numbers = true
)]
struct Cli {
    #[arg(long, help = "Monthly living expense to replace, in today's money")]
    salary: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Initial investment (recorded, not added to the balance)"
    )]
    initial_investment: f64,
    #[arg(long, help = "Starting monthly contribution")]
    monthly_investment: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Yearly growth of the monthly contribution in percent"
    )]
    monthly_investment_readjustment: f64,
    #[arg(
        long,
        default_value_t = 15.0,
        help = "Tax withheld from investment income in percent"
    )]
    taxes_percentage: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Expected annual investment return in percent"
    )]
    investment_return_percentage: f64,
    #[arg(long, default_value_t = 5.0, help = "Expected annual inflation in percent")]
    inflation_percentage: f64,
    #[arg(long)]
    current_age: i32,
    #[arg(long)]
    retirement_age: i32,
    #[arg(long, help = "Calendar year of the first month; defaults to this year")]
    start_year: Option<i32>,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_ACCUMULATION_YEARS,
        help = "Longest accumulation phase accepted, in years"
    )]
    max_accumulation_years: u32,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_WITHDRAWAL_YEARS,
        help = "Withdrawal years simulated before giving up on a sustainable plan"
    )]
    max_withdrawal_years: u32,
    #[arg(long, value_enum, default_value_t = CliLocale::PtBr)]
    locale: CliLocale,
    #[arg(long, help = "Print the full result as JSON instead of a table")]
    json: bool,
}

#[derive(Copy, Clone, Debug)]
struct ProjectionRequest {
    config: Configuration,
    options: ProjectionOptions,
    locale: LocaleCurrency,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    configuration: Configuration,
    start_year: i32,
    accumulation_months: usize,
    withdrawal_months: usize,
    retirement_index: Option<usize>,
    summary: Option<Summary>,
    description: Option<String>,
    periods: Vec<Period>,
    rows: Vec<ReportRow>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
enum RequestError {
    Invalid(String),
    Projection(ProjectionError),
}

impl RequestError {
    /// A well-formed plan that never runs dry is 422; inputs the engine
    /// cannot represent are 400.
    fn status(&self) -> StatusCode {
        match self {
            RequestError::Invalid(_) => StatusCode::BAD_REQUEST,
            RequestError::Projection(ProjectionError::NonConvergent { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RequestError::Projection(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            RequestError::Invalid(msg) => msg.clone(),
            RequestError::Projection(err) => err.to_string(),
        }
    }
}

impl From<ConfigError> for RequestError {
    fn from(err: ConfigError) -> Self {
        RequestError::Invalid(err.to_string())
    }
}

impl From<ProjectionError> for RequestError {
    fn from(err: ProjectionError) -> Self {
        RequestError::Projection(err)
    }
}

fn build_request(cli: &Cli) -> Result<ProjectionRequest, String> {
    for (name, value) in [
        ("--salary", cli.salary),
        ("--initial-investment", cli.initial_investment),
        ("--monthly-investment", cli.monthly_investment),
        (
            "--monthly-investment-readjustment",
            cli.monthly_investment_readjustment,
        ),
        ("--taxes-percentage", cli.taxes_percentage),
        (
            "--investment-return-percentage",
            cli.investment_return_percentage,
        ),
        ("--inflation-percentage", cli.inflation_percentage),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if cli.salary < 0.0 {
        return Err("--salary must be >= 0".to_string());
    }

    if cli.monthly_investment < 0.0 {
        return Err("--monthly-investment must be >= 0".to_string());
    }

    if cli.retirement_age < cli.current_age {
        return Err("--retirement-age must be >= --current-age".to_string());
    }

    if cli.max_accumulation_years == 0 {
        return Err("--max-accumulation-years must be > 0".to_string());
    }

    if cli.max_withdrawal_years == 0 {
        return Err("--max-withdrawal-years must be > 0".to_string());
    }

    let mut options = match cli.start_year {
        Some(year) => ProjectionOptions::starting_in(year),
        None => ProjectionOptions::default(),
    };
    options.max_accumulation_years = cli.max_accumulation_years;
    options.max_withdrawal_years = cli.max_withdrawal_years;

    Ok(ProjectionRequest {
        config: Configuration {
            salary: cli.salary,
            initial_investment: cli.initial_investment,
            monthly_investment: cli.monthly_investment,
            monthly_investment_readjustment: cli.monthly_investment_readjustment,
            investment_return_percentage: cli.investment_return_percentage,
            taxes_percentage: cli.taxes_percentage,
            inflation_percentage: cli.inflation_percentage,
            current_age: cli.current_age,
            retirement_age: cli.retirement_age,
        },
        options,
        locale: cli.locale.into(),
    })
}

fn run_projection(request: &ProjectionRequest) -> Result<ProjectResponse, RequestError> {
    let periods = project(&request.config, &request.options)?;
    let split = retirement_index(&periods);
    let accumulation_months = split.unwrap_or(periods.len());
    let summary = summarize(&request.config, &periods);

    Ok(ProjectResponse {
        configuration: request.config,
        start_year: request.options.start_year,
        accumulation_months,
        withdrawal_months: periods.len() - accumulation_months,
        retirement_index: split,
        description: summary.map(|s| s.describe(&request.locale)),
        summary,
        rows: report_rows(&periods, &request.locale),
        periods,
    })
}

/// Parses `args` (program name first) and renders the projection as text or
/// JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let request = build_request(&cli)?;
    let response = run_projection(&request).map_err(|err| err.message())?;

    if cli.json {
        return serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize projection: {e}"));
    }

    let mut out = render_table(&response.periods, &request.locale);
    if let Some(description) = response.description {
        out.push('\n');
        out.push_str(&description);
        out.push('\n');
    }
    Ok(out)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("retirement projection API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control("ok")
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(params): Query<Vec<(String, String)>>) -> Response {
    match request_from_query(&params) {
        Ok(request) => project_handler_impl(request).await,
        Err(err) => error_response(err.status(), &err.message()),
    }
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    match request_from_payload(payload) {
        Ok(request) => project_handler_impl(request).await,
        Err(err) => error_response(err.status(), &err.message()),
    }
}

async fn project_handler_impl(request: ProjectionRequest) -> Response {
    let outcome = tokio::task::spawn_blocking(move || run_projection(&request)).await;
    match outcome {
        Ok(Ok(response)) => json_response(StatusCode::OK, response),
        Ok(Err(err)) => {
            warn!("projection rejected: {}", err.message());
            error_response(err.status(), &err.message())
        }
        Err(join_err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("projection task failed: {join_err}"),
        ),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
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

/// Query parameters arrive as raw text, so configuration fields go through
/// the same edit path as the entry form.
fn request_from_query(params: &[(String, String)]) -> Result<ProjectionRequest, RequestError> {
    let mut form = ConfigurationForm::default();
    let mut payload = ProjectPayload::default();

    for (key, value) in params {
        match key.as_str() {
            "startYear" => {
                payload.start_year = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| RequestError::Invalid("startYear must be an integer".into()))?,
                );
            }
            "maxAccumulationYears" => {
                payload.max_accumulation_years = Some(value.trim().parse().map_err(|_| {
                    RequestError::Invalid("maxAccumulationYears must be a positive integer".into())
                })?);
            }
            "maxWithdrawalYears" => {
                payload.max_withdrawal_years = Some(value.trim().parse().map_err(|_| {
                    RequestError::Invalid("maxWithdrawalYears must be a positive integer".into())
                })?);
            }
            "locale" => {
                let locale = serde_json::from_value(serde_json::Value::String(value.clone()))
                    .map_err(|_| RequestError::Invalid(format!("unknown locale `{value}`")))?;
                payload.locale = Some(locale);
            }
            _ => form = form.with_input(key, value)?,
        }
    }

    request_from_form(form, &payload)
}

fn request_from_payload(payload: ProjectPayload) -> Result<ProjectionRequest, RequestError> {
    let mut form = ConfigurationForm::default();
    for (field, value) in [
        (FormField::Salary, payload.salary),
        (FormField::InitialInvestment, payload.initial_investment),
        (FormField::MonthlyInvestment, payload.monthly_investment),
        (
            FormField::MonthlyInvestmentReadjustment,
            payload.monthly_investment_readjustment,
        ),
        (
            FormField::InvestmentReturnPercentage,
            payload.investment_return_percentage,
        ),
        (FormField::TaxesPercentage, payload.taxes_percentage),
        (FormField::InflationPercentage, payload.inflation_percentage),
        (FormField::CurrentAge, payload.current_age),
        (FormField::RetirementAge, payload.retirement_age),
    ] {
        if value.is_some() {
            form = form.with(field, value);
        }
    }

    request_from_form(form, &payload)
}

fn request_from_form(
    form: ConfigurationForm,
    payload: &ProjectPayload,
) -> Result<ProjectionRequest, RequestError> {
    let config = form.to_configuration()?;

    let mut options = match payload.start_year {
        Some(year) => ProjectionOptions::starting_in(year),
        None => ProjectionOptions::default(),
    };
    if let Some(years) = payload.max_accumulation_years {
        if years == 0 {
            return Err(RequestError::Invalid(
                "maxAccumulationYears must be > 0".to_string(),
            ));
        }
        options.max_accumulation_years = years;
    }
    if let Some(years) = payload.max_withdrawal_years {
        if years == 0 {
            return Err(RequestError::Invalid(
                "maxWithdrawalYears must be > 0".to_string(),
            ));
        }
        options.max_withdrawal_years = years;
    }

    let locale = payload
        .locale
        .map(|l| LocaleCurrency::from(CliLocale::from(l)))
        .unwrap_or_default();

    Ok(ProjectionRequest {
        config,
        options,
        locale,
    })
}
