use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

use crate::catalog::{
    Catalog, CatalogEntry, Category, CategorySummary, SortKey, find_category, search_calculators,
    search_categories,
};
use crate::config::AppConfig;
use crate::core::{
    CalculatorRegistry, CalculatorSchema, FieldSpec, InputRecord, Presentation, RawInput,
    ResultRecord,
};
use crate::error::AppError;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CalculatorRegistry>,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(registry: CalculatorRegistry, catalog: Catalog) -> Self {
        Self {
            registry: Arc::new(registry),
            catalog: Arc::new(catalog),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let registry = CalculatorRegistry::standard()?;
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        Ok(Self::new(registry, catalog))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    calculators: usize,
    categories: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculatorSummary {
    slug: &'static str,
    name: &'static str,
    summary: &'static str,
    field_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculatorDetail<'a> {
    slug: &'static str,
    name: &'static str,
    summary: &'static str,
    fields: &'a [FieldSpec],
    defaults: BTreeMap<String, String>,
}

impl<'a> From<&'a CalculatorSchema> for CalculatorDetail<'a> {
    fn from(schema: &'a CalculatorSchema) -> Self {
        Self {
            slug: schema.slug,
            name: schema.name,
            summary: schema.summary,
            fields: &schema.fields,
            defaults: schema.defaults(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse<'a> {
    calculator: &'static str,
    inputs: &'a InputRecord,
    result: &'a ResultRecord,
    presentation: Presentation,
}

#[derive(Debug, Default, Deserialize)]
struct CategoriesQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesResponse {
    query: String,
    sort: SortKey,
    count: usize,
    categories: Vec<CategorySummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDetail<'a> {
    #[serde(flatten)]
    category: &'a Category,
    calculator_count: usize,
    /// Catalog entries that the registry can compute.
    available: Vec<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<'a> {
    query: String,
    count: usize,
    calculators: Vec<&'a CatalogEntry>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calculators", get(list_calculators_handler))
        .route("/api/calculators/:slug", get(calculator_handler))
        .route(
            "/api/calculators/:slug/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route("/api/categories", get(categories_handler))
        .route("/api/categories/:slug", get(category_handler))
        .route("/api/search", get(search_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let calculators = state.registry.len();
    let categories = state.catalog.categories.len();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, calculators, categories, "calculator service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            calculators: state.registry.len(),
            categories: state.catalog.categories.len(),
        },
    )
}

async fn list_calculators_handler(State(state): State<AppState>) -> Response {
    let summaries: Vec<CalculatorSummary> = state
        .registry
        .schemas()
        .map(|schema| CalculatorSummary {
            slug: schema.slug,
            name: schema.name,
            summary: schema.summary,
            field_count: schema.fields.len(),
        })
        .collect();
    json_response(StatusCode::OK, summaries)
}

async fn calculator_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let calculator = state.registry.get(&slug)?;
    Ok(json_response(
        StatusCode::OK,
        CalculatorDetail::from(calculator.schema()),
    ))
}

async fn calculate_get_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    calculate_handler_impl(&state, &slug, raw)
}

async fn calculate_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let raw = raw_input_from_json(&body)?;
    calculate_handler_impl(&state, &slug, raw)
}

fn calculate_handler_impl(
    state: &AppState,
    slug: &str,
    raw: RawInput,
) -> Result<Response, AppError> {
    let calculation = state.registry.calculate(slug, &raw)?;
    let response = CalculateResponse {
        calculator: calculation.slug,
        inputs: &calculation.inputs,
        result: &calculation.result,
        presentation: Presentation::from_result(&calculation.result),
    };
    Ok(json_response(StatusCode::OK, response))
}

/// Accepts a flat JSON object whose values are strings, numbers or booleans.
/// `null` counts as a blank field.
fn raw_input_from_json(body: &[u8]) -> Result<RawInput, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawInput::new());
    }
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON payload: {e}")))?;
    let Value::Object(map) = payload else {
        return Err(AppError::BadRequest(
            "payload must be a JSON object of field values".to_string(),
        ));
    };

    let mut raw = RawInput::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::BadRequest(format!(
                    "field `{key}` must be a string, number or boolean"
                )));
            }
        };
        raw.insert(key, text);
    }
    Ok(raw)
}

async fn categories_handler(
    State(state): State<AppState>,
    Query(query): Query<CategoriesQuery>,
) -> Result<Response, AppError> {
    let sort = match query.sort.as_deref() {
        Some(raw) => raw.parse::<SortKey>().map_err(AppError::BadRequest)?,
        None => SortKey::default(),
    };
    let text = query.q.unwrap_or_default();
    let categories = search_categories(&state.catalog, &text, sort);
    Ok(json_response(
        StatusCode::OK,
        CategoriesResponse {
            query: text,
            sort,
            count: categories.len(),
            categories,
        },
    ))
}

async fn category_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let category = find_category(&state.catalog, &slug)
        .ok_or_else(|| AppError::CategoryNotFound(slug.clone()))?;
    let available = category
        .entries()
        .filter(|e| state.registry.get(&e.slug).is_ok())
        .map(|e| e.slug.as_str())
        .collect();
    Ok(json_response(
        StatusCode::OK,
        CategoryDetail {
            category,
            calculator_count: category.calculator_count(),
            available,
        },
    ))
}

async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let text = query.q.unwrap_or_default();
    let calculators = search_calculators(&state.catalog, &text);
    json_response(
        StatusCode::OK,
        SearchResponse {
            query: text,
            count: calculators.len(),
            calculators,
        },
    )
}

async fn not_found_handler() -> Response {
    AppError::NotFound.into_response()
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
    response
}
