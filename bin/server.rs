// Rolloff Directory - Web Server
// Sitemap endpoints, directory data API, and lead intake

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use rolloff_directory::{
    build_sitemap_entries, city_sitemap_xml, validate_lead, AppConfig, CatalogStore, LeadStore,
    NewLead, SitemapEntry, StoreError,
};
use serde::Serialize;
use std::env;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: AppConfig,
    catalog: Option<CatalogStore>,
    leads: Option<LeadStore>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

/// Created lead response
#[derive(Serialize)]
struct CreatedLead {
    id: String,
}

// ============================================================================
// Sitemap Handlers
// ============================================================================

/// GET /sitemap - Structured sitemap: static routes plus the geographic
/// catalog, one JSON entry per URL
async fn get_sitemap(State(state): State<AppState>) -> impl IntoResponse {
    match assemble_sitemap(&state).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => {
            error!("sitemap assembly failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn assemble_sitemap(state: &AppState) -> Result<Vec<SitemapEntry>, StoreError> {
    let catalog = state.catalog.as_ref().ok_or(StoreError::Configuration)?;

    let states = catalog.fetch_states().await?;
    let cities = catalog.fetch_cities().await?;

    Ok(build_sitemap_entries(
        &state.config.site_origin,
        Utc::now(),
        &states,
        &cities,
    ))
}

/// GET /cities-sitemap.xml - City listing pages as raw sitemap XML,
/// cacheable by CDNs for an hour
async fn get_cities_sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = match state.catalog.as_ref() {
        Some(catalog) => catalog,
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                StoreError::Configuration.to_string(),
            )
                .into_response()
        }
    };

    match catalog.fetch_cities().await {
        Ok(cities) => {
            let xml = city_sitemap_xml(
                &state.config.site_origin,
                Utc::now().date_naive(),
                &cities,
            );

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=3600, stale-while-revalidate=86400",
                    ),
                ],
                xml,
            )
                .into_response()
        }
        Err(e) => {
            error!("city fetch failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch cities: {e}"),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/states - All states in the directory
async fn get_states(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = match state.catalog.as_ref() {
        Some(catalog) => catalog,
        None => return store_unavailable(),
    };

    match catalog.fetch_states().await {
        Ok(states) => (StatusCode::OK, Json(ApiResponse::ok(states))).into_response(),
        Err(e) => {
            error!("state list failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /api/states/:state/cities - Cities of one state
async fn get_state_cities(
    State(state): State<AppState>,
    Path(state_slug): Path<String>,
) -> impl IntoResponse {
    let catalog = match state.catalog.as_ref() {
        Some(catalog) => catalog,
        None => return store_unavailable(),
    };

    // Decode URL-encoded slug
    let decoded = urlencoding::decode(&state_slug)
        .unwrap_or_else(|_| state_slug.clone().into())
        .into_owned();

    match catalog.fetch_cities_in_state(&decoded).await {
        Ok(cities) => (StatusCode::OK, Json(ApiResponse::ok(cities))).into_response(),
        Err(e) => {
            error!("city list for {decoded} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/leads - Capture a quote request
async fn create_lead(
    State(state): State<AppState>,
    Json(submission): Json<NewLead>,
) -> impl IntoResponse {
    if let Err(errors) = validate_lead(&submission) {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::err(message))).into_response();
    }

    let leads = match state.leads.as_ref() {
        Some(leads) => leads,
        None => return store_unavailable(),
    };

    match leads.insert(submission).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(CreatedLead { id })),
        )
            .into_response(),
        Err(e) => {
            error!("lead insert failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            )
                .into_response()
        }
    }
}

fn store_unavailable() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::err(StoreError::Configuration.to_string())),
    )
        .into_response()
}

// ============================================================================
// Wiring
// ============================================================================

fn build_state(config: AppConfig) -> AppState {
    let catalog = match CatalogStore::new(&config) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("catalog store unavailable: {e}");
            None
        }
    };
    let leads = match LeadStore::new(&config) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("lead store unavailable: {e}");
            None
        }
    };

    AppState {
        config,
        catalog,
        leads,
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/states", get(get_states))
        .route("/states/:state/cities", get(get_state_cities))
        .route("/leads", post(create_lead))
        .with_state(state.clone());

    Router::new()
        .route("/sitemap", get(get_sitemap))
        .route("/cities-sitemap.xml", get(get_cities_sitemap))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("🚛 Rolloff Directory - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::from_env();
    println!("✓ Site origin: {}", config.site_origin);
    if config.supabase.is_none() {
        println!("⚠️  Supabase credentials are not configured");
        println!("   Set SUPABASE_URL and SUPABASE_ANON_KEY; catalog endpoints");
        println!("   will answer HTTP 500 until they are present.");
    }

    let state = build_state(config);
    let app = router(state);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://{addr}");
    println!("   Sitemap:  http://{addr}/sitemap");
    println!("   XML:      http://{addr}/cities-sitemap.xml");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

// ============================================================================
// Tests
// ============================================================================
