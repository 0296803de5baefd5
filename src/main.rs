use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpRequest, HttpServer};
use guia_local::config::Settings;
use guia_local::core::{SearchPipeline, SponsorshipSelector};
use guia_local::routes::{self, ApiError, AppState, PageLimits};
use guia_local::services::{
    CacheManager, CredentialService, GeocodingClient, PaymentClient, PostgresClient,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query: {}", err)).into()
}

/// Handle path parameter errors (e.g. a non-numeric company id)
fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid path: {}", err)).into()
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", what, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Guia Local API...");

    // Postal lookup cache; Redis is optional
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(86_400);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => match CacheManager::new(url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("Cache manager initialized in-process (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };

    let geocoder = GeocodingClient::new(
        settings.geocoding.base_url.clone(),
        Duration::from_secs(settings.geocoding.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build geocoding client", e))?
    .with_cache(Arc::new(cache));

    if settings.payment.access_token.is_empty() {
        warn!("Payment gateway access token is not set; checkout requests will fail");
    }

    let payments = PaymentClient::new(
        settings.payment.base_url.clone(),
        settings.payment.access_token.clone(),
        settings.payment.frontend_url.clone(),
        Duration::from_secs(settings.payment.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to build payment client", e))?;

    // Initialize PostgreSQL client (runs migrations)
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        Some(db_min_conn),
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    let search = SearchPipeline::new(settings.search.default_radius_km);
    let sponsorship = SponsorshipSelector::new(
        settings.sponsorship.default_limit,
        settings.sponsorship.max_limit,
    );

    info!(
        "Search radius default {} km, sponsored limit {} (max {})",
        settings.search.default_radius_km,
        settings.sponsorship.default_limit,
        settings.sponsorship.max_limit
    );

    // Build application state
    let app_state = AppState {
        postgres: Arc::new(postgres),
        geocoder: Arc::new(geocoder),
        payments: Arc::new(payments),
        credentials: Arc::new(CredentialService::new(
            settings.auth.jwt_secret.clone(),
            settings.auth.token_ttl_secs,
        )),
        search,
        sponsorship,
        paging: PageLimits {
            default_per_page: settings.search.default_per_page,
            max_per_page: settings.search.max_per_page,
        },
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
