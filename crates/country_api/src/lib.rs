//! HTTP API for the country information service.

pub mod config;
pub mod error;
pub mod routes;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::{AppState, HealthResponse, MessageResponse};

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use log::{info, warn};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Build the HTTP router for the given configuration.
pub fn build_router(config: &ApiConfig) -> Router {
    let countries = Router::new()
        .route(
            "/countries",
            get(routes::list_countries).post(routes::create_country),
        )
        .route("/countries/search", get(routes::search_countries))
        .route("/countries/stats/overview", get(routes::country_statistics))
        .route("/countries/name/{name}", get(routes::get_country_by_name))
        .route("/countries/region/{region}", get(routes::countries_in_region))
        .route(
            "/countries/{id}",
            get(routes::get_country)
                .put(routes::update_country)
                .delete(routes::delete_country),
        );

    let prefix = config.normalized_prefix();
    let app = Router::new().route("/health", get(routes::health));
    let app = if prefix.is_empty() {
        app.merge(countries)
    } else {
        app.nest(&prefix, countries)
    };

    app.layer(cors_layer(&config.cors_origins))
        .with_state(AppState::new(config.database_path.clone()))
}

/// Binds `config.socket_addr()` and serves until Ctrl-C.
pub async fn serve(config: ApiConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    info!(
        "event=server_start module=api status=ok addr={} prefix={} database={}",
        listener.local_addr()?,
        config.normalized_prefix(),
        config.database_path.display()
    );

    axum::serve(listener, build_router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("event=cors_config module=api status=skipped reason=invalid_origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_stop module=api status=error error={err}");
    }
}
