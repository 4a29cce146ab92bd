pub mod catalog;
pub mod design;
pub mod error;
pub mod health;
pub mod response;
pub mod weather;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, controller::AppState};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route("/calculate", post(design::calculate))
        .route("/get_weather_data", get(weather::get_weather_data))
        .route("/api/get_modules", get(catalog::get_modules))
        .route("/api/get_inverters", get(catalog::get_inverters))
        .route("/api/get_module_details", get(catalog::get_module_details))
        .route("/api/get_inverter_details", get(catalog::get_inverter_details))
        .route("/api/check_sizing", get(catalog::check_sizing))
        .route("/healthz", get(health::liveness))
        .with_state(state);

    if cfg.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}
