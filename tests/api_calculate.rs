use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use pv_plant_calculator::api;
use pv_plant_calculator::catalog::{Catalog, SamCsvLoader};
use pv_plant_calculator::config::Config;
use pv_plant_calculator::controller::{AppState, PlantDesigner};
use pv_plant_calculator::domain::{WeatherError, WeatherSeries};
use pv_plant_calculator::simulation::ReferenceYieldSimulator;
use pv_plant_calculator::sizing::SizingOptimizer;
use pv_plant_calculator::weather::{
    DesignTemperatures, DesignWeatherSource, SyntheticWeatherGenerator, WeatherProvider,
};

const MODULE: &str = "Canadian_Solar_CS6X_300M__2013_";
const INVERTER: &str = "SMA_America__SB7000US__240V_";

mock! {
    pub DesignWeather {}

    #[async_trait]
    impl DesignWeatherSource for DesignWeather {
        async fn design_temperatures(&self, latitude: f64, longitude: f64) -> Option<DesignTemperatures>;
    }
}

/// Synthetic weather only, so no test touches the network.
struct OfflineWeather;

#[async_trait]
impl WeatherProvider for OfflineWeather {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSeries, WeatherError> {
        SyntheticWeatherGenerator::default().generate(2019, latitude, longitude, 42)
    }
}

fn app_with(design_weather: Arc<dyn DesignWeatherSource>) -> Router {
    let mut cfg = Config::default();
    cfg.catalog.default_module = Some(MODULE.to_string());
    cfg.catalog.default_inverter = Some(INVERTER.to_string());

    let catalog = Catalog::new(Box::new(SamCsvLoader::bundled()))
        .with_defaults(cfg.catalog.default_module.clone(), cfg.catalog.default_inverter.clone());
    let designer = PlantDesigner::new(
        Arc::new(catalog),
        Arc::new(OfflineWeather),
        design_weather,
        Arc::new(ReferenceYieldSimulator::default()),
        SizingOptimizer::new(cfg.sizing.clone().into()),
        cfg.finance.clone(),
    );
    let state = AppState::with_designer(cfg.clone(), designer);
    api::router(state, &cfg)
}

fn app() -> Router {
    let mut design_weather = MockDesignWeather::new();
    design_weather
        .expect_design_temperatures()
        .returning(|_, _| None);
    app_with(Arc::new(design_weather))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn calculate_returns_full_report() {
    let (status, body) = send(
        app(),
        post_json(
            "/calculate",
            json!({ "system_size": 5.0, "latitude": 23.81, "longitude": 90.41, "project_life": 25 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);

    let analysis = &body["system_analysis"];
    let n = analysis["modules_per_string"].as_u64().unwrap();
    assert!((10..=12).contains(&n), "modules per string {n}");
    assert_eq!(analysis["module_type"], MODULE);
    assert_eq!(analysis["inverter_type"], INVERTER);
    assert!(analysis["annual_energy"].as_f64().unwrap() > 0.0);
    assert_eq!(analysis["monthly_energy"].as_array().unwrap().len(), 12);
    assert_eq!(analysis["daily_energy"].as_array().unwrap().len(), 24);
    assert_eq!(analysis["design_temp_fallback"], true);

    assert_eq!(body["weather_data"]["source"], "synthetic");
    assert_eq!(body["weather_data"]["demonstrative"], true);
    assert_eq!(body["weather_data"]["hourly_wind_speed"].as_array().unwrap().len(), 8760);

    let financials = &body["financials"];
    assert_eq!(financials["cumulative_cashflow"].as_array().unwrap().len(), 26);
    assert_eq!(financials["annual_cashflow"].as_array().unwrap().len(), 26);
    assert!(financials["cost_breakdown"]["Balance of System"].as_f64().unwrap() > 0.0);
    assert!(body["sizing_status"]["status"].is_string());
}

#[tokio::test]
async fn calculate_uses_station_design_temperatures() {
    let mut design_weather = MockDesignWeather::new();
    design_weather
        .expect_design_temperatures()
        .times(1)
        .returning(|_, _| {
            Some(DesignTemperatures {
                min_c: 10.5,
                max_c: 36.2,
                from_fallback: false,
            })
        });

    let (status, body) = send(
        app_with(Arc::new(design_weather)),
        post_json("/calculate", json!({ "system_size": 5.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["system_analysis"]["min_design_temp"], 10.5);
    assert_eq!(body["system_analysis"]["design_temp_fallback"], false);
}

#[tokio::test]
async fn calculate_in_bdt_scales_costs() {
    let (_, usd) = send(app(), post_json("/calculate", json!({ "system_size": 5.0 }))).await;
    let (_, bdt) = send(
        app(),
        post_json("/calculate", json!({ "system_size": 5.0, "currency": "BDT" })),
    )
    .await;

    let usd_modules = usd["financials"]["cost_breakdown"]["Modules"].as_f64().unwrap();
    let bdt_modules = bdt["financials"]["cost_breakdown"]["Modules"].as_f64().unwrap();
    assert!((bdt_modules / usd_modules - 110.0).abs() < 1e-6);
    assert_eq!(bdt["financials"]["currency"], "BDT");
}

#[tokio::test]
async fn calculate_rejects_unknown_module() {
    let (status, body) = send(
        app(),
        post_json("/calculate", json!({ "module": "No_Such_Module" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("No_Such_Module"));
}

#[tokio::test]
async fn calculate_rejects_out_of_range_latitude() {
    let (status, body) = send(app(), post_json("/calculate", json!({ "latitude": 123.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn calculate_reports_voltage_incompatible_pair() {
    // 100 kW three-phase inverter whose MPPT window starts at 850 V and ends there too.
    let (status, body) = send(
        app(),
        post_json(
            "/calculate",
            json!({ "inverter": "SolarEdge_Technologies_Ltd___SE100KUS__480V_" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_rating");
}

#[tokio::test]
async fn module_list_points_at_default() {
    let (status, body) = send(app(), get("/api/get_modules")).await;
    assert_eq!(status, StatusCode::OK);
    let modules = body["modules"].as_array().unwrap();
    let index = body["default_index"].as_u64().unwrap() as usize;
    assert_eq!(modules[index], MODULE);

    let (_, body) = send(app(), get("/api/get_inverters")).await;
    let inverters = body["inverters"].as_array().unwrap();
    let index = body["default_index"].as_u64().unwrap() as usize;
    assert_eq!(inverters[index], INVERTER);
}

#[tokio::test]
async fn details_require_a_name() {
    let (status, body) = send(app(), get("/api/get_module_details")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No module specified");

    let (status, _) = send(app(), get("/api/get_inverter_details?inverter=Nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(app(), get(&format!("/api/get_module_details?module={MODULE}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["name"], MODULE);
    assert!((body["details"]["area"].as_f64().unwrap() - 1.91).abs() < 1e-9);
}

#[tokio::test]
async fn check_sizing_reports_inverter_count() {
    let (status, body) = send(
        app(),
        get(&format!("/api/check_sizing?module={MODULE}&inverter={INVERTER}&system_size=20")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sizing_status"]["inverters_needed"], 3);
    assert!(body["configuration"].is_object());
}

fn station_weather() -> MockDesignWeather {
    let mut design_weather = MockDesignWeather::new();
    design_weather
        .expect_design_temperatures()
        .times(1)
        .returning(|_, _| {
            Some(DesignTemperatures {
                min_c: 10.5,
                max_c: 36.2,
                from_fallback: false,
            })
        });
    design_weather
}

#[tokio::test]
async fn check_sizing_uses_same_design_temperatures_as_calculate() {
    let (status, check) = send(
        app_with(Arc::new(station_weather())),
        get(&format!(
            "/api/check_sizing?module={MODULE}&inverter={INVERTER}&system_size=5&latitude=23.81&longitude=90.41"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{check}");
    assert_eq!(check["design_temperatures"]["from_fallback"], false);
    assert_eq!(check["design_temperatures"]["min_c"], 10.5);

    let (_, calc) = send(
        app_with(Arc::new(station_weather())),
        post_json("/calculate", json!({ "system_size": 5.0, "latitude": 23.81, "longitude": 90.41 })),
    )
    .await;
    assert_eq!(
        check["configuration"]["modules_per_string"],
        calc["system_analysis"]["modules_per_string"]
    );
}

#[tokio::test]
async fn check_sizing_without_station_reports_fallback() {
    let (status, body) = send(
        app(),
        get(&format!("/api/check_sizing?module={MODULE}&inverter={INVERTER}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["design_temperatures"]["from_fallback"], true);
}

#[tokio::test]
async fn check_sizing_rejects_out_of_range_latitude() {
    let (status, _) = send(
        app(),
        get(&format!("/api/check_sizing?module={MODULE}&inverter={INVERTER}&latitude=120")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weather_data_is_marked_synthetic() {
    let (status, body) = send(app(), get("/get_weather_data?latitude=23.81&longitude=90.41")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "synthetic");
    assert_eq!(body["demonstrative"], true);
    assert_eq!(body["monthly_ghi"].as_array().unwrap().len(), 12);
    assert_eq!(body["hours"], 8760);
}

#[tokio::test]
async fn healthz_reports_alive() {
    let (status, body) = send(app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}
