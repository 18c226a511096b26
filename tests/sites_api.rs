//! End-to-end API tests over in-process routers with stubbed upstreams.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use solar_site_analyzer::api;
use solar_site_analyzer::config::{
    AiConfig, CacheConfig, Config, PanelConfig, ServerConfig, SolarApiConfig, WeatherApiConfig,
};
use solar_site_analyzer::domain::SiteConfig;
use solar_site_analyzer::pipeline::AppState;

struct TestEnv {
    solar: MockServer,
    weather: MockServer,
    cfg: Config,
    _cache_dir: TempDir,
}

async fn test_env() -> TestEnv {
    let solar = MockServer::start().await;
    let weather = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();

    let cfg = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            enable_cors: false,
            request_timeout_secs: 30,
        },
        cache: CacheConfig {
            path: cache_dir.path().join("saved_sites.json"),
        },
        panel: PanelConfig {
            area_m2: 1000.0,
            efficiency: 0.20,
        },
        solar: SolarApiConfig {
            base_url: solar.uri(),
            parameter: "ALLSKY_SFC_SW_DWN".to_string(),
            community: "SB".to_string(),
            start: "20240101".to_string(),
            end: "20240131".to_string(),
            http_timeout_seconds: 5,
        },
        weather: WeatherApiConfig {
            base_url: weather.uri(),
            http_timeout_seconds: 5,
        },
        ai: AiConfig {
            enabled: false,
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            image_enabled: false,
            image_model: "dall-e-3".to_string(),
        },
        sites: vec![
            SiteConfig {
                name: "Garden City, TX".to_string(),
                lat: 31.5,
                lon: -101.5,
                energy_type: "Wind + Grid".to_string(),
            },
            SiteConfig {
                name: "Nebraska Solar".to_string(),
                lat: 41.5,
                lon: -99.5,
                energy_type: "Solar + Grid".to_string(),
            },
        ],
    };

    TestEnv {
        solar,
        weather,
        cfg,
        _cache_dir: cache_dir,
    }
}

fn solar_body(points: &[(&str, f64)]) -> Value {
    let series: serde_json::Map<String, Value> = points
        .iter()
        .map(|(d, v)| (d.to_string(), json!(v)))
        .collect();
    json!({ "properties": { "parameter": { "ALLSKY_SFC_SW_DWN": series } } })
}

async fn mount_solar(env: &TestEnv, lat: &str, points: &[(&str, f64)]) {
    Mock::given(method("GET"))
        .and(path("/api/temporal/daily/point"))
        .and(query_param("latitude", lat))
        .respond_with(ResponseTemplate::new(200).set_body_json(solar_body(points)))
        .mount(&env.solar)
        .await;
}

async fn mount_weather(env: &TestEnv, lat: &str, wind: f64) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", lat))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latitude": lat.parse::<f64>().unwrap(),
            "timezone": "America/Chicago",
            "current": {
                "time": "2024-01-15T18:00",
                "temperature_2m": 14.2,
                "cloud_cover": 30.0,
                "wind_speed_10m": wind
            }
        })))
        .mount(&env.weather)
        .await;
}

async fn mount_happy_upstreams(env: &TestEnv) {
    // Garden City: 10 retained, one negative sentinel, 20 retained
    mount_solar(env, "31.5", &[("20240101", 10.0), ("20240102", -5.0), ("20240103", 20.0)]).await;
    // Nebraska: single strong day
    mount_solar(env, "41.5", &[("20240101", 25.0)]).await;
    mount_weather(env, "31.5", 25.0).await;
    mount_weather(env, "41.5", 5.0).await;
}

fn router(env: &TestEnv) -> axum::Router {
    let state = AppState::new(env.cfg.clone()).unwrap();
    api::router(state, &env.cfg)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn full_refresh_aggregates_and_persists() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    assert_eq!(status, StatusCode::OK);

    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 2);

    // registry order is preserved
    assert_eq!(sites[0]["name"], "Garden City, TX");
    assert_eq!(sites[1]["name"], "Nebraska Solar");

    // 10 and 20 MJ/m2/day retained; the -5 sentinel is excluded from
    // both the total and the day count
    let garden = &sites[0];
    assert!((garden["total_kwh"].as_f64().unwrap() - 1666.668).abs() < 1e-6);
    assert!((garden["avg_daily_kwh"].as_f64().unwrap() - 833.334).abs() < 1e-6);
    let annual = garden["annual_kwh_yr"].as_f64().unwrap();
    assert_eq!(annual, garden["avg_daily_kwh"].as_f64().unwrap() * 365.0);

    let score = garden["performance_score"].as_f64().unwrap();
    assert!((1.0..=10.0).contains(&score));

    let hw = &garden["hardware"];
    assert_eq!(hw["battery_brand"], "LG");
    assert!(hw["gpu_used"].as_u64().unwrap() <= hw["gpu_total"].as_u64().unwrap());

    // windy Garden City gets the wind clause from the rule-based template
    assert!(garden["recommendation"]
        .as_str()
        .unwrap()
        .contains("High wind conditions"));

    // Nebraska's single 25 MJ day wins best site
    assert_eq!(body["bestSite"]["name"], "Nebraska Solar");
    assert!(body["efficiencyScore"].as_u64().unwrap() > 0);

    // document persisted, pretty-printed
    let raw = std::fs::read_to_string(&env.cfg.cache.path).unwrap();
    assert!(raw.contains('\n'));
    assert!(raw.contains("\"bestSite\""));
}

#[tokio::test]
async fn cached_document_is_served_without_upstream_calls() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    let app = router(&env);

    let (status, first) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    assert_eq!(status, StatusCode::OK);

    // drop all upstream stubs; a cached response must not need them
    env.solar.reset().await;
    env.weather.reset().await;

    let (status, second) = get_json(&app, "/api/v1/sites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
}

#[tokio::test]
async fn absent_cache_fetches_even_without_force_flag() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sites"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn single_site_refresh_merges_into_cache() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    let app = router(&env);

    let (_, seeded) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    let nebraska_before = seeded["sites"][1]["total_kwh"].as_f64().unwrap();

    // Garden City's series improves; Nebraska's stub disappears entirely
    env.solar.reset().await;
    env.weather.reset().await;
    mount_solar(&env, "31.5", &[("20240101", 40.0)]).await;
    mount_weather(&env, "31.5", 5.0).await;

    let (status, merged) =
        get_json(&app, "/api/v1/sites?site_name=Garden%20City,%20TX").await;
    assert_eq!(status, StatusCode::OK);

    let sites = merged["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 2);

    let garden = &sites[0];
    assert!((garden["total_kwh"].as_f64().unwrap() - 2222.224).abs() < 1e-6, "record replaced");
    assert_eq!(sites[1]["total_kwh"].as_f64().unwrap(), nebraska_before);

    // 40 MJ on the only day beats Nebraska's 25; best site follows the merge
    assert_eq!(merged["bestSite"]["name"], "Garden City, TX");
}

#[tokio::test]
async fn weather_outage_degrades_to_null_weather() {
    let env = test_env().await;
    mount_solar(&env, "31.5", &[("20240101", 25.0)]).await;
    mount_solar(&env, "41.5", &[("20240101", 10.0)]).await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&env.weather)
        .await;
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    assert_eq!(status, StatusCode::OK);

    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 2);
    assert!(sites[0]["weather"].is_null());
    assert!(!sites[0]["recommendation"].as_str().unwrap().is_empty());

    // weather-less records stay eligible for best site
    assert_eq!(body["bestSite"]["name"], "Garden City, TX");
}

#[tokio::test]
async fn failed_solar_drops_site_but_not_batch() {
    let env = test_env().await;
    mount_solar(&env, "41.5", &[("20240101", 10.0)]).await;
    mount_weather(&env, "41.5", 5.0).await;
    // Garden City's solar endpoint stays unmocked -> 404 -> dropped
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    assert_eq!(status, StatusCode::OK);

    let sites = body["sites"].as_array().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["name"], "Nebraska Solar");
}

#[tokio::test]
async fn no_usable_sites_is_bad_gateway() {
    let env = test_env().await;
    // no upstream stubs at all
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites?force_refresh=true").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "UpstreamUnavailable");
}

#[tokio::test]
async fn corrupt_cache_triggers_full_refresh() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    std::fs::create_dir_all(env.cfg.cache.path.parent().unwrap()).unwrap();
    std::fs::write(&env.cfg.cache.path, "{ definitely not json").unwrap();
    let app = router(&env);

    let (status, body) = get_json(&app, "/api/v1/sites").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sites"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn recommendation_endpoint_always_answers() {
    let env = test_env().await;
    mount_happy_upstreams(&env).await;
    let app = router(&env);

    let (_, seeded) = get_json(&app, "/api/v1/sites?force_refresh=true").await;

    let request_body = json!({
        "sites": seeded["sites"],
        "excludedSites": ["Nebraska Solar"],
    });
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/sites/recommendation")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert!(!body["recommendation"].as_str().unwrap().is_empty());
    // the excluded best site may not be recommended again
    assert_eq!(body["location"]["name"], "Garden City, TX");
    assert!(body.get("photoUrl").is_none(), "no image service configured");
}

#[tokio::test]
async fn facility_search_returns_text_only() {
    let env = test_env().await;
    let app = router(&env);

    let request_body = json!({
        "sites": [],
        "searchType": "facility",
    });
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/sites/recommendation")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(!body["recommendation"].as_str().unwrap().is_empty());
    assert!(body.get("location").is_none());
}

#[tokio::test]
async fn healthz_is_ok() {
    let env = test_env().await;
    let app = router(&env);

    let (status, _) = get_json(&app, "/api/v1/healthz").await;
    assert_eq!(status, StatusCode::OK);
}
