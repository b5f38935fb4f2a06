use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use time::macros::date;

use caltracker::app::build_app;
use caltracker::barcode::{BarcodeLookup, ScannedFood};
use caltracker::clock::FixedClock;
use caltracker::config::{AppConfig, StoreBackend};
use caltracker::error::AppError;
use caltracker::state::AppState;
use caltracker::storage::MemoryRowStore;

struct CannedBarcodes;

#[async_trait]
impl BarcodeLookup for CannedBarcodes {
    async fn lookup(&self, code: &str) -> Result<Option<ScannedFood>, AppError> {
        match code {
            "3017620422003" => Ok(Some(ScannedFood {
                barcode: code.into(),
                name: "Hazelnut spread".into(),
                category: "other".into(),
                calories: 539,
                proteins: 6.3,
            })),
            "00000000" => Err(AppError::Upstream("connection reset".into())),
            _ => Ok(None),
        }
    }
}

struct TestServer {
    base_url: String,
    store: Arc<MemoryRowStore>,
    _static_dir: tempfile::TempDir,
}

async fn start() -> TestServer {
    let static_dir = tempfile::tempdir().unwrap();
    fs::write(static_dir.path().join("index.html"), "<h1>caltracker</h1>").unwrap();

    let config = AppConfig {
        store: StoreBackend::Memory,
        static_dir: static_dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let store = Arc::new(MemoryRowStore::with_goals(2000, 100));
    let state = AppState::from_parts(
        Arc::new(config),
        store.clone(),
        Arc::new(FixedClock(date!(2026 - 10 - 19))),
        Arc::new(CannedBarcodes),
        None,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}/api/v1"),
        store,
        _static_dir: static_dir,
    }
}

async fn create_food(client: &Client, base: &str, name: &str, calories: i64, proteins: f64) -> String {
    let res = client
        .post(format!("{base}/foods"))
        .json(&json!({"name": name, "category": "meat", "calories": calories, "proteins": proteins}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let food: Value = res.json().await.unwrap();
    food["id"].as_str().unwrap().to_string()
}

async fn summary(client: &Client, base: &str) -> Value {
    client
        .get(format!("{base}/summary"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_ok() {
    let server = start().await;
    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn planning_lifecycle_keeps_summary_in_step() {
    let server = start().await;
    let base = &server.base_url;
    let client = Client::new();
    let chicken = create_food(&client, base, "Chicken breast", 200, 10.0).await;

    let res = client
        .post(format!("{base}/planning"))
        .json(&json!({"food_id": chicken, "meal_type": "noon", "quantity": 150}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let entry: Value = res.json().await.unwrap();
    assert_eq!(entry["date"], "2026-10-19");
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let s = summary(&client, base).await;
    assert_eq!(s["calories_consumed"], 300);
    assert_eq!(s["proteins_consumed"], 15.0);
    assert_eq!(s["calories_remaining"], 1700);
    assert_eq!(s["calories_tone"], "success");
    assert_eq!(s["proteins_tone"], "warning");

    let res = client
        .patch(format!("{base}/planning/{entry_id}"))
        .json(&json!({"quantity": 50}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let s = summary(&client, base).await;
    assert_eq!(s["calories_consumed"], 100);
    assert_eq!(s["proteins_consumed"], 5.0);

    let plan: Value = client
        .get(format!("{base}/planning/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(plan["slots"][1]["meal_type"], "noon");
    assert_eq!(plan["slots"][1]["items"][0]["food_name"], "Chicken breast");
    assert_eq!(plan["total"]["calories"], 100);

    let res = client
        .delete(format!("{base}/planning/{entry_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let s = summary(&client, base).await;
    assert_eq!(s["calories_consumed"], 0);

    let res = client
        .delete(format!("{base}/planning/{entry_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_quantity_and_meal_type_are_rejected() {
    let server = start().await;
    let base = &server.base_url;
    let client = Client::new();
    let chicken = create_food(&client, base, "Chicken", 200, 10.0).await;

    let res = client
        .post(format!("{base}/planning"))
        .json(&json!({"food_id": chicken, "meal_type": "noon", "quantity": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{base}/planning"))
        .json(&json!({"food_id": chicken, "meal_type": "brunch", "quantity": 10}))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}

#[tokio::test]
async fn goals_default_when_fields_missing() {
    let server = start().await;
    let base = &server.base_url;
    let client = Client::new();

    let res = client
        .put(format!("{base}/goals"))
        .json(&json!({"calories_goal": 2500}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let s: Value = res.json().await.unwrap();
    assert_eq!(s["calories_goal"], 2500);
    assert_eq!(s["proteins_goal"], 150);
}

#[tokio::test]
async fn adjust_recompute_and_preview() {
    let server = start().await;
    let base = &server.base_url;
    let client = Client::new();
    let beef = create_food(&client, base, "Beef", 250, 26.0).await;

    client
        .post(format!("{base}/planning"))
        .json(&json!({"food_id": beef, "meal_type": "evening", "quantity": 200}))
        .send()
        .await
        .unwrap();

    let consumed: Value = client
        .post(format!("{base}/consumed/adjust"))
        .json(&json!({"calories": -1000}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(consumed["calories"], 0);
    assert_eq!(consumed["proteins"], 52.0);

    let resum: Value = client
        .post(format!("{base}/planning/recompute"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resum["calories"], 500);

    let preview: Value = client
        .get(format!("{base}/planning/preview?food_id={beef}&quantity=100"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preview["contribution"]["calories"], 250);
    assert_eq!(preview["calories_remaining"], 1750);
}

#[tokio::test]
async fn foods_crud_and_filters() {
    let server = start().await;
    let base = &server.base_url;
    let client = Client::new();
    let id = create_food(&client, base, "Turkey", 135, 29.0).await;
    create_food(&client, base, "Pork", 242, 27.0).await;

    let found: Vec<Value> = client
        .get(format!("{base}/foods?q=tur&category=meat"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Turkey");

    let res = client
        .put(format!("{base}/foods/{id}"))
        .json(&json!({"name": "Turkey", "category": "meat", "calories": 20000, "proteins": 29.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.delete(format!("{base}/foods/{id}")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = client.get(format!("{base}/foods/{id}")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn barcode_lookup_maps_outcomes_to_statuses() {
    let server = start().await;
    let base = &server.base_url;

    let res = reqwest::get(format!("{base}/barcode/3017620422003")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let food: Value = res.json().await.unwrap();
    assert_eq!(food["calories"], 539);

    let res = reqwest::get(format!("{base}/barcode/12345678")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = reqwest::get(format!("{base}/barcode/00000000")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn store_outage_is_503() {
    let server = start().await;
    server.store.set_available(false);
    let res = reqwest::get(format!("{}/summary", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_paths_fall_back_to_static_files() {
    let server = start().await;
    let root = server.base_url.trim_end_matches("/api/v1");
    let res = reqwest::get(format!("{root}/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "<h1>caltracker</h1>");
}
