use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::AppError;
use crate::ledger::nutrition::round2;

const UA: &str = concat!("caltracker/", env!("CARGO_PKG_VERSION"));

pub const UNKNOWN_PRODUCT: &str = "Unknown product";

/// Food fields prefilled from a scanned product. Nothing is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedFood {
    pub barcode: String,
    pub name: String,
    pub category: String,
    pub calories: i64,
    pub proteins: f64,
}

pub fn is_valid_barcode(code: &str) -> bool {
    lazy_static! {
        static ref BARCODE_RE: Regex = Regex::new(r"^\d{8,14}$").unwrap();
    }
    BARCODE_RE.is_match(code)
}

#[async_trait]
pub trait BarcodeLookup: Send + Sync {
    /// `Ok(None)` when the product database has no entry for `code`.
    async fn lookup(&self, code: &str) -> Result<Option<ScannedFood>, AppError>;
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    product_name: Option<String>,
    categories_tags: Option<Vec<String>>,
    nutriments: Option<serde_json::Map<String, Value>>,
}

const CATEGORY_MAP: [(&str, &str); 6] = [
    ("fruits", "fruit"),
    ("vegetables", "vegetable"),
    ("meat", "meat"),
    ("cereals", "cereal"),
    ("dairy", "dairy"),
    ("beverages", "beverage"),
];

/// First tag containing a known keyword decides; tags are checked in order.
pub fn map_category(tags: &[String]) -> &'static str {
    for tag in tags {
        let tag = tag.to_lowercase();
        for (needle, category) in CATEGORY_MAP {
            if tag.contains(needle) {
                return category;
            }
        }
    }
    "other"
}

// Open Food Facts sends numbers, sometimes as strings.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First present, non-zero value among `keys`.
fn first_nonzero(nutriments: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|k| nutriments.get(*k).and_then(number))
        .find(|v| *v != 0.0 && v.is_finite())
}

pub fn extract_calories(nutriments: &serde_json::Map<String, Value>) -> i64 {
    first_nonzero(nutriments, &["energy-kcal_100g", "energy_100g", "calories_100g"])
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}

pub fn extract_proteins(nutriments: &serde_json::Map<String, Value>) -> f64 {
    first_nonzero(nutriments, &["proteins_100g", "protein_100g"])
        .map(round2)
        .unwrap_or(0.0)
}

/// Turns an Open Food Facts product document into prefilled food fields.
pub fn parse_product(code: &str, body: &str) -> Result<Option<ScannedFood>, AppError> {
    let resp: ProductResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Upstream(format!("malformed product document: {e}")))?;
    let product = match (resp.status, resp.product) {
        (1, Some(p)) => p,
        _ => return Ok(None),
    };

    let name = product
        .product_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
    let category = map_category(product.categories_tags.as_deref().unwrap_or_default());
    let nutriments = product.nutriments.unwrap_or_default();

    Ok(Some(ScannedFood {
        barcode: code.to_string(),
        name,
        category: category.to_string(),
        calories: extract_calories(&nutriments),
        proteins: extract_proteins(&nutriments),
    }))
}

/// Client for the public Open Food Facts product API.
pub struct OpenFoodFacts {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFacts {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(UA)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BarcodeLookup for OpenFoodFacts {
    async fn lookup(&self, code: &str) -> Result<Option<ScannedFood>, AppError> {
        if !is_valid_barcode(code) {
            return Err(AppError::invalid(format!(
                "barcode must be 8 to 14 digits, got '{code}'"
            )));
        }

        let url = format!("{}/api/v0/product/{code}.json", self.base_url);
        debug!(%url, "product lookup");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let found = parse_product(code, &body)?;
        info!(barcode = code, found = found.is_some(), "product lookup done");
        Ok(found)
    }
}

#[cfg(test)]
mod barcode_tests {
    use super::*;
    use serde_json::json;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn nutriments(v: Value) -> serde_json::Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn barcode_format() {
        assert!(is_valid_barcode("12345678"));
        assert!(is_valid_barcode("3017620422003"));
        assert!(is_valid_barcode("12345678901234"));
        assert!(!is_valid_barcode("1234567"));
        assert!(!is_valid_barcode("123456789012345"));
        assert!(!is_valid_barcode("30176204220a3"));
        assert!(!is_valid_barcode(""));
    }

    #[test]
    fn category_uses_first_matching_tag() {
        assert_eq!(map_category(&tags(&["en:plant-based", "en:fruits"])), "fruit");
        assert_eq!(map_category(&tags(&["en:Dairy-Desserts", "en:fruits"])), "dairy");
        assert_eq!(map_category(&tags(&["en:meats"])), "meat");
        assert_eq!(map_category(&tags(&["en:snacks"])), "other");
        assert_eq!(map_category(&[]), "other");
    }

    #[test]
    fn calories_skip_zero_and_missing_keys() {
        let n = nutriments(json!({"energy-kcal_100g": 0, "energy_100g": 2252.4}));
        assert_eq!(extract_calories(&n), 2252);

        let n = nutriments(json!({"calories_100g": "88.6"}));
        assert_eq!(extract_calories(&n), 89);

        assert_eq!(extract_calories(&nutriments(json!({}))), 0);
    }

    #[test]
    fn proteins_round_to_two_decimals() {
        let n = nutriments(json!({"proteins_100g": 6.346}));
        assert_eq!(extract_proteins(&n), 6.35);

        let n = nutriments(json!({"protein_100g": 3}));
        assert_eq!(extract_proteins(&n), 3.0);
    }

    #[test]
    fn parse_found_product() {
        let body = json!({
            "status": 1,
            "product": {
                "product_name": "Skyr nature",
                "categories_tags": ["en:dairies", "en:fermented-foods"],
                "nutriments": {"energy-kcal_100g": 63, "proteins_100g": 11}
            }
        })
        .to_string();

        let food = parse_product("3033490004743", &body).unwrap().unwrap();
        assert_eq!(food.name, "Skyr nature");
        assert_eq!(food.category, "other");
        assert_eq!(food.calories, 63);
        assert_eq!(food.proteins, 11.0);
        assert_eq!(food.barcode, "3033490004743");
    }

    #[test]
    fn parse_defaults_missing_fields() {
        let body = json!({"status": 1, "product": {"product_name": ""}}).to_string();
        let food = parse_product("12345678", &body).unwrap().unwrap();
        assert_eq!(food.name, UNKNOWN_PRODUCT);
        assert_eq!(food.category, "other");
        assert_eq!(food.calories, 0);
        assert_eq!(food.proteins, 0.0);
    }

    #[test]
    fn parse_missing_product_is_none() {
        let body = json!({"status": 0, "status_verbose": "product not found"}).to_string();
        assert_eq!(parse_product("12345678", &body).unwrap(), None);
    }

    #[test]
    fn parse_garbage_is_upstream_error() {
        assert!(matches!(
            parse_product("12345678", "<html>"),
            Err(AppError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn lookup_rejects_bad_code_before_calling_out() {
        let off = OpenFoodFacts::new("http://127.0.0.1:9", 1).unwrap();
        assert!(matches!(
            off.lookup("abc").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn lookup_transport_failure_is_upstream_error() {
        let off = OpenFoodFacts::new("http://127.0.0.1:9", 1).unwrap();
        assert!(matches!(
            off.lookup("12345678").await,
            Err(AppError::Upstream(_))
        ));
    }
}
