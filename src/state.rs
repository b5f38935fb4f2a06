use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::barcode::{BarcodeLookup, OpenFoodFacts};
use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, StoreBackend};
use crate::db::{self, PgRowStore};
use crate::foods::FoodCatalog;
use crate::ledger::NutritionLedger;
use crate::storage::{MemoryRowStore, RowStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<NutritionLedger>,
    pub foods: Arc<FoodCatalog>,
    pub barcode: Arc<dyn BarcodeLookup>,
    /// Set when running on Postgres, for migrations.
    pub db: Option<PgPool>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let (store, db) = match config.store {
            StoreBackend::Postgres => {
                let pool = db::connect(&config).await?;
                let store = Arc::new(PgRowStore::new(pool.clone())) as Arc<dyn RowStore>;
                (store, Some(pool))
            }
            StoreBackend::Memory => {
                info!("using in-memory store, data is lost on restart");
                (Arc::new(MemoryRowStore::new()) as Arc<dyn RowStore>, None)
            }
        };

        let barcode = Arc::new(OpenFoodFacts::new(
            &config.off_base_url,
            config.off_timeout_secs,
        )?) as Arc<dyn BarcodeLookup>;

        Ok(Self::from_parts(config, store, Arc::new(SystemClock), barcode, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn RowStore>,
        clock: Arc<dyn Clock>,
        barcode: Arc<dyn BarcodeLookup>,
        db: Option<PgPool>,
    ) -> Self {
        Self {
            config,
            ledger: Arc::new(NutritionLedger::new(store.clone(), clock)),
            foods: Arc::new(FoodCatalog::new(store)),
            barcode,
            db,
        }
    }
}
