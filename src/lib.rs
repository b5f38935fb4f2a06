pub mod app;
pub mod assets;
pub mod barcode;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod foods;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
