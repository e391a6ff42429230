//! # Apex Data
//!
//! A Formula 1 statistics service over a local data lake, seeded from the
//! Jolpica (Ergast-compatible) API.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (drivers, races, results, standings)
//! - **standings**: Championship standings aggregation
//! - **storage**: Filesystem data lake operations (JSONL) and the `F1Store` handle
//! - **fetch**: Cached HTTP JSON fetching with retries
//! - **jolpica**: Jolpica API client and DTO normalization
//! - **seed**: Seeding the store from the remote source
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod fetch;
pub mod jolpica;
pub mod models;
pub mod seed;
pub mod standings;
pub mod storage;

pub use models::*;
