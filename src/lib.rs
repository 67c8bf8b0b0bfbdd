//! Air-quality monitoring service.
//!
//! Turns raw measurements from a WAQI-compatible provider into a dashboard
//! report: AQI category, per-pollutant severity, dominant pollutant and
//! composition, a bounded 24-hour trend, alerts, health insights and
//! comparisons. Fetch failures degrade to cached, then synthetic, data.

pub mod alert;
pub mod analysis;
pub mod cache;
pub mod classify;
pub mod compare;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod location;
pub mod logging;
pub mod model;
pub mod reference;
pub mod store;
pub mod synthetic;
