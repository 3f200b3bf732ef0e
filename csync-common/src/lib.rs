//! # ChoreoSync Common Library
//!
//! Shared code for the ChoreoSync services including:
//! - Song, analysis, tag and cut metadata models
//! - Job status and notification event types (plus the in-process EventBus)
//! - Bootstrap configuration loading
//! - Fade curve definitions and calculations
//! - Millisecond/frame timing helpers
//! - SQLite schema initialization

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod models;
pub mod timing;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
