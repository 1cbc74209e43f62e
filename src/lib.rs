//! Cross-channel fraud risk scoring for fiat and crypto payments.
//!
//! A transaction's fiat side is scored by a fitted anomaly model, its
//! crypto side by taint rules over externally supplied chain analytics;
//! the two channel risks are fused deterministically into one 0-100 score
//! with human-readable alerts.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod scoring;
pub mod types;
pub mod watchlist;
