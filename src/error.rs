//! Errors raised while loading configuration and save data
//!
//! The simulation step itself never fails; everything abnormal during a run
//! is a gameplay state transition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("level {id} is invalid: {reason}")]
    InvalidLevel { id: u32, reason: String },

    #[error("no level with id {0}")]
    UnknownLevel(u32),

    #[error("level table is empty")]
    EmptyLevelTable,

    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
}
