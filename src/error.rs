//! Error taxonomy for the evaluation engine
//!
//! - `ConfigError`: invalid profile, path or engine configuration (fatal to a run)
//! - `EvalError`: what session operations return
//! - `LoadError`: JSON loading of profiles, paths, recordings and configs
//!
//! Rejected pose samples are not errors; see `session::TickOutcome`.

use std::fmt;

use thiserror::Error;

use crate::profile::Measurement;

/// Validation failure of a configuration input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("reference path has no frames")]
    EmptyPath,

    #[error("reference frame {index} has a non-finite {field}")]
    NonFiniteFrame { index: usize, field: &'static str },

    #[error("checkpoint at frame {index} is out of order or out of range")]
    CheckpointOrder { index: usize },

    #[error("profile id must not be empty")]
    MissingProfileId,

    #[error("limit for {measurement} must be finite and >= 0, got {value}")]
    InvalidLimit { measurement: Measurement, value: f32 },

    #[error("deductions must be >= 0 and strictly increasing (minor < moderate < severe < dangerous)")]
    DeductionsNotIncreasing,

    #[error("threshold ratios must satisfy 0 < warning ({warning}) <= danger ({danger}) <= 1")]
    ThresholdRatios { warning: f32, danger: f32 },

    #[error("tier ratios must be positive and strictly increasing, got {ratios:?}")]
    TierRatios { ratios: [f32; 4] },

    #[error("auto-revert needs 0 < target ({target}) < trigger ({trigger}) and lerp speed > 0 ({speed})")]
    AutoRevert { trigger: f32, target: f32, speed: f32 },

    #[error("{field} must be finite and within range, got {value}")]
    OutOfRange { field: &'static str, value: f32 },

    #[error("grade table: {0}")]
    GradeTable(String),
}

/// Lifecycle state of an evaluation session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Errors surfaced synchronously by session operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("cannot {operation} while session is {state}")]
    IllegalState {
        operation: &'static str,
        state: SessionStatus,
    },
}

/// Errors from reading or writing JSON inputs
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}
