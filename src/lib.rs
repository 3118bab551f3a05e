//! Therapy Trainer - real-time evaluation of guided rehabilitation motion
//!
//! Compares a live stream of pose samples against a reference demonstration,
//! enforces per-joint safety limits and produces a graded score.
//! Single-threaded and tick-driven: the host calls `EvaluationSession::tick`
//! once per frame.

pub mod error;
pub mod profile;
pub mod proxy;
pub mod replay;
pub mod session;

pub use error::{ConfigError, EvalError, LoadError, SessionStatus};
pub use profile::{LimitProfile, Measurement, PoseAxis, PoseSample, ReferencePath};
pub use session::{EngineConfig, EvaluationResult, EvaluationSession, TickOutcome};
