//! Session Evaluation: path matching, safety monitoring, hold tracking, scoring
//!
//! # Components
//! - `state.rs`: EvaluationSession lifecycle and per-tick orchestration
//! - `matcher.rs`: PathMatcher mapping live samples onto the reference path
//! - `safety.rs`: SafetyMonitor with tiered violations and auto-revert targets
//! - `hold.rs`: HoldTracker for time-integrated dwell
//! - `score.rs`: ScoreAggregator and grade mapping
//! - `events.rs`: Observer lists for session notifications

pub mod events;
pub mod hold;
pub mod matcher;
pub mod safety;
pub mod score;
pub mod state;

pub use events::{HoldProgress, Observers, PathProgress, SessionEvent, SessionEvents, SubscriptionId};
pub use hold::{HoldTracker, HoldUpdate};
pub use matcher::{CheckpointResult, MatchUpdate, MatcherConfig, PathMatcher};
pub use safety::{ChannelStatus, RevertTarget, SafetyMonitor, SafetyState, SafetyViolation};
pub use score::{CategoryMaxima, GradeCutoff, GradeTable, ScoreAggregator, ScoreBreakdown, ScoringConfig};
pub use state::{
    format_optional, EngineConfig, EvaluationResult, EvaluationSession, PhaseSummary,
    SampleRejection, TickOutcome,
};
