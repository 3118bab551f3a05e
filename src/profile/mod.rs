//! Procedure inputs: limit profiles, reference paths and pose samples
//!
//! # Components
//! - `limits.rs`: LimitProfile, measurements, severity tiers, auto-revert
//! - `path.rs`: ReferencePath with embedded checkpoint markers
//! - `pose.rs`: PoseSample snapshots and their signed axes

pub mod limits;
pub mod path;
pub mod pose;

pub use limits::{
    AutoRevert, Deductions, Direction, JointLimits, LimitProfile, Measurement, SeverityTier,
    TierBands,
};
pub use path::{ReferenceFrame, ReferencePath};
pub use pose::{PoseAxis, PoseSample, AXIS_COUNT};
