//! Per-procedure limit profiles
//!
//! A [`LimitProfile`] bundles the motion envelope of one procedure:
//! - Joint, displacement, force and speed limits
//! - Deductions per violation tier
//! - Warning/danger threshold ratios and the tier bands derived from them
//! - Auto-revert parameters
//!
//! Profiles are plain values loaded once per procedure and never mutated.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::profile::pose::{PoseAxis, PoseSample};

/// Tolerance applied when comparing a ratio against a threshold
pub(crate) const RATIO_EPSILON: f32 = 1e-6;

/// True when `ratio` has reached `threshold`, allowing for float round-off
pub(crate) fn reaches(ratio: f32, threshold: f32) -> bool {
    ratio >= threshold - RATIO_EPSILON
}

/// Which side of a signed axis a measurement reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
    Absolute,
}

/// A named, monitored magnitude read from one pose axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    NeckFlexion,
    NeckExtension,
    NeckRotationLeft,
    NeckRotationRight,
    NeckLateralFlexionLeft,
    NeckLateralFlexionRight,
    WristFlexion,
    WristExtension,
    WristRadialDeviation,
    WristUlnarDeviation,
    WristPronation,
    WristSupination,
    HandForward,
    HandBackward,
    HandLateral,
    HandVertical,
    Force,
    Speed,
}

impl Measurement {
    pub const ALL: [Measurement; 18] = [
        Measurement::NeckFlexion,
        Measurement::NeckExtension,
        Measurement::NeckRotationLeft,
        Measurement::NeckRotationRight,
        Measurement::NeckLateralFlexionLeft,
        Measurement::NeckLateralFlexionRight,
        Measurement::WristFlexion,
        Measurement::WristExtension,
        Measurement::WristRadialDeviation,
        Measurement::WristUlnarDeviation,
        Measurement::WristPronation,
        Measurement::WristSupination,
        Measurement::HandForward,
        Measurement::HandBackward,
        Measurement::HandLateral,
        Measurement::HandVertical,
        Measurement::Force,
        Measurement::Speed,
    ];

    /// Axis and side this measurement reads
    pub fn source(self) -> (PoseAxis, Direction) {
        use Direction::*;
        use Measurement as M;
        match self {
            M::NeckFlexion => (PoseAxis::NeckFlexion, Positive),
            M::NeckExtension => (PoseAxis::NeckFlexion, Negative),
            M::NeckRotationLeft => (PoseAxis::NeckRotation, Negative),
            M::NeckRotationRight => (PoseAxis::NeckRotation, Positive),
            M::NeckLateralFlexionLeft => (PoseAxis::NeckLateralFlexion, Negative),
            M::NeckLateralFlexionRight => (PoseAxis::NeckLateralFlexion, Positive),
            M::WristFlexion => (PoseAxis::WristFlexion, Positive),
            M::WristExtension => (PoseAxis::WristFlexion, Negative),
            M::WristRadialDeviation => (PoseAxis::WristDeviation, Negative),
            M::WristUlnarDeviation => (PoseAxis::WristDeviation, Positive),
            M::WristPronation => (PoseAxis::WristRotation, Positive),
            M::WristSupination => (PoseAxis::WristRotation, Negative),
            M::HandForward => (PoseAxis::HandForward, Positive),
            M::HandBackward => (PoseAxis::HandForward, Negative),
            M::HandLateral => (PoseAxis::HandLateral, Absolute),
            M::HandVertical => (PoseAxis::HandVertical, Absolute),
            M::Force => (PoseAxis::Force, Absolute),
            M::Speed => (PoseAxis::Speed, Absolute),
        }
    }

    /// Non-negative magnitude of this measurement in `sample`
    pub fn read(self, sample: &PoseSample) -> f32 {
        let (axis, direction) = self.source();
        let value = sample.axis(axis);
        match direction {
            Direction::Positive => value.max(0.0),
            Direction::Negative => (-value).max(0.0),
            Direction::Absolute => value.abs(),
        }
    }

    /// Axis value that corresponds to `magnitude` on this measurement's side.
    /// Absolute measurements keep the sign of `current`.
    pub fn signed(self, magnitude: f32, current: f32) -> f32 {
        match self.source().1 {
            Direction::Positive => magnitude,
            Direction::Negative => -magnitude,
            Direction::Absolute => magnitude.copysign(current),
        }
    }

    pub fn label(self) -> &'static str {
        use Measurement as M;
        match self {
            M::NeckFlexion => "neck flexion",
            M::NeckExtension => "neck extension",
            M::NeckRotationLeft => "neck rotation (left)",
            M::NeckRotationRight => "neck rotation (right)",
            M::NeckLateralFlexionLeft => "neck lateral flexion (left)",
            M::NeckLateralFlexionRight => "neck lateral flexion (right)",
            M::WristFlexion => "wrist flexion",
            M::WristExtension => "wrist extension",
            M::WristRadialDeviation => "wrist radial deviation",
            M::WristUlnarDeviation => "wrist ulnar deviation",
            M::WristPronation => "wrist pronation",
            M::WristSupination => "wrist supination",
            M::HandForward => "hand forward displacement",
            M::HandBackward => "hand backward displacement",
            M::HandLateral => "hand lateral displacement",
            M::HandVertical => "hand vertical displacement",
            M::Force => "applied force",
            M::Speed => "hand speed",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Violation severity, ordered from least to most severe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityTier {
    Minor,
    Moderate,
    Severe,
    Dangerous,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 4] = [
        SeverityTier::Minor,
        SeverityTier::Moderate,
        SeverityTier::Severe,
        SeverityTier::Dangerous,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeverityTier::Minor => "Minor",
            SeverityTier::Moderate => "Moderate",
            SeverityTier::Severe => "Severe",
            SeverityTier::Dangerous => "Dangerous",
        };
        f.write_str(name)
    }
}

/// Angular limits in degrees, displacement in centimetres.
/// A limit of 0 (or an absent cap) leaves the measurement unmonitored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointLimits {
    pub neck_flexion: f32,
    pub neck_extension: f32,
    pub neck_rotation_left: f32,
    pub neck_rotation_right: f32,
    pub neck_lateral_flexion_left: f32,
    pub neck_lateral_flexion_right: f32,
    pub wrist_flexion: f32,
    pub wrist_extension: f32,
    pub wrist_radial_deviation: f32,
    pub wrist_ulnar_deviation: f32,
    pub wrist_pronation: f32,
    pub wrist_supination: f32,
    pub hand_forward: f32,
    pub hand_backward: f32,
    pub hand_lateral: f32,
    pub hand_vertical: f32,
    /// Newtons
    pub max_force: Option<f32>,
    /// cm/s
    pub max_speed: Option<f32>,
}

impl Default for JointLimits {
    fn default() -> Self {
        JointLimits {
            neck_flexion: 50.0,
            neck_extension: 60.0,
            neck_rotation_left: 80.0,
            neck_rotation_right: 80.0,
            neck_lateral_flexion_left: 45.0,
            neck_lateral_flexion_right: 45.0,
            wrist_flexion: 80.0,
            wrist_extension: 70.0,
            wrist_radial_deviation: 20.0,
            wrist_ulnar_deviation: 30.0,
            wrist_pronation: 80.0,
            wrist_supination: 80.0,
            hand_forward: 30.0,
            hand_backward: 15.0,
            hand_lateral: 20.0,
            hand_vertical: 20.0,
            max_force: Some(150.0),
            max_speed: Some(50.0),
        }
    }
}

impl JointLimits {
    /// Raw configured value (absent caps read as 0)
    pub fn value(&self, measurement: Measurement) -> f32 {
        use Measurement as M;
        match measurement {
            M::NeckFlexion => self.neck_flexion,
            M::NeckExtension => self.neck_extension,
            M::NeckRotationLeft => self.neck_rotation_left,
            M::NeckRotationRight => self.neck_rotation_right,
            M::NeckLateralFlexionLeft => self.neck_lateral_flexion_left,
            M::NeckLateralFlexionRight => self.neck_lateral_flexion_right,
            M::WristFlexion => self.wrist_flexion,
            M::WristExtension => self.wrist_extension,
            M::WristRadialDeviation => self.wrist_radial_deviation,
            M::WristUlnarDeviation => self.wrist_ulnar_deviation,
            M::WristPronation => self.wrist_pronation,
            M::WristSupination => self.wrist_supination,
            M::HandForward => self.hand_forward,
            M::HandBackward => self.hand_backward,
            M::HandLateral => self.hand_lateral,
            M::HandVertical => self.hand_vertical,
            M::Force => self.max_force.unwrap_or(0.0),
            M::Speed => self.max_speed.unwrap_or(0.0),
        }
    }

    /// Limit for a monitored measurement, `None` when unmonitored
    pub fn get(&self, measurement: Measurement) -> Option<f32> {
        let value = self.value(measurement);
        if value > 0.0 {
            Some(value)
        } else {
            None
        }
    }
}

/// Score deducted per violation tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deductions {
    pub minor: f32,
    pub moderate: f32,
    pub severe: f32,
    pub dangerous: f32,
}

impl Default for Deductions {
    fn default() -> Self {
        Deductions {
            minor: 2.0,
            moderate: 5.0,
            severe: 10.0,
            dangerous: 15.0,
        }
    }
}

impl Deductions {
    pub fn for_tier(&self, tier: SeverityTier) -> f32 {
        match tier {
            SeverityTier::Minor => self.minor,
            SeverityTier::Moderate => self.moderate,
            SeverityTier::Severe => self.severe,
            SeverityTier::Dangerous => self.dangerous,
        }
    }

    fn is_valid(&self) -> bool {
        let values = [self.minor, self.moderate, self.severe, self.dangerous];
        values.iter().all(|v| v.is_finite() && *v >= 0.0)
            && values.windows(2).all(|pair| pair[0] < pair[1])
    }
}

/// Corrective target parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoRevert {
    pub enabled: bool,
    /// Ratio at or above which a revert target is exposed
    pub trigger_ratio: f32,
    /// Target expressed as a ratio of the limit
    pub target_ratio: f32,
    /// Units per second the proxy moves toward the target
    pub lerp_speed: f32,
}

impl Default for AutoRevert {
    fn default() -> Self {
        AutoRevert {
            enabled: true,
            trigger_ratio: 0.9,
            target_ratio: 0.7,
            lerp_speed: 30.0,
        }
    }
}

/// Ratio thresholds for the four severity tiers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierBands {
    thresholds: [f32; 4],
}

impl TierBands {
    /// Minor at `warning`, Dangerous at `danger`, Moderate and Severe evenly between
    pub fn evenly_spaced(warning: f32, danger: f32) -> Self {
        let step = (danger - warning) / 3.0;
        TierBands {
            thresholds: [warning, warning + step, warning + 2.0 * step, danger],
        }
    }

    pub fn from_ratios(thresholds: [f32; 4]) -> Self {
        TierBands { thresholds }
    }

    pub fn threshold(&self, tier: SeverityTier) -> f32 {
        self.thresholds[tier.index()]
    }

    /// Highest tier whose threshold `ratio` reaches; Minor below the first band
    pub fn classify(&self, ratio: f32) -> SeverityTier {
        SeverityTier::ALL
            .into_iter()
            .rev()
            .find(|&tier| reaches(ratio, self.threshold(tier)))
            .unwrap_or(SeverityTier::Minor)
    }
}

fn default_on_path_tolerance() -> f32 {
    10.0
}

fn default_pass_similarity() -> f32 {
    0.8
}

fn default_hold_duration() -> f32 {
    3.0
}

/// Immutable motion envelope for one procedure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LimitProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub limits: JointLimits,
    #[serde(default)]
    pub deductions: Deductions,
    pub warning_ratio: f32,
    pub danger_ratio: f32,
    /// Explicit Minor/Moderate/Severe/Dangerous ratios; derived when absent
    #[serde(default)]
    pub tier_ratios: Option<[f32; 4]>,
    #[serde(default)]
    pub auto_revert: AutoRevert,
    /// Weighted distance under which a tick counts as on-path
    #[serde(default = "default_on_path_tolerance")]
    pub on_path_tolerance: f32,
    /// Minimum checkpoint similarity to pass
    #[serde(default = "default_pass_similarity")]
    pub checkpoint_pass_similarity: f32,
    /// Seconds a qualifying pose must be held
    #[serde(default = "default_hold_duration")]
    pub hold_duration_secs: f32,
}

impl Default for LimitProfile {
    fn default() -> Self {
        LimitProfile {
            id: "default".to_string(),
            name: "Default procedure".to_string(),
            description: String::new(),
            limits: JointLimits::default(),
            deductions: Deductions::default(),
            warning_ratio: 0.8,
            danger_ratio: 0.95,
            tier_ratios: None,
            auto_revert: AutoRevert::default(),
            on_path_tolerance: default_on_path_tolerance(),
            checkpoint_pass_similarity: default_pass_similarity(),
            hold_duration_secs: default_hold_duration(),
        }
    }
}

impl LimitProfile {
    /// Check every invariant; profiles are only usable after this passes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingProfileId);
        }

        for measurement in Measurement::ALL {
            let value = self.limits.value(measurement);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidLimit { measurement, value });
            }
        }

        if !self.deductions.is_valid() {
            return Err(ConfigError::DeductionsNotIncreasing);
        }

        let (warning, danger) = (self.warning_ratio, self.danger_ratio);
        if !(warning.is_finite() && danger.is_finite() && warning > 0.0 && warning <= danger && danger <= 1.0)
        {
            return Err(ConfigError::ThresholdRatios { warning, danger });
        }

        if let Some(ratios) = self.tier_ratios {
            let ordered = ratios.windows(2).all(|pair| pair[0] < pair[1]);
            if !ordered || ratios.iter().any(|r| !r.is_finite() || *r <= 0.0) {
                return Err(ConfigError::TierRatios { ratios });
            }
        }

        let revert = &self.auto_revert;
        let revert_ok = revert.target_ratio.is_finite()
            && revert.trigger_ratio.is_finite()
            && revert.lerp_speed.is_finite()
            && revert.target_ratio > 0.0
            && revert.target_ratio < revert.trigger_ratio
            && revert.lerp_speed > 0.0;
        if !revert_ok {
            return Err(ConfigError::AutoRevert {
                trigger: revert.trigger_ratio,
                target: revert.target_ratio,
                speed: revert.lerp_speed,
            });
        }

        if !(self.on_path_tolerance.is_finite() && self.on_path_tolerance >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "on_path_tolerance",
                value: self.on_path_tolerance,
            });
        }
        if !(0.0..=1.0).contains(&self.checkpoint_pass_similarity) {
            return Err(ConfigError::OutOfRange {
                field: "checkpoint_pass_similarity",
                value: self.checkpoint_pass_similarity,
            });
        }
        if !(self.hold_duration_secs.is_finite() && self.hold_duration_secs > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "hold_duration_secs",
                value: self.hold_duration_secs,
            });
        }

        Ok(())
    }

    /// Severity bands in effect for this profile
    pub fn tier_bands(&self) -> TierBands {
        match self.tier_ratios {
            Some(ratios) => TierBands::from_ratios(ratios),
            None => TierBands::evenly_spaced(self.warning_ratio, self.danger_ratio),
        }
    }

    /// Monitored measurements with their limits, in `Measurement::ALL` order
    pub fn monitored(&self) -> Vec<(Measurement, f32)> {
        Measurement::ALL
            .into_iter()
            .filter_map(|m| self.limits.get(m).map(|limit| (m, limit)))
            .collect()
    }

    /// Load and validate a profile from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        let profile: LimitProfile = serde_json::from_str(&content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Save as pretty-printed JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
