//! Pose samples: one tracked snapshot per tick
//!
//! Axes are signed:
//! - Neck: flexion (+) / extension (-), rotation right (+) / left (-),
//!   lateral flexion right (+) / left (-)
//! - Wrist: flexion (+) / extension (-), ulnar (+) / radial (-) deviation,
//!   pronation (+) / supination (-)
//! - Hand displacement from the start pose, in centimetres
//! - Applied force (N) and hand speed (cm/s)

use serde::{Deserialize, Serialize};

/// Number of scalar axes carried by a [`PoseSample`]
pub const AXIS_COUNT: usize = 11;

/// One tracked scalar axis of a pose
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseAxis {
    NeckFlexion,
    NeckRotation,
    NeckLateralFlexion,
    WristFlexion,
    WristDeviation,
    WristRotation,
    HandForward,
    HandLateral,
    HandVertical,
    Force,
    Speed,
}

impl PoseAxis {
    pub const ALL: [PoseAxis; AXIS_COUNT] = [
        PoseAxis::NeckFlexion,
        PoseAxis::NeckRotation,
        PoseAxis::NeckLateralFlexion,
        PoseAxis::WristFlexion,
        PoseAxis::WristDeviation,
        PoseAxis::WristRotation,
        PoseAxis::HandForward,
        PoseAxis::HandLateral,
        PoseAxis::HandVertical,
        PoseAxis::Force,
        PoseAxis::Speed,
    ];

    /// Position of this axis in [`PoseAxis::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Field name as it appears in serialized samples
    pub fn name(self) -> &'static str {
        match self {
            PoseAxis::NeckFlexion => "neck_flexion",
            PoseAxis::NeckRotation => "neck_rotation",
            PoseAxis::NeckLateralFlexion => "neck_lateral_flexion",
            PoseAxis::WristFlexion => "wrist_flexion",
            PoseAxis::WristDeviation => "wrist_deviation",
            PoseAxis::WristRotation => "wrist_rotation",
            PoseAxis::HandForward => "hand_forward",
            PoseAxis::HandLateral => "hand_lateral",
            PoseAxis::HandVertical => "hand_vertical",
            PoseAxis::Force => "force",
            PoseAxis::Speed => "speed",
        }
    }
}

/// Snapshot of every tracked measurement at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSample {
    /// Session-relative timestamp in seconds
    pub timestamp: f32,
    pub neck_flexion: f32,
    pub neck_rotation: f32,
    pub neck_lateral_flexion: f32,
    pub wrist_flexion: f32,
    pub wrist_deviation: f32,
    pub wrist_rotation: f32,
    pub hand_forward: f32,
    pub hand_lateral: f32,
    pub hand_vertical: f32,
    pub force: f32,
    pub speed: f32,
}

impl PoseSample {
    /// Neutral pose at the given time
    pub fn at(timestamp: f32) -> Self {
        PoseSample {
            timestamp,
            ..Default::default()
        }
    }

    /// Read a single axis
    pub fn axis(&self, axis: PoseAxis) -> f32 {
        match axis {
            PoseAxis::NeckFlexion => self.neck_flexion,
            PoseAxis::NeckRotation => self.neck_rotation,
            PoseAxis::NeckLateralFlexion => self.neck_lateral_flexion,
            PoseAxis::WristFlexion => self.wrist_flexion,
            PoseAxis::WristDeviation => self.wrist_deviation,
            PoseAxis::WristRotation => self.wrist_rotation,
            PoseAxis::HandForward => self.hand_forward,
            PoseAxis::HandLateral => self.hand_lateral,
            PoseAxis::HandVertical => self.hand_vertical,
            PoseAxis::Force => self.force,
            PoseAxis::Speed => self.speed,
        }
    }

    /// Mutable access to a single axis
    pub fn axis_mut(&mut self, axis: PoseAxis) -> &mut f32 {
        match axis {
            PoseAxis::NeckFlexion => &mut self.neck_flexion,
            PoseAxis::NeckRotation => &mut self.neck_rotation,
            PoseAxis::NeckLateralFlexion => &mut self.neck_lateral_flexion,
            PoseAxis::WristFlexion => &mut self.wrist_flexion,
            PoseAxis::WristDeviation => &mut self.wrist_deviation,
            PoseAxis::WristRotation => &mut self.wrist_rotation,
            PoseAxis::HandForward => &mut self.hand_forward,
            PoseAxis::HandLateral => &mut self.hand_lateral,
            PoseAxis::HandVertical => &mut self.hand_vertical,
            PoseAxis::Force => &mut self.force,
            PoseAxis::Speed => &mut self.speed,
        }
    }

    /// Builder-style axis override
    pub fn with(mut self, axis: PoseAxis, value: f32) -> Self {
        *self.axis_mut(axis) = value;
        self
    }

    /// All axes in [`PoseAxis::ALL`] order
    pub fn axes(&self) -> [f32; AXIS_COUNT] {
        PoseAxis::ALL.map(|axis| self.axis(axis))
    }

    /// First axis holding a NaN or infinite value, if any
    pub fn first_non_finite(&self) -> Option<PoseAxis> {
        PoseAxis::ALL
            .into_iter()
            .find(|&axis| !self.axis(axis).is_finite())
    }

    /// True when the timestamp and every axis are finite
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.first_non_finite().is_none()
    }
}
