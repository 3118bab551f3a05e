//! Safety monitoring: envelope checks, tiered deductions, auto-revert targets
//!
//! Every monitored measurement runs its own state machine keyed by
//! `measured / limit`:
//! - Normal below the warning ratio
//! - Warning from the warning ratio up to the danger ratio
//! - Danger at or above the danger ratio
//!
//! A (measurement, tier) pair is penalized at most once per excursion; an
//! excursion ends when the measurement returns to Normal.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::profile::limits::reaches;
use crate::profile::{LimitProfile, Measurement, PoseAxis, PoseSample, SeverityTier, TierBands};

/// Per-measurement envelope state
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SafetyState {
    Normal,
    Warning,
    Danger,
}

/// One recorded envelope violation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SafetyViolation {
    pub timestamp: f32,
    pub measurement: Measurement,
    pub measured: f32,
    pub limit: f32,
    pub tier: SeverityTier,
    pub message: String,
}

/// Corrective target for an external motion controller
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RevertTarget {
    pub measurement: Measurement,
    /// Magnitude on the measurement's side: limit × target ratio
    pub target: f32,
    /// Same target expressed as a signed value on the pose axis
    pub axis: PoseAxis,
    pub axis_value: f32,
    /// Units per second
    pub lerp_speed: f32,
}

#[derive(Clone, Debug)]
struct Channel {
    limit: f32,
    state: SafetyState,
    ratio: f32,
    penalized: [bool; 4],
    revert: Option<RevertTarget>,
}

impl Channel {
    fn new(limit: f32) -> Self {
        Channel {
            limit,
            state: SafetyState::Normal,
            ratio: 0.0,
            penalized: [false; 4],
            revert: None,
        }
    }
}

/// Read-only view of one channel for presentation
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub measurement: Measurement,
    pub limit: f32,
    pub ratio: f32,
    pub state: SafetyState,
}

/// Evaluates live poses against one profile
pub struct SafetyMonitor {
    profile: Arc<LimitProfile>,
    bands: TierBands,
    order: Vec<Measurement>,
    channels: FxHashMap<Measurement, Channel>,
    violations: Vec<SafetyViolation>,
    total_deductions: f32,
}

impl SafetyMonitor {
    pub fn new(profile: Arc<LimitProfile>) -> Self {
        let monitored = profile.monitored();
        let order = monitored.iter().map(|(m, _)| *m).collect();
        let channels = monitored
            .into_iter()
            .map(|(m, limit)| (m, Channel::new(limit)))
            .collect();
        SafetyMonitor {
            bands: profile.tier_bands(),
            profile,
            order,
            channels,
            violations: Vec::new(),
            total_deductions: 0.0,
        }
    }

    /// Check every monitored measurement. Returns violations recorded by this sample.
    pub fn evaluate(&mut self, sample: &PoseSample) -> Vec<SafetyViolation> {
        let profile = &self.profile;
        let revert = &profile.auto_revert;
        let mut recorded = Vec::new();

        for measurement in &self.order {
            let Some(channel) = self.channels.get_mut(measurement) else {
                continue;
            };
            let measured = measurement.read(sample);
            let ratio = measured / channel.limit;

            channel.ratio = ratio;
            channel.state = if reaches(ratio, profile.danger_ratio) {
                SafetyState::Danger
            } else if reaches(ratio, profile.warning_ratio) {
                SafetyState::Warning
            } else {
                SafetyState::Normal
            };

            if channel.state == SafetyState::Normal {
                channel.penalized = [false; 4];
            } else {
                let tier = self.bands.classify(ratio);
                if !channel.penalized[tier.index()] {
                    channel.penalized[tier.index()] = true;
                    let violation = SafetyViolation {
                        timestamp: sample.timestamp,
                        measurement: *measurement,
                        measured,
                        limit: channel.limit,
                        tier,
                        message: format!(
                            "{}: {} at {:.1} ({:.0}% of {:.1} limit)",
                            tier,
                            measurement,
                            measured,
                            ratio * 100.0,
                            channel.limit
                        ),
                    };
                    self.total_deductions += profile.deductions.for_tier(tier);
                    tracing::debug!(
                        measurement = %measurement,
                        tier = %tier,
                        ratio,
                        "safety violation"
                    );
                    recorded.push(violation);
                }
            }

            channel.revert = if revert.enabled && reaches(ratio, revert.trigger_ratio) {
                let (axis, _) = measurement.source();
                let target = channel.limit * revert.target_ratio;
                Some(RevertTarget {
                    measurement: *measurement,
                    target,
                    axis,
                    axis_value: measurement.signed(target, sample.axis(axis)),
                    lerp_speed: revert.lerp_speed,
                })
            } else {
                None
            };
        }

        self.violations.extend(recorded.iter().cloned());
        recorded
    }

    /// Worst state across all monitored measurements
    pub fn state(&self) -> SafetyState {
        self.channels
            .values()
            .map(|c| c.state)
            .max()
            .unwrap_or(SafetyState::Normal)
    }

    pub fn state_of(&self, measurement: Measurement) -> Option<SafetyState> {
        self.channels.get(&measurement).map(|c| c.state)
    }

    /// Channel snapshots in measurement order
    pub fn channels(&self) -> Vec<ChannelStatus> {
        self.order
            .iter()
            .filter_map(|m| {
                self.channels.get(m).map(|c| ChannelStatus {
                    measurement: *m,
                    limit: c.limit,
                    ratio: c.ratio,
                    state: c.state,
                })
            })
            .collect()
    }

    /// Active revert targets in measurement order
    pub fn revert_targets(&self) -> Vec<RevertTarget> {
        self.order
            .iter()
            .filter_map(|m| self.channels.get(m).and_then(|c| c.revert))
            .collect()
    }

    pub fn revert_target(&self, measurement: Measurement) -> Option<RevertTarget> {
        self.channels.get(&measurement).and_then(|c| c.revert)
    }

    pub fn violations(&self) -> &[SafetyViolation] {
        &self.violations
    }

    pub fn total_deductions(&self) -> f32 {
        self.total_deductions
    }

    /// Category score: `max - deductions`, never below 0
    pub fn score(&self, max_score: f32) -> f32 {
        (max_score - self.total_deductions).max(0.0)
    }

    pub fn reset(&mut self) {
        for channel in self.channels.values_mut() {
            *channel = Channel::new(channel.limit);
        }
        self.violations.clear();
        self.total_deductions = 0.0;
    }
}
