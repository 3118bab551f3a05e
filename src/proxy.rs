//! Motion-control collaborator: drives a virtual proxy pose toward
//! auto-revert targets
//!
//! The engine only publishes targets. This controller is the reference
//! consumer: each engaged measurement moves its proxy axis value toward the
//! target at the profile's lerp speed, and a measurement whose target clears
//! snaps back to the live value.

use rustc_hash::FxHashMap;

use crate::profile::{Measurement, PoseSample};
use crate::session::RevertTarget;

/// Step `current` toward `target` by at most `max_delta`, never overshooting
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

/// Proxy state for every engaged measurement
#[derive(Clone, Debug, Default)]
pub struct ProxyController {
    engaged: FxHashMap<Measurement, f32>,
}

impl ProxyController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every proxy by `dt` and return the pose a renderer should show
    pub fn update(&mut self, live: &PoseSample, targets: &[RevertTarget], dt: f32) -> PoseSample {
        let released: Vec<Measurement> = self
            .engaged
            .keys()
            .copied()
            .filter(|m| !targets.iter().any(|t| t.measurement == *m))
            .collect();
        for measurement in released {
            self.engaged.remove(&measurement);
            tracing::debug!(measurement = %measurement, "proxy released");
        }

        let mut pose = *live;
        for target in targets {
            let proxy = self.engaged.entry(target.measurement).or_insert_with(|| {
                tracing::debug!(measurement = %target.measurement, "proxy engaged");
                live.axis(target.axis)
            });
            *proxy = move_towards(*proxy, target.axis_value, target.lerp_speed * dt);
            *pose.axis_mut(target.axis) = *proxy;
        }
        pose
    }

    pub fn is_engaged(&self, measurement: Measurement) -> bool {
        self.engaged.contains_key(&measurement)
    }

    pub fn proxy_value(&self, measurement: Measurement) -> Option<f32> {
        self.engaged.get(&measurement).copied()
    }

    pub fn engaged_count(&self) -> usize {
        self.engaged.len()
    }

    pub fn release_all(&mut self) {
        self.engaged.clear();
    }
}
