//! Path matching: map live samples onto the reference demonstration
//!
//! Features:
//! - Bounded forward search from the last matched frame
//! - Monotonic frame index (stalls allowed, regressions not)
//! - Checkpoint similarity scoring as the match crosses marked frames

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::profile::{LimitProfile, PoseAxis, PoseSample, ReferencePath};

/// Tuning for frame matching
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Frames searched ahead of the last match (inclusive of it)
    pub search_window: usize,
    /// Per-axis weight overrides; unlisted axes use [`default_weight`]
    pub weights: FxHashMap<PoseAxis, f32>,
    /// Distance at which checkpoint similarity reaches zero
    pub similarity_scale: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            search_window: 10,
            weights: FxHashMap::default(),
            similarity_scale: 30.0,
        }
    }
}

/// Geometric axes count fully; force and speed do not shape the path
pub fn default_weight(axis: PoseAxis) -> f32 {
    match axis {
        PoseAxis::Force | PoseAxis::Speed => 0.0,
        _ => 1.0,
    }
}

impl MatcherConfig {
    pub fn weight(&self, axis: PoseAxis) -> f32 {
        self.weights
            .get(&axis)
            .copied()
            .unwrap_or_else(|| default_weight(axis))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search_window == 0 {
            return Err(ConfigError::OutOfRange {
                field: "search_window",
                value: 0.0,
            });
        }
        if !(self.similarity_scale.is_finite() && self.similarity_scale > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "similarity_scale",
                value: self.similarity_scale,
            });
        }
        if let Some(bad) = self.weights.values().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "weights",
                value: *bad,
            });
        }
        let total: f32 = PoseAxis::ALL.iter().map(|&axis| self.weight(axis)).sum();
        if total <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "weights",
                value: total,
            });
        }
        Ok(())
    }

    /// Weighted RMS distance between two poses
    pub fn distance(&self, a: &PoseSample, b: &PoseSample) -> f32 {
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for axis in PoseAxis::ALL {
            let w = self.weight(axis);
            let d = a.axis(axis) - b.axis(axis);
            weighted += w * d * d;
            total_weight += w;
        }
        if total_weight <= 0.0 {
            return 0.0;
        }
        (weighted / total_weight).sqrt()
    }

    /// 1 - normalized distance, clamped to [0, 1]
    pub fn similarity(&self, distance: f32) -> f32 {
        (1.0 - distance / self.similarity_scale).clamp(0.0, 1.0)
    }
}

/// Outcome of one checkpoint
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckpointResult {
    pub segment_name: String,
    pub frame: usize,
    pub passed: bool,
    /// In [0, 1]; 0 when the checkpoint was never reached
    pub similarity: f32,
    /// Sample timestamp at which the match crossed this checkpoint
    pub reached_at: Option<f32>,
}

/// Result of matching one sample
#[derive(Clone, Debug, PartialEq)]
pub struct MatchUpdate {
    pub frame: usize,
    pub total_frames: usize,
    pub ratio: f32,
    /// Distance to the matched frame
    pub distance: f32,
    pub on_path: bool,
    /// False when the matched frame is unchanged since the previous sample
    pub frame_changed: bool,
    /// Checkpoints evaluated by this sample, in path order
    pub checkpoints: Vec<CheckpointResult>,
}

/// Tracks progress of a live motion against one reference path
pub struct PathMatcher {
    path: Arc<ReferencePath>,
    config: MatcherConfig,
    pass_similarity: f32,
    on_path_tolerance: f32,
    checkpoint_frames: Vec<usize>,
    next_checkpoint: usize,
    last_frame: Option<usize>,
    last_distance: Option<f32>,
    results: Vec<CheckpointResult>,
}

impl PathMatcher {
    pub fn new(path: Arc<ReferencePath>, profile: &LimitProfile, config: MatcherConfig) -> Self {
        let checkpoint_frames = path.checkpoint_indices();
        PathMatcher {
            path,
            config,
            pass_similarity: profile.checkpoint_pass_similarity,
            on_path_tolerance: profile.on_path_tolerance,
            checkpoint_frames,
            next_checkpoint: 0,
            last_frame: None,
            last_distance: None,
            results: Vec::new(),
        }
    }

    /// Match `sample` against the forward window and evaluate crossed checkpoints
    pub fn advance(&mut self, sample: &PoseSample) -> MatchUpdate {
        let total_frames = self.path.len();
        let start = self.last_frame.unwrap_or(0);
        let end = start
            .saturating_add(self.config.search_window)
            .min(total_frames.saturating_sub(1));

        let mut best_frame = start;
        let mut best_distance = f32::INFINITY;
        for index in start..=end {
            let distance = self.config.distance(sample, &self.path.frames[index].pose);
            // strict comparison keeps the earliest frame on ties
            if distance < best_distance {
                best_distance = distance;
                best_frame = index;
            }
        }

        let frame_changed = self.last_frame != Some(best_frame);
        self.last_frame = Some(best_frame);
        self.last_distance = Some(best_distance);

        let mut crossed = Vec::new();
        while let Some(&checkpoint) = self.checkpoint_frames.get(self.next_checkpoint) {
            if checkpoint > best_frame {
                break;
            }
            let reference = &self.path.frames[checkpoint].pose;
            let similarity = self.config.similarity(self.config.distance(sample, reference));
            let result = CheckpointResult {
                segment_name: self.path.segment_name(checkpoint),
                frame: checkpoint,
                passed: similarity >= self.pass_similarity,
                similarity,
                reached_at: Some(sample.timestamp),
            };
            tracing::debug!(
                segment = %result.segment_name,
                similarity = result.similarity,
                passed = result.passed,
                "checkpoint evaluated"
            );
            self.results.push(result.clone());
            crossed.push(result);
            self.next_checkpoint += 1;
        }

        MatchUpdate {
            frame: best_frame,
            total_frames,
            ratio: self.ratio(),
            distance: best_distance,
            on_path: self.on_path(),
            frame_changed,
            checkpoints: crossed,
        }
    }

    /// Current frame / (total - 1), clamped to [0, 1]. A single-frame path
    /// reads 1 once matched.
    pub fn ratio(&self) -> f32 {
        match self.last_frame {
            None => 0.0,
            Some(_) if self.path.len() <= 1 => 1.0,
            Some(frame) => (frame as f32 / (self.path.len() - 1) as f32).clamp(0.0, 1.0),
        }
    }

    /// True when the last matched distance is within tolerance
    pub fn on_path(&self) -> bool {
        self.last_distance
            .map_or(false, |distance| distance <= self.on_path_tolerance)
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.last_frame
    }

    pub fn total_frames(&self) -> usize {
        self.path.len()
    }

    pub fn total_checkpoints(&self) -> usize {
        self.checkpoint_frames.len()
    }

    pub fn checkpoints_passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    /// Evaluated checkpoints so far, in path order
    pub fn results(&self) -> &[CheckpointResult] {
        &self.results
    }

    /// One result per checkpoint; unreached checkpoints fail with similarity 0
    pub fn final_results(&self) -> Vec<CheckpointResult> {
        let mut all = self.results.clone();
        for &frame in &self.checkpoint_frames[self.results.len()..] {
            all.push(CheckpointResult {
                segment_name: self.path.segment_name(frame),
                frame,
                passed: false,
                similarity: 0.0,
                reached_at: None,
            });
        }
        all
    }

    /// Forget all progress; the next sample matches from frame 0 again
    pub fn reset(&mut self) {
        self.next_checkpoint = 0;
        self.last_frame = None;
        self.last_distance = None;
        self.results.clear();
    }
}
