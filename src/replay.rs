//! Recorded sample streams and deterministic replay
//!
//! A recording is the exact (dt, sample) sequence a host fed to a session,
//! so feeding it again reproduces the same result.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, LoadError, SessionStatus};
use crate::profile::PoseSample;
use crate::session::{EvaluationSession, TickOutcome};

/// One host tick
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedTick {
    pub dt: f32,
    pub sample: PoseSample,
}

/// Sample stream captured for one procedure
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Profile the stream was captured under
    #[serde(default)]
    pub profile_id: String,
    pub ticks: Vec<RecordedTick>,
}

impl Recording {
    pub fn new(profile_id: impl Into<String>) -> Self {
        Recording {
            profile_id: profile_id.into(),
            ticks: Vec::new(),
        }
    }

    pub fn push(&mut self, dt: f32, sample: PoseSample) {
        self.ticks.push(RecordedTick { dt, sample });
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Sum of all recorded time steps
    pub fn duration_secs(&self) -> f32 {
        self.ticks.iter().map(|t| t.dt).sum()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Counts from one replay
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReplayStats {
    pub accepted: usize,
    pub rejected: usize,
}

/// Feed `recording` into a running session, stopping early if it leaves Running
pub fn replay(session: &mut EvaluationSession, recording: &Recording) -> Result<ReplayStats, EvalError> {
    replay_with(session, recording, |_| true)
}

/// Like [`replay`], calling `after_tick` once per tick; returning false stops the replay
pub fn replay_with(
    session: &mut EvaluationSession,
    recording: &Recording,
    mut after_tick: impl FnMut(&EvaluationSession) -> bool,
) -> Result<ReplayStats, EvalError> {
    let mut stats = ReplayStats::default();
    for tick in &recording.ticks {
        if session.status() != SessionStatus::Running {
            break;
        }
        match session.tick(&tick.sample, tick.dt)? {
            TickOutcome::Accepted => stats.accepted += 1,
            TickOutcome::Rejected(_) => stats.rejected += 1,
        }
        if !after_tick(session) {
            break;
        }
    }
    Ok(stats)
}
