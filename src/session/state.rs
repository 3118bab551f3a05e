//! Evaluation session state machine
//!
//! Lifecycle: Idle -> Running -> Completed | Aborted. A finished session can
//! be started again with a new profile and path.
//!
//! Each tick runs PathMatcher -> SafetyMonitor -> HoldTracker ->
//! ScoreAggregator and only then notifies subscribers, so observers always
//! see a complete post-tick snapshot.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, EvalError, LoadError, SessionStatus};
use crate::profile::{LimitProfile, PoseAxis, PoseSample, ReferencePath};
use crate::session::events::{HoldProgress, PathProgress, SessionEvent, SessionEvents};
use crate::session::hold::HoldTracker;
use crate::session::matcher::{CheckpointResult, MatcherConfig, PathMatcher};
use crate::session::safety::{ChannelStatus, RevertTarget, SafetyMonitor, SafetyState, SafetyViolation};
use crate::session::score::{GradeTable, ScoreAggregator, ScoreBreakdown, ScoringConfig};

/// Engine-wide tuning shared by every procedure
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matcher.validate()?;
        self.scoring.validate()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

/// Why a tick's sample was skipped
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleRejection {
    NonFiniteAxis(PoseAxis),
    NonFiniteTimestamp,
    /// Negative or non-finite time step; nothing advances
    InvalidDt(f32),
}

/// Result of a tick that was valid to call
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    Accepted,
    Rejected(SampleRejection),
}

/// Per-segment row for presentation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub segment_name: String,
    pub duration_secs: Option<f32>,
    pub similarity: Option<f32>,
}

/// Render an optional value; absent or non-positive values render empty, never "0"
pub fn format_optional(value: Option<f32>, precision: usize) -> String {
    match value {
        Some(v) if v > 0.0 => format!("{:.*}", precision, v),
        _ => String::new(),
    }
}

/// Final snapshot of a completed session
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationResult {
    procedure_id: String,
    score: ScoreBreakdown,
    grades: GradeTable,
    violations: Vec<SafetyViolation>,
    checkpoints: Vec<CheckpointResult>,
    duration_secs: f32,
    completed_holds: u32,
    ticks_evaluated: u64,
    ticks_on_path: u64,
}

impl EvaluationResult {
    pub fn procedure_id(&self) -> &str {
        &self.procedure_id
    }

    pub fn score(&self) -> &ScoreBreakdown {
        &self.score
    }

    pub fn grade(&self) -> &str {
        self.score.grade(&self.grades)
    }

    pub fn violations(&self) -> &[SafetyViolation] {
        &self.violations
    }

    pub fn checkpoints(&self) -> &[CheckpointResult] {
        &self.checkpoints
    }

    pub fn checkpoints_passed(&self) -> usize {
        self.checkpoints.iter().filter(|c| c.passed).count()
    }

    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    pub fn completed_holds(&self) -> u32 {
        self.completed_holds
    }

    /// Accepted ticks and how many of them were on the path
    pub fn path_ticks(&self) -> (u64, u64) {
        (self.ticks_on_path, self.ticks_evaluated)
    }

    /// Time between consecutive checkpoint crossings (the first measured from
    /// timestamp 0) and the similarity reached at each
    pub fn phases(&self) -> Vec<PhaseSummary> {
        let mut previous = Some(0.0);
        self.checkpoints
            .iter()
            .map(|checkpoint| {
                let duration = match (previous, checkpoint.reached_at) {
                    (Some(start), Some(end)) => Some(end - start),
                    _ => None,
                };
                previous = checkpoint.reached_at;
                PhaseSummary {
                    segment_name: checkpoint.segment_name.clone(),
                    duration_secs: duration,
                    similarity: checkpoint.reached_at.map(|_| checkpoint.similarity),
                }
            })
            .collect()
    }
}

/// Working state of one run
struct Run {
    profile: Arc<LimitProfile>,
    path: Arc<ReferencePath>,
    matcher: PathMatcher,
    safety: SafetyMonitor,
    hold: HoldTracker,
    score: ScoreAggregator,
    breakdown: ScoreBreakdown,
    hold_predicate: bool,
    elapsed: f32,
}

impl Run {
    fn new(config: &EngineConfig, profile: Arc<LimitProfile>, path: Arc<ReferencePath>) -> Self {
        let matcher = PathMatcher::new(path.clone(), &profile, config.matcher.clone());
        let safety = SafetyMonitor::new(profile.clone());
        let hold = HoldTracker::new(profile.hold_duration_secs);
        let score = ScoreAggregator::new(config.scoring.clone());
        let breakdown = score.compute(&matcher, &safety, &hold);
        Run {
            profile,
            path,
            matcher,
            safety,
            hold,
            score,
            breakdown,
            hold_predicate: false,
            elapsed: 0.0,
        }
    }

    fn update_hold(&mut self, dt: f32, pending: &mut Vec<SessionEvent>) {
        let update = self.hold.update(self.hold_predicate, dt);
        if update.changed {
            pending.push(SessionEvent::HoldProgress(update.progress));
        }
        if update.just_completed {
            pending.push(SessionEvent::HoldCompleted);
        }
        if self.hold.is_completed() && !self.hold_predicate {
            self.hold.rearm();
            pending.push(SessionEvent::HoldProgress(self.hold.progress()));
        }
    }
}

fn illegal(operation: &'static str, state: SessionStatus) -> EvalError {
    EvalError::IllegalState { operation, state }
}

/// Orchestrates one procedure run at a time
pub struct EvaluationSession {
    config: EngineConfig,
    status: SessionStatus,
    run: Option<Run>,
    events: SessionEvents,
}

impl EvaluationSession {
    pub fn new(config: EngineConfig) -> Self {
        EvaluationSession {
            config,
            status: SessionStatus::Idle,
            run: None,
            events: SessionEvents::default(),
        }
    }

    /// Validate inputs and begin a run. Fails without side effects.
    pub fn start(
        &mut self,
        profile: Arc<LimitProfile>,
        path: Arc<ReferencePath>,
    ) -> Result<(), EvalError> {
        if self.status == SessionStatus::Running {
            return Err(illegal("start", self.status));
        }
        self.config.validate()?;
        profile.validate()?;
        path.validate()?;

        info!(
            procedure = %profile.id,
            frames = path.len(),
            checkpoints = path.checkpoint_indices().len(),
            "evaluation session started"
        );
        self.run = Some(Run::new(&self.config, profile, path));
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// Advance the run by one sample and `dt` seconds
    pub fn tick(&mut self, sample: &PoseSample, dt: f32) -> Result<TickOutcome, EvalError> {
        let run = match (self.status, self.run.as_mut()) {
            (SessionStatus::Running, Some(run)) => run,
            _ => return Err(illegal("tick", self.status)),
        };

        if !dt.is_finite() || dt < 0.0 {
            debug!(dt, "tick rejected: invalid time step");
            return Ok(TickOutcome::Rejected(SampleRejection::InvalidDt(dt)));
        }

        let mut pending = Vec::new();
        run.elapsed += dt;

        let rejection = if let Some(axis) = sample.first_non_finite() {
            Some(SampleRejection::NonFiniteAxis(axis))
        } else if !sample.timestamp.is_finite() {
            Some(SampleRejection::NonFiniteTimestamp)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(?reason, "pose sample rejected");
        } else {
            let matched = run.matcher.advance(sample);
            if matched.frame_changed {
                pending.push(SessionEvent::PathProgress(PathProgress {
                    frame: matched.frame,
                    total_frames: matched.total_frames,
                    ratio: matched.ratio,
                }));
            }
            for checkpoint in matched.checkpoints.iter().filter(|c| c.passed) {
                pending.push(SessionEvent::CheckpointPassed(checkpoint.segment_name.clone()));
            }

            for violation in run.safety.evaluate(sample) {
                pending.push(SessionEvent::SafetyWarning(violation.message));
            }

            run.score.record_tick(matched.on_path);
            run.hold_predicate = matched.on_path && run.safety.state() != SafetyState::Danger;
        }

        run.update_hold(dt, &mut pending);
        run.breakdown = run.score.compute(&run.matcher, &run.safety, &run.hold);

        for event in &pending {
            self.events.dispatch(event);
        }

        Ok(match rejection {
            Some(reason) => TickOutcome::Rejected(reason),
            None => TickOutcome::Accepted,
        })
    }

    /// Finish the run and produce its result
    pub fn complete(&mut self) -> Result<EvaluationResult, EvalError> {
        if self.status != SessionStatus::Running {
            return Err(illegal("complete", self.status));
        }
        let Some(run) = self.run.take() else {
            return Err(illegal("complete", self.status));
        };

        let result = EvaluationResult {
            procedure_id: run.profile.id.clone(),
            score: run.breakdown,
            grades: self.config.scoring.grades.clone(),
            violations: run.safety.violations().to_vec(),
            checkpoints: run.matcher.final_results(),
            duration_secs: run.elapsed,
            completed_holds: run.hold.completed_holds(),
            ticks_evaluated: run.score.ticks_evaluated(),
            ticks_on_path: run.score.ticks_on_path(),
        };
        self.status = SessionStatus::Completed;

        info!(
            procedure = %result.procedure_id,
            total = result.score.total(),
            grade = result.grade(),
            violations = result.violations.len(),
            "evaluation session completed"
        );
        Ok(result)
    }

    /// Stop the run without producing a result
    pub fn abort(&mut self) -> Result<(), EvalError> {
        if self.status != SessionStatus::Running {
            return Err(illegal("abort", self.status));
        }
        if let Some(run) = self.run.take() {
            info!(procedure = %run.profile.id, elapsed = run.elapsed, "evaluation session aborted");
        }
        self.status = SessionStatus::Aborted;
        Ok(())
    }

    /// Reset all progress of the running procedure, keeping its inputs
    pub fn restart(&mut self) -> Result<(), EvalError> {
        let run = match (self.status, self.run.as_mut()) {
            (SessionStatus::Running, Some(run)) => run,
            _ => return Err(illegal("restart", self.status)),
        };
        *run = Run::new(&self.config, run.profile.clone(), run.path.clone());
        debug!("evaluation session restarted");
        Ok(())
    }

    fn running(&self) -> Option<&Run> {
        match self.status {
            SessionStatus::Running => self.run.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscriber lists; callbacks receive read-only events
    pub fn events_mut(&mut self) -> &mut SessionEvents {
        &mut self.events
    }

    pub fn profile(&self) -> Option<&LimitProfile> {
        self.running().map(|run| run.profile.as_ref())
    }

    /// Live score while running
    pub fn score(&self) -> Option<ScoreBreakdown> {
        self.running().map(|run| run.breakdown)
    }

    /// Live grade while running
    pub fn grade(&self) -> Option<&str> {
        self.running()
            .map(|run| run.breakdown.grade(&self.config.scoring.grades))
    }

    pub fn path_progress(&self) -> Option<PathProgress> {
        self.running().and_then(|run| {
            run.matcher.current_frame().map(|frame| PathProgress {
                frame,
                total_frames: run.matcher.total_frames(),
                ratio: run.matcher.ratio(),
            })
        })
    }

    pub fn hold_progress(&self) -> Option<HoldProgress> {
        self.running().map(|run| run.hold.progress())
    }

    pub fn safety_state(&self) -> Option<SafetyState> {
        self.running().map(|run| run.safety.state())
    }

    pub fn channels(&self) -> Vec<ChannelStatus> {
        self.running()
            .map(|run| run.safety.channels())
            .unwrap_or_default()
    }

    /// Auto-revert targets for the motion-control collaborator
    pub fn revert_targets(&self) -> Vec<RevertTarget> {
        self.running()
            .map(|run| run.safety.revert_targets())
            .unwrap_or_default()
    }

    pub fn violations(&self) -> &[SafetyViolation] {
        self.running()
            .map(|run| run.safety.violations())
            .unwrap_or(&[])
    }

    pub fn checkpoints(&self) -> &[CheckpointResult] {
        self.running()
            .map(|run| run.matcher.results())
            .unwrap_or(&[])
    }

    /// On-path and accepted tick counts of the current run
    pub fn path_ticks(&self) -> Option<(u64, u64)> {
        self.running()
            .map(|run| (run.score.ticks_on_path(), run.score.ticks_evaluated()))
    }

    pub fn on_path(&self) -> bool {
        self.running().map_or(false, |run| run.matcher.on_path())
    }

    /// Seconds accumulated over all ticks of the current run
    pub fn elapsed(&self) -> f32 {
        self.running().map_or(0.0, |run| run.elapsed)
    }
}

impl Default for EvaluationSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn line(frames: usize, markers: &[(usize, &str)]) -> Arc<ReferencePath> {
        let poses = (0..frames)
            .map(|i| PoseSample::at(i as f32 * 0.1).with(PoseAxis::NeckFlexion, i as f32 * 0.25))
            .collect();
        Arc::new(ReferencePath::with_checkpoints("line", poses, markers).unwrap())
    }

    fn frame_sample(path: &ReferencePath, index: usize) -> PoseSample {
        path.frames[index].pose
    }

    fn running() -> (EvaluationSession, Arc<ReferencePath>) {
        let mut session = EvaluationSession::default();
        let path = line(20, &[(10, "mid"), (19, "end")]);
        session
            .start(Arc::new(LimitProfile::default()), path.clone())
            .unwrap();
        (session, path)
    }

    #[test]
    fn test_engine_config_json_file() {
        let dir = tempfile::tempdir().unwrap();

        let tuned = dir.path().join("tuned.json");
        std::fs::write(
            &tuned,
            r#"{"matcher": {"search_window": 4, "weights": {"force": 0.5, "neck_rotation": 2.0}},
                "scoring": {"target_hold_secs": 6.0}}"#,
        )
        .unwrap();
        let config = EngineConfig::from_json_file(&tuned).unwrap();
        assert_eq!(config.matcher.search_window, 4);
        assert_eq!(config.matcher.weight(PoseAxis::Force), 0.5);
        assert_eq!(config.matcher.weight(PoseAxis::NeckRotation), 2.0);
        assert_eq!(config.matcher.weight(PoseAxis::WristFlexion), 1.0);
        assert_eq!(config.matcher.similarity_scale, 30.0);
        assert_eq!(config.scoring.target_hold_secs, 6.0);
        assert_eq!(config.scoring.grades, GradeTable::default());

        let zero_window = dir.path().join("zero_window.json");
        std::fs::write(&zero_window, r#"{"matcher": {"search_window": 0}}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&zero_window),
            Err(LoadError::Invalid(ConfigError::OutOfRange { field: "search_window", .. }))
        ));

        let unsorted = dir.path().join("unsorted.json");
        std::fs::write(
            &unsorted,
            r#"{"scoring": {"grades": {"cutoffs": [{"grade": "B", "min_percentage": 80.0},
                {"grade": "A", "min_percentage": 90.0}], "fallback": "F"}}}"#,
        )
        .unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&unsorted),
            Err(LoadError::Invalid(ConfigError::GradeTable(_)))
        ));

        let unknown_axis = dir.path().join("unknown_axis.json");
        std::fs::write(&unknown_axis, r#"{"matcher": {"weights": {"elbow": 1.0}}}"#).unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&unknown_axis),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn test_unbounded_search_window_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engine.json");
        std::fs::write(&file, r#"{"matcher": {"search_window": 18446744073709551615}}"#).unwrap();
        let config = EngineConfig::from_json_file(&file).unwrap();
        assert_eq!(config.matcher.search_window, usize::MAX);

        let mut session = EvaluationSession::new(config);
        let path = line(20, &[]);
        session
            .start(Arc::new(LimitProfile::default()), path.clone())
            .unwrap();
        for index in [0, 1, 2, 3, 4, 5, 19] {
            let outcome = session.tick(&frame_sample(&path, index), 0.1).unwrap();
            assert_eq!(outcome, TickOutcome::Accepted);
            assert_eq!(session.path_progress().unwrap().frame, index);
        }
    }

    #[test]
    fn test_safety_warning_per_new_violation() {
        let (mut session, path) = running();
        let warnings = Rc::new(RefCell::new(Vec::new()));
        let sink = warnings.clone();
        session
            .events_mut()
            .safety_warning
            .subscribe(move |message: &String| sink.borrow_mut().push(message.clone()));

        let base = frame_sample(&path, 0);
        // right rotation limit 80: Minor, Minor again, Moderate, back to Normal, Minor
        for rotation in [65.0, 66.0, 69.0, 10.0, 65.0] {
            session
                .tick(&base.with(PoseAxis::NeckRotation, rotation), 0.1)
                .unwrap();
        }
        // two measurements crossing in one tick warn independently
        let both = base
            .with(PoseAxis::NeckRotation, 10.0)
            .with(PoseAxis::WristFlexion, 77.0)
            .with(PoseAxis::Force, 144.0);
        session.tick(&both, 0.1).unwrap();

        let warnings = warnings.borrow();
        let messages: Vec<String> = session
            .violations()
            .iter()
            .map(|v| v.message.clone())
            .collect();
        assert_eq!(*warnings, messages);
        assert_eq!(warnings.len(), 5);
        assert!(warnings[0].starts_with("Minor"));
        assert!(warnings[1].starts_with("Moderate"));
        assert!(warnings[2].starts_with("Minor"));
        assert!(warnings[3..].iter().all(|w| w.starts_with("Dangerous")));
    }

    #[test]
    fn test_path_ticks_count_accepted_samples() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 0), 0.1).unwrap();
        let off = frame_sample(&path, 1).with(PoseAxis::WristFlexion, 60.0);
        session.tick(&off, 0.1).unwrap();
        let bad = frame_sample(&path, 2).with(PoseAxis::Speed, f32::INFINITY);
        session.tick(&bad, 0.1).unwrap();
        assert_eq!(session.path_ticks(), Some((1, 2)));

        let result = session.complete().unwrap();
        assert_eq!(result.path_ticks(), (1, 2));
        assert_eq!(result.score().path_compliance, 20.0);
    }

    #[test]
    fn test_tick_requires_running() {
        let mut session = EvaluationSession::default();
        let err = session.tick(&PoseSample::at(0.0), 0.1).unwrap_err();
        assert_eq!(
            err,
            EvalError::IllegalState {
                operation: "tick",
                state: SessionStatus::Idle
            }
        );
        assert!(session.complete().is_err());
        assert!(session.abort().is_err());
    }

    #[test]
    fn test_start_rejects_invalid_inputs() {
        let mut session = EvaluationSession::default();
        let empty = Arc::new(ReferencePath::from_poses("empty", vec![]));
        let err = session
            .start(Arc::new(LimitProfile::default()), empty)
            .unwrap_err();
        assert_eq!(err, EvalError::Configuration(ConfigError::EmptyPath));
        assert_eq!(session.status(), SessionStatus::Idle);

        let mut profile = LimitProfile::default();
        profile.danger_ratio = 2.0;
        assert!(matches!(
            session.start(Arc::new(profile), line(5, &[])),
            Err(EvalError::Configuration(ConfigError::ThresholdRatios { .. }))
        ));
    }

    #[test]
    fn test_double_start_leaves_run_untouched() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 3), 0.1).unwrap();
        let before = session.path_progress();

        let err = session
            .start(Arc::new(LimitProfile::default()), line(5, &[]))
            .unwrap_err();
        assert!(matches!(err, EvalError::IllegalState { operation: "start", .. }));
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.path_progress(), before);
        assert_eq!(session.path_progress().unwrap().total_frames, 20);
    }

    #[test]
    fn test_rejected_sample_is_atomic_skip() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 2), 0.1).unwrap();
        let score = session.score();
        let progress = session.path_progress();

        let bad = frame_sample(&path, 8).with(PoseAxis::WristFlexion, f32::NAN);
        let outcome = session.tick(&bad, 0.1).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Rejected(SampleRejection::NonFiniteAxis(PoseAxis::WristFlexion))
        );
        assert_eq!(session.path_progress(), progress);
        assert_eq!(session.score(), score);
        assert!((session.elapsed() - 0.2).abs() < 1e-6);
        // hold keeps timing on the previous predicate
        assert!((session.hold_progress().unwrap().current - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_dt_advances_nothing() {
        let (mut session, path) = running();
        let outcome = session.tick(&frame_sample(&path, 1), -1.0).unwrap();
        assert!(matches!(
            outcome,
            TickOutcome::Rejected(SampleRejection::InvalidDt(_))
        ));
        assert_eq!(session.elapsed(), 0.0);
        assert_eq!(session.path_progress(), None);
    }

    #[test]
    fn test_events_fire_after_tick_in_order() {
        let (mut session, path) = running();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        session
            .events_mut()
            .path_progress
            .subscribe(move |p| sink.borrow_mut().push(format!("path {}", p.frame)));
        let sink = log.clone();
        session
            .events_mut()
            .checkpoint_passed
            .subscribe(move |name| sink.borrow_mut().push(format!("checkpoint {}", name)));
        let sink = log.clone();
        session
            .events_mut()
            .hold_progress
            .subscribe(move |h| sink.borrow_mut().push(format!("hold {:.1}", h.current)));

        for index in [0, 0, 5, 10] {
            session.tick(&frame_sample(&path, index), 0.5).unwrap();
        }

        assert_eq!(
            *log.borrow(),
            vec![
                "path 0",
                "hold 0.5",
                "hold 1.0",
                "path 5",
                "hold 1.5",
                "path 10",
                "checkpoint mid",
                "hold 2.0",
            ]
        );
    }

    #[test]
    fn test_hold_completion_and_rearm() {
        let (mut session, path) = running();
        let completions = Rc::new(RefCell::new(0));
        let sink = completions.clone();
        session
            .events_mut()
            .hold_completed
            .subscribe(move |_| *sink.borrow_mut() += 1);

        for _ in 0..4 {
            session.tick(&frame_sample(&path, 0), 1.0).unwrap();
        }
        assert_eq!(*completions.borrow(), 1);
        assert_eq!(session.hold_progress().unwrap().current, 3.0);

        // leaving the path re-arms the hold
        let off = frame_sample(&path, 0).with(PoseAxis::WristFlexion, 60.0);
        session.tick(&off, 1.0).unwrap();
        assert_eq!(session.hold_progress().unwrap().current, 0.0);
        assert_eq!(session.score().unwrap().stability, 10.0);
    }

    #[test]
    fn test_danger_breaks_hold() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 0), 1.0).unwrap();
        // force is not part of the path distance but is capped at 150 N
        let pressing = frame_sample(&path, 0).with(PoseAxis::Force, 150.0);
        session.tick(&pressing, 1.0).unwrap();
        assert!(session.on_path());
        assert_eq!(session.safety_state(), Some(SafetyState::Danger));
        assert_eq!(session.hold_progress().unwrap().current, 0.0);
        assert_eq!(session.violations().len(), 1);
    }

    #[test]
    fn test_complete_produces_result_once() {
        let (mut session, path) = running();
        for index in 0..20 {
            session.tick(&frame_sample(&path, index), 0.1).unwrap();
        }
        let result = session.complete().unwrap();
        assert_eq!(result.procedure_id(), "default");
        assert_eq!(result.checkpoints_passed(), 2);
        assert!((result.duration_secs() - 2.0).abs() < 1e-5);
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.score(), None);
        assert!(session.complete().is_err());

        // a finished session can run again
        session
            .start(Arc::new(LimitProfile::default()), path)
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Running);
    }

    #[test]
    fn test_abort_discards_run() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 1), 0.1).unwrap();
        session.abort().unwrap();
        assert_eq!(session.status(), SessionStatus::Aborted);
        assert!(matches!(
            session.tick(&frame_sample(&path, 2), 0.1),
            Err(EvalError::IllegalState { state: SessionStatus::Aborted, .. })
        ));
        assert!(session.complete().is_err());
    }

    #[test]
    fn test_restart_resets_progress() {
        let (mut session, path) = running();
        session.tick(&frame_sample(&path, 9), 0.1).unwrap();
        session.restart().unwrap();
        assert_eq!(session.path_progress(), None);
        session.tick(&frame_sample(&path, 0), 0.1).unwrap();
        assert_eq!(session.path_progress().unwrap().frame, 0);
    }

    #[test]
    fn test_phases_and_optional_formatting() {
        let (mut session, path) = running();
        for index in 0..=10 {
            session.tick(&frame_sample(&path, index), 0.1).unwrap();
        }
        let result = session.complete().unwrap();
        let phases = result.phases();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].segment_name, "mid");
        assert!((phases[0].duration_secs.unwrap() - 1.0).abs() < 1e-5);
        assert_eq!(phases[0].similarity, Some(1.0));
        assert_eq!(phases[1].duration_secs, None);
        assert_eq!(phases[1].similarity, None);

        assert_eq!(format_optional(phases[1].similarity, 2), "");
        assert_eq!(format_optional(Some(0.0), 2), "");
        assert_eq!(format_optional(Some(-1.0), 1), "");
        assert_eq!(format_optional(Some(0.456), 2), "0.46");
    }
}
