//! End-to-end evaluation scenarios across matcher, safety, hold and scoring

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use therapy_trainer::profile::{LimitProfile, Measurement, PoseAxis, PoseSample, ReferencePath, SeverityTier};
use therapy_trainer::proxy::ProxyController;
use therapy_trainer::replay::{replay, Recording};
use therapy_trainer::session::{EngineConfig, EvaluationSession, SafetyState, TickOutcome};
use therapy_trainer::{EvalError, SessionStatus};

const DT: f32 = 1.0 / 30.0;

/// Out-and-back rotation with checkpoints at the quarter, half and end
fn rotation_path(frames: usize) -> Arc<ReferencePath> {
    let last = (frames - 1) as f32;
    let poses = (0..frames)
        .map(|i| {
            let sweep = (i as f32 / last * std::f32::consts::PI).sin();
            PoseSample::at(i as f32 * DT).with(PoseAxis::NeckRotation, 45.0 * sweep)
        })
        .collect();
    let markers = [
        ((frames - 1) / 4, "turn"),
        ((frames - 1) / 2, "peak"),
        (frames - 1, "return"),
    ];
    Arc::new(ReferencePath::with_checkpoints("rotation", poses, &markers).unwrap())
}

fn neutral_path() -> Arc<ReferencePath> {
    Arc::new(ReferencePath::from_poses("still", vec![PoseSample::at(0.0)]))
}

fn rotation(value: f32) -> PoseSample {
    PoseSample::at(0.0).with(PoseAxis::NeckRotation, value)
}

fn started(path: Arc<ReferencePath>) -> EvaluationSession {
    let mut session = EvaluationSession::new(EngineConfig::default());
    session.start(Arc::new(LimitProfile::default()), path).unwrap();
    session
}

fn noisy_recording(path: &ReferencePath, seed: u64) -> Recording {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut recording = Recording::new("default");
    for frame in &path.frames {
        let mut sample = frame.pose;
        for axis in [PoseAxis::NeckRotation, PoseAxis::NeckFlexion, PoseAxis::WristFlexion] {
            *sample.axis_mut(axis) += rng.gen_range(-4.0..4.0);
        }
        // occasional spike well past the rotation limit
        if rng.gen_bool(0.05) {
            sample.neck_rotation = rng.gen_range(60.0..90.0);
        }
        let dt = if rng.gen_bool(0.02) { f32::NAN } else { DT };
        recording.push(dt, sample);
    }
    recording
}

#[test]
fn perfect_run_scores_full_marks() {
    let path = rotation_path(120);
    let mut session = started(path.clone());

    for frame in &path.frames {
        assert_eq!(session.tick(&frame.pose, DT).unwrap(), TickOutcome::Accepted);
    }
    let result = session.complete().unwrap();

    let score = result.score();
    assert_eq!(score.path_compliance, 40.0);
    assert_eq!(score.safety, 30.0);
    assert_eq!(score.accuracy, 20.0);
    assert_eq!(score.stability, 10.0);
    assert_eq!(score.total(), 100.0);
    assert_eq!(result.checkpoints_passed(), 3);
    assert!(result.violations().is_empty());
    assert_eq!(result.grade(), "A+");
}

#[test]
fn exact_danger_ratio_is_one_dangerous_violation() {
    let mut session = started(neutral_path());
    // default right-rotation limit 80, danger ratio 0.95
    session.tick(&rotation(76.0), DT).unwrap();

    let violations = session.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].measurement, Measurement::NeckRotationRight);
    assert_eq!(violations[0].tier, SeverityTier::Dangerous);
    assert_eq!(session.safety_state(), Some(SafetyState::Danger));
    assert_eq!(session.score().unwrap().safety, 30.0 - 15.0);

    // staying in the same tier does not penalize again
    session.tick(&rotation(76.5), DT).unwrap();
    assert_eq!(session.violations().len(), 1);
}

#[test]
fn escalation_records_each_tier_once_per_excursion() {
    let mut session = started(neutral_path());
    for value in [65.0, 69.0, 73.0, 77.0, 73.0, 10.0, 65.0] {
        session.tick(&rotation(value), DT).unwrap();
    }

    let tiers: Vec<SeverityTier> = session.violations().iter().map(|v| v.tier).collect();
    assert_eq!(
        tiers,
        vec![
            SeverityTier::Minor,
            SeverityTier::Moderate,
            SeverityTier::Severe,
            SeverityTier::Dangerous,
            SeverityTier::Minor,
        ]
    );
    // 2 + 5 + 10 + 15 + 2 exceeds the safety maximum
    assert_eq!(session.score().unwrap().safety, 0.0);
}

#[test]
fn second_start_is_rejected_without_side_effects() {
    let path = rotation_path(40);
    let mut session = started(path.clone());
    for frame in &path.frames[..12] {
        session.tick(&frame.pose, DT).unwrap();
    }
    let progress = session.path_progress();
    let score = session.score();

    let err = session.start(Arc::new(LimitProfile::default()), neutral_path()).unwrap_err();
    assert_eq!(
        err,
        EvalError::IllegalState {
            operation: "start",
            state: SessionStatus::Running
        }
    );
    assert_eq!(session.path_progress(), progress);
    assert_eq!(session.score(), score);
}

#[test]
fn operations_outside_running_are_illegal() {
    let mut session = EvaluationSession::new(EngineConfig::default());
    assert!(matches!(
        session.tick(&PoseSample::at(0.0), DT),
        Err(EvalError::IllegalState { operation: "tick", state: SessionStatus::Idle })
    ));
    assert!(matches!(
        session.complete(),
        Err(EvalError::IllegalState { operation: "complete", .. })
    ));

    session.start(Arc::new(LimitProfile::default()), neutral_path()).unwrap();
    session.complete().unwrap();
    assert!(matches!(
        session.tick(&PoseSample::at(0.0), DT),
        Err(EvalError::IllegalState { state: SessionStatus::Completed, .. })
    ));
}

#[test]
fn score_stays_consistent_on_every_tick() {
    let path = rotation_path(150);
    let recording = noisy_recording(&path, 11);
    let mut session = started(path);

    for tick in &recording.ticks {
        session.tick(&tick.sample, tick.dt).unwrap();
        let score = session.score().unwrap();
        let sum = score.path_compliance + score.safety + score.accuracy + score.stability;
        assert_eq!(score.total(), sum);
        assert!(score.path_compliance >= 0.0 && score.path_compliance <= 40.0);
        assert!(score.safety >= 0.0 && score.safety <= 30.0);
        assert!(score.accuracy >= 0.0 && score.accuracy <= 20.0);
        assert!(score.stability >= 0.0 && score.stability <= 10.0);
        assert!(score.total() <= score.max_total());
    }
}

#[test]
fn frame_index_never_decreases() {
    let path = rotation_path(150);
    let recording = noisy_recording(&path, 23);
    let mut session = started(path);

    let frames = Rc::new(RefCell::new(Vec::new()));
    let sink = frames.clone();
    session
        .events_mut()
        .path_progress
        .subscribe(move |p| sink.borrow_mut().push(p.frame));

    replay(&mut session, &recording).unwrap();
    let frames = frames.borrow();
    assert!(!frames.is_empty());
    assert!(frames.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn replay_produces_identical_results() {
    let path = rotation_path(90);
    let recording = noisy_recording(&path, 5);

    let run = || {
        let mut session = started(path.clone());
        replay(&mut session, &recording).unwrap();
        serde_json::to_string(&session.complete().unwrap()).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn observers_see_post_tick_state() {
    let path = rotation_path(60);
    let mut session = started(path.clone());
    let order = Rc::new(RefCell::new(Vec::new()));

    let sink = order.clone();
    let first = session
        .events_mut()
        .checkpoint_passed
        .subscribe(move |name| sink.borrow_mut().push(format!("a:{}", name)));
    let sink = order.clone();
    session
        .events_mut()
        .checkpoint_passed
        .subscribe(move |name| sink.borrow_mut().push(format!("b:{}", name)));

    for frame in &path.frames[..=14] {
        session.tick(&frame.pose, DT).unwrap();
    }
    assert_eq!(*order.borrow(), vec!["a:turn", "b:turn"]);

    assert!(session.events_mut().checkpoint_passed.unsubscribe(first));
    for frame in &path.frames[15..=29] {
        session.tick(&frame.pose, DT).unwrap();
    }
    assert_eq!(*order.borrow(), vec!["a:turn", "b:turn", "b:peak"]);
}

#[test]
fn proxy_converges_on_revert_target() {
    let mut session = started(neutral_path());
    let mut proxy = ProxyController::new();
    let live = rotation(74.0);

    session.tick(&live, DT).unwrap();
    let targets = session.revert_targets();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].measurement, Measurement::NeckRotationRight);
    assert!((targets[0].axis_value - 56.0).abs() < 1e-4);

    let mut shown = live;
    for _ in 0..60 {
        shown = proxy.update(&live, &targets, DT);
    }
    assert!((shown.neck_rotation - 56.0).abs() < 1e-4);

    // back under the trigger ratio: target clears and the proxy releases
    let calm = rotation(30.0);
    session.tick(&calm, DT).unwrap();
    assert!(session.revert_targets().is_empty());
    assert_eq!(proxy.update(&calm, &session.revert_targets(), DT).neck_rotation, 30.0);
}
