//! Therapy Trainer - replay a recorded motion against a procedure
//!
//! Loads a limit profile, a reference path and a recorded sample stream,
//! runs them through an evaluation session and prints the graded result.

mod cli;

use clap::Parser;
use cli::display::Display;
use cli::input::{Command, InputHandler};
use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use therapy_trainer::profile::{LimitProfile, ReferencePath};
use therapy_trainer::proxy::ProxyController;
use therapy_trainer::replay::{replay, Recording};
use therapy_trainer::session::{EngineConfig, EvaluationSession, TickOutcome};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "therapy-trainer")]
#[command(about = "Evaluate a recorded rehabilitation motion against a reference procedure")]
struct Args {
    /// Limit profile JSON
    #[arg(short, long)]
    profile: PathBuf,

    /// Reference path JSON
    #[arg(long)]
    path: PathBuf,

    /// Recorded sample stream JSON
    #[arg(short, long)]
    recording: PathBuf,

    /// Engine configuration JSON (defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Redraw a live panel every tick, paced by the recorded dt
    #[arg(short, long)]
    live: bool,

    /// Playback speed multiplier for --live
    #[arg(long, default_value = "1.0")]
    speed: f32,

    /// Print the result as JSON instead of the summary
    #[arg(long)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let profile = Arc::new(LimitProfile::from_json_file(&args.profile)?);
    let path = Arc::new(ReferencePath::from_json_file(&args.path)?);
    let recording = Recording::from_json_file(&args.recording)?;
    info!(
        profile = %profile.id,
        frames = path.len(),
        ticks = recording.len(),
        "inputs loaded"
    );
    if !recording.profile_id.is_empty() && recording.profile_id != profile.id {
        warn!(
            recorded = %recording.profile_id,
            profile = %profile.id,
            "recording was captured under a different profile"
        );
    }

    let mut session = EvaluationSession::new(config);
    session.start(profile, path)?;

    if args.live {
        if !run_live(&mut session, &recording, args.speed)? {
            println!("Session aborted");
            return Ok(());
        }
    } else {
        let stats = replay(&mut session, &recording)?;
        info!(accepted = stats.accepted, rejected = stats.rejected, "replay finished");
    }

    let result = session.complete()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        Display::simple().show_summary(&result)?;
    }
    Ok(())
}

/// Wall-clock pause for one recorded step; None when the step cannot be slept
fn pacing(dt: f32, speed: f32) -> Option<Duration> {
    if dt.is_nan() || dt <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f32(dt / speed).ok()
}

/// Replay with the live panel. Returns false when the operator aborted.
fn run_live(
    session: &mut EvaluationSession,
    recording: &Recording,
    speed: f32,
) -> Result<bool, Box<dyn Error>> {
    let last_warning = Rc::new(RefCell::new(None::<String>));
    let sink = last_warning.clone();
    let subscription = session
        .events_mut()
        .safety_warning
        .subscribe(move |message| *sink.borrow_mut() = Some(message.clone()));

    let display = Display::live()?;
    let input = InputHandler::new();
    let mut proxy = ProxyController::new();
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };

    let mut finished = true;
    for tick in &recording.ticks {
        match input.poll_command()? {
            Some(Command::Abort) => {
                session.abort()?;
                finished = false;
                break;
            }
            Some(Command::Restart) => {
                session.restart()?;
                proxy.release_all();
                last_warning.borrow_mut().take();
            }
            None => {}
        }

        match session.tick(&tick.sample, tick.dt)? {
            TickOutcome::Accepted => {
                proxy.update(&tick.sample, &session.revert_targets(), tick.dt);
            }
            TickOutcome::Rejected(reason) => tracing::debug!(?reason, "tick skipped"),
        }
        display.show_live(session, &proxy, last_warning.borrow().as_deref())?;

        if let Some(pause) = pacing(tick.dt, speed) {
            std::thread::sleep(pause);
        }
    }

    drop(display);
    session.events_mut().safety_warning.unsubscribe(subscription);
    Ok(finished)
}
