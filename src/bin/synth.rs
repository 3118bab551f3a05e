//! Synthetic session generator
//!
//! Writes a demo limit profile, a reference neck-rotation path and a noisy
//! recording of a user following it.
//! Usage: cargo run --bin synth -- --out demo/ --frames 120 --checkpoints 3

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::f32::consts::PI;
use std::fs;
use std::path::PathBuf;
use therapy_trainer::profile::{LimitProfile, PoseAxis, PoseSample, ReferencePath};
use therapy_trainer::replay::Recording;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "synth")]
#[command(about = "Generate a demo profile, reference path and recording")]
struct Args {
    /// Output directory
    #[arg(short, long, default_value = "demo")]
    out: PathBuf,

    /// Reference path length
    #[arg(short, long, default_value = "120")]
    frames: usize,

    /// Evenly spaced checkpoints, the last one on the final frame
    #[arg(short, long, default_value = "3")]
    checkpoints: usize,

    /// Frames per second
    #[arg(long, default_value = "30")]
    rate: f32,

    /// Peak neck rotation of the demonstration in degrees
    #[arg(long, default_value = "45")]
    peak: f32,

    /// Uniform noise amplitude added to every recorded axis
    #[arg(short, long, default_value = "1.5")]
    noise: f32,

    /// Push rotation to this fraction of its limit mid-recording
    #[arg(short, long)]
    excursion: Option<f32>,

    /// RNG seed
    #[arg(short, long, default_value = "7")]
    seed: u64,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Smooth out-and-back rotation with a slight nod
fn demonstration(frames: usize, rate: f32, peak: f32) -> Vec<PoseSample> {
    let last = frames.saturating_sub(1).max(1) as f32;
    (0..frames)
        .map(|i| {
            let phase = i as f32 / last;
            let sweep = (phase * PI).sin();
            PoseSample::at(i as f32 / rate)
                .with(PoseAxis::NeckRotation, peak * sweep)
                .with(PoseAxis::NeckFlexion, 5.0 * sweep)
        })
        .collect()
}

fn checkpoint_markers(frames: usize, count: usize) -> Vec<(usize, String)> {
    (1..=count)
        .map(|k| (k * (frames - 1) / count, format!("phase-{}", k)))
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if args.frames < 2 {
        return Err("need at least 2 frames".into());
    }
    if args.checkpoints >= args.frames {
        return Err(format!("at most {} checkpoints for {} frames", args.frames - 1, args.frames).into());
    }
    if !(args.rate.is_finite() && args.rate > 0.0) {
        return Err("rate must be positive".into());
    }

    fs::create_dir_all(&args.out)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let profile = LimitProfile {
        id: "neck-rotation".to_string(),
        name: "Cervical rotation".to_string(),
        description: "Slow rotation to the right and back to neutral".to_string(),
        ..LimitProfile::default()
    };

    let poses = demonstration(args.frames, args.rate, args.peak);
    let markers = checkpoint_markers(args.frames, args.checkpoints);
    let marker_refs: Vec<(usize, &str)> = markers.iter().map(|(i, n)| (*i, n.as_str())).collect();
    let path = ReferencePath::with_checkpoints("neck-rotation-demo", poses.clone(), &marker_refs)?;

    let dt = 1.0 / args.rate;
    let excursion_window = args.frames * 2 / 5..args.frames * 3 / 5;
    let rotation_limit = profile.limits.neck_rotation_right;
    let mut recording = Recording::new(profile.id.clone());
    for (i, pose) in poses.iter().enumerate() {
        let mut sample = *pose;
        for axis in PoseAxis::ALL {
            if matches!(axis, PoseAxis::Force | PoseAxis::Speed) || args.noise <= 0.0 {
                continue;
            }
            *sample.axis_mut(axis) += rng.gen_range(-args.noise..=args.noise);
        }
        sample.force = rng.gen_range(5.0..25.0);
        if let Some(ratio) = args.excursion {
            if excursion_window.contains(&i) {
                sample.neck_rotation = sample.neck_rotation.max(ratio * rotation_limit);
            }
        }
        recording.push(dt, sample);
    }

    profile.to_json_file(args.out.join("profile.json"))?;
    path.to_json_file(args.out.join("path.json"))?;
    recording.to_json_file(args.out.join("recording.json"))?;

    info!(
        frames = path.len(),
        checkpoints = markers.len(),
        ticks = recording.len(),
        "synthetic session written"
    );
    println!("Wrote profile.json, path.json and recording.json to {}", args.out.display());
    Ok(())
}
