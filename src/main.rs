//! Replays recorded pose keypoints through the measurement pipeline.
//!
//! Usage:
//!   body-measure frames.jsonl --height 175          # Human-readable output
//!   body-measure frames.jsonl --height 175 --json   # JSON output
//!   cat frames.jsonl | body-measure -H 175 --save   # Append the result to the CSV

use anyhow::{bail, Context, Result};
use body_measure::config::Config;
use body_measure::measure::{validate, BodyProportions, Calibration, Measurement, Reference};
use body_measure::pose::{JsonLinesSource, KeypointSource};
use body_measure::record::open_csv;
use body_measure::render::{format_analysis, format_report};
use body_measure::MeasurementSession;
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "body-measure")]
#[command(author, version = env!("GIT_VERSION"), about = "Body measurements from pose keypoints", long_about = None)]
struct Args {
    /// JSON Lines keypoint file (default: stdin)
    input: Option<PathBuf>,

    /// User height in cm. Calibrates on the first usable frame
    #[arg(short = 'H', long)]
    height: Option<f32>,

    /// Calibrate from a known segment instead, e.g. shoulder_width=40
    #[arg(long, value_name = "NAME=CM", conflicts_with = "height")]
    reference: Option<String>,

    /// Config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Append the last measured frame to the CSV file
    #[arg(short, long)]
    save: bool,

    /// CSV path (default: output.csv_path from the config)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Print a report for every frame
    #[arg(long)]
    every_frame: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    frames: u64,
    last_frame: Option<u64>,
    calibration: Option<CalibrationOutput>,
    measurements: Vec<MeasurementOutput>,
    proportions: ProportionsOutput,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct CalibrationOutput {
    reference: String,
    reference_cm: f32,
    reference_pixels: f32,
    scale_factor: f32,
    frame: u64,
}

#[derive(Serialize)]
struct MeasurementOutput {
    name: &'static str,
    label: &'static str,
    /// Stabilized value in cm
    value_cm: Option<f32>,
    /// Value from the last frame alone
    raw_cm: Option<f32>,
}

#[derive(Serialize)]
struct ProportionsOutput {
    shoulder_torso_ratio: Option<f32>,
    arm_symmetry: Option<f32>,
    arm_difference_cm: Option<f32>,
    leg_symmetry: Option<f32>,
    leg_difference_cm: Option<f32>,
}

impl From<&Calibration> for CalibrationOutput {
    fn from(c: &Calibration) -> Self {
        let reference = match c.reference {
            Reference::Height => "height".to_string(),
            Reference::Segment(m) => m.name().to_string(),
        };
        Self {
            reference,
            reference_cm: c.reference_cm,
            reference_pixels: c.reference_pixels,
            scale_factor: c.scale_factor,
            frame: c.frame_index,
        }
    }
}

impl From<&BodyProportions> for ProportionsOutput {
    fn from(p: &BodyProportions) -> Self {
        Self {
            shoulder_torso_ratio: p.shoulder_torso_ratio,
            arm_symmetry: p.arm_symmetry,
            arm_difference_cm: p.arm_difference_cm,
            leg_symmetry: p.leg_symmetry,
            leg_difference_cm: p.leg_difference_cm,
        }
    }
}

fn parse_reference(arg: &str) -> Result<(Measurement, f32)> {
    let (name, cm) = arg
        .split_once('=')
        .with_context(|| format!("expected NAME=CM, got {:?}", arg))?;
    let measurement = Measurement::from_name(name.trim())
        .with_context(|| format!("unknown measurement {:?}", name))?;
    let cm: f32 = cm.trim().parse().with_context(|| format!("invalid length {:?}", cm))?;
    Ok((measurement, cm))
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("failed to open {}", p.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    let config = Config::load_or_default(&args.config);
    let csv_path = args
        .csv
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));
    let threshold = config.measurement.confidence_threshold;
    let mut session = MeasurementSession::new(config)?;

    if let Some(height) = args.height {
        session.calibrate_when_ready(height)?;
    }
    let reference = args.reference.as_deref().map(parse_reference).transpose()?;

    log::info!("body-measure ({})", env!("GIT_VERSION"));
    let mut source = JsonLinesSource::new(open_input(args.input.as_ref())?);

    while let Some(detection) = source.next_detection()? {
        if let (Some((measurement, cm)), false, Some(skeleton)) =
            (reference, session.is_calibrated(), detection.skeleton())
        {
            if skeleton.is_valid_pose(threshold) {
                let _ = session.calibrate_from_reference(skeleton, measurement, cm);
            }
        }

        session.process(&detection);
        if args.every_frame && !args.json {
            if let Some(frame) = session.current() {
                println!("[frame {}]", frame.frame_index);
                print!("{}", format_report(&frame.stabilized, session.calibration()));
            }
        }
    }

    if session.frames_processed() == 0 {
        bail!("no frames in input");
    }
    if (args.height.is_some() || reference.is_some()) && !session.is_calibrated() {
        log::warn!("calibration never succeeded; measurements are undefined");
    }

    // 最後が未検出フレームでも、直近で計測できたフレームを結果とする
    let current = session.last_measured().or_else(|| session.current());
    let (stabilized, raw) = match current {
        Some(f) => (Some(&f.stabilized), Some(&f.raw)),
        None => (None, None),
    };
    let proportions = stabilized
        .map(BodyProportions::from_measurements)
        .unwrap_or_default();
    let warnings = stabilized.map(validate).unwrap_or_default();

    if args.json {
        let output = Output {
            frames: session.frames_processed(),
            last_frame: current.map(|f| f.frame_index),
            calibration: session.calibration().map(CalibrationOutput::from),
            measurements: Measurement::ALL
                .iter()
                .map(|&m| MeasurementOutput {
                    name: m.name(),
                    label: m.label(),
                    value_cm: stabilized.and_then(|s| s.get(m)),
                    raw_cm: raw.and_then(|s| s.get(m)),
                })
                .collect(),
            proportions: ProportionsOutput::from(&proportions),
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(set) = stabilized {
        print!("{}", format_report(set, session.calibration()));
        print!("{}", format_analysis(&proportions, &warnings));
    }

    if args.save {
        let record = session
            .save_last_measured(chrono::Local::now())
            .context("nothing to save")?;
        let mut writer = open_csv(&csv_path)
            .with_context(|| format!("failed to open {}", csv_path.display()))?;
        writer.write_record(&record)?;
        log::info!("measurements saved to {}", csv_path.display());
    }

    Ok(())
}
