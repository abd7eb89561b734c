//! Headless driver for the balance simulation.
//!
//! Runs the fixed-timestep control loop against a synthetic hand, standing in for the camera,
//! and "renders" each frame as a log line or a JSON snapshot.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use balance_core::{Command, ControlLoop, SimConfig, WorldSnapshot, pose_channel};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod synthetic;

/// Pose-driven balance platform simulation
#[derive(Parser)]
#[command(name = "balance-sim")]
#[command(about = "Steer a platform with a (synthetic) hand and catch falling balls")]
#[command(version)]
struct Cli {
    /// JSON configuration file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(short, long, default_value = "30")]
    seconds: f64,

    /// Rendered frames per second
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Spawn seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Pace frames to the wall clock and read p/r/l/q commands from stdin
    #[arg(long)]
    realtime: bool,

    /// Print every frame's snapshot as a JSON line on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SimConfig::from_json(&text).with_context(|| format!("loading config {}", path.display()))
}

/// Frame output: a JSON line per frame, or a status line about once per simulated second.
struct Renderer {
    json: bool,
    last_status: f64,
}

impl Renderer {
    fn render(&mut self, snapshot: &WorldSnapshot) -> Result<()> {
        if self.json {
            let line = serde_json::to_string(snapshot).context("serializing snapshot")?;
            let mut out = std::io::stdout().lock();
            writeln!(out, "{line}").context("writing snapshot")?;
            return Ok(());
        }

        if snapshot.sim_time - self.last_status >= 1.0 || snapshot.sim_time < self.last_status {
            self.last_status = snapshot.sim_time;
            info!(
                t = snapshot.sim_time,
                score = snapshot.score,
                bodies = snapshot.bodies.len(),
                platform_x = snapshot.platform.center[0],
                platform_y = snapshot.platform.center[1],
                "{:?}",
                snapshot.state
            );
            if snapshot.show_diagnostics {
                for body in &snapshot.bodies {
                    info!(
                        "  body {} at ({:.0}, {:.0}) v ({:.0}, {:.0})",
                        body.id, body.center[0], body.center[1], body.velocity[0], body.velocity[1]
                    );
                }
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    anyhow::ensure!(cli.fps.is_finite() && cli.fps > 0.0, "--fps must be positive");
    anyhow::ensure!(
        cli.seconds.is_finite() && cli.seconds >= 0.0,
        "--seconds must be non-negative"
    );

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let mut control = ControlLoop::new(config.clone()).context("building the simulation")?;

    let (publisher, mut source) = pose_channel();
    let (frame_tx, frame_rx) = mpsc::channel::<f64>();
    let hand = synthetic::SyntheticHand::new(config.width, config.height, config.seed);
    let producer = synthetic::spawn_producer(publisher, hand, frame_rx)
        .context("starting the pose producer")?;

    let commands = if cli.realtime {
        Some(commands::spawn_stdin_reader().context("starting the command reader")?)
    } else {
        None
    };

    let frame_time = 1.0 / cli.fps;
    let frames = (cli.seconds * cli.fps).ceil() as u64;
    let mut renderer = Renderer {
        json: cli.json,
        last_status: 0.0,
    };
    let started = Instant::now();
    info!(frames, fps = cli.fps, seed = config.seed, "starting");

    for frame in 0..frames {
        if let Some(rx) = &commands {
            while let Ok(command) = rx.try_recv() {
                debug!(?command, "command received");
                control.handle(command);
            }
        }
        if control.is_terminated() {
            break;
        }

        // Camera frame for this render frame; a closed producer just means no more poses.
        if frame_tx.send(control.world().elapsed()).is_err() {
            warn!("pose producer has stopped");
        }

        let report = control.advance(frame_time, &mut source)?;
        for capture in report.captures() {
            info!(body = %capture.body_id, score = control.score(), "caught");
        }
        renderer.render(&control.snapshot())?;

        if cli.realtime {
            let deadline = started + Duration::from_secs_f64(frame_time * (frame + 1) as f64);
            if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    control.handle(Command::Quit);
    drop(frame_tx);
    if producer.join().is_err() {
        warn!("pose producer panicked");
    }

    info!(
        score = control.score(),
        sim_time = control.world().elapsed(),
        "finished"
    );
    Ok(())
}
