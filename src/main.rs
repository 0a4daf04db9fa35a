//! Beacon Narrator console
//!
//! Stands in for the voice/gesture front end: each line typed on stdin is
//! one utterance. Sample beacons from the config are placed in an arc in
//! front of the viewer, and `look <degrees>` turns the viewer so spotlight
//! reads can be tried.

use anyhow::Context;
use beacon_narrator::beacon::Beacon;
use beacon_narrator::input::{parse_command, Dispatcher, TextCapture};
use beacon_narrator::spatial::{Collider, ConeFilter, Pose, PoseSource, StaticPose, Vec3};
use beacon_narrator::speech::create_gateway;
use beacon_narrator::state::config::Config;
use beacon_narrator::state::PlaybackSession;
use beacon_narrator::{NarrationSettings, Narrator};
use log::{debug, error, info};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Distance at which beacons are placed in front of the viewer
const PLACEMENT_DISTANCE: f32 = 2.5;
const BEACON_RADIUS: f32 = 0.25;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");
    let log_path = format!("{}.log", beacon_narrator::APP_NAME);

    if debug_mode {
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open {} for debug logging: {}", log_path, e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }
        info!(
            "Beacon Narrator version {} starting (debug mode, logging to {})",
            beacon_narrator::VERSION,
            log_path
        );
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }

    let config_path = args
        .windows(2)
        .find(|pair| pair[0] == "--config" || pair[0] == "-c")
        .map(|pair| PathBuf::from(&pair[1]));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config_path)) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Places a beacon straight ahead of the viewer, like a text capture would
struct PlaceAhead {
    spatial: Arc<ConeFilter>,
    pose: Arc<StaticPose>,
}

impl TextCapture for PlaceAhead {
    fn capture(&self, narrator: &Narrator, text: &str) -> beacon_narrator::Result<Arc<Beacon>> {
        let pose = self.pose.viewer_pose();
        let forward = pose.forward.normalized().unwrap_or(Vec3::FORWARD);
        let center = pose.position + forward * PLACEMENT_DISTANCE;
        let handle = self.spatial.add(Collider::new(center, BEACON_RADIUS));
        Ok(narrator.add_beacon(text, handle))
    }
}

/// Unit gaze vector `degrees` clockwise from straight ahead (+z)
fn heading(degrees: f32) -> Vec3 {
    let rad = degrees.to_radians();
    Vec3::new(rad.sin(), 0.0, rad.cos())
}

fn print_help() {
    println!("Commands:");
    println!("  read text | read all text | read new text");
    println!("  stop | skip | repeat | faster | slower | clear");
    println!("  capture <text>     place a beacon ahead and read it");
    println!("  look <degrees>     turn the viewer (0 = initial heading)");
    println!("  status | help | quit");
}

async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    debug!("Initializing Beacon Narrator");

    let config = match config_path {
        Some(path) => Config::load_from(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    info!("Configuration loaded from {:?}", config.path());

    let gateway = create_gateway(&config).context("creating speech gateway")?;
    let spatial = Arc::new(ConeFilter::new());
    let pose = Arc::new(StaticPose::new(Pose::default()));

    let session = PlaybackSession::new(config.rate(), config.rate_bounds());
    let narrator = Narrator::new(
        gateway,
        spatial.clone(),
        pose.clone(),
        NarrationSettings::from_config(&config),
        session,
    );

    // Colliders belong to the beacons; drop them together
    {
        let spatial = spatial.clone();
        narrator.with_registry(|registry| registry.on_cleared(Box::new(move || spatial.clear())));
    }

    // Sample beacons fanned out across the field of view
    let count = config.sample_texts.len();
    for (i, text) in config.sample_texts.iter().enumerate() {
        let spread = if count > 1 {
            -60.0 + 120.0 * i as f32 / (count - 1) as f32
        } else {
            0.0
        };
        let center = heading(spread) * PLACEMENT_DISTANCE;
        let handle = spatial.add(Collider::new(center, BEACON_RADIUS));
        narrator.add_beacon(text.clone(), handle);
    }
    info!("Placed {} sample beacons", count);

    let dispatcher = Dispatcher::new(narrator.clone()).with_capture(Box::new(PlaceAhead {
        spatial: spatial.clone(),
        pose: pose.clone(),
    }));

    if let Err(e) = narrator.announce("Ready to assist.").await {
        error!("Failed to speak greeting: {}", e);
    }

    println!("Beacon Narrator {} ready", beacon_narrator::VERSION);
    println!("Configuration loaded: {}", config.path().display());
    println!("  Speech backend: {}", config.backend());
    println!("  Speaking rate: {}", narrator.session().speaking_rate());
    println!("  Sample beacons: {}", count);
    println!("Type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "status" => {
                let session = narrator.session();
                println!(
                    "mode: {:?}, rate: {:.2}, beacons: {}, last: {:?}",
                    session.mode(),
                    session.speaking_rate(),
                    narrator.beacons().len(),
                    session.last_text()
                );
                continue;
            }
            _ => {}
        }

        if let Some(rest) = line.strip_prefix("look ") {
            match rest.trim().parse::<f32>() {
                Ok(degrees) => {
                    let current = pose.viewer_pose();
                    pose.set(Pose {
                        position: current.position,
                        forward: heading(degrees),
                    });
                    println!("Facing {} degrees", degrees);
                }
                Err(_) => println!("Usage: look <degrees>"),
            }
            continue;
        }

        match parse_command(line) {
            Some(command) => {
                // Handles are dropped; the tasks keep running
                dispatcher.dispatch(command);
            }
            None => println!("Unrecognised command: {}", line),
        }
    }

    narrator.stop();
    info!("Beacon Narrator exiting");
    Ok(())
}
