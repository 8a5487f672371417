#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays client commands against a world.
//!
//! The adapter loads a configuration, populates the world from a scene file,
//! submits every scripted command through the shared world handle and prints
//! the resulting public view as JSON.

mod scene;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use golmi_core::Configuration;
use golmi_world::{SharedWorld, World};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scene::{parse_script, SceneFile};

#[derive(Parser, Debug)]
#[command(name = "golmi", about = "Replay gripper world commands and print the resulting state")]
struct Args {
    /// Configuration document with the type table and world settings.
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Scene document listing the initial objects and grippers.
    #[arg(long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Script with one JSON command per line.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Pretty-print the final world view.
    #[arg(long)]
    pretty: bool,
}

/// Entry point for the replay command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let output = run(&args)?;
    println!("{output}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(args: &Args) -> Result<String> {
    let document = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read configuration {}", args.config.display()))?;
    let config = Configuration::from_json_str(&document)
        .with_context(|| format!("invalid configuration {}", args.config.display()))?;
    info!(
        width = config.grid_width(),
        height = config.grid_height(),
        types = config.type_names().count(),
        "configuration_loaded"
    );

    let mut world = World::new();
    if let Some(path) = &args.scene {
        let document = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        SceneFile::parse(&document)?
            .populate(&mut world, &config)
            .with_context(|| format!("invalid scene {}", path.display()))?;
    }

    let shared = SharedWorld::new(world, config);
    if let Some(path) = &args.script {
        let script = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let _ = replay(&shared, &script)?;
    }

    let view = shared.view();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&view)
    } else {
        serde_json::to_string(&view)
    };
    rendered.context("failed to serialize world view")
}

/// Submits every scripted command, logging rejections without aborting.
///
/// Returns the number of commands the world accepted.
fn replay(shared: &SharedWorld, script: &str) -> Result<usize> {
    let lines = parse_script(script)?;
    let total = lines.len();
    let mut accepted = 0;
    for entry in lines {
        match shared.apply(entry.command) {
            Ok(event) => {
                accepted += 1;
                info!(line = entry.line, ?event, "command_applied");
            }
            Err(error) => warn!(line = entry.line, %error, "command_rejected"),
        }
    }
    info!(accepted, rejected = total - accepted, "replay_finished");
    Ok(accepted)
}
