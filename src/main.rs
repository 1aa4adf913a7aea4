//! VControl - input normalization CLI
//!
//! Replays scripted input scenarios, checks configuration and profile tables,
//! and (with the `gilrs` feature) monitors real gamepads.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcontrol::config::{ProfileTable, ShaperConfig};
use vcontrol::input::gamepad::{ProfileDatabase, ProfileSource};
use vcontrol::paths::ConfigPaths;
use vcontrol::replay::{Replay, Scenario};

/// VControl - shape raw touch, gamepad and key input into virtual controls
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: ./config.yaml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario file and print the committed state after every tick
    Replay {
        scenario: PathBuf,

        /// Print one JSON object per tick instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show which gamepad profile a device name resolves to
    Match { name: String },

    /// Load and validate the configuration
    Check,

    /// Poll real gamepads and print connection events and pad state
    #[cfg(feature = "gilrs")]
    Monitor {
        /// Ticks per second
        #[arg(long, default_value = "60")]
        rate: u32,
    },
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level)?;

    let (config, paths) = load_config(args.config.as_ref())?;

    match args.command {
        Command::Replay { scenario, json } => run_replay(&config, scenario, json),
        Command::Match { name } => match_device(&config, &name),
        Command::Check => check(&config, &paths),
        #[cfg(feature = "gilrs")]
        Command::Monitor { rate } => monitor::run(&config, rate),
    }
}

/// Configuration plus any custom profiles found beside it
fn load_config(explicit: Option<&PathBuf>) -> Result<(ShaperConfig, ConfigPaths)> {
    let paths = match explicit {
        Some(path) => ConfigPaths::from_config(path),
        None => ConfigPaths::detect(),
    };

    let mut config = if explicit.is_some() || paths.config.exists() {
        ShaperConfig::load(&paths.config)
            .with_context(|| format!("Failed to load config {}", paths.config.display()))?
    } else {
        info!("No config at {}, using defaults", paths.config.display());
        ShaperConfig::default()
    };

    if paths.profiles.exists() {
        let table = ProfileTable::load(&paths.profiles)
            .with_context(|| format!("Failed to load profiles {}", paths.profiles.display()))?;
        info!("Loaded {} profile(s) from {}", table.profiles.len(), paths.profiles.display());
        config.profiles.profiles.extend(table.profiles);
    }

    Ok((config, paths))
}

fn run_replay(config: &ShaperConfig, path: PathBuf, json: bool) -> Result<()> {
    let scenario = Scenario::load(&path).with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let mut replay = Replay::new(config, &scenario).context("Failed to set up replay")?;

    if !json {
        println!("\n{}", format!("=== Replay: {} ===", path.display()).bold().cyan());
    }
    for tick in &scenario.ticks {
        for report in replay.step(tick) {
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                print!("{}", report.render());
            }
        }
    }
    Ok(())
}

fn match_device(config: &ShaperConfig, name: &str) -> Result<()> {
    let db = ProfileDatabase::from_table(&config.profiles).context("Failed to compile profiles")?;
    let (profile, source) = db.resolve(name);
    let source = match source {
        ProfileSource::Custom => "custom".green(),
        ProfileSource::BuiltIn => "built-in".cyan(),
        ProfileSource::Generic => "generic fallback (unsupported)".yellow(),
    };
    println!("{} -> {} [{}]", name.bold(), profile.name, source);
    Ok(())
}

fn check(config: &ShaperConfig, paths: &ConfigPaths) -> Result<()> {
    config.validate().context("Configuration is invalid")?;
    ProfileDatabase::from_table(&config.profiles).context("Failed to compile profiles")?;

    println!("\n{}", "=== Configuration ===".bold().cyan());
    println!("  config:   {}", paths.config.display());
    println!("  profiles: {}", paths.profiles.display());
    println!(
        "  gamepad:  {} slot(s), check every {:.2}s, auto-activate {}",
        config.gamepad.max_slots, config.gamepad.connection_check_interval, config.gamepad.auto_activate
    );
    println!(
        "  gestures: tap <= {:.2}s, long press >= {:.2}s, up to {} taps",
        config.gestures.tap_max_duration, config.gestures.long_press_min_time, config.gestures.max_tap_count
    );
    println!("  sticks:   {}", config.sticks.len());
    for profile in &config.profiles.profiles {
        println!("    - {}", profile.name);
    }
    println!("{}", "✓ OK".green());
    Ok(())
}

#[cfg(feature = "gilrs")]
mod monitor {
    use std::time::Duration;

    use anyhow::Result;
    use colored::*;
    use tracing::info;

    use vcontrol::config::ShaperConfig;
    use vcontrol::input::gamepad::gilrs_host::GilrsHost;
    use vcontrol::input::gamepad::{GamepadKey, StickId};
    use vcontrol::InputContext;

    pub fn run(config: &ShaperConfig, rate: u32) -> Result<()> {
        let mut host = GilrsHost::new().map_err(|e| anyhow::anyhow!("Failed to initialise gilrs: {}", e))?;
        let mut ctx = InputContext::new(config)?;
        let dt = 1.0 / rate.max(1) as f32;
        info!("Monitoring gamepads at {} Hz, Ctrl+C to stop", rate.max(1));

        let mut last = String::new();
        loop {
            ctx.update(dt, &mut host);
            for event in ctx.gamepads_mut().take_events() {
                println!("{} {}", "event".yellow(), event);
            }

            let pad = ctx.gamepads().combined();
            let keys: Vec<&str> = GamepadKey::ALL.iter().filter(|k| pad.key(**k)).map(|k| k.name()).collect();
            let line = format!(
                "L={:?} R={:?} dpad={:?} keys={:?}",
                pad.stick_dir(StickId::LeftStick),
                pad.stick_dir(StickId::RightStick),
                pad.stick_dir(StickId::DPad),
                keys
            );
            if line != last {
                println!("{} {}", "combined".bold(), line);
                last = line;
            }
            std::thread::sleep(Duration::from_secs_f32(dt));
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}
