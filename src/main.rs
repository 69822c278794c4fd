//! sensedeck: a terminal dashboard for device motion, orientation, and
//! ambient-light sensors.
//!
//! Reads a simulated sensor backend, detects shakes, tracks a calibratable
//! compass heading, and buckets ambient light into named tiers.

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// === Modules ===

mod config;
mod display;
mod monitor;
mod notify;
mod samples;
mod shake;
mod shared;
mod sources;
mod transform;

use monitor::{Command, MonitorRuntime, SensorMonitor};
use sources::simulated::SimulatedDevice;
use sources::PermissionDecision;

// === CLI ===

#[derive(Parser)]
#[command(name = "sensedeck")]
#[command(about = "Terminal dashboard for device motion, orientation, and light sensors")]
struct Cli {
    /// Seed for the simulated sensor streams
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Dashboard refresh interval in milliseconds
    #[arg(long, default_value_t = 250)]
    refresh_ms: u64,

    /// Exit automatically after this many seconds
    #[arg(long)]
    run_for: Option<u64>,

    /// Gate startup behind a simulated permission prompt
    #[arg(long, value_enum)]
    permission: Option<PermissionArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PermissionArg {
    Grant,
    Deny,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in your editor to tune thresholds and timings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => {
            run_config_command()?;
        }
        None => {
            run_dashboard(cli).await?;
        }
    }

    Ok(())
}

/// Open config file in user's editor
fn run_config_command() -> anyhow::Result<()> {
    let config_path = config::Config::path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    // Create config dir if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create config file with defaults if it doesn't exist
    if !config_path.exists() {
        let defaults = toml::to_string_pretty(&config::Config::default())?;
        std::fs::write(&config_path, defaults)?;
        println!("Created config file: {}", config_path.display());
    }

    // Get editor from environment or use defaults
    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            { "notepad".to_string() }
            #[cfg(not(target_os = "windows"))]
            { "nano".to_string() }
        });

    println!("Opening {} with {}", config_path.display(), editor);

    // Open editor
    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()?;

    Ok(())
}

/// Run the dashboard against the simulated backend
async fn run_dashboard(cli: Cli) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting sensedeck (seed {})", cli.seed);

    let config = config::Config::load();
    let backend = match cli.permission {
        Some(PermissionArg::Grant) => {
            SimulatedDevice::new(cli.seed).with_permission_prompt(PermissionDecision::Granted)
        }
        Some(PermissionArg::Deny) => {
            SimulatedDevice::new(cli.seed).with_permission_prompt(PermissionDecision::Denied)
        }
        None => SimulatedDevice::new(cli.seed),
    };

    let monitor = SensorMonitor::new(&config, cli.seed);
    let runtime = MonitorRuntime::new(backend, monitor);

    let (commands, command_rx) = mpsc::channel(16);

    // Sensors come up immediately; start/stop remain available from stdin.
    commands.send(Command::Start).await.ok();

    spawn_stdin_reader(commands.clone());

    if let Some(secs) = cli.run_for {
        let commands = commands.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            commands.send(Command::Quit).await.ok();
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            commands.send(Command::Quit).await.ok();
        }
    });

    let refresh = Duration::from_millis(cli.refresh_ms.max(16));
    runtime.run(command_rx, refresh, render_screen).await;

    tracing::info!("sensedeck stopped");
    Ok(())
}

/// Forward stdin lines as commands until EOF or quit.
fn spawn_stdin_reader(commands: mpsc::Sender<Command>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let command = match line.trim() {
                "start" => Command::Start,
                "stop" => Command::Stop,
                "calibrate" => Command::Calibrate,
                "quit" | "q" => Command::Quit,
                "" => continue,
                other => {
                    tracing::warn!("unknown command: {other}");
                    continue;
                }
            };
            let quitting = command == Command::Quit;
            if commands.send(command).await.is_err() || quitting {
                break;
            }
        }
    });
}

/// Clear the terminal and redraw the dashboard plus active toasts.
fn render_screen(monitor: &SensorMonitor) {
    let mut frame = String::from("\x1b[2J\x1b[H");
    frame.push_str(&monitor.display().render());

    let now = Instant::now();
    for (message, phase) in monitor.notifier().active(now) {
        match phase {
            notify::ToastPhase::Visible => frame.push_str(&format!("  >> {message}\n")),
            notify::ToastPhase::Leaving => frame.push_str(&format!("  .. {message}\n")),
        }
    }

    frame.push_str("\n  commands: start | stop | calibrate | quit\n");
    print!("{frame}");
}
