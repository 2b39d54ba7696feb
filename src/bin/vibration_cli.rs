use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use vibration::config::AppConfig;
use vibration::context::VibrationContext;
use vibration::dispatcher::{CommandDispatcher, MethodCall, MethodResponse};
use vibration::engine::{DesktopStubBackend, Platform, StubDevice, StubVibrator, SystemTimeSource};
use vibration::pattern::{self, HapticTimeline};

#[derive(Parser, Debug)]
#[command(
    name = "vibration_cli",
    about = "Drive the vibration core against the desktop stub platform"
)]
struct Cli {
    /// Config file (defaults to assets/vibration_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pretend to run on physical hardware
    #[arg(long)]
    physical: bool,
    /// Device model reported by the stub
    #[arg(long, default_value = "iPhone12,1")]
    model: String,
    /// Make engine creation fail so playback takes the fallback path
    #[arg(long)]
    no_engine: bool,
    /// Report no custom haptics support
    #[arg(long)]
    no_custom_haptics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a pattern and print the resulting timeline
    Compile {
        /// Comma-separated wait,duration pairs in ms
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        pattern: Vec<i64>,
        /// Comma-separated intensities (0-255), one per pair
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        intensities: Vec<i64>,
    },
    /// Dispatch a method-channel call
    Call {
        #[arg(long)]
        method: String,
        /// Argument map as JSON
        #[arg(long)]
        args: Option<String>,
        /// Keep running this long so fallback pulses can fire
        #[arg(long, default_value_t = 0)]
        wait_ms: u64,
    },
}

#[derive(Serialize)]
struct CallReport {
    response: MethodResponse,
    pulses: usize,
    engine_starts: usize,
    timelines: Vec<HapticTimeline>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    vibration::init_logging();

    match &cli.command {
        Commands::Compile {
            pattern,
            intensities,
        } => {
            let timeline = pattern::compile(pattern, intensities)
                .with_context(|| format!("cannot compile pattern {:?}", pattern))?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call {
            method,
            args,
            wait_ms,
        } => {
            let arguments = args
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()
                .context("--args is not valid JSON")?;

            let stub = DesktopStubBackend::new();
            stub.set_fail_create(cli.no_engine);
            stub.set_supports_custom_haptics(!cli.no_custom_haptics);
            let vibrator = StubVibrator::default();

            let platform = Platform {
                backend: Arc::new(stub.clone()),
                vibrator: Arc::new(vibrator.clone()),
                device: Arc::new(StubDevice::new(cli.physical, cli.model.clone())),
                time_source: Arc::new(SystemTimeSource::default()),
            };
            let config = match &cli.config {
                Some(path) => AppConfig::load_from_file(path),
                None => AppConfig::load(),
            };
            let dispatcher = CommandDispatcher::new(Arc::new(VibrationContext::new(platform, config)));

            let response = dispatcher.handle(&MethodCall::new(method.clone(), arguments));
            if *wait_ms > 0 {
                std::thread::sleep(Duration::from_millis(*wait_ms));
            }

            let record = stub.record();
            let report = CallReport {
                response,
                pulses: vibrator.pulses(),
                engine_starts: record.engine_starts,
                timelines: record.timelines,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);

            let failed = matches!(report.response, MethodResponse::Error { .. });
            Ok(if failed {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
