#![forbid(unsafe_code)]

mod config;
mod constants;
mod daemon;
mod ipc;
mod jack;
mod preset;
mod schema;
mod status;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::{PresetSource, PresetStore, default_config_path};
use daemon::{PresetRequest, Shutdown};
use ipc::{SelectClient, SelectRequest, SelectResponse, SelectServer};
use jack::JackBus;

/// Set the JACK configuration from QjackCtl presets via D-Bus
#[derive(Parser, Debug)]
#[command(name = "jack-select", version, about)]
struct Cli {
    /// Activate default preset
    #[arg(short, long, conflicts_with = "preset")]
    default: bool,

    /// Be verbose about what the program does
    #[arg(short, long)]
    verbose: bool,

    /// QjackCtl configuration file [default: ~/.config/rncbc.org/QjackCtl.conf]
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// List presets ("*" marks the default) and exit
    #[arg(short, long)]
    list: bool,

    /// Ask the running instance to stop the JACK server
    #[arg(long, conflicts_with_all = ["preset", "default"])]
    stop: bool,

    /// Ask the running instance to exit
    #[arg(long, conflicts_with_all = ["preset", "default", "stop"])]
    quit: bool,

    /// JACK configuration preset to activate
    preset: Option<String>,
}

impl Cli {
    fn preset_request(&self) -> Option<PresetRequest> {
        match (&self.preset, self.default) {
            (Some(name), _) => Some(PresetRequest::Named(name.clone())),
            (None, true) => Some(PresetRequest::Default),
            (None, false) => None,
        }
    }

    /// What to ask an already running instance for
    fn remote_request(&self) -> SelectRequest {
        if self.quit {
            SelectRequest::Exit
        } else if self.stop {
            SelectRequest::StopServer
        } else {
            match self.preset_request() {
                Some(PresetRequest::Named(name)) => SelectRequest::ActivatePreset(name),
                Some(PresetRequest::Default) => SelectRequest::ActivateDefaultPreset,
                None => SelectRequest::GetStatus,
            }
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let log_level = if verbose {
        TraceLevel::DEBUG
    } else {
        match std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => TraceLevel::TRACE,
            "debug" => TraceLevel::DEBUG,
            "warn" => TraceLevel::WARN,
            "error" => TraceLevel::ERROR,
            _ => TraceLevel::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")
}

fn list_presets(path: &Path) -> Result<ExitCode> {
    let store = PresetStore::load(path)?;
    for preset in &store.presets {
        let marker = if store.default_preset.as_ref() == Some(preset) {
            " *"
        } else {
            ""
        };
        println!("{preset}{marker}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Forward the command line to the running instance
fn forward(mut client: SelectClient, request: SelectRequest) -> Result<ExitCode> {
    debug!(request = ?request, "Forwarding request to running instance");
    match client.request(&request)? {
        SelectResponse::Ready => Ok(ExitCode::SUCCESS),
        SelectResponse::Pid(pid) => {
            println!("{pid}");
            Ok(ExitCode::SUCCESS)
        }
        SelectResponse::Status(snapshot) => {
            if let Some(preset) = &snapshot.active_preset {
                println!("Active preset: {preset}");
            }
            println!("{}", snapshot.summary);
            Ok(ExitCode::SUCCESS)
        }
        SelectResponse::Error(message) => {
            error!(%message, "Request failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Become the primary instance and run the event loop
fn run_primary(
    config_path: PathBuf,
    socket_path: PathBuf,
    startup: Option<PresetRequest>,
) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let shutdown = runtime.block_on(async move {
        let connection = zbus::Connection::session()
            .await
            .context("Failed to connect to the D-Bus session bus")?;
        let bus = JackBus::connect(&connection).await?;
        let server = SelectServer::bind_to(socket_path)?;
        info!(config = %config_path.display(), "jack-select running");
        daemon::run(bus, PresetSource::new(config_path), server, startup).await
    })?;

    match shutdown {
        Shutdown::Exit => Ok(ExitCode::SUCCESS),
        Shutdown::Interrupted => {
            eprintln!("Interrupted.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    if cli.list {
        return list_presets(&config_path);
    }

    let socket_path = ipc::default_socket_path()?;
    match SelectClient::connect_to(&socket_path) {
        Ok(client) => {
            debug!("jack-select instance detected");
            forward(client, cli.remote_request())
        }
        Err(e) => {
            debug!(error = %e, "No running instance, starting one");
            if cli.quit || cli.stop {
                error!("jack-select is not running");
                return Ok(ExitCode::FAILURE);
            }
            run_primary(config_path, socket_path, cli.preset_request())
        }
    }
}
