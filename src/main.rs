//! `brightsync` command-line entry point.
//!
//! ```text
//! brightsync serve                 # run the HTTP server (default)
//! brightsync set 75                # fade to 75%
//! brightsync level dim             # fade to the middle of the `dim` range
//! brightsync auto                  # apply the scheduled level
//! brightsync calibrate 0.4         # show what a phone at 40% maps to
//! brightsync autostart toggle      # start at login, or stop doing so
//! ```

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use brightsync::autostart::Autostart;
use brightsync::calibration::normalize_source;
use brightsync::server;
use brightsync::{
    BrightnessBackend, BrightnessController, Config, Error, MemoryBackend, SysfsBacklight,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "brightsync", version, about = "Sync laptop brightness from your phone")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backlight device directory (default: first under /sys/class/backlight)
    #[arg(short, long, global = true)]
    device: Option<PathBuf>,

    /// Drive an in-memory display instead of real hardware
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the current brightness
    Get,
    /// Set brightness to a percentage
    Set {
        /// Target percentage (1-100)
        percent: u8,
        /// Skip the stepped fade
        #[arg(long)]
        instant: bool,
    },
    /// Set brightness to a named level
    Level {
        /// Level name, e.g. dim or bright
        name: String,
    },
    /// Apply the level scheduled for the current time
    Auto,
    /// Print the laptop brightness for a phone brightness, without applying it
    Calibrate {
        /// Phone brightness as a fraction (0-1) or percentage
        value: f64,
    },
    /// Manage starting at login
    Autostart {
        #[arg(value_enum, default_value_t = AutostartAction::Status)]
        action: AutostartAction,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AutostartAction {
    Status,
    Enable,
    Disable,
    Toggle,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Error> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let command = cli.command.unwrap_or(Command::Serve);

    // Commands that never touch the display
    match &command {
        Command::Calibrate { value } => {
            let fraction = normalize_source(*value);
            println!("{}", config.calibration.calibrate(fraction));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Autostart { action } => return autostart(*action),
        _ => {}
    }

    let backend = open_backend(cli.device, cli.dry_run)?;
    let controller = BrightnessController::new(backend, config);

    match command {
        Command::Serve => serve(controller),
        Command::Get => {
            println!("{}", controller.current_brightness());
            Ok(ExitCode::SUCCESS)
        }
        Command::Set { percent, instant } => {
            controller.set_brightness(percent, !instant)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Level { name } => {
            if !controller.config().levels.contains(&name) {
                tracing::warn!("Level '{}' is not configured", name);
            }
            controller.set_brightness(controller.brightness_for_level(&name), true)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Auto => {
            let applied = controller.apply_time_based()?;
            println!("{}", applied);
            Ok(ExitCode::SUCCESS)
        }
        Command::Calibrate { .. } | Command::Autostart { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn open_backend(
    device: Option<PathBuf>,
    dry_run: bool,
) -> Result<Box<dyn BrightnessBackend>, Error> {
    if dry_run {
        tracing::info!("Dry run: using in-memory display");
        return Ok(Box::new(MemoryBackend::new(brightsync::DEFAULT_BRIGHTNESS)));
    }
    let backlight = match device {
        Some(dir) => SysfsBacklight::new(dir)?,
        None => SysfsBacklight::discover()?,
    };
    Ok(Box::new(backlight))
}

fn autostart(action: AutostartAction) -> Result<ExitCode, Error> {
    let autostart = Autostart::for_current_exe()?;
    let enabled = match action {
        AutostartAction::Status => autostart.is_enabled(),
        AutostartAction::Enable => {
            autostart.enable()?;
            true
        }
        AutostartAction::Disable => {
            autostart.disable()?;
            false
        }
        AutostartAction::Toggle => autostart.toggle()?,
    };
    println!(
        "Autostart {} ({})",
        if enabled { "enabled" } else { "disabled" },
        autostart.entry_path().display()
    );
    Ok(ExitCode::SUCCESS)
}

/// Whether something already accepts connections on the server's port.
fn already_running(port: u16) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(500)).is_ok()
}

fn serve(controller: BrightnessController) -> Result<ExitCode, Error> {
    let config = controller.config().clone();
    if already_running(config.port) {
        eprintln!("Server already running!");
        return Ok(ExitCode::FAILURE);
    }

    let address = config
        .bind_address()
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::Config(format!("Cannot resolve {}", config.bind_address())))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let app = server::router(Arc::new(controller));
        let listener = tokio::net::TcpListener::bind(address).await?;

        tracing::info!("Starting brightness server...");
        tracing::info!("Server available at: http://{}", address);
        tracing::info!("Available endpoints:");
        tracing::info!("  POST /brightness - set brightness");
        tracing::info!("  GET  /brightness - get current brightness");
        tracing::info!("  POST /auto       - auto brightness by time");
        tracing::info!("  GET  /health     - server health check");
        tracing::info!("  GET  /config     - configuration");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;
        Ok::<_, Error>(ExitCode::SUCCESS)
    })
}
