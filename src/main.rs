//! switchyard binary: serves the demo application on the live socket or as
//! a gateway function, or runs a single gateway event from a file.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use switchyard::config::{load_or_default, RuntimeMode};
use switchyard::lifecycle::{signals, Launcher, Shutdown};
use switchyard::observability::{logging, metrics};
use switchyard::{app, GatewayHandler};

#[derive(Parser)]
#[command(name = "switchyard", version, about = "HTTP routing core for socket and gateway transports")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve on the selected transport (default).
    Serve {
        /// Override the configured mode.
        #[arg(long, value_enum)]
        mode: Option<RuntimeMode>,
    },
    /// Run one gateway event (file path, or `-` for stdin) and print the response.
    Invoke { event: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_or_default(cli.config.as_deref())?;

    logging::init(&config.observability)?;
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Serve { mode: None }) {
        Command::Serve { mode } => {
            if let Some(mode) = mode {
                config.mode = mode;
            }

            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr)?,
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let shutdown = Arc::new(Shutdown::new());
            signals::spawn_signal_listener(shutdown.clone());

            let launcher = Launcher::select(config.mode);
            tracing::info!(launcher = ?launcher, mode = ?config.mode, "Transport selected");
            launcher.launch(app::build_engine, config, &shutdown).await?;

            tracing::info!(signalled = shutdown.is_triggered(), "Shutdown complete");
        }
        Command::Invoke { event } => {
            let payload = if event.as_os_str() == "-" {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            } else {
                std::fs::read(&event)?
            };

            let handler = GatewayHandler::new(Arc::new(app::build_engine()?));
            let output = tokio::task::spawn_blocking(move || handler.invoke(&payload)).await??;
            println!("{}", String::from_utf8_lossy(&output));
        }
    }

    Ok(())
}
