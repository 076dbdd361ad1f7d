mod config_commands;
mod send_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    courier_config::CourierConfig,
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "courier", about = "Courier: post media into a Matrix room")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message or upload media.
    Send {
        /// Target room; defaults to `matrix.room_id` from the config.
        #[arg(long)]
        room: Option<String>,
        #[command(subcommand)]
        action: send_commands::SendAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout only carries event IDs.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Explicit `--config` must load; a discovered file falls back to defaults.
/// Environment overrides apply either way.
fn load_config(path: Option<&Path>) -> anyhow::Result<CourierConfig> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            courier_config::load_config(path)?
        },
        None => courier_config::discover_and_load(),
    };
    Ok(courier_config::apply_env_overrides(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "courier starting");

    match cli.command {
        Commands::Send { room, action } => {
            let config = load_config(cli.config.as_deref())?;
            send_commands::handle_send(config, room, action).await
        },
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}
