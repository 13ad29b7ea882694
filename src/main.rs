//! # Waypane - Minimal Wayland SHM Client
//!
//! Connects to the compositor named by `$WAYLAND_DISPLAY`, binds the core
//! globals, and displays a single solid-colored 600x500 pane from a
//! shared-memory buffer. All fatal errors bubble up here, are reported to
//! stderr once, and exit the process with status 1.

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use waypane::{WaypaneClient, WaypaneConfig};

#[derive(Parser)]
#[command(name = "waypane")]
#[command(about = "A minimal Wayland client that displays a single solid-colored pane")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/waypane/waypane.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting Waypane - Minimal Wayland SHM Client");
    info!("📄 Version: {}", waypane::VERSION);

    // Load configuration; the defaults reproduce the classic flagless demo.
    let config = match WaypaneConfig::load(&cli.config) {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            warn!("⚠️ Using default configuration: {}", e);
            WaypaneConfig::default()
        }
    };

    let client = WaypaneClient::connect(&config)?;

    // Blocks until the compositor disconnects or the connection errors.
    client.run()
}
