mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use hlsrelay_core::{
    logging,
    supervisor::artifacts::OutputHousekeeper,
    ConfigStore, RelayService, RelaySupervisor, Settings, SupervisorOptions,
};

use server::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "hlsrelay")]
#[command(about = "Supervised ffmpeg HLS relay with a small control API", long_about = None)]
struct Args {
    /// Settings file (TOML, YAML or JSON by extension)
    #[arg(long, env = "HLSRELAY_CONFIG_PATH", default_value = "hlsrelay.toml")]
    config: PathBuf,

    /// Override the HTTP listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the HTTP listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load settings
    let mut settings = Settings::load(Some(&args.config))?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    // 2. Fail fast on misconfiguration
    if let Err(errors) = settings.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 3. Initialize logging
    logging::init_logging(&settings.logging)?;
    info!("hlsrelay starting...");
    info!("HTTP address: {}", settings.http_address());
    info!("Output directory: {}", settings.paths.output_dir.display());
    if !settings.paths.static_dir.is_dir() {
        warn!(
            "Static directory {} not found, the player page will return 404",
            settings.paths.static_dir.display()
        );
    }

    // 4. Wire the relay
    let supervisor = Arc::new(RelaySupervisor::new(
        OutputHousekeeper::new(&settings.paths.output_dir),
        SupervisorOptions::from(&settings.relay),
    ));
    let relay = Arc::new(RelayService::new(
        ConfigStore::new(settings.relay_config_path()),
        supervisor,
    ));

    // 5. Start with the persisted configuration
    if settings.relay.auto_start {
        if let Err(e) = relay.start_persisted().await {
            warn!(error = %e, "Failed to start relay from persisted configuration");
        }
    } else {
        info!("Auto start disabled, waiting for /api/start");
    }

    RelayServer::new(settings, relay).run().await
}
