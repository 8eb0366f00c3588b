//! OCPI Core CLI binary.
//!
//! # Commands
//!
//! - `server` - Start the OCPI credentials server
//! - `probe` - Fetch a counterpart's versions and endpoints
//! - `token` - Print a freshly generated token

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ocpi::{
    client::{CounterpartClient, HttpCounterpartClient},
    config::Config,
    credentials::generate_token,
    server::{create_router, AppState},
    transport::{TcpTransport, Transport},
    VersionNumber, VERSION,
};

#[derive(Parser)]
#[command(name = "ocpi")]
#[command(version = VERSION)]
#[command(about = "OCPI credentials exchange and version negotiation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the OCPI credentials server
    Server {
        /// Config file (default: <config dir>/ocpi/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Listen host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Public base URL (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Fetch a counterpart's version catalog and endpoints
    Probe {
        /// Counterpart versions URL
        url: String,

        /// Token the counterpart issued to us
        #[arg(short, long)]
        token: String,

        /// Version to fetch endpoints for
        #[arg(long, default_value = "2.2.1")]
        version: VersionNumber,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a freshly generated token
    Token,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server {
            config,
            port,
            host,
            base_url,
            verbose,
        } => cmd_server(config, port, host, base_url, verbose),
        Commands::Probe {
            url,
            token,
            version,
            timeout,
            verbose,
        } => cmd_probe(&url, &token, version, timeout, verbose),
        Commands::Token => {
            println!("{}", generate_token());
            Ok(())
        },
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}

fn cmd_server(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
    base_url: Option<String>,
    verbose: bool,
) -> anyhow::Result<()> {
    init_logging(verbose);

    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(base_url) = base_url {
        config.server.base_url = base_url;
    }

    let state = Arc::new(AppState::from_config(&config)?);
    let transport = TcpTransport::new(state.config.addr);
    let app = create_router(state.clone());

    tracing::info!("Starting OCPI server on {}", transport.listen_addr());
    tracing::info!("Versions URL: {}", config.server.versions_url());
    tracing::info!(
        "Negotiating version {} as {:?} {}/{}",
        state.config.version,
        config.party.role,
        config.party.country_code,
        config.party.party_id
    );
    if state.config.registration_tokens.is_empty() {
        tracing::warn!("No registration tokens configured; any bearer token may register");
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { transport.serve(app).await })?;
    Ok(())
}

fn cmd_probe(
    url: &str,
    token: &str,
    version: VersionNumber,
    timeout: u64,
    verbose: bool,
) -> anyhow::Result<()> {
    init_logging(verbose);

    let client = HttpCounterpartClient::new(Duration::from_secs(timeout))?;
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let catalog = client.fetch_versions(url, token).await?;
        println!("Versions:");
        for entry in catalog.entries() {
            println!("  {:<8} {}", entry.version, entry.url);
        }

        let Some(entry) = catalog.select(version) else {
            anyhow::bail!("Counterpart does not offer version {version}");
        };

        let details = client.fetch_endpoints(&entry.url, token).await?;
        println!();
        println!("Endpoints ({version}):");
        for endpoint in &details.endpoints {
            let role = endpoint
                .role
                .map(|r| format!("{r:?}"))
                .unwrap_or_default();
            println!("  {:<22} {:<9} {}", endpoint.identifier, role, endpoint.url);
        }
        Ok(())
    })
}
