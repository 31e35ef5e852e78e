use clap::Parser;
use radius_exporter::{serve, AppState, Config, ConfigFile};
use std::net::SocketAddr;
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RADIUS Exporter - Prometheus probe for RADIUS authentication servers
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
#[command(name = "radius_exporter")]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", value_name = "CONFIG", default_value = "config.json")]
    config_path: String,

    /// Address to listen on for HTTP requests
    #[arg(long = "web.listen-address", default_value = "0.0.0.0:9881")]
    listen_address: SocketAddr,

    /// Path under which the probe is exposed
    #[arg(long = "web.telemetry-path", default_value = "/metrics")]
    telemetry_path: String,

    /// Log level (overridden by RUST_LOG)
    #[arg(long = "log.level", default_value = "info")]
    log_level: String,

    /// Validate configuration and exit (doesn't start server)
    #[arg(short, long)]
    validate: bool,

    /// Print version information and exit
    #[arg(short = 'V', long)]
    version: bool,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version {
        println!("RADIUS Exporter v{}", env!("CARGO_PKG_VERSION"));
        println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        process::exit(0);
    }

    init_tracing(&cli.log_level);

    if !cli.telemetry_path.starts_with('/') || cli.telemetry_path == "/" {
        error!(
            "Telemetry path must start with '/' and differ from the landing page: {}",
            cli.telemetry_path
        );
        process::exit(1);
    }

    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            if cli.validate {
                eprintln!("Configuration validation failed!");
                eprintln!("   Error: {}", e);
                process::exit(1);
            }
            if std::path::Path::new(&cli.config_path).exists() {
                error!("Could not load config file {}: {}", cli.config_path, e);
                process::exit(1);
            }

            warn!("Could not load config file from: {}", cli.config_path);
            info!("Creating example configuration at: {}", cli.config_path);

            if let Err(e) = ConfigFile::example().to_file(&cli.config_path) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and restart the exporter", cli.config_path);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully!");
        println!();
        println!("Modules:");
        let mut names: Vec<_> = config.modules.keys().collect();
        names.sort();
        for name in names {
            println!("  {}", name);
        }
        if config.modules.is_empty() {
            println!("  WARNING: No modules configured!");
        }
        process::exit(0);
    }

    info!("RADIUS Exporter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config = %cli.config_path,
        modules = config.modules.len(),
        "Loaded configuration"
    );
    if config.modules.is_empty() {
        warn!("No modules configured, every probe will be rejected");
    }

    let listener = match tokio::net::TcpListener::bind(cli.listen_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", cli.listen_address, e);
            process::exit(1);
        }
    };

    let state = AppState::new(config, cli.telemetry_path);
    if let Err(e) = serve(listener, state, shutdown_signal()).await {
        error!("Server error: {}", e);
        process::exit(1);
    }
}
