//! OOI Requests CLI application
//!
//! Command-line interface for comparing the OOI QC Database with the live
//! data catalog and sending the resulting netCDF data requests.

use std::process;

use tracing::{error, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use ooi_requests::cli::{
    handle_auth, handle_compare, handle_config, handle_run, handle_send, Cli, Commands,
};
use ooi_requests::config::AppConfig;
use ooi_requests::constants::logging;
use ooi_requests::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("{} error: {}", e.category(), e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config);

    info!("OOI Requests v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Compare(args) => {
            info!("Executing compare command");
            handle_compare(args, &config).await
        }
        Commands::Send(args) => {
            info!("Executing send command");
            handle_send(args, &config).await
        }
        Commands::Run(args) => {
            info!("Executing run command");
            handle_run(args, &config).await
        }
        Commands::Auth(args) => {
            info!("Executing auth command");
            handle_auth(args).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config).await
        }
    }
}

/// Initialize logging from the CLI flags, falling back to the config file level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = match cli.log_level() {
        Some(level) => level.to_string().to_lowercase(),
        None => config.logging.level.clone(),
    };

    let directive: std::result::Result<Directive, _> = format!("ooi_requests={}", level)
        .parse()
        .or_else(|_| format!("ooi_requests={}", logging::DEFAULT_LOG_LEVEL).parse());

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
