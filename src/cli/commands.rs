//! Command handlers for OOI Requests CLI
//!
//! This module implements the command handlers that connect CLI arguments,
//! the loaded configuration and the pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::app::catalog::Prefetched;
use crate::app::dispatch::Dispatcher;
use crate::app::output::{self, OutputPaths};
use crate::app::{compare, OoiClient, PipelineConfig, PipelineOutcome};
use crate::auth::{
    check_credentials, clear_credentials, load_credentials, setup_credentials, show_auth_status,
};
use crate::cli::prompt::{confirm, prompt_selection, prompt_time_bounds};
use crate::cli::{AuthAction, AuthArgs, CompareArgs, ConfigAction, ConfigArgs, RunArgs, SendArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, AuthError, Result};

/// Handle the compare command
pub async fn handle_compare(args: CompareArgs, config: &AppConfig) -> Result<()> {
    let client = OoiClient::new(config.client_config(), config.source_config())?;
    let outcome = run_compare(&client, &args, config).await?;
    report_outcome(&outcome);
    Ok(())
}

/// Handle the send command
pub async fn handle_send(args: SendArgs, config: &AppConfig) -> Result<()> {
    let urls = output::read_url_list(&args.urls).await?;
    if urls.is_empty() {
        println!("No request URLs found in {}", args.urls.display());
        return Ok(());
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| url_list_directory(&args.urls))
        .unwrap_or_else(|| config.output.directory.clone());
    let paths = OutputPaths::for_url_list(&args.urls, &output_dir);

    let client = OoiClient::new(config.client_config(), config.source_config())?
        .with_credentials(require_credentials()?);
    send_batch(&client, &urls, &paths, config, args.yes).await
}

/// Handle the run command: compare, then send what the comparison found
pub async fn handle_run(args: RunArgs, config: &AppConfig) -> Result<()> {
    // Checked up front so a long comparison is not wasted
    let credentials = require_credentials()?;
    let client = OoiClient::new(config.client_config(), config.source_config())?
        .with_credentials(credentials);

    let outcome = run_compare(&client, &args.compare, config).await?;
    report_outcome(&outcome);

    match outcome {
        PipelineOutcome::Ready { paths, batch, .. } => {
            send_batch(&client, &batch.urls(), &paths, config, args.yes).await
        }
        PipelineOutcome::NoOverlap { .. } => Ok(()),
    }
}

/// Handle authentication commands
pub async fn handle_auth(args: AuthArgs) -> Result<()> {
    match args.action {
        AuthAction::Setup { force } => {
            if force || !check_credentials() {
                setup_credentials()?;
            } else {
                println!("✅ Credentials already configured. Use --force to update.");
            }
        }
        AuthAction::Status => show_auth_status(),
        AuthAction::Clear => {
            println!("🗑️  Clearing stored credentials...");
            clear_credentials()?;
        }
    }

    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = AppConfig::init(path, force).await?;
            println!("✅ Wrote default configuration to {}", path.display());
        }
        ConfigAction::Show => print!("{}", config.to_toml()?),
    }
    Ok(())
}

/// Build the pipeline configuration from flags and the config file
fn pipeline_config(args: &CompareArgs, config: &AppConfig) -> Result<PipelineConfig> {
    let settings = config.request_settings();
    Ok(PipelineConfig {
        output_directory: args
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output.directory.clone()),
        credentials: None,
        selection_criteria: args.criteria(),
        time_bounds: args.time_bounds()?,
        enrich_regions: config.requests.enrich_regions && !args.no_regions,
        include_annotations: settings.include_annotations && !args.no_annotations,
        base_endpoint: settings.base_endpoint,
        run_stamp: None,
    })
}

async fn run_compare(
    client: &OoiClient,
    args: &CompareArgs,
    config: &AppConfig,
) -> Result<PipelineOutcome> {
    let mut pipeline = pipeline_config(args, config)?;

    if !args.interactive {
        let comparing = start_spinner("Comparing the QC Database with the live data catalog...");
        let result = compare(client, &pipeline).await;
        comparing.finish_and_clear();
        return result;
    }

    if args.has_selection() {
        warn!("Selection flags are ignored in interactive mode");
    }

    let fetching = start_spinner("Fetching the QC Database...");
    let prefetched = Prefetched::fetch(client, pipeline.enrich_regions).await;
    fetching.finish_and_clear();
    let prefetched = prefetched?;

    pipeline.selection_criteria = prompt_selection(&prefetched.records()?)?;
    if args.begin.is_none() && args.end.is_none() {
        pipeline.time_bounds = prompt_time_bounds()?;
    }

    let comparing = start_spinner("Comparing with the live data catalog...");
    let result = compare(&prefetched, &pipeline).await;
    comparing.finish_and_clear();
    result
}

fn report_outcome(outcome: &PipelineOutcome) {
    let counts = outcome.counts();
    println!();
    println!("📊 Comparison");
    println!("  In both catalogs:         {}", counts.both);
    println!("  Only in the QC Database:  {}", counts.qcdb_only);
    println!("  Only in the live catalog: {}", counts.catalog_only);
    println!("  Written to {}", outcome.comparison_path().display());

    match outcome {
        PipelineOutcome::Ready { paths, batch, .. } => {
            println!();
            println!(
                "📝 {} data requests written to {}",
                batch.len(),
                paths.request_urls.display()
            );
            if !batch.adjustments.is_empty() {
                println!(
                    "  {} time bounds were moved inside the available data range",
                    batch.adjustments.len()
                );
            }
        }
        PipelineOutcome::NoOverlap { .. } => {
            println!();
            println!("No selected stream is listed in both the QC Database and the live data catalog.");
            println!("There is nothing to request. Check the comparison file for what each source lists.");
        }
    }
}

async fn send_batch(
    client: &OoiClient,
    urls: &[String],
    paths: &OutputPaths,
    config: &AppConfig,
    assume_yes: bool,
) -> Result<()> {
    if urls.is_empty() {
        println!("No science streams to request.");
        return Ok(());
    }

    let question = format!(
        "There are {} requests to send, are you sure you want to continue?",
        urls.len()
    );
    if !assume_yes && !confirm(&question)? {
        println!("Cancelled. The request URLs remain in {}", paths.request_urls.display());
        return Ok(());
    }

    let progress = ProgressBar::new(urls.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));

    let dispatcher = Dispatcher::new(client, config.dispatch_config());
    let result = dispatcher
        .dispatch_with_progress(urls, paths, |i, outcome| {
            progress.set_position(i as u64 + 1);
            progress.set_message(outcome.status.clone());
        })
        .await;
    progress.finish_and_clear();
    let summary = result?;

    info!("Dispatch finished in {:.2?}", summary.elapsed);
    println!();
    println!(
        "📨 Sent {} requests: {} accepted, {} failed, {} resends",
        summary.sent, summary.succeeded, summary.failed, summary.retries
    );
    println!("  Summary written to {}", paths.summary.display());
    Ok(())
}

fn require_credentials() -> Result<crate::auth::Credentials> {
    load_credentials().map_err(|e| match e {
        AuthError::MissingCredentials => {
            println!("⚠️  No OOI API credentials found.");
            println!("   Run 'ooi_requests auth setup' to configure them.");
            AppError::Auth(e)
        }
        other => AppError::Auth(other),
    })
}

fn url_list_directory(urls: &Path) -> Option<PathBuf> {
    urls.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

fn start_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["◐", "◓", "◑", "◒"]),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
