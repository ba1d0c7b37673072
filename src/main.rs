// src/main.rs
use check_service_certs::cli::Cli;
use check_service_certs::config::Config;
use check_service_certs::notify::sinks_from_config;
use check_service_certs::pipeline::{run_pipeline, RunOptions};
use check_service_certs::service::discover_services;
use check_service_certs::template::AlertTemplate;
use check_service_certs::logging;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", Cli::version_string());
        return Ok(());
    }

    cli.validate()?;

    // Only configuration problems are fatal
    let (config, config_path) = Config::locate_and_load(cli.configfile.as_deref().map(Path::new))?;

    let log_level = cli
        .log_level_override()
        .unwrap_or(config.logging.level.as_str());
    logging::init(log_level, config.global.logfile.as_deref())?;

    tracing::info!("Using config file {}", config_path.display());
    if cli.test {
        tracing::info!("Running in test mode");
    }

    let config = Arc::new(config);
    let services = discover_services(Arc::clone(&config), cli.service.as_deref()).await;
    tracing::info!("Checking {} services", services.len());

    let sinks = sinks_from_config(&config, cli.test);
    let renderer = Arc::new(AlertTemplate::from_config(config.global.template.clone()));
    let options = RunOptions::new(config.run_timeout(), cli.test);

    run_pipeline(services, sinks, renderer, options).await;

    Ok(())
}
