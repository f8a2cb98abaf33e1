pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod watch;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config, prometheus_handle).await,

        "refresh" | "check" | "-c" => run_single_refresh(config).await,

        "export" | "e" => {
            if args.len() < 3 {
                println!("Usage: trackarr export <profile> [path]");
                println!("Example: trackarr export Default watched.json");
                return Ok(());
            }
            let profile = &args[2];
            let path = args.get(3).map(String::as_str);
            cmd_export(&config, profile, path).await
        }

        "import" | "i" => {
            if args.len() < 4 {
                println!("Usage: trackarr import <profile> <path>");
                println!("Example: trackarr import Default watched.json");
                return Ok(());
            }
            let profile = &args[2];
            let path = &args[3];
            cmd_import(&config, profile, path).await
        }

        "profiles" | "ls" => cmd_profiles(&config).await,

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Trackarr - Episode Watch Tracker");
    println!("Tracks per-profile watch progress against an external catalog");
    println!();
    println!("USAGE:");
    println!("  trackarr <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  daemon              Run the API server with the refresh scheduler");
    println!("  refresh             Run a single catalog refresh pass");
    println!("  export <profile> [path]");
    println!("                      Export a profile's watch data (stdout if no path)");
    println!("  import <profile> <path>");
    println!("                      Import watch data into a profile");
    println!("  profiles            List viewer profiles");
    println!("  init                Create default config file");
    println!("  help                Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  trackarr daemon                    # Start the service");
    println!("  trackarr export Default out.json   # Back up watch history");
    println!("  trackarr import Default out.json   # Restore it elsewhere");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the catalog, scheduler, and server.");
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Trackarr v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let api_state = api::create_app_state(shared.clone(), prometheus_handle);

    let scheduler = Scheduler::new(shared.clone(), config.scheduler.clone());
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state);
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("🌐 Web Server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

async fn run_single_refresh(config: Config) -> anyhow::Result<()> {
    info!("Running single refresh...");

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let scheduler = Scheduler::new(shared, config.scheduler.clone());

    scheduler.run_once().await?;

    info!("Refresh complete");
    Ok(())
}

async fn resolve_profile(
    shared: &SharedState,
    profile: &str,
) -> anyhow::Result<crate::db::Profile> {
    if let Ok(id) = profile.parse::<i32>()
        && let Some(found) = shared.store.get_profile(id).await?
    {
        return Ok(found);
    }

    shared
        .store
        .get_profile_by_name(profile)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Profile '{profile}' not found"))
}

async fn cmd_export(config: &Config, profile: &str, path: Option<&str>) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let profile = resolve_profile(&shared, profile).await?;

    let document = shared
        .transfer
        .export(profile.id)
        .await
        .map_err(|e| anyhow::anyhow!("Export failed: {e}"))?;
    let json = serde_json::to_string_pretty(&document)?;

    match path {
        Some(path) => {
            tokio::fs::write(path, &json).await?;
            println!(
                "✓ Exported {} shows for '{}' to {}",
                document.shows.len(),
                profile.name,
                path
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn cmd_import(config: &Config, profile: &str, path: &str) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let profile = resolve_profile(&shared, profile).await?;

    let input = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read import file: {path}"))?;

    let summary = shared
        .transfer
        .import(profile.id, &input)
        .await
        .map_err(|e| anyhow::anyhow!("Import failed: {e}"))?;

    println!("Import complete for '{}':", profile.name);
    println!("  Shows:    {}", summary.shows);
    println!("  Episodes: {}", summary.watched_episodes);
    if summary.skipped_shows > 0 || summary.skipped_episodes > 0 {
        println!(
            "  Skipped:  {} shows, {} episodes",
            summary.skipped_shows, summary.skipped_episodes
        );
    }

    Ok(())
}

async fn cmd_profiles(config: &Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let profiles = shared.store.list_all_profiles().await?;

    if profiles.is_empty() {
        println!("No profiles found.");
        return Ok(());
    }

    println!("Profiles ({} total)", profiles.len());
    println!("{:-<50}", "");
    for profile in profiles {
        println!("• {} (ID: {})", profile.name, profile.id);
        println!("  Created: {}", profile.created_at);
    }

    Ok(())
}
