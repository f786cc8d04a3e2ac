//! Bootline - Entry Point
//!
//! Deploys the units listed in a configuration document concurrently and
//! keeps them running until shutdown.

use std::collections::HashMap;
use std::env;

use bootline::app::options::AppOptions;
use bootline::app::run::run;
use bootline::config::{ConfigLoader, Settings};
use bootline::deploy::{total_instances, UnitRegistry};
use bootline::logs::{init_logging, LogOptions};
use bootline::utils::version_info;
use colored::Colorize;

use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "bootline.json";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize version info: {e}"),
        }
        return;
    }

    // Load the configuration document
    let config_path = cli_args
        .get("config")
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = match ConfigLoader::new(&config_path).load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load configuration {}: {}", config_path, e);
            std::process::exit(2);
        }
    };

    let registry = UnitRegistry::with_builtins();

    // Print the deployment plan and exit
    if cli_args.contains_key("check") {
        let ok = print_plan(&settings, &registry);
        std::process::exit(if ok { 0 } else { 1 });
    }

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        log_dir: settings.log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = AppOptions::from(&settings);
    info!(
        "Running bootline {} ({}) with options: {:?}",
        version.version, version.git_hash, options
    );

    if let Err(e) = run(options, registry, await_shutdown_signal()).await {
        error!("Bootline exited with error: {e}");
        std::process::exit(1);
    }
}

fn print_plan(settings: &Settings, registry: &UnitRegistry) -> bool {
    let mut ok = true;
    let total = match total_instances(&settings.units) {
        Ok(total) => total.to_string(),
        Err(e) => {
            ok = false;
            e.to_string().red().to_string()
        }
    };
    println!(
        "{} {} deployment(s), abortOnFailure={}",
        "Plan:".bold(),
        total,
        settings.abort_on_failure
    );

    for spec in &settings.units {
        let status = if registry.contains(spec.kind()) {
            "ok".green()
        } else {
            ok = false;
            "unknown kind".red()
        };
        println!(
            "  {:<24} kind={:<12} instances={:<4} {}",
            spec.name,
            spec.kind(),
            spec.instance_count(),
            status
        );
    }
    ok
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Failed to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
