use livedata_runner::{LiveDataNode, RunnerConfig};
use std::time::Duration;

fn print_help() {
    eprintln!(
        r#"Live data node - distribution server over a simulated feed

USAGE:
    livedata-node [OPTIONS] [CONFIG]

ARGS:
    <CONFIG>            JSON configuration file (defaults are used when omitted)

OPTIONS:
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    for arg in &args[1..] {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            path if config_path.is_none() && !path.starts_with('-') => {
                config_path = Some(path.to_string());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            RunnerConfig::from_file(&path)?
        }
        None => {
            log::info!("Using default configuration");
            RunnerConfig::default()
        }
    };
    let run_duration = config.run_duration_secs;

    let node = LiveDataNode::bootstrap(config).await?;
    log::info!(
        "Node running with {} startup subscriptions",
        node.startup_responses()
            .iter()
            .filter(|r| r.is_success())
            .count()
    );

    if run_duration == 0 {
        tokio::signal::ctrl_c().await?;
        log::info!("Interrupted, shutting down");
    } else {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(run_duration)) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                log::info!("Interrupted, shutting down");
            }
        }
    }

    let stats = node.shutdown().await?;
    log::info!("Final statistics: {}", stats);
    Ok(())
}
