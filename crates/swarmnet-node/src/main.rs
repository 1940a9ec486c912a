mod config;
mod dev_adapters;
mod epoch_loop;
mod service;
mod shutdown;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use service::NodeService;
use shutdown::wait_for_shutdown_signal;
use tracing::info;

#[derive(Parser)]
#[clap(name = "swarmnet-node")]
#[clap(author, version, about = "Epoch-driven consensus and incentives node for a decentralized model-serving swarm", long_about = None)]
struct Cli {
    /// Configuration file path
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node
    Start,

    /// Initialize a new node configuration
    Init {
        #[clap(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Show node version
    Version,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { output }) => init_config(&output)?,
        Some(Commands::Version) => show_version(),
        Some(Commands::Start) | None => start_node(&cli.config).await?,
    }

    Ok(())
}

fn init_config(output: &str) -> Result<()> {
    let config = Config::default();
    config.to_file(output)?;
    println!("Configuration file created: {output}");
    println!("Edit the configuration and run: swarmnet-node start");
    Ok(())
}

fn show_version() {
    println!("swarmnet-node {}", env!("CARGO_PKG_VERSION"));
}

async fn start_node(config_path: &str) -> Result<()> {
    let config = if std::path::Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        info!("configuration file not found, using defaults");
        Config::default()
    };

    init_logging(&config)?;

    let service = NodeService::new(config).await?;

    let handler = service.shutdown_handler();
    let run = service.run();
    tokio::pin!(run);

    tokio::select! {
        state = &mut run => {
            info!(?state, "epoch loop exited");
        }
        _ = wait_for_shutdown_signal() => {
            handler.shutdown();
            run.await;
        }
    }

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();

    Ok(())
}
