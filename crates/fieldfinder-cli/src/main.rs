mod alerts;
mod regions;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::alerts::AlertsCommands;
use crate::regions::RegionsCommands;
use crate::search::{AreaArgs, ProximityArgs};

#[derive(Debug, Parser)]
#[command(name = "fieldfinder")]
#[command(about = "Find football vacancies and available players by radius or drawn area")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search within a radius of a centre point
    Search(ProximityArgs),
    /// Search inside an area traced vertex by vertex
    SearchArea(AreaArgs),
    /// Manage saved regions
    Regions {
        #[command(subcommand)]
        command: RegionsCommands,
    },
    /// Manage alert subscriptions (requires FIELDFINDER_API_TOKEN)
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("no command given; run `fieldfinder --help`");
        return Ok(());
    };

    let config = fieldfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, "configuration loaded");

    match command {
        Commands::Search(args) => search::run_search(&config, &args).await,
        Commands::SearchArea(args) => search::run_search_area(&config, &args).await,
        Commands::Regions { command } => regions::run(&config, command).await,
        Commands::Alerts { command } => alerts::run(&config, command).await,
    }
}
