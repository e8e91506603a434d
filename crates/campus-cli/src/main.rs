//! Campus CLI tool.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Campus school site tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a site configuration
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "campus.kdl")]
        path: String,
    },
    /// Run database migrations
    Migrate {
        /// Path to the configuration file
        #[arg(long, env = "CAMPUS_CONFIG", default_value = "campus.kdl")]
        config: String,
    },
    /// Crawl the public site and rebuild the search index
    Crawl {
        /// Path to the configuration file
        #[arg(long, env = "CAMPUS_CONFIG", default_value = "campus.kdl")]
        config: String,
        /// Print the documents instead of writing the index
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Migrate { config } => {
            commands::migrate(&config).await?;
        }
        Commands::Crawl { config, dry_run } => {
            commands::crawl(&config, dry_run).await?;
        }
    }

    Ok(())
}
