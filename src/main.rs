use anyhow::Result;
use clap::{Parser, Subcommand};

/// mealview - meal plan dashboard
#[derive(Parser)]
#[command(name = "mealview")]
#[command(about = "Browse and manage meal plans from the meal plan API", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = mealview::Config::load(cli.config)?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    mealview::observability::init_observability(
        "mealview",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    match cli.command {
        Commands::Serve { host, port } => mealview::server::serve(config, host, port).await,
    }
}
