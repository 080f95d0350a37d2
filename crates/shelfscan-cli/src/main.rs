mod browser;
mod extract;
mod navigate;
mod offline;
mod output;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Harvest the product inventory of a web dashboard into JSON")]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, global = true, env = "SHELFSCAN_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in, load every product and write them as JSON (the default)
    Extract {
        /// Output file; defaults to `SHELFSCAN_OUTPUT_PATH`
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Run the text-blob strategy on a saved page text
    ParseText {
        file: PathBuf,
        /// Opening phrase of the page header to strip
        #[arg(
            long,
            env = "SHELFSCAN_CHROME_HEADER_START",
            default_value = "Product Inventory"
        )]
        header_start: String,
        /// Write records here instead of printing them
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge two session state files, the second winning on conflicts
    MergeState {
        previous: PathBuf,
        fresh: PathBuf,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    run(cli.command.unwrap_or(Commands::Extract { output: None })).await
}

/// Dispatches one command. Only `extract` reads the environment
/// configuration; the offline commands take everything from their flags.
async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Extract { output } => {
            let config = shelfscan_core::load_app_config()?;
            let output = output.unwrap_or_else(|| config.output_path.clone());
            extract::run_extract(&config, &output).await
        }
        Commands::ParseText {
            file,
            header_start,
            output,
        } => offline::run_parse_text(&file, output.as_deref(), &header_start),
        Commands::MergeState {
            previous,
            fresh,
            output,
        } => offline::run_merge_state(&previous, &fresh, output.as_deref()),
    }
}
