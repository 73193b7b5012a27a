use crate::commands::{run_batch, run_catalog, run_estimate, BatchArgs, EstimateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use home_price::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Home Price Estimator",
    about = "Serve and query residential price estimates from trained artifacts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Estimate a single property price from the command line
    Estimate(EstimateArgs),
    /// List the localities and property types the model knows about
    Catalog(ArtifactArgs),
    /// Score a CSV file of properties and write the estimates to stdout
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) artifacts: ArtifactArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ArtifactArgs {
    /// Directory containing the column list and model artifacts
    #[arg(long)]
    pub(crate) artifacts_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate(args) => run_estimate(args),
        Command::Catalog(args) => run_catalog(args),
        Command::Batch(args) => run_batch(args),
    }
}
