use crate::commands::{run_check, run_score, CheckArgs, ScoreArgs};
use crate::server;
use badge_scoring::error::AppError;
use badge_scoring::settings::AppConfig;
use badge_scoring::telemetry;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "badge-scoring",
    about = "Score business entities against configured rules and assign priority badges",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP scoring service (default command)
    Serve(ServeArgs),
    /// Score a CSV export and write badges to a new CSV file
    Score(ScoreArgs),
    /// Validate a scoring configuration and list its rules and badges
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Scoring configuration to serve (defaults to SCORING_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = AppConfig::load()?;
    telemetry::init(&settings.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, settings).await,
        Command::Score(args) => run_score(args, &settings),
        Command::Check(args) => run_check(args, &settings),
    }
}
