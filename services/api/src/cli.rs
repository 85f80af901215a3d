use crate::evaluate::{run_evaluate, EvaluateArgs};
use crate::screening::{run_notify, run_score, NotifyArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_offers::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Offer Scoring",
    about = "Serve, query, and evaluate the personal-loan acceptance model",
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
    /// Interactively screen an applicant against a running scoring service
    Score(ScoreArgs),
    /// Send an offer email for a tier without scoring
    Notify(NotifyArgs),
    /// Report recall, precision, and accuracy per tier on a labeled test set
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args).await,
        Command::Notify(args) => run_notify(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}
