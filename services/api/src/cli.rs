use crate::demo::{run_decide, run_demo, DecideArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use kyc_onboarding::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "KYC Onboarding Engine",
    about = "Run or demonstrate the KYC onboarding decision engine from the command line",
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
    /// Walk a simulated customer through every wizard stage
    Demo(DemoArgs),
    /// Decide a finished case read from a final-decision JSON file
    Decide(DecideArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Decide(args) => run_decide(args),
    }
}
