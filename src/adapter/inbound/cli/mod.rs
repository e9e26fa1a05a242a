//! Operator command line.

pub mod attempts;
pub mod check;
pub mod command;
pub mod image;
pub mod output;
pub mod run;

use command::{AttemptsCommand, CheckCommand, Cli, Commands, ImageCommand};

use crate::error::Result;

/// Dispatch a parsed command line.
///
/// # Errors
/// Returns whatever the selected command fails with.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(CheckCommand::Config(args)) => check::execute_config(&args.config),
        Commands::Image(ImageCommand::Register(args)) => image::register(&args).await,
        Commands::Attempts(AttemptsCommand::List(args)) => attempts::list(&args).await,
    }
}
