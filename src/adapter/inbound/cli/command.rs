//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Message-driven orchestrator for per-participant challenge workloads
#[derive(Parser, Debug)]
#[command(name = "proctor")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consume lifecycle commands until interrupted
    Run(ConfigPathArg),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),

    /// Manage image records
    #[command(subcommand)]
    Image(ImageCommand),

    /// Inspect attempt records
    #[command(subcommand)]
    Attempts(AttemptsCommand),
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration file and environment overrides.
    Config(ConfigPathArg),
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Register a built image so challenges can reference it.
    Register(ImageRegisterArgs),
}

#[derive(Subcommand, Debug)]
pub enum AttemptsCommand {
    /// List the attempts of one challenge.
    List(AttemptsListArgs),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ImageRegisterArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    #[arg(long)]
    pub creator: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub tag: String,

    /// Registry link, e.g. `https://registry.example.com/team/pwn:v1`.
    #[arg(long)]
    pub link: String,

    /// Correlation id; generated when omitted.
    #[arg(long)]
    pub cor_id: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AttemptsListArgs {
    #[command(flatten)]
    pub config: ConfigPathArg,

    #[arg(long)]
    pub creator: String,

    #[arg(long)]
    pub challenge: String,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_defaults_to_working_directory() {
        let cli = Cli::parse_from(["proctor", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn image_register_takes_optional_cor_id() {
        let cli = Cli::parse_from([
            "proctor", "image", "register", "--creator", "alice", "--name", "pwn", "--tag", "v1",
            "--link", "https://r.example.com/pwn:v1", "--json",
        ]);
        assert!(cli.json);
        let Commands::Image(ImageCommand::Register(args)) = cli.command else {
            panic!("expected image register");
        };
        assert_eq!(args.creator, "alice");
        assert!(args.cor_id.is_none());
    }
}
