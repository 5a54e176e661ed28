//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}


#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from(["adsretry", "schedule", "--config", "/tmp/a.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/a.toml")));
    assert!(matches!(cli.command, CliCommand::Schedule { seed: None }));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["adsretry", "retry-forever"]).is_err());
}
