//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::OfficeEdition;

/// Post-install provisioning for Windows workstations.
#[derive(Debug, Parser)]
#[command(name = "provisioner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (default: provisioner.yml next to the executable)
    #[arg(short, long, global = true, env = "PROVISIONER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory for the run log (overrides logging.dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Whether the selected command must run without prompts.
    pub fn is_unattended(&self) -> bool {
        match &self.command {
            Some(Commands::Run(args)) => args.non_interactive || args.profile.is_some(),
            Some(Commands::Identity(args)) => args.non_interactive || args.profile.is_some(),
            _ => false,
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install software and configure the machine (default if no command specified)
    Run(RunArgs),

    /// Rename the machine and join the domain
    Identity(IdentityArgs),

    /// Show the install plan without running it
    List(ListArgs),

    /// Check network paths, winget and internet access
    Diagnose(DiagnoseArgs),

    /// Update the provisioner from the release share
    Update(UpdateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Take unattended parameters from a configured profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Skip specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Office edition to install
    #[arg(long, value_enum)]
    pub office: Option<OfficeEdition>,

    /// Never prompt; fail instead
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the `identity` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct IdentityArgs {
    /// New computer name (NetBIOS, up to 15 characters)
    #[arg(long)]
    pub hostname: Option<String>,

    /// Domain to join (default: default_domain from the config)
    #[arg(long)]
    pub domain: Option<String>,

    /// Domain account allowed to join machines
    #[arg(long)]
    pub admin_user: Option<String>,

    /// Restart after joining
    #[arg(long)]
    pub reboot: bool,

    /// Take unattended parameters from a configured profile
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Never prompt; fail instead
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Mark the steps a profile skips
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `diagnose` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DiagnoseArgs {
    /// Skip the internet reachability check
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the `update` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UpdateArgs {
    /// Only report whether an update is available
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_skip_list_and_office() {
        let cli = Cli::parse_from([
            "provisioner",
            "run",
            "--skip",
            "office,anydesk",
            "--office",
            "none",
        ]);

        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.skip, vec!["office", "anydesk"]);
        assert_eq!(args.office, Some(OfficeEdition::Skip));
    }

    #[test]
    fn profile_makes_run_unattended() {
        let cli = Cli::parse_from(["provisioner", "run", "--profile", "lab"]);
        assert!(cli.is_unattended());

        let cli = Cli::parse_from(["provisioner", "list"]);
        assert!(!cli.is_unattended());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["provisioner", "diagnose", "--debug", "--log-dir", "logs"]);
        assert!(cli.debug);
        assert_eq!(cli.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn identity_arguments() {
        let cli = Cli::parse_from([
            "provisioner",
            "identity",
            "--hostname",
            "WS-042",
            "--admin-user",
            r"CORP\admin",
            "--reboot",
        ]);

        let Some(Commands::Identity(args)) = cli.command else {
            panic!("expected identity");
        };
        assert_eq!(args.hostname.as_deref(), Some("WS-042"));
        assert!(args.reboot);
        assert!(args.domain.is_none());
    }
}
