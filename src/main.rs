//! Provisioner CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use provisioner::cli::{Cli, CommandDispatcher, Commands};
use provisioner::config::load_config;
use provisioner::logging::init_tracing;
use provisioner::shell::{install_handler, is_ci, is_elevated};
use provisioner::ui::{create_ui, OutputMode};

/// Commands that change the machine and need an elevated console.
fn needs_elevation(cli: &Cli) -> bool {
    matches!(
        cli.command,
        None | Some(Commands::Run(_)) | Some(Commands::Identity(_)) | Some(Commands::Update(_))
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    // Best effort: a broken config is reported by the command itself.
    let configured_dir = load_config(cli.config.as_deref())
        .ok()
        .and_then(|loaded| loaded.config.logging.dir);
    let log = init_tracing(cli.debug, cli.log_dir.as_deref().or(configured_dir.as_deref()));

    tracing::debug!("Provisioner starting with args: {:?}", cli);
    install_handler();

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let is_interactive = !cli.is_unattended() && !is_ci();
    let mut ui = create_ui(is_interactive, output_mode);

    if cfg!(windows) && needs_elevation(&cli) && !is_elevated() {
        ui.error("Administrator rights are required. Re-run from an elevated prompt.");
        return ExitCode::from(1);
    }

    let dispatcher = CommandDispatcher::new(cli.config.clone());
    let code = match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => result.exit_code,
        Err(e) => {
            tracing::error!("{}", e);
            ui.error(&format!("Error: {}", e));
            1
        }
    };

    if let Some(path) = log.path() {
        if matches!(
            cli.command,
            None | Some(Commands::Run(_)) | Some(Commands::Identity(_))
        ) {
            ui.message(&format!("Log file: {}", path.display()));
        }
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
