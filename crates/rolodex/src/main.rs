mod cli;
mod commands;
mod dialog;
mod error;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::CliError;
use crate::session::Session;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need the dataset
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "rolodex", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let config = rolodex_config::load_config(cli.global.config.as_deref())?;
            let ctx = Context::resolve(&cli.global, &config)?;
            let data_file = cli
                .global
                .data_file
                .clone()
                .unwrap_or_else(|| config.data_file_path());
            let dialog = dialog::for_options(cli.global.yes, config.defaults.confirm);

            let mut session =
                Session::start(data_file, dialog, config.to_workspace_config()).await?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &mut session, &ctx).await
        }
    }
}
