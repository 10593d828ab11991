//! Command dispatch: bridges CLI args -> editing session -> output formatting.

pub mod config_cmd;
pub mod friends;
pub mod languages;
pub mod shell;

use rolodex_config::Config;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::session::Session;

/// Settings every handler needs, resolved from flags and config.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub output: OutputFormat,
    pub quiet: bool,
    pub color: bool,
}

impl Context {
    pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Self, CliError> {
        let output = match global.output {
            Some(format) => format,
            None => <OutputFormat as clap::ValueEnum>::from_str(&config.defaults.output, true)
                .map_err(|reason| CliError::usage(format!("defaults.output: {reason}")))?,
        };
        Ok(Self {
            output,
            quiet: global.quiet,
            color: output == OutputFormat::Table && crate::output::should_color(),
        })
    }
}

/// Dispatch a data-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &mut Session, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Friends(args) => friends::handle(session, args, ctx).await,
        Command::Languages(args) => languages::handle(session, args, ctx).await,
        Command::Shell => shell::run(session, ctx).await,
        Command::Config(_) | Command::Completions(_) => {
            Err(CliError::usage("command does not operate on the dataset"))
        }
    }
}

/// Render the active workspace in the selected format.
pub fn print_workspace(session: &Session, ctx: &Context) -> Result<(), CliError> {
    let view = session.active()?.view();
    let out = crate::output::render_single(
        ctx.output,
        &view,
        |v| crate::output::workspace_detail(v, ctx.color),
        |v| v.id.map(|id| id.to_string()).unwrap_or_default(),
    )?;
    crate::output::print_output(&out, ctx.quiet);
    Ok(())
}
