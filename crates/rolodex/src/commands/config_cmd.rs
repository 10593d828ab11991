//! Config subcommand handlers.

use rolodex_config as config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = global.config.clone().unwrap_or_else(config::config_path);
    match args.command {
        ConfigCommand::Show => {
            let mut cfg = config::load_config(Some(path.as_path()))?;
            if let Some(data_file) = &global.data_file {
                cfg.data_file = Some(data_file.clone());
            }
            cfg.data_file = Some(cfg.data_file_path());
            output::print_output(config::render_toml(&cfg)?.trim_end(), global.quiet);
        }
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
        }
    }
    Ok(())
}
