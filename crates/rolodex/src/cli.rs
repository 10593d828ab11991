//! Clap derive structures for the `rolodex` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use rolodex_core::{EditTarget, FieldValue, RecordId};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rolodex -- keep track of friends and their favorite languages
#[derive(Debug, Parser)]
#[command(
    name = "rolodex",
    version,
    about = "Manage friends and programming languages from the command line",
    long_about = "A small address book.\n\n\
        Every edit runs through the same editing workspace as the interactive\n\
        shell: records are validated before anything is written.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Dataset file (overrides the configured one)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Output format (defaults to the configured one)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage friends
    #[command(alias = "f")]
    Friends(FriendsArgs),

    /// Manage programming languages
    #[command(alias = "lang", alias = "l")]
    Languages(LanguagesArgs),

    /// Interactive editing shell
    Shell,

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Friends ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FriendsArgs {
    #[command(subcommand)]
    pub command: FriendsCommand,
}

#[derive(Debug, Subcommand)]
pub enum FriendsCommand {
    /// List friends
    #[command(alias = "ls")]
    List,

    /// Show one friend
    Show { id: RecordId },

    /// Create a friend
    Add {
        #[command(flatten)]
        fields: FriendFields,

        /// Phone number (repeatable)
        #[arg(long = "phone", value_name = "NUMBER")]
        phones: Vec<String>,
    },

    /// Change an existing friend
    Edit {
        id: RecordId,

        #[command(flatten)]
        fields: FriendFields,

        /// Add a phone number (repeatable)
        #[arg(long = "add-phone", value_name = "NUMBER")]
        add_phones: Vec<String>,

        /// Remove the phone number at this position (repeatable, 0-based)
        #[arg(long = "remove-phone", value_name = "INDEX")]
        remove_phones: Vec<usize>,
    },

    /// Delete a friend
    #[command(alias = "rm")]
    Delete { id: RecordId },
}

/// Field values shared by `add` and `edit`. Unset flags leave the field
/// untouched; an empty string clears an optional field.
#[derive(Debug, Default, Args)]
pub struct FriendFields {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Favorite language id, or "none"
    #[arg(long, value_name = "ID")]
    pub favorite_language: Option<String>,
}

impl FriendFields {
    pub fn edits(&self) -> Vec<(EditTarget, FieldValue)> {
        let mut edits = Vec::new();
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("email", &self.email),
        ] {
            if let Some(value) = value {
                edits.push((EditTarget::root(field), FieldValue::text(value.as_str())));
            }
        }
        if let Some(language) = &self.favorite_language {
            let value = if language.eq_ignore_ascii_case("none") {
                FieldValue::Empty
            } else {
                FieldValue::text(language.as_str())
            };
            edits.push((EditTarget::root("favorite_language_id"), value));
        }
        edits
    }
}

// ── Languages ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LanguagesArgs {
    #[command(subcommand)]
    pub command: LanguagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum LanguagesCommand {
    /// List programming languages
    #[command(alias = "ls")]
    List,

    /// Add a programming language
    Add { name: String },

    /// Rename a programming language
    Rename { id: RecordId, name: String },

    /// Remove a programming language
    #[command(alias = "rm")]
    Remove { id: RecordId },
}

// ── Config / completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
