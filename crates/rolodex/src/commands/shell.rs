//! Interactive editing shell.
//!
//! Reads one command per line from stdin and drives the same session the
//! one-shot commands use. Errors are reported and the loop continues.

use std::io::{self, BufRead, IsTerminal, Write};

use rolodex_core::{DeleteOutcome, EditTarget, EntityKind, FieldValue, NavigationOutcome, RecordId};

use crate::error::CliError;
use crate::output;
use crate::session::Session;

use super::Context;

const HELP: &str = "\
commands:
  list [friends|languages]     list records
  open friend <id>|new         edit a friend
  open languages               edit the language list
  set <field> <value>          set a field, e.g. `set first-name Ada`
  set <n>.<field> <value>      set a child field, e.g. `set 0.number 555-0100`
  add                          add a child (phone number / language)
  select <n>|none              select a child
  remove                       remove the selected child
  save | delete | show | close
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List(EntityKind),
    Open(EntityKind, Option<RecordId>),
    Set(EditTarget, FieldValue),
    Add,
    Select(Option<usize>),
    Remove,
    Save,
    Delete,
    Show,
    Close,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, CliError> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(Self::List(match rest {
                "" | "friends" => EntityKind::Friend,
                "languages" => EntityKind::ProgrammingLanguage,
                other => return Err(CliError::usage(format!("cannot list '{other}'"))),
            })),
            "open" => parse_open(rest),
            "set" => {
                let (target, value) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(t, v)| (t, v.trim()));
                if target.is_empty() {
                    return Err(CliError::usage("usage: set <field> <value>"));
                }
                Ok(Self::Set(EditTarget::parse(target), FieldValue::text(value)))
            }
            "add" => Ok(Self::Add),
            "select" => match rest {
                "none" | "" => Ok(Self::Select(None)),
                n => n
                    .parse()
                    .map(|n| Self::Select(Some(n)))
                    .map_err(|_| CliError::usage(format!("'{n}' is not a child index"))),
            },
            "remove" | "rm" => Ok(Self::Remove),
            "save" => Ok(Self::Save),
            "delete" => Ok(Self::Delete),
            "show" => Ok(Self::Show),
            "close" => Ok(Self::Close),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CliError::usage(format!(
                "unknown command '{other}' (try `help`)"
            ))),
        }
    }
}

fn parse_open(rest: &str) -> Result<ShellCommand, CliError> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some("languages" | "language"), None) => {
            Ok(ShellCommand::Open(EntityKind::ProgrammingLanguage, None))
        }
        (Some("friend"), Some("new")) => Ok(ShellCommand::Open(EntityKind::Friend, None)),
        (Some("friend"), Some(id)) => id
            .parse()
            .map(|id| ShellCommand::Open(EntityKind::Friend, Some(id)))
            .map_err(|_| CliError::usage(format!("'{id}' is not a record id"))),
        _ => Err(CliError::usage(
            "usage: open friend <id>|new, or open languages",
        )),
    }
}

pub async fn run(session: &mut Session, ctx: &Context) -> Result<(), CliError> {
    let interactive = io::stdin().is_terminal();
    let mut line = String::new();

    loop {
        if interactive {
            eprint!("rolodex> ");
            io::stderr().flush()?;
        }
        line.clear();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let result = match ShellCommand::parse(&line) {
            Ok(ShellCommand::Quit) => {
                if session.close() == NavigationOutcome::Declined {
                    output::notice("Kept the open record", ctx.quiet);
                    continue;
                }
                break;
            }
            Ok(command) => execute(session, command, ctx).await,
            Err(e) => Err(e),
        };
        if let Err(err) = result {
            eprintln!("{:?}", miette::Report::new(err));
        }
    }
    Ok(())
}

async fn execute(session: &mut Session, command: ShellCommand, ctx: &Context) -> Result<(), CliError> {
    match command {
        ShellCommand::List(kind) => {
            let lines: Vec<String> = session
                .list(kind)
                .into_iter()
                .map(|item| format!("{:>4}  {}", item.id, item.display_label))
                .collect();
            output::print_output(&lines.join("\n"), ctx.quiet);
        }
        ShellCommand::Open(kind, id) => match session.open(kind, id).await? {
            NavigationOutcome::Declined => {
                output::notice("Kept the open record (unsaved changes)", ctx.quiet);
            }
            _ => super::print_workspace(session, ctx)?,
        },
        ShellCommand::Set(target, value) => {
            let workspace = session.active_mut()?;
            workspace.set_field(&target, value)?;
            let wanted = target.to_string().replace('-', "_").to_ascii_lowercase();
            for (error_target, message) in workspace.view().errors() {
                if error_target == wanted {
                    output::notice(&format!("{error_target}: {message}"), ctx.quiet);
                }
            }
        }
        ShellCommand::Add => {
            let index = session.active_mut()?.add_child()?;
            output::notice(&format!("Added child {index}"), ctx.quiet);
        }
        ShellCommand::Select(index) => session.active_mut()?.select_child(index)?,
        ShellCommand::Remove => session.active_mut()?.remove_child()?,
        ShellCommand::Save => {
            let message = if session.save().await? { "Saved" } else { "No changes" };
            output::notice(message, ctx.quiet);
        }
        ShellCommand::Delete => {
            let message = match session.delete().await? {
                DeleteOutcome::Deleted => "Deleted",
                DeleteOutcome::Cancelled => "Delete cancelled",
            };
            output::notice(message, ctx.quiet);
        }
        ShellCommand::Show => super::print_workspace(session, ctx)?,
        ShellCommand::Close => {
            if session.close() == NavigationOutcome::Declined {
                output::notice("Kept the open record (unsaved changes)", ctx.quiet);
            }
        }
        ShellCommand::Help => output::print_output(HELP, ctx.quiet),
        ShellCommand::Quit => {}
    }
    Ok(())
}
