//! Programming-language command handlers.
//!
//! Languages are edited as one list workspace; single-record commands
//! open it, change one child and save.

use tabled::Tabled;

use rolodex_core::{EditTarget, EntityKind, FieldValue, NavigationItem, WorkspaceConfig};

use crate::cli::{LanguagesArgs, LanguagesCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

use super::Context;

const KIND: EntityKind = EntityKind::ProgrammingLanguage;

#[derive(Tabled)]
struct LanguageRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&NavigationItem> for LanguageRow {
    fn from(item: &NavigationItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.display_label.clone(),
        }
    }
}

fn name_of(index: usize) -> EditTarget {
    EditTarget::child(index, "name")
}

pub async fn handle(
    session: &mut Session,
    args: LanguagesArgs,
    ctx: &Context,
) -> Result<(), CliError> {
    match args.command {
        LanguagesCommand::List => {
            let items = session.list(KIND);
            let out = output::render_list(
                ctx.output,
                &items,
                |i| LanguageRow::from(i),
                |i| i.id.to_string(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        LanguagesCommand::Add { name } => {
            let workspace = session.open_required(KIND, None).await?;
            let index = workspace.add_child()?;
            workspace.set_field(&name_of(index), FieldValue::text(name))?;
            session.save().await?;
            print_language(session, index, "created", ctx)
        }

        LanguagesCommand::Rename { id, name } => {
            session.open_required(KIND, None).await?;
            let index = session.child_index(KIND, id)?;
            session.apply(vec![(name_of(index), FieldValue::text(name))])?;
            let verb = if session.save().await? { "renamed" } else { "unchanged" };
            print_language(session, index, verb, ctx)
        }

        LanguagesCommand::Remove { id } => {
            session.open_required(KIND, None).await?;
            let index = session.child_index(KIND, id)?;
            let label = session
                .list(KIND)
                .into_iter()
                .find(|item| item.id == id)
                .map_or_else(|| id.to_string(), |item| item.display_label);

            if !session.confirm(&WorkspaceConfig::delete_message(&label)) {
                output::notice("Remove cancelled", ctx.quiet);
                return Ok(());
            }
            let workspace = session.active_mut()?;
            workspace.select_child(Some(index))?;
            workspace.remove_child()?;
            session.save().await?;
            output::notice(&format!("Language {id} removed"), ctx.quiet);
            Ok(())
        }
    }
}

fn print_language(
    session: &Session,
    index: usize,
    verb: &str,
    ctx: &Context,
) -> Result<(), CliError> {
    let view = session.active()?.view();
    let child = view
        .children
        .iter()
        .find(|child| child.index == index)
        .ok_or(CliError::NoWorkspace)?;
    let item = NavigationItem {
        id: child.id,
        display_label: child
            .fields
            .first()
            .map(|field| field.value.to_string())
            .unwrap_or_default(),
    };
    output::notice(&format!("Language {} {verb}", item.id), ctx.quiet);

    let out = output::render_single(
        ctx.output,
        &item,
        |i| format!("{}  {}", i.id, i.display_label),
        |i| i.id.to_string(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
