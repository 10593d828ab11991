//! Friend command handlers.

use std::cmp::Reverse;

use tabled::Tabled;

use rolodex_core::{DeleteOutcome, EditTarget, EntityKind, FieldValue, NavigationItem, RecordId};

use crate::cli::{FriendsArgs, FriendsCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

use super::Context;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FriendRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&NavigationItem> for FriendRow {
    fn from(item: &NavigationItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.display_label.clone(),
        }
    }
}

pub async fn handle(session: &mut Session, args: FriendsArgs, ctx: &Context) -> Result<(), CliError> {
    match args.command {
        FriendsCommand::List => {
            let items = session.list(EntityKind::Friend);
            let out = output::render_list(
                ctx.output,
                &items,
                |i| FriendRow::from(i),
                |i| i.id.to_string(),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        FriendsCommand::Show { id } => {
            session.open_required(EntityKind::Friend, Some(id)).await?;
            super::print_workspace(session, ctx)
        }

        FriendsCommand::Add { fields, phones } => {
            let workspace = session.open_required(EntityKind::Friend, None).await?;
            for number in phones {
                let index = workspace.add_child()?;
                workspace.set_field(&EditTarget::child(index, "number"), FieldValue::text(number))?;
            }
            session.apply(fields.edits())?;
            session.save().await?;
            let id = session.active()?.id().unwrap_or(RecordId::NEW);
            output::notice(&format!("Friend {id} created"), ctx.quiet);
            super::print_workspace(session, ctx)
        }

        FriendsCommand::Edit {
            id,
            fields,
            add_phones,
            mut remove_phones,
        } => {
            let workspace = session.open_required(EntityKind::Friend, Some(id)).await?;
            // Highest index first so earlier removals don't shift later ones.
            remove_phones.sort_unstable_by_key(|&index| Reverse(index));
            remove_phones.dedup();
            for index in remove_phones {
                workspace.select_child(Some(index))?;
                workspace.remove_child()?;
            }
            for number in add_phones {
                let index = workspace.add_child()?;
                workspace.set_field(&EditTarget::child(index, "number"), FieldValue::text(number))?;
            }
            session.apply(fields.edits())?;
            if session.save().await? {
                output::notice(&format!("Friend {id} updated"), ctx.quiet);
            } else {
                output::notice("No changes", ctx.quiet);
            }
            super::print_workspace(session, ctx)
        }

        FriendsCommand::Delete { id } => {
            session.open_required(EntityKind::Friend, Some(id)).await?;
            match session.delete().await? {
                DeleteOutcome::Deleted => output::notice(&format!("Friend {id} deleted"), ctx.quiet),
                DeleteOutcome::Cancelled => output::notice("Delete cancelled", ctx.quiet),
            }
            Ok(())
        }
    }
}
