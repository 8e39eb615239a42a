//! Label commands.

use anyhow::Result;
use dialoguer::Confirm;

use super::CmdContext;
use crate::LabelCommands;

pub async fn cmd_label(ctx: &CmdContext, command: Option<LabelCommands>) -> Result<()> {
    use cardwall::mutate;

    ctx.require_session()?;
    match command.unwrap_or(LabelCommands::List) {
        LabelCommands::List => {
            let labels = ctx.queries.labels().await?;
            if labels.is_empty() {
                println!("No labels yet. Create one with 'cardwall label create <title>'.");
                return Ok(());
            }
            for label in &labels {
                println!("  #{:<4} {}", label.id, label.title);
            }
            println!();
            println!("{} label(s)", labels.len());
        }
        LabelCommands::Create { title } => {
            let label = mutate::create_label(&ctx.client, &ctx.store, &title).await?;
            println!("Created label '{}' (#{})", label.title, label.id);
        }
        LabelCommands::Rename { id, title } => {
            let label = mutate::rename_label(&ctx.client, &ctx.store, id, &title).await?;
            println!("Renamed label #{} to '{}'", label.id, label.title);
        }
        LabelCommands::Delete { id, force } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete label #{} from every ticket?", id))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            mutate::delete_label(&ctx.client, &ctx.store, id).await?;
            println!("Deleted label #{}", id);
        }
        LabelCommands::Add { ticket, label } => {
            let (ticket, label) = find_pair(ctx, ticket, label).await?;
            let updated = mutate::add_label(&ctx.client, &ctx.store, &ticket, &label).await?;
            println!("Added label '{}' to ticket #{}", label.title, updated.id);
        }
        LabelCommands::Remove { ticket, label } => {
            let tickets = ctx.queries.tickets().await?;
            let Some(ticket) = tickets.iter().find(|t| t.id == ticket) else {
                anyhow::bail!("No ticket with id {}", ticket);
            };
            let updated = mutate::remove_label(&ctx.client, &ctx.store, ticket, label).await?;
            println!("Removed label #{} from ticket #{}", label, updated.id);
        }
    }
    Ok(())
}

async fn find_pair(
    ctx: &CmdContext,
    ticket_id: i64,
    label_id: i64,
) -> Result<(cardwall::models::Ticket, cardwall::models::Label)> {
    let tickets = ctx.queries.tickets().await?;
    let labels = ctx.queries.labels().await?;
    let Some(ticket) = tickets.into_iter().find(|t| t.id == ticket_id) else {
        anyhow::bail!("No ticket with id {}", ticket_id);
    };
    let Some(label) = labels.into_iter().find(|l| l.id == label_id) else {
        anyhow::bail!("No label with id {}", label_id);
    };
    Ok((ticket, label))
}
