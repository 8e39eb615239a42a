//! Ticket commands, including the detail view with movement history.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use console::style;
use dialoguer::Confirm;

use cardwall::client::{NewTicket, UpdateTicket};
use cardwall::models::ExpiryStatus;

use super::CmdContext;
use crate::TicketCommands;

pub async fn cmd_ticket(ctx: &CmdContext, command: &TicketCommands) -> Result<()> {
    use cardwall::mutate;

    ctx.require_session()?;
    match command {
        TicketCommands::Create {
            category,
            title,
            description,
            expires,
        } => {
            let expires_at = expires.as_deref().map(parse_expiry).transpose()?;
            let input = NewTicket {
                title: title.clone(),
                description: description.clone(),
                expires_at,
                category_id: *category,
            };
            let ticket = mutate::create_ticket(&ctx.client, &ctx.store, input).await?;
            println!("Created ticket #{} '{}'", ticket.id, ticket.title);
        }
        TicketCommands::Show { id } => {
            cmd_ticket_show(ctx, *id).await?;
        }
        TicketCommands::Edit {
            id,
            title,
            description,
            expires,
        } => {
            cmd_ticket_edit(
                ctx,
                *id,
                title.as_deref(),
                description.as_deref(),
                expires.as_deref(),
            )
            .await?;
        }
        TicketCommands::Move { id, category } => {
            let tickets = ctx.queries.tickets().await?;
            let Some(ticket) = tickets.iter().find(|t| t.id == *id) else {
                anyhow::bail!("No ticket with id {}", id);
            };
            let moved = mutate::move_ticket(&ctx.client, &ctx.store, ticket, *category).await?;
            println!("Moved ticket #{} to category #{}", moved.id, moved.category_id);
        }
        TicketCommands::Delete { id, force } => {
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete ticket #{}?", id))
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirmed {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }
            mutate::delete_ticket(&ctx.client, &ctx.store, *id).await?;
            println!("Deleted ticket #{}", id);
        }
    }
    Ok(())
}

async fn cmd_ticket_show(ctx: &CmdContext, id: i64) -> Result<()> {
    use cardwall::board;

    let ticket = ctx.queries.ticket(id).await?;
    let categories = ctx.queries.categories().await?;
    let detail = board::ticket_detail(&ticket, &categories, Utc::now());

    println!();
    match detail.expiry {
        ExpiryStatus::Expired => println!(
            "{} {}  {}",
            style(format!("#{}", detail.ticket.id)).bold(),
            style(&detail.ticket.title).bold(),
            style("expired").red().bold()
        ),
        ExpiryStatus::ExpiringSoon => println!(
            "{} {}  {}",
            style(format!("#{}", detail.ticket.id)).bold(),
            style(&detail.ticket.title).bold(),
            style("expires soon").yellow()
        ),
        ExpiryStatus::None => println!(
            "{} {}",
            style(format!("#{}", detail.ticket.id)).bold(),
            style(&detail.ticket.title).bold()
        ),
    }

    let category = categories
        .iter()
        .find(|c| c.id == detail.ticket.category_id)
        .map(|c| c.title.as_str())
        .unwrap_or("Not assigned");
    println!("Category: {}", category);

    let expires = match detail.ticket.expires_at {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "Not set".to_string(),
    };
    println!("Expires:  {}", expires);

    let labels = if detail.ticket.labels.is_empty() {
        "No labels".to_string()
    } else {
        detail
            .ticket
            .labels
            .iter()
            .map(|l| l.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("Labels:   {}", labels);

    if !detail.ticket.description.is_empty() {
        let width = super::terminal_width().min(80);
        println!();
        println!("{}", textwrap::fill(&detail.ticket.description, width));
    }

    if !detail.history.is_empty() {
        println!();
        println!("{}", style("History").bold());
        for entry in &detail.history {
            let title = entry.category_title.as_deref().unwrap_or("(deleted category)");
            println!("  {}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), title);
        }
    }
    println!();
    Ok(())
}

async fn cmd_ticket_edit(
    ctx: &CmdContext,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    expires: Option<&str>,
) -> Result<()> {
    use cardwall::kv;
    use cardwall::mutate;

    if title.is_none() && description.is_none() && expires.is_none() {
        anyhow::bail!("Nothing to change. Pass --title, --description, or --expires.");
    }
    let expires_at = expires.map(parse_expiry).transpose()?;
    let changes = UpdateTicket {
        title: title.map(str::to_string),
        description: description.map(str::to_string),
        expires_at,
        category_id: None,
    };

    // Keep the unsaved edit around until the server accepts it.
    let draft = serde_json::to_string(&changes).context("Failed to serialize ticket draft")?;
    ctx.kv.set(&kv::draft_key(id), &draft)?;

    let ticket = mutate::update_ticket(&ctx.client, &ctx.store, id, changes).await?;
    ctx.kv.remove(&kv::draft_key(id))?;
    println!("Updated ticket #{} '{}'", ticket.id, ticket.title);
    Ok(())
}

fn parse_expiry(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid expiry date '{}', expected YYYY-MM-DD", value))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}
