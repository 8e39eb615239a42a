//! Board rendering.

use anyhow::Result;
use chrono::Utc;
use console::style;

use cardwall::models::ExpiryStatus;

use super::CmdContext;

// Room for the expiry tag printed after a card line.
const TAG_RESERVE: usize = 16;

pub async fn cmd_board(ctx: &CmdContext) -> Result<()> {
    use cardwall::board;

    ctx.require_session()?;
    let categories = ctx.queries.categories().await?;
    let tickets = ctx.queries.tickets().await?;
    let view = board::assemble(&categories, &tickets, Utc::now());

    if view.columns.is_empty() {
        println!("The board has no categories yet.");
        println!("Create one with 'cardwall category create <title>'.");
        return Ok(());
    }

    let width = super::terminal_width();
    for column in &view.columns {
        println!();
        println!(
            "{} {}",
            style(&column.category.title).bold().cyan(),
            style(format!("({})", column.tickets.len())).dim()
        );
        if column.tickets.is_empty() {
            println!("  {}", style("empty").dim());
            continue;
        }
        for card in &column.tickets {
            let mut line = format!("  #{:<4} {}", card.ticket.id, card.ticket.title);
            if !card.ticket.labels.is_empty() {
                let labels: Vec<&str> =
                    card.ticket.labels.iter().map(|l| l.title.as_str()).collect();
                line.push_str(&format!("  [{}]", labels.join(", ")));
            }
            let line = fit(&line, width.saturating_sub(TAG_RESERVE));
            match card.expiry {
                ExpiryStatus::Expired => {
                    println!("{}  {}", line, style("expired").red().bold())
                }
                ExpiryStatus::ExpiringSoon => {
                    println!("{}  {}", line, style("expires soon").yellow())
                }
                ExpiryStatus::None => println!("{}", line),
            }
        }
    }
    println!();
    Ok(())
}

fn fit(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let head: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}
