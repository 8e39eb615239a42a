//! Category commands.

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Select};

use super::CmdContext;
use crate::CategoryCommands;

pub async fn cmd_category(ctx: &CmdContext, command: &CategoryCommands) -> Result<()> {
    use cardwall::mutate;

    ctx.require_session()?;
    match command {
        CategoryCommands::Create { title } => {
            let category = mutate::create_category(&ctx.client, &ctx.store, title).await?;
            println!("Created category '{}' (#{})", category.title, category.id);
        }
        CategoryCommands::Rename { id, title } => {
            let category = mutate::rename_category(&ctx.client, &ctx.store, *id, title).await?;
            println!("Renamed category #{} to '{}'", category.id, category.title);
        }
        CategoryCommands::Delete { id, move_to, force } => {
            cmd_category_delete(ctx, *id, *move_to, *force).await?;
        }
        CategoryCommands::Swap { id, other } => {
            mutate::swap_categories(&ctx.client, &ctx.store, *id, *other).await?;
            println!("Swapped the order of categories #{} and #{}", id, other);
        }
    }
    Ok(())
}

async fn cmd_category_delete(
    ctx: &CmdContext,
    id: i64,
    move_to: Option<i64>,
    force: bool,
) -> Result<()> {
    use cardwall::models::Category;
    use cardwall::mutate;

    let categories = ctx.queries.categories().await?;
    let Some(doomed) = categories.iter().find(|c| c.id == id) else {
        anyhow::bail!("No category with id {}", id);
    };

    let move_to = match move_to {
        Some(destination) => destination,
        None => {
            // Every other category is a valid destination for the tickets.
            let others: Vec<&Category> = categories.iter().filter(|c| c.id != id).collect();
            if others.is_empty() {
                anyhow::bail!("Cannot delete the only category on the board");
            }
            let items: Vec<String> = others
                .iter()
                .map(|c| format!("{} (#{})", c.title, c.id))
                .collect();
            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Move tickets from '{}' to", doomed.title))
                .items(&items)
                .default(0)
                .interact()
                .context("Failed to read destination category")?;
            others[selection].id
        }
    };

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete category '{}'?", doomed.title))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    mutate::delete_category(&ctx.client, &ctx.store, id, move_to).await?;
    println!(
        "Deleted category '{}'. Its tickets moved to #{}",
        doomed.title, move_to
    );
    Ok(())
}
