//! Session commands: login, logout, register, whoami.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use super::CmdContext;

pub async fn cmd_login(
    ctx: &CmdContext,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    use cardwall::auth;

    let email = match email {
        Some(value) => value.to_string(),
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = match password {
        Some(value) => value.to_string(),
        None => Password::new()
            .with_prompt("Password")
            .interact()
            .context("Failed to read password")?,
    };

    match auth::login(&ctx.client, ctx.kv.as_ref(), &email, &password).await {
        Ok(session) => {
            println!("Logged in as {}", session.user.email);
            Ok(())
        }
        Err(err) => {
            let (field, message) = auth::login_form_error(&err);
            match field {
                Some(field) => anyhow::bail!("{}: {}", field, message),
                None => anyhow::bail!("{}", message),
            }
        }
    }
}

pub fn cmd_logout(ctx: &CmdContext) -> Result<()> {
    use cardwall::auth;

    auth::logout(&ctx.client, ctx.kv.as_ref())?;
    println!("Logged out.");
    Ok(())
}

pub async fn cmd_register(
    ctx: &CmdContext,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    use cardwall::auth;

    let email = match email {
        Some(value) => value.to_string(),
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let (password, confirm) = match password {
        Some(value) => (value.to_string(), value.to_string()),
        None => {
            let password: String = Password::new()
                .with_prompt("Password")
                .interact()
                .context("Failed to read password")?;
            let confirm: String = Password::new()
                .with_prompt("Confirm password")
                .interact()
                .context("Failed to read password confirmation")?;
            (password, confirm)
        }
    };

    match auth::register(&ctx.client, &email, &password, &confirm).await {
        Ok(user) => {
            println!("Registered {}. You can now log in.", user.email);
            Ok(())
        }
        Err(err) => {
            let (field, message) = auth::register_form_error(&err);
            match field {
                Some(field) => anyhow::bail!("{}: {}", field, message),
                None => anyhow::bail!("{}", message),
            }
        }
    }
}

pub async fn cmd_whoami(ctx: &CmdContext) -> Result<()> {
    ctx.require_session()?;
    let user = ctx.client.me().await?;
    println!("{} (user #{})", user.email, user.id);
    Ok(())
}
