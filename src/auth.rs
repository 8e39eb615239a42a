//! Session flows: login, registration, logout, and restoring a saved
//! session at startup. The access token lives in the key-value store
//! under a single key and stays attached to the client for the process
//! lifetime.

use anyhow::{Context, Result};

use crate::client::{ApiClient, Credentials, Registration};
use crate::errors::ApiError;
use crate::kv::{KvStore, TOKEN_KEY};
use crate::models::{Session, User};
use crate::validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password. Please check your credentials.";
const EMAIL_EXISTS: &str = "An account with this email already exists.";
const SERVER_ERROR: &str = "Server error. Please try again later.";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";
const LOGIN_FAILED: &str = "Login failed. Please try again.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

pub async fn login(
    client: &ApiClient,
    kv: &dyn KvStore,
    email: &str,
    password: &str,
) -> Result<Session> {
    validate::email(email)?;
    validate::login_password(password)?;
    let session = client
        .login(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;
    kv.set(TOKEN_KEY, &session.access_token)
        .context("failed to persist session token")?;
    client.set_token(Some(session.access_token.clone()));
    Ok(session)
}

pub async fn register(
    client: &ApiClient,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<User> {
    validate::email(email)?;
    validate::registration_password(password)?;
    validate::password_confirmation(password, confirm)?;
    let user = client
        .register(&Registration {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;
    Ok(user)
}

/// Forget the saved session. Safe to call when none exists.
pub fn logout(client: &ApiClient, kv: &dyn KvStore) -> Result<()> {
    kv.remove(TOKEN_KEY)
        .context("failed to clear session token")?;
    client.set_token(None);
    Ok(())
}

/// Attach a previously saved token, if any. Returns whether a session
/// was restored; the token may still be rejected server-side.
pub fn restore_session(client: &ApiClient, kv: &dyn KvStore) -> bool {
    match kv.get(TOKEN_KEY) {
        Some(token) => {
            client.set_token(Some(token));
            true
        }
        None => false,
    }
}

/// Map a login failure onto the form: the field to annotate and the
/// message to show. Bad credentials always read the same way and point
/// at the password field.
pub fn login_form_error(err: &anyhow::Error) -> (Option<String>, String) {
    let Some(api) = err.downcast_ref::<ApiError>() else {
        return (None, err.to_string());
    };
    match api {
        ApiError::Validation { field, message } => (field.clone(), message.clone()),
        ApiError::Auth { .. } => (
            Some("password".to_string()),
            INVALID_CREDENTIALS.to_string(),
        ),
        ApiError::Server { status, .. } if *status >= 500 => (None, SERVER_ERROR.to_string()),
        ApiError::Network { .. } => (None, LOGIN_FAILED.to_string()),
        _ => (None, UNEXPECTED_ERROR.to_string()),
    }
}

/// Registration counterpart of `login_form_error`.
pub fn register_form_error(err: &anyhow::Error) -> (Option<String>, String) {
    let Some(api) = err.downcast_ref::<ApiError>() else {
        return (None, err.to_string());
    };
    match api {
        ApiError::Validation { field, message } => (field.clone(), message.clone()),
        ApiError::Conflict { .. } => (None, EMAIL_EXISTS.to_string()),
        ApiError::Server { status, .. } if *status >= 500 => (None, SERVER_ERROR.to_string()),
        ApiError::Network { .. } => (None, REGISTRATION_FAILED.to_string()),
        _ => (None, UNEXPECTED_ERROR.to_string()),
    }
}
