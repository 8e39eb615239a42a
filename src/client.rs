//! REST boundary for the task-board backend.
//!
//! One shared `reqwest::Client` behind `ApiClient`; every response passes
//! through a single decode step that turns non-success statuses into
//! `ApiError`. Endpoint methods mirror the backend routes one to one.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ApiError;
use crate::models::{Category, Label, Session, Ticket, User};

// ── Request bodies ───────────────────────────────────────────────────

/// Body for `POST /categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub title: String,
}

/// Body for `PATCH /categories/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    pub title: String,
}

/// Body for `POST /tickets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub category_id: i64,
}

/// Body for `PATCH /tickets/:id`. Only populated fields are sent; a
/// board move sends every field it knows, mirroring the drag flow.
/// Doubles as the ticket-draft payload in the key-value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Body for `POST /labels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub title: String,
}

/// Body for `PATCH /labels/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabel {
    pub title: String,
}

/// Body for `POST /tickets/:id/labels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLabel {
    pub label_id: i64,
}

/// Body for `POST /authentication`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body for `POST /users/registration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
}

// ── Client ───────────────────────────────────────────────────────────

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// `base_url` with or without a trailing slash, e.g.
    /// `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "dispatching request");
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token() {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder
    }

    /// Single decode step: success bodies parse as `T`, anything else
    /// becomes the matching `ApiError` variant.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "request rejected");
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }

    /// Like `decode`, for endpoints whose success body is not consumed.
    async fn expect_success(resp: reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "request rejected");
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }

    // ── Categories ───────────────────────────────────────────────────

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let resp = self.request(Method::GET, "/categories").send().await?;
        Self::decode(resp).await
    }

    pub async fn create_category(&self, body: &NewCategory) -> Result<Category, ApiError> {
        let resp = self
            .request(Method::POST, "/categories")
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        body: &UpdateCategory,
    ) -> Result<Category, ApiError> {
        let resp = self
            .request(Method::PATCH, &format!("/categories/{}", id))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// `move_tickets_to` names the category that inherits the deleted
    /// category's tickets.
    pub async fn delete_category(&self, id: i64, move_tickets_to: i64) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &format!("/categories/{}", id))
            .query(&[("moveExistingTicketsToCategoryId", move_tickets_to)])
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    /// Exchange the `order` of two categories.
    pub async fn swap_category_order(&self, id: i64, other_id: i64) -> Result<(), ApiError> {
        let resp = self
            .request(
                Method::PATCH,
                &format!("/categories/{}/swap-order/{}", id, other_id),
            )
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    // ── Tickets ──────────────────────────────────────────────────────

    pub async fn list_tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        let resp = self.request(Method::GET, "/tickets").send().await?;
        Self::decode(resp).await
    }

    pub async fn get_ticket(&self, id: i64) -> Result<Ticket, ApiError> {
        let resp = self
            .request(Method::GET, &format!("/tickets/get/{}", id))
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn create_ticket(&self, body: &NewTicket) -> Result<Ticket, ApiError> {
        let resp = self
            .request(Method::POST, "/tickets")
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn update_ticket(&self, id: i64, body: &UpdateTicket) -> Result<Ticket, ApiError> {
        let resp = self
            .request(Method::PATCH, &format!("/tickets/{}", id))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete_ticket(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &format!("/tickets/{}", id))
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    /// Attach a label; returns the updated ticket.
    pub async fn add_ticket_label(&self, ticket_id: i64, label_id: i64) -> Result<Ticket, ApiError> {
        let resp = self
            .request(Method::POST, &format!("/tickets/{}/labels", ticket_id))
            .json(&AddLabel { label_id })
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Detach a label; returns the updated ticket.
    pub async fn remove_ticket_label(
        &self,
        ticket_id: i64,
        label_id: i64,
    ) -> Result<Ticket, ApiError> {
        let resp = self
            .request(
                Method::DELETE,
                &format!("/tickets/{}/labels/{}", ticket_id, label_id),
            )
            .send()
            .await?;
        Self::decode(resp).await
    }

    // ── Labels ───────────────────────────────────────────────────────

    pub async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        let resp = self.request(Method::GET, "/labels").send().await?;
        Self::decode(resp).await
    }

    pub async fn create_label(&self, body: &NewLabel) -> Result<Label, ApiError> {
        let resp = self
            .request(Method::POST, "/labels")
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn update_label(&self, id: i64, body: &UpdateLabel) -> Result<Label, ApiError> {
        let resp = self
            .request(Method::PATCH, &format!("/labels/{}", id))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn delete_label(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .request(Method::DELETE, &format!("/labels/{}", id))
            .send()
            .await?;
        Self::expect_success(resp).await
    }

    // ── Authentication ───────────────────────────────────────────────

    pub async fn login(&self, body: &Credentials) -> Result<Session, ApiError> {
        let resp = self
            .request(Method::POST, "/authentication")
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn register(&self, body: &Registration) -> Result<User, ApiError> {
        let resp = self
            .request(Method::POST, "/users/registration")
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        let resp = self.request(Method::GET, "/users/me").send().await?;
        Self::decode(resp).await
    }
}
