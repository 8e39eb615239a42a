//! Read path over the cache.
//!
//! A fresh partition answers synchronously from the cache. A stale or
//! never-fetched partition awaits one network round trip, then installs
//! the result as the new server truth. A failed refetch surfaces the
//! error and leaves whatever the cache held readable through the
//! `cached_*` accessors.

use std::sync::Arc;

use tracing::debug;

use crate::client::ApiClient;
use crate::errors::ApiError;
use crate::models::{Category, EntityKind, Label, Ticket};
use crate::store::Store;

/// Cached-first reads over the board collections.
#[derive(Clone)]
pub struct Queries {
    store: Store,
    client: Arc<ApiClient>,
}

impl Queries {
    pub fn new(store: Store, client: Arc<ApiClient>) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(cached) = self.store.get_fresh::<Category>() {
            return Ok(cached);
        }
        let seq = self.store.next_seq::<Category>();
        let fetched = self.client.list_categories().await?;
        if !self.store.replace_all_if_current(seq, fetched.clone()) {
            debug!(kind = %EntityKind::Categories, seq, "refetch superseded; serving result uncached");
        }
        Ok(fetched)
    }

    pub async fn tickets(&self) -> Result<Vec<Ticket>, ApiError> {
        if let Some(cached) = self.store.get_fresh::<Ticket>() {
            return Ok(cached);
        }
        let seq = self.store.next_seq::<Ticket>();
        let fetched = self.client.list_tickets().await?;
        if !self.store.replace_all_if_current(seq, fetched.clone()) {
            debug!(kind = %EntityKind::Tickets, seq, "refetch superseded; serving result uncached");
        }
        Ok(fetched)
    }

    pub async fn labels(&self) -> Result<Vec<Label>, ApiError> {
        if let Some(cached) = self.store.get_fresh::<Label>() {
            return Ok(cached);
        }
        let seq = self.store.next_seq::<Label>();
        let fetched = self.client.list_labels().await?;
        if !self.store.replace_all_if_current(seq, fetched.clone()) {
            debug!(kind = %EntityKind::Labels, seq, "refetch superseded; serving result uncached");
        }
        Ok(fetched)
    }

    /// One ticket with its change history. Served from the cache only
    /// while the partition is fresh and already holds the id; otherwise
    /// fetched and merged back in.
    pub async fn ticket(&self, id: i64) -> Result<Ticket, ApiError> {
        if self.store.is_fresh::<Ticket>() {
            if let Some(cached) = self.store.get_by_id::<Ticket>(id) {
                return Ok(cached);
            }
        }
        let fetched = self.client.get_ticket(id).await?;
        self.store.upsert(fetched.clone());
        Ok(fetched)
    }

    // ── Synchronous cache reads ──────────────────────────────────────
    // For render paths that must not await. These serve stale data too;
    // `None` only means the partition was never fetched.

    pub fn cached_categories(&self) -> Option<Vec<Category>> {
        self.store.get_all::<Category>()
    }

    pub fn cached_tickets(&self) -> Option<Vec<Ticket>> {
        self.store.get_all::<Ticket>()
    }

    pub fn cached_labels(&self) -> Option<Vec<Label>> {
        self.store.get_all::<Label>()
    }

    pub fn cached_ticket(&self, id: i64) -> Option<Ticket> {
        self.store.get_by_id::<Ticket>(id)
    }
}
