//! Write path: typed mutations over the cache.
//!
//! Every mutation validates its input locally, then follows one
//! protocol: snapshot and optimistically patch the cache, dispatch the
//! request, and settle by committing server truth or rolling the patch
//! back. `Transaction` implements the protocol once; the per-entity
//! modules supply validation, payloads, and reconciliation.

mod category;
mod label;
mod ticket;

pub use category::{create_category, delete_category, rename_category, swap_categories};
pub use label::{create_label, delete_label, rename_label};
pub use ticket::{
    add_label, create_ticket, delete_ticket, move_ticket, remove_label, update_ticket,
};

use crate::errors::ApiError;
use crate::store::{CacheEntity, Snapshot, Store};

/// One optimistic mutation in flight. Holds the pre-patch snapshot and
/// the sequence stamp taken at dispatch.
pub struct Transaction<E: CacheEntity> {
    store: Store,
    snapshot: Snapshot<E>,
    seq: u64,
}

impl<E: CacheEntity> Transaction<E> {
    /// Snapshot the partition and apply the optimistic patch, stamping
    /// this mutation's position in the dispatch order.
    pub fn begin(store: &Store, patch: impl FnOnce(&mut Vec<E>)) -> Self {
        let (snapshot, seq) = store.begin_patch(patch);
        Self {
            store: store.clone(),
            snapshot,
            seq,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Settle against the request outcome. While this transaction is
    /// still the newest for its partition, success runs `commit` and
    /// failure rolls back to the snapshot. A superseded transaction
    /// settles without touching the cache either way; the newer request
    /// owns the partition now.
    pub fn finish<T>(
        self,
        result: Result<T, ApiError>,
        commit: impl FnOnce(&Store, &T),
    ) -> Result<T, ApiError> {
        let current = self.store.is_current::<E>(self.seq);
        match result {
            Ok(value) => {
                if current {
                    commit(&self.store, &value);
                } else {
                    self.store.note_stale_drop::<E>(self.seq);
                }
                Ok(value)
            }
            Err(err) => {
                if current {
                    self.store.rollback(self.snapshot);
                } else {
                    self.store.note_stale_drop::<E>(self.seq);
                }
                Err(err)
            }
        }
    }
}
