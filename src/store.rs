//! Client-side cache of server state.
//!
//! One partition per entity kind holds the last server-confirmed (or
//! optimistically patched) collection. Every `patch` returns a snapshot
//! that `rollback` restores verbatim, so `patch` then `rollback` leaves
//! the cache exactly as it was. A broadcast channel announces every
//! change so readers never have to poll.
//!
//! Each partition also carries a monotonic request counter. Operations
//! stamp their dispatch with `next_seq`/`begin_patch` and commit through
//! the `*_if_current` checks, which drop responses that a newer request
//! has overtaken.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{Category, EntityKind, Label, Ticket};

// ── Events ───────────────────────────────────────────────────────────

/// Published on every cache change. A lagging receiver misses
/// intermediate events but can always re-read the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Patched { kind: EntityKind },
    RolledBack { kind: EntityKind },
    Replaced { kind: EntityKind, count: usize },
    Upserted { kind: EntityKind, id: i64 },
    Removed { kind: EntityKind, id: i64 },
    Invalidated { kind: EntityKind, id: Option<i64> },
    StaleResponseDropped { kind: EntityKind, seq: u64 },
}

// ── Partitions ───────────────────────────────────────────────────────

/// Pre-patch copy of one partition. Consumed by `rollback`: one patch
/// produces one snapshot, and that snapshot is its only rollback target.
#[derive(Debug)]
pub struct Snapshot<E> {
    items: Option<Vec<E>>,
    stale: bool,
}

#[derive(Debug)]
pub struct Partition<E> {
    /// `None` until the first fetch or patch touches the partition.
    items: Option<Vec<E>>,
    stale: bool,
    /// Monotonic dispatch counter for the stale-response guard.
    seq: u64,
}

impl<E> Default for Partition<E> {
    fn default() -> Self {
        Self {
            items: None,
            stale: false,
            seq: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct StoreInner {
    categories: Partition<Category>,
    tickets: Partition<Ticket>,
    labels: Partition<Label>,
}

/// Entity types the cache can hold. Implementations project their own
/// partition out of the store; the partition fields stay private to this
/// module, so the trait is effectively sealed.
pub trait CacheEntity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> i64;
    fn partition(inner: &mut StoreInner) -> &mut Partition<Self>;
    fn partition_ref(inner: &StoreInner) -> &Partition<Self>;
}

impl CacheEntity for Category {
    const KIND: EntityKind = EntityKind::Categories;

    fn id(&self) -> i64 {
        self.id
    }

    fn partition(inner: &mut StoreInner) -> &mut Partition<Self> {
        &mut inner.categories
    }

    fn partition_ref(inner: &StoreInner) -> &Partition<Self> {
        &inner.categories
    }
}

impl CacheEntity for Ticket {
    const KIND: EntityKind = EntityKind::Tickets;

    fn id(&self) -> i64 {
        self.id
    }

    fn partition(inner: &mut StoreInner) -> &mut Partition<Self> {
        &mut inner.tickets
    }

    fn partition_ref(inner: &StoreInner) -> &Partition<Self> {
        &inner.tickets
    }
}

impl CacheEntity for Label {
    const KIND: EntityKind = EntityKind::Labels;

    fn id(&self) -> i64 {
        self.id
    }

    fn partition(inner: &mut StoreInner) -> &mut Partition<Self> {
        &mut inner.labels
    }

    fn partition_ref(inner: &StoreInner) -> &Partition<Self> {
        &inner.labels
    }
}

// ── Store handle ─────────────────────────────────────────────────────

/// Shared handle to the cache. Cloning is cheap; every clone observes
/// the same state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Mutex<StoreInner>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // A poisoned lock means a patch closure panicked; recover with
    // whatever state it left. The next refetch restores server truth.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event); // Ignore error if no receivers
    }

    /// Synchronous read of the whole partition, `None` if never fetched.
    pub fn get_all<E: CacheEntity>(&self) -> Option<Vec<E>> {
        let inner = self.lock();
        E::partition_ref(&inner).items.clone()
    }

    /// Synchronous read of one entity by id.
    pub fn get_by_id<E: CacheEntity>(&self, id: i64) -> Option<E> {
        let inner = self.lock();
        E::partition_ref(&inner)
            .items
            .as_ref()?
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    /// True when the partition holds data and no invalidation is pending.
    pub fn is_fresh<E: CacheEntity>(&self) -> bool {
        let inner = self.lock();
        let partition = E::partition_ref(&inner);
        partition.items.is_some() && !partition.stale
    }

    /// Cached read that only answers while the partition is fresh. Stale
    /// or never-fetched partitions return `None` so the caller refetches.
    pub fn get_fresh<E: CacheEntity>(&self) -> Option<Vec<E>> {
        let inner = self.lock();
        let partition = E::partition_ref(&inner);
        if partition.stale {
            return None;
        }
        partition.items.clone()
    }

    /// Apply a local mutation and return the pre-patch snapshot.
    /// Patching a never-fetched partition starts it as an empty
    /// collection; the snapshot still restores the never-fetched state.
    pub fn patch<E: CacheEntity>(&self, f: impl FnOnce(&mut Vec<E>)) -> Snapshot<E> {
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        let snapshot = Snapshot {
            items: partition.items.clone(),
            stale: partition.stale,
        };
        f(partition.items.get_or_insert_with(Vec::new));
        drop(inner);
        debug!(kind = %E::KIND, "applied optimistic patch");
        self.publish(StoreEvent::Patched { kind: E::KIND });
        snapshot
    }

    /// Restore a prior snapshot verbatim. The request counter is left
    /// alone; it never rewinds.
    pub fn rollback<E: CacheEntity>(&self, snapshot: Snapshot<E>) {
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        partition.items = snapshot.items;
        partition.stale = snapshot.stale;
        drop(inner);
        debug!(kind = %E::KIND, "rolled back to pre-patch snapshot");
        self.publish(StoreEvent::RolledBack { kind: E::KIND });
    }

    /// Atomically apply a patch and stamp the next request sequence
    /// number, so overlapping mutations on one partition order their
    /// snapshots the same way they order their dispatches.
    pub fn begin_patch<E: CacheEntity>(&self, f: impl FnOnce(&mut Vec<E>)) -> (Snapshot<E>, u64) {
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        let snapshot = Snapshot {
            items: partition.items.clone(),
            stale: partition.stale,
        };
        f(partition.items.get_or_insert_with(Vec::new));
        partition.seq += 1;
        let seq = partition.seq;
        drop(inner);
        debug!(kind = %E::KIND, seq, "applied optimistic patch");
        self.publish(StoreEvent::Patched { kind: E::KIND });
        (snapshot, seq)
    }

    /// Stamp a request that carries no optimistic patch (fetches and
    /// non-optimistic writes).
    pub fn next_seq<E: CacheEntity>(&self) -> u64 {
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        partition.seq += 1;
        partition.seq
    }

    /// Whether `seq` is still the newest dispatched request for the
    /// partition. Responses carrying an older stamp must be dropped.
    pub fn is_current<E: CacheEntity>(&self, seq: u64) -> bool {
        let inner = self.lock();
        E::partition_ref(&inner).seq == seq
    }

    /// Replace the whole partition with server truth and mark it fresh.
    pub fn replace_all<E: CacheEntity>(&self, items: Vec<E>) {
        let count = items.len();
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        partition.items = Some(items);
        partition.stale = false;
        drop(inner);
        self.publish(StoreEvent::Replaced {
            kind: E::KIND,
            count,
        });
    }

    /// `replace_all` guarded by the sequence stamp. Returns false and
    /// leaves the cache untouched when a newer request has been
    /// dispatched since `seq`.
    pub fn replace_all_if_current<E: CacheEntity>(&self, seq: u64, items: Vec<E>) -> bool {
        let count = items.len();
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        if partition.seq != seq {
            drop(inner);
            self.note_stale_drop::<E>(seq);
            return false;
        }
        partition.items = Some(items);
        partition.stale = false;
        drop(inner);
        self.publish(StoreEvent::Replaced {
            kind: E::KIND,
            count,
        });
        true
    }

    /// Merge one server-confirmed entity: replace by id, or append when
    /// the cache has not seen it yet.
    pub fn upsert<E: CacheEntity>(&self, item: E) {
        let id = item.id();
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        let items = partition.items.get_or_insert_with(Vec::new);
        match items.iter_mut().find(|e| e.id() == id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        drop(inner);
        self.publish(StoreEvent::Upserted { kind: E::KIND, id });
    }

    /// Drop one entity from the partition (confirmed deletes). Detail
    /// views subscribed to the store observe the removal immediately.
    pub fn remove<E: CacheEntity>(&self, id: i64) {
        let mut inner = self.lock();
        let partition = E::partition(&mut inner);
        if let Some(items) = partition.items.as_mut() {
            items.retain(|e| e.id() != id);
        }
        drop(inner);
        self.publish(StoreEvent::Removed { kind: E::KIND, id });
    }

    /// Mark the partition stale so the next read refetches. Existing
    /// data stays readable until the refetch lands.
    pub fn invalidate<E: CacheEntity>(&self, id: Option<i64>) {
        let mut inner = self.lock();
        E::partition(&mut inner).stale = true;
        drop(inner);
        debug!(kind = %E::KIND, "partition invalidated");
        self.publish(StoreEvent::Invalidated { kind: E::KIND, id });
    }

    /// Record a dropped stale response.
    pub fn note_stale_drop<E: CacheEntity>(&self, seq: u64) {
        debug!(kind = %E::KIND, seq, "dropped stale response");
        self.publish(StoreEvent::StaleResponseDropped {
            kind: E::KIND,
            seq,
        });
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────────
