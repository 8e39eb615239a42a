//! Category mutations.
//!
//! Creation and renames are request-scoped rather than optimistic: the
//! server assigns ids and order, so the board waits for confirmation.
//! Deletion reassigns the column's tickets server-side and polls the
//! ticket list until that reassignment is visible.

use std::time::Duration;

use tracing::debug;

use crate::client::{ApiClient, NewCategory, UpdateCategory};
use crate::errors::ApiError;
use crate::models::{Category, Ticket};
use crate::store::Store;
use crate::validate;

const SAME_DESTINATION: &str = "Please select a different category as the destination";
const ONLY_CATEGORY: &str = "Cannot delete the only category on the board";
const SAME_SWAP: &str = "Cannot swap a category with itself";

/// Deletion waits for the server to finish reassigning tickets: up to
/// `POLL_ATTEMPTS` refetches, `POLL_INTERVAL` apart.
const POLL_ATTEMPTS: u32 = 5;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn create_category(
    client: &ApiClient,
    store: &Store,
    title: &str,
) -> Result<Category, ApiError> {
    validate::category_title(title)?;
    let created = client
        .create_category(&NewCategory {
            title: title.to_string(),
        })
        .await?;
    // The server assigns the column order; refetch instead of guessing
    store.invalidate::<Category>(None);
    Ok(created)
}

pub async fn rename_category(
    client: &ApiClient,
    store: &Store,
    id: i64,
    title: &str,
) -> Result<Category, ApiError> {
    validate::category_title(title)?;
    let seq = store.next_seq::<Category>();
    let updated = client
        .update_category(
            id,
            &UpdateCategory {
                title: title.to_string(),
            },
        )
        .await?;
    if store.is_current::<Category>(seq) {
        store.upsert(updated.clone());
    } else {
        store.note_stale_drop::<Category>(seq);
    }
    Ok(updated)
}

/// Delete a column, moving its tickets to `move_tickets_to`. Rejected
/// locally when the destination is the deleted category itself or when
/// the board has no other column to hold the tickets.
pub async fn delete_category(
    client: &ApiClient,
    store: &Store,
    id: i64,
    move_tickets_to: i64,
) -> Result<(), ApiError> {
    if move_tickets_to == id {
        return Err(ApiError::validation(Some("destination"), SAME_DESTINATION));
    }
    if let Some(categories) = store.get_all::<Category>() {
        if categories.len() <= 1 {
            return Err(ApiError::validation(None, ONLY_CATEGORY));
        }
    }

    client.delete_category(id, move_tickets_to).await?;
    store.remove::<Category>(id);
    store.invalidate::<Ticket>(None);

    // The server reassigns the orphaned tickets after the delete
    // returns. Refetch until none of them references the dead id; if
    // the window closes first, the partition stays stale and the next
    // read tries again.
    for attempt in 0..POLL_ATTEMPTS {
        let seq = store.next_seq::<Ticket>();
        match client.list_tickets().await {
            Ok(tickets) => {
                if tickets.iter().all(|t| t.category_id != id) {
                    store.replace_all_if_current(seq, tickets);
                    break;
                }
                debug!(attempt, "deleted category still referenced; retrying");
            }
            Err(err) => {
                // The delete itself succeeded; a failed refetch only
                // delays the refresh to the next read
                debug!(attempt, error = %err, "ticket refetch failed after category delete");
                break;
            }
        }
        if attempt + 1 < POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    let seq = store.next_seq::<Category>();
    match client.list_categories().await {
        Ok(categories) => {
            store.replace_all_if_current(seq, categories);
        }
        Err(err) => {
            debug!(error = %err, "category refetch failed after delete");
            store.invalidate::<Category>(None);
        }
    }
    Ok(())
}

/// Exchange the board order of two columns.
pub async fn swap_categories(
    client: &ApiClient,
    store: &Store,
    id: i64,
    other_id: i64,
) -> Result<(), ApiError> {
    if id == other_id {
        return Err(ApiError::validation(None, SAME_SWAP));
    }
    client.swap_category_order(id, other_id).await?;
    store.invalidate::<Category>(None);
    Ok(())
}
