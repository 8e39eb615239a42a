//! Ticket mutations, including the drag-style move and the label set.

use chrono::Utc;

use crate::client::{ApiClient, NewTicket, UpdateTicket};
use crate::errors::ApiError;
use crate::models::{Label, Ticket};
use crate::mutate::Transaction;
use crate::store::Store;
use crate::validate;

const ALREADY_IN_CATEGORY: &str = "Ticket is already in this category";
const EXPIRED_MOVE: &str = "This card is expired. To move it, please extend the expiry date.";
const LABEL_ALREADY_ATTACHED: &str = "This label is already on the ticket";

pub async fn create_ticket(
    client: &ApiClient,
    store: &Store,
    input: NewTicket,
) -> Result<Ticket, ApiError> {
    validate::ticket_title(&input.title)?;
    validate::ticket_description(&input.description)?;
    validate::expiry_date(input.expires_at, Utc::now())?;
    let created = client.create_ticket(&input).await?;
    store.invalidate::<Ticket>(None);
    Ok(created)
}

/// Field edits are optimistic: the cached ticket reflects the change
/// immediately and reverts if the server rejects it.
pub async fn update_ticket(
    client: &ApiClient,
    store: &Store,
    id: i64,
    changes: UpdateTicket,
) -> Result<Ticket, ApiError> {
    if let Some(title) = &changes.title {
        validate::ticket_title(title)?;
    }
    if let Some(description) = &changes.description {
        validate::ticket_description(description)?;
    }
    if changes.expires_at.is_some() {
        validate::expiry_date(changes.expires_at, Utc::now())?;
    }

    let txn = Transaction::begin(store, |tickets: &mut Vec<Ticket>| {
        if let Some(cached) = tickets.iter_mut().find(|t| t.id == id) {
            if let Some(title) = &changes.title {
                cached.title = title.clone();
            }
            if let Some(description) = &changes.description {
                cached.description = description.clone();
            }
            if let Some(expires_at) = changes.expires_at {
                cached.expires_at = Some(expires_at);
            }
            if let Some(category_id) = changes.category_id {
                cached.category_id = category_id;
            }
        }
    });
    let result = client.update_ticket(id, &changes).await;
    txn.finish(result, |store, ticket| store.upsert(ticket.clone()))
}

/// Move a ticket between columns. Sends the full field set the board
/// holds, mirroring the drag payload, and translates the server's bare
/// validation failure for expired cards into the domain message.
pub async fn move_ticket(
    client: &ApiClient,
    store: &Store,
    ticket: &Ticket,
    target_category_id: i64,
) -> Result<Ticket, ApiError> {
    if ticket.category_id == target_category_id {
        return Err(ApiError::validation(None, ALREADY_IN_CATEGORY));
    }

    let id = ticket.id;
    let txn = Transaction::begin(store, |tickets: &mut Vec<Ticket>| {
        if let Some(cached) = tickets.iter_mut().find(|t| t.id == id) {
            cached.category_id = target_category_id;
        }
    });

    let body = UpdateTicket {
        title: Some(ticket.title.clone()),
        description: Some(ticket.description.clone()),
        expires_at: ticket.expires_at,
        category_id: Some(target_category_id),
    };
    let result = client
        .update_ticket(id, &body)
        .await
        .map_err(|err| match err {
            ApiError::Validation { field, message } if message == "Validation failed" => {
                ApiError::Validation {
                    field,
                    message: EXPIRED_MOVE.to_string(),
                }
            }
            other => other,
        });
    txn.finish(result, |store, ticket| store.upsert(ticket.clone()))
}

/// Remove a confirmed-deleted ticket from the cache; open detail views
/// observe the removal through the store's event channel.
pub async fn delete_ticket(client: &ApiClient, store: &Store, id: i64) -> Result<(), ApiError> {
    client.delete_ticket(id).await?;
    store.remove::<Ticket>(id);
    Ok(())
}

/// Attach a label. The cached label set changes immediately; on failure
/// the exact pre-operation set is restored, including any concurrent
/// edit captured in the snapshot.
pub async fn add_label(
    client: &ApiClient,
    store: &Store,
    ticket: &Ticket,
    label: &Label,
) -> Result<Ticket, ApiError> {
    if ticket.has_label(label.id) {
        return Err(ApiError::validation(None, LABEL_ALREADY_ATTACHED));
    }

    let id = ticket.id;
    let added = label.clone();
    let txn = Transaction::begin(store, |tickets: &mut Vec<Ticket>| {
        if let Some(cached) = tickets.iter_mut().find(|t| t.id == id) {
            cached.labels.push(added);
        }
    });
    let result = client.add_ticket_label(id, label.id).await;
    txn.finish(result, |store, ticket| store.upsert(ticket.clone()))
}

/// Detach a label, optimistically and with the same restore guarantee
/// as `add_label`.
pub async fn remove_label(
    client: &ApiClient,
    store: &Store,
    ticket: &Ticket,
    label_id: i64,
) -> Result<Ticket, ApiError> {
    let id = ticket.id;
    let txn = Transaction::begin(store, |tickets: &mut Vec<Ticket>| {
        if let Some(cached) = tickets.iter_mut().find(|t| t.id == id) {
            cached.labels.retain(|l| l.id != label_id);
        }
    });
    let result = client.remove_ticket_label(id, label_id).await;
    txn.finish(result, |store, ticket| store.upsert(ticket.clone()))
}
