//! Board composition: derive the visible columns from the cached
//! categories and tickets, resolve drag drops, and back the detail and
//! history views.

use chrono::{DateTime, Utc};

use crate::models::{
    BoardView, Category, ColumnView, HistoryEntryView, Ticket, TicketCard, TicketDetail,
};

/// Stable column order: explicitly ordered columns first by `order`,
/// then the orderless ones; ids break ties.
fn category_sort_key(category: &Category) -> (u8, i64, i64) {
    match category.order {
        Some(order) => (0, order, category.id),
        None => (1, 0, category.id),
    }
}

/// Assemble the visible board. Tickets keep their server order within
/// each column; expiry state is derived per card at `now`.
pub fn assemble(categories: &[Category], tickets: &[Ticket], now: DateTime<Utc>) -> BoardView {
    let mut ordered: Vec<Category> = categories.to_vec();
    ordered.sort_by_key(category_sort_key);

    let columns = ordered
        .into_iter()
        .map(|category| {
            let cards = tickets
                .iter()
                .filter(|t| t.category_id == category.id)
                .map(|t| TicketCard {
                    expiry: t.expiry_status(now),
                    ticket: t.clone(),
                })
                .collect();
            ColumnView {
                category,
                tickets: cards,
            }
        })
        .collect();
    BoardView { columns }
}

/// The dragged ticket usually rides along in memory; when that
/// reference is lost, the drop payload still carries the ticket id,
/// resolved here against the cached tickets. Unresolvable drops return
/// `None` and must be ignored without a network call.
pub fn resolve_drag_ticket(
    in_memory: Option<&Ticket>,
    payload: Option<&str>,
    tickets: &[Ticket],
) -> Option<Ticket> {
    if let Some(ticket) = in_memory {
        return Some(ticket.clone());
    }
    let id: i64 = payload?.trim().parse().ok()?;
    tickets.iter().find(|t| t.id == id).cloned()
}

/// Detail view: the ticket, its expiry state, and its movement history
/// oldest-first with category titles resolved against the cache. A
/// deleted category resolves to `None`.
pub fn ticket_detail(ticket: &Ticket, categories: &[Category], now: DateTime<Utc>) -> TicketDetail {
    let mut history: Vec<HistoryEntryView> = ticket
        .history
        .iter()
        .map(|entry| HistoryEntryView {
            timestamp: entry.timestamp,
            category_id: entry.category_id,
            category_title: categories
                .iter()
                .find(|c| c.id == entry.category_id)
                .map(|c| c.title.clone()),
        })
        .collect();
    history.sort_by_key(|entry| entry.timestamp);
    TicketDetail {
        ticket: ticket.clone(),
        expiry: ticket.expiry_status(now),
        history,
    }
}
