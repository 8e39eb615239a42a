use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a ticket's movement history. The server appends an entry
/// whenever the ticket's category changes; creating the ticket yields the
/// first one. Entries are immutable and ordered oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub category_id: i64,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub history: Vec<TicketHistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Derived expiry state, never stored. Expired once the deadline is in
    /// the past, expiring soon within 24 hours of it.
    pub fn expiry_status(&self, now: DateTime<Utc>) -> ExpiryStatus {
        match self.expires_at {
            Some(at) if at < now => ExpiryStatus::Expired,
            Some(at) if at - now < Duration::hours(24) => ExpiryStatus::ExpiringSoon,
            _ => ExpiryStatus::None,
        }
    }

    pub fn has_label(&self, label_id: i64) -> bool {
        self.labels.iter().any(|l| l.id == label_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    None,
}

impl ExpiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiring_soon",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expired" => Ok(Self::Expired),
            "expiring_soon" => Ok(Self::ExpiringSoon),
            "none" => Ok(Self::None),
            _ => Err(format!("Invalid expiry status: {}", s)),
        }
    }
}

/// Cache partition key. Values mirror the REST collection names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Categories,
    Tickets,
    Labels,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Tickets => "tickets",
            Self::Labels => "labels",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "categories" => Ok(Self::Categories),
            "tickets" => Ok(Self::Tickets),
            "labels" => Ok(Self::Labels),
            _ => Err(format!("Invalid entity kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login response: the authenticated user plus the bearer token attached
/// to every subsequent request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

// Board view types

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardView {
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnView {
    pub category: Category,
    pub tickets: Vec<TicketCard>,
}

/// A ticket paired with its derived expiry state for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketCard {
    pub ticket: Ticket,
    pub expiry: ExpiryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub expiry: ExpiryStatus,
    pub history: Vec<HistoryEntryView>,
}

/// History entry resolved against the category cache. `category_title` is
/// `None` when the category has since been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntryView {
    pub timestamp: DateTime<Utc>,
    pub category_id: i64,
    pub category_title: Option<String>,
}
