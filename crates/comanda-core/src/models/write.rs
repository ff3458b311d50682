//! Pending write models
//!
//! A [`QueuedWrite`] is a mutation that could not be delivered to the
//! backend at the time it was made. Payloads are a closed set of typed
//! records rather than free-form maps, so the resolver and flusher can
//! match on them exhaustively.

use super::catalog::TableState;
use crate::error::{Error, Result};
use crate::util::now_millis;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a queued write, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WriteId(Uuid);

impl WriteId {
    /// Create a new unique write ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for WriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WriteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Discriminant identifying which backend table a payload targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    Ticket,
    Order,
    Payment,
    TableStatus,
}

impl WriteKind {
    /// Stable string form, matching the serialized payload tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ticket => "ticket",
            Self::Order => "order",
            Self::Payment => "payment",
            Self::TableStatus => "table_status",
        }
    }

    /// Backend collection the payload is written to
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Ticket => "order_tickets",
            Self::Order => "orders",
            Self::Payment => "payments",
            Self::TableStatus => "dining_tables",
        }
    }

    /// Append-only kinds are always inserted and never conflict-checked;
    /// there is no existing remote row to compare against.
    #[must_use]
    pub const fn append_only(self) -> bool {
        matches!(self, Self::Payment)
    }
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Placed,
    Paid,
    Cancelled,
}

/// Kitchen ticket lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Queued,
    Preparing,
    Ready,
    Served,
}

/// Payment method accepted at the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Voucher,
}

/// A single line on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A single line on a kitchen ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLine {
    pub menu_item_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// An order taken at the terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Absent for orders created offline; the backend assigns one on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub restaurant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
    pub status: OrderStatus,
}

/// A kitchen or bar ticket derived from an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order_id: String,
    /// Preparation station, e.g. "kitchen" or "bar"
    pub station: String,
    pub lines: Vec<TicketLine>,
    pub status: TicketStatus,
}

/// A point-of-sale transaction; the transaction log is append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// When the payment was taken at the terminal (Unix ms)
    pub processed_at: i64,
}

/// A status change for an existing dining table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatusUpdate {
    pub table_id: String,
    pub status: TableState,
}

/// Tagged union over the record kinds the queue can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WritePayload {
    Ticket(TicketDraft),
    Order(OrderDraft),
    Payment(PaymentDraft),
    TableStatus(TableStatusUpdate),
}

impl WritePayload {
    /// The kind discriminant for this payload
    #[must_use]
    pub const fn kind(&self) -> WriteKind {
        match self {
            Self::Ticket(_) => WriteKind::Ticket,
            Self::Order(_) => WriteKind::Order,
            Self::Payment(_) => WriteKind::Payment,
            Self::TableStatus(_) => WriteKind::TableStatus,
        }
    }

    /// The remote record this payload targets, if it references one.
    ///
    /// `None` means a pure creation: the backend assigns the identifier
    /// and no conflict is possible.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Ticket(draft) => draft.id.as_deref(),
            Self::Order(draft) => draft.id.as_deref(),
            Self::Payment(draft) => draft.id.as_deref(),
            Self::TableStatus(update) => Some(update.table_id.as_str()),
        }
    }

    /// Reject payloads that would be unprocessable at replay time.
    ///
    /// Update kinds must reference an existing record; catching this at
    /// enqueue time keeps dead items out of the durable queue.
    pub fn validate(&self) -> Result<()> {
        let missing = match self {
            Self::Ticket(draft) if draft.order_id.trim().is_empty() => Some("order_id"),
            Self::Order(draft) if draft.restaurant_id.trim().is_empty() => Some("restaurant_id"),
            Self::Payment(draft) if draft.order_id.trim().is_empty() => Some("order_id"),
            Self::TableStatus(update) if update.table_id.trim().is_empty() => Some("table_id"),
            _ => None,
        };

        match missing {
            Some(field) => Err(Error::InvalidInput(format!(
                "{} payload requires a non-empty {field}",
                self.kind()
            ))),
            None => Ok(()),
        }
    }

    /// Serialize into the flat record shape the remote service expects.
    ///
    /// The kind tag is local bookkeeping and is not part of the record.
    pub fn to_record(&self) -> Result<serde_json::Value> {
        let record = match self {
            Self::Ticket(draft) => serde_json::to_value(draft)?,
            Self::Order(draft) => serde_json::to_value(draft)?,
            Self::Payment(draft) => serde_json::to_value(draft)?,
            Self::TableStatus(update) => json!({
                "id": update.table_id,
                "status": update.status,
            }),
        };
        Ok(record)
    }
}

/// A pending mutation awaiting delivery to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedWrite {
    /// Unique identifier, also the correlation key into the conflict log
    pub id: WriteId,
    /// The typed mutation body
    pub payload: WritePayload,
    /// Creation time (Unix ms); the authority for ordering and
    /// last-write-wins comparison. Never rewritten on retry.
    pub timestamp: i64,
    /// Failed replay attempts so far; never reset
    pub retries: u32,
}

impl QueuedWrite {
    /// Create a new queued write stamped with the current wall clock
    #[must_use]
    pub fn new(payload: WritePayload) -> Self {
        Self {
            id: WriteId::new(),
            payload,
            timestamp: now_millis(),
            retries: 0,
        }
    }

    /// The kind discriminant of the payload
    #[must_use]
    pub const fn kind(&self) -> WriteKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_update(table_id: &str) -> WritePayload {
        WritePayload::TableStatus(TableStatusUpdate {
            table_id: table_id.to_string(),
            status: TableState::Occupied,
        })
    }

    #[test]
    fn test_write_id_unique() {
        let id1 = WriteId::new();
        let id2 = WriteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_write_id_parse() {
        let id = WriteId::new();
        let parsed: WriteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_payload_tag_round_trip() {
        let payload = table_update("t1");
        let encoded = serde_json::to_string(&payload).unwrap();
        assert!(encoded.contains("\"kind\":\"table_status\""));

        let decoded: WritePayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_record_id() {
        assert_eq!(table_update("t1").record_id(), Some("t1"));

        let order = WritePayload::Order(OrderDraft {
            id: None,
            restaurant_id: "r1".to_string(),
            table_id: None,
            lines: vec![],
            total_cents: 0,
            status: OrderStatus::Open,
        });
        assert_eq!(order.record_id(), None);
    }

    #[test]
    fn test_kind_collections() {
        assert_eq!(WriteKind::Ticket.collection(), "order_tickets");
        assert_eq!(WriteKind::Order.collection(), "orders");
        assert_eq!(WriteKind::Payment.collection(), "payments");
        assert_eq!(WriteKind::TableStatus.collection(), "dining_tables");
    }

    #[test]
    fn test_only_payments_are_append_only() {
        assert!(WriteKind::Payment.append_only());
        assert!(!WriteKind::Ticket.append_only());
        assert!(!WriteKind::Order.append_only());
        assert!(!WriteKind::TableStatus.append_only());
    }

    #[test]
    fn test_validate_rejects_missing_target() {
        let err = table_update("  ").validate().unwrap_err();
        assert!(err.to_string().contains("table_id"));

        assert!(table_update("t1").validate().is_ok());
    }

    #[test]
    fn test_to_record_omits_absent_id() {
        let order = WritePayload::Order(OrderDraft {
            id: None,
            restaurant_id: "r1".to_string(),
            table_id: Some("t1".to_string()),
            lines: vec![OrderLine {
                menu_item_id: "m1".to_string(),
                quantity: 2,
                unit_price_cents: 950,
                note: None,
            }],
            total_cents: 1900,
            status: OrderStatus::Placed,
        });

        let record = order.to_record().unwrap();
        assert!(record.get("id").is_none());
        assert!(record.get("kind").is_none());
        assert_eq!(record["restaurant_id"], "r1");
        assert_eq!(record["total_cents"], 1900);
    }

    #[test]
    fn test_to_record_table_status_shape() {
        let record = table_update("t1").to_record().unwrap();
        assert_eq!(record["id"], "t1");
        assert_eq!(record["status"], "occupied");
    }

    #[test]
    fn test_queued_write_new() {
        let write = QueuedWrite::new(table_update("t1"));
        assert_eq!(write.retries, 0);
        assert!(write.timestamp > 0);
        assert_eq!(write.kind(), WriteKind::TableStatus);
    }
}
