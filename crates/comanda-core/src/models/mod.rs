//! Data models for Comanda

mod catalog;
mod conflict;
mod write;

pub use catalog::{DiningTable, MenuCategory, MenuItem, Restaurant, TableState};
pub use conflict::ConflictRecord;
pub use write::{
    OrderDraft, OrderLine, OrderStatus, PaymentDraft, PaymentMethod, QueuedWrite,
    TableStatusUpdate, TicketDraft, TicketLine, TicketStatus, WriteId, WriteKind, WritePayload,
};
