//! Read-only catalog models
//!
//! Denormalized snapshots of backend records, cached locally so the
//! terminal can keep rendering menus and floor plans while offline.
//! These are replaced wholesale on each successful fetch and are never
//! mutated by the sync engine.

use serde::{Deserialize, Serialize};

/// Occupancy state of a dining table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    Free,
    Occupied,
    Reserved,
}

/// A restaurant (tenant) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// ISO 4217 currency code used for menu prices
    pub currency: String,
}

/// A menu category, scoped to a restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Display order within the menu
    pub position: u32,
}

/// A menu item, scoped to a restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub category_id: String,
    pub name: String,
    pub price_cents: i64,
    pub available: bool,
}

/// A dining table, scoped to a restaurant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub label: String,
    pub seats: u32,
    pub status: TableState,
}
