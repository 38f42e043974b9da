//! Transaction: an immutable, append-only record of stock movement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::item::Capacity;
use crate::types::{truncate_millis, ItemId, TransactionId, MAX_QUANTITY};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Stock received; quantities increase.
    In,
    /// Stock dispensed; quantities decrease.
    Out,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Apply a movement of `quantity` to an on-hand amount.
    ///
    /// Returns `None` when the result would be negative (`Out`) or would
    /// exceed [`MAX_QUANTITY`] (`In`).
    pub fn apply(self, on_hand: u64, quantity: u64) -> Option<u64> {
        match self {
            Direction::In => on_hand
                .checked_add(quantity)
                .filter(|total| *total <= MAX_QUANTITY),
            Direction::Out => on_hand.checked_sub(quantity),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(CoreError::UnknownDirection(other.to_string())),
        }
    }
}

/// One line of a movement: an item, a positive quantity and optional
/// metadata copied from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLine {
    pub item_id: ItemId,
    pub quantity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TransactionLine {
    pub fn new(item_id: impl Into<ItemId>, quantity: u64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
            unit: None,
            capacity: None,
            notes: None,
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A committed ledger record. There is no way to mutate one after it has
/// been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub date: DateTime<Utc>,
    pub department: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub lines: Vec<TransactionLine>,
}

impl Transaction {
    /// Build a transaction from a validated request.
    ///
    /// The date is cut down to whole milliseconds, the precision it is
    /// stored with.
    pub fn from_request(id: TransactionId, direction: Direction, request: MovementRequest) -> Self {
        Self {
            id,
            date: truncate_millis(request.date),
            department: request.department,
            direction,
            lines: request.lines,
        }
    }

    /// Sum of all line quantities, saturating.
    pub fn total_quantity(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.quantity))
    }

    pub fn is_dispense(&self) -> bool {
        self.direction == Direction::Out
    }
}

/// A request to move stock: dynamic list of lines, a department label and
/// the movement date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub lines: Vec<TransactionLine>,
    pub department: String,
    pub date: DateTime<Utc>,
}

/// Request for an `out` movement.
pub type DispenseRequest = MovementRequest;

/// Request for an `in` movement.
pub type ReceiveRequest = MovementRequest;

impl MovementRequest {
    pub fn new(department: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            lines: Vec::new(),
            department: department.into(),
            date,
        }
    }

    pub fn line(mut self, line: TransactionLine) -> Self {
        self.lines.push(line);
        self
    }
}
