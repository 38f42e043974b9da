//! Reference model of on-hand stock.

use std::collections::HashMap;

use stockroom_core::{item_totals, Direction, ItemId, MovementRequest};

/// Quantities per item, updated the simple way.
///
/// A movement is allowed exactly when every item it names is known and
/// every per-item total can be applied without going negative or
/// overflowing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockModel {
    pub stock: HashMap<ItemId, u64>,
}

impl StockModel {
    pub fn new(stock: HashMap<ItemId, u64>) -> Self {
        Self { stock }
    }

    /// The quantities after `request`, or `None` if it must be rejected.
    pub fn after(&self, direction: Direction, request: &MovementRequest) -> Option<HashMap<ItemId, u64>> {
        let totals = item_totals(&request.lines).ok()?;
        let mut next = self.stock.clone();
        for (item_id, total) in totals {
            let on_hand = next.get_mut(&item_id)?;
            *on_hand = direction.apply(*on_hand, total)?;
        }
        Some(next)
    }

    /// Apply `request` if allowed. Returns whether it was applied.
    pub fn apply(&mut self, direction: Direction, request: &MovementRequest) -> bool {
        match self.after(direction, request) {
            Some(next) => {
                self.stock = next;
                true
            }
            None => false,
        }
    }
}
