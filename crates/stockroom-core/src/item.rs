//! Item: a stock-keeping unit tracked with an on-hand quantity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::Language;
use crate::types::{truncate_millis, ItemId};

/// Packaging capacity of one unit, e.g. 500 ml per bottle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capacity {
    pub value: u32,
    pub unit: String,
}

impl Capacity {
    pub fn new(value: u32, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// A stored stock item.
///
/// `quantity` only changes through ledger movements or an explicit edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// English display name.
    pub name: String,
    /// Arabic display name.
    pub name_ar: String,
    pub quantity: u64,
    /// Low-stock threshold, inclusive.
    pub min_quantity: u64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    pub last_updated: DateTime<Utc>,
}

impl Item {
    /// Build a stored item from user input.
    pub fn from_new(id: ItemId, new: NewItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            name_ar: new.name_ar,
            quantity: new.quantity,
            min_quantity: new.min_quantity,
            category: new.category,
            unit: new.unit,
            capacity: new.capacity,
            last_updated: truncate_millis(now),
        }
    }

    /// True when on-hand stock is at or below the threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    /// Display name in the requested language.
    pub fn display_name(&self, language: Language) -> &str {
        language.pick(&self.name, &self.name_ar)
    }

    /// Apply a manual edit. Validation is the caller's job.
    pub fn apply_changes(&mut self, changes: ItemChanges, now: DateTime<Utc>) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(name_ar) = changes.name_ar {
            self.name_ar = name_ar;
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(min_quantity) = changes.min_quantity {
            self.min_quantity = min_quantity;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(unit) = changes.unit {
            self.unit = unit;
        }
        if let Some(capacity) = changes.capacity {
            self.capacity = capacity;
        }
        self.last_updated = truncate_millis(now);
    }
}

/// Fields supplied when creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub name_ar: String,
    pub quantity: u64,
    pub min_quantity: u64,
    pub category: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub capacity: Option<Capacity>,
}

impl NewItem {
    pub fn new(
        name: impl Into<String>,
        name_ar: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            name_ar: name_ar.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn quantity(mut self, quantity: u64) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn min_quantity(mut self, min_quantity: u64) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// A manual edit. `None` leaves a field untouched; for the optional
/// descriptors `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemChanges {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub quantity: Option<u64>,
    pub min_quantity: Option<u64>,
    pub category: Option<String>,
    pub unit: Option<Option<String>>,
    pub capacity: Option<Option<Capacity>>,
}
