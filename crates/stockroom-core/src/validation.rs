//! Input validation: structural checks that need no store access.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::item::{ItemChanges, NewItem};
use crate::transaction::{MovementRequest, TransactionLine};
use crate::types::{ItemId, MAX_QUANTITY};

/// Validate a new item's required display fields.
pub fn validate_new_item(item: &NewItem) -> Result<(), ValidationError> {
    require("name", &item.name)?;
    require("nameAr", &item.name_ar)?;
    require("category", &item.category)?;
    within_range("quantity", item.quantity)?;
    within_range("minQuantity", item.min_quantity)?;
    Ok(())
}

/// Validate a manual edit: fields that are being set must not be blank.
pub fn validate_changes(changes: &ItemChanges) -> Result<(), ValidationError> {
    if let Some(name) = &changes.name {
        require("name", name)?;
    }
    if let Some(name_ar) = &changes.name_ar {
        require("nameAr", name_ar)?;
    }
    if let Some(category) = &changes.category {
        require("category", category)?;
    }
    if let Some(quantity) = changes.quantity {
        within_range("quantity", quantity)?;
    }
    if let Some(min_quantity) = changes.min_quantity {
        within_range("minQuantity", min_quantity)?;
    }
    Ok(())
}

/// Validate the shape of a movement request.
///
/// Checks:
/// - department is present
/// - at least one line
/// - every line names an item and moves a positive quantity
/// - per-item totals fit in a `u64`
pub fn validate_request(request: &MovementRequest) -> Result<(), ValidationError> {
    require("department", &request.department)?;

    if request.lines.is_empty() {
        return Err(ValidationError::NoLines);
    }

    for (index, line) in request.lines.iter().enumerate() {
        require("itemId", line.item_id.as_str())?;
        if line.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                line: index,
                item_id: line.item_id.clone(),
            });
        }
    }

    item_totals(&request.lines).map(|_| ())
}

/// Total requested quantity per item across all lines.
///
/// A total above [`MAX_QUANTITY`] is an overflow.
pub fn item_totals(lines: &[TransactionLine]) -> Result<BTreeMap<ItemId, u64>, ValidationError> {
    let mut totals: BTreeMap<ItemId, u64> = BTreeMap::new();
    for line in lines {
        let total = totals.entry(line.item_id.clone()).or_insert(0);
        *total = total
            .checked_add(line.quantity)
            .filter(|sum| *sum <= MAX_QUANTITY)
            .ok_or_else(|| ValidationError::QuantityOverflow {
                item_id: line.item_id.clone(),
            })?;
    }
    Ok(totals)
}

fn within_range(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value > MAX_QUANTITY {
        Err(ValidationError::QuantityOutOfRange { field, value })
    } else {
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
