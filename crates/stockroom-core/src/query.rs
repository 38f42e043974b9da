//! Read-side projections over items and transactions.
//!
//! Every function here is pure: it takes slices, returns fresh aggregates,
//! and treats empty input as an empty result rather than an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::transaction::Transaction;
use crate::types::{truncate_millis, ItemId};

/// Display language for names and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Ar,
}

impl Language {
    /// Pick the literal for this language.
    pub fn pick<'a>(self, en: &'a str, ar: &'a str) -> &'a str {
        match self {
            Language::En => en,
            Language::Ar => ar,
        }
    }
}

/// Inclusive date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The start is cut down to whole milliseconds so that a transaction
    /// recorded at `start` stays inside the range once stored.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: truncate_millis(start),
            end,
        }
    }

    /// A range that contains every representable date.
    pub fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        truncate_millis(self.start) <= at && at <= self.end
    }
}

/// Dispense activity of one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub department: String,
    /// Number of transactions.
    pub count: usize,
    /// Number of line entries across those transactions.
    pub line_count: usize,
    pub total_quantity: u64,
}

/// Dispense totals of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub name: String,
    pub name_ar: String,
    pub total_quantity: u64,
    /// Number of dispense transactions naming the item.
    pub dispense_count: usize,
}

/// Transactions recorded on one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_items: usize,
    pub dispense_count: usize,
    pub low_stock_count: usize,
}

/// On-hand quantity of one item, for stock charts and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u64,
    pub low_stock: bool,
}

/// Items at or below their minimum quantity.
pub fn low_stock(items: &[Item]) -> Vec<&Item> {
    items.iter().filter(|item| item.is_low_stock()).collect()
}

/// Per-department dispense totals for transactions dated within `range`.
///
/// Only `out` transactions count. Results are ordered by department.
pub fn summary_by_department(
    transactions: &[Transaction],
    range: DateRange,
) -> Vec<DepartmentSummary> {
    let mut by_department: BTreeMap<&str, DepartmentSummary> = BTreeMap::new();

    for txn in transactions
        .iter()
        .filter(|t| t.is_dispense() && range.contains(t.date))
    {
        let summary = by_department
            .entry(txn.department.as_str())
            .or_insert_with(|| DepartmentSummary {
                department: txn.department.clone(),
                count: 0,
                line_count: 0,
                total_quantity: 0,
            });
        summary.count += 1;
        summary.line_count += txn.lines.len();
        summary.total_quantity = summary.total_quantity.saturating_add(txn.total_quantity());
    }

    by_department.into_values().collect()
}

/// Per-item dispense totals, joined against current items.
///
/// Lines whose item no longer exists are skipped. Ordered by total quantity
/// descending, then by name.
pub fn summary_by_item(transactions: &[Transaction], items: &[Item]) -> Vec<ItemSummary> {
    let known: HashMap<&ItemId, &Item> = items.iter().map(|item| (&item.id, item)).collect();
    let mut by_item: HashMap<&ItemId, ItemSummary> = HashMap::new();

    for txn in transactions.iter().filter(|t| t.is_dispense()) {
        let mut seen: BTreeSet<&ItemId> = BTreeSet::new();
        for line in &txn.lines {
            let Some(item) = known.get(&line.item_id) else {
                continue;
            };
            let summary = by_item.entry(&line.item_id).or_insert_with(|| ItemSummary {
                item_id: item.id.clone(),
                name: item.name.clone(),
                name_ar: item.name_ar.clone(),
                total_quantity: 0,
                dispense_count: 0,
            });
            summary.total_quantity = summary.total_quantity.saturating_add(line.quantity);
            if seen.insert(&line.item_id) {
                summary.dispense_count += 1;
            }
        }
    }

    let mut summaries: Vec<ItemSummary> = by_item.into_values().collect();
    summaries.sort_by(|a, b| {
        b.total_quantity
            .cmp(&a.total_quantity)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// The `n` most recently dated transactions, newest first.
pub fn recent_transactions(transactions: &[Transaction], n: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(n);
    sorted
}

/// Transaction counts for the `days` calendar days ending at `today`,
/// oldest first. Days without activity are reported with a zero count.
pub fn daily_activity(transactions: &[Transaction], today: NaiveDate, days: u32) -> Vec<DailyCount> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for txn in transactions {
        *counts.entry(txn.date.date_naive()).or_insert(0) += 1;
    }

    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| DailyCount {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Dashboard headline numbers.
pub fn dashboard(items: &[Item], transactions: &[Transaction]) -> DashboardStats {
    DashboardStats {
        total_items: items.len(),
        dispense_count: transactions.iter().filter(|t| t.is_dispense()).count(),
        low_stock_count: items.iter().filter(|item| item.is_low_stock()).count(),
    }
}

/// Stock levels in item order, named in `language`.
pub fn stock_levels(items: &[Item], language: Language) -> Vec<StockLevel> {
    items
        .iter()
        .map(|item| StockLevel {
            item_id: item.id.clone(),
            name: item.display_name(language).to_string(),
            quantity: item.quantity,
            low_stock: item.is_low_stock(),
        })
        .collect()
}
