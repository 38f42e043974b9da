//! Receipts and inventory reports.
//!
//! Documents are built from already-resolved data; renderers never touch
//! the store. Two renderers are provided: bilingual plain text and JSON.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use stockroom_core::query::{self, DailyCount, DepartmentSummary, StockLevel};
use stockroom_core::{
    Capacity, DateRange, Direction, Item, ItemId, Language, Transaction, TransactionId,
};
use thiserror::Error;

/// Errors raised while rendering a document.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("formatting failed")]
    Format(#[from] std::fmt::Error),
}

/// One line of a receipt, joined with the item's names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub item_id: ItemId,
    pub name: String,
    pub name_ar: String,
    pub quantity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReceiptLine {
    pub fn display_name(&self, language: Language) -> &str {
        language.pick(&self.name, &self.name_ar)
    }
}

/// A printable record of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseReceipt {
    pub transaction_id: TransactionId,
    pub date: DateTime<Utc>,
    pub department: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub lines: Vec<ReceiptLine>,
}

impl DispenseReceipt {
    /// Join a transaction with the items its lines name.
    ///
    /// Items deleted since the transaction was recorded are shown by id.
    pub fn resolve(transaction: &Transaction, items: &HashMap<ItemId, Item>) -> Self {
        let lines = transaction
            .lines
            .iter()
            .map(|line| {
                let (name, name_ar) = match items.get(&line.item_id) {
                    Some(item) => (item.name.clone(), item.name_ar.clone()),
                    None => (line.item_id.to_string(), line.item_id.to_string()),
                };
                ReceiptLine {
                    item_id: line.item_id.clone(),
                    name,
                    name_ar,
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    capacity: line.capacity.clone(),
                    notes: line.notes.clone(),
                }
            })
            .collect();

        Self {
            transaction_id: transaction.id.clone(),
            date: transaction.date,
            department: transaction.department.clone(),
            direction: transaction.direction,
            lines,
        }
    }

    /// File name without extension, e.g. `receipt-<id>`.
    pub fn file_stem(&self) -> String {
        format!("receipt-{}", self.transaction_id)
    }

    pub fn total_quantity(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.quantity))
    }
}

/// Snapshot of stock and recent ledger activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub language: Language,
    pub stock: Vec<StockLevel>,
    pub low_stock_count: usize,
    /// Number of `out` transactions in the ledger.
    pub dispense_count: usize,
    pub daily_activity: Vec<DailyCount>,
    pub departments: Vec<DepartmentSummary>,
}

impl InventoryReport {
    pub const FILE_STEM: &'static str = "inventory-report";

    /// Build a report covering the `days` calendar days up to `generated_at`.
    pub fn build(
        items: &[Item],
        transactions: &[Transaction],
        generated_at: DateTime<Utc>,
        days: u32,
        language: Language,
    ) -> Self {
        let stats = query::dashboard(items, transactions);
        let daily_activity = query::daily_activity(transactions, generated_at.date_naive(), days);

        let range = match daily_activity.first().and_then(|day| day.date.and_hms_opt(0, 0, 0)) {
            Some(start) => DateRange::new(start.and_utc(), generated_at),
            None => DateRange::new(generated_at, generated_at),
        };

        Self {
            generated_at,
            language,
            stock: query::stock_levels(items, language),
            low_stock_count: stats.low_stock_count,
            dispense_count: stats.dispense_count,
            daily_activity,
            departments: query::summary_by_department(transactions, range),
        }
    }
}

/// Turns documents into text.
pub trait Renderer {
    fn render_receipt(&self, receipt: &DispenseReceipt) -> Result<String, ExportError>;

    fn render_report(&self, report: &InventoryReport) -> Result<String, ExportError>;
}

/// Plain-text renderer with English or Arabic labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    pub language: Language,
}

impl TextRenderer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    fn label<'a>(&self, en: &'a str, ar: &'a str) -> &'a str {
        self.language.pick(en, ar)
    }
}

impl Renderer for TextRenderer {
    fn render_receipt(&self, receipt: &DispenseReceipt) -> Result<String, ExportError> {
        let mut out = String::new();

        let title = match receipt.direction {
            Direction::Out => self.label("Inventory Dispense Receipt", "فاتورة صرف مخزون"),
            Direction::In => self.label("Inventory Intake Receipt", "إيصال استلام مخزون"),
        };
        writeln!(out, "{title}")?;
        writeln!(
            out,
            "{}: {}",
            self.label("Transaction ID", "رقم المعاملة"),
            receipt.transaction_id
        )?;
        writeln!(
            out,
            "{}: {}",
            self.label("Date", "التاريخ"),
            receipt.date.format("%Y-%m-%d")
        )?;
        writeln!(
            out,
            "{}: {}",
            self.label("Department", "القسم"),
            receipt.department
        )?;

        for line in &receipt.lines {
            writeln!(out)?;
            writeln!(
                out,
                "{}: {}",
                self.label("Item Name", "اسم الصنف"),
                line.display_name(self.language)
            )?;
            write!(out, "{}: {}", self.label("Quantity", "الكمية"), line.quantity)?;
            if let Some(unit) = &line.unit {
                write!(out, " {unit}")?;
            }
            if let Some(capacity) = &line.capacity {
                write!(out, " ({} {})", capacity.value, capacity.unit)?;
            }
            writeln!(out)?;
            if let Some(notes) = &line.notes {
                writeln!(out, "{}: {}", self.label("Notes", "ملاحظات"), notes)?;
            }
        }

        Ok(out)
    }

    fn render_report(&self, report: &InventoryReport) -> Result<String, ExportError> {
        let mut out = String::new();

        writeln!(out, "{}", self.label("Inventory Report", "تقرير المخزون"))?;
        writeln!(
            out,
            "{}: {}",
            self.label("Date", "التاريخ"),
            report.generated_at.format("%Y-%m-%d")
        )?;

        writeln!(out)?;
        writeln!(out, "{}", self.label("Inventory Summary", "ملخص المخزون"))?;
        for level in &report.stock {
            write!(out, "  {}: {}", level.name, level.quantity)?;
            if level.low_stock {
                write!(out, " ({})", self.label("low stock", "مخزون منخفض"))?;
            }
            writeln!(out)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.label("Transactions Summary", "ملخص المعاملات"))?;
        writeln!(
            out,
            "  {}: {}",
            self.label("Total Transactions", "إجمالي المعاملات"),
            report.dispense_count
        )?;
        writeln!(
            out,
            "  {}: {}",
            self.label("Low Stock Items", "أصناف منخفضة المخزون"),
            report.low_stock_count
        )?;

        writeln!(out)?;
        writeln!(out, "{}", self.label("Daily Activity", "النشاط اليومي"))?;
        for day in &report.daily_activity {
            writeln!(out, "  {}: {}", day.date.format("%Y-%m-%d"), day.count)?;
        }

        if !report.departments.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.label("Departments", "الأقسام"))?;
            for summary in &report.departments {
                writeln!(
                    out,
                    "  {}: {} / {}",
                    summary.department, summary.count, summary.total_quantity
                )?;
            }
        }

        Ok(out)
    }
}

/// JSON renderer backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl JsonRenderer {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ExportError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

impl Renderer for JsonRenderer {
    fn render_receipt(&self, receipt: &DispenseReceipt) -> Result<String, ExportError> {
        self.encode(receipt)
    }

    fn render_report(&self, report: &InventoryReport) -> Result<String, ExportError> {
        self.encode(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use stockroom_core::{MovementRequest, NewItem, TransactionLine};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn rice() -> Item {
        let new = NewItem::new("Rice", "أرز", "Food").quantity(6).min_quantity(2);
        Item::from_new(ItemId::from("A"), new, at(1, 8))
    }

    fn soap() -> Item {
        let new = NewItem::new("Soap", "صابون", "Cleaning").quantity(1).min_quantity(3);
        Item::from_new(ItemId::from("S"), new, at(1, 8))
    }

    fn dispense(id: &str, date: DateTime<Utc>, department: &str, lines: &[(&str, u64)]) -> Transaction {
        let mut request = MovementRequest::new(department, date);
        for (item_id, quantity) in lines {
            request = request.line(TransactionLine::new(*item_id, *quantity));
        }
        Transaction::from_request(TransactionId::from(id), Direction::Out, request)
    }

    fn item_map(items: &[Item]) -> HashMap<ItemId, Item> {
        items.iter().map(|i| (i.id.clone(), i.clone())).collect()
    }

    #[test]
    fn test_receipt_resolves_names() {
        let txn = dispense("t1", at(2, 9), "Kitchen", &[("A", 4), ("GONE", 1)]);
        let receipt = DispenseReceipt::resolve(&txn, &item_map(&[rice()]));

        assert_eq!(receipt.file_stem(), "receipt-t1");
        assert_eq!(receipt.total_quantity(), 5);
        assert_eq!(receipt.lines[0].name, "Rice");
        assert_eq!(receipt.lines[0].display_name(Language::Ar), "أرز");
        assert_eq!(receipt.lines[1].name, "GONE");
    }

    #[test]
    fn test_text_receipt_english() {
        let mut txn = dispense("t1", at(2, 9), "Kitchen", &[("A", 4)]);
        txn.lines[0] = TransactionLine::new("A", 4).unit("kg").notes("lunch");
        let receipt = DispenseReceipt::resolve(&txn, &item_map(&[rice()]));

        let text = TextRenderer::new(Language::En).render_receipt(&receipt).unwrap();
        assert!(text.starts_with("Inventory Dispense Receipt\n"));
        assert!(text.contains("Transaction ID: t1\n"));
        assert!(text.contains("Date: 2024-03-02\n"));
        assert!(text.contains("Department: Kitchen\n"));
        assert!(text.contains("Item Name: Rice\n"));
        assert!(text.contains("Quantity: 4 kg\n"));
        assert!(text.contains("Notes: lunch\n"));
    }

    #[test]
    fn test_text_receipt_arabic_is_default() {
        let txn = dispense("t1", at(2, 9), "Kitchen", &[("A", 4)]);
        let receipt = DispenseReceipt::resolve(&txn, &item_map(&[rice()]));

        let text = TextRenderer::default().render_receipt(&receipt).unwrap();
        assert!(text.starts_with("فاتورة صرف مخزون\n"));
        assert!(text.contains("اسم الصنف: أرز\n"));
        assert!(text.contains("الكمية: 4\n"));
    }

    #[test]
    fn test_report_build() {
        let items = vec![rice(), soap()];
        let transactions = vec![
            dispense("t1", at(2, 9), "Kitchen", &[("A", 4)]),
            dispense("t2", at(5, 9), "Kitchen", &[("A", 6)]),
            dispense("t3", at(7, 9), "Laundry", &[("S", 1)]),
        ];

        let report = InventoryReport::build(&items, &transactions, at(7, 18), 3, Language::En);
        assert_eq!(report.dispense_count, 3);
        assert_eq!(report.low_stock_count, 1);
        assert_eq!(report.stock[0].name, "Rice");
        assert_eq!(
            report.daily_activity.iter().map(|d| d.count).collect::<Vec<_>>(),
            vec![1, 0, 1]
        );
        // Only activity inside the covered days is summarized.
        let departments: Vec<_> = report
            .departments
            .iter()
            .map(|d| (d.department.as_str(), d.count, d.total_quantity))
            .collect();
        assert_eq!(departments, vec![("Kitchen", 1, 6), ("Laundry", 1, 1)]);
    }

    #[test]
    fn test_text_report() {
        let items = vec![rice(), soap()];
        let transactions = vec![dispense("t1", at(2, 9), "Kitchen", &[("A", 4)])];
        let report = InventoryReport::build(&items, &transactions, at(2, 18), 7, Language::En);

        let text = TextRenderer::new(Language::En).render_report(&report).unwrap();
        assert!(text.starts_with("Inventory Report\n"));
        assert!(text.contains("  Rice: 6\n"));
        assert!(text.contains("  Soap: 1 (low stock)\n"));
        assert!(text.contains("  Total Transactions: 1\n"));
        assert!(text.contains("  2024-03-02: 1\n"));
        assert!(text.contains("  Kitchen: 1 / 4\n"));

        let arabic = TextRenderer::new(Language::Ar).render_report(&report).unwrap();
        assert!(arabic.starts_with("تقرير المخزون\n"));
        assert!(arabic.contains("إجمالي المعاملات: 1"));
    }

    #[test]
    fn test_json_receipt() {
        let txn = dispense("t1", at(2, 9), "Kitchen", &[("A", 4)]);
        let receipt = DispenseReceipt::resolve(&txn, &item_map(&[rice()]));

        let json = JsonRenderer::default().render_receipt(&receipt).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["transactionId"], "t1");
        assert_eq!(value["type"], "out");
        assert_eq!(value["lines"][0]["nameAr"], "أرز");
        assert!(value["lines"][0].get("unit").is_none());

        let pretty = JsonRenderer::pretty().render_receipt(&receipt).unwrap();
        assert!(pretty.contains('\n'));
    }
}
