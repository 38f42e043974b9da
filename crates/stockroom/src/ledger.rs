//! The Stockroom: items, the stock ledger and the views built on them.
//!
//! All writes go through a single writer lock, and every stock movement is
//! committed by one atomic store call, so two dispenses of the same item
//! can never both pass validation against the same on-hand quantity.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;

use stockroom_core::query::{self, DailyCount, DashboardStats, DepartmentSummary, ItemSummary, StockLevel};
use stockroom_core::{
    validate_changes, validate_new_item, validate_request, DateRange, Direction, DispenseRequest,
    Item, ItemChanges, ItemId, MovementRequest, NewItem, ReceiveRequest, Transaction,
    TransactionId, TransactionLine, ValidationError,
};
use stockroom_store::{Collection, MovementResult, Store, StoreExt};

use crate::config::StockroomConfig;
use crate::error::{Result, StockroomError};
use crate::report::{DispenseReceipt, InventoryReport, Renderer, TextRenderer};

/// The main Stockroom struct.
///
/// Owns its store. Use [`Stockroom::into_store`] to take it back, e.g. to
/// close a `SqliteStore` explicitly.
pub struct Stockroom<S: Store> {
    /// The storage backend.
    store: S,
    /// Configuration.
    config: StockroomConfig,
    /// Serializes writes within this process.
    writer: Mutex<()>,
}

impl<S: Store> Stockroom<S> {
    /// Create a new stockroom over `store`.
    pub fn new(store: S, config: StockroomConfig) -> Self {
        Self {
            store,
            config,
            writer: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StockroomConfig {
        &self.config
    }

    /// Consume the stockroom and return its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Dispense stock to a department.
    ///
    /// Either every line is applied and one `out` transaction is recorded,
    /// or nothing changes. Not idempotent: submitting the same request
    /// twice records two transactions.
    pub async fn dispense(&self, request: DispenseRequest) -> Result<TransactionId> {
        self.record_movement(Direction::Out, request).await
    }

    /// Receive stock back in. Same all-or-nothing contract as `dispense`.
    pub async fn receive(&self, request: ReceiveRequest) -> Result<TransactionId> {
        self.record_movement(Direction::In, request).await
    }

    async fn record_movement(
        &self,
        direction: Direction,
        request: MovementRequest,
    ) -> Result<TransactionId> {
        let department = request.department.clone();
        let line_count = request.lines.len();

        let outcome = self.commit_movement(direction, request).await;
        match &outcome {
            Ok(transaction_id) => tracing::info!(
                %transaction_id,
                %direction,
                department = %department,
                lines = line_count,
                "stock movement recorded"
            ),
            Err(err) => tracing::warn!(
                %direction,
                department = %department,
                error = %err,
                "stock movement rejected"
            ),
        }
        outcome
    }

    async fn commit_movement(
        &self,
        direction: Direction,
        request: MovementRequest,
    ) -> Result<TransactionId> {
        validate_request(&request)?;

        let _writer = self.writer.lock().await;

        self.check_stock(direction, &request.lines).await?;

        let transaction = Transaction::from_request(TransactionId::generate(), direction, request);
        match self.store.apply_movement(&transaction, Utc::now()).await? {
            MovementResult::Applied => Ok(transaction.id),
            MovementResult::DuplicateTransaction => Err(StockroomError::DuplicateKey {
                collection: Collection::Transactions,
                id: transaction.id.into_string(),
            }),
            MovementResult::ItemMissing(item_id) => Err(StockroomError::ItemNotFound(item_id)),
            MovementResult::Insufficient {
                item_id,
                requested,
                available,
            } => Err(StockroomError::InsufficientQuantity {
                item_id,
                requested,
                available,
            }),
            MovementResult::Overflow(item_id) => {
                Err(ValidationError::QuantityOverflow { item_id }.into())
            }
        }
    }

    /// Read-only pass over the lines in order, before anything is written.
    ///
    /// Each item is fetched once; repeated lines for an item are checked
    /// against their running total.
    async fn check_stock(&self, direction: Direction, lines: &[TransactionLine]) -> Result<()> {
        let mut on_hand: HashMap<&ItemId, u64> = HashMap::new();
        let mut requested: HashMap<&ItemId, u64> = HashMap::new();

        for line in lines {
            let available = match on_hand.get(&line.item_id) {
                Some(quantity) => *quantity,
                None => {
                    let item = self
                        .store
                        .get_item(&line.item_id)
                        .await?
                        .ok_or_else(|| StockroomError::ItemNotFound(line.item_id.clone()))?;
                    on_hand.insert(&line.item_id, item.quantity);
                    item.quantity
                }
            };

            let total = requested.entry(&line.item_id).or_insert(0);
            *total = total.checked_add(line.quantity).ok_or_else(|| {
                ValidationError::QuantityOverflow {
                    item_id: line.item_id.clone(),
                }
            })?;
            let total = *total;

            if direction.apply(available, total).is_none() {
                return Err(match direction {
                    Direction::Out => StockroomError::InsufficientQuantity {
                        item_id: line.item_id.clone(),
                        requested: total,
                        available,
                    },
                    Direction::In => ValidationError::QuantityOverflow {
                        item_id: line.item_id.clone(),
                    }
                    .into(),
                });
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Item Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an item with a fresh id.
    pub async fn add_item(&self, new: NewItem) -> Result<ItemId> {
        validate_new_item(&new)?;

        let _writer = self.writer.lock().await;
        let item = Item::from_new(ItemId::generate(), new, Utc::now());
        self.store.add_item(&item).await?;

        tracing::info!(item_id = %item.id, name = %item.name, "item added");
        Ok(item.id)
    }

    /// Edit an item's fields. Returns the updated item.
    pub async fn update_item(&self, id: &ItemId, changes: ItemChanges) -> Result<Item> {
        validate_changes(&changes)?;

        let _writer = self.writer.lock().await;
        let mut item = self
            .store
            .get_item(id)
            .await?
            .ok_or_else(|| StockroomError::ItemNotFound(id.clone()))?;
        item.apply_changes(changes, Utc::now());
        self.store.put_item(&item).await?;

        tracing::info!(item_id = %item.id, "item updated");
        Ok(item)
    }

    /// Delete an item. Transactions that mention it are kept.
    pub async fn delete_item(&self, id: &ItemId) -> Result<()> {
        let _writer = self.writer.lock().await;
        if !self.store.delete_item(id).await? {
            return Err(StockroomError::ItemNotFound(id.clone()));
        }

        tracing::info!(item_id = %id, "item deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// All items, ordered by name.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        Ok(self.store.list_items().await?)
    }

    /// All transactions, oldest first.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.store.list_transactions().await?)
    }

    pub async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        Ok(self.store.get_item(id).await?)
    }

    pub async fn get_transaction(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        Ok(self.store.get_transaction(id).await?)
    }

    pub async fn items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        Ok(self.store.items_by_category(category).await?)
    }

    pub async fn transactions_by_department(&self, department: &str) -> Result<Vec<Transaction>> {
        Ok(self.store.transactions_by_department(department).await?)
    }

    /// Items at or below their minimum quantity.
    pub async fn low_stock(&self) -> Result<Vec<Item>> {
        let items = self.store.list_items().await?;
        Ok(query::low_stock(&items).into_iter().cloned().collect())
    }

    /// Dispense totals per department for transactions dated within `range`.
    pub async fn summary_by_department(&self, range: DateRange) -> Result<Vec<DepartmentSummary>> {
        let transactions = self
            .store
            .transactions_between(range.start, range.end)
            .await?;
        Ok(query::summary_by_department(&transactions, range))
    }

    /// Dispense totals per existing item.
    pub async fn summary_by_item(&self) -> Result<Vec<ItemSummary>> {
        let items = self.store.list_items().await?;
        let transactions = self.store.list_transactions().await?;
        Ok(query::summary_by_item(&transactions, &items))
    }

    /// The most recent transactions, newest first.
    ///
    /// `None` uses the configured `recent_limit`.
    pub async fn recent_transactions(&self, limit: Option<usize>) -> Result<Vec<Transaction>> {
        let transactions = self.store.list_transactions().await?;
        let limit = limit.unwrap_or(self.config.recent_limit);
        Ok(query::recent_transactions(&transactions, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Transaction counts for each of the last `report_days` days, oldest first.
    pub async fn daily_activity(&self) -> Result<Vec<DailyCount>> {
        let transactions = self.store.list_transactions().await?;
        Ok(query::daily_activity(
            &transactions,
            Utc::now().date_naive(),
            self.config.report_days,
        ))
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let items = self.store.list_items().await?;
        let transactions = self.store.list_transactions().await?;
        Ok(query::dashboard(&items, &transactions))
    }

    /// On-hand quantity of every item, named in the configured language.
    pub async fn stock_levels(&self) -> Result<Vec<StockLevel>> {
        let items = self.store.list_items().await?;
        Ok(query::stock_levels(&items, self.config.language))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the receipt for a recorded transaction.
    pub async fn receipt(&self, id: &TransactionId) -> Result<DispenseReceipt> {
        let transaction = self
            .store
            .get_transaction(id)
            .await?
            .ok_or_else(|| StockroomError::TransactionNotFound(id.clone()))?;

        let ids: Vec<ItemId> = transaction.lines.iter().map(|l| l.item_id.clone()).collect();
        let items = self.store.resolve_items(&ids).await?;
        Ok(DispenseReceipt::resolve(&transaction, &items))
    }

    /// Build an inventory report as of now.
    pub async fn inventory_report(&self) -> Result<InventoryReport> {
        let items = self.store.list_items().await?;
        let transactions = self.store.list_transactions().await?;
        Ok(InventoryReport::build(
            &items,
            &transactions,
            Utc::now(),
            self.config.report_days,
            self.config.language,
        ))
    }

    /// A text renderer in the configured language.
    pub fn text_renderer(&self) -> TextRenderer {
        TextRenderer::new(self.config.language)
    }

    pub fn render_receipt<R: Renderer + ?Sized>(
        &self,
        receipt: &DispenseReceipt,
        renderer: &R,
    ) -> Result<String> {
        renderer.render_receipt(receipt).map_err(|err| {
            tracing::error!(
                transaction_id = %receipt.transaction_id,
                error = %err,
                "receipt export failed"
            );
            StockroomError::Export(err)
        })
    }

    pub fn render_report<R: Renderer + ?Sized>(
        &self,
        report: &InventoryReport,
        renderer: &R,
    ) -> Result<String> {
        renderer.render_report(report).map_err(|err| {
            tracing::error!(error = %err, "inventory report export failed");
            StockroomError::Export(err)
        })
    }

    /// Build and render the receipt for `id` in one step.
    pub async fn export_receipt<R: Renderer + ?Sized>(
        &self,
        id: &TransactionId,
        renderer: &R,
    ) -> Result<String> {
        let receipt = self.receipt(id).await?;
        self.render_receipt(&receipt, renderer)
    }

    /// Build and render an inventory report in one step.
    pub async fn export_report<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<String> {
        let report = self.inventory_report().await?;
        self.render_report(&report, renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use stockroom_store::MemoryStore;

    use crate::report::ExportError;

    async fn stockroom_with(items: &[(&str, u64, u64)]) -> (Stockroom<MemoryStore>, Vec<ItemId>) {
        let stockroom = Stockroom::new(MemoryStore::new(), StockroomConfig::default());
        let mut ids = Vec::new();
        for (name, quantity, min) in items {
            let id = stockroom
                .add_item(
                    NewItem::new(*name, format!("{name}-ar"), "General")
                        .quantity(*quantity)
                        .min_quantity(*min),
                )
                .await
                .unwrap();
            ids.push(id);
        }
        (stockroom, ids)
    }

    fn request(department: &str, lines: &[(&ItemId, u64)]) -> DispenseRequest {
        lines.iter().fold(
            DispenseRequest::new(department, Utc::now()),
            |request, (id, quantity)| request.line(TransactionLine::new((*id).clone(), *quantity)),
        )
    }

    async fn quantity(stockroom: &Stockroom<MemoryStore>, id: &ItemId) -> u64 {
        stockroom.get_item(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_dispense_decrements() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 10, 2)]).await;

        let txn_id = stockroom.dispense(request("Kitchen", &[(&ids[0], 4)])).await.unwrap();
        assert_eq!(quantity(&stockroom, &ids[0]).await, 6);

        let txn = stockroom.get_transaction(&txn_id).await.unwrap().unwrap();
        assert_eq!(txn.department, "Kitchen");
        assert_eq!(txn.direction, Direction::Out);
        assert_eq!(txn.lines, vec![TransactionLine::new(ids[0].clone(), 4)]);
    }

    #[tokio::test]
    async fn test_dispense_structural_validation() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 10, 2)]).await;

        let err = stockroom.dispense(request("Kitchen", &[])).await.unwrap_err();
        assert!(matches!(err, StockroomError::Validation(ValidationError::NoLines)));

        let err = stockroom.dispense(request("  ", &[(&ids[0], 1)])).await.unwrap_err();
        assert!(matches!(err, StockroomError::Validation(ValidationError::EmptyField(_))));

        let err = stockroom
            .dispense(request("Kitchen", &[(&ids[0], 1), (&ids[0], 0)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StockroomError::Validation(ValidationError::ZeroQuantity { line: 1, .. })
        ));
        assert!(stockroom.list_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_lines_use_running_total() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 5, 0)]).await;

        let err = stockroom
            .dispense(request("Kitchen", &[(&ids[0], 3), (&ids[0], 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StockroomError::InsufficientQuantity { requested: 6, available: 5, .. }
        ));
        assert_eq!(err.shortfall(), Some(1));
        assert_eq!(quantity(&stockroom, &ids[0]).await, 5);
    }

    #[tokio::test]
    async fn test_receive_increments() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 1, 2)]).await;

        let txn_id = stockroom
            .receive(request("Supplier", &[(&ids[0], 9)]))
            .await
            .unwrap();
        assert_eq!(quantity(&stockroom, &ids[0]).await, 10);

        let txn = stockroom.get_transaction(&txn_id).await.unwrap().unwrap();
        assert_eq!(txn.direction, Direction::In);

        let err = stockroom
            .receive(request("Supplier", &[(&ids[0], u64::MAX)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StockroomError::Validation(ValidationError::QuantityOverflow { .. })
        ));
        assert_eq!(quantity(&stockroom, &ids[0]).await, 10);
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 10, 2)]).await;

        let err = stockroom
            .add_item(NewItem::new("", "أرز", "Food"))
            .await
            .unwrap_err();
        assert!(matches!(err, StockroomError::Validation(ValidationError::EmptyField("name"))));

        let updated = stockroom
            .update_item(
                &ids[0],
                ItemChanges {
                    min_quantity: Some(12),
                    unit: Some(Some("kg".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.min_quantity, 12);
        assert_eq!(updated.unit.as_deref(), Some("kg"));
        assert_eq!(stockroom.low_stock().await.unwrap(), vec![updated]);

        stockroom.delete_item(&ids[0]).await.unwrap();
        assert!(matches!(
            stockroom.delete_item(&ids[0]).await,
            Err(StockroomError::ItemNotFound(_))
        ));
        assert!(matches!(
            stockroom.update_item(&ids[0], ItemChanges::default()).await,
            Err(StockroomError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_item_keeps_history() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 10, 2), ("Soap", 5, 1)]).await;
        let txn_id = stockroom
            .dispense(request("Kitchen", &[(&ids[0], 4), (&ids[1], 1)]))
            .await
            .unwrap();

        stockroom.delete_item(&ids[0]).await.unwrap();
        assert_eq!(stockroom.list_transactions().await.unwrap().len(), 1);

        let summary = stockroom.summary_by_item().await.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].name, "Soap");

        let receipt = stockroom.receipt(&txn_id).await.unwrap();
        assert_eq!(receipt.lines[0].name, ids[0].to_string());
        assert_eq!(receipt.lines[1].name, "Soap");
    }

    #[tokio::test]
    async fn test_queries() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 20, 2), ("Soap", 5, 5)]).await;
        for quantity in [4, 6] {
            stockroom
                .dispense(request("Kitchen", &[(&ids[0], quantity)]))
                .await
                .unwrap();
        }
        stockroom.receive(request("Supplier", &[(&ids[1], 1)])).await.unwrap();

        let now: DateTime<Utc> = Utc::now();
        let range = DateRange::new(now - Duration::hours(1), now + Duration::hours(1));
        let departments = stockroom.summary_by_department(range).await.unwrap();
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].department, "Kitchen");
        assert_eq!(departments[0].count, 2);
        assert_eq!(departments[0].total_quantity, 10);

        let stats = stockroom.dashboard().await.unwrap();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.dispense_count, 2);
        assert_eq!(stats.low_stock_count, 0);

        assert_eq!(stockroom.recent_transactions(Some(2)).await.unwrap().len(), 2);
        assert_eq!(stockroom.recent_transactions(None).await.unwrap().len(), 3);

        let activity = stockroom.daily_activity().await.unwrap();
        assert_eq!(activity.len(), 7);
        assert_eq!(activity.last().map(|d| d.count), Some(3));

        let levels = stockroom.stock_levels().await.unwrap();
        assert_eq!(levels[0].name, "Rice-ar");
        assert_eq!(levels[0].quantity, 10);

        assert_eq!(stockroom.items_by_category("General").await.unwrap().len(), 2);
        assert_eq!(
            stockroom.transactions_by_department("Supplier").await.unwrap().len(),
            1
        );
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render_receipt(&self, _: &DispenseReceipt) -> std::result::Result<String, ExportError> {
            Err(ExportError::Format(std::fmt::Error))
        }

        fn render_report(&self, _: &InventoryReport) -> std::result::Result<String, ExportError> {
            Err(ExportError::Format(std::fmt::Error))
        }
    }

    #[tokio::test]
    async fn test_exports() {
        let (stockroom, ids) = stockroom_with(&[("Rice", 10, 2)]).await;
        let txn_id = stockroom.dispense(request("Kitchen", &[(&ids[0], 4)])).await.unwrap();

        let text = stockroom
            .export_receipt(&txn_id, &stockroom.text_renderer())
            .await
            .unwrap();
        assert!(text.starts_with("فاتورة صرف مخزون"));

        let report = stockroom.export_report(&crate::JsonRenderer::default()).await.unwrap();
        assert!(report.contains("\"dispenseCount\":1"));

        let err = stockroom
            .export_receipt(&txn_id, &FailingRenderer)
            .await
            .unwrap_err();
        assert!(matches!(err, StockroomError::Export(_)));
        assert_eq!(quantity(&stockroom, &ids[0]).await, 6);

        let missing = TransactionId::from("missing");
        assert!(matches!(
            stockroom.receipt(&missing).await,
            Err(StockroomError::TransactionNotFound(_))
        ));
    }
}
