//! Proptest generators for property-based testing.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use proptest::sample::Index;

use stockroom_core::{Capacity, DispenseRequest, ItemId, NewItem, TransactionLine};

/// Generate an English item name.
pub fn item_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,11}".prop_map(String::from)
}

/// Generate a category.
pub fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Food".to_string()),
        Just("Cleaning".to_string()),
        Just("Linen".to_string()),
        Just("Tools".to_string()),
    ]
}

/// Generate a department name.
pub fn department() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Kitchen".to_string()),
        Just("Laundry".to_string()),
        Just("Housekeeping".to_string()),
        Just("Maintenance".to_string()),
    ]
}

/// Generate a movement date within 2023-2024.
pub fn date() -> impl Strategy<Value = DateTime<Utc>> {
    (1_672_531_200_000i64..1_735_689_600_000i64)
        .prop_filter_map("timestamp out of range", |ms| Utc.timestamp_millis_opt(ms).single())
}

/// Generate an optional packaging descriptor.
pub fn capacity() -> impl Strategy<Value = Option<Capacity>> {
    proptest::option::of(
        (1u32..=1000, prop_oneof![Just("ml"), Just("g"), Just("pcs")])
            .prop_map(|(value, unit)| Capacity::new(value, unit)),
    )
}

/// Generate a valid new item.
pub fn new_item() -> impl Strategy<Value = NewItem> {
    (item_name(), category(), 0u64..=50, 0u64..=10, capacity()).prop_map(
        |(name, category, quantity, min_quantity, capacity)| {
            let mut item = NewItem::new(name.clone(), format!("{name} (ar)"), category)
                .quantity(quantity)
                .min_quantity(min_quantity);
            item.capacity = capacity;
            item
        },
    )
}

/// One request line, naming an item by position among the seeded items.
#[derive(Debug, Clone)]
pub struct LineParams {
    pub item: Index,
    pub quantity: u64,
}

impl Arbitrary for LineParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Index>(), 1u64..=20)
            .prop_map(|(item, quantity)| LineParams { item, quantity })
            .boxed()
    }
}

/// Generate the lines of one request.
pub fn request_lines(max_lines: usize) -> impl Strategy<Value = Vec<LineParams>> {
    prop::collection::vec(any::<LineParams>(), 1..=max_lines)
}

/// Items to seed and a sequence of dispense requests against them.
#[derive(Debug, Clone)]
pub struct StockScenario {
    pub items: Vec<NewItem>,
    pub requests: Vec<(String, Vec<LineParams>)>,
}

impl Arbitrary for StockScenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::vec(new_item(), 1..=5),
            prop::collection::vec((department(), request_lines(4)), 1..=12),
        )
            .prop_map(|(items, requests)| StockScenario { items, requests })
            .boxed()
    }
}

/// Build a request over seeded `ids`.
///
/// `ids` must not be empty.
pub fn request_for(ids: &[ItemId], department: &str, lines: &[LineParams]) -> DispenseRequest {
    lines.iter().fold(
        DispenseRequest::new(department, Utc::now()),
        |request, line| {
            let id = ids[line.item.index(ids.len())].clone();
            request.line(TransactionLine::new(id, line.quantity))
        },
    )
}
