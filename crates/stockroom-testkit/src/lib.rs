//! # Stockroom Testkit
//!
//! Testing utilities for Stockroom.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready-made stockroom over an in-memory or SQLite store
//! - **Generators**: Proptest strategies for items and movement requests
//! - **Model**: a plain map of quantities that predicts what a dispense
//!   should do, for checking the real ledger against
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use stockroom_testkit::{StockModel, StockScenario, TestFixture};
//!
//! proptest! {
//!     #[test]
//!     fn dispense_matches_model(scenario: StockScenario) {
//!         // seed scenario.items, replay scenario.requests, compare with StockModel
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use stockroom_testkit::fixtures::{request, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let rice = fixture.seed_item("Rice", 10, 2).await?;
//! fixture.stockroom.dispense(request("Kitchen", &[(&rice, 4)])).await?;
//! assert_eq!(fixture.quantity(&rice).await?, Some(6));
//! ```

pub mod fixtures;
pub mod generators;
pub mod model;

pub use fixtures::{request, TestFixture};
pub use generators::{request_for, LineParams, StockScenario};
pub use model::StockModel;
