//! Deterministic synthetic data generation for the salesforge dataset.
//!
//! Base entities are synthesized first, then the order composer builds sales
//! and line items against a price table of already-generated products.

pub mod compose;
pub mod engine;
pub mod errors;
pub mod faker;
pub mod ids;
pub mod model;
pub mod synthesize;

pub use compose::{DateWindow, OrderComposer, Orders, PriceTable};
pub use engine::{BaseTables, Dataset, GenerationEngine, GenerationRun};
pub use errors::GenerationError;
pub use faker::{FakeDataProvider, FakeRsProvider, LocaleKey};
pub use ids::{EntityKind, IdAllocator};
pub use model::{EntityCounts, GenerateOptions, GenerationReport, TableReport};
