pub mod collector;
pub mod error;
pub mod snapshot;

pub use collector::{CollectionOutcome, CollectionReport};
pub use error::IngestionError;
pub use snapshot::{InventorySnapshot, SnapshotLoader};
