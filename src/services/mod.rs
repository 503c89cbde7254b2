//! Pipeline services: inventory import, scanning, duplicate detection,
//! content repair, and metadata seeding.

pub mod dedup;
pub mod generate;
pub mod health;
pub mod import;
pub mod metadata;

pub use dedup::{DedupReport, DuplicateDetector};
pub use generate::{ContentFixer, FixReport, Rollbacker, RollbackReport, RollbackTarget};
pub use health::{InventoryScanner, ScanReport};
pub use import::{ImportPage, ImportReport, InventoryImporter};
pub use metadata::{MetadataSeeder, SeedReport};
