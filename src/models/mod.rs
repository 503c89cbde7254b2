//! Domain types shared across the pipeline.

pub mod audit;
pub mod page;

pub use audit::{AuditRun, PageOutcome, RunStatus, RunType};
pub use page::{ContentStatus, PageType, SeoPage};
