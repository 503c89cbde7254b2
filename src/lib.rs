//! pagewarden - SEO page health, deduplication, and AI content repair.
//!
//! Maintains the content pages of a directory site: scans word-count health,
//! flags duplicate metadata, and rewrites thin pages through a hosted
//! chat-completion API with full rollback history.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
