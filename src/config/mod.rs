//! Configuration module for the crawler
//!
//! This module provides the `CrawlerConfig` struct and its type-safe builder
//! for configuring crawler instances with validation and sensible defaults.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::{CrawlerConfigBuilder, WithStorageDir};
pub use types::CrawlerConfig;
