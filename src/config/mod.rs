//! Configuration module for registry lookups
//!
//! This module provides the `LookupConfig` struct, its validating builder and
//! a JSON file loader. Defaults mirror the conservative pacing the portal
//! tolerates.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::LookupConfigBuilder;
pub use types::LookupConfig;
