//! Tessera Core: shared types and errors.
//!
//! This crate provides the foundational types used across all Tessera crates.
//! It has no internal Tessera dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`ids`]: Document identifiers

pub mod error;
pub mod ids;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use ids::LocalDocumentId;
