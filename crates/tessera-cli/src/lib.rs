//! # tessera-cli
//!
//! Command-line inspection for Tessera.
//!
//! This crate provides the `tessera` binary:
//! - `fields`: print the fields a document produces under a link configuration
//! - `pk encode` / `pk decode`: convert between document identifiers and
//!   primary keys
//!
//! Analyzer definitions can be loaded from a JSON file with `--analyzers`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod handlers;

pub use error::{Error, Result};
