//! Document flattening and primary-key management for a full-text index.
//!
//! This crate turns JSON documents into the fields an inverted index writer
//! consumes, and manages the primary key that ties every indexed document to
//! its storage identifier.
//!
//! # Features
//!
//! - `fts-tantivy`: Register a `text` analyzer type backed by Tantivy's
//!   tokenizer pipeline (tokenizing, lower-casing, stemming)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      tessera-fts                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  AnalyzerRegistry (named analyzer pools)                    │
//! │  FieldMeta (per-path indexing configuration)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FieldIterator (document → Field stream)                    │
//! │  Field (mangled name, features, token stream)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PrimaryKey (8-byte big-endian document key)                │
//! │  PrimaryKeyFilter (single-shot / recovery removal)          │
//! │  IndexSegment / IndexSnapshot (read-side interfaces)        │
//! │  MemoryIndexWriter (in-memory reference index)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Field naming
//!
//! | Value | Field name |
//! |-------|------------|
//! | `null` | `path\0_n` |
//! | boolean | `path\0_b` |
//! | number | `path\0_d` |
//! | string, identity analyzer | `path\0_s` |
//! | string, analyzer `name` | `path\x01name` |
//! | primary key | `@_PK` |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tessera_fts::{AnalyzerRegistry, FieldIterator, FieldMeta};
//!
//! let registry = AnalyzerRegistry::new();
//! let meta = FieldMeta::from_json(
//!     r#"{ "includeAllFields": true, "trackListPositions": true }"#,
//!     &registry,
//! )
//! .unwrap();
//!
//! let doc = json!({ "title": "x", "tags": [true, 2] });
//! let mut names = Vec::new();
//! let mut it = FieldIterator::over(&doc, &meta);
//! while let Some(field) = it.current() {
//!     names.push(field.name().to_string());
//!     it.advance();
//! }
//! assert_eq!(names, ["title\0_s", "tags[0]\0_b", "tags[1]\0_d"]);
//! ```

pub mod analyzer;
pub mod field;
pub mod filter;
pub mod iterator;
pub mod memory;
pub mod meta;
pub mod primary_key;
pub mod segment;

// Re-exports
pub use analyzer::{
    Analyzer, AnalyzerFactory, AnalyzerPool, AnalyzerRegistry, Features, PooledAnalyzer,
    TokenStream, IDENTITY_ANALYZER,
};
pub use field::{Field, FieldKind};
pub use filter::{
    PreparedFilter, PrimaryKeyCursor, PrimaryKeyFilter, PrimaryKeyFilterContainer, ReplayMode,
};
pub use iterator::FieldIterator;
pub use memory::{MemoryIndexWriter, MemorySegment, MemorySnapshot};
pub use meta::{FieldMeta, FieldMetaBuilder, LinkDefinition, ValueStorage};
pub use primary_key::PrimaryKey;
pub use segment::{DocId, IndexSegment, IndexSnapshot};
