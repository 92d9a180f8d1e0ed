//! Document identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a document within a physical collection.
///
/// Assigned by the storage layer and never changed afterwards. The index uses
/// it to build the document's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalDocumentId(u64);

impl LocalDocumentId {
    /// Creates an identifier from its raw value.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::LocalDocumentId;
    ///
    /// let id = LocalDocumentId::new(1605879230128717824);
    /// assert_eq!(id.id(), 1605879230128717824);
    /// ```
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LocalDocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LocalDocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<LocalDocumentId> for u64 {
    fn from(id: LocalDocumentId) -> Self {
        id.0
    }
}

impl std::str::FromStr for LocalDocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}
