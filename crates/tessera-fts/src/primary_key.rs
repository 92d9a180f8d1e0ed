//! Primary key codec.
//!
//! Every indexed document carries its [`LocalDocumentId`] as an 8-byte
//! big-endian key, both as the only term of the [`PrimaryKey::FIELD`] field
//! and as the value of the column of the same name. Big-endian encoding keeps
//! byte-wise order equal to numeric order.

use std::fmt;

use tessera_core::{Error, LocalDocumentId, Result};

const KEY_WIDTH: usize = std::mem::size_of::<u64>();

/// Fixed-width encoded form of a [`LocalDocumentId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimaryKey([u8; KEY_WIDTH]);

impl PrimaryKey {
    /// Name of the primary key field and stored column.
    pub const FIELD: &'static str = "@_PK";

    /// Encoded width in bytes.
    pub const WIDTH: usize = KEY_WIDTH;

    /// Encodes an identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_core::LocalDocumentId;
    /// use tessera_fts::PrimaryKey;
    ///
    /// let key = PrimaryKey::encode(LocalDocumentId::new(1));
    /// assert_eq!(key.as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);
    /// ```
    pub fn encode(id: LocalDocumentId) -> Self {
        Self(id.id().to_be_bytes())
    }

    /// Decodes an identifier from key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptKey`] unless `bytes` is exactly
    /// [`WIDTH`](Self::WIDTH) bytes long.
    pub fn decode(bytes: &[u8]) -> Result<LocalDocumentId> {
        Ok(Self::from_bytes(bytes)?.id())
    }

    /// Wraps already-encoded key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptKey`] for input of the wrong width.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; Self::WIDTH] = bytes
            .try_into()
            .map_err(|_| Error::corrupt_key(Self::WIDTH, bytes.len()))?;
        Ok(Self(raw))
    }

    /// Identifier the key was built from.
    pub fn id(&self) -> LocalDocumentId {
        LocalDocumentId::new(u64::from_be_bytes(self.0))
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<LocalDocumentId> for PrimaryKey {
    fn from(id: LocalDocumentId) -> Self {
        Self::encode(id)
    }
}

impl AsRef<[u8]> for PrimaryKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
