//! Indexable fields and field-name mangling.
//!
//! A field name is the document path of the value followed by a suffix that
//! encodes how the value was indexed:
//!
//! | Value                        | Name                 |
//! |------------------------------|----------------------|
//! | `null`                       | `path\0_n`           |
//! | boolean                      | `path\0_b`           |
//! | number                       | `path\0_d`           |
//! | string, identity analyzer    | `path\0_s`           |
//! | string, analyzer `name`      | `path\x01name`       |
//!
//! The same string indexed by two analyzers therefore lands in two fields
//! that share the base path.

use serde_json::Value;

use crate::analyzer::scalar::{
    BooleanTokenStream, KeyTokenStream, NullTokenStream, NumericTokenStream,
};
use crate::analyzer::{Features, PooledAnalyzer, TokenStream, IDENTITY_ANALYZER};
use crate::meta::ValueStorage;
use crate::primary_key::PrimaryKey;

const TYPE_DELIMITER: char = '\0';
const ANALYZER_DELIMITER: char = '\u{1}';

const NULL_SUFFIX: &str = "_n";
const BOOL_SUFFIX: &str = "_b";
const NUMERIC_SUFFIX: &str = "_d";
const STRING_SUFFIX: &str = "_s";

/// Name of a `null` field at `path`.
pub fn mangle_null(path: &str) -> String {
    typed(path, NULL_SUFFIX)
}

/// Name of a boolean field at `path`.
pub fn mangle_bool(path: &str) -> String {
    typed(path, BOOL_SUFFIX)
}

/// Name of a numeric field at `path`.
pub fn mangle_numeric(path: &str) -> String {
    typed(path, NUMERIC_SUFFIX)
}

/// Name of a string field at `path` indexed as a single term.
pub fn mangle_string_identity(path: &str) -> String {
    typed(path, STRING_SUFFIX)
}

/// Name of a string field at `path` indexed by `analyzer`.
///
/// The identity analyzer maps to [`mangle_string_identity`].
pub fn mangle_string(path: &str, analyzer: &str) -> String {
    if analyzer == IDENTITY_ANALYZER {
        return mangle_string_identity(path);
    }
    let mut name = String::with_capacity(path.len() + 1 + analyzer.len());
    name.push_str(path);
    name.push(ANALYZER_DELIMITER);
    name.push_str(analyzer);
    name
}

fn typed(path: &str, suffix: &str) -> String {
    let mut name = String::with_capacity(path.len() + 1 + suffix.len());
    name.push_str(path);
    name.push(TYPE_DELIMITER);
    name.push_str(suffix);
    name
}

/// How a field's value was indexed, recovered from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind<'n> {
    /// `null`
    Null,
    /// Boolean
    Bool,
    /// Number
    Numeric,
    /// String indexed by the identity analyzer
    String,
    /// String indexed by the named analyzer
    Analyzed(&'n str),
    /// Primary key column
    PrimaryKey,
}

/// Splits a mangled name into its document path and kind.
///
/// Returns `None` for names that carry no recognised suffix.
pub fn demangle(name: &str) -> Option<(&str, FieldKind<'_>)> {
    if name == PrimaryKey::FIELD {
        return Some((name, FieldKind::PrimaryKey));
    }
    if let Some((path, analyzer)) = name.split_once(ANALYZER_DELIMITER) {
        return Some((path, FieldKind::Analyzed(analyzer)));
    }
    let (path, suffix) = name.split_once(TYPE_DELIMITER)?;
    let kind = match suffix {
        NULL_SUFFIX => FieldKind::Null,
        BOOL_SUFFIX => FieldKind::Bool,
        NUMERIC_SUFFIX => FieldKind::Numeric,
        STRING_SUFFIX => FieldKind::String,
        _ => return None,
    };
    Some((path, kind))
}

/// Token source of a field.
#[derive(Debug)]
pub enum FieldTokens {
    /// Single null marker
    Null(NullTokenStream),
    /// Single boolean marker
    Bool(BooleanTokenStream),
    /// Multi-precision numeric terms
    Numeric(NumericTokenStream),
    /// String terms from a pooled analyzer
    Analyzed(PooledAnalyzer),
    /// Encoded primary key
    Key(KeyTokenStream),
}

impl FieldTokens {
    fn stream(&mut self) -> &mut dyn TokenStream {
        match self {
            FieldTokens::Null(stream) => stream,
            FieldTokens::Bool(stream) => stream,
            FieldTokens::Numeric(stream) => stream,
            FieldTokens::Analyzed(analyzer) => analyzer,
            FieldTokens::Key(stream) => stream,
        }
    }
}

/// One indexable unit: a name, index features and a token stream.
///
/// Fields produced by [`FieldIterator`](crate::iterator::FieldIterator)
/// borrow the document and live until the iterator advances. An analyzed
/// field holds its analyzer on loan; dropping the field returns it.
#[derive(Debug)]
pub struct Field<'a> {
    name: String,
    features: Features,
    store_values: ValueStorage,
    value: Option<&'a Value>,
    tokens: FieldTokens,
}

impl<'a> Field<'a> {
    pub(crate) fn null(name: String, value: &'a Value, store_values: ValueStorage) -> Self {
        Self::scalar(name, value, store_values, FieldTokens::Null(NullTokenStream::new()))
    }

    pub(crate) fn boolean(
        name: String,
        value: &'a Value,
        flag: bool,
        store_values: ValueStorage,
    ) -> Self {
        let tokens = FieldTokens::Bool(BooleanTokenStream::new(flag));
        Self::scalar(name, value, store_values, tokens)
    }

    pub(crate) fn numeric(
        name: String,
        value: &'a Value,
        number: f64,
        store_values: ValueStorage,
    ) -> Self {
        let tokens = FieldTokens::Numeric(NumericTokenStream::new(number));
        Self::scalar(name, value, store_values, tokens)
    }

    pub(crate) fn analyzed(
        name: String,
        value: &'a Value,
        analyzer: PooledAnalyzer,
        store_values: ValueStorage,
    ) -> Self {
        Self {
            name,
            features: analyzer.pool().features(),
            store_values,
            value: Some(value),
            tokens: FieldTokens::Analyzed(analyzer),
        }
    }

    fn scalar(name: String, value: &'a Value, store_values: ValueStorage, tokens: FieldTokens) -> Self {
        Self {
            name,
            features: Features::empty(),
            store_values,
            value: Some(value),
            tokens,
        }
    }

    /// Mangled field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index features requested for this field.
    pub fn features(&self) -> Features {
        self.features
    }

    /// What the writer should store for this field.
    pub fn store_values(&self) -> ValueStorage {
        self.store_values
    }

    /// Document value the field was produced from.
    pub fn value(&self) -> Option<&'a Value> {
        self.value
    }

    /// How the value is indexed.
    pub fn kind(&self) -> FieldKind<'_> {
        match &self.tokens {
            FieldTokens::Null(_) => FieldKind::Null,
            FieldTokens::Bool(_) => FieldKind::Bool,
            FieldTokens::Numeric(_) => FieldKind::Numeric,
            FieldTokens::Analyzed(analyzer) if analyzer.pool().name() == IDENTITY_ANALYZER => {
                FieldKind::String
            }
            FieldTokens::Analyzed(analyzer) => FieldKind::Analyzed(analyzer.pool().name()),
            FieldTokens::Key(_) => FieldKind::PrimaryKey,
        }
    }

    /// Name of the analyzer producing the terms, for string fields.
    pub fn analyzer(&self) -> Option<&str> {
        match &self.tokens {
            FieldTokens::Analyzed(analyzer) => Some(analyzer.pool().name()),
            _ => None,
        }
    }

    /// Raw bytes to store in place of the serialized value. Only the primary
    /// key field has them.
    pub fn stored_bytes(&self) -> Option<&[u8]> {
        match &self.tokens {
            FieldTokens::Key(stream) => Some(stream.key()),
            _ => None,
        }
    }

    /// Token stream of the field. Each field's stream is read once.
    pub fn tokens(&mut self) -> &mut dyn TokenStream {
        self.tokens.stream()
    }
}

impl Field<'static> {
    /// Primary key field of a document: the encoded identifier as its only
    /// term, with the key bytes stored in the [`PrimaryKey::FIELD`] column.
    pub fn primary_key(key: PrimaryKey) -> Self {
        Self {
            name: PrimaryKey::FIELD.to_string(),
            features: Features::empty(),
            store_values: ValueStorage::Full,
            value: None,
            tokens: FieldTokens::Key(KeyTokenStream::new(key.as_bytes())),
        }
    }
}
