//! Handler functions for the CLI commands.
//!
//! Handlers write to a caller-supplied writer so they can be exercised
//! without a terminal.

use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tessera_core::LocalDocumentId;
use tessera_fts::analyzer::collect_terms;
use tessera_fts::field::demangle;
use tessera_fts::{AnalyzerRegistry, Features, FieldIterator, FieldKind, FieldMeta, PrimaryKey};

use crate::error::{Error, Result};

// ============================================================================
// Analyzer definitions
// ============================================================================

/// One entry of an analyzer definitions file.
#[derive(Debug, Deserialize)]
pub struct AnalyzerDefinition {
    /// Registered analyzer type
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific properties: a string, or a JSON object passed on
    /// serialized
    #[serde(default)]
    pub properties: Value,

    /// Index feature names (`frequency`, `position`, `offset`, `norm`)
    #[serde(default)]
    pub features: Vec<String>,
}

impl AnalyzerDefinition {
    fn properties(&self) -> String {
        match &self.properties {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn features(&self, name: &str) -> Result<Features> {
        self.features.iter().try_fold(Features::empty(), |acc, feature| {
            Features::from_name(&feature.to_uppercase())
                .map(|flag| acc | flag)
                .ok_or_else(|| {
                    Error::from(tessera_core::Error::config_field(
                        format!("{name}.features"),
                        format!("unknown feature '{feature}'"),
                    ))
                })
        })
    }
}

/// Registers every analyzer defined in the file at `path`.
///
/// Returns the registered names in file order.
pub fn load_analyzers(registry: &AnalyzerRegistry, path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let definitions: IndexMap<String, AnalyzerDefinition> =
        serde_json::from_str(&text).map_err(|e| Error::json(path, e))?;

    let mut names = Vec::with_capacity(definitions.len());
    for (name, definition) in &definitions {
        let features = definition.features(name)?;
        registry.emplace(name, &definition.kind, &definition.properties(), features)?;
        log::debug!("Loaded analyzer '{name}' of type '{}'", definition.kind);
        names.push(name.clone());
    }
    Ok(names)
}

// ============================================================================
// fields
// ============================================================================

/// Prints the fields `document` produces under the link configuration at
/// `config` (or under "index everything" when absent).
///
/// Returns the number of fields printed.
pub fn cmd_fields(
    registry: &AnalyzerRegistry,
    config: Option<&Path>,
    document: &Path,
    terms: bool,
    out: &mut impl Write,
) -> Result<usize> {
    let meta = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
            FieldMeta::from_json(&text, registry)?
        }
        None => FieldMeta::builder(registry).include_all_fields(true).build(),
    };

    let text = std::fs::read_to_string(document).map_err(|e| Error::read(document, e))?;
    let doc: Value = serde_json::from_str(&text).map_err(|e| Error::json(document, e))?;

    let mut count = 0;
    let mut it = FieldIterator::over(&doc, &meta);
    while let Some(field) = it.current_mut() {
        writeln!(
            out,
            "{}\t{}",
            describe_field(field.name()),
            format_features(field.features())
        )?;
        if terms {
            let textual = matches!(field.kind(), FieldKind::String | FieldKind::Analyzed(_));
            for term in collect_terms(field.tokens()) {
                writeln!(out, "\t{}", format_term(&term, textual))?;
            }
        }
        count += 1;
        it.advance();
    }
    Ok(count)
}

/// Readable form of a mangled field name.
pub fn describe_field(name: &str) -> String {
    match demangle(name) {
        Some((path, FieldKind::Null)) => format!("{path} (null)"),
        Some((path, FieldKind::Bool)) => format!("{path} (bool)"),
        Some((path, FieldKind::Numeric)) => format!("{path} (numeric)"),
        Some((path, FieldKind::String)) => format!("{path} (string)"),
        Some((path, FieldKind::Analyzed(analyzer))) => format!("{path} (string, {analyzer})"),
        Some((path, FieldKind::PrimaryKey)) => format!("{path} (primary key)"),
        None => name.escape_debug().to_string(),
    }
}

fn format_features(features: Features) -> String {
    if features.is_empty() {
        return "-".to_string();
    }
    features
        .iter_names()
        .map(|(name, _)| name.to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn format_term(term: &[u8], textual: bool) -> String {
    match std::str::from_utf8(term) {
        Ok(text) if textual => format!("{text:?}"),
        _ => format!("0x{}", hex::encode(term)),
    }
}

// ============================================================================
// pk
// ============================================================================

/// Prints the hex-encoded primary key of `id`.
pub fn cmd_pk_encode(id: LocalDocumentId, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", PrimaryKey::encode(id))?;
    Ok(())
}

/// Prints the document identifier stored in a hex-encoded primary key.
pub fn cmd_pk_decode(key: &str, out: &mut impl Write) -> Result<()> {
    let bytes = parse_hex(key)?;
    let id = PrimaryKey::decode(&bytes)?;
    writeln!(out, "{id}")?;
    Ok(())
}

/// Parses a string of hex digit pairs.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| {
        log::debug!("Rejected hex input '{text}': {e}");
        Error::InvalidHex(text.to_string())
    })
}
