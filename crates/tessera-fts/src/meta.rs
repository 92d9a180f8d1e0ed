//! Field configuration tree.
//!
//! A link definition describes, per document path, which analyzers index
//! string values, whether unlisted members are indexed, whether array
//! positions are encoded into field names, and what is stored alongside the
//! terms. Options not set on a node are inherited from its parent; the root
//! gets the defaults.
//!
//! The persisted form ([`LinkDefinition`]) is resolved once into an immutable
//! tree of [`FieldMeta`] nodes. Every node carries its fully merged
//! attributes, so traversal never consults parents.
//!
//! # Example
//!
//! ```json
//! {
//!   "includeAllFields": true,
//!   "analyzers": ["identity"],
//!   "fields": {
//!     "description": { "analyzers": ["identity", "text_en"] },
//!     "internal": { "includeAllFields": false }
//!   }
//! }
//! ```

use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_core::{Error, Result};

use crate::analyzer::{AnalyzerPool, AnalyzerRegistry};

/// What the index stores for a field besides its terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueStorage {
    /// Nothing
    #[default]
    None,
    /// A presence marker only
    Id,
    /// The complete value
    Full,
}

/// Persisted form of one configuration node.
///
/// `None` means "inherit from the parent". Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDefinition {
    /// Analyzer names applied to string values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzers: Option<Vec<String>>,

    /// Index members that have no entry in `fields`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_fields: Option<bool>,

    /// Encode array positions into field names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_list_positions: Option<bool>,

    /// What to store alongside terms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_values: Option<ValueStorage>,

    /// Per-member overrides
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, LinkDefinition>,
}

impl LinkDefinition {
    /// Parses a definition from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending option path when the
    /// value is not an object or an option has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::config(format!(
                "expected an object, got {}",
                kind_of(value)
            )));
        };

        let mut fields = IndexMap::new();
        match map.get("fields") {
            None => {}
            Some(Value::Object(children)) => {
                for (name, child) in children {
                    let child = Self::from_value(child)
                        .map_err(|err| err.within(&format!("fields.{name}")))?;
                    fields.insert(name.clone(), child);
                }
            }
            Some(other) => {
                return Err(Error::config_field(
                    "fields",
                    format!("expected an object, got {}", kind_of(other)),
                ));
            }
        }

        Ok(Self {
            analyzers: option(map, "analyzers")?,
            include_all_fields: option(map, "includeAllFields")?,
            track_list_positions: option(map, "trackListPositions")?,
            store_values: option(map, "storeValues")?,
            fields,
        })
    }
}

impl FromStr for LinkDefinition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_value(&serde_json::from_str(s)?)
    }
}

fn option<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Result<Option<T>> {
    map.get(key)
        .map(|value| T::deserialize(value).map_err(|err| Error::config_field(key, err.to_string())))
        .transpose()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Merged attributes of one node.
#[derive(Debug, Clone)]
struct Attributes {
    analyzers: Vec<Arc<AnalyzerPool>>,
    include_all_fields: bool,
    track_list_positions: bool,
    store_values: ValueStorage,
}

impl Attributes {
    fn root(registry: &AnalyzerRegistry) -> Self {
        Self {
            analyzers: vec![registry.identity()],
            include_all_fields: false,
            track_list_positions: false,
            store_values: ValueStorage::None,
        }
    }

    fn apply(&self, def: &LinkDefinition, registry: &AnalyzerRegistry) -> Result<Self> {
        let analyzers = match &def.analyzers {
            Some(names) => resolve_analyzers(names, registry)?,
            None => self.analyzers.clone(),
        };
        Ok(Self {
            analyzers,
            include_all_fields: def.include_all_fields.unwrap_or(self.include_all_fields),
            track_list_positions: def.track_list_positions.unwrap_or(self.track_list_positions),
            store_values: def.store_values.unwrap_or(self.store_values),
        })
    }
}

fn resolve_analyzers(names: &[String], registry: &AnalyzerRegistry) -> Result<Vec<Arc<AnalyzerPool>>> {
    let mut pools: Vec<Arc<AnalyzerPool>> = Vec::with_capacity(names.len());
    for name in names {
        let pool = registry.get(name).ok_or_else(|| {
            Error::config_field("analyzers", format!("unknown analyzer '{name}'"))
        })?;
        if pools.iter().any(|p| p.name() == pool.name()) {
            log::debug!("Ignoring duplicate analyzer '{name}'");
            continue;
        }
        pools.push(pool);
    }
    Ok(pools)
}

/// One resolved node of the configuration tree.
///
/// Built through [`FieldMeta::from_definition`] or [`FieldMetaBuilder`], then
/// shared read-only through `Arc`.
#[derive(Debug)]
pub struct FieldMeta {
    attributes: Attributes,
    fields: IndexMap<String, Arc<FieldMeta>>,
    // Governs members without an explicit entry: same attributes, no child
    // overrides. A node without overrides serves as its own.
    unlisted: Option<Arc<FieldMeta>>,
}

impl FieldMeta {
    /// Starts a root node with default attributes.
    pub fn builder(registry: &AnalyzerRegistry) -> FieldMetaBuilder {
        FieldMetaBuilder {
            attributes: Attributes::root(registry),
            fields: IndexMap::new(),
        }
    }

    /// Root node with default attributes: identity analyzer only, unlisted
    /// members excluded, no list positions, nothing stored.
    pub fn with_defaults(registry: &AnalyzerRegistry) -> Arc<Self> {
        Self::builder(registry).build()
    }

    /// Resolves a persisted definition into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when an analyzer name is not registered.
    pub fn from_definition(
        def: &LinkDefinition,
        registry: &AnalyzerRegistry,
    ) -> Result<Arc<Self>> {
        Self::resolve_node(def, &Attributes::root(registry), registry)
    }

    /// Parses and resolves a JSON definition.
    pub fn from_value(value: &Value, registry: &AnalyzerRegistry) -> Result<Arc<Self>> {
        Self::from_definition(&LinkDefinition::from_value(value)?, registry)
    }

    /// Parses and resolves a JSON definition from text.
    pub fn from_json(text: &str, registry: &AnalyzerRegistry) -> Result<Arc<Self>> {
        Self::from_value(&serde_json::from_str(text)?, registry)
    }

    fn resolve_node(
        def: &LinkDefinition,
        inherited: &Attributes,
        registry: &AnalyzerRegistry,
    ) -> Result<Arc<Self>> {
        let attributes = inherited.apply(def, registry)?;
        let mut fields = IndexMap::with_capacity(def.fields.len());
        for (name, child) in &def.fields {
            let node = Self::resolve_node(child, &attributes, registry)
                .map_err(|err| err.within(&format!("fields.{name}")))?;
            fields.insert(name.clone(), node);
        }
        Ok(Self::assemble(attributes, fields))
    }

    fn assemble(attributes: Attributes, fields: IndexMap<String, Arc<FieldMeta>>) -> Arc<Self> {
        let unlisted = (attributes.include_all_fields && !fields.is_empty()).then(|| {
            Arc::new(Self {
                attributes: attributes.clone(),
                fields: IndexMap::new(),
                unlisted: None,
            })
        });
        Arc::new(Self {
            attributes,
            fields,
            unlisted,
        })
    }

    /// Analyzers applied to string values, in configuration order.
    pub fn analyzers(&self) -> &[Arc<AnalyzerPool>] {
        &self.attributes.analyzers
    }

    /// Whether members without an explicit entry are indexed.
    pub fn include_all_fields(&self) -> bool {
        self.attributes.include_all_fields
    }

    /// Whether array positions are encoded into field names.
    pub fn track_list_positions(&self) -> bool {
        self.attributes.track_list_positions
    }

    /// What is stored alongside terms.
    pub fn store_values(&self) -> ValueStorage {
        self.attributes.store_values
    }

    /// Explicit per-member overrides, in configuration order.
    pub fn fields(&self) -> &IndexMap<String, Arc<FieldMeta>> {
        &self.fields
    }

    /// Node governing the member `name`, or `None` when the member is not
    /// indexed.
    pub fn child(&self, name: &str) -> Option<&FieldMeta> {
        if let Some(node) = self.fields.get(name) {
            return Some(&**node);
        }
        if !self.attributes.include_all_fields {
            return None;
        }
        Some(self.unlisted.as_deref().unwrap_or(self))
    }

    /// Effective node for a dotted document path such as `a.b[2].c`.
    ///
    /// Array positions do not select configuration and are ignored. Returns
    /// `None` when some segment of the path is not indexed.
    pub fn resolve(&self, path: &str) -> Option<&FieldMeta> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .map(strip_positions)
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Writes the node back to its persisted form.
    ///
    /// Options equal to the ones inherited from `parent` are omitted; with no
    /// parent every option is written.
    pub fn to_definition(&self, parent: Option<&FieldMeta>) -> LinkDefinition {
        let inherited = parent.map(|p| &p.attributes);
        let own = &self.attributes;

        LinkDefinition {
            analyzers: unless_inherited(inherited, own, |a| {
                a.analyzers
                    .iter()
                    .map(|pool| pool.name().to_string())
                    .collect::<Vec<_>>()
            }),
            include_all_fields: unless_inherited(inherited, own, |a| a.include_all_fields),
            track_list_positions: unless_inherited(inherited, own, |a| a.track_list_positions),
            store_values: unless_inherited(inherited, own, |a| a.store_values),
            fields: self
                .fields
                .iter()
                .map(|(name, child)| (name.clone(), child.to_definition(Some(self))))
                .collect(),
        }
    }
}

fn unless_inherited<T, F>(inherited: Option<&Attributes>, own: &Attributes, get: F) -> Option<T>
where
    T: PartialEq,
    F: Fn(&Attributes) -> T,
{
    let value = get(own);
    match inherited {
        Some(parent) if get(parent) == value => None,
        _ => Some(value),
    }
}

fn strip_positions(segment: &str) -> &str {
    segment.find('[').map_or(segment, |at| &segment[..at])
}

/// Builds [`FieldMeta`] nodes programmatically.
///
/// Child builders start from the attributes of the builder they were created
/// from, mirroring inheritance in persisted definitions.
#[derive(Debug, Clone)]
pub struct FieldMetaBuilder {
    attributes: Attributes,
    fields: IndexMap<String, Arc<FieldMeta>>,
}

impl FieldMetaBuilder {
    /// Sets the analyzers applied to string values.
    pub fn analyzers(mut self, analyzers: Vec<Arc<AnalyzerPool>>) -> Self {
        self.attributes.analyzers = analyzers;
        self
    }

    /// Sets whether members without an explicit entry are indexed.
    pub fn include_all_fields(mut self, include: bool) -> Self {
        self.attributes.include_all_fields = include;
        self
    }

    /// Sets whether array positions are encoded into field names.
    pub fn track_list_positions(mut self, track: bool) -> Self {
        self.attributes.track_list_positions = track;
        self
    }

    /// Sets what is stored alongside terms.
    pub fn store_values(mut self, storage: ValueStorage) -> Self {
        self.attributes.store_values = storage;
        self
    }

    /// Adds an override for the member `name`.
    pub fn field(mut self, name: impl Into<String>, node: Arc<FieldMeta>) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    /// Starts a child builder inheriting the current attributes.
    pub fn child(&self) -> FieldMetaBuilder {
        FieldMetaBuilder {
            attributes: self.attributes.clone(),
            fields: IndexMap::new(),
        }
    }

    /// Finishes the node.
    pub fn build(self) -> Arc<FieldMeta> {
        FieldMeta::assemble(self.attributes, self.fields)
    }
}
