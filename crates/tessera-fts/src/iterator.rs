//! Depth-first flattening of a document into indexable fields.
//!
//! [`FieldIterator`] walks a JSON document under a [`FieldMeta`] tree and
//! yields one [`Field`] per scalar, or per (string, analyzer) pair. The walk
//! is an explicit stack of container cursors, so it stops after every field
//! and resumes on [`advance`](FieldIterator::advance).
//!
//! Naming:
//! - object members join the parent path with `.`
//! - array elements append `[i]` when list positions are tracked, otherwise
//!   they share the array's name
//! - scalars get a type suffix (see [`crate::field`])
//!
//! Members not admitted by the configuration, scalars under a node without
//! analyzers, and empty containers produce nothing.

use std::fmt;

use serde_json::{Map, Value};
use tessera_core::Error;

use crate::field::{Field, mangle_bool, mangle_null, mangle_numeric, mangle_string};
use crate::meta::FieldMeta;

/// Lazily produces the fields of one document.
///
/// A default-constructed iterator is at the end. Fields borrow the document
/// and are valid until the next `advance` or `reset`.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tessera_fts::{AnalyzerRegistry, FieldIterator, FieldMeta};
///
/// let registry = AnalyzerRegistry::new();
/// let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
/// let doc = json!({ "a": { "b": "x" } });
///
/// let mut it = FieldIterator::new();
/// it.reset(&doc, &meta);
/// assert_eq!(it.current().map(|f| f.name()), Some("a.b\0_s"));
/// assert!(!it.advance());
/// assert_eq!(it, FieldIterator::new());
/// ```
#[derive(Default)]
pub struct FieldIterator<'a> {
    stack: Vec<Frame<'a>>,
    // Path of the value being visited; frames truncate it back to their
    // prefix before appending the next member.
    name: String,
    pending: Option<PendingString<'a>>,
    current: Option<Field<'a>>,
}

struct Frame<'a> {
    meta: &'a FieldMeta,
    cursor: Cursor<'a>,
    prefix: usize,
}

enum Cursor<'a> {
    Object(serde_json::map::Iter<'a>),
    Array(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

struct Member<'a> {
    segment: Segment<'a>,
    value: &'a Value,
    meta: &'a FieldMeta,
}

// A string value still being fanned out over its analyzers.
struct PendingString<'a> {
    value: &'a Value,
    text: &'a str,
    meta: &'a FieldMeta,
    next: usize,
}

impl<'a> Frame<'a> {
    fn object(meta: &'a FieldMeta, members: &'a Map<String, Value>, prefix: usize) -> Self {
        Self {
            meta,
            cursor: Cursor::Object(members.iter()),
            prefix,
        }
    }

    fn array(meta: &'a FieldMeta, elements: &'a [Value], prefix: usize) -> Self {
        Self {
            meta,
            cursor: Cursor::Array(elements.iter().enumerate()),
            prefix,
        }
    }

    fn next_member(&mut self) -> Option<Member<'a>> {
        let meta = self.meta;
        match &mut self.cursor {
            Cursor::Object(members) => {
                for (key, value) in members.by_ref() {
                    match meta.child(key) {
                        Some(child) => {
                            return Some(Member {
                                segment: Segment::Key(key),
                                value,
                                meta: child,
                            });
                        }
                        None => log::trace!("Skipping unlisted member '{key}'"),
                    }
                }
                None
            }
            Cursor::Array(elements) => elements.next().map(|(index, value)| Member {
                segment: Segment::Index(index),
                value,
                meta,
            }),
        }
    }
}

impl<'a> FieldIterator<'a> {
    /// Creates an iterator in the end state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an iterator positioned on the first field of `document`.
    pub fn over(document: &'a Value, meta: &'a FieldMeta) -> Self {
        let mut it = Self::new();
        it.reset(document, meta);
        it
    }

    /// Restarts traversal over `document` under `meta`.
    ///
    /// Drops the current field, returning any analyzer it holds, and
    /// positions on the first field (or the end). A document whose root is
    /// not an object produces no fields.
    pub fn reset(&mut self, document: &'a Value, meta: &'a FieldMeta) {
        self.current = None;
        self.pending = None;
        self.stack.clear();
        self.name.clear();

        match document {
            Value::Object(members) => self.stack.push(Frame::object(meta, members, 0)),
            _ => log::warn!("Document root is not an object, nothing to index"),
        }
        self.advance();
    }

    /// Moves to the next field. Returns `false` once the end is reached.
    pub fn advance(&mut self) -> bool {
        // Release the previous field's analyzer before taking another.
        self.current = None;
        self.current = self.next_field();
        self.current.is_some()
    }

    /// Whether the iterator is positioned on a field.
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Whether traversal is finished.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Current field, if any.
    pub fn current(&self) -> Option<&Field<'a>> {
        self.current.as_ref()
    }

    /// Current field for reading its token stream.
    pub fn current_mut(&mut self) -> Option<&mut Field<'a>> {
        self.current.as_mut()
    }

    fn next_field(&mut self) -> Option<Field<'a>> {
        loop {
            if let Some(field) = self.next_analyzed() {
                return Some(field);
            }

            let frame = self.stack.last_mut()?;
            let Some(member) = frame.next_member() else {
                self.stack.pop();
                continue;
            };
            let track_positions = frame.meta.track_list_positions();
            self.name.truncate(frame.prefix);

            match member.segment {
                Segment::Key(key) => {
                    if !self.name.is_empty() {
                        self.name.push('.');
                    }
                    self.name.push_str(key);
                }
                Segment::Index(index) if track_positions => {
                    self.name.push('[');
                    self.name.push_str(&index.to_string());
                    self.name.push(']');
                }
                Segment::Index(_) => {}
            }

            if let Some(field) = self.visit(member.value, member.meta) {
                return Some(field);
            }
        }
    }

    fn visit(&mut self, value: &'a Value, meta: &'a FieldMeta) -> Option<Field<'a>> {
        match value {
            Value::Object(members) => {
                if !members.is_empty() {
                    self.stack
                        .push(Frame::object(meta, members, self.name.len()));
                }
                None
            }
            Value::Array(elements) => {
                if !elements.is_empty() {
                    self.stack
                        .push(Frame::array(meta, elements, self.name.len()));
                }
                None
            }
            _ if meta.analyzers().is_empty() => {
                log::trace!("Skipping '{}': no analyzers configured", self.name);
                None
            }
            Value::Null => Some(Field::null(
                mangle_null(&self.name),
                value,
                meta.store_values(),
            )),
            Value::Bool(flag) => Some(Field::boolean(
                mangle_bool(&self.name),
                value,
                *flag,
                meta.store_values(),
            )),
            Value::Number(number) => match number.as_f64() {
                Some(number) => Some(Field::numeric(
                    mangle_numeric(&self.name),
                    value,
                    number,
                    meta.store_values(),
                )),
                None => {
                    let err = Error::value(
                        self.name.as_str(),
                        format!("{number} is not representable as a double"),
                    );
                    log::warn!("Skipping field: {err}");
                    None
                }
            },
            Value::String(text) => {
                self.pending = Some(PendingString {
                    value,
                    text,
                    meta,
                    next: 0,
                });
                None
            }
        }
    }

    fn next_analyzed(&mut self) -> Option<Field<'a>> {
        let pending = self.pending.as_mut()?;
        let meta = pending.meta;

        while let Some(pool) = meta.analyzers().get(pending.next) {
            pending.next += 1;
            let mut analyzer = match pool.acquire() {
                Ok(analyzer) => analyzer,
                Err(err) => {
                    log::warn!("Skipping field '{}': {err}", self.name);
                    continue;
                }
            };
            if !analyzer.reset(pending.text) {
                log::warn!(
                    "Skipping field '{}': analyzer '{}' rejected the value",
                    self.name,
                    pool.name()
                );
                continue;
            }
            return Some(Field::analyzed(
                mangle_string(&self.name, pool.name()),
                pending.value,
                analyzer,
                meta.store_values(),
            ));
        }

        self.pending = None;
        None
    }
}

impl PartialEq for FieldIterator<'_> {
    /// Iterators are equal when both are at the end, or when they are the
    /// same iterator.
    fn eq(&self, other: &Self) -> bool {
        (self.is_end() && other.is_end()) || std::ptr::eq(self, other)
    }
}

impl fmt::Debug for FieldIterator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldIterator")
            .field("current", &self.current.as_ref().map(Field::name))
            .field("depth", &self.stack.len())
            .finish()
    }
}
