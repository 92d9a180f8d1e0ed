//! In-memory reference index.
//!
//! Holds committed segments in memory and applies primary-key removals the
//! way a persistent store would: each commit seals the pending documents into
//! one new segment, then replays the batch's removals in operation order.
//! Deletion sets are copy-on-write, so a [`MemorySnapshot`] taken before a
//! commit keeps seeing the documents that commit removes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use roaring::RoaringBitmap;
use serde_json::Value;
use tessera_core::{LocalDocumentId, Result};

use crate::field::Field;
use crate::filter::{PrimaryKeyFilter, ReplayMode};
use crate::iterator::FieldIterator;
use crate::meta::{FieldMeta, ValueStorage};
use crate::primary_key::PrimaryKey;
use crate::segment::{DocId, IndexSegment, IndexSnapshot};

#[derive(Debug, Default)]
struct SegmentData {
    docs_count: DocId,
    postings: HashMap<String, BTreeMap<Vec<u8>, Vec<DocId>>>,
    columns: HashMap<String, BTreeMap<DocId, Vec<u8>>>,
}

impl SegmentData {
    fn index(&mut self, doc: DocId, field: &mut Field<'_>) -> Result<()> {
        let terms = self.postings.entry(field.name().to_string()).or_default();
        let stream = field.tokens();
        while stream.advance() {
            let docs = terms.entry(stream.term().to_vec()).or_default();
            if docs.last() != Some(&doc) {
                docs.push(doc);
            }
        }

        let stored = match (field.store_values(), field.stored_bytes(), field.value()) {
            (ValueStorage::None, _, _) => return Ok(()),
            (ValueStorage::Id, _, _) => Vec::new(),
            (ValueStorage::Full, Some(bytes), _) => bytes.to_vec(),
            (ValueStorage::Full, None, Some(value)) => serde_json::to_vec(value)?,
            (ValueStorage::Full, None, None) => return Ok(()),
        };
        // Fields sharing a name within one document keep the first value.
        self.columns
            .entry(field.name().to_string())
            .or_default()
            .entry(doc)
            .or_insert(stored);
        Ok(())
    }
}

/// One sealed segment plus its deletion set.
#[derive(Debug, Clone)]
pub struct MemorySegment {
    data: Arc<SegmentData>,
    deleted: Arc<RoaringBitmap>,
}

impl MemorySegment {
    fn seal(data: SegmentData) -> Self {
        Self {
            data: Arc::new(data),
            deleted: Arc::new(RoaringBitmap::new()),
        }
    }

    fn delete(&mut self, doc: DocId) {
        Arc::make_mut(&mut self.deleted).insert(doc);
    }

    /// Number of removed documents.
    pub fn deleted_count(&self) -> u64 {
        self.deleted.len()
    }

    /// Live documents, ascending.
    pub fn live_docs(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.data.docs_count).filter(|doc| !self.deleted.contains(*doc))
    }
}

impl IndexSegment for MemorySegment {
    fn docs_count(&self) -> u64 {
        u64::from(self.data.docs_count)
    }

    fn live_docs_count(&self) -> u64 {
        self.docs_count() - self.deleted.len()
    }

    fn is_live(&self, doc: DocId) -> bool {
        doc < self.data.docs_count && !self.deleted.contains(doc)
    }

    fn postings(&self, field: &str, term: &[u8]) -> &[DocId] {
        self.data
            .postings
            .get(field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn column_value(&self, column: &str, doc: DocId) -> Option<&[u8]> {
        self.data
            .columns
            .get(column)
            .and_then(|values| values.get(&doc))
            .map(Vec::as_slice)
    }
}

// The segment being committed, as seen by a removal queued after `limit`
// of its documents.
struct Bounded<'s> {
    segment: &'s MemorySegment,
    limit: DocId,
}

impl IndexSegment for Bounded<'_> {
    fn docs_count(&self) -> u64 {
        u64::from(self.limit)
    }

    fn live_docs_count(&self) -> u64 {
        (0..self.limit).filter(|&doc| self.segment.is_live(doc)).count() as u64
    }

    fn is_live(&self, doc: DocId) -> bool {
        doc < self.limit && self.segment.is_live(doc)
    }

    fn postings(&self, field: &str, term: &[u8]) -> &[DocId] {
        let docs = self.segment.postings(field, term);
        &docs[..docs.partition_point(|&doc| doc < self.limit)]
    }

    fn column_value(&self, column: &str, doc: DocId) -> Option<&[u8]> {
        if doc < self.limit {
            self.segment.column_value(column, doc)
        } else {
            None
        }
    }
}

/// Point-in-time view over committed segments.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    segments: Vec<MemorySegment>,
}

impl MemorySnapshot {
    /// Segments in commit order.
    pub fn segments(&self) -> &[MemorySegment] {
        &self.segments
    }
}

impl IndexSnapshot for MemorySnapshot {
    fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn segment(&self, ord: usize) -> Option<&dyn IndexSegment> {
        self.segments.get(ord).map(|segment| segment as &dyn IndexSegment)
    }
}

struct Removal {
    filter: Arc<PrimaryKeyFilter>,
    // Pending documents inserted before the removal was queued.
    boundary: DocId,
}

/// Batches inserts and removals and commits them as one segment.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tessera_core::LocalDocumentId;
/// use tessera_fts::{
///     AnalyzerRegistry, FieldMeta, IndexSnapshot, MemoryIndexWriter,
///     PrimaryKeyFilterContainer, ReplayMode,
/// };
///
/// let registry = AnalyzerRegistry::new();
/// let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
/// let id = LocalDocumentId::new(7);
///
/// let mut writer = MemoryIndexWriter::new();
/// writer.insert(id, &json!({ "name": "a" }), &meta).unwrap();
/// assert!(writer.commit(ReplayMode::Normal));
///
/// let mut filters = PrimaryKeyFilterContainer::new();
/// writer.remove(filters.emplace(id));
/// writer.insert(id, &json!({ "name": "b" }), &meta).unwrap();
/// assert!(writer.commit(ReplayMode::Normal));
///
/// let snapshot = writer.snapshot();
/// assert_eq!(snapshot.live_docs_count(), 1);
/// ```
#[derive(Default)]
pub struct MemoryIndexWriter {
    committed: MemorySnapshot,
    pending: SegmentData,
    removals: Vec<Removal>,
}

impl MemoryIndexWriter {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `document` for insertion under `id`.
    ///
    /// Indexes the primary key field followed by every field the document
    /// produces under `meta`.
    ///
    /// # Errors
    ///
    /// Returns [`tessera_core::Error::Serialization`] if a stored value cannot
    /// be encoded. Fields already indexed for the document are kept.
    pub fn insert(&mut self, id: LocalDocumentId, document: &Value, meta: &FieldMeta) -> Result<()> {
        let doc = self.pending.docs_count;
        self.pending.docs_count += 1;

        let mut key = Field::primary_key(PrimaryKey::encode(id));
        let result = self.index_fields(doc, &mut key, document, meta);
        log::trace!("Queued document {id} as pending doc {doc}");
        result
    }

    fn index_fields(
        &mut self,
        doc: DocId,
        key: &mut Field<'_>,
        document: &Value,
        meta: &FieldMeta,
    ) -> Result<()> {
        self.pending.index(doc, key)?;
        let mut fields = FieldIterator::over(document, meta);
        while let Some(field) = fields.current_mut() {
            self.pending.index(doc, field)?;
            fields.advance();
        }
        Ok(())
    }

    /// Queues a removal. It applies to all committed documents and to the
    /// documents inserted before this call in the current batch.
    pub fn remove(&mut self, filter: Arc<PrimaryKeyFilter>) {
        self.removals.push(Removal {
            filter,
            boundary: self.pending.docs_count,
        });
    }

    /// Queues every live document of `snapshot` for insertion, keeping their
    /// order. Committing afterwards consolidates the snapshot into one
    /// segment.
    pub fn import(&mut self, snapshot: &MemorySnapshot) {
        for segment in snapshot.segments() {
            let base = self.pending.docs_count;
            let mut remap: Vec<Option<DocId>> = vec![None; segment.data.docs_count as usize];
            let mut imported: DocId = 0;
            for doc in segment.live_docs() {
                remap[doc as usize] = Some(base + imported);
                imported += 1;
            }
            let mapped = |doc: &DocId| remap.get(*doc as usize).copied().flatten();

            for (field, terms) in &segment.data.postings {
                let target = self.pending.postings.entry(field.clone()).or_default();
                for (term, docs) in terms {
                    let docs: Vec<DocId> = docs.iter().filter_map(mapped).collect();
                    if !docs.is_empty() {
                        target.entry(term.clone()).or_default().extend(docs);
                    }
                }
            }
            for (column, values) in &segment.data.columns {
                let target = self.pending.columns.entry(column.clone()).or_default();
                for (doc, value) in values {
                    if let Some(doc) = mapped(doc) {
                        target.insert(doc, value.clone());
                    }
                }
            }

            self.pending.docs_count += imported;
        }
        log::debug!(
            "Imported {} live document(s) from {} segment(s)",
            snapshot.live_docs_count(),
            snapshot.segment_count()
        );
    }

    /// Number of documents inserted since the last commit.
    pub fn pending_docs(&self) -> u64 {
        u64::from(self.pending.docs_count)
    }

    /// Seals the batch and applies its removals under `mode`.
    ///
    /// Segments left without live documents are dropped. Returns `false`
    /// when there was nothing to commit.
    pub fn commit(&mut self, mode: ReplayMode) -> bool {
        if self.pending.docs_count == 0 && self.removals.is_empty() {
            return false;
        }

        let mut next = self.committed.clone();
        let sealed = next.segments.len();
        if self.pending.docs_count > 0 {
            next.segments
                .push(MemorySegment::seal(std::mem::take(&mut self.pending)));
        }

        let mut removed = 0usize;
        for removal in std::mem::take(&mut self.removals) {
            let prepared = removal.filter.prepare(&next, mode);
            if prepared.is_empty() {
                continue;
            }

            for ord in 0..next.segments.len() {
                let segment = &next.segments[ord];
                let mut cursor = if ord < sealed {
                    prepared.execute(segment, mode)
                } else {
                    let bounded = Bounded {
                        segment,
                        limit: removal.boundary,
                    };
                    prepared.execute(&bounded, mode)
                };

                let mut docs = Vec::new();
                while cursor.next() {
                    docs.push(cursor.value());
                }
                for doc in docs {
                    next.segments[ord].delete(doc);
                    removed += 1;
                }
            }
        }

        let before = next.segments.len();
        next.segments.retain(|segment| segment.live_docs_count() > 0);
        log::debug!(
            "Committed {} segment(s), {} removal(s) applied, {} empty segment(s) dropped ({mode:?})",
            next.segments.len(),
            removed,
            before - next.segments.len()
        );

        self.committed = next;
        true
    }

    /// Snapshot of the last commit.
    pub fn snapshot(&self) -> MemorySnapshot {
        self.committed.clone()
    }
}
