//! Primary key filters: remove earlier copies of a document.
//!
//! Before a document is re-inserted (update in place, or log replay after a
//! crash) the writer removes whatever the index already holds for its
//! identifier. A [`PrimaryKeyFilter`] matches the single live document whose
//! primary key equals the target.
//!
//! # Replay modes
//!
//! In [`ReplayMode::Normal`] a filter is single-shot: once an execution finds
//! the document, the filter goes inert: every later `prepare` returns
//! [`PreparedFilter::Empty`], and a handle prepared earlier matches nothing
//! in the remaining segments. In [`ReplayMode::Recovery`] the same logical
//! removal may be applied many times over a growing set of segments, so the
//! filter stays usable and keeps matching whatever copy is still live.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessera_core::LocalDocumentId;

use crate::primary_key::PrimaryKey;
use crate::segment::{DocId, IndexSegment, IndexSnapshot};

/// Document id reported by an exhausted cursor.
pub const TERMINATED: DocId = DocId::MAX;

/// Whether writes are being applied normally or replayed during recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Regular operation: filters execute at most once successfully
    #[default]
    Normal,
    /// Log replay: filters may execute repeatedly
    Recovery,
}

/// Matches the document stored under one primary key.
pub struct PrimaryKeyFilter {
    id: LocalDocumentId,
    key: PrimaryKey,
    used: AtomicBool,
}

impl PrimaryKeyFilter {
    /// Creates a filter for `id`.
    pub fn new(id: LocalDocumentId) -> Self {
        Self {
            id,
            key: PrimaryKey::encode(id),
            used: AtomicBool::new(false),
        }
    }

    /// Target identifier.
    pub fn id(&self) -> LocalDocumentId {
        self.id
    }

    /// Encoded target key.
    pub fn key(&self) -> &PrimaryKey {
        &self.key
    }

    /// Whether a normal-mode execution already removed the document.
    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    /// Prepares the filter for execution against `snapshot`.
    ///
    /// Returns a handle to this filter, the same one on every call, until a
    /// normal-mode execution finds its document; after that the result is
    /// [`PreparedFilter::Empty`]. In recovery mode the filter never goes
    /// inert.
    pub fn prepare(&self, _snapshot: &dyn IndexSnapshot, mode: ReplayMode) -> PreparedFilter<'_> {
        if mode == ReplayMode::Normal && self.is_used() {
            return PreparedFilter::Empty;
        }
        PreparedFilter::PrimaryKey(self)
    }

    fn execute(&self, segment: &dyn IndexSegment, mode: ReplayMode) -> PrimaryKeyCursor {
        // Matched in an earlier segment of the same snapshot.
        if mode == ReplayMode::Normal && self.is_used() {
            return PrimaryKeyCursor::new(None);
        }

        let doc = segment
            .postings(PrimaryKey::FIELD, self.key.as_bytes())
            .iter()
            .copied()
            .find(|&doc| segment.is_live(doc));

        if doc.is_some() && mode == ReplayMode::Normal {
            self.used.store(true, Ordering::Release);
            log::debug!("Primary key filter for {} matched, now inert", self.id);
        }
        PrimaryKeyCursor::new(doc)
    }
}

impl fmt::Debug for PrimaryKeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryKeyFilter")
            .field("id", &self.id)
            .field("used", &self.is_used())
            .finish()
    }
}

/// A filter ready to run against the segments of one snapshot.
#[derive(Debug, Clone, Copy)]
pub enum PreparedFilter<'f> {
    /// Matches nothing
    Empty,
    /// Matches the filter's primary key
    PrimaryKey(&'f PrimaryKeyFilter),
}

impl PreparedFilter<'_> {
    /// Runs the filter against one segment.
    pub fn execute(&self, segment: &dyn IndexSegment, mode: ReplayMode) -> PrimaryKeyCursor {
        match self {
            PreparedFilter::Empty => PrimaryKeyCursor::new(None),
            PreparedFilter::PrimaryKey(filter) => filter.execute(segment, mode),
        }
    }

    /// Whether this is the always-empty filter.
    pub fn is_empty(&self) -> bool {
        matches!(self, PreparedFilter::Empty)
    }
}

impl PartialEq for PreparedFilter<'_> {
    /// Prepared filters are equal when both are empty or both refer to the
    /// same filter instance.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PreparedFilter::Empty, PreparedFilter::Empty) => true,
            (PreparedFilter::PrimaryKey(a), PreparedFilter::PrimaryKey(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// Cursor over the (at most one) document matched in a segment.
#[derive(Debug, Clone)]
pub struct PrimaryKeyCursor {
    pending: Option<DocId>,
    doc: DocId,
}

impl PrimaryKeyCursor {
    fn new(doc: Option<DocId>) -> Self {
        Self {
            pending: doc,
            doc: TERMINATED,
        }
    }

    /// Moves to the next match. Returns `false` once exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match self.pending.take() {
            Some(doc) => {
                self.doc = doc;
                true
            }
            None => {
                self.doc = TERMINATED;
                false
            }
        }
    }

    /// Current document, or [`TERMINATED`] when no match is current.
    pub fn value(&self) -> DocId {
        self.doc
    }
}

/// Filters created by one write transaction.
///
/// Grows by emplacement; dropped or cleared when the transaction completes
/// or aborts.
#[derive(Debug, Default)]
pub struct PrimaryKeyFilterContainer {
    filters: Vec<Arc<PrimaryKeyFilter>>,
}

impl PrimaryKeyFilterContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter for `id` and returns it.
    pub fn emplace(&mut self, id: LocalDocumentId) -> Arc<PrimaryKeyFilter> {
        let filter = Arc::new(PrimaryKeyFilter::new(id));
        self.filters.push(Arc::clone(&filter));
        filter
    }

    /// Whether no filter has been added.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Filters in emplacement order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PrimaryKeyFilter>> {
        self.filters.iter()
    }

    /// Drops every filter at transaction end.
    pub fn clear(&mut self) {
        self.filters.clear();
    }
}
