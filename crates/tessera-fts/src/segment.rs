//! Read-side interfaces of an index.
//!
//! Filters run against these traits, so any segment store (on-disk or the
//! in-memory [`crate::memory`] index) can execute primary-key removals.

/// Position of a document inside one segment.
pub type DocId = u32;

/// An immutable unit of index storage produced by a commit.
pub trait IndexSegment {
    /// Number of documents written to the segment, including removed ones.
    fn docs_count(&self) -> u64;

    /// Number of documents not removed.
    fn live_docs_count(&self) -> u64;

    /// Whether `doc` exists and has not been removed.
    fn is_live(&self, doc: DocId) -> bool;

    /// Documents containing `term` in `field`, ascending. Includes removed
    /// documents.
    fn postings(&self, field: &str, term: &[u8]) -> &[DocId];

    /// Stored column value of `doc`.
    fn column_value(&self, column: &str, doc: DocId) -> Option<&[u8]>;
}

/// A point-in-time view over the segments of an index.
pub trait IndexSnapshot {
    /// Number of segments.
    fn segment_count(&self) -> usize;

    /// Segment at position `ord`.
    fn segment(&self, ord: usize) -> Option<&dyn IndexSegment>;

    /// Documents across all segments, including removed ones.
    fn docs_count(&self) -> u64 {
        (0..self.segment_count())
            .filter_map(|ord| self.segment(ord))
            .map(|segment| segment.docs_count())
            .sum()
    }

    /// Live documents across all segments.
    fn live_docs_count(&self) -> u64 {
        (0..self.segment_count())
            .filter_map(|ord| self.segment(ord))
            .map(|segment| segment.live_docs_count())
            .sum()
    }
}
