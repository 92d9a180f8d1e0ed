//! Text analysis: token streams, analyzers and pooled analyzer instances.
//!
//! Every indexed field hands the index writer a [`TokenStream`]. Scalar
//! values (null, booleans, numbers) use the fixed streams in [`scalar`];
//! strings go through an [`Analyzer`] borrowed from an [`AnalyzerPool`].
//!
//! Analyzer instances are stateful and expensive to build, so each configured
//! analyzer owns a pool of idle instances. [`AnalyzerPool::acquire`] hands one
//! out exclusively; dropping the returned [`PooledAnalyzer`] resets it and
//! puts it back.

pub mod builtin;
pub mod pool;
pub mod registry;
pub mod scalar;
#[cfg(feature = "fts-tantivy")]
pub mod text;

pub use pool::{AnalyzerFactory, AnalyzerPool, PooledAnalyzer};
pub use registry::{AnalyzerRegistry, IDENTITY_ANALYZER};

bitflags::bitflags! {
    /// Index features a field requests from the index writer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u8 {
        /// Term frequencies
        const FREQUENCY = 1;
        /// Term positions
        const POSITION = 1 << 1;
        /// Character offsets
        const OFFSET = 1 << 2;
        /// Field length norms
        const NORM = 1 << 3;
    }
}

/// A resettable sequence of terms.
pub trait TokenStream {
    /// Moves to the next term. Returns `false` once the stream is exhausted.
    fn advance(&mut self) -> bool;

    /// Bytes of the current term. Only meaningful after `advance` returned
    /// `true`.
    fn term(&self) -> &[u8];
}

/// A token stream that can be re-targeted at new input text.
pub trait Analyzer: TokenStream + Send {
    /// Points the analyzer at `input`, discarding any previous state.
    ///
    /// Returns `false` when the analyzer cannot process the input; the field
    /// is then skipped.
    fn reset(&mut self, input: &str) -> bool;
}

/// Drains `stream`, returning every remaining term.
pub fn collect_terms(stream: &mut dyn TokenStream) -> Vec<Vec<u8>> {
    let mut terms = Vec::new();
    while stream.advance() {
        terms.push(stream.term().to_vec());
    }
    terms
}
