//! Fixed token streams for non-string values.
//!
//! Null and boolean fields produce a single term. Numbers are converted to
//! `f64` and indexed at several precisions so range queries can match whole
//! blocks of values with one term.

use super::TokenStream;

/// Term emitted for `true`.
pub const TRUE_TERM: [u8; 1] = [0xFF];

/// Term emitted for `false`.
pub const FALSE_TERM: [u8; 1] = [0x00];

/// Bit distance between the precision levels of numeric terms.
pub const NUMERIC_PRECISION_STEP: u32 = 16;

/// Emits one empty term.
#[derive(Debug, Clone, Default)]
pub struct NullTokenStream {
    done: bool,
}

impl NullTokenStream {
    /// Creates a stream positioned before its only term.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStream for NullTokenStream {
    fn advance(&mut self) -> bool {
        !std::mem::replace(&mut self.done, true)
    }

    fn term(&self) -> &[u8] {
        &[]
    }
}

/// Emits [`TRUE_TERM`] or [`FALSE_TERM`].
#[derive(Debug, Clone)]
pub struct BooleanTokenStream {
    value: bool,
    done: bool,
}

impl BooleanTokenStream {
    /// Creates a stream for `value`.
    pub fn new(value: bool) -> Self {
        Self { value, done: false }
    }
}

impl TokenStream for BooleanTokenStream {
    fn advance(&mut self) -> bool {
        !std::mem::replace(&mut self.done, true)
    }

    fn term(&self) -> &[u8] {
        if self.value { &TRUE_TERM } else { &FALSE_TERM }
    }
}

/// Emits the multi-precision terms of a number.
///
/// Each term is the shift amount followed by the big-endian bytes of the
/// order-preserving bit pattern shifted right by that amount. Terms are
/// emitted from full precision to the coarsest level.
#[derive(Debug, Clone)]
pub struct NumericTokenStream {
    bits: u64,
    shift: Option<u32>,
    term: Vec<u8>,
}

impl NumericTokenStream {
    /// Creates a stream for `value`.
    pub fn new(value: f64) -> Self {
        Self {
            bits: sortable_bits(value),
            shift: None,
            term: Vec::with_capacity(9),
        }
    }
}

impl TokenStream for NumericTokenStream {
    fn advance(&mut self) -> bool {
        let shift = match self.shift {
            None => 0,
            Some(shift) => shift + NUMERIC_PRECISION_STEP,
        };
        if shift >= u64::BITS {
            return false;
        }
        self.shift = Some(shift);
        let significant = ((u64::BITS - shift) / 8) as usize;
        self.term.clear();
        // Shifts are multiples of 16, so they fit a byte.
        self.term.push(shift as u8);
        self.term
            .extend_from_slice(&(self.bits >> shift).to_be_bytes()[8 - significant..]);
        true
    }

    fn term(&self) -> &[u8] {
        &self.term
    }
}

/// Emits a fixed byte string once.
#[derive(Debug, Clone)]
pub struct KeyTokenStream {
    key: Vec<u8>,
    done: bool,
}

impl KeyTokenStream {
    /// Creates a stream for `key`.
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            done: false,
        }
    }

    /// Encoded key, whether or not the stream has been read.
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl TokenStream for KeyTokenStream {
    fn advance(&mut self) -> bool {
        !std::mem::replace(&mut self.done, true)
    }

    fn term(&self) -> &[u8] {
        &self.key
    }
}

/// Maps an `f64` to a `u64` whose unsigned order matches numeric order.
pub fn sortable_bits(value: f64) -> u64 {
    // Fold -0.0 into 0.0 so both encode identically.
    let bits = if value == 0.0 { 0 } else { value.to_bits() };
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analyzer::collect_terms;
    use proptest::prelude::*;

    #[test]
    fn test_null_stream_single_empty_term() {
        let mut stream = NullTokenStream::new();
        assert_eq!(collect_terms(&mut stream), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_boolean_terms() {
        assert_eq!(
            collect_terms(&mut BooleanTokenStream::new(true)),
            vec![TRUE_TERM.to_vec()]
        );
        assert_eq!(
            collect_terms(&mut BooleanTokenStream::new(false)),
            vec![FALSE_TERM.to_vec()]
        );
    }

    #[test]
    fn test_numeric_precision_levels() {
        let terms = collect_terms(&mut NumericTokenStream::new(42.0));
        assert_eq!(terms.len(), 4);
        let shifts: Vec<u8> = terms.iter().map(|t| t[0]).collect();
        assert_eq!(shifts, vec![0, 16, 32, 48]);
        let widths: Vec<usize> = terms.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![9, 7, 5, 3]);
    }

    #[test]
    fn test_numeric_full_precision_term() {
        let terms = collect_terms(&mut NumericTokenStream::new(1.0));
        let mut expected = vec![0u8];
        expected.extend_from_slice(&sortable_bits(1.0).to_be_bytes());
        assert_eq!(terms[0], expected);
    }

    #[test]
    fn test_signed_zero_encodes_identically() {
        assert_eq!(sortable_bits(0.0), sortable_bits(-0.0));
    }

    #[test]
    fn test_key_stream() {
        let mut stream = KeyTokenStream::new(vec![1, 2, 3]);
        assert_eq!(collect_terms(&mut stream), vec![vec![1, 2, 3]]);
    }

    proptest! {
        #[test]
        fn test_sortable_bits_preserve_order(a in -1.0e300f64..1.0e300, b in -1.0e300f64..1.0e300) {
            if a < b {
                prop_assert!(sortable_bits(a) < sortable_bits(b));
            }
        }
    }
}
