//! Analyzers that need no external tokenizer.

use serde::Deserialize;

use super::{Analyzer, TokenStream};

/// Emits the whole input as a single term.
#[derive(Debug, Clone, Default)]
pub struct IdentityAnalyzer {
    input: String,
    done: bool,
}

impl IdentityAnalyzer {
    /// Creates an analyzer positioned on empty input.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStream for IdentityAnalyzer {
    fn advance(&mut self) -> bool {
        !std::mem::replace(&mut self.done, true)
    }

    fn term(&self) -> &[u8] {
        self.input.as_bytes()
    }
}

impl Analyzer for IdentityAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        self.input.clear();
        self.input.push_str(input);
        self.done = false;
        true
    }
}

/// Properties accepted by [`DelimiterAnalyzer`].
#[derive(Debug, Clone, Deserialize)]
pub struct DelimiterProperties {
    /// Separator between terms; must not be empty
    pub delimiter: String,
}

/// Splits the input on a fixed delimiter, skipping empty pieces.
#[derive(Debug, Clone)]
pub struct DelimiterAnalyzer {
    delimiter: String,
    input: String,
    // Byte range of the current term, and where the next search starts.
    current: (usize, usize),
    cursor: usize,
}

impl DelimiterAnalyzer {
    /// Creates an analyzer splitting on `delimiter`.
    ///
    /// Returns `None` for an empty delimiter.
    pub fn new(delimiter: impl Into<String>) -> Option<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return None;
        }
        Some(Self {
            delimiter,
            input: String::new(),
            current: (0, 0),
            cursor: 0,
        })
    }

    /// Builds an analyzer from JSON properties such as `{"delimiter": ","}`.
    pub fn from_properties(properties: &str) -> Option<Self> {
        match serde_json::from_str::<DelimiterProperties>(properties) {
            Ok(props) => Self::new(props.delimiter),
            Err(err) => {
                log::warn!("Invalid delimiter analyzer properties '{properties}': {err}");
                None
            }
        }
    }
}

impl TokenStream for DelimiterAnalyzer {
    fn advance(&mut self) -> bool {
        while self.cursor < self.input.len() {
            let rest = &self.input[self.cursor..];
            let (len, skip) = match rest.find(&self.delimiter) {
                Some(at) => (at, at + self.delimiter.len()),
                None => (rest.len(), rest.len()),
            };
            let start = self.cursor;
            self.cursor += skip;
            if len > 0 {
                self.current = (start, start + len);
                return true;
            }
        }
        false
    }

    fn term(&self) -> &[u8] {
        &self.input.as_bytes()[self.current.0..self.current.1]
    }
}

impl Analyzer for DelimiterAnalyzer {
    fn reset(&mut self, input: &str) -> bool {
        self.input.clear();
        self.input.push_str(input);
        self.current = (0, 0);
        self.cursor = 0;
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::analyzer::collect_terms;

    fn terms(analyzer: &mut dyn Analyzer, input: &str) -> Vec<String> {
        assert!(analyzer.reset(input));
        let mut out = Vec::new();
        while analyzer.advance() {
            out.push(String::from_utf8(analyzer.term().to_vec()).unwrap());
        }
        out
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    #[test]
    fn test_identity_single_term() {
        let mut analyzer = IdentityAnalyzer::new();
        assert_eq!(terms(&mut analyzer, "Hello World"), vec!["Hello World"]);
    }

    #[test]
    fn test_identity_empty_input_still_emits() {
        let mut analyzer = IdentityAnalyzer::new();
        assert_eq!(terms(&mut analyzer, ""), vec![""]);
    }

    #[test]
    fn test_identity_reset_restarts() {
        let mut analyzer = IdentityAnalyzer::new();
        analyzer.reset("one");
        assert_eq!(collect_terms(&mut analyzer), vec![b"one".to_vec()]);
        analyzer.reset("two");
        assert_eq!(collect_terms(&mut analyzer), vec![b"two".to_vec()]);
    }

    // ------------------------------------------------------------------------
    // Delimiter
    // ------------------------------------------------------------------------

    #[test]
    fn test_delimiter_splits() {
        let mut analyzer = DelimiterAnalyzer::new(",").unwrap();
        assert_eq!(terms(&mut analyzer, "a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_delimiter_skips_empty_pieces() {
        let mut analyzer = DelimiterAnalyzer::new(",").unwrap();
        assert_eq!(terms(&mut analyzer, ",a,,b,"), vec!["a", "b"]);
        assert!(terms(&mut analyzer, "").is_empty());
    }

    #[test]
    fn test_delimiter_multibyte() {
        let mut analyzer = DelimiterAnalyzer::new("::").unwrap();
        assert_eq!(terms(&mut analyzer, "ä::ö::"), vec!["ä", "ö"]);
    }

    #[test]
    fn test_delimiter_from_properties() {
        assert!(DelimiterAnalyzer::from_properties(r#"{"delimiter": "|"}"#).is_some());
        assert!(DelimiterAnalyzer::from_properties(r#"{"delimiter": ""}"#).is_none());
        assert!(DelimiterAnalyzer::from_properties("not json").is_none());
    }
}
