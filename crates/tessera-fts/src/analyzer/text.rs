//! Language-aware text analyzer backed by Tantivy's tokenizer pipeline.
//!
//! This module is only available with the `fts-tantivy` feature.
//!
//! Pipeline: SimpleTokenizer → LowerCaser → Stemmer(locale), the same chain
//! Tantivy's `en_stem` tokenizer uses, with the stemmer language taken from
//! the analyzer properties.

use serde::Deserialize;
use tantivy::tokenizer::{
    Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer,
    TokenStream as TantivyTokenStream,
};

use super::{Analyzer, TokenStream};

/// Analyzer type name registered for [`TextAnalyzerAdapter`].
pub const TEXT_ANALYZER_TYPE: &str = "text";

/// Properties accepted by the `text` analyzer type.
#[derive(Debug, Clone, Deserialize)]
pub struct TextProperties {
    /// Two-letter language code, e.g. `"en"`
    pub locale: String,

    /// Whether to stem terms
    #[serde(default = "default_stemming")]
    pub stemming: bool,
}

fn default_stemming() -> bool {
    true
}

/// Adapts a Tantivy [`TextAnalyzer`] to the [`Analyzer`] interface.
///
/// Tantivy token streams borrow their input, so `reset` runs the pipeline
/// eagerly and buffers the produced terms.
#[derive(Clone)]
pub struct TextAnalyzerAdapter {
    analyzer: TextAnalyzer,
    terms: Vec<String>,
    position: Option<usize>,
}

impl TextAnalyzerAdapter {
    /// Builds an adapter from JSON properties such as `{"locale": "en"}`.
    ///
    /// Returns `None` for malformed properties or an unsupported locale.
    pub fn from_properties(properties: &str) -> Option<Self> {
        let props: TextProperties = match serde_json::from_str(properties) {
            Ok(props) => props,
            Err(err) => {
                log::warn!("Invalid text analyzer properties '{properties}': {err}");
                return None;
            }
        };
        let Some(language) = language(&props.locale) else {
            log::warn!("Unsupported text analyzer locale '{}'", props.locale);
            return None;
        };
        let analyzer = if props.stemming {
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(LowerCaser)
                .filter(Stemmer::new(language))
                .build()
        } else {
            TextAnalyzer::builder(SimpleTokenizer::default())
                .filter(LowerCaser)
                .build()
        };
        Some(Self {
            analyzer,
            terms: Vec::new(),
            position: None,
        })
    }
}

impl TokenStream for TextAnalyzerAdapter {
    fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.terms.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.terms.len());
            false
        }
    }

    fn term(&self) -> &[u8] {
        self.position
            .and_then(|p| self.terms.get(p))
            .map(String::as_bytes)
            .unwrap_or_default()
    }
}

impl Analyzer for TextAnalyzerAdapter {
    fn reset(&mut self, input: &str) -> bool {
        self.terms.clear();
        self.position = None;
        let mut stream = self.analyzer.token_stream(input);
        while stream.advance() {
            self.terms.push(stream.token().text.clone());
        }
        true
    }
}

fn language(locale: &str) -> Option<Language> {
    let code = locale.split(['_', '-', '.']).next().unwrap_or_default();
    let language = match code.to_ascii_lowercase().as_str() {
        "ar" => Language::Arabic,
        "da" => Language::Danish,
        "de" => Language::German,
        "el" => Language::Greek,
        "en" => Language::English,
        "es" => Language::Spanish,
        "fi" => Language::Finnish,
        "fr" => Language::French,
        "hu" => Language::Hungarian,
        "it" => Language::Italian,
        "nl" => Language::Dutch,
        "no" => Language::Norwegian,
        "pt" => Language::Portuguese,
        "ro" => Language::Romanian,
        "ru" => Language::Russian,
        "sv" => Language::Swedish,
        "ta" => Language::Tamil,
        "tr" => Language::Turkish,
        _ => return None,
    };
    Some(language)
}
