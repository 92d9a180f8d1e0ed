//! Traversal of complete documents under various configurations.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tessera_fts::analyzer::collect_terms;
use tessera_fts::field::{
    mangle_bool, mangle_null, mangle_numeric, mangle_string, mangle_string_identity,
};
use tessera_fts::{
    Analyzer, AnalyzerRegistry, Features, FieldIterator, FieldKind, FieldMeta,
    IDENTITY_ANALYZER, TokenStream,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Accepts any input and produces no terms.
struct EmptyAnalyzer;

impl TokenStream for EmptyAnalyzer {
    fn advance(&mut self) -> bool {
        false
    }

    fn term(&self) -> &[u8] {
        &[]
    }
}

impl Analyzer for EmptyAnalyzer {
    fn reset(&mut self, _input: &str) -> bool {
        true
    }
}

fn registry_with_empty() -> AnalyzerRegistry {
    let registry = AnalyzerRegistry::new();
    registry.register_type("empty", |_: &str| {
        Some(Box::new(EmptyAnalyzer) as Box<dyn Analyzer>)
    });
    registry
        .emplace("empty", "empty", "en", Features::FREQUENCY)
        .unwrap();
    registry
}

fn complex_document() -> Value {
    json!({
        "nested": { "foo": "str" },
        "keys": ["1", "2", "3", "4"],
        "analyzers": [],
        "boost": "10",
        "depth": "20",
        "fields": { "fieldA": { "name": "a" }, "fieldB": { "name": "b" } },
        "listValuation": "ignored",
        "locale": "ru_RU.KOI8-R",
        "array": [
            { "id": "1", "subarr": ["1", "2", "3"], "subobj": { "id": "1" } },
            { "subarr": ["4", "5", "6"], "subobj": { "name": "foo" }, "id": "2" },
            { "id": "3", "subarr": ["7", "8", "9"], "subobj": { "id": "2" } }
        ]
    })
}

fn collect_names(it: &mut FieldIterator<'_>) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(field) = it.current() {
        names.push(field.name().to_string());
        it.advance();
    }
    names
}

fn identity_features() -> Features {
    Features::FREQUENCY | Features::NORM
}

// ============================================================================
// Field selection
// ============================================================================

#[test]
fn test_all_fields_share_names_without_positions() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
    let doc = complex_document();

    let mut expected: HashMap<String, usize> = [
        ("nested.foo", 1),
        ("keys", 4),
        ("boost", 1),
        ("depth", 1),
        ("fields.fieldA.name", 1),
        ("fields.fieldB.name", 1),
        ("listValuation", 1),
        ("locale", 1),
        ("array.id", 3),
        ("array.subarr", 9),
        ("array.subobj.id", 2),
        ("array.subobj.name", 1),
    ]
    .into_iter()
    .map(|(path, count)| (mangle_string_identity(path), count))
    .collect();

    let mut it = FieldIterator::over(&doc, &meta);
    assert_ne!(it, FieldIterator::new());
    while let Some(field) = it.current() {
        let count = expected.get_mut(field.name()).unwrap();
        *count -= 1;
        if *count == 0 {
            expected.remove(field.name());
        }
        assert_eq!(field.features(), identity_features());
        assert_eq!(field.analyzer(), Some(IDENTITY_ANALYZER));
        it.advance();
    }

    assert!(expected.is_empty(), "missing fields: {expected:?}");
    assert_eq!(it, FieldIterator::new());
}

#[test]
fn test_all_fields_with_list_positions() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry)
        .include_all_fields(true)
        .track_list_positions(true)
        .build();
    let doc = complex_document();

    let expected: Vec<String> = [
        "nested.foo",
        "keys[0]",
        "keys[1]",
        "keys[2]",
        "keys[3]",
        "boost",
        "depth",
        "fields.fieldA.name",
        "fields.fieldB.name",
        "listValuation",
        "locale",
        "array[0].id",
        "array[0].subarr[0]",
        "array[0].subarr[1]",
        "array[0].subarr[2]",
        "array[0].subobj.id",
        "array[1].subarr[0]",
        "array[1].subarr[1]",
        "array[1].subarr[2]",
        "array[1].subobj.name",
        "array[1].id",
        "array[2].id",
        "array[2].subarr[0]",
        "array[2].subarr[1]",
        "array[2].subarr[2]",
        "array[2].subobj.id",
    ]
    .into_iter()
    .map(mangle_string_identity)
    .collect();

    let mut it = FieldIterator::over(&doc, &meta);
    assert_eq!(collect_names(&mut it), expected);
    assert!(it.is_end());
}

#[test]
fn test_only_listed_fields() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::from_json(
        r#"{
            "includeAllFields": false,
            "trackListPositions": true,
            "fields": { "boost": {} },
            "analyzers": ["identity"]
        }"#,
        &registry,
    )
    .unwrap();
    let doc = complex_document();

    let mut it = FieldIterator::over(&doc, &meta);
    assert!(it.valid());
    let field = it.current().unwrap();
    assert_eq!(field.name(), mangle_string_identity("boost"));
    assert_eq!(field.features(), identity_features());

    assert!(!it.advance());
    assert_eq!(it, FieldIterator::new());
}

#[test]
fn test_no_fields_included() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry)
        .include_all_fields(false)
        .track_list_positions(true)
        .build();
    let doc = complex_document();

    let it = FieldIterator::over(&doc, &meta);
    assert!(!it.valid());
    assert_eq!(it, FieldIterator::new());
}

#[test]
fn test_no_analyzers_produces_nothing() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry)
        .analyzers(Vec::new())
        .include_all_fields(true)
        .build();
    let doc = complex_document();

    let it = FieldIterator::over(&doc, &meta);
    assert!(!it.valid());
    assert_eq!(it, FieldIterator::new());
}

// ============================================================================
// Value types
// ============================================================================

#[test]
fn test_value_types() {
    let registry = registry_with_empty();
    let meta = FieldMeta::builder(&registry)
        .analyzers(vec![registry.identity(), registry.get("empty").unwrap()])
        .include_all_fields(true)
        .build();
    let doc = json!({
        "mustBeSkipped": {},
        "stringValue": "string",
        "nullValue": null,
        "trueValue": true,
        "falseValue": false,
        "mustBeSkipped2": {},
        "smallIntValue": 10,
        "smallNegativeIntValue": -5,
        "bigIntValue": 2147483647,
        "bigNegativeIntValue": -2147483648i64,
        "smallDoubleValue": 20.123,
        "bigDoubleValue": 1.79769e308,
        "bigNegativeDoubleValue": -1.79769e308
    });

    let mut it = FieldIterator::over(&doc, &meta);

    {
        let field = it.current_mut().unwrap();
        assert_eq!(field.name(), mangle_string_identity("stringValue"));
        assert_eq!(field.kind(), FieldKind::String);
        assert_eq!(field.features(), identity_features());
        assert_eq!(collect_terms(field.tokens()), vec![b"string".to_vec()]);
    }

    assert!(it.advance());
    {
        let field = it.current_mut().unwrap();
        assert_eq!(field.name(), mangle_string("stringValue", "empty"));
        assert_eq!(field.kind(), FieldKind::Analyzed("empty"));
        assert_eq!(field.features(), Features::FREQUENCY);
        assert!(!field.tokens().advance());
    }

    assert!(it.advance());
    {
        let field = it.current_mut().unwrap();
        assert_eq!(field.name(), mangle_null("nullValue"));
        assert_eq!(field.kind(), FieldKind::Null);
        assert!(field.tokens().advance());
    }

    for name in ["trueValue", "falseValue"] {
        assert!(it.advance());
        let field = it.current_mut().unwrap();
        assert_eq!(field.name(), mangle_bool(name));
        assert_eq!(field.kind(), FieldKind::Bool);
        assert!(field.tokens().advance());
    }

    for name in [
        "smallIntValue",
        "smallNegativeIntValue",
        "bigIntValue",
        "bigNegativeIntValue",
        "smallDoubleValue",
        "bigDoubleValue",
        "bigNegativeDoubleValue",
    ] {
        assert!(it.advance());
        let field = it.current_mut().unwrap();
        assert_eq!(field.name(), mangle_numeric(name));
        assert_eq!(field.kind(), FieldKind::Numeric);
        assert!(field.tokens().advance());
    }

    assert!(!it.advance());
    assert_eq!(it, FieldIterator::new());
}

#[test]
fn test_scalar_token_streams() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
    let doc = json!({ "n": null, "t": true, "f": false, "d": 1.5 });

    let mut it = FieldIterator::over(&doc, &meta);
    let mut terms = Vec::new();
    while let Some(field) = it.current_mut() {
        terms.push(collect_terms(field.tokens()));
        it.advance();
    }

    assert_eq!(terms[0], vec![Vec::<u8>::new()]);
    assert_eq!(terms[1], vec![vec![0xFF]]);
    assert_eq!(terms[2], vec![vec![0x00]]);
    // One term per precision step, most precise first.
    assert_eq!(terms[3].len(), 4);
    assert_eq!(terms[3][0][0], 0);
    assert_eq!(terms[3][0].len(), 9);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn test_reset_switches_documents() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
    let first = json!({ "boost": "10", "depth": "20" });
    let second = json!({ "name": "foo" });

    let mut it = FieldIterator::new();
    it.reset(&first, &meta);
    assert_eq!(it.current().unwrap().name(), mangle_string_identity("boost"));
    assert!(it.advance());
    assert_eq!(it.current().unwrap().name(), mangle_string_identity("depth"));
    assert!(!it.advance());

    it.reset(&second, &meta);
    assert!(it.valid());
    assert_eq!(it.current().unwrap().name(), mangle_string_identity("name"));
    assert_eq!(it.current().unwrap().features(), identity_features());
    assert!(!it.advance());
}

#[test]
fn test_reset_mid_traversal() {
    let registry = AnalyzerRegistry::new();
    let meta = FieldMeta::builder(&registry).include_all_fields(true).build();
    let first = json!({ "a": ["x", "y", "z"] });
    let second = json!({ "b": "w" });

    let mut it = FieldIterator::over(&first, &meta);
    assert!(it.advance());
    it.reset(&second, &meta);
    assert_eq!(collect_names(&mut it), vec![mangle_string_identity("b")]);
    assert_eq!(registry.identity().idle_count(), registry.identity().created_count());
}

// ============================================================================
// Configuration inheritance
// ============================================================================

#[test]
fn test_meta_inheritance() {
    let registry = registry_with_empty();
    let meta = FieldMeta::from_json(
        r#"{
            "includeAllFields": true,
            "trackListPositions": true,
            "fields": {
                "boost": { "analyzers": ["identity"] },
                "keys": { "trackListPositions": false, "analyzers": ["identity"] },
                "depth": { "trackListPositions": true },
                "fields": {
                    "includeAllFields": false,
                    "fields": { "fieldA": { "includeAllFields": true } }
                },
                "listValuation": { "includeAllFields": false },
                "array": {
                    "fields": {
                        "subarr": { "trackListPositions": false },
                        "subobj": { "includeAllFields": false },
                        "id": {}
                    }
                }
            },
            "analyzers": ["identity", "empty"]
        }"#,
        &registry,
    )
    .unwrap();
    let doc = json!({
        "nested": { "foo": "str" },
        "keys": ["1", "2", "3", "4"],
        "analyzers": [],
        "boost": "10",
        "depth": 20,
        "fields": { "fieldA": { "name": "a" }, "fieldB": { "name": "b" } },
        "listValuation": "ignored",
        "locale": null,
        "array": [
            { "id": 1, "subarr": ["1", "2", "3"], "subobj": { "id": 1 } },
            { "subarr": ["4", "5", "6"], "subobj": { "name": "foo" }, "id": "2" },
            { "id": 3, "subarr": ["7", "8", "9"], "subobj": { "id": 2 } }
        ]
    });

    let both = |path: &str| vec![mangle_string_identity(path), mangle_string(path, "empty")];
    let mut expected = Vec::new();
    expected.extend(both("nested.foo"));
    expected.extend(vec![mangle_string_identity("keys"); 4]);
    expected.push(mangle_string_identity("boost"));
    expected.push(mangle_numeric("depth"));
    expected.extend(both("fields.fieldA.name"));
    expected.extend(both("listValuation"));
    expected.push(mangle_null("locale"));
    expected.push(mangle_numeric("array[0].id"));
    for _ in 0..3 {
        expected.extend(both("array[0].subarr"));
    }
    for _ in 0..3 {
        expected.extend(both("array[1].subarr"));
    }
    expected.extend(both("array[1].id"));
    expected.push(mangle_numeric("array[2].id"));
    for _ in 0..3 {
        expected.extend(both("array[2].subarr"));
    }

    let mut it = FieldIterator::over(&doc, &meta);
    let mut actual = Vec::new();
    while let Some(field) = it.current() {
        match field.kind() {
            FieldKind::String => assert_eq!(field.features(), identity_features()),
            FieldKind::Analyzed(name) => {
                assert_eq!(name, "empty");
                assert_eq!(field.features(), Features::FREQUENCY);
            }
            _ => assert_eq!(field.features(), Features::empty()),
        }
        actual.push(field.name().to_string());
        it.advance();
    }

    assert_eq!(actual, expected);
    assert_eq!(it, FieldIterator::new());
}

// ============================================================================
// Unavailable analyzers
// ============================================================================

// Registers an "invalid" type whose factory succeeds exactly once. The single
// instance is consumed when the pool is primed.
fn registry_with_invalid() -> AnalyzerRegistry {
    let registry = registry_with_empty();
    let built = Arc::new(AtomicBool::new(false));
    registry.register_type("invalid", move |_: &str| {
        if built.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Box::new(EmptyAnalyzer) as Box<dyn Analyzer>)
        }
    });
    registry
        .emplace("invalid", "invalid", "en", Features::FREQUENCY)
        .unwrap();
    registry
}

#[test]
fn test_unavailable_last_analyzer_is_skipped() {
    let registry = registry_with_invalid();
    let invalid = registry.get("invalid").unwrap();
    let meta = FieldMeta::builder(&registry)
        .analyzers(vec![registry.identity(), registry.get("empty").unwrap(), Arc::clone(&invalid)])
        .include_all_fields(true)
        .build();
    let doc = json!({ "stringValue": "string" });

    // Hold the only instance the factory will ever produce.
    let held = invalid.acquire().unwrap();

    let mut it = FieldIterator::over(&doc, &meta);
    assert_eq!(it.current().unwrap().name(), mangle_string_identity("stringValue"));
    assert!(it.advance());
    assert_eq!(it.current().unwrap().name(), mangle_string("stringValue", "empty"));
    assert_eq!(it.current().unwrap().features(), Features::FREQUENCY);
    assert!(!it.advance());
    assert_eq!(it, FieldIterator::new());

    drop(held);
}

#[test]
fn test_unavailable_first_analyzer_is_skipped() {
    let registry = registry_with_invalid();
    let invalid = registry.get("invalid").unwrap();
    let meta = FieldMeta::builder(&registry)
        .analyzers(vec![Arc::clone(&invalid), registry.get("empty").unwrap()])
        .include_all_fields(true)
        .build();
    let doc = json!({ "stringValue": "string" });

    let held = invalid.acquire().unwrap();

    let mut it = FieldIterator::over(&doc, &meta);
    assert!(it.valid());
    assert_eq!(it.current().unwrap().name(), mangle_string("stringValue", "empty"));
    assert!(!it.advance());
    assert_eq!(it, FieldIterator::new());

    drop(held);
}

// ============================================================================
// Concurrent traversal
// ============================================================================

#[test]
fn test_concurrent_traversals_share_pools() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 50;

    let registry = AnalyzerRegistry::new();
    registry
        .emplace("csv", "delimiter", r#"{"delimiter":","}"#, Features::FREQUENCY)
        .unwrap();
    let meta = FieldMeta::from_value(
        &json!({ "includeAllFields": true, "analyzers": [IDENTITY_ANALYZER, "csv"] }),
        &registry,
    )
    .unwrap();

    let produced: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|thread| {
                let meta = &meta;
                scope.spawn(move || {
                    let mut count = 0;
                    for round in 0..ROUNDS {
                        let tag = format!("t{thread}r{round}");
                        let doc = json!({ "id": thread, "tags": format!("a,{tag}") });

                        let mut it = FieldIterator::over(&doc, meta);
                        let mut names = Vec::new();
                        while let Some(field) = it.current_mut() {
                            names.push(field.name().to_string());
                            if field.analyzer() == Some("csv") {
                                assert_eq!(
                                    collect_terms(field.tokens()),
                                    vec![b"a".to_vec(), tag.as_bytes().to_vec()]
                                );
                            }
                            count += 1;
                            it.advance();
                        }
                        assert_eq!(
                            names,
                            vec![
                                mangle_numeric("id"),
                                mangle_string_identity("tags"),
                                mangle_string("tags", "csv"),
                            ]
                        );
                    }
                    count
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(produced, vec![3 * ROUNDS; THREADS]);
    for name in [IDENTITY_ANALYZER, "csv"] {
        let pool = registry.get(name).unwrap();
        assert!(pool.created_count() >= 1);
        assert!(pool.created_count() <= THREADS + 1);
        assert_eq!(pool.idle_count(), pool.created_count());
    }
}
