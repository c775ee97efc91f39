// tests/cache_tests.rs

use std::sync::Arc;

use bindexpr::{
    ErrorKind, ExpressionCache, FilterRegistry, LiteralValue, ParseOptions, Value, cache,
    convert::json_to_value,
};
use serde_json::json;

fn fresh_cache() -> ExpressionCache {
    ExpressionCache::new(Arc::new(FilterRegistry::with_builtins()))
}

#[test]
fn test_same_source_shares_evaluator() {
    let cache = fresh_cache();
    let first = cache.get_or_compile("a.b + 1", false).unwrap();
    let second = cache.get_or_compile("a.b + 1", false).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_different_sources_get_different_evaluators() {
    let cache = fresh_cache();
    let a = cache.get_or_compile("a", false).unwrap();
    let b = cache.get_or_compile("a ", false).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_isolate_literal_uses_disjoint_key() {
    let cache = fresh_cache();
    let general = cache.get_or_compile("[1, 2]", false).unwrap();
    let literal = cache.get_or_compile("[1, 2]", true).unwrap();

    assert!(!Arc::ptr_eq(&general, &literal));
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&literal, &cache.get_or_compile("[1, 2]", true).unwrap()));
}

#[test]
fn test_isolate_literal_accepts_nested_literals() {
    let cache = fresh_cache();
    let evaluator = cache
        .get_or_compile("{a: [1, -2.5, 'x'], 'b': {c: null, d: true}}", true)
        .unwrap();

    assert_eq!(
        evaluator.evaluate(&mut Value::Undefined, None).unwrap(),
        json_to_value(json!({"a": [1, -2.5, "x"], "b": {"c": null, "d": true}}))
    );
}

#[test]
fn test_isolate_literal_rejects_expressions() {
    let cache = fresh_cache();
    for source in [
        "a",
        "[a]",
        "{k: 1 + 1}",
        "{[k]: 1}",
        "1; 2",
        "",
        "'x' | uppercase",
        "!1",
        "!true",
        "[!0]",
        "-'x'",
    ] {
        let err = cache.get_or_compile(source, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonLiteral, "{}", source);
    }
    assert!(cache.is_empty());

    // The same text still compiles in general mode
    assert!(cache.get_or_compile("[a]", false).is_ok());
}

#[test]
fn test_errors_are_not_cached() {
    let cache = fresh_cache();
    assert_eq!(cache.get_or_compile("a +", false).unwrap_err().kind(), ErrorKind::UnexpectedEnd);
    assert_eq!(cache.get_or_compile("a | nope", false).unwrap_err().kind(), ErrorKind::UnknownFilter);
    assert!(cache.is_empty());
}

#[test]
fn test_cache_options_apply_to_compilation() {
    let options = ParseOptions::default().add_literal("yes", LiteralValue::Boolean(true));
    let cache = ExpressionCache::with_options(Arc::new(FilterRegistry::new()), options);

    let evaluator = cache.get_or_compile("yes", false).unwrap();
    assert!(evaluator.is_constant());
    assert_eq!(
        evaluator.evaluate(&mut Value::Undefined, None).unwrap(),
        Value::Boolean(true)
    );

    // No built-in filters in this cache
    assert_eq!(
        cache.get_or_compile("x | uppercase", false).unwrap_err().kind(),
        ErrorKind::UnknownFilter
    );
}

#[test]
fn test_closure_resolver() {
    let resolver = |name: &str| {
        (name == "shout").then(|| {
            bindexpr::Filter::new(|args| {
                Ok(Value::from(format!("{}!", args[0].to_display_string())))
            })
        })
    };
    let cache = ExpressionCache::new(Arc::new(resolver));
    let evaluator = cache.get_or_compile("'hey' | shout", false).unwrap();
    assert_eq!(
        evaluator.evaluate(&mut Value::Undefined, None).unwrap(),
        Value::from("hey!")
    );
}

#[test]
fn test_global_cache_and_parse_agree() {
    let via_parse = bindexpr::parse("shared.expression").unwrap();
    let via_cache = cache::global().get_or_compile("shared.expression", false).unwrap();
    assert!(Arc::ptr_eq(&via_parse, &via_cache));
}

#[test]
fn test_concurrent_compilation_converges() {
    let cache = fresh_cache();
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| cache.get_or_compile("x.y[z] | json", false).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for evaluator in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], evaluator));
    }
    assert_eq!(cache.len(), 1);
}
