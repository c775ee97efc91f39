// tests/compiler_tests.rs

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use bindexpr::{
    ErrorKind, Evaluator, ExpressionCache, Filter, FilterRegistry, Value, convert::json_to_value,
    parse,
};
use serde_json::json;

fn eval(source: &str, scope: &mut Value) -> Value {
    parse(source).unwrap().evaluate(scope, None).unwrap()
}

fn eval_json(source: &str, scope: serde_json::Value) -> Value {
    eval(source, &mut json_to_value(scope))
}

fn eval_plain(source: &str) -> Value {
    eval_json(source, json!({}))
}

fn eval_err(source: &str, scope: serde_json::Value) -> ErrorKind {
    parse(source)
        .unwrap()
        .evaluate(&mut json_to_value(scope), None)
        .unwrap_err()
        .kind()
}

fn object(pairs: Vec<(&str, Value)>) -> Value {
    pairs.into_iter().collect()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(eval_plain("1 + 2 * 3"), Value::Integer(7));
    assert_eq!(eval_plain("(1 + 2) * 3"), Value::Integer(9));
    assert_eq!(eval_plain("6 / 3"), Value::Integer(2));
    assert_eq!(eval_plain("7 / 2"), Value::Float(3.5));
    assert_eq!(eval_plain("7 % 3"), Value::Integer(1));
    assert_eq!(eval_plain("-3 - 4"), Value::Integer(-7));
}

#[test]
fn test_mixed_arithmetic_is_decimal() {
    assert_eq!(eval_plain("0.1 * 3"), Value::Float(0.3));
    assert_eq!(eval_plain("2.5 * 4"), Value::Integer(10));
    assert!(matches!(eval_plain("2.5 * 4"), Value::Integer(10)));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval_plain("1 / 0"), Value::Float(f64::INFINITY));
    assert!(matches!(eval_plain("0 / 0"), Value::Float(n) if n.is_nan()));
}

#[test]
fn test_plus_with_strings_and_undefined() {
    assert_eq!(eval_plain("1 + 'a'"), Value::from("1a"));
    assert_eq!(eval_plain("'a' + undefined"), Value::from("a"));
    assert_eq!(eval_plain("missing + 1"), Value::Integer(1));
    assert_eq!(eval_plain("'n=' + 1.5"), Value::from("n=1.5"));
}

#[test]
fn test_undefined_counts_as_zero_in_subtraction_and_negation() {
    assert_eq!(eval_plain("undefined - 1"), Value::Integer(-1));
    assert_eq!(eval_plain("-missing"), Value::Integer(0));
    assert_eq!(eval_plain("+missing"), Value::Integer(0));
}

#[test]
fn test_numeric_coercion() {
    assert_eq!(eval_plain("'3' * 2"), Value::Integer(6));
    assert_eq!(eval_plain("true + 1"), Value::Integer(2));
    assert!(matches!(eval_plain("'x' * 2"), Value::Float(n) if n.is_nan()));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval_plain("2 > 1"), Value::Boolean(true));
    assert_eq!(eval_plain("2 <= 1.5"), Value::Boolean(false));
    assert_eq!(eval_plain("'b' > 'a'"), Value::Boolean(true));
    assert_eq!(eval_plain("'10' < 9"), Value::Boolean(false));
}

#[test]
fn test_equality() {
    assert_eq!(eval_plain("1 == '1'"), Value::Boolean(true));
    assert_eq!(eval_plain("1 === '1'"), Value::Boolean(false));
    assert_eq!(eval_plain("1 === 1.0"), Value::Boolean(true));
    assert_eq!(eval_plain("null == undefined"), Value::Boolean(true));
    assert_eq!(eval_plain("null === undefined"), Value::Boolean(false));
    assert_eq!(eval_plain("null != 0"), Value::Boolean(true));
    assert_eq!(eval_plain("[1, 2] === [1, 2]"), Value::Boolean(true));
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval_plain("0 || 'x'"), Value::from("x"));
    assert_eq!(eval_plain("'a' && 0"), Value::Integer(0));
    assert_eq!(eval_plain("!''"), Value::Boolean(true));
    // The right side never runs
    assert_eq!(eval_plain("null && missing.call()"), Value::Null);
}

#[test]
fn test_conditional() {
    let scope = json!({"n": 5});
    assert_eq!(eval_json("n > 3 ? 'big' : 'small'", scope.clone()), Value::from("big"));
    assert_eq!(eval_json("n > 9 ? 'big' : 'small'", scope), Value::from("small"));
}

// ============================================================================
// Member access
// ============================================================================

#[test]
fn test_member_access() {
    let scope = json!({"a": {"b": {"c": 1}}, "arr": [10, 20], "s": "abc"});
    assert_eq!(eval_json("a.b.c", scope.clone()), Value::Integer(1));
    assert_eq!(eval_json("a['b']['c']", scope.clone()), Value::Integer(1));
    assert_eq!(eval_json("arr[1]", scope.clone()), Value::Integer(20));
    assert_eq!(eval_json("arr[0 + 1]", scope.clone()), Value::Integer(20));
    assert_eq!(eval_json("arr.length", scope.clone()), Value::Integer(2));
    assert_eq!(eval_json("s.length", scope.clone()), Value::Integer(3));
    assert_eq!(eval_json("s[1]", scope), Value::from("b"));
}

#[test]
fn test_safe_traversal() {
    let scope = json!({"a": {"b": null}});
    assert_eq!(eval_json("a.b.c", scope.clone()), Value::Undefined);
    assert_eq!(eval_json("a.x.y.z", scope.clone()), Value::Undefined);
    assert_eq!(eval_json("nothing[0].deep", scope), Value::Undefined);
}

#[test]
fn test_member_of_temporary() {
    assert_eq!(eval_plain("[1, 2, 3][2]"), Value::Integer(3));
    assert_eq!(eval_plain("{a: {b: 'x'}}.a.b"), Value::from("x"));
    assert_eq!(eval_plain("'abc'.length"), Value::Integer(3));
}

#[test]
fn test_keyword_properties() {
    let scope = json!({"foo": {"this": 1, "null": 2, "true": 3}});
    assert_eq!(eval_json("foo.this + foo.null + foo.true", scope), Value::Integer(6));
}

// ============================================================================
// Scope and locals
// ============================================================================

#[test]
fn test_locals_shadow_scope() {
    let evaluator = parse("a + b").unwrap();
    let mut scope = json_to_value(json!({"a": 1, "b": 2}));
    let mut locals = json_to_value(json!({"a": 10}));

    let result = evaluator.evaluate(&mut scope, Some(&mut locals)).unwrap();
    assert_eq!(result, Value::Integer(12));
}

#[test]
fn test_this_and_locals_expressions() {
    let mut scope = json_to_value(json!({"a": 1}));
    let mut locals = json_to_value(json!({"a": 10}));

    let this_a = parse("this.a").unwrap();
    assert_eq!(
        this_a.evaluate(&mut scope, Some(&mut locals)).unwrap(),
        Value::Integer(1)
    );

    let locals_a = parse("$locals.a").unwrap();
    assert_eq!(
        locals_a.evaluate(&mut scope, Some(&mut locals)).unwrap(),
        Value::Integer(10)
    );
    assert_eq!(locals_a.evaluate(&mut scope, None).unwrap(), Value::Undefined);

    assert_eq!(parse("this").unwrap().evaluate(&mut scope, None).unwrap(), scope.clone());
}

// ============================================================================
// Assignment
// ============================================================================

#[test]
fn test_assignment_creates_intermediate_objects() {
    let mut scope = json_to_value(json!({}));
    assert_eq!(eval("a.b.c = 5", &mut scope), Value::Integer(5));
    assert_eq!(scope, json_to_value(json!({"a": {"b": {"c": 5}}})));
}

#[test]
fn test_assignment_expression_value_and_chaining() {
    let mut scope = json_to_value(json!({}));
    assert_eq!(eval("x = y = 2", &mut scope), Value::Integer(2));
    assert_eq!(scope, json_to_value(json!({"x": 2, "y": 2})));
}

#[test]
fn test_assignment_to_array_index() {
    let mut scope = json_to_value(json!({"items": [1, 2]}));
    eval("items[1] = 'b'", &mut scope);
    eval("items[3] = 'd'", &mut scope);
    assert_eq!(
        scope.get("items"),
        Value::Array(vec![
            Value::Integer(1),
            Value::from("b"),
            Value::Undefined,
            Value::from("d"),
        ])
    );
}

#[test]
fn test_assignment_to_far_array_index_fails() {
    for source in ["items[1000000000000000000] = 1", "items[1000000000000000000].x = 1"] {
        assert_eq!(eval_err(source, json!({"items": []})), ErrorKind::Type, "{}", source);
    }
    assert_eq!(eval_err("items[70000] = 1", json!({"items": [1]})), ErrorKind::Type);
}

#[test]
fn test_assignment_resolves_target_before_value() {
    let mut scope = json_to_value(json!({"a": {}, "i": 0}));
    eval("a[i] = i = 2", &mut scope);
    assert_eq!(scope.get("a"), json_to_value(json!({"0": 2})));
    assert_eq!(scope.get("i"), Value::Integer(2));
}

#[test]
fn test_assignment_writes_locals_when_they_define_the_name() {
    let evaluator = parse("x = 2").unwrap();
    let mut scope = json_to_value(json!({"x": 1}));
    let mut locals = json_to_value(json!({"x": 0}));

    evaluator.evaluate(&mut scope, Some(&mut locals)).unwrap();
    assert_eq!(scope.get("x"), Value::Integer(1));
    assert_eq!(locals.get("x"), Value::Integer(2));
}

#[test]
fn test_setter() {
    let evaluator = parse("user.name").unwrap();
    assert!(evaluator.is_assignable());

    let mut scope = json_to_value(json!({"user": {"name": "ada"}}));
    evaluator.assign(&mut scope, Value::from("bob"), None).unwrap();
    assert_eq!(evaluator.evaluate(&mut scope, None).unwrap(), Value::from("bob"));
}

#[test]
fn test_setter_on_computed_member() {
    let evaluator = parse("map[key]").unwrap();
    let mut scope = json_to_value(json!({"map": {}, "key": "k1"}));
    evaluator.assign(&mut scope, Value::Integer(1), None).unwrap();
    assert_eq!(scope.get("map"), json_to_value(json!({"k1": 1})));
}

#[test]
fn test_non_assignable_evaluator() {
    for source in ["a + b", "f()", "1", "a; b", ""] {
        let evaluator = parse(source).unwrap();
        assert!(!evaluator.is_assignable(), "{}", source);
        let err = evaluator
            .assign(&mut Value::Undefined, Value::Null, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonAssignable);
    }
}

#[test]
fn test_assigning_into_a_number_fails() {
    assert_eq!(eval_err("n.x = 1", json!({"n": 5})), ErrorKind::Type);
}

// ============================================================================
// Calls
// ============================================================================

fn scope_with_functions() -> Value {
    let double = Value::function("double", |_, args| {
        Ok(Value::from(args.first().map_or(f64::NAN, Value::to_number) * 2.0))
    });
    let greet = Value::function("greet", |this, _| {
        Ok(Value::from(format!("hi {}", this.get("name").to_display_string())))
    });

    object(vec![
        ("name", Value::from("scope")),
        ("double", double),
        ("greet", greet.clone()),
        ("obj", object(vec![("name", Value::from("obj")), ("greet", greet)])),
    ])
}

#[test]
fn test_function_call() {
    let mut scope = scope_with_functions();
    assert_eq!(eval("double(21)", &mut scope), Value::Integer(42));
    assert_eq!(eval("double(double(1) + 1)", &mut scope), Value::Integer(6));
}

#[test]
fn test_method_call_receives_its_object() {
    let mut scope = scope_with_functions();
    assert_eq!(eval("obj.greet()", &mut scope), Value::from("hi obj"));
    assert_eq!(eval("obj['greet']()", &mut scope), Value::from("hi obj"));
    assert_eq!(eval("greet()", &mut scope), Value::from("hi scope"));
}

#[test]
fn test_calling_nothing_yields_undefined() {
    let mut scope = scope_with_functions();
    assert_eq!(eval("missing()", &mut scope), Value::Undefined);
    assert_eq!(eval("obj.missing(1, 2)", &mut scope), Value::Undefined);
    assert_eq!(eval("a.b.c()", &mut scope), Value::Undefined);
}

#[test]
fn test_calling_a_non_function_fails() {
    let evaluator = parse("obj.name()").unwrap();
    let err = evaluator
        .evaluate(&mut scope_with_functions(), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
}

#[test]
fn test_function_errors_propagate() {
    let fail = Value::function("fail", |_, _| Err(bindexpr::ExprError::type_error("boom")));
    let mut scope = object(vec![("fail", fail)]);
    let err = parse("1 + fail()")
        .unwrap()
        .evaluate(&mut scope, None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Type error: boom");
}

// ============================================================================
// Sandbox
// ============================================================================

#[test]
fn test_forbidden_names() {
    let scope = json!({"a": {}, "k": "prototype"});
    for source in [
        "constructor",
        "a.constructor",
        "a['__proto__']",
        "a[k]",
        "a.__defineGetter__",
        "a.__lookupSetter__('x')",
        "a.constructor = 1",
        "{}.constructor",
    ] {
        assert_eq!(eval_err(source, scope.clone()), ErrorKind::Security, "{}", source);
    }
}

#[test]
fn test_forbidden_name_in_setter() {
    let evaluator = parse("a.__proto__").unwrap();
    let mut scope = json_to_value(json!({"a": {}}));
    let err = evaluator.assign(&mut scope, Value::Null, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Attempting to access a disallowed field '__proto__' in expression [a.__proto__]"
    );
    assert_eq!(scope, json_to_value(json!({"a": {}})));
}

#[test]
fn test_forbidden_names_as_plain_strings_are_fine() {
    assert_eq!(eval_plain("'constructor'"), Value::from("constructor"));
    assert_eq!(
        eval_plain("{constructor: 1}"),
        object(vec![("constructor", Value::Integer(1))])
    );
}

// ============================================================================
// Literals and programs
// ============================================================================

#[test]
fn test_array_and_object_literals() {
    let scope = json!({"a": 2, "k": "z"});
    assert_eq!(
        eval_json("[1, a, 'x']", scope.clone()),
        Value::Array(vec![Value::Integer(1), Value::Integer(2), Value::from("x")])
    );
    assert_eq!(
        eval_json("{a: 1, [k]: a, 'q r': 3, a}", scope),
        json_to_value(json!({"a": 2, "z": 2, "q r": 3}))
    );
}

#[test]
fn test_programs() {
    let mut scope = json_to_value(json!({}));
    assert_eq!(eval("a = 1; a + 1", &mut scope), Value::Integer(2));
    assert_eq!(scope.get("a"), Value::Integer(1));
    assert_eq!(eval("", &mut scope), Value::Undefined);
    assert_eq!(eval(";;", &mut scope), Value::Undefined);
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_constant_expressions() {
    for source in ["1 + 2", "[1, {a: 'x'}]", "'x' | uppercase", "-1", "true ? 1 : 2", ""] {
        let evaluator = parse(source).unwrap();
        assert!(evaluator.is_constant(), "{}", source);
        assert!(evaluator.inputs().is_empty(), "{}", source);
    }
}

#[test]
fn test_non_constant_expressions() {
    for source in ["a", "a.b", "f()", "a = 1", "this", "$locals", "[a]", "1 + a"] {
        assert!(!parse(source).unwrap().is_constant(), "{}", source);
    }
}

#[test]
fn test_watch_inputs() {
    let inputs = |source: &str| parse(source).unwrap().inputs().to_vec();

    assert_eq!(inputs("a + b.c"), vec!["a", "b.c"]);
    assert_eq!(inputs("a + a * 2"), vec!["a"]);
    assert_eq!(inputs("-x"), vec!["x"]);
    assert_eq!(inputs("a ? b : c"), vec!["a ? b : c"]);
    assert_eq!(inputs("a && b"), vec!["a && b"]);
    assert_eq!(inputs("f(a)"), vec!["f(a)"]);
    assert_eq!(inputs("a[b + 1]"), vec!["a[b + 1]"]);
    assert_eq!(inputs("a | uppercase"), vec!["a"]);
    assert_eq!(inputs("a | limitTo:n"), vec!["a", "n"]);
    assert_eq!(inputs("[a, {k: b}]"), vec!["a", "b"]);
    assert!(inputs("a; b").is_empty());
    assert!(inputs("this").is_empty());
}

#[test]
fn test_stateful_filter_is_never_constant() {
    let counter = Arc::new(AtomicI64::new(0));
    let seen = Arc::clone(&counter);
    let registry = FilterRegistry::with_builtins().register(
        "tick",
        Filter::stateful(move |_| Ok(Value::Integer(seen.fetch_add(1, Ordering::SeqCst)))),
    );
    let cache = ExpressionCache::new(Arc::new(registry));

    let evaluator = cache.get_or_compile("'x' | tick", false).unwrap();
    assert!(!evaluator.is_constant());
    assert_eq!(evaluator.inputs(), ["\"x\" | tick"]);

    let mut scope = Value::Undefined;
    assert_eq!(evaluator.evaluate(&mut scope, None).unwrap(), Value::Integer(0));
    assert_eq!(evaluator.evaluate(&mut scope, None).unwrap(), Value::Integer(1));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_literal_flag() {
    for (source, literal) in [
        ("[a, b]", true),
        ("{}", true),
        ("'x'", true),
        ("", true),
        ("a", false),
        ("1; 2", false),
        ("-1", false),
    ] {
        assert_eq!(parse(source).unwrap().is_literal(), literal, "{}", source);
    }
}

#[test]
fn test_one_time_prefix() {
    let evaluator = parse("::a.b").unwrap();
    assert!(evaluator.is_one_time());
    assert_eq!(evaluator.source(), "a.b");
    assert_eq!(eval_json("::a.b", json!({"a": {"b": 3}})), Value::Integer(3));

    assert!(parse("  ::x").unwrap().is_one_time());
    assert!(!parse("x").unwrap().is_one_time());
    assert!(!Arc::ptr_eq(&parse("::x").unwrap(), &parse("x").unwrap()));
}

#[test]
fn test_unknown_filter_fails_compilation() {
    let err = parse("a | nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFilter);
    assert_eq!(err.to_string(), "Unknown filter 'nope' in expression [a | nope]");
}

#[test]
fn test_ast_is_kept() {
    let evaluator = parse("a.b").unwrap();
    assert_eq!(evaluator.ast(), &bindexpr::parse_ast("a.b").unwrap());
}

// ============================================================================
// Sharing
// ============================================================================

#[test]
fn test_evaluator_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Evaluator>();
    assert_send_sync::<ExpressionCache>();
}

#[test]
fn test_evaluator_shared_across_threads() {
    let evaluator = parse("n * 2").unwrap();
    std::thread::scope(|s| {
        for n in 0..4i64 {
            let evaluator = Arc::clone(&evaluator);
            s.spawn(move || {
                let mut scope = object(vec![("n", Value::Integer(n))]);
                assert_eq!(evaluator.evaluate(&mut scope, None).unwrap(), Value::Integer(n * 2));
            });
        }
    });
}
