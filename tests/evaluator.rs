use pretty_assertions::assert_eq;
use std::rc::Rc;
use yail::environment::Environment;
use yail::evaluator::{eval, MAX_CALL_DEPTH};
use yail::object::Object;
use yail::parser::parse;

fn run(source: &str) -> Rc<Object> {
    let (program, errors) = parse(source);
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(messages.is_empty(), "parse errors in {:?}: {:?}", source, messages);
    eval(&program, &Environment::new())
}

fn assert_integer(source: &str, expected: i64) {
    assert_eq!(run(source), Object::integer(expected), "source: {}", source);
}

fn assert_boolean(source: &str, expected: bool) {
    let result = run(source);
    assert!(
        Rc::ptr_eq(&result, &Object::boolean(expected)),
        "source: {}, got {}",
        source,
        result
    );
}

fn assert_null(source: &str) {
    let result = run(source);
    assert!(
        Rc::ptr_eq(&result, &Object::null()),
        "source: {}, got {}",
        source,
        result
    );
}

fn assert_error(source: &str, message: &str) {
    assert_eq!(run(source), Object::error(message), "source: {}", source);
}

fn assert_integers(source: &str, expected: &[i64]) {
    let expected = Object::array(expected.iter().copied().map(Object::integer).collect());
    assert_eq!(run(source), expected, "source: {}", source);
}

#[test]
fn integer_arithmetic() {
    assert_integer("5", 5);
    assert_integer("15", 15);
    assert_integer("-10", -10);
    assert_integer("-0", 0);
    assert_integer("1 + 2", 3);
    assert_integer("1 - 2", -1);
    assert_integer("1 + 2 * 3", 7);
    assert_integer("1 + 3 / 2", 2);
    assert_integer("7 / 2", 3);
    assert_integer("7 % 2", 1);
    assert_integer("1 + 10 % 4", 3);
    assert_integer("(1 + 2) * (5 - 2)", 9);
}

#[test]
fn string_concatenation() {
    assert_eq!(run(r#""Hello World!""#), Object::string("Hello World!"));
    assert_eq!(run(r#""Hello" + "World""#), Object::string("HelloWorld"));
    assert_eq!(run(r#""Hello" + " " + "World""#), Object::string("Hello World"));
    assert_eq!(run(r#""""#), Object::string(""));
}

#[test]
fn boolean_expressions() {
    assert_boolean("true", true);
    assert_boolean("false", false);
    assert_boolean("!true", false);
    assert_boolean("!false", true);
    assert_boolean("!!true", true);
    assert_boolean("10 > 5", true);
    assert_boolean("10 < 5", false);
    assert_boolean("5 < 5", false);
    assert_boolean("5 == 5", true);
    assert_boolean("5 == true", false);
    assert_boolean("true == true", true);
    assert_boolean("true == false", false);
    assert_boolean("5 != 5", false);
    assert_boolean("5 != true", true);
    assert_boolean("true != true", false);
    assert_boolean("true != false", true);
    assert_boolean("5 <= 5", true);
    assert_boolean("5 <= 6", true);
    assert_boolean("5 >= 5", true);
    assert_boolean("5 >= 6", false);
    assert_boolean("(1 < 2) == true", true);
}

#[test]
fn equality_is_by_identity_for_non_integers() {
    assert_boolean(r#""Hello" == "Hello""#, false);
    assert_boolean(r#""Hello" != "Hello""#, true);
    assert_boolean(r#"val s = "Hello"; s == s;"#, true);
    assert_boolean("null == null", true);
    assert_boolean("[1] == [1]", false);
    assert_boolean("val arr = [1]; val same = arr; arr == same;", true);
    assert_boolean("val f = func() { 1 }; f == f;", true);
}

#[test]
fn null_results() {
    assert_null("null;");
    assert_null("val x = null; x;");
    assert_null("if (false) { 10 }");
    assert_null("var y = 10; val z = if (true) { y = 15; }; z;");
    assert_null("val x = 1;");
    assert_null("");
}

#[test]
fn bindings() {
    assert_integer("var a = 5; a;", 5);
    assert_integer("var a = 5; val b = a; b;", 5);
    assert_integer("val a = 5 * 5; a;", 25);
}

#[test]
fn reassignment() {
    assert_integer("var a = 5; a = 10; a;", 10);
    assert_integer("var a = 5; val b = 15; a = b; a", 15);
    assert_error(
        "val a = 5; a = 10;",
        "can not reassign variables declared with 'val'",
    );
    assert_error("b = 10;", "identifier not found: b");
}

#[test]
fn redeclaring_in_the_same_scope_fails() {
    assert_error(
        "val a = 1; var a = 2;",
        "given identifier 'a' is already declared",
    );
    assert_integer("val a = 1; val f = func() { val a = 2; a }; f();", 2);
}

#[test]
fn return_statements() {
    assert_integer("return 10; 9;", 10);
    assert_integer("9; return 2 * 5; 9;", 10);
    assert_integer("if (10 > 1) { return 10; }", 10);
    assert_integer("if (10 > 1) { if (10 > 1) { return 10; } return 1;}", 10);
    assert_integer("val f = func(x) { return x; x + 10; }; f(10);", 10);
    assert_integer(
        "val f = func(x) { val result = x + 10; return result; return 10;}; f(10);",
        20,
    );
    assert_null("val f = func() { return; 5; }; f();");
    assert_integer("val x = if (true) { return 5; }; 10;", 5);
}

#[test]
fn if_else() {
    assert_integer("if (true) { 10 }", 10);
    assert_null("if (false) { 10 }");
    assert_integer("if (1 < 2) { 10 }", 10);
    assert_null("if (1 > 2) { 10 }");
    assert_integer("if (1 > 2) { 10 } else { 20 }", 20);
    assert_integer("if (1 < 2) { 10 } else { 20 }", 10);
}

#[test]
fn only_booleans_select_a_branch() {
    assert_null("if (5) { 10 }");
    assert_null("if (5) { 10 } else { 20 }");
    assert_null("if (null) { 10 } else { 20 }");
}

#[test]
fn functions() {
    assert_integer("val identity = func(x) { x; }; identity(5);", 5);
    assert_integer("val identity = func(x) { return x; }; identity(5);", 5);
    assert_integer("val double = func(x) { x * 2; }; double(5);", 10);
    assert_integer("val add = func(x, y) { x + y; }; add(5, 5);", 10);
    assert_integer("val add = func(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20);
    assert_integer(
        "val callTwoTimes = func(x, f) { f(f(x)); }; callTwoTimes(2, func(x) { x * x; });",
        16,
    );
    assert_integer(
        "val callTwoTimes = func(x, f) { f(f(x)); }; callTwoTimes(3, func(x) { x * x; });",
        81,
    );
    assert_integer(
        "val callTwoTimes = func(x, f) { f(f(x)); }; callTwoTimes(1, func(x) { x + 10; });",
        21,
    );
    assert_integer("func(x) { x * 3 }(4)", 12);
    assert_null("val nothing = func() { }; nothing();");
}

#[test]
fn recursion() {
    assert_integer(
        "val fib = func(n) { if (n < 2) { return n; } fib(n - 1) + fib(n - 2) }; fib(15);",
        610,
    );
}

#[test]
fn nested_scopes() {
    let bindings = "
        var i = 5;
        val useLocalVariableI = func() { return i; };
        val useLocalVariableInsideFunction = func() { val i = 15; return i; };
        val returnParameterI = func(i) { return i; };
    ";
    let cases = [
        ("useLocalVariableI();", 5),
        ("i = 30; useLocalVariableI();", 30),
        ("useLocalVariableInsideFunction();", 15),
        ("i = 30; useLocalVariableInsideFunction();", 15),
        ("returnParameterI(10); i;", 5),
        ("i = 30; returnParameterI(10); i;", 30),
        ("returnParameterI(10);", 10),
        ("i = 30; returnParameterI(10);", 10),
    ];

    for (source, expected) in cases {
        assert_integer(&format!("{}{}", bindings, source), expected);
    }
}

#[test]
fn closures() {
    let source = "
        val newAdder = func(x) {
          func(y) { x + y };
        };
        val addTwo = newAdder(2);
        addTwo(5);";
    assert_integer(source, 7);
}

#[test]
fn closures_reassign_the_defining_scope() {
    assert_integer(
        "var i = 5; val reassignFunc = func() { i = 10; }; reassignFunc(); i;",
        10,
    );
    assert_integer(
        "val counter = func() { var count = 0; func() { count = count + 1; count } };
         val next = counter();
         next(); next(); next();",
        3,
    );
    assert_error(
        "val i = 5; val reassignFunc = func() { i = 10; }; reassignFunc();",
        "can not reassign variables declared with 'val'",
    );
}

#[test]
fn arity_is_checked() {
    assert_error(
        "val f = func(x) { x }; f(1, 2);",
        "wrong number of arguments: expected 1, but received 2",
    );
    assert_error(
        "val f = func(x, y) { x }; f(1);",
        "wrong number of arguments: expected 2, but received 1",
    );
}

#[test]
fn array_literals() {
    assert_integers("[1, 2 * 2, 3 + 3]", &[1, 4, 6]);
    assert_integers("[]", &[]);
}

#[test]
fn array_indexing() {
    assert_integer("[1, 2, 3][0]", 1);
    assert_integer("[1, 2, 3][1]", 2);
    assert_integer("[1, 2, 3][2]", 3);
    assert_integer("val i = 0; [1][i];", 1);
    assert_integer("[1, 2, 3][1 + 1];", 3);
    assert_integer("val arr = [1, 2, 3]; arr[2];", 3);
    assert_integer("val arr = [1, 2, 3]; arr[0] + arr[1] + arr[2];", 6);
    assert_integer("val arr = [1, 2, 3]; val i = arr[0]; arr[i]", 2);
    assert_null("[1, 2, 3][3]");
    assert_null("[1, 2, 3][-1]");
}

#[test]
fn hash_literals() {
    let source = r#"val two = "two";
    {
        "one": 10 - 9,
        two: 1 + 1,
        "thr" + "ee": 6 / 2,
        4: 4,
        true: 5,
        false: 6
    }"#;
    let result = run(source);
    let pairs = match result.as_ref() {
        Object::Hash(pairs) => pairs,
        other => panic!("expected a hash, got {}", other),
    };

    let expected = [
        (Object::string("one"), 1),
        (Object::string("two"), 2),
        (Object::string("three"), 3),
        (Object::integer(4), 4),
        (Object::boolean(true), 5),
        (Object::boolean(false), 6),
    ];
    assert_eq!(pairs.len(), expected.len());
    for (key, value) in expected {
        let pair = &pairs[&key.hash_key().unwrap()];
        assert_eq!(pair.key, key);
        assert_eq!(pair.value, Object::integer(value));
    }
}

#[test]
fn hash_indexing() {
    assert_null(r#"{"foo": 5}["bar"]"#);
    assert_null(r#"{}["foo"]"#);
    assert_integer(r#"{"foo": 5}["foo"]"#, 5);
    assert_integer(r#"val key = "foo"; {"foo": 5}[key]"#, 5);
    assert_integer(r#"{100: { "a": 1, "b": 2 }}[100]["a"]"#, 1);
    assert_integer(r#"{true: [10, 20, 30]}[true][0]"#, 10);
    assert_integer(r#"{1: 1, 1: 2}[1]"#, 2);
}

#[test]
fn builtins() {
    assert_integer(r#"len("")"#, 0);
    assert_integer(r#"len("Hello World")"#, 11);
    assert_integer("len([])", 0);
    assert_integer(r#"len(["a", "b"])"#, 2);
    assert_integer("head([1, 2, 3])", 1);
    assert_null("head([])");
    assert_integer("tail([1, 2, 3])", 3);
    assert_null("tail([])");
    assert_integers("val arr = [1, 2, 3]; push(arr, 10); arr;", &[1, 2, 3, 10]);
    assert_integers("val arr = [1, 2, 3]; pushleft(arr, 10); arr;", &[10, 1, 2, 3]);
    assert_integers("val arr = [1, 2, 3]; pop(arr); arr;", &[1, 2]);
    assert_integers("val arr = [1, 2, 3]; popleft(arr); arr;", &[2, 3]);
    assert_null("pop([])");
}

#[test]
fn arrays_are_shared_between_bindings() {
    assert_integers("val arr = [1, 2, 3]; val other = arr; pop(arr); other;", &[1, 2]);
    assert_boolean("val arr = [1, 2, 3]; pop(arr) == arr;", true);
    assert_integers(
        "val arr = []; val fill = func(a) { push(a, 1); push(a, 2); }; fill(arr); arr;",
        &[1, 2],
    );
}

#[test]
fn user_bindings_shadow_builtins() {
    assert_integer(r#"val len = func(x) { 42 }; len("abc");"#, 42);
    assert_eq!(run("len").display(), "builtin function len");
}

#[test]
fn display_of_values() {
    assert_eq!(run(r#"[1, "two", true, null]"#).display(), "[1, two, true, null]");
    assert_eq!(run(r#"{"a": 1}"#).display(), "{a: 1}");
    assert_eq!(
        run("func(x, y) { x + y }").display(),
        "func(x, y) { (x + y); }"
    );
}

#[test]
fn error_handling() {
    let cases = [
        ("x", "identifier not found: x"),
        ("fn(10, 20)", "identifier not found: fn"),
        ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
        ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
        ("-true", "unknown operator: -BOOLEAN"),
        ("5; -true; 10;", "unknown operator: -BOOLEAN"),
        ("true + false; 5;", "unknown operator: BOOLEAN + BOOLEAN"),
        ("!5; 10;", "unknown operator: !INTEGER"),
        ("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN"),
        (
            "if (10 > 1) { if (10 > 1) { return true + false; } return 1; }",
            "unknown operator: BOOLEAN + BOOLEAN",
        ),
        (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
        (r#"[1, 2, 3]["wrong_index_format"];"#, "unsupported operation: ARRAY[STRING]"),
        (r#"{"key": "abc"}[func(x) {x}];"#, "unusable as hash key: FUNCTION"),
        ("{[1]: 2}", "ARRAY can not be used as hash key"),
        ("5(1)", "failed to invoke INTEGER as a function"),
        ("len(1)", "len(INTEGER) not supported"),
        (r#"len("one", "two")"#, "wrong number of arguments: expected 1, but received 2"),
        ("10 / 0", "division by zero: 10 / 0"),
    ];

    for (source, message) in cases {
        assert_error(source, message);
    }
}

#[test]
fn errors_stop_the_program() {
    let environment = Environment::new();
    let (program, errors) = parse("var a = 1; 5 + true; a = 2;");
    assert!(errors.is_empty());

    assert_eq!(
        eval(&program, &environment),
        Object::error("type mismatch: INTEGER + BOOLEAN")
    );
    assert_eq!(environment.get("a"), Some(Object::integer(1)));
}

#[test]
fn errors_in_arguments_short_circuit() {
    assert_error("len(x, y)", "identifier not found: x");
    assert_error("[1, -true, z]", "unknown operator: -BOOLEAN");
    assert_error("val arr = [1]; push(arr, missing); arr;", "identifier not found: missing");
}

#[test]
fn deep_recursion_does_not_exhaust_the_stack() {
    assert_integer(
        "val sum = func(n) { if (n == 0) { 0 } else { n + sum(n - 1) } }; sum(10000);",
        50_005_000,
    );
}

#[test]
fn runaway_recursion_is_an_error() {
    assert_error(
        "val forever = func(n) { forever(n + 1) }; forever(0);",
        &format!("maximum call depth exceeded: {}", MAX_CALL_DEPTH),
    );
}

#[test]
fn deeply_nested_groups_evaluate() {
    let source = "(".repeat(50_000) + "7" + &")".repeat(50_000);
    assert_integer(&source, 7);
}

#[test]
fn self_containing_array_displays() {
    let result = run("val a = [1]; push(a, a); a;");
    assert_eq!(result.display(), "[1, [...]]");
    assert_eq!(run("val a = [1]; push(a, a); len(a);"), Object::integer(2));
    assert_integer("val a = [1]; push(a, a); a[1][1][0];", 1);
}
