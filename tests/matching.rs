use parsched::*;

fn t(s: &str) -> Tree {
    s.parse().unwrap()
}

const TREES: &[&str] = &[
    "x",
    "42",
    "\"hi\"",
    "true",
    "f()",
    "-(a + b)",
    "a - b * c + k",
    "sin(x) ^ 2 + cos(x) ^ 2",
];

#[test]
fn wildcard_matches_everything() {
    parsched::test::init_logger();
    for src in TREES {
        let bindings = pattern!("_").search(&t(src)).unwrap();
        assert!(bindings.is_empty(), "{} bound {:?}", src, bindings);
    }
}

#[test]
fn self_difference_needs_equal_operands() {
    let same = pattern!("x - x");
    assert!(same.matches(&t("(a * 2) - (a * 2)")));
    assert!(same.matches(&t("f(1, y) - f(1, y)")));
    assert!(!same.matches(&t("a - b")));
    assert!(!same.matches(&t("(a + b) - (b + a)")));
    assert!(!same.matches(&t("(a * 2) + (a * 2)")));
}

#[test]
fn factorization_shape() {
    let tree = t("a * b + a * c");
    assert!(pattern!("(_ * _) + (_ * _)").matches(&tree));
    let b = pattern!("(x * y) + (x * z)").search(&tree).unwrap();
    assert_eq!(b["x"], Tree::var("a"));
    assert_eq!(factorize(&tree).to_string(), "a * (b + c)");
}

#[test]
fn calls_match_by_name_and_arity() {
    let b = pattern!("f(x, x)").search(&t("f(a + 1, a + 1)")).unwrap();
    assert_eq!(b["x"], t("a + 1"));
    assert!(!pattern!("f(x, x)").matches(&t("g(a, a)")));
    assert!(!pattern!("g()").matches(&t("g")));
}

#[test]
#[should_panic(expected = "Var 'y' not found")]
fn missing_binding_panics() {
    let b = pattern!("x + 1").search(&t("a + 1")).unwrap();
    let _ = &b["y"];
}

test_fn! {
    simplify_cancels_and_folds, simplify,
    "(x * (2 - 1)) - (0 - y)" => "x + y"
}

test_fn! {
    simplify_reaches_a_leaf, simplify,
    "(0 - (a - a)) + b * 1" => "b"
}

test_fn! {
    simplify_keeps_division_by_zero, simplify,
    "x / (1 - 1)" => "x / 0"
}

test_fn! {
    optimize_regroups_subtraction, optimize,
    "a - b * c + k" => "a - ((b * c) - k)"
}

test_fn! {
    optimize_regroups_addition, optimize,
    "a + b * c + k" => "a + ((b * c) + k)"
}

test_fn! {
    rebalance_long_sum, rebalance,
    "a + b + c + d + e" => "((a + b) + c) + (d + e)"
}

test_fn! {
    factorize_shared_factor, factorize,
    "a * b + a * c" => "a * (b + c)"
}

test_fn! {
    distribute_product, distribute,
    "a * (b + c)" => "(a * b) + (a * c)"
}

#[test]
fn canonicalization_is_idempotent() {
    parsched::test::init_logger();
    for src in [
        "a * (b + 0) - a * b",
        "x - (-(y + z))",
        "((p + q) + (r + s)) + ((t + u) + v)",
        "a / b / c / d / e / f",
        "f(x + 0, 1 * y) * (g() - g())",
        "a - (b - (c - (d - e)))",
    ] {
        let tree = t(src);
        let once = optimize(&tree);
        assert_eq!(optimize(&once), once, "optimizing {}", src);
    }
}
