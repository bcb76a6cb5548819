use parsched::*;

/// Canonicalize an expression, then find the fastest equivalent form on
/// a machine with two units and one memory port.
fn schedule(src: &str, costs: &CostTable) -> Outcome {
    let tree: Tree = src.parse().unwrap();
    let canonical = optimize(&tree);
    println!("{} canonicalizes to {}", tree, canonical);

    let outcome = search_optimal_factorization_commutation(&tree, costs, 2, 1, 100);
    println!("best: {} in {} cycles", outcome.tree, outcome.trace.len());
    println!("{}", outcome.trace);
    outcome
}

#[test]
fn simple_tests() {
    let costs = CostTable::default().with("*", 4);

    let outcome = schedule("a * b + a * c", &costs);
    assert_eq!(outcome.tree.to_string(), "a * (b + c)");
    assert_eq!(outcome.trace.len(), 7);

    let outcome = schedule("(x + 0) * 1", &costs);
    assert!(outcome.trace.is_empty());
}
