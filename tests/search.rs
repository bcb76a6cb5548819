use parsched::test::assert_value_preserved;
use parsched::*;

fn t(s: &str) -> Tree {
    s.parse().unwrap()
}

#[test]
fn factoring_beats_the_input() {
    parsched::test::init_logger();
    let costs = CostTable::default().with("*", 4);
    let tree = t("a * b + a * c");
    let baseline = simulate(&tree, &costs, 2, 1);

    let outcome = search_optimal_factorization(&tree, &costs, 2, 1);
    assert_eq!(outcome.tree, t("a * (b + c)"));
    assert!(outcome.trace.len() < baseline.len());
    assert_eq!(outcome.evaluated, 2);
}

#[test]
fn capped_search_never_regresses() {
    parsched::test::init_logger();
    let costs = CostTable::default().with("*", 4).with("/", 8);
    for src in [
        "a - b * c + k",
        "a * b + a * c + d * e",
        "(x + y) * (x + y) / z",
        "a + b + c + d + e + f",
        "p * q - p * r + s / t",
    ] {
        let tree = t(src);
        let baseline = simulate(&tree, &costs, 2, 1);
        for count in [0, 1, 10, DEFAULT_CANDIDATE_LIMIT] {
            let outcome = search_optimal_factorization_commutation(&tree, &costs, 2, 1, count);
            assert!(outcome.trace.len() <= baseline.len(), "{} got slower", src);
            assert!(outcome.evaluated <= count);
            assert_value_preserved(&tree, &outcome.tree);
        }
    }
}

#[test]
fn zero_cap_keeps_the_input() {
    let tree = t("a * b + a * c");
    let outcome = search_optimal_factorization_commutation_association(
        &tree,
        &CostTable::default(),
        3,
        2,
        0,
    );
    assert_eq!(outcome.tree, tree);
    assert_eq!(outcome.evaluated, 0);
}

#[test]
fn searches_are_deterministic() {
    let costs = CostTable::default().with("*", 3);
    let tree = t("(a + b) * c - d * (e + f)");
    let search = Search::new(costs)
        .with_units(3)
        .with_ports(2)
        .with_candidate_limit(200);
    let first = search.optimal_factorization_commutation_association(&tree);
    let second = search.optimal_factorization_commutation_association(&tree);
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.trace, second.trace);
    assert_eq!(first.evaluated, second.evaluated);
}

#[test]
fn tie_breaks_agree_on_length() {
    let costs = CostTable::default().with("*", 2);
    let tree = t("a * b + c * d + e * f");
    let summed = Search::new(costs.clone()).optimal_commutation(&tree);
    let pareto = Search::new(costs)
        .with_tie_break(TieBreak::Pareto)
        .optimal_commutation(&tree);
    assert_eq!(summed.trace.len(), pareto.trace.len());
    assert_eq!(summed.evaluated, pareto.evaluated);
}

#[test]
fn dependency_policy_search() {
    let costs = CostTable::default().with("*", 4);
    let tree = t("a * b + a * c + a * d");
    let outcome = Search::new(costs.clone())
        .with_policy(Policy::Dependencies)
        .optimal_factorization_commutation(&tree);
    let baseline = Machine::new(2, 1)
        .with_policy(Policy::Dependencies)
        .simulate(&tree, &costs);
    assert!(outcome.trace.len() <= baseline.len());
    assert_value_preserved(&tree, &outcome.tree);
}
