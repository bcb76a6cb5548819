use parsched::test::{assert_dependencies_respected, assert_memory_bound, label_tasks};
use parsched::*;

fn t(s: &str) -> Tree {
    s.parse().unwrap()
}

#[test]
fn single_addition() {
    parsched::test::init_logger();
    let costs = CostTable::default().with("+", 1);
    let trace = simulate(&t("a + b"), &costs, 2, 1);
    assert_eq!(
        trace.states(),
        [
            [State::Read, State::Noop],
            [State::Compute, State::Noop],
            [State::Write, State::Noop],
        ]
    );
}

#[test]
fn balanced_sum() {
    let trace = simulate(&t("(a + b) + (c + d)"), &CostTable::default(), 2, 1);
    assert_memory_bound(&trace);
    assert_eq!(
        trace.to_strings(),
        [
            ["read (+ 0)", "noop"],
            ["compute (+ 0)", "read (+ 1)"],
            ["write (+ 0)", "compute (+ 1)"],
            ["noop", "write (+ 1)"],
            ["read (+ 2)", "noop"],
            ["compute (+ 2)", "noop"],
            ["write (+ 2)", "noop"],
        ]
    );

    let load = trace.load();
    assert_eq!(load.load, [6.0 / 7.0, 3.0 / 7.0]);
    assert_eq!(load.memory, [6.0 / 7.0]);
}

#[test]
fn sum_of_products() {
    let costs = CostTable::default().with("+", 1).with("*", 4);
    let trace = simulate(&t("a * b + c * d"), &costs, 2, 1);
    assert_memory_bound(&trace);
    assert_eq!(
        trace.to_strings(),
        [
            ["read (* 0)", "noop"],
            ["compute (* 0)", "read (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["write (* 0)", "compute (* 1)"],
            ["noop", "write (* 1)"],
            ["read (+ 2)", "noop"],
            ["compute (+ 2)", "noop"],
            ["write (+ 2)", "noop"],
        ]
    );
}

#[test]
fn writes_wait_for_the_port() {
    let costs = CostTable::default()
        .with("+", 2)
        .with("*", 4)
        .with("/", 8)
        .with("-", 3);
    let trace = simulate(&t("a*b+g/h-c*d+e*f"), &costs, 2, 1);
    assert_memory_bound(&trace);
    assert_eq!(
        trace.to_strings(),
        [
            ["read (* 0)", "noop"],
            ["compute (* 0)", "read (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["compute (* 0)", "compute (* 1)"],
            ["write (* 0)", "compute (* 1)"],
            ["noop", "write (* 1)"],
            ["read (/ 2)", "noop"],
            ["compute (/ 2)", "read (* 3)"],
            ["compute (/ 2)", "compute (* 3)"],
            ["compute (/ 2)", "compute (* 3)"],
            ["compute (/ 2)", "compute (* 3)"],
            ["compute (/ 2)", "compute (* 3)"],
            ["compute (/ 2)", "write (* 3)"],
            ["compute (/ 2)", "noop"],
            ["compute (/ 2)", "noop"],
            ["write (/ 2)", "noop"],
            ["read (- 4)", "noop"],
            ["compute (- 4)", "read (+ 5)"],
            ["compute (- 4)", "compute (+ 5)"],
            ["compute (- 4)", "compute (+ 5)"],
            ["write (- 4)", "noop"],
            ["noop", "write (+ 5)"],
            ["read (- 6)", "noop"],
            ["compute (- 6)", "noop"],
            ["compute (- 6)", "noop"],
            ["compute (- 6)", "noop"],
            ["write (- 6)", "noop"],
        ]
    );
}

#[test]
fn one_unit_runs_everything_in_order() {
    let trace = simulate(&t("(a + b) * c"), &CostTable::default(), 1, 1);
    let labels: Vec<String> = trace
        .cycles()
        .iter()
        .filter(|cycle| cycle[0].state == State::Read)
        .map(|cycle| cycle[0].to_string())
        .collect();
    assert_eq!(labels, ["read (+ 0)", "read (* 1)"]);
    assert_eq!(trace.len(), 6);
    assert_eq!(trace.load().load, [1.0]);
}

#[test]
fn simulation_is_deterministic() {
    let costs = CostTable::default().with("*", 3).with("/", 7);
    let tree = t("(a * b) / (c + d) - (e * f) * (g - h / i)");
    for (units, ports) in [(1, 1), (2, 1), (3, 2), (4, 4)] {
        let first = simulate(&tree, &costs, units, ports);
        assert_eq!(first, simulate(&tree, &costs, units, ports));
        assert_memory_bound(&first);
    }
}

#[test]
fn dependencies_are_respected() {
    let costs = CostTable::default().with("*", 4);
    let tree = label_tasks(&t("((a * b) + c) * (d + (e * f))"));
    let machine = Machine::new(3, 1).with_policy(Policy::Dependencies);
    let trace = machine.simulate(&tree, &costs);
    assert_memory_bound(&trace);
    assert_dependencies_respected(&tree, &trace);
}

#[test]
#[should_panic(expected = "at least one unit")]
fn machines_need_units() {
    Machine::new(0, 1);
}

#[test]
fn linearization_visits_operands_first() {
    let tree = t("sqrt(a * b) - g()");
    let labels: Vec<String> = linearize(&tree)
        .iter()
        .map(|n| n.label().unwrap().to_string())
        .collect();
    assert_eq!(labels, ["* 0", "g 1", "sqrt 2", "- 3"]);
}
