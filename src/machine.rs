/*! A cycle-accurate model of a small parallel machine.

The machine has a fixed number of execution units and a fixed number of
memory ports. Each operator of a tree becomes one task, and a task runs
on one unit as a pipeline:

```text
noop -> read -> compute (one cycle per unit of cost) -> write -> noop
```

`read` and `write` go through memory. At most `ports` units may be in a
memory-bound state in any cycle; when more would be, the units past the
first `ports` (in unit order) sit out a cycle as `noop` and resume where
they were.

Simulation is a pure function of its inputs: the same tree, costs and
machine shape always produce the same [`Trace`].
*/

use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};

use log::*;

use crate::{CostTable, Kind, Symbol, Tree};

/// The state of one execution unit during one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Idle.
    #[default]
    Noop,
    /// Loading operands through a memory port.
    Read,
    /// Computing.
    Compute,
    /// Storing the result through a memory port.
    Write,
}

impl State {
    /// True for everything but [`State::Noop`].
    pub fn is_busy(self) -> bool {
        self != State::Noop
    }

    /// True for the states that occupy a memory port.
    pub fn is_memory(self) -> bool {
        matches!(self, State::Read | State::Write)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Noop => "noop",
            State::Read => "read",
            State::Compute => "compute",
            State::Write => "write",
        };
        f.write_str(s)
    }
}

/// One unit in one cycle of a [`Trace`]: its state and the label of the
/// task it is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The unit's state.
    pub state: State,
    /// The task label, absent when idle.
    pub label: Option<Symbol>,
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{} ({})", self.state, label),
            None => write!(f, "{}", self.state),
        }
    }
}

/** The cycle-by-cycle record of one simulation.

Each cycle is a snapshot of every unit, in unit order. The length of the
trace is the number of cycles the machine needed.

```
use parsched::*;

let t: Tree = "a + b".parse().unwrap();
let trace = simulate(&t, &CostTable::default(), 2, 1);
assert_eq!(trace.len(), 3);
assert_eq!(
    trace.to_strings(),
    [["read (+ 0)", "noop"], ["compute (+ 0)", "noop"], ["write (+ 0)", "noop"]]
);
assert_eq!(trace.load().load, [1.0, 0.0]);
```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    units: usize,
    ports: usize,
    cycles: Vec<Vec<Cell>>,
}

impl Trace {
    /// Number of cycles.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// True if the machine never ran, i.e. the tree had no operators.
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// The number of execution units simulated.
    pub fn units(&self) -> usize {
        self.units
    }

    /// The number of memory ports simulated.
    pub fn ports(&self) -> usize {
        self.ports
    }

    /// The snapshots, one per cycle.
    pub fn cycles(&self) -> &[Vec<Cell>] {
        &self.cycles
    }

    /// The snapshots with labels stripped.
    pub fn states(&self) -> Vec<Vec<State>> {
        self.cycles
            .iter()
            .map(|cycle| cycle.iter().map(|cell| cell.state).collect())
            .collect()
    }

    /// The snapshots rendered as `state (label)` strings.
    pub fn to_strings(&self) -> Vec<Vec<String>> {
        self.cycles
            .iter()
            .map(|cycle| cycle.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    /// Utilization of this trace. See [`calculate_load`].
    pub fn load(&self) -> Load {
        calculate_load(self, self.units, self.ports)
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, cycle) in self.cycles.iter().enumerate() {
            write!(f, "{:>4}:", i)?;
            for cell in cycle {
                write!(f, " {:<16}", cell.to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Utilization metrics of a [`Trace`].
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    /// Per unit, the fraction of cycles it was busy.
    pub load: Vec<f64>,
    /// Entry `j` is the fraction of cycles in which more than `j` units
    /// were memory-bound.
    pub memory: Vec<f64>,
}

impl Load {
    /// Sum of [`load`](Load::load).
    pub fn load_sum(&self) -> f64 {
        self.load.iter().sum()
    }

    /// Sum of [`memory`](Load::memory).
    pub fn memory_sum(&self) -> f64 {
        self.memory.iter().sum()
    }

    /// True if every entry of `self` is at least the matching entry of
    /// `other`, and both vectors are strictly larger somewhere.
    pub fn dominates(&self, other: &Load) -> bool {
        fn ge(a: &[f64], b: &[f64]) -> bool {
            a.iter().zip(b).all(|(x, y)| x >= y)
        }
        fn gt(a: &[f64], b: &[f64]) -> bool {
            a.iter().zip(b).any(|(x, y)| x > y)
        }
        ge(&self.load, &other.load)
            && ge(&self.memory, &other.memory)
            && gt(&self.load, &other.load)
            && gt(&self.memory, &other.memory)
    }
}

/// Computes the load vector (busy fraction per unit) and the
/// memory-occupancy vector (fraction of cycles with more than `j`
/// memory-bound units, for `j` in `0..ports`) of `trace`.
///
/// An empty trace has zero load everywhere.
pub fn calculate_load(trace: &Trace, units: usize, ports: usize) -> Load {
    if trace.is_empty() {
        return Load {
            load: vec![0.0; units],
            memory: vec![0.0; ports],
        };
    }

    let cycles = trace.len() as f64;
    let load = (0..units)
        .map(|i| {
            let busy = trace
                .cycles
                .iter()
                .filter(|cycle| cycle.get(i).map_or(false, |c| c.state.is_busy()))
                .count();
            busy as f64 / cycles
        })
        .collect();
    let memory = (0..ports)
        .map(|j| {
            let over = trace
                .cycles
                .iter()
                .filter(|cycle| cycle.iter().filter(|c| c.state.is_memory()).count() > j)
                .count();
            over as f64 / cycles
        })
        .collect();

    Load { load, memory }
}

/// When a task may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Tasks start in scheduling order, and whenever every unit is busy
    /// the machine drains completely before the next task starts.
    #[default]
    Barrier,
    /// Tasks start in scheduling order without draining, but only once
    /// every task computing one of their operands has finished writing.
    Dependencies,
}

/** The shape of the simulated machine.

```
use parsched::*;

let t: Tree = "(a * b) + (c * d)".parse().unwrap();
let costs = CostTable::default().with("*", 4);

let barrier = Machine::new(2, 1).simulate(&t, &costs);
let eager = Machine::new(2, 1)
    .with_policy(Policy::Dependencies)
    .simulate(&t, &costs);
assert_eq!(barrier.len(), 10);
assert!(eager.len() <= barrier.len());
```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    units: usize,
    ports: usize,
    policy: Policy,
}

impl Machine {
    /// A machine with `units` execution units and `ports` memory ports.
    ///
    /// Panics if either is zero.
    pub fn new(units: usize, ports: usize) -> Self {
        assert!(units >= 1, "a machine needs at least one unit");
        assert!(ports >= 1, "a machine needs at least one memory port");
        Machine {
            units,
            ports,
            policy: Policy::default(),
        }
    }

    /// Sets the scheduling policy. Default: [`Policy::Barrier`]
    pub fn with_policy(self, policy: Policy) -> Self {
        Self { policy, ..self }
    }

    /// Runs `tree` to completion.
    pub fn simulate(&self, tree: &Tree, costs: &CostTable) -> Trace {
        let tasks = tasks(tree);
        let mut sim = Simulation::new(self.units, self.ports, tasks.len());

        for (index, task) in tasks.iter().enumerate() {
            match self.policy {
                Policy::Barrier => {
                    if sim.all_busy() {
                        sim.drain();
                    }
                }
                Policy::Dependencies => {
                    while !task.operands.iter().all(|&i| sim.done[i]) {
                        sim.step();
                    }
                }
            }
            sim.schedule(costs.get(task.node.name()), task.node.label(), index);
        }
        sim.drain();

        debug!("Simulated {} in {} cycles", tree, sim.cycles.len());
        Trace {
            units: self.units,
            ports: self.ports,
            cycles: sim.cycles,
        }
    }
}

/// Simulates `tree` on a machine with `units` units and `ports` memory
/// ports under the default [`Policy`].
pub fn simulate(tree: &Tree, costs: &CostTable, units: usize, ports: usize) -> Trace {
    Machine::new(units, ports).simulate(tree, costs)
}

struct Task {
    node: Tree,
    operands: Vec<usize>,
}

/// Breadth-first over operators and calls, reversed, so operands come
/// before their users. Nodes without a label get `"{name} {index}"`.
fn tasks(tree: &Tree) -> Vec<Task> {
    let mut kept: Vec<(Tree, Option<usize>)> = vec![];
    let mut queue = VecDeque::from([(tree.clone(), None)]);
    while let Some((node, parent)) = queue.pop_front() {
        if node.is_leaf() && node.kind() != Some(Kind::Fn) {
            continue;
        }
        let index = kept.len();
        for child in node.children() {
            queue.push_back((child.clone(), Some(index)));
        }
        kept.push((node, parent));
    }

    let last = kept.len().saturating_sub(1);
    let mut tasks: Vec<Task> = kept
        .iter()
        .rev()
        .enumerate()
        .map(|(index, (node, _))| {
            let node = match node.label() {
                Some(_) => node.clone(),
                None => node.with_label(format!("{} {}", node.name(), index)),
            };
            Task {
                node,
                operands: vec![],
            }
        })
        .collect();
    for (index, (_, parent)) in kept.iter().enumerate() {
        if let Some(parent) = parent {
            tasks[last - parent].operands.push(last - index);
        }
    }
    tasks
}

/// The nodes of `tree` that become tasks, labeled, in the order they are
/// scheduled.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "f(x) * (a + b)".parse().unwrap();
/// let labels: Vec<String> = linearize(&t)
///     .iter()
///     .map(|n| n.label().unwrap().to_string())
///     .collect();
/// assert_eq!(labels, ["+ 0", "f 1", "* 2"]);
/// ```
pub fn linearize(tree: &Tree) -> Vec<Tree> {
    tasks(tree).into_iter().map(|task| task.node).collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Unit {
    state: State,
    time: usize,
    task: Option<usize>,
    label: Option<Symbol>,
}

impl Unit {
    fn next(self) -> Unit {
        match self.state {
            State::Noop | State::Write => Unit::default(),
            State::Read => Unit {
                state: State::Compute,
                ..self
            },
            State::Compute if self.time <= 1 => Unit {
                state: State::Write,
                time: 0,
                ..self
            },
            State::Compute => Unit {
                time: self.time - 1,
                ..self
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Simulation {
    units: Vec<Unit>,
    ports: usize,
    cycles: Vec<Vec<Cell>>,
    /// Per task, whether its write has finished.
    done: Vec<bool>,
}

impl Simulation {
    fn new(units: usize, ports: usize, tasks: usize) -> Self {
        Simulation {
            units: vec![Unit::default(); units],
            ports,
            cycles: vec![],
            done: vec![false; tasks],
        }
    }

    fn all_busy(&self) -> bool {
        self.units.iter().all(|u| u.state.is_busy())
    }

    fn any_busy(&self) -> bool {
        self.units.iter().any(|u| u.state.is_busy())
    }

    fn memory_bound(&self) -> usize {
        self.units.iter().filter(|u| u.state.is_memory()).count()
    }

    fn snapshot(&mut self) {
        let cycle = self
            .units
            .iter()
            .map(|u| Cell {
                state: u.state,
                label: u.label,
            })
            .collect();
        self.cycles.push(cycle);
    }

    fn advance(&mut self) {
        for unit in self.units.iter_mut() {
            if let (State::Write, Some(task)) = (unit.state, unit.task) {
                self.done[task] = true;
            }
            *unit = unit.next();
        }
    }

    /// Idles the memory-bound units past the first `ports`, returning
    /// them so they can be put back.
    fn freeze_excess(&mut self) -> Vec<(usize, Unit)> {
        let frozen: Vec<(usize, Unit)> = self
            .units
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, u)| u.state.is_memory())
            .skip(self.ports)
            .collect();
        for &(i, _) in &frozen {
            self.units[i] = Unit::default();
        }
        frozen
    }

    fn restore(&mut self, frozen: Vec<(usize, Unit)>) {
        for (i, unit) in frozen {
            self.units[i] = unit;
        }
    }

    /// Records a cycle and advances every unit.
    ///
    /// While too many units are memory-bound afterwards, the excess ones
    /// are idled and the machine takes another cycle without them, which
    /// can nest. `frozen` is the stack of idled sets, innermost last.
    fn step(&mut self) {
        let mut frozen: Vec<Vec<(usize, Unit)>> = vec![];
        'cycle: loop {
            self.snapshot();
            self.advance();
            loop {
                if self.memory_bound() > self.ports {
                    trace!("memory contention at cycle {}", self.cycles.len());
                    frozen.push(self.freeze_excess());
                    continue 'cycle;
                }
                match frozen.pop() {
                    Some(units) => self.restore(units),
                    None => return,
                }
            }
        }
    }

    fn drain(&mut self) {
        while self.any_busy() {
            self.step();
        }
    }

    fn schedule(&mut self, cost: usize, label: Option<Symbol>, task: usize) {
        while self.all_busy() || self.memory_bound() >= self.ports {
            self.step();
        }
        if let Some(free) = self.units.iter().position(|u| !u.state.is_busy()) {
            self.units[free] = Unit {
                state: State::Read,
                time: cost,
                task: Some(task),
                label,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn step_recursive(sim: &mut Simulation) {
        sim.snapshot();
        sim.advance();
        while sim.memory_bound() > sim.ports {
            let frozen = sim.freeze_excess();
            step_recursive(sim);
            sim.restore(frozen);
        }
    }

    fn state() -> impl Strategy<Value = State> {
        prop_oneof![
            Just(State::Noop),
            Just(State::Read),
            Just(State::Compute),
            Just(State::Write),
        ]
    }

    fn simulation() -> impl Strategy<Value = Simulation> {
        (prop::collection::vec((state(), 1..6usize), 1..7), 1..4usize).prop_map(
            |(units, ports)| {
                let n = units.len();
                let units = units
                    .into_iter()
                    .enumerate()
                    .map(|(i, (state, time))| match state {
                        State::Noop => Unit::default(),
                        state => Unit {
                            state,
                            time,
                            task: Some(i),
                            label: Some(Symbol::from(format!("t {}", i))),
                        },
                    })
                    .collect();
                Simulation {
                    units,
                    ports,
                    cycles: vec![],
                    done: vec![false; n],
                }
            },
        )
    }

    proptest! {
        #[test]
        fn iterative_step_matches_recursion(sim in simulation(), steps in 1..8usize) {
            let mut iterative = sim.clone();
            let mut recursive = sim;
            for _ in 0..steps {
                iterative.step();
                step_recursive(&mut recursive);
            }
            prop_assert_eq!(&iterative.cycles, &recursive.cycles);
            prop_assert_eq!(&iterative.units, &recursive.units);
            prop_assert_eq!(&iterative.done, &recursive.done);
        }
    }

    #[test]
    fn contention_idles_later_units() {
        let mut sim = Simulation::new(3, 1, 3);
        let states = [State::Read, State::Compute, State::Compute];
        for (i, state) in states.into_iter().enumerate() {
            sim.units[i] = Unit {
                state,
                time: 1,
                task: Some(i),
                label: Some(Symbol::from(format!("t {}", i))),
            };
        }
        sim.step();
        let strings: Vec<Vec<String>> = sim
            .cycles
            .iter()
            .map(|c| c.iter().map(|c| c.to_string()).collect())
            .collect();
        // both computes finish together, the second write waits for the port
        assert_eq!(
            strings,
            [
                ["read (t 0)", "compute (t 1)", "compute (t 2)"],
                ["compute (t 0)", "write (t 1)", "noop"],
                ["write (t 0)", "noop", "noop"],
            ]
        );
        assert_eq!(sim.units[2].state, State::Write);
        assert_eq!(sim.done, [true, true, false]);
    }

    #[test]
    fn empty_trace_has_no_load() {
        let trace = simulate(&Tree::var("x"), &CostTable::default(), 3, 2);
        assert!(trace.is_empty());
        assert_eq!(
            trace.load(),
            Load {
                load: vec![0.0; 3],
                memory: vec![0.0; 2]
            }
        );
    }

    #[test]
    fn labels_are_kept() {
        let t = Tree::binary("+", Tree::var("a"), Tree::var("b")).with_label("sum");
        let trace = simulate(&t, &CostTable::default(), 1, 1);
        assert_eq!(trace.to_strings()[0], ["read (sum)"]);
    }
}
