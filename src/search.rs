use log::*;

use crate::{
    commutations, factorization_commutation_associations, factorization_commutations,
    factorizations, optimize, CostTable, Load, Machine, Policy, Trace, Tree,
};

/// The candidate cap used by the capped `search_optimal_*` functions.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 1000;

#[cfg(feature = "parallel")]
const BATCH: usize = 256;

/// How a [`Search`] ranks two candidates whose traces have the same length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The candidate wins if both its summed load and its summed memory
    /// occupancy are strictly greater.
    #[default]
    Summed,
    /// The candidate wins if it [`dominates`](Load::dominates) in both
    /// vectors.
    Pareto,
}

impl TieBreak {
    /// True if `candidate` should replace `best`.
    pub fn prefers(self, candidate: &Load, best: &Load) -> bool {
        match self {
            TieBreak::Summed => {
                candidate.load_sum() > best.load_sum() && candidate.memory_sum() > best.memory_sum()
            }
            TieBreak::Pareto => candidate.dominates(best),
        }
    }
}

/// The result of a [`Search`].
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The best tree found.
    pub tree: Tree,
    /// Its trace.
    pub trace: Trace,
    /// Its utilization.
    pub load: Load,
    /// How many candidates were simulated, not counting the baseline.
    pub evaluated: usize,
}

/** A greedy scan over candidate trees, ranked by simulated run time.

The baseline tree is simulated first and is the initial best. Every
candidate then replaces the best if its trace is strictly shorter, or if
it is as long and wins the [`TieBreak`]. The result is therefore never
slower than the baseline.

# Example
```
use parsched::*;

let costs = CostTable::default().with("*", 4);
let t: Tree = "a * b + a * c".parse().unwrap();

let outcome = Search::new(costs.clone())
    .with_units(2)
    .with_ports(1)
    .with_candidate_limit(100)
    .optimal_factorization_commutation(&t);

assert!(outcome.trace.len() <= simulate(&t, &costs, 2, 1).len());
assert_eq!(outcome.tree.to_string(), "a * (b + c)");
```
*/
#[derive(Debug, Clone)]
pub struct Search {
    costs: CostTable,
    units: usize,
    ports: usize,
    candidate_limit: Option<usize>,
    tie_break: TieBreak,
    policy: Policy,
}

impl Search {
    /// Create a new `Search` over `costs` with default parameters.
    pub fn new(costs: CostTable) -> Self {
        Search {
            costs,
            units: 2,
            ports: 1,
            candidate_limit: None,
            tie_break: TieBreak::default(),
            policy: Policy::default(),
        }
    }

    /// Sets the number of execution units. Default: 2
    pub fn with_units(self, units: usize) -> Self {
        Self { units, ..self }
    }

    /// Sets the number of memory ports. Default: 1
    pub fn with_ports(self, ports: usize) -> Self {
        Self { ports, ..self }
    }

    /// Caps how many candidates are simulated. Default: no cap
    pub fn with_candidate_limit(self, limit: usize) -> Self {
        Self {
            candidate_limit: Some(limit),
            ..self
        }
    }

    /// Sets the tie-break. Default: [`TieBreak::Summed`]
    pub fn with_tie_break(self, tie_break: TieBreak) -> Self {
        Self { tie_break, ..self }
    }

    /// Sets the machine's scheduling policy. Default: [`Policy::Barrier`]
    pub fn with_policy(self, policy: Policy) -> Self {
        Self { policy, ..self }
    }

    fn machine(&self) -> Machine {
        Machine::new(self.units, self.ports).with_policy(self.policy)
    }

    /// Simulates one tree on this search's machine.
    pub fn evaluate(&self, tree: &Tree) -> (Trace, Load) {
        let trace = self.machine().simulate(tree, &self.costs);
        let load = trace.load();
        (trace, load)
    }

    fn consider(&self, best: &mut Outcome, tree: Tree, trace: Trace, load: Load) {
        best.evaluated += 1;
        let better = match trace.len().cmp(&best.trace.len()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => self.tie_break.prefers(&load, &best.load),
            std::cmp::Ordering::Greater => false,
        };
        if better {
            info!(
                "Candidate {} improves to {} cycles, load {:?}, memory {:?}",
                tree,
                trace.len(),
                load.load,
                load.memory
            );
            *best = Outcome {
                tree,
                trace,
                load,
                evaluated: best.evaluated,
            };
        } else {
            debug!("Candidate {} takes {} cycles", tree, trace.len());
        }
    }

    /// Scans `candidates` against `baseline`.
    pub fn run(&self, baseline: &Tree, candidates: impl IntoIterator<Item = Tree>) -> Outcome {
        let (trace, load) = self.evaluate(baseline);
        info!("Baseline {} takes {} cycles", baseline, trace.len());
        let mut best = Outcome {
            tree: baseline.clone(),
            trace,
            load,
            evaluated: 0,
        };

        let limit = self.candidate_limit.unwrap_or(usize::MAX);
        let candidates = candidates.into_iter().take(limit);

        #[cfg(not(feature = "parallel"))]
        for tree in candidates {
            let (trace, load) = self.evaluate(&tree);
            self.consider(&mut best, tree, trace, load);
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let mut candidates = candidates;
            loop {
                let batch: Vec<Tree> = candidates.by_ref().take(BATCH).collect();
                if batch.is_empty() {
                    break;
                }
                let results: Vec<(Tree, Trace, Load)> = batch
                    .into_par_iter()
                    .map(|tree| {
                        let (trace, load) = self.evaluate(&tree);
                        (tree, trace, load)
                    })
                    .collect();
                for (tree, trace, load) in results {
                    self.consider(&mut best, tree, trace, load);
                }
            }
        }

        info!(
            "Searched {} candidates, best takes {} cycles",
            best.evaluated,
            best.trace.len()
        );
        best
    }

    /// Searches the [`commutations`] of the canonical form of `tree`.
    pub fn optimal_commutation(&self, tree: &Tree) -> Outcome {
        self.run(tree, commutations(&optimize(tree)))
    }

    /// Searches the [`factorizations`] of the canonical form of `tree`.
    pub fn optimal_factorization(&self, tree: &Tree) -> Outcome {
        self.run(tree, factorizations(&optimize(tree)))
    }

    /// Searches the [`factorization_commutations`] of the canonical form
    /// of `tree`.
    pub fn optimal_factorization_commutation(&self, tree: &Tree) -> Outcome {
        self.run(tree, factorization_commutations(&optimize(tree)))
    }

    /// Searches the [`factorization_commutation_associations`] of the
    /// canonical form of `tree`.
    pub fn optimal_factorization_commutation_association(&self, tree: &Tree) -> Outcome {
        self.run(tree, factorization_commutation_associations(&optimize(tree)))
    }
}

fn search(costs: &CostTable, units: usize, ports: usize) -> Search {
    Search::new(costs.clone()).with_units(units).with_ports(ports)
}

/// The fastest commutation of `tree`. See [`Search::optimal_commutation`].
pub fn search_optimal_commutation(
    tree: &Tree,
    costs: &CostTable,
    units: usize,
    ports: usize,
) -> Outcome {
    search(costs, units, ports).optimal_commutation(tree)
}

/// The fastest factorization of `tree`. See
/// [`Search::optimal_factorization`].
pub fn search_optimal_factorization(
    tree: &Tree,
    costs: &CostTable,
    units: usize,
    ports: usize,
) -> Outcome {
    search(costs, units, ports).optimal_factorization(tree)
}

/// The fastest of the first `count` factorization commutations of `tree`.
/// See [`Search::optimal_factorization_commutation`].
pub fn search_optimal_factorization_commutation(
    tree: &Tree,
    costs: &CostTable,
    units: usize,
    ports: usize,
    count: usize,
) -> Outcome {
    search(costs, units, ports)
        .with_candidate_limit(count)
        .optimal_factorization_commutation(tree)
}

/// The fastest of the first `count` factorization commutation
/// associations of `tree`. See
/// [`Search::optimal_factorization_commutation_association`].
pub fn search_optimal_factorization_commutation_association(
    tree: &Tree,
    costs: &CostTable,
    units: usize,
    ports: usize,
    count: usize,
) -> Outcome {
    search(costs, units, ports)
        .with_candidate_limit(count)
        .optimal_factorization_commutation_association(tree)
}
