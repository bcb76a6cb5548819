use instant::Instant;
use log::*;

use crate::util::IndexMap;
use crate::{CostTable, Distribute, Factorize, Rebalance, Reorder, Simplify, Step, Tree};

/// The iteration limit used by the convenience functions like
/// [`optimize`].
pub const DEFAULT_ITER_LIMIT: usize = 32;

/** Drives [`Step`]s over a [`Tree`] to a fixed point.

Each iteration runs every step once, in order, each one on the output of
the previous. The [`Runner`] stops as soon as an iteration leaves the
tree unchanged
([`StopReason::Saturated`]), or when the iteration limit is hit
([`StopReason::IterationLimit`]), in which case the last tree is kept.

[`Runner`] generates [`Iteration`]s that record which steps changed the
tree in that iteration.

# Example

```
use parsched::*;

let start: Tree = "(a * 1) + (b + c + 0)".parse().unwrap();
let runner = Runner::new(start)
    .with_iter_limit(10)
    .run(&[&Simplify, &Rebalance::default()]);

assert_eq!(runner.tree.to_string(), "a + (b + c)");
assert_eq!(runner.stop_reason, Some(StopReason::Saturated));
assert_eq!(runner.iterations.last().unwrap().applied.len(), 0);
```
*/
#[derive(Debug, Clone)]
pub struct Runner {
    /// The current tree; after [`run`](Runner::run), the result.
    pub tree: Tree,
    /// Data accumulated over each [`Iteration`].
    pub iterations: Vec<Iteration>,
    /// Why the `Runner` stopped. This will be `None` if it hasn't
    /// stopped yet.
    pub stop_reason: Option<StopReason>,

    iter_limit: usize,
}

/// Why a [`Runner`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// An iteration left the tree unchanged.
    Saturated,
    /// The iteration limit was hit. The data is the iteration limit.
    IterationLimit(usize),
}

/// Data generated by running a [`Runner`] one iteration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Iteration {
    /// The number of nodes in the tree at the start of this iteration.
    pub tree_size: usize,
    /// A map from step name to the number of times it changed the tree
    /// in this iteration.
    pub applied: IndexMap<String, usize>,
    /// Seconds spent in this iteration.
    pub total_time: f64,
}

impl Runner {
    /// Create a new `Runner` over `tree` with default parameters.
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            iterations: vec![],
            stop_reason: None,
            iter_limit: DEFAULT_ITER_LIMIT,
        }
    }

    /// Sets the iteration limit. Default: 32
    pub fn with_iter_limit(self, iter_limit: usize) -> Self {
        Self { iter_limit, ..self }
    }

    /// Run this `Runner` until it stops.
    /// After this, the field
    /// [`stop_reason`](#structfield.stop_reason) is guaranteed to be
    /// set.
    pub fn run(mut self, steps: &[&dyn Step]) -> Self {
        loop {
            if let Err(stop_reason) = self.run_one(steps) {
                info!("Stopping: {:?}", stop_reason);
                self.stop_reason = Some(stop_reason);
                break;
            }
        }
        self
    }

    fn run_one(&mut self, steps: &[&dyn Step]) -> Result<(), StopReason> {
        if self.iterations.len() >= self.iter_limit {
            warn!(
                "Hit the iteration limit of {} while rewriting {}",
                self.iter_limit, self.tree
            );
            return Err(StopReason::IterationLimit(self.iter_limit));
        }

        info!("Iteration {}", self.iterations.len());
        let start_time = Instant::now();
        let tree_size = self.tree.size();

        let mut applied = IndexMap::default();
        for step in steps {
            let next = step.apply(&self.tree);
            if next != self.tree {
                debug!("Applied {}", step.name());
                *applied.entry(step.name().to_owned()).or_insert(0) += 1;
                self.tree = next;
            }
        }

        let saturated = applied.is_empty();
        self.iterations.push(Iteration {
            tree_size,
            applied,
            total_time: start_time.elapsed().as_secs_f64(),
        });

        if saturated {
            Err(StopReason::Saturated)
        } else {
            Ok(())
        }
    }
}

/// Applies `step` to `tree` until it stops changing or `limit` iterations
/// have run.
///
/// Returns the final tree and whether it is the input, unchanged.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "x + 0".parse().unwrap();
/// assert_eq!(iterate(&t, &Simplify, 10), (Tree::var("x"), false));
/// assert_eq!(iterate(&Tree::var("x"), &Simplify, 10), (Tree::var("x"), true));
/// ```
pub fn iterate(tree: &Tree, step: &dyn Step, limit: usize) -> (Tree, bool) {
    iterate_all(tree, &[step], limit)
}

/// Like [`iterate`], but runs all of `steps` in sequence inside each
/// iteration.
pub fn iterate_all(tree: &Tree, steps: &[&dyn Step], limit: usize) -> (Tree, bool) {
    let runner = Runner::new(tree.clone()).with_iter_limit(limit).run(steps);
    let unchanged = runner
        .iterations
        .first()
        .map_or(true, |it| it.applied.is_empty());
    (runner.tree, unchanged)
}

/// Simplifies `tree` to a fixed point. See [`Simplify`].
pub fn simplify(tree: &Tree) -> Tree {
    iterate(tree, &Simplify, DEFAULT_ITER_LIMIT).0
}

/// Rebalances `tree` by depth to a fixed point. See [`Rebalance`].
pub fn rebalance(tree: &Tree) -> Tree {
    iterate(tree, &Rebalance::default(), DEFAULT_ITER_LIMIT).0
}

/// Factors `tree` as far as it goes. See [`Factorize`].
pub fn factorize(tree: &Tree) -> Tree {
    iterate(tree, &Factorize, DEFAULT_ITER_LIMIT).0
}

/// Expands `tree` as far as it goes. See [`Distribute`].
pub fn distribute(tree: &Tree) -> Tree {
    iterate(tree, &Distribute, DEFAULT_ITER_LIMIT).0
}

/// Orders operands by cost to a fixed point. See [`Reorder`].
pub fn reorder(tree: &Tree, costs: &CostTable) -> Tree {
    iterate(tree, &Reorder::new(costs.clone()), DEFAULT_ITER_LIMIT).0
}

/** The canonical form of `tree`: [`Simplify`] and [`Rebalance`] to a
joint fixed point.

```
use parsched::*;

let t: Tree = "a - b * c + k".parse().unwrap();
assert_eq!(optimize(&t).to_string(), "a - ((b * c) - k)");
```
*/
pub fn optimize(tree: &Tree) -> Tree {
    iterate_all(tree, &[&Simplify, &Rebalance::default()], DEFAULT_ITER_LIMIT).0
}
