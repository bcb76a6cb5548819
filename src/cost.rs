use std::fmt::Debug;

use crate::util::HashMap;
use crate::{Symbol, Tree};

/** Compute-cycle costs per operator.

A sparse table from operator name to the number of cycles one `compute`
of that operator occupies a unit for. Operators that are not listed cost
one cycle, and costs are always positive: a listed cost of `0` is read
as `1`.

```
use parsched::*;

let costs = CostTable::default().with("*", 4).with("/", 8);
assert_eq!(costs.get("*"), 4);
assert_eq!(costs.get("+"), 1);

let same: CostTable = [("*", 4), ("/", 8)].into_iter().collect();
assert_eq!(same, costs);
```
*/
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CostTable {
    costs: HashMap<Symbol, usize>,
}

impl CostTable {
    /// Sets the cost of `op`, builder style.
    pub fn with(mut self, op: impl Into<Symbol>, cost: usize) -> Self {
        self.insert(op, cost);
        self
    }

    /// Sets the cost of `op`, returning the previous entry.
    pub fn insert(&mut self, op: impl Into<Symbol>, cost: usize) -> Option<usize> {
        self.costs.insert(op.into(), cost.max(1))
    }

    /// The cost of `op`, `1` if it is not listed.
    pub fn get(&self, op: impl Into<Symbol>) -> usize {
        let op: Symbol = op.into();
        self.costs.get(&op).copied().unwrap_or(1)
    }
}

impl<S: Into<Symbol>> FromIterator<(S, usize)> for CostTable {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut table = CostTable::default();
        for (op, cost) in iter {
            table.insert(op, cost);
        }
        table
    }
}

/** A cost function that can be used to compare [`Tree`]s.

The rebalancing and reordering steps use a [`CostFunction`] to decide
which side of an operator is heavier.

The cost of a node is computed from the node itself and the costs of
its children, in order.

See [`AstDepth`] and [`TreeCost`] for the two provided implementations.
*/
pub trait CostFunction {
    /// The `Cost` type. It only requires `PartialOrd` so you can use
    /// floating point types, but failed comparisons (`NaN`s) will
    /// result in a panic.
    type Cost: PartialOrd + Debug + Clone;

    /// Calculates the cost of a node whose children have the given costs.
    fn cost(&mut self, tree: &Tree, child_costs: &[Self::Cost]) -> Self::Cost;

    /// Calculates the total cost of a whole [`Tree`].
    fn cost_rec(&mut self, tree: &Tree) -> Self::Cost {
        let child_costs: Vec<Self::Cost> =
            tree.children().iter().map(|c| self.cost_rec(c)).collect();
        self.cost(tree, &child_costs)
    }
}

/** A simple [`CostFunction`] that counts maximum depth.

Leaves have depth `0`, matching [`Tree::depth`].

```
# use parsched::*;
let t: Tree = "(a + b) * c".parse().unwrap();
assert_eq!(AstDepth.cost_rec(&t), 2);
```
*/
#[derive(Debug)]
pub struct AstDepth;

impl CostFunction for AstDepth {
    type Cost = usize;
    fn cost(&mut self, tree: &Tree, child_costs: &[usize]) -> usize {
        if tree.is_leaf() {
            0
        } else {
            1 + child_costs.iter().copied().max().unwrap_or(0)
        }
    }
}

/** Accumulated compute cost of a [`Tree`].

Every operator and call contributes its [`CostTable`] entry, leaves
contribute nothing.

```
# use parsched::*;
let costs = CostTable::default().with("*", 4);
let t: Tree = "a * b + c".parse().unwrap();
assert_eq!(TreeCost::new(&costs).cost_rec(&t), 5);
```
*/
#[derive(Debug)]
pub struct TreeCost<'a> {
    costs: &'a CostTable,
}

impl<'a> TreeCost<'a> {
    /// Measures against `costs`.
    pub fn new(costs: &'a CostTable) -> Self {
        TreeCost { costs }
    }
}

impl CostFunction for TreeCost<'_> {
    type Cost = usize;
    fn cost(&mut self, tree: &Tree, child_costs: &[usize]) -> usize {
        let own = match tree.child_list() {
            None => 0,
            Some(_) => self.costs.get(tree.name()),
        };
        own + child_costs.iter().sum::<usize>()
    }
}

/// What [`Rebalance`](crate::Rebalance) compares when deciding which side
/// of a chain is heavier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Metric {
    /// [`AstDepth`].
    #[default]
    Depth,
    /// [`TreeCost`] against the given table.
    Cost(CostTable),
}

impl Metric {
    /// Measures `tree`.
    pub fn measure(&self, tree: &Tree) -> usize {
        match self {
            Metric::Depth => AstDepth.cost_rec(tree),
            Metric::Cost(costs) => TreeCost::new(costs).cost_rec(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_costs_are_positive() {
        let costs = CostTable::default().with("+", 0);
        assert_eq!(costs.get("+"), 1);
    }

    #[test]
    fn tree_cost_counts_calls() {
        let costs: CostTable = [("sin", 10), ("*", 3)].into_iter().collect();
        let t: Tree = "sin(x) * f()".parse().unwrap();
        assert_eq!(TreeCost::new(&costs).cost_rec(&t), 10 + 3 + 1);
        assert_eq!(TreeCost::new(&costs).cost_rec(&Tree::var("x")), 0);
    }

    #[test]
    fn depth_metric_agrees_with_tree() {
        for src in ["a", "a + b", "(a + b) * (c - d / e)", "-(-x)"] {
            let t: Tree = src.parse().unwrap();
            assert_eq!(Metric::Depth.measure(&t), t.depth());
        }
    }
}
