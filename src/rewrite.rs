use log::*;
use once_cell::sync::Lazy;

use crate::{CostFunction, CostTable, Metric, Pattern, Tree, TreeCost};

/// A rewrite that matches the lefthand side at the root of a tree and
/// builds the righthand side from the bindings.
///
/// The [`rewrite!`](crate::rewrite!) macro is the easiest way to create
/// rewrites.
#[derive(Clone, Debug)]
pub struct Rewrite {
    name: String,
    lhs: Pattern,
    rhs: Pattern,
}

impl Rewrite {
    /// Create a new [`Rewrite`]. You typically want to use the
    /// [`rewrite!`](crate::rewrite!) macro instead.
    pub fn new(name: impl Into<String>, lhs: Pattern, rhs: Pattern) -> Self {
        Self {
            name: name.into(),
            lhs,
            rhs,
        }
    }

    /// Returns the name of the rewrite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rewrites `tree` if the lefthand side matches at its root.
    pub fn apply(&self, tree: &Tree) -> Option<Tree> {
        let bindings = self.lhs.search(tree)?;
        let result = self.rhs.instantiate(&bindings);
        debug!("{}: {} => {}", self.name, tree, result);
        Some(result)
    }
}

/** A single pass of a rewrite family over a whole tree.

A [`Step`] maps a tree to a (possibly) new tree. Steps are meant to be
driven to a fixed point by a [`Runner`](crate::Runner) or by
[`iterate`](crate::iterate), and every step here is written so that
repeated application converges.
*/
pub trait Step {
    /// The name used in logs and [`Iteration`](crate::Iteration) reports.
    fn name(&self) -> &str;

    /// Runs one pass over `tree`.
    fn apply(&self, tree: &Tree) -> Tree;
}

fn bottom_up(tree: &Tree, rule: &impl Fn(&Tree) -> Option<Tree>) -> Tree {
    let tree = tree.map_children(|child| bottom_up(child, rule));
    rule(&tree).unwrap_or(tree)
}

fn first_match(rules: &[Rewrite], tree: &Tree) -> Option<Tree> {
    rules.iter().find_map(|rw| rw.apply(tree))
}

/// The two children of a binary operator node, with the operator name.
fn binary(tree: &Tree) -> Option<(&'static str, &Tree, &Tree)> {
    match (tree.kind(), tree.children()) {
        (None, [left, right]) => Some((tree.name().as_str(), left, right)),
        _ => None,
    }
}

static IDENTITIES: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        rewrite!("add-0-left"; "0 + x" => "x"),
        rewrite!("add-0-right"; "x + 0" => "x"),
        rewrite!("sub-from-0"; "0 - x" => "-x"),
        rewrite!("sub-0"; "x - 0" => "x"),
        rewrite!("mul-0-left"; "0 * x" => "0"),
        rewrite!("mul-0-right"; "x * 0" => "0"),
        rewrite!("div-into-0"; "0 / x" => "0"),
        rewrite!("mul-1-left"; "1 * x" => "x"),
        rewrite!("mul-1-right"; "x * 1" => "x"),
        rewrite!("div-1"; "x / 1" => "x"),
        rewrite!("neg-neg"; "-(-x)" => "x"),
        rewrite!("sub-neg"; "x - (-y)" => "x + y"),
        rewrite!("mul-recip"; "x * (1 / y)" => "x / y"),
        rewrite!("recip-recip"; "1 / (1 / x)" => "x"),
    ]
});

fn fold_constants(tree: &Tree) -> Option<Tree> {
    if let (true, [child]) = (tree.is_op("neg"), tree.children()) {
        let value = child.as_number()?;
        debug!("fold: {} => {}", tree, -value);
        return Some(Tree::num(-value));
    }
    let (op, left, right) = binary(tree)?;
    let (x, y) = (left.as_number()?, right.as_number()?);
    let value = match op {
        "+" => x + y,
        "-" => x - y,
        "*" => x * y,
        "/" => x / y,
        "^" => x.powf(y),
        _ => return None,
    };
    if !value.is_finite() {
        warn!("Not folding {}, the result is not finite", tree);
        return None;
    }
    debug!("fold: {} => {}", tree, value);
    Some(Tree::num(value))
}

/// `x - x` and `x / x` for any pair of equal operands.
fn cancel_self(tree: &Tree) -> Option<Tree> {
    let (op, left, right) = binary(tree)?;
    if left != right {
        return None;
    }
    let result = match op {
        "-" => Tree::num(0.0),
        "/" => Tree::num(1.0),
        _ => return None,
    };
    debug!("cancel: {} => {}", tree, result);
    Some(result)
}

fn simplify_root(tree: &Tree) -> Option<Tree> {
    if let Some(("/", _, divisor)) = binary(tree) {
        if divisor.as_number() == Some(0.0) {
            warn!("Leaving division by zero in place: {}", tree);
            return None;
        }
    }
    fold_constants(tree)
        .or_else(|| first_match(&IDENTITIES, tree))
        .or_else(|| cancel_self(tree))
}

/// Constant folding, identity elimination and self-cancellation, applied
/// bottom-up.
///
/// Division by a literal zero is never touched.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "(x * (2 - 1)) - (0 - y)".parse().unwrap();
/// assert_eq!(simplify(&t).to_string(), "x + y");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Simplify;

impl Step for Simplify {
    fn name(&self) -> &str {
        "simplify"
    }

    fn apply(&self, tree: &Tree) -> Tree {
        bottom_up(tree, &simplify_root)
    }
}

/// Three-term chains that can be regrouped without changing value.
///
/// Each entry is `(inner, outer)` for the left-leaning `(a inner b) outer c`
/// and `(outer, inner)` for the equivalent right-leaning
/// `a outer (b inner c)`.
pub(crate) const ASSOCIATIONS: [((&str, &str), (&str, &str)); 8] = [
    (("+", "+"), ("+", "+")),
    (("+", "-"), ("+", "-")),
    (("-", "+"), ("-", "-")),
    (("-", "-"), ("-", "+")),
    (("*", "*"), ("*", "*")),
    (("*", "/"), ("*", "/")),
    (("/", "*"), ("/", "/")),
    (("/", "/"), ("/", "*")),
];

/// A left-leaning chain `(a x b) y c`, with the `(outer, inner)`
/// operators of its right-leaning regrouping.
pub(crate) fn left_chain(tree: &Tree) -> Option<(&'static str, &'static str, [&Tree; 3])> {
    let (outer, ab, c) = binary(tree)?;
    let (inner, a, b) = binary(ab)?;
    ASSOCIATIONS
        .iter()
        .find(|(left, _)| *left == (inner, outer))
        .map(|(_, (outer, inner))| (*outer, *inner, [a, b, c]))
}

/// A right-leaning chain `a x (b y c)`, with the `(inner, outer)`
/// operators of its left-leaning regrouping.
pub(crate) fn right_chain(tree: &Tree) -> Option<(&'static str, &'static str, [&Tree; 3])> {
    let (outer, a, bc) = binary(tree)?;
    let (inner, b, c) = binary(bc)?;
    ASSOCIATIONS
        .iter()
        .find(|(_, right)| *right == (outer, inner))
        .map(|((inner, outer), _)| (*inner, *outer, [a, b, c]))
}

/** Associativity rebalancing.

Walks the tree top-down. A left-leaning chain `(a x b) y c` is regrouped
to the right when `a` or `b` is heavier than `c`, and a right-leaning
chain `a x (b y c)` is regrouped to the left only when `c` is heavier
than both `a` and `b`. The asymmetry keeps a balanced chain from flipping
back and forth between iterations.

Weight is measured by a [`Metric`], depth by default. Long chains end up
roughly logarithmic in depth.

```
# use parsched::*;
let t: Tree = "a + b + c + d + e".parse().unwrap();
assert_eq!(rebalance(&t).to_string(), "((a + b) + c) + (d + e)");
```
*/
#[derive(Debug, Default, Clone)]
pub struct Rebalance {
    metric: Metric,
}

impl Rebalance {
    /// Rebalances by `metric`.
    pub fn new(metric: Metric) -> Self {
        Rebalance { metric }
    }

    fn step(&self, tree: &Tree) -> Tree {
        let m = |t: &Tree| self.metric.measure(t);

        if let Some((outer, inner, [a, b, c])) = left_chain(tree) {
            if m(a).max(m(b)) > m(c) {
                let rest = Tree::binary(inner, b.clone(), c.clone());
                let result = Tree::binary(outer, self.step(a), self.step(&rest));
                debug!("rebalance: {} => {}", tree, result);
                return result;
            }
        }

        if let Some((inner, outer, [a, b, c])) = right_chain(tree) {
            if m(c) > m(a).max(m(b)) {
                let rest = Tree::binary(inner, a.clone(), b.clone());
                let result = Tree::binary(outer, self.step(&rest), self.step(c));
                debug!("rebalance: {} => {}", tree, result);
                return result;
            }
        }

        tree.map_children(|child| self.step(child))
    }
}

impl Step for Rebalance {
    fn name(&self) -> &str {
        "rebalance"
    }

    fn apply(&self, tree: &Tree) -> Tree {
        self.step(tree)
    }
}

static FACTORIZATIONS: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        rewrite!("factor-div-add"; "(a / b) + (c / b)" => "(a + c) / b"),
        rewrite!("factor-div-sub"; "(a / b) - (c / b)" => "(a - c) / b"),
        rewrite!("factor-add-bd"; "(a * b) + (c * b)" => "b * (a + c)"),
        rewrite!("factor-add-ad"; "(a * b) + (c * a)" => "a * (b + c)"),
        rewrite!("factor-add-bc"; "(a * b) + (b * d)" => "b * (a + d)"),
        rewrite!("factor-add-ac"; "(a * b) + (a * d)" => "a * (b + d)"),
        rewrite!("factor-sub-bd"; "(a * b) - (c * b)" => "b * (a - c)"),
        rewrite!("factor-sub-ad"; "(a * b) - (c * a)" => "a * (b - c)"),
        rewrite!("factor-sub-bc"; "(a * b) - (b * d)" => "b * (a - d)"),
        rewrite!("factor-sub-ac"; "(a * b) - (a * d)" => "a * (b - d)"),
    ]
});

/// One bottom-up factorization pass: pulls a shared factor or divisor out
/// of a sum or difference. The factor lands on the left.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "a * b + a * c".parse().unwrap();
/// assert_eq!(factorize(&t).to_string(), "a * (b + c)");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Factorize;

impl Step for Factorize {
    fn name(&self) -> &str {
        "factorize"
    }

    fn apply(&self, tree: &Tree) -> Tree {
        bottom_up(tree, &|t| first_match(&FACTORIZATIONS, t))
    }
}

static DISTRIBUTIONS: Lazy<Vec<Rewrite>> = Lazy::new(|| {
    vec![
        rewrite!("distribute-mul-add"; "a * (b + c)" => "(a * b) + (a * c)"),
        rewrite!("distribute-mul-sub"; "a * (b - c)" => "(a * b) - (a * c)"),
        rewrite!("distribute-add-mul"; "(a + b) * c" => "(a * c) + (b * c)"),
        rewrite!("distribute-sub-mul"; "(a - b) * c" => "(a * c) - (b * c)"),
        rewrite!("distribute-add-div"; "(a + b) / c" => "(a / c) + (b / c)"),
        rewrite!("distribute-sub-div"; "(a - b) / c" => "(a / c) - (b / c)"),
    ]
});

/// One bottom-up distribution (expansion) pass.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "a * (b + c)".parse().unwrap();
/// assert_eq!(distribute(&t).to_string(), "(a * b) + (a * c)");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Distribute;

impl Step for Distribute {
    fn name(&self) -> &str {
        "distribute"
    }

    fn apply(&self, tree: &Tree) -> Tree {
        bottom_up(tree, &|t| first_match(&DISTRIBUTIONS, t))
    }
}

/// Cost-based operand ordering, bottom-up.
///
/// The cheaper operand of `+` and `*` goes on the left, and in
/// `(a - b) - c` the costlier of `b` and `c` is subtracted last.
#[derive(Debug, Default, Clone)]
pub struct Reorder {
    costs: CostTable,
}

impl Reorder {
    /// Orders operands by their cost under `costs`.
    pub fn new(costs: CostTable) -> Self {
        Reorder { costs }
    }

    fn reorder_root(&self, tree: &Tree) -> Option<Tree> {
        let cost = |t: &Tree| TreeCost::new(&self.costs).cost_rec(t);
        let (op, left, right) = binary(tree)?;
        match op {
            "+" | "*" if cost(left) > cost(right) => {
                Some(tree.with_children(vec![right.clone(), left.clone()]))
            }
            "-" => {
                let ("-", a, b) = binary(left)? else {
                    return None;
                };
                if cost(b) > cost(right) {
                    let first = Tree::binary("-", a.clone(), right.clone());
                    Some(Tree::binary("-", first, b.clone()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Step for Reorder {
    fn name(&self) -> &str {
        "reorder"
    }

    fn apply(&self, tree: &Tree) -> Tree {
        bottom_up(tree, &|t| self.reorder_root(t))
    }
}
