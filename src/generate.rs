/*! Lazy enumeration of equivalent rewritings.

Every generator here takes a tree and returns a fresh iterator over
trees that evaluate to the same value. Calling a generator again starts
a new enumeration from the beginning, and nothing is computed before it
is asked for, so `take(n)` on a huge product stays cheap.

Generators come in two shapes:

- combinatorial ones ([`commutations`], [`associations`]) yield the
  cartesian product of the alternatives at every node, and can grow
  exponentially with the size of the tree;
- chains ([`factorizations`], [`distributions`]) yield the input and then
  the result of each further pass of a [`Step`] until it stops changing.
*/

use crate::rewrite::{left_chain, right_chain};
use crate::{Distribute, Factorize, Step, Tree};

/// A boxed, lazy sequence of trees.
pub type Trees = Box<dyn Iterator<Item = Tree> + Send>;

/// A generator of equivalent trees.
pub type Generator = fn(&Tree) -> Trees;

/** The cartesian product of a generator over several trees.

Yields one `Vec` per combination, with the first tree varying slowest
and the last fastest. The inner sequences are never buffered: when an
inner sequence runs out it is restarted by calling the generator again.

A product over no trees yields a single empty combination, and a
product where any sequence is empty yields nothing.

```
use parsched::*;

let trees: Vec<Tree> = vec!["a + b".parse().unwrap(), Tree::var("c")];
let combos: Vec<String> = Product::new(commutations, &trees)
    .map(|v| format!("{} | {}", v[0], v[1]))
    .collect();
assert_eq!(combos, ["a + b | c", "b + a | c"]);
```
*/
pub struct Product {
    generator: Generator,
    seeds: Vec<Tree>,
    iters: Vec<Trees>,
    current: Vec<Tree>,
    started: bool,
    done: bool,
}

impl Product {
    /// The product of `generator` over each of `seeds`.
    pub fn new(generator: Generator, seeds: &[Tree]) -> Self {
        Product {
            generator,
            seeds: seeds.to_vec(),
            iters: Vec::with_capacity(seeds.len()),
            current: Vec::with_capacity(seeds.len()),
            started: false,
            done: false,
        }
    }

    fn start(&mut self) -> Option<Vec<Tree>> {
        self.started = true;
        for seed in &self.seeds {
            let mut iter = (self.generator)(seed);
            let first = iter.next()?;
            self.iters.push(iter);
            self.current.push(first);
        }
        Some(self.current.clone())
    }

    fn advance(&mut self) -> Option<Vec<Tree>> {
        for i in (0..self.iters.len()).rev() {
            if let Some(next) = self.iters[i].next() {
                self.current[i] = next;
                for j in i + 1..self.iters.len() {
                    let mut iter = (self.generator)(&self.seeds[j]);
                    self.current[j] = iter.next()?;
                    self.iters[j] = iter;
                }
                return Some(self.current.clone());
            }
        }
        None
    }
}

impl Iterator for Product {
    type Item = Vec<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = if self.started {
            self.advance()
        } else {
            self.start()
        };
        if next.is_none() {
            self.done = true;
        }
        next
    }
}

fn op(name: &str, left: &Tree, right: &Tree) -> Tree {
    Tree::binary(name, left.clone(), right.clone())
}

fn inverse(tree: &Tree) -> Tree {
    Tree::binary("/", Tree::num(1.0), tree.clone())
}

/// Rebuilds `tree` once per combination of its children's alternatives.
fn structural(generator: Generator, tree: Tree) -> Trees {
    match tree.child_list() {
        None => Box::new(std::iter::once(tree)),
        Some(children) => {
            let product = Product::new(generator, children);
            Box::new(product.map(move |children| tree.with_children(children)))
        }
    }
}

/** All commutations of `tree`.

For `+` and `*`, every combination of the operands' commutations is
yielded in both operand orders. The two-level chains `(a - b) - c`,
`a - (b - c)`, `(a / b) / c` and `a / (b / c)` each yield six fixed
regroupings per combination, moving the subtracted (or divided) terms
around through negation (or reciprocals). Everything else is
rebuilt from the commutations of its children.

```
use parsched::*;

let t: Tree = "a * (b + c)".parse().unwrap();
let all: Vec<String> = commutations(&t).map(|t| t.to_string()).collect();
assert_eq!(all, ["a * (b + c)", "(b + c) * a", "a * (c + b)", "(c + b) * a"]);
```
*/
pub fn commutations(tree: &Tree) -> Trees {
    let tree = tree.clone();

    if let (None, [a, b]) = (tree.kind(), tree.children()) {
        let name = tree.name().as_str();
        if name == "+" || name == "*" {
            let product = Product::new(commutations, &[a.clone(), b.clone()]);
            return Box::new(product.flat_map(move |ab| {
                let [a, b] = [&ab[0], &ab[1]];
                [op(name, a, b), op(name, b, a)]
            }));
        }
    }

    if let Some(bindings) = pattern!("(a - b) - c").search(&tree) {
        let seeds = [&bindings["a"], &bindings["b"], &bindings["c"]].map(Tree::clone);
        return Box::new(Product::new(commutations, &seeds).flat_map(|abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            let (neg_b, neg_c) = (Tree::neg(b.clone()), Tree::neg(c.clone()));
            [
                op("-", &op("-", a, b), c),
                op("-", &op("-", a, c), b),
                op("-", &op("+", &neg_b, a), c),
                op("+", &op("-", &neg_b, c), a),
                op("+", &op("-", &neg_c, b), a),
                op("-", &op("+", &neg_c, a), b),
            ]
        }));
    }

    if let Some(bindings) = pattern!("(a / b) / c").search(&tree) {
        let seeds = [&bindings["a"], &bindings["b"], &bindings["c"]].map(Tree::clone);
        return Box::new(Product::new(commutations, &seeds).flat_map(|abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            let (inv_b, inv_c) = (inverse(b), inverse(c));
            [
                op("/", &op("/", a, b), c),
                op("/", &op("/", a, c), b),
                op("/", &op("*", &inv_b, a), c),
                op("*", &op("/", &inv_b, c), a),
                op("*", &op("/", &inv_c, b), a),
                op("/", &op("*", &inv_c, a), b),
            ]
        }));
    }

    if let Some(bindings) = pattern!("a - (b - c)").search(&tree) {
        let seeds = [&bindings["a"], &bindings["b"], &bindings["c"]].map(Tree::clone);
        return Box::new(Product::new(commutations, &seeds).flat_map(|abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            let neg_b = Tree::neg(b.clone());
            [
                op("-", a, &op("-", b, c)),
                op("+", a, &op("-", c, b)),
                op("+", &neg_b, &op("+", a, c)),
                op("+", &neg_b, &op("+", c, a)),
                op("-", c, &op("-", b, a)),
                op("+", c, &op("-", a, b)),
            ]
        }));
    }

    if let Some(bindings) = pattern!("a / (b / c)").search(&tree) {
        let seeds = [&bindings["a"], &bindings["b"], &bindings["c"]].map(Tree::clone);
        return Box::new(Product::new(commutations, &seeds).flat_map(|abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            let inv_b = inverse(b);
            [
                op("/", a, &op("/", b, c)),
                op("*", a, &op("/", c, b)),
                op("*", &inv_b, &op("*", a, c)),
                op("*", &inv_b, &op("*", c, a)),
                op("/", c, &op("/", b, a)),
                op("*", c, &op("/", a, b)),
            ]
        }));
    }

    structural(commutations, tree)
}

/** All associations of `tree`.

Every three-term chain of `+`/`-` or `*`/`/` yields itself and its
regrouping (`(a - b) + c` and `a - (b - c)`, `(a / b) / c` and
`a / (b * c)`, and so on), for every combination of the associations of
the three terms. Everything else is rebuilt from the associations of its
children.

```
use parsched::*;

let t: Tree = "(a - b) - c".parse().unwrap();
let all: Vec<String> = associations(&t).map(|t| t.to_string()).collect();
assert_eq!(all, ["(a - b) - c", "a - (b + c)"]);
```
*/
pub fn associations(tree: &Tree) -> Trees {
    let tree = tree.clone();

    if let Some((outer, inner, [a, b, c])) = left_chain(&tree) {
        let (left_outer, left_inner) = (tree.name().as_str(), tree.children()[0].name().as_str());
        let seeds = [a.clone(), b.clone(), c.clone()];
        return Box::new(Product::new(associations, &seeds).flat_map(move |abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            [
                op(left_outer, &op(left_inner, a, b), c),
                op(outer, a, &op(inner, b, c)),
            ]
        }));
    }

    if let Some((inner, outer, [a, b, c])) = right_chain(&tree) {
        let (right_outer, right_inner) = (tree.name().as_str(), tree.children()[1].name().as_str());
        let seeds = [a.clone(), b.clone(), c.clone()];
        return Box::new(Product::new(associations, &seeds).flat_map(move |abc| {
            let [a, b, c] = [&abc[0], &abc[1], &abc[2]];
            [
                op(right_outer, a, &op(right_inner, b, c)),
                op(outer, &op(inner, a, b), c),
            ]
        }));
    }

    structural(associations, tree)
}

/// Yields `tree`, then the result of each further pass of `step`, until a
/// pass changes nothing.
pub fn chain(step: impl Step + Send + 'static, tree: &Tree) -> Trees {
    let mut next = Some(tree.clone());
    Box::new(std::iter::from_fn(move || {
        let current = next.take()?;
        let after = step.apply(&current);
        if after != current {
            next = Some(after);
        }
        Some(current)
    }))
}

/// The factorization chain of `tree`: the tree itself, then each
/// progressively more factored form.
///
/// ```
/// # use parsched::*;
/// let t: Tree = "a * b + a * c".parse().unwrap();
/// let all: Vec<String> = factorizations(&t).map(|t| t.to_string()).collect();
/// assert_eq!(all, ["(a * b) + (a * c)", "a * (b + c)"]);
/// ```
pub fn factorizations(tree: &Tree) -> Trees {
    chain(Factorize, tree)
}

/// The distribution chain of `tree`: the tree itself, then each
/// progressively more expanded form.
pub fn distributions(tree: &Tree) -> Trees {
    chain(Distribute, tree)
}

/// The commutations of every tree in the factorization chain of `tree`.
pub fn factorization_commutations(tree: &Tree) -> Trees {
    Box::new(factorizations(tree).flat_map(|t| commutations(&t)))
}

/// The commutations of every association of every tree in the
/// factorization chain of `tree`.
pub fn factorization_commutation_associations(tree: &Tree) -> Trees {
    Box::new(
        factorizations(tree)
            .flat_map(|t| associations(&t))
            .flat_map(|t| commutations(&t)),
    )
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn strings(trees: Trees) -> Vec<String> {
        trees.map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_product_yields_once() {
        let mut p = Product::new(commutations, &[]);
        assert_eq!(p.next(), Some(vec![]));
        assert_eq!(p.next(), None);
    }

    #[test]
    fn product_order_is_odometer() {
        let seeds: Vec<Tree> = ["a + b", "c * d", "e"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let combos: Vec<String> = Product::new(commutations, &seeds)
            .map(|v| v.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" | "))
            .collect();
        assert_eq!(
            combos,
            [
                "a + b | c * d | e",
                "a + b | d * c | e",
                "b + a | c * d | e",
                "b + a | d * c | e",
            ]
        );
    }

    #[test]
    fn generators_restart() {
        let t: Tree = "(a + b) * (c + d)".parse().unwrap();
        let first = strings(commutations(&t));
        assert_eq!(first.len(), 8);
        assert_eq!(strings(commutations(&t)), first);
    }

    #[test]
    fn leaves_and_calls() {
        assert_eq!(strings(commutations(&Tree::var("x"))), ["x"]);
        let t: Tree = "f(a + b, g())".parse().unwrap();
        assert_eq!(strings(commutations(&t)), ["f(a + b, g())", "f(b + a, g())"]);
    }

    #[test]
    fn subtraction_chains() {
        let t: Tree = "(a - b) - c".parse().unwrap();
        assert_eq!(
            strings(commutations(&t)),
            [
                "(a - b) - c",
                "(a - c) - b",
                "((-b) + a) - c",
                "((-b) - c) + a",
                "((-c) - b) + a",
                "((-c) + a) - b",
            ]
        );
    }

    #[test]
    fn division_chains() {
        let t: Tree = "a / (b / c)".parse().unwrap();
        assert_eq!(
            strings(commutations(&t)),
            [
                "a / (b / c)",
                "a * (c / b)",
                "(1 / b) * (a * c)",
                "(1 / b) * (c * a)",
                "c / (b / a)",
                "c * (a / b)",
            ]
        );
    }

    #[test]
    fn right_chains_associate() {
        let t: Tree = "a / (b * c)".parse().unwrap();
        assert_eq!(strings(associations(&t)), ["a / (b * c)", "(a / b) / c"]);
        assert_eq!(strings(associations(&Tree::var("x"))), ["x"]);
    }

    #[test]
    fn chains_end_at_a_fixed_point() {
        let t: Tree = "a * (b + c) * (d - e)".parse().unwrap();
        let all: Vec<Tree> = distributions(&t).collect();
        let last = all.last().unwrap();
        assert_eq!(&Distribute.apply(last), last);
        assert_eq!(all[0], t);
        assert!(all.windows(2).all(|w| w[0] != w[1]));
    }
}
