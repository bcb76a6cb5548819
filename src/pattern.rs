use std::fmt;
use std::str::FromStr;

use log::*;

use crate::{Bindings, Kind, ParseError, Tree};

/** A pattern that can match a [`Tree`].

Patterns are written as ordinary expressions. Identifiers act as
pattern variables: the first occurrence of a variable binds it to the
subtree it lands on, and every later occurrence only matches a subtree
that is structurally equal to the bound one. The identifier `_` is an
anonymous wildcard that matches anything and binds nothing.

Every other node matches a tree node with the same name and the same
arity, with the children matched left to right.

Use the [`pattern!`](crate::pattern!) macro to parse a pattern once and
keep it around for the life of the process.

# Example
```
use parsched::*;

let tree: Tree = "(a * 2) - (a * 2)".parse().unwrap();

let same = pattern!("x - x");
let bindings = same.search(&tree).unwrap();
assert_eq!(bindings["x"].to_string(), "a * 2");

assert!(pattern!("_ - _").matches(&tree));
assert!(!same.matches(&"a - b".parse().unwrap()));
```
*/
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    ast: Tree,
}

const WILDCARD: &str = "_";

fn is_variable(tree: &Tree) -> bool {
    tree.kind() == Some(Kind::Name) && tree.child_list().is_none()
}

impl Pattern {
    /// Creates a pattern from its template tree.
    pub fn new(ast: Tree) -> Self {
        Pattern { ast }
    }

    /// The template tree.
    pub fn ast(&self) -> &Tree {
        &self.ast
    }

    /// Returns the named variables in this pattern, in order of first
    /// occurrence.
    pub fn vars(&self) -> Vec<&str> {
        fn collect<'a>(tree: &Tree, vars: &mut Vec<&'a str>) {
            if is_variable(tree) {
                let name = tree.name().as_str();
                if name != WILDCARD && !vars.contains(&name) {
                    vars.push(name);
                }
            }
            for child in tree.children() {
                collect(child, vars);
            }
        }
        let mut vars = vec![];
        collect(&self.ast, &mut vars);
        vars
    }

    /// Matches `tree` at its root, starting from no bindings.
    pub fn search(&self, tree: &Tree) -> Option<Bindings> {
        self.search_with(tree, Bindings::default())
    }

    /// Matches `tree` at its root, extending `bindings`.
    pub fn search_with(&self, tree: &Tree, mut bindings: Bindings) -> Option<Bindings> {
        if match_tree(&self.ast, tree, &mut bindings, 0) {
            Some(bindings)
        } else {
            None
        }
    }

    /// True if the pattern matches `tree` at its root.
    pub fn matches(&self, tree: &Tree) -> bool {
        self.search(tree).is_some()
    }

    /// Builds a tree from this pattern, substituting bound variables.
    ///
    /// Variables missing from `bindings` are left as identifiers.
    ///
    /// ```
    /// # use parsched::*;
    /// let b = pattern!("x * (y + z)").search(&"2 * (a + b)".parse().unwrap()).unwrap();
    /// let t = pattern!("(x * y) + (x * z)").instantiate(&b);
    /// assert_eq!(t.to_string(), "(2 * a) + (2 * b)");
    /// ```
    pub fn instantiate(&self, bindings: &Bindings) -> Tree {
        fn build(tree: &Tree, bindings: &Bindings) -> Tree {
            if is_variable(tree) {
                if let Some(bound) = bindings.get(tree.name()) {
                    return bound.clone();
                }
            }
            tree.map_children(|child| build(child, bindings))
        }
        build(&self.ast, bindings)
    }
}

fn match_tree(pattern: &Tree, tree: &Tree, bindings: &mut Bindings, depth: usize) -> bool {
    if is_variable(pattern) {
        let var = pattern.name();
        if var.as_str() == WILDCARD {
            return true;
        }
        return match bindings.get(var) {
            None => {
                trace!("{:depth$}bound {} to {}", "", var, tree, depth = depth * 2);
                bindings.insert(var, tree.clone());
                true
            }
            Some(bound) if bound == tree => true,
            Some(bound) => {
                trace!(
                    "{:depth$}{} is bound to {}, not {}",
                    "",
                    var,
                    bound,
                    tree,
                    depth = depth * 2
                );
                false
            }
        };
    }

    if pattern.name() != tree.name() {
        return false;
    }

    match (pattern.child_list(), tree.child_list()) {
        (None, None) => true,
        (Some(ps), Some(ts)) if ps.len() == ts.len() => ps
            .iter()
            .zip(ts)
            .all(|(p, t)| match_tree(p, t, bindings, depth + 1)),
        _ => false,
    }
}

impl FromStr for Pattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Pattern::new(s.parse()?))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ast, f)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self.ast)
    }
}
