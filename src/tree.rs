use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use symbolic_expressions::Sexp;

use crate::util::{format_number, pretty_print};
use crate::Symbol;

/// The category of a leaf (or call) in a [`Tree`].
///
/// Operator nodes carry no kind at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// An identifier, e.g. `x`. In a [`Pattern`](crate::Pattern) this is a variable.
    Name,
    /// A numeric literal.
    Num,
    /// A string literal, stored with its quotes.
    Str,
    /// `true` or `false`.
    Bool,
    /// A function call `f(args...)`.
    Fn,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Name => "name",
            Kind::Num => "num",
            Kind::Str => "str",
            Kind::Bool => "bool",
            Kind::Fn => "fn",
        };
        f.write_str(s)
    }
}

/** An immutable arithmetic expression tree.

A [`Tree`] is a `name` (an operator symbol, an identifier or the source
text of a literal), an optional list of children, an optional [`Kind`]
and an optional scheduling label.

Binary operators have exactly two children, unary negation (`neg`) has
one, leaves have none (`children` is absent). Function calls keep their
arguments as children, so a call with no arguments has a present but
empty list.

Trees are values: every transformation builds a new tree, and untouched
subtrees are shared through reference counting, so cloning is cheap.
Equality and hashing are deep and order-sensitive over the name, kind
and children. The label is never part of either; the
[`machine`](crate::machine) assigns it when it linearizes a tree into
tasks.

# Example
```
use parsched::*;

let t: Tree = "a * (b + c)".parse().unwrap();
assert_eq!(t.name().as_str(), "*");
assert_eq!(t.children().len(), 2);
assert_eq!(t.depth(), 2);
assert_eq!(t.to_string(), "a * (b + c)");
assert_eq!(t, Tree::binary("*", Tree::var("a"), "b + c".parse().unwrap()));
```
*/
#[derive(Clone)]
pub struct Tree {
    name: Symbol,
    kind: Option<Kind>,
    children: Option<Arc<[Tree]>>,
    label: Option<Symbol>,
}

impl Tree {
    /// A leaf with the given kind.
    pub fn leaf(name: impl Into<Symbol>, kind: Kind) -> Self {
        Tree {
            name: name.into(),
            kind: Some(kind),
            children: None,
            label: None,
        }
    }

    /// An identifier leaf.
    pub fn var(name: impl Into<Symbol>) -> Self {
        Tree::leaf(name, Kind::Name)
    }

    /// A numeric literal leaf.
    pub fn num(value: f64) -> Self {
        Tree::leaf(format_number(value), Kind::Num)
    }

    /// A string literal leaf; the quotes become part of the name.
    pub fn string(value: &str) -> Self {
        Tree::leaf(format!("\"{}\"", value), Kind::Str)
    }

    /// A boolean literal leaf.
    pub fn boolean(value: bool) -> Self {
        Tree::leaf(if value { "true" } else { "false" }, Kind::Bool)
    }

    /// An operator node.
    pub fn op(name: impl Into<Symbol>, children: impl Into<Vec<Tree>>) -> Self {
        let children: Vec<Tree> = children.into();
        Tree {
            name: name.into(),
            kind: None,
            children: Some(children.into()),
            label: None,
        }
    }

    /// A binary operator node.
    pub fn binary(name: impl Into<Symbol>, left: Tree, right: Tree) -> Self {
        Tree::op(name, vec![left, right])
    }

    /// Unary negation.
    pub fn neg(child: Tree) -> Self {
        Tree::op("neg", vec![child])
    }

    /// A function call.
    pub fn call(name: impl Into<Symbol>, args: impl Into<Vec<Tree>>) -> Self {
        let args: Vec<Tree> = args.into();
        Tree {
            name: name.into(),
            kind: Some(Kind::Fn),
            children: Some(args.into()),
            label: None,
        }
    }

    /// The operator, identifier or literal text of this node.
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// The kind tag, `None` for operators.
    pub fn kind(&self) -> Option<Kind> {
        self.kind
    }

    /// The children, empty for leaves.
    pub fn children(&self) -> &[Tree] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// The children, distinguishing an absent list (`None`) from an empty one.
    pub fn child_list(&self) -> Option<&[Tree]> {
        self.children.as_deref()
    }

    /// True if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// True for an operator node named `op` (not a call or a leaf).
    pub fn is_op(&self, op: &str) -> bool {
        self.kind.is_none() && self.children.is_some() && self.name.as_str() == op
    }

    /// The value of a numeric literal leaf.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            Some(Kind::Num) if self.children.is_none() => self.name.as_str().parse().ok(),
            _ => None,
        }
    }

    /// The scheduling label, if the machine assigned one.
    pub fn label(&self) -> Option<Symbol> {
        self.label
    }

    /// Returns a copy of this node carrying `label`.
    pub fn with_label(&self, label: impl Into<Symbol>) -> Self {
        Tree {
            label: Some(label.into()),
            ..self.clone()
        }
    }

    /// Returns a copy of this node with its children replaced, keeping the
    /// name and kind.
    pub fn with_children(&self, children: impl Into<Vec<Tree>>) -> Self {
        let children: Vec<Tree> = children.into();
        Tree {
            name: self.name,
            kind: self.kind,
            children: Some(children.into()),
            label: None,
        }
    }

    /// Rebuilds this node with `f` applied to each child.
    /// Leaves are returned unchanged.
    pub fn map_children(&self, f: impl FnMut(&Tree) -> Tree) -> Self {
        match &self.children {
            None => self.clone(),
            Some(children) => self.with_children(children.iter().map(f).collect::<Vec<_>>()),
        }
    }

    /// Length of the longest path to a leaf; leaves have depth 0.
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this tree.
    pub fn size(&self) -> usize {
        1 + self.children().iter().map(Tree::size).sum::<usize>()
    }

    /// Converts this tree into an s-expression.
    pub fn to_sexp(&self) -> Sexp {
        let op = Sexp::String(self.name.to_string());
        match &self.children {
            None => op,
            Some(children) => {
                let mut vec = vec![op];
                vec.extend(children.iter().map(Tree::to_sexp));
                Sexp::List(vec)
            }
        }
    }

    /// Pretty print as an s-expression with a maximum line length.
    ///
    /// # Example
    /// ```
    /// # use parsched::*;
    /// let t: Tree = "(2 + 2) * (x + y)".parse().unwrap();
    /// assert_eq!(t.pretty(10), "
    /// (*
    ///   (+ 2 2)
    ///   (+ x y))
    /// ".trim());
    /// ```
    pub fn pretty(&self, width: usize) -> String {
        let mut buf = String::new();
        pretty_print(&mut buf, &self.to_sexp(), width, 1).unwrap();
        buf
    }

    /// Evaluates this tree numerically.
    ///
    /// Identifiers are resolved through `lookup`. Returns `None` for
    /// unbound identifiers, string literals and unknown functions.
    /// Booleans evaluate to `1` and `0`.
    ///
    /// ```
    /// # use parsched::*;
    /// let t: Tree = "a * (b + c) - 2^3".parse().unwrap();
    /// let env = |name: &str| match name {
    ///     "a" => Some(2.0),
    ///     "b" => Some(3.0),
    ///     "c" => Some(4.0),
    ///     _ => None,
    /// };
    /// assert_eq!(t.eval(&env), Some(6.0));
    /// ```
    pub fn eval(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Option<f64> {
        let name = self.name.as_str();
        match self.kind {
            Some(Kind::Num) => return self.as_number(),
            Some(Kind::Name) => return lookup(name),
            Some(Kind::Bool) => return Some(if name == "true" { 1.0 } else { 0.0 }),
            Some(Kind::Str) => return None,
            Some(Kind::Fn) | None => {}
        }

        let args = self
            .children()
            .iter()
            .map(|c| c.eval(lookup))
            .collect::<Option<Vec<f64>>>()?;

        let value = match (name, args.as_slice()) {
            ("+", [a, b]) => a + b,
            ("-", [a, b]) => a - b,
            ("*", [a, b]) => a * b,
            ("/", [a, b]) => a / b,
            ("^", [a, b]) => a.powf(*b),
            ("neg", [a]) | ("-", [a]) => -a,
            ("sin", [a]) => a.sin(),
            ("cos", [a]) => a.cos(),
            ("exp", [a]) => a.exp(),
            ("log", [a]) => a.ln(),
            ("sqrt", [a]) => a.sqrt(),
            ("abs", [a]) => a.abs(),
            ("round", [a]) => a.round(),
            ("ceil", [a]) => a.ceil(),
            ("floor", [a]) => a.floor(),
            _ => return None,
        };
        Some(value)
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.kind.is_none() && !self.is_leaf() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.kind != other.kind {
            return false;
        }
        match (&self.children, &other.children) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a[..] == b[..],
            _ => false,
        }
    }
}

impl Eq for Tree {}

impl Hash for Tree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
        self.children.as_deref().hash(state);
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let children = match &self.children {
            None => return write!(f, "{}", self.name),
            Some(children) => children,
        };

        match (self.kind, &children[..]) {
            (None, [child]) if self.name.as_str() == "neg" => {
                // `-3` would read back as a literal
                if child.as_number().is_some() {
                    return write!(f, "-({})", child);
                }
                write!(f, "-")?;
                child.fmt_operand(f)
            }
            (None, [left, right]) => {
                left.fmt_operand(f)?;
                write!(f, " {} ", self.name)?;
                right.fmt_operand(f)
            }
            _ => {
                write!(f, "{}(", self.name)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Debug for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "Tree({} @ {})", self, label),
            None => write!(f, "Tree({})", self),
        }
    }
}
