use std::fmt;

use crate::{Symbol, Tree};

/// A binding dictionary mapping pattern variables to the subtrees they
/// matched.
///
/// Produced by [`Pattern::search`](crate::Pattern::search). Most patterns
/// have only a handful of variables, so the bindings live inline.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Bindings {
    vec: smallvec::SmallVec<[(Symbol, Tree); 3]>,
}

impl Bindings {
    /// Insert something, returning the old `Tree` if present.
    pub fn insert(&mut self, var: impl Into<Symbol>, tree: Tree) -> Option<Tree> {
        let var = var.into();
        for pair in &mut self.vec {
            if pair.0 == var {
                return Some(std::mem::replace(&mut pair.1, tree));
            }
        }
        self.vec.push((var, tree));
        None
    }

    /// Retrieve a variable, returning `None` if not present.
    pub fn get(&self, var: impl Into<Symbol>) -> Option<&Tree> {
        let var = var.into();
        self.vec
            .iter()
            .find_map(|(v, tree)| if *v == var { Some(tree) } else { None })
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// True if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// The bindings in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Tree)> {
        self.vec.iter().map(|(v, t)| (*v, t))
    }
}

impl std::ops::Index<&str> for Bindings {
    type Output = Tree;

    fn index(&self, var: &str) -> &Self::Output {
        match self.get(var) {
            Some(tree) => tree,
            None => panic!("Var '{}' not found in {:?}", var, self),
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.vec.iter().map(|(v, t)| (v, t.to_string())))
            .finish()
    }
}
