#![warn(missing_docs)]
/*!

`parsched` rewrites arithmetic expression trees into equivalent forms and
ranks them by how fast they run on a small simulated parallel machine.

This is the API documentation.

The pipeline has three stages:

- **canonicalize**: [`optimize`] simplifies a [`Tree`] and rebalances it
  to minimal depth, driving a [`Runner`] over [`Step`]s to a fixed point;
- **enumerate**: the generators ([`commutations`], [`associations`],
  [`factorizations`] and their compositions) lazily yield equivalent
  trees;
- **evaluate**: the [`machine`] linearizes each tree into tasks and
  simulates them cycle by cycle on `units` execution units sharing
  `ports` memory ports, and a [`Search`] keeps the fastest.

## Logging

Many parts of `parsched` dump useful logging info using the [`log`](https://docs.rs/log/) crate.
The easiest way to see this info is to use the [`env_logger`](https://docs.rs/env_logger/)
crate in your binary or test.
The simplest way to enable `env_logger` is to put the following line near the top of your `main`:
`env_logger::init();`.
Then, set the environment variable `RUST_LOG=parsched=info`, or use `warn` or `debug` instead of info
for less or more logging.

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("../tests/simple.rs")]
#![doc = "\n```"]

#[macro_use]
mod macros;


mod cost;
mod generate;
pub mod machine;
mod parse;
mod pattern;
mod rewrite;
mod run;
mod search;
mod subst;
mod tree;
mod util;

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

pub use {
    cost::{AstDepth, CostFunction, CostTable, Metric, TreeCost},
    generate::*,
    machine::{
        calculate_load, linearize, simulate, Cell, Load, Machine, Policy, State, Trace,
    },
    parse::ParseError,
    pattern::Pattern,
    rewrite::{Distribute, Factorize, Rebalance, Reorder, Rewrite, Simplify, Step},
    run::*,
    search::*,
    subst::Bindings,
    tree::{Kind, Tree},
    util::{format_number, Symbol},
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
