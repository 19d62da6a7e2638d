//! Label selector language.
//!
//! A selector is a boolean expression over a label map:
//!
//! ```text
//! role == "db" && (zone in {"a", "b"} || !has(legacy))
//! ```
//!
//! `||` binds loosest, then `&&`, then `!`. Comparisons on a missing label
//! are false, except `!=` and `not in` which hold vacuously. An empty
//! selector matches everything.

pub mod ast;
pub mod error;
pub mod parser;
pub mod tokenizer;

use std::fmt;
use std::sync::OnceLock;

pub use ast::{Labels, Node};
pub use error::SelectorError;

/// A compiled selector. Immutable once built; its canonical text is rendered
/// lazily and cached.
#[derive(Debug)]
pub struct Selector {
    root: Node,
    rendered: OnceLock<String>,
}

impl Selector {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            rendered: OnceLock::new(),
        }
    }

    pub fn evaluate<L: Labels + ?Sized>(&self, labels: &L) -> bool {
        self.root.evaluate(labels)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Normalised text form. Used for audit and debug output only.
    pub fn canonical(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut out = String::new();
            self.root.render(&mut out);
            out
        })
    }
}

impl Clone for Selector {
    fn clone(&self) -> Self {
        Self::new(self.root.clone())
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for Selector {}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Compile `text` into a [`Selector`].
pub fn parse(text: &str) -> Result<Selector, SelectorError> {
    parser::parse_expression(text).map(Selector::new)
}
