use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read-only view of a label map consulted by a selector.
pub trait Labels {
    /// Value of `name`, or `None` when the label is absent.
    fn get_label(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Labels for HashMap<String, String, S> {
    fn get_label(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Labels for BTreeMap<String, String> {
    fn get_label(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Sorted, de-duplicated literal set used by `in` / `not in`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringSet(Vec<String>);

impl StringSet {
    pub fn from_values(mut values: Vec<String>) -> Self {
        values.sort();
        values.dedup();
        Self(values)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0
            .binary_search_by(|probe| probe.as_str().cmp(value))
            .is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Binary label comparisons taking a single string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Contains,
    StartsWith,
    EndsWith,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => " == ",
            CompareOp::Ne => " != ",
            CompareOp::Contains => " contains ",
            CompareOp::StartsWith => " starts with ",
            CompareOp::EndsWith => " ends with ",
        }
    }

    /// Result when the label is missing. Negative operators hold vacuously.
    fn when_absent(self) -> bool {
        matches!(self, CompareOp::Ne)
    }

    fn apply(self, actual: &str, expected: &str) -> bool {
        match self {
            CompareOp::Eq => actual == expected,
            CompareOp::Ne => actual != expected,
            CompareOp::Contains => actual.contains(expected),
            CompareOp::StartsWith => actual.starts_with(expected),
            CompareOp::EndsWith => actual.ends_with(expected),
        }
    }
}

/// Compiled selector expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Compare {
        label: String,
        op: CompareOp,
        value: String,
    },
    In {
        label: String,
        values: StringSet,
    },
    NotIn {
        label: String,
        values: StringSet,
    },
    Has(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    All,
    Global,
}

impl Node {
    pub fn evaluate<L: Labels + ?Sized>(&self, labels: &L) -> bool {
        match self {
            Node::Compare { label, op, value } => match labels.get_label(label) {
                Some(actual) => op.apply(actual, value),
                None => op.when_absent(),
            },
            Node::In { label, values } => labels
                .get_label(label)
                .is_some_and(|actual| values.contains(actual)),
            Node::NotIn { label, values } => labels
                .get_label(label)
                .is_none_or(|actual| !values.contains(actual)),
            Node::Has(label) => labels.get_label(label).is_some(),
            Node::Not(operand) => !operand.evaluate(labels),
            Node::And(operands) => operands.iter().all(|n| n.evaluate(labels)),
            Node::Or(operands) => operands.iter().any(|n| n.evaluate(labels)),
            Node::All | Node::Global => true,
        }
    }

    /// Append the canonical text form of this node to `out`.
    pub(crate) fn render(&self, out: &mut String) {
        match self {
            Node::Compare { label, op, value } => {
                out.push_str(label);
                out.push_str(op.symbol());
                push_quoted(out, value);
            }
            Node::In { label, values } => render_set(out, label, "in", values),
            Node::NotIn { label, values } => render_set(out, label, "not in", values),
            Node::Has(label) => {
                out.push_str("has(");
                out.push_str(label);
                out.push(')');
            }
            Node::Not(operand) => {
                out.push('!');
                operand.render(out);
            }
            Node::And(operands) => render_joined(out, operands, " && "),
            Node::Or(operands) => render_joined(out, operands, " || "),
            Node::All => out.push_str("all()"),
            Node::Global => out.push_str("global()"),
        }
    }
}

fn push_quoted(out: &mut String, value: &str) {
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

fn render_set(out: &mut String, label: &str, op: &str, values: &StringSet) {
    out.push_str(label);
    out.push(' ');
    out.push_str(op);
    out.push_str(" {");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        push_quoted(out, value);
    }
    out.push('}');
}

fn render_joined(out: &mut String, operands: &[Node], separator: &str) {
    out.push('(');
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        operand.render(out);
    }
    out.push(')');
}
