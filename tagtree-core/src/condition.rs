//! # Condition Module
//!
//! A [`Condition`] is a boolean predicate over a [`TagSet`]. Leaves test tag
//! membership, composites combine their children with `and`, `or` and `not`.
//!
//! ```text
//! and(or(a, b), not(slow))
//!
//!            And
//!          /     \
//!        Or      Not
//!       /  \       \
//!  Contains Contains Contains
//!     a        b      slow
//! ```
//!
//! Conditions are usually produced by [`crate::parser::parse`], but they can
//! be built by hand as well:
//!
//! ```rust
//! use tagtree_core::{tag_set, Condition};
//!
//! let condition = Condition::And(vec![
//!     Condition::contains("api"),
//!     Condition::not(Condition::contains("slow")),
//! ]);
//! assert!(condition.should_run(&tag_set(["api", "unit"])));
//! assert!(!condition.should_run(&tag_set(["api", "slow"])));
//! ```
use itertools::Itertools;
use std::fmt;
use strum::IntoEnumIterator;

use crate::{Error, Result, Tag, TagSet};

/// Boolean condition over a set of tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// True iff the tag set contains the tag.
    Contains(Tag),
    /// True iff every child is true. No children means true.
    And(Vec<Condition>),
    /// True iff any child is true. No children means false.
    Or(Vec<Condition>),
    /// True iff the child is false. A missing child stands for an always-true
    /// condition, so `Not(None)` is false.
    Not(Option<Box<Condition>>),
}

impl Condition {
    /// Condition satisfied by every tag set, including the empty one.
    pub fn always() -> Condition {
        Condition::And(Vec::new())
    }

    pub fn contains(tag: impl Into<Tag>) -> Condition {
        Condition::Contains(tag.into())
    }

    pub fn not(child: Condition) -> Condition {
        Condition::Not(Some(Box::new(child)))
    }

    /// Returns true if this condition is the degenerate "no filter" condition.
    pub fn is_always(&self) -> bool {
        matches!(self, Condition::And(children) if children.is_empty())
    }

    /// Evaluate the condition against the effective tags of a test.
    pub fn should_run(&self, tags: &TagSet) -> bool {
        match self {
            Condition::Contains(tag) => tags.contains(tag),
            Condition::And(children) => children.iter().all(|child| child.should_run(tags)),
            Condition::Or(children) => children.iter().any(|child| child.should_run(tags)),
            Condition::Not(Some(child)) => !child.should_run(tags),
            Condition::Not(None) => false,
        }
    }

    /// Tags referenced by this condition, in order of first appearance.
    pub fn tags(&self) -> Vec<&str> {
        fn collect<'a>(condition: &'a Condition, out: &mut Vec<&'a str>) {
            match condition {
                Condition::Contains(tag) => {
                    if !out.contains(&tag.as_str()) {
                        out.push(tag);
                    }
                }
                Condition::And(children) | Condition::Or(children) => {
                    for child in children {
                        collect(child, out);
                    }
                }
                Condition::Not(Some(child)) => collect(child, out),
                Condition::Not(None) => {}
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Contains(tag) => write!(f, "{tag}"),
            Condition::And(children) => {
                write!(f, "{}({})", Operator::And, children.iter().join(", "))
            }
            Condition::Or(children) => {
                write!(f, "{}({})", Operator::Or, children.iter().join(", "))
            }
            Condition::Not(Some(child)) => write!(f, "{}({child})", Operator::Not),
            Condition::Not(None) => write!(f, "{}()", Operator::Not),
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Condition> {
        crate::parser::parse(s)
    }
}

/// Operators accepted in tag expressions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Operator {
    And,
    Or,
    Not,
}

impl Operator {
    /// Look up an operator by name. Matching is case-insensitive and ignores
    /// surrounding whitespace.
    pub fn from_name(name: &str) -> Result<Operator> {
        let name = name.trim();
        name.parse().map_err(|_| Error::UnsupportedOperator {
            name: name.to_string(),
            supported: Operator::supported(),
        })
    }

    /// Comma-separated list of every supported operator name.
    pub fn supported() -> String {
        Operator::iter().join(", ")
    }

    /// Build the composite condition for this operator from its operands.
    pub fn build(self, children: Vec<Condition>) -> Result<Condition> {
        match self {
            Operator::And => Ok(Condition::And(children)),
            Operator::Or => Ok(Condition::Or(children)),
            Operator::Not => {
                let count = children.len();
                let Ok([child]) = <[Condition; 1]>::try_from(children) else {
                    return Err(Error::NotArity { count });
                };
                Ok(Condition::not(child))
            }
        }
    }
}

/// Build the condition for the operator called `name`.
pub fn create(name: &str, children: Vec<Condition>) -> Result<Condition> {
    Operator::from_name(name)?.build(children)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag_set;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(&[] ; "empty set")]
    #[test_case(&["a"] ; "single tag")]
    #[test_case(&["a", "b", "c"] ; "many tags")]
    fn always_runs(tags: &[&str]) {
        assert!(Condition::always().should_run(&tag_set(tags.iter().copied())));
    }

    #[test_case(&["a"], true ; "present")]
    #[test_case(&["b"], false ; "absent")]
    #[test_case(&["A"], false ; "case sensitive")]
    fn contains(tags: &[&str], expected: bool) {
        let condition = Condition::contains("a");
        assert_eq!(condition.should_run(&tag_set(tags.iter().copied())), expected);
    }

    #[test]
    fn empty_composites() {
        let tags = tag_set(["a"]);
        assert!(Condition::And(vec![]).should_run(&tags));
        assert!(!Condition::Or(vec![]).should_run(&tags));
        assert!(!Condition::Not(None).should_run(&tags));
        assert!(!Condition::Not(None).should_run(&TagSet::new()));
    }

    #[test_case(&["a", "b"], true, true ; "both")]
    #[test_case(&["a"], false, true ; "left only")]
    #[test_case(&["b"], false, true ; "right only")]
    #[test_case(&[], false, false ; "neither")]
    fn and_or(tags: &[&str], and: bool, or: bool) {
        let tags = tag_set(tags.iter().copied());
        let children = vec![Condition::contains("a"), Condition::contains("b")];
        assert_eq!(Condition::And(children.clone()).should_run(&tags), and);
        assert_eq!(Condition::Or(children).should_run(&tags), or);
    }

    #[test]
    fn not_inverts_child() {
        let condition = Condition::not(Condition::contains("slow"));
        assert!(condition.should_run(&tag_set(["fast"])));
        assert!(!condition.should_run(&tag_set(["slow", "fast"])));
    }

    #[test_case("and", Operator::And ; "lowercase")]
    #[test_case("OR", Operator::Or ; "uppercase")]
    #[test_case("  Not ", Operator::Not ; "mixed case with whitespace")]
    fn operator_from_name(name: &str, expected: Operator) -> eyre::Result<()> {
        assert_eq!(Operator::from_name(name)?, expected);
        Ok(())
    }

    #[test]
    fn unsupported_operator_lists_supported_ones() {
        let err = create("xor", vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported operator \"xor\", supported operators are: and, or, not"
        );
    }

    #[test_case(0 ; "no operand")]
    #[test_case(2 ; "two operands")]
    fn not_arity(count: usize) {
        let children = (0..count)
            .map(|i| Condition::contains(i.to_string()))
            .collect();
        assert!(matches!(
            create("not", children),
            Err(Error::NotArity { count: c }) if c == count
        ));
    }

    #[test]
    fn and_or_accept_any_operand_count() -> eyre::Result<()> {
        assert_eq!(create("and", vec![])?, Condition::always());
        assert_eq!(create("or", vec![])?, Condition::Or(vec![]));
        assert_eq!(
            create("or", vec![Condition::contains("a")])?,
            Condition::Or(vec![Condition::contains("a")])
        );
        Ok(())
    }

    #[test]
    fn display() {
        let condition = Condition::And(vec![
            Condition::Or(vec![Condition::contains("a"), Condition::contains("b")]),
            Condition::not(Condition::contains("c")),
        ]);
        assert_eq!(condition.to_string(), "and(or(a, b), not(c))");
        assert_eq!(Condition::Not(None).to_string(), "not()");
    }

    #[test]
    fn referenced_tags() {
        let condition = Condition::Or(vec![
            Condition::contains("b"),
            Condition::And(vec![Condition::contains("a"), Condition::contains("b")]),
            Condition::not(Condition::contains("c")),
        ]);
        assert_eq!(condition.tags(), vec!["b", "a", "c"]);
    }
}
