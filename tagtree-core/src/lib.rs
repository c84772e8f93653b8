//! # Tagtree Core
//!
//! Tag based test selection for hierarchical test specifications.
//!
//! This crate provides:
//! - A parser compiling tag expressions such as `and(api, not(slow))` into a
//!   [`Condition`] tree
//! - Tree filters rebuilding a test specification with only the tests whose
//!   inherited tags satisfy the condition, or a plain include/exclude list
//! - A pruning pass removing groups left empty by filtering
//! - Run configuration loaded from `tagtree.toml` and the environment
//!
//! ## Architecture (block diagram)
//!
//! ```text
//! +---------------------+      +---------------------+      +---------------------+
//! | expression string   | ---> | parser              | ---> | Condition tree      |
//! | "and(a, not(b))"    |      | (frame stack)       |      | And/Or/Not/Contains |
//! +---------------------+      +---------------------+      +---------------------+
//!                                                                     |
//!                                                                     v
//! +---------------------+      +---------------------+      +---------------------+
//! | test specification  | ---> | tree filter         | ---> | prune               |
//! | Group / TestCase    |      | (tag inheritance)   |      | (empty groups)      |
//! +---------------------+      +---------------------+      +---------------------+
//!                                        ^
//!                                        |
//! +---------------------+      +---------------------+
//! | tagtree.toml + env  | ---> | RunTags             |
//! |                     |      | expression or lists |
//! +---------------------+      +---------------------+
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tagtree_core::{prune, ExpressionFilter, Group, TagFilter, TestCase};
//!
//! let spec = Group::new("suite")
//!     .with_group(
//!         Group::new("users")
//!             .with_tags(["slow"])
//!             .with_test(TestCase::new("create_user").with_tags(["unit"])),
//!     )
//!     .with_test(TestCase::new("health").with_tags(["smoke"]));
//!
//! let filter = ExpressionFilter::new("and(slow, unit)").unwrap();
//! let filtered = prune(filter.apply(&spec).into_owned());
//! assert_eq!(filtered.test_count(), 1);
//! ```
//!
//! Most users should use the main `tagtree` crate rather than importing
//! `tagtree-core` directly.

pub mod condition;
pub mod config;
pub mod error;
pub mod filter;
pub mod parser;
pub mod prune;
pub mod spec;

/// A tag attached to a test or group. Tags are case-sensitive.
pub type Tag = String;

/// A set of tags. Equality ignores insertion order.
pub type TagSet = indexmap::IndexSet<Tag>;

/// Build a [`TagSet`] from anything yielding tags.
pub fn tag_set<I, T>(tags: I) -> TagSet
where
    I: IntoIterator<Item = T>,
    T: Into<Tag>,
{
    tags.into_iter().map(Into::into).collect()
}

pub use condition::{Condition, Operator};
pub use config::{get_config, Config, RunConfig, RunTags};
pub use error::{Error, Result};
pub use filter::{ExpressionFilter, Selector, TagFilter, TagSetFilter};
pub use parser::parse;
pub use prune::prune;
pub use spec::{EffectiveTest, Group, TestCase};
