//! # Tagtree - Tag Expression Test Selection
//!
//! Tagtree selects tests from a hierarchical test specification. Tests and
//! groups carry tags, groups pass their tags down to everything they contain,
//! and a tag expression or a plain include/exclude list decides which tests
//! are kept.
//!
//! ## Quick Start
//!
//! ```rust
//! use tagtree::{parse, prune, tag_set, Group, TagFilter, TestCase};
//!
//! let spec = Group::new("suite")
//!     .with_tags(["api"])
//!     .with_test(TestCase::new("health").with_tags(["smoke"]))
//!     .with_group(
//!         Group::new("users")
//!             .with_tags(["slow"])
//!             .with_test(TestCase::new("create_user").with_tags(["unit"])),
//!     );
//!
//! let condition = parse("and(api, not(slow))").unwrap();
//! assert!(condition.should_run(&tag_set(["api", "smoke"])));
//!
//! let selected = prune(condition.apply(&spec).into_owned());
//! assert_eq!(selected.test_count(), 1);
//! assert!(selected.groups.is_empty());
//! ```
//!
//! ## Tag Expressions
//!
//! | Expression             | Selects tests tagged                  |
//! |------------------------|---------------------------------------|
//! | `smoke`                | `smoke`                               |
//! | `and(api, unit)`       | both `api` and `unit`                 |
//! | `or(unit; integration)`| `unit` or `integration`               |
//! | `not(slow)`            | anything but `slow`                   |
//! | *(empty)*              | everything                            |
//!
//! Operator names are case-insensitive and both `,` and `;` separate
//! operands. Tags can't contain `(`, `)`, `,` or `;`.
//!
//! ## Command Line
//!
//! ```bash
//! tagtree ls --spec suite.toml -e "and(api, not(slow))"
//! tagtree ls --spec suite.json --tags smoke,unit --exclude flaky
//! tagtree check "or(unit, integration)"
//! ```

mod app;

// Re-export error handling crates for user convenience
pub use eyre;

// Re-export main application struct
pub use app::{render, App};

// Re-export core functionality
pub use tagtree_core::{
    condition::{self, Condition, Operator},
    config::{get_config, Config, RunConfig, RunTags},
    error::{Error, Result},
    filter::{ExpressionFilter, Selector, TagFilter, TagSetFilter},
    parse, prune,
    spec::{self, EffectiveTest, Group, TestCase},
    tag_set, Tag, TagSet,
};
