//! # Tree Filters
//!
//! Filters rebuild a test specification, keeping only the tests whose
//! effective tags satisfy a predicate. Two filters exist:
//!
//! - [`ExpressionFilter`] evaluates a parsed tag expression
//! - [`TagSetFilter`] takes plain include and exclude tag lists
//!
//! ```text
//!  suite [api]                      effective tags
//!  ├── health [smoke]          -->  {api, smoke}
//!  └── users [slow]
//!      └── create_user [unit]  -->  {api, slow, unit}
//! ```
//!
//! Groups are never dropped by a filter, even when all of their tests are
//! filtered out. Use [`crate::prune::prune`] afterwards to remove them.
use std::borrow::Cow;
use tracing::*;

use crate::{
    condition::Condition,
    parser::parse,
    spec::{effective_tags, Group},
    Result, TagSet,
};

/// Test selection over effective tag sets.
pub trait TagFilter {
    /// Decide whether a test with the given effective tags is kept.
    fn should_run(&self, tags: &TagSet) -> bool;

    /// Returns true if the filter keeps everything, in which case [`apply`]
    /// hands back the input untouched.
    ///
    /// [`apply`]: TagFilter::apply
    fn is_identity(&self) -> bool {
        false
    }

    /// Filter a specification.
    fn apply<'a>(&self, spec: &'a Group) -> Cow<'a, Group> {
        if self.is_identity() {
            debug!("identity filter, keeping all {} test(s)", spec.test_count());
            return Cow::Borrowed(spec);
        }

        let filtered = filter_group(self, spec, &TagSet::new());
        debug!(
            "kept {} of {} test(s) in {:?}",
            filtered.test_count(),
            spec.test_count(),
            spec.name
        );
        Cow::Owned(filtered)
    }
}

fn filter_group<F>(filter: &F, group: &Group, parent_tags: &TagSet) -> Group
where
    F: TagFilter + ?Sized,
{
    let tags = effective_tags(parent_tags, &group.tags);

    let groups = group
        .groups
        .iter()
        .map(|child| filter_group(filter, child, &tags))
        .collect();

    let tests = group
        .tests
        .iter()
        .filter(|test| {
            let keep = filter.should_run(&effective_tags(&tags, &test.tags));
            trace!("{}::{} keep={keep}", group.name, test.name);
            keep
        })
        .cloned()
        .collect();

    group.rebuild(groups, tests)
}

impl TagFilter for Condition {
    fn should_run(&self, tags: &TagSet) -> bool {
        Condition::should_run(self, tags)
    }
}

/// Filter tests with a tag expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionFilter {
    expression: String,
    condition: Condition,
}

impl ExpressionFilter {
    /// Parse the expression and build the filter. An empty expression gives an
    /// identity filter.
    pub fn new(expression: impl Into<String>) -> Result<ExpressionFilter> {
        let expression = expression.into();
        let condition = parse(&expression)?;
        Ok(ExpressionFilter {
            expression,
            condition,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl TagFilter for ExpressionFilter {
    fn should_run(&self, tags: &TagSet) -> bool {
        self.condition.should_run(tags)
    }

    fn is_identity(&self) -> bool {
        self.expression.trim().is_empty()
    }
}

/// Filter tests with include and exclude tag lists.
///
/// A test runs if it carries at least one included tag (or nothing is
/// included) and none of the excluded tags. Exclusion always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSetFilter {
    tags: TagSet,
    excluded_tags: TagSet,
}

impl TagSetFilter {
    pub fn new(tags: TagSet, excluded_tags: TagSet) -> TagSetFilter {
        TagSetFilter {
            tags,
            excluded_tags,
        }
    }
}

impl TagFilter for TagSetFilter {
    fn should_run(&self, tags: &TagSet) -> bool {
        let included = self.tags.is_empty() || !tags.is_disjoint(&self.tags);
        included && tags.is_disjoint(&self.excluded_tags)
    }

    fn is_identity(&self) -> bool {
        self.tags.is_empty() && self.excluded_tags.is_empty()
    }
}

/// The filter selected for a run, see [`crate::config::RunTags::filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Expression(ExpressionFilter),
    TagSet(TagSetFilter),
}

impl TagFilter for Selector {
    fn should_run(&self, tags: &TagSet) -> bool {
        match self {
            Selector::Expression(filter) => filter.should_run(tags),
            Selector::TagSet(filter) => filter.should_run(tags),
        }
    }

    fn is_identity(&self) -> bool {
        match self {
            Selector::Expression(filter) => filter.is_identity(),
            Selector::TagSet(filter) => filter.is_identity(),
        }
    }
}
