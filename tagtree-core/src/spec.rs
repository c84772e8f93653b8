//! # Test Specification
//!
//! The hierarchical test specification produced by test registration: a root
//! [`Group`] holding nested groups and [`TestCase`]s, each carrying the tags
//! attached to it directly. Tags are inherited downwards, so the effective tags
//! of a test are its own tags plus the tags of every enclosing group.
//!
//! Specifications are plain values. Filtering never mutates them; every pass
//! returns a rebuilt copy, which allows one specification to be filtered under
//! many different configurations.
//!
//! ## File format
//!
//! A specification can be loaded from TOML or JSON:
//!
//! ```toml
//! name = "suite"
//! tags = ["api"]
//!
//! [[groups]]
//! name = "users"
//! tags = ["slow"]
//!
//! [[groups.tests]]
//! name = "create_user"
//! tags = ["unit"]
//! ```
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::*;

use crate::{Error, Result, Tag, TagSet};

/// A group of tests and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Tags attached directly to this group.
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestCase>,
}

/// A single test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    /// Tags attached directly to this test.
    #[serde(default, skip_serializing_if = "TagSet::is_empty")]
    pub tags: TagSet,
    /// Marked as ignored at registration. Carried through filtering untouched.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
}

/// A test together with its position in the tree and its effective tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveTest<'a> {
    /// Names of the enclosing groups, outermost first, root included.
    pub path: Vec<&'a str>,
    pub test: &'a TestCase,
    pub tags: TagSet,
}

impl EffectiveTest<'_> {
    /// Test name qualified by its group path, e.g. `suite::users::create_user`.
    pub fn full_name(&self) -> String {
        let mut name = self.path.join("::");
        if !name.is_empty() {
            name.push_str("::");
        }
        name.push_str(&self.test.name);
        name
    }
}

/// Union of inherited tags and a node's own tags.
pub fn effective_tags(parent: &TagSet, own: &TagSet) -> TagSet {
    let mut tags = parent.clone();
    tags.extend(own.iter().cloned());
    tags
}

impl Group {
    pub fn new(name: impl Into<String>) -> Group {
        Group {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Group
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_group(mut self, group: Group) -> Group {
        self.groups.push(group);
        self
    }

    pub fn with_test(mut self, test: TestCase) -> Group {
        self.tests.push(test);
        self
    }

    /// Copy of this group with every attribute preserved except its children.
    pub fn rebuild(&self, groups: Vec<Group>, tests: Vec<TestCase>) -> Group {
        Group {
            name: self.name.clone(),
            tags: self.tags.clone(),
            groups,
            tests,
        }
    }

    /// Returns true if the group has neither child groups nor tests.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.tests.is_empty()
    }

    /// Number of tests in this group and all of its descendants.
    pub fn test_count(&self) -> usize {
        self.tests.len() + self.groups.iter().map(Group::test_count).sum::<usize>()
    }

    /// Every test in the tree, depth first with a group's own tests before its
    /// child groups, paired with its effective tags.
    pub fn effective_tests(&self) -> Vec<EffectiveTest<'_>> {
        fn walk<'a>(
            group: &'a Group,
            parent_tags: &TagSet,
            path: &mut Vec<&'a str>,
            out: &mut Vec<EffectiveTest<'a>>,
        ) {
            let tags = effective_tags(parent_tags, &group.tags);
            path.push(&group.name);
            for test in &group.tests {
                out.push(EffectiveTest {
                    path: path.clone(),
                    test,
                    tags: effective_tags(&tags, &test.tags),
                });
            }
            for child in &group.groups {
                walk(child, &tags, path, out);
            }
            path.pop();
        }

        let mut out = Vec::new();
        walk(self, &TagSet::new(), &mut Vec::new(), &mut out);
        out
    }

    /// Load a specification from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Group> {
        let path = path.as_ref();
        let spec_error = |reason: String| Error::SpecLoad {
            path: path.display().to_string(),
            reason,
        };

        let buf = std::fs::read_to_string(path).map_err(|e| spec_error(e.to_string()))?;
        let group: Group = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&buf).map_err(|e| spec_error(e.to_string()))?,
            Some("json") => serde_json::from_str(&buf).map_err(|e| spec_error(e.to_string()))?,
            other => {
                return Err(spec_error(format!(
                    "unsupported file extension {other:?}, expected \"toml\" or \"json\""
                )))
            }
        };

        debug!(
            "loaded test specification {path:?} with {} test(s)",
            group.test_count()
        );
        Ok(group)
    }
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> TestCase {
        TestCase {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> TestCase
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn ignored(mut self) -> TestCase {
        self.ignored = true;
        self
    }
}
