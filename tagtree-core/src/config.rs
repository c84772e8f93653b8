//! # Configuration Module
//!
//! Handles loading the run configuration from `tagtree.toml` and the
//! environment. The run configuration decides which tests of a specification
//! are selected.
//!
//! ## Configuration Loading Flow (block diagram)
//!
//! ```text
//! +-------------------+     +-------------------+     +-------------------+
//! | TAGTREE_CONFIG    | --> | Path resolution   | --> | tagtree.toml file |
//! | (optional)        |     | or default ./     |     |                   |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//! +-------------------+     +-------------------+     +-------------------+
//! | Environment vars  | --> | TAGTREE_* keys    | --> | Config.run        |
//! | (.env supported)  |     | override file     |     | RunTags + prune   |
//! +-------------------+     +-------------------+     +-------------------+
//! ```
//!
//! ## Config File Location
//!
//! 1. If `TAGTREE_CONFIG` environment variable is set, load from that path
//! 2. Otherwise, load from `tagtree.toml` in the current directory
//!
//! ## Configuration Structure
//!
//! ```toml
//! [run]
//! # When set, the expression decides and `tags`/`excluded_tags` are ignored.
//! expression_tags = "and(api, not(slow))"
//! tags = ["smoke"]
//! excluded_tags = ["flaky"]
//! prune_empty_groups = true
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                     | Overrides                       |
//! |------------------------------|---------------------------------|
//! | `TAGTREE_EXPRESSION_TAGS`    | `run.expression_tags`           |
//! | `TAGTREE_TAGS`               | `run.tags` (comma-separated)    |
//! | `TAGTREE_EXCLUDED_TAGS`      | `run.excluded_tags` (comma-separated) |
//! | `TAGTREE_PRUNE_EMPTY_GROUPS` | `run.prune_empty_groups`        |
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{io::Read, path::Path};
use tracing::*;

use crate::{
    filter::{ExpressionFilter, Selector, TagFilter, TagSetFilter},
    prune::prune,
    spec::Group,
    Error, Result, TagSet,
};

/// Environment variable name for specifying the config file path.
const TAGTREE_CONFIG_ENV: &str = "TAGTREE_CONFIG";
const EXPRESSION_TAGS_ENV: &str = "TAGTREE_EXPRESSION_TAGS";
const TAGS_ENV: &str = "TAGTREE_TAGS";
const EXCLUDED_TAGS_ENV: &str = "TAGTREE_EXCLUDED_TAGS";
const PRUNE_EMPTY_GROUPS_ENV: &str = "TAGTREE_PRUNE_EMPTY_GROUPS";

static CONFIG: Lazy<Config> = Lazy::new(|| {
    let _ = dotenv::dotenv();
    Config::load().unwrap_or_else(|e| {
        warn!("falling back to the default configuration: {e}");
        Config::default()
    })
});

/// Get the process-wide configuration, loading it on first use.
pub fn get_config() -> &'static Config {
    &CONFIG
}

/// tagtree's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
}

/// Test selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    #[serde(flatten)]
    pub tags: RunTags,
    /// Remove groups left without tests after filtering.
    #[serde(default = "default_prune_empty_groups")]
    pub prune_empty_groups: bool,
}

fn default_prune_empty_groups() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            tags: RunTags::default(),
            prune_empty_groups: default_prune_empty_groups(),
        }
    }
}

/// Tags selecting the tests of a run.
///
/// A non-empty `expression_tags` selects the expression filter and the plain
/// `tags`/`excluded_tags` lists are ignored. Otherwise the lists are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunTags {
    pub expression_tags: String,
    pub tags: TagSet,
    pub excluded_tags: TagSet,
}

impl RunTags {
    /// Build the filter for the active mode. Fails if the tag expression is
    /// invalid.
    pub fn filter(&self) -> Result<Selector> {
        if !self.expression_tags.trim().is_empty() {
            if !self.tags.is_empty() || !self.excluded_tags.is_empty() {
                debug!("expression_tags is set, ignoring tags and excluded_tags");
            }
            return Ok(Selector::Expression(ExpressionFilter::new(
                self.expression_tags.as_str(),
            )?));
        }

        Ok(Selector::TagSet(TagSetFilter::new(
            self.tags.clone(),
            self.excluded_tags.clone(),
        )))
    }

    /// Filter a specification with the active mode, then optionally prune the
    /// groups left empty.
    pub fn apply(&self, spec: &Group, prune_empty_groups: bool) -> Result<Group> {
        let filtered = self.filter()?.apply(spec).into_owned();
        Ok(if prune_empty_groups {
            prune(filtered)
        } else {
            filtered
        })
    }
}

/// A `.toml` file name or anything containing a path separator. Values such
/// as `smoke` or `and(a,b)` are tag settings put in the wrong variable.
fn looks_like_path(path: &Path) -> bool {
    let text = path.to_string_lossy();
    path.extension().is_some_and(|ext| ext == "toml")
        || text.contains(std::path::MAIN_SEPARATOR)
        || text.contains('/')
}

/// Split a comma-separated tag list, skipping blank entries.
pub fn split_tags(value: &str) -> TagSet {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load tagtree configuration from path.
    fn load_from(path: &Path) -> Result<Config> {
        let Ok(mut file) = std::fs::File::open(path) else {
            debug!("{path:?} not found, using the default configuration");
            let mut cfg = Config::default();
            cfg.load_env()?;
            return Ok(cfg);
        };

        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .map_err(|e| Error::LoadError(e.to_string()))?;

        let mut cfg: Config = toml::from_str(&buf).map_err(|e| {
            Error::LoadError(format!(
                "failed to deserialize tagtree.toml into tagtree::Config: {e}"
            ))
        })?;

        debug!("tagtree.toml was successfully loaded: {cfg:#?}");

        cfg.load_env()?;

        Ok(cfg)
    }

    /// Load tagtree configuration.
    ///
    /// Loading order:
    /// 1. If `TAGTREE_CONFIG` env var is set, load from that path
    /// 2. Otherwise, load from `tagtree.toml` in the current directory
    pub fn load() -> Result<Config> {
        let Ok(value) = std::env::var(TAGTREE_CONFIG_ENV) else {
            return Config::load_from(Path::new("tagtree.toml"));
        };

        let path = Path::new(&value);
        if !looks_like_path(path) {
            return Err(Error::LoadError(format!(
                "{TAGTREE_CONFIG_ENV} should be a path to a config file, not a config value. \
                 Got: {value:?}. Use {EXPRESSION_TAGS_ENV}, {TAGS_ENV} or {EXCLUDED_TAGS_ENV} to select tests instead."
            )));
        }
        // Unlike the default location, an explicit path must exist.
        if !path.exists() {
            return Err(Error::LoadError(format!(
                "config file set by {TAGTREE_CONFIG_ENV} not found: {path:?}"
            )));
        }

        debug!("loading config from {TAGTREE_CONFIG_ENV}={path:?}");
        Config::load_from(path)
    }

    /// Override the run configuration with `TAGTREE_*` environment variables.
    fn load_env(&mut self) -> Result<()> {
        debug!("Loading run configuration from env");
        let run = &mut self.run;

        if let Ok(expression) = std::env::var(EXPRESSION_TAGS_ENV) {
            run.tags.expression_tags = expression;
        }
        if let Ok(tags) = std::env::var(TAGS_ENV) {
            run.tags.tags = split_tags(&tags);
        }
        if let Ok(tags) = std::env::var(EXCLUDED_TAGS_ENV) {
            run.tags.excluded_tags = split_tags(&tags);
        }
        if let Ok(prune) = std::env::var(PRUNE_EMPTY_GROUPS_ENV) {
            run.prune_empty_groups = prune.trim().parse().map_err(|e| {
                Error::LoadError(format!(
                    "{PRUNE_EMPTY_GROUPS_ENV} should be \"true\" or \"false\", got {prune:?}: {e}"
                ))
            })?;
        }

        debug!("run configuration loaded from env: {:#?}", self.run);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{spec::TestCase, tag_set};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use test_case::test_case;

    const ENV_VARS: [&str; 5] = [
        TAGTREE_CONFIG_ENV,
        EXPRESSION_TAGS_ENV,
        TAGS_ENV,
        EXCLUDED_TAGS_ENV,
        PRUNE_EMPTY_GROUPS_ENV,
    ];

    fn clear_env() {
        for key in ENV_VARS {
            std::env::remove_var(key);
        }
    }

    fn sample_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../tagtree-sample.toml")
    }

    fn suite() -> Group {
        Group::new("suite")
            .with_group(
                Group::new("users")
                    .with_tags(["slow"])
                    .with_test(TestCase::new("create_user").with_tags(["unit"])),
            )
            .with_group(
                Group::new("billing").with_test(TestCase::new("invoice").with_tags(["flaky"])),
            )
    }

    #[test]
    #[serial]
    fn load_config() -> eyre::Result<()> {
        clear_env();
        let cfg = Config::load_from(&sample_path())?;
        assert_eq!(cfg, Config::default());
        assert!(cfg.run.prune_empty_groups);
        Ok(())
    }

    #[test]
    #[serial]
    fn missing_file_gives_default() -> eyre::Result<()> {
        clear_env();
        let cfg = Config::load_from(Path::new("/nonexistent/tagtree.toml"))?;
        assert_eq!(cfg, Config::default());
        Ok(())
    }

    #[test]
    fn deserialize_run_section() -> eyre::Result<()> {
        let cfg: Config = toml::from_str(
            r#"
            [run]
            expression_tags = "and(api, not(slow))"
            tags = ["smoke", "smoke", "unit"]
            prune_empty_groups = false
            "#,
        )?;
        assert_eq!(cfg.run.tags.expression_tags, "and(api, not(slow))");
        assert_eq!(cfg.run.tags.tags, tag_set(["smoke", "unit"]));
        assert!(cfg.run.tags.excluded_tags.is_empty());
        assert!(!cfg.run.prune_empty_groups);
        Ok(())
    }

    #[test]
    #[serial]
    fn env_overrides_file() -> eyre::Result<()> {
        clear_env();
        std::env::set_var(EXPRESSION_TAGS_ENV, "or(a, b)");
        std::env::set_var(TAGS_ENV, "smoke, unit,,");
        std::env::set_var(EXCLUDED_TAGS_ENV, "flaky");
        std::env::set_var(PRUNE_EMPTY_GROUPS_ENV, "false");
        let cfg = Config::load_from(&sample_path());
        clear_env();

        let cfg = cfg?;
        assert_eq!(cfg.run.tags.expression_tags, "or(a, b)");
        assert_eq!(cfg.run.tags.tags, tag_set(["smoke", "unit"]));
        assert_eq!(cfg.run.tags.excluded_tags, tag_set(["flaky"]));
        assert!(!cfg.run.prune_empty_groups);
        Ok(())
    }

    #[test]
    #[serial]
    fn invalid_prune_flag() {
        clear_env();
        std::env::set_var(PRUNE_EMPTY_GROUPS_ENV, "sometimes");
        let result = Config::load_from(&sample_path());
        clear_env();

        let err = result.unwrap_err().to_string();
        assert!(err.contains(PRUNE_EMPTY_GROUPS_ENV), "{err}");
    }

    #[test]
    fn expression_mode_wins() -> eyre::Result<()> {
        let run = RunTags {
            expression_tags: "unit".into(),
            tags: tag_set(["flaky"]),
            excluded_tags: tag_set(["slow"]),
        };
        assert!(matches!(run.filter()?, Selector::Expression(_)));

        let filtered = run.apply(&suite(), true)?;
        let names: Vec<_> = filtered
            .effective_tests()
            .iter()
            .map(|t| t.full_name())
            .collect();
        assert_eq!(names, vec!["suite::users::create_user"]);
        Ok(())
    }

    #[test]
    fn tag_set_mode_without_expression() -> eyre::Result<()> {
        let run = RunTags {
            expression_tags: "  ".into(),
            tags: TagSet::new(),
            excluded_tags: tag_set(["slow"]),
        };
        assert!(matches!(run.filter()?, Selector::TagSet(_)));

        let filtered = run.apply(&suite(), true)?;
        assert_eq!(filtered.groups.len(), 1);
        assert_eq!(filtered.groups[0].name, "billing");
        Ok(())
    }

    #[test_case(true, 1 ; "pruned")]
    #[test_case(false, 2 ; "not pruned")]
    fn apply_prunes_on_request(prune_empty_groups: bool, groups: usize) -> eyre::Result<()> {
        let run = RunTags {
            expression_tags: "flaky".into(),
            ..Default::default()
        };
        let filtered = run.apply(&suite(), prune_empty_groups)?;
        assert_eq!(filtered.groups.len(), groups);
        assert_eq!(filtered.test_count(), 1);
        Ok(())
    }

    #[test]
    fn invalid_expression_is_a_configuration_error() {
        let run = RunTags {
            expression_tags: "and(a".into(),
            ..Default::default()
        };
        let err = run.apply(&suite(), true).unwrap_err();
        assert!(err.is_expression_error());
    }

    #[test_case("a,b", &["a", "b"] ; "plain")]
    #[test_case(" a , b ", &["a", "b"] ; "whitespace")]
    #[test_case("a,,a", &["a"] ; "blank and duplicate")]
    #[test_case("", &[] ; "empty")]
    fn split(value: &str, expected: &[&str]) {
        assert_eq!(split_tags(value), tag_set(expected.iter().copied()));
    }

    mod tagtree_config_env {
        use super::{clear_env, tag_set, Config, TAGS_ENV, TAGTREE_CONFIG_ENV};
        use pretty_assertions::assert_eq;
        use serial_test::serial;
        use test_case::test_case;

        #[test]
        #[serial]
        fn path_from_env_is_loaded_and_env_still_applies() -> eyre::Result<()> {
            clear_env();
            std::env::set_var(TAGTREE_CONFIG_ENV, super::sample_path());
            std::env::set_var(TAGS_ENV, "smoke");
            let cfg = Config::load();
            clear_env();

            let mut expected = Config::default();
            expected.run.tags.tags = tag_set(["smoke"]);
            assert_eq!(cfg?, expected);
            Ok(())
        }

        #[test]
        #[serial]
        fn missing_file_from_env_is_an_error() {
            clear_env();
            std::env::set_var(TAGTREE_CONFIG_ENV, "/nonexistent/path/tagtree.toml");
            let result = Config::load();
            clear_env();

            let err = result.unwrap_err().to_string();
            assert!(err.contains("not found"), "{err}");
        }

        #[test_case("true" ; "boolean value")]
        #[test_case("and(a,b)" ; "expression value")]
        #[test_case("smoke" ; "tag value")]
        #[serial]
        fn error_when_value_looks_like_config_value(value: &str) {
            clear_env();
            std::env::set_var(TAGTREE_CONFIG_ENV, value);
            let result = Config::load();
            std::env::remove_var(TAGTREE_CONFIG_ENV);

            let err = result.unwrap_err().to_string();
            assert!(err.contains("should be a path"), "error should guide user: {err}");
            assert!(err.contains(TAGS_ENV), "error should name the tag variables: {err}");
        }

        #[test_case("config.toml" ; "toml extension")]
        #[test_case("./tagtree.toml" ; "relative path with dot")]
        #[test_case("configs/tagtree.toml" ; "path with separator")]
        #[serial]
        fn accepts_valid_path_patterns(value: &str) {
            clear_env();
            std::env::set_var(TAGTREE_CONFIG_ENV, value);
            let result = Config::load();
            std::env::remove_var(TAGTREE_CONFIG_ENV);

            // Passes the path check and only then fails on the missing file.
            let err = result.unwrap_err().to_string();
            assert!(err.contains("not found"), "{value:?} should pass the path check: {err}");
        }
    }
}
