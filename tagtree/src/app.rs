use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};
use console::{style, Term};
use eyre::{OptionExt, WrapErr};
use itertools::Itertools;
use std::{path::PathBuf, str::FromStr};
use tagtree_core::{config::split_tags, spec::effective_tags, Config, Group, RunTags, TagSet};
use tracing::*;
use tracing_subscriber::EnvFilter;

use crate::{get_config, parse};

/// Build the CLI with clap's builder pattern
fn build_cli() -> ClapCommand {
    ClapCommand::new("tagtree")
        .about("tagtree selects tests from a test specification with tag expressions")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg(Arg::new("color")
            .long("color")
            .help("Produce color output. Default is \"auto\" [env: CARGO_TERM_COLOR]")
            .global(true)
            .value_parser(["auto", "always", "never"]))
        .arg(Arg::new("log-level")
            .long("log-level")
            .help("Log level filter. RUST_LOG takes precedence when set")
            .global(true)
            .default_value("warn"))
        .subcommand(
            ClapCommand::new("ls")
                .about("List the tests selected by the run tags")
                .arg(Arg::new("spec")
                    .short('s')
                    .long("spec")
                    .help("Test specification file (.toml or .json)")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)))
                .arg(Arg::new("expression")
                    .short('e')
                    .long("expression")
                    .help("Tag expression, e.g. \"and(api, not(slow))\". Overrides run.expression_tags"))
                .arg(Arg::new("tags")
                    .short('t')
                    .long("tags")
                    .help("Run tests carrying any of these tags, in comma-separated string. e.g. --tags smoke,unit")
                    .value_delimiter(',')
                    .action(ArgAction::Append))
                .arg(Arg::new("exclude")
                    .short('x')
                    .long("exclude")
                    .help("Skip tests carrying any of these tags, in comma-separated string. e.g. --exclude slow")
                    .value_delimiter(',')
                    .action(ArgAction::Append))
                .arg(Arg::new("no-prune")
                    .long("no-prune")
                    .help("Keep groups left without tests")
                    .action(ArgAction::SetTrue))
        )
        .subcommand(
            ClapCommand::new("check")
                .about("Parse a tag expression and print its canonical form")
                .arg(Arg::new("expression")
                    .help("Tag expression to check")
                    .required(true))
        )
}

/// tagtree CLI.
pub struct App {
    cfg: Config,
}

impl Default for App {
    fn default() -> App {
        App::new()
    }
}

impl App {
    pub fn new() -> App {
        App::with_config(get_config().clone())
    }

    pub fn with_config(cfg: Config) -> App {
        App { cfg }
    }

    /// Parse command-line args and run tagtree CLI sub command.
    pub fn run(self) -> eyre::Result<()> {
        let matches = build_cli().get_matches();
        color_eyre::install()?;
        self.dispatch(&matches)
    }

    fn dispatch(&self, matches: &ArgMatches) -> eyre::Result<()> {
        let log_level = matches
            .get_one::<String>("log-level")
            .map(String::as_str)
            .unwrap_or("warn");
        init_tracing(log_level);
        apply_color(matches.get_one::<String>("color"));

        let term = Term::stdout();

        match matches.subcommand() {
            Some(("ls", ls_matches)) => {
                let path = ls_matches
                    .get_one::<PathBuf>("spec")
                    .ok_or_eyre("--spec is required")?;
                let spec = Group::load(path)
                    .wrap_err_with(|| format!("failed to load {}", path.display()))?;
                let (run_tags, prune_empty_groups) = self.run_tags(ls_matches);
                debug!("selecting tests with {run_tags:?}, prune={prune_empty_groups}");

                let selected = run_tags
                    .apply(&spec, prune_empty_groups)
                    .wrap_err("invalid run tags")?;
                for line in render(&selected) {
                    term.write_line(&line)?;
                }
                term.write_line(&format!(
                    "{} of {} test(s) selected",
                    selected.test_count(),
                    spec.test_count()
                ))?;
                Ok(())
            }
            Some(("check", check_matches)) => {
                let expression = check_matches
                    .get_one::<String>("expression")
                    .ok_or_eyre("expression is required")?;
                let condition = parse(expression).wrap_err("invalid tag expression")?;
                if condition.is_always() {
                    term.write_line("empty expression, every test is selected")?;
                } else {
                    term.write_line(&condition.to_string())?;
                    term.write_line(&format!(
                        "{} {}",
                        style("tags:").dim(),
                        condition.tags().iter().join(", ")
                    ))?;
                }
                Ok(())
            }
            _ => unreachable!("Subcommand required is set to true"),
        }
    }

    /// Merge `ls` flags over the configured run tags. Passing `--tags` or
    /// `--exclude` without `--expression` switches to the tag list mode.
    fn run_tags(&self, matches: &ArgMatches) -> (RunTags, bool) {
        let mut run_tags = self.cfg.run.tags.clone();
        // Blank entries are dropped, as in TAGTREE_TAGS.
        let tag_list = |id: &str| {
            matches
                .get_many::<String>(id)
                .map(|vals| vals.flat_map(|v| split_tags(v)).collect::<TagSet>())
        };
        let tags = tag_list("tags");
        let excluded_tags = tag_list("exclude");

        if tags.is_some() || excluded_tags.is_some() {
            run_tags.expression_tags.clear();
        }
        if let Some(tags) = tags {
            run_tags.tags = tags;
        }
        if let Some(excluded_tags) = excluded_tags {
            run_tags.excluded_tags = excluded_tags;
        }
        if let Some(expression) = matches.get_one::<String>("expression") {
            run_tags.expression_tags = expression.clone();
        }

        let prune_empty_groups = self.cfg.run.prune_empty_groups && !matches.get_flag("no-prune");
        (run_tags, prune_empty_groups)
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Ignore the error raised when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_color(color_command: Option<&String>) {
    let color_command = color_command.and_then(|s| Color::from_str(s).ok());
    let color_env = std::env::var("CARGO_TERM_COLOR");
    let color = match (color_command, color_env) {
        (color @ Some(Color::Always), _) => color,
        (color @ Some(Color::Never), _) => color,
        (None, Ok(color)) => Color::from_str(&color).ok(),
        _ => None,
    };
    match color {
        Some(Color::Always) => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        Some(Color::Never) => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        _ => {}
    }
}

/// Render a specification as an indented tree. Groups show their own tags,
/// tests show their effective tags.
pub fn render(spec: &Group) -> Vec<String> {
    fn format_tags(tags: &TagSet) -> String {
        if tags.is_empty() {
            return String::new();
        }
        format!(" {}", style(format!("[{}]", tags.iter().join(", "))).dim())
    }

    fn walk(group: &Group, parent_tags: &TagSet, depth: usize, out: &mut Vec<String>) {
        let tags = effective_tags(parent_tags, &group.tags);
        let indent = "  ".repeat(depth);
        out.push(format!(
            "{indent}* {}{}",
            style(&group.name).bold(),
            format_tags(&group.tags)
        ));
        for test in &group.tests {
            let ignored = if test.ignored {
                format!(" {}", style("(ignored)").yellow())
            } else {
                String::new()
            };
            out.push(format!(
                "{indent}  - {}{}{ignored}",
                test.name,
                format_tags(&effective_tags(&tags, &test.tags))
            ));
        }
        for child in &group.groups {
            walk(child, &tags, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(spec, &TagSet::new(), 0, &mut out);
    out
}

#[derive(Debug, Clone, Default, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}
