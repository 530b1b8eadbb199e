//! NoteMover CLI
//!
//! One-shot routing commands and settings editing.

use anyhow::{Context, Result};
use clap::Parser;
use notemover::config::{Category, Direction, Settings};
use notemover::vault::MetadataSource;
use notemover::{FsMover, RouteOutcome, Router, Trigger, Vault};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "notemover")]
#[command(author, version, about = "Move notes into folders by tags, frontmatter and title")]
struct Cli {
    /// Path to settings file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Vault root directory
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    vault: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Show desktop notifications (always on for `move`)
    #[arg(long, global = true)]
    notify: bool,

    #[command(subcommand)]
    command: Commands,
}

/// 1-based position as shown by `list`
type Position = u32;

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List rule groups and excluded folders
    List,

    /// Validate settings file
    Check,

    /// Show trigger mode and counts
    Status,

    /// Evaluate every note in the vault (dry-run by default)
    Run {
        /// Actually move notes (not just dry-run)
        #[arg(long)]
        apply: bool,
    },

    /// Evaluate and move one note
    Move {
        /// Note to move
        file: PathBuf,
    },

    /// Switch between automatic and manual triggering
    Toggle,

    /// Rewrite the settings file in the current schema
    Migrate,

    /// Edit rule groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Edit rules inside a group
    #[command(subcommand)]
    Rule(RuleCommand),

    /// Edit excluded folders
    #[command(subcommand)]
    Exclude(ExcludeCommand),

    /// Choose literal or regex matching for tags and excluded folders
    Regex {
        /// Match rule tags as regular expressions
        #[arg(long)]
        tags: Option<bool>,

        /// Match excluded folders as regular expressions
        #[arg(long)]
        excluded: Option<bool>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum GroupCommand {
    /// Append a group with an empty rule
    Add { folder: String },
    /// Delete a group
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
    },
    /// Move a group up one position
    Up {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
    },
    /// Move a group down one position
    Down {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
    },
    /// Change a group's destination folder
    Folder {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
        folder: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum RuleCommand {
    /// Append an empty rule to a group
    Add {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
    },
    /// Delete a rule
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        rule: Position,
    },
    /// Replace a rule's criteria (comma separated)
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        group: Position,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        rule: Position,
        /// Tags, e.g. "#project, #work"
        #[arg(long)]
        tags: Option<String>,
        /// Frontmatter key:value pairs, e.g. "status: Done, type: project"
        #[arg(long)]
        properties: Option<String>,
        /// Title regular expressions
        #[arg(long)]
        patterns: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ExcludeCommand {
    /// Append an excluded folder
    Add { folder: String },
    /// Delete an excluded folder
    Remove {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: Position,
    },
    /// Move an excluded folder up one position
    Up {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: Position,
    },
    /// Move an excluded folder down one position
    Down {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: Position,
    },
    /// Change an excluded folder
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        index: Position,
        folder: String,
    },
}

fn idx(position: Position) -> usize {
    position as usize - 1
}

fn open_vault(dir: &Path) -> Result<Vault> {
    let root = notemover::expand_path(dir);
    let root = std::fs::canonicalize(&root)
        .with_context(|| format!("Vault not found: {}", root.display()))?;
    Ok(Vault::new(root))
}

/// Load, change and persist settings in one step
fn edit(
    config: Option<&Path>,
    change: impl FnOnce(&mut Settings) -> Result<String>,
) -> Result<()> {
    let mut settings = Settings::load(config)?;
    let message = change(&mut settings)?;
    settings.save(config)?;
    println!("✓ {}", message);
    Ok(())
}

/// An explicit `move` always reports why a note stayed put
fn notifications_wanted(cli: &Cli) -> bool {
    cli.notify || matches!(cli.command, Commands::Move { .. })
}

fn print_settings(settings: &Settings) {
    let on_off = |b: bool| if b { "on" } else { "off" };
    println!(
        "Trigger: {} {}  Tag regex: {}  Excluded regex: {}",
        settings.trigger_auto_manual,
        settings.trigger_auto_manual.indicator(),
        on_off(settings.use_regex_to_check_for_tags),
        on_off(settings.use_regex_to_check_for_excluded_folder),
    );

    let list = |values: &[String]| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.join(", ")
        }
    };

    println!("Rule groups:");
    for (g, group) in settings.groups.iter().enumerate() {
        let folder = if group.folder.is_empty() {
            "(vault root)"
        } else {
            group.folder.as_str()
        };
        println!("  [{}] {}", g + 1, folder);
        for (r, rule) in group.rules.iter().enumerate() {
            if rule.is_inert() {
                println!("      {}. (empty rule, never matches)", r + 1);
            } else {
                println!(
                    "      {}. tags: {} | properties: {} | patterns: {}",
                    r + 1,
                    list(&rule.tags),
                    list(&rule.frontmatter_properties),
                    list(&rule.patterns)
                );
            }
        }
    }

    println!("Excluded folders:");
    for (i, entry) in settings.excluded.iter().enumerate() {
        if !entry.folder.is_empty() {
            println!("  [{}] {}", i + 1, entry.folder);
        }
    }
}

fn print_outcome(path: &str, outcome: &RouteOutcome) {
    match outcome {
        RouteOutcome::WouldMove { folder } => println!("  [dry-run] {} -> {}", path, folder),
        RouteOutcome::Moved { to, .. } => println!("  Moved: {} -> {}", path, to),
        RouteOutcome::AlreadyInPlace { folder } => {
            println!("  In place: {} (already in {})", path, folder)
        }
        RouteOutcome::MoveFailed { folder, error } => {
            eprintln!("  Failed: {} -> {}: {}", path, folder, error)
        }
        RouteOutcome::Disabled => eprintln!("  Skipped: {} is disabled in the frontmatter", path),
        _ => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("NOTEMOVER_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    notemover::notifications::init(notifications_wanted(&cli));
    let config = cli.config.as_deref();

    match cli.command {
        Commands::List => {
            let settings = Settings::load(config)?;
            print_settings(&settings);
        }
        Commands::Check => match Settings::load(config) {
            Ok(settings) => {
                println!("✓ Settings are valid");
                println!("  {} rule groups", settings.groups.len());
                println!("  {} rules", settings.rule_count());
                let issues = notemover::rules::check_regexes(&settings);
                for issue in &issues {
                    println!(
                        "  ⚠ {}: \"{}\" never matches ({})",
                        issue.location, issue.value, issue.reason
                    );
                }
            }
            Err(e) => {
                eprintln!("✗ Settings error: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::Status => {
            let settings = Settings::load(config)?;
            if settings.status_bar_trigger_indicator {
                println!("{}", settings.trigger_auto_manual.indicator());
            }
            println!("Trigger: {}", settings.trigger_auto_manual);
            println!(
                "{} rule groups, {} rules",
                settings.groups.len(),
                settings.rule_count()
            );
        }
        Commands::Run { apply } => {
            let settings = Settings::load(config)?;
            let vault = open_vault(&cli.vault)?;
            let router =
                Router::new(&settings, FsMover::new(vault.root())).with_dry_run(!apply);

            println!("Processing: {}", vault.root().display());
            let files = vault.files()?;
            for (path, outcome) in router.route_all(&vault, &files) {
                print_outcome(&path, &outcome);
            }
        }
        Commands::Move { file } => {
            let settings = Settings::load(config)?;
            let vault = open_vault(&cli.vault)?;
            let absolute = std::fs::canonicalize(&file)
                .with_context(|| format!("Note not found: {}", file.display()))?;
            let relative = vault
                .relative(&absolute)
                .with_context(|| format!("{} is not inside the vault", file.display()))?;

            let note = vault.resolve(&relative)?;
            let router = Router::new(&settings, FsMover::new(vault.root()));
            let outcome = router.route(&note, &Trigger::Command);
            match &outcome {
                RouteOutcome::Excluded => println!("{} is in an excluded folder", relative),
                RouteOutcome::NoMatch => println!("No rule matches {}", relative),
                other => print_outcome(&relative, other),
            }
        }
        Commands::Toggle => {
            edit(config, |settings| {
                let mode = settings.toggle_trigger();
                notemover::notifications::notify_trigger(&mode.to_string());
                Ok(format!("Trigger is {} {}", mode, mode.indicator()))
            })?;
        }
        Commands::Migrate => {
            edit(config, |_| Ok("Settings rewritten in the current schema".to_string()))?;
        }
        Commands::Group(command) => edit(config, |settings| {
            Ok(match command {
                GroupCommand::Add { folder } => {
                    let g = settings.add_group(&folder);
                    format!("Added group {} -> {}", g + 1, folder.trim())
                }
                GroupCommand::Remove { group } => {
                    let removed = settings.remove_group(idx(group))?;
                    format!("Removed group {} ({})", group, removed.folder)
                }
                GroupCommand::Up { group } => {
                    settings.move_group(idx(group), Direction::Up)?;
                    format!("Moved group {} up", group)
                }
                GroupCommand::Down { group } => {
                    settings.move_group(idx(group), Direction::Down)?;
                    format!("Moved group {} down", group)
                }
                GroupCommand::Folder { group, folder } => {
                    settings.set_group_folder(idx(group), &folder)?;
                    format!("Group {} -> {}", group, folder.trim())
                }
            })
        })?,
        Commands::Rule(command) => edit(config, |settings| {
            Ok(match command {
                RuleCommand::Add { group } => {
                    let r = settings.add_rule(idx(group))?;
                    format!("Added rule {} to group {}", r + 1, group)
                }
                RuleCommand::Remove { group, rule } => {
                    settings.remove_rule(idx(group), idx(rule))?;
                    format!("Removed rule {} from group {}", rule, group)
                }
                RuleCommand::Set {
                    group,
                    rule,
                    tags,
                    properties,
                    patterns,
                } => {
                    let (g, r) = (idx(group), idx(rule));
                    for (category, input) in [
                        (Category::Tags, tags),
                        (Category::Properties, properties),
                        (Category::Patterns, patterns),
                    ] {
                        if let Some(input) = input {
                            settings.set_rule_criteria(g, r, category, &input)?;
                        }
                    }
                    format!("Updated rule {} of group {}", rule, group)
                }
            })
        })?,
        Commands::Exclude(command) => edit(config, |settings| {
            Ok(match command {
                ExcludeCommand::Add { folder } => {
                    let i = settings.add_exclusion(&folder);
                    format!("Excluded folder {}: {}", i + 1, folder)
                }
                ExcludeCommand::Remove { index } => {
                    let removed = settings.remove_exclusion(idx(index))?;
                    format!("Removed excluded folder {}", removed.folder)
                }
                ExcludeCommand::Up { index } => {
                    settings.move_exclusion(idx(index), Direction::Up)?;
                    format!("Moved excluded folder {} up", index)
                }
                ExcludeCommand::Down { index } => {
                    settings.move_exclusion(idx(index), Direction::Down)?;
                    format!("Moved excluded folder {} down", index)
                }
                ExcludeCommand::Set { index, folder } => {
                    settings.set_exclusion_folder(idx(index), &folder)?;
                    format!("Excluded folder {}: {}", index, folder)
                }
            })
        })?,
        Commands::Regex { tags, excluded } => edit(config, |settings| {
            if let Some(tags) = tags {
                settings.use_regex_to_check_for_tags = tags;
            }
            if let Some(excluded) = excluded {
                settings.use_regex_to_check_for_excluded_folder = excluded;
            }
            Ok(format!(
                "Tag regex: {}, excluded folder regex: {}",
                settings.use_regex_to_check_for_tags,
                settings.use_regex_to_check_for_excluded_folder
            ))
        })?,
    }

    Ok(())
}
