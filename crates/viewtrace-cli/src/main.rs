use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use viewtrace_core::{Config, MatchMode, CONFIG_FILE_NAME};
use viewtrace_graph::{render, GraphBuilder, MatchResolver, Resolution, ReverseIndex};
use viewtrace_sql::{find_direct_users, FileScanner};

/// viewtrace - find the views that depend on a table
#[derive(Parser)]
#[command(name = "viewtrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: viewtrace.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every view that transitively depends on an object
    Tree {
        /// Table or view name to analyze
        table: String,

        /// Directory searched recursively for .sql files
        path: PathBuf,

        /// Matching mode (overrides the config file)
        #[arg(short, long = "match", value_enum)]
        match_mode: Option<MatchArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List files directly in a directory that read from a table
    Uses {
        /// Table name to look for after FROM/JOIN
        #[arg(short, long)]
        table: String,

        /// Directory containing .sql files (not searched recursively)
        #[arg(short, long)]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatchArg {
    Exact,
    Suffix,
}

impl From<MatchArg> for MatchMode {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::Exact => MatchMode::Exact,
            MatchArg::Suffix => MatchMode::Suffix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Config::from_file(Path::new(CONFIG_FILE_NAME))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Tree {
            table,
            path,
            match_mode,
            format,
        } => {
            if let Some(mode) = match_mode {
                config.match_mode = mode.into();
            }
            tree_command(&config, &table, &path, format, cli.verbose)
        }
        Commands::Uses { table, path } => uses_command(&table, &path, cli.verbose),
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Tree command - reverse dependency tree for every matching object
fn tree_command(
    config: &Config,
    table: &str,
    path: &Path,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let builder = GraphBuilder::from_config(config).context("Invalid configuration")?;

    if verbose {
        eprintln!("{} {}", "Scanning for SQL files under:".cyan(), path.display());
        eprintln!("{} {}", "Match mode:".cyan(), config.match_mode);
    }

    let files = FileScanner::new(path).scan();
    let file_count = files.len();
    let graph = builder.build(files);

    if verbose {
        eprintln!(
            "Scanned {} files: {} definitions, {} dependency edges",
            file_count,
            graph.definition_count(),
            graph.edge_count()
        );
        if !graph.conflicts().is_empty() {
            eprintln!(
                "{} {} objects are defined by more than one file",
                "⚠".yellow(),
                graph.conflicts().len()
            );
        }
    }

    let resolver = MatchResolver::new(builder.extractor().normalizer().clone(), config.match_mode);
    let roots = resolver.resolve(table, &graph);
    let trees = render(&roots, &graph);

    if format == OutputFormat::Json {
        let index = ReverseIndex::from_graph(&graph);
        let results: Vec<serde_json::Value> = trees
            .iter()
            .map(|tree| {
                serde_json::json!({
                    "root": tree.root,
                    "resolution": Resolution::classify(&tree.root, &graph, &index),
                    "definition_file": graph
                        .definition_file(tree.root.as_str())
                        .map(|file| file.display().to_string()),
                    "dependents": tree.dependent_count(),
                    "nodes": tree.nodes,
                })
            })
            .collect();

        let output = serde_json::json!({
            "query": table,
            "match_mode": resolver.mode(),
            "found": !trees.is_empty(),
            "trees": results,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n{} {}\n", "🔍 Searching for usage of:".bold(), table);

    if trees.is_empty() {
        println!(
            "{}",
            format!("❌ '{}' is not defined or referenced by any scanned SQL file.", table).red()
        );
        if config.match_mode == MatchMode::Exact {
            println!("Try --match suffix to match schema-qualified names.");
        }
        return Ok(());
    }

    println!("{}\n", "✅ Dependency Tree:".green().bold());

    for tree in &trees {
        print!("{}", tree.to_text());

        if tree.is_leaf() {
            println!("{}", format!("No views depend on '{}'.", tree.root).yellow());
        } else if verbose {
            eprintln!("{} {}", tree.dependent_count(), "dependent objects".cyan());
        }
        println!();
    }

    Ok(())
}

/// Uses command - files in one directory that read from a table
fn uses_command(table: &str, path: &Path, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Searching directory:".cyan(), path.display());
    }

    let found = find_direct_users(path, table)
        .with_context(|| format!("Invalid table name '{}'", table))?;

    if found.is_empty() {
        println!("{}", format!("❌ No views found using table '{}'", table).red());
        std::process::exit(1);
    }

    println!("{}", format!("✅ Views that use table '{}':", table).green());
    for file in &found {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        println!(" - {}", name);
    }

    Ok(())
}
