use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use formula_catalog::{check_formula, function_library, search_functions, KnownNames};
use formula_merge::{
    relations_from_json_str, relations_to_json_string, JoinKind, JoinOptions, JoinSpec,
    LookupStrategy, Relation, RelationStore,
};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "formula-merge")]
#[command(about = "Inspect in-memory relations, join them, and check formulas.")]
struct Cli {
    /// Log join and store details to stderr (same as RUST_LOG=debug).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the relations of the working set.
    Relations(RelationsArgs),
    /// Print one relation.
    Show(ShowArgs),
    /// Join two relations and print the merged relation.
    Join(JoinArgs),
    /// Browse the function library.
    Functions(FunctionsArgs),
    /// Run the editor's formula check against the working set.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// JSON working set in records shape. Defaults to the demo relations.
    #[arg(long)]
    relations: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Args)]
struct RelationsArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Relation id (e.g. `t1`).
    id: String,

    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct JoinArgs {
    /// Left relation id.
    #[arg(long)]
    left: String,

    /// Right relation id.
    #[arg(long)]
    right: String,

    /// One of `inner`, `left`, `right`, `outer`.
    #[arg(long, default_value = "inner")]
    kind: JoinKind,

    /// Key column id on the left relation.
    #[arg(long = "left-key")]
    left_key: String,

    /// Key column id on the right relation.
    #[arg(long = "right-key")]
    right_key: String,

    /// Key lookup: `auto`, `nested-loop` or `hash-index`.
    #[arg(long, default_value = "auto")]
    strategy: LookupStrategy,

    /// Row count at which `auto` switches to a hash index.
    #[arg(long = "hash-threshold")]
    hash_threshold: Option<usize>,

    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct FunctionsArgs {
    /// Case-insensitive filter on function names.
    #[arg(long)]
    search: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Formula text, e.g. `SUM(orders_q1.total_amount)`.
    formula: String,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Debug, Serialize)]
struct RelationSummary<'a> {
    id: &'a str,
    name: &'a str,
    columns: Vec<String>,
    rows: usize,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Relations(args) => {
            let store = load_store(&args.source)?;
            emit(&render_relation_list(&store, args.format)?)?;
        }
        Command::Show(args) => {
            let store = load_store(&args.source)?;
            let relation = store
                .get(&args.id)
                .with_context(|| format!("no relation with id {:?}", args.id))?;
            emit(&render_relation(relation, args.format)?)?;
        }
        Command::Join(args) => {
            let mut store = load_store(&args.source)?;
            let spec = JoinSpec::new(
                args.left.as_str(),
                args.right.as_str(),
                args.kind,
                args.left_key.as_str(),
                args.right_key.as_str(),
            );
            let mut options = JoinOptions::with_strategy(args.strategy);
            if let Some(threshold) = args.hash_threshold {
                options.hash_threshold_rows = threshold;
            }

            let id = store.merge(&spec, &options).with_context(|| {
                format!("{} join of {} and {}", spec.kind, args.left, args.right)
            })?;
            let merged = store
                .get(id.as_str())
                .context("merged relation missing from the store")?;
            log::info!(
                "created {} ({}) with {} rows",
                merged.id(),
                merged.name(),
                merged.row_count()
            );
            emit(&render_relation(merged, args.format)?)?;
        }
        Command::Functions(args) => {
            let functions: Vec<_> = match &args.search {
                Some(term) => search_functions(term).collect(),
                None => function_library().iter().collect(),
            };
            let text = match args.format {
                OutputFormat::Json => {
                    serde_json::to_string_pretty(&functions).context("serialize functions")?
                }
                OutputFormat::Table => {
                    let mut out = String::new();
                    for f in &functions {
                        out.push_str(&format!("{} [{}]  {}\n", f.name, f.category, f.syntax));
                        out.push_str(&format!("    {}\n", f.description));
                        out.push_str(&format!("    e.g. {}\n", f.example));
                    }
                    out
                }
            };
            emit(&text)?;
        }
        Command::Check(args) => {
            let store = load_store(&args.source)?;
            let mut known = KnownNames::new();
            for relation in &store {
                known.add_table(
                    relation.name(),
                    relation.columns().iter().map(|c| c.name.as_str()),
                );
            }
            match check_formula(&args.formula, &known) {
                None => emit("Nothing to check.\n")?,
                Some(check) => {
                    emit(&format!("{}\n", check.message()))?;
                    if !check.is_valid() {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::builder();
    builder.filter_level(log::LevelFilter::Info);
    // RUST_LOG still wins over the default level.
    builder.parse_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn load_store(source: &SourceArgs) -> Result<RelationStore> {
    let Some(path) = &source.relations else {
        return Ok(RelationStore::with_seed_relations());
    };

    let json = fs::read_to_string(path)
        .with_context(|| format!("read relations {}", path.display()))?;
    let relations = relations_from_json_str(&json)
        .with_context(|| format!("parse relations {}", path.display()))?;
    log::debug!("loaded {} relations from {}", relations.len(), path.display());
    RelationStore::from_relations(relations)
        .with_context(|| format!("load relations {}", path.display()))
}

/// Write to stdout; a closed pipe (e.g. `| head`) is not an error.
fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    let newline: &[u8] = if text.ends_with('\n') { b"" } else { b"\n" };
    let result = stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.write_all(newline))
        .and_then(|()| stdout.flush());
    match result {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("write output"),
    }
}

fn render_relation_list(store: &RelationStore, format: OutputFormat) -> Result<String> {
    let summaries: Vec<RelationSummary<'_>> = store
        .iter()
        .map(|relation| RelationSummary {
            id: relation.id().as_str(),
            name: relation.name(),
            columns: relation
                .columns()
                .iter()
                .map(|c| format!("{}:{}", c.name, c.data_type))
                .collect(),
            rows: relation.row_count(),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&summaries).context("serialize relation list")
        }
        OutputFormat::Table => {
            let header = ["id", "name", "rows", "columns"].map(String::from);
            let rows = summaries
                .iter()
                .map(|s| {
                    [
                        s.id.to_string(),
                        s.name.to_string(),
                        s.rows.to_string(),
                        s.columns.join(", "),
                    ]
                })
                .collect::<Vec<_>>();
            Ok(render_grid(&header, &rows))
        }
    }
}

fn render_relation(relation: &Relation, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => relations_to_json_string([relation]).context("serialize relation"),
        OutputFormat::Table => {
            let header: Vec<String> = relation.columns().iter().map(|c| c.name.clone()).collect();
            let rows: Vec<Vec<String>> = relation
                .rows()
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect();
            let mut out = format!(
                "{} ({}): {} rows\n",
                relation.name(),
                relation.id(),
                relation.row_count()
            );
            out.push_str(&render_grid(&header, &rows));
            Ok(out)
        }
    }
}

fn render_grid<H, R>(header: &[H], rows: &[R]) -> String
where
    H: AsRef<str>,
    R: AsRef<[String]>,
{
    let mut widths: Vec<usize> = header.iter().map(|h| h.as_ref().chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.as_ref().iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut out = grid_line(header.iter().map(AsRef::as_ref), &widths);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in rows {
        out.push_str(&grid_line(row.as_ref().iter().map(String::as_str), &widths));
    }
    out
}

fn grid_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    let mut line = padded.join(" | ").trim_end().to_string();
    line.push('\n');
    line
}
