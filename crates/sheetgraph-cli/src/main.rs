//! sheetgraph CLI - check spreadsheets and load them into a graph

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use sheetgraph::populate::{PopulateOptions, SuffixRule};
use sheetgraph::prelude::*;
use sheetgraph::{populate_with, LoadOptions, TypeInconsistency};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sheetgraph")]
#[command(
    author,
    version,
    about = "Validate spreadsheet data against a graph mapping and load it into a graph"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less logging (-q warnings only, -qq errors only)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// CSV field delimiter
    #[arg(long, default_value = ",", global = true)]
    delimiter: char,

    /// Keep column names as written instead of replacing spaces with underscores
    #[arg(long, global = true)]
    raw_names: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List sheets with their row and column counts
    Sheets {
        /// Input workbook (xlsx, xlsm), CSV file or directory of CSV files
        input: PathBuf,
    },

    /// Report columns that mix incompatible value types
    Check {
        /// Input workbook (xlsx, xlsm), CSV file or directory of CSV files
        input: PathBuf,

        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the typed schema of every sheet
    Schema {
        /// Input workbook (xlsx, xlsm), CSV file or directory of CSV files
        input: PathBuf,

        /// Print the schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a graph mapping against the sheets
    Validate {
        /// Input workbook (xlsx, xlsm), CSV file or directory of CSV files
        input: PathBuf,

        /// Mapping document (JSON)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Print the findings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate, then emit graph mutations
    Populate {
        /// Input workbook (xlsx, xlsm), CSV file or directory of CSV files
        input: PathBuf,

        /// Mapping document (JSON)
        #[arg(short, long)]
        mapping: PathBuf,

        /// Cypher statements file, one JSON object per line (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Load into an in-memory graph and print its description instead
        #[arg(long, conflicts_with = "output")]
        memory: bool,

        /// Use the only upper-case `*_ID`/`*_KEY` column as key of unconnected sheets
        #[arg(long)]
        suffix_keys: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let options = LoadOptions {
        normalize_column_names: !cli.raw_names,
        delimiter: u8::try_from(cli.delimiter).context("Delimiter must be an ASCII character")?,
        ..LoadOptions::default()
    };

    match cli.command {
        Commands::Sheets { input } => list_sheets(&input, options),
        Commands::Check { input, json } => check(&input, options, json),
        Commands::Schema { input, json } => show_schema(&input, options, json),
        Commands::Validate {
            input,
            mapping,
            json,
        } => validate_mapping(&input, &mapping, options, json),
        Commands::Populate {
            input,
            mapping,
            output,
            memory,
            suffix_keys,
            json,
        } => populate_graph(
            &input,
            &mapping,
            options,
            output.as_deref(),
            memory,
            suffix_keys,
            json,
        ),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load(input: &Path, options: LoadOptions) -> Result<Workbook> {
    Workbook::load_with(input, options).with_context(|| format!("Failed to load '{}'", input.display()))
}

fn load_mapping(path: &Path, normalize: bool) -> Result<GraphMapping> {
    let mapping = GraphMapping::from_path(path)
        .with_context(|| format!("Failed to read mapping '{}'", path.display()))?;
    Ok(if normalize { mapping.normalized() } else { mapping })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("Failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}

fn list_sheets(input: &Path, options: LoadOptions) -> Result<ExitCode> {
    let workbook = load(input, options)?;

    for (i, sheet) in workbook.sheets().enumerate() {
        println!(
            "{}\t{}\t{} rows x {} columns",
            i,
            sheet.name(),
            sheet.row_count(),
            sheet.column_count()
        );
    }

    Ok(ExitCode::SUCCESS)
}

fn check(input: &Path, options: LoadOptions, json: bool) -> Result<ExitCode> {
    let workbook = load(input, options)?;
    let found: Vec<TypeInconsistency> = workbook.check_types();

    if json {
        print_json(&found)?;
    } else if found.is_empty() {
        println!("No type inconsistencies in {} sheets", workbook.sheet_count());
    } else {
        println!("Type inconsistencies found:");
        for inconsistency in &found {
            println!("  - {}", inconsistency);
        }
    }

    Ok(if found.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_schema(input: &Path, options: LoadOptions, json: bool) -> Result<ExitCode> {
    let workbook = load(input, options)?;
    let schema = workbook.build_schema().context("Failed to build schema")?;

    if json {
        print_json(&schema)?;
    } else {
        println!("{}", schema);
    }

    Ok(ExitCode::SUCCESS)
}

fn validate_mapping(
    input: &Path,
    mapping: &Path,
    options: LoadOptions,
    json: bool,
) -> Result<ExitCode> {
    let normalize = options.normalize_column_names;
    let workbook = load(input, options)?;
    let mapping = load_mapping(mapping, normalize)?;
    let result = workbook
        .validate_mapping(&mapping)
        .context("Failed to build schema")?;

    if json {
        print_json(&result)?;
    } else if result.has_errors() {
        println!("Graph mapping validation failed:{}", result);
    } else {
        println!(
            "Mapping is valid: {} connections, {} references",
            mapping.sheet_connections.len(),
            mapping.sheet_references.len()
        );
    }

    Ok(if result.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn populate_graph(
    input: &Path,
    mapping: &Path,
    options: LoadOptions,
    output: Option<&Path>,
    memory: bool,
    suffix_keys: bool,
    json: bool,
) -> Result<ExitCode> {
    let normalize = options.normalize_column_names;
    let workbook = load(input, options)?;
    let mapping = load_mapping(mapping, normalize)?;

    let mut populate_options = PopulateOptions::default();
    if suffix_keys {
        populate_options = populate_options.with_key_strategy(SuffixRule::default());
    }

    if memory {
        let mut store = MemoryGraphStore::new();
        let summary = populate_with(&workbook, &mapping, &mut store, populate_options)
            .context("Population failed")?;
        let description = store
            .describe_schema()
            .context("Failed to describe graph")?;
        if json {
            print_json(&description)?;
        } else {
            println!("{}", description);
        }
        report(&summary, json)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut store = CypherStore::new();
    let summary = populate_with(&workbook, &mapping, &mut store, populate_options)
        .context("Population failed")?;
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            store
                .write_json_lines(BufWriter::new(file))
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote {} statements to '{}'", store.len(), path.display());
        }
        None => {
            store
                .write_json_lines(io::stdout().lock())
                .context("Failed to write to stdout")?;
        }
    }
    report(&summary, json)?;

    Ok(ExitCode::SUCCESS)
}

/// Summary goes to stderr so stdout stays machine-readable
fn report(summary: &PopulationSummary, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(summary).context("Failed to encode summary")?;
        eprintln!("{}", text);
    } else {
        eprintln!("{}", summary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_populate() {
        let cli = Cli::try_parse_from([
            "sheetgraph",
            "-vv",
            "populate",
            "plate.xlsx",
            "--mapping",
            "mapping.json",
            "--memory",
            "--suffix-keys",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Populate {
                memory,
                suffix_keys,
                output,
                ..
            } => {
                assert!(memory);
                assert!(suffix_keys);
                assert!(output.is_none());
            }
            _ => panic!("expected populate"),
        }
    }

    #[test]
    fn test_memory_conflicts_with_output() {
        let result = Cli::try_parse_from([
            "sheetgraph",
            "populate",
            "plate.xlsx",
            "-m",
            "mapping.json",
            "--memory",
            "--output",
            "out.jsonl",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
