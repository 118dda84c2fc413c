//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{
    validate_chunk_size, validate_tag, DEFAULT_CHUNK_SIZE, DEFAULT_OUTPUT, DEFAULT_SAMPLE_RATE,
    DEFAULT_TAG,
};
use crate::csv::CsvTable;
use crate::error::{HarvesterError, Result};
use crate::harvester::{harvest_file, HarvestOptions};
use crate::record::FieldMap;
use crate::scanner::{MatchMode, ScanOptions};
use crate::stats::{Report, ReportQuery};

/// Update the spinner message every this many elements.
const PROGRESS_EVERY: u64 = 1000;

/// CV Harvester - Stream elements out of large XML dumps into CSV.
#[derive(Parser)]
#[command(name = "cv-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract elements from an XML file and append sampled records to a CSV file.
    Extract {
        /// UTF-8 XML input file
        input: PathBuf,

        /// Tag name of the elements to extract (default: cv, or the mapping file's tag)
        #[arg(short, long)]
        tag: Option<String>,

        /// Characters read per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// YAML field mapping (default: built-in CV mapping)
        #[arg(short, long)]
        fields: Option<PathBuf>,

        /// CSV output file; rows are appended
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Keep one record per N+1 (0 keeps all)
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Fail on an element cut off by the end of the file
        #[arg(long)]
        strict: bool,

        /// Match nested elements of the same name by depth
        #[arg(long)]
        balanced: bool,
    },

    /// Print statistics over a harvested CSV file.
    Stats {
        /// CSV input file
        input: PathBuf,

        /// First column to compare
        #[arg(long, default_value = "jobTitle")]
        left: String,

        /// Second column to compare
        #[arg(long, default_value = "qualification")]
        right: String,

        /// Search string for the first column
        #[arg(long, default_value = "менеджер")]
        left_search: String,

        /// Search string for the second column
        #[arg(long, default_value = "инженер")]
        right_search: String,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            tag,
            chunk_size,
            fields,
            output,
            sample_rate,
            seed,
            strict,
            balanced,
        } => {
            let mode = if balanced {
                MatchMode::Balanced
            } else {
                MatchMode::FirstClose
            };
            let scan = ScanOptions::default()
                .with_chunk_size(chunk_size)
                .with_mode(mode)
                .with_strict(strict);
            extract_command(
                &input,
                tag,
                fields.as_deref(),
                &output,
                scan,
                sample_rate,
                seed,
            )
        }
        Commands::Stats {
            input,
            left,
            right,
            left_search,
            right_search,
        } => stats_command(
            &input,
            &ReportQuery {
                left,
                right,
                left_search,
                right_search,
            },
        ),
    }
}

/// Resolve the field mapping and tag: command line first, then the mapping
/// file, then the defaults.
fn resolve_mapping(tag: Option<String>, fields: Option<&Path>) -> Result<(FieldMap, String)> {
    let (fields, file_tag) = match fields {
        Some(path) => FieldMap::from_yaml_file(path)?,
        None => (FieldMap::cv_default()?, None),
    };
    let tag = tag
        .or(file_tag)
        .unwrap_or_else(|| DEFAULT_TAG.to_string());
    Ok((fields, tag))
}

/// Execute the extract command.
fn extract_command(
    input: &Path,
    tag: Option<String>,
    fields: Option<&Path>,
    output: &Path,
    scan: ScanOptions,
    sample_rate: u32,
    seed: Option<u64>,
) -> Result<()> {
    let (fields, tag) = resolve_mapping(tag, fields)?;

    // Validate inputs before touching the output file
    validate_tag(&tag)?;
    validate_chunk_size(scan.chunk_size)?;
    if !input.is_file() {
        return Err(HarvesterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input file does not exist: {}", input.display()),
        )));
    }

    println!(
        "{} <{}> elements from {}",
        style("Extracting").bold(),
        style(&tag).cyan(),
        style(input.display()).green()
    );
    for field in fields.fields() {
        println!("  {} <- {}", field.column(), field.path().as_str());
    }
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Scanning...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let options = HarvestOptions {
        tag,
        scan,
        sample_rate,
        seed,
    };
    let result = harvest_file(input, output, &fields, &options, |summary| {
        if summary.scan.elements % PROGRESS_EVERY == 0 {
            pb.set_message(format!(
                "Scanned {} elements, kept {}",
                summary.scan.elements, summary.written
            ));
        }
    });
    pb.finish_and_clear();
    let summary = result?;

    println!("  Elements: {}", summary.scan.elements);
    if summary.scan.skipped > 0 {
        println!(
            "  Skipped (malformed): {}",
            style(summary.scan.skipped).yellow().bold()
        );
    }
    println!("  Written: {}", summary.written);
    println!();
    println!("{} {}", style("Saved to:").green().bold(), output.display());

    Ok(())
}

/// Execute the stats command.
fn stats_command(input: &Path, query: &ReportQuery) -> Result<()> {
    let table = CsvTable::from_path(input)?;
    let report = Report::compute(&table, query)?;

    println!(
        "{} {} vs {}: {}",
        style("Mismatched").bold(),
        query.left,
        query.right,
        style(report.mismatches).cyan()
    );

    println!();
    println!(
        "{}",
        style(format!(
            "Top {} among '{}' containing '{}':",
            query.right, query.left, query.left_search
        ))
        .bold()
    );
    print_counts(&report.right_for_left);

    println!();
    println!(
        "{}",
        style(format!(
            "Top {} among '{}' containing '{}':",
            query.left, query.right, query.right_search
        ))
        .bold()
    );
    print_counts(&report.left_for_right);

    Ok(())
}

fn print_counts(counts: &[(String, usize)]) {
    let width = counts
        .iter()
        .map(|(value, _)| value.chars().count())
        .max()
        .unwrap_or(0);
    for (value, count) in counts {
        let pad = width - value.chars().count();
        println!("  {value}{}  {count:>4}", " ".repeat(pad));
    }
}
