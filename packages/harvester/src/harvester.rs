//! Main harvester service that ties all components together.

use std::io::Write;
use std::path::Path;

use crate::csv::CsvWriter;
use crate::error::Result;
use crate::record::FieldMap;
use crate::sample::Sampler;
use crate::scanner::{ChunkedTagScanner, ScanOptions, ScanStats};
use crate::source::CharSource;

/// Settings for one harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Tag to extract.
    pub tag: String,
    /// Scanner settings.
    pub scan: ScanOptions,
    /// One record kept per `sample_rate + 1`; 0 keeps all.
    pub sample_rate: u32,
    /// Fixed sampling seed.
    pub seed: Option<u64>,
}

/// Outcome of a harvest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Scanner counters at the end of the run.
    pub scan: ScanStats,
    /// Records written to the output.
    pub written: u64,
}

impl HarvestOptions {
    fn sampler(&self) -> Sampler {
        match self.seed {
            Some(seed) => Sampler::with_seed(self.sample_rate, seed),
            None => Sampler::new(self.sample_rate),
        }
    }
}

/// Scan `input` for `options.tag` elements and append sampled records to
/// the CSV file at `output`.
///
/// `progress` is called after every element with the running summary.
///
/// # Arguments
/// * `input` - UTF-8 XML file
/// * `output` - CSV file, created with a header if missing or empty
/// * `fields` - Columns and their element paths
/// * `options` - Tag, scanner and sampling settings
pub fn harvest_file(
    input: &Path,
    output: &Path,
    fields: &FieldMap,
    options: &HarvestOptions,
    progress: impl FnMut(&HarvestSummary),
) -> Result<HarvestSummary> {
    let mut scanner =
        ChunkedTagScanner::open_with_options(input, &options.tag, options.scan.clone())?;
    let mut writer = CsvWriter::append(output, &fields.header())?;
    let mut sampler = options.sampler();

    let summary = harvest(&mut scanner, fields, &mut sampler, &mut writer, progress)?;
    writer.flush()?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        elements = summary.scan.elements,
        skipped = summary.scan.skipped,
        written = summary.written,
        "Harvest finished"
    );
    Ok(summary)
}

/// Drive a scanner to exhaustion, writing every sampled record.
///
/// A read failure stops the run and is returned; records written before it
/// stay in `writer`.
///
/// # Arguments
/// * `scanner` - Element source, consumed until it ends
/// * `fields` - Columns and their element paths
/// * `sampler` - Decides which records are written
/// * `writer` - CSV destination; the header is the caller's job
/// * `progress` - Called after every element with the running summary
///
/// # Returns
/// Scanner counters and the number of records written
pub fn harvest<S: CharSource, W: Write>(
    scanner: &mut ChunkedTagScanner<S>,
    fields: &FieldMap,
    sampler: &mut Sampler,
    writer: &mut CsvWriter<W>,
    mut progress: impl FnMut(&HarvestSummary),
) -> Result<HarvestSummary> {
    let mut summary = HarvestSummary::default();

    while let Some(element) = scanner.next() {
        let element = element?;
        if sampler.keep() {
            writer.write_record(&fields.extract(&element))?;
            summary.written += 1;
        }
        summary.scan = scanner.stats();
        progress(&summary);
    }

    summary.scan = scanner.stats();
    Ok(summary)
}
