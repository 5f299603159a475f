use std::{fs::File, io, path::Path};

use eyre::{Result, WrapErr};
use tracing::{info, warn};

use crate::client::{PageSource, TronGridClient};
use crate::config::RunConfig;
use crate::error::ConfigError;
use crate::fetcher::{fetch_address, FetchOptions};
use crate::models::OUTPUT_HEADER;

pub const ADDRESS_COLUMN: &str = "addressName";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub addresses: usize,
    pub rows: usize,
    pub skipped_records: usize,
    pub failed_addresses: usize,
}

/// Reads the `addressName` column, trimmed, in file order. Duplicates are kept.
pub fn read_addresses<R: io::Read>(input: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == ADDRESS_COLUMN)
        .ok_or(ConfigError::MissingColumn(ADDRESS_COLUMN))?;

    let mut out = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        match row.get(column) {
            Some(addr) => out.push(addr.trim().to_string()),
            None => warn!(row = i + 2, "Row has no {} field, skipping", ADDRESS_COLUMN),
        }
    }
    Ok(out)
}

pub fn load_addresses(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).wrap_err_with(|| format!("opening {}", path.display()))?;
    read_addresses(file).wrap_err_with(|| format!("reading {}", path.display()))
}

/// Output writer; the header row is written by [`run`] so it is never omitted.
pub fn output_writer<W: io::Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(out)
}

/// Fetches every address in order and appends its rows to `writer`.
pub async fn run<S, W>(
    source: &S,
    addresses: &[String],
    opts: &FetchOptions,
    writer: &mut csv::Writer<W>,
) -> Result<RunSummary>
where
    S: PageSource + ?Sized,
    W: io::Write,
{
    let mut summary = RunSummary::default();
    writer.write_record(OUTPUT_HEADER)?;

    for address in addresses {
        info!(mode = opts.mode.label(), %address, "Fetching transactions");
        let history = fetch_address(source, address, opts).await;

        for record in &history.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        summary.addresses += 1;
        summary.rows += history.records.len();
        summary.skipped_records += history.skipped;
        if history.error.is_some() {
            summary.failed_addresses += 1;
        }
        info!(
            %address,
            rows = history.records.len(),
            pages = history.pages,
            skipped = history.skipped,
            "Address done"
        );
    }

    Ok(summary)
}

/// Full batch: input table, TronGrid, output table.
pub async fn run_from_config(config: &RunConfig) -> Result<RunSummary> {
    config.validate()?;

    let addresses = load_addresses(&config.input)?;
    info!(count = addresses.len(), input = %config.input.display(), "Loaded addresses");

    let client = TronGridClient::from_config(config)?;
    let file = File::create(&config.output)
        .wrap_err_with(|| format!("creating {}", config.output.display()))?;
    let mut writer = output_writer(file);

    let summary = run(&client, &addresses, &FetchOptions::from(config), &mut writer).await?;
    writer.flush()?;
    Ok(summary)
}
