use std::ops::RangeInclusive;

use anyhow::Result;
use rayon::prelude::*;

use crate::archive::ArchiveSource;
use crate::mail::{Month, Segmenter, YearSummary, YearThreads, extract_headers, message_digest};
use crate::output::{AggregateSink, RecordSink, StoredEmail};

/// Counters for one year's run, logged when the year completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunReport {
    units_processed: usize,
    units_skipped: usize,
    records: usize,
    records_without_id: usize,
    records_without_sender: usize,
}

/// Process the twelve months of `year` in calendar order with a fresh
/// resolver and thread graph.
///
/// Missing or unreadable months are skipped; only sink failures are returned.
pub fn process_year<S, R>(source: &S, year: u16, records: &R) -> Result<YearSummary>
where
    S: ArchiveSource + ?Sized,
    R: RecordSink + ?Sized,
{
    let mut threads = YearThreads::new(year);
    let mut report = RunReport::default();

    for month in Month::all() {
        let text = match source.load(year, month) {
            Ok(Some(text)) => text,
            Ok(None) => {
                log::debug!("no archive for {year}/{month}, skipping");
                report.units_skipped += 1;
                continue;
            }
            Err(e) => {
                log::warn!("skipping {year}/{month}: {e:#}");
                report.units_skipped += 1;
                continue;
            }
        };

        log::info!("processing {year}/{month}");
        report.units_processed += 1;
        process_unit(&text, year, month, &mut threads, records, &mut report)?;
    }

    log::info!(
        "finished {year}: {} records from {} archives, {} months skipped \
         ({} without Message-ID, {} without sender)",
        report.records,
        report.units_processed,
        report.units_skipped,
        report.records_without_id,
        report.records_without_sender
    );

    Ok(threads.finish())
}

fn process_unit<R>(
    text: &str,
    year: u16,
    month: Month,
    threads: &mut YearThreads,
    records: &R,
    report: &mut RunReport,
) -> Result<()>
where
    R: RecordSink + ?Sized,
{
    for record in Segmenter::new(text) {
        report.records += 1;
        let headers = extract_headers(record.text);

        let Some(sender) = headers.sender.as_deref() else {
            log::warn!("{year}/{month}: record at offset {} has no sender", record.span.start);
            report.records_without_sender += 1;
            continue;
        };

        match headers.message_id.as_deref() {
            Some(id) => {
                let digest = message_digest(id);
                records.accept(&StoredEmail {
                    year,
                    month,
                    digest: &digest,
                    sender,
                    text: record.text,
                })?;
            }
            None => {
                log::debug!("{year}/{month}: message from {sender} has no Message-ID");
                report.records_without_id += 1;
            }
        }

        threads.observe(month, &headers);
    }

    Ok(())
}

/// Process a range of years, each with its own independent state.
///
/// With `parallel` the years run on the rayon pool; either way the summaries
/// come back in year order.
pub fn process_years<S, R>(
    source: &S,
    years: RangeInclusive<u16>,
    records: &R,
    parallel: bool,
) -> Result<Vec<YearSummary>>
where
    S: ArchiveSource + ?Sized,
    R: RecordSink + ?Sized,
{
    let years: Vec<u16> = years.collect();

    if parallel {
        years
            .into_par_iter()
            .map(|year| process_year(source, year, records))
            .collect()
    } else {
        years
            .into_iter()
            .map(|year| process_year(source, year, records))
            .collect()
    }
}

/// Run all years and hand each summary to `aggregates`, in year order.
pub fn run<S, R, A>(
    source: &S,
    years: RangeInclusive<u16>,
    records: &R,
    aggregates: &mut A,
    parallel: bool,
) -> Result<Vec<YearSummary>>
where
    S: ArchiveSource + ?Sized,
    R: RecordSink + ?Sized,
    A: AggregateSink + ?Sized,
{
    let summaries = process_years(source, years, records, parallel)?;
    for summary in &summaries {
        aggregates.year_complete(summary)?;
    }
    aggregates.finish()?;
    Ok(summaries)
}
