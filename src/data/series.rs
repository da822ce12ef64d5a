use std::collections::BTreeMap;

use thiserror::Error;

use super::fields::{extract_metric, timestamp_field};
use super::model::{MetricName, RawRecord, ResolvedEntry, SeriesSet};
use super::timestamp::{EpochPolicy, resolve};

/// Why a load produced nothing to chart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("No data found")]
    NoData,
    #[error("No entries with valid timestamps ({records} records without a usable timestamp)")]
    NoValidTimestamps { records: usize },
}

/// Resolve a single record. `None` when its timestamp is missing or invalid.
pub fn resolve_record(record: &RawRecord, policy: EpochPolicy) -> Option<ResolvedEntry> {
    let timestamp = timestamp_field(record).and_then(|v| resolve(v, policy))?;
    let metrics: BTreeMap<MetricName, Option<f64>> = MetricName::ALL
        .iter()
        .map(|&m| (m, extract_metric(record, m)))
        .collect();
    Some(ResolvedEntry { timestamp, metrics })
}

/// Merge record batches from several sources into one time-ordered set.
///
/// Batches are concatenated in order before resolution; the sort is stable so
/// entries sharing a timestamp keep their source order.
pub fn build<B>(batches: &[B], policy: EpochPolicy) -> Result<SeriesSet, SeriesError>
where
    B: AsRef<[RawRecord]>,
{
    let total: usize = batches.iter().map(|b| b.as_ref().len()).sum();
    if total == 0 {
        return Err(SeriesError::NoData);
    }

    let mut entries: Vec<ResolvedEntry> = batches
        .iter()
        .flat_map(|b| b.as_ref().iter())
        .filter_map(|rec| resolve_record(rec, policy))
        .collect();

    let discarded = total - entries.len();
    if entries.is_empty() {
        return Err(SeriesError::NoValidTimestamps { records: discarded });
    }
    if discarded > 0 {
        log::warn!("Discarded {discarded} of {total} records without a valid timestamp");
    }

    entries.sort_by_key(|e| e.timestamp);
    log::info!("Built series with {} entries", entries.len());

    Ok(SeriesSet { entries, discarded })
}
