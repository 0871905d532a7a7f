use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DecoderConfig;
use crate::protocols::att::AttOpcode;
use crate::source::{BtsnoopFileSource, FrameSource, SourceError, btsnoop_ts_to_rfc3339};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

pub(crate) mod frame;
pub(crate) mod matcher;
mod stats;
mod targets;

pub use frame::{AttEvent, FrameOutcome, SkipKind, SkipReason, decode_frame};
pub use matcher::{EncodingWidth, MatchMode, ValueMatch, find_matches};
pub use stats::SkipCounts;
pub use targets::{Target, TargetError, TargetSet};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Matches found in one decoded attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMatches {
    pub frame_index: u64,
    pub opcode: AttOpcode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u16>,
    /// Attribute value after the codec was applied.
    #[serde(with = "hex::serde")]
    pub decoded: Vec<u8>,
    pub matches: Vec<ValueMatch>,
}

/// Everything one pass over a capture produced.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub summary: CaptureSummary,
    pub events: Vec<AttEvent>,
    pub payload_matches: Vec<PayloadMatches>,
    pub skipped: SkipCounts,
}

pub fn analyze_btsnoop_file(
    path: &Path,
    config: &DecoderConfig,
    targets: &TargetSet,
) -> Result<Report, AnalysisError> {
    let source = BtsnoopFileSource::open(path)?;
    let analysis = decode_source(source, config, targets)?;

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.generated_at = analysis
        .summary
        .time_end
        .clone()
        .or_else(|| analysis.summary.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.config = config.clone();
    report.targets = targets.as_slice().to_vec();
    report.capture_summary = analysis.summary;
    report.events = analysis.events;
    report.payload_matches = analysis.payload_matches;
    report.skipped = analysis.skipped;
    Ok(report)
}

/// Drive every record of `source` through the layer stack, codec and
/// matcher. Only source errors abort; skipped frames are counted.
pub fn decode_source<S: FrameSource>(
    mut source: S,
    config: &DecoderConfig,
    targets: &TargetSet,
) -> Result<Analysis, AnalysisError> {
    let mut analysis = Analysis::default();
    let mut first_ts = None;
    let mut last_ts = None;

    while let Some(record) = source.next_frame()? {
        analysis.summary.records_total += 1;
        if record.header.is_command_or_event() {
            analysis.summary.command_event_records += 1;
        }
        update_ts_bounds(&mut first_ts, &mut last_ts, record.header.timestamp);

        match decode_frame(&record, config) {
            FrameOutcome::Decoded(event) => {
                if let Some(found) = scan_event(&event, config, targets) {
                    analysis.payload_matches.push(found);
                }
                analysis.events.push(event);
            }
            FrameOutcome::Skipped(reason) => {
                tracing::debug!(
                    frame = record.index,
                    kind = ?reason.kind(),
                    %reason,
                    "frame skipped"
                );
                analysis.skipped.record(&reason);
            }
        }
    }

    analysis.summary.header = source.capture_header();
    analysis.summary.truncation = source.truncation();
    analysis.summary.time_start = first_ts.and_then(btsnoop_ts_to_rfc3339);
    analysis.summary.time_end = last_ts.and_then(btsnoop_ts_to_rfc3339);

    tracing::info!(
        records = analysis.summary.records_total,
        events = analysis.events.len(),
        payloads_matched = analysis.payload_matches.len(),
        skipped = analysis.skipped.total(),
        unsupported = analysis.skipped.unsupported,
        short = analysis.skipped.short,
        "capture decoded"
    );
    Ok(analysis)
}

/// Decode an event's value with the configured codec and search it for the
/// targets. Returns `None` when the scan filter excludes the event or
/// nothing matched.
pub fn scan_event(
    event: &AttEvent,
    config: &DecoderConfig,
    targets: &TargetSet,
) -> Option<PayloadMatches> {
    if targets.is_empty() || !config.scan.accepts(event.opcode, event.handle) {
        return None;
    }
    let decoded = config.codec.decode(&event.value);
    let matches = find_matches(&decoded, targets, config.match_mode);
    if matches.is_empty() {
        return None;
    }
    Some(PayloadMatches {
        frame_index: event.frame_index,
        opcode: event.opcode,
        handle: event.handle,
        decoded,
        matches,
    })
}

fn update_ts_bounds(first: &mut Option<u64>, last: &mut Option<u64>, ts: u64) {
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

#[cfg(test)]
mod tests {
    use super::update_ts_bounds;

    #[test]
    fn ts_bounds_track_min_and_max() {
        let mut first = None;
        let mut last = None;
        for ts in [5, 3, 9, 4] {
            update_ts_bounds(&mut first, &mut last, ts);
        }
        assert_eq!(first, Some(3));
        assert_eq!(last, Some(9));
    }
}
