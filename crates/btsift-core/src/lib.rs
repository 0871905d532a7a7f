//! btsift core library for offline Bluetooth HCI capture analysis.
//!
//! This crate walks a btsnoop capture record by record and peels each frame
//! through four layers: the H4 transport tag, the HCI ACL header, the L2CAP
//! basic header and the attribute protocol (ATT). Recovered attribute values
//! are passed through a fixed-key XOR codec and searched for known readings
//! encoded as little-endian 16- and 32-bit integers.
//!
//! Decoding is byte-oriented and side-effect free; all I/O is isolated in
//! `source`. Protocol constants live in each layer's `layout` module.
//!
//! Invariants:
//! - Only a bad container header is fatal. Every per-frame problem becomes a
//!   counted `SkipReason` and the pass moves on to the next record.
//! - A capture cut mid-record ends cleanly after the last complete record.
//! - No state crosses frame boundaries.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use btsift_core::{DecoderConfig, TargetSet, analyze_btsnoop_file};
//!
//! let targets = TargetSet::from_values([42, 1068]);
//! let report = analyze_btsnoop_file(
//!     Path::new("btsnoop_hci.log"),
//!     &DecoderConfig::default(),
//!     &targets,
//! )?;
//! for found in &report.payload_matches {
//!     println!("frame {}: {} hit(s)", found.frame_index, found.matches.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
mod codec;
mod config;
pub mod protocols;
mod source;

pub use analysis::{
    Analysis, AnalysisError, AttEvent, EncodingWidth, FrameOutcome, MatchMode, PayloadMatches,
    SkipCounts, SkipKind, SkipReason, Target, TargetError, TargetSet, ValueMatch,
    analyze_btsnoop_file, decode_frame, decode_source, find_matches, scan_event,
};
pub use codec::{DEFAULT_XOR_KEY, XorCodec};
pub use config::{DecoderConfig, ScanFilter};
pub use protocols::att::AttOpcode;
pub use protocols::hci::AclLengthPolicy;
pub use source::{
    BtsnoopFileSource, CaptureHeader, Direction, FrameRecord, FrameSource, RecordHeader,
    SourceError, Truncation,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Result of one decoding pass, ready to serialize.
///
/// # Examples
/// ```
/// use btsift_core::make_stub_report;
///
/// let report = make_stub_report("btsnoop_hci.log", 123);
/// assert_eq!(report.report_version, btsift_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp of the last record, or the epoch when unknown.
    pub generated_at: String,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Decoder settings the report was produced with.
    pub config: DecoderConfig,
    /// Values searched for, in search order.
    pub targets: Vec<Target>,
    pub capture_summary: CaptureSummary,
    /// Decoded ATT operations in capture order.
    pub events: Vec<AttEvent>,
    /// Decoded payloads containing at least one target, in capture order.
    pub payload_matches: Vec<PayloadMatches>,
    /// Frames that produced no event, by reason.
    pub skipped: SkipCounts,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use btsift_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "btsift".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "btsift");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "btsift").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Capture-level counters and bounds.
///
/// # Examples
/// ```
/// use btsift_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     records_total: 10,
///     ..CaptureSummary::default()
/// };
/// assert!(summary.truncation.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Complete records read from the capture.
    pub records_total: u64,
    /// Records whose header flags mark them as HCI commands or events.
    pub command_event_records: u64,
    /// Container version and datalink type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<CaptureHeader>,
    /// RFC3339 timestamp of the earliest record (if representable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest record (if representable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
    /// Set when the capture ended on a partial record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
}

/// Build a report with base fields filled and empty results.
///
/// # Examples
/// ```
/// use btsift_core::make_stub_report;
///
/// let report = make_stub_report("btsnoop_hci.log", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.events.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "btsift".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        config: DecoderConfig::default(),
        targets: vec![],
        capture_summary: CaptureSummary::default(),
        events: vec![],
        payload_matches: vec![],
        skipped: SkipCounts::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("btsnoop_hci.log", 1);
        report.events.push(AttEvent {
            frame_index: 3,
            timestamp: None,
            direction: Direction::Received,
            connection_handle: 0x40,
            opcode: AttOpcode::ReadResponse,
            handle: None,
            value: vec![0xAB],
        });

        let value = serde_json::to_value(&report).expect("report json");
        let capture = value.get("capture_summary").expect("capture_summary");
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("truncation").is_none());

        let event = &value["events"][0];
        assert!(event.get("handle").is_none());
        assert!(event.get("timestamp").is_none());
        assert_eq!(event["opcode"], "read-response");
        assert_eq!(event["direction"], "received");
        assert_eq!(event["value"], "ab");
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = make_stub_report("capture.log", 7);
        let json = serde_json::to_string(&report).expect("serialize");
        let parsed: Report = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.input.bytes, 7);
        assert_eq!(parsed.config, DecoderConfig::default());
    }
}
