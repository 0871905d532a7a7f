use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use btsift_core::{
    AclLengthPolicy, AnalysisError, AttEvent, AttOpcode, BtsnoopFileSource, DecoderConfig,
    MatchMode, PayloadMatches, ScanFilter, SourceError, TargetSet, XorCodec, decode_source,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::glob;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("BTSIFT_BUILD_COMMIT_FULL"),
    "\nbuilt: ",
    env!("BTSIFT_BUILD_DATE"),
);

const EXAMPLES: &str = "Examples:\n  btsift analyse btsnoop_hci.log -o report.json\n  btsift events btsnoop_hci.log --opcode notification\n  btsift search btsnoop_hci.log --target 1068\n  btsift xor 9A9C";

/// Step counts recorded on the watch while the capture was taken.
const DEFAULT_STEPS: [u32; 4] = [42, 13, 884, 1068];
/// Calorie readings recorded alongside.
const DEFAULT_KCAL: [u32; 7] = [1763, 990, 1704, 1925, 1540, 1797, 1776];

/// Payloads longer than this also get their full decoded hex printed.
const FULL_HEX_MIN_LEN: usize = 10;

/// Stands in for `0xHHHH` on read responses so event columns stay aligned.
const NO_HANDLE: &str = "------";

#[derive(Parser, Debug)]
#[command(name = "btsift")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BTSIFT_BUILD_COMMIT"), ")"))]
#[command(long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder for Bluetooth btsnoop captures (ACL / L2CAP / ATT).",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a capture and write a versioned JSON report.
    #[command(alias = "analyze")]
    Analyse {
        /// Path (or glob matching one file) to a btsnoop capture
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        #[command(flatten)]
        decoder: DecoderArgs,
    },
    /// Print one line per decoded ATT operation.
    Events {
        /// Path (or glob matching one file) to a btsnoop capture
        input: PathBuf,

        #[command(flatten)]
        decoder: DecoderArgs,
    },
    /// Decode attribute values and print where target readings occur.
    Search {
        /// Path (or glob matching one file) to a btsnoop capture
        input: PathBuf,

        #[command(flatten)]
        decoder: DecoderArgs,
    },
    /// Decode hex payloads with the XOR key and print hex and ASCII.
    Xor {
        /// Hex-encoded payloads, e.g. 9A9C or "9a 9c"
        #[arg(required = true)]
        payloads: Vec<String>,

        /// XOR key byte
        #[arg(long, value_parser = parse_u8, default_value = "0xFF")]
        key: u8,
    },
}

#[derive(Args, Debug)]
struct DecoderArgs {
    /// XOR key byte applied to attribute values
    #[arg(long, value_parser = parse_u8, default_value = "0xFF")]
    key: u8,

    /// L2CAP channel id carrying ATT
    #[arg(long, value_parser = parse_u16, default_value = "0x0004")]
    channel: u16,

    /// Clip ACL payloads to the declared length and skip short ones
    #[arg(long)]
    clip_acl_length: bool,

    /// Report every non-overlapping occurrence instead of the first
    #[arg(long)]
    all_occurrences: bool,

    /// Only scan these opcodes (name or hex code; repeatable)
    #[arg(long = "opcode", value_parser = parse_opcode)]
    opcodes: Vec<AttOpcode>,

    /// Only scan this attribute handle
    #[arg(long, value_parser = parse_u16)]
    handle: Option<u16>,

    /// Target value to search for (repeatable)
    #[arg(long = "target", value_parser = parse_u32)]
    target: Vec<u32>,

    /// JSON file with target values ({"label": [..]} or [..])
    #[arg(long)]
    targets: Option<PathBuf>,
}

impl DecoderArgs {
    fn config(&self) -> DecoderConfig {
        DecoderConfig {
            att_channel: self.channel,
            codec: XorCodec::new(self.key),
            acl_length: if self.clip_acl_length {
                AclLengthPolicy::Clip
            } else {
                AclLengthPolicy::PassThrough
            },
            match_mode: if self.all_occurrences {
                MatchMode::All
            } else {
                MatchMode::First
            },
            scan: ScanFilter {
                opcodes: self.opcodes.clone(),
                handle: self.handle,
            },
        }
    }

    /// Targets from `--targets` and `--target`, or the built-in readings
    /// when neither is given.
    fn target_set(&self) -> Result<TargetSet, CliError> {
        let mut targets = TargetSet::new();
        if let Some(path) = &self.targets {
            let loaded = TargetSet::from_json_file(path).map_err(|err| {
                CliError::new(
                    format!("failed to load targets from {}: {}", path.display(), err),
                    Some(r#"expected {"label": [values...]} or [values...]"#.to_string()),
                )
            })?;
            targets.extend(loaded);
        }
        for value in &self.target {
            targets.push(*value, None);
        }
        if targets.is_empty() {
            targets = default_targets();
        }
        Ok(targets)
    }
}

fn default_targets() -> TargetSet {
    let mut targets = TargetSet::new();
    for value in DEFAULT_STEPS {
        targets.push(value, Some("steps".to_string()));
    }
    for value in DEFAULT_KCAL {
        targets.push(value, Some("kcal".to_string()));
    }
    targets
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyse {
            input,
            report,
            stdout,
            pretty,
            compact,
            quiet,
            decoder,
        } => cmd_analyse(input, report, stdout, pretty, compact, quiet, &decoder),
        Commands::Events { input, decoder } => cmd_events(input, &decoder),
        Commands::Search { input, decoder } => cmd_search(input, &decoder),
        Commands::Xor { payloads, key } => cmd_xor(&payloads, key),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<AnalysisError> for CliError {
    fn from(err: AnalysisError) -> Self {
        let hint = match &err {
            AnalysisError::Source(SourceError::Format(_)) => {
                Some("expected an Android btsnoop_hci.log capture".to_string())
            }
            _ => None,
        };
        CliError::new(format!("btsnoop analysis failed: {err}"), hint)
    }
}

fn cmd_analyse(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    decoder: &DecoderArgs,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let config = decoder.config();
    let targets = decoder.target_set()?;
    let rep = btsift_core::analyze_btsnoop_file(&resolved_input, &config, &targets)?;
    let json = serialize_report(&rep, pretty, compact)?;

    let Some(report) = report else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    if !quiet {
        eprintln!(
            "OK: {} events, {} payloads matched -> {}",
            rep.events.len(),
            rep.payload_matches.len(),
            report.display()
        );
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match report_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Ok(()),
    };
    // A directory that does not exist yet cannot hold the input.
    if !parent.exists() {
        return Ok(());
    }
    let report_dir = fs::canonicalize(parent)
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn cmd_events(input: PathBuf, decoder: &DecoderArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;

    let config = decoder.config();
    let source = BtsnoopFileSource::open(&resolved_input).map_err(AnalysisError::from)?;
    let analysis = decode_source(source, &config, &TargetSet::new())?;
    for event in analysis
        .events
        .iter()
        .filter(|event| config.scan.accepts(event.opcode, event.handle))
    {
        println!("{}", format_event(event));
    }
    Ok(())
}

fn cmd_search(input: PathBuf, decoder: &DecoderArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;

    let targets = decoder.target_set()?;
    tracing::info!(targets = targets.len(), "searching decoded payloads");
    let rep = btsift_core::analyze_btsnoop_file(&resolved_input, &decoder.config(), &targets)?;
    if rep.payload_matches.is_empty() {
        eprintln!("no target values found");
        return Ok(());
    }
    for found in &rep.payload_matches {
        for line in format_payload_matches(found) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_xor(payloads: &[String], key: u8) -> Result<(), CliError> {
    let codec = XorCodec::new(key);
    for (i, raw) in payloads.iter().enumerate() {
        let bytes = parse_hex_payload(raw)?;
        let decoded = codec.decode(&bytes);
        println!("Payload {}:", i + 1);
        println!("Hex: {}", hex::encode_upper(&decoded));
        println!("ASCII: {}", printable_ascii(&decoded));
    }
    Ok(())
}

fn format_event(event: &AttEvent) -> String {
    let label = opcode_label(event.opcode);
    let value = hex::encode_upper(&event.value);
    match event.handle {
        Some(handle) => format!(
            "#{} {} Handle: 0x{:04X} Value: {}",
            event.frame_index, label, handle, value
        ),
        None => format!(
            "#{} {} Handle: {} Value: {}",
            event.frame_index, label, NO_HANDLE, value
        ),
    }
}

fn format_payload_matches(found: &PayloadMatches) -> Vec<String> {
    let mut lines = Vec::new();
    for hit in &found.matches {
        let mut line = format!(
            "#{} FOUND {} (0x{:04X}) as u{} at index {}",
            found.frame_index,
            hit.value,
            hit.value,
            hit.width.bits(),
            hit.offset
        );
        if let Some(label) = &hit.label {
            line.push_str(&format!(" [{}]", label));
        }
        lines.push(line);
        lines.push(format!("   Context: {}", hex::encode_upper(&hit.context)));
    }
    if found.decoded.len() > FULL_HEX_MIN_LEN {
        lines.push(format!(
            " -- Full Packet Hex: {}",
            hex::encode_upper(&found.decoded)
        ));
    }
    lines
}

fn opcode_label(opcode: AttOpcode) -> &'static str {
    match opcode {
        AttOpcode::WriteCommand => "Write Cmd",
        AttOpcode::WriteRequest => "Write Req",
        AttOpcode::Notification => "Notify",
        AttOpcode::ReadResponse => "Read Rsp",
    }
}

fn printable_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn parse_hex_payload(raw: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = raw.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&digits).map_err(|err| {
        CliError::new(
            format!("invalid hex payload '{}': {}", raw, err),
            Some("use an even number of hex digits, e.g. 9A9C".to_string()),
        )
    })
}

fn serialize_report(
    rep: &btsift_core::Report,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn parse_int(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|err| format!("invalid number '{}': {}", raw, err))
}

fn parse_u8(raw: &str) -> Result<u8, String> {
    let value = parse_int(raw)?;
    u8::try_from(value).map_err(|_| format!("{} does not fit in one byte", raw))
}

fn parse_u16(raw: &str) -> Result<u16, String> {
    let value = parse_int(raw)?;
    u16::try_from(value).map_err(|_| format!("{} does not fit in 16 bits", raw))
}

fn parse_u32(raw: &str) -> Result<u32, String> {
    let value = parse_int(raw)?;
    u32::try_from(value).map_err(|_| format!("{} does not fit in 32 bits", raw))
}

fn parse_opcode(raw: &str) -> Result<AttOpcode, String> {
    raw.parse::<AttOpcode>().map_err(|err| err.to_string())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a btsnoop capture such as btsnoop_hci.log".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a btsnoop capture such as btsnoop_hci.log".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => {
            let path = matches.remove(0);
            tracing::debug!(path = %path.display(), "input pattern resolved");
            Ok(path)
        }
        count => {
            let mut message = format!(
                "multiple files match pattern '{}' ({} matches); matches: ",
                pattern, count
            );
            message.push_str(
                &matches
                    .iter()
                    .take(3)
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_hex_prefix() {
        assert_eq!(parse_u8("0xFF"), Ok(0xFF));
        assert_eq!(parse_u16("4"), Ok(4));
        assert_eq!(parse_u32("0X042c"), Ok(1068));
        assert!(parse_u8("256").is_err());
        assert!(parse_u16("0xZZ").is_err());
    }

    #[test]
    fn default_targets_are_labeled() {
        let targets = default_targets();
        assert_eq!(targets.len(), DEFAULT_STEPS.len() + DEFAULT_KCAL.len());
        let first = targets.iter().next().expect("first target");
        assert_eq!(first.value, 42);
        assert_eq!(first.label.as_deref(), Some("steps"));
    }

    #[test]
    fn ascii_rendering_masks_non_printables() {
        assert_eq!(printable_ascii(&[0x65, 0x63, 0x00, 0x20, 0x7F]), "ec. .");
    }

    #[test]
    fn read_response_keeps_handle_column() {
        let event = AttEvent {
            frame_index: 9,
            timestamp: None,
            direction: btsift_core::Direction::Received,
            connection_handle: 0x40,
            opcode: AttOpcode::ReadResponse,
            handle: None,
            value: vec![0x01, 0xAB],
        };
        assert_eq!(format_event(&event), "#9 Read Rsp Handle: ------ Value: 01AB");

        let notify = AttEvent {
            opcode: AttOpcode::Notification,
            handle: Some(0x13),
            ..event
        };
        assert_eq!(
            format_event(&notify),
            "#9 Notify Handle: 0x0013 Value: 01AB"
        );
    }

    #[test]
    fn output_in_missing_directory_is_distinct() {
        let temp = tempfile::TempDir::new().expect("tempdir");
        let input = temp.path().join("btsnoop_hci.log");
        fs::write(&input, b"btsnoop\0").expect("write input");
        let input_abs = fs::canonicalize(&input).expect("canonical input");

        let fresh = temp.path().join("not").join("yet").join("report.json");
        assert!(ensure_distinct_output(&fresh, &input_abs).is_ok());
        assert!(ensure_distinct_output(&input, &input_abs).is_err());
    }

    #[test]
    fn hex_payload_tolerates_prefix_and_spaces() {
        assert_eq!(parse_hex_payload("0x9a 9C").unwrap(), vec![0x9A, 0x9C]);
        assert!(parse_hex_payload("9A9").is_err());
    }
}
