use serde::{Deserialize, Serialize};

use crate::analysis::matcher::MatchMode;
use crate::codec::XorCodec;
use crate::protocols::att::AttOpcode;
use crate::protocols::hci::AclLengthPolicy;
use crate::protocols::l2cap::layout::CID_ATT;

/// Decoder knobs. `Default` reproduces the behavior observed on device
/// captures: ATT on channel 0x0004, key 0xFF, unclipped ACL payloads, first
/// match only, every decoded event scanned.
///
/// # Examples
/// ```
/// use btsift_core::{AclLengthPolicy, DecoderConfig, MatchMode};
///
/// let config = DecoderConfig {
///     acl_length: AclLengthPolicy::Clip,
///     match_mode: MatchMode::All,
///     ..DecoderConfig::default()
/// };
/// assert_eq!(config.att_channel, 0x0004);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub att_channel: u16,
    pub codec: XorCodec,
    pub acl_length: AclLengthPolicy,
    pub match_mode: MatchMode,
    pub scan: ScanFilter,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            att_channel: CID_ATT,
            codec: XorCodec::default(),
            acl_length: AclLengthPolicy::default(),
            match_mode: MatchMode::default(),
            scan: ScanFilter::default(),
        }
    }
}

/// Which decoded events are passed through the codec and value matcher.
///
/// Events are always reported; the filter only limits scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    /// Opcodes to scan; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opcodes: Vec<AttOpcode>,
    /// Attribute handle to scan; read responses carry none and never pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<u16>,
}

impl ScanFilter {
    pub fn accepts(&self, opcode: AttOpcode, handle: Option<u16>) -> bool {
        let opcode_ok = self.opcodes.is_empty() || self.opcodes.contains(&opcode);
        let handle_ok = match self.handle {
            Some(wanted) => handle == Some(wanted),
            None => true,
        };
        opcode_ok && handle_ok
    }
}

#[cfg(test)]
mod tests {
    use super::{DecoderConfig, ScanFilter};
    use crate::protocols::att::AttOpcode;

    #[test]
    fn default_filter_accepts_everything() {
        let filter = ScanFilter::default();
        assert!(filter.accepts(AttOpcode::ReadResponse, None));
        assert!(filter.accepts(AttOpcode::Notification, Some(0x13)));
    }

    #[test]
    fn opcode_filter() {
        let filter = ScanFilter {
            opcodes: vec![AttOpcode::Notification],
            handle: None,
        };
        assert!(filter.accepts(AttOpcode::Notification, Some(1)));
        assert!(!filter.accepts(AttOpcode::WriteCommand, Some(1)));
    }

    #[test]
    fn handle_filter_rejects_handleless_pdus() {
        let filter = ScanFilter {
            opcodes: Vec::new(),
            handle: Some(0x0013),
        };
        assert!(filter.accepts(AttOpcode::Notification, Some(0x0013)));
        assert!(!filter.accepts(AttOpcode::Notification, Some(0x0014)));
        assert!(!filter.accepts(AttOpcode::ReadResponse, None));
    }

    #[test]
    fn default_config_serializes_policy_names() {
        let value = serde_json::to_value(DecoderConfig::default()).unwrap();
        assert_eq!(value["att_channel"], 4);
        assert_eq!(value["codec"]["key"], 255);
        assert_eq!(value["acl_length"], "pass_through");
        assert_eq!(value["match_mode"], "first");
        assert!(value["scan"].get("opcodes").is_none());
    }
}
