use serde::{Deserialize, Serialize};

use super::frame::{SkipKind, SkipReason};

/// Counts of frames that produced no event, per reason and per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Frames on a transport, channel or opcode outside the decoded set.
    pub unsupported: u64,
    /// Frames too short for one of the layer headers.
    pub short: u64,
    pub empty_frames: u64,
    pub unsupported_transport: u64,
    pub short_acl: u64,
    pub acl_length_mismatch: u64,
    pub short_l2cap: u64,
    pub unsupported_channel: u64,
    pub short_att: u64,
    pub unrecognized_opcode: u64,
}

impl SkipCounts {
    pub fn record(&mut self, reason: &SkipReason) {
        let slot = match reason {
            SkipReason::EmptyFrame => &mut self.empty_frames,
            SkipReason::UnsupportedTransport { .. } => &mut self.unsupported_transport,
            SkipReason::ShortAcl { .. } => &mut self.short_acl,
            SkipReason::AclLengthMismatch { .. } => &mut self.acl_length_mismatch,
            SkipReason::ShortL2cap { .. } => &mut self.short_l2cap,
            SkipReason::UnsupportedChannel { .. } => &mut self.unsupported_channel,
            SkipReason::ShortAtt { .. } => &mut self.short_att,
            SkipReason::UnrecognizedOpcode { .. } => &mut self.unrecognized_opcode,
        };
        *slot += 1;
        match reason.kind() {
            SkipKind::Empty => {}
            SkipKind::Unsupported => self.unsupported += 1,
            SkipKind::Short => self.short += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.empty_frames
            + self.unsupported_transport
            + self.short_acl
            + self.acl_length_mismatch
            + self.short_l2cap
            + self.unsupported_channel
            + self.short_att
            + self.unrecognized_opcode
    }
}

#[cfg(test)]
mod tests {
    use super::SkipCounts;
    use crate::analysis::frame::SkipReason;

    #[test]
    fn counts_each_reason_separately() {
        let mut counts = SkipCounts::default();
        counts.record(&SkipReason::EmptyFrame);
        counts.record(&SkipReason::UnsupportedTransport { tag: 4 });
        counts.record(&SkipReason::UnsupportedTransport { tag: 1 });
        counts.record(&SkipReason::UnrecognizedOpcode { opcode: 0x0b });

        assert_eq!(counts.empty_frames, 1);
        assert_eq!(counts.unsupported_transport, 2);
        assert_eq!(counts.unrecognized_opcode, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.unsupported, 3);
        assert_eq!(counts.short, 0);
    }

    #[test]
    fn short_reasons_roll_up_by_kind() {
        let mut counts = SkipCounts::default();
        counts.record(&SkipReason::ShortAcl {
            needed: 5,
            actual: 3,
        });
        counts.record(&SkipReason::AclLengthMismatch {
            declared: 9,
            available: 8,
        });
        counts.record(&SkipReason::ShortAtt {
            needed: 1,
            actual: 0,
        });
        counts.record(&SkipReason::EmptyFrame);

        assert_eq!(counts.short, 3);
        assert_eq!(counts.unsupported, 0);
        assert_eq!(counts.total(), 4);
    }
}
