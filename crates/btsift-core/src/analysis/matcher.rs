use serde::{Deserialize, Serialize};

use super::targets::TargetSet;

/// Bytes of context kept before a match offset.
pub const CONTEXT_BEFORE: usize = 4;
/// Bytes of context kept from the match offset onwards.
pub const CONTEXT_AFTER: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingWidth {
    U16,
    U32,
}

impl EncodingWidth {
    pub fn bits(self) -> u8 {
        match self {
            Self::U16 => 16,
            Self::U32 => 32,
        }
    }

    /// Little-endian encoding of `value`, or `None` when it does not fit.
    pub fn encode(self, value: u32) -> Option<Vec<u8>> {
        match self {
            Self::U16 => u16::try_from(value).ok().map(|v| v.to_le_bytes().to_vec()),
            Self::U32 => Some(value.to_le_bytes().to_vec()),
        }
    }
}

/// How many occurrences of one encoding are reported per buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// First occurrence per target and width.
    #[default]
    First,
    /// Every non-overlapping occurrence.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMatch {
    pub value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub width: EncodingWidth,
    pub offset: usize,
    /// Offset of the first context byte within the buffer.
    pub context_start: usize,
    #[serde(with = "hex::serde")]
    pub context: Vec<u8>,
}

/// Search `buf` for every target as LE u16 and, independently, LE u32.
///
/// Results are ordered by target, then width (16 before 32), then offset.
pub fn find_matches(buf: &[u8], targets: &TargetSet, mode: MatchMode) -> Vec<ValueMatch> {
    let mut matches = Vec::new();
    for target in targets {
        for width in [EncodingWidth::U16, EncodingWidth::U32] {
            let Some(needle) = width.encode(target.value) else {
                continue;
            };
            for offset in occurrences(buf, &needle, mode) {
                let (context_start, context) = context_window(buf, offset);
                matches.push(ValueMatch {
                    value: target.value,
                    label: target.label.clone(),
                    width,
                    offset,
                    context_start,
                    context: context.to_vec(),
                });
            }
        }
    }
    matches
}

/// Bytes from `offset - 4` up to `offset + 6`, clipped to the buffer.
pub fn context_window(buf: &[u8], offset: usize) -> (usize, &[u8]) {
    let start = offset.saturating_sub(CONTEXT_BEFORE).min(buf.len());
    let end = offset.saturating_add(CONTEXT_AFTER).min(buf.len());
    (start, &buf[start..end.max(start)])
}

fn occurrences(haystack: &[u8], needle: &[u8], mode: MatchMode) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() {
        return found;
    }
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        let Some(pos) = haystack[start..]
            .windows(needle.len())
            .position(|window| window == needle)
        else {
            break;
        };
        let at = start + pos;
        found.push(at);
        if mode == MatchMode::First {
            break;
        }
        start = at + needle.len();
    }
    found
}
