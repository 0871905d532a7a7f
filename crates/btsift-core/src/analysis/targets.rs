use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A ground-truth reading to look for in decoded payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Ordered collection of targets supplied by the caller, unique by value.
///
/// # Examples
/// ```
/// use btsift_core::TargetSet;
///
/// let targets = TargetSet::from_json_str(r#"{"steps": [42, 13], "kcal": [1763]}"#)?;
/// assert_eq!(targets.len(), 3);
/// # Ok::<(), btsift_core::TargetError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    targets: Vec<Target>,
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid target list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetFile {
    Labeled(BTreeMap<String, Vec<u32>>),
    Plain(Vec<u32>),
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I: IntoIterator<Item = u32>>(values: I) -> Self {
        let mut set = Self::new();
        for value in values {
            set.push(value, None);
        }
        set
    }

    /// Parse either `{"label": [values...]}` or a bare `[values...]` list.
    pub fn from_json_str(json: &str) -> Result<Self, TargetError> {
        let mut set = Self::new();
        match serde_json::from_str::<TargetFile>(json)? {
            TargetFile::Labeled(groups) => {
                for (label, values) in groups {
                    for value in values {
                        set.push(value, Some(label.clone()));
                    }
                }
            }
            TargetFile::Plain(values) => {
                for value in values {
                    set.push(value, None);
                }
            }
        }
        Ok(set)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TargetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add a target unless its value is already present.
    ///
    /// A repeated value keeps its first position and first label; an
    /// unlabeled entry picks up the label of a later duplicate.
    pub fn push(&mut self, value: u32, label: Option<String>) {
        match self.targets.iter_mut().find(|t| t.value == value) {
            Some(existing) => {
                if existing.label.is_none() {
                    existing.label = label;
                }
            }
            None => self.targets.push(Target { value, label }),
        }
    }

    pub fn extend(&mut self, other: TargetSet) {
        for target in other.targets {
            self.push(target.value, target.label);
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
