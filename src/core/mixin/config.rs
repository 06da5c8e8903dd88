// ─── Transform Config ───
// An explicit, ordered list of edits. Merging concatenates; applying replays
// the edits in order against a unit's bytes.

use std::fmt;
use std::sync::Arc;

use crate::core::archive::ArchiveReference;
use crate::core::error::{BootError, BootResult};

/// Archives that symbolic references in edits resolve against.
pub struct SymbolContext<'a> {
    archives: Vec<&'a ArchiveReference>,
}

impl<'a> SymbolContext<'a> {
    pub fn new(archives: impl IntoIterator<Item = &'a ArchiveReference>) -> Self {
        Self {
            archives: archives.into_iter().collect(),
        }
    }

    pub fn resolves(&self, unit: &str) -> bool {
        self.archives.iter().any(|a| a.reader().contains_unit(unit))
    }

    pub fn unit(&self, unit: &str) -> Option<Arc<[u8]>> {
        self.archives.iter().find_map(|a| a.reader().unit(unit))
    }
}

pub type CustomEdit = Arc<dyn Fn(Vec<u8>, &SymbolContext<'_>) -> BootResult<Vec<u8>> + Send + Sync>;

#[derive(Clone)]
pub enum UnitEdit {
    /// Replace every occurrence of `pattern`; fails if there is none.
    Replace { pattern: Vec<u8>, replacement: Vec<u8> },
    /// Insert before the first occurrence of `anchor`.
    InsertBefore { anchor: Vec<u8>, bytes: Vec<u8> },
    /// Insert after the first occurrence of `anchor`.
    InsertAfter { anchor: Vec<u8>, bytes: Vec<u8> },
    Prepend(Vec<u8>),
    Append(Vec<u8>),
    /// Fails unless the named unit exists in the symbol context.
    Require(String),
    Custom { name: String, edit: CustomEdit },
}

impl fmt::Debug for UnitEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitEdit::Replace { pattern, replacement } => f
                .debug_struct("Replace")
                .field("pattern", &String::from_utf8_lossy(pattern))
                .field("replacement", &String::from_utf8_lossy(replacement))
                .finish(),
            UnitEdit::InsertBefore { anchor, bytes } => f
                .debug_struct("InsertBefore")
                .field("anchor", &String::from_utf8_lossy(anchor))
                .field("bytes", &bytes.len())
                .finish(),
            UnitEdit::InsertAfter { anchor, bytes } => f
                .debug_struct("InsertAfter")
                .field("anchor", &String::from_utf8_lossy(anchor))
                .field("bytes", &bytes.len())
                .finish(),
            UnitEdit::Prepend(bytes) => f.debug_tuple("Prepend").field(&bytes.len()).finish(),
            UnitEdit::Append(bytes) => f.debug_tuple("Append").field(&bytes.len()).finish(),
            UnitEdit::Require(unit) => f.debug_tuple("Require").field(unit).finish(),
            UnitEdit::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn anchor_missing(kind: &str, anchor: &[u8]) -> BootError {
    BootError::Other(format!(
        "{} anchor '{}' not found",
        kind,
        String::from_utf8_lossy(anchor)
    ))
}

impl UnitEdit {
    pub fn apply(&self, mut bytes: Vec<u8>, symbols: &SymbolContext<'_>) -> BootResult<Vec<u8>> {
        match self {
            UnitEdit::Replace {
                pattern,
                replacement,
            } => {
                let mut out = Vec::with_capacity(bytes.len());
                let mut rest: &[u8] = &bytes;
                let mut replaced = false;
                while let Some(idx) = find(rest, pattern) {
                    out.extend_from_slice(&rest[..idx]);
                    out.extend_from_slice(replacement);
                    rest = &rest[idx + pattern.len()..];
                    replaced = true;
                }
                if !replaced {
                    return Err(anchor_missing("Replace", pattern));
                }
                out.extend_from_slice(rest);
                Ok(out)
            }
            UnitEdit::InsertBefore { anchor, bytes: insert } => {
                let idx = find(&bytes, anchor).ok_or_else(|| anchor_missing("InsertBefore", anchor))?;
                bytes.splice(idx..idx, insert.iter().copied());
                Ok(bytes)
            }
            UnitEdit::InsertAfter { anchor, bytes: insert } => {
                let idx = find(&bytes, anchor).ok_or_else(|| anchor_missing("InsertAfter", anchor))?
                    + anchor.len();
                bytes.splice(idx..idx, insert.iter().copied());
                Ok(bytes)
            }
            UnitEdit::Prepend(insert) => {
                bytes.splice(0..0, insert.iter().copied());
                Ok(bytes)
            }
            UnitEdit::Append(insert) => {
                bytes.extend_from_slice(insert);
                Ok(bytes)
            }
            UnitEdit::Require(unit) => {
                if symbols.resolves(unit) {
                    Ok(bytes)
                } else {
                    Err(BootError::Other(format!("Unresolved symbolic reference '{}'", unit)))
                }
            }
            UnitEdit::Custom { edit, .. } => edit(bytes, symbols),
        }
    }
}

/// Merged, applyable edit set for one target unit.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    edits: Vec<UnitEdit>,
}

impl TransformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edits(&self) -> &[UnitEdit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn push(mut self, edit: UnitEdit) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn replace(self, pattern: &[u8], replacement: &[u8]) -> Self {
        self.push(UnitEdit::Replace {
            pattern: pattern.to_vec(),
            replacement: replacement.to_vec(),
        })
    }

    pub fn insert_before(self, anchor: &[u8], bytes: &[u8]) -> Self {
        self.push(UnitEdit::InsertBefore {
            anchor: anchor.to_vec(),
            bytes: bytes.to_vec(),
        })
    }

    pub fn insert_after(self, anchor: &[u8], bytes: &[u8]) -> Self {
        self.push(UnitEdit::InsertAfter {
            anchor: anchor.to_vec(),
            bytes: bytes.to_vec(),
        })
    }

    pub fn prepend(self, bytes: &[u8]) -> Self {
        self.push(UnitEdit::Prepend(bytes.to_vec()))
    }

    pub fn append(self, bytes: &[u8]) -> Self {
        self.push(UnitEdit::Append(bytes.to_vec()))
    }

    pub fn require(self, unit: &str) -> Self {
        self.push(UnitEdit::Require(unit.to_string()))
    }

    pub fn custom<F>(self, name: &str, edit: F) -> Self
    where
        F: Fn(Vec<u8>, &SymbolContext<'_>) -> BootResult<Vec<u8>> + Send + Sync + 'static,
    {
        self.push(UnitEdit::Custom {
            name: name.to_string(),
            edit: Arc::new(edit),
        })
    }

    /// `self`'s edits followed by `other`'s.
    pub fn merge(mut self, other: TransformConfig) -> Self {
        self.edits.extend(other.edits);
        self
    }

    pub fn merge_all(configs: impl IntoIterator<Item = TransformConfig>) -> Self {
        configs
            .into_iter()
            .fold(TransformConfig::new(), TransformConfig::merge)
    }

    /// Replay every edit, in order, over `original`.
    pub fn apply(&self, original: &[u8], symbols: &SymbolContext<'_>) -> BootResult<Vec<u8>> {
        self.edits
            .iter()
            .try_fold(original.to_vec(), |bytes, edit| edit.apply(bytes, symbols))
    }
}
