//! Batched text edits and verified file writes.
//!
//! A [`ChangeSet`] collects replace, insert and move operations addressed in
//! the offsets of the text they were computed against. [`ChangeSet::apply`]
//! treats them as simultaneous: it sorts them, rejects overlaps and builds
//! the new text in a single pass, so no operation shifts the coordinates of
//! another.

use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// One operation of a [`ChangeSet`], in original offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace `[start, end)` with `text`. An insert has `start == end`.
    Replace {
        start: usize,
        end: usize,
        text: String,
    },
    /// Cut `[start, end)` and paste it at `destination`.
    Move {
        start: usize,
        end: usize,
        destination: usize,
    },
}

/// Which side of an insertion an offset sticks to when mapped through an
/// applied change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stay before text inserted exactly at the offset.
    Left,
    /// Move past text inserted exactly at the offset.
    Right,
}

/// Ordered collection of edits, applied all at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "ChangeSet does nothing until apply() is called"]
pub struct ChangeSet {
    operations: Vec<Operation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `[start, end)` with `text`. Dropped if `end < start`.
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        if end < start {
            tracing::debug!(start, end, "dropping replace with inverted range");
            return;
        }
        self.operations.push(Operation::Replace {
            start,
            end,
            text: text.into(),
        });
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace(offset, offset, text);
    }

    pub fn remove(&mut self, start: usize, end: usize) {
        self.replace(start, end, String::new());
    }

    /// Move `[start, end)` to `destination`. Dropped unless `start < end`.
    pub fn move_range(&mut self, start: usize, end: usize, destination: usize) {
        if end <= start {
            tracing::debug!(start, end, destination, "dropping move with empty range");
            return;
        }
        self.operations.push(Operation::Move {
            start,
            end,
            destination,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Source ranges touched by the set, with moves split into their cut and
    /// their paste point, sorted by position.
    pub fn source_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self
            .operations
            .iter()
            .flat_map(|op| match *op {
                Operation::Replace { start, end, .. } => vec![start..end],
                Operation::Move {
                    start,
                    end,
                    destination,
                } => vec![start..end, destination..destination],
            })
            .collect();
        ranges.sort_by_key(|r| (r.start, r.end));
        ranges
    }

    /// Fail with [`EditError::Overlap`] if two operations touch overlapping
    /// source ranges. Inserts at the boundary of a range do not overlap it.
    pub fn check_disjoint(&self) -> Result<(), EditError> {
        let ranges = self.source_ranges();
        for pair in ranges.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(EditError::Overlap {
                    first: pair[0].clone(),
                    second: pair[1].clone(),
                });
            }
        }
        Ok(())
    }

    /// Apply every operation to `text` at once.
    pub fn apply(&self, text: &str) -> Result<AppliedText, EditError> {
        let mut edits = Vec::with_capacity(self.operations.len());
        for op in &self.operations {
            match op {
                Operation::Replace { start, end, text: new } => {
                    check_range(text, *start, *end)?;
                    edits.push(Replacement {
                        start: *start,
                        end: *end,
                        text: new.clone(),
                    });
                }
                Operation::Move {
                    start,
                    end,
                    destination,
                } => {
                    check_range(text, *start, *end)?;
                    check_range(text, *destination, *destination)?;
                    edits.push(Replacement {
                        start: *start,
                        end: *end,
                        text: String::new(),
                    });
                    edits.push(Replacement {
                        start: *destination,
                        end: *destination,
                        text: text[*start..*end].to_string(),
                    });
                }
            }
        }

        // Stable, so inserts at the same offset keep their emission order.
        edits.sort_by_key(|e| (e.start, e.end));

        for pair in edits.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(EditError::Overlap {
                    first: pair[0].start..pair[0].end,
                    second: pair[1].start..pair[1].end,
                });
            }
        }

        let grown: usize = edits.iter().map(|e| e.text.len()).sum();
        let mut result = String::with_capacity(text.len() + grown);
        let mut copied = 0;
        for edit in &edits {
            result.push_str(&text[copied..edit.start]);
            result.push_str(&edit.text);
            copied = edit.end;
        }
        result.push_str(&text[copied..]);

        Ok(AppliedText {
            text: result,
            edits,
        })
    }
}

fn check_range(text: &str, start: usize, end: usize) -> Result<(), EditError> {
    if start > end || end > text.len() {
        return Err(EditError::InvalidByteRange {
            byte_start: start,
            byte_end: end,
            file_len: text.len(),
        });
    }
    if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(EditError::InvalidUtf8Edit);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Replacement {
    start: usize,
    end: usize,
    text: String,
}

/// The result of [`ChangeSet::apply`]: the new text plus what is needed to
/// map old offsets into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedText {
    pub text: String,
    edits: Vec<Replacement>,
}

impl AppliedText {
    /// Map an offset of the original text into the new text.
    ///
    /// Offsets strictly inside a replaced range collapse onto the start
    /// ([`Bias::Left`]) or the end ([`Bias::Right`]) of its replacement.
    pub fn map_offset(&self, offset: usize, bias: Bias) -> usize {
        let mut mapped = offset;
        for edit in &self.edits {
            let removed = edit.end - edit.start;
            let inserted = edit.text.len();
            let is_insert = removed == 0;

            let before = edit.end < offset
                || (edit.end == offset && !is_insert)
                || (is_insert && edit.start == offset && bias == Bias::Right);

            if before {
                mapped = mapped + inserted - removed;
            } else if edit.start < offset && offset < edit.end {
                let shift = offset - edit.start;
                mapped -= shift;
                if bias == Bias::Right {
                    mapped += inserted;
                }
            }
        }
        mapped
    }

    /// Map `range` so that text inserted at either end stays inside it.
    pub fn map_range(&self, range: Range<usize>) -> Range<usize> {
        self.map_offset(range.start, Bias::Left)..self.map_offset(range.end, Bias::Right)
    }
}

/// Verification strategy for file writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large files)
    Hash(u64),
}

impl EditVerification {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("{} changed on disk since the fix was computed", file.display())]
    BeforeTextMismatch {
        file: PathBuf,
        expected: String,
        found_len: usize,
    },

    #[error("Invalid byte range: [{byte_start}, {byte_end}) in text of length {file_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        file_len: usize,
    },

    #[error("Overlapping edits: {first:?} and {second:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid edit would split a UTF-8 character")]
    InvalidUtf8Edit,
}

/// Result of writing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    Applied { file: PathBuf, bytes_written: usize },
    /// The file already holds the new text.
    AlreadyApplied { file: PathBuf },
}

/// Replace the content of `path` with `new_text`, provided the file still
/// holds what `expected` describes.
///
/// The write is atomic and bumps the file's mtime.
pub fn write_verified(
    path: &Path,
    expected: &EditVerification,
    new_text: &str,
) -> Result<EditResult, EditError> {
    let current = fs::read_to_string(path)?;

    if current == new_text {
        return Ok(EditResult::AlreadyApplied {
            file: path.to_path_buf(),
        });
    }

    if !expected.matches(&current) {
        return Err(EditError::BeforeTextMismatch {
            file: path.to_path_buf(),
            expected: format!("{expected:?}"),
            found_len: current.len(),
        });
    }

    atomic_write(path, new_text.as_bytes())?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;

    Ok(EditResult::Applied {
        file: path.to_path_buf(),
        bytes_written: new_text.len(),
    })
}

/// Atomic file write: tempfile + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory, so the rename stays on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
