//! What a host does when the user picks a result.

use super::grouping::DisplayItem;
use super::record::MatchRecord;
use crate::corpus::SourceId;
use serde::Serialize;
use std::path::PathBuf;

/// Zero-based cursor target inside the opened source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

/// Open `path`; when `cursor` is set, place the cursor there and reveal it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub source_id: SourceId,
    pub path: PathBuf,
    pub cursor: Option<CursorPosition>,
}

impl Activation {
    pub fn for_record(record: &MatchRecord) -> Self {
        Self {
            source_id: record.source_id.clone(),
            path: record.path.clone(),
            cursor: record
                .line_number()
                .map(|line| CursorPosition { line, column: 0 }),
        }
    }
}

/// The selected row has no record attached (a group separator, or an index
/// past the end of the list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("entry {index} is not a selectable result")]
pub struct InvalidSelection {
    pub index: usize,
}

pub fn activate(items: &[DisplayItem], index: usize) -> Result<Activation, InvalidSelection> {
    items
        .get(index)
        .and_then(DisplayItem::record)
        .map(Activation::for_record)
        .ok_or(InvalidSelection { index })
}
