//! Turning a flat record list into display items grouped by workspace root.
//!
//! This runs after the scan and after the result cap. It only reorders
//! records between groups; order inside a group is the scan order.

use super::engine::UNKNOWN_ROOT;
use super::record::{MatchKind, MatchRecord};
use serde::Serialize;
use std::collections::BTreeMap;

/// A selectable row carrying its record and display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub label: String,
    pub description: String,
    pub detail: String,
    pub record: MatchRecord,
}

impl ResultItem {
    pub fn from_record(record: MatchRecord) -> Self {
        let description = match &record.kind {
            MatchKind::Content {
                line_number,
                line_text,
                ..
            } => format!("Line {}: {}", line_number + 1, line_text),
            MatchKind::Name => "File name match".to_string(),
        };

        Self {
            label: record.file_name.clone(),
            description,
            detail: record.relative_path.clone(),
            record,
        }
    }
}

/// One row of the presented result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayItem {
    /// Group header: root name and the number of entries under it
    Separator { label: String, count: usize },
    Entry(ResultItem),
}

impl DisplayItem {
    /// The record behind this row; separators have none.
    pub fn record(&self) -> Option<&MatchRecord> {
        match self {
            DisplayItem::Entry(item) => Some(&item.record),
            DisplayItem::Separator { .. } => None,
        }
    }
}

/// Group records by root name, groups in ordinal name order.
///
/// Records without a root go to the `"Unknown"` group, which sorts by its
/// literal name like any other. Separators are emitted only when there is
/// more than one group.
pub fn group_results(records: Vec<MatchRecord>) -> Vec<DisplayItem> {
    let mut groups: BTreeMap<String, Vec<MatchRecord>> = BTreeMap::new();
    for record in records {
        let key = record
            .root_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_ROOT.to_string());
        groups.entry(key).or_default().push(record);
    }

    let with_headers = groups.len() > 1;
    let mut items = Vec::new();
    for (root, records) in groups {
        if with_headers {
            items.push(DisplayItem::Separator {
                label: root,
                count: records.len(),
            });
        }
        items.extend(
            records
                .into_iter()
                .map(|record| DisplayItem::Entry(ResultItem::from_record(record))),
        );
    }
    items
}
