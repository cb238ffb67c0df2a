//! Aggregate counts by career.

use super::graduate::CAREER_OPTIONS;
use serde::Serialize;

/// Label of the bucket that collects careers outside [`CAREER_OPTIONS`].
pub const OTHER_CAREERS_LABEL: &str = "Otros";

/// Number of graduates sharing one `carrera` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareerCount {
    /// Career, `None` for records without one.
    pub carrera: Option<String>,
    /// Number of records.
    pub count: u64,
}

/// One labelled bar of a [`CareerSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    /// Display label.
    pub label: String,
    /// Number of records.
    pub count: u64,
}

/// Dashboard view of the roster: catalog careers first, then everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareerSummary {
    /// Catalog careers in catalog order, followed by [`OTHER_CAREERS_LABEL`]
    /// when any record falls outside the catalog.
    pub entries: Vec<SummaryEntry>,
    /// Sum of every entry.
    pub total: u64,
}

impl CareerSummary {
    /// Folds raw per-career counts into the dashboard layout.
    ///
    /// Records with no career, or a career not in [`CAREER_OPTIONS`], are
    /// counted under [`OTHER_CAREERS_LABEL`]. That entry is omitted when zero.
    #[must_use]
    pub fn from_counts(counts: &[CareerCount]) -> Self {
        let count_for = |label: &str| {
            counts
                .iter()
                .filter(|c| c.carrera.as_deref() == Some(label))
                .map(|c| c.count)
                .sum::<u64>()
        };

        let mut entries: Vec<SummaryEntry> = CAREER_OPTIONS
            .iter()
            .map(|label| SummaryEntry {
                label: (*label).to_string(),
                count: count_for(label),
            })
            .collect();

        let others: u64 = counts
            .iter()
            .filter(|c| {
                c.carrera
                    .as_deref()
                    .is_none_or(|carrera| !CAREER_OPTIONS.contains(&carrera))
            })
            .map(|c| c.count)
            .sum();
        if others > 0 {
            entries.push(SummaryEntry {
                label: OTHER_CAREERS_LABEL.to_string(),
                count: others,
            });
        }

        let total = entries.iter().map(|e| e.count).sum();
        Self { entries, total }
    }
}
