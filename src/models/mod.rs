//! Data models for the graduate roster.

mod graduate;
mod stats;

pub use graduate::{CAREER_OPTIONS, ESTATUS_VALUES, Graduate, GraduateFields};
pub use stats::{CareerCount, CareerSummary, OTHER_CAREERS_LABEL, SummaryEntry};
