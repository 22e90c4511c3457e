//! Analysis lifecycle: field groups applied to a report's metadata record.
//!
//! Lab staff fill in the metadata record a few columns at a time. Each
//! [`FieldGroup`] names one disjoint set of columns; the store applies a
//! group with a single upsert-with-defaults operation, so adding a group
//! here is all it takes to expose a new lifecycle update.

use crate::error::{Error, Result};
use time::Date;

/// Arrival/storage conditions seeded when a metadata record is materialized.
pub const DEFAULT_CONDITIONS: &str = "Unspecified";

/// Analysis unit seeded when a metadata record is materialized.
pub const DEFAULT_ANALYSIS_UNIT: &str = "ug";

/// Name meaning "no chemist assigned".
pub const NO_EMPLOYEE: &str = "N/A";

/// Extraction and analysis dates with their ordering enforced.
///
/// Any subset may be unknown. When both ends of a pair are known:
/// extraction <= analysis start, and analysis start <= analysis end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisDates {
    extraction: Option<Date>,
    analysis_start: Option<Date>,
    analysis_end: Option<Date>,
}

/// Partial update to [`AnalysisDates`]. Absent fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisDatesUpdate {
    pub extraction: Option<Date>,
    pub analysis_start: Option<Date>,
    pub analysis_end: Option<Date>,
}

impl AnalysisDates {
    pub fn new(
        extraction: Option<Date>,
        analysis_start: Option<Date>,
        analysis_end: Option<Date>,
    ) -> Result<Self> {
        if let (Some(extraction), Some(start)) = (extraction, analysis_start)
            && extraction > start
        {
            return Err(Error::DateOrder(format!(
                "extraction date {extraction} is after analysis start {start}"
            )));
        }
        if let (Some(start), Some(end)) = (analysis_start, analysis_end)
            && end < start
        {
            return Err(Error::DateOrder(format!(
                "analysis end {end} is before analysis start {start}"
            )));
        }
        Ok(Self {
            extraction,
            analysis_start,
            analysis_end,
        })
    }

    pub fn extraction(&self) -> Option<Date> {
        self.extraction
    }

    pub fn analysis_start(&self) -> Option<Date> {
        self.analysis_start
    }

    pub fn analysis_end(&self) -> Option<Date> {
        self.analysis_end
    }

    /// Overlay `update` onto these dates and re-check the ordering.
    pub fn merge(&self, update: &AnalysisDatesUpdate) -> Result<Self> {
        Self::new(
            update.extraction.or(self.extraction),
            update.analysis_start.or(self.analysis_start),
            update.analysis_end.or(self.analysis_end),
        )
    }
}

/// A column value to bind, independent of the database driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Date(Option<Date>),
    Id(Option<i64>),
}

/// A disjoint group of metadata columns updated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldGroup {
    ProjectNumber(String),
    Received {
        date_received: Date,
        arrival_conditions: String,
        storage_conditions: String,
    },
    /// Assigned preparing chemist; `None` clears the assignment.
    Chemist(Option<i64>),
    Reviewer(Option<i64>),
    AnalysisDates(AnalysisDatesUpdate),
    ReportIssued(Date),
    DueDate(Option<Date>),
}

impl FieldGroup {
    /// Short name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProjectNumber(_) => "project_number",
            Self::Received { .. } => "received",
            Self::Chemist(_) => "chemist",
            Self::Reviewer(_) => "reviewer",
            Self::AnalysisDates(_) => "analysis_dates",
            Self::ReportIssued(_) => "report_issued",
            Self::DueDate(_) => "due_date",
        }
    }

    /// Column assignments for this group given the currently stored dates.
    ///
    /// Only the analysis-dates group reads `current`: its update is merged
    /// with what is stored and the merged result must keep the date order.
    pub fn assignments(&self, current: &AnalysisDates) -> Result<Vec<(&'static str, FieldValue)>> {
        let assignments = match self {
            Self::ProjectNumber(number) => {
                vec![("project_number", FieldValue::Text(Some(number.clone())))]
            }
            Self::Received {
                date_received,
                arrival_conditions,
                storage_conditions,
            } => vec![
                ("date_received", FieldValue::Date(Some(*date_received))),
                (
                    "arrival_conditions",
                    FieldValue::Text(Some(arrival_conditions.clone())),
                ),
                (
                    "storage_conditions",
                    FieldValue::Text(Some(storage_conditions.clone())),
                ),
            ],
            Self::Chemist(employee_id) => vec![("prepared_by", FieldValue::Id(*employee_id))],
            Self::Reviewer(employee_id) => vec![("reviewed_by", FieldValue::Id(*employee_id))],
            Self::AnalysisDates(update) => {
                let merged = current.merge(update)?;
                vec![
                    ("extraction_date", FieldValue::Date(merged.extraction)),
                    ("analysis_start_date", FieldValue::Date(merged.analysis_start)),
                    ("analysis_end_date", FieldValue::Date(merged.analysis_end)),
                ]
            }
            Self::ReportIssued(date) => vec![("report_date", FieldValue::Date(Some(*date)))],
            Self::DueDate(date) => vec![("due_date", FieldValue::Date(*date))],
        };
        Ok(assignments)
    }
}
