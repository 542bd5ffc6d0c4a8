//! Core data types shared by the enumerator, the candidate store and the detector.
//!
//! Candidates are the rows of the `domains` table. `DetectionResponse` is the
//! JSON body returned by the availability check API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// TLD every generated candidate is registered under.
pub const DEFAULT_SUFFIX: &str = "com";

/// Number of rows the detector pulls from the store per page.
pub const PAGE_SIZE: usize = 100;

/// Detection outcome stored in the `status` column.
///
/// The column holds the raw availability code from the API: `NULL` until the
/// first successful detection that carried data, `0` for a taken name and any
/// other value for a registrable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    /// Not detected yet, or the API returned no module entries
    Unknown,
    /// The API reported `avail == 0`
    Unavailable,
    /// The API reported a nonzero availability code
    Available(i64),
}

impl CandidateStatus {
    /// Map a nullable `status` column value to a status.
    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            None => Self::Unknown,
            Some(0) => Self::Unavailable,
            Some(code) => Self::Available(code),
        }
    }

    /// Value written back to the `status` column.
    pub fn to_column(self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::Unavailable => Some(0),
            Self::Available(code) => Some(code),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A persisted candidate domain name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Row id, assigned by the store in insertion order
    pub id: i64,

    /// Generated label (e.g. "a0z")
    pub name: String,

    /// `name.len()`, stored for query convenience
    pub length: usize,

    /// TLD the label is checked under
    pub suffix: String,

    /// Outcome of the last detection that carried data
    pub status: CandidateStatus,

    /// Raw response body of the last detection attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// When the row was inserted
    pub created_at: DateTime<Utc>,

    /// When the row was last written by the detector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Fully qualified domain name, as sent to the check API.
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.name, self.suffix)
    }
}

/// Body returned by the availability check API.
///
/// Every field defaults so that a partial body still decodes; a body that is
/// not JSON at all decodes to `DetectionResponse::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionResponse {
    #[serde(rename = "errorCode")]
    pub error_code: i64,

    pub success: String,

    pub module: Vec<ModuleEntry>,
}

/// One entry of the `module` array in a check response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleEntry {
    pub avail: i64,
    pub name: String,
    pub tld: String,
}

impl DetectionResponse {
    /// Decode a response body, falling back to the zero value on malformed input.
    pub fn parse_lenient(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Availability code of the first module entry, if any.
    pub fn availability(&self) -> Option<i64> {
        self.module.first().map(|m| m.avail)
    }

    /// Status to record for this response, `None` when the body carried no data.
    pub fn status(&self) -> Option<CandidateStatus> {
        self.availability()
            .map(|avail| CandidateStatus::from_column(Some(avail)))
    }
}

/// Which candidates a detect run visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectMode {
    /// Only rows whose status is still unknown
    Initial,
    /// Every row, overwriting earlier outcomes
    Redetect,
}

/// Row filter for paged reads from the candidate store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFilter {
    /// `status IS NULL`
    Undetected,
    /// No filter
    All,
}

impl From<DetectMode> for PageFilter {
    fn from(mode: DetectMode) -> Self {
        match mode {
            DetectMode::Initial => Self::Undetected,
            DetectMode::Redetect => Self::All,
        }
    }
}

/// Row counts grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub unknown: u64,
    pub unavailable: u64,
    pub available: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.unknown + self.unavailable + self.available
    }
}

/// Totals reported at the end of a detect run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectSummary {
    /// Pages fetched, including the final short page
    pub pages: usize,
    /// Rows handed to the check API
    pub processed: usize,
    /// Rows recorded as available
    pub available: usize,
    /// Rows recorded as unavailable
    pub unavailable: usize,
    /// Rows whose response had no module entries (result written, status untouched)
    pub undetermined: usize,
    /// Rows skipped because the API call failed
    pub transport_errors: usize,
    /// Rows whose update statement failed
    pub store_errors: usize,
}

impl DetectSummary {
    /// Rows whose outcome was written to the store.
    pub fn recorded(&self) -> usize {
        self.available + self.unavailable + self.undetermined
    }
}
