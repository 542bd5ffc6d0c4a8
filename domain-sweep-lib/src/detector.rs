//! Paged detection driver.
//!
//! The `Detector` walks the candidate store page by page, asks the
//! availability API about each row in turn and writes the outcome back. Work
//! is strictly sequential: one page at a time, one request in flight.
//!
//! Failures are contained to the row they happen on. A transport error skips
//! the row, a failed update is logged, and both leave the row eligible for the
//! next run. Only a failed page read ends the run early.
//!
//! # Example
//!
//! ```rust,no_run
//! use domain_sweep_lib::{CandidateStore, CheckApiClient, DetectMode, Detector};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CandidateStore::open("./domains.db")?;
//!     let detector = Detector::new(&store, CheckApiClient::new()?);
//!     let summary = detector.run(DetectMode::Initial).await?;
//!     println!("{} rows checked", summary.processed);
//!     Ok(())
//! }
//! ```

use crate::error::DomainSweepError;
use crate::protocols::AvailabilityApi;
use crate::store::CandidateStore;
use crate::types::{
    Candidate, CandidateStatus, DetectMode, DetectSummary, DetectionResponse, PageFilter,
    PAGE_SIZE,
};
use chrono::Utc;
use tracing::{error, info, warn};

/// What happened to a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    /// Response written; `None` when it carried no module entries
    Recorded(Option<CandidateStatus>),
    /// API call failed, row untouched
    TransportFailed,
    /// Update statement failed, row untouched
    StoreFailed,
}

impl RowOutcome {
    /// Whether the row still has a null status after this outcome.
    fn left_undetected(self) -> bool {
        !matches!(self, Self::Recorded(Some(status)) if status.is_known())
    }
}

/// Drives exhaustive verification of stored candidates.
pub struct Detector<'s, A> {
    store: &'s CandidateStore,
    api: A,
    page_size: usize,
}

impl<'s, A: AvailabilityApi> Detector<'s, A> {
    /// Create a detector over `store` using `api` for lookups.
    pub fn new(store: &'s CandidateStore, api: A) -> Self {
        Self {
            store,
            api,
            page_size: PAGE_SIZE,
        }
    }

    /// Override the number of rows fetched per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Run until a page comes back shorter than the page size.
    ///
    /// In `Initial` mode only rows with an unknown status are visited. Rows
    /// that are detected drop out of the filtered result set as the run goes,
    /// so the offset only counts rows already visited that are still unknown.
    /// In `Redetect` mode every row is visited and the offset is the plain
    /// `(page - 1) * page_size`.
    ///
    /// # Errors
    ///
    /// Returns the store error if a page cannot be read. Row-level failures
    /// are logged and counted in the summary instead.
    pub async fn run(&self, mode: DetectMode) -> Result<DetectSummary, DomainSweepError> {
        let filter = PageFilter::from(mode);
        let mut summary = DetectSummary::default();
        let mut page = 1usize;
        let mut still_undetected = 0usize;

        info!(?mode, page_size = self.page_size, "detect run started");

        loop {
            let offset = match filter {
                PageFilter::Undetected => still_undetected,
                PageFilter::All => (page - 1) * self.page_size,
            };

            let rows = self
                .store
                .fetch_page(filter, self.page_size, offset)
                .map_err(|e| {
                    error!(page, offset, error = %e, "failed to fetch page");
                    e
                })?;
            summary.pages += 1;

            for candidate in &rows {
                let outcome = self.detect_one(candidate).await;
                tally(&mut summary, outcome);
                if outcome.left_undetected() {
                    still_undetected += 1;
                }
            }

            let count = rows.len();
            if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
                info!(page, first = %first.name, last = %last.name, "page processed");
            }
            info!(page, count, "page size");

            page += 1;
            if count < self.page_size {
                break;
            }
        }

        info!(
            pages = summary.pages,
            processed = summary.processed,
            available = summary.available,
            unavailable = summary.unavailable,
            undetermined = summary.undetermined,
            transport_errors = summary.transport_errors,
            store_errors = summary.store_errors,
            "detect run finished"
        );
        Ok(summary)
    }

    /// Look up one candidate and record the outcome.
    async fn detect_one(&self, candidate: &Candidate) -> RowOutcome {
        let body = match self.api.fetch(&candidate.name, &candidate.suffix).await {
            Ok(body) => body,
            Err(e) => {
                warn!(id = candidate.id, domain = %candidate.fqdn(), error = %e, "check failed, skipping");
                return RowOutcome::TransportFailed;
            }
        };

        let status = DetectionResponse::parse_lenient(&body).status();

        match self
            .store
            .record_detection(candidate.id, status, &body, Utc::now())
        {
            Ok(()) => RowOutcome::Recorded(status),
            Err(e) => {
                error!(id = candidate.id, domain = %candidate.fqdn(), error = %e, "failed to record detection");
                RowOutcome::StoreFailed
            }
        }
    }
}

fn tally(summary: &mut DetectSummary, outcome: RowOutcome) {
    summary.processed += 1;
    match outcome {
        RowOutcome::Recorded(Some(CandidateStatus::Available(_))) => summary.available += 1,
        RowOutcome::Recorded(Some(CandidateStatus::Unavailable)) => summary.unavailable += 1,
        RowOutcome::Recorded(_) => summary.undetermined += 1,
        RowOutcome::TransportFailed => summary.transport_errors += 1,
        RowOutcome::StoreFailed => summary.store_errors += 1,
    }
}
