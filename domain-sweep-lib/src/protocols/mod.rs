//! Remote availability check.
//!
//! The detector talks to the remote service only through `AvailabilityApi`,
//! so tests can swap in a scripted endpoint.

/// HTTP client for the availability check endpoint
pub mod checkapi;

use crate::error::DomainSweepError;

pub use checkapi::CheckApiClient;

/// One availability lookup per call.
///
/// Implementations return the raw response body. Any error is treated as a
/// transport failure: the candidate is skipped and stays eligible for the
/// next run.
#[allow(async_fn_in_trait)]
pub trait AvailabilityApi {
    async fn fetch(&self, name: &str, suffix: &str) -> Result<String, DomainSweepError>;
}

impl<T: AvailabilityApi> AvailabilityApi for &T {
    async fn fetch(&self, name: &str, suffix: &str) -> Result<String, DomainSweepError> {
        (**self).fetch(name, suffix).await
    }
}
