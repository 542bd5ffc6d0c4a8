//! # Domain Sweep Library
//!
//! Exhaustively enumerates short alphanumeric labels, keeps each one as a
//! candidate `.com` name in a SQLite table and asks a remote availability
//! check API about every candidate, one request at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_sweep_lib::{
//!     prepare_candidates, Alphabet, CandidateStore, CheckApiClient, DetectMode, Detector,
//!     DEFAULT_SUFFIX,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = CandidateStore::open("./domains.db")?;
//!     prepare_candidates(&mut store, &Alphabet::alphanumeric(), 2..=3, DEFAULT_SUFFIX)?;
//!
//!     let summary = Detector::new(&store, CheckApiClient::new()?)
//!         .run(DetectMode::Initial)
//!         .await?;
//!     println!("available: {}", summary.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Phases
//!
//! - **prepare**: recreate the table and bulk insert every label
//! - **detect**: page through undetected rows and record API outcomes
//! - **redetect**: same, over every row

pub use config::{
    load_env_config, ApiConfig, ConfigManager, EnvConfig, FileConfig, GenerationConfig,
    StoreConfig, SweepConfig,
};
pub use detector::Detector;
pub use error::DomainSweepError;
pub use export::{export_scripts, ExportedScript};
pub use generate::{enumerate, enumerate_range, Alphabet, Enumeration};
pub use prepare::{prepare_candidates, PreparedLength};
pub use protocols::{AvailabilityApi, CheckApiClient};
pub use store::CandidateStore;
pub use types::{
    Candidate, CandidateStatus, DetectMode, DetectSummary, DetectionResponse, ModuleEntry,
    PageFilter, StatusCounts, DEFAULT_SUFFIX, PAGE_SIZE,
};

// Public modules
pub mod export;
pub mod generate;
pub mod protocols;

// Internal modules
mod config;
mod detector;
mod error;
mod prepare;
mod store;
mod types;

pub type Result<T> = std::result::Result<T, DomainSweepError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
