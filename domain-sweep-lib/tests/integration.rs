// domain-sweep-lib/tests/integration.rs

//! Prepare and detect end to end against a file-backed store.

use domain_sweep_lib::{
    prepare_candidates, Alphabet, AvailabilityApi, CandidateStatus, CandidateStore, DetectMode,
    Detector, DomainSweepError, DEFAULT_SUFFIX,
};
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// Registrable when the label ends in a digit, taken otherwise; labels
/// starting with `z` fail at the transport level.
struct DigitsAvailable;

impl AvailabilityApi for DigitsAvailable {
    async fn fetch(&self, name: &str, suffix: &str) -> Result<String, DomainSweepError> {
        if name.starts_with('z') {
            return Err(DomainSweepError::transport(
                format!("{}.{}", name, suffix),
                "connection reset",
            ));
        }
        let avail = name.ends_with(|c: char| c.is_ascii_digit()) as i64;
        Ok(format!(
            r#"{{"errorCode":0,"success":"true","module":[{{"avail":{},"name":"{}.{}","tld":"{}"}}]}}"#,
            avail, name, suffix, suffix
        ))
    }
}

/// Every response is empty.
struct NoData;

impl AvailabilityApi for NoData {
    async fn fetch(&self, _name: &str, _suffix: &str) -> Result<String, DomainSweepError> {
        Ok(r#"{"errorCode":0,"success":"true","module":[]}"#.to_string())
    }
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn prepared_store(dir: &TempDir) -> CandidateStore {
    let mut store = CandidateStore::open(dir.path().join("domains.db")).unwrap();
    prepare_candidates(&mut store, &Alphabet::alphanumeric(), 1..=2, DEFAULT_SUFFIX).unwrap();
    store
}

#[test]
fn test_prepare_then_detect() {
    let dir = TempDir::new().unwrap();
    let store = prepared_store(&dir);
    assert_eq!(store.count().unwrap(), 36 + 1296);

    let summary = tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial))
        .unwrap();

    // 1 + 36 labels start with 'z'
    assert_eq!(summary.transport_errors, 37);
    assert_eq!(summary.processed, 36 + 1296);
    assert_eq!(summary.recorded(), 36 + 1296 - 37);
    assert_eq!(summary.undetermined, 0);

    let counts = store.count_by_status().unwrap();
    assert_eq!(counts.unknown, 37);
    assert_eq!(counts.available, summary.available as u64);
    assert_eq!(counts.unavailable, summary.unavailable as u64);

    // "0" is id 1, "a" follows the ten digits
    let zero = store.get(1).unwrap().unwrap();
    assert_eq!(zero.name, "0");
    assert_eq!(zero.status, CandidateStatus::Available(1));
    assert!(zero.result.unwrap().contains("\"0.com\""));
    let a = store.get(11).unwrap().unwrap();
    assert_eq!(a.name, "a");
    assert_eq!(a.status, CandidateStatus::Unavailable);
}

#[test]
fn test_second_detect_only_retries_failures() {
    let dir = TempDir::new().unwrap();
    let store = prepared_store(&dir);

    tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial)).unwrap();
    let again =
        tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial))
            .unwrap();

    assert_eq!(again.processed, 37);
    assert_eq!(again.transport_errors, 37);
    assert_eq!(again.recorded(), 0);
}

#[test]
fn test_redetect_without_data_keeps_statuses() {
    let dir = TempDir::new().unwrap();
    let store = prepared_store(&dir);

    tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial)).unwrap();
    let before = store.count_by_status().unwrap();

    let summary =
        tokio_test::block_on(Detector::new(&store, NoData).run(DetectMode::Redetect)).unwrap();
    assert_eq!(summary.undetermined, 36 + 1296);
    assert_eq!(store.count_by_status().unwrap(), before);

    let zero = store.get(1).unwrap().unwrap();
    assert_eq!(zero.status, CandidateStatus::Available(1));
    assert!(zero.result.unwrap().contains("\"module\":[]"));
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = prepared_store(&dir);
        tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial))
            .unwrap();
    }

    let store = CandidateStore::open(dir.path().join("domains.db")).unwrap();
    assert_eq!(store.count_by_status().unwrap().unknown, 37);
}

#[test]
fn test_transport_failures_are_logged() {
    let dir = TempDir::new().unwrap();
    let store = prepared_store(&dir);

    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(captured.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        tokio_test::block_on(Detector::new(&store, DigitsAvailable).run(DetectMode::Initial))
            .unwrap();
    });

    let text = captured.text();
    assert!(text.contains("check failed, skipping"));
    assert!(text.contains("zz.com"));
    assert!(text.contains("connection reset"));
}
