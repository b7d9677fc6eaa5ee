//! Integration tests for the mining engine
//!
//! These drive a whole `Miner` run with an in-memory fetcher that records
//! concurrency, and the full `mine` entry point against a wiremock server.

use async_trait::async_trait;
use ia_mine::config::{Config, MinerConfig};
use ia_mine::miner::{mine, Fetcher, IdentifierSource};
use ia_mine::output::{CombinedSink, PerItemSink, StreamSink};
use ia_mine::{EngineState, FetchError, Identifier, Item, MineError, Miner, Sink};
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher that sleeps, counts calls per identifier and tracks peak concurrency
struct ScriptedFetcher {
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: Mutex::new(HashMap::new()),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, identifier: &Identifier) -> Result<Item, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(identifier.to_string())
            .or_insert(0) += 1;

        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        Ok(Item::new(
            identifier.clone(),
            json!({
                "metadata": { "identifier": identifier.as_str() },
                "files_count": identifier.as_str().len(),
            }),
        ))
    }
}

/// Writer shared between the test and a `StreamSink`
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is valid JSON"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn miner_config(workers: usize, queue_capacity: usize) -> MinerConfig {
    MinerConfig {
        worker_count: workers,
        queue_capacity,
    }
}

fn input_of(ids: &[String]) -> Vec<u8> {
    ids.iter().map(|id| format!("{}\n", id)).collect::<String>().into_bytes()
}

fn identifier_of(record: &serde_json::Value) -> String {
    record["metadata"]["identifier"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_three_items_default_sink() {
    let fetcher = ScriptedFetcher::new(Duration::from_millis(10));
    let buffer = SharedBuffer::default();
    let sink: Box<dyn Sink> = Box::new(StreamSink::new(buffer.clone()));
    let miner = Miner::new(miner_config(2, 1000), Arc::clone(&fetcher), sink);

    let summary = miner
        .run(&b"a\nb\nc\n"[..], CancellationToken::new())
        .await
        .expect("run should succeed");

    let mut ids: Vec<String> = buffer.lines().iter().map(identifier_of).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(summary.items_written, 3);
    assert_eq!(summary.total_failures(), 0);
    assert!(fetcher.peak() <= 2);
    assert_eq!(miner.state(), EngineState::Done);
}

#[tokio::test]
async fn test_empty_input_produces_nothing() {
    let fetcher = ScriptedFetcher::new(Duration::from_millis(1));
    let buffer = SharedBuffer::default();
    let sink: Box<dyn Sink> = Box::new(StreamSink::new(buffer.clone()));
    let miner = Miner::new(miner_config(4, 10), Arc::clone(&fetcher), sink);

    let summary = miner
        .run(&b""[..], CancellationToken::new())
        .await
        .expect("run should succeed");

    assert!(fetcher.calls().is_empty());
    assert!(buffer.lines().is_empty());
    assert_eq!(summary.dispatched, 0);
    assert_eq!(summary.state, EngineState::Done);
}

#[tokio::test]
async fn test_single_worker_is_serialized() {
    let fetcher = ScriptedFetcher::new(Duration::from_millis(5));
    let sink: Box<dyn Sink> = Box::new(StreamSink::new(SharedBuffer::default()));
    let miner = Miner::new(miner_config(1, 2), Arc::clone(&fetcher), sink);

    let ids: Vec<String> = (0..10).map(|i| format!("item-{}", i)).collect();
    let summary = miner
        .run(&input_of(&ids)[..], CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(fetcher.peak(), 1);
    assert_eq!(summary.peak_in_flight, 1);
    assert_eq!(summary.items_written, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_cap_and_exactly_once() {
    let ids: Vec<String> = (0..60).map(|i| format!("id-{:03}", i)).collect();

    for workers in [1, 2, 5, 16] {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(3));
        let buffer = SharedBuffer::default();
        let sink: Box<dyn Sink> = Box::new(StreamSink::new(buffer.clone()));
        // Queue smaller than the worker pool for some runs, larger for others.
        let miner = Miner::new(miner_config(workers, 7), Arc::clone(&fetcher), sink);

        let summary = miner
            .run(&input_of(&ids)[..], CancellationToken::new())
            .await
            .unwrap();

        assert!(
            fetcher.peak() <= workers,
            "peak {} exceeded {} workers",
            fetcher.peak(),
            workers
        );
        assert!(summary.peak_in_flight <= workers);

        let calls = fetcher.calls();
        assert_eq!(calls.len(), ids.len());
        assert!(calls.values().all(|&count| count == 1));

        let mut written: Vec<String> = buffer.lines().iter().map(identifier_of).collect();
        written.sort();
        assert_eq!(written, ids);
    }
}

#[tokio::test]
async fn test_combined_output_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("all.json");
    let fetcher = ScriptedFetcher::new(Duration::from_millis(2));
    let sink: Box<dyn Sink> = Box::new(CombinedSink::open(&path).unwrap());
    let miner = Miner::new(miner_config(4, 5), Arc::clone(&fetcher), sink);

    let ids: Vec<String> = (0..25).map(|i| format!("combined-{}", i)).collect();
    miner
        .run(&input_of(&ids)[..], CancellationToken::new())
        .await
        .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut written: Vec<String> = content
        .lines()
        .map(|line| identifier_of(&serde_json::from_str(line).unwrap()))
        .collect();
    assert_eq!(written.len(), 25);
    written.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn test_per_item_files() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::new(Duration::from_millis(2));
    let sink: Box<dyn Sink> = Box::new(PerItemSink::new(dir.path()).unwrap());
    let miner = Miner::new(miner_config(3, 4), Arc::clone(&fetcher), sink);

    let ids: Vec<String> = (0..8).map(|i| format!("cached-{}", i)).collect();
    miner
        .run(&input_of(&ids)[..], CancellationToken::new())
        .await
        .unwrap();

    for id in &ids {
        let file = dir.path().join(format!("{}_meta.json", id));
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(
            parsed,
            json!({"metadata": {"identifier": id}, "files_count": id.len()})
        );
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), ids.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interrupt_terminates_promptly() {
    let fetcher = ScriptedFetcher::new(Duration::from_secs(3600));
    let sink: Box<dyn Sink> = Box::new(StreamSink::new(SharedBuffer::default()));
    let miner = Miner::new(miner_config(3, 2), Arc::clone(&fetcher), sink);
    let mut states = miner.subscribe_state();

    let ids: Vec<String> = (0..50).map(|i| format!("slow-{}", i)).collect();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        miner.run(&input_of(&ids)[..], cancel),
    )
    .await
    .expect("run should stop within the timeout");

    assert!(matches!(result, Err(MineError::Interrupted)));
    assert_eq!(*states.borrow_and_update(), EngineState::Terminated);
    assert!(fetcher.calls().len() <= 3);
}

#[tokio::test]
async fn test_mine_against_mock_api() {
    let server = MockServer::start().await;
    for id in ["alpha", "beta"] {
        Mock::given(method("GET"))
            .and(path(format!("/metadata/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"metadata": {"identifier": id}, "files": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/metadata/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = NamedTempFile::new().unwrap();
    writeln!(list, "alpha\n\n  beta  \nghost").unwrap();
    list.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");

    let mut config = Config::default();
    config.miner.worker_count = 2;
    config.session.base_url = server.uri();
    config.output.combined_output_path = Some(output.display().to_string());

    let source = IdentifierSource::File(list.path().to_path_buf());
    let summary = mine(&config, &source, CancellationToken::new())
        .await
        .expect("mining should succeed despite one missing item");

    assert_eq!(summary.lines_read, 4);
    assert_eq!(summary.blank_lines_skipped, 1);
    assert_eq!(summary.identifiers_queued, 3);
    assert_eq!(summary.items_written, 2);
    assert_eq!(summary.fetch_failures, 1);

    let content = std::fs::read_to_string(&output).unwrap();
    let mut written: Vec<String> = content
        .lines()
        .map(|line| identifier_of(&serde_json::from_str(line).unwrap()))
        .collect();
    written.sort();
    assert_eq!(written, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_mine_missing_item_list() {
    let config = Config::default();
    let source = IdentifierSource::File("/nonexistent/itemlist.txt".into());

    let result = mine(&config, &source, CancellationToken::new()).await;
    assert!(matches!(result, Err(MineError::Input(_))));
}

#[tokio::test]
async fn test_mine_rejects_conflicting_output_options() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.output.cache_to_per_item_files = true;
    config.output.cache_directory = dir.path().display().to_string();
    config.output.combined_output_path = Some(dir.path().join("all.json").display().to_string());

    let mut list = NamedTempFile::new().unwrap();
    writeln!(list, "alpha").unwrap();
    let source = IdentifierSource::File(list.path().to_path_buf());

    let result = mine(&config, &source, CancellationToken::new()).await;
    assert!(matches!(result, Err(MineError::Config(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
