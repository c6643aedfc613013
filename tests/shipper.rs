use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bdd_lifecycle::{
    shipper::{
        BatchShipper, FlushOutcome, JsonLinesFile, Level, LogRecord, ShipperSet,
        Sink,
    },
    Logger, Shipper, ShipperConfig,
};
use tokio::time::Instant;

#[derive(Default)]
struct MockSink {
    failures_left: AtomicUsize,
    attempts: Mutex<Vec<Instant>>,
    delivered: Mutex<Vec<String>>,
}

impl MockSink {
    fn failing(times: usize) -> Self {
        Self { failures_left: AtomicUsize::new(times), ..Self::default() }
    }
}

#[async_trait]
impl Sink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, batch: &[LogRecord]) -> anyhow::Result<()> {
        self.attempts.lock().unwrap().push(Instant::now());
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            anyhow::bail!("connection refused");
        }
        self.delivered
            .lock()
            .unwrap()
            .extend(batch.iter().map(|r| r.message.clone()));
        Ok(())
    }
}

fn config(batch_size: usize) -> ShipperConfig {
    ShipperConfig {
        batch_size,
        retry_attempts: 3,
        initial_backoff: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        max_backoff: Duration::from_secs(1),
        ..ShipperConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_with_backoff() {
    let dir = tempfile::tempdir().unwrap();
    let shipper = BatchShipper::new(
        MockSink::failing(2),
        JsonLinesFile::new(dir.path().join("fallback.jsonl")),
        &config(10),
        Logger::disabled(),
    )
    .unwrap();
    for msg in ["scenario started", "step passed"] {
        _ = shipper.ship(LogRecord::new(Level::Info, msg)).await;
    }

    let outcome = shipper.flush().await;

    assert_eq!(outcome, FlushOutcome::Shipped { records: 2, attempts: 3 });
    let attempts = shipper.sink().attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[1] - attempts[0], Duration::from_millis(100));
    assert_eq!(attempts[2] - attempts[1], Duration::from_millis(200));
    assert_eq!(*shipper.sink().delivered.lock().unwrap(), ["scenario started", "step passed"]);
    assert!(shipper.fallback().read_all().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn exhausted_batch_lands_in_fallback_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let shipper = BatchShipper::new(
        MockSink::failing(usize::MAX),
        JsonLinesFile::new(dir.path().join("fallback.jsonl")),
        &config(3),
        Logger::disabled(),
    )
    .unwrap();

    let mut outcomes = Vec::new();
    for msg in ["a", "b", "c"] {
        outcomes.push(shipper.ship(LogRecord::new(Level::Warn, msg)).await);
    }
    assert_eq!(outcomes.last(), Some(&FlushOutcome::Buffered { pending: 3 }));

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(shipper.sink().attempts.lock().unwrap().len(), 4);
    let stored: Vec<_> = shipper
        .fallback()
        .read_all()
        .unwrap()
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(stored, ["a", "b", "c"]);

    assert_eq!(shipper.close().await, FlushOutcome::Empty);
    assert_eq!(shipper.fallback().read_all().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn records_shipped_after_close_go_to_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let shipper = BatchShipper::new(
        MockSink::default(),
        JsonLinesFile::new(dir.path().join("fallback.jsonl")),
        &config(10),
        Logger::disabled(),
    )
    .unwrap();
    _ = shipper.ship(LogRecord::new(Level::Info, "before")).await;

    assert_eq!(shipper.close().await, FlushOutcome::Shipped { records: 1, attempts: 1 });
    assert_eq!(
        shipper.ship(LogRecord::new(Level::Info, "after")).await,
        FlushOutcome::FellBack { records: 1 },
    );
    assert_eq!(*shipper.sink().delivered.lock().unwrap(), ["before"]);
    assert_eq!(shipper.fallback().read_all().unwrap()[0].message, "after");
}

#[tokio::test(start_paused = true)]
async fn set_keeps_shippers_independent() {
    let dir = tempfile::tempdir().unwrap();
    let broken: Arc<dyn Shipper> = Arc::new(
        BatchShipper::new(
            MockSink::failing(usize::MAX),
            JsonLinesFile::new(dir.path().join("broken.jsonl")),
            &config(1),
            Logger::disabled(),
        )
        .unwrap(),
    );
    let healthy = Arc::new(
        BatchShipper::new(
            MockSink::default(),
            JsonLinesFile::new(dir.path().join("healthy.jsonl")),
            &config(1),
            Logger::disabled(),
        )
        .unwrap(),
    );
    let shared: Arc<dyn Shipper> = Arc::<BatchShipper<MockSink>>::clone(&healthy);
    let set = ShipperSet::new(vec![broken, shared], Logger::disabled());

    let outcomes = set.ship(&LogRecord::new(Level::Error, "step failed")).await;
    assert_eq!(
        outcomes,
        [FlushOutcome::Buffered { pending: 1 }, FlushOutcome::Buffered { pending: 1 }],
    );

    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(*healthy.sink().delivered.lock().unwrap(), ["step failed"]);
    assert_eq!(healthy.sink().attempts.lock().unwrap().len(), 1);
    let fell_back = JsonLinesFile::new(dir.path().join("broken.jsonl")).read_all().unwrap();
    assert_eq!(fell_back.len(), 1);
    assert_eq!(fell_back[0].message, "step failed");
    assert_eq!(set.close().await, [FlushOutcome::Empty, FlushOutcome::Empty]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ships_and_ticks_deliver_every_record_once() {
    let dir = tempfile::tempdir().unwrap();
    let shipper = Arc::new(
        BatchShipper::new(
            MockSink::failing(5),
            JsonLinesFile::new(dir.path().join("fallback.jsonl")),
            &ShipperConfig {
                batch_size: 7,
                retry_attempts: 1,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
                flush_interval: Duration::from_millis(2),
                ..ShipperConfig::default()
            },
            Logger::disabled(),
        )
        .unwrap(),
    );

    let writers: Vec<_> = (0..8)
        .map(|w| {
            let shipper = Arc::clone(&shipper);
            tokio::spawn(async move {
                for n in 0..50 {
                    _ = shipper.ship(LogRecord::new(Level::Info, format!("{w}-{n}"))).await;
                    if n % 10 == 0 {
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }
    _ = shipper.close().await;

    let mut seen = shipper.sink().delivered.lock().unwrap().clone();
    seen.extend(shipper.fallback().read_all().unwrap().into_iter().map(|r| r.message));
    seen.sort();
    let mut expected: Vec<_> =
        (0..8).flat_map(|w| (0..50).map(move |n| format!("{w}-{n}"))).collect();
    expected.sort();
    assert_eq!(seen, expected);
    assert!(!shipper.fallback().read_all().unwrap().is_empty());
}
