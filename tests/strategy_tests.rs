//! Tests for the detail phase strategies.

use product_fetcher::fetcher::{FetcherBuilder, Strategy};
use product_fetcher::session::{Outcome, Progress, Status};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mod common;
use common::helpers::*;

fn all_strategies() -> Vec<Strategy> {
    vec![
        Strategy::Serial,
        Strategy::WorkerPool,
        Strategy::Batched {
            batch_size: 4,
            batch_delay: Duration::from_millis(1),
        },
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_reference_completed_once_for_every_strategy() {
    for strategy in all_strategies() {
        let catalog = Arc::new(FakeCatalog::with_products(11).failing(3).failing(8));
        let fetcher = FetcherBuilder::new()
            .retry_policy(fast_retry(2))
            .page_size(5)
            .strategy(strategy)
            .build_with_api(catalog.clone());

        let mut sink = RecordingSink::default();
        let report = fetcher.fetch(TEST_BRAND, &mut sink).await.unwrap();

        assert_eq!(report.completed, 11, "strategy {}", strategy);
        assert_eq!(report.succeeded, 9, "strategy {}", strategy);
        assert_eq!(report.failures.len(), 2, "strategy {}", strategy);
        assert_eq!(sink.records().len(), 9, "strategy {}", strategy);
        assert_eq!(sink.finalized, 1);

        // Two attempts for each failing product, one for every other.
        assert_eq!(catalog.total_attempts(), 9 + 2 * 2, "strategy {}", strategy);
        for id in 1..=11 {
            let expected = if id == 3 || id == 8 { 2 } else { 1 };
            assert_eq!(catalog.attempts_for(&reference_for(id)), expected);
        }

        let mut titles = sorted_titles(&sink.records());
        titles.dedup();
        assert_eq!(titles.len(), 9, "no record stored twice");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rate_limit_cap_never_exceeded() {
    for strategy in all_strategies() {
        let catalog = Arc::new(
            FakeCatalog::with_products(30).detail_latency(Duration::from_millis(10)),
        );
        let fetcher = FetcherBuilder::new()
            .retry_policy(fast_retry(1))
            .concurrency(50)
            .strategy(strategy)
            .build_with_api(catalog.clone());

        let mut sink = RecordingSink::default();
        fetcher.fetch(TEST_BRAND, &mut sink).await.unwrap();

        assert!(
            catalog.max_in_flight() <= 3,
            "strategy {} had {} requests in flight",
            strategy,
            catalog.max_in_flight()
        );
        if strategy == Strategy::Serial {
            assert_eq!(catalog.max_in_flight(), 1);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bound_is_reached() {
    let catalog = Arc::new(FakeCatalog::with_products(12).detail_latency(Duration::from_millis(20)));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .concurrency(2)
        .worker_pool()
        .build_with_api(catalog.clone());

    fetcher
        .fetch(TEST_BRAND, &mut RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(catalog.max_in_flight(), 2);
}

#[tokio::test]
async fn test_batched_records_one_group_per_batch() {
    let catalog = Arc::new(FakeCatalog::with_products(10).failing(2));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .batched(4, Duration::ZERO)
        .build_with_api(catalog);

    let mut sink = RecordingSink::default();
    fetcher.fetch(TEST_BRAND, &mut sink).await.unwrap();

    // Batches of 4, 4 and 2; product 2 is missing from the first.
    assert_eq!(sink.call_sizes(), vec![3, 4, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_batched_sleeps_between_batches_only() {
    let catalog = Arc::new(FakeCatalog::with_products(6).detail_latency(Duration::ZERO));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .batched(2, Duration::from_secs(1))
        .build_with_api(catalog);

    let start = tokio::time::Instant::now();
    fetcher
        .fetch(TEST_BRAND, &mut RecordingSink::default())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    // Three batches, two pauses.
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_serial_and_pool_record_single_items() {
    for strategy in [Strategy::Serial, Strategy::WorkerPool] {
        let catalog = Arc::new(FakeCatalog::with_products(5));
        let fetcher = FetcherBuilder::new()
            .retry_policy(fast_retry(1))
            .strategy(strategy)
            .build_with_api(catalog);

        let mut sink = RecordingSink::default();
        fetcher.fetch(TEST_BRAND, &mut sink).await.unwrap();
        assert_eq!(sink.call_sizes(), vec![1; 5], "strategy {}", strategy);
    }
}

#[tokio::test]
async fn test_progress_is_pushed_after_every_product() {
    let snapshots = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let outcomes = Arc::new(Mutex::new(Vec::<Outcome>::new()));
    let snapshots_clone = snapshots.clone();
    let outcomes_clone = outcomes.clone();

    let catalog = Arc::new(FakeCatalog::with_products(4).failing(4));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .worker_pool()
        .on_progress(move |p| snapshots_clone.lock().unwrap().push(p))
        .on_complete(move |o| outcomes_clone.lock().unwrap().push(o.clone()))
        .build_with_api(catalog);

    fetcher
        .fetch(TEST_BRAND, &mut RecordingSink::default())
        .await
        .unwrap();

    let snapshots = snapshots.lock().unwrap();
    let completed: Vec<usize> = snapshots.iter().map(|p| p.completed).collect();
    assert_eq!(completed, vec![0, 1, 2, 3, 4]);
    assert!(snapshots.iter().all(|p| p.total == 4));
    assert_eq!(snapshots.last().unwrap().failed, 1);

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 4);
    let failed: Vec<&Outcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].reference(), &reference_for(4));
    assert!(matches!(failed[0].status(), Status::Fail(msg) if msg.contains("429")));
}

#[tokio::test]
async fn test_session_can_be_polled() {
    let catalog = Arc::new(FakeCatalog::with_products(3));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .serial()
        .build_with_api(catalog);

    let session = fetcher.session(TEST_BRAND);
    let observer = session.clone();
    assert_eq!(observer.progress(), Progress::default());

    let report = fetcher
        .run(&session, &mut RecordingSink::default())
        .await
        .unwrap();
    assert_eq!(report.completed, 3);
    assert_eq!(
        observer.progress(),
        Progress {
            completed: 3,
            total: 3,
            failed: 0
        }
    );
}

#[tokio::test]
async fn test_session_can_be_run_twice() {
    let catalog = Arc::new(FakeCatalog::with_products(3).failing(2));
    let fetcher = FetcherBuilder::new()
        .retry_policy(fast_retry(1))
        .worker_pool()
        .build_with_api(catalog);

    let session = fetcher.session(TEST_BRAND);
    for _ in 0..2 {
        let report = fetcher
            .run(&session, &mut RecordingSink::default())
            .await
            .unwrap();
        assert_eq!(report.completed, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            session.progress(),
            Progress {
                completed: 3,
                total: 3,
                failed: 1
            }
        );
    }
}
