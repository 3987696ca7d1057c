//! Integration tests for the region orchestrator.
//!
//! These drive the orchestrator through a scripted prober instead of live
//! HTTP, so settle order, partial failure, and re-entrancy are all under
//! test control.

use async_trait::async_trait;
use chrono::Utc;
use edge_latency_probe::{
    CacheState, OrchestratorError, ProbeError, ProbeResult, ProbeTarget, Prober,
    RegionOrchestrator, RegionStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-region script for the fake prober.
#[derive(Clone)]
enum Script {
    Succeed { upstream_ms: u64, delay_ms: u64 },
    Fail { delay_ms: u64 },
}

struct ScriptedProber {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(id, script)| (id.to_string(), script.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn sample_result(region_id: &str, upstream_ms: u64) -> ProbeResult {
    ProbeResult {
        region_id: region_id.to_string(),
        edge_latency_ms: upstream_ms + 40,
        upstream_latency_ms: upstream_ms,
        upstream_cache_state: CacheState::Hit,
        upstream_headers: [
            ("age".to_string(), "30".to_string()),
            ("cache-control".to_string(), "public, max-age=300".to_string()),
        ]
        .into_iter()
        .collect(),
        edge_cache_state: CacheState::Miss,
        edge_headers: HashMap::new(),
        measured_at: Utc::now(),
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        region_id: &str,
        _target: &ProbeTarget,
    ) -> Result<ProbeResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(region_id) {
            Some(Script::Succeed {
                upstream_ms,
                delay_ms,
            }) => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(sample_result(region_id, *upstream_ms))
            }
            Some(Script::Fail { delay_ms }) => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Err(ProbeError::Upstream {
                    status: 500,
                    message: "scripted failure".to_string(),
                })
            }
            None => Err(ProbeError::Upstream {
                status: 404,
                message: format!("no script for region {}", region_id),
            }),
        }
    }
}

fn target() -> ProbeTarget {
    ProbeTarget::new("https://example.com")
}

#[tokio::test]
async fn test_run_settles_every_region_regardless_of_order() {
    // Delays deliberately reversed relative to declaration order.
    let prober = Arc::new(ScriptedProber::new(&[
        ("iad1", Script::Succeed { upstream_ms: 80, delay_ms: 30 }),
        ("lhr1", Script::Succeed { upstream_ms: 60, delay_ms: 20 }),
        ("sin1", Script::Succeed { upstream_ms: 40, delay_ms: 5 }),
    ]));

    let orchestrator = RegionOrchestrator::new(Arc::clone(&prober) as Arc<dyn Prober>);
    orchestrator
        .configure(&["iad1", "lhr1", "sin1"])
        .await
        .unwrap();

    orchestrator.start_run(target()).await.unwrap();

    let states = orchestrator.snapshot().await;
    assert_eq!(states.len(), 3);
    assert!(states.iter().all(|s| s.is_settled()));

    // Outcomes applied by id, not position.
    for state in &states {
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.region_id, state.region.id);
    }
    assert_eq!(prober.call_count(), 3);
}

#[tokio::test]
async fn test_start_run_while_active_is_a_noop() {
    let prober = Arc::new(ScriptedProber::new(&[(
        "iad1",
        Script::Succeed { upstream_ms: 50, delay_ms: 100 },
    )]));
    let completions = Arc::new(AtomicUsize::new(0));

    let callback_count = Arc::clone(&completions);
    let orchestrator = Arc::new(
        RegionOrchestrator::new(Arc::clone(&prober) as Arc<dyn Prober>)
            .on_testing_complete(move || {
                callback_count.fetch_add(1, Ordering::SeqCst);
            }),
    );
    orchestrator.configure(&["iad1"]).await.unwrap();

    let runner = Arc::clone(&orchestrator);
    let first = tokio::spawn(async move { runner.start_run(target()).await });

    // Wait until the run is actually in flight.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(orchestrator.is_running());

    // Mid-run, the region is observably testing.
    let mid_run = orchestrator.snapshot().await;
    assert_eq!(mid_run[0].status, RegionStatus::Testing);

    // Re-entrant start: rejected, nothing launched, active run untouched.
    let second = orchestrator.start_run(target()).await;
    assert_eq!(second.unwrap_err(), OrchestratorError::AlreadyRunning);

    first.await.unwrap().unwrap();

    assert_eq!(prober.call_count(), 1, "no duplicate probes");
    assert_eq!(completions.load(Ordering::SeqCst), 1, "one callback total");

    let states = orchestrator.snapshot().await;
    assert_eq!(states[0].status, RegionStatus::Complete);
}

#[tokio::test]
async fn test_partial_failure_keeps_other_results() {
    let prober = Arc::new(ScriptedProber::new(&[
        ("iad1", Script::Fail { delay_ms: 5 }),
        ("lhr1", Script::Succeed { upstream_ms: 70, delay_ms: 10 }),
        ("sin1", Script::Succeed { upstream_ms: 90, delay_ms: 2 }),
    ]));
    let completions = Arc::new(AtomicUsize::new(0));

    let callback_count = Arc::clone(&completions);
    let orchestrator = RegionOrchestrator::new(Arc::clone(&prober) as Arc<dyn Prober>)
        .on_testing_complete(move || {
            callback_count.fetch_add(1, Ordering::SeqCst);
        });
    orchestrator
        .configure(&["iad1", "lhr1", "sin1"])
        .await
        .unwrap();

    orchestrator.start_run(target()).await.unwrap();

    let states = orchestrator.snapshot().await;
    let by_id: HashMap<&str, _> = states
        .iter()
        .map(|s| (s.region.id.as_str(), s))
        .collect();

    let failed = by_id["iad1"];
    assert_eq!(failed.status, RegionStatus::Error);
    assert!(failed.result.is_none());
    assert!(failed.error.as_deref().unwrap().contains("500"));

    for id in ["lhr1", "sin1"] {
        let ok = by_id[id];
        assert_eq!(ok.status, RegionStatus::Complete);
        assert!(ok.result.is_some());
    }

    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_failed_run_still_completes() {
    let prober = Arc::new(ScriptedProber::new(&[
        ("iad1", Script::Fail { delay_ms: 2 }),
        ("lhr1", Script::Fail { delay_ms: 4 }),
    ]));
    let completions = Arc::new(AtomicUsize::new(0));

    let callback_count = Arc::clone(&completions);
    let orchestrator = RegionOrchestrator::new(Arc::clone(&prober) as Arc<dyn Prober>)
        .on_testing_complete(move || {
            callback_count.fetch_add(1, Ordering::SeqCst);
        });
    orchestrator.configure(&["iad1", "lhr1"]).await.unwrap();

    orchestrator.start_run(target()).await.unwrap();

    let states = orchestrator.snapshot().await;
    assert!(states.iter().all(|s| s.status == RegionStatus::Error));
    assert_eq!(completions.load(Ordering::SeqCst), 1);

    // Guard released: the next run is accepted.
    orchestrator.start_run(target()).await.unwrap();
    assert_eq!(completions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_reconfigure_drops_and_resets_regions() {
    let prober = Arc::new(ScriptedProber::new(&[
        ("iad1", Script::Succeed { upstream_ms: 50, delay_ms: 2 }),
        ("lhr1", Script::Succeed { upstream_ms: 60, delay_ms: 2 }),
        ("sin1", Script::Succeed { upstream_ms: 70, delay_ms: 2 }),
    ]));

    let orchestrator = RegionOrchestrator::new(Arc::clone(&prober) as Arc<dyn Prober>);
    orchestrator
        .configure(&["iad1", "lhr1", "sin1"])
        .await
        .unwrap();
    orchestrator.start_run(target()).await.unwrap();

    // Narrow the subset: excluded regions disappear, included ones reset.
    orchestrator.configure(&["iad1"]).await.unwrap();

    let states = orchestrator.snapshot().await;
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].region.id, "iad1");
    assert_eq!(states[0].status, RegionStatus::Idle);
    assert!(states[0].result.is_none());

    // Next run flips the remaining region through testing to terminal.
    orchestrator.start_run(target()).await.unwrap();
    let states = orchestrator.snapshot().await;
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].status, RegionStatus::Complete);
}

#[tokio::test]
async fn test_prior_results_visible_while_retesting() {
    let prober = Arc::new(ScriptedProber::new(&[(
        "iad1",
        Script::Succeed { upstream_ms: 50, delay_ms: 60 },
    )]));

    let orchestrator = Arc::new(RegionOrchestrator::new(
        Arc::clone(&prober) as Arc<dyn Prober>
    ));
    orchestrator.configure(&["iad1"]).await.unwrap();

    orchestrator.start_run(target()).await.unwrap();
    assert!(orchestrator.snapshot().await[0].result.is_some());

    // During the second run, the first run's result must stay visible.
    let runner = Arc::clone(&orchestrator);
    let second = tokio::spawn(async move { runner.start_run(target()).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mid_run = orchestrator.snapshot().await;
    assert_eq!(mid_run[0].status, RegionStatus::Testing);
    assert!(mid_run[0].result.is_some(), "prior result retained mid-run");

    second.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_configure_rejected_mid_run() {
    let prober = Arc::new(ScriptedProber::new(&[(
        "iad1",
        Script::Succeed { upstream_ms: 50, delay_ms: 80 },
    )]));

    let orchestrator = Arc::new(RegionOrchestrator::new(
        Arc::clone(&prober) as Arc<dyn Prober>
    ));
    orchestrator.configure(&["iad1"]).await.unwrap();

    let runner = Arc::clone(&orchestrator);
    let run = tokio::spawn(async move { runner.start_run(target()).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = orchestrator.configure(&["lhr1"]).await.unwrap_err();
    assert_eq!(err, OrchestratorError::AlreadyRunning);

    run.await.unwrap().unwrap();
}
