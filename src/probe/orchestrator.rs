//! Region run orchestration.
//!
//! Owns the per-region run states, launches one probe per configured region
//! concurrently, and applies each outcome independently once every probe has
//! settled. Exactly one run can be in flight at a time; a second start while
//! one is active is rejected rather than cancelling anything, so an
//! abandoned run can never overwrite a newer one.
//!
//! The state sequence is the only shared mutable data. It is written in two
//! synchronous batches per run (the `testing` flip at start, the outcome
//! application after the all-settled join); probes never touch it directly.

use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::edge::{ProbeTarget, Prober};
use super::error::OrchestratorError;
use super::region::Region;
use super::result::{RegionRunState, RegionStatus};

/// Orchestrates probe runs across the configured region subset.
pub struct RegionOrchestrator {
    catalog: Vec<Region>,
    states: Arc<RwLock<Vec<RegionRunState>>>,
    running: Arc<AtomicBool>,
    prober: Arc<dyn Prober>,
    on_complete: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl RegionOrchestrator {
    /// Orchestrator over the built-in catalog, initially configured for
    /// every region.
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self::with_catalog(prober, Region::catalog())
    }

    /// Orchestrator over an explicit catalog.
    pub fn with_catalog(prober: Arc<dyn Prober>, catalog: Vec<Region>) -> Self {
        let states = catalog
            .iter()
            .cloned()
            .map(RegionRunState::idle)
            .collect();

        Self {
            catalog,
            states: Arc::new(RwLock::new(states)),
            running: Arc::new(AtomicBool::new(false)),
            prober,
            on_complete: None,
        }
    }

    /// Register the completion notification, invoked exactly once per run
    /// after the run guard has been released.
    pub fn on_testing_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Select the region subset for subsequent runs.
    ///
    /// The subset keeps catalog declaration order regardless of the order of
    /// `ids`; ids not in the catalog are skipped with a warning. Every
    /// selected entry is reset to idle with no result. Performs no network
    /// calls. Rejected while a run is in flight.
    pub async fn configure(&self, ids: &[&str]) -> Result<(), OrchestratorError> {
        if self.is_running() {
            return Err(OrchestratorError::AlreadyRunning);
        }

        for id in ids {
            if !self.catalog.iter().any(|region| region.id == *id) {
                warn!(region = %id, "ignoring unknown region id");
            }
        }

        let selected: Vec<RegionRunState> = self
            .catalog
            .iter()
            .filter(|region| ids.contains(&region.id.as_str()))
            .cloned()
            .map(RegionRunState::idle)
            .collect();

        debug!(regions = selected.len(), "region subset configured");
        *self.states.write().await = selected;
        Ok(())
    }

    /// Run one probe per configured region, concurrently, and wait for all
    /// of them to settle.
    ///
    /// Returns `AlreadyRunning` without side effects if a run is in flight:
    /// the active run is unaffected, no probes launch, and no extra
    /// completion callback fires. Otherwise every configured region flips to
    /// `testing` (prior results stay visible until the region settles),
    /// probes launch in declaration order, and each outcome is applied by
    /// region id once all have settled. The completion callback fires
    /// exactly once per run, even when every region failed.
    pub async fn start_run(&self, target: ProbeTarget) -> Result<(), OrchestratorError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("probe run already in flight; ignoring start request");
            return Err(OrchestratorError::AlreadyRunning);
        }

        let regions: Vec<Region> = {
            let mut states = self.states.write().await;
            if states.is_empty() {
                self.running.store(false, Ordering::SeqCst);
                return Err(OrchestratorError::NoRegions);
            }
            for state in states.iter_mut() {
                state.status = RegionStatus::Testing;
                state.error = None;
            }
            states.iter().map(|state| state.region.clone()).collect()
        };

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            regions = regions.len(),
            target = %target.url,
            "starting probe run"
        );

        let probes = regions.iter().map(|region| {
            let prober = Arc::clone(&self.prober);
            let target = target.clone();
            let region_id = region.id.clone();
            async move {
                let outcome = prober.probe(&region_id, &target).await;
                (region_id, outcome)
            }
        });

        // All-settled join: each leg resolves to its own outcome, so one
        // slow or broken region never hides the others.
        let outcomes = join_all(probes).await;

        {
            let mut states = self.states.write().await;
            for (region_id, outcome) in outcomes {
                let Some(state) = states.iter_mut().find(|s| s.region.id == region_id) else {
                    warn!(region = %region_id, "settled probe for an unconfigured region");
                    continue;
                };
                match outcome {
                    Ok(result) => {
                        state.status = RegionStatus::Complete;
                        state.result = Some(result);
                    }
                    Err(err) => {
                        warn!(%run_id, region = %region_id, error = %err, "probe failed");
                        state.status = RegionStatus::Error;
                        state.error = Some(err.to_string());
                        state.result = None;
                    }
                }
            }
        }

        info!(%run_id, "probe run settled");
        self.running.store(false, Ordering::SeqCst);

        if let Some(callback) = &self.on_complete {
            callback();
        }

        Ok(())
    }

    /// Ordered snapshot of the per-region states for rendering. Observable
    /// mid-run: regions show `testing` while their probes are in flight.
    pub async fn snapshot(&self) -> Vec<RegionRunState> {
        self.states.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::error::ProbeError;
    use crate::probe::result::ProbeResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    struct NeverCalledProber;

    #[async_trait]
    impl Prober for NeverCalledProber {
        async fn probe(
            &self,
            _region_id: &str,
            _target: &ProbeTarget,
        ) -> Result<ProbeResult, ProbeError> {
            panic!("prober must not be called");
        }
    }

    struct EchoProber;

    #[async_trait]
    impl Prober for EchoProber {
        async fn probe(
            &self,
            region_id: &str,
            _target: &ProbeTarget,
        ) -> Result<ProbeResult, ProbeError> {
            Ok(ProbeResult {
                region_id: region_id.to_string(),
                edge_latency_ms: 1,
                upstream_latency_ms: 1,
                upstream_cache_state: Default::default(),
                upstream_headers: HashMap::new(),
                edge_cache_state: Default::default(),
                edge_headers: HashMap::new(),
                measured_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_configure_keeps_declaration_order() {
        let orchestrator = RegionOrchestrator::new(Arc::new(NeverCalledProber));
        orchestrator
            .configure(&["sin1", "iad1", "lhr1"])
            .await
            .unwrap();

        let states = orchestrator.snapshot().await;
        let ids: Vec<&str> = states.iter().map(|s| s.region.id.as_str()).collect();
        // Catalog order, not argument order.
        assert_eq!(ids, vec!["iad1", "lhr1", "sin1"]);
        assert!(states.iter().all(|s| s.status == RegionStatus::Idle));
    }

    #[tokio::test]
    async fn test_configure_skips_unknown_ids() {
        let orchestrator = RegionOrchestrator::new(Arc::new(NeverCalledProber));
        orchestrator.configure(&["iad1", "nope"]).await.unwrap();

        let states = orchestrator.snapshot().await;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].region.id, "iad1");
    }

    #[tokio::test]
    async fn test_start_run_with_empty_subset() {
        let orchestrator = RegionOrchestrator::new(Arc::new(NeverCalledProber));
        orchestrator.configure(&[]).await.unwrap();

        let err = orchestrator
            .start_run(ProbeTarget::new("https://example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, OrchestratorError::NoRegions);
        // Guard must be released on the error path.
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_default_configuration_covers_catalog() {
        let orchestrator = RegionOrchestrator::new(Arc::new(EchoProber));
        assert_eq!(orchestrator.snapshot().await.len(), Region::catalog().len());

        orchestrator
            .start_run(ProbeTarget::new("https://example.com"))
            .await
            .unwrap();
        let states = orchestrator.snapshot().await;
        assert!(states.iter().all(|s| s.status == RegionStatus::Complete));
    }
}
