//! Fan-out of the gates over one article and fan-in into a report

use crate::{OrchestratorConfig, OrchestratorError, RunMetrics};
use factgate_domain::{Document, GateName, GateOutcome, GateReport, Violation, ViolationKind};
use factgate_gatekeeper::{incomplete_outcome, run_gate, Gate, Gatekeeper};
use factgate_store::FactStore;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinHandle};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Hex SHA-256 of some input bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Fingerprints of the exact inputs a report was produced from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digests {
    /// SHA-256 of the snapshot bytes
    pub snapshot: String,
    /// SHA-256 of the document bytes
    pub document: String,
}

impl Digests {
    /// Digest both inputs
    pub fn of(snapshot: &[u8], document: &[u8]) -> Self {
        Self {
            snapshot: sha256_hex(snapshot),
            document: sha256_hex(document),
        }
    }
}

/// One finished article: the report plus the run's metrics
#[derive(Debug, Clone)]
pub struct Run {
    /// The audit artifact
    pub report: GateReport,
    /// Counters and timing for this run only
    pub metrics: RunMetrics,
}

/// Raw inputs for one article of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchJob {
    /// Snapshot JSON
    pub snapshot: String,
    /// Document JSON
    pub document: String,
}

/// Runs every gate against an article and classifies the result
///
/// Cheap to clone; clones share the compiled gates.
///
/// # Examples
///
/// ```
/// use factgate_domain::Verdict;
/// use factgate_orchestrator::Orchestrator;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Orchestrator::default_config()?;
/// let run = orchestrator.evaluate_json("not json", r#"{"id": "a1", "html": "..."}"#).await?;
///
/// // A snapshot that cannot be loaded blocks publication
/// assert_eq!(run.report.verdict, Verdict::Block);
/// assert_eq!(run.report.gates.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<OrchestratorConfig>,
    gates: Arc<[Arc<dyn Gate>]>,
}

impl Orchestrator {
    /// Create a new Orchestrator with the given configuration
    ///
    /// Fails when the configuration is invalid or a gate cannot be built.
    pub fn new(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::Config)?;
        let gatekeeper = Gatekeeper::new(config.gates.clone())?;
        let gates = gatekeeper.gates().to_vec();
        Ok(Self::with_gates(config, gates))
    }

    /// Create an Orchestrator with default configuration
    pub fn default_config() -> Result<Self, OrchestratorError> {
        Self::new(OrchestratorConfig::default())
    }

    /// Create an Orchestrator over an explicit gate set
    ///
    /// `config.gates` is not consulted; only the run limits apply.
    pub fn with_gates(config: OrchestratorConfig, gates: Vec<Arc<dyn Gate>>) -> Self {
        debug!(gates = gates.len(), timeout_ms = config.timeout_ms, "Orchestrator ready");
        Self {
            config: Arc::new(config),
            gates: gates.into(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run every gate against a loaded fact store
    ///
    /// Each gate runs on its own blocking task. A gate that panics or has
    /// not finished by the deadline gets a `ValidationIncomplete` outcome.
    ///
    /// Gate work is not cancelled at the deadline. A timed-out gate keeps its
    /// blocking thread until it returns, and its late result is discarded.
    pub async fn evaluate(&self, facts: Arc<FactStore>, document: Arc<Document>, digests: Digests) -> Run {
        let started = std::time::Instant::now();
        let deadline = Instant::now() + self.config.timeout();

        let handles: Vec<(GateName, JoinHandle<GateOutcome>)> = self
            .gates
            .iter()
            .map(|gate| {
                let gate = Arc::clone(gate);
                let facts = Arc::clone(&facts);
                let document = Arc::clone(&document);
                let name = gate.name();
                let handle = task::spawn_blocking(move || run_gate(gate.as_ref(), &document, &*facts));
                (name, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match timeout_at(deadline, handle).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    warn!(gate = %name, error = %e, "Gate task failed");
                    incomplete_outcome(name, e)
                }
                Err(_) => {
                    warn!(gate = %name, timeout_ms = self.config.timeout_ms, "Gate timed out");
                    incomplete_outcome(name, format!("timed out after {} ms", self.config.timeout_ms))
                }
            };
            outcomes.push(outcome);
        }

        self.finish(&document, digests, outcomes, started)
    }

    /// Load the snapshot, parse the document and run every gate
    ///
    /// A snapshot that fails to load yields a report holding only the
    /// `fact_store` gate with an `InputIntegrity` violation. A document that
    /// cannot be parsed is an operational error.
    pub async fn evaluate_json(&self, snapshot: &str, document: &str) -> Result<Run, OrchestratorError> {
        let digests = Digests::of(snapshot.as_bytes(), document.as_bytes());
        let document = Document::from_json_str(document).map_err(|e| OrchestratorError::Document(e.to_string()))?;

        match FactStore::from_json_str(snapshot) {
            Ok(facts) => Ok(self.evaluate(Arc::new(facts), Arc::new(document), digests).await),
            Err(e) => Ok(self.reject_snapshot(&document, digests, e)),
        }
    }

    /// Report a snapshot that could not be read or loaded
    ///
    /// No gate runs: without facts nothing in the article can be verified.
    pub fn reject_snapshot(&self, document: &Document, digests: Digests, detail: impl Display) -> Run {
        let started = std::time::Instant::now();
        warn!(document = %document.id, error = %detail, "Snapshot rejected");
        let violation = Violation::new(
            GateName::FactStore,
            ViolationKind::InputIntegrity,
            format!("snapshot could not be loaded: {}", detail),
        )
        .at("snapshot");
        self.finish(document, digests, vec![GateOutcome::incomplete(GateName::FactStore, violation)], started)
    }

    /// Validate several articles concurrently
    ///
    /// Results come back in input order; each run is independent.
    pub async fn run_batch(&self, jobs: Vec<BatchJob>) -> Vec<Result<Run, OrchestratorError>> {
        let permits = Arc::new(Semaphore::new(self.config.batch_concurrency));

        let handles: Vec<JoinHandle<Result<Run, OrchestratorError>>> = jobs
            .into_iter()
            .map(|job| {
                let orchestrator = self.clone();
                let permits = Arc::clone(&permits);
                tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| OrchestratorError::Worker(e.to_string()))?;
                    orchestrator.evaluate_json(&job.snapshot, &job.document).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(OrchestratorError::Worker(e.to_string())),
            });
        }
        results
    }

    fn finish(
        &self,
        document: &Document,
        digests: Digests,
        outcomes: Vec<GateOutcome>,
        started: std::time::Instant,
    ) -> Run {
        let mut metrics = RunMetrics::new();
        for outcome in &outcomes {
            metrics.record_outcome(outcome);
        }

        let report = GateReport::assemble(
            &document.id,
            &document.doc_type,
            digests.snapshot,
            digests.document,
            outcomes,
        );
        metrics.record_run(started.elapsed());

        info!(
            document = %report.document_id,
            verdict = %report.verdict,
            critical = report.counts.critical,
            high = report.counts.high,
            medium = report.counts.medium,
            "Gate run complete"
        );

        Run { report, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_domain::{FactLookup, Severity, Verdict};
    use factgate_gatekeeper::GatekeeperError;
    use std::time::Duration;

    struct SlowGate(Duration);

    impl Gate for SlowGate {
        fn name(&self) -> GateName {
            GateName::Attribution
        }

        fn check(&self, _document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
            std::thread::sleep(self.0);
            Ok(GateOutcome::new(GateName::Attribution, Vec::new()))
        }
    }

    struct PanickingGate;

    impl Gate for PanickingGate {
        fn name(&self) -> GateName {
            GateName::Consistency
        }

        fn check(&self, _document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
            panic!("gate bug");
        }
    }

    struct QuietGate(GateName);

    impl Gate for QuietGate {
        fn name(&self) -> GateName {
            self.0
        }

        fn check(&self, _document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
            Ok(GateOutcome::new(self.0, Vec::new()).with_stat("extracted", 3))
        }
    }

    fn inputs() -> (Arc<FactStore>, Arc<Document>) {
        let facts = FactStore::from_json_str(r#"{"NVDA": {"price": 188.12}}"#).unwrap();
        let document = Document {
            id: "d1".to_string(),
            ..Default::default()
        };
        (Arc::new(facts), Arc::new(document))
    }

    fn config(timeout_ms: u64) -> OrchestratorConfig {
        OrchestratorConfig {
            timeout_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(Orchestrator::new(config(0)), Err(OrchestratorError::Config(_))));
    }

    #[tokio::test]
    async fn test_unfinished_gate_is_incomplete() {
        let orchestrator = Orchestrator::with_gates(
            config(50),
            vec![
                Arc::new(QuietGate(GateName::NumberTraceability)),
                Arc::new(SlowGate(Duration::from_millis(500))),
            ],
        );
        let (facts, document) = inputs();
        let started = std::time::Instant::now();
        let run = orchestrator.evaluate(facts, document, Digests::default()).await;

        // the slow gate is still sleeping on its own thread
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(run.report.gate(GateName::NumberTraceability).unwrap().passed);
        let slow = run.report.gate(GateName::Attribution).unwrap();
        assert_eq!(slow.violations[0].kind(), ViolationKind::ValidationIncomplete);
        assert!(slow.violations[0].description().contains("timed out after 50 ms"));
        assert_eq!(run.report.verdict, Verdict::Block);
        assert_eq!(run.metrics.gates_incomplete, 1);
    }

    #[tokio::test]
    async fn test_panicking_gate_fails_closed() {
        let orchestrator = Orchestrator::with_gates(
            config(1_000),
            vec![Arc::new(PanickingGate), Arc::new(QuietGate(GateName::Compliance))],
        );
        let (facts, document) = inputs();
        let run = orchestrator.evaluate(facts, document, Digests::default()).await;

        let broken = run.report.gate(GateName::Consistency).unwrap();
        assert_eq!(broken.violations.len(), 1);
        assert_eq!(broken.violations[0].severity(), Severity::Critical);
        assert!(run.report.gate(GateName::Compliance).unwrap().passed);
        assert_eq!(run.report.verdict, Verdict::Block);
    }

    #[tokio::test]
    async fn test_metrics_returned_beside_report() {
        let orchestrator =
            Orchestrator::with_gates(config(1_000), vec![Arc::new(QuietGate(GateName::NumberTraceability))]);
        let (facts, document) = inputs();
        let run = orchestrator.evaluate(facts, document, Digests::default()).await;
        assert_eq!(run.metrics.runs, 1);
        assert_eq!(run.metrics.gates_run, 1);
        assert_eq!(run.metrics.numbers_extracted, 3);
    }

    #[tokio::test]
    async fn test_malformed_snapshot_short_circuits() {
        let orchestrator = Orchestrator::default_config().unwrap();
        let run = orchestrator.evaluate_json("{\"NVDA\": ", r#"{"id": "d1"}"#).await.unwrap();

        assert_eq!(run.report.gates.len(), 1);
        let gate = &run.report.gates[0];
        assert_eq!(gate.gate, GateName::FactStore);
        assert_eq!(gate.violations[0].kind(), ViolationKind::InputIntegrity);
        assert_eq!(run.report.verdict, Verdict::Block);
        assert!(!run.report.can_publish);
    }

    #[tokio::test]
    async fn test_malformed_document_is_an_error() {
        let orchestrator = Orchestrator::default_config().unwrap();
        let result = orchestrator.evaluate_json(r#"{"NVDA": {"price": 1.5}}"#, "[1, 2").await;
        assert!(matches!(result, Err(OrchestratorError::Document(_))));
    }

    #[tokio::test]
    async fn test_digests_cover_raw_inputs() {
        let orchestrator = Orchestrator::default_config().unwrap();
        let snapshot = r#"{"NVDA": {"price": 188.12}}"#;
        let document = r#"{"id": "d1", "html": "NVDA 188.12"}"#;
        let run = orchestrator.evaluate_json(snapshot, document).await.unwrap();
        assert_eq!(run.report.snapshot_digest, sha256_hex(snapshot.as_bytes()));
        assert_eq!(run.report.document_digest, sha256_hex(document.as_bytes()));
    }
}
