//! Factgate Orchestrator
//!
//! Runs the document gates against one article in parallel and folds their
//! outcomes into a single [`GateReport`](factgate_domain::GateReport).
//!
//! # Overview
//!
//! The Orchestrator is responsible for:
//! - **Fan-out**: every gate runs on its own blocking task over shared,
//!   read-only inputs (`Arc<FactStore>`, `Arc<Document>`)
//! - **Fan-in**: outcomes are collected before classification, so every gate
//!   reports all of its violations
//! - **Failing closed**: a malformed snapshot, a panicking gate or a missed
//!   deadline all end in a critical violation, never in a silent pass
//! - **Batches**: several articles validate concurrently, results in input order
//! - **Metrics**: per-run counters returned beside the report, never inside it
//!
//! ## Verdicts
//!
//! | Worst violation | Verdict | Publish | Newsletter |
//! |-----------------|---------|---------|------------|
//! | critical | `BLOCK` | no | no |
//! | high or medium | `DRAFT_ONLY` | yes | no |
//! | none | `PASS` | yes | yes |
//!
//! # Usage
//!
//! ```
//! use factgate_domain::GateName;
//! use factgate_orchestrator::Orchestrator;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::default_config()?;
//! let snapshot = r#"{"NVDA": {"price": 188.12, "change_pct": -0.386}}"#;
//! let document = r#"{"id": "flash-1", "html": "NVDA 股價 188.12，下跌 0.39%"}"#;
//!
//! let run = orchestrator.evaluate_json(snapshot, document).await?;
//! assert!(run.report.gate(GateName::NumberTraceability).unwrap().passed);
//! println!("{}", run.metrics.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! The run limits wrap the gate rules and load from TOML:
//!
//! ```toml
//! timeout_ms = 10000
//! batch_concurrency = 4
//!
//! [gates.traceability]
//! rounding_epsilon = 0.005
//! min_rounding_significant_digits = 2
//!
//! [gates.structural]
//! min_public_chars = 200
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod orchestrator;

pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use metrics::RunMetrics;
pub use orchestrator::{sha256_hex, BatchJob, Digests, Orchestrator, Run};
