//! Factgate Gatekeeper
//!
//! The content gates a generated article must clear before it may be
//! published.
//!
//! The Gatekeeper provides:
//! - Number traceability against the snapshot, with computation verification
//! - Institution attribution checks
//! - Intra-document price and change consistency
//! - Paywall, required-section, source and bilingual-alignment checks
//! - Compliance language checks
//!
//! Each gate implements [`Gate`] and can run on its own thread; the
//! orchestrator fans them out and classifies the combined violations.
//!
//! # Examples
//!
//! ```
//! use factgate_domain::{Document, GateName};
//! use factgate_gatekeeper::Gatekeeper;
//! use factgate_store::FactStore;
//!
//! let facts = FactStore::from_json_str(r#"{"NVDA": {"price": 188.12, "change_pct": -0.386}}"#).unwrap();
//! let document = Document {
//!     markup: "NVDA 股價 188.12，下跌 0.39%".to_string(),
//!     ..Default::default()
//! };
//!
//! let gatekeeper = Gatekeeper::default_config().unwrap();
//! let outcomes = gatekeeper.check(&document, &facts);
//! let traceability = outcomes.iter().find(|o| o.gate == GateName::NumberTraceability).unwrap();
//! assert!(traceability.passed);
//! ```

#![warn(missing_docs)]

pub mod allowlist;
pub mod attribution;
pub mod computation;
mod config;
pub mod consistency;
mod error;
mod gate;
pub mod compliance;
pub mod structural;
mod text;
mod validator;


pub use config::{
    AttributionConfig, ComplianceConfig, ConsistencyConfig, GateConfig, Institution, SectionRule, SourceRules,
    StructuralConfig, TraceabilityConfig,
};
pub use error::GatekeeperError;
pub use gate::{incomplete_outcome, Gate};
pub use validator::{run_gate, Gatekeeper};
