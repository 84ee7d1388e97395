//! Factgate Domain Layer
//!
//! This crate contains the shared vocabulary of the quality gate engine: the
//! values extracted from generated articles, the violations raised against them,
//! and the report that decides whether an article may be published.
//!
//! ## Key Concepts
//!
//! - **Document**: A generated article (structured fields plus rendered markup)
//! - **ExtractedNumber**: A numeric token found in article text, with its context
//! - **ComputationRecord**: A derivation the author disclosed for a derived number
//! - **Violation**: One failed check, with a severity fixed by its kind
//! - **GateReport**: The immutable per-article verdict and audit artifact
//!
//! ## Architecture
//!
//! - Pure data and deterministic logic only
//! - Ground-truth lookup is expressed as the [`FactLookup`] trait so gates can be
//!   tested against in-memory fixtures
//! - The only dependencies are `serde` and `serde_json` for the audit artifact

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod computation;
pub mod document;
pub mod number;
pub mod report;
pub mod severity;
pub mod traits;
pub mod violation;

// Re-exports for convenience
pub use computation::{values_equal, ComputationRecord, Formula};
pub use document::{Document, PrimaryEvent, Source, TextSegment};
pub use number::{canonical_number, ExtractedNumber, NumberKind, SafeReason};
pub use report::{GateOutcome, GateReport, SeverityCounts, Verdict};
pub use severity::Severity;
pub use traits::{FactLookup, TickerFacts, ValueSpace};
pub use violation::{GateName, Violation, ViolationKind};
