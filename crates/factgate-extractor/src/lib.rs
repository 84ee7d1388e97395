//! Factgate Number Extractor
//!
//! Finds every numeric token in generated article text so it can be traced
//! back to the data snapshot.
//!
//! # Overview
//!
//! Recognized shapes are declared as a pattern table (shape, regex,
//! normalizer) and compiled into one alternation, so each piece of text is
//! scanned in a single forward pass. Scanning is lazy: [`NumberExtractor::scan`]
//! returns an iterator.
//!
//! # Architecture
//!
//! ```text
//! Document → text segments → Scan → ExtractedNumber → Allowlist Matcher
//! ```
//!
//! # Key Features
//!
//! - **Shapes**: ISO, CJK and slash dates, currency with magnitudes, percentages,
//!   multiples, grouped and plain numbers
//! - **Safe formatting**: small counts, years, list indices and anything inside
//!   markup are flagged as needing no traceability
//! - **Boundaries**: tokens glued to words (`H100`, `Q4`, `0x1F`) are skipped
//! - **Round-trip**: `raw` is always exactly the scanned substring
//!
//! # Example Usage
//!
//! ```
//! use factgate_domain::NumberKind;
//! use factgate_extractor::NumberExtractor;
//!
//! let extractor = NumberExtractor::with_defaults().unwrap();
//! let numbers: Vec<_> = extractor.scan("NVDA 股價 188.12，下跌 0.39%", "markup").collect();
//!
//! assert_eq!(numbers.len(), 2);
//! assert_eq!(numbers[0].raw, "188.12");
//! assert_eq!(numbers[1].kind, NumberKind::Percentage);
//! assert_eq!(numbers[1].canonical, "0.39%");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
pub mod markup;
mod patterns;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::{NumberExtractor, Scan};
pub use markup::{strip_markup, tag_spans};
