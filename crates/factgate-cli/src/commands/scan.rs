//! Scan command implementation.

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{Formatter, ScanEntry};
use factgate_domain::{Document, ExtractedNumber};
use factgate_extractor::NumberExtractor;
use factgate_gatekeeper::allowlist::{Trace, TraceabilityGate};
use factgate_gatekeeper::computation::verify_computations;
use factgate_store::FactStore;
use std::fs;

/// Execute the scan command.
pub fn execute_scan(args: ScanArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let entries = scan(&args, config)?;
    println!("{}", formatter.format_numbers(&entries)?);
    Ok(())
}

fn scan(args: &ScanArgs, config: &Config) -> Result<Vec<ScanEntry>> {
    let document = Document::from_json_str(&fs::read_to_string(&args.document)?)?;
    let gates = &config.engine.gates;

    let numbers: Vec<ExtractedNumber> = NumberExtractor::new(gates.extraction.clone())?
        .scan_document(&document)
        .into_iter()
        .filter(|n| !args.unsafe_only || !n.is_safe())
        .collect();

    let traces: Vec<Option<String>> = match &args.snapshot {
        Some(path) => {
            let facts = FactStore::from_json_str(&fs::read_to_string(path)?)?;
            let gate = TraceabilityGate::new(gates.extraction.clone(), gates.traceability.clone())?;
            let computations = verify_computations(&document.computations, &facts);
            numbers
                .iter()
                .map(|n| Some(trace_label(&gate.trace(n, &facts, &computations))))
                .collect()
        }
        None => vec![None; numbers.len()],
    };

    Ok(numbers
        .into_iter()
        .zip(traces)
        .map(|(number, trace)| ScanEntry { number, trace })
        .collect())
}

/// Short label for a trace result.
pub fn trace_label(trace: &Trace) -> String {
    match trace {
        Trace::Safe(reason) => format!("safe:{}", reason.as_str()),
        Trace::Exact => "exact".to_string(),
        Trace::Tolerance => "tolerance".to_string(),
        Trace::Computed(id) => format!("computed:{}", id),
        Trace::InvalidComputation(id) => format!("invalid_computation:{}", id),
        Trace::Untraced => "untraced".to_string(),
    }
}
