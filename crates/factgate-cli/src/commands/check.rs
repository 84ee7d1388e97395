//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use factgate_domain::{Document, Verdict};
use factgate_orchestrator::{Digests, Orchestrator, OrchestratorError};
use std::fs;
use tracing::debug;

/// Process exit code for a verdict.
pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::DraftOnly => 2,
        Verdict::Block => 3,
    }
}

/// Execute the check command.
///
/// Returns the exit code for the verdict. A snapshot that cannot be read
/// still produces a report (verdict BLOCK); an unreadable document does not.
pub async fn execute_check(args: CheckArgs, config: &Config, formatter: &Formatter) -> Result<i32> {
    let mut engine = config.engine.clone();
    if let Some(timeout_ms) = args.timeout_ms {
        engine.timeout_ms = timeout_ms;
    }
    let orchestrator = Orchestrator::new(engine)?;

    let document = fs::read_to_string(&args.document)?;
    let run = match fs::read_to_string(&args.snapshot) {
        Ok(snapshot) => orchestrator.evaluate_json(&snapshot, &document).await?,
        Err(e) => {
            let parsed = Document::from_json_str(&document).map_err(|e| OrchestratorError::Document(e.to_string()))?;
            let digests = Digests::of(b"", document.as_bytes());
            orchestrator.reject_snapshot(&parsed, digests, format!("cannot read {}: {}", args.snapshot.display(), e))
        }
    };
    debug!("{}", run.metrics.summary());

    if let Some(path) = &args.report {
        fs::write(path, run.report.to_json_pretty()?)?;
        debug!(path = %path.display(), "Report written");
    }

    println!("{}", formatter.format_report(&run.report)?);
    Ok(exit_code(run.report.verdict))
}
