//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use factgate_domain::{ExtractedNumber, GateReport, Severity, Verdict};
use factgate_store::FactStore;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const DESCRIPTION_CHARS: usize = 72;

/// One scanned number, optionally with how it traced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanEntry {
    /// The number as extracted
    #[serde(flatten)]
    pub number: ExtractedNumber,
    /// Trace result, when a snapshot was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a gate report.
    pub fn format_report(&self, report: &GateReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(report.to_json_pretty()?),
            OutputFormat::Table => Ok(self.format_report_table(report)),
            OutputFormat::Quiet => Ok(report.verdict.to_string()),
        }
    }

    fn format_report_table(&self, report: &GateReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Gate", "Status", "Violations", "Stats"]);
        for outcome in &report.gates {
            let status = if outcome.passed { "pass" } else { "fail" };
            let stats = outcome
                .stats
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join(" ");
            builder.push_record([
                outcome.gate.as_str().to_string(),
                status.to_string(),
                outcome.violations.len().to_string(),
                stats,
            ]);
        }
        let mut gates = builder.build();
        gates
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let mut sections = vec![
            format!("Document: {} ({})", report.document_id, report.doc_type),
            gates.to_string(),
        ];

        if report.violations().next().is_some() {
            let mut builder = Builder::default();
            builder.push_record(["Severity", "Kind", "Location", "Description"]);
            for violation in report.violations() {
                builder.push_record([
                    self.severity(violation.severity()),
                    violation.kind().as_str().to_string(),
                    violation.location().to_string(),
                    truncate(violation.description(), DESCRIPTION_CHARS),
                ]);
            }
            let mut violations = builder.build();
            violations
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            sections.push(violations.to_string());
        }

        sections.push(format!(
            "Verdict: {}  (critical {}, high {}, medium {})  publish: {}  newsletter: {}",
            self.verdict(report.verdict),
            report.counts.critical,
            report.counts.high,
            report.counts.medium,
            yes_no(report.can_publish),
            yes_no(report.can_send_newsletter),
        ));

        sections.join("\n")
    }

    /// Format scanned numbers.
    pub fn format_numbers(&self, entries: &[ScanEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
            OutputFormat::Quiet => Ok(entries.len().to_string()),
            OutputFormat::Table => {
                if entries.is_empty() {
                    return Ok(self.colorize("No numbers found.", "yellow"));
                }

                let traced = entries.iter().any(|e| e.trace.is_some());
                let mut builder = Builder::default();
                let mut header = vec!["Raw", "Kind", "Canonical", "Safe", "Location"];
                if traced {
                    header.push("Trace");
                }
                builder.push_record(header);

                for entry in entries {
                    let number = &entry.number;
                    let mut row = vec![
                        number.raw.clone(),
                        number.kind.as_str().to_string(),
                        number.canonical.clone(),
                        number.safe.map(|s| s.as_str()).unwrap_or("-").to_string(),
                        number.location.clone(),
                    ];
                    if traced {
                        row.push(self.trace(entry.trace.as_deref().unwrap_or("-")));
                    }
                    builder.push_record(row);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a fact store summary.
    pub fn format_facts(&self, store: &FactStore) -> Result<String> {
        let summary = store.summary();
        match self.format {
            OutputFormat::Json => {
                let tickers: serde_json::Map<String, serde_json::Value> = store
                    .tickers()
                    .map(|(symbol, facts)| Ok((symbol.to_string(), serde_json::to_value(facts)?)))
                    .collect::<std::result::Result<_, serde_json::Error>>()?;
                let value = serde_json::json!({
                    "literals": summary.literals,
                    "plain_values": summary.plain_values,
                    "percent_values": summary.percent_values,
                    "paths": summary.paths,
                    "dates": store.dates().collect::<Vec<_>>(),
                    "tickers": tickers,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(summary.literals.to_string()),
            OutputFormat::Table => {
                let mut lines = vec![
                    format!("Literals: {}", summary.literals),
                    format!("Values: {} plain, {} percent", summary.plain_values, summary.percent_values),
                    format!("Source paths: {}", summary.paths),
                    format!("Dates: {}", store.dates().collect::<Vec<_>>().join(", ")),
                ];

                if summary.tickers == 0 {
                    lines.push(self.colorize("No tickers indexed.", "yellow"));
                    return Ok(lines.join("\n"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Ticker", "Price", "Change %", "Multiples", "As of"]);
                for (symbol, facts) in store.tickers() {
                    let multiples = facts
                        .multiples
                        .iter()
                        .map(|(name, value)| format!("{}={}", name, value))
                        .collect::<Vec<_>>()
                        .join(" ");
                    builder.push_record([
                        symbol.to_string(),
                        optional(facts.price),
                        optional(facts.change_pct),
                        multiples,
                        facts.timestamp.clone().unwrap_or_else(|| "-".to_string()),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                lines.push(table.to_string());
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    fn verdict(&self, verdict: Verdict) -> String {
        let color = match verdict {
            Verdict::Pass => "green",
            Verdict::DraftOnly => "yellow",
            Verdict::Block => "red",
        };
        self.colorize(verdict.as_str(), color)
    }

    fn severity(&self, severity: Severity) -> String {
        let color = match severity {
            Severity::Critical => "red",
            Severity::High => "yellow",
            Severity::Medium => "cyan",
        };
        self.colorize(severity.as_str(), color)
    }

    fn trace(&self, trace: &str) -> String {
        if trace == "untraced" {
            self.colorize(trace, "red")
        } else {
            trace.to_string()
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
