//! Violation module - one failed check instance

use crate::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The gates that make up one validation run
///
/// Variant order is the order gates appear in a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    /// Snapshot parsing and fact store construction
    FactStore,
    /// Every displayed number traces to a fact or a disclosed computation
    NumberTraceability,
    /// Named institutions appear only alongside a primary source
    Attribution,
    /// Each entity carries one price and one change value
    Consistency,
    /// Members-only marker placement
    Paywall,
    /// Required sections per document type
    RequiredSections,
    /// Enough cited sources, and no rumor as the primary event
    Sources,
    /// Conclusion and secondary-language summary agree
    BilingualAlignment,
    /// Promissory language, disclosures and leftover placeholders
    Compliance,
}

impl GateName {
    /// All gates that run against a document, in report order
    pub const DOCUMENT_GATES: [GateName; 8] = [
        GateName::NumberTraceability,
        GateName::Attribution,
        GateName::Consistency,
        GateName::Paywall,
        GateName::RequiredSections,
        GateName::Sources,
        GateName::BilingualAlignment,
        GateName::Compliance,
    ];

    /// Get the gate name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::FactStore => "fact_store",
            GateName::NumberTraceability => "number_traceability",
            GateName::Attribution => "attribution",
            GateName::Consistency => "consistency",
            GateName::Paywall => "paywall",
            GateName::RequiredSections => "required_sections",
            GateName::Sources => "sources",
            GateName::BilingualAlignment => "bilingual_alignment",
            GateName::Compliance => "compliance",
        }
    }

    /// Parse a gate name from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fact_store" => Some(GateName::FactStore),
            "number_traceability" => Some(GateName::NumberTraceability),
            "attribution" => Some(GateName::Attribution),
            "consistency" => Some(GateName::Consistency),
            "paywall" => Some(GateName::Paywall),
            "required_sections" => Some(GateName::RequiredSections),
            "sources" => Some(GateName::Sources),
            "bilingual_alignment" => Some(GateName::BilingualAlignment),
            "compliance" => Some(GateName::Compliance),
            _ => None,
        }
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GateName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid gate name: {}", s))
    }
}

/// Violation taxonomy
///
/// The severity of each kind is fixed; see [`ViolationKind::severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A displayed number with no fact or computation behind it
    Fabrication,
    /// A disclosed computation that does not hold
    ComputationIntegrity,
    /// A named institution cited without a primary source
    Attribution,
    /// Conflicting values for the same entity field
    Consistency,
    /// The snapshot could not be loaded
    InputIntegrity,
    /// A gate did not finish (timeout or internal error)
    ValidationIncomplete,
    /// Promissory or guaranteed-return language
    ForbiddenLanguage,
    /// Paywall or section structure is wrong
    Structural,
    /// No investment-risk disclosure present
    MissingDisclosure,
    /// An unresolved generation placeholder reached reader-visible text
    Placeholder,
    /// Conclusion and secondary summary disagree
    BilingualMismatch,
}

impl ViolationKind {
    /// The fixed severity for this kind of violation
    pub fn severity(&self) -> Severity {
        match self {
            ViolationKind::Fabrication
            | ViolationKind::ComputationIntegrity
            | ViolationKind::Attribution
            | ViolationKind::Consistency
            | ViolationKind::InputIntegrity
            | ViolationKind::ValidationIncomplete
            | ViolationKind::ForbiddenLanguage => Severity::Critical,
            ViolationKind::Structural
            | ViolationKind::MissingDisclosure
            | ViolationKind::Placeholder => Severity::High,
            ViolationKind::BilingualMismatch => Severity::Medium,
        }
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Fabrication => "fabrication",
            ViolationKind::ComputationIntegrity => "computation_integrity",
            ViolationKind::Attribution => "attribution",
            ViolationKind::Consistency => "consistency",
            ViolationKind::InputIntegrity => "input_integrity",
            ViolationKind::ValidationIncomplete => "validation_incomplete",
            ViolationKind::ForbiddenLanguage => "forbidden_language",
            ViolationKind::Structural => "structural",
            ViolationKind::MissingDisclosure => "missing_disclosure",
            ViolationKind::Placeholder => "placeholder",
            ViolationKind::BilingualMismatch => "bilingual_mismatch",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single failed check
///
/// Severity is derived from the kind at construction and cannot be changed.
/// Fields are read through accessors; the value is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    gate: GateName,
    kind: ViolationKind,
    severity: Severity,
    description: String,
    excerpt: String,
    location: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(gate: GateName, kind: ViolationKind, description: impl Into<String>) -> Self {
        Self {
            gate,
            kind,
            severity: kind.severity(),
            description: description.into(),
            excerpt: String::new(),
            location: String::new(),
        }
    }

    /// Attach the offending excerpt
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    /// Attach the location (document path) of the offending text
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Gate that raised the violation
    pub fn gate(&self) -> GateName {
        self.gate
    }

    /// Kind of violation
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Severity (fixed by kind)
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Offending excerpt, possibly empty
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }

    /// Location in the document, possibly empty
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.description)?;
        if !self.location.is_empty() {
            write!(f, " (at {})", self.location)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_is_derived_from_kind() {
        let v = Violation::new(GateName::Paywall, ViolationKind::Structural, "marker missing");
        assert_eq!(v.severity(), Severity::High);

        let v = Violation::new(GateName::Attribution, ViolationKind::Attribution, "Goldman Sachs");
        assert_eq!(v.severity(), Severity::Critical);

        let v = Violation::new(
            GateName::BilingualAlignment,
            ViolationKind::BilingualMismatch,
            "opposite sentiment",
        );
        assert_eq!(v.severity(), Severity::Medium);
    }

    #[test]
    fn test_integrity_kinds_are_critical() {
        for kind in [
            ViolationKind::Fabrication,
            ViolationKind::ComputationIntegrity,
            ViolationKind::Attribution,
            ViolationKind::Consistency,
            ViolationKind::InputIntegrity,
            ViolationKind::ValidationIncomplete,
        ] {
            assert_eq!(kind.severity(), Severity::Critical, "{kind} must be critical");
        }
    }

    #[test]
    fn test_display_includes_location() {
        let v = Violation::new(GateName::NumberTraceability, ViolationKind::Fabrication, "30% not traceable")
            .with_excerpt("上漲 30%")
            .at("markup");
        assert_eq!(v.to_string(), "[critical] fabrication: 30% not traceable (at markup)");
        assert_eq!(v.excerpt(), "上漲 30%");
    }

    #[test]
    fn test_gate_name_round_trip() {
        for gate in GateName::DOCUMENT_GATES {
            assert_eq!(GateName::parse(gate.as_str()), Some(gate));
        }
        assert!("publishing".parse::<GateName>().is_err());
    }

    #[test]
    fn test_violation_serializes_snake_case() {
        let v = Violation::new(GateName::NumberTraceability, ViolationKind::ComputationIntegrity, "bad median");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["gate"], "number_traceability");
        assert_eq!(json["kind"], "computation_integrity");
        assert_eq!(json["severity"], "critical");
    }
}
