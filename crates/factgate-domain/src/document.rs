//! The generated article under validation

use crate::ComputationRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generated article: structured fields plus rendered markup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Article identifier (run id or slug)
    #[serde(default)]
    pub id: String,

    /// Document type, selects the required-section set
    #[serde(default = "default_doc_type", alias = "post_type")]
    pub doc_type: String,

    /// Title
    #[serde(default)]
    pub title: String,

    /// Rendered markup, including the paywall marker
    #[serde(default, alias = "html")]
    pub markup: String,

    /// Structured fields produced alongside the markup
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Declared entities (tickers) the article covers
    #[serde(default, alias = "tickers")]
    pub entities: Vec<String>,

    /// Disclosed computations for derived numbers
    #[serde(default)]
    pub computations: Vec<ComputationRecord>,

    /// Source-language conclusion
    #[serde(default)]
    pub conclusion: Option<String>,

    /// Secondary-language summary
    #[serde(default)]
    pub secondary_summary: Option<String>,

    /// Sources the article was researched from
    #[serde(default)]
    pub sources: Vec<Source>,

    /// The event the article is about
    #[serde(default)]
    pub primary_event: Option<PrimaryEvent>,
}

/// A cited source
///
/// Either a plain `"Title - Publisher: URL"` line or a structured entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    /// Free-form citation line
    Line(String),
    /// Structured citation
    Entry {
        /// Headline, possibly suffixed with ` - Publisher`
        #[serde(default)]
        title: String,
        /// Publishing outlet
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publisher: Option<String>,
        /// Link
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl Source {
    /// Publishing outlet, read from the explicit field or the title suffix
    pub fn publisher(&self) -> Option<&str> {
        let publisher = match self {
            Source::Entry { publisher: Some(publisher), .. } if !publisher.trim().is_empty() => publisher.as_str(),
            Source::Entry { title, .. } => title.rsplit_once(" - ")?.1,
            Source::Line(line) => {
                let (_, tail) = line.rsplit_once(" - ")?;
                tail.split(':').next().unwrap_or(tail)
            }
        };
        Some(publisher.trim()).filter(|p| !p.is_empty())
    }
}

/// What kind of event an article reports on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryEvent {
    /// Event classification (`earnings`, `guidance`, `rumor`)
    #[serde(default)]
    pub event_type: String,

    /// Short event description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
}

fn default_doc_type() -> String {
    "article".to_string()
}

/// A located piece of document text
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment<'a> {
    /// Path of the text in the document (`markup`, `fields.tldr[0]`)
    pub location: String,
    /// The text itself
    pub text: &'a str,
}

impl Document {
    /// Parse a document from JSON
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Every piece of reader-visible text, in a stable order
    ///
    /// Title, markup, each string leaf of the structured fields (keys sorted),
    /// then the conclusion and the secondary summary.
    pub fn text_segments(&self) -> Vec<TextSegment<'_>> {
        let mut segments = Vec::new();
        if !self.title.is_empty() {
            segments.push(TextSegment { location: "title".to_string(), text: &self.title });
        }
        if !self.markup.is_empty() {
            segments.push(TextSegment { location: "markup".to_string(), text: &self.markup });
        }
        for (key, value) in &self.fields {
            collect_strings(value, format!("fields.{key}"), &mut segments);
        }
        if let Some(conclusion) = self.conclusion.as_deref().filter(|s| !s.is_empty()) {
            segments.push(TextSegment { location: "conclusion".to_string(), text: conclusion });
        }
        if let Some(summary) = self.secondary_summary.as_deref().filter(|s| !s.is_empty()) {
            segments.push(TextSegment { location: "secondary_summary".to_string(), text: summary });
        }
        segments
    }

    /// Whether a top-level structured field is present and non-empty
    pub fn has_field(&self, key: &str) -> bool {
        match self.fields.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Item count of an array field
    pub fn field_len(&self, key: &str) -> Option<usize> {
        self.fields.get(key).and_then(Value::as_array).map(Vec::len)
    }
}

fn collect_strings<'a>(value: &'a Value, path: String, out: &mut Vec<TextSegment<'a>>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(TextSegment { location: path, text: s }),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_strings(item, format!("{path}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                collect_strings(item, format!("{path}.{key}"), out);
            }
        }
        _ => {}
    }
}
