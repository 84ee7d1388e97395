//! Gatekeeper configuration

use factgate_extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for every gate of one run
///
/// Built once and shared read-only by all gates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Number extraction
    pub extraction: ExtractorConfig,

    /// Number traceability
    pub traceability: TraceabilityConfig,

    /// Institution attribution
    pub attribution: AttributionConfig,

    /// Intra-document consistency
    pub consistency: ConsistencyConfig,

    /// Paywall, required sections, sources and bilingual alignment
    pub structural: StructuralConfig,

    /// Promissory language, disclosures and placeholders
    pub compliance: ComplianceConfig,
}

/// Tolerances for matching article numbers to facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceabilityConfig {
    /// Maximum relative difference between a shown number and a fact
    pub rounding_epsilon: f64,

    /// Display rounding is only accepted for numbers with at least this many
    /// significant digits
    pub min_rounding_significant_digits: usize,
}

impl Default for TraceabilityConfig {
    fn default() -> Self {
        Self {
            rounding_epsilon: 0.005,
            min_rounding_significant_digits: 2,
        }
    }
}

/// A named financial institution and the ways articles refer to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    /// Canonical name, reported in violations
    pub name: String,

    /// Other spellings, abbreviations and translations
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Institution {
    fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: strings(aliases),
        }
    }

    /// Canonical name followed by every alias
    pub fn spellings(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Which institution mentions are allowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Institutions that may only be cited next to a primary source
    pub institutions: Vec<Institution>,

    /// Phrases that mark a primary source (`10-K`, `公司財報`)
    pub primary_source_markers: Vec<String>,

    /// How far from a mention, in characters, a marker may sit
    pub marker_window_chars: usize,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            institutions: default_institutions(),
            primary_source_markers: strings(&[
                "10-K",
                "10-Q",
                "8-K",
                "20-F",
                "SEC filing",
                "press release",
                "earnings release",
                "earnings call",
                "investor relations",
                "according to the company",
                "公司財報",
                "財報顯示",
                "公司公告",
                "官方公告",
                "新聞稿",
                "法說會",
            ]),
            marker_window_chars: 120,
        }
    }
}

fn default_institutions() -> Vec<Institution> {
    vec![
        Institution::new("Goldman Sachs", &["Goldman", "高盛"]),
        Institution::new("Morgan Stanley", &["摩根士丹利", "大摩"]),
        Institution::new("JPMorgan", &["JP Morgan", "J.P. Morgan", "摩根大通", "小摩"]),
        Institution::new("Citigroup", &["Citi", "花旗"]),
        Institution::new("Barclays", &["巴克萊"]),
        Institution::new("Bank of America", &["BofA", "美銀", "美國銀行"]),
        Institution::new("UBS", &["瑞銀"]),
        Institution::new("Credit Suisse", &["瑞信"]),
        Institution::new("Deutsche Bank", &["德意志銀行", "德銀"]),
        Institution::new("HSBC", &["匯豐"]),
        Institution::new("Wells Fargo", &["富國銀行", "富國"]),
        Institution::new("Jefferies", &["傑富瑞"]),
        Institution::new("Bernstein", &["伯恩斯坦"]),
        Institution::new("Evercore", &[]),
        Institution::new("Cowen", &[]),
        Institution::new("Piper Sandler", &[]),
        Institution::new("Raymond James", &[]),
        Institution::new("Wedbush", &[]),
        Institution::new("Oppenheimer", &[]),
        Institution::new("Stifel", &[]),
        Institution::new("RBC Capital", &["加拿大皇家銀行"]),
        Institution::new("KeyBanc", &[]),
        Institution::new("Mizuho", &["瑞穗"]),
        Institution::new("Nomura", &["野村"]),
        Institution::new("Macquarie", &["麥格理"]),
    ]
}

/// How entity mentions are found and read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Uppercase tokens that are never entities when none are declared
    pub entity_stopwords: Vec<String>,

    /// Words that make an unsigned percentage a decline
    pub negative_words: Vec<String>,

    /// Labels that mark a number as some other metric (`本益比 52.3`)
    pub metric_labels: Vec<String>,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            entity_stopwords: strings(&[
                "AI", "CEO", "CFO", "CPI", "EPS", "ETF", "EV", "FY", "GDP", "GPU", "IPO", "PE", "PS",
                "QOQ", "TTM", "US", "USA", "USD", "YOY", "YTD", "FOMC", "FED", "SEC", "HBM", "TLDR",
            ]),
            negative_words: strings(&[
                "下跌", "下滑", "走低", "收跌", "跌", "fell", "falls", "down", "declined", "dropped",
                "lower",
            ]),
            metric_labels: strings(&[
                "本益比", "P/E", "PE", "P/S", "EPS", "目標價", "target", "毛利率", "margin", "營收",
                "revenue", "殖利率", "yield", "市值", "market cap", "成長", "growth", "YoY", "QoQ",
                "高點", "低點", "新高", "新低", "52週", "52 週", "成交量", "volume", "high", "low",
            ]),
        }
    }
}

/// Required section with optional item-count bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRule {
    /// Field name or markup section id
    pub id: String,

    /// Fewest items allowed when the field is a list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    /// Most items allowed when the field is a list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl SectionRule {
    fn bounded(id: &str, min_items: usize, max_items: usize) -> Self {
        Self {
            id: id.to_string(),
            min_items: Some(min_items),
            max_items: Some(max_items),
        }
    }

    fn at_least(id: &str, min_items: usize) -> Self {
        Self {
            id: id.to_string(),
            min_items: Some(min_items),
            max_items: None,
        }
    }

    fn present(id: &str) -> Self {
        Self {
            id: id.to_string(),
            min_items: None,
            max_items: None,
        }
    }
}

/// Layout rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralConfig {
    /// Accepted spellings of the paywall marker
    pub paywall_markers: Vec<String>,

    /// Minimum reader-visible characters before the paywall
    pub min_public_chars: usize,

    /// Required sections per document type; `default` applies to unlisted types
    pub sections: BTreeMap<String, Vec<SectionRule>>,

    /// Terms that read as positive sentiment
    pub positive_terms: Vec<String>,

    /// Terms that read as negative sentiment
    pub negative_terms: Vec<String>,

    /// Source sufficiency
    pub sources: SourceRules,
}

/// How well sourced an article must be
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRules {
    /// Fewest cited sources
    pub min_count: usize,

    /// Fewest distinct publishers among the sources; 0 disables the check
    pub min_distinct_publishers: usize,

    /// Whether a rumor may be the article's primary event
    pub allow_rumor_as_primary: bool,
}

impl Default for SourceRules {
    fn default() -> Self {
        Self {
            min_count: 3,
            min_distinct_publishers: 0,
            allow_rumor_as_primary: false,
        }
    }
}

impl StructuralConfig {
    /// Section rules for a document type
    pub fn sections_for(&self, doc_type: &str) -> &[SectionRule] {
        self.sections
            .get(doc_type)
            .or_else(|| self.sections.get("default"))
            .map_or(&[], Vec::as_slice)
    }
}

impl Default for StructuralConfig {
    fn default() -> Self {
        let standard = vec![
            SectionRule::bounded("tldr", 3, 8),
            SectionRule::bounded("key_stocks", 1, 10),
            SectionRule::bounded("what_to_watch", 3, 10),
        ];
        let mut earnings = standard.clone();
        earnings.push(SectionRule::present("valuation"));

        let mut sections = BTreeMap::new();
        sections.insert("default".to_string(), vec![SectionRule::bounded("tldr", 3, 8)]);
        sections.insert("flash".to_string(), standard.clone());
        sections.insert("deep".to_string(), standard);
        sections.insert("earnings".to_string(), earnings);

        Self {
            paywall_markers: strings(&["<!--members-only-->", "<!-- members-only -->"]),
            min_public_chars: 200,
            sections,
            positive_terms: strings(&[
                "上漲", "看多", "樂觀", "強勁", "利多", "走高", "bullish", "upside", "strong", "rally",
                "optimistic", "outperform",
            ]),
            negative_terms: strings(&[
                "下跌", "看空", "悲觀", "疲弱", "利空", "走低", "bearish", "downside", "weak", "selloff",
                "pessimistic", "underperform",
            ]),
            sources: SourceRules::default(),
        }
    }
}

/// Language rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Promissory phrases that may never appear
    pub forbidden_phrases: Vec<String>,

    /// At least one of these must appear somewhere in the document
    pub disclosure_keywords: Vec<String>,

    /// Regex patterns of unresolved generation placeholders
    pub placeholder_patterns: Vec<String>,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            forbidden_phrases: strings(&[
                "保證獲利",
                "穩賺不賠",
                "零風險",
                "必漲",
                "必跌",
                "絕對會漲",
                "絕對會跌",
                "絕對賺",
                "絕對不會虧",
                "肯定獲利",
                "肯定賺",
                "guaranteed profit",
                "guaranteed return",
                "risk-free",
                "sure thing",
                "can't lose",
                "will definitely",
                "100% safe",
            ]),
            disclosure_keywords: strings(&[
                "非投資建議",
                "不構成投資建議",
                "投資有風險",
                "not investment advice",
                "does not constitute investment advice",
            ]),
            placeholder_patterns: strings(&[
                r"⟦[^⟧]*⟧",
                r"[+\-]?數據%?",
                r"\$數據",
                r"\[待補\]",
                r"\[TBD\]",
                r"\[PLACEHOLDER\]",
                r"N/A%",
            ]),
        }
    }
}

impl GateConfig {
    /// Strict preset: exact display rounding only, wider marker-free zone
    pub fn strict() -> Self {
        let mut config = Self {
            extraction: ExtractorConfig::strict(),
            traceability: TraceabilityConfig {
                rounding_epsilon: 0.001,
                min_rounding_significant_digits: 3,
            },
            ..Self::default()
        };
        config.attribution.marker_window_chars = 60;
        config.structural.min_public_chars = 300;
        config.structural.sources = SourceRules {
            min_count: 5,
            min_distinct_publishers: 2,
            allow_rumor_as_primary: false,
        };
        for rules in config.structural.sections.values_mut() {
            rules.push(SectionRule::at_least("title_candidates", 5));
        }
        config
    }

    /// Lenient preset: looser rounding and shorter public preview
    pub fn lenient() -> Self {
        let mut config = Self {
            extraction: ExtractorConfig::lenient(),
            traceability: TraceabilityConfig {
                rounding_epsilon: 0.01,
                min_rounding_significant_digits: 2,
            },
            ..Self::default()
        };
        config.attribution.marker_window_chars = 200;
        config.structural.min_public_chars = 100;
        config.structural.sources.min_count = 1;
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.extraction.validate()?;

        let epsilon = self.traceability.rounding_epsilon;
        if !(0.0..0.1).contains(&epsilon) {
            return Err(format!("rounding_epsilon {} must be in [0.0, 0.1)", epsilon));
        }
        if self.traceability.min_rounding_significant_digits == 0 {
            return Err("min_rounding_significant_digits must be at least 1".to_string());
        }

        if self.attribution.marker_window_chars == 0 {
            return Err("marker_window_chars must be greater than 0".to_string());
        }
        for institution in &self.attribution.institutions {
            if institution.spellings().any(|s| s.trim().is_empty()) {
                return Err(format!("institution '{}' has an empty spelling", institution.name));
            }
        }

        if self.structural.paywall_markers.iter().all(|m| m.trim().is_empty()) {
            return Err("at least one paywall marker is required".to_string());
        }
        for (doc_type, rules) in &self.structural.sections {
            for rule in rules {
                if let (Some(min), Some(max)) = (rule.min_items, rule.max_items) {
                    if min > max {
                        return Err(format!(
                            "section '{}' of '{}' has min_items {} above max_items {}",
                            rule.id, doc_type, min, max
                        ));
                    }
                }
            }
        }

        if self.compliance.disclosure_keywords.is_empty() {
            return Err("at least one disclosure keyword is required".to_string());
        }

        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
