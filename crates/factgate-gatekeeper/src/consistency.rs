//! Intra-document consistency of prices and daily changes

use crate::config::ConsistencyConfig;
use crate::gate::Gate;
use crate::text::{contains_term, is_bounded, sentence_bounds, uppercase_tokens};
use crate::GatekeeperError;
use factgate_domain::{Document, FactLookup, GateName, GateOutcome, NumberKind, Violation, ViolationKind};
use factgate_extractor::{strip_markup, ExtractorConfig, NumberExtractor};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// A per-entity field the article states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    /// Last price
    Price,
    /// Daily change in percent
    ChangePct,
}

impl Field {
    /// Field name as reported
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Price => "price",
            Field::ChangePct => "change_pct",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One value the article states for an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Entity symbol
    pub entity: String,
    /// Which field
    pub field: Field,
    /// Value with direction applied
    pub value: f64,
    /// Text as written
    pub raw: String,
    /// Where it was written
    pub location: String,
    half_step: f64,
}

impl Statement {
    /// Whether two statements can describe the same underlying value
    ///
    /// `0.39%` and `0.4%` agree: each is the other at coarser display precision.
    fn agrees_with(&self, other: &Statement) -> bool {
        let diff = (self.value - other.value).abs();
        diff <= self.half_step.max(other.half_step) * (1.0 + 1e-9) + 1e-12
    }
}

/// Flags entities whose price or change is stated with conflicting values
pub struct ConsistencyGate {
    extractor: NumberExtractor,
    config: ConsistencyConfig,
}

impl ConsistencyGate {
    /// Create a new consistency gate
    pub fn new(extraction: ExtractorConfig, config: ConsistencyConfig) -> Result<Self, GatekeeperError> {
        Ok(Self {
            extractor: NumberExtractor::new(extraction)?,
            config,
        })
    }

    /// Every price and change statement in the document, in text order
    pub fn statements(&self, document: &Document) -> Vec<Statement> {
        let mut statements = Vec::new();
        for segment in document.text_segments() {
            let text = strip_markup(segment.text);
            let mentions = self.entity_mentions(&text, &document.entities);
            for (i, (offset, entity)) in mentions.iter().enumerate() {
                let token_end = offset + entity.len();
                let sentence_end = sentence_bounds(&text, *offset).end;
                let scope_end = mentions
                    .get(i + 1)
                    .map_or(sentence_end, |(next, _)| (*next).min(sentence_end));
                if scope_end <= token_end {
                    continue;
                }
                self.read_scope(&text[token_end..scope_end], entity, &segment.location, &mut statements);
            }
        }
        statements
    }

    fn entity_mentions(&self, text: &str, declared: &[String]) -> Vec<(usize, String)> {
        let mut mentions: Vec<(usize, String)> = if declared.is_empty() {
            uppercase_tokens(text)
                .into_iter()
                .filter(|(_, token)| !self.config.entity_stopwords.iter().any(|s| s.eq_ignore_ascii_case(token)))
                .map(|(offset, token)| (offset, token.to_string()))
                .collect()
        } else {
            declared
                .iter()
                .map(|e| e.trim())
                .filter(|e| !e.is_empty())
                .flat_map(|entity| {
                    text.match_indices(entity)
                        .filter(|(i, m)| is_bounded(text, &(*i..*i + m.len())))
                        .map(|(i, _)| (i, entity.to_string()))
                        .collect::<Vec<_>>()
                })
                .collect()
        };
        mentions.sort();
        mentions
    }

    /// First price and first change between an entity and the end of its scope
    fn read_scope(&self, scope: &str, entity: &str, location: &str, out: &mut Vec<Statement>) {
        let mut price_seen = false;
        let mut change_seen = false;
        let mut label_start = 0;

        for number in self.extractor.scan(scope, location) {
            let label = &scope[label_start..number.span.start];
            label_start = number.span.end;
            if number.is_safe() || self.config.metric_labels.iter().any(|m| contains_term(label, m)) {
                continue;
            }

            let field = match number.kind {
                NumberKind::Decimal | NumberKind::Price if !price_seen && number.scale == 1.0 => Field::Price,
                NumberKind::Percentage if !change_seen => Field::ChangePct,
                _ => continue,
            };
            let value = if field == Field::ChangePct
                && !number.explicit_sign
                && self.config.negative_words.iter().any(|w| contains_term(label, w))
            {
                -number.value
            } else {
                number.value
            };

            match field {
                Field::Price => price_seen = true,
                Field::ChangePct => change_seen = true,
            }
            out.push(Statement {
                entity: entity.to_string(),
                field,
                value,
                half_step: number.half_display_step(),
                raw: number.raw,
                location: location.to_string(),
            });
            if price_seen && change_seen {
                break;
            }
        }
    }
}

impl Gate for ConsistencyGate {
    fn name(&self) -> GateName {
        GateName::Consistency
    }

    fn check(&self, document: &Document, _facts: &dyn FactLookup) -> Result<GateOutcome, GatekeeperError> {
        let statements = self.statements(document);

        let mut grouped: BTreeMap<(&str, Field), Vec<&Statement>> = BTreeMap::new();
        for statement in &statements {
            grouped
                .entry((statement.entity.as_str(), statement.field))
                .or_default()
                .push(statement);
        }

        let mut violations = Vec::new();
        for ((entity, field), group) in &grouped {
            let Some(conflict) = group
                .iter()
                .find(|s| group.iter().any(|other| !s.agrees_with(other)))
            else {
                continue;
            };
            let mut values: Vec<&str> = Vec::new();
            for statement in group {
                if !values.contains(&statement.raw.as_str()) {
                    values.push(&statement.raw);
                }
            }
            violations.push(
                Violation::new(
                    GateName::Consistency,
                    ViolationKind::Consistency,
                    format!("{} {} stated with conflicting values: {}", entity, field, values.join(", ")),
                )
                .at(conflict.location.clone()),
            );
        }

        let entities = grouped.keys().map(|(entity, _)| *entity).collect::<BTreeSet<_>>();
        debug!(
            document = %document.id,
            entities = entities.len(),
            statements = statements.len(),
            conflicts = violations.len(),
            "Checked consistency"
        );

        let conflicts = violations.len() as u64;
        Ok(GateOutcome::new(GateName::Consistency, violations)
            .with_stat("entities", entities.len() as u64)
            .with_stat("statements", statements.len() as u64)
            .with_stat("conflicts", conflicts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgate_store::FactStore;

    fn gate() -> ConsistencyGate {
        ConsistencyGate::new(ExtractorConfig::default(), ConsistencyConfig::default()).unwrap()
    }

    fn document(markup: &str, entities: &[&str]) -> Document {
        Document {
            markup: markup.to_string(),
            entities: entities.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    fn facts() -> FactStore {
        FactStore::from_json_str(r#"{"NVDA": {"price": 188.12}}"#).unwrap()
    }

    #[test]
    fn test_reads_price_and_direction() {
        let statements = gate().statements(&document("NVDA 股價 188.12，下跌 0.39%", &["NVDA"]));
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].field, Field::Price);
        assert_eq!(statements[0].value, 188.12);
        assert_eq!(statements[1].field, Field::ChangePct);
        assert_eq!(statements[1].value, -0.39);
    }

    #[test]
    fn test_conflicting_prices() {
        let doc = document("<p>NVDA 收盤 $188.12。</p><p>NVDA 盤中來到 $190.00。</p>", &["NVDA"]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.violations.len(), 1);
        let description = outcome.violations[0].description();
        assert!(description.starts_with("NVDA price"));
        assert!(description.contains("$188.12"));
        assert!(description.contains("$190.00"));
    }

    #[test]
    fn test_sign_conflict_on_change() {
        let doc = document("AMD 上漲 1.25%。稍後 AMD 下跌 1.25%。", &[]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].description().starts_with("AMD change_pct"));
    }

    #[test]
    fn test_coarser_precision_agrees() {
        let doc = document("NVDA 下跌 0.39%。NVDA 今日 -0.4%，股價 188.1", &["NVDA"]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
    }

    #[test]
    fn test_scope_stops_at_next_entity() {
        let doc = document("NVDA 與 AMD 分別收在 188.12 與 214.35", &[]);
        let statements = gate().statements(&doc);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].entity, "AMD");
    }

    #[test]
    fn test_metric_labels_are_not_prices() {
        let doc = document("NVDA 本益比 52.31，股價 188.12。NVDA 目標價 $250.00", &["NVDA"]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["statements"], 1);
    }

    #[test]
    fn test_scaled_decimal_is_not_a_price() {
        let doc = document("NVDA 收盤 188.12。NVDA 成交量 2.35億股。", &["NVDA"]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
        assert_eq!(outcome.stats["statements"], 1);

        // unlabeled, so only the magnitude keeps it out
        let statements = gate().statements(&document("NVDA 2.35億", &["NVDA"]));
        assert!(statements.is_empty());
    }

    #[test]
    fn test_range_labels_are_not_prices() {
        let doc = document(
            "NVDA 收盤 188.12。NVDA 52 週高點 212.19。NVDA 盤中低點 185.50。NVDA hit a high of 195.00",
            &["NVDA"],
        );
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(outcome.passed, "{:?}", outcome.violations);
    }

    #[test]
    fn test_stopwords_are_not_entities() {
        let doc = document("ETF 淨值 52.31。ETF 淨值 53.00。", &[]);
        let outcome = gate().check(&doc, &facts()).unwrap();
        assert!(outcome.passed);
        assert_eq!(outcome.stats["entities"], 0);
    }
}
