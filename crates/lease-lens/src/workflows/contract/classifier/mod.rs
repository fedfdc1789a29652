mod keywords;
mod sentences;

use super::domain::{ContractRecord, FieldStatus, FlagOrigin, HiddenCharge, RiskCategory, RiskFlag};
use keywords::{categorize_sentence, evidence_flags, keyword_flags};
use sentences::split_sentences;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const RISKY_LABELS: &[&str] = &["negative", "risky", "risk"];
const MAX_MODEL_STATEMENT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum model confidence for a sentence to become a flag.
    pub sentiment_threshold: f32,
    pub max_flags: usize,
    pub min_sentence_chars: usize,
    pub high_apr: f64,
    pub high_termination_fee: f64,
    pub low_annual_mileage: f64,
    pub high_overage_charge: f64,
    pub high_late_fee: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sentiment_threshold: 0.8,
            max_flags: 5,
            min_sentence_chars: 20,
            high_apr: 6.0,
            high_termination_fee: 500.0,
            low_annual_mileage: 10_000.0,
            high_overage_charge: 0.30,
            high_late_fee: 50.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("sentence classifier unavailable: {0}")]
    Unavailable(String),
    #[error("sentence classifier failed: {0}")]
    Failed(String),
}

/// Label attached to one sentence by an external model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceLabel {
    pub label: String,
    pub score: f32,
}

/// External sentence-level sentiment or risk model.
pub trait SentenceClassifier: Send + Sync {
    /// Returns one label per input sentence, in input order.
    fn classify_sentences(
        &self,
        sentences: &[String],
    ) -> Result<Vec<SentenceLabel>, ClassifierError>;
}

/// Risk statements plus the missing/unclear clause report for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseReport {
    pub risk_flags: Vec<RiskFlag>,
    pub missing_clauses: Vec<String>,
}

/// Turns contract text and its extracted record into risk flags.
///
/// The keyword table always runs. A [`SentenceClassifier`] can be attached to add flags
/// for sentences the model marks as risky; if it fails the classifier carries on
/// without them.
#[derive(Clone, Default)]
pub struct ClauseClassifier {
    config: ClassifierConfig,
    sentence_model: Option<Arc<dyn SentenceClassifier>>,
}

impl ClauseClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            sentence_model: None,
        }
    }

    pub fn with_sentence_classifier(mut self, model: Arc<dyn SentenceClassifier>) -> Self {
        self.sentence_model = Some(model);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn classify(&self, normalized_text: &str, record: &ContractRecord) -> ClauseReport {
        self.classify_with(normalized_text, record, &[])
    }

    /// Like [`classify`](Self::classify), with hidden charges found in the same text
    /// feeding the `fee` flag.
    pub fn classify_with(
        &self,
        normalized_text: &str,
        record: &ContractRecord,
        hidden_charges: &[HiddenCharge],
    ) -> ClauseReport {
        let candidates = evidence_flags(record, hidden_charges, &self.config)
            .into_iter()
            .chain(keyword_flags(normalized_text))
            .chain(self.model_flags(normalized_text));

        ClauseReport {
            risk_flags: rank_flags(candidates, self.config.max_flags),
            missing_clauses: missing_clauses(record),
        }
    }

    fn model_flags(&self, normalized_text: &str) -> Vec<RiskFlag> {
        let Some(model) = &self.sentence_model else {
            return Vec::new();
        };

        let sentences = split_sentences(normalized_text, self.config.min_sentence_chars);
        if sentences.is_empty() {
            return Vec::new();
        }

        let labels = match model.classify_sentences(&sentences) {
            Ok(labels) => labels,
            Err(err) => {
                warn!(error = %err, "sentence classifier unavailable, using keyword flags only");
                return Vec::new();
            }
        };
        if labels.len() != sentences.len() {
            warn!(
                sentences = sentences.len(),
                labels = labels.len(),
                "sentence classifier returned a mismatched label count"
            );
        }

        sentences
            .iter()
            .zip(labels)
            .filter(|(_, label)| {
                label.score > self.config.sentiment_threshold
                    && RISKY_LABELS
                        .iter()
                        .any(|risky| label.label.eq_ignore_ascii_case(risky))
            })
            .map(|(sentence, _)| {
                let statement: String =
                    sentence.chars().take(MAX_MODEL_STATEMENT_CHARS).collect();
                RiskFlag::new(categorize_sentence(sentence), statement, FlagOrigin::Model)
            })
            .collect()
    }
}

impl std::fmt::Debug for ClauseClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClauseClassifier")
            .field("config", &self.config)
            .field("sentence_model", &self.sentence_model.is_some())
            .finish()
    }
}

/// Keeps the first flag per category and per statement, in candidate order, up to `cap`.
fn rank_flags(candidates: impl IntoIterator<Item = RiskFlag>, cap: usize) -> Vec<RiskFlag> {
    let mut categories: HashSet<RiskCategory> = HashSet::new();
    let mut statements: HashSet<String> = HashSet::new();
    let mut flags = Vec::new();

    for flag in candidates {
        if flags.len() >= cap {
            break;
        }
        if categories.contains(&flag.category) {
            debug!(category = flag.category.label(), "duplicate risk category dropped");
            continue;
        }
        if !statements.insert(flag.normalized_statement()) {
            continue;
        }
        categories.insert(flag.category);
        flags.push(flag);
    }
    flags
}

/// One statement per absent or unparsed tracked leaf, in schema order.
pub fn missing_clauses(record: &ContractRecord) -> Vec<String> {
    record
        .clause_gaps()
        .into_iter()
        .map(|(path, status)| match (status, record.raw(path)) {
            (FieldStatus::Unparsed, Some(raw)) => format!(
                "{} is unclear in this contract (found \"{raw}\").",
                path.label()
            ),
            (FieldStatus::Unparsed, None) => {
                format!("{} is unclear in this contract.", path.label())
            }
            _ => format!("{} is not specified in this contract.", path.label()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::contract::domain::{ExtractedField, FieldPath};

    #[test]
    fn rank_flags_keeps_one_flag_per_category() {
        let flags = rank_flags(
            vec![
                RiskFlag::new(
                    RiskCategory::Termination,
                    "High early termination fee: $1200.",
                    FlagOrigin::Evidence,
                ),
                RiskFlag::new(
                    RiskCategory::Termination,
                    "Early termination may involve financial penalties.",
                    FlagOrigin::Keyword,
                ),
                RiskFlag::new(
                    RiskCategory::Insurance,
                    "Insurance responsibility is not clearly stated.",
                    FlagOrigin::Keyword,
                ),
            ],
            5,
        );
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[0].origin, FlagOrigin::Evidence);
    }

    #[test]
    fn repeated_statement_does_not_use_up_its_category() {
        let flags = rank_flags(
            vec![
                RiskFlag::new(
                    RiskCategory::General,
                    "The lessee waives all claims.",
                    FlagOrigin::Keyword,
                ),
                RiskFlag::new(
                    RiskCategory::Warranty,
                    "the lessee waives all claims",
                    FlagOrigin::Model,
                ),
                RiskFlag::new(
                    RiskCategory::Warranty,
                    "Vehicle is sold as is without warranty.",
                    FlagOrigin::Model,
                ),
            ],
            5,
        );
        let categories: Vec<RiskCategory> = flags.iter().map(|flag| flag.category).collect();
        assert_eq!(categories, vec![RiskCategory::General, RiskCategory::Warranty]);
        assert_eq!(flags[1].statement, "Vehicle is sold as is without warranty.");
    }

    #[test]
    fn rank_flags_respects_the_cap() {
        let candidates = [
            RiskCategory::Interest,
            RiskCategory::Termination,
            RiskCategory::Mileage,
            RiskCategory::Fee,
            RiskCategory::Insurance,
            RiskCategory::Warranty,
        ]
        .into_iter()
        .map(|category| RiskFlag::new(category, category.label(), FlagOrigin::Keyword));
        assert_eq!(rank_flags(candidates, 5).len(), 5);
    }

    #[test]
    fn unparsed_leaves_are_reported_as_unclear() {
        let mut record = ContractRecord::default();
        record.financial_terms.apr = ExtractedField::unparsed("see schedule");
        record.financial_terms.monthly_payment = ExtractedField::present(400.0, "$400");

        let clauses = missing_clauses(&record);
        assert_eq!(clauses.len(), FieldPath::TRACKED.len() - 1);
        assert_eq!(
            clauses[0],
            "Annual percentage rate is unclear in this contract (found \"see schedule\")."
        );
        assert_eq!(clauses[1], "Down payment is not specified in this contract.");
    }
}
