//! Contract analysis pipeline.
//!
//! Raw OCR text is normalized, terms are extracted into a [`ContractRecord`], and the
//! record is scored and classified into an [`AnalysisResult`]. Every stage is a pure
//! function of its input apart from the optional collaborators attached to
//! [`ContractAnalyzer`], so one analyzer can be shared across threads.

mod benchmark;
mod classifier;
mod domain;
mod extraction;
mod normalizer;
mod numeric;
pub mod router;
mod scoring;
mod supplied;

#[cfg(test)]
mod tests;

pub use benchmark::{
    BenchmarkError, DepreciationBenchmark, MarketValueSource, DEFAULT_REFERENCE_YEAR,
};
pub use classifier::{
    missing_clauses, ClassifierConfig, ClassifierError, ClauseClassifier, ClauseReport,
    SentenceClassifier, SentenceLabel,
};
pub use domain::{
    AnalysisError, ContractRecord, ExtractedField, FieldGroup, FieldPath, FieldStatus,
    FinancialTerms, FlagOrigin, HiddenCharge, MileageTerms, PenaltyTerms, PurchaseOption,
    RawDocument, RiskCategory, RiskFlag, SourceFormat, VehicleDetails,
};
pub use extraction::{detect_hidden_charges, extract};
pub use normalizer::normalize;
pub use numeric::{normalize_numeric, NumericError, NumericKind, MONEY_FACTOR_TO_APR};
pub use router::contract_router;
pub use scoring::{
    total_cost, FairnessScore, FairnessScorer, PenaltyTier, Rating, ScoreCategory,
    ScoreContribution, ScoreReport, ScoringConfig, ScoringContext,
};
pub use supplied::SuppliedRecord;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const DISCLAIMER: &str = "This analysis is AI-assisted and based only on the provided contract text. It is intended for informational purposes and does not constitute legal or financial advice.";

/// Per-request inputs that do not come from the document text.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    /// Caller-provided market value; takes precedence over any attached market source.
    pub market_value: Option<f64>,
    pub supplied: Option<SuppliedRecord>,
}

/// Everything the pipeline reports for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub source_format: SourceFormat,
    pub record: ContractRecord,
    pub risk_flags: Vec<RiskFlag>,
    pub missing_clauses: Vec<String>,
    pub hidden_charges: Vec<HiddenCharge>,
    pub fairness: FairnessScore,
    pub market_value: Option<f64>,
    pub total_cost: f64,
    pub negotiation_points: Vec<String>,
    pub disclaimer: String,
}

/// Runs the full text-to-score pipeline.
#[derive(Clone, Default)]
pub struct ContractAnalyzer {
    scorer: FairnessScorer,
    classifier: ClauseClassifier,
    market_source: Option<Arc<dyn MarketValueSource>>,
}

impl ContractAnalyzer {
    pub fn new(scoring: ScoringConfig, classifier: ClassifierConfig) -> Self {
        Self {
            scorer: FairnessScorer::new(scoring),
            classifier: ClauseClassifier::new(classifier),
            market_source: None,
        }
    }

    pub fn with_sentence_classifier(mut self, model: Arc<dyn SentenceClassifier>) -> Self {
        self.classifier = self.classifier.with_sentence_classifier(model);
        self
    }

    pub fn with_market_source(mut self, source: Arc<dyn MarketValueSource>) -> Self {
        self.market_source = Some(source);
        self
    }

    /// Entry point for loosely typed callers; fails only when `text` is not a string.
    pub fn analyze_json(
        &self,
        text: &Value,
        source_format: SourceFormat,
        context: &AnalysisContext,
    ) -> Result<AnalysisResult, AnalysisError> {
        let document = RawDocument::from_json(text, source_format)?;
        Ok(self.analyze(&document, context))
    }

    pub fn analyze(&self, document: &RawDocument, context: &AnalysisContext) -> AnalysisResult {
        let text = normalize(document.text());
        let extracted = extract(&text);

        let (record, supplied_red_flags) = match &context.supplied {
            Some(supplied) => {
                log_disagreements(&supplied.record, &extracted);
                (
                    supplied.record.clone().reconcile_with(extracted),
                    supplied.red_flags.as_slice(),
                )
            }
            None => (extracted, &[][..]),
        };

        let hidden_charges = detect_hidden_charges(&text);
        let market_value = context.market_value.or_else(|| {
            self.market_source
                .as_ref()
                .and_then(|source| source.market_value(&record.vehicle))
        });

        let report = self.scorer.score_with(
            &record,
            &ScoringContext {
                market_value,
                hidden_charges: &hidden_charges,
                supplied_red_flags,
            },
        );
        let clauses = self
            .classifier
            .classify_with(&text, &record, &hidden_charges);

        info!(
            source = document.source_format().label(),
            chars = text.len(),
            score = report.fairness.score,
            rating = report.fairness.rating.label(),
            risk_flags = clauses.risk_flags.len(),
            missing_clauses = clauses.missing_clauses.len(),
            "contract analyzed"
        );

        AnalysisResult {
            source_format: document.source_format(),
            record,
            risk_flags: clauses.risk_flags,
            missing_clauses: clauses.missing_clauses,
            hidden_charges,
            fairness: report.fairness,
            market_value,
            total_cost: report.total_cost,
            negotiation_points: report.negotiation_points,
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}

impl std::fmt::Debug for ContractAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractAnalyzer")
            .field("scorer", &self.scorer)
            .field("classifier", &self.classifier)
            .field("market_source", &self.market_source.is_some())
            .finish()
    }
}

fn log_disagreements(supplied: &ContractRecord, extracted: &ContractRecord) {
    for path in FieldPath::ALL {
        let (Some(supplied_field), Some(extracted_field)) =
            (supplied.amount(path), extracted.amount(path))
        else {
            continue;
        };
        if let (Some(from_supplier), Some(from_text)) =
            (supplied_field.get(), extracted_field.get())
        {
            if (from_supplier - from_text).abs() > 0.005 {
                info!(
                    field = path.key(),
                    supplied = from_supplier,
                    extracted = from_text,
                    "supplied value disagrees with contract text, keeping supplied"
                );
            }
        }
    }
}
