use super::common::*;
use proptest::prelude::*;
use std::sync::Arc;

use crate::workflows::contract::{
    extract, missing_clauses, normalize, AnalysisContext, ClassifierConfig, ClauseClassifier,
    ContractAnalyzer, ContractRecord, ExtractedField, FieldPath, FlagOrigin, RawDocument,
    RiskCategory, ScoringConfig, SourceFormat,
};

const WAIVER_CLAUSE: &str = "The lessee waives all claims against the dealer for hidden defects. \
    Insurance is arranged by the lessee.";

#[test]
fn evidence_flags_quote_the_extracted_terms() {
    let text = normalize(HIGH_APR_CONTRACT);
    let record = extract(&text);

    let report = ClauseClassifier::default().classify(&text, &record);

    let categories: Vec<RiskCategory> =
        report.risk_flags.iter().map(|flag| flag.category).collect();
    assert_eq!(
        categories,
        vec![
            RiskCategory::Interest,
            RiskCategory::Termination,
            RiskCategory::Mileage,
            RiskCategory::Insurance,
        ]
    );
    assert_eq!(report.risk_flags[0].statement, "High interest rate: 18.5%.");
    assert!(report.risk_flags[..3]
        .iter()
        .all(|flag| flag.origin == FlagOrigin::Evidence));
    assert_eq!(report.risk_flags[3].origin, FlagOrigin::Keyword);
}

#[test]
fn confident_model_labels_add_flags() {
    let model = Arc::new(UniformLabels::new("NEGATIVE", 0.95));
    let classifier = ClauseClassifier::default().with_sentence_classifier(model.clone());
    let text = normalize(WAIVER_CLAUSE);

    let report = classifier.classify(&text, &extract(&text));

    assert_eq!(model.seen().len(), 2);
    let model_flags: Vec<_> = report
        .risk_flags
        .iter()
        .filter(|flag| flag.origin == FlagOrigin::Model)
        .collect();
    assert_eq!(model_flags.len(), 2);
    assert_eq!(model_flags[0].category, RiskCategory::General);
    assert_eq!(
        model_flags[0].statement,
        "The lessee waives all claims against the dealer for hidden defects."
    );
    assert_eq!(model_flags[1].category, RiskCategory::Insurance);
}

#[test]
fn labels_at_the_threshold_are_ignored() {
    let classifier = ClauseClassifier::default()
        .with_sentence_classifier(Arc::new(UniformLabels::new("negative", 0.8)));
    let text = normalize(WAIVER_CLAUSE);

    let report = classifier.classify(&text, &extract(&text));

    assert!(report
        .risk_flags
        .iter()
        .all(|flag| flag.origin != FlagOrigin::Model));
}

#[test]
fn positive_labels_are_ignored() {
    let classifier = ClauseClassifier::default()
        .with_sentence_classifier(Arc::new(UniformLabels::new("POSITIVE", 0.99)));
    let text = normalize(WAIVER_CLAUSE);

    let report = classifier.classify(&text, &extract(&text));

    assert!(report.risk_flags.is_empty());
}

#[test]
fn unavailable_model_falls_back_to_keyword_flags() {
    let text = normalize(HIGH_APR_CONTRACT);
    let record = extract(&text);

    let with_model = ClauseClassifier::default()
        .with_sentence_classifier(Arc::new(UnavailableModel))
        .classify(&text, &record);
    let without_model = ClauseClassifier::default().classify(&text, &record);

    assert_eq!(with_model, without_model);
}

#[test]
fn flag_count_follows_configuration() {
    let analyzer = ContractAnalyzer::new(
        ScoringConfig::canonical(),
        ClassifierConfig {
            max_flags: 2,
            ..ClassifierConfig::default()
        },
    );
    let document = RawDocument::new(HIGH_APR_CONTRACT, SourceFormat::Pdf);

    let result = analyzer.analyze(&document, &AnalysisContext::default());

    assert_eq!(result.risk_flags.len(), 2);
    assert_eq!(result.fairness.score, 50);
}

#[test]
fn hidden_charges_surface_as_a_fee_flag() {
    let document = RawDocument::new(
        "Acquisition fee: $895. Disposition fee: $395. Insurance required.",
        SourceFormat::Text,
    );

    let result = analyzer().analyze(&document, &AnalysisContext::default());

    let fee_flag = result
        .risk_flags
        .iter()
        .find(|flag| flag.category == RiskCategory::Fee)
        .expect("fee flag");
    assert_eq!(
        fee_flag.statement,
        "Additional fees found: Acquisition fee, Disposition fee."
    );
}

fn record_with_states(states: &[u8]) -> ContractRecord {
    let mut record = ContractRecord::default();
    let slots = [
        &mut record.financial_terms.apr,
        &mut record.financial_terms.monthly_payment,
        &mut record.financial_terms.down_payment,
        &mut record.financial_terms.lease_term_months,
        &mut record.financial_terms.residual_value,
        &mut record.financial_terms.total_upfront,
        &mut record.mileage_terms.annual_mileage_limit,
        &mut record.mileage_terms.overage_charge_per_mile,
        &mut record.penalty_terms.late_payment_fee,
        &mut record.penalty_terms.early_termination_fee,
    ];
    for (slot, state) in slots.into_iter().zip(states) {
        *slot = match *state {
            0 => ExtractedField::Absent,
            1 => ExtractedField::unparsed("illegible"),
            _ => ExtractedField::present(1.0, "1"),
        };
    }
    record
}

proptest! {
    #[test]
    fn every_gap_in_the_record_is_reported_once(
        states in proptest::collection::vec(0u8..3, FieldPath::TRACKED.len()),
    ) {
        let record = record_with_states(&states);
        let clauses = missing_clauses(&record);

        let gaps = states.iter().filter(|state| **state < 2).count();
        prop_assert_eq!(clauses.len(), gaps);
        let unclear = clauses.iter().filter(|clause| clause.contains("is unclear")).count();
        prop_assert_eq!(unclear, states.iter().filter(|state| **state == 1).count());
    }
}
