use super::common::*;
use serde_json::json;
use std::sync::Arc;

use crate::workflows::contract::{
    AnalysisContext, AnalysisError, ContractAnalyzer, DepreciationBenchmark, FieldPath,
    FieldStatus, Rating, RawDocument, SourceFormat, SuppliedRecord, DISCLAIMER,
};

fn analyze(text: &str) -> crate::workflows::contract::AnalysisResult {
    analyzer().analyze(
        &RawDocument::new(text, SourceFormat::Text),
        &AnalysisContext::default(),
    )
}

#[test]
fn high_rate_lease_needs_negotiation() {
    let result = analyze(HIGH_APR_CONTRACT);

    assert_eq!(result.record.financial_terms.apr.get(), Some(18.5));
    assert_eq!(result.record.financial_terms.monthly_payment.get(), Some(650.0));
    assert_eq!(result.record.financial_terms.lease_term_months.get(), Some(36.0));
    assert_eq!(
        result.record.mileage_terms.annual_mileage_limit.get(),
        Some(8000.0)
    );
    assert_eq!(
        result.record.penalty_terms.early_termination_fee.get(),
        Some(1200.0)
    );
    assert_eq!(result.fairness.score, 50);
    assert_eq!(result.fairness.rating, Rating::NeedsNegotiation);
    assert_eq!(result.total_cost, 23_400.0);
    assert!(!result.negotiation_points.is_empty());
    assert!(result.negotiation_points.len() <= 5);
    assert_eq!(result.disclaimer, DISCLAIMER);
}

#[test]
fn text_without_terms_reports_every_clause_missing() {
    let result = analyze(UNSTRUCTURED_CONTRACT);

    for path in FieldPath::TRACKED {
        assert_eq!(result.record.status(path), FieldStatus::Absent, "{path:?}");
    }
    assert_eq!(result.missing_clauses.len(), FieldPath::TRACKED.len());
    assert_eq!(result.fairness.score, 95);
    assert_eq!(result.total_cost, 0.0);
    assert!(result.hidden_charges.is_empty());
}

#[test]
fn vin_survives_the_pipeline_unchanged() {
    let result = analyze(VIN_CONTRACT);

    assert_eq!(
        result.record.vehicle.vin.value().map(String::as_str),
        Some("1HGCM82633A004352")
    );
    assert_eq!(
        result.record.vehicle.brand.value().map(String::as_str),
        Some("Honda")
    );
}

#[test]
fn payment_without_term_costs_only_the_upfront_amount() {
    let result = analyze("Monthly Payment: $399 Due at signing: $2,500");

    assert_eq!(result.record.financial_terms.monthly_payment.get(), Some(399.0));
    assert_eq!(
        result.record.financial_terms.lease_term_months.status(),
        FieldStatus::Absent
    );
    assert_eq!(result.total_cost, 2500.0);
}

#[test]
fn ocr_noise_does_not_change_the_outcome() {
    let noisy = "Vehicle Lease Agreement\r\n\u{feff}APR:\t18.5%\nPage 1 of 2\nMonthly   Payment: $650\n\
        Term: 36 months\u{200b}\nMileage Allowance: 8000 miles per year\nPage 2 of 2\n\
        Early Termination Fee: $1200";

    let clean = analyze(HIGH_APR_CONTRACT);
    let noisy = analyze(noisy);

    assert_eq!(noisy.fairness, clean.fairness);
    assert_eq!(noisy.risk_flags, clean.risk_flags);
}

#[test]
fn supplied_values_win_over_extracted_ones() {
    let supplied = SuppliedRecord::from_json(&json!({
        "apr": "3.9%",
        "brand": "toyota",
        "red_flags": ["Balloon payment due at lease end"],
    }));
    let context = AnalysisContext {
        market_value: None,
        supplied: Some(supplied),
    };

    let result = analyzer().analyze(
        &RawDocument::new(HIGH_APR_CONTRACT, SourceFormat::Pdf),
        &context,
    );

    assert_eq!(result.record.financial_terms.apr.get(), Some(3.9));
    assert_eq!(
        result.record.vehicle.brand.value().map(String::as_str),
        Some("Toyota")
    );
    // extracted terms still fill the gaps
    assert_eq!(
        result.record.mileage_terms.annual_mileage_limit.get(),
        Some(8000.0)
    );
    // mileage -10, termination -10, one supplied red flag -4
    assert_eq!(result.fairness.score, 76);
    assert_eq!(result.source_format, SourceFormat::Pdf);
}

#[test]
fn explicit_market_value_beats_the_market_source() {
    let analyzer = analyzer().with_market_source(Arc::new(FixedMarket(10_000.0)));
    let document = RawDocument::new(HIGH_APR_CONTRACT, SourceFormat::Text);

    let from_source = analyzer.analyze(&document, &AnalysisContext::default());
    assert_eq!(from_source.market_value, Some(10_000.0));
    assert_eq!(from_source.fairness.score, 10);
    assert_eq!(from_source.fairness.rating, Rating::HighRisk);

    let explicit = analyzer.analyze(
        &document,
        &AnalysisContext {
            market_value: Some(30_000.0),
            supplied: None,
        },
    );
    assert_eq!(explicit.market_value, Some(30_000.0));
    assert_eq!(explicit.fairness.score, 50);
}

#[test]
fn depreciation_benchmark_prices_the_extracted_vehicle() {
    let analyzer =
        ContractAnalyzer::default().with_market_source(Arc::new(DepreciationBenchmark::new(2026)));

    let result = analyzer.analyze(
        &RawDocument::new("Make: BMW Year: 2026 APR: 3.5%", SourceFormat::Text),
        &AnalysisContext::default(),
    );

    assert_eq!(result.market_value, Some(35_000.0));
    assert_eq!(result.fairness.score, 100);
}

#[test]
fn non_string_text_is_rejected() {
    for payload in [json!(null), json!(42), json!({ "text": "APR: 5%" })] {
        let error = analyzer()
            .analyze_json(&payload, SourceFormat::Text, &AnalysisContext::default())
            .expect_err("non-string rejected");
        assert!(matches!(error, AnalysisError::InvalidInput { .. }));
    }
}

#[test]
fn empty_text_is_valid_input() {
    let result = analyzer()
        .analyze_json(&json!(""), SourceFormat::Image, &AnalysisContext::default())
        .expect("empty text is analyzable");

    assert_eq!(result.missing_clauses.len(), FieldPath::TRACKED.len());
    assert_eq!(result.source_format, SourceFormat::Image);
}

#[test]
fn analysis_is_deterministic() {
    let first = analyze(HIGH_APR_CONTRACT);
    let second = analyze(HIGH_APR_CONTRACT);
    assert_eq!(first, second);
}

#[test]
fn label_at_end_of_text_is_reported_as_unclear() {
    let result = analyze("Monthly Payment: $399\nDown Payment:");

    assert_eq!(
        result.record.financial_terms.down_payment.status(),
        FieldStatus::Unparsed
    );
    assert!(result
        .missing_clauses
        .contains(&"Down payment is unclear in this contract (found \"Down Payment\").".to_string()));
}
