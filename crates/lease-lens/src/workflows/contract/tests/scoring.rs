use super::common::*;
use proptest::prelude::*;

use crate::workflows::contract::{
    total_cost, ContractRecord, ExtractedField, FairnessScorer, HiddenCharge, Rating,
    ScoreCategory, ScoringConfig, ScoringContext,
};

fn scorer() -> FairnessScorer {
    FairnessScorer::new(ScoringConfig::canonical())
}

#[test]
fn penalties_add_up_for_a_high_rate_lease() {
    let record = scored_record(Some(18.5), Some(8000.0), Some(1200.0));

    let fairness = scorer().score(&record, None);

    assert_eq!(fairness.score, 50);
    assert_eq!(fairness.rating, Rating::NeedsNegotiation);
    let deltas: Vec<(ScoreCategory, i16)> = fairness
        .contributions
        .iter()
        .map(|contribution| (contribution.category, contribution.delta))
        .collect();
    assert_eq!(
        deltas,
        vec![
            (ScoreCategory::Apr, -30),
            (ScoreCategory::Mileage, -10),
            (ScoreCategory::Termination, -10),
        ]
    );
}

#[test]
fn missing_apr_costs_five_points() {
    let fairness = scorer().score(&ContractRecord::default(), None);

    assert_eq!(fairness.score, 95);
    assert_eq!(fairness.rating, Rating::Excellent);
    assert_eq!(fairness.contributions.len(), 1);
    assert_eq!(fairness.contributions[0].delta, -5);
}

#[test]
fn unreadable_apr_is_treated_as_missing() {
    let mut record = ContractRecord::default();
    record.financial_terms.apr = ExtractedField::unparsed("see rate sheet");

    let fairness = scorer().score(&record, None);

    assert_eq!(fairness.score, 95);
    assert!(fairness.contributions[0].reason.contains("see rate sheet"));
}

#[test]
fn apr_thresholds_are_exclusive() {
    let at_limit = scorer().score(&scored_record(Some(6.0), None, None), None);
    assert_eq!(at_limit.score, 100);

    let just_above = scorer().score(&scored_record(Some(6.01), None, None), None);
    assert_eq!(just_above.score, 90);

    let mid = scorer().score(&scored_record(Some(8.0), None, None), None);
    assert_eq!(mid.score, 90);

    let steep = scorer().score(&scored_record(Some(9.0), None, None), None);
    assert_eq!(steep.score, 80);
}

#[test]
fn market_ratio_uses_the_steepest_matching_tier() {
    let mut record = scored_record(Some(4.0), None, None);
    lease_cost(&mut record, 500.0, 36.0, 2000.0);

    let report = scorer().score_with(
        &record,
        &ScoringContext {
            market_value: Some(8000.0),
            ..ScoringContext::default()
        },
    );

    assert_eq!(report.total_cost, 20_000.0);
    assert_eq!(report.market_ratio, Some(2.5));
    assert_eq!(report.fairness.score, 60);
    assert_eq!(report.fairness.rating, Rating::Good);
}

#[test]
fn unusable_market_values_are_ignored() {
    let mut record = scored_record(Some(4.0), None, None);
    lease_cost(&mut record, 500.0, 36.0, 2000.0);

    for market_value in [0.0, -100.0, f64::NAN] {
        let report = scorer().score_with(
            &record,
            &ScoringContext {
                market_value: Some(market_value),
                ..ScoringContext::default()
            },
        );
        assert_eq!(report.market_ratio, None);
        assert_eq!(report.fairness.score, 100);
    }
}

#[test]
fn red_flags_are_weighted_and_capped() {
    let record = scored_record(Some(4.0), None, None);
    let charges = vec![HiddenCharge {
        name: "Acquisition fee".to_string(),
        amount: Some(895.0),
    }];
    let supplied = vec!["Balloon payment at end".to_string(), "   ".to_string()];

    let report = scorer().score_with(
        &record,
        &ScoringContext {
            market_value: None,
            hidden_charges: &charges,
            supplied_red_flags: &supplied,
        },
    );
    assert_eq!(report.fairness.score, 92);

    let many: Vec<String> = (0..30).map(|n| format!("flag {n}")).collect();
    let capped = scorer().score_with(
        &record,
        &ScoringContext {
            supplied_red_flags: &many,
            ..ScoringContext::default()
        },
    );
    assert_eq!(capped.fairness.score, 55);
}

#[test]
fn total_cost_counts_missing_term_as_zero() {
    let mut record = ContractRecord::default();
    record.financial_terms.monthly_payment = ExtractedField::present(450.0, "$450");
    assert_eq!(total_cost(&record), 0.0);

    record.financial_terms.total_upfront = ExtractedField::present(3000.0, "$3,000");
    assert_eq!(total_cost(&record), 3000.0);
}

#[test]
fn score_never_drops_below_zero() {
    let mut record = scored_record(Some(25.0), Some(5000.0), Some(5000.0));
    lease_cost(&mut record, 900.0, 48.0, 5000.0);
    let many: Vec<String> = (0..20).map(|n| format!("flag {n}")).collect();

    let report = scorer().score_with(
        &record,
        &ScoringContext {
            market_value: Some(10_000.0),
            hidden_charges: &[],
            supplied_red_flags: &many,
        },
    );

    assert_eq!(report.fairness.score, 0);
    assert_eq!(report.fairness.rating, Rating::HighRisk);
    assert!(report.negotiation_points.len() <= 5);
}

proptest! {
    #[test]
    fn score_stays_within_bounds(
        apr in proptest::option::of(0.0f64..40.0),
        miles in proptest::option::of(0.0f64..30_000.0),
        fee in proptest::option::of(0.0f64..5_000.0),
        market in proptest::option::of(-1_000.0f64..80_000.0),
        flags in 0usize..20,
    ) {
        let mut record = scored_record(apr, miles, fee);
        lease_cost(&mut record, 450.0, 36.0, 2500.0);
        let supplied: Vec<String> = (0..flags).map(|n| format!("flag {n}")).collect();

        let report = scorer().score_with(
            &record,
            &ScoringContext {
                market_value: market,
                hidden_charges: &[],
                supplied_red_flags: &supplied,
            },
        );

        prop_assert!(report.fairness.score <= 100);
        prop_assert_eq!(report.fairness.rating, Rating::from_score(report.fairness.score));
        let deductions: i32 = report
            .fairness
            .contributions
            .iter()
            .map(|contribution| i32::from(contribution.delta))
            .sum();
        prop_assert_eq!(i32::from(report.fairness.score), (100 + deductions).max(0));
    }

    #[test]
    fn raising_apr_never_raises_the_score(
        low in 0.0f64..30.0,
        bump in 0.0f64..10.0,
        miles in proptest::option::of(0.0f64..30_000.0),
    ) {
        let cheaper = scorer().score(&scored_record(Some(low), miles, None), None);
        let dearer = scorer().score(&scored_record(Some(low + bump), miles, None), None);
        prop_assert!(dearer.score <= cheaper.score);
    }
}
