use super::super::domain::{ContractRecord, ExtractedField};
use super::config::{tier_for, ScoringConfig};
use super::{ScoreCategory, ScoreContribution, ScoringContext};
use tracing::warn;

/// Facts gathered while scoring, reused for the negotiation points.
pub(crate) struct ScoreSignals {
    pub apr: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub annual_mileage: Option<f64>,
    pub termination_fee: Option<f64>,
    pub total_cost: f64,
    pub market_ratio: Option<f64>,
    pub red_flag_count: usize,
}

/// `monthly_payment × lease_term_months + total_upfront`, missing terms counted as zero.
pub fn total_cost(record: &ContractRecord) -> f64 {
    let terms = &record.financial_terms;
    let monthly = terms.monthly_payment.get().unwrap_or(0.0);
    let months = terms.lease_term_months.get().unwrap_or(0.0);
    let upfront = terms.total_upfront.get().unwrap_or(0.0);
    monthly * months + upfront
}

pub(crate) fn score_record(
    record: &ContractRecord,
    context: &ScoringContext<'_>,
    config: &ScoringConfig,
) -> (Vec<ScoreContribution>, i16, ScoreSignals) {
    let mut contributions = Vec::new();
    let mut total_delta: i16 = 0;
    let mut deduct = |category: ScoreCategory, penalty: u8, reason: String| {
        let delta = -i16::from(penalty);
        contributions.push(ScoreContribution {
            category,
            delta,
            reason,
        });
        total_delta += delta;
    };

    let apr = record.financial_terms.apr.get();
    match apr {
        Some(apr) => {
            if let Some(tier) = tier_for(&config.apr_tiers, apr) {
                deduct(
                    ScoreCategory::Apr,
                    tier.penalty,
                    format!("APR {apr:.2}% is above {:.0}%", tier.above),
                );
            }
        }
        None => {
            let reason = match &record.financial_terms.apr {
                ExtractedField::Unparsed { raw } => format!("APR could not be read from \"{raw}\""),
                _ => "APR is not stated".to_string(),
            };
            deduct(ScoreCategory::Apr, config.apr_missing_penalty, reason);
        }
    }

    let cost = total_cost(record);
    let market_ratio = match context.market_value {
        Some(market) if market.is_finite() && market > 0.0 => Some(cost / market),
        Some(market) => {
            warn!(market_value = market, "ignoring unusable market value");
            None
        }
        None => None,
    };
    if let Some(ratio) = market_ratio {
        if let Some(tier) = tier_for(&config.market_tiers, ratio) {
            deduct(
                ScoreCategory::MarketPrice,
                tier.penalty,
                format!(
                    "total cost {cost:.2} is {ratio:.2}x the market value, above {:.1}x",
                    tier.above
                ),
            );
        }
    }

    let annual_mileage = record.mileage_terms.annual_mileage_limit.get();
    if let Some(miles) = annual_mileage {
        if miles < config.minimum_annual_mileage {
            deduct(
                ScoreCategory::Mileage,
                config.low_mileage_penalty,
                format!(
                    "annual mileage limit {miles:.0} is below {:.0}",
                    config.minimum_annual_mileage
                ),
            );
        }
    }

    let termination_fee = record.penalty_terms.early_termination_fee.get();
    if let Some(fee) = termination_fee {
        if fee > config.termination_fee_limit {
            deduct(
                ScoreCategory::Termination,
                config.termination_fee_penalty,
                format!(
                    "early termination fee {fee:.2} exceeds {:.0}",
                    config.termination_fee_limit
                ),
            );
        }
    }

    let red_flag_count = context.hidden_charges.len()
        + context
            .supplied_red_flags
            .iter()
            .filter(|flag| !flag.trim().is_empty())
            .count();
    if red_flag_count > 0 {
        let weighted = red_flag_count.saturating_mul(usize::from(config.red_flag_weight));
        let penalty = weighted.min(usize::from(config.red_flag_cap)) as u8;
        deduct(
            ScoreCategory::RedFlags,
            penalty,
            format!("{red_flag_count} hidden charge(s) or red flag(s)"),
        );
    }

    let signals = ScoreSignals {
        apr,
        monthly_payment: record.financial_terms.monthly_payment.get(),
        annual_mileage,
        termination_fee,
        total_cost: cost,
        market_ratio,
        red_flag_count,
    };

    (contributions, total_delta, signals)
}
