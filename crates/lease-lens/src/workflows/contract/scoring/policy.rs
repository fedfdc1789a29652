use super::super::domain::HiddenCharge;
use super::rules::ScoreSignals;
use serde::{Deserialize, Serialize};

pub(crate) const MAX_NEGOTIATION_POINTS: usize = 5;
const COMFORTABLE_ANNUAL_MILEAGE: f64 = 12_000.0;

/// Four-tier reading of the fairness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    Good,
    NeedsNegotiation,
    HighRisk,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Rating::Excellent,
            60..=79 => Rating::Good,
            40..=59 => Rating::NeedsNegotiation,
            _ => Rating::HighRisk,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::NeedsNegotiation => "Needs Negotiation",
            Rating::HighRisk => "High Risk / Predatory",
        }
    }
}

pub(crate) fn negotiation_points(
    signals: &ScoreSignals,
    hidden_charges: &[HiddenCharge],
    termination_fee_limit: f64,
) -> Vec<String> {
    let mut points = Vec::new();

    match signals.apr {
        Some(apr) if apr > 6.0 => points.push(format!(
            "Negotiate the interest rate down from {apr:.2}% to around 4-5%."
        )),
        Some(apr) if apr > 4.5 => points.push(format!(
            "Try to lower the interest rate from {apr:.2}% by 0.5-1%."
        )),
        Some(_) => {}
        None => {
            points.push("Ask the dealer to state the APR or money factor in writing.".to_string())
        }
    }

    if let Some(miles) = signals.annual_mileage {
        if miles < COMFORTABLE_ANNUAL_MILEAGE {
            points.push(format!(
                "Request a higher mileage allowance (currently {miles:.0} miles per year)."
            ));
        }
    }

    if let Some(fee) = signals.termination_fee {
        if fee > termination_fee_limit {
            points.push(format!("Ask to reduce the early termination fee of {fee:.2}."));
        }
    }

    if let Some(ratio) = signals.market_ratio {
        if ratio > 1.2 {
            points.push(format!(
                "Total cost of {:.2} is {ratio:.1}x the vehicle's market value; ask for a lower capitalized cost.",
                signals.total_cost
            ));
        }
    }

    let flagged_terms = signals.red_flag_count.saturating_sub(hidden_charges.len());
    if flagged_terms > 0 {
        points.push(format!(
            "Get written clarification of {flagged_terms} flagged term(s) before signing."
        ));
    }

    if let Some(monthly) = signals.monthly_payment {
        points.push(format!(
            "Compare the monthly payment of {monthly:.2} with market averages for this vehicle."
        ));
    }

    if hidden_charges.is_empty() {
        points.push("Review all fees and ask for an itemized breakdown.".to_string());
    } else {
        let names: Vec<&str> = hidden_charges
            .iter()
            .map(|charge| charge.name.as_str())
            .collect();
        points.push(format!("Ask to waive or reduce add-on fees: {}.", names.join(", ")));
    }

    points.truncate(MAX_NEGOTIATION_POINTS);
    points
}
