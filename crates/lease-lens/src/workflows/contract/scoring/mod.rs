mod config;
mod policy;
mod rules;

pub use config::{PenaltyTier, ScoringConfig};
pub use policy::Rating;
pub use rules::total_cost;

use super::domain::{ContractRecord, HiddenCharge};
use policy::negotiation_points;
use serde::{Deserialize, Serialize};

/// Rubric line a deduction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Apr,
    MarketPrice,
    Mileage,
    Termination,
    RedFlags,
}

/// Discrete deduction applied to the score, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreContribution {
    pub category: ScoreCategory,
    pub delta: i16,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairnessScore {
    pub score: u8,
    pub rating: Rating,
    pub contributions: Vec<ScoreContribution>,
}

/// Auxiliary inputs that are not contract facts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext<'a> {
    pub market_value: Option<f64>,
    pub hidden_charges: &'a [HiddenCharge],
    pub supplied_red_flags: &'a [String],
}

/// Score plus the figures derived on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub fairness: FairnessScore,
    pub total_cost: f64,
    pub market_ratio: Option<f64>,
    pub negotiation_points: Vec<String>,
}

/// Stateless scorer that applies the rubric to a record.
#[derive(Debug, Clone, Default)]
pub struct FairnessScorer {
    config: ScoringConfig,
}

impl FairnessScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores the contract terms alone, optionally against a market value.
    pub fn score(&self, record: &ContractRecord, market_value: Option<f64>) -> FairnessScore {
        self.score_with(
            record,
            &ScoringContext {
                market_value,
                ..ScoringContext::default()
            },
        )
        .fairness
    }

    pub fn score_with(&self, record: &ContractRecord, context: &ScoringContext<'_>) -> ScoreReport {
        let (contributions, total_delta, signals) =
            rules::score_record(record, context, &self.config);

        let score = (100 + i32::from(total_delta)).clamp(0, 100) as u8;
        let negotiation_points = negotiation_points(
            &signals,
            context.hidden_charges,
            self.config.termination_fee_limit,
        );

        ScoreReport {
            fairness: FairnessScore {
                score,
                rating: Rating::from_score(score),
                contributions,
            },
            total_cost: signals.total_cost,
            market_ratio: signals.market_ratio,
            negotiation_points,
        }
    }
}
