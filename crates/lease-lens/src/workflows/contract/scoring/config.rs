use serde::{Deserialize, Serialize};

/// One step of a tiered deduction: values strictly above `above` lose `penalty` points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTier {
    pub above: f64,
    pub penalty: u8,
}

/// Thresholds and weights of the fairness rubric.
///
/// Tier lists are ordered from the highest threshold down; the first tier exceeded applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub apr_tiers: Vec<PenaltyTier>,
    pub apr_missing_penalty: u8,
    /// Ratio of total cost to market value.
    pub market_tiers: Vec<PenaltyTier>,
    pub minimum_annual_mileage: f64,
    pub low_mileage_penalty: u8,
    pub termination_fee_limit: f64,
    pub termination_fee_penalty: u8,
    pub red_flag_weight: u8,
    pub red_flag_cap: u8,
}

impl ScoringConfig {
    /// The fixed rubric every deployment scores with.
    pub fn canonical() -> Self {
        Self {
            apr_tiers: vec![
                PenaltyTier {
                    above: 15.0,
                    penalty: 30,
                },
                PenaltyTier {
                    above: 8.0,
                    penalty: 20,
                },
                PenaltyTier {
                    above: 6.0,
                    penalty: 10,
                },
            ],
            apr_missing_penalty: 5,
            market_tiers: vec![
                PenaltyTier {
                    above: 2.0,
                    penalty: 40,
                },
                PenaltyTier {
                    above: 1.5,
                    penalty: 25,
                },
                PenaltyTier {
                    above: 1.2,
                    penalty: 10,
                },
            ],
            minimum_annual_mileage: 10_000.0,
            low_mileage_penalty: 10,
            termination_fee_limit: 500.0,
            termination_fee_penalty: 10,
            red_flag_weight: 4,
            red_flag_cap: 45,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

/// First tier whose threshold `value` exceeds.
pub(crate) fn tier_for(tiers: &[PenaltyTier], value: f64) -> Option<&PenaltyTier> {
    tiers.iter().find(|tier| value > tier.above)
}
