use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::contract::{
    contract_router, ClassifierError, ContractAnalyzer, ContractRecord, ExtractedField,
    MarketValueSource, SentenceClassifier, SentenceLabel, VehicleDetails,
};

pub(super) const HIGH_APR_CONTRACT: &str = "Vehicle Lease Agreement
APR: 18.5%
Monthly Payment: $650
Term: 36 months
Mileage Allowance: 8000 miles per year
Early Termination Fee: $1200
";

pub(super) const UNSTRUCTURED_CONTRACT: &str = "This document contains no structured terms.";

pub(super) const VIN_CONTRACT: &str =
    "Vehicle Identification Number (VIN): 1HGCM82633A004352\nMake: Honda Model: Accord Year: 2003";

pub(super) fn analyzer() -> ContractAnalyzer {
    ContractAnalyzer::default()
}

pub(super) fn contract_router_with_analyzer(analyzer: ContractAnalyzer) -> axum::Router {
    contract_router(Arc::new(analyzer))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Record with only the terms the rubric looks at filled in.
pub(super) fn scored_record(
    apr: Option<f64>,
    annual_mileage: Option<f64>,
    termination_fee: Option<f64>,
) -> ContractRecord {
    let mut record = ContractRecord::default();
    if let Some(apr) = apr {
        record.financial_terms.apr = ExtractedField::present(apr, format!("{apr}%"));
    }
    if let Some(miles) = annual_mileage {
        record.mileage_terms.annual_mileage_limit =
            ExtractedField::present(miles, format!("{miles}"));
    }
    if let Some(fee) = termination_fee {
        record.penalty_terms.early_termination_fee =
            ExtractedField::present(fee, format!("${fee}"));
    }
    record
}

pub(super) fn lease_cost(record: &mut ContractRecord, monthly: f64, months: f64, upfront: f64) {
    let terms = &mut record.financial_terms;
    terms.monthly_payment = ExtractedField::present(monthly, format!("${monthly}"));
    terms.lease_term_months = ExtractedField::present(months, format!("{months} months"));
    terms.total_upfront = ExtractedField::present(upfront, format!("${upfront}"));
}

/// Gives every sentence the same label and records what it was asked.
#[derive(Default)]
pub(super) struct UniformLabels {
    label: String,
    score: f32,
    seen: Mutex<Vec<String>>,
}

impl UniformLabels {
    pub(super) fn new(label: &str, score: f32) -> Self {
        Self {
            label: label.to_string(),
            score,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("lock").clone()
    }
}

impl SentenceClassifier for UniformLabels {
    fn classify_sentences(
        &self,
        sentences: &[String],
    ) -> Result<Vec<SentenceLabel>, ClassifierError> {
        self.seen.lock().expect("lock").extend_from_slice(sentences);
        Ok(sentences
            .iter()
            .map(|_| SentenceLabel {
                label: self.label.clone(),
                score: self.score,
            })
            .collect())
    }
}

pub(super) struct UnavailableModel;

impl SentenceClassifier for UnavailableModel {
    fn classify_sentences(
        &self,
        _sentences: &[String],
    ) -> Result<Vec<SentenceLabel>, ClassifierError> {
        Err(ClassifierError::Unavailable("model weights not loaded".to_string()))
    }
}

pub(super) struct FixedMarket(pub(super) f64);

impl MarketValueSource for FixedMarket {
    fn market_value(&self, _vehicle: &VehicleDetails) -> Option<f64> {
        Some(self.0)
    }
}
