//! Partial records handed over by an upstream LLM extraction step.
//!
//! The upstream output is loosely shaped: either the flat keys the extraction prompt asks
//! for (`brand`, `apr`, `lease_term`, `mileage_limit`, ...) or the nested groups of
//! [`ContractRecord`]. Anything unreadable is treated as not supplied.

use super::domain::{ContractRecord, ExtractedField, FieldPath};
use super::extraction::canonical_brand;
use super::numeric::{normalize_numeric, NumericKind};
use serde_json::{Map, Value};
use tracing::warn;

const PLACEHOLDERS: &[&str] = &[
    "", "n/a", "na", "none", "null", "error", "unknown", "not specified", "not found",
];

const GROUP_KEYS: &[&str] = &[
    "vehicle",
    "financial_terms",
    "mileage_terms",
    "penalty_terms",
    "purchase_option",
];

/// Record and red flags reported by the upstream collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuppliedRecord {
    pub record: ContractRecord,
    pub red_flags: Vec<String>,
}

impl SuppliedRecord {
    pub fn new(record: ContractRecord, red_flags: Vec<String>) -> Self {
        Self { record, red_flags }
    }

    /// Reads a JSON object in flat or grouped form. Never fails; a non-object yields an
    /// empty record.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            warn!("supplied record is not a JSON object, ignoring it");
            return Self::default();
        };

        let mut leaves: Map<String, Value> = Map::new();
        for (key, value) in object {
            match value {
                Value::Object(group) if GROUP_KEYS.contains(&key.as_str()) => {
                    for (leaf, leaf_value) in group {
                        leaves.insert(leaf.clone(), leaf_value.clone());
                    }
                }
                _ => {
                    leaves.insert(key.clone(), value.clone());
                }
            }
        }

        let lookup = |path: FieldPath| lookup_leaf(&leaves, path);

        let mut record = ContractRecord::default();
        record.vehicle.vin = lookup(FieldPath::Vin)
            .map(|value| read_leaf(value, vin_field))
            .unwrap_or_default();
        record.vehicle.brand = lookup(FieldPath::Brand)
            .map(|value| read_leaf(value, brand_field))
            .unwrap_or_default();
        record.vehicle.model = lookup(FieldPath::Model)
            .map(|value| read_leaf(value, text_field))
            .unwrap_or_default();
        record.vehicle.year = lookup(FieldPath::Year)
            .map(|value| read_leaf(value, year_field))
            .unwrap_or_default();

        for path in FieldPath::ALL {
            if let (Some(kind), Some(value)) = (numeric_kind(path), lookup(path)) {
                if let Some(slot) = amount_slot(&mut record, path) {
                    *slot = read_leaf(value, |inner| number_field(inner, kind));
                }
            }
        }
        record.purchase_option.buyout_available = lookup(FieldPath::BuyoutAvailable)
            .map(|value| read_leaf(value, flag_field))
            .unwrap_or_default();

        let red_flags = leaves
            .get("red_flags")
            .map(red_flag_list)
            .unwrap_or_default();

        Self { record, red_flags }
    }
}

fn lookup_leaf(leaves: &Map<String, Value>, path: FieldPath) -> Option<&Value> {
    aliases(path)
        .iter()
        .find_map(|alias| leaves.get(*alias))
}

fn aliases(path: FieldPath) -> &'static [&'static str] {
    match path {
        FieldPath::Vin => &["vin"],
        FieldPath::Brand => &["brand", "make"],
        FieldPath::Model => &["model"],
        FieldPath::Year => &["year", "model_year"],
        FieldPath::Apr => &["apr", "interest_rate"],
        FieldPath::MonthlyPayment => &["monthly_payment"],
        FieldPath::DownPayment => &["down_payment", "deposit"],
        FieldPath::LeaseTermMonths => &["lease_term_months", "lease_term", "term"],
        FieldPath::ResidualValue => &["residual_value"],
        FieldPath::TotalUpfront => &["total_upfront", "due_at_signing"],
        FieldPath::AnnualMileageLimit => &["annual_mileage_limit", "mileage_limit"],
        FieldPath::OverageChargePerMile => &["overage_charge_per_mile", "overage_charge"],
        FieldPath::LatePaymentFee => &["late_payment_fee", "late_fee"],
        FieldPath::EarlyTerminationFee => &["early_termination_fee", "termination_fee"],
        FieldPath::BuyoutAvailable => &["buyout_available", "purchase_option"],
        FieldPath::BuyoutPrice => &["buyout_price"],
    }
}

fn numeric_kind(path: FieldPath) -> Option<NumericKind> {
    match path {
        FieldPath::Apr => Some(NumericKind::Percentage),
        FieldPath::LeaseTermMonths => Some(NumericKind::MonthDuration),
        FieldPath::AnnualMileageLimit => Some(NumericKind::Integer),
        FieldPath::MonthlyPayment
        | FieldPath::DownPayment
        | FieldPath::ResidualValue
        | FieldPath::TotalUpfront
        | FieldPath::OverageChargePerMile
        | FieldPath::LatePaymentFee
        | FieldPath::EarlyTerminationFee
        | FieldPath::BuyoutPrice => Some(NumericKind::Currency),
        FieldPath::Vin
        | FieldPath::Brand
        | FieldPath::Model
        | FieldPath::Year
        | FieldPath::BuyoutAvailable => None,
    }
}

fn amount_slot(record: &mut ContractRecord, path: FieldPath) -> Option<&mut ExtractedField<f64>> {
    let slot = match path {
        FieldPath::Apr => &mut record.financial_terms.apr,
        FieldPath::MonthlyPayment => &mut record.financial_terms.monthly_payment,
        FieldPath::DownPayment => &mut record.financial_terms.down_payment,
        FieldPath::LeaseTermMonths => &mut record.financial_terms.lease_term_months,
        FieldPath::ResidualValue => &mut record.financial_terms.residual_value,
        FieldPath::TotalUpfront => &mut record.financial_terms.total_upfront,
        FieldPath::AnnualMileageLimit => &mut record.mileage_terms.annual_mileage_limit,
        FieldPath::OverageChargePerMile => &mut record.mileage_terms.overage_charge_per_mile,
        FieldPath::LatePaymentFee => &mut record.penalty_terms.late_payment_fee,
        FieldPath::EarlyTerminationFee => &mut record.penalty_terms.early_termination_fee,
        FieldPath::BuyoutPrice => &mut record.purchase_option.buyout_price,
        _ => return None,
    };
    Some(slot)
}

/// Reads a bare value or a serialized field wrapper (`{"state": "absent"}`,
/// `{"state": "unparsed", "raw": ..}`, `{"state": "present", "value": .., "raw": ..}`).
fn read_leaf<T>(
    value: &Value,
    parse: impl FnOnce(&Value) -> ExtractedField<T>,
) -> ExtractedField<T> {
    let raw = value.get("raw").and_then(Value::as_str).map(str::trim);
    match value.get("state").and_then(Value::as_str) {
        Some("absent") => ExtractedField::Absent,
        Some("unparsed") => ExtractedField::unparsed(raw.unwrap_or_default()),
        _ => match (value.get("value"), raw) {
            (Some(inner), Some(raw)) => match parse(inner) {
                ExtractedField::Present { value, .. } => ExtractedField::present(value, raw),
                other => other,
            },
            (Some(inner), None) => parse(inner),
            (None, _) => parse(value),
        },
    }
}

fn placeholder(text: &str) -> bool {
    PLACEHOLDERS.contains(&text.trim().to_ascii_lowercase().as_str())
}

fn number_field(value: &Value, kind: NumericKind) -> ExtractedField<f64> {
    match value {
        Value::Number(number) => match number.as_f64() {
            Some(parsed) if kind == NumericKind::Integer && parsed.fract() != 0.0 => {
                ExtractedField::unparsed(number.to_string())
            }
            Some(parsed) => ExtractedField::present(parsed, number.to_string()),
            None => ExtractedField::unparsed(number.to_string()),
        },
        Value::String(text) if placeholder(text) => ExtractedField::Absent,
        Value::String(text) => match normalize_numeric(text, kind) {
            Ok(parsed) => ExtractedField::present(parsed, text.trim()),
            Err(_) => ExtractedField::unparsed(text.trim()),
        },
        Value::Null => ExtractedField::Absent,
        other => ExtractedField::unparsed(other.to_string()),
    }
}

fn text_field(value: &Value) -> ExtractedField<String> {
    match value {
        Value::String(text) if placeholder(text) => ExtractedField::Absent,
        Value::String(text) => ExtractedField::present(text.trim().to_string(), text.trim()),
        Value::Number(number) => ExtractedField::present(number.to_string(), number.to_string()),
        Value::Null => ExtractedField::Absent,
        other => ExtractedField::unparsed(other.to_string()),
    }
}

fn brand_field(value: &Value) -> ExtractedField<String> {
    match text_field(value) {
        ExtractedField::Present { value, raw } => {
            ExtractedField::present(canonical_brand(&value), raw)
        }
        other => other,
    }
}

fn vin_field(value: &Value) -> ExtractedField<String> {
    match text_field(value) {
        ExtractedField::Present { value, raw } => {
            let vin = value.to_ascii_uppercase();
            let valid = vin.len() == 17
                && vin.chars().all(|c| {
                    c.is_ascii_digit() || (c.is_ascii_uppercase() && !matches!(c, 'I' | 'O' | 'Q'))
                });
            if valid {
                ExtractedField::present(vin, raw)
            } else {
                ExtractedField::unparsed(raw)
            }
        }
        other => other,
    }
}

fn year_field(value: &Value) -> ExtractedField<u16> {
    match value {
        Value::Number(number) => {
            match number.as_u64().and_then(|year| u16::try_from(year).ok()) {
                Some(year) => ExtractedField::present(year, number.to_string()),
                None => ExtractedField::unparsed(number.to_string()),
            }
        }
        Value::String(text) if placeholder(text) => ExtractedField::Absent,
        Value::String(text) => match text.trim().parse::<u16>() {
            Ok(year) => ExtractedField::present(year, text.trim()),
            Err(_) => ExtractedField::unparsed(text.trim()),
        },
        Value::Null => ExtractedField::Absent,
        other => ExtractedField::unparsed(other.to_string()),
    }
}

fn flag_field(value: &Value) -> ExtractedField<bool> {
    match value {
        Value::Bool(flag) => ExtractedField::present(*flag, flag.to_string()),
        Value::String(text) if placeholder(text) => ExtractedField::Absent,
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "available" => ExtractedField::present(true, text.trim()),
            "no" | "false" | "not available" => ExtractedField::present(false, text.trim()),
            _ => ExtractedField::unparsed(text.trim()),
        },
        Value::Null => ExtractedField::Absent,
        other => ExtractedField::unparsed(other.to_string()),
    }
}

fn red_flag_list(value: &Value) -> Vec<String> {
    let strings: Vec<&str> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(text) => vec![text.as_str()],
        _ => Vec::new(),
    };
    strings
        .into_iter()
        .map(str::trim)
        .filter(|flag| !placeholder(flag))
        .map(str::to_string)
        .collect()
}
