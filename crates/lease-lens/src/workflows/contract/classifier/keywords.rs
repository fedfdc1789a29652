use super::super::domain::{ContractRecord, FlagOrigin, HiddenCharge, RiskCategory, RiskFlag};
use super::ClassifierConfig;
use regex::Regex;
use std::sync::OnceLock;

/// Whether a keyword rule fires on the phrase being present or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Present,
    Absent,
}

struct KeywordRule {
    category: RiskCategory,
    trigger: Trigger,
    pattern: &'static str,
    statement: &'static str,
}

const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        category: RiskCategory::Termination,
        trigger: Trigger::Present,
        pattern: r"\bearly\s+termination\b",
        statement: "Early termination may involve financial penalties.",
    },
    KeywordRule {
        category: RiskCategory::Fee,
        trigger: Trigger::Present,
        pattern: r"\blate\s+(?:payment\s+)?fees?\b|\bpenalt(?:y|ies)\b",
        statement: "Late payment penalties apply if dues are delayed.",
    },
    KeywordRule {
        category: RiskCategory::Insurance,
        trigger: Trigger::Absent,
        pattern: r"\binsurance\b",
        statement: "Insurance responsibility is not clearly stated.",
    },
    KeywordRule {
        category: RiskCategory::Maintenance,
        trigger: Trigger::Present,
        pattern: r"\bresponsible\s+for\s+(?:all\s+)?(?:maintenance|repairs?)\b|\bexcess\s+wear(?:\s+and\s+|\s*&\s*|-and-)tear\b",
        statement: "Maintenance and wear-and-tear costs fall on the lessee.",
    },
    KeywordRule {
        category: RiskCategory::Warranty,
        trigger: Trigger::Present,
        pattern: r"\bas[-\s]is\b|\bno\s+warranty\b|\bwithout\s+(?:any\s+)?warrant(?:y|ies)\b",
        statement: "The vehicle is provided without warranty coverage.",
    },
    KeywordRule {
        category: RiskCategory::Arbitration,
        trigger: Trigger::Present,
        pattern: r"\b(?:binding|mandatory)\s+arbitration\b|\bwaives?\s+(?:the\s+|any\s+)?right\s+to\s+(?:a\s+)?(?:jury\s+)?trial\b",
        statement: "Disputes must go to binding arbitration instead of court.",
    },
];

static KEYWORD_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn keyword_patterns() -> &'static [Regex] {
    KEYWORD_PATTERNS.get_or_init(|| {
        KEYWORD_RULES
            .iter()
            .map(|rule| {
                Regex::new(&format!("(?i){}", rule.pattern)).expect("valid keyword pattern")
            })
            .collect()
    })
}

/// Two decimals at most, without trailing zeros: 18.5 stays "18.5", 6.9599.. becomes "6.96".
fn percent(rate: f64) -> String {
    let fixed = format!("{rate:.2}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Flags backed by extracted figures, so the statement quotes the contract itself.
pub(crate) fn evidence_flags(
    record: &ContractRecord,
    hidden_charges: &[HiddenCharge],
    config: &ClassifierConfig,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    let evidence =
        |category, statement: String| RiskFlag::new(category, statement, FlagOrigin::Evidence);

    if let Some(apr) = record.financial_terms.apr.get() {
        if apr > config.high_apr {
            flags.push(evidence(
                RiskCategory::Interest,
                format!("High interest rate: {}%.", percent(apr)),
            ));
        }
    }

    let termination = &record.penalty_terms.early_termination_fee;
    if let (Some(fee), Some(raw)) = (termination.get(), termination.raw()) {
        if fee > config.high_termination_fee {
            flags.push(evidence(
                RiskCategory::Termination,
                format!("High early termination fee: {raw}."),
            ));
        }
    }

    let mileage = &record.mileage_terms;
    let overage = &mileage.overage_charge_per_mile;
    match (mileage.annual_mileage_limit.get(), overage.get(), overage.raw()) {
        (Some(limit), _, _) if limit < config.low_annual_mileage => flags.push(evidence(
            RiskCategory::Mileage,
            format!("Low annual mileage allowance: {limit:.0} miles."),
        )),
        (_, Some(charge), Some(raw)) if charge > config.high_overage_charge => {
            flags.push(evidence(
                RiskCategory::Mileage,
                format!("Steep excess mileage charge: {raw} per mile."),
            ))
        }
        _ => {}
    }

    let late_fee = &record.penalty_terms.late_payment_fee;
    match (late_fee.get(), late_fee.raw()) {
        (Some(fee), Some(raw)) if fee > config.high_late_fee => flags.push(evidence(
            RiskCategory::Fee,
            format!("High late payment fee: {raw}."),
        )),
        _ if !hidden_charges.is_empty() => {
            let names: Vec<&str> = hidden_charges
                .iter()
                .map(|charge| charge.name.as_str())
                .collect();
            flags.push(evidence(
                RiskCategory::Fee,
                format!("Additional fees found: {}.", names.join(", ")),
            ));
        }
        _ => {}
    }

    flags
}

/// Deterministic fallback flags from the fixed keyword table.
pub(crate) fn keyword_flags(normalized_text: &str) -> Vec<RiskFlag> {
    KEYWORD_RULES
        .iter()
        .zip(keyword_patterns())
        .filter(|(rule, pattern)| {
            let found = pattern.is_match(normalized_text);
            match rule.trigger {
                Trigger::Present => found,
                Trigger::Absent => !found,
            }
        })
        .map(|(rule, _)| RiskFlag::new(rule.category, rule.statement, FlagOrigin::Keyword))
        .collect()
}

/// Best-effort topic for a sentence flagged by an external model.
pub(crate) fn categorize_sentence(sentence: &str) -> RiskCategory {
    const TOPICS: &[(&str, RiskCategory)] = &[
        ("terminat", RiskCategory::Termination),
        ("interest", RiskCategory::Interest),
        ("apr", RiskCategory::Interest),
        ("mileage", RiskCategory::Mileage),
        ("miles", RiskCategory::Mileage),
        ("insurance", RiskCategory::Insurance),
        ("warrant", RiskCategory::Warranty),
        ("arbitrat", RiskCategory::Arbitration),
        ("maintenance", RiskCategory::Maintenance),
        ("repair", RiskCategory::Maintenance),
        ("fee", RiskCategory::Fee),
        ("penalt", RiskCategory::Fee),
        ("charge", RiskCategory::Fee),
    ];

    let lowered = sentence.to_lowercase();
    TOPICS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or(RiskCategory::General)
}
