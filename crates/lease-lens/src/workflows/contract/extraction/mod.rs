//! Label-driven field extraction over normalized contract text.
//!
//! Every field is resolved independently against the ordered rule table in [`rules`].
//! A labelled rule only looks for its value inside a short window after the label, and
//! that window stops at the next recognised label, so a figure is never attributed to
//! the wrong term.

mod charges;
mod rules;

pub use charges::detect_hidden_charges;

use super::domain::{
    ContractRecord, ExtractedField, FieldPath, FieldStatus, FinancialTerms, MileageTerms,
    PenaltyTerms, PurchaseOption, VehicleDetails,
};
use super::numeric::normalize_numeric;
use rules::{rule_table, CompiledMatcher, RuleTable, ValueKind, KNOWN_BRANDS};
use tracing::debug;

const EXCERPT_CHARS: usize = 32;

const MODEL_STOPWORDS: &[&str] = &[
    "and", "for", "lease", "lessee", "lessor", "the", "this", "vin", "with", "year",
];

/// What the rule table found for one field before it is typed.
#[derive(Debug, Clone, PartialEq)]
enum Capture {
    Value { raw: String, kind: ValueKind },
    /// A label was found but nothing readable followed it.
    Label { excerpt: String },
    Miss,
}

/// Builds a [`ContractRecord`] from normalized text. Total: any string yields a record.
pub fn extract(normalized_text: &str) -> ContractRecord {
    let table = rule_table();
    let amount = |field| number_field(field, locate(table, normalized_text, field));

    let buyout_price = amount(FieldPath::BuyoutPrice);
    let buyout_available = buyout_availability(table, normalized_text, &buyout_price);

    let record = ContractRecord {
        vehicle: VehicleDetails {
            vin: text_field(locate(table, normalized_text, FieldPath::Vin)),
            brand: text_field(locate(table, normalized_text, FieldPath::Brand)),
            model: text_field(locate(table, normalized_text, FieldPath::Model)),
            year: year_field(locate(table, normalized_text, FieldPath::Year)),
        },
        financial_terms: FinancialTerms {
            apr: amount(FieldPath::Apr),
            monthly_payment: amount(FieldPath::MonthlyPayment),
            down_payment: amount(FieldPath::DownPayment),
            lease_term_months: amount(FieldPath::LeaseTermMonths),
            residual_value: amount(FieldPath::ResidualValue),
            total_upfront: amount(FieldPath::TotalUpfront),
        },
        mileage_terms: MileageTerms {
            annual_mileage_limit: amount(FieldPath::AnnualMileageLimit),
            overage_charge_per_mile: amount(FieldPath::OverageChargePerMile),
        },
        penalty_terms: PenaltyTerms {
            late_payment_fee: amount(FieldPath::LatePaymentFee),
            early_termination_fee: amount(FieldPath::EarlyTerminationFee),
        },
        purchase_option: PurchaseOption {
            buyout_available,
            buyout_price,
        },
    };

    debug!(
        present = FieldPath::ALL
            .iter()
            .filter(|path| record.status(**path) == FieldStatus::Present)
            .count(),
        "contract fields extracted"
    );
    record
}

fn locate(table: &RuleTable, text: &str, field: FieldPath) -> Capture {
    let mut unclear: Option<String> = None;
    // Label with nothing after it; reported only when no label carries readable text.
    let mut bare_label: Option<String> = None;

    for (index, rule) in table
        .rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.field == field)
    {
        match &rule.matcher {
            CompiledMatcher::Labeled { label, window } => {
                for found in label.find_iter(text) {
                    let window = label_window(table, text, found.end(), *window);
                    if is_blank(window) {
                        bare_label.get_or_insert_with(|| found.as_str().trim().to_string());
                        continue;
                    }
                    if let Some(raw) = find_value(table, rule.kind, window) {
                        debug!(field = field.key(), rule = index, %raw, "field captured");
                        return Capture::Value {
                            raw,
                            kind: rule.kind,
                        };
                    }
                    unclear.get_or_insert_with(|| excerpt(window));
                }
            }
            CompiledMatcher::Inline(pattern) => {
                let hit = pattern
                    .captures_iter(text)
                    .filter_map(|captures| captures.name("value"))
                    .map(|value| value.as_str().trim().to_string())
                    .find(|raw| accepts(rule.kind, raw));
                if let Some(raw) = hit {
                    debug!(field = field.key(), rule = index, %raw, "field captured");
                    return Capture::Value {
                        raw,
                        kind: rule.kind,
                    };
                }
            }
        }
    }

    match unclear.or(bare_label) {
        Some(excerpt) => Capture::Label { excerpt },
        None => Capture::Miss,
    }
}

/// Text after a label, bounded by `limit` characters and by the next label.
fn label_window<'t>(table: &RuleTable, text: &'t str, start: usize, limit: usize) -> &'t str {
    let tail = &text[start..];
    let bounded_end = tail
        .char_indices()
        .nth(limit)
        .map(|(offset, _)| start + offset)
        .unwrap_or(text.len());

    let end = match table.any_label.find_at(text, start) {
        Some(next) if next.start() < bounded_end => next.start(),
        _ => bounded_end,
    };
    &text[start..end]
}

fn is_blank(window: &str) -> bool {
    window
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '-' | '=' | '.' | ',' | '(' | ')' | '#')
        })
        .is_empty()
}

fn excerpt(window: &str) -> String {
    let trimmed =
        window.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '='));
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    cut.trim().to_string()
}

fn find_value(table: &RuleTable, kind: ValueKind, window: &str) -> Option<String> {
    if kind == ValueKind::Model {
        return model_name(window);
    }
    table
        .value_patterns(kind)
        .iter()
        .find_map(|pattern| {
            pattern
                .find_iter(window)
                .map(|found| found.as_str().trim().to_string())
                .find(|raw| accepts(kind, raw))
        })
}

fn accepts(kind: ValueKind, raw: &str) -> bool {
    match kind {
        // Case-insensitive classes also match Unicode look-alikes such as U+212A.
        ValueKind::Vin => {
            raw.is_ascii()
                && raw.chars().any(|c| c.is_ascii_digit())
                && raw.chars().any(|c| c.is_ascii_alphabetic())
        }
        ValueKind::Brand => !MODEL_STOPWORDS.contains(&raw.to_ascii_lowercase().as_str()),
        _ => !raw.is_empty(),
    }
}

/// Up to two tokens naming the model, e.g. "Civic EX" or "Model 3".
fn model_name(window: &str) -> Option<String> {
    let mut tokens = window
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')'))
        .map(|token| token.trim_matches(|c: char| matches!(c, ':' | '-' | '.')))
        .filter(|token| !token.is_empty());

    let first = tokens.next()?;
    if MODEL_STOPWORDS.contains(&first.to_ascii_lowercase().as_str()) {
        return None;
    }
    let mut name = first.to_string();
    if let Some(second) = tokens.next() {
        let starts_upper_or_digit = second
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            .unwrap_or(false);
        let stopword = MODEL_STOPWORDS.contains(&second.to_ascii_lowercase().as_str());
        if starts_upper_or_digit && !stopword {
            name.push(' ');
            name.push_str(second);
        }
    }
    Some(name)
}

fn number_field(field: FieldPath, capture: Capture) -> ExtractedField<f64> {
    match capture {
        Capture::Value {
            raw,
            kind: ValueKind::Numeric(kind),
        } => match normalize_numeric(&raw, kind) {
            Ok(value) => ExtractedField::present(value, raw),
            Err(err) => {
                debug!(field = field.key(), error = %err, "captured value is unclear");
                ExtractedField::unparsed(raw)
            }
        },
        Capture::Value { raw, .. } => ExtractedField::unparsed(raw),
        Capture::Label { excerpt } => ExtractedField::unparsed(excerpt),
        Capture::Miss => ExtractedField::Absent,
    }
}

fn text_field(capture: Capture) -> ExtractedField<String> {
    match capture {
        Capture::Value {
            raw,
            kind: ValueKind::Vin,
        } => ExtractedField::present(raw.to_ascii_uppercase(), raw),
        Capture::Value {
            raw,
            kind: ValueKind::Brand,
        } => ExtractedField::present(canonical_brand(&raw), raw),
        Capture::Value { raw, .. } => ExtractedField::present(raw.clone(), raw),
        Capture::Label { excerpt } => ExtractedField::unparsed(excerpt),
        Capture::Miss => ExtractedField::Absent,
    }
}

fn year_field(capture: Capture) -> ExtractedField<u16> {
    match capture {
        Capture::Value { raw, .. } => match raw.parse::<u16>() {
            Ok(year) => ExtractedField::present(year, raw),
            Err(_) => ExtractedField::unparsed(raw),
        },
        Capture::Label { excerpt } => ExtractedField::unparsed(excerpt),
        Capture::Miss => ExtractedField::Absent,
    }
}

/// Display name for a make: the known spelling, otherwise title case.
pub(crate) fn canonical_brand(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    if let Some((_, display)) = KNOWN_BRANDS.iter().find(|(key, _)| *key == lowered) {
        return (*display).to_string();
    }
    lowered
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn buyout_availability(
    table: &RuleTable,
    text: &str,
    buyout_price: &ExtractedField<f64>,
) -> ExtractedField<bool> {
    if let Some(declined) = table.buyout_declined.find(text) {
        return ExtractedField::present(false, declined.as_str());
    }
    if let ExtractedField::Present { raw, .. } = buyout_price {
        return ExtractedField::present(true, raw.clone());
    }
    match table.buyout_offered.find(text) {
        Some(offered) => ExtractedField::present(true, offered.as_str()),
        None => ExtractedField::Absent,
    }
}
