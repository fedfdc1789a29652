use super::super::domain::HiddenCharge;
use super::super::numeric::{normalize_numeric, NumericKind};
use super::rules::{rule_table, ValueKind};
use super::{find_value, label_window};
use tracing::debug;

const CHARGE_WINDOW: usize = 40;

/// Lists add-on fees named in the contract, each at most once, in table order.
///
/// The amount is read from the first figure following the fee name when one is there.
pub fn detect_hidden_charges(normalized_text: &str) -> Vec<HiddenCharge> {
    let table = rule_table();
    let kind = ValueKind::Numeric(NumericKind::Currency);

    table
        .charges
        .iter()
        .filter_map(|charge| {
            let found = charge.label.find(normalized_text)?;
            let window = label_window(table, normalized_text, found.end(), CHARGE_WINDOW);
            let amount = find_value(table, kind, window)
                .and_then(|raw| normalize_numeric(&raw, NumericKind::Currency).ok());
            debug!(charge = charge.name, ?amount, "hidden charge detected");
            Some(HiddenCharge {
                name: charge.name.to_string(),
                amount,
            })
        })
        .collect()
}
