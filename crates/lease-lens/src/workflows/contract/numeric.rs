use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Multiplier turning a lease money factor into an APR-equivalent percentage.
pub const MONEY_FACTOR_TO_APR: f64 = 2400.0;

/// How a captured string should be read as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    Currency,
    Percentage,
    Integer,
    MonthDuration,
    MoneyFactor,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("value is empty")]
    Empty,
    #[error("no digits in '{raw}'")]
    NoDigits { raw: String },
    #[error("'{raw}' is not a number")]
    Malformed { raw: String },
    #[error("'{raw}' is not a whole number")]
    NotWhole { raw: String },
}

static NUMBER_TOKEN: OnceLock<Regex> = OnceLock::new();
static YEAR_UNIT: OnceLock<Regex> = OnceLock::new();

fn number_token() -> &'static Regex {
    NUMBER_TOKEN.get_or_init(|| {
        Regex::new(r"\d[\d,]*(?:\.\d+)?|\.\d+").expect("valid number token pattern")
    })
}

fn year_unit() -> &'static Regex {
    YEAR_UNIT.get_or_init(|| {
        Regex::new(r"(?i)\b(?:years?|yrs?)\b").expect("valid year unit pattern")
    })
}

/// Reads the first number in `raw` according to `kind`.
///
/// Currency symbols, thousands separators, `%` and unit words are ignored. Durations
/// expressed in years are converted to months; a money factor is scaled to an APR
/// percentage.
pub fn normalize_numeric(raw: &str, kind: NumericKind) -> Result<f64, NumericError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NumericError::Empty);
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(NumericError::NoDigits {
            raw: trimmed.to_string(),
        });
    }

    let token = number_token()
        .find(trimmed)
        .ok_or_else(|| NumericError::Malformed {
            raw: trimmed.to_string(),
        })?;
    let digits = token.as_str().replace(',', "");
    let value = digits
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| NumericError::Malformed {
            raw: trimmed.to_string(),
        })?;

    match kind {
        NumericKind::Currency | NumericKind::Percentage => Ok(value),
        NumericKind::Integer => {
            if value.fract() == 0.0 {
                Ok(value)
            } else {
                Err(NumericError::NotWhole {
                    raw: trimmed.to_string(),
                })
            }
        }
        NumericKind::MonthDuration => {
            if year_unit().is_match(trimmed) {
                Ok(value * 12.0)
            } else {
                Ok(value)
            }
        }
        NumericKind::MoneyFactor => Ok(value * MONEY_FACTOR_TO_APR),
    }
}
