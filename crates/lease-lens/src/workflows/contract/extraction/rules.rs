use super::super::domain::FieldPath;
use super::super::numeric::NumericKind;
use regex::Regex;
use std::sync::OnceLock;

/// How the text captured by a rule is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Numeric(NumericKind),
    Vin,
    Brand,
    Model,
    Year,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Matcher {
    /// Label phrase; the value must follow within `window` characters.
    Labeled { label: &'static str, window: usize },
    /// Self-contained pattern with a `value` capture group.
    Inline { pattern: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleSpec {
    pub(crate) field: FieldPath,
    pub(crate) kind: ValueKind,
    pub(crate) matcher: Matcher,
}

const WINDOW: usize = 48;
const WIDE_WINDOW: usize = 72;

const CURRENCY: ValueKind = ValueKind::Numeric(NumericKind::Currency);
const PERCENTAGE: ValueKind = ValueKind::Numeric(NumericKind::Percentage);
const INTEGER: ValueKind = ValueKind::Numeric(NumericKind::Integer);
const DURATION: ValueKind = ValueKind::Numeric(NumericKind::MonthDuration);
const MONEY_FACTOR: ValueKind = ValueKind::Numeric(NumericKind::MoneyFactor);

const fn labeled(field: FieldPath, kind: ValueKind, label: &'static str) -> RuleSpec {
    RuleSpec {
        field,
        kind,
        matcher: Matcher::Labeled {
            label,
            window: WINDOW,
        },
    }
}

const fn labeled_wide(field: FieldPath, kind: ValueKind, label: &'static str) -> RuleSpec {
    RuleSpec {
        field,
        kind,
        matcher: Matcher::Labeled {
            label,
            window: WIDE_WINDOW,
        },
    }
}

const fn inline(field: FieldPath, kind: ValueKind, pattern: &'static str) -> RuleSpec {
    RuleSpec {
        field,
        kind,
        matcher: Matcher::Inline { pattern },
    }
}

/// Makes recognised by the brand rules, lowercase key to display name.
pub(crate) const KNOWN_BRANDS: &[(&str, &str)] = &[
    ("acura", "Acura"),
    ("audi", "Audi"),
    ("bmw", "BMW"),
    ("chevrolet", "Chevrolet"),
    ("chevy", "Chevrolet"),
    ("ford", "Ford"),
    ("gmc", "GMC"),
    ("honda", "Honda"),
    ("hyundai", "Hyundai"),
    ("jeep", "Jeep"),
    ("kia", "Kia"),
    ("lexus", "Lexus"),
    ("mahindra", "Mahindra"),
    ("maruti", "Maruti Suzuki"),
    ("mazda", "Mazda"),
    ("mercedes-benz", "Mercedes-Benz"),
    ("mercedes", "Mercedes-Benz"),
    ("nissan", "Nissan"),
    ("subaru", "Subaru"),
    ("tata", "Tata"),
    ("tesla", "Tesla"),
    ("toyota", "Toyota"),
    ("volkswagen", "Volkswagen"),
    ("volvo", "Volvo"),
];

const BRAND_ALTERNATION: &str = "acura|audi|bmw|chevrolet|chevy|ford|gmc|honda|hyundai|jeep|kia|lexus|mahindra|maruti|mazda|mercedes-benz|mercedes|nissan|subaru|tata|tesla|toyota|volkswagen|volvo";

/// Ordered extraction rules. Within one field the first rule that yields a value wins,
/// so specific label phrasings come before generic ones and label-free patterns last.
pub(crate) const RULES: &[RuleSpec] = &[
    // Vehicle identity
    labeled(
        FieldPath::Vin,
        ValueKind::Vin,
        r"\bvehicle\s+identification\s+(?:number|no\.?)(?:\s*\(\s*vin\s*\))?",
    ),
    labeled(
        FieldPath::Vin,
        ValueKind::Vin,
        r"\bvin\b(?:\s*(?:number|no\.?|#))?",
    ),
    inline(
        FieldPath::Vin,
        ValueKind::Vin,
        r"\b(?P<value>[A-HJ-NPR-Z0-9]{17})\b",
    ),
    labeled(
        FieldPath::Brand,
        ValueKind::Brand,
        r"\b(?:vehicle\s+|car\s+)?make\s*[:\-]",
    ),
    labeled(FieldPath::Brand, ValueKind::Brand, r"\b(?:brand|manufacturer)\s*[:\-]"),
    labeled(
        FieldPath::Model,
        ValueKind::Model,
        r"\b(?:vehicle\s+|car\s+)?model\s*[:\-]",
    ),
    labeled(
        FieldPath::Year,
        ValueKind::Year,
        r"\b(?:model|vehicle|manufacturing)\s+year\b",
    ),
    labeled(FieldPath::Year, ValueKind::Year, r"\byear\s+of\s+manufacture\b"),
    labeled(FieldPath::Year, ValueKind::Year, r"\byear\s*[:\-]"),
    // Financial terms
    labeled(
        FieldPath::Apr,
        PERCENTAGE,
        r"\bannual\s+percentage\s+rate\b(?:\s*\(\s*apr\s*\))?",
    ),
    labeled(FieldPath::Apr, PERCENTAGE, r"\bapr\b"),
    labeled(FieldPath::Apr, PERCENTAGE, r"\binterest\s+rate\b"),
    labeled(FieldPath::Apr, PERCENTAGE, r"\brate\s+of\s+interest\b"),
    labeled(FieldPath::Apr, MONEY_FACTOR, r"\bmoney\s+factor\b"),
    labeled(
        FieldPath::MonthlyPayment,
        CURRENCY,
        r"\bmonthly\s+(?:lease\s+|base\s+)?payment\b",
    ),
    labeled(
        FieldPath::MonthlyPayment,
        CURRENCY,
        r"\bmonthly\s+(?:rent(?:al)?|installment|emi)\b",
    ),
    labeled(FieldPath::MonthlyPayment, CURRENCY, r"\bpayment\s+per\s+month\b"),
    labeled(FieldPath::MonthlyPayment, CURRENCY, r"\bemi\b"),
    inline(
        FieldPath::MonthlyPayment,
        CURRENCY,
        r"(?P<value>[$₹]\s?\d[\d,]*(?:\.\d{1,2})?)\s*(?:/\s*|per\s+)(?:mo\b|month)",
    ),
    labeled(FieldPath::DownPayment, CURRENCY, r"\bdown\s+payment\b"),
    labeled(
        FieldPath::DownPayment,
        CURRENCY,
        r"\bcap(?:italized)?\.?\s+cost\s+reduction\b",
    ),
    labeled(FieldPath::DownPayment, CURRENCY, r"\bsecurity\s+deposit\b"),
    labeled(FieldPath::DownPayment, CURRENCY, r"\bdeposit\b"),
    labeled(
        FieldPath::LeaseTermMonths,
        DURATION,
        r"\blease\s+(?:term|duration|period)\b",
    ),
    labeled(
        FieldPath::LeaseTermMonths,
        DURATION,
        r"\bterm\s+of\s+(?:the\s+|this\s+)?(?:lease|loan|agreement)\b",
    ),
    labeled(
        FieldPath::LeaseTermMonths,
        DURATION,
        r"\bnumber\s+of\s+(?:monthly\s+)?payments\b",
    ),
    labeled(FieldPath::LeaseTermMonths, DURATION, r"\b(?:loan\s+)?term\b"),
    inline(
        FieldPath::LeaseTermMonths,
        DURATION,
        r"\b(?P<value>\d{1,3}[\s-]*months?)\b",
    ),
    labeled(FieldPath::ResidualValue, CURRENCY, r"\bresidual\s+value\b"),
    labeled(FieldPath::ResidualValue, CURRENCY, r"\bresidual\b"),
    labeled(
        FieldPath::TotalUpfront,
        CURRENCY,
        r"\btotal\s+(?:amount\s+)?due\s+at\s+(?:lease\s+)?signing\b",
    ),
    labeled(
        FieldPath::TotalUpfront,
        CURRENCY,
        r"\btotal\s+upfront(?:\s+(?:cost|payment|amount))?\b",
    ),
    labeled(
        FieldPath::TotalUpfront,
        CURRENCY,
        r"\b(?:amount\s+)?due\s+at\s+(?:lease\s+)?signing\b",
    ),
    labeled(
        FieldPath::TotalUpfront,
        CURRENCY,
        r"\b(?:drive[-\s]?off|upfront)\s+(?:amount|payment|cost)\b",
    ),
    // Mileage terms
    labeled(
        FieldPath::AnnualMileageLimit,
        INTEGER,
        r"\b(?:annual\s+)?mileage\s+(?:allowance|limit)\b",
    ),
    labeled(
        FieldPath::AnnualMileageLimit,
        INTEGER,
        r"\b(?:allowed|permitted)\s+(?:annual\s+)?(?:mileage|miles)\b",
    ),
    inline(
        FieldPath::AnnualMileageLimit,
        INTEGER,
        r"(?P<value>\d{1,3}(?:,\d{3})+|\d{4,6})\s*(?:miles|mi\.?|km|kilomet(?:er|re)s)\s*(?:per|/|a|each)\s*(?:year|yr|annum)\b",
    ),
    labeled(
        FieldPath::OverageChargePerMile,
        CURRENCY,
        r"\bexcess\s+(?:mileage|miles?|km)\s+(?:charge|fee|rate)s?\b",
    ),
    labeled(
        FieldPath::OverageChargePerMile,
        CURRENCY,
        r"\b(?:mileage\s+)?overage\s+(?:charge|fee|rate)s?\b",
    ),
    inline(
        FieldPath::OverageChargePerMile,
        CURRENCY,
        r"(?P<value>[$₹]\s?\d*\.\d{2})\s*(?:per|/|a|each)\s*(?:mile|mi|km)\b",
    ),
    // Penalty terms
    labeled(
        FieldPath::LatePaymentFee,
        CURRENCY,
        r"\blate\s+(?:payment\s+)?(?:fee|charge|penalty)s?\b",
    ),
    labeled_wide(FieldPath::LatePaymentFee, CURRENCY, r"\blate\s+payments?\b"),
    labeled(
        FieldPath::EarlyTerminationFee,
        CURRENCY,
        r"\bearly\s+termination\s+(?:fee|charge|penalty)s?\b",
    ),
    labeled(
        FieldPath::EarlyTerminationFee,
        CURRENCY,
        r"\btermination\s+(?:fee|charge)s?\b",
    ),
    labeled_wide(FieldPath::EarlyTerminationFee, CURRENCY, r"\bearly\s+termination\b"),
    // Purchase option
    labeled(
        FieldPath::BuyoutPrice,
        CURRENCY,
        r"\b(?:purchase|buy-?out)\s+option\s+price\b",
    ),
    labeled(
        FieldPath::BuyoutPrice,
        CURRENCY,
        r"\bbuy-?out\s+(?:price|amount)\b",
    ),
    labeled(
        FieldPath::BuyoutPrice,
        CURRENCY,
        r"\bpurchase\s+price\s+at\s+(?:lease\s+)?end\b",
    ),
    labeled_wide(FieldPath::BuyoutPrice, CURRENCY, r"\bbuy-?out\b"),
];

/// Add-on fee phrases scanned for the hidden-charge report.
pub(crate) const HIDDEN_CHARGES: &[(&str, &str)] = &[
    ("Acquisition fee", r"\b(?:bank\s+)?acquisition\s+fee\b"),
    ("Disposition fee", r"\bdisposition\s+fee\b"),
    ("Documentation fee", r"\bdoc(?:umentation|ument)?\.?\s+fee\b"),
    ("Administrative fee", r"\badmin(?:istrative|istration)?\.?\s+fee\b"),
    ("Processing fee", r"\bprocessing\s+fee\b"),
    ("Dealer preparation fee", r"\bdealer\s+prep(?:aration)?(?:\s+fee)?\b"),
    (
        "Excess wear-and-tear charge",
        r"\bexcess\s+wear(?:\s+and\s+|\s*&\s*|-and-)tear\b",
    ),
];

pub(crate) enum CompiledMatcher {
    Labeled { label: Regex, window: usize },
    Inline(Regex),
}

pub(crate) struct CompiledRule {
    pub(crate) field: FieldPath,
    pub(crate) kind: ValueKind,
    pub(crate) matcher: CompiledMatcher,
}

pub(crate) struct CompiledCharge {
    pub(crate) name: &'static str,
    pub(crate) label: Regex,
}

/// Process-wide compiled form of [`RULES`] and [`HIDDEN_CHARGES`]. Read-only after init.
pub(crate) struct RuleTable {
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) charges: Vec<CompiledCharge>,
    /// Union of every label; a label window ends where the next label begins.
    pub(crate) any_label: Regex,
    pub(crate) buyout_declined: Regex,
    pub(crate) buyout_offered: Regex,
    values: ValuePatterns,
}

struct ValuePatterns {
    currency: [Regex; 2],
    percentage: [Regex; 2],
    integer: [Regex; 1],
    duration: [Regex; 2],
    money_factor: [Regex; 1],
    vin: [Regex; 1],
    brand: [Regex; 1],
    year: [Regex; 1],
}

static RULE_TABLE: OnceLock<RuleTable> = OnceLock::new();

pub(crate) fn rule_table() -> &'static RuleTable {
    RULE_TABLE.get_or_init(RuleTable::compile)
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("valid extraction pattern")
}

impl RuleTable {
    fn compile() -> Self {
        let mut rules: Vec<CompiledRule> = RULES
            .iter()
            .map(|spec| CompiledRule {
                field: spec.field,
                kind: spec.kind,
                matcher: match spec.matcher {
                    Matcher::Labeled { label, window } => CompiledMatcher::Labeled {
                        label: case_insensitive(label),
                        window,
                    },
                    Matcher::Inline { pattern } => {
                        CompiledMatcher::Inline(case_insensitive(pattern))
                    }
                },
            })
            .collect();
        // Label-free vehicle fallbacks built from the brand list.
        rules.push(CompiledRule {
            field: FieldPath::Brand,
            kind: ValueKind::Brand,
            matcher: CompiledMatcher::Inline(case_insensitive(&format!(
                r"\b(?P<value>{BRAND_ALTERNATION})\b"
            ))),
        });
        rules.push(CompiledRule {
            field: FieldPath::Year,
            kind: ValueKind::Year,
            matcher: CompiledMatcher::Inline(case_insensitive(&format!(
                r"\b(?P<value>(?:19|20)\d{{2}})\s+(?:{BRAND_ALTERNATION})\b"
            ))),
        });

        let charges = HIDDEN_CHARGES
            .iter()
            .map(|(name, label)| CompiledCharge {
                name,
                label: case_insensitive(label),
            })
            .collect();

        let labels: Vec<&str> = RULES
            .iter()
            .filter_map(|spec| match spec.matcher {
                Matcher::Labeled { label, .. } => Some(label),
                Matcher::Inline { .. } => None,
            })
            .chain(HIDDEN_CHARGES.iter().map(|(_, label)| *label))
            .collect();
        let any_label = case_insensitive(&format!("(?:{})", labels.join(")|(?:")));

        Self {
            rules,
            charges,
            any_label,
            buyout_declined: case_insensitive(
                r"\bno\s+(?:purchase|buy-?out)\s+option\b|\b(?:purchase|buy-?out)\s+option\s*[:\-]?\s*(?:no|none|n/?a|not\s+(?:available|offered))\b",
            ),
            buyout_offered: case_insensitive(
                r"\b(?:purchase|buy-?out)\s+option\b|\boption\s+to\s+(?:purchase|buy)\b|\bbuy-?out\b",
            ),
            values: ValuePatterns {
                currency: [
                    case_insensitive(
                        r"(?:\b(?:us\$|usd|inr|rs\.?)|[$₹€£])\s*(?:\d[\d,]*(?:\.\d{1,2})?|\.\d{1,2})",
                    ),
                    case_insensitive(r"\b\d[\d,]*(?:\.\d{1,2})?\b"),
                ],
                percentage: [
                    case_insensitive(r"\d{1,3}(?:\.\d+)?\s*%"),
                    case_insensitive(r"\b\d{1,2}(?:\.\d+)?\b"),
                ],
                integer: [case_insensitive(r"\b(?:\d{1,3}(?:,\d{3})+|\d+)\b")],
                duration: [
                    case_insensitive(r"\b\d{1,3}[\s-]*(?:months?|mos?\.?|years?|yrs?)\b"),
                    case_insensitive(r"\b\d{1,3}\b"),
                ],
                money_factor: [case_insensitive(r"(?:\b0)?\.\d{3,6}\b")],
                vin: [case_insensitive(r"\b[A-HJ-NPR-Z0-9]{17}\b")],
                brand: [case_insensitive(r"\b[a-z][a-z\-]*[a-z]\b")],
                year: [case_insensitive(r"\b(?:19|20)\d{2}\b")],
            },
        }
    }

    /// Candidate value patterns for `kind`, most specific first. `Model` is tokenised
    /// separately and has none.
    pub(crate) fn value_patterns(&self, kind: ValueKind) -> &[Regex] {
        let values = &self.values;
        match kind {
            ValueKind::Numeric(NumericKind::Currency) => &values.currency,
            ValueKind::Numeric(NumericKind::Percentage) => &values.percentage,
            ValueKind::Numeric(NumericKind::Integer) => &values.integer,
            ValueKind::Numeric(NumericKind::MonthDuration) => &values.duration,
            ValueKind::Numeric(NumericKind::MoneyFactor) => &values.money_factor,
            ValueKind::Vin => &values.vin,
            ValueKind::Brand => &values.brand,
            ValueKind::Year => &values.year,
            ValueKind::Model => &[],
        }
    }
}
