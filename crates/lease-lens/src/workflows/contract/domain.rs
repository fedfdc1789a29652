use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the contract text came from before it reached the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Pdf,
    Image,
    #[default]
    Text,
}

impl SourceFormat {
    /// Maps an upload content type onto a source tag. Unknown types yield `None`.
    pub fn from_mime(mime: &mime::Mime) -> Option<Self> {
        if mime.type_() == mime::APPLICATION && mime.subtype() == mime::PDF {
            Some(Self::Pdf)
        } else if mime.type_() == mime::IMAGE {
            Some(Self::Image)
        } else if mime.type_() == mime::TEXT {
            Some(Self::Text)
        } else {
            None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::Image => "image",
            SourceFormat::Text => "text",
        }
    }
}

/// Hard failure raised by the pipeline entry point.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid contract input: {reason}")]
    InvalidInput { reason: String },
}

/// Text produced by the OCR collaborator for one analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    text: String,
    source_format: SourceFormat,
}

impl RawDocument {
    pub fn new(text: impl Into<String>, source_format: SourceFormat) -> Self {
        Self {
            text: text.into(),
            source_format,
        }
    }

    /// Accepts a JSON payload from an outer layer. Anything but a string is rejected.
    pub fn from_json(value: &Value, source_format: SourceFormat) -> Result<Self, AnalysisError> {
        match value {
            Value::String(text) => Ok(Self::new(text.clone(), source_format)),
            Value::Null => Err(AnalysisError::InvalidInput {
                reason: "document text is null".to_string(),
            }),
            other => Err(AnalysisError::InvalidInput {
                reason: format!("document text must be a string, got {}", json_kind(other)),
            }),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Outcome of looking for one contract term.
///
/// `Present` keeps the raw matched text next to the canonical value so the original
/// evidence is never lost. `Unparsed` means a label was found but its value could not be
/// read; it is reported as an unclear clause, whereas `Absent` is reported as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExtractedField<T> {
    Present { value: T, raw: String },
    Absent,
    Unparsed { raw: String },
}

impl<T> Default for ExtractedField<T> {
    fn default() -> Self {
        ExtractedField::Absent
    }
}

impl<T> ExtractedField<T> {
    pub fn present(value: T, raw: impl Into<String>) -> Self {
        ExtractedField::Present {
            value,
            raw: raw.into(),
        }
    }

    pub fn unparsed(raw: impl Into<String>) -> Self {
        ExtractedField::Unparsed { raw: raw.into() }
    }

    pub fn status(&self) -> FieldStatus {
        match self {
            ExtractedField::Present { .. } => FieldStatus::Present,
            ExtractedField::Absent => FieldStatus::Absent,
            ExtractedField::Unparsed { .. } => FieldStatus::Unparsed,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ExtractedField::Present { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            ExtractedField::Present { raw, .. } | ExtractedField::Unparsed { raw } => Some(raw),
            ExtractedField::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ExtractedField::Present { .. })
    }

    /// Keeps `self` when it carries a value, otherwise falls back. Between two
    /// value-less fields an `Unparsed` one wins so the unclear evidence survives.
    pub fn prefer_over(self, fallback: Self) -> Self {
        match (self, fallback) {
            (preferred @ ExtractedField::Present { .. }, _) => preferred,
            (_, fallback @ ExtractedField::Present { .. }) => fallback,
            (preferred @ ExtractedField::Unparsed { .. }, _) => preferred,
            (ExtractedField::Absent, fallback) => fallback,
        }
    }
}

impl<T: Copy> ExtractedField<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Present,
    Absent,
    Unparsed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleDetails {
    pub vin: ExtractedField<String>,
    pub brand: ExtractedField<String>,
    pub model: ExtractedField<String>,
    pub year: ExtractedField<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialTerms {
    pub apr: ExtractedField<f64>,
    pub monthly_payment: ExtractedField<f64>,
    pub down_payment: ExtractedField<f64>,
    pub lease_term_months: ExtractedField<f64>,
    pub residual_value: ExtractedField<f64>,
    pub total_upfront: ExtractedField<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MileageTerms {
    pub annual_mileage_limit: ExtractedField<f64>,
    pub overage_charge_per_mile: ExtractedField<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTerms {
    pub late_payment_fee: ExtractedField<f64>,
    pub early_termination_fee: ExtractedField<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOption {
    pub buyout_available: ExtractedField<bool>,
    pub buyout_price: ExtractedField<f64>,
}

/// Structured terms of one contract. Built once per document and never mutated; a
/// re-analysis produces a new record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub vehicle: VehicleDetails,
    pub financial_terms: FinancialTerms,
    pub mileage_terms: MileageTerms,
    pub penalty_terms: PenaltyTerms,
    pub purchase_option: PurchaseOption,
}

impl ContractRecord {
    /// Monetary or count-valued leaf for `path`, if the leaf is numeric.
    pub fn amount(&self, path: FieldPath) -> Option<&ExtractedField<f64>> {
        let field = match path {
            FieldPath::Apr => &self.financial_terms.apr,
            FieldPath::MonthlyPayment => &self.financial_terms.monthly_payment,
            FieldPath::DownPayment => &self.financial_terms.down_payment,
            FieldPath::LeaseTermMonths => &self.financial_terms.lease_term_months,
            FieldPath::ResidualValue => &self.financial_terms.residual_value,
            FieldPath::TotalUpfront => &self.financial_terms.total_upfront,
            FieldPath::AnnualMileageLimit => &self.mileage_terms.annual_mileage_limit,
            FieldPath::OverageChargePerMile => &self.mileage_terms.overage_charge_per_mile,
            FieldPath::LatePaymentFee => &self.penalty_terms.late_payment_fee,
            FieldPath::EarlyTerminationFee => &self.penalty_terms.early_termination_fee,
            FieldPath::BuyoutPrice => &self.purchase_option.buyout_price,
            FieldPath::Vin
            | FieldPath::Brand
            | FieldPath::Model
            | FieldPath::Year
            | FieldPath::BuyoutAvailable => return None,
        };
        Some(field)
    }

    pub fn status(&self, path: FieldPath) -> FieldStatus {
        self.leaf(path).0
    }

    pub fn raw(&self, path: FieldPath) -> Option<&str> {
        self.leaf(path).1
    }

    fn leaf(&self, path: FieldPath) -> (FieldStatus, Option<&str>) {
        if let Some(field) = self.amount(path) {
            return (field.status(), field.raw());
        }
        match path {
            FieldPath::Vin => (self.vehicle.vin.status(), self.vehicle.vin.raw()),
            FieldPath::Brand => (self.vehicle.brand.status(), self.vehicle.brand.raw()),
            FieldPath::Model => (self.vehicle.model.status(), self.vehicle.model.raw()),
            FieldPath::Year => (self.vehicle.year.status(), self.vehicle.year.raw()),
            FieldPath::BuyoutAvailable => (
                self.purchase_option.buyout_available.status(),
                self.purchase_option.buyout_available.raw(),
            ),
            _ => (FieldStatus::Absent, None),
        }
    }

    /// Leaves in the tracked groups that are absent or unparsed, in schema order.
    pub fn clause_gaps(&self) -> Vec<(FieldPath, FieldStatus)> {
        FieldPath::TRACKED
            .iter()
            .map(|path| (*path, self.status(*path)))
            .filter(|(_, status)| *status != FieldStatus::Present)
            .collect()
    }

    /// Builds a new record that keeps every present leaf of `self` and takes the
    /// remaining leaves from `fallback`.
    pub fn reconcile_with(self, fallback: ContractRecord) -> ContractRecord {
        let ContractRecord {
            vehicle,
            financial_terms,
            mileage_terms,
            penalty_terms,
            purchase_option,
        } = self;

        ContractRecord {
            vehicle: VehicleDetails {
                vin: vehicle.vin.prefer_over(fallback.vehicle.vin),
                brand: vehicle.brand.prefer_over(fallback.vehicle.brand),
                model: vehicle.model.prefer_over(fallback.vehicle.model),
                year: vehicle.year.prefer_over(fallback.vehicle.year),
            },
            financial_terms: FinancialTerms {
                apr: financial_terms.apr.prefer_over(fallback.financial_terms.apr),
                monthly_payment: financial_terms
                    .monthly_payment
                    .prefer_over(fallback.financial_terms.monthly_payment),
                down_payment: financial_terms
                    .down_payment
                    .prefer_over(fallback.financial_terms.down_payment),
                lease_term_months: financial_terms
                    .lease_term_months
                    .prefer_over(fallback.financial_terms.lease_term_months),
                residual_value: financial_terms
                    .residual_value
                    .prefer_over(fallback.financial_terms.residual_value),
                total_upfront: financial_terms
                    .total_upfront
                    .prefer_over(fallback.financial_terms.total_upfront),
            },
            mileage_terms: MileageTerms {
                annual_mileage_limit: mileage_terms
                    .annual_mileage_limit
                    .prefer_over(fallback.mileage_terms.annual_mileage_limit),
                overage_charge_per_mile: mileage_terms
                    .overage_charge_per_mile
                    .prefer_over(fallback.mileage_terms.overage_charge_per_mile),
            },
            penalty_terms: PenaltyTerms {
                late_payment_fee: penalty_terms
                    .late_payment_fee
                    .prefer_over(fallback.penalty_terms.late_payment_fee),
                early_termination_fee: penalty_terms
                    .early_termination_fee
                    .prefer_over(fallback.penalty_terms.early_termination_fee),
            },
            purchase_option: PurchaseOption {
                buyout_available: purchase_option
                    .buyout_available
                    .prefer_over(fallback.purchase_option.buyout_available),
                buyout_price: purchase_option
                    .buyout_price
                    .prefer_over(fallback.purchase_option.buyout_price),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Vehicle,
    FinancialTerms,
    MileageTerms,
    PenaltyTerms,
    PurchaseOption,
}

/// Addresses one leaf of [`ContractRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPath {
    Vin,
    Brand,
    Model,
    Year,
    Apr,
    MonthlyPayment,
    DownPayment,
    LeaseTermMonths,
    ResidualValue,
    TotalUpfront,
    AnnualMileageLimit,
    OverageChargePerMile,
    LatePaymentFee,
    EarlyTerminationFee,
    BuyoutAvailable,
    BuyoutPrice,
}

impl FieldPath {
    pub const ALL: [FieldPath; 16] = [
        FieldPath::Vin,
        FieldPath::Brand,
        FieldPath::Model,
        FieldPath::Year,
        FieldPath::Apr,
        FieldPath::MonthlyPayment,
        FieldPath::DownPayment,
        FieldPath::LeaseTermMonths,
        FieldPath::ResidualValue,
        FieldPath::TotalUpfront,
        FieldPath::AnnualMileageLimit,
        FieldPath::OverageChargePerMile,
        FieldPath::LatePaymentFee,
        FieldPath::EarlyTerminationFee,
        FieldPath::BuyoutAvailable,
        FieldPath::BuyoutPrice,
    ];

    /// Leaves covered by the missing/unclear clause report.
    pub const TRACKED: [FieldPath; 10] = [
        FieldPath::Apr,
        FieldPath::MonthlyPayment,
        FieldPath::DownPayment,
        FieldPath::LeaseTermMonths,
        FieldPath::ResidualValue,
        FieldPath::TotalUpfront,
        FieldPath::AnnualMileageLimit,
        FieldPath::OverageChargePerMile,
        FieldPath::LatePaymentFee,
        FieldPath::EarlyTerminationFee,
    ];

    pub const fn group(self) -> FieldGroup {
        match self {
            FieldPath::Vin | FieldPath::Brand | FieldPath::Model | FieldPath::Year => {
                FieldGroup::Vehicle
            }
            FieldPath::Apr
            | FieldPath::MonthlyPayment
            | FieldPath::DownPayment
            | FieldPath::LeaseTermMonths
            | FieldPath::ResidualValue
            | FieldPath::TotalUpfront => FieldGroup::FinancialTerms,
            FieldPath::AnnualMileageLimit | FieldPath::OverageChargePerMile => {
                FieldGroup::MileageTerms
            }
            FieldPath::LatePaymentFee | FieldPath::EarlyTerminationFee => FieldGroup::PenaltyTerms,
            FieldPath::BuyoutAvailable | FieldPath::BuyoutPrice => FieldGroup::PurchaseOption,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            FieldPath::Vin => "vin",
            FieldPath::Brand => "brand",
            FieldPath::Model => "model",
            FieldPath::Year => "year",
            FieldPath::Apr => "apr",
            FieldPath::MonthlyPayment => "monthly_payment",
            FieldPath::DownPayment => "down_payment",
            FieldPath::LeaseTermMonths => "lease_term_months",
            FieldPath::ResidualValue => "residual_value",
            FieldPath::TotalUpfront => "total_upfront",
            FieldPath::AnnualMileageLimit => "annual_mileage_limit",
            FieldPath::OverageChargePerMile => "overage_charge_per_mile",
            FieldPath::LatePaymentFee => "late_payment_fee",
            FieldPath::EarlyTerminationFee => "early_termination_fee",
            FieldPath::BuyoutAvailable => "buyout_available",
            FieldPath::BuyoutPrice => "buyout_price",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FieldPath::Vin => "Vehicle identification number",
            FieldPath::Brand => "Vehicle make",
            FieldPath::Model => "Vehicle model",
            FieldPath::Year => "Model year",
            FieldPath::Apr => "Annual percentage rate",
            FieldPath::MonthlyPayment => "Monthly payment",
            FieldPath::DownPayment => "Down payment",
            FieldPath::LeaseTermMonths => "Lease term",
            FieldPath::ResidualValue => "Residual value",
            FieldPath::TotalUpfront => "Total due at signing",
            FieldPath::AnnualMileageLimit => "Annual mileage limit",
            FieldPath::OverageChargePerMile => "Excess mileage charge",
            FieldPath::LatePaymentFee => "Late payment fee",
            FieldPath::EarlyTerminationFee => "Early termination fee",
            FieldPath::BuyoutAvailable => "Purchase option",
            FieldPath::BuyoutPrice => "Buyout price",
        }
    }
}

/// Topic a generated risk statement belongs to. At most one flag per category is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Interest,
    Termination,
    Mileage,
    Maintenance,
    Fee,
    Insurance,
    Warranty,
    Arbitration,
    General,
}

impl RiskCategory {
    pub const fn label(self) -> &'static str {
        match self {
            RiskCategory::Interest => "interest",
            RiskCategory::Termination => "termination",
            RiskCategory::Mileage => "mileage",
            RiskCategory::Maintenance => "maintenance",
            RiskCategory::Fee => "fee",
            RiskCategory::Insurance => "insurance",
            RiskCategory::Warranty => "warranty",
            RiskCategory::Arbitration => "arbitration",
            RiskCategory::General => "general",
        }
    }
}

/// How a risk flag was derived; flags are ranked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagOrigin {
    Evidence,
    Keyword,
    Model,
}

/// Generated statement describing a contractual risk. Derived, never extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub category: RiskCategory,
    pub statement: String,
    pub origin: FlagOrigin,
}

impl RiskFlag {
    pub fn new(category: RiskCategory, statement: impl Into<String>, origin: FlagOrigin) -> Self {
        Self {
            category,
            statement: statement.into(),
            origin,
        }
    }

    /// Dedup key: lowercase, single-spaced, without trailing punctuation.
    pub fn normalized_statement(&self) -> String {
        self.statement
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_end_matches(['.', '!', '?', ';', ':'])
            .to_lowercase()
    }
}

/// Add-on fee named in the contract body (documentation fee, acquisition fee, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenCharge {
    pub name: String,
    pub amount: Option<f64>,
}
