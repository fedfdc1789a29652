use super::domain::VehicleDetails;
use super::extraction::canonical_brand;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Year market values are depreciated to when the caller does not supply one.
pub const DEFAULT_REFERENCE_YEAR: u16 = 2026;
const FALLBACK_MODEL_YEAR: u16 = 2021;
const DEFAULT_BASE_PRICE: f64 = 20_000.0;
const ANNUAL_RETENTION: f64 = 0.9;

const BASE_PRICES: &[(&str, f64)] = &[
    ("Toyota", 22_000.0),
    ("Honda", 21_000.0),
    ("Ford", 18_000.0),
    ("Chevrolet", 17_500.0),
    ("BMW", 35_000.0),
    ("Mercedes-Benz", 38_000.0),
];

/// Supplies a market value for the vehicle described by a contract.
pub trait MarketValueSource: Send + Sync {
    fn market_value(&self, vehicle: &VehicleDetails) -> Option<f64>;
}

#[derive(Debug)]
pub enum BenchmarkError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidPrice { brand: String, price: f64 },
}

impl std::fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkError::Io(err) => write!(f, "failed to read benchmark prices: {}", err),
            BenchmarkError::Csv(err) => write!(f, "invalid benchmark CSV data: {}", err),
            BenchmarkError::InvalidPrice { brand, price } => {
                write!(f, "base price for {} must be positive, got {}", brand, price)
            }
        }
    }
}

impl std::error::Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchmarkError::Io(err) => Some(err),
            BenchmarkError::Csv(err) => Some(err),
            BenchmarkError::InvalidPrice { .. } => None,
        }
    }
}

impl From<std::io::Error> for BenchmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BenchmarkError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct BasePriceRow {
    brand: String,
    base_price: f64,
}

/// Estimates market value as `base_price × 0.9^age`.
///
/// Unknown makes use a generic base price; a missing model year is treated as 2021. A
/// vehicle without a make gets no estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct DepreciationBenchmark {
    base_prices: HashMap<String, f64>,
    reference_year: u16,
}

impl DepreciationBenchmark {
    pub fn new(reference_year: u16) -> Self {
        let base_prices = BASE_PRICES
            .iter()
            .map(|(brand, price)| (brand.to_ascii_lowercase(), *price))
            .collect();
        Self {
            base_prices,
            reference_year,
        }
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        reference_year: u16,
    ) -> Result<Self, BenchmarkError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, reference_year)
    }

    /// Loads `brand,base_price` rows on top of the built-in table.
    pub fn from_reader<R: Read>(reader: R, reference_year: u16) -> Result<Self, BenchmarkError> {
        let mut benchmark = Self::new(reference_year);
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for row in csv_reader.deserialize::<BasePriceRow>() {
            let row = row?;
            if !row.base_price.is_finite() || row.base_price <= 0.0 {
                return Err(BenchmarkError::InvalidPrice {
                    brand: row.brand,
                    price: row.base_price,
                });
            }
            benchmark
                .base_prices
                .insert(brand_key(&row.brand), row.base_price);
        }

        Ok(benchmark)
    }

    pub fn reference_year(&self) -> u16 {
        self.reference_year
    }

    pub fn estimate(&self, brand: &str, model_year: Option<u16>) -> f64 {
        let base = self
            .base_prices
            .get(&brand_key(brand))
            .copied()
            .unwrap_or(DEFAULT_BASE_PRICE);
        let year = model_year.unwrap_or(FALLBACK_MODEL_YEAR);
        let age = i32::from(self.reference_year.saturating_sub(year));
        let value = base * ANNUAL_RETENTION.powi(age);
        (value * 100.0).round() / 100.0
    }
}

impl Default for DepreciationBenchmark {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_YEAR)
    }
}

impl MarketValueSource for DepreciationBenchmark {
    fn market_value(&self, vehicle: &VehicleDetails) -> Option<f64> {
        let brand = vehicle.brand.value()?;
        Some(self.estimate(brand, vehicle.year.get()))
    }
}

fn brand_key(brand: &str) -> String {
    canonical_brand(brand).to_ascii_lowercase()
}
