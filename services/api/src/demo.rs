use crate::infra::{build_analyzer, parse_source_format, source_format_for};
use clap::Args;
use lease_lens::config::{AnalysisConfig, AppConfig};
use lease_lens::error::AppError;
use lease_lens::workflows::contract::{
    AnalysisContext, AnalysisError, AnalysisResult, ContractAnalyzer, FieldPath, FieldStatus,
    RawDocument, SourceFormat, SuppliedRecord,
};
use std::path::PathBuf;

const DEMO_CONTRACT: &str = "CLOSED-END MOTOR VEHICLE LEASE AGREEMENT
Vehicle Identification Number (VIN): 2HGFC2F59KH512345
Make: Honda  Model: Civic LX  Model Year: 2023
Annual Percentage Rate (APR): 9.9%
Monthly Payment: $429.00
Lease Term: 39 months
Amount due at signing: $3,250.00
Acquisition fee: $995   Documentation fee: $299
Mileage allowance: 7,500 miles per year
Excess mileage charge: $0.30 per mile
Late payment fee: $75
Early termination fee: $2,500 plus all remaining payments.
Lessee must carry comprehensive insurance on the vehicle.
Any dispute will be resolved by binding arbitration.
Page 1 of 1";

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// OCR'd contract text to analyze
    pub(crate) path: PathBuf,
    /// Document origin (pdf, image or text); guessed from the file extension when omitted
    #[arg(long, value_parser = parse_source_format)]
    pub(crate) source_format: Option<SourceFormat>,
    /// Market value of the vehicle; overrides the depreciation benchmark
    #[arg(long)]
    pub(crate) market_value: Option<f64>,
    /// JSON file with terms already extracted upstream
    #[arg(long)]
    pub(crate) supplied: Option<PathBuf>,
    /// Print the full result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Market value to compare the sample lease against
    #[arg(long)]
    pub(crate) market_value: Option<f64>,
    /// Print the full result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let AnalyzeArgs {
        path,
        source_format,
        market_value,
        supplied,
        json,
    } = args;

    let config = AppConfig::load()?;
    let analyzer = build_analyzer(&config.analysis)?;

    let bytes = std::fs::read(&path)?;
    let text = String::from_utf8_lossy(&bytes);
    let source_format = source_format.unwrap_or_else(|| source_format_for(&path));
    let supplied = supplied.map(|path| load_supplied(&path)).transpose()?;

    let result = analyzer.analyze(
        &RawDocument::new(text, source_format),
        &AnalysisContext {
            market_value,
            supplied,
        },
    );
    print_result(&result, json);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let analyzer = build_analyzer(&AnalysisConfig::default())?;
    let result = demo_result(&analyzer, args.market_value);

    if !args.json {
        println!("Lease contract analysis demo");
        println!("Sample contract:\n{DEMO_CONTRACT}\n");
    }
    print_result(&result, args.json);
    Ok(())
}

fn demo_result(analyzer: &ContractAnalyzer, market_value: Option<f64>) -> AnalysisResult {
    analyzer.analyze(
        &RawDocument::new(DEMO_CONTRACT, SourceFormat::Pdf),
        &AnalysisContext {
            market_value,
            supplied: None,
        },
    )
}

fn load_supplied(path: &std::path::Path) -> Result<SuppliedRecord, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|err| AnalysisError::InvalidInput {
            reason: format!("supplied record {} is not valid JSON: {err}", path.display()),
        })?;
    Ok(SuppliedRecord::from_json(&value))
}

fn print_result(result: &AnalysisResult, json: bool) {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Analysis payload unavailable: {err}"),
        }
        return;
    }

    println!(
        "Fairness score: {}/100 ({})",
        result.fairness.score,
        result.fairness.rating.label()
    );
    for contribution in &result.fairness.contributions {
        println!("  {:+} {}", contribution.delta, contribution.reason);
    }
    match result.market_value {
        Some(market) => println!(
            "Total cost: {:.2} against a market value of {:.2}",
            result.total_cost, market
        ),
        None => println!("Total cost: {:.2}", result.total_cost),
    }

    println!("\nExtracted terms ({} source)", result.source_format.label());
    for path in FieldPath::ALL {
        let line = match (result.record.status(path), result.record.raw(path)) {
            (FieldStatus::Present, Some(raw)) => raw.to_string(),
            (FieldStatus::Unparsed, Some(raw)) => format!("unclear (\"{raw}\")"),
            _ => "not specified".to_string(),
        };
        println!("  - {}: {}", path.label(), line);
    }

    if !result.hidden_charges.is_empty() {
        println!("\nAdd-on charges");
        for charge in &result.hidden_charges {
            match charge.amount {
                Some(amount) => println!("  - {}: {:.2}", charge.name, amount),
                None => println!("  - {}", charge.name),
            }
        }
    }

    println!("\nRisk flags");
    if result.risk_flags.is_empty() {
        println!("  none");
    }
    for flag in &result.risk_flags {
        println!("  - [{}] {}", flag.category.label(), flag.statement);
    }

    if !result.missing_clauses.is_empty() {
        println!("\nMissing or unclear clauses");
        for clause in &result.missing_clauses {
            println!("  - {clause}");
        }
    }

    if !result.negotiation_points.is_empty() {
        println!("\nNegotiation points");
        for point in &result.negotiation_points {
            println!("  - {point}");
        }
    }

    println!("\n{}", result.disclaimer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lease_lens::workflows::contract::{Rating, RiskCategory};

    #[test]
    fn demo_contract_needs_negotiation() {
        let result = demo_result(&ContractAnalyzer::default(), None);

        assert_eq!(result.record.financial_terms.apr.get(), Some(9.9));
        assert_eq!(result.record.financial_terms.lease_term_months.get(), Some(39.0));
        assert_eq!(result.hidden_charges.len(), 2);
        // APR -20, mileage -10, termination fee -10, two add-on fees -8
        assert_eq!(result.fairness.score, 52);
        assert_eq!(result.fairness.rating, Rating::NeedsNegotiation);
        assert!(result
            .risk_flags
            .iter()
            .any(|flag| flag.category == RiskCategory::Arbitration));
    }

    #[test]
    fn market_value_pushes_the_demo_lower() {
        let result = demo_result(&ContractAnalyzer::default(), Some(9_000.0));
        assert_eq!(result.fairness.score, 12);
        assert_eq!(result.fairness.rating, Rating::HighRisk);
    }
}
