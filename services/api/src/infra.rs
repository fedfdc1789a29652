use chrono::{Datelike, Local};
use lease_lens::config::AnalysisConfig;
use lease_lens::error::AppError;
use lease_lens::workflows::contract::{
    ContractAnalyzer, DepreciationBenchmark, ScoringConfig, SourceFormat, DEFAULT_REFERENCE_YEAR,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Analyzer wired with the configured classifier limits and a depreciation benchmark
/// anchored on the current calendar year.
pub(crate) fn build_analyzer(config: &AnalysisConfig) -> Result<ContractAnalyzer, AppError> {
    let reference_year = current_year();
    let benchmark = match &config.benchmark_csv {
        Some(path) => {
            let benchmark = DepreciationBenchmark::from_path(path, reference_year)?;
            info!(path = %path.display(), reference_year, "loaded market benchmark prices");
            benchmark
        }
        None => DepreciationBenchmark::new(reference_year),
    };

    Ok(
        ContractAnalyzer::new(ScoringConfig::canonical(), config.classifier_config())
            .with_market_source(Arc::new(benchmark)),
    )
}

fn current_year() -> u16 {
    u16::try_from(Local::now().year()).unwrap_or(DEFAULT_REFERENCE_YEAR)
}

/// Guesses the document origin from its file extension; unknown types are read as text.
pub(crate) fn source_format_for(path: &Path) -> SourceFormat {
    mime_guess::from_path(path)
        .first()
        .and_then(|mime| SourceFormat::from_mime(&mime))
        .unwrap_or_default()
}

pub(crate) fn parse_source_format(raw: &str) -> Result<SourceFormat, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pdf" => Ok(SourceFormat::Pdf),
        "image" | "img" => Ok(SourceFormat::Image),
        "text" | "txt" => Ok(SourceFormat::Text),
        other => Err(format!("unknown source format '{other}' (expected pdf, image or text)")),
    }
}
