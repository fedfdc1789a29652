use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{AnalysisContext, ContractAnalyzer, SourceFormat, SuppliedRecord};
use crate::error::AppError;

/// Body accepted by the analyze endpoint.
///
/// `text` stays untyped so a null or non-string value is reported as invalid input
/// rather than as a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: Value,
    #[serde(default)]
    pub source_format: Option<SourceFormat>,
    #[serde(default)]
    pub market_value: Option<f64>,
    #[serde(default)]
    pub supplied: Option<Value>,
}

impl AnalyzeRequest {
    fn context(&self) -> AnalysisContext {
        AnalysisContext {
            market_value: self.market_value,
            supplied: self.supplied.as_ref().map(SuppliedRecord::from_json),
        }
    }
}

pub fn contract_router(analyzer: Arc<ContractAnalyzer>) -> Router {
    Router::new()
        .route("/api/v1/contracts/analyze", post(analyze_handler))
        .with_state(analyzer)
}

pub(crate) async fn analyze_handler(
    State(analyzer): State<Arc<ContractAnalyzer>>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Response {
    let context = request.context();
    let source_format = request.source_format.unwrap_or_default();

    match analyzer.analyze_json(&request.text, source_format, &context) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => {
            warn!(error = %error, "rejected contract analysis request");
            AppError::from(error).into_response()
        }
    }
}
