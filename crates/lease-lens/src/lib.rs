//! Contract-term extraction and fairness scoring for vehicle lease and loan agreements.
//!
//! The `workflows::contract` pipeline turns OCR'd contract text into a structured
//! [`ContractRecord`](workflows::contract::ContractRecord), a bounded fairness score and a
//! ranked list of risk statements without calling any remote service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
