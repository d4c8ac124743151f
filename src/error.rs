//! Errors surfaced by the aggregation entry point.
//!
//! Only caller mistakes are fatal. Upstream failures end up in per-source
//! reports and existence-check failures only skip that stage.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl AggregateError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AggregateError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
