//! Rich error handling for the margin engine.
//!
//! Domain errors are converted into an [`EngineError`] carrying a stable code and
//! key-value context. The binary prints them as an [`ErrorReport`] JSON line and
//! exits with the code's process status.
//!
//! # Exit Codes
//!
//! | Status | Codes |
//! |--------|-------|
//! | 2 | `CONFIG_READ_FAILED`, `CONFIG_PARSE_FAILED`, `INVALID_CONFIG` |
//! | 3 | `INVALID_DESCRIPTOR_INDEX`, `DUPLICATE_DESCRIPTOR` |
//! | 4 | `UNSUPPORTED_COMBO_ORDER` |
//! | 5 | `NON_CONVERGENCE` |
//! | 1 | `INTERNAL_ERROR` |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::buying_power::BuyingPowerError;
use crate::domain::position_group::PositionGroupError;

/// Error codes for the margin engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors
    /// Configuration file could not be read.
    ConfigReadFailed,
    /// Configuration file is not valid YAML for the schema.
    ConfigParseFailed,
    /// Configuration values are out of range or inconsistent.
    InvalidConfig,

    // Resolver chain errors
    /// Descriptor registered at or past the fallback position.
    InvalidDescriptorIndex,
    /// Descriptor registered twice.
    DuplicateDescriptor,

    // Buying power errors
    /// Multi-leg group passed to the single-instrument sufficiency check.
    UnsupportedComboOrder,
    /// Maximum quantity search stopped making progress.
    NonConvergence,

    // Internal errors
    /// Unexpected failure.
    InternalError,
}

impl ErrorCode {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigReadFailed | Self::ConfigParseFailed | Self::InvalidConfig => 2,
            Self::InvalidDescriptorIndex | Self::DuplicateDescriptor => 3,
            Self::UnsupportedComboOrder => 4,
            Self::NonConvergence => 5,
            Self::InternalError => 1,
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::ConfigReadFailed => "CONFIG_READ_FAILED",
            Self::ConfigParseFailed => "CONFIG_PARSE_FAILED",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::InvalidDescriptorIndex => "INVALID_DESCRIPTOR_INDEX",
            Self::DuplicateDescriptor => "DUPLICATE_DESCRIPTOR",
            Self::UnsupportedComboOrder => "UNSUPPORTED_COMBO_ORDER",
            Self::NonConvergence => "NON_CONVERGENCE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A rich error with context for the margin engine.
#[derive(Debug, Error)]
pub struct EngineError {
    /// Error code.
    code: ErrorCode,
    /// Human-readable message.
    message: String,
    /// Additional context (key-value pairs), in insertion order.
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Convert to a serializable report.
    #[must_use]
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code.reason().to_string(),
            message: self.message.clone(),
            exit_code: self.code.exit_code(),
            details: self.context.iter().cloned().collect(),
        }
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

/// Serializable error body printed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Process exit status.
    pub exit_code: i32,
    /// Additional details.
    pub details: BTreeMap<String, String>,
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::ReadError { .. } => ErrorCode::ConfigReadFailed,
            ConfigError::ParseError(_) => ErrorCode::ConfigParseFailed,
            ConfigError::ValidationError(_) => ErrorCode::InvalidConfig,
        };
        let error = Self::new(code, err.to_string());
        match err {
            ConfigError::ReadError { path, .. } => error.with_context("path", path),
            _ => error,
        }
    }
}

impl From<PositionGroupError> for EngineError {
    fn from(err: PositionGroupError) -> Self {
        let message = err.to_string();
        match err {
            PositionGroupError::InvalidDescriptorIndex { index, count } => {
                Self::new(ErrorCode::InvalidDescriptorIndex, message)
                    .with_context("index", index)
                    .with_context("count", count)
            }
            PositionGroupError::DuplicateDescriptor { descriptor } => {
                Self::new(ErrorCode::DuplicateDescriptor, message)
                    .with_context("descriptor", descriptor)
            }
        }
    }
}

impl From<BuyingPowerError> for EngineError {
    fn from(err: BuyingPowerError) -> Self {
        let message = err.to_string();
        match err {
            BuyingPowerError::UnsupportedComboOrder {
                order_id,
                group_size,
            } => Self::new(ErrorCode::UnsupportedComboOrder, message)
                .with_context("order_id", order_id)
                .with_context("group_size", group_size),
            BuyingPowerError::NonConvergence {
                group,
                current_margin,
                quantity,
                lot_size,
                order_fee,
                unit_margin,
                order_margin,
                target_margin,
            } => Self::new(ErrorCode::NonConvergence, message)
                .with_context("group", group)
                .with_context("current_margin", current_margin)
                .with_context("quantity", quantity)
                .with_context("lot_size", lot_size)
                .with_context("order_fee", order_fee)
                .with_context("unit_margin", unit_margin)
                .with_context("order_margin", order_margin)
                .with_context("target_margin", target_margin),
        }
    }
}
