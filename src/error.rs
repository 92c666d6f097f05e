//! Error types for the mapping schema.
//!
//! All errors are strongly typed using thiserror. Registration-time problems
//! are [`ConfigError`]s and fail at the call site; problems that only show up
//! when a conversion is evaluated or demanded are [`ConvertError`]s.

use thiserror::Error;

use crate::types::DataType;

/// Errors raised while configuring a schema.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Conversion expression has type {actual_from} -> {actual_to}, expected {expected_from} -> {expected_to}")]
    ExpressionTypeMismatch {
        expected_from: DataType,
        expected_to: DataType,
        actual_from: DataType,
        actual_to: DataType,
    },

    #[error("Value of kind '{value_kind}' cannot be stored as a default for {ty}")]
    ValueTypeMismatch {
        ty: DataType,
        value_kind: &'static str,
    },

    #[error("Invalid format profile: {reason}")]
    InvalidFormatProfile {
        reason: String,
    },
}

/// Errors raised while producing or evaluating a conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    #[error("No conversion available from {from} to {to}")]
    NoConversion {
        from: DataType,
        to: DataType,
    },

    #[error("Absent value cannot be converted to {ty}")]
    NullValue {
        ty: DataType,
    },

    #[error("Value of kind '{value_kind}' is not a valid {expected}")]
    TypeMismatch {
        expected: DataType,
        value_kind: &'static str,
    },

    #[error("Cannot parse '{input}' as {ty} using profile '{profile}': {reason}")]
    Format {
        input: String,
        ty: DataType,
        profile: String,
        reason: String,
    },

    #[error("Default value placeholder for {ty} was not reduced before compilation")]
    UnreducedPlaceholder {
        ty: DataType,
    },

    #[error("Parameter '{name}' is not bound by the enclosing conversion")]
    UnboundParameter {
        name: String,
    },

    #[error("Function '{name}' expected {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Top-level error type for the mapping schema.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Rejected registration or profile.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure while resolving or running a conversion.
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),
}

impl MappingError {
    /// Creates the "no conversion available" error for a type pair.
    #[must_use]
    pub fn no_conversion(from: &DataType, to: &DataType) -> Self {
        Self::Convert(ConvertError::NoConversion {
            from: from.clone(),
            to: to.clone(),
        })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is a conversion error.
    #[must_use]
    pub const fn is_convert(&self) -> bool {
        matches!(self, Self::Convert(_))
    }

    /// Returns true if no conversion rule could be produced.
    #[must_use]
    pub const fn is_no_conversion(&self) -> bool {
        matches!(self, Self::Convert(ConvertError::NoConversion { .. }))
    }
}

/// Result type alias for schema operations.
pub type MappingResult<T> = Result<T, MappingError>;
