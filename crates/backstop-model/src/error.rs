//! Validation errors for declarative backup documents

use thiserror::Error;

/// Errors raised while turning declarative documents into typed values.
///
/// Every variant names the offending field or expression path so the
/// message can be shown to the user without further context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{path}: no condition is set; expected exactly one of: {expected}")]
    NoCondition { path: String, expected: String },

    #[error(
        "{path}: {} conditions are set ({}); exactly one is allowed",
        .keys.len(),
        .keys.join(", ")
    )]
    MultipleConditions { path: String, keys: Vec<String> },

    #[error("{path}: group must have at least one operand")]
    EmptyOperands { path: String },

    #[error("{path}: {field} must not be empty")]
    EmptyList { path: String, field: String },

    #[error("{path}: operator '{operator}' is not allowed here; expected one of: {expected}")]
    InvalidOperator {
        path: String,
        operator: String,
        expected: String,
    },

    #[error("{field}: unsupported value '{value}'; supported values: {supported}")]
    UnsupportedValue {
        field: String,
        value: String,
        supported: String,
    },

    #[error("{field} is required {context}")]
    MissingField { field: String, context: String },

    #[error("{field} must not be set {context}")]
    UnexpectedField { field: String, context: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("unsupported cloud provider '{0}': only AWS accounts can be connected")]
    UnsupportedProvider(String),

    #[error("{path}: unrecognized condition '{key}' in remote expression")]
    UnrecognizedCondition { path: String, key: String },

    #[error("resource_type is {declared} but resource {resource_id} is {actual} in the inventory")]
    ResourceTypeMismatch {
        resource_id: String,
        declared: String,
        actual: String,
    },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn unexpected(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnexpectedField {
            field: field.into(),
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Narrow a document integer into `T`, rejecting anything outside `min..=max`.
///
/// Document integers are 64-bit while the remote service works with 32-bit
/// fields, so every numeric field passes through here before it is sent.
pub fn in_range<T>(field: &str, value: i64, min: T, max: T) -> Result<T>
where
    T: Copy + Into<i64> + TryFrom<i64>,
{
    let (lo, hi) = (min.into(), max.into());
    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        value,
        min: lo,
        max: hi,
    };
    if value < lo || value > hi {
        return Err(out_of_range());
    }
    T::try_from(value).map_err(|_| out_of_range())
}
