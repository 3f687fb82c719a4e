//! # Error Types
//!
//! Structured error types for phys_core. Every failure of a solve is one of
//! four kinds (malformed equation, bad known value, wrong number of unknowns,
//! failed evaluation), each carrying enough context for a caller to prompt
//! the user for the right fix.
//!
//! ## Example
//!
//! ```rust
//! use phys_core::errors::{PhysError, PhysResult};
//!
//! fn require_equals(text: &str) -> PhysResult<()> {
//!     if !text.contains('=') {
//!         return Err(PhysError::format(text, "equation must contain an '=' sign"));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(require_equals("f m a").unwrap_err().error_code(), "FORMAT_ERROR");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for phys_core operations
pub type PhysResult<T> = Result<T, PhysError>;

/// One rejected known value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitIssue {
    /// Lowercased variable name
    pub variable: String,
    /// The value string exactly as supplied
    pub raw: String,
    /// What went wrong
    pub reason: String,
}

impl std::fmt::Display for UnitIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' = '{}': {}", self.variable, self.raw, self.reason)
    }
}

/// Structured error type for solve operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PhysError {
    /// Malformed equation text (missing '=', empty side, illegal character, bad syntax)
    #[error("Invalid equation '{equation}': {reason}")]
    Format { equation: String, reason: String },

    /// One or more known values have an unparseable number or unresolvable unit
    #[error("Invalid known value {}", join_issues(.issues))]
    Unit { issues: Vec<UnitIssue> },

    /// Zero unknowns (nothing to solve) or more than one unknown
    #[error("{reason}")]
    Underdetermined { missing: Vec<String>, reason: String },

    /// The substituted expression could not be evaluated
    #[error("Evaluation failed for '{expression}': {reason}")]
    Evaluation { expression: String, reason: String },

    /// Settings file I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

fn join_issues(issues: &[UnitIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl PhysError {
    /// Create a Format error
    pub fn format(equation: impl Into<String>, reason: impl Into<String>) -> Self {
        PhysError::Format {
            equation: equation.into(),
            reason: reason.into(),
        }
    }

    /// Create a Unit error for a single variable
    pub fn unit(variable: impl Into<String>, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        PhysError::Unit {
            issues: vec![UnitIssue {
                variable: variable.into(),
                raw: raw.into(),
                reason: reason.into(),
            }],
        }
    }

    /// Create an Underdetermined error from the list of variables without a value.
    ///
    /// An empty list means every variable is known and there is nothing to solve.
    pub fn underdetermined(missing: Vec<String>) -> Self {
        let reason = if missing.is_empty() {
            "No unknown variable found: all variables known, nothing to solve".to_string()
        } else {
            format!(
                "Multiple unknown variables found: {}. Supply values for all but one",
                missing.join(", ")
            )
        };
        PhysError::Underdetermined { missing, reason }
    }

    /// Create an Evaluation error
    pub fn evaluation(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        PhysError::Evaluation {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PhysError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Variables named by the error, if any (offending known values or missing unknowns)
    pub fn variables(&self) -> Vec<&str> {
        match self {
            PhysError::Unit { issues } => issues.iter().map(|i| i.variable.as_str()).collect(),
            PhysError::Underdetermined { missing, .. } => missing.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PhysError::Format { .. } => "FORMAT_ERROR",
            PhysError::Unit { .. } => "UNIT_ERROR",
            PhysError::Underdetermined { .. } => "UNDERDETERMINED",
            PhysError::Evaluation { .. } => "EVALUATION_ERROR",
            PhysError::FileError { .. } => "FILE_ERROR",
            PhysError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = PhysError::unit("a", "2 banana", "unknown unit 'banana'");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"Unit\""));
        let roundtrip: PhysError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PhysError::format("x", "y").error_code(), "FORMAT_ERROR");
        assert_eq!(PhysError::underdetermined(vec![]).error_code(), "UNDERDETERMINED");
        assert_eq!(PhysError::evaluation("1/0", "division by zero").error_code(), "EVALUATION_ERROR");
    }

    #[test]
    fn test_underdetermined_messages() {
        let none = PhysError::underdetermined(vec![]);
        assert!(none.to_string().contains("nothing to solve"));

        let many = PhysError::underdetermined(vec!["v".into(), "r".into()]);
        assert!(many.to_string().contains("v, r"));
        assert_eq!(many.variables(), vec!["v", "r"]);
    }

    #[test]
    fn test_unit_error_display_names_variable_and_raw() {
        let error = PhysError::unit("a", "2 banana", "unknown unit 'banana'");
        let message = error.to_string();
        assert!(message.contains("'a'"));
        assert!(message.contains("'2 banana'"));
    }
}
