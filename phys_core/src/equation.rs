//! # Equation Parser
//!
//! Validates a raw equation string and splits it into a left-hand side, a
//! right-hand side and the set of variables it references.
//!
//! ## Rules
//!
//! - exactly one `=`, with a non-empty side on each end
//! - only letters, digits, `_`, whitespace and `+ - * / ^ ( ) . =`
//! - the text is lowercased; `**` is accepted as a spelling of `^`
//! - `sin cos tan log ln sqrt` are functions, never variables
//! - the `e` of a number like `3e8` belongs to the number
//!
//! ## Example
//!
//! ```rust
//! use phys_core::equation::Equation;
//!
//! let eq = Equation::parse("E = m * c^2").unwrap();
//! assert_eq!(eq.left_hand_side, "e");
//! assert_eq!(eq.right_hand_side, "m * c^2");
//! assert_eq!(eq.variables, vec!["e", "m", "c"]);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PhysError, PhysResult};
use crate::expr::{parse_expr, Expr, ParseOptions};

/// A parsed equation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Text exactly as supplied
    pub raw_text: String,
    /// Trimmed, lowercased left side
    pub left_hand_side: String,
    /// Trimmed, lowercased right side with `**` written as `^`
    pub right_hand_side: String,
    /// Referenced variables, deduplicated, in order of first appearance
    pub variables: Vec<String>,
    /// Expression tree of the left side
    pub lhs: Expr,
    /// Expression tree of the right side
    pub rhs: Expr,
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '_' | '+' | '-' | '*' | '/' | '^' | '(' | ')' | '.' | '=')
}

impl Equation {
    /// Parse with `e` treated as a variable.
    pub fn parse(raw: &str) -> PhysResult<Equation> {
        Equation::parse_with(raw, ParseOptions::default())
    }

    /// Parse with explicit identifier options.
    pub fn parse_with(raw: &str, options: ParseOptions) -> PhysResult<Equation> {
        let normalized = raw.trim().to_lowercase().replace("**", "^");

        if let Some(bad) = normalized.chars().find(|&c| !is_allowed(c)) {
            return Err(PhysError::format(raw, format!("invalid character '{}'", bad)));
        }

        let (lhs_text, rhs_text) = match normalized.split_once('=') {
            Some(sides) => sides,
            None => return Err(PhysError::format(raw, "equation must contain an '=' sign")),
        };
        if rhs_text.contains('=') {
            return Err(PhysError::format(raw, "equation must contain exactly one '=' sign"));
        }

        let lhs_text = lhs_text.trim();
        let rhs_text = rhs_text.trim();
        if lhs_text.is_empty() || rhs_text.is_empty() {
            return Err(PhysError::format(raw, "both sides of the equation must be non-empty"));
        }

        let lhs = parse_expr(lhs_text, options)
            .map_err(|e| PhysError::format(raw, format!("left-hand side: {}", e)))?;
        let rhs = parse_expr(rhs_text, options)
            .map_err(|e| PhysError::format(raw, format!("right-hand side: {}", e)))?;

        let mut variables = lhs.variables();
        for var in rhs.variables() {
            if !variables.contains(&var) {
                variables.push(var);
            }
        }

        Ok(Equation {
            raw_text: raw.to_string(),
            left_hand_side: lhs_text.to_string(),
            right_hand_side: rhs_text.to_string(),
            variables,
            lhs,
            rhs,
        })
    }

    /// Whether `name` is referenced anywhere in the equation
    pub fn references(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let eq = Equation::parse("  F = m * a ").unwrap();
        assert_eq!(eq.raw_text, "  F = m * a ");
        assert_eq!(eq.left_hand_side, "f");
        assert_eq!(eq.right_hand_side, "m * a");
        assert_eq!(eq.variables, vec!["f", "m", "a"]);
        assert_eq!(eq.lhs.as_variable(), Some("f"));
    }

    #[test]
    fn test_power_spellings() {
        let caret = Equation::parse("e = m * v^2").unwrap();
        let stars = Equation::parse("e = m * v ** 2").unwrap();
        assert_eq!(caret.right_hand_side, stars.right_hand_side);
        assert_eq!(caret.rhs, stars.rhs);
    }

    #[test]
    fn test_scientific_notation_e_is_not_a_variable() {
        let eq = Equation::parse("f = 3e8 * m").unwrap();
        assert_eq!(eq.variables, vec!["f", "m"]);

        let energy = Equation::parse("e = m * 3e8^2").unwrap();
        assert_eq!(energy.variables, vec!["e", "m"]);
    }

    #[test]
    fn test_functions_are_not_variables() {
        let eq = Equation::parse("y = sqrt(x) + sin(t) + log(z) + ln(w) + cos(u) + tan(v)").unwrap();
        assert_eq!(eq.variables, vec!["y", "x", "t", "z", "w", "u", "v"]);
    }

    #[test]
    fn test_reserved_euler() {
        let options = ParseOptions {
            reserve_euler: true,
            ..Default::default()
        };
        let eq = Equation::parse_with("n = n0 * e^(-k * t)", options).unwrap();
        assert_eq!(eq.variables, vec!["n", "n0", "k", "t"]);
    }

    #[test]
    fn test_arbitrary_lhs_is_tolerated() {
        let eq = Equation::parse("m * a = f").unwrap();
        assert_eq!(eq.left_hand_side, "m * a");
        assert_eq!(eq.variables, vec!["m", "a", "f"]);
        assert_eq!(eq.lhs.as_variable(), None);
    }

    #[test]
    fn test_format_errors() {
        let cases = [
            ("f m a", "'='"),
            ("= m * a", "non-empty"),
            ("f =   ", "non-empty"),
            ("f = m = a", "exactly one"),
            ("f = m * a;", "invalid character ';'"),
            ("f = m $ a", "invalid character '$'"),
            ("f = m * (a", "right-hand side"),
            ("f = 2m", "right-hand side"),
        ];
        for (input, needle) in cases {
            let err = Equation::parse(input).unwrap_err();
            assert_eq!(err.error_code(), "FORMAT_ERROR", "{}", input);
            assert!(err.to_string().contains(needle), "{} -> {}", input, err);
        }
    }
}
