//! # Equation Solver
//!
//! Finds the one variable without a value, evaluates the other side of the
//! equation with every known value substituted as a base-unit quantity, and
//! reports the result in a physically conventional unit.
//!
//! ## Pipeline
//!
//! 1. `missing = equation.variables - known variables`; exactly one allowed
//! 2. the unknown must stand alone on one side; the other side is evaluated
//! 3. known values enter the tree as (magnitude, dimension) quantities, so
//!    `+`/`-` check dimensions, `*`/`/` combine them and `^` scales them
//! 4. the result is compacted to a named unit (`newton`) or base units
//! 5. when the unknown has a conventional unit (`f` → newton) the result is
//!    forced into it; a dimension mismatch falls back to the compacted unit
//!    and is reported as a [`UnitForcingWarning`]
//! 6. the magnitude is rounded to 2 decimal places
//!
//! ## Example
//!
//! ```rust
//! use phys_core::solver::solve_equation;
//!
//! let answer = solve_equation("f = m * a", [("m", "10 kg"), ("a", "2 m/s^2")]);
//! assert_eq!(answer, "f = 20.0 newton");
//!
//! let error = solve_equation("v = i * r", [("i", "2 ampere")]);
//! assert!(error.starts_with("Error: "));
//! ```

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::SolverSettings;
use crate::equation::Equation;
use crate::errors::{PhysError, PhysResult};
use crate::expr::{EvalError, Expr, ParseOptions};
use crate::store::VariableStore;
use crate::units::{Quantity, UnitSystem};

/// Decimal places in a reported result
pub const RESULT_DECIMALS: i32 = 2;

/// The conventional unit could not hold the computed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitForcingWarning {
    pub variable: String,
    /// Unit the variable is conventionally reported in
    pub forced_unit: String,
    /// Unit actually reported
    pub fallback_unit: String,
    pub reason: String,
}

impl fmt::Display for UnitForcingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not report '{}' in {} ({}); using {}",
            self.variable, self.forced_unit, self.reason, self.fallback_unit
        )
    }
}

/// A solved unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub unknown: String,
    /// Magnitude in `unit`, rounded to [`RESULT_DECIMALS`]
    pub value: f64,
    pub unit: String,
    /// Unrounded magnitude in base units
    pub base_value: f64,
    /// Compacted base unit of the result
    pub base_unit: String,
    /// The evaluated side with known values substituted
    pub substituted: String,
    pub warnings: Vec<UnitForcingWarning>,
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} {}", self.unknown, format_magnitude(self.value), self.unit)
    }
}

/// Solver for one request. Borrows everything; holds no state of its own.
pub struct EquationSolver<'a> {
    equation: &'a Equation,
    store: &'a VariableStore,
    units: &'a UnitSystem,
    settings: &'a SolverSettings,
}

impl<'a> EquationSolver<'a> {
    pub fn new(
        equation: &'a Equation,
        store: &'a VariableStore,
        units: &'a UnitSystem,
        settings: &'a SolverSettings,
    ) -> Self {
        EquationSolver {
            equation,
            store,
            units,
            settings,
        }
    }

    /// Referenced variables that have a value
    pub fn known_variables(&self) -> Vec<&'a str> {
        self.equation
            .variables
            .iter()
            .filter(|v| self.store.contains(v))
            .map(String::as_str)
            .collect()
    }

    /// Referenced variables without a value, in order of appearance
    pub fn missing_variables(&self) -> Vec<&'a str> {
        self.equation
            .variables
            .iter()
            .filter(|v| !self.store.contains(v))
            .map(String::as_str)
            .collect()
    }

    /// The single variable without a value.
    pub fn find_unknown(&self) -> PhysResult<&'a str> {
        match self.missing_variables().as_slice() {
            [unknown] => Ok(*unknown),
            missing => Err(PhysError::underdetermined(
                missing.iter().map(|v| v.to_string()).collect(),
            )),
        }
    }

    /// Unit the unknown is expected to be reported in, if it has one
    pub fn expected_unit(&self, unknown: &str) -> Option<&'a str> {
        self.units.forced_unit(unknown)
    }

    /// Render `side` with every known variable replaced by
    /// `(magnitude * base unit)`, or the bare magnitude for a pure number.
    pub fn substituted_expression(&self, side: &Expr) -> String {
        side.render_with(&|name| {
            let quantity = self.store.quantity(name)?;
            if !quantity.dimension.is_dimensionless() {
                let (value, unit) = self.store.get_converted(name)?;
                Some(format!("({} * {})", value, unit))
            } else if quantity.value < 0.0 {
                Some(format!("({})", quantity.value))
            } else {
                Some(quantity.value.to_string())
            }
        })
    }

    /// Pick the side to evaluate: the one opposite the isolated unknown.
    fn side_to_evaluate(&self, unknown: &str) -> PhysResult<&'a Expr> {
        let eq = self.equation;
        if eq.lhs.as_variable() == Some(unknown) {
            Ok(&eq.rhs)
        } else if eq.rhs.as_variable() == Some(unknown) {
            Ok(&eq.lhs)
        } else {
            Err(PhysError::evaluation(
                eq.raw_text.trim(),
                format!(
                    "unknown '{}' is not isolated on one side of the equation; rearrange it first",
                    unknown
                ),
            ))
        }
    }

    /// Solve for the unknown.
    ///
    /// # Errors
    ///
    /// - `PhysError::Underdetermined` when zero or several variables lack a value
    /// - `PhysError::Evaluation` when the unknown is not isolated, appears on
    ///   both sides, or the arithmetic fails (dimension mismatch in `+`/`-`,
    ///   division by zero, non-finite result)
    pub fn solve(&self) -> PhysResult<Solution> {
        let unknown = self.find_unknown()?;
        let expected = self.expected_unit(unknown);
        debug!(
            "solving '{}' for {} (expected unit: {})",
            self.equation.raw_text.trim(),
            unknown,
            expected.unwrap_or("none")
        );

        for known in self.store.known_variables() {
            if !self.equation.references(known) {
                warn!("ignoring known '{}': not referenced by the equation", known);
            }
        }

        let side = self.side_to_evaluate(unknown)?;
        let substituted = self.substituted_expression(side);
        debug!("substituted: {}", substituted);

        let result = side
            .eval(&|name| self.store.quantity(name))
            .map_err(|e| match e {
                EvalError::Unresolved(name) if name == unknown => PhysError::evaluation(
                    side.to_string(),
                    format!("unknown '{}' appears on both sides of the equation", unknown),
                ),
                other => PhysError::evaluation(side.to_string(), other.to_string()),
            })?;

        let base_unit = self.units.compact(result.dimension);
        let mut warnings = Vec::new();
        let (value, unit) = match expected.filter(|_| self.settings.force_conventional_units) {
            Some(forced) => match self.force_unit(unknown, forced, &result, &base_unit) {
                Ok(converted) => converted,
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                    (result.value, base_unit.clone())
                }
            },
            None => (result.value, base_unit.clone()),
        };

        Ok(Solution {
            unknown: unknown.to_string(),
            value: round_to(value, RESULT_DECIMALS),
            unit,
            base_value: result.value,
            base_unit,
            substituted,
            warnings,
        })
    }

    fn force_unit(
        &self,
        unknown: &str,
        forced: &str,
        result: &Quantity,
        fallback: &str,
    ) -> Result<(f64, String), UnitForcingWarning> {
        let warning = |reason: String| UnitForcingWarning {
            variable: unknown.to_string(),
            forced_unit: forced.to_string(),
            fallback_unit: fallback.to_string(),
            reason,
        };
        let target = self.units.parse_unit(forced).map_err(&warning)?;
        match target.from_base(result) {
            Some(value) => Ok((value, target.display)),
            None => Err(warning(format!(
                "result has dimension {}, {} has {}",
                result.dimension, target.display, target.dimension
            ))),
        }
    }
}

/// Parse, build the store and solve in one call.
pub fn solve_text<I, K, V>(
    equation_text: &str,
    knowns: I,
    units: &UnitSystem,
    settings: &SolverSettings,
) -> PhysResult<Solution>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let options = ParseOptions {
        reserve_euler: settings.reserve_euler,
        ..ParseOptions::default()
    };
    let equation = Equation::parse_with(equation_text, options)?;
    let store = VariableStore::build(knowns, units, settings)?;
    EquationSolver::new(&equation, &store, units, settings).solve()
}

/// String-in, string-out entry point for front ends.
///
/// Returns `"<unknown> = <value> <unit>"`, or `"Error: <message>"` on any
/// failure. Uses the shared unit system and default settings.
pub fn solve_equation<I, K, V>(equation_text: &str, knowns: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    match solve_text(
        equation_text,
        knowns,
        UnitSystem::standard(),
        &SolverSettings::default(),
    ) {
        Ok(solution) => solution.to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // Beyond 2^53 / scale there are no fractional digits left to round.
    if value.abs() >= 9.0e15 / scale {
        return value;
    }
    (value * scale).round() / scale + 0.0
}

/// Render like `20.0`, `3.14`, `1.8e+17`.
pub fn format_magnitude(value: f64) -> String {
    let value = value + 0.0;
    if value != 0.0 && value.abs() >= 1e16 {
        let sci = format!("{:e}", value);
        match sci.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => sci,
        }
    } else {
        format!("{:?}", value)
    }
}
