//! Physical dimensions as exponent vectors over the seven SI base quantities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of SI base quantities
pub const BASE_COUNT: usize = 7;

/// Base unit names, in exponent-vector order.
pub const BASE_UNIT_NAMES: [&str; BASE_COUNT] =
    ["kilogram", "meter", "second", "ampere", "kelvin", "mole", "candela"];

/// Exponents of mass, length, time, current, temperature, amount, luminous intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(pub [i8; BASE_COUNT]);

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension([0, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimension = Dimension([1, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimension = Dimension([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Dimension = Dimension([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Dimension = Dimension([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Dimension = Dimension([0, 0, 0, 0, 1, 0, 0]);
    pub const AMOUNT: Dimension = Dimension([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Dimension = Dimension([0, 0, 0, 0, 0, 0, 1]);

    /// Build a dimension from (mass, length, time, current) exponents.
    pub const fn mltc(mass: i8, length: i8, time: i8, current: i8) -> Dimension {
        Dimension([mass, length, time, current, 0, 0, 0])
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// Product of two dimensions, or `None` if an exponent leaves the `i8` range.
    pub fn checked_mul(self, rhs: Dimension) -> Option<Dimension> {
        self.combine(rhs, i8::checked_add)
    }

    /// Quotient of two dimensions, or `None` if an exponent leaves the `i8` range.
    pub fn checked_div(self, rhs: Dimension) -> Option<Dimension> {
        self.combine(rhs, i8::checked_sub)
    }

    fn combine(self, rhs: Dimension, op: fn(i8, i8) -> Option<i8>) -> Option<Dimension> {
        let mut out = self.0;
        for (slot, &r) in out.iter_mut().zip(rhs.0.iter()) {
            *slot = op(*slot, r)?;
        }
        Some(Dimension(out))
    }

    /// True if raising to `exponent` pushes some exponent past the `i8` range.
    pub fn overflows_powf(&self, exponent: f64) -> bool {
        self.0
            .iter()
            .any(|&e| (f64::from(e) * exponent).round().abs() > f64::from(i8::MAX))
    }

    /// Raise to a real power.
    ///
    /// Returns `None` when any resulting exponent is not an integer
    /// (e.g. the square root of a length).
    pub fn powf(&self, exponent: f64) -> Option<Dimension> {
        let mut out = [0i8; BASE_COUNT];
        for (slot, &e) in out.iter_mut().zip(self.0.iter()) {
            let scaled = f64::from(e) * exponent;
            let rounded = scaled.round();
            if (scaled - rounded).abs() > 1e-9 || rounded.abs() > f64::from(i8::MAX) {
                return None;
            }
            *slot = rounded as i8;
        }
        Some(Dimension(out))
    }

    /// Render in base units, e.g. `kilogram * meter / second^2`.
    pub fn base_unit_string(&self) -> String {
        if self.is_dimensionless() {
            return "dimensionless".to_string();
        }
        let render = |name: &str, power: i8| {
            if power == 1 {
                name.to_string()
            } else {
                format!("{}^{}", name, power)
            }
        };
        let numerator: Vec<String> = BASE_UNIT_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, &p)| p > 0)
            .map(|(name, &p)| render(name, p))
            .collect();
        let denominator: Vec<String> = BASE_UNIT_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, &p)| p < 0)
            .map(|(name, &p)| render(name, -p))
            .collect();

        let numerator = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join(" * ")
        };
        if denominator.is_empty() {
            numerator
        } else {
            format!("{} / {}", numerator, denominator.join(" / "))
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_unit_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_dimension() {
        let accel = Dimension::LENGTH
            .checked_div(Dimension::TIME)
            .and_then(|d| d.checked_div(Dimension::TIME))
            .unwrap();
        let force = Dimension::MASS.checked_mul(accel).unwrap();
        assert_eq!(force, Dimension::mltc(1, 1, -2, 0));
        assert_eq!(force.base_unit_string(), "kilogram * meter / second^2");
    }

    #[test]
    fn test_exponent_overflow_is_not_saturated() {
        let big = Dimension([0, 100, 0, 0, 0, 0, 0]);
        assert_eq!(big.checked_mul(big), None);
        assert_eq!(Dimension([0, -100, 0, 0, 0, 0, 0]).checked_div(big), None);
        assert_eq!(
            Dimension([0, 27, 0, 0, 0, 0, 0]).checked_mul(big),
            Some(Dimension([0, 127, 0, 0, 0, 0, 0]))
        );
        assert!(big.overflows_powf(2.0));
        assert!(!big.overflows_powf(1.0));
    }

    #[test]
    fn test_powf() {
        let area = Dimension::mltc(0, 2, 0, 0);
        assert_eq!(area.powf(0.5), Some(Dimension::LENGTH));
        assert_eq!(Dimension::LENGTH.powf(0.5), None);
        assert_eq!(Dimension::TIME.powf(-2.0), Some(Dimension::mltc(0, 0, -2, 0)));
    }

    #[test]
    fn test_base_unit_string_edge_cases() {
        assert_eq!(Dimension::DIMENSIONLESS.base_unit_string(), "dimensionless");
        assert_eq!(Dimension::mltc(0, 0, -1, 0).base_unit_string(), "1 / second");
        assert_eq!(
            Dimension::mltc(1, 2, -3, -2).base_unit_string(),
            "kilogram * meter^2 / second^3 / ampere^2"
        );
    }
}
