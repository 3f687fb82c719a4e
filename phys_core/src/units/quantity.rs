//! Magnitudes in base SI units carrying their dimension through arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dimension::Dimension;

/// Why an arithmetic step on quantities was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArithmeticError {
    #[error("cannot {op} '{left}' and '{right}': dimensions differ")]
    Incompatible {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("exponent must be dimensionless, got '{0}'")]
    DimensionedExponent(String),

    #[error("raising '{base}' to {exponent} gives a fractional dimension")]
    FractionalDimension { base: String, exponent: f64 },

    #[error("{function}() needs a dimensionless argument, got '{argument}'")]
    DimensionedArgument {
        function: &'static str,
        argument: String,
    },

    #[error("dimension exponent out of range in '{left}' {op} '{right}'")]
    ExponentOverflow {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("result is not a finite number")]
    NonFinite,
}

/// A value expressed in base SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Magnitude in base units
    pub value: f64,
    pub dimension: Dimension,
}

impl Quantity {
    pub fn new(value: f64, dimension: Dimension) -> Self {
        Quantity { value, dimension }
    }

    pub fn dimensionless(value: f64) -> Self {
        Quantity::new(value, Dimension::DIMENSIONLESS)
    }

    fn finite(self) -> Result<Self, ArithmeticError> {
        if self.value.is_finite() {
            Ok(self)
        } else {
            Err(ArithmeticError::NonFinite)
        }
    }

    pub fn add(self, rhs: Quantity) -> Result<Quantity, ArithmeticError> {
        self.same_dimension("add", rhs)?;
        Quantity::new(self.value + rhs.value, self.dimension).finite()
    }

    pub fn sub(self, rhs: Quantity) -> Result<Quantity, ArithmeticError> {
        self.same_dimension("subtract", rhs)?;
        Quantity::new(self.value - rhs.value, self.dimension).finite()
    }

    pub fn mul(self, rhs: Quantity) -> Result<Quantity, ArithmeticError> {
        let dimension = self
            .dimension
            .checked_mul(rhs.dimension)
            .ok_or_else(|| self.overflow("*", rhs.dimension))?;
        Quantity::new(self.value * rhs.value, dimension).finite()
    }

    pub fn div(self, rhs: Quantity) -> Result<Quantity, ArithmeticError> {
        if rhs.value == 0.0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let dimension = self
            .dimension
            .checked_div(rhs.dimension)
            .ok_or_else(|| self.overflow("/", rhs.dimension))?;
        Quantity::new(self.value / rhs.value, dimension).finite()
    }

    pub fn neg(self) -> Quantity {
        Quantity::new(-self.value, self.dimension)
    }

    pub fn pow(self, exponent: Quantity) -> Result<Quantity, ArithmeticError> {
        if !exponent.dimension.is_dimensionless() {
            return Err(ArithmeticError::DimensionedExponent(
                exponent.dimension.base_unit_string(),
            ));
        }
        self.powf(exponent.value)
    }

    pub fn powf(self, exponent: f64) -> Result<Quantity, ArithmeticError> {
        if self.dimension.overflows_powf(exponent) {
            return Err(ArithmeticError::ExponentOverflow {
                op: "^",
                left: self.dimension.base_unit_string(),
                right: exponent.to_string(),
            });
        }
        let dimension = self
            .dimension
            .powf(exponent)
            .ok_or_else(|| ArithmeticError::FractionalDimension {
                base: self.dimension.base_unit_string(),
                exponent,
            })?;
        if self.value == 0.0 && exponent < 0.0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Quantity::new(self.value.powf(exponent), dimension).finite()
    }

    /// Apply a function that only makes sense on a pure number.
    pub fn map_dimensionless(
        self,
        function: &'static str,
        f: impl Fn(f64) -> f64,
    ) -> Result<Quantity, ArithmeticError> {
        if !self.dimension.is_dimensionless() {
            return Err(ArithmeticError::DimensionedArgument {
                function,
                argument: self.dimension.base_unit_string(),
            });
        }
        Quantity::dimensionless(f(self.value)).finite()
    }

    fn overflow(&self, op: &'static str, rhs: Dimension) -> ArithmeticError {
        ArithmeticError::ExponentOverflow {
            op,
            left: self.dimension.base_unit_string(),
            right: rhs.base_unit_string(),
        }
    }

    fn same_dimension(&self, op: &'static str, rhs: Quantity) -> Result<(), ArithmeticError> {
        if self.dimension == rhs.dimension {
            Ok(())
        } else {
            Err(ArithmeticError::Incompatible {
                op,
                left: self.dimension.base_unit_string(),
                right: rhs.dimension.base_unit_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_combines_dimensions() {
        let mass = Quantity::new(10.0, Dimension::MASS);
        let accel = Quantity::new(2.0, Dimension::mltc(0, 1, -2, 0));
        let force = mass.mul(accel).unwrap();
        assert_eq!(force.value, 20.0);
        assert_eq!(force.dimension, Dimension::mltc(1, 1, -2, 0));
    }

    #[test]
    fn test_add_requires_same_dimension() {
        let mass = Quantity::new(1.0, Dimension::MASS);
        let length = Quantity::new(1.0, Dimension::LENGTH);
        assert!(matches!(
            mass.add(length),
            Err(ArithmeticError::Incompatible { op: "add", .. })
        ));
        assert_eq!(mass.add(mass).unwrap().value, 2.0);
    }

    #[test]
    fn test_division_by_zero() {
        let one = Quantity::dimensionless(1.0);
        assert_eq!(one.div(Quantity::dimensionless(0.0)), Err(ArithmeticError::DivisionByZero));
        assert_eq!(
            Quantity::dimensionless(0.0).powf(-1.0),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_pow_scales_dimension() {
        let speed = Quantity::new(3.0, Dimension::mltc(0, 1, -1, 0));
        let squared = speed.pow(Quantity::dimensionless(2.0)).unwrap();
        assert_eq!(squared.value, 9.0);
        assert_eq!(squared.dimension, Dimension::mltc(0, 2, -2, 0));

        assert!(matches!(
            speed.pow(speed),
            Err(ArithmeticError::DimensionedExponent(_))
        ));
        assert!(matches!(
            speed.powf(0.5),
            Err(ArithmeticError::FractionalDimension { .. })
        ));
    }

    #[test]
    fn test_exponent_overflow() {
        let huge = Quantity::new(1.0, Dimension([0, 100, 0, 0, 0, 0, 0]));
        assert!(matches!(
            huge.mul(huge),
            Err(ArithmeticError::ExponentOverflow { op: "*", .. })
        ));
        let tiny = Quantity::new(1.0, Dimension([0, -100, 0, 0, 0, 0, 0]));
        assert!(matches!(
            tiny.div(huge),
            Err(ArithmeticError::ExponentOverflow { op: "/", .. })
        ));
        let length = Quantity::new(1.0, Dimension::LENGTH);
        assert!(matches!(
            length.powf(200.0),
            Err(ArithmeticError::ExponentOverflow { op: "^", .. })
        ));
        assert!(length.powf(100.0).is_ok());
    }

    #[test]
    fn test_map_dimensionless() {
        let angle = Quantity::dimensionless(0.0);
        assert_eq!(angle.map_dimensionless("sin", f64::sin).unwrap().value, 0.0);

        let length = Quantity::new(1.0, Dimension::LENGTH);
        assert!(length.map_dimensionless("ln", f64::ln).is_err());
        assert_eq!(
            Quantity::dimensionless(-1.0).map_dimensionless("ln", f64::ln),
            Err(ArithmeticError::NonFinite)
        );
    }
}
