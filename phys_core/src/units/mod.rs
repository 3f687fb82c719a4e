//! # Units and Dimensional Analysis
//!
//! Every physical value inside phys_core is a [`Quantity`]: a magnitude in SI
//! base units plus a [`Dimension`] exponent vector over the seven base
//! quantities (mass, length, time, current, temperature, amount, luminous
//! intensity). Arithmetic on quantities checks dimensions, so adding a mass
//! to a length is an error rather than a wrong number.
//!
//! ## Modules
//!
//! - [`dimension`] - Exponent vectors and their base-unit rendering
//! - [`quantity`] - Checked arithmetic on base-unit values
//! - [`registry`] - The unit vocabulary ([`UnitSystem`])

pub mod dimension;
pub mod quantity;
pub mod registry;

pub use dimension::Dimension;
pub use quantity::{ArithmeticError, Quantity};
pub use registry::{ResolvedUnit, UnitDef, UnitSystem};
