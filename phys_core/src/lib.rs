//! # phys_core - Unit-Aware Equation Solver
//!
//! `phys_core` solves a single physics equation for its one unknown variable,
//! carrying physical units through every step. Known values are given as text
//! with units (`"10 kg"`, `"3e8 m/s"`, `"5Ω"`), normalized to SI base units,
//! substituted into the equation and evaluated with dimension checking. The
//! result is reported in the unit conventionally used for the unknown.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: every request builds its own equation, store and solver
//! - **JSON-First**: equations, known values, solutions and errors serialize
//! - **Rich Errors**: one structured error kind per pipeline stage
//! - **No string eval**: equations become a syntax tree, never executed text
//!
//! ## Quick Start
//!
//! ```rust
//! use phys_core::{solve_text, SolverSettings, UnitSystem};
//!
//! let solution = solve_text(
//!     "e = m * v^2",
//!     [("m", "2 kg"), ("v", "3e8 m/s")],
//!     UnitSystem::standard(),
//!     &SolverSettings::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(solution.to_string(), "e = 1.8e+17 joule");
//! ```
//!
//! ## Modules
//!
//! - [`equation`] - Equation validation and variable extraction
//! - [`expr`] - Expression syntax tree, parser and evaluator
//! - [`store`] - Known values normalized to base units
//! - [`solver`] - Unknown detection, evaluation and unit forcing
//! - [`units`] - Dimensions, quantities and the unit vocabulary
//! - [`config`] - Solver settings and their JSON persistence
//! - [`errors`] - Structured error types

pub mod config;
pub mod equation;
pub mod errors;
pub mod expr;
pub mod solver;
pub mod store;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use config::{load_settings, save_settings, BareNumberPolicy, SolverSettings};
pub use equation::Equation;
pub use errors::{PhysError, PhysResult, UnitIssue};
pub use solver::{solve_equation, solve_text, EquationSolver, Solution, UnitForcingWarning};
pub use store::{KnownValue, VariableStore};
pub use units::{Dimension, Quantity, UnitSystem};
