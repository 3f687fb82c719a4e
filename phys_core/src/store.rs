//! # Unit-Aware Variable Store
//!
//! Turns the caller's known values (`"10kg"`, `"2 m/s^2"`, `"5"`) into
//! quantities in SI base units.
//!
//! Each value is a number followed, with or without a space, by a unit
//! expression. The number may use scientific notation; the `e` in `3e8` is
//! part of the number, so `"3e8m/s"` reads as 3×10⁸ meter/second. A bare
//! number is handled according to [`BareNumberPolicy`].
//!
//! Every entry is checked; when some are bad the build fails once, listing
//! all of them.
//!
//! ## Example
//!
//! ```rust
//! use phys_core::config::SolverSettings;
//! use phys_core::store::VariableStore;
//! use phys_core::units::UnitSystem;
//!
//! let store = VariableStore::build(
//!     [("m", "500 g"), ("A", "2 m/s^2")],
//!     UnitSystem::standard(),
//!     &SolverSettings::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(store.get_converted("m"), Some((0.5, "kilogram")));
//! assert_eq!(store.as_dict()["a"], 2.0);
//! ```

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{BareNumberPolicy, SolverSettings};
use crate::errors::{PhysError, PhysResult, UnitIssue};
use crate::units::{Dimension, Quantity, ResolvedUnit, UnitSystem};

/// One known value, as supplied and in base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownValue {
    /// Lowercased variable name
    pub variable_name: String,
    /// Value string exactly as supplied
    pub raw_string: String,
    /// Number as written
    pub magnitude: f64,
    /// Unit as written, spelled out (`kilometer / hour`)
    pub unit: String,
    /// Size of one `unit` in base units
    pub unit_factor: f64,
    /// The unit was not written and came from the bare-number policy
    pub unit_defaulted: bool,
    pub base_magnitude: f64,
    /// Base-unit name: a named SI unit when one matches (`joule`), else the
    /// base-unit rendering (`meter / second^2`)
    pub base_unit: String,
    pub dimension: Dimension,
}

impl KnownValue {
    pub fn quantity(&self) -> Quantity {
        Quantity::new(self.base_magnitude, self.dimension)
    }

    /// Convert the base magnitude back into the unit it was written in.
    pub fn magnitude_from_base(&self) -> f64 {
        self.base_magnitude / self.unit_factor
    }
}

/// Known values of one solve request, keyed by lowercase variable name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    values: BTreeMap<String, KnownValue>,
}

impl VariableStore {
    /// Parse and convert every known value.
    ///
    /// # Errors
    ///
    /// `PhysError::Unit` listing every entry with an empty or non-identifier
    /// name, a duplicate name, a missing or unparseable number, an unknown
    /// unit, or a bare number under [`BareNumberPolicy::Reject`].
    pub fn build<I, K, V>(inputs: I, units: &UnitSystem, settings: &SolverSettings) -> PhysResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = BTreeMap::new();
        let mut issues = Vec::new();

        for (name, raw) in inputs {
            let name = name.as_ref().trim().to_lowercase();
            let raw = raw.as_ref();
            let issue = |reason: String| UnitIssue {
                variable: name.clone(),
                raw: raw.to_string(),
                reason,
            };

            if !is_identifier(&name) {
                issues.push(issue("not a valid variable name".to_string()));
                continue;
            }
            if values.contains_key(&name) {
                issues.push(issue("value supplied more than once".to_string()));
                continue;
            }
            match parse_known(&name, raw, units, settings) {
                Ok(known) => {
                    debug!(
                        "known {} = '{}' -> {} {}",
                        name, raw, known.base_magnitude, known.base_unit
                    );
                    values.insert(name, known);
                }
                Err(reason) => issues.push(issue(reason)),
            }
        }

        if issues.is_empty() {
            Ok(VariableStore { values })
        } else {
            issues.sort_by(|a, b| a.variable.cmp(&b.variable));
            Err(PhysError::Unit { issues })
        }
    }

    /// The value as supplied
    pub fn get_original(&self, var: &str) -> Option<&KnownValue> {
        self.values.get(var)
    }

    /// (base magnitude, base unit) for a variable
    pub fn get_converted(&self, var: &str) -> Option<(f64, &str)> {
        self.values
            .get(var)
            .map(|k| (k.base_magnitude, k.base_unit.as_str()))
    }

    /// Base-unit quantity for a variable
    pub fn quantity(&self, var: &str) -> Option<Quantity> {
        self.values.get(var).map(KnownValue::quantity)
    }

    /// Base magnitudes only
    pub fn as_dict(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(name, k)| (name.clone(), k.base_magnitude))
            .collect()
    }

    pub fn contains(&self, var: &str) -> bool {
        self.values.contains_key(var)
    }

    /// Known variable names, sorted
    pub fn known_variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Number, optionally in scientific notation, then whatever unit text follows.
// The exponent group only matches when digits follow `e`, so `3e8m/s` splits
// as (3e8, m/s) while `2eV` splits as (2, eV).
static VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*(?s)(.*?)\s*$")
        .expect("Failed to compile value pattern")
});

/// Split `"3e8m/s"` into `(3e8, "m/s")`. The unit part is trimmed and may be empty.
pub fn split_value(raw: &str) -> Result<(f64, &str), String> {
    if raw.trim().is_empty() {
        return Err("empty value".to_string());
    }
    let caps = VALUE_PATTERN
        .captures(raw)
        .ok_or_else(|| "value must start with a number".to_string())?;
    let number = caps.get(1).map_or("", |m| m.as_str());
    let unit = caps.get(2).map_or("", |m| m.as_str());
    let magnitude: f64 = number
        .parse()
        .map_err(|_| format!("invalid number '{}'", number))?;
    Ok((magnitude, unit))
}

fn parse_known(
    name: &str,
    raw: &str,
    units: &UnitSystem,
    settings: &SolverSettings,
) -> Result<KnownValue, String> {
    let (magnitude, unit_text) = split_value(raw)?;

    let (resolved, unit_defaulted) = if unit_text.is_empty() {
        let resolved = match settings.bare_numbers {
            BareNumberPolicy::Reject => {
                return Err("a unit is required (bare numbers are rejected)".to_string());
            }
            BareNumberPolicy::CanonicalUnit => match units.default_unit(name) {
                Some(default) => units.parse_unit(default)?,
                None => dimensionless(),
            },
            BareNumberPolicy::Dimensionless => dimensionless(),
        };
        (resolved, true)
    } else {
        (units.parse_unit(unit_text)?, false)
    };

    let base = resolved.to_base(magnitude);
    if !base.value.is_finite() {
        return Err("value overflows when converted to base units".to_string());
    }

    Ok(KnownValue {
        variable_name: name.to_string(),
        raw_string: raw.to_string(),
        magnitude,
        unit: resolved.display,
        unit_factor: resolved.factor,
        unit_defaulted,
        base_magnitude: base.value,
        base_unit: units.compact(base.dimension),
        dimension: base.dimension,
    })
}

fn dimensionless() -> ResolvedUnit {
    ResolvedUnit {
        display: "dimensionless".to_string(),
        factor: 1.0,
        dimension: Dimension::DIMENSIONLESS,
    }
}
