//! # Unit System
//!
//! The unit vocabulary: which tokens name which units, how big each unit is
//! relative to the SI base units, and which named unit a result should be
//! reported in.
//!
//! A [`UnitSystem`] is an ordinary immutable value. Build one with
//! [`UnitSystem::si`] and pass it around, or borrow the shared instance from
//! [`UnitSystem::standard`], which is created once per process and never
//! mutated.
//!
//! ## Token resolution
//!
//! A unit token is resolved in this order, stopping at the first hit:
//!
//! 1. exact symbol or name (`kg`, `N`, `newton`, `amps`)
//! 2. plural of a name (`meters`, `joules`)
//! 3. SI prefix + prefixable unit (`km`, `mA`, `kilojoule`, `milliseconds`)
//! 4. steps 1-3 again on the lowercased token (`KG`, `Newton`, `AMPS`)
//!
//! ## Example
//!
//! ```rust
//! use phys_core::units::UnitSystem;
//!
//! let units = UnitSystem::standard();
//! let kmh = units.parse_unit("km/h").unwrap();
//! assert!((kmh.factor - 1000.0 / 3600.0).abs() < 1e-12);
//! assert_eq!(kmh.display, "kilometer / hour");
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::dimension::Dimension;
use super::quantity::Quantity;
use crate::expr::{parse_expr, EvalError, ParseOptions};

static STANDARD: Lazy<UnitSystem> = Lazy::new(UnitSystem::si);

// ============================================================================
// Unit definitions
// ============================================================================

/// One unit of the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    /// Canonical long name, used when rendering (`newton`)
    pub name: String,
    /// Primary symbol (`N`)
    pub symbol: String,
    /// Size of one unit in SI base units
    pub factor: f64,
    pub dimension: Dimension,
    /// Accepts SI prefixes (`kN`, `kilonewton`)
    pub prefixable: bool,
    /// Extra spellings resolved exactly (`amp`, `amps`)
    pub aliases: Vec<String>,
}

impl UnitDef {
    fn new(name: &str, symbol: &str, factor: f64, dimension: Dimension, prefixable: bool) -> Self {
        UnitDef {
            name: name.to_string(),
            symbol: symbol.to_string(),
            factor,
            dimension,
            prefixable,
            aliases: Vec::new(),
        }
    }

    fn alias(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(aliases.iter().map(|a| a.to_string()));
        self
    }
}

/// SI prefixes as (symbol, long name, factor).
const PREFIXES: [(&str, &str, f64); 11] = [
    ("T", "tera", 1e12),
    ("G", "giga", 1e9),
    ("M", "mega", 1e6),
    ("k", "kilo", 1e3),
    ("h", "hecto", 1e2),
    ("d", "deci", 1e-1),
    ("c", "centi", 1e-2),
    ("m", "milli", 1e-3),
    ("u", "micro", 1e-6),
    ("n", "nano", 1e-9),
    ("p", "pico", 1e-12),
];

fn si_units() -> Vec<UnitDef> {
    use Dimension as D;
    let n = D::mltc(1, 1, -2, 0);
    let j = D::mltc(1, 2, -2, 0);
    let w = D::mltc(1, 2, -3, 0);
    let pa = D::mltc(1, -1, -2, 0);

    vec![
        // Base units
        UnitDef::new("kilogram", "kg", 1.0, D::MASS, false).alias(&["kilo", "kilos"]),
        UnitDef::new("gram", "g", 1e-3, D::MASS, true).alias(&["gramme"]),
        UnitDef::new("meter", "m", 1.0, D::LENGTH, true).alias(&["metre"]),
        UnitDef::new("second", "s", 1.0, D::TIME, true).alias(&["sec", "secs"]),
        UnitDef::new("ampere", "A", 1.0, D::CURRENT, true).alias(&["amp", "amps"]),
        UnitDef::new("kelvin", "K", 1.0, D::TEMPERATURE, true),
        UnitDef::new("mole", "mol", 1.0, D::AMOUNT, true),
        UnitDef::new("candela", "cd", 1.0, D::LUMINOSITY, true),
        // Named derived units
        UnitDef::new("newton", "N", 1.0, n, true),
        UnitDef::new("joule", "J", 1.0, j, true),
        UnitDef::new("watt", "W", 1.0, w, true),
        UnitDef::new("volt", "V", 1.0, D::mltc(1, 2, -3, -1), true),
        UnitDef::new("coulomb", "C", 1.0, D::mltc(0, 0, 1, 1), true),
        UnitDef::new("ohm", "ohm", 1.0, D::mltc(1, 2, -3, -2), true),
        UnitDef::new("hertz", "Hz", 1.0, D::mltc(0, 0, -1, 0), true),
        UnitDef::new("pascal", "Pa", 1.0, pa, true),
        UnitDef::new("farad", "F", 1.0, D::mltc(-1, -2, 4, 2), true),
        UnitDef::new("henry", "H", 1.0, D::mltc(1, 2, -2, -2), true).alias(&["henries"]),
        UnitDef::new("tesla", "T", 1.0, D::mltc(1, 0, -2, -1), true),
        UnitDef::new("weber", "Wb", 1.0, D::mltc(1, 2, -2, -1), true),
        UnitDef::new("siemens", "S", 1.0, D::mltc(-1, -2, 3, 2), true),
        // Common non-SI units
        UnitDef::new("minute", "min", 60.0, D::TIME, false).alias(&["mins"]),
        UnitDef::new("hour", "h", 3600.0, D::TIME, false).alias(&["hr", "hrs"]),
        UnitDef::new("day", "day", 86400.0, D::TIME, false),
        UnitDef::new("liter", "L", 1e-3, D::mltc(0, 3, 0, 0), true).alias(&["litre"]),
        UnitDef::new("pound", "lb", 0.453_592_37, D::MASS, false).alias(&["lbs"]),
        UnitDef::new("pound_force", "lbf", 4.448_221_615_260_5, n, false),
        UnitDef::new("foot", "ft", 0.3048, D::LENGTH, false).alias(&["feet"]),
        UnitDef::new("inch", "in", 0.0254, D::LENGTH, false).alias(&["inches"]),
        UnitDef::new("yard", "yd", 0.9144, D::LENGTH, false),
        UnitDef::new("mile", "mi", 1609.344, D::LENGTH, false),
        UnitDef::new("mile_per_hour", "mph", 0.44704, D::mltc(0, 1, -1, 0), false),
        UnitDef::new("kilometer_per_hour", "kph", 1000.0 / 3600.0, D::mltc(0, 1, -1, 0), false)
            .alias(&["kmh"]),
        UnitDef::new("electronvolt", "eV", 1.602_176_634e-19, j, true),
        UnitDef::new("calorie", "cal", 4.184, j, true),
        UnitDef::new("kilowatt_hour", "kWh", 3.6e6, j, false),
        UnitDef::new("bar", "bar", 1e5, pa, true),
        UnitDef::new("atmosphere", "atm", 101_325.0, pa, false),
    ]
}

/// Named units a result may be compacted to, in order of preference.
const COMPACT_NAMES: [&str; 13] = [
    "newton", "joule", "watt", "volt", "coulomb", "ohm", "hertz", "pascal", "farad", "henry",
    "tesla", "weber", "siemens",
];

/// Canonical unit assumed for a bare number, keyed by variable name.
const DEFAULT_UNITS: [(&str, &str); 11] = [
    ("f", "newton"),
    ("e", "joule"),
    ("p", "watt"),
    ("v", "volt"),
    ("q", "coulomb"),
    ("t", "second"),
    ("m", "kilogram"),
    ("a", "meter/second^2"),
    ("s", "meter"),
    ("i", "ampere"),
    ("r", "ohm"),
];

/// Conventional unit a solved variable is reported in.
const FORCED_UNITS: [(&str, &str); 11] = [
    ("f", "newton"),
    ("e", "joule"),
    ("p", "watt"),
    ("v", "volt"),
    ("i", "ampere"),
    ("r", "ohm"),
    ("a", "meter/second^2"),
    ("m", "kilogram"),
    ("t", "second"),
    ("s", "meter"),
    ("q", "coulomb"),
];

// ============================================================================
// Resolved units
// ============================================================================

/// A unit string resolved against the vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedUnit {
    /// Long-form rendering (`kilometer / hour`)
    pub display: String,
    /// Size of one of this unit in SI base units
    pub factor: f64,
    pub dimension: Dimension,
}

impl ResolvedUnit {
    /// `magnitude` of this unit, expressed in base units
    pub fn to_base(&self, magnitude: f64) -> Quantity {
        Quantity::new(magnitude * self.factor, self.dimension)
    }

    /// Base-unit quantity expressed as a magnitude of this unit
    pub fn from_base(&self, quantity: &Quantity) -> Option<f64> {
        (quantity.dimension == self.dimension).then(|| quantity.value / self.factor)
    }
}

// ============================================================================
// Unit system
// ============================================================================

/// Immutable unit vocabulary.
#[derive(Debug, Clone)]
pub struct UnitSystem {
    units: Vec<UnitDef>,
    /// Symbols, matched case-sensitively
    symbols: HashMap<String, usize>,
    /// Long names and aliases
    words: HashMap<String, usize>,
    /// Lowercased symbols; more than one entry means the folding is ambiguous
    folded: HashMap<String, Vec<usize>>,
    defaults: HashMap<String, String>,
    forced: HashMap<String, String>,
}

impl Default for UnitSystem {
    fn default() -> Self {
        UnitSystem::si()
    }
}

impl UnitSystem {
    /// SI vocabulary with common non-SI units.
    pub fn si() -> Self {
        let units = si_units();
        let mut symbols = HashMap::new();
        let mut words = HashMap::new();
        let mut folded: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, unit) in units.iter().enumerate() {
            symbols.insert(unit.symbol.clone(), idx);
            folded.entry(unit.symbol.to_lowercase()).or_default().push(idx);
            words.insert(unit.name.clone(), idx);
            for alias in &unit.aliases {
                words.insert(alias.clone(), idx);
            }
        }
        let table = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(var, unit)| (var.to_string(), unit.to_string()))
                .collect::<HashMap<_, _>>()
        };

        UnitSystem {
            units,
            symbols,
            words,
            folded,
            defaults: table(&DEFAULT_UNITS),
            forced: table(&FORCED_UNITS),
        }
    }

    /// Process-wide shared instance, built on first use.
    pub fn standard() -> &'static UnitSystem {
        &STANDARD
    }

    /// All unit definitions, in vocabulary order
    pub fn units(&self) -> &[UnitDef] {
        &self.units
    }

    /// Default unit for a bare number supplied for `variable`
    pub fn default_unit(&self, variable: &str) -> Option<&str> {
        self.defaults.get(variable).map(String::as_str)
    }

    /// Conventional unit to report a solved `variable` in
    pub fn forced_unit(&self, variable: &str) -> Option<&str> {
        self.forced.get(variable).map(String::as_str)
    }

    /// Resolve a single unit token to (canonical name, factor, dimension).
    ///
    /// Exact case is tried first, then the lowercased token, then symbols
    /// compared without case (`hz`, `KWH`). The last step gives up when the
    /// folding is ambiguous: `mhz` could be milli- or megahertz.
    pub fn lookup(&self, token: &str) -> Option<(String, f64, Dimension)> {
        self.lookup_exact_case(token).or_else(|| {
            let lower = token.to_lowercase();
            if lower != token {
                if let Some(found) = self.lookup_exact_case(&lower) {
                    return Some(found);
                }
            }
            self.lookup_folded(&lower)
        })
    }

    fn lookup_folded(&self, lower: &str) -> Option<(String, f64, Dimension)> {
        if let Some(unit) = self.folded_symbol(lower) {
            return Some((unit.name.clone(), unit.factor, unit.dimension));
        }
        let mut hits = PREFIXES.iter().filter_map(|(symbol, long, factor)| {
            let rest = lower.strip_prefix(symbol.to_lowercase().as_str())?;
            let unit = self.folded_symbol(rest).filter(|unit| unit.prefixable)?;
            Some(prefixed(long, *factor, unit))
        });
        let first = hits.next()?;
        match hits.next() {
            None => Some(first),
            Some(_) => None,
        }
    }

    fn folded_symbol(&self, lower: &str) -> Option<&UnitDef> {
        match self.folded.get(lower).map(Vec::as_slice) {
            Some([only]) => Some(&self.units[*only]),
            _ => None,
        }
    }

    fn lookup_exact_case(&self, token: &str) -> Option<(String, f64, Dimension)> {
        if let Some(unit) = self.find_word_or_symbol(token) {
            return Some((unit.name.clone(), unit.factor, unit.dimension));
        }
        for (symbol, long, factor) in PREFIXES {
            if let Some(rest) = token.strip_prefix(symbol) {
                if let Some(unit) = self.symbols.get(rest).map(|&i| &self.units[i]) {
                    if unit.prefixable {
                        return Some(prefixed(long, factor, unit));
                    }
                }
            }
            if let Some(rest) = token.strip_prefix(long) {
                if let Some(unit) = self.find_word(rest) {
                    if unit.prefixable {
                        return Some(prefixed(long, factor, unit));
                    }
                }
            }
        }
        None
    }

    fn find_word_or_symbol(&self, token: &str) -> Option<&UnitDef> {
        self.symbols
            .get(token)
            .map(|&i| &self.units[i])
            .or_else(|| self.find_word(token))
    }

    /// Long name or alias, allowing a plural `s`.
    fn find_word(&self, token: &str) -> Option<&UnitDef> {
        self.words
            .get(token)
            .or_else(|| {
                token
                    .strip_suffix('s')
                    .filter(|stem| stem.len() > 1)
                    .and_then(|stem| self.words.get(stem))
            })
            .map(|&i| &self.units[i])
    }

    /// Resolve a unit expression such as `m/s^2`, `kg*m^2/s^2` or `N·m`.
    pub fn parse_unit(&self, text: &str) -> Result<ResolvedUnit, String> {
        let normalized = normalize_unit_text(text);
        if normalized.is_empty() {
            return Err("empty unit".to_string());
        }
        let options = ParseOptions {
            reserve_euler: false,
            no_functions: true,
        };
        let ast = parse_expr(&normalized, options)
            .map_err(|e| format!("malformed unit '{}': {}", text.trim(), e))?;

        let resolve = |token: &str| {
            self.lookup(token)
                .map(|(_, factor, dimension)| Quantity::new(factor, dimension))
        };
        let quantity = ast.eval(&resolve).map_err(|e| match e {
            EvalError::Unresolved(token) => format!("unknown unit '{}'", token),
            EvalError::Arithmetic(err) => format!("invalid unit '{}': {}", text.trim(), err),
        })?;

        let display = ast.render_with(&|token| self.lookup(token).map(|(name, _, _)| name));
        Ok(ResolvedUnit {
            display,
            factor: quantity.value,
            dimension: quantity.dimension,
        })
    }

    /// Name a base-unit dimension: a named derived unit when one matches,
    /// otherwise the base-unit rendering.
    pub fn compact(&self, dimension: Dimension) -> String {
        COMPACT_NAMES
            .iter()
            .filter_map(|name| self.words.get(*name).map(|&i| &self.units[i]))
            .find(|unit| unit.dimension == dimension && unit.factor == 1.0)
            .map(|unit| unit.name.clone())
            .unwrap_or_else(|| dimension.base_unit_string())
    }

    /// Markdown table of the vocabulary.
    pub fn markdown_table(&self) -> String {
        let mut md = String::from("| Name | Symbol | Aliases | Factor (SI) | Base units | Prefixes |\n");
        md.push_str("|---|---|---|---|---|---|\n");
        for unit in &self.units {
            md.push_str(&format!(
                "| {} | `{}` | {} | {} | {} | {} |\n",
                unit.name,
                unit.symbol,
                unit.aliases.join(", "),
                unit.factor,
                unit.dimension.base_unit_string(),
                if unit.prefixable { "yes" } else { "no" },
            ));
        }
        md
    }
}

fn prefixed(long: &str, factor: f64, unit: &UnitDef) -> (String, f64, Dimension) {
    (format!("{}{}", long, unit.name), factor * unit.factor, unit.dimension)
}

/// Rewrite typographic unit notation into the expression grammar:
/// `Ω` → `ohm`, `µ` → `u`, `·` → `*`, `²` → `^2`, `per` → `/`, and
/// whitespace between two unit atoms → `*` (`N m` means `N*m`).
pub fn normalize_unit_text(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for ch in text.trim().chars() {
        match ch {
            '\u{3a9}' | '\u{2126}' => s.push_str("ohm"),
            'µ' | 'μ' => s.push('u'),
            '·' | '⋅' | '×' => s.push('*'),
            '²' => s.push_str("^2"),
            '³' => s.push_str("^3"),
            _ => s.push(ch),
        }
    }

    let words: Vec<&str> = s.split_whitespace().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &word) in words.iter().enumerate() {
        let word = if word == "per" { "/" } else { word };
        if i > 0 {
            let prev = out.chars().last();
            let joins = prev.map_or(false, |c| c.is_ascii_alphanumeric() || c == ')')
                && word
                    .chars()
                    .next()
                    .map_or(false, |c| c.is_ascii_alphabetic() || c == '(');
            out.push(if joins { '*' } else { ' ' });
        }
        out.push_str(word);
    }
    out
}
