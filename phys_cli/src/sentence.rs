//! Plain-English problem statements turned into an equation and known values.
//!
//! Only a fixed vocabulary is understood: a physics keyword followed by a
//! value, as in `"mass is 10kg"`, `"speed = 3e8 m/s"` or `"current 2A"`.
//! The set of keywords present picks one of four equation templates.
//!
//! ```text
//! "find the force when mass is 10kg and acceleration is 2m/s^2"
//!     -> ("f = m * a", {m: "10kg", a: "2m/s^2"})
//! ```

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use phys_core::UnitSystem;
use regex::Regex;

/// Keyword → variable symbol.
pub const KEYWORDS: [(&str, &str); 12] = [
    ("mass", "m"),
    ("acceleration", "a"),
    ("force", "f"),
    ("velocity", "v"),
    ("speed", "v"),
    ("displacement", "s"),
    ("time", "t"),
    ("energy", "e"),
    ("power", "p"),
    ("voltage", "v"),
    ("current", "i"),
    ("resistance", "r"),
];

/// An equation template and the keywords that select it. Each inner slice
/// is a set of alternatives, one of which must appear.
pub struct Template {
    pub name: &'static str,
    pub equation: &'static str,
    pub keywords: &'static [&'static [&'static str]],
}

pub static TEMPLATES: [Template; 4] = [
    Template {
        name: "Newton's second law",
        equation: "f = m * a",
        keywords: &[&["force"], &["mass"], &["acceleration"]],
    },
    Template {
        name: "mass-energy",
        equation: "e = m * v^2",
        keywords: &[&["energy"], &["mass"], &["speed", "velocity"]],
    },
    Template {
        name: "Ohm's law",
        equation: "v = i * r",
        keywords: &[&["voltage"], &["current"], &["resistance"]],
    },
    Template {
        name: "power-energy-time",
        equation: "p = e / t",
        keywords: &[&["power"], &["energy"], &["time"]],
    },
];

/// What was understood from a sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSentence {
    /// Matching template, if the keywords selected one
    pub template: Option<&'static Template>,
    /// Variable symbol → value string
    pub knowns: BTreeMap<String, String>,
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.equation == other.equation
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.equation)
    }
}

fn keyword_alternation() -> String {
    KEYWORDS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join("|")
}

// A keyword anywhere in the sentence, as a whole word.
static KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", keyword_alternation()))
        .expect("Failed to compile keyword pattern")
});

// `<keyword> [is|=] <number>[<unit>]` with the unit glued to the number.
// The exponent group needs digits after `e`, so `3e8m/s` keeps its exponent.
static KEYWORD_VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({})\b\s*(?:is\s+|=\s*)?([+-]?(?:\d+\.?\d*|\.\d+)(?:e[+-]?\d+)?)([a-z/^*\d]+)?",
        keyword_alternation()
    ))
    .expect("Failed to compile keyword value pattern")
});

// The word right after a value, read separately so the value match never
// swallows the next keyword.
static NEXT_WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[ \t]+([a-z][a-z/^*\d]*)").expect("Failed to compile next word pattern")
});

fn symbol_for(keyword: &str) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(keyword))
        .map(|(_, symbol)| *symbol)
}

fn trim_operators(unit: &str) -> &str {
    unit.trim_end_matches(['/', '^', '*'])
}

/// Extract known values and pick a template.
///
/// The first value given for a symbol wins. Values keep the case they were
/// written in (`mA` vs `MA`).
pub fn parse_sentence(sentence: &str) -> ParsedSentence {
    let mut knowns = BTreeMap::new();

    for caps in KEYWORD_VALUE_PATTERN.captures_iter(sentence) {
        let Some(symbol) = caps.get(1).and_then(|k| symbol_for(k.as_str())) else {
            continue;
        };
        if knowns.contains_key(symbol) {
            continue;
        }
        let number = caps.get(2).map_or("", |m| m.as_str());
        let end = caps.get(0).map_or(sentence.len(), |m| m.end());
        let next_word = NEXT_WORD_PATTERN
            .captures(&sentence[end..])
            .and_then(|c| c.get(1))
            .map(|m| trim_operators(m.as_str()))
            .filter(|word| UnitSystem::standard().parse_unit(word).is_ok());
        let value = match (caps.get(3), next_word) {
            (Some(glued), _) => format!("{}{}", number, trim_operators(glued.as_str())),
            (None, Some(word)) => format!("{} {}", number, word),
            (None, None) => number.to_string(),
        };
        knowns.insert(symbol.to_string(), value);
    }

    let present: HashSet<String> = KEYWORD_PATTERN
        .find_iter(sentence)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();
    let template = TEMPLATES.iter().find(|template| {
        template
            .keywords
            .iter()
            .all(|alternatives| alternatives.iter().any(|k| present.contains(*k)))
    });

    log::debug!(
        "sentence matched {:?} with knowns {:?}",
        template.map(|t| t.equation),
        knowns
    );
    ParsedSentence { template, knowns }
}
