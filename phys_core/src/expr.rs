//! # Expression Trees
//!
//! Lexer, recursive-descent parser and evaluator for the small arithmetic
//! language shared by equations (`0.5 * m * v^2`) and unit strings
//! (`kg*m/s^2`).
//!
//! ## Grammar
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?        right-associative
//! primary := NUMBER | IDENT | IDENT '(' expr ')' | '(' expr ')'
//! ```
//!
//! Numbers accept decimal and scientific notation (`3e8`, `1.5E-3`). An
//! identifier glued to the end of a number (`2m`, `3e`) is rejected: there is
//! no implicit multiplication, and the `e` of `3e8` always belongs to the number.
//!
//! ## Example
//!
//! ```rust
//! use phys_core::expr::{parse_expr, ParseOptions};
//!
//! let ast = parse_expr("0.5 * m * v^2", ParseOptions::default()).unwrap();
//! assert_eq!(ast.variables(), vec!["m", "v"]);
//! assert_eq!(ast.to_string(), "0.5 * m * v^2");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::quantity::{ArithmeticError, Quantity};

// ============================================================================
// Functions
// ============================================================================

/// Functions callable from an expression. Their names never count as variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    /// Base-10 logarithm
    Log,
    /// Natural logarithm
    Ln,
    Sqrt,
}

impl Function {
    pub const ALL: [Function; 6] = [
        Function::Sin,
        Function::Cos,
        Function::Tan,
        Function::Log,
        Function::Ln,
        Function::Sqrt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Log => "log",
            Function::Ln => "ln",
            Function::Sqrt => "sqrt",
        }
    }

    pub fn from_name(name: &str) -> Option<Function> {
        Function::ALL.into_iter().find(|f| f.name() == name)
    }

    fn apply(&self, arg: Quantity) -> Result<Quantity, ArithmeticError> {
        match self {
            Function::Sin => arg.map_dimensionless("sin", f64::sin),
            Function::Cos => arg.map_dimensionless("cos", f64::cos),
            Function::Tan => arg.map_dimensionless("tan", f64::tan),
            Function::Log => arg.map_dimensionless("log", f64::log10),
            Function::Ln => arg.map_dimensionless("ln", f64::ln),
            Function::Sqrt => arg.powf(0.5),
        }
    }
}

// ============================================================================
// AST
// ============================================================================

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Variable(String),
    /// Euler's number, only produced when the parser reserves `e`
    Euler,
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

/// Failure while evaluating a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("no value for '{0}'")]
    Unresolved(String),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl Expr {
    /// Variable names in order of first appearance, without duplicates.
    pub fn variables(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Expr::Variable(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Number(_) | Expr::Euler => {}
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.collect_variables(out),
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
        }
    }

    /// The variable name if this node is a bare variable.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Expr::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Evaluate bottom-up, asking `resolve` for the value of each variable.
    pub fn eval<F>(&self, resolve: &F) -> Result<Quantity, EvalError>
    where
        F: Fn(&str) -> Option<Quantity>,
    {
        let q = match self {
            Expr::Number(n) => Quantity::dimensionless(*n),
            Expr::Euler => Quantity::dimensionless(std::f64::consts::E),
            Expr::Variable(name) => {
                resolve(name).ok_or_else(|| EvalError::Unresolved(name.clone()))?
            }
            Expr::Neg(inner) => inner.eval(resolve)?.neg(),
            Expr::Add(l, r) => l.eval(resolve)?.add(r.eval(resolve)?)?,
            Expr::Sub(l, r) => l.eval(resolve)?.sub(r.eval(resolve)?)?,
            Expr::Mul(l, r) => l.eval(resolve)?.mul(r.eval(resolve)?)?,
            Expr::Div(l, r) => l.eval(resolve)?.div(r.eval(resolve)?)?,
            Expr::Pow(l, r) => l.eval(resolve)?.pow(r.eval(resolve)?)?,
            Expr::Call(function, arg) => function.apply(arg.eval(resolve)?)?,
        };
        Ok(q)
    }

    /// Render the tree, replacing each variable for which `substitute`
    /// returns text. Replacement happens per node, so a variable named `m`
    /// never touches the `m` inside another identifier.
    pub fn render_with<F>(&self, substitute: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::new();
        self.write_with(&mut out, substitute);
        out
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(..) => 3,
            Expr::Pow(..) => 4,
            _ => 5,
        }
    }

    fn write_child<F>(&self, out: &mut String, min_precedence: u8, substitute: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.precedence() < min_precedence {
            out.push('(');
            self.write_with(out, substitute);
            out.push(')');
        } else {
            self.write_with(out, substitute);
        }
    }

    fn write_with<F>(&self, out: &mut String, substitute: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let binary = |out: &mut String, l: &Expr, op: &str, r: &Expr, p: u8, right_min: u8| {
            l.write_child(out, p, substitute);
            out.push_str(op);
            r.write_child(out, right_min, substitute);
        };
        match self {
            Expr::Number(n) => out.push_str(&n.to_string()),
            Expr::Euler => out.push('e'),
            Expr::Variable(name) => match substitute(name) {
                Some(text) => out.push_str(&text),
                None => out.push_str(name),
            },
            Expr::Neg(inner) => {
                out.push('-');
                inner.write_child(out, 3, substitute);
            }
            Expr::Add(l, r) => binary(out, l, " + ", r, 1, 1),
            Expr::Sub(l, r) => binary(out, l, " - ", r, 1, 2),
            Expr::Mul(l, r) => binary(out, l, " * ", r, 2, 2),
            Expr::Div(l, r) => binary(out, l, " / ", r, 2, 3),
            Expr::Pow(l, r) => binary(out, l, "^", r, 5, 3),
            Expr::Call(function, arg) => {
                out.push_str(function.name());
                out.push('(');
                arg.write_with(out, substitute);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_with(&|_| None))
    }
}

// ============================================================================
// Lexer
// ============================================================================

/// A syntax error with the byte offset where it was detected.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at position {position}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Ident(name) => format!("'{}'", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Caret => "'^'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
        }
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

/// Longest input accepted, in tokens. Evaluation and rendering recurse over
/// the tree, so its size has to stay bounded.
pub const MAX_TOKENS: usize = 1024;

/// Deepest nesting of parentheses, signs and exponents.
pub const MAX_NESTING: usize = 256;

/// Length of the numeric literal at the start of `bytes`, or 0 if there is none.
///
/// The exponent marker is consumed only when digits follow it, so `3e8` is one
/// literal while `3e` stops before the `e`.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };
    let int_digits = digits(&mut i);
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        let dot = i;
        i += 1;
        frac_digits = digits(&mut i);
        if int_digits == 0 && frac_digits == 0 {
            return dot;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            digits(&mut i);
        }
    }
    i
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, SyntaxError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let token = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' if bytes.get(i + 1) == Some(&b'*') => {
                i += 1;
                Token::Caret
            }
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'^' => Token::Caret,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'0'..=b'9' | b'.' => {
                let len = numeric_prefix_len(&bytes[i..]);
                if len == 0 {
                    return Err(SyntaxError::new(start, "stray '.'"));
                }
                let text = &input[i..i + len];
                let value: f64 = text
                    .parse()
                    .map_err(|_| SyntaxError::new(start, format!("invalid number '{}'", text)))?;
                if !value.is_finite() {
                    return Err(SyntaxError::new(start, format!("number '{}' is out of range", text)));
                }
                i += len;
                if i < bytes.len() && is_ident_start(bytes[i]) {
                    return Err(SyntaxError::new(
                        i,
                        format!("'{}' is glued to the number '{}'", input[i..].chars().next().unwrap_or('?'), text),
                    ));
                }
                tokens.push((start, Token::Number(value)));
                continue;
            }
            c if is_ident_start(c) => {
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                tokens.push((start, Token::Ident(input[start..i].to_string())));
                continue;
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or('?');
                return Err(SyntaxError::new(start, format!("unexpected character '{}'", ch)));
            }
        };
        i += 1;
        tokens.push((start, token));
    }

    if tokens.len() > MAX_TOKENS {
        return Err(SyntaxError::new(
            tokens[MAX_TOKENS].0,
            format!("expression is too long (more than {} tokens)", MAX_TOKENS),
        ));
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

/// Knobs for identifier handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Read a standalone `e` as Euler's number instead of a variable
    pub reserve_euler: bool,
    /// Reject function calls (unit strings have no functions)
    pub no_functions: bool,
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
    options: ParseOptions,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(p, _)| *p).unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::new(
                self.position(),
                format!("expected {}, found {}", what, token.describe()),
            ),
            None => SyntaxError::new(self.end, format!("expected {}, found end of input", what)),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_term()?;
        loop {
            if self.eat(&Token::Plus) {
                lhs = Expr::Add(Box::new(lhs), Box::new(self.parse_term()?));
            } else if self.eat(&Token::Minus) {
                lhs = Expr::Sub(Box::new(lhs), Box::new(self.parse_term()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.eat(&Token::Star) {
                lhs = Expr::Mul(Box::new(lhs), Box::new(self.parse_unary()?));
            } else if self.eat(&Token::Slash) {
                lhs = Expr::Div(Box::new(lhs), Box::new(self.parse_unary()?));
            } else {
                return Ok(lhs);
            }
        }
    }

    // Every recursive path (parentheses, call arguments, signs, exponents)
    // goes through here, so this is where nesting is counted.
    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new(
                self.position(),
                format!("expression nested too deeply (limit {})", MAX_NESTING),
            ));
        }
        self.depth += 1;
        let result = self.parse_signed();
        self.depth -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Plus) {
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_primary()?;
        if self.eat(&Token::Caret) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.unexpected("')'"));
                }
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.parse_identifier(name, position),
            Some(other) => Err(SyntaxError::new(
                position,
                format!("expected a value, found {}", other.describe()),
            )),
            None => Err(SyntaxError::new(self.end, "expected a value, found end of input")),
        }
    }

    fn parse_identifier(&mut self, name: String, position: usize) -> Result<Expr, SyntaxError> {
        let called = self.peek() == Some(&Token::LParen);
        let function = if self.options.no_functions {
            None
        } else {
            Function::from_name(&name)
        };

        match (function, called) {
            (Some(function), true) => {
                self.pos += 1;
                let arg = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.unexpected("')'"));
                }
                Ok(Expr::Call(function, Box::new(arg)))
            }
            (Some(function), false) => Err(SyntaxError::new(
                position,
                format!("function '{}' must be called with parentheses", function.name()),
            )),
            (None, true) => Err(SyntaxError::new(position, format!("unknown function '{}'", name))),
            (None, false) if self.options.reserve_euler && name == "e" => Ok(Expr::Euler),
            (None, false) => Ok(Expr::Variable(name)),
        }
    }
}

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse_expr(input: &str, options: ParseOptions) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
        options,
    };
    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("an operator"));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::dimension::Dimension;

    fn parse(input: &str) -> Expr {
        parse_expr(input, ParseOptions::default()).unwrap()
    }

    fn eval_plain(input: &str) -> f64 {
        parse(input).eval(&|_| None).unwrap().value
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval_plain("1 + 2 * 3"), 7.0);
        assert_eq!(eval_plain("(1 + 2) * 3"), 9.0);
        assert_eq!(eval_plain("2 ^ 3 ^ 2"), 512.0);
        assert_eq!(eval_plain("-2^2"), -4.0);
        assert_eq!(eval_plain("2^-1"), 0.5);
        assert_eq!(eval_plain("8 / 4 / 2"), 1.0);
        assert_eq!(eval_plain("2 ** 3"), 8.0);
    }

    #[test]
    fn test_scientific_notation_is_one_number() {
        let ast = parse("3e8 * t");
        assert_eq!(ast.variables(), vec!["t"]);
        assert_eq!(ast.eval(&|_| Some(Quantity::dimensionless(1.0))).unwrap().value, 3e8);
        assert_eq!(eval_plain("1.5E-3"), 0.0015);
        assert_eq!(eval_plain(".5"), 0.5);
    }

    #[test]
    fn test_identifier_glued_to_number_is_rejected() {
        assert!(parse_expr("2m", ParseOptions::default()).is_err());
        assert!(parse_expr("3e", ParseOptions::default()).is_err());
    }

    #[test]
    fn test_variables_deduplicated_in_order() {
        assert_eq!(parse("m * v * v + m * g * h").variables(), vec!["m", "v", "g", "h"]);
    }

    #[test]
    fn test_functions() {
        assert!((eval_plain("sqrt(16)") - 4.0).abs() < 1e-12);
        assert!((eval_plain("log(1000)") - 3.0).abs() < 1e-12);
        assert!((eval_plain("ln(1)")).abs() < 1e-12);
        assert!(parse("sin(x)").variables() == vec!["x"]);

        assert!(parse_expr("sin * 2", ParseOptions::default()).is_err());
        assert!(parse_expr("foo(2)", ParseOptions::default()).is_err());
    }

    #[test]
    fn test_euler_reservation() {
        assert_eq!(parse("e * 2").variables(), vec!["e"]);

        let reserved = ParseOptions {
            reserve_euler: true,
            ..Default::default()
        };
        let ast = parse_expr("e * 2", reserved).unwrap();
        assert!(ast.variables().is_empty());
        assert!((ast.eval(&|_| None).unwrap().value - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", "1 +", "(1 + 2", "1 2", "* 3", "a $ b", "..5"] {
            assert!(parse_expr(bad, ParseOptions::default()).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_out_of_range_literals_rejected() {
        for bad in ["1e400", "x * 1e309", "-1e400"] {
            let err = parse_expr(bad, ParseOptions::default()).unwrap_err();
            assert!(err.to_string().contains("out of range"), "{}", err);
        }
        assert!(parse_expr("1e300", ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse_expr(&nested(100), ParseOptions::default()).is_ok());

        let err = parse_expr(&nested(300), ParseOptions::default()).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"), "{}", err);

        let signs = format!("{}x", "-".repeat(MAX_NESTING + 1));
        assert!(parse_expr(&signs, ParseOptions::default()).is_err());
    }

    #[test]
    fn test_token_limit() {
        let long = vec!["1"; 2000].join(" + ");
        let err = parse_expr(&long, ParseOptions::default()).unwrap_err();
        assert!(err.to_string().contains("too long"), "{}", err);

        let short = vec!["1"; 100].join(" + ");
        assert_eq!(eval_plain(&short), 100.0);
    }

    #[test]
    fn test_eval_tracks_dimensions() {
        let ast = parse("m * a");
        let q = ast
            .eval(&|name| match name {
                "m" => Some(Quantity::new(10.0, Dimension::MASS)),
                "a" => Some(Quantity::new(2.0, Dimension::mltc(0, 1, -2, 0))),
                _ => None,
            })
            .unwrap();
        assert_eq!(q.value, 20.0);
        assert_eq!(q.dimension, Dimension::mltc(1, 1, -2, 0));

        assert_eq!(
            ast.eval(&|_| None),
            Err(EvalError::Unresolved("m".to_string()))
        );
    }

    #[test]
    fn test_render_substitutes_whole_tokens_only() {
        let ast = parse("mass * m");
        let rendered = ast.render_with(&|name| (name == "m").then(|| "(10 * kilogram)".to_string()));
        assert_eq!(rendered, "mass * (10 * kilogram)");
    }

    #[test]
    fn test_display_minimal_parentheses() {
        assert_eq!(parse("(a + b) * c").to_string(), "(a + b) * c");
        assert_eq!(parse("a - (b - c)").to_string(), "a - (b - c)");
        assert_eq!(parse("(a * b)^2").to_string(), "(a * b)^2");
        assert_eq!(parse("e / t").to_string(), "e / t");
    }
}
