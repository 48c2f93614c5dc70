// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Length expressions.
//!
//! A sequence's element count never travels on the wire; it is computed from
//! fields decoded earlier in the same record. The accepted language is small:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/' | '%') factor)*
//! factor := INTEGER | IDENT | '(' expr ')'
//! ```
//!
//! Evaluation is unsigned 64-bit with checked arithmetic.

use crate::error::TypeError;
use std::fmt;
use thiserror::Error;

/// Binary operator of a length expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Name of the matching `u64::checked_*` method.
    pub fn checked_method(self) -> &'static str {
        match self {
            Self::Add => "checked_add",
            Self::Sub => "checked_sub",
            Self::Mul => "checked_mul",
            Self::Div => "checked_div",
            Self::Rem => "checked_rem",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Rem => 2,
        }
    }

    fn apply(self, lhs: u64, rhs: u64) -> Result<u64, EvalError> {
        let out = match self {
            Self::Add => lhs.checked_add(rhs),
            Self::Sub => lhs.checked_sub(rhs),
            Self::Mul => lhs.checked_mul(rhs),
            Self::Div | Self::Rem if rhs == 0 => return Err(EvalError::DivisionByZero),
            Self::Div => lhs.checked_div(rhs),
            Self::Rem => lhs.checked_rem(rhs),
        };
        out.ok_or(EvalError::Overflow {
            op: self.symbol(),
            lhs,
            rhs,
        })
    }
}

/// Runtime failure while evaluating a length expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{lhs} {op} {rhs} overflows u64")]
    Overflow { op: &'static str, lhs: u64, rhs: u64 },

    #[error("division by zero")]
    DivisionByZero,
}

/// Parsed length expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LenExpr {
    Const(u64),
    Field(String),
    Binary(BinOp, Box<LenExpr>, Box<LenExpr>),
}

impl LenExpr {
    /// Parse and validate an expression.
    ///
    /// Comment-like sequences (`//`, `/*`, `*/`) are rejected before
    /// tokenizing; everything else must match the grammar exactly.
    pub fn parse(src: &str) -> Result<Self, TypeError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(TypeError::schema("empty length expression"));
        }
        reject_comments(src)?;

        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some((at, tok)) => Err(TypeError::schema(format!(
                "unexpected {tok} at char {at} in length expression '{src}'"
            ))),
        }
    }

    /// Referenced field names, in order of appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Const(_) => {}
            Self::Field(name) => out.push(name),
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_fields(out);
                rhs.collect_fields(out);
            }
        }
    }

    /// Value of the expression when it references no field.
    pub fn as_const(&self) -> Option<u64> {
        match self {
            Self::Const(v) => Some(*v),
            Self::Field(_) => None,
            Self::Binary(op, lhs, rhs) => op.apply(lhs.as_const()?, rhs.as_const()?).ok(),
        }
    }

    /// Evaluate with `lookup` resolving field references.
    pub fn eval<F>(&self, lookup: &mut F) -> Result<u64, EvalError>
    where
        F: FnMut(&str) -> Option<u64>,
    {
        match self {
            Self::Const(v) => Ok(*v),
            Self::Field(name) => lookup(name).ok_or_else(|| EvalError::UnknownField(name.clone())),
            Self::Binary(op, lhs, rhs) => {
                let l = lhs.eval(lookup)?;
                let r = rhs.eval(lookup)?;
                op.apply(l, r)
            }
        }
    }

    /// Render as a Rust expression of type `Option<u64>`.
    ///
    /// `field` must return an expression of type `u64` for a field name.
    /// Arithmetic uses `checked_*`, so any overflow or zero divisor yields
    /// `None`.
    pub fn render_checked(&self, field: &dyn Fn(&str) -> String) -> String {
        match self {
            Self::Binary(..) => format!(
                "(|| -> ::std::option::Option<u64> {{ ::std::option::Option::Some({}) }})()",
                self.render_chain(field)
            ),
            leaf => format!("::std::option::Option::Some({})", leaf.render_chain(field)),
        }
    }

    fn render_chain(&self, field: &dyn Fn(&str) -> String) -> String {
        match self {
            Self::Const(v) => format!("{v}u64"),
            Self::Field(name) => field(name),
            Self::Binary(op, lhs, rhs) => format!(
                "{}.{}({})?",
                lhs.render_chain(field),
                op.checked_method(),
                rhs.render_chain(field)
            ),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Binary(op, ..) => op.precedence(),
            _ => 3,
        }
    }
}

impl fmt::Display for LenExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Field(name) => f.write_str(name),
            Self::Binary(op, lhs, rhs) => {
                let prec = op.precedence();
                if lhs.precedence() < prec {
                    write!(f, "({lhs})")?;
                } else {
                    write!(f, "{lhs}")?;
                }
                write!(f, " {} ", op.symbol())?;
                if rhs.precedence() <= prec {
                    write!(f, "({rhs})")
                } else {
                    write!(f, "{rhs}")
                }
            }
        }
    }
}

fn reject_comments(src: &str) -> Result<(), TypeError> {
    let bytes = src.as_bytes();
    for (i, pair) in bytes.windows(2).enumerate() {
        if matches!(pair, b"//" | b"/*" | b"*/") {
            return Err(TypeError::schema(format!(
                "comments are not allowed within length expressions (at char {i})"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(u64),
    Ident(String),
    Op(BinOp),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "integer {v}"),
            Self::Ident(name) => write!(f, "identifier '{name}'"),
            Self::Op(op) => write!(f, "'{}'", op.symbol()),
            Self::Open => f.write_str("'('"),
            Self::Close => f.write_str("')'"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, TypeError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let tok = match c {
            _ if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Op(BinOp::Add),
            '-' => Token::Op(BinOp::Sub),
            '*' => Token::Op(BinOp::Mul),
            '/' => Token::Op(BinOp::Div),
            '%' => Token::Op(BinOp::Rem),
            '(' => Token::Open,
            ')' => Token::Close,
            '0'..='9' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
                out.push((start, Token::Int(parse_int(&text, start)?)));
                continue;
            }
            _ if c == '_' || c.is_ascii_alphabetic() => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                out.push((start, Token::Ident(chars[start..i].iter().collect())));
                continue;
            }
            other => {
                return Err(TypeError::schema(format!(
                    "unexpected character '{other}' at char {start} in length expression"
                )))
            }
        };
        out.push((start, tok));
        i += 1;
    }
    Ok(out)
}

fn parse_int(text: &str, at: usize) -> Result<u64, TypeError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|_| TypeError::schema(format!("invalid integer literal '{text}' at char {at}")))
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expr(&mut self) -> Result<LenExpr, TypeError> {
        let mut lhs = self.term()?;
        while let Some((_, Token::Op(op @ (BinOp::Add | BinOp::Sub)))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.term()?;
            lhs = LenExpr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<LenExpr, TypeError> {
        let mut lhs = self.factor()?;
        while let Some((_, Token::Op(op @ (BinOp::Mul | BinOp::Div | BinOp::Rem)))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = LenExpr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<LenExpr, TypeError> {
        match self.next() {
            Some((_, Token::Int(v))) => Ok(LenExpr::Const(v)),
            Some((_, Token::Ident(name))) => Ok(LenExpr::Field(name)),
            Some((at, Token::Open)) => {
                let inner = self.expr()?;
                match self.next() {
                    Some((_, Token::Close)) => Ok(inner),
                    _ => Err(TypeError::schema(format!(
                        "unclosed '(' at char {at} in length expression"
                    ))),
                }
            }
            Some((at, tok)) => Err(TypeError::schema(format!(
                "unexpected {tok} at char {at} in length expression"
            ))),
            None => Err(TypeError::schema("length expression ends unexpectedly")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with(expr: &LenExpr, vars: &[(&str, u64)]) -> Result<u64, EvalError> {
        expr.eval(&mut |name| vars.iter().find(|(n, _)| *n == name).map(|(_, v)| *v))
    }

    #[test]
    fn test_parse_field_reference() {
        let expr = LenExpr::parse("count").expect("parse");
        assert_eq!(expr, LenExpr::Field("count".into()));
        assert_eq!(expr.fields(), vec!["count"]);
    }

    #[test]
    fn test_precedence_and_eval() {
        let expr = LenExpr::parse("n + 2 * m").expect("parse");
        assert_eq!(eval_with(&expr, &[("n", 1), ("m", 3)]), Ok(7));
        assert_eq!(expr.to_string(), "n + 2 * m");

        let expr = LenExpr::parse("(n + 2) * m").expect("parse");
        assert_eq!(eval_with(&expr, &[("n", 1), ("m", 3)]), Ok(9));
        assert_eq!(expr.to_string(), "(n + 2) * m");
    }

    #[test]
    fn test_left_associative_subtraction() {
        let expr = LenExpr::parse("10 - 3 - 2").expect("parse");
        assert_eq!(expr.as_const(), Some(5));
        assert_eq!(expr.to_string(), "10 - 3 - 2");

        let expr = LenExpr::parse("10 - (3 - 2)").expect("parse");
        assert_eq!(expr.as_const(), Some(9));
        assert_eq!(expr.to_string(), "10 - (3 - 2)");
    }

    #[test]
    fn test_hex_and_separators() {
        assert_eq!(LenExpr::parse("0x10").expect("hex").as_const(), Some(16));
        assert_eq!(LenExpr::parse("1_000").expect("sep").as_const(), Some(1000));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(LenExpr::parse("   "), Err(TypeError::Schema(_))));
    }

    #[test]
    fn test_rejects_comments() {
        for src in ["n // trailing", "n /* x */", "n */ 2", "a /*b"] {
            let err = LenExpr::parse(src).expect_err(src);
            assert!(err.to_string().contains("comments"), "{src}: {err}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        for src in ["n +", "(n", "n)", "n m", "n & 1", "12abc", "-n"] {
            assert!(LenExpr::parse(src).is_err(), "{src} should not parse");
        }
    }

    #[test]
    fn test_eval_errors() {
        let expr = LenExpr::parse("n / m").expect("parse");
        assert_eq!(
            eval_with(&expr, &[("n", 4), ("m", 0)]),
            Err(EvalError::DivisionByZero)
        );
        assert_eq!(
            eval_with(&expr, &[("n", 4)]),
            Err(EvalError::UnknownField("m".into()))
        );

        let expr = LenExpr::parse("n - 1").expect("parse");
        assert!(matches!(
            eval_with(&expr, &[("n", 0)]),
            Err(EvalError::Overflow { .. })
        ));
    }

    #[test]
    fn test_render_checked() {
        let field = |name: &str| format!("u64::from(f_{name})");

        let expr = LenExpr::parse("n").expect("parse");
        assert_eq!(
            expr.render_checked(&field),
            "::std::option::Option::Some(u64::from(f_n))"
        );

        let expr = LenExpr::parse("(n + 1) * 4").expect("parse");
        assert_eq!(
            expr.render_checked(&field),
            "(|| -> ::std::option::Option<u64> { ::std::option::Option::Some(u64::from(f_n).checked_add(1u64)?.checked_mul(4u64)?) })()"
        );
    }
}
