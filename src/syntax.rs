//! The reader's output: a uniform tree of literal atoms and nested lists.
//!
//! Syntax carries no binding or primitive information; the parser in
//! [`crate::parser`] lowers it to a typed [`crate::expr::Expr`], and
//! `quote` holds it untouched until evaluation converts it to a value.

use std::fmt;

/// One node of an S-expression tree.
///
/// Rational literals keep the numerator and denominator exactly as read;
/// normalization (and the zero-denominator check) happens during lowering
/// or quote conversion. Identifiers cover everything that is not a
/// recognized literal, including digit-leading tokens such as `1e-3` that
/// the evaluator later reinterprets as numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syntax {
    Fixnum(i64),
    Rational(i64, i64),
    Str(String),
    True,
    False,
    Ident(String),
    List(Vec<Syntax>),
}

impl Syntax {
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Syntax::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_dot(&self) -> bool {
        matches!(self, Syntax::Ident(name) if name == ".")
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Fixnum(n) => write!(f, "{n}"),
            Syntax::Rational(n, d) => write!(f, "{n}/{d}"),
            Syntax::Str(s) => write!(f, "\"{s}\""),
            Syntax::True => write!(f, "#t"),
            Syntax::False => write!(f, "#f"),
            Syntax::Ident(name) => write!(f, "{name}"),
            Syntax::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
