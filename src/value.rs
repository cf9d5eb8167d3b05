//! Runtime values.
//!
//! Scalars (numbers, booleans, symbols, void, the empty list) are plain
//! data compared by value. Pairs, procedures, and strings live on the
//! garbage-collected heap and have identity: cloning a `Value` clones the
//! handle, not the cell. Pair cells are mutable through `set-car!` and
//! `set-cdr!`, and closures keep their defining environment alive, so the
//! object graph can contain cycles; the tracing collector reclaims them.

use std::fmt;

use gc::{Finalize, Gc, GcCell, Trace};

use crate::env::Environment;
use crate::expr::Expr;
use crate::number::Number;

#[derive(Clone, Trace, Finalize)]
pub enum Value {
    /// Result of side-effecting forms; never printed by the REPL.
    Void,
    Number(Number),
    Bool(bool),
    Symbol(String),
    Str(Gc<String>),
    /// The empty list `()`.
    Null,
    /// The single mutable heap cell of the language.
    Pair(Gc<GcCell<PairCell>>),
    Procedure(Gc<Closure>),
    /// Sentinel signaling that evaluation requested the REPL to stop.
    Terminate,
}

#[derive(Trace, Finalize)]
pub struct PairCell {
    pub car: Value,
    pub cdr: Value,
}

/// A closure: formal names, a body expression, and the environment in
/// effect when the `lambda` was evaluated.
#[derive(Trace, Finalize)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expr,
    pub env: Environment,
}

impl Value {
    pub fn int(n: i64) -> Value {
        Value::Number(Number::Int(n))
    }

    pub fn string(text: impl Into<String>) -> Value {
        Value::Str(Gc::new(text.into()))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Gc::new(GcCell::new(PairCell { car, cdr })))
    }

    /// Build a proper list by right-folding `cons` over the items.
    pub fn list_from(items: Vec<Value>) -> Value {
        let mut list = Value::Null;
        for item in items.into_iter().rev() {
            list = Value::cons(item, list);
        }
        list
    }

    /// Collect the elements of a pair chain into a vector, stopping at the
    /// first non-pair tail (`Null` for a proper list).
    pub fn unpack_list(&self) -> Vec<Value> {
        let mut items = Vec::new();
        let mut cur = self.clone();
        while let Value::Pair(ref cell) = cur {
            let next = {
                let pair = cell.borrow();
                items.push(pair.car.clone());
                pair.cdr.clone()
            };
            cur = next;
        }
        items
    }

    /// Everything except `#f` is truthy, including `0`, `()`, and `""`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// `#t` for `Null` and for any pair whose `cdr` chain terminates at
    /// `Null`. Uses a tortoise/hare walk so cycles built with `set-cdr!`
    /// answer `#f` instead of hanging.
    pub fn is_proper_list(&self) -> bool {
        let step = |v: &Value| -> Option<Value> {
            match v {
                Value::Pair(cell) => Some(cell.borrow().cdr.clone()),
                _ => None,
            }
        };
        let mut slow = self.clone();
        let mut fast = self.clone();
        loop {
            match fast {
                Value::Null => return true,
                Value::Pair(_) => {}
                _ => return false,
            }
            fast = match step(&fast) {
                Some(next) => next,
                None => return false,
            };
            match fast {
                Value::Null => return true,
                Value::Pair(_) => {}
                _ => return false,
            }
            fast = match step(&fast) {
                Some(next) => next,
                None => return false,
            };
            slow = match step(&slow) {
                Some(next) => next,
                None => return false,
            };
            if let (Value::Pair(a), Value::Pair(b)) = (&slow, &fast)
                && Gc::ptr_eq(a, b)
            {
                return false;
            }
        }
    }
}

/// `eq?` semantics: identity on pairs, procedures, and strings; value
/// equality on numbers, booleans, and symbols; trivially true on
/// `Null`/`Null` and `Void`/`Void`.
pub fn eq_identity(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Void, Value::Void) => true,
        (Value::Terminate, Value::Terminate) => true,
        (Value::Str(x), Value::Str(y)) => Gc::ptr_eq(x, y),
        (Value::Pair(x), Value::Pair(y)) => Gc::ptr_eq(x, y),
        (Value::Procedure(x), Value::Procedure(y)) => Gc::ptr_eq(x, y),
        _ => false,
    }
}

// Structural equality, used by tests and assertions: strings compare by
// contents, pairs compare recursively, procedures by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Null, Value::Null) => true,
            (Value::Pair(a), Value::Pair(b)) => {
                if Gc::ptr_eq(a, b) {
                    return true;
                }
                let x = a.borrow();
                let y = b.borrow();
                x.car == y.car && x.cdr == y.cdr
            }
            (Value::Procedure(a), Value::Procedure(b)) => Gc::ptr_eq(a, b),
            (Value::Terminate, Value::Terminate) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "#<void>"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(name) => write!(f, "{name}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Null => write!(f, "()"),
            Value::Pair(cell) => {
                write!(f, "(")?;
                write!(f, "{}", cell.borrow().car)?;
                let mut tail = cell.borrow().cdr.clone();
                loop {
                    match &tail {
                        Value::Null => break,
                        Value::Pair(next) => {
                            write!(f, " {}", next.borrow().car)?;
                            let cdr = next.borrow().cdr.clone();
                            tail = cdr;
                        }
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Value::Procedure(_) => write!(f, "#<procedure>"),
            Value::Terminate => write!(f, "#<terminate>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Symbol(name) => write!(f, "Symbol({name})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Null => write!(f, "Null"),
            Value::Pair(_) => write!(f, "Pair({self})"),
            Value::Procedure(p) => write!(f, "Procedure(params={:?})", p.params),
            Value::Terminate => write!(f, "Terminate"),
        }
    }
}

/// Helper for building symbols in tests and mixed lists.
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym(name: impl Into<String>) -> Value {
    Value::Symbol(name.into())
}
