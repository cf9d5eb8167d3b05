//! The primitive registry: every built-in operator the parser can resolve.
//!
//! A primitive is dispatched by name at parse time into a `Prim`
//! expression node; the registry records its operator tag, its calling
//! shape, and the operand count the parser enforces. When a primitive name
//! is evaluated as a value, the evaluator synthesizes a procedure wrapper
//! whose formals come from the shape (see [`PrimDef::wrapper_formals`]);
//! the formal names are reserved by convention and cannot be written as
//! source identifiers.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{Error, ParseError, ParseErrorKind};

/// Fixed formal name of unary primitive wrappers.
pub const PARM: &str = "parm";
/// Fixed formal names of binary primitive wrappers.
pub const PARM1: &str = "parm1";
pub const PARM2: &str = "parm2";
/// Sentinel formal of variadic wrappers; bound to the proper list of all
/// arguments. `@` cannot start a source identifier, so user code can never
/// collide with it.
pub const VARIADIC_FORMAL: &str = "@args";

/// Operator tags, one per primitive. The evaluator dispatches on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimOp {
    MakeVoid,
    Exit,
    Add,
    Sub,
    Mul,
    Div,
    Modulo,
    Expt,
    Lt,
    Le,
    NumEq,
    Ge,
    Gt,
    Cons,
    Car,
    Cdr,
    ListFn,
    SetCar,
    SetCdr,
    IsEq,
    IsBoolean,
    IsNumber,
    IsNull,
    IsPair,
    IsProcedure,
    IsSymbol,
    IsString,
    IsList,
    Not,
    Display,
}

/// Calling shape: determines the wrapper formals synthesized when the
/// primitive is used as a first-class value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Nullary,
    Unary,
    Binary,
    Variadic,
}

/// Operand counts accepted at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an operand count, reporting a parse error naming the operator.
    pub fn validate(self, name: &str, got: usize) -> Result<(), Error> {
        let ok = match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Any => true,
        };
        if ok {
            return Ok(());
        }
        let expected = match self {
            Arity::Exact(n) => format!("exactly {n}"),
            Arity::AtLeast(n) => format!("at least {n}"),
            Arity::Any => unreachable!(),
        };
        Err(ParseError::new(
            ParseErrorKind::BadArity,
            format!("{name} expects {expected} operands, got {got}"),
        )
        .into())
    }
}

/// Registry entry for one primitive.
#[derive(Debug)]
pub struct PrimDef {
    pub name: &'static str,
    pub op: PrimOp,
    pub shape: Shape,
    pub arity: Arity,
}

impl PartialEq for PrimDef {
    fn eq(&self, other: &Self) -> bool {
        // The name uniquely identifies a registry entry
        self.name == other.name
    }
}

impl PrimDef {
    /// Formal names of the procedure wrapper synthesized for this
    /// primitive when it is evaluated as a value.
    pub fn wrapper_formals(&self) -> Vec<String> {
        match self.shape {
            Shape::Nullary => vec![],
            Shape::Unary => vec![PARM.to_owned()],
            Shape::Binary => vec![PARM1.to_owned(), PARM2.to_owned()],
            Shape::Variadic => vec![VARIADIC_FORMAL.to_owned()],
        }
    }
}

static PRIMITIVES: &[PrimDef] = &[
    PrimDef {
        name: "void",
        op: PrimOp::MakeVoid,
        shape: Shape::Nullary,
        arity: Arity::Exact(0),
    },
    PrimDef {
        name: "exit",
        op: PrimOp::Exit,
        shape: Shape::Nullary,
        arity: Arity::Exact(0),
    },
    // Arithmetic
    PrimDef {
        name: "+",
        op: PrimOp::Add,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: "-",
        op: PrimOp::Sub,
        shape: Shape::Variadic,
        arity: Arity::AtLeast(1),
    },
    PrimDef {
        name: "*",
        op: PrimOp::Mul,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: "/",
        op: PrimOp::Div,
        shape: Shape::Variadic,
        arity: Arity::AtLeast(1),
    },
    PrimDef {
        name: "modulo",
        op: PrimOp::Modulo,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    PrimDef {
        name: "expt",
        op: PrimOp::Expt,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    // Comparison chains
    PrimDef {
        name: "<",
        op: PrimOp::Lt,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: "<=",
        op: PrimOp::Le,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: "=",
        op: PrimOp::NumEq,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: ">=",
        op: PrimOp::Ge,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: ">",
        op: PrimOp::Gt,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    // Pairs and lists
    PrimDef {
        name: "cons",
        op: PrimOp::Cons,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    PrimDef {
        name: "car",
        op: PrimOp::Car,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "cdr",
        op: PrimOp::Cdr,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "list",
        op: PrimOp::ListFn,
        shape: Shape::Variadic,
        arity: Arity::Any,
    },
    PrimDef {
        name: "set-car!",
        op: PrimOp::SetCar,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    PrimDef {
        name: "set-cdr!",
        op: PrimOp::SetCdr,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    // Equality and predicates
    PrimDef {
        name: "eq?",
        op: PrimOp::IsEq,
        shape: Shape::Binary,
        arity: Arity::Exact(2),
    },
    PrimDef {
        name: "boolean?",
        op: PrimOp::IsBoolean,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "number?",
        op: PrimOp::IsNumber,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "null?",
        op: PrimOp::IsNull,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "pair?",
        op: PrimOp::IsPair,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "procedure?",
        op: PrimOp::IsProcedure,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "symbol?",
        op: PrimOp::IsSymbol,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "string?",
        op: PrimOp::IsString,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "list?",
        op: PrimOp::IsList,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    // Side effects and logic
    PrimDef {
        name: "not",
        op: PrimOp::Not,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
    PrimDef {
        name: "display",
        op: PrimOp::Display,
        shape: Shape::Unary,
        arity: Arity::Exact(1),
    },
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static PrimDef>> =
    LazyLock::new(|| PRIMITIVES.iter().map(|def| (def.name, def)).collect());

/// Find a primitive by its surface name.
pub fn lookup(name: &str) -> Option<&'static PrimDef> {
    BY_NAME.get(name).copied()
}

/// All registry entries, in declaration order.
pub fn all() -> &'static [PrimDef] {
    PRIMITIVES
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let cons = lookup("cons").unwrap();
        assert_eq!(cons.op, PrimOp::Cons);
        assert_eq!(cons.shape, Shape::Binary);
        assert_eq!(cons.arity, Arity::Exact(2));

        assert_eq!(lookup("+").unwrap().shape, Shape::Variadic);
        assert_eq!(lookup("display").unwrap().shape, Shape::Unary);
        assert_eq!(lookup("void").unwrap().shape, Shape::Nullary);
        assert!(lookup("lambda").is_none()); // reserved word, not a primitive
        assert!(lookup("string-append").is_none());

        // every entry is reachable through the index under its own name
        for def in all() {
            assert!(std::ptr::eq(lookup(def.name).unwrap(), def));
        }
        assert_eq!(all().len(), 30);
    }

    #[test]
    fn test_wrapper_formals() {
        assert!(lookup("exit").unwrap().wrapper_formals().is_empty());
        assert_eq!(lookup("car").unwrap().wrapper_formals(), vec![PARM]);
        assert_eq!(
            lookup("modulo").unwrap().wrapper_formals(),
            vec![PARM1, PARM2]
        );
        assert_eq!(
            lookup("+").unwrap().wrapper_formals(),
            vec![VARIADIC_FORMAL]
        );
    }

    #[test]
    fn test_arity_validation() {
        use Arity::*;

        Exact(2).validate("cons", 2).unwrap();
        Exact(2).validate("cons", 1).unwrap_err();
        Exact(2).validate("cons", 3).unwrap_err();

        AtLeast(1).validate("-", 1).unwrap();
        AtLeast(1).validate("-", 4).unwrap();
        AtLeast(1).validate("-", 0).unwrap_err();

        Any.validate("+", 0).unwrap();
        Any.validate("+", 100).unwrap();

        match Exact(2).validate("modulo", 1).unwrap_err() {
            Error::Parse(e) => {
                assert_eq!(e.kind, ParseErrorKind::BadArity);
                assert!(e.message.contains("modulo"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
