//! The evaluator: recursive interpretation of [`Expr`] against an
//! [`Environment`], producing a [`Value`].
//!
//! Evaluation is eager and left-to-right in every operand position. Only
//! `#f` is false. Primitive applications resolved by the parser dispatch
//! directly on their registry entry; a primitive *name* in value position
//! synthesizes an ordinary closure on the fly, so primitives are
//! first-class. Variadic primitives use a single calling convention: the
//! wrapper's one formal `@args` is bound to the proper list of all
//! arguments, and a variadic primitive node with no operands splices that
//! list back into positional values.
//!
//! Recursion depth is tracked and capped so runaway programs fail with a
//! clean error instead of exhausting the native stack.

use gc::{Gc, GcCell};

use crate::env::Environment;
use crate::expr::{CondClause, Expr};
use crate::number::{self, Number};
use crate::primitives::{self, PARM, PARM1, PARM2, PrimDef, PrimOp, Shape, VARIADIC_FORMAL};
use crate::syntax::Syntax;
use crate::value::{Closure, PairCell, Value, eq_identity};
use crate::{Error, MAX_EVAL_DEPTH, ParseError, ParseErrorKind, RuntimeError};

/// Evaluate one expression in the given environment.
pub fn eval(expr: &Expr, env: &Environment) -> Result<Value, Error> {
    eval_at_depth(expr, env, 0)
}

fn eval_at_depth(expr: &Expr, env: &Environment, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(RuntimeError::DepthLimit.into());
    }
    match expr {
        Expr::Fixnum(n) => Ok(Value::int(*n)),
        Expr::Rational(num, den) => Ok(Value::Number(Number::ratio(*num, *den)?)),
        Expr::StringLit(s) => Ok(Value::string(s.clone())),
        Expr::True => Ok(Value::Bool(true)),
        Expr::False => Ok(Value::Bool(false)),
        Expr::Var(name) => eval_var(name, env),
        Expr::Quote(stx) => quote_value(stx),

        Expr::If(test, conseq, alter) => {
            if eval_at_depth(test, env, depth + 1)?.is_truthy() {
                eval_at_depth(conseq, env, depth + 1)
            } else {
                eval_at_depth(alter, env, depth + 1)
            }
        }
        Expr::Cond(clauses) => eval_cond(clauses, env, depth),
        Expr::Begin(forms) => {
            let mut last = Value::Void;
            for form in forms {
                last = eval_at_depth(form, env, depth + 1)?;
            }
            Ok(last)
        }
        Expr::And(forms) => {
            let mut last = Value::Bool(true);
            for form in forms {
                last = eval_at_depth(form, env, depth + 1)?;
                if !last.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(last)
        }
        Expr::Or(forms) => {
            for form in forms {
                let value = eval_at_depth(form, env, depth + 1)?;
                if value.is_truthy() {
                    return Ok(value);
                }
            }
            Ok(Value::Bool(false))
        }

        Expr::Lambda(params, body) => Ok(Value::Procedure(Gc::new(Closure {
            params: params.clone(),
            body: (**body).clone(),
            env: env.clone(),
        }))),

        Expr::Define(name, rhs) => {
            // bind a placeholder first so a lambda RHS can see itself
            env.define(name, Value::Void);
            let value = eval_at_depth(rhs, env, depth + 1)?;
            env.define(name, value);
            Ok(Value::Void)
        }
        Expr::Set(name, rhs) => {
            let value = eval_at_depth(rhs, env, depth + 1)?;
            env.set(name, value)?;
            Ok(Value::Void)
        }

        Expr::Let(bindings, body) => {
            // right-hand sides evaluate in the outer environment
            let mut values = Vec::with_capacity(bindings.len());
            for (_, rhs) in bindings {
                values.push(eval_at_depth(rhs, env, depth + 1)?);
            }
            let inner = env.child();
            for ((name, _), value) in bindings.iter().zip(values) {
                inner.define(name, value);
            }
            eval_at_depth(body, &inner, depth + 1)
        }
        Expr::Letrec(bindings, body) => {
            // placeholder cells first, so every RHS sees every name
            let inner = env.child();
            for (name, _) in bindings {
                inner.define(name, Value::Void);
            }
            for (name, rhs) in bindings {
                let value = eval_at_depth(rhs, &inner, depth + 1)?;
                inner.define(name, value);
            }
            eval_at_depth(body, &inner, depth + 1)
        }

        Expr::Apply(func, rands) => {
            let callee = eval_at_depth(func, env, depth + 1)?;
            let Value::Procedure(ref closure) = callee else {
                return Err(RuntimeError::NotAProcedure(callee.to_string()).into());
            };
            let mut args = Vec::with_capacity(rands.len());
            for rand in rands {
                args.push(eval_at_depth(rand, env, depth + 1)?);
            }
            apply_procedure(closure, args, depth)
        }

        Expr::Prim { op, args } => eval_prim(op, args, env, depth),
    }
}

/// Variable reference. Unprefixed numeric tokens reach the evaluator as
/// identifiers, so the lookup path first tries to reinterpret the name as
/// a number; only then does it consult the environment and, failing that,
/// the primitive registry.
fn eval_var(name: &str, env: &Environment) -> Result<Value, Error> {
    if let Some(n) = number::parse_numeric_identifier(name) {
        return Ok(Value::Number(n));
    }
    match name.chars().next() {
        None => {
            return Err(ParseError::new(ParseErrorKind::InvalidSyntax, "empty identifier").into());
        }
        Some(first) if first.is_ascii_digit() => {
            return Err(ParseError::new(
                ParseErrorKind::InvalidNumber,
                format!("invalid numeric literal: {name}"),
            )
            .into());
        }
        Some('.') | Some('@') => {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                format!("invalid identifier: {name}"),
            )
            .into());
        }
        Some(_) => {}
    }
    if name.chars().any(|c| matches!(c, '#' | '\'' | '"' | '`')) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidSyntax,
            format!("invalid identifier: {name}"),
        )
        .into());
    }
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    if let Some(def) = primitives::lookup(name) {
        return Ok(primitive_procedure(def));
    }
    Err(RuntimeError::UnboundName(name.to_owned()).into())
}

/// Synthesize the first-class procedure for a primitive name: a closure
/// whose body is the primitive node over the shape's reserved formals,
/// closed over an empty environment.
fn primitive_procedure(def: &'static PrimDef) -> Value {
    let args = match def.shape {
        Shape::Nullary | Shape::Variadic => vec![],
        Shape::Unary => vec![Expr::Var(PARM.to_owned())],
        Shape::Binary => vec![Expr::Var(PARM1.to_owned()), Expr::Var(PARM2.to_owned())],
    };
    Value::Procedure(Gc::new(Closure {
        params: def.wrapper_formals(),
        body: Expr::Prim { op: def, args },
        env: Environment::new(),
    }))
}

/// Apply a closure to already-evaluated arguments. Variadic primitive
/// wrappers take all arguments packed into one proper list; everything
/// else binds positionally after an exact arity check.
fn apply_procedure(closure: &Closure, mut args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    if closure.params.len() == 1 && closure.params[0] == VARIADIC_FORMAL {
        args = vec![Value::list_from(args)];
    }
    if args.len() != closure.params.len() {
        return Err(RuntimeError::ArityMismatch {
            expected: closure.params.len(),
            got: args.len(),
        }
        .into());
    }
    let call_env = closure.env.child();
    for (param, arg) in closure.params.iter().zip(args) {
        call_env.define(param, arg);
    }
    eval_at_depth(&closure.body, &call_env, depth + 1)
}

fn eval_cond(clauses: &[CondClause], env: &Environment, depth: usize) -> Result<Value, Error> {
    for clause in clauses {
        let test = eval_at_depth(&clause.test, env, depth + 1)?;
        if !test.is_truthy() {
            continue;
        }
        if clause.body.is_empty() {
            return Ok(test);
        }
        let mut last = Value::Void;
        for form in &clause.body {
            last = eval_at_depth(form, env, depth + 1)?;
        }
        return Ok(last);
    }
    Ok(Value::Void)
}

/// Deep conversion of quoted syntax to a value. Lists right-fold into
/// pairs; a single `.` in second-from-last position builds a dotted tail.
/// The result is freshly allocated and free for later mutation.
fn quote_value(stx: &Syntax) -> Result<Value, Error> {
    match stx {
        Syntax::Fixnum(n) => Ok(Value::int(*n)),
        Syntax::Rational(num, den) => {
            if *den == 0 {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidNumber,
                    format!("zero denominator in rational literal {num}/{den}"),
                )
                .into());
            }
            Ok(Value::Number(Number::ratio(*num, *den)?))
        }
        Syntax::Str(s) => Ok(Value::string(s.clone())),
        Syntax::True => Ok(Value::Bool(true)),
        Syntax::False => Ok(Value::Bool(false)),
        Syntax::Ident(name) => Ok(Value::Symbol(name.clone())),
        Syntax::List(items) => {
            let dots: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_dot())
                .map(|(i, _)| i)
                .collect();
            match dots.as_slice() {
                [] => {
                    let mut list = Value::Null;
                    for item in items.iter().rev() {
                        list = Value::cons(quote_value(item)?, list);
                    }
                    Ok(list)
                }
                [i] if items.len() >= 3 && *i == items.len() - 2 => {
                    let mut tail = quote_value(&items[items.len() - 1])?;
                    for item in items[..*i].iter().rev() {
                        tail = Value::cons(quote_value(item)?, tail);
                    }
                    Ok(tail)
                }
                _ => Err(ParseError::new(
                    ParseErrorKind::BadDot,
                    format!("misplaced . in {stx}"),
                )
                .into()),
            }
        }
    }
}

/// Evaluate a primitive node's operands and apply the operator. Inside a
/// variadic wrapper the node has no operands; the packed argument list
/// arrives through the `@args` binding instead.
fn eval_prim(
    def: &PrimDef,
    rands: &[Expr],
    env: &Environment,
    depth: usize,
) -> Result<Value, Error> {
    let args = if rands.is_empty() && def.shape == Shape::Variadic {
        match env.get(VARIADIC_FORMAL) {
            Some(list) => list.unpack_list(),
            None => Vec::new(),
        }
    } else {
        let mut values = Vec::with_capacity(rands.len());
        for rand in rands {
            values.push(eval_at_depth(rand, env, depth + 1)?);
        }
        values
    };
    apply_prim(def, &args)
}

fn number_arg(value: &Value) -> Result<Number, RuntimeError> {
    value
        .as_number()
        .ok_or_else(|| RuntimeError::wrong_type("number", value))
}

fn pair_arg(value: &Value) -> Result<&Gc<GcCell<PairCell>>, RuntimeError> {
    match value {
        Value::Pair(cell) => Ok(cell),
        _ => Err(RuntimeError::wrong_type("pair", value)),
    }
}

fn unary_arg(args: &[Value]) -> Result<&Value, RuntimeError> {
    match args {
        [value] => Ok(value),
        _ => Err(RuntimeError::ArityMismatch {
            expected: 1,
            got: args.len(),
        }),
    }
}

fn binary_args(args: &[Value]) -> Result<(&Value, &Value), RuntimeError> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(RuntimeError::ArityMismatch {
            expected: 2,
            got: args.len(),
        }),
    }
}

/// True iff the comparison holds pairwise across the whole chain.
fn compare_chain(
    args: &[Value],
    holds: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, Error> {
    for window in args.windows(2) {
        let ord = number_arg(&window[0])?.compare(number_arg(&window[1])?);
        if !holds(ord) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Primitive semantics over already-evaluated argument values.
fn apply_prim(def: &PrimDef, args: &[Value]) -> Result<Value, Error> {
    use std::cmp::Ordering;

    match def.op {
        PrimOp::MakeVoid => Ok(Value::Void),
        PrimOp::Exit => Ok(Value::Terminate),

        PrimOp::Add => {
            let mut acc = Number::Int(0);
            for arg in args {
                acc = acc.add(number_arg(arg)?)?;
            }
            Ok(Value::Number(acc))
        }
        PrimOp::Sub => {
            let Some((first, rest)) = args.split_first() else {
                return Err(RuntimeError::ArityMismatch {
                    expected: 1,
                    got: 0,
                }
                .into());
            };
            let first = number_arg(first)?;
            if rest.is_empty() {
                return Ok(Value::Number(Number::Int(0).sub(first)?));
            }
            let mut acc = first;
            for arg in rest {
                acc = acc.sub(number_arg(arg)?)?;
            }
            Ok(Value::Number(acc))
        }
        PrimOp::Mul => {
            let mut acc = Number::Int(1);
            for arg in args {
                acc = acc.mul(number_arg(arg)?)?;
            }
            Ok(Value::Number(acc))
        }
        PrimOp::Div => {
            let Some((first, rest)) = args.split_first() else {
                return Err(RuntimeError::ArityMismatch {
                    expected: 1,
                    got: 0,
                }
                .into());
            };
            let first = number_arg(first)?;
            if rest.is_empty() {
                return Ok(Value::Number(Number::Int(1).div(first)?));
            }
            let mut acc = first;
            for arg in rest {
                acc = acc.div(number_arg(arg)?)?;
            }
            Ok(Value::Number(acc))
        }
        PrimOp::Modulo => {
            let (a, b) = binary_args(args)?;
            Ok(Value::Number(number_arg(a)?.modulo(number_arg(b)?)?))
        }
        PrimOp::Expt => {
            let (a, b) = binary_args(args)?;
            Ok(Value::Number(number_arg(a)?.expt(number_arg(b)?)?))
        }

        PrimOp::Lt => compare_chain(args, |ord| ord == Ordering::Less),
        PrimOp::Le => compare_chain(args, |ord| ord != Ordering::Greater),
        PrimOp::NumEq => compare_chain(args, |ord| ord == Ordering::Equal),
        PrimOp::Ge => compare_chain(args, |ord| ord != Ordering::Less),
        PrimOp::Gt => compare_chain(args, |ord| ord == Ordering::Greater),

        PrimOp::Cons => {
            let (car, cdr) = binary_args(args)?;
            Ok(Value::cons(car.clone(), cdr.clone()))
        }
        PrimOp::Car => Ok(pair_arg(unary_arg(args)?)?.borrow().car.clone()),
        PrimOp::Cdr => Ok(pair_arg(unary_arg(args)?)?.borrow().cdr.clone()),
        PrimOp::ListFn => Ok(Value::list_from(args.to_vec())),
        PrimOp::SetCar => {
            let (pair, value) = binary_args(args)?;
            pair_arg(pair)?.borrow_mut().car = value.clone();
            Ok(Value::Void)
        }
        PrimOp::SetCdr => {
            let (pair, value) = binary_args(args)?;
            pair_arg(pair)?.borrow_mut().cdr = value.clone();
            Ok(Value::Void)
        }

        PrimOp::IsEq => {
            let (a, b) = binary_args(args)?;
            Ok(Value::Bool(eq_identity(a, b)))
        }
        PrimOp::IsBoolean => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Bool(_)))),
        PrimOp::IsNumber => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Number(_)))),
        PrimOp::IsNull => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Null))),
        PrimOp::IsPair => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Pair(_)))),
        PrimOp::IsProcedure => Ok(Value::Bool(matches!(
            unary_arg(args)?,
            Value::Procedure(_)
        ))),
        PrimOp::IsSymbol => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Symbol(_)))),
        PrimOp::IsString => Ok(Value::Bool(matches!(unary_arg(args)?, Value::Str(_)))),
        PrimOp::IsList => Ok(Value::Bool(unary_arg(args)?.is_proper_list())),

        PrimOp::Not => Ok(Value::Bool(!unary_arg(args)?.is_truthy())),
        PrimOp::Display => {
            // strings print their raw text, everything else its canonical
            // representation
            match unary_arg(args)? {
                Value::Str(s) => print!("{s}"),
                other => print!("{other}"),
            }
            Ok(Value::Void)
        }
    }
}
