//! Lowering: [`Syntax`] trees to typed [`Expr`] trees.
//!
//! A list form is dispatched on its head symbol in this order: a name
//! bound in the static environment is an application (the binding shadows
//! any reserved meaning), then primitives, then reserved words, and
//! anything else is an application. The static environment records names
//! only: the formals of enclosing `lambda`/`let`/`letrec` forms plus
//! whatever the global environment currently binds, so `(define + ...)`
//! at the top level turns later `(+ ...)` forms into ordinary calls.

use crate::env::Environment;
use crate::expr::{CondClause, Expr};
use crate::number::parse_numeric_identifier;
use crate::primitives;
use crate::syntax::Syntax;
use crate::{Error, ParseError, ParseErrorKind};

/// Special forms recognized by the parser unless locally shadowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reserved {
    Quote,
    If,
    Cond,
    Else,
    Begin,
    And,
    Or,
    Lambda,
    Define,
    Let,
    Letrec,
    Set,
}

fn reserved_word(name: &str) -> Option<Reserved> {
    match name {
        "quote" => Some(Reserved::Quote),
        "if" => Some(Reserved::If),
        "cond" => Some(Reserved::Cond),
        "else" => Some(Reserved::Else),
        "begin" => Some(Reserved::Begin),
        "and" => Some(Reserved::And),
        "or" => Some(Reserved::Or),
        "lambda" => Some(Reserved::Lambda),
        "define" => Some(Reserved::Define),
        "let" => Some(Reserved::Let),
        "letrec" => Some(Reserved::Letrec),
        "set!" => Some(Reserved::Set),
        _ => None,
    }
}

/// Parse-time environment: lexical name frames stacked over the global
/// runtime environment. Only membership is ever consulted.
struct Scope<'a> {
    global: &'a Environment,
    locals: Vec<Vec<String>>,
}

impl Scope<'_> {
    fn is_bound(&self, name: &str) -> bool {
        self.locals
            .iter()
            .any(|frame| frame.iter().any(|n| n == name))
            || self.global.contains(name)
    }
}

fn syntax_error(kind: ParseErrorKind, message: impl Into<String>) -> Error {
    ParseError::new(kind, message).into()
}

fn special_arity(name: &str, expected: &str, got: usize) -> Error {
    syntax_error(
        ParseErrorKind::BadArity,
        format!("{name} expects {expected} operands, got {got}"),
    )
}

/// Parse one top-level form against the given global environment.
pub fn parse(stx: &Syntax, env: &Environment) -> Result<Expr, Error> {
    let mut scope = Scope {
        global: env,
        locals: Vec::new(),
    };
    parse_expr(stx, &mut scope)
}

fn parse_expr(stx: &Syntax, scope: &mut Scope) -> Result<Expr, Error> {
    match stx {
        Syntax::Fixnum(n) => Ok(Expr::Fixnum(*n)),
        Syntax::Rational(num, den) => {
            if *den == 0 {
                Err(syntax_error(
                    ParseErrorKind::InvalidNumber,
                    format!("zero denominator in rational literal {num}/{den}"),
                ))
            } else {
                Ok(Expr::Rational(*num, *den))
            }
        }
        Syntax::Str(s) => Ok(Expr::StringLit(s.clone())),
        Syntax::True => Ok(Expr::True),
        Syntax::False => Ok(Expr::False),
        Syntax::Ident(name) => Ok(Expr::Var(name.clone())),
        Syntax::List(items) => parse_list(items, scope),
    }
}

fn parse_all(stxs: &[Syntax], scope: &mut Scope) -> Result<Vec<Expr>, Error> {
    stxs.iter().map(|stx| parse_expr(stx, scope)).collect()
}

fn parse_list(items: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    let Some((head, rands)) = items.split_first() else {
        // () is the empty-list literal
        return Ok(Expr::Quote(Syntax::List(vec![])));
    };

    if let Syntax::Ident(op) = head {
        if scope.is_bound(op) {
            // the binding shadows any primitive or reserved meaning;
            // fall through to the application case
        } else if let Some(def) = primitives::lookup(op) {
            def.arity.validate(def.name, rands.len())?;
            let args = parse_all(rands, scope)?;
            return Ok(Expr::Prim { op: def, args });
        } else if let Some(word) = reserved_word(op) {
            return parse_reserved(word, rands, scope);
        }
    }

    let func = parse_expr(head, scope)?;
    let args = parse_all(rands, scope)?;
    Ok(Expr::Apply(Box::new(func), args))
}

fn parse_reserved(word: Reserved, rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    match word {
        Reserved::Quote => match rands {
            [operand] => Ok(Expr::Quote(operand.clone())),
            _ => Err(special_arity("quote", "exactly 1", rands.len())),
        },
        Reserved::If => match rands {
            [test, conseq, alter] => Ok(Expr::If(
                Box::new(parse_expr(test, scope)?),
                Box::new(parse_expr(conseq, scope)?),
                Box::new(parse_expr(alter, scope)?),
            )),
            _ => Err(special_arity("if", "exactly 3", rands.len())),
        },
        Reserved::Cond => parse_cond(rands, scope),
        Reserved::Else => Err(syntax_error(
            ParseErrorKind::InvalidSyntax,
            "else outside cond",
        )),
        Reserved::Begin => Ok(Expr::Begin(parse_all(rands, scope)?)),
        Reserved::And => Ok(Expr::And(parse_all(rands, scope)?)),
        Reserved::Or => Ok(Expr::Or(parse_all(rands, scope)?)),
        Reserved::Lambda => parse_lambda(rands, scope),
        Reserved::Define => parse_define(rands, scope),
        Reserved::Let => parse_let(rands, scope),
        Reserved::Letrec => parse_letrec(rands, scope),
        Reserved::Set => match rands {
            [Syntax::Ident(target), rhs] => Ok(Expr::Set(
                target.clone(),
                Box::new(parse_expr(rhs, scope)?),
            )),
            [_, _] => Err(syntax_error(
                ParseErrorKind::BadBinding,
                "set! target must be an identifier",
            )),
            _ => Err(special_arity("set!", "exactly 2", rands.len())),
        },
    }
}

fn parse_cond(rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    if rands.is_empty() {
        return Err(special_arity("cond", "at least 1", 0));
    }
    let last = rands.len() - 1;
    let mut clauses = Vec::with_capacity(rands.len());
    for (i, clause_stx) in rands.iter().enumerate() {
        let Syntax::List(parts) = clause_stx else {
            return Err(syntax_error(
                ParseErrorKind::InvalidSyntax,
                format!("cond clause must be a non-empty list: {clause_stx}"),
            ));
        };
        let Some((head, body)) = parts.split_first() else {
            return Err(syntax_error(
                ParseErrorKind::InvalidSyntax,
                "cond clause must be a non-empty list: ()",
            ));
        };
        // `else` keeps its special meaning only while unshadowed
        let test = if head.as_ident() == Some("else") && !scope.is_bound("else") {
            if i != last {
                return Err(syntax_error(
                    ParseErrorKind::InvalidSyntax,
                    "else must be the last cond clause",
                ));
            }
            if body.is_empty() {
                return Err(syntax_error(
                    ParseErrorKind::InvalidSyntax,
                    "else clause needs a body",
                ));
            }
            Expr::True
        } else {
            parse_expr(head, scope)?
        };
        clauses.push(CondClause {
            test,
            body: parse_all(body, scope)?,
        });
    }
    Ok(Expr::Cond(clauses))
}

/// A name usable in a binding position: it must survive the identifier
/// rules the evaluator applies to variable references, or the binding
/// could never be read back.
fn check_binder(name: &str) -> Result<(), Error> {
    let invalid = |why: &str| {
        Err(syntax_error(
            ParseErrorKind::BadBinding,
            format!("invalid name in binding position: {name} ({why})"),
        ))
    };
    match name.chars().next() {
        None => return invalid("empty"),
        Some(first) if first.is_ascii_digit() || first == '.' || first == '@' => {
            return invalid("starts with a forbidden character");
        }
        Some(_) => {}
    }
    if name.chars().any(|c| matches!(c, '#' | '\'' | '"' | '`')) {
        return invalid("contains a forbidden character");
    }
    if parse_numeric_identifier(name).is_some() {
        return invalid("reads as a number");
    }
    Ok(())
}

/// A name usable with `define`: additionally, not a reserved word.
/// Primitive names stay definable; the new binding shadows the primitive.
fn check_definable(name: &str) -> Result<(), Error> {
    if reserved_word(name).is_some() {
        return Err(syntax_error(
            ParseErrorKind::BadBinding,
            format!("cannot define reserved word {name}"),
        ));
    }
    check_binder(name)
}

fn parse_formals(items: &[Syntax]) -> Result<Vec<String>, Error> {
    let mut formals: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = item.as_ident() else {
            return Err(syntax_error(
                ParseErrorKind::BadBinding,
                format!("formal is not an identifier: {item}"),
            ));
        };
        check_binder(name)?;
        if formals.iter().any(|f| f == name) {
            return Err(syntax_error(
                ParseErrorKind::BadBinding,
                format!("duplicate formal: {name}"),
            ));
        }
        formals.push(name.to_owned());
    }
    Ok(formals)
}

/// An implicit-`begin` body: a single form stays bare.
fn parse_body(forms: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    match forms {
        [] => Err(syntax_error(
            ParseErrorKind::InvalidSyntax,
            "body cannot be empty",
        )),
        [single] => parse_expr(single, scope),
        _ => Ok(Expr::Begin(parse_all(forms, scope)?)),
    }
}

fn parse_lambda(rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    if rands.len() < 2 {
        return Err(special_arity("lambda", "at least 2", rands.len()));
    }
    let Syntax::List(formal_stxs) = &rands[0] else {
        return Err(syntax_error(
            ParseErrorKind::BadBinding,
            "lambda formals must be a list of identifiers",
        ));
    };
    let formals = parse_formals(formal_stxs)?;
    scope.locals.push(formals.clone());
    let body = parse_body(&rands[1..], scope);
    scope.locals.pop();
    Ok(Expr::Lambda(formals, Box::new(body?)))
}

fn parse_define(rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    if rands.len() < 2 {
        return Err(special_arity("define", "at least 2", rands.len()));
    }
    match &rands[0] {
        Syntax::Ident(name) => {
            check_definable(name)?;
            let rhs = parse_body(&rands[1..], scope)?;
            Ok(Expr::Define(name.clone(), Box::new(rhs)))
        }
        // function sugar: (define (name formal ...) body ...)
        Syntax::List(signature) => {
            let Some((name_stx, formal_stxs)) = signature.split_first() else {
                return Err(syntax_error(
                    ParseErrorKind::BadBinding,
                    "define signature cannot be empty",
                ));
            };
            let Some(name) = name_stx.as_ident() else {
                return Err(syntax_error(
                    ParseErrorKind::BadBinding,
                    format!("defined name must be an identifier: {name_stx}"),
                ));
            };
            check_definable(name)?;
            let formals = parse_formals(formal_stxs)?;
            scope.locals.push(formals.clone());
            let body = parse_body(&rands[1..], scope);
            scope.locals.pop();
            Ok(Expr::Define(
                name.to_owned(),
                Box::new(Expr::Lambda(formals, Box::new(body?))),
            ))
        }
        other => Err(syntax_error(
            ParseErrorKind::BadBinding,
            format!("cannot define {other}"),
        )),
    }
}

/// Shared structure check for `let`/`letrec` binding lists. Returns the
/// binding names and the right-hand-side syntax in order.
fn parse_binding_list<'a>(
    name: &str,
    rands: &'a [Syntax],
) -> Result<(Vec<String>, Vec<&'a Syntax>), Error> {
    let Syntax::List(binding_stxs) = &rands[0] else {
        return Err(syntax_error(
            ParseErrorKind::BadBinding,
            format!("{name} bindings must be a list"),
        ));
    };
    let mut names: Vec<String> = Vec::with_capacity(binding_stxs.len());
    let mut rhs = Vec::with_capacity(binding_stxs.len());
    for binding in binding_stxs {
        let parts = match binding {
            Syntax::List(parts) if parts.len() == 2 => parts,
            _ => {
                return Err(syntax_error(
                    ParseErrorKind::BadBinding,
                    format!("{name} binding must be a (name expr) pair: {binding}"),
                ));
            }
        };
        let Some(bound) = parts[0].as_ident() else {
            return Err(syntax_error(
                ParseErrorKind::BadBinding,
                format!("{name} binding name must be an identifier: {}", parts[0]),
            ));
        };
        check_binder(bound)?;
        if names.iter().any(|n| n == bound) {
            return Err(syntax_error(
                ParseErrorKind::BadBinding,
                format!("duplicate {name} binding: {bound}"),
            ));
        }
        names.push(bound.to_owned());
        rhs.push(&parts[1]);
    }
    Ok((names, rhs))
}

fn parse_let(rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    if rands.len() < 2 {
        return Err(special_arity("let", "at least 2", rands.len()));
    }
    let (names, rhs_stxs) = parse_binding_list("let", rands)?;
    // right-hand sides see the outer scope only
    let mut bindings = Vec::with_capacity(names.len());
    for (bound, rhs) in names.iter().zip(&rhs_stxs) {
        bindings.push((bound.clone(), parse_expr(rhs, scope)?));
    }
    scope.locals.push(names);
    let body = parse_body(&rands[1..], scope);
    scope.locals.pop();
    Ok(Expr::Let(bindings, Box::new(body?)))
}

fn parse_letrec(rands: &[Syntax], scope: &mut Scope) -> Result<Expr, Error> {
    if rands.len() < 2 {
        return Err(special_arity("letrec", "at least 2", rands.len()));
    }
    let (names, rhs_stxs) = parse_binding_list("letrec", rands)?;
    // right-hand sides already see every sibling name
    scope.locals.push(names.clone());
    let parsed = parse_letrec_parts(&names, &rhs_stxs, &rands[1..], scope);
    scope.locals.pop();
    let (bindings, body) = parsed?;
    Ok(Expr::Letrec(bindings, Box::new(body)))
}

fn parse_letrec_parts(
    names: &[String],
    rhs_stxs: &[&Syntax],
    body_stxs: &[Syntax],
    scope: &mut Scope,
) -> Result<(Vec<(String, Expr)>, Expr), Error> {
    let mut bindings = Vec::with_capacity(names.len());
    for (bound, rhs) in names.iter().zip(rhs_stxs) {
        bindings.push((bound.clone(), parse_expr(rhs, scope)?));
    }
    let body = parse_body(body_stxs, scope)?;
    Ok((bindings, body))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::reader;

    fn parse_str(input: &str) -> Result<Expr, Error> {
        parse(&reader::read(input).unwrap(), &Environment::new())
    }

    fn parse_str_in(input: &str, env: &Environment) -> Result<Expr, Error> {
        parse(&reader::read(input).unwrap(), env)
    }

    fn expect_kind(result: Result<Expr, Error>, kind: ParseErrorKind, context: &str) {
        match result {
            Err(Error::Parse(e)) => assert_eq!(e.kind, kind, "{context}: {e}"),
            other => panic!("{context}: expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_literals_and_vars() {
        assert_eq!(parse_str("42").unwrap(), Expr::Fixnum(42));
        assert_eq!(parse_str("2/4").unwrap(), Expr::Rational(2, 4));
        assert_eq!(
            parse_str("\"hi\"").unwrap(),
            Expr::StringLit("hi".to_owned())
        );
        assert_eq!(parse_str("#t").unwrap(), Expr::True);
        assert_eq!(parse_str("x").unwrap(), Expr::Var("x".to_owned()));
        // numeric-looking identifiers stay variables until evaluation
        assert_eq!(parse_str("1e-3").unwrap(), Expr::Var("1e-3".to_owned()));
        expect_kind(
            parse_str("1/0"),
            ParseErrorKind::InvalidNumber,
            "zero denominator",
        );
    }

    #[test]
    fn test_primitive_dispatch_and_arity() {
        match parse_str("(+ 1 2 3)").unwrap() {
            Expr::Prim { op, args } => {
                assert_eq!(op.name, "+");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected prim node, got {other:?}"),
        }

        // parse-time arity enforcement
        expect_kind(parse_str("(modulo 1)"), ParseErrorKind::BadArity, "modulo");
        expect_kind(
            parse_str("(car (list 1) 2)"),
            ParseErrorKind::BadArity,
            "car",
        );
        expect_kind(parse_str("(-)"), ParseErrorKind::BadArity, "-");
        expect_kind(parse_str("(/)"), ParseErrorKind::BadArity, "/");
        expect_kind(parse_str("(void 1)"), ParseErrorKind::BadArity, "void");
        // nested operands are checked too
        expect_kind(
            parse_str("(list (not) 42)"),
            ParseErrorKind::BadArity,
            "nested",
        );
        // chains accept any operand count
        assert!(parse_str("(<)").is_ok());
        assert!(parse_str("(< 1)").is_ok());
        assert!(parse_str("(+)").is_ok());
    }

    #[test]
    fn test_empty_list_is_quote() {
        assert_eq!(
            parse_str("()").unwrap(),
            Expr::Quote(Syntax::List(vec![]))
        );
    }

    #[test]
    fn test_reserved_forms() {
        assert!(matches!(parse_str("(if #t 1 2)").unwrap(), Expr::If(..)));
        expect_kind(parse_str("(if #t 1)"), ParseErrorKind::BadArity, "if/2");
        expect_kind(
            parse_str("(if #t 1 2 3)"),
            ParseErrorKind::BadArity,
            "if/4",
        );
        expect_kind(parse_str("(quote a b)"), ParseErrorKind::BadArity, "quote");
        assert_eq!(parse_str("(begin)").unwrap(), Expr::Begin(vec![]));
        assert!(matches!(parse_str("(and)").unwrap(), Expr::And(v) if v.is_empty()));
        assert!(matches!(parse_str("(or 1 2)").unwrap(), Expr::Or(v) if v.len() == 2));
        expect_kind(
            parse_str("(set! 5 1)"),
            ParseErrorKind::BadBinding,
            "set! target",
        );
        expect_kind(parse_str("(set! x)"), ParseErrorKind::BadArity, "set!/1");
        expect_kind(parse_str("(else 1)"), ParseErrorKind::InvalidSyntax, "else");
    }

    #[test]
    fn test_cond_rules() {
        assert!(matches!(
            parse_str("(cond ((= 1 1) 2) (else 3))").unwrap(),
            Expr::Cond(clauses) if clauses.len() == 2 && clauses[1].test == Expr::True
        ));
        // a head-only clause yields its test value
        assert!(matches!(
            parse_str("(cond (#f) (1))").unwrap(),
            Expr::Cond(clauses) if clauses[1].body.is_empty()
        ));
        expect_kind(parse_str("(cond)"), ParseErrorKind::BadArity, "cond/0");
        expect_kind(
            parse_str("(cond (else 1) (#t 2))"),
            ParseErrorKind::InvalidSyntax,
            "else not last",
        );
        expect_kind(
            parse_str("(cond (else))"),
            ParseErrorKind::InvalidSyntax,
            "else without body",
        );
        expect_kind(
            parse_str("(cond ())"),
            ParseErrorKind::InvalidSyntax,
            "empty clause",
        );
        expect_kind(
            parse_str("(cond 5)"),
            ParseErrorKind::InvalidSyntax,
            "non-list clause",
        );

        // a bound `else` loses its special meaning
        let env = Environment::new();
        env.define("else", crate::value::Value::int(1));
        assert!(matches!(
            parse_str_in("(cond (else 2))", &env).unwrap(),
            Expr::Cond(clauses) if clauses[0].test == Expr::Var("else".to_owned())
        ));
    }

    #[test]
    fn test_lambda_rules() {
        match parse_str("(lambda (x y) (+ x y))").unwrap() {
            Expr::Lambda(formals, body) => {
                assert_eq!(formals, vec!["x", "y"]);
                // + is not shadowed by the formals, so the body is a prim
                assert!(matches!(*body, Expr::Prim { .. }));
            }
            other => panic!("expected lambda, got {other:?}"),
        }

        // multi-form bodies become an implicit begin
        assert!(matches!(
            parse_str("(lambda (x) 1 2)").unwrap(),
            Expr::Lambda(_, body) if matches!(*body, Expr::Begin(_))
        ));

        expect_kind(
            parse_str("(lambda (x x) x)"),
            ParseErrorKind::BadBinding,
            "duplicate formal",
        );
        expect_kind(
            parse_str("(lambda (1) 1)"),
            ParseErrorKind::BadBinding,
            "non-identifier formal",
        );
        expect_kind(
            parse_str("(lambda (@rest) 1)"),
            ParseErrorKind::BadBinding,
            "@ formal",
        );
        expect_kind(
            parse_str("(lambda x x)"),
            ParseErrorKind::BadBinding,
            "formals not a list",
        );
        expect_kind(parse_str("(lambda (x))"), ParseErrorKind::BadArity, "no body");
    }

    #[test]
    fn test_define_rules() {
        assert!(matches!(
            parse_str("(define x 1)").unwrap(),
            Expr::Define(name, _) if name == "x"
        ));
        // function sugar desugars to a lambda
        match parse_str("(define (f n) (* n n))").unwrap() {
            Expr::Define(name, rhs) => {
                assert_eq!(name, "f");
                assert!(matches!(*rhs, Expr::Lambda(ref formals, _) if formals == &["n"]));
            }
            other => panic!("expected define, got {other:?}"),
        }

        // primitive names may be redefined; reserved words may not
        assert!(parse_str("(define + (lambda (a b) (list a b)))").is_ok());
        expect_kind(
            parse_str("(define lambda 1)"),
            ParseErrorKind::BadBinding,
            "define lambda",
        );
        expect_kind(
            parse_str("(define else 1)"),
            ParseErrorKind::BadBinding,
            "define else",
        );
        expect_kind(
            parse_str("(define 5 1)"),
            ParseErrorKind::BadBinding,
            "define number",
        );
        expect_kind(
            parse_str("(define .5 1)"),
            ParseErrorKind::BadBinding,
            "define numeric-looking",
        );
        expect_kind(parse_str("(define x)"), ParseErrorKind::BadArity, "define/1");
    }

    #[test]
    fn test_let_and_letrec_rules() {
        assert!(matches!(
            parse_str("(let ((x 1) (y 2)) (+ x y))").unwrap(),
            Expr::Let(bindings, _) if bindings.len() == 2
        ));
        assert!(matches!(
            parse_str("(letrec ((f (lambda () (f)))) (f))").unwrap(),
            Expr::Letrec(..)
        ));
        expect_kind(
            parse_str("(let ((x 1) (x 2)) x)"),
            ParseErrorKind::BadBinding,
            "duplicate let name",
        );
        expect_kind(
            parse_str("(let ((x)) x)"),
            ParseErrorKind::BadBinding,
            "binding without expr",
        );
        expect_kind(
            parse_str("(let (x 1) x)"),
            ParseErrorKind::BadBinding,
            "malformed binding list",
        );
        expect_kind(parse_str("(let ())"), ParseErrorKind::BadArity, "no body");
    }

    #[test]
    fn test_shadowing_turns_forms_into_applications() {
        // global shadowing: a defined + parses as an application
        let env = Environment::new();
        env.define("+", crate::value::Value::int(0));
        assert!(matches!(
            parse_str_in("(+ 1 2)", &env).unwrap(),
            Expr::Apply(func, _) if matches!(*func, Expr::Var(ref n) if n == "+")
        ));

        // formal shadowing: reserved words and primitives lose their
        // meaning under a binding with the same name
        assert!(matches!(
            parse_str("(lambda (if) (if 1 2))").unwrap(),
            Expr::Lambda(_, body) if matches!(*body, Expr::Apply(..))
        ));
        assert!(matches!(
            parse_str("(lambda (car) (car 9))").unwrap(),
            Expr::Lambda(_, body) if matches!(*body, Expr::Apply(..))
        ));
        assert!(matches!(
            parse_str("(let ((cons 1)) (cons 1 2))").unwrap(),
            Expr::Let(_, body) if matches!(*body, Expr::Apply(..))
        ));

        // ...but only inside the binding form
        assert!(matches!(
            parse_str("(begin (lambda (car) car) (car (list 1)))").unwrap(),
            Expr::Begin(forms) if matches!(forms[1], Expr::Prim { .. })
        ));
    }

    #[test]
    fn test_application_forms() {
        assert!(matches!(
            parse_str("((lambda (x) x) 1)").unwrap(),
            Expr::Apply(..)
        ));
        // unknown head symbols are applications resolved at run time
        assert!(matches!(parse_str("(f 1 2)").unwrap(), Expr::Apply(..)));
        // a number in head position parses; failure comes at evaluation
        assert!(matches!(parse_str("(1 2 3)").unwrap(), Expr::Apply(..)));
    }
}
