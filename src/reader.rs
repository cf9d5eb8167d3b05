//! The reader: source text to [`Syntax`] trees.
//!
//! Tokens are maximal runs of non-delimiter characters classified after
//! the fact: integer literals (optional `-` sign), rational literals
//! `n/d`, `#t`/`#f`, and otherwise identifiers. The reader is deliberately
//! permissive about identifiers — digit-leading tokens such as `1e-3` and
//! sign-leading tokens such as `+123` are read as identifiers and
//! reinterpreted as numbers during evaluation. Strings run between double
//! quotes with no escape processing, `'x` expands to `(quote x)`, and `;`
//! comments extend to the end of the line.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, multispace1},
    combinator::map,
    error::ErrorKind,
    multi::many0,
    sequence::pair,
};

use crate::syntax::Syntax;
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\'' | ';')
}

/// Skip whitespace and `;` line comments.
fn ignored(input: &str) -> IResult<&str, ()> {
    map(
        many0(alt((
            map(multispace1, |_| ()),
            map(pair(char(';'), take_till(|c| c == '\n')), |_| ()),
        ))),
        |_| (),
    )
    .parse(input)
}

fn is_integer_token(tok: &str) -> bool {
    let digits = tok.strip_prefix('-').unwrap_or(tok);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Split a `n/d` rational literal into its digit runs, if `tok` is one.
fn rational_token(tok: &str) -> Option<(&str, &str)> {
    let (num, den) = tok.split_once('/')?;
    let num_digits = num.strip_prefix('-').unwrap_or(num);
    if num_digits.is_empty() || !num_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if den.is_empty() || !den.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((num, den))
}

fn classify_token(tok: &str) -> Result<Syntax, ErrorKind> {
    match tok {
        "#t" => return Ok(Syntax::True),
        "#f" => return Ok(Syntax::False),
        _ => {}
    }
    if tok.starts_with('#') {
        // no other # dispatch syntax exists in this language
        return Err(ErrorKind::Tag);
    }
    if is_integer_token(tok) {
        return tok
            .parse::<i64>()
            .map(Syntax::Fixnum)
            .map_err(|_| ErrorKind::Digit);
    }
    if let Some((num, den)) = rational_token(tok) {
        let num = num.parse::<i64>().map_err(|_| ErrorKind::Digit)?;
        let den = den.parse::<i64>().map_err(|_| ErrorKind::Digit)?;
        return Ok(Syntax::Rational(num, den));
    }
    Ok(Syntax::Ident(tok.to_owned()))
}

fn atom(input: &str) -> IResult<&str, Syntax> {
    let (rest, tok) = take_while1(|c: char| !is_delimiter(c)).parse(input)?;
    match classify_token(tok) {
        Ok(stx) => Ok((rest, stx)),
        Err(kind) => Err(nom::Err::Error(nom::error::Error::new(input, kind))),
    }
}

/// A string literal: everything up to the next `"`, no escapes.
fn string_literal(input: &str) -> IResult<&str, Syntax> {
    let (after_quote, _) = char('"').parse(input)?;
    match after_quote.find('"') {
        Some(end) => {
            let (text, rest) = after_quote.split_at(end);
            Ok((&rest[1..], Syntax::Str(text.to_owned())))
        }
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::TakeUntil,
        ))),
    }
}

fn quoted(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (input, _) = char('\'').parse(input)?;
    let (input, quoted_form) = form(input, depth + 1)?;
    Ok((
        input,
        Syntax::List(vec![Syntax::Ident("quote".to_owned()), quoted_form]),
    ))
}

fn list(input: &str, depth: usize) -> IResult<&str, Syntax> {
    let (mut input, _) = char('(').parse(input)?;
    let mut items = Vec::new();
    loop {
        let (rest, ()) = ignored(input)?;
        if let Ok((after_close, _)) = char::<&str, nom::error::Error<&str>>(')').parse(rest) {
            return Ok((after_close, Syntax::List(items)));
        }
        let (rest, item) = form(rest, depth + 1)?;
        items.push(item);
        input = rest;
    }
}

fn form(input: &str, depth: usize) -> IResult<&str, Syntax> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, ()) = ignored(input)?;
    // string_literal comes last so its unterminated-string error survives
    // alternation (alt reports the error of its final branch)
    alt((
        |i| quoted(i, depth),
        |i| list(i, depth),
        atom,
        string_literal,
    ))
    .parse(input)
}

/// Convert nom errors to user-facing messages with an input offset.
fn error_from_nom(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::new(
                    ParseErrorKind::TooDeeplyNested,
                    format!("form nested deeper than {MAX_PARSE_DEPTH} levels"),
                ),
                ErrorKind::TakeUntil => ParseError::new(
                    ParseErrorKind::Incomplete,
                    format!("unterminated string starting at position {position}"),
                ),
                ErrorKind::Digit => ParseError::new(
                    ParseErrorKind::InvalidNumber,
                    format!("numeric literal out of range at position {position}"),
                ),
                _ => {
                    if position < input.len() {
                        let near: String = input.chars().skip(position).take(12).collect();
                        ParseError::new(
                            ParseErrorKind::InvalidSyntax,
                            format!("invalid syntax near '{near}'"),
                        )
                    } else {
                        ParseError::new(ParseErrorKind::Incomplete, "unexpected end of input")
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => ParseError::new(ParseErrorKind::Incomplete, "incomplete input"),
    }
}

/// Read exactly one form; anything but trailing whitespace after it is an
/// error.
pub fn read(input: &str) -> Result<Syntax, Error> {
    let (rest, stx) = form(input, 0).map_err(|e| Error::Parse(error_from_nom(input, e)))?;
    let (rest, ()) = ignored(rest).map_err(|e| Error::Parse(error_from_nom(input, e)))?;
    if rest.is_empty() {
        Ok(stx)
    } else {
        let near: String = rest.chars().take(12).collect();
        Err(ParseError::new(
            ParseErrorKind::TrailingContent,
            format!("unexpected input after form: '{near}'"),
        )
        .into())
    }
}

/// Read a whole stream of top-level forms; an empty stream is fine.
pub fn read_all(input: &str) -> Result<Vec<Syntax>, Error> {
    let mut forms = Vec::new();
    let mut rest = input;
    loop {
        let (after_ws, ()) = ignored(rest).map_err(|e| Error::Parse(error_from_nom(input, e)))?;
        if after_ws.is_empty() {
            return Ok(forms);
        }
        let (after, stx) =
            form(after_ws, 0).map_err(|e| Error::Parse(error_from_nom(input, e)))?;
        forms.push(stx);
        rest = after;
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    enum Expect {
        Ok(Syntax),
        Err(ParseErrorKind),
    }

    fn ident(name: &str) -> Syntax {
        Syntax::Ident(name.to_owned())
    }

    fn run_read_tests(cases: Vec<(&str, Expect)>) {
        for (i, (input, expected)) in cases.into_iter().enumerate() {
            let id = format!("read test #{} ({input:?})", i + 1);
            match (read(input), expected) {
                (Ok(actual), Expect::Ok(want)) => assert_eq!(actual, want, "{id}"),
                (Err(Error::Parse(e)), Expect::Err(kind)) => {
                    assert_eq!(e.kind, kind, "{id}: {e}");
                }
                (got, _) => panic!("{id}: unexpected result {got:?}"),
            }
        }
    }

    #[test]
    fn test_atoms() {
        run_read_tests(vec![
            ("42", Expect::Ok(Syntax::Fixnum(42))),
            ("-5", Expect::Ok(Syntax::Fixnum(-5))),
            ("0", Expect::Ok(Syntax::Fixnum(0))),
            ("9223372036854775807", Expect::Ok(Syntax::Fixnum(i64::MAX))),
            // sign-leading and digit-leading tokens stay identifiers;
            // the evaluator reinterprets them
            ("+123", Expect::Ok(ident("+123"))),
            ("1e-3", Expect::Ok(ident("1e-3"))),
            (".5", Expect::Ok(ident(".5"))),
            ("123abc", Expect::Ok(ident("123abc"))),
            // rational literals
            ("2/4", Expect::Ok(Syntax::Rational(2, 4))),
            ("-1/2", Expect::Ok(Syntax::Rational(-1, 2))),
            ("1/0", Expect::Ok(Syntax::Rational(1, 0))), // rejected later
            ("1/2/3", Expect::Ok(ident("1/2/3"))),
            // booleans and other # tokens
            ("#t", Expect::Ok(Syntax::True)),
            ("#f", Expect::Ok(Syntax::False)),
            ("#true", Expect::Err(ParseErrorKind::InvalidSyntax)),
            ("#x1A", Expect::Err(ParseErrorKind::InvalidSyntax)),
            // identifiers
            ("foo", Expect::Ok(ident("foo"))),
            ("set-car!", Expect::Ok(ident("set-car!"))),
            ("+", Expect::Ok(ident("+"))),
            ("<=", Expect::Ok(ident("<="))),
            (".", Expect::Ok(ident("."))),
            // strings: no escapes, terminated by the next quote
            ("\"hello\"", Expect::Ok(Syntax::Str("hello".to_owned()))),
            ("\"\"", Expect::Ok(Syntax::Str(String::new()))),
            (
                "\"back\\slash\"",
                Expect::Ok(Syntax::Str("back\\slash".to_owned())),
            ),
            ("\"open", Expect::Err(ParseErrorKind::Incomplete)),
            // out-of-range literals are read errors
            ("99999999999999999999", Expect::Err(ParseErrorKind::InvalidNumber)),
            ("1/99999999999999999999", Expect::Err(ParseErrorKind::InvalidNumber)),
        ]);
    }

    #[test]
    fn test_lists_and_quote() {
        run_read_tests(vec![
            ("()", Expect::Ok(Syntax::List(vec![]))),
            ("(   )", Expect::Ok(Syntax::List(vec![]))),
            (
                "(+ 1 2)",
                Expect::Ok(Syntax::List(vec![
                    ident("+"),
                    Syntax::Fixnum(1),
                    Syntax::Fixnum(2),
                ])),
            ),
            (
                "( a ( b ) )",
                Expect::Ok(Syntax::List(vec![
                    ident("a"),
                    Syntax::List(vec![ident("b")]),
                ])),
            ),
            (
                "(a . b)",
                Expect::Ok(Syntax::List(vec![ident("a"), ident("."), ident("b")])),
            ),
            (
                "'x",
                Expect::Ok(Syntax::List(vec![ident("quote"), ident("x")])),
            ),
            (
                "''x",
                Expect::Ok(Syntax::List(vec![
                    ident("quote"),
                    Syntax::List(vec![ident("quote"), ident("x")]),
                ])),
            ),
            (
                "'(1 2)",
                Expect::Ok(Syntax::List(vec![
                    ident("quote"),
                    Syntax::List(vec![Syntax::Fixnum(1), Syntax::Fixnum(2)]),
                ])),
            ),
            // whitespace and comments
            ("  42  ", Expect::Ok(Syntax::Fixnum(42))),
            ("; note\n42", Expect::Ok(Syntax::Fixnum(42))),
            (
                "(1 ; inline\n 2)",
                Expect::Ok(Syntax::List(vec![Syntax::Fixnum(1), Syntax::Fixnum(2)])),
            ),
            // errors
            ("(1 2", Expect::Err(ParseErrorKind::Incomplete)),
            (")", Expect::Err(ParseErrorKind::InvalidSyntax)),
            ("", Expect::Err(ParseErrorKind::Incomplete)),
            ("   ", Expect::Err(ParseErrorKind::Incomplete)),
            ("1 2", Expect::Err(ParseErrorKind::TrailingContent)),
            ("(1) extra", Expect::Err(ParseErrorKind::TrailingContent)),
        ]);
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        match read(&at_limit) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
            other => panic!("expected depth error, got {other:?}"),
        }

        let under_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        assert!(read(&under_limit).is_ok());

        let quotes_at_limit = format!("{}a", "'".repeat(MAX_PARSE_DEPTH));
        match read(&quotes_at_limit) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_all() {
        let forms = read_all("(define x 1)\nx ; trailing comment\n").unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[1], ident("x"));

        assert_eq!(read_all("").unwrap(), vec![]);
        assert_eq!(read_all(" ; only a comment").unwrap(), vec![]);

        match read_all("(f 1) (g") {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::Incomplete),
            other => panic!("expected incomplete error, got {other:?}"),
        }
    }
}
