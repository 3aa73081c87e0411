// ABOUTME: Reader module: turns source text into heap-allocated Values

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn line_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

fn whitespace_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((value((), multispace1), line_comment)))
        .map(|_| ())
        .parse(input)
}

fn is_delimiter(c: char) -> bool {
    c == '(' || c == ')' || c.is_whitespace()
}

/// A single lexical token: a delimiter, a reader-macro prefix, or a
/// maximal run of non-delimiter characters (an atom).
fn next_token(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(char('(')),
        recognize(char(')')),
        recognize(char('\'')),
        recognize(char('`')),
        recognize(tag(",@")),
        recognize(char(',')),
        take_while1(|c: char| !is_delimiter(c)),
    ))
    .parse(input)
}

/// Reads one expression from the front of `input`, returning the value and
/// the unconsumed remainder. Threads `interp` through so list construction
/// can allocate pairs directly on the heap as it reads, instead of
/// building an intermediate AST that would need a second pass.
pub fn read_expr<'a>(
    interp: &mut Interpreter,
    input: &'a str,
) -> Result<(Value, &'a str), EvalError> {
    let (input, _) = whitespace_and_comments(input)
        .map_err(|_| EvalError::syntax("could not skip whitespace"))?;
    if input.is_empty() {
        return Err(EvalError::syntax("unexpected end of input"));
    }
    let (rest, token) =
        next_token(input).map_err(|_| EvalError::syntax("could not read a token"))?;

    match token {
        "(" => read_list(interp, rest),
        ")" => Err(EvalError::syntax("unexpected ')'")),
        "'" => read_wrapped(interp, rest, "QUOTE"),
        "`" => read_wrapped(interp, rest, "QUASIQUOTE"),
        ",@" => read_wrapped(interp, rest, "UNQUOTE-SPLICING"),
        "," => read_wrapped(interp, rest, "UNQUOTE"),
        atom => Ok((read_atom(interp, atom), rest)),
    }
}

fn read_wrapped<'a>(
    interp: &mut Interpreter,
    input: &'a str,
    keyword: &str,
) -> Result<(Value, &'a str), EvalError> {
    let (value, rest) = read_expr(interp, input)?;
    let sym = Value::Symbol(interp.intern(keyword));
    let inner = interp.heap.alloc(value, Value::Nil);
    let list = interp.heap.alloc(sym, Value::Pair(inner));
    Ok((Value::Pair(list), rest))
}

/// Reads the contents of a list after the opening `(` has been consumed.
/// Builds the list left to right with a moving tail pointer so no reverse
/// pass is needed, and supports a dotted tail via `.`.
fn read_list<'a>(
    interp: &mut Interpreter,
    mut input: &'a str,
) -> Result<(Value, &'a str), EvalError> {
    let mut head: Option<crate::heap::PairRef> = None;
    let mut tail: Option<crate::heap::PairRef> = None;

    loop {
        let (after_ws, _) = whitespace_and_comments(input)
            .map_err(|_| EvalError::syntax("could not skip whitespace"))?;
        if after_ws.is_empty() {
            return Err(EvalError::syntax("unterminated list"));
        }
        let (peeked_rest, token) =
            next_token(after_ws).map_err(|_| EvalError::syntax("could not read a token"))?;

        if token == ")" {
            input = peeked_rest;
            break;
        }

        if token == "." {
            let (dotted_tail, rest_after_tail) = read_expr(interp, peeked_rest)?;
            let (after_ws2, _) = whitespace_and_comments(rest_after_tail)
                .map_err(|_| EvalError::syntax("could not skip whitespace"))?;
            let (rest_after_close, close) =
                next_token(after_ws2).map_err(|_| EvalError::syntax("expected ')'"))?;
            if close != ")" {
                return Err(EvalError::syntax("malformed dotted list"));
            }
            match tail {
                Some(t) => interp.heap.set_cdr(t, dotted_tail),
                None => return Err(EvalError::syntax("'.' cannot be the first token in a list")),
            }
            input = rest_after_close;
            break;
        }

        let (item, rest_after_item) = read_expr(interp, after_ws)?;
        input = rest_after_item;

        let new_cell = interp.heap.alloc(item, Value::Nil);
        match tail {
            Some(t) => {
                interp.heap.set_cdr(t, Value::Pair(new_cell));
                tail = Some(new_cell);
            }
            None => {
                head = Some(new_cell);
                tail = Some(new_cell);
            }
        }
    }

    Ok((head.map_or(Value::Nil, Value::Pair), input))
}

/// Classifies a bare token: an integer literal, the `NIL` literal, or a
/// symbol (case-folded to upper case and interned).
fn read_atom(interp: &mut Interpreter, token: &str) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::Integer(n);
    }
    let upper = token.to_uppercase();
    if upper == "NIL" {
        return Value::Nil;
    }
    Value::Symbol(interp.intern(&upper))
}

/// Reads every top-level expression in `source`, erroring if anything but
/// whitespace/comments trails the last one.
pub fn read_all(interp: &mut Interpreter, source: &str) -> Result<Vec<Value>, EvalError> {
    let mut exprs = Vec::new();
    let mut rest = source;
    loop {
        let (after_ws, _) = whitespace_and_comments(rest)
            .map_err(|_| EvalError::syntax("could not skip whitespace"))?;
        if after_ws.is_empty() {
            break;
        }
        let (value, remainder) = read_expr(interp, after_ws)?;
        exprs.push(value);
        rest = remainder;
    }
    Ok(exprs)
}
