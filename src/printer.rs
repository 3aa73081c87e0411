// ABOUTME: Printer module: renders Values back to canonical text

use crate::interpreter::Interpreter;
use crate::value::Value;

/// Renders `v` as canonical Lisp text. Every value prints to unique,
/// read-back-equal text except `Builtin`, `Closure` and `Macro`, which
/// print as opaque tags -- printing a closure's captured environment in
/// full would have to walk a graph that can contain the closure itself
/// (see the "a later rebind is visible through old closures" scenario),
/// so only its parameter list and body are shown.
pub fn print_value(interp: &Interpreter, v: &Value) -> String {
    let mut out = String::new();
    write_value(interp, v, &mut out);
    out
}

fn write_value(interp: &Interpreter, v: &Value, out: &mut String) {
    match v {
        Value::Nil => out.push_str("NIL"),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Symbol(s) => out.push_str(interp.symbol_name(*s)),
        Value::Pair(r) => write_list(interp, Value::Pair(*r), out),
        Value::Builtin(_) => out.push_str("#<BUILTIN>"),
        Value::Closure(r) => write_opaque(interp, "CLOSURE", *r, out),
        Value::Macro(r) => write_opaque(interp, "MACRO", *r, out),
    }
}

fn write_opaque(interp: &Interpreter, tag: &str, r: crate::heap::PairRef, out: &mut String) {
    let (_, rest) = interp.heap.pair_parts(r);
    let (params, body) = match rest {
        Value::Pair(p) => interp.heap.pair_parts(p),
        other => (other, Value::Nil),
    };
    out.push_str("#<");
    out.push_str(tag);
    out.push(' ');
    write_value(interp, &params, out);
    let mut body_rest = body;
    loop {
        match body_rest {
            Value::Nil => break,
            Value::Pair(p) => {
                let (car, cdr) = interp.heap.pair_parts(p);
                out.push(' ');
                write_value(interp, &car, out);
                body_rest = cdr;
            }
            other => {
                out.push_str(" . ");
                write_value(interp, &other, out);
                break;
            }
        }
    }
    out.push('>');
}

fn write_list(interp: &Interpreter, v: Value, out: &mut String) {
    out.push('(');
    let mut cur = v;
    let mut first = true;
    loop {
        match cur {
            Value::Pair(r) => {
                let (car, cdr) = interp.heap.pair_parts(r);
                if !first {
                    out.push(' ');
                }
                first = false;
                write_value(interp, &car, out);
                cur = cdr;
            }
            Value::Nil => break,
            other => {
                out.push_str(" . ");
                write_value(interp, &other, out);
                break;
            }
        }
    }
    out.push(')');
}
