// ABOUTME: Root-environment built-in functions

use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::interpreter::Interpreter;
use crate::value::{values_eq, Value};

pub fn register(interp: &mut Interpreter) {
    interp.define_builtin("CAR", car);
    interp.define_builtin("CDR", cdr);
    interp.define_builtin("CONS", cons);
    interp.define_builtin("PAIR?", is_pair);
    interp.define_builtin("EQ?", eq);
    // The 2-ary primitives. `+ - * /` are rebound as variadic/unary forms
    // over these by the bootstrap prelude (see config::PRELUDE), per the
    // names-prefixed-with-`%`-are-primitives convention below.
    interp.define_builtin("%+", add);
    interp.define_builtin("%-", sub);
    interp.define_builtin("%*", mul);
    interp.define_builtin("%/", div);
    interp.define_builtin("=", num_eq);
    interp.define_builtin("<", num_lt);
    interp.define_builtin("<=", num_le);
    interp.define_builtin(">", num_gt);
    interp.define_builtin(">=", num_ge);
    interp.define_builtin("LIST", list);
    interp.define_builtin("APPLY", apply);
}

fn arity2(function: &str, args: &[Value]) -> Result<(Value, Value), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::args(function, ARITY_TWO, args.len()));
    }
    Ok((args[0], args[1]))
}

fn arity1(function: &str, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::args(function, ARITY_ONE, args.len()));
    }
    Ok(args[0])
}

fn expect_pair(function: &str, v: Value) -> Result<crate::heap::PairRef, EvalError> {
    match v {
        Value::Pair(r) => Ok(r),
        other => Err(EvalError::type_error(function, "pair", &other, 1)),
    }
}

/// `(car p)`: first element of a pair. Called on anything else, including
/// `NIL`, this is a type error -- there is no "car of nil" special case.
fn car(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let v = arity1("CAR", args)?;
    let pair = expect_pair("CAR", v)?;
    Ok(interp.heap.car(pair))
}

fn cdr(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let v = arity1("CDR", args)?;
    let pair = expect_pair("CDR", v)?;
    Ok(interp.heap.cdr(pair))
}

fn cons(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("CONS", args)?;
    Ok(Value::Pair(interp.heap.alloc(a, b)))
}

fn is_pair(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let v = arity1("PAIR?", args)?;
    Ok(truthy(interp, matches!(v, Value::Pair(_))))
}

fn eq(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("EQ?", args)?;
    Ok(truthy(interp, values_eq(a, b)))
}

/// The canonical truth value is the symbol `T`, not an arbitrary non-nil
/// value, per the reader's `NIL`/`T` pair of reserved literals.
fn truthy(interp: &Interpreter, b: bool) -> Value {
    if b {
        interp.truth()
    } else {
        Value::Nil
    }
}

fn int_arg(function: &str, v: Value, position: usize) -> Result<i64, EvalError> {
    match v {
        Value::Integer(n) => Ok(n),
        other => Err(EvalError::type_error(function, "integer", &other, position)),
    }
}

fn add(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("%+", args)?;
    Ok(Value::Integer(int_arg("%+", a, 1)? + int_arg("%+", b, 2)?))
}

fn sub(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("%-", args)?;
    Ok(Value::Integer(int_arg("%-", a, 1)? - int_arg("%-", b, 2)?))
}

fn mul(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("%*", args)?;
    Ok(Value::Integer(int_arg("%*", a, 1)? * int_arg("%*", b, 2)?))
}

fn div(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("%/", args)?;
    let (x, y) = (int_arg("%/", a, 1)?, int_arg("%/", b, 2)?);
    if y == 0 {
        return Err(EvalError::type_error("%/", "nonzero divisor", &b, 2));
    }
    Ok(Value::Integer(x / y))
}

fn num_eq(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("=", args)?;
    Ok(truthy(interp, int_arg("=", a, 1)? == int_arg("=", b, 2)?))
}

fn num_lt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("<", args)?;
    Ok(truthy(interp, int_arg("<", a, 1)? < int_arg("<", b, 2)?))
}

fn num_le(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2("<=", args)?;
    Ok(truthy(interp, int_arg("<=", a, 1)? <= int_arg("<=", b, 2)?))
}

fn num_gt(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2(">", args)?;
    Ok(truthy(interp, int_arg(">", a, 1)? > int_arg(">", b, 2)?))
}

fn num_ge(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = arity2(">=", args)?;
    Ok(truthy(interp, int_arg(">=", a, 1)? >= int_arg(">=", b, 2)?))
}

/// `(list a b c)`: convenience builtin, not part of the named-builtin set
/// the evaluator's special forms rely on, but needed by anything (macros,
/// `apply`) that wants to build an argument list at runtime.
fn list(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    Ok(interp.vec_to_list(args))
}

/// First-class `apply`, for when it's passed around as a value rather
/// than written literally in call position (where the evaluator's
/// special-form handling gives it a true tail call instead).
fn apply(interp: &mut Interpreter, args: &[Value]) -> Result<Value, EvalError> {
    let (f, arg_list) = arity2("APPLY", args)?;
    let call_args = interp.list_to_vec(arg_list, "APPLY")?;
    interp.apply_blocking(f, &call_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval1(src: &str) -> Value {
        let mut interp = Interpreter::new();
        let exprs = interp.read(src).unwrap();
        let mut result = Value::Nil;
        for expr in exprs {
            result = interp.eval_top(expr).unwrap();
        }
        result
    }

    #[test]
    fn test_car_cdr_cons() {
        assert!(matches!(eval1("(car (cons 1 2))"), Value::Integer(1)));
        assert!(matches!(eval1("(cdr (cons 1 2))"), Value::Integer(2)));
    }

    #[test]
    fn test_car_of_non_pair_is_type_error() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(car 5)").unwrap();
        assert!(matches!(
            interp.eval_top(exprs[0]),
            Err(EvalError::Type { .. })
        ));
    }

    #[test]
    fn test_pair_predicate() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(pair? (cons 1 2))").unwrap();
        let v = interp.eval_top(exprs[0]).unwrap();
        assert!(!v.is_nil());
        let exprs = interp.read("(pair? 5)").unwrap();
        let v = interp.eval_top(exprs[0]).unwrap();
        assert!(v.is_nil());
    }

    #[test]
    fn test_eq_identity_on_symbols_and_integers() {
        assert!(!eval1("(eq? 'a 'a)").is_nil());
        assert!(!eval1("(eq? 3 3)").is_nil());
        assert!(eval1("(eq? 3 4)").is_nil());
    }

    #[test]
    fn test_primitive_arithmetic_is_strictly_binary() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(%+ 1 2 3)").unwrap();
        assert!(interp.eval_top(exprs[0]).is_err());
    }

    #[test]
    fn test_arithmetic_is_variadic_via_bootstrap_rebinding() {
        assert!(matches!(eval1("(+ 1 2 3)"), Value::Integer(6)));
        assert!(matches!(eval1("(+)"), Value::Integer(0)));
        assert!(matches!(eval1("(+ 5)"), Value::Integer(5)));
        assert!(matches!(eval1("(* 1 2 3 4)"), Value::Integer(24)));
        assert!(matches!(eval1("(*)"), Value::Integer(1)));
        assert!(matches!(eval1("(- 10 1 2)"), Value::Integer(7)));
        assert!(matches!(eval1("(- 5)"), Value::Integer(-5)));
        assert!(matches!(eval1("(/ 100 5 2)"), Value::Integer(10)));
    }

    #[test]
    fn test_arithmetic_results() {
        assert!(matches!(eval1("(+ 1 2)"), Value::Integer(3)));
        assert!(matches!(eval1("(- 5 2)"), Value::Integer(3)));
        assert!(matches!(eval1("(* 4 5)"), Value::Integer(20)));
        assert!(matches!(eval1("(/ 9 3)"), Value::Integer(3)));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(/ 1 0)").unwrap();
        assert!(interp.eval_top(exprs[0]).is_err());
    }

    #[test]
    fn test_comparisons() {
        assert!(!eval1("(< 1 2)").is_nil());
        assert!(eval1("(< 2 1)").is_nil());
        assert!(!eval1("(<= 2 2)").is_nil());
        assert!(!eval1("(>= 2 2)").is_nil());
        assert!(!eval1("(> 3 2)").is_nil());
        assert!(!eval1("(= 2 2)").is_nil());
    }

    #[test]
    fn test_list_builtin_builds_proper_list() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(list 1 2 3)").unwrap();
        let v = interp.eval_top(exprs[0]).unwrap();
        assert_eq!(interp.print(&v), "(1 2 3)");
    }

    #[test]
    fn test_apply_as_first_class_value() {
        let mut interp = Interpreter::new();
        let exprs = interp.read("(define f apply) (f + (list 1 2 3))").unwrap();
        let mut result = Value::Nil;
        for expr in exprs {
            result = interp.eval_top(expr).unwrap();
        }
        assert!(matches!(result, Value::Integer(6)));
    }
}
