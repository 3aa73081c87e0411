// ABOUTME: Integration tests covering the interpreter's end-to-end testable properties

use rlisp::Interpreter;
use rlisp::value::Value;

fn run(interp: &mut Interpreter, src: &str) -> Value {
    let exprs = interp.read(src).expect("parse error");
    let mut result = Value::Nil;
    for expr in exprs {
        result = interp.eval_top(expr).expect("eval error");
    }
    result
}

fn run_print(src: &str) -> String {
    let mut interp = Interpreter::new();
    let result = run(&mut interp, src);
    interp.print(&result)
}

#[test]
fn test_read_print_identity_on_varied_structure() {
    let mut interp = Interpreter::new();
    for src in ["42", "-7", "NIL", "X", "(1 2 3)", "(A . B)", "(A (B C) D)"] {
        let v = interp.read(src).unwrap()[0];
        assert_eq!(interp.print(&v), src);
    }
}

#[test]
fn test_symbol_interning_makes_eq_true_across_separate_reads() {
    assert_eq!(run_print("(eq? (quote foo) (quote FOO))"), "T");
}

#[test]
fn test_eval_of_quote_returns_argument_unevaluated() {
    assert_eq!(run_print("(quote (+ 1 2))"), "(+ 1 2)");
}

#[test]
fn test_lexical_scope_update_in_place_through_closure() {
    let src = "(define x 1) (define f (lambda () x)) (define x 2) (f)";
    assert_eq!(run_print(src), "2");
}

#[test]
fn test_tail_call_safety_at_large_iteration_count() {
    let src = "(define (loop n acc) (if (eq? n 0) acc (loop (- n 1) (+ acc 1)))) (loop 100000 0)";
    assert_eq!(run_print(src), "100000");
}

#[test]
fn test_gc_soundness_reachable_data_survives_many_collections() {
    let mut interp = Interpreter::new();
    run(&mut interp, "(define keep (cons 1 (cons 2 (cons 3 nil))))");
    for _ in 0..5 {
        run(&mut interp, "(gc)");
    }
    assert_eq!(run_print_in(&mut interp, "keep"), "(1 2 3)");
}

fn run_print_in(interp: &mut Interpreter, src: &str) -> String {
    let v = run(interp, src);
    interp.print(&v)
}

#[test]
fn test_higher_order_function_and_closures() {
    let src = "(define (make-adder n) (lambda (x) (+ x n))) (define add10 (make-adder 10)) (add10 32)";
    assert_eq!(run_print(src), "42");
}

#[test]
fn test_variadic_params_collect_into_list() {
    assert_eq!(run_print("(define (f a . rest) rest) (f 1 2 3 4)"), "(2 3 4)");
}

#[test]
fn test_defmacro_expansion_is_reevaluated_in_call_site_env() {
    let src = "(defmacro (my-when c body) (list (quote if) c body nil)) (define y 10) (my-when (> y 5) y)";
    assert_eq!(run_print(src), "10");
}

#[test]
fn test_quasiquote_with_unquote_splicing() {
    let src = "(define xs (list 2 3)) `(1 ,@xs 4)";
    assert_eq!(run_print(src), "(1 2 3 4)");
}

#[test]
fn test_apply_special_form_and_builtin_agree() {
    assert_eq!(run_print("(apply + (list 3 4))"), "7");
    assert_eq!(run_print("(define f apply) (f + (list 3 4))"), "7");
}

#[test]
fn test_let_is_sequential_and_scoped() {
    assert_eq!(run_print("(let ((x 1) (y (+ x 1))) y)"), "2");
}

#[test]
fn test_begin_empty_body_is_nil() {
    assert_eq!(run_print("(begin)"), "NIL");
}

#[test]
fn test_unbound_symbol_is_reported_as_unbound_error() {
    let mut interp = Interpreter::new();
    let exprs = interp.read("undefined-name").unwrap();
    let err = interp.eval_top(exprs[0]).unwrap_err();
    assert!(matches!(err, rlisp::error::EvalError::Unbound(_)));
}

#[test]
fn test_wrong_argument_count_is_args_error() {
    let mut interp = Interpreter::new();
    let exprs = interp.read("(if 1 2)").unwrap();
    let err = interp.eval_top(exprs[0]).unwrap_err();
    assert!(matches!(err, rlisp::error::EvalError::Args { .. }));
}

#[test]
fn test_wrong_argument_type_is_type_error() {
    let mut interp = Interpreter::new();
    let exprs = interp.read("(car 5)").unwrap();
    let err = interp.eval_top(exprs[0]).unwrap_err();
    assert!(matches!(err, rlisp::error::EvalError::Type { .. }));
}

#[test]
fn test_malformed_source_is_syntax_error() {
    let mut interp = Interpreter::new();
    assert!(interp.read("(1 2").is_err());
}
