// ABOUTME: Version banner and REPL defaults

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "rlisp";
pub const WELCOME_SUBTITLE: &str = "a small trampolined Lisp with mark-and-sweep GC";

/// History file used by the REPL, relative to the current directory.
pub const HISTORY_FILE: &str = ".rlisp_history";

/// How many evaluator steps pass between automatic garbage collections.
pub const GC_STEP_INTERVAL: usize = 10_000;

/// Bootstrap library loaded into the root environment on startup.
/// Quasiquote is defined here as an ordinary macro, not a core special
/// form: it expands a template into a tree of `cons`/`append`/`quote`
/// calls, and the usual "macro result is re-evaluated" rule handles the
/// rest. `+ - * /` are likewise rebound here as variadic/unary forms over
/// the strictly-2-ary `%+ %- %* %/` primitives, and `let` is rebound as a
/// macro expanding into nested `lambda` applications -- none of these are
/// core evaluator special forms.
pub const PRELUDE: &str = "
(define (append a b)
  (if (pair? a) (cons (car a) (append (cdr a) b)) b))

(define (reduce2 f acc rest)
  (if (pair? rest) (reduce2 f (f acc (car rest)) (cdr rest)) acc))

(define (+ . args)
  (if (pair? args) (reduce2 %+ (car args) (cdr args)) 0))

(define (* . args)
  (if (pair? args) (reduce2 %* (car args) (cdr args)) 1))

(define (- . args)
  (if (pair? args)
      (if (pair? (cdr args))
          (reduce2 %- (car args) (cdr args))
          (%- 0 (car args)))
      0))

(define (/ . args)
  (if (pair? args)
      (if (pair? (cdr args))
          (reduce2 %/ (car args) (cdr args))
          (%/ 1 (car args)))
      1))

(define (let-expand bindings body)
  (if (pair? bindings)
      (list (list (quote lambda) (list (car (car bindings)))
                  (let-expand (cdr bindings) body))
            (car (cdr (car bindings))))
      (cons (quote begin) body)))

(defmacro (let bindings . body) (let-expand bindings body))

(define (qq-splice? x)
  (if (pair? x) (eq? (car x) (quote unquote-splicing)) nil))

(define (qq-expand x depth)
  (if (pair? x)
      (if (eq? (car x) (quote unquote))
          (if (= depth 1)
              (car (cdr x))
              (list (quote list) (list (quote quote) (quote unquote))
                    (qq-expand (car (cdr x)) (- depth 1))))
          (if (eq? (car x) (quote quasiquote))
              (list (quote list) (list (quote quote) (quote quasiquote))
                    (qq-expand (car (cdr x)) (+ depth 1)))
              (qq-expand-list x depth)))
      (list (quote quote) x)))

(define (qq-expand-list x depth)
  (if (pair? x)
      (if (qq-splice? (car x))
          (if (= depth 1)
              (list (quote append) (car (cdr (car x))) (qq-expand-list (cdr x) depth))
              (list (quote cons) (qq-expand (car x) depth) (qq-expand-list (cdr x) depth)))
          (list (quote cons) (qq-expand (car x) depth) (qq-expand-list (cdr x) depth)))
      (qq-expand x depth)))

(defmacro (quasiquote template) (qq-expand template 1))
";
