// ABOUTME: The interpreter: owns the heap and symbol table, drives the trampolined evaluator

use crate::config::GC_STEP_INTERVAL;
use crate::env;
use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_THREE, ARITY_TWO, ARITY_ZERO};
use crate::heap::{Heap, PairRef};
use crate::parser::read_expr;
use crate::printer::print_value;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// A pending piece of evaluator work: what to do once the value currently
/// being computed is ready. This is the explicit frame stack that replaces
/// native recursion, so tail calls and deep recursion cost heap space
/// instead of Rust call-stack depth.
enum Frame {
    /// Evaluating the condition of `(IF c then else)`.
    If { env: Value, then_b: Value, else_b: Value },
    /// Evaluating the operator position of a call; `args` is the raw,
    /// unevaluated argument list.
    Operator { env: Value, args: Value },
    /// Evaluating one argument of a call to `op`; `acc_rev` holds the
    /// already-evaluated arguments in reverse order.
    Args {
        env: Value,
        op: Value,
        remaining: Value,
        acc_rev: Vec<Value>,
    },
    /// Evaluating a non-final expression in a body sequence (BEGIN,
    /// closure bodies); the result is discarded.
    Seq { env: Value, remaining: Value },
    /// Evaluating the value expression of `(DEFINE sym expr)`.
    Define { env: Value, sym: Symbol },
    /// Evaluating the function-expression of `(APPLY f args)`.
    ApplyOperator { env: Value, args_expr: Value },
    /// Evaluating the argument-list expression of `(APPLY f args)`.
    ApplyArgs { env: Value, f: Value },
    /// Waiting for a macro body's expansion result, to be re-dispatched as
    /// a fresh expression in the original call-site environment.
    MacroExpand { env: Value },
}

/// Either a value ready to feed back into the frame stack, or a new
/// (expr, env) pair to keep evaluating -- used to implement tail calls
/// without growing the Rust stack.
enum Step {
    Value(Value),
    Redirect(Value, Value),
}

pub struct Interpreter {
    pub heap: Heap,
    pub symbols: SymbolTable,
    pub root_env: Value,
    sym_quote: Symbol,
    sym_if: Symbol,
    sym_lambda: Symbol,
    sym_define: Symbol,
    sym_defmacro: Symbol,
    sym_begin: Symbol,
    sym_apply: Symbol,
    sym_gc: Symbol,
    sym_t: Symbol,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let mut symbols = SymbolTable::new();
        let root_env = env::create(&mut heap, Value::Nil);

        let sym_quote = symbols.intern("QUOTE");
        let sym_if = symbols.intern("IF");
        let sym_lambda = symbols.intern("LAMBDA");
        let sym_define = symbols.intern("DEFINE");
        let sym_defmacro = symbols.intern("DEFMACRO");
        let sym_begin = symbols.intern("BEGIN");
        let sym_apply = symbols.intern("APPLY");
        let sym_gc = symbols.intern("GC");
        let sym_t = symbols.intern("T");

        let mut interp = Interpreter {
            heap,
            symbols,
            root_env,
            sym_quote,
            sym_if,
            sym_lambda,
            sym_define,
            sym_defmacro,
            sym_begin,
            sym_apply,
            sym_gc,
            sym_t,
        };
        env::define(&mut interp.heap, root_env, sym_t, Value::Symbol(sym_t));
        crate::builtins::register(&mut interp);
        interp.load_prelude();
        interp
    }

    /// Loads the bootstrap library: Lisp-level definitions layered on top
    /// of the primitive special forms and built-ins. Quasiquote is not a
    /// core special form; it is a macro, like any user-defined one, that
    /// expands a template into a tree of `CONS`/`APPEND`/`QUOTE` calls and
    /// lets the ordinary re-evaluation of a macro's result do the rest.
    fn load_prelude(&mut self) {
        let exprs = self
            .read(crate::config::PRELUDE)
            .expect("prelude source failed to parse");
        for expr in exprs {
            self.eval_top(expr).expect("prelude definition failed to evaluate");
        }
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.symbols.name(sym)
    }

    /// The canonical truth value built-ins return: the symbol `T`, bound to
    /// itself in the root environment.
    pub fn truth(&self) -> Value {
        Value::Symbol(self.sym_t)
    }

    pub fn define_builtin(&mut self, name: &str, f: crate::value::BuiltinFn) {
        let sym = self.intern(name);
        let env = self.root_env;
        env::define(&mut self.heap, env, sym, Value::Builtin(f));
    }

    pub fn read(&mut self, source: &str) -> Result<Vec<Value>, EvalError> {
        crate::parser::read_all(self, source)
    }

    pub fn print(&self, v: &Value) -> String {
        print_value(self, v)
    }

    /// Evaluates a single expression in the root (top-level) environment.
    pub fn eval_top(&mut self, expr: Value) -> Result<Value, EvalError> {
        let env = self.root_env;
        self.eval(expr, env)
    }

    /// The trampoline: drives `expr`/`env` to a value using an explicit
    /// frame stack instead of native recursion, so tail calls and deep
    /// argument lists never overflow the Rust stack.
    pub fn eval(&mut self, expr0: Value, env0: Value) -> Result<Value, EvalError> {
        let mut expr = expr0;
        let mut env = env0;
        let mut stack: Vec<Frame> = Vec::new();
        let mut pending: Option<Value> = None;
        let mut steps: usize = 0;

        loop {
            steps += 1;
            if steps % GC_STEP_INTERVAL == 0 {
                self.maybe_collect(expr, env, &stack, pending);
            }

            let value = match pending.take() {
                Some(v) => v,
                None => match self.step(expr, env, &mut stack)? {
                    Step::Value(v) => v,
                    Step::Redirect(e2, env2) => {
                        expr = e2;
                        env = env2;
                        continue;
                    }
                },
            };

            match stack.pop() {
                None => return Ok(value),
                Some(frame) => match self.apply_frame(frame, value, &mut stack)? {
                    Step::Redirect(e2, env2) => {
                        expr = e2;
                        env = env2;
                    }
                    Step::Value(v2) => {
                        pending = Some(v2);
                    }
                },
            }
        }
    }

    fn maybe_collect(&mut self, expr: Value, env: Value, stack: &[Frame], pending: Option<Value>) {
        let roots = std::iter::once(expr)
            .chain(std::iter::once(env))
            .chain(pending)
            .chain(stack.iter().flat_map(frame_roots));
        self.heap.collect(roots);
    }

    /// Forces a collection using the current root environment and symbol
    /// table as roots. Used by the top-level `(GC)` special form.
    pub fn collect_garbage(&mut self) {
        let root_env = self.root_env;
        self.heap.collect(std::iter::once(root_env));
    }

    /// Evaluates `expr` in `env` by exactly one reduction step: atoms
    /// resolve immediately, compound forms either return a value directly
    /// (quote) or push a continuation frame and redirect to a subexpression.
    fn step(&mut self, expr: Value, env: Value, stack: &mut Vec<Frame>) -> Result<Step, EvalError> {
        match expr {
            Value::Nil | Value::Integer(_) | Value::Builtin(_) | Value::Closure(_) | Value::Macro(_) => {
                Ok(Step::Value(expr))
            }
            Value::Symbol(s) => match env::get(&self.heap, env, s) {
                Some(v) => Ok(Step::Value(v)),
                None => Err(EvalError::unbound(self.symbols.name(s))),
            },
            Value::Pair(r) => self.step_list(r, env, stack),
        }
    }

    fn step_list(
        &mut self,
        r: PairRef,
        env: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<Step, EvalError> {
        let (head, args) = self.heap.pair_parts(r);

        if let Value::Symbol(s) = head {
            if s == self.sym_quote {
                let (v, rest) = self.list1(args, "QUOTE")?;
                let _ = rest;
                return Ok(Step::Value(v));
            }
            if s == self.sym_if {
                let items = self.list_exactly(args, 3, "IF")?;
                stack.push(Frame::If {
                    env,
                    then_b: items[1],
                    else_b: items[2],
                });
                return Ok(Step::Redirect(items[0], env));
            }
            if s == self.sym_lambda {
                return Ok(Step::Value(self.make_closure(env, args, "LAMBDA")?));
            }
            if s == self.sym_define {
                return self.step_define(args, env, stack);
            }
            if s == self.sym_defmacro {
                return self.step_defmacro(args, env);
            }
            if s == self.sym_begin {
                return self.step_sequence(args, env, stack, "BEGIN");
            }
            if s == self.sym_apply {
                let items = self.list_exactly(args, 2, "APPLY")?;
                stack.push(Frame::ApplyOperator {
                    env,
                    args_expr: items[1],
                });
                return Ok(Step::Redirect(items[0], env));
            }
            if s == self.sym_gc {
                self.list_exactly(args, 0, "GC")?;
                self.collect_garbage();
                return Ok(Step::Value(Value::Symbol(self.sym_t)));
            }
        }

        stack.push(Frame::Operator { env, args });
        Ok(Step::Redirect(head, env))
    }

    fn step_define(
        &mut self,
        args: Value,
        env: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<Step, EvalError> {
        let (first, rest) = self.uncons(args, "DEFINE")?;
        match first {
            Value::Symbol(sym) => {
                let (value_expr, tail) = self.uncons(rest, "DEFINE")?;
                self.expect_nil(tail, "DEFINE")?;
                stack.push(Frame::Define { env, sym });
                Ok(Step::Redirect(value_expr, env))
            }
            Value::Pair(sig) => {
                let (name, params) = self.heap.pair_parts(sig);
                let name_sym = match name {
                    Value::Symbol(s) => s,
                    other => return Err(EvalError::type_error("DEFINE", "symbol", &other, 1)),
                };
                if rest.is_nil() {
                    return Err(EvalError::args("DEFINE", ARITY_AT_LEAST_ONE, 1));
                }
                let closure_tail = self.heap.alloc(params, rest);
                let closure = Value::Closure(self.heap.alloc(env, Value::Pair(closure_tail)));
                env::define(&mut self.heap, env, name_sym, closure);
                Ok(Step::Value(Value::Symbol(name_sym)))
            }
            other => Err(EvalError::type_error("DEFINE", "symbol or (name . params)", &other, 1)),
        }
    }

    fn step_defmacro(&mut self, args: Value, env: Value) -> Result<Step, EvalError> {
        let (sig, body) = self.uncons(args, "DEFMACRO")?;
        let sig_ref = match sig {
            Value::Pair(p) => p,
            other => return Err(EvalError::type_error("DEFMACRO", "(name . params)", &other, 1)),
        };
        let (name, params) = self.heap.pair_parts(sig_ref);
        let name_sym = match name {
            Value::Symbol(s) => s,
            other => return Err(EvalError::type_error("DEFMACRO", "symbol", &other, 1)),
        };
        if body.is_nil() {
            return Err(EvalError::args("DEFMACRO", ARITY_AT_LEAST_ONE, 1));
        }
        let macro_tail = self.heap.alloc(params, body);
        let macro_value = Value::Macro(self.heap.alloc(env, Value::Pair(macro_tail)));
        env::define(&mut self.heap, env, name_sym, macro_value);
        Ok(Step::Value(Value::Symbol(name_sym)))
    }

    fn make_closure(&mut self, env: Value, args: Value, form: &str) -> Result<Value, EvalError> {
        let (params, body) = self.uncons(args, form)?;
        if body.is_nil() {
            return Err(EvalError::args(form, ARITY_AT_LEAST_ONE, 0));
        }
        let tail = self.heap.alloc(params, body);
        Ok(Value::Closure(self.heap.alloc(env, Value::Pair(tail))))
    }

    /// `BEGIN`/closure-body/let-body sequencing: evaluate every expr but
    /// the last for effect, tail-evaluate the last.
    fn step_sequence(
        &mut self,
        body: Value,
        env: Value,
        stack: &mut Vec<Frame>,
        form: &str,
    ) -> Result<Step, EvalError> {
        if body.is_nil() {
            if form == "BEGIN" {
                return Ok(Step::Value(Value::Nil));
            }
            return Err(EvalError::args(form, ARITY_AT_LEAST_ONE, 0));
        }
        let (first, rest) = self.uncons(body, form)?;
        if rest.is_nil() {
            Ok(Step::Redirect(first, env))
        } else {
            stack.push(Frame::Seq { env, remaining: rest });
            Ok(Step::Redirect(first, env))
        }
    }

    fn apply_frame(
        &mut self,
        frame: Frame,
        value: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<Step, EvalError> {
        match frame {
            Frame::If { env, then_b, else_b } => {
                if value.is_nil() {
                    Ok(Step::Redirect(else_b, env))
                } else {
                    Ok(Step::Redirect(then_b, env))
                }
            }
            Frame::Operator { env, args } => self.dispatch_operator(value, env, args, stack),
            Frame::Args {
                env,
                op,
                remaining,
                mut acc_rev,
            } => {
                acc_rev.push(value);
                match remaining {
                    Value::Nil => {
                        acc_rev.reverse();
                        self.apply(op, &acc_rev)
                    }
                    Value::Pair(p) => {
                        let (next, rest) = self.heap.pair_parts(p);
                        stack.push(Frame::Args {
                            env,
                            op,
                            remaining: rest,
                            acc_rev,
                        });
                        Ok(Step::Redirect(next, env))
                    }
                    other => Err(EvalError::type_error("funcall", "proper argument list", &other, 0)),
                }
            }
            Frame::Seq { env, remaining } => self.step_sequence(remaining, env, stack, "BEGIN"),
            Frame::Define { env, sym } => {
                env::define(&mut self.heap, env, sym, value);
                Ok(Step::Value(Value::Symbol(sym)))
            }
            Frame::ApplyOperator { env, args_expr } => {
                stack.push(Frame::ApplyArgs { env, f: value });
                Ok(Step::Redirect(args_expr, env))
            }
            Frame::ApplyArgs { env, f } => {
                let args_vec = self.list_to_vec(value, "APPLY")?;
                self.apply(f, &args_vec)
            }
            Frame::MacroExpand { env } => Ok(Step::Redirect(value, env)),
        }
    }

    fn dispatch_operator(
        &mut self,
        op: Value,
        env: Value,
        args: Value,
        stack: &mut Vec<Frame>,
    ) -> Result<Step, EvalError> {
        match op {
            Value::Macro(pair) => {
                let raw_args = self.list_to_vec(args, "macro call")?;
                let (macro_env, params, body) = self.closure_parts(pair);
                let call_env = env::create(&mut self.heap, macro_env);
                self.bind_params(call_env, params, &raw_args, "macro call")?;
                stack.push(Frame::MacroExpand { env });
                let (first, rest) = self.uncons(body, "macro call")?;
                if rest.is_nil() {
                    Ok(Step::Redirect(first, call_env))
                } else {
                    stack.push(Frame::Seq {
                        env: call_env,
                        remaining: rest,
                    });
                    Ok(Step::Redirect(first, call_env))
                }
            }
            Value::Builtin(_) | Value::Closure(_) => match args {
                Value::Nil => self.apply(op, &[]),
                Value::Pair(p) => {
                    let (first, rest) = self.heap.pair_parts(p);
                    stack.push(Frame::Args {
                        env,
                        op,
                        remaining: rest,
                        acc_rev: Vec::new(),
                    });
                    Ok(Step::Redirect(first, env))
                }
                other => Err(EvalError::type_error("funcall", "proper argument list", &other, 0)),
            },
            other => Err(EvalError::type_error("funcall", "callable", &other, 0)),
        }
    }

    /// Applies an already-evaluated function to already-evaluated
    /// arguments. Builtins run immediately; closures tail-call into their
    /// body (no frame pushed for the call itself, preserving TCO).
    fn apply(&mut self, op: Value, args: &[Value]) -> Result<Step, EvalError> {
        match op {
            Value::Builtin(f) => Ok(Step::Value(f(self, args)?)),
            Value::Closure(pair) => {
                let (closure_env, params, body) = self.closure_parts(pair);
                let call_env = env::create(&mut self.heap, closure_env);
                self.bind_params(call_env, params, args, "closure call")?;
                let mut cur = body;
                loop {
                    let (expr, rest) = self.uncons(cur, "closure body")?;
                    if rest.is_nil() {
                        return Ok(Step::Redirect(expr, call_env));
                    }
                    self.eval(expr, call_env)?;
                    cur = rest;
                }
            }
            other => Err(EvalError::type_error("funcall", "callable", &other, 0)),
        }
    }

    /// Non-tail apply, used when a builtin (e.g. first-class `apply`)
    /// needs the fully-reduced result of calling `f` rather than a
    /// trampoline redirect.
    pub fn apply_blocking(&mut self, f: Value, args: &[Value]) -> Result<Value, EvalError> {
        match self.apply(f, args)? {
            Step::Value(v) => Ok(v),
            Step::Redirect(expr, env) => self.eval(expr, env),
        }
    }

    fn closure_parts(&self, pair: PairRef) -> (Value, Value, Value) {
        let (env, rest) = self.heap.pair_parts(pair);
        let (params, body) = match rest {
            Value::Pair(p) => self.heap.pair_parts(p),
            other => (other, Value::Nil),
        };
        (env, params, body)
    }

    /// Binds `params` (a proper list, an improper rest-arg list, or a bare
    /// symbol soaking up every argument) to `args` in `call_env`.
    fn bind_params(
        &mut self,
        call_env: Value,
        mut params: Value,
        args: &[Value],
        context: &str,
    ) -> Result<(), EvalError> {
        let mut i = 0usize;
        loop {
            match params {
                Value::Nil => {
                    if i != args.len() {
                        return Err(EvalError::args(context, i.to_string(), args.len()));
                    }
                    return Ok(());
                }
                Value::Symbol(rest_sym) => {
                    let rest_list = self.vec_to_list(&args[i..]);
                    env::define(&mut self.heap, call_env, rest_sym, rest_list);
                    return Ok(());
                }
                Value::Pair(p) => {
                    let (car, cdr) = self.heap.pair_parts(p);
                    let sym = match car {
                        Value::Symbol(s) => s,
                        other => return Err(EvalError::type_error(context, "symbol", &other, i + 1)),
                    };
                    if i >= args.len() {
                        return Err(EvalError::args(context, format!("at least {}", i + 1), args.len()));
                    }
                    env::define(&mut self.heap, call_env, sym, args[i]);
                    i += 1;
                    params = cdr;
                }
                other => return Err(EvalError::type_error(context, "parameter list", &other, 0)),
            }
        }
    }

    // ---- list helpers shared by the special-form parsers and builtins ----

    pub fn uncons(&self, v: Value, context: &str) -> Result<(Value, Value), EvalError> {
        match v {
            Value::Pair(p) => Ok(self.heap.pair_parts(p)),
            other => Err(EvalError::type_error(context, "non-empty list", &other, 0)),
        }
    }

    fn expect_nil(&self, v: Value, context: &str) -> Result<(), EvalError> {
        if v.is_nil() {
            Ok(())
        } else {
            Err(EvalError::type_error(context, "end of list", &v, 0))
        }
    }

    fn list1(&self, v: Value, context: &str) -> Result<(Value, Value), EvalError> {
        let (first, rest) = self.uncons(v, context)?;
        self.expect_nil(rest, context)?;
        Ok((first, Value::Nil))
    }

    fn list_exactly(&self, v: Value, n: usize, context: &str) -> Result<Vec<Value>, EvalError> {
        let items = self.list_to_vec(v, context)?;
        if items.len() != n {
            let expected = match n {
                0 => ARITY_ZERO,
                1 => ARITY_ONE,
                2 => ARITY_TWO,
                3 => ARITY_THREE,
                _ => return Err(EvalError::args(context, n.to_string(), items.len())),
            };
            return Err(EvalError::args(context, expected, items.len()));
        }
        Ok(items)
    }

    pub fn list_to_vec(&self, v: Value, context: &str) -> Result<Vec<Value>, EvalError> {
        let mut out = Vec::new();
        let mut cur = v;
        loop {
            match cur {
                Value::Nil => return Ok(out),
                Value::Pair(p) => {
                    let (car, cdr) = self.heap.pair_parts(p);
                    out.push(car);
                    cur = cdr;
                }
                other => return Err(EvalError::type_error(context, "proper list", &other, 0)),
            }
        }
    }

    pub fn vec_to_list(&mut self, items: &[Value]) -> Value {
        let mut tail = Value::Nil;
        for item in items.iter().rev() {
            tail = Value::Pair(self.heap.alloc(*item, tail));
        }
        tail
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_roots(frame: &Frame) -> Vec<Value> {
    match frame {
        Frame::If { env, then_b, else_b } => vec![*env, *then_b, *else_b],
        Frame::Operator { env, args } => vec![*env, *args],
        Frame::Args {
            env,
            op,
            remaining,
            acc_rev,
        } => {
            let mut v = vec![*env, *op, *remaining];
            v.extend_from_slice(acc_rev);
            v
        }
        Frame::Seq { env, remaining } => vec![*env, *remaining],
        Frame::Define { env, .. } => vec![*env],
        Frame::ApplyOperator { env, args_expr } => vec![*env, *args_expr],
        Frame::ApplyArgs { env, f } => vec![*env, *f],
        Frame::MacroExpand { env } => vec![*env],
    }
}
