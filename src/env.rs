// ABOUTME: Pair-backed association-list environments

use crate::error::EvalError;
use crate::heap::{Heap, PairRef};
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// An environment is a heap pair `(parent . bindings)`. `bindings` is a
/// proper list of `(symbol . value)` cells. Because the whole chain lives
/// on the pair heap, a closure that captures an environment keeps it alive
/// through ordinary GC reachability -- no separate `Rc` bookkeeping needed.
pub fn create(heap: &mut Heap, parent: Value) -> Value {
    Value::Pair(heap.alloc(parent, Value::Nil))
}

fn env_parts(heap: &Heap, env: Value) -> (Value, Value) {
    match env {
        Value::Pair(r) => heap.pair_parts(r),
        _ => panic!("environment value must be a pair"),
    }
}

fn find_cell_in_frame(heap: &Heap, env: Value, sym: Symbol) -> Option<PairRef> {
    let (_, mut bindings) = env_parts(heap, env);
    loop {
        match bindings {
            Value::Nil => return None,
            Value::Pair(cell_list) => {
                let (cell, rest) = heap.pair_parts(cell_list);
                if let Value::Pair(cell_ref) = cell {
                    let (car, _) = heap.pair_parts(cell_ref);
                    if let Value::Symbol(s) = car {
                        if s == sym {
                            return Some(cell_ref);
                        }
                    }
                }
                bindings = rest;
            }
            _ => return None,
        }
    }
}

/// Looks up `sym`, walking from `env` out through enclosing frames.
pub fn get(heap: &Heap, mut env: Value, sym: Symbol) -> Option<Value> {
    loop {
        if let Some(cell) = find_cell_in_frame(heap, env, sym) {
            let (_, value) = heap.pair_parts(cell);
            return Some(value);
        }
        let (parent, _) = env_parts(heap, env);
        match parent {
            Value::Nil => return None,
            _ => env = parent,
        }
    }
}

/// Binds `sym` to `value` in `env`'s own frame. If `sym` is already bound
/// there, the existing cell is overwritten in place rather than shadowed,
/// so earlier closures over this same frame observe the new value.
pub fn define(heap: &mut Heap, env: Value, sym: Symbol, value: Value) {
    if let Some(cell) = find_cell_in_frame(heap, env, sym) {
        heap.set_cdr(cell, value);
        return;
    }
    let (_, bindings) = env_parts(heap, env);
    let cell = heap.alloc(Value::Symbol(sym), value);
    let new_bindings = heap.alloc(Value::Pair(cell), bindings);
    if let Value::Pair(env_ref) = env {
        heap.set_cdr(env_ref, Value::Pair(new_bindings));
    }
}

/// Updates an existing binding, walking the parent chain. Unlike `define`,
/// this never creates a new binding -- it errors if `sym` is unbound
/// anywhere in the chain.
pub fn set(
    heap: &mut Heap,
    symbols: &SymbolTable,
    mut env: Value,
    sym: Symbol,
    value: Value,
) -> Result<(), EvalError> {
    loop {
        if let Some(cell) = find_cell_in_frame(heap, env, sym) {
            heap.set_cdr(cell, value);
            return Ok(());
        }
        let (parent, _) = env_parts(heap, env);
        match parent {
            Value::Nil => return Err(EvalError::unbound(symbols.name(sym))),
            _ => env = parent,
        }
    }
}
