// ABOUTME: Arena-backed pair heap with mark-and-sweep garbage collection

use crate::value::Value;

/// Index of a pair cell in the heap arena. Stable for the cell's lifetime;
/// reused only after the cell has been collected, never while still live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairRef(pub(crate) usize);

#[derive(Debug, Clone)]
struct Cell {
    car: Value,
    cdr: Value,
    mark: bool,
}

/// The pair heap. Every `Pair`, `Closure` and `Macro` value is a `PairRef`
/// into this arena; nothing outside it ever holds a pair's contents
/// directly, so a collection only ever has to rewrite this one structure.
#[derive(Debug)]
pub struct Heap {
    cells: Vec<Option<Cell>>,
    free: Vec<usize>,
    pub allocations_since_gc: usize,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            cells: Vec::new(),
            free: Vec::new(),
            allocations_since_gc: 0,
        }
    }

    pub fn alloc(&mut self, car: Value, cdr: Value) -> PairRef {
        self.allocations_since_gc += 1;
        let cell = Cell {
            car,
            cdr,
            mark: false,
        };
        if let Some(idx) = self.free.pop() {
            self.cells[idx] = Some(cell);
            PairRef(idx)
        } else {
            self.cells.push(Some(cell));
            PairRef(self.cells.len() - 1)
        }
    }

    fn cell(&self, r: PairRef) -> &Cell {
        self.cells[r.0]
            .as_ref()
            .expect("dangling pair reference: cell was collected while still reachable")
    }

    fn cell_mut(&mut self, r: PairRef) -> &mut Cell {
        self.cells[r.0]
            .as_mut()
            .expect("dangling pair reference: cell was collected while still reachable")
    }

    pub fn car(&self, r: PairRef) -> Value {
        self.cell(r).car
    }

    pub fn cdr(&self, r: PairRef) -> Value {
        self.cell(r).cdr
    }

    pub fn pair_parts(&self, r: PairRef) -> (Value, Value) {
        let cell = self.cell(r);
        (cell.car, cell.cdr)
    }

    pub fn set_car(&mut self, r: PairRef, v: Value) {
        self.cell_mut(r).car = v;
    }

    pub fn set_cdr(&mut self, r: PairRef, v: Value) {
        self.cell_mut(r).cdr = v;
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Marks every cell reachable from `roots`, then frees everything that
    /// wasn't reached. Roots are given as an iterator so callers can chain
    /// together the evaluator's live expression, environment, and frame
    /// stack without building an intermediate `Vec`.
    pub fn collect<I>(&mut self, roots: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut worklist: Vec<PairRef> = roots.into_iter().filter_map(pair_ref_of).collect();
        while let Some(r) = worklist.pop() {
            let already_marked = match self.cells[r.0].as_ref() {
                Some(cell) => cell.mark,
                None => continue,
            };
            if already_marked {
                continue;
            }
            let (car, cdr) = {
                let cell = self.cells[r.0].as_mut().unwrap();
                cell.mark = true;
                (cell.car, cell.cdr)
            };
            if let Some(p) = pair_ref_of(car) {
                worklist.push(p);
            }
            if let Some(p) = pair_ref_of(cdr) {
                worklist.push(p);
            }
        }

        for slot in self.cells.iter_mut() {
            match slot {
                Some(cell) if cell.mark => cell.mark = false,
                Some(_) => *slot = None,
                None => {}
            }
        }
        self.free = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| if c.is_none() { Some(i) } else { None })
            .collect();
        self.allocations_since_gc = 0;
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

fn pair_ref_of(v: Value) -> Option<PairRef> {
    match v {
        Value::Pair(r) | Value::Closure(r) | Value::Macro(r) => Some(r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_read_back() {
        let mut heap = Heap::new();
        let r = heap.alloc(Value::Integer(1), Value::Integer(2));
        assert_eq!(heap.car(r), Value::Integer(1));
        assert_eq!(heap.cdr(r), Value::Integer(2));
    }

    #[test]
    fn test_set_car_set_cdr_mutate_in_place() {
        let mut heap = Heap::new();
        let r = heap.alloc(Value::Integer(1), Value::Nil);
        heap.set_car(r, Value::Integer(99));
        heap.set_cdr(r, Value::Integer(7));
        assert_eq!(heap.car(r), Value::Integer(99));
        assert_eq!(heap.cdr(r), Value::Integer(7));
    }

    #[test]
    fn test_collect_frees_unreachable_cells() {
        let mut heap = Heap::new();
        let garbage = heap.alloc(Value::Integer(1), Value::Nil);
        let root = heap.alloc(Value::Integer(2), Value::Nil);
        let _ = garbage;
        assert_eq!(heap.live_count(), 2);
        heap.collect(vec![Value::Pair(root)]);
        assert_eq!(heap.live_count(), 1);
    }

    #[test]
    fn test_collect_keeps_transitively_reachable_cells() {
        let mut heap = Heap::new();
        let inner = heap.alloc(Value::Integer(1), Value::Nil);
        let outer = heap.alloc(Value::Pair(inner), Value::Nil);
        heap.collect(vec![Value::Pair(outer)]);
        assert_eq!(heap.live_count(), 2);
    }

    #[test]
    fn test_collect_survives_cycles() {
        let mut heap = Heap::new();
        let a = heap.alloc(Value::Integer(1), Value::Nil);
        let b = heap.alloc(Value::Integer(2), Value::Pair(a));
        heap.set_cdr(a, Value::Pair(b));
        heap.collect(vec![Value::Pair(a)]);
        assert_eq!(heap.live_count(), 2);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut heap = Heap::new();
        let _garbage = heap.alloc(Value::Integer(1), Value::Nil);
        let root = heap.alloc(Value::Integer(2), Value::Nil);
        heap.collect(vec![Value::Pair(root)]);
        let before = heap.capacity();
        heap.alloc(Value::Integer(3), Value::Nil);
        assert_eq!(heap.capacity(), before);
    }
}
