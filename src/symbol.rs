// ABOUTME: Process-wide symbol interning table

use std::collections::HashMap;

/// An interned symbol. Equality is by table index, which stands in for the
/// "same name, same storage" pointer-identity rule the data model requires:
/// two `Symbol`s compare equal iff they were interned from the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub(crate) usize);

#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    by_name: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            names: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Returns the existing interned symbol for `name`, else allocates one.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.by_name.get(name) {
            return *sym;
        }
        let sym = Symbol(self.names.len());
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), sym);
        sym
    }

    pub fn name(&self, sym: Symbol) -> &str {
        &self.names[sym.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_same_name_returns_same_symbol() {
        let mut table = SymbolTable::new();
        let a = table.intern("FOO");
        let b = table.intern("FOO");
        assert_eq!(a, b);
    }

    #[test]
    fn test_intern_different_names_returns_different_symbols() {
        let mut table = SymbolTable::new();
        let a = table.intern("FOO");
        let b = table.intern("BAR");
        assert_ne!(a, b);
    }

    #[test]
    fn test_name_round_trips() {
        let mut table = SymbolTable::new();
        let sym = table.intern("HELLO");
        assert_eq!(table.name(sym), "HELLO");
    }
}
