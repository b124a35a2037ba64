//! Case-insensitive name interning.

use std::collections::HashMap;

/// Interned handle for a name string.
///
/// Two symbols from the same table are equal iff their source strings are equal
/// under ASCII case-insensitive comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    lookup: HashMap<String, Symbol>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the symbol for `text`, interning it on first use.
    pub fn get_symbol(&mut self, text: &str) -> Symbol {
        let canonical = text.to_ascii_lowercase();
        if let Some(&symbol) = self.lookup.get(&canonical) {
            return symbol;
        }

        let symbol = Symbol(self.names.len() as u32);
        self.names.push(canonical.clone());
        self.lookup.insert(canonical, symbol);
        symbol
    }

    /// Lookup without insertion.
    pub fn find_symbol(&self, text: &str) -> Option<Symbol> {
        self.lookup.get(&text.to_ascii_lowercase()).copied()
    }

    /// Canonical (ASCII lowercase) text of `symbol`.
    pub fn name(&self, symbol: Symbol) -> Option<&str> {
        self.names.get(symbol.index()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_symbol_is_case_insensitive() {
        let mut table = SymbolTable::new();
        let a = table.get_symbol("CBaseEntity_Spawn");
        let b = table.get_symbol("cbaseentity_spawn");
        let c = table.get_symbol("CBASEENTITY_SPAWN");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_distinct_names_get_distinct_symbols() {
        let mut table = SymbolTable::new();
        let a = table.get_symbol("Foo");
        let b = table.get_symbol("Bar");
        assert_ne!(a, b);
        assert_eq!(table.name(a), Some("foo"));
        assert_eq!(table.name(b), Some("bar"));
    }

    #[test]
    fn test_find_symbol_does_not_insert() {
        let mut table = SymbolTable::new();
        assert_eq!(table.find_symbol("Foo"), None);
        assert!(table.is_empty());

        let foo = table.get_symbol("Foo");
        assert_eq!(table.find_symbol("fOO"), Some(foo));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_name_is_canonical_regardless_of_first_spelling() {
        let mut table = SymbolTable::new();
        let symbol = table.get_symbol("CBaseEntity_Spawn");
        assert_eq!(table.get_symbol("CBASEENTITY_SPAWN"), symbol);
        assert_eq!(table.name(symbol), Some("cbaseentity_spawn"));
    }
}
