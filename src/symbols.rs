//! Symbol table: label name -> value plus a small attribute bitset
//! (code/data/extern/entry). Grounded in `symbols.c`, including its
//! conflict rules around `.extern` and `.entry`.

use std::collections::HashMap;

use matches::debug_assert_matches;

/// A symbol can be marked as defined in the code image, defined in the
/// data image, declared `.extern`, and/or declared `.entry`. These are
/// independent bits rather than an enum because `.entry` can land on a
/// symbol that is also `.data` or `.code`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attrs(u8);

impl Attrs {
    pub const CODE: Attrs = Attrs(1 << 0);
    pub const DATA: Attrs = Attrs(1 << 1);
    pub const EXTERN: Attrs = Attrs(1 << 2);
    pub const ENTRY: Attrs = Attrs(1 << 3);

    pub fn none() -> Self {
        Attrs(0)
    }

    pub fn contains(self, other: Attrs) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: Attrs) -> Attrs {
        Attrs(self.0 | other.0)
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub value: u32,
    pub attrs: Attrs,
    pub def_line: u32,
}

/// Error returned when a `.extern`/`.entry`/definition conflicts with the
/// symbol's existing attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolError {
    Redefined,
    ExternConflictsWithDefinition,
    DefinitionConflictsWithExtern,
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolError::Redefined => write!(f, "symbol already defined"),
            SymbolError::ExternConflictsWithDefinition => {
                write!(f, "symbol already declared extern, cannot also be defined")
            }
            SymbolError::DefinitionConflictsWithExtern => {
                write!(f, "symbol already defined, cannot also be declared extern")
            }
        }
    }
}

/// Ordered symbol table: a `Vec` holds definition order (used when writing
/// `.ent`), a `HashMap` gives O(1) lookup by name.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&i| &self.symbols[i])
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        if let Some(&i) = self.index.get(name) {
            Some(&mut self.symbols[i])
        } else {
            None
        }
    }

    /// Define a symbol as CODE or DATA at `value`. Fails if the name is
    /// already `.extern`.
    pub fn define(
        &mut self,
        name: &str,
        value: u32,
        kind: Attrs,
        line: u32,
    ) -> Result<(), SymbolError> {
        // callers only ever define a symbol as living in code or data, never
        // as bare EXTERN/ENTRY (those go through declare_extern/mark_entry)
        debug_assert_matches!(kind, Attrs::CODE | Attrs::DATA);
        if let Some(existing) = self.lookup(name) {
            if existing.attrs.contains(Attrs::EXTERN) {
                return Err(SymbolError::DefinitionConflictsWithExtern);
            }
            if existing.attrs.contains(Attrs::CODE) || existing.attrs.contains(Attrs::DATA) {
                return Err(SymbolError::Redefined);
            }
            // was ENTRY-only (entry declared before definition): fill in now.
            let sym = self.lookup_mut(name).unwrap();
            sym.value = value;
            sym.attrs = sym.attrs.with(kind);
            return Ok(());
        }
        self.index.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            value,
            attrs: kind,
            def_line: line,
        });
        Ok(())
    }

    /// Declare `name` as `.extern`. Fails if it's already defined as CODE
    /// or DATA.
    pub fn declare_extern(&mut self, name: &str, line: u32) -> Result<(), SymbolError> {
        if let Some(existing) = self.lookup(name) {
            if existing.attrs.contains(Attrs::CODE) || existing.attrs.contains(Attrs::DATA) {
                return Err(SymbolError::ExternConflictsWithDefinition);
            }
            return Ok(());
        }
        self.index.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            value: 0,
            attrs: Attrs::EXTERN,
            def_line: line,
        });
        Ok(())
    }

    /// Mark `name` as `.entry`. May be called before or after the symbol
    /// is otherwise defined; idempotent if already marked.
    pub fn mark_entry(&mut self, name: &str, line: u32) {
        if let Some(sym) = self.lookup_mut(name) {
            sym.attrs = sym.attrs.with(Attrs::ENTRY);
            return;
        }
        self.index.insert(name.to_string(), self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            value: 0,
            attrs: Attrs::ENTRY,
            def_line: line,
        });
    }

    pub fn is_external(&self, name: &str) -> bool {
        self.lookup(name)
            .is_some_and(|s| s.attrs.contains(Attrs::EXTERN))
    }

    /// Add `offset` to the value of every DATA symbol. Called once at the
    /// end of pass 1 once the final code image length (ICF) is known.
    pub fn relocate_data(&mut self, offset: u32) {
        for sym in &mut self.symbols {
            if sym.attrs.contains(Attrs::DATA) {
                sym.value += offset;
            }
        }
    }

    /// Iterate symbols in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.attrs.contains(Attrs::ENTRY))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn define_then_relocate_data() {
        let mut t = SymbolTable::new();
        t.define("x", 5, Attrs::DATA, 1).unwrap();
        t.relocate_data(100);
        assert_eq!(t.lookup("x").unwrap().value, 105);
    }

    #[test]
    fn extern_conflicts_with_prior_definition() {
        let mut t = SymbolTable::new();
        t.define("x", 0, Attrs::CODE, 1).unwrap();
        assert_eq!(
            t.declare_extern("x", 2),
            Err(SymbolError::ExternConflictsWithDefinition)
        );
    }

    #[test]
    fn definition_conflicts_with_prior_extern() {
        let mut t = SymbolTable::new();
        t.declare_extern("x", 1).unwrap();
        assert_eq!(
            t.define("x", 0, Attrs::CODE, 2),
            Err(SymbolError::DefinitionConflictsWithExtern)
        );
    }

    #[test]
    fn entry_before_definition_is_allowed() {
        let mut t = SymbolTable::new();
        t.mark_entry("x", 1);
        t.define("x", 42, Attrs::CODE, 2).unwrap();
        let sym = t.lookup("x").unwrap();
        assert_eq!(sym.value, 42);
        assert!(sym.attrs.contains(Attrs::ENTRY));
        assert!(sym.attrs.contains(Attrs::CODE));
    }

    #[test]
    fn entry_is_idempotent() {
        let mut t = SymbolTable::new();
        t.mark_entry("x", 1);
        t.mark_entry("x", 1);
        assert_eq!(t.entries().count(), 1);
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut t = SymbolTable::new();
        t.define("x", 0, Attrs::CODE, 1).unwrap();
        assert_eq!(t.define("x", 1, Attrs::CODE, 2), Err(SymbolError::Redefined));
    }
}
