//! # Symbol table
//!
//! An append-only, insertion-ordered table from label name to its record,
//! carrying extern/data/mat flags and matrix dimensions alongside the
//! capacity and duplicate-name errors `add_label` reports.

use crate::error::AsmError;

/// Maximum number of symbols a single translation unit may declare.
pub const MAX_SYMBOLS: usize = 700;

/// Maximum characters in a label name.
pub const MAX_LABEL_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatDims {
    pub x: u32,
    pub y: u32,
}

/// One symbol's full record.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRecord {
    pub name: String,
    pub address: u32,
    pub is_extern: bool,
    pub is_data: bool,
    pub is_mat: bool,
    pub mat_dims: Option<MatDims>,
}

/// An `.entry` declaration: the name and the line it was declared on.
/// Resolved to an address only in pass 2, by looking the name up in the
/// symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDecl {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<SymbolRecord>,
    entries: Vec<EntryDecl>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new label at `address`. When `is_extern` is set, the
    /// address is forced to 0 regardless of what was passed.
    pub fn add_label(&mut self, name: &str, address: u32, is_extern: bool) -> Result<(), AsmError> {
        if self.symbols.len() >= MAX_SYMBOLS {
            return Err(AsmError::TooManySymbols(MAX_SYMBOLS));
        }
        if self.get_label(name).is_some() {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }
        self.symbols.push(SymbolRecord {
            name: name.to_string(),
            address: if is_extern { 0 } else { address },
            is_extern,
            is_data: false,
            is_mat: false,
            mat_dims: None,
        });
        Ok(())
    }

    #[must_use]
    pub fn get_label(&self, name: &str) -> Option<&SymbolRecord> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn get_label_mut(&mut self, name: &str) -> Option<&mut SymbolRecord> {
        self.symbols.iter_mut().find(|s| s.name == name)
    }

    pub fn mark_data(&mut self, name: &str, address: u32) {
        if let Some(sym) = self.get_label_mut(name) {
            sym.is_data = true;
            sym.address = address;
        }
    }

    pub fn mark_mat(&mut self, name: &str, address: u32, dims: MatDims) {
        if let Some(sym) = self.get_label_mut(name) {
            sym.is_data = true;
            sym.is_mat = true;
            sym.address = address;
            sym.mat_dims = Some(dims);
        }
    }

    /// Add `final_ic` to every data/mat symbol's address, rebasing the data
    /// segment to sit immediately after the code segment.
    pub fn rebase_data_symbols(&mut self, final_ic: u32) {
        for sym in &mut self.symbols {
            if sym.is_data || sym.is_mat {
                sym.address += final_ic;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.symbols.iter()
    }

    /// Validate and record an `.entry` declaration: name legality and
    /// non-duplication within the entry list are checked on pass 1;
    /// resolution to an address happens only in pass 2.
    pub fn add_entry(&mut self, name: &str, line: usize) -> Result<(), AsmError> {
        if self.is_entry_declared(name) {
            return Err(AsmError::DuplicateEntry(name.to_string()));
        }
        self.entries.push(EntryDecl { name: name.to_string(), line });
        Ok(())
    }

    #[must_use]
    pub fn is_entry_declared(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntryDecl> {
        self.entries.iter()
    }
}
