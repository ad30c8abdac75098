//! # Translation-unit context
//!
//! [`TranslationUnit`] bundles all per-file state — symbol table, data
//! segment, line records, counters and diagnostics — behind one struct
//! instead of process-wide globals. It is constructed fresh by
//! [`crate::assemble_unit`] for each file and simply dropped at the end of
//! the call, so assembling one file can never leak state into the next.

use crate::error::Diagnostics;
use crate::line_record::LineRecord;
use crate::symbol_table::SymbolTable;

/// Fixed load address of the first code word.
pub const FIRST_ADDRESS: u32 = 100;

/// Total memory words (code + data) a translation unit may use.
pub const MAX_MEMORY_WORDS: usize = 1000;

/// Maximum number of source lines per translation unit.
pub const MAX_LINES: usize = 700;

/// Maximum characters on one source line.
pub const MAX_LINE_LEN: usize = 80;

/// Highest legal register digit; registers are `r0..=r7`.
pub const MAX_REGISTER_DIGIT: u8 = 7;

/// Per-file state: the symbol table, the accumulated data segment, the
/// per-line records produced by the first pass, and the running counters.
/// Everything a pass needs lives here instead of in process-wide globals.
#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub symbols: SymbolTable,
    pub data_segment: Vec<i32>,
    pub lines: Vec<LineRecord>,
    pub ic: u32,
    pub dc: u32,
    pub diagnostics: Diagnostics,
}

impl TranslationUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total words this unit will occupy if first-pass parsing stopped now.
    #[must_use]
    pub fn word_total(&self) -> u32 {
        self.ic + self.dc
    }
}
