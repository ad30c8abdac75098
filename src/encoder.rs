//! # Second pass (encoder)
//!
//! Resolves every label reference and emits the final memory image.
//! Operates over the `Operand` tagged union: one `encode_operand_word` is
//! total over every operand shape instead of one match arm per
//! instruction variant.

use crate::context::{TranslationUnit, MAX_MEMORY_WORDS};
use crate::error::AsmError;
use crate::line_record::{LineKind, LineRecord};
use crate::operand::{Era, MatIndex, MemoryWord, Operand};

/// The finished memory image: one [`MemoryWord`] per address starting at
/// `FIRST_ADDRESS`, plus the extern references collected along the way.
#[derive(Debug, Clone)]
pub struct EncodedUnit {
    pub words: Vec<MemoryWord>,
    pub externs: Vec<ExternRef>,
}

/// One use of an extern symbol: the symbol name and the address of the
/// word that referenced it. Feeds the `.ext` artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternRef {
    pub name: String,
    pub address: u32,
}

/// Run the second pass. Returns `None` if a resolution error made the
/// image unreliable to emit (errors already live in `unit.diagnostics`;
/// callers gate artifact emission on `unit.diagnostics.has_errors()`
/// regardless, this return value is just a convenience for callers that
/// want the image anyway for further processing).
pub fn run(unit: &mut TranslationUnit) -> EncodedUnit {
    unit.symbols.rebase_data_symbols(unit.ic);

    let mut words = vec![MemoryWord { bits: 0 }; unit.word_total() as usize];
    let mut externs = Vec::new();

    let lines = std::mem::take(&mut unit.lines);
    let mut lines = lines;
    for record in &mut lines {
        if record.kind == LineKind::Command {
            encode_command_line(unit, record, &mut words, &mut externs);
        }
    }
    unit.lines = lines;

    let dc_start = unit.ic as usize;
    for (offset, value) in unit.data_segment.iter().enumerate() {
        if let Some(slot) = words.get_mut(dc_start + offset) {
            *slot = MemoryWord::value(*value, Era::Absolute);
        }
    }

    validate_entries(unit);

    EncodedUnit { words, externs }
}

fn validate_entries(unit: &mut TranslationUnit) {
    let entries: Vec<_> = unit.symbols.entries().cloned().collect();
    for entry in entries {
        match unit.symbols.get_label(&entry.name) {
            None => unit
                .diagnostics
                .error(entry.line, AsmError::UndefinedSymbol(entry.name.clone())),
            Some(sym) if sym.is_extern => unit
                .diagnostics
                .error(entry.line, AsmError::ExternEntryConflict(entry.name.clone())),
            Some(_) => {}
        }
    }
}

fn encode_command_line(
    unit: &mut TranslationUnit,
    record: &mut LineRecord,
    words: &mut [MemoryWord],
    externs: &mut Vec<ExternRef>,
) {
    let Some(cmd) = record.command else { return };
    let base = record.start_address as usize - crate::context::FIRST_ADDRESS as usize;
    if base >= words.len() {
        return;
    }

    let src_mode = record.source_operand.as_ref().map_or(0, Operand::addressing_mode);
    let dest_mode = record.dest_operand.as_ref().map_or(0, Operand::addressing_mode);
    set_word(words, base, MemoryWord::command(cmd.opcode, src_mode, dest_mode));

    let mut cursor = base + 1;
    let both_registers = matches!(
        (&record.source_operand, &record.dest_operand),
        (Some(Operand::Register(_)), Some(Operand::Register(_)))
    );

    if both_registers {
        let src_reg = match &record.source_operand {
            Some(Operand::Register(r)) => *r,
            _ => 0,
        };
        let dest_reg = match &record.dest_operand {
            Some(Operand::Register(r)) => *r,
            _ => 0,
        };
        if let Some(slot) = words.get_mut(cursor) {
            *slot = MemoryWord::registers(src_reg, dest_reg);
        }
        record.source_operand_address = Some(crate::context::FIRST_ADDRESS + cursor as u32);
        record.dest_operand_address = record.source_operand_address;
        return;
    }

    if let Some(source) = record.source_operand.clone() {
        let addr = crate::context::FIRST_ADDRESS + cursor as u32;
        record.source_operand_address = Some(addr);
        cursor += encode_operand(unit, record.line_number, &source, OperandRole::Source, words, cursor, externs);
    }

    if let Some(dest) = record.dest_operand.clone() {
        let addr = crate::context::FIRST_ADDRESS + cursor as u32;
        record.dest_operand_address = Some(addr);
        encode_operand(unit, record.line_number, &dest, OperandRole::Dest, words, cursor, externs);
    }
}

/// Which half of a shared register word a lone register operand occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandRole {
    Source,
    Dest,
}

/// Write `operand`'s word(s) starting at `words[cursor]`. Returns how many
/// words were consumed, so the caller can place the next operand.
fn encode_operand(
    unit: &mut TranslationUnit,
    line_number: usize,
    operand: &Operand,
    role: OperandRole,
    words: &mut [MemoryWord],
    cursor: usize,
    externs: &mut Vec<ExternRef>,
) -> usize {
    match operand {
        Operand::Number(value) => {
            set_word(words, cursor, MemoryWord::value(*value, Era::Absolute));
            1
        }
        Operand::Register(reg) => {
            let word = match role {
                OperandRole::Source => MemoryWord::registers(*reg, 0),
                OperandRole::Dest => MemoryWord::registers(0, *reg),
            };
            set_word(words, cursor, word);
            1
        }
        Operand::Label(name) => {
            encode_label_ref(unit, line_number, name, words, cursor, externs);
            1
        }
        Operand::Mat { name, idx1, idx2 } => {
            encode_label_ref(unit, line_number, name, words, cursor, externs);
            let (reg1, reg2) = (mat_index_register(idx1), mat_index_register(idx2));
            set_word(words, cursor + 1, MemoryWord::registers(reg1, reg2));
            2
        }
        Operand::Invalid => 1,
    }
}

fn mat_index_register(idx: &MatIndex) -> u8 {
    match idx {
        MatIndex::Register(r) => *r,
        MatIndex::Immediate(_) => 0,
    }
}

fn encode_label_ref(
    unit: &mut TranslationUnit,
    line_number: usize,
    name: &str,
    words: &mut [MemoryWord],
    cursor: usize,
    externs: &mut Vec<ExternRef>,
) {
    match unit.symbols.get_label(name) {
        Some(sym) if sym.is_extern => {
            set_word(words, cursor, MemoryWord::value(0, Era::External));
            externs.push(ExternRef {
                name: name.to_string(),
                address: crate::context::FIRST_ADDRESS + cursor as u32,
            });
        }
        Some(sym) => {
            let address = sym.address;
            if address as usize >= MAX_MEMORY_WORDS {
                unit.diagnostics.error(line_number, AsmError::AddressOutOfRange(address as i64));
            }
            set_word(words, cursor, MemoryWord::value(address as i32, Era::Relocatable));
        }
        None => {
            unit.diagnostics
                .error(line_number, AsmError::UndefinedSymbol(name.to_string()));
        }
    }
}

fn set_word(words: &mut [MemoryWord], index: usize, word: MemoryWord) {
    if let Some(slot) = words.get_mut(index) {
        *slot = word;
    }
}
