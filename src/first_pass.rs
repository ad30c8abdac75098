//! # First pass
//!
//! The per-line state machine: recognizes comments, labels, directives
//! and commands; validates operand syntax; advances `IC`/`DC`; and fills
//! in [`LineRecord`]s, the symbol table and the data segment carried by
//! the [`TranslationUnit`].
//!
//! A single driver operates directly on line slices via the primitives in
//! [`crate::lex`] rather than a token stream, but keeps the classic
//! state-machine shape: one function per line, a running location
//! counter, a symbol table built alongside it.

use std::ops::ControlFlow;

use crate::context::{TranslationUnit, FIRST_ADDRESS, MAX_LINES, MAX_LINE_LEN, MAX_MEMORY_WORDS};
use crate::error::AsmError;
use crate::lex;
use crate::line_record::{LineKind, LineRecord};
use crate::operand::{lookup_command, CommandDescriptor, MatIndex, Operand};
use crate::symbol_table::{MatDims, MAX_LABEL_LEN};

/// Run the first pass over every source line, mutating `unit` in place.
///
/// Returns `ControlFlow::Break(())` if a capacity limit forced pass 1 to
/// stop early (too many lines, too many symbols, or memory exhausted);
/// the caller treats this the same as any other error — no artifacts are
/// emitted — and since all state lives in `unit`, there is nothing
/// process-wide left to tear down.
pub fn run(unit: &mut TranslationUnit, source_lines: &[&str]) -> ControlFlow<()> {
    for (idx, raw_line) in source_lines.iter().enumerate() {
        let line_number = idx + 1;

        if line_number > MAX_LINES {
            unit.diagnostics.error(line_number, AsmError::TooManyLines(MAX_LINES));
            return ControlFlow::Break(());
        }

        if raw_line.len() > MAX_LINE_LEN {
            unit.diagnostics.error(line_number, AsmError::LineTooLong(MAX_LINE_LEN));
            unit.lines.push(LineRecord {
                is_error: true,
                ..LineRecord::new(line_number, FIRST_ADDRESS + unit.ic, raw_line)
            });
            continue;
        }

        if process_line(unit, line_number, raw_line).is_break() {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

fn process_line(unit: &mut TranslationUnit, line_number: usize, raw_line: &str) -> ControlFlow<()> {
    let start_address = FIRST_ADDRESS + unit.ic;
    let mut record = LineRecord::new(line_number, start_address, raw_line);

    if lex::is_whitespace(raw_line) {
        unit.lines.push(record);
        return ControlFlow::Continue(());
    }

    let after_indent = lex::trim_left(raw_line);
    if after_indent.starts_with(';') {
        record.kind = LineKind::Comment;
        if !raw_line.starts_with(';') {
            unit.diagnostics.error(line_number, AsmError::CommentNotAtStart);
            record.is_error = true;
        }
        unit.lines.push(record);
        return ControlFlow::Continue(());
    }

    let mut rest = after_indent;
    let mut pending_label: Option<(String, u32)> = None;

    if let Some(colon_idx) = rest.find(':') {
        let before_raw = &rest[..colon_idx];
        if lex::is_one_word(before_raw) {
            let name = lex::trim(before_raw);
            if lex::is_legal_label(name, MAX_LABEL_LEN) {
                pending_label = Some((name.to_string(), start_address));
            } else if name.is_empty() {
                unit.diagnostics.error(line_number, AsmError::EmptyLabel);
                record.is_error = true;
            } else if name.len() > MAX_LABEL_LEN {
                unit.diagnostics.error(line_number, AsmError::LabelTooLong(MAX_LABEL_LEN));
                record.is_error = true;
            } else {
                unit.diagnostics.error(line_number, AsmError::IllegalLabel(name.to_string()));
                record.is_error = true;
            }
            rest = lex::trim_left(&rest[colon_idx + 1..]);
        }
    }

    let (token, directive_rest) = lex::first_token(rest);
    if token.is_empty() {
        // Label-only line.
        if let Some((name, addr)) = pending_label {
            if insert_label(unit, line_number, &name, addr, &mut record).is_break() {
                unit.lines.push(record);
                return ControlFlow::Break(());
            }
        }
        unit.lines.push(record);
        return ControlFlow::Continue(());
    }

    if token.starts_with('.') {
        if token == ".extern" || token == ".entry" {
            if pending_label.is_some() {
                let kind = if token == ".extern" { "extern" } else { "entry" };
                unit.diagnostics.warning(line_number, AsmError::LabelBeforeDirectiveIgnored(kind));
            }
        } else if let Some((name, addr)) = &pending_label {
            if insert_label(unit, line_number, name, *addr, &mut record).is_break() {
                unit.lines.push(record);
                return ControlFlow::Break(());
            }
        }

        record.kind = LineKind::Directive;
        return parse_directive(unit, line_number, token, directive_rest, &mut record);
    }

    if let Some((name, addr)) = pending_label {
        if insert_label(unit, line_number, &name, addr, &mut record).is_break() {
            unit.lines.push(record);
            return ControlFlow::Break(());
        }
    }

    match lookup_command(token) {
        Some(cmd) => {
            record.kind = LineKind::Command;
            parse_command(unit, line_number, cmd, directive_rest, &mut record)
        }
        None => {
            unit.diagnostics.error(line_number, AsmError::UnknownCommand(token.to_string()));
            record.is_error = true;
            unit.lines.push(record);
            ControlFlow::Continue(())
        }
    }
}

/// Insert a label into the symbol table. Returns `ControlFlow::Break(())`
/// only when the symbol table is full, which stops pass 1 early; a
/// duplicate name is just a per-line error and pass 1 keeps going.
fn insert_label(unit: &mut TranslationUnit, line_number: usize, name: &str, addr: u32, record: &mut LineRecord) -> ControlFlow<()> {
    match unit.symbols.add_label(name, addr, false) {
        Ok(()) => {
            record.label = Some(name.to_string());
            ControlFlow::Continue(())
        }
        Err(err @ AsmError::TooManySymbols(_)) => {
            unit.diagnostics.error(line_number, err);
            record.is_error = true;
            ControlFlow::Break(())
        }
        Err(err) => {
            unit.diagnostics.error(line_number, err);
            record.is_error = true;
            ControlFlow::Continue(())
        }
    }
}

fn reserve_words(unit: &mut TranslationUnit, line_number: usize, count: u32) -> ControlFlow<()> {
    if unit.word_total() + count > MAX_MEMORY_WORDS as u32 {
        unit.diagnostics.error(line_number, AsmError::MemoryExhausted(MAX_MEMORY_WORDS));
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

fn parse_directive(
    unit: &mut TranslationUnit,
    line_number: usize,
    token: &str,
    rest: &str,
    record: &mut LineRecord,
) -> ControlFlow<()> {
    match token {
        ".data" => parse_data_directive(unit, line_number, rest, record),
        ".string" => parse_string_directive(unit, line_number, rest, record),
        ".mat" => parse_mat_directive(unit, line_number, rest, record),
        ".extern" => parse_extern_directive(unit, line_number, rest, record),
        ".entry" => parse_entry_directive(unit, line_number, rest, record),
        other => {
            unit.diagnostics.error(line_number, AsmError::UnknownDirective(other.to_string()));
            record.is_error = true;
            unit.lines.push(record.clone());
            ControlFlow::Continue(())
        }
    }
}

fn parse_number_list(unit: &mut TranslationUnit, line_number: usize, rest: &str, bits: u32, record: &mut LineRecord) -> Vec<i32> {
    let mut values = Vec::new();
    let mut remaining = rest;
    loop {
        let (operand, new_rest, found_comma) = lex::first_operand(remaining);
        if operand.is_empty() {
            break;
        }
        match lex::is_legal_number(operand, bits) {
            Some(v) => values.push(v as i32),
            None => {
                unit.diagnostics.error(line_number, AsmError::InvalidNumber(operand.to_string()));
                record.is_error = true;
            }
        }
        if found_comma {
            if new_rest.is_empty() {
                unit.diagnostics.error(line_number, AsmError::TrailingComma);
                record.is_error = true;
                break;
            }
            remaining = new_rest;
        } else {
            break;
        }
    }
    values
}

/// Like `parse_number_list`, but for `.mat` bodies: values may be
/// separated by commas, whitespace, or both, unlike `.data`'s comma-only
/// list.
fn parse_mat_value_list(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> Vec<i32> {
    let mut values = Vec::new();
    let mut remaining = rest;
    loop {
        let (value, new_rest) = lex::first_mat_value(remaining);
        if value.is_empty() {
            break;
        }
        match lex::is_legal_number(value, 10) {
            Some(v) => values.push(v as i32),
            None => {
                unit.diagnostics.error(line_number, AsmError::InvalidNumber(value.to_string()));
                record.is_error = true;
            }
        }
        remaining = new_rest;
    }
    values
}

fn parse_data_directive(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> ControlFlow<()> {
    let dc_before = unit.dc;
    let values = parse_number_list(unit, line_number, rest, 10, record);

    if reserve_data_words(unit, line_number, values.len() as u32, record).is_break() {
        return ControlFlow::Break(());
    }
    for v in values {
        unit.data_segment.push(v);
        unit.dc += 1;
    }

    if let Some(name) = record.label.clone() {
        unit.symbols.mark_data(&name, FIRST_ADDRESS + dc_before);
    }
    unit.lines.push(record.clone());
    ControlFlow::Continue(())
}

fn parse_string_directive(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> ControlFlow<()> {
    let dc_before = unit.dc;
    let text = lex::trim(rest);
    match lex::is_legal_string_param(text) {
        Some(chars) => {
            let word_count = chars.chars().count() as u32 + 1;
            if reserve_data_words(unit, line_number, word_count, record).is_break() {
                return ControlFlow::Break(());
            }
            for ch in chars.chars() {
                unit.data_segment.push(ch as i32);
                unit.dc += 1;
            }
            unit.data_segment.push(0);
            unit.dc += 1;
        }
        None => {
            unit.diagnostics.error(line_number, AsmError::UnterminatedString);
            record.is_error = true;
        }
    }

    if let Some(name) = record.label.clone() {
        unit.symbols.mark_data(&name, FIRST_ADDRESS + dc_before);
    }
    unit.lines.push(record.clone());
    ControlFlow::Continue(())
}

fn parse_mat_directive(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> ControlFlow<()> {
    let dc_before = unit.dc;
    let trimmed = lex::trim_left(rest);

    let dims = parse_mat_dims(trimmed);
    let (x, y, values_rest) = match dims {
        Some(parsed) => parsed,
        None => {
            unit.diagnostics.error(line_number, AsmError::InvalidOperand);
            record.is_error = true;
            unit.lines.push(record.clone());
            return ControlFlow::Continue(());
        }
    };

    let cell_count = x * y;

    let mut values = parse_mat_value_list(unit, line_number, values_rest, record);
    if values.len() as u32 > cell_count {
        unit.diagnostics.error(line_number, AsmError::TooManyOperands);
        record.is_error = true;
        values.truncate(cell_count as usize);
    }
    values.resize(cell_count as usize, 0);

    if reserve_data_words(unit, line_number, cell_count, record).is_break() {
        return ControlFlow::Break(());
    }
    for v in values {
        unit.data_segment.push(v);
        unit.dc += 1;
    }

    if let Some(name) = record.label.clone() {
        unit.symbols.mark_mat(&name, FIRST_ADDRESS + dc_before, MatDims { x, y });
    }
    unit.lines.push(record.clone());
    ControlFlow::Continue(())
}

/// Parse `[x][y]` and return `(x, y, remainder_after_second_bracket)`.
fn parse_mat_dims(s: &str) -> Option<(u32, u32, &str)> {
    let open1 = s.find('[')?;
    if !lex::is_whitespace(&s[..open1]) {
        return None;
    }
    let close1 = open1 + s[open1..].find(']')?;
    let x = parse_positive_dim(lex::trim(&s[open1 + 1..close1]))?;

    let after_first = &s[close1 + 1..];
    let open2 = after_first.find('[')?;
    if !lex::is_whitespace(&after_first[..open2]) {
        return None;
    }
    let close2 = open2 + after_first[open2..].find(']')?;
    let y = parse_positive_dim(lex::trim(&after_first[open2 + 1..close2]))?;

    Some((x, y, &after_first[close2 + 1..]))
}

fn parse_positive_dim(s: &str) -> Option<u32> {
    let value = lex::is_legal_number(s, 32)?;
    if value > 0 && value <= 1000 {
        Some(value as u32)
    } else {
        None
    }
}

fn reserve_data_words(unit: &mut TranslationUnit, line_number: usize, count: u32, record: &mut LineRecord) -> ControlFlow<()> {
    if unit.word_total() + count > MAX_MEMORY_WORDS as u32 {
        unit.diagnostics.error(line_number, AsmError::MemoryExhausted(MAX_MEMORY_WORDS));
        record.is_error = true;
        unit.lines.push(record.clone());
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

fn parse_extern_directive(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> ControlFlow<()> {
    let (name, _) = lex::first_token(rest);
    let mut capacity_exceeded = false;
    if !lex::is_legal_label(name, MAX_LABEL_LEN) {
        unit.diagnostics.error(line_number, AsmError::IllegalLabel(name.to_string()));
        record.is_error = true;
    } else if let Err(err) = unit.symbols.add_label(name, 0, true) {
        capacity_exceeded = matches!(err, AsmError::TooManySymbols(_));
        unit.diagnostics.error(line_number, err);
        record.is_error = true;
    }
    unit.lines.push(record.clone());
    if capacity_exceeded {
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

fn parse_entry_directive(unit: &mut TranslationUnit, line_number: usize, rest: &str, record: &mut LineRecord) -> ControlFlow<()> {
    let (name, _) = lex::first_token(rest);
    if !lex::is_legal_label(name, MAX_LABEL_LEN) {
        unit.diagnostics.error(line_number, AsmError::IllegalLabel(name.to_string()));
        record.is_error = true;
    } else if let Err(err) = unit.symbols.add_entry(name, line_number) {
        unit.diagnostics.error(line_number, err);
        record.is_error = true;
    }
    unit.lines.push(record.clone());
    ControlFlow::Continue(())
}

fn parse_command(
    unit: &mut TranslationUnit,
    line_number: usize,
    cmd: &'static CommandDescriptor,
    rest: &str,
    record: &mut LineRecord,
) -> ControlFlow<()> {
    record.command = Some(cmd);

    let mut operands: Vec<(Operand, bool)> = Vec::new();
    let mut remaining = lex::trim(rest);
    let mut trailing_comma = false;
    loop {
        let (operand_str, new_rest, found_comma) = lex::first_operand(remaining);
        if operand_str.is_empty() {
            if found_comma {
                trailing_comma = true;
            }
            break;
        }
        operands.push((classify_operand(operand_str), found_comma));
        if !found_comma {
            break;
        }
        remaining = new_rest;
        if remaining.is_empty() {
            trailing_comma = true;
            break;
        }
    }

    if trailing_comma {
        unit.diagnostics.error(line_number, AsmError::TrailingComma);
        record.is_error = true;
    }

    let arity = cmd.arity as usize;
    if operands.len() < arity {
        unit.diagnostics.error(line_number, AsmError::NotEnoughOperands);
        record.is_error = true;
    } else if operands.len() > arity {
        unit.diagnostics.error(line_number, AsmError::TooManyOperands);
        record.is_error = true;
    }

    if operands.iter().any(|(op, _)| matches!(op, Operand::Invalid)) {
        unit.diagnostics.error(line_number, AsmError::InvalidOperand);
        record.is_error = true;
    }

    if operands.len() != arity || record.is_error {
        // Can't reliably size this instruction; reserve just the opcode
        // word so later lines keep a sane address and move on.
        return match reserve_words(unit, line_number, 1) {
            ControlFlow::Continue(()) => {
                unit.ic += 1;
                unit.lines.push(record.clone());
                ControlFlow::Continue(())
            }
            brk => brk,
        };
    }

    let (source, dest) = match arity {
        0 => (None, None),
        1 => (None, Some(operands.pop().unwrap().0)),
        _ => {
            let dest = operands.pop().unwrap().0;
            let source = operands.pop().unwrap().0;
            (Some(source), Some(dest))
        }
    };

    if cmd.opcode == 6 {
        if !matches!(source, Some(Operand::Label(_))) {
            unit.diagnostics.error(line_number, AsmError::LeaSourceMustBeLabel);
            record.is_error = true;
        }
    }

    if matches!(dest, Some(Operand::Number(_))) && !crate::operand::allows_number_destination(cmd.opcode) {
        unit.diagnostics.error(line_number, AsmError::NumberDestinationNotAllowed);
        record.is_error = true;
    }

    let mut word_count: u32 = 1;
    match (&source, &dest) {
        (Some(Operand::Register(_)), Some(Operand::Register(_))) => word_count += 1,
        (Some(s), Some(d)) => word_count += s.word_count() as u32 + d.word_count() as u32,
        (None, Some(d)) => word_count += d.word_count() as u32,
        (Some(s), None) => word_count += s.word_count() as u32,
        (None, None) => {}
    }

    if reserve_words(unit, line_number, word_count).is_break() {
        return ControlFlow::Break(());
    }
    unit.ic += word_count;

    record.source_operand = source;
    record.dest_operand = dest;
    unit.lines.push(record.clone());
    ControlFlow::Continue(())
}

fn classify_operand(raw: &str) -> Operand {
    let s = lex::trim(raw);
    if let Some(rest) = s.strip_prefix('#') {
        if rest.starts_with(char::is_whitespace) {
            return Operand::Invalid;
        }
        return match lex::is_legal_number(rest, 8) {
            Some(v) => Operand::Number(v as i32),
            None => Operand::Invalid,
        };
    }

    if lex::is_mat_syntax(s) {
        return classify_mat_operand(s);
    }

    if let Some(r) = lex::is_register(s) {
        return Operand::Register(r);
    }

    if lex::is_legal_label(s, MAX_LABEL_LEN) {
        return Operand::Label(s.to_string());
    }

    Operand::Invalid
}

fn classify_mat_operand(s: &str) -> Operand {
    let Some(open1) = s.find('[') else { return Operand::Invalid };
    let name = lex::trim(&s[..open1]);
    let Some(close1_rel) = s[open1..].find(']') else { return Operand::Invalid };
    let close1 = open1 + close1_rel;
    let idx1_str = lex::trim(&s[open1 + 1..close1]);

    let after = &s[close1 + 1..];
    let Some(open2) = after.find('[') else { return Operand::Invalid };
    let Some(close2_rel) = after[open2..].find(']') else { return Operand::Invalid };
    let close2 = open2 + close2_rel;
    let idx2_str = lex::trim(&after[open2 + 1..close2]);

    if !lex::is_legal_label(name, MAX_LABEL_LEN) {
        return Operand::Invalid;
    }

    match (classify_mat_index(idx1_str), classify_mat_index(idx2_str)) {
        (Some(idx1), Some(idx2)) => Operand::Mat { name: name.to_string(), idx1, idx2 },
        _ => Operand::Invalid,
    }
}

fn classify_mat_index(s: &str) -> Option<MatIndex> {
    if let Some(r) = lex::is_register(s) {
        return Some(MatIndex::Register(r));
    }
    s.parse::<i32>().ok().map(MatIndex::Immediate)
}
