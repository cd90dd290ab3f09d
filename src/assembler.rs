//! Converts source assembly (already macro-expanded) into machine code in a two-pass manner.
//!
//! The first pass resolves labels and generates a symbol table, partial instruction encodings, and
//! the data image, while the second pass patches label-dependent operand words and records `.entry`
//! exports plus `.extern` usage sites.
//!
//! The syntax assembled here targets a 24-bit word-addressable virtual machine with sixteen
//! mnemonics (`mov`, `cmp`, `add`, `sub`, `lea`, `clr`, `not`, `inc`, `dec`, `jmp`, `bne`, `jsr`,
//! `red`, `prn`, `rts`, `stop`) and four addressing modes: immediate (`#7`), direct (`LABEL`),
//! relative (`&LABEL`), and register (`r0`..`r7`).
//!
//! Unlike a fail-fast parser, this assembler's two passes follow the reference implementation's
//! error model: a malformed line sets a per-file error flag and printing continues so a single run
//! can surface every diagnostic in the file, not just the first. If the flag is set at the end of
//! pass one, pass two and emission are both skipped.

pub mod directives;
pub mod emit;
pub mod opcodes;
pub mod statement;
pub mod symbol;
pub mod word;

use std::fmt;

use colored::Colorize;

use crate::logging;
use opcodes::{is_reserved_word, rule_for, AddressingMode, Mnemonic};
use statement::{tokenize, CommaListError, TokenSpan};
use symbol::{SymbolBase, SymbolTable};
use word::{ExtensionWord, FirstWord};

/// The address of the first instruction word. Everything before it is out of the addressable
/// code/data image; `.obj` code sizes are reported relative to it.
pub const CODE_BASE_ADDRESS: u32 = 100;
pub const MAX_LABEL_LENGTH: usize = 31;
pub const MAX_LINE_LENGTH: usize = 80;

/// One source instruction's machine code: the first word is complete after pass one; any
/// extension words for `Direct`/`Relative` operands start as placeholders and are patched in
/// place during pass two.
#[derive(Debug)]
pub struct MachineCodeRecord {
    pub ic: u32,
    pub first_word: FirstWord,
    pub extension_words: Vec<ExtensionWord>,
    pub needs_resolution: bool,
}

impl MachineCodeRecord {
    pub fn word_count(&self) -> u32 {
        1 + self.extension_words.len() as u32
    }
}

/// One external symbol reference: the address of the extension word that carries it.
#[derive(Debug)]
pub struct ExternalUsage {
    pub name: String,
    pub address: u32,
}

/// Everything pass one and pass two produce for one source file, ready for the emitters.
#[derive(Debug, Default)]
pub struct Assembly {
    pub records: Vec<MachineCodeRecord>,
    pub data: Vec<i32>,
    pub symbols: SymbolTable,
    pub externals: Vec<ExternalUsage>,
    pub icf: u32,
    pub dcf: u32,
}

/// Assemble already-expanded source text. `lines` is the buffered line sequence both passes walk
/// (see design notes: re-reading from this `Vec` rather than rewinding a file handle). Returns
/// `None` if any diagnostic was printed; diagnostics are reported to stderr as they're found, not
/// collected into the return value.
pub fn assemble(lines: &[String]) -> Option<Assembly> {
    let mut assembly = Assembly::default();
    if first_pass(lines, &mut assembly) {
        return None;
    }
    assembly.symbols.relocate_data_symbols(assembly.icf);
    if second_pass(lines, &mut assembly) {
        return None;
    }
    Some(assembly)
}

fn report(error: Error) {
    logging::error(error.to_string());
}

fn comma_error(error: CommaListError, line_number: usize, line: &str) -> Error {
    match error {
        CommaListError::TrailingComma { span } => {
            Error::TrailingComma { line_number, line: line.to_string(), span }
        }
        CommaListError::EmptyElement { span } => {
            Error::ConsecutiveCommas { line_number, line: line.to_string(), span }
        }
    }
}

/// Find the first occurrence of `needle` that isn't inside a double-quoted `.string` literal.
/// A label can never contain a quote, so scanning quote state from the start of the line is
/// enough to tell a real separator from one that's just string content.
fn find_outside_quotes(line: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == needle && !in_quotes {
            return Some(i);
        }
    }
    None
}

/// Split a line's optional `label:` prefix off, validating the label if one is present.
fn split_label<'a>(line: &'a str, line_number: usize) -> Result<(Option<String>, &'a str), Error> {
    match find_outside_quotes(line, ':') {
        None => Ok((None, line)),
        Some(colon) => {
            let label = &line[..colon];
            validate_label(label, line_number, line)?;
            Ok((Some(label.to_string()), &line[colon + 1..]))
        }
    }
}

fn validate_label(label: &str, line_number: usize, line: &str) -> Result<(), Error> {
    let span = TokenSpan::new(0, label.len());
    let mut chars = label.chars();
    let valid_shape = match chars.next() {
        Some(first) => first.is_ascii_alphabetic() && chars.all(|c| c.is_ascii_alphanumeric()),
        None => false,
    };
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH || !valid_shape {
        return Err(Error::InvalidLabel { label: label.to_string(), line_number, line: line.to_string(), span });
    }
    if is_reserved_word(label) {
        return Err(Error::ReservedWordAsName { name: label.to_string(), line_number, line: line.to_string(), span });
    }
    Ok(())
}

fn first_pass(lines: &[String], assembly: &mut Assembly) -> bool {
    let mut had_error = false;
    let mut ic = CODE_BASE_ADDRESS;
    let mut dc = 0u32;

    for (index, raw_line) in lines.iter().enumerate() {
        let line_number = index + 1;
        if raw_line.chars().count() > MAX_LINE_LENGTH {
            report(Error::LineTooLong { line_number, length: raw_line.chars().count() });
            had_error = true;
            continue;
        }

        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let (label, rest) = match split_label(line, line_number) {
            Ok(x) => x,
            Err(e) => {
                report(e);
                had_error = true;
                continue;
            }
        };
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        let directive = rest.split_whitespace().next().unwrap_or("");

        // `.string`'s argument is an opaque quoted literal (handled by
        // `directives::parse_string_literal`); commas inside it are string content, not an
        // operand list, so this generic pre-check only applies to every other directive/instruction.
        if directive != ".string" {
            if let Err(e) = statement::split_comma_list(line) {
                report(comma_error(e, line_number, line));
                had_error = true;
                continue;
            }
        }

        match directive {
            ".data" | ".string" => {
                if let Some(name) = &label {
                    if assembly.symbols.contains(name) {
                        report(Error::DuplicateLabel { label: name.clone(), line_number, line: line.to_string() });
                        had_error = true;
                        continue;
                    }
                }
                let words = if directive == ".data" {
                    tokenize(rest, line_number)
                        .map(|r| r.map_err(|e| comma_error(e, line_number, line)))
                        .unwrap_or_else(|| Err(Error::InvalidDirective { line_number, line: line.to_string() }))
                        .and_then(|stmt| directives::parse_data(&stmt))
                } else {
                    directives::parse_string_literal(&rest[".string".len()..], line_number, line)
                };
                match words {
                    Ok(words) => {
                        if let Some(name) = label {
                            assembly.symbols.insert(name, dc, SymbolBase::Data);
                        }
                        dc += words.len() as u32;
                        assembly.data.extend(words);
                    }
                    Err(e) => {
                        report(e);
                        had_error = true;
                    }
                }
            }
            ".entry" => {
                // Handled in pass two; a label on this line, if any, is ignored.
            }
            ".extern" => {
                match tokenize(rest, line_number) {
                    Some(Ok(stmt)) => match directives::directive_name(&stmt) {
                        Ok(name) => {
                            if assembly.symbols.contains(name) {
                                report(Error::DuplicateLabel { label: name.to_string(), line_number, line: line.to_string() });
                                had_error = true;
                            } else {
                                assembly.symbols.insert(name.to_string(), 0, SymbolBase::Extern);
                            }
                        }
                        Err(e) => {
                            report(e);
                            had_error = true;
                        }
                    },
                    Some(Err(e)) => {
                        report(comma_error(e, line_number, line));
                        had_error = true;
                    }
                    None => {
                        report(Error::InvalidDirective { line_number, line: line.to_string() });
                        had_error = true;
                    }
                }
            }
            _ => {
                if let Some(name) = &label {
                    if assembly.symbols.contains(name) {
                        report(Error::DuplicateLabel { label: name.clone(), line_number, line: line.to_string() });
                        had_error = true;
                        continue;
                    }
                }
                match build_instruction(rest, ic, line_number, line) {
                    Ok(record) => {
                        if let Some(name) = label {
                            assembly.symbols.insert(name, ic, SymbolBase::Code);
                        }
                        ic += record.word_count();
                        assembly.records.push(record);
                    }
                    Err(e) => {
                        report(e);
                        had_error = true;
                    }
                }
            }
        }
    }

    assembly.icf = ic;
    assembly.dcf = dc;
    had_error
}

fn register_number(operand: &str) -> u8 {
    operand[1..].parse().expect("AddressingMode::classify already validated the digit")
}

fn build_instruction(rest: &str, ic: u32, line_number: usize, line: &str) -> Result<MachineCodeRecord, Error> {
    let stmt = match tokenize(rest, line_number) {
        None => return Err(Error::InvalidDirective { line_number, line: line.to_string() }),
        Some(Err(e)) => return Err(comma_error(e, line_number, line)),
        Some(Ok(stmt)) => stmt,
    };

    let mnemonic = Mnemonic::parse(stmt.mnemonic()).ok_or_else(|| Error::InvalidOpcode {
        mnemonic: stmt.mnemonic().to_string(),
        line_number,
        line: line.to_string(),
        span: stmt.mnemonic_span(),
    })?;
    let rule = rule_for(mnemonic);

    if stmt.operand_count() != rule.operand_count {
        return Err(Error::WrongOperandCount {
            mnemonic: stmt.mnemonic().to_string(),
            found: stmt.operand_count(),
            expected: rule.operand_count,
            line_number,
            line: line.to_string(),
        });
    }

    let (src_index, dest_index) = match rule.operand_count {
        2 => (Some(0), Some(1)),
        1 => (None, Some(0)),
        _ => (None, None),
    };

    let mut src_mode = AddressingMode::Immediate;
    let mut src_reg = 0u8;
    if let Some(i) = src_index {
        let operand = stmt.operand(i);
        let mode = AddressingMode::classify(operand);
        if !rule.allowed_source_modes.contains(&mode) {
            return Err(Error::InvalidSrcAddressingMode { operand: operand.to_string(), line_number, line: line.to_string(), span: stmt.operand_span(i) });
        }
        src_mode = mode;
        if mode == AddressingMode::Register {
            src_reg = register_number(operand);
        }
    }

    let mut dest_mode = AddressingMode::Immediate;
    let mut dest_reg = 0u8;
    if let Some(i) = dest_index {
        let operand = stmt.operand(i);
        let mode = AddressingMode::classify(operand);
        if !rule.allowed_dest_modes.contains(&mode) {
            return Err(Error::InvalidDstAddressingMode { operand: operand.to_string(), line_number, line: line.to_string(), span: stmt.operand_span(i) });
        }
        dest_mode = mode;
        if mode == AddressingMode::Register {
            dest_reg = register_number(operand);
        }
    }

    let first_word = FirstWord {
        e: false,
        r: false,
        a: true,
        funct: rule.funct,
        dest_reg,
        dest_mode,
        src_reg,
        src_mode,
        opcode_value: rule.opcode_value,
    };

    let mut extension_words = Vec::new();
    let mut needs_resolution = false;
    for (operand_index, mode) in [(src_index, src_mode), (dest_index, dest_mode)] {
        let Some(i) = operand_index else { continue };
        if mode == AddressingMode::Register {
            continue;
        }
        if mode == AddressingMode::Immediate {
            let operand = stmt.operand(i);
            let payload: i32 = operand[1..].parse().map_err(|_| Error::InvalidImmediateValue {
                operand: operand.to_string(),
                line_number,
                line: line.to_string(),
                span: stmt.operand_span(i),
            })?;
            extension_words.push(ExtensionWord::immediate(payload));
        } else {
            needs_resolution = true;
            extension_words.push(ExtensionWord::immediate(0));
        }
    }

    Ok(MachineCodeRecord { ic, first_word, extension_words, needs_resolution })
}

fn second_pass(lines: &[String], assembly: &mut Assembly) -> bool {
    let mut had_error = false;
    let mut record_cursor = 0usize;

    for (index, raw_line) in lines.iter().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let (_, rest) = match split_label(line, line_number) {
            Ok(x) => x,
            Err(_) => continue, // already reported in pass one
        };
        let rest = rest.trim();
        if rest.is_empty() {
            continue;
        }
        let directive = rest.split_whitespace().next().unwrap_or("");

        match directive {
            ".data" | ".string" | ".extern" => {}
            ".entry" => {
                if resolve_entry(rest, line_number, line, &mut assembly.symbols) {
                    had_error = true;
                }
            }
            _ => {
                let record = &mut assembly.records[record_cursor];
                record_cursor += 1;
                if record.needs_resolution
                    && resolve_operands(rest, line_number, line, record, &assembly.symbols, &mut assembly.externals)
                {
                    had_error = true;
                }
            }
        }
    }

    had_error
}

fn resolve_entry(rest: &str, line_number: usize, line: &str, symbols: &mut SymbolTable) -> bool {
    let stmt = match tokenize(rest, line_number) {
        Some(Ok(stmt)) => stmt,
        _ => {
            report(Error::InvalidDirective { line_number, line: line.to_string() });
            return true;
        }
    };
    match directives::directive_name(&stmt) {
        Ok(name) => {
            if symbols.mark_exported(name) {
                false
            } else {
                report(Error::UndefinedEntryLabel { label: name.to_string(), line_number, line: line.to_string() });
                true
            }
        }
        Err(e) => {
            report(e);
            true
        }
    }
}

fn resolve_operands(
    rest: &str,
    line_number: usize,
    line: &str,
    record: &mut MachineCodeRecord,
    symbols: &SymbolTable,
    externals: &mut Vec<ExternalUsage>,
) -> bool {
    let stmt = match tokenize(rest, line_number) {
        Some(Ok(stmt)) => stmt,
        _ => return false, // pass one already validated this line; unreachable in practice
    };

    let mut had_error = false;
    let mut ext_index = 0usize;
    for i in 0..stmt.operand_count() {
        let operand = stmt.operand(i);
        let mode = AddressingMode::classify(operand);
        if mode == AddressingMode::Register {
            continue;
        }
        if mode == AddressingMode::Immediate {
            ext_index += 1;
            continue;
        }

        let is_relative = mode == AddressingMode::Relative;
        let label_name = if is_relative { &operand[1..] } else { operand };

        match symbols.get(label_name) {
            None => {
                report(Error::UndefinedLabel { label: label_name.to_string(), line_number, line: line.to_string(), span: stmt.operand_span(i) });
                had_error = true;
            }
            Some(symbol) if is_relative && symbol.base == SymbolBase::Extern => {
                report(Error::ExternRelativeReference { label: label_name.to_string(), line_number, line: line.to_string(), span: stmt.operand_span(i) });
                had_error = true;
            }
            Some(symbol) if is_relative => {
                let displacement = symbol.address as i32 - record.ic as i32;
                record.extension_words[ext_index] = ExtensionWord::relative(displacement);
            }
            Some(symbol) if symbol.base == SymbolBase::Extern => {
                record.extension_words[ext_index] = ExtensionWord::external();
                externals.push(ExternalUsage { name: label_name.to_string(), address: record.ic + 1 + ext_index as u32 });
            }
            Some(symbol) => {
                record.extension_words[ext_index] = ExtensionWord::relocatable(symbol.address);
            }
        }
        ext_index += 1;
    }

    had_error
}

/// A non-fatal diagnostic raised while assembling one file. Every variant carries enough context
/// to render an underlined excerpt of the offending line, in the same spirit as the crate's
/// pre-existing statement diagnostics.
#[derive(Debug)]
pub enum Error {
    LineTooLong { line_number: usize, length: usize },
    TrailingComma { line_number: usize, line: String, span: TokenSpan },
    ConsecutiveCommas { line_number: usize, line: String, span: TokenSpan },
    InvalidLabel { label: String, line_number: usize, line: String, span: TokenSpan },
    DuplicateLabel { label: String, line_number: usize, line: String },
    ReservedWordAsName { name: String, line_number: usize, line: String, span: TokenSpan },
    InvalidDirective { line_number: usize, line: String },
    InvalidDataElement { token: String, line_number: usize, line: String, span: TokenSpan },
    MissingStringLiteral { line_number: usize, line: String },
    WrongOperandCount { mnemonic: String, found: usize, expected: usize, line_number: usize, line: String },
    InvalidOpcode { mnemonic: String, line_number: usize, line: String, span: TokenSpan },
    InvalidSrcAddressingMode { operand: String, line_number: usize, line: String, span: TokenSpan },
    InvalidDstAddressingMode { operand: String, line_number: usize, line: String, span: TokenSpan },
    InvalidImmediateValue { operand: String, line_number: usize, line: String, span: TokenSpan },
    UndefinedLabel { label: String, line_number: usize, line: String, span: TokenSpan },
    ExternRelativeReference { label: String, line_number: usize, line: String, span: TokenSpan },
    UndefinedEntryLabel { label: String, line_number: usize, line: String },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, context, spans): (String, Option<(&str, usize)>, Vec<TokenSpan>) = match self {
            Error::LineTooLong { line_number, length } => (
                format!("line {line_number} is {length} characters long, the limit is {MAX_LINE_LENGTH}"),
                None, vec![],
            ),
            Error::TrailingComma { line_number, line, span } => (
                format!("trailing comma at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::ConsecutiveCommas { line_number, line, span } => (
                format!("consecutive commas at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::InvalidLabel { label, line_number, line, span } => (
                format!("invalid label \"{label}\" at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::DuplicateLabel { label, line_number, line } => (
                format!("label \"{label}\" is already defined, at line {line_number}"),
                Some((line, *line_number)), vec![],
            ),
            Error::ReservedWordAsName { name, line_number, line, span } => (
                format!("\"{name}\" is a reserved word and cannot be used as a name, at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::InvalidDirective { line_number, line } => (
                format!("malformed directive at line {line_number}"),
                Some((line, *line_number)), vec![],
            ),
            Error::InvalidDataElement { token, line_number, line, span } => (
                format!("\"{token}\" is not a valid integer, at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::MissingStringLiteral { line_number, line } => (
                format!("expected a quoted string at line {line_number}"),
                Some((line, *line_number)), vec![],
            ),
            Error::WrongOperandCount { mnemonic, found, expected, line_number, line } => (
                format!("\"{mnemonic}\" expects {expected} operand(s), found {found}, at line {line_number}"),
                Some((line, *line_number)), vec![],
            ),
            Error::InvalidOpcode { mnemonic, line_number, line, span } => (
                format!("unknown opcode \"{mnemonic}\" at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::InvalidSrcAddressingMode { operand, line_number, line, span } => (
                format!("\"{operand}\" is not a valid source operand at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::InvalidDstAddressingMode { operand, line_number, line, span } => (
                format!("\"{operand}\" is not a valid destination operand at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::InvalidImmediateValue { operand, line_number, line, span } => (
                format!("\"{operand}\" is not a valid immediate value at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::UndefinedLabel { label, line_number, line, span } => (
                format!("label \"{label}\" is not defined, at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::ExternRelativeReference { label, line_number, line, span } => (
                format!("\"{label}\" is external and cannot be the target of a relative jump, at line {line_number}"),
                Some((line, *line_number)), vec![*span],
            ),
            Error::UndefinedEntryLabel { label, line_number, line } => (
                format!(".entry label \"{label}\" does not exist or is external, at line {line_number}"),
                Some((line, *line_number)), vec![],
            ),
        };

        writeln!(f, "{message}")?;
        if let Some((line, line_number)) = context {
            write!(f, "{line_number}\t{line}")?;
            if !spans.is_empty() {
                let ranges: Vec<(usize, usize)> = spans.iter().map(TokenSpan::as_tuple).collect();
                write!(f, "\n\t{}", logging::underline_spans(line, &ranges).green())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use word::ExtensionWord;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn scenario_one_mov_registers_only_is_one_word() {
        let assembly = assemble(&lines("mov r3, r5\nstop")).unwrap();
        let record = &assembly.records[0];
        assert_eq!(record.word_count(), 1);
        let word = record.first_word;
        assert_eq!((word.a, word.r, word.e), (true, false, false));
        assert_eq!(word.funct, 0);
        assert_eq!(word.opcode_value, 0);
        assert_eq!(word.src_reg, 3);
        assert_eq!(word.dest_reg, 5);
    }

    #[test]
    fn scenario_two_immediate_source_adds_one_extension_word() {
        let assembly = assemble(&lines("add #7, r1\nstop")).unwrap();
        let record = &assembly.records[0];
        assert_eq!(record.word_count(), 2);
        assert_eq!(record.first_word.opcode_value, 2);
        assert_eq!(record.first_word.funct, 1);
        assert_eq!(record.extension_words[0], ExtensionWord::immediate(7));
    }

    #[test]
    fn scenario_three_relative_branch_encodes_forward_displacement() {
        let source = lines("mov r1, r2\nbne &LOOP\nLOOP: stop");
        let assembly = assemble(&source).unwrap();
        // mov r1,r2 is one word at IC=100; bne &LOOP is at IC=101, LOOP resolves to IC=103.
        let record = &assembly.records[1];
        assert_eq!(record.ic, 101);
        assert_eq!(assembly.symbols.get("LOOP").unwrap().address, 103);
        assert_eq!(record.extension_words[0], ExtensionWord::relative(2));
    }

    #[test]
    fn scenario_four_stop_only_program_has_code_size_one() {
        let assembly = assemble(&lines("stop")).unwrap();
        assert_eq!(assembly.icf - CODE_BASE_ADDRESS, 1);
    }

    #[test]
    fn scenario_five_data_symbol_relocates_past_icf() {
        let source = lines("stop\nX: .data 3, -1, 42");
        let assembly = assemble(&source).unwrap();
        assert_eq!(assembly.icf, 101);
        assert_eq!(assembly.symbols.get("X").unwrap().address, 101);
        assert_eq!(assembly.data, vec![3, -1, 42]);
    }

    #[test]
    fn scenario_six_undefined_label_fails_the_whole_assembly() {
        assert!(assemble(&lines("mov GHOST, r1\nstop")).is_none());
    }

    #[test]
    fn entry_and_extern_round_trip() {
        let source = lines(".extern FOO\nENTRYPOINT: mov FOO, r1\n.entry ENTRYPOINT\nstop");
        let assembly = assemble(&source).unwrap();
        assert_eq!(assembly.externals.len(), 1);
        assert_eq!(assembly.externals[0].name, "FOO");
        assert_eq!(assembly.externals[0].address, assembly.records[0].ic + 1);
        assert!(assembly.symbols.get("ENTRYPOINT").unwrap().exported);
    }

    #[test]
    fn relative_reference_to_extern_label_is_rejected() {
        let source = lines(".extern FOO\nbne &FOO\nstop");
        assert!(assemble(&source).is_none());
    }

    #[test]
    fn duplicate_label_definition_is_rejected() {
        let source = lines("X: stop\nX: stop");
        assert!(assemble(&source).is_none());
    }

    #[test]
    fn total_emitted_words_match_icf_and_dcf_invariant() {
        let source = lines("mov #1, r1\nadd r1, r2\nstop\nY: .data 1, 2, 3");
        let assembly = assemble(&source).unwrap();
        let total_code_words: u32 = assembly.records.iter().map(MachineCodeRecord::word_count).sum();
        assert_eq!(total_code_words, assembly.icf - CODE_BASE_ADDRESS);
        assert_eq!(assembly.data.len() as u32, assembly.dcf);
    }

    #[test]
    fn reserved_word_as_label_is_rejected() {
        assert!(assemble(&lines("stop: mov r1, r2")).is_none());
    }

    #[test]
    fn oversize_line_is_rejected() {
        let long_line = "mov r1, r2".to_string() + &" ".repeat(75);
        assert_eq!(long_line.chars().count(), 85);
        assert!(assemble(&lines(&long_line)).is_none());
    }

    #[test]
    fn colon_inside_string_literal_is_not_mistaken_for_a_label() {
        let source = lines("MSG: .string \"Error: bad\"\nstop");
        let assembly = assemble(&source).unwrap();
        assert_eq!(assembly.symbols.get("MSG").unwrap().address, 0);
        let expected: Vec<i32> = "Error: bad".chars().map(|c| c as i32).chain(std::iter::once(0)).collect();
        assert_eq!(assembly.data, expected);
    }

    #[test]
    fn unlabeled_string_literal_with_a_colon_is_accepted() {
        let source = lines(".string \"Error: bad\"\nstop");
        let assembly = assemble(&source).unwrap();
        assert_eq!(assembly.dcf, 11);
    }

    #[test]
    fn comma_inside_string_literal_is_not_a_consecutive_comma_error() {
        let source = lines(".string \"a,,b\"\nstop");
        let assembly = assemble(&source).unwrap();
        let expected: Vec<i32> = "a,,b".chars().map(|c| c as i32).chain(std::iter::once(0)).collect();
        assert_eq!(assembly.data, expected);
    }

    #[test]
    fn trailing_comma_in_data_list_is_still_rejected() {
        assert!(assemble(&lines(".data 1, 2,\nstop")).is_none());
    }
}
