//! Stage one: macro expansion.
//!
//! A single top-to-bottom scan over the source recognizes `mcro <name>` / `mcroend` blocks,
//! builds a name -> body table, and rewrites bare invocation lines inline. Macros are
//! parameterless text substitution: no arguments, no recursion, no expansion inside a macro's
//! own body. Grounded on the reference macro processor's line-by-line state machine.
//!
//! Any structural error (bad name, nesting, a stray or malformed `mcroend`, an unterminated
//! definition) aborts the whole expansion: every diagnostic for the file is still printed, but
//! the caller gets `None` rather than a partially-expanded stream.

use std::collections::HashMap;
use std::fmt;

use colored::Colorize;

use crate::assembler::opcodes::is_reserved_word;
use crate::assembler::statement::TokenSpan;
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InsideBody,
}

/// Expand macro definitions and invocations in `lines`. Returns `None` if any diagnostic was
/// printed; on success, the returned lines contain no `mcro`/`mcroend` markers at all, ready for
/// the assembler's first pass.
pub fn expand(lines: &[String]) -> Option<Vec<String>> {
    let mut macros: HashMap<String, Vec<String>> = HashMap::new();
    let mut state = State::Outside;
    let mut current_name = String::new();
    let mut output = Vec::new();
    let mut had_error = false;

    for (index, raw_line) in lines.iter().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();

        match state {
            State::Outside => {
                if line.is_empty() || line.starts_with(';') {
                    output.push(line.to_string());
                    continue;
                }

                let mut tokens = line.split_whitespace();
                let first = tokens.next().unwrap_or("");

                if first == "mcro" {
                    match open_definition(line, line_number, tokens, &macros) {
                        Ok(name) => {
                            current_name = name;
                            macros.insert(current_name.clone(), Vec::new());
                            state = State::InsideBody;
                        }
                        Err(e) => {
                            report(e);
                            had_error = true;
                        }
                    }
                } else if first == "mcroend" {
                    report(Error::StrayMcroend { line_number, line: line.to_string() });
                    had_error = true;
                } else if macros.contains_key(line) {
                    output.extend(macros[line].iter().cloned());
                } else {
                    output.push(line.to_string());
                }
            }
            State::InsideBody => {
                if line.is_empty() || line.starts_with(';') {
                    continue;
                }

                let mut tokens = line.split_whitespace();
                let first = tokens.next().unwrap_or("");

                if first == "mcro" {
                    report(Error::NestedMacroDefinition { line_number, line: line.to_string() });
                    had_error = true;
                } else if first == "mcroend" {
                    if tokens.next().is_some() {
                        report(Error::TrailingTokensInFooter { line_number, line: line.to_string() });
                        had_error = true;
                    }
                    state = State::Outside;
                } else {
                    macros.get_mut(&current_name).expect("current_name is always a live table entry").push(line.to_string());
                }
            }
        }
    }

    if state == State::InsideBody {
        report(Error::UnterminatedMacroDefinition { line_number: lines.len() });
        had_error = true;
    }

    if had_error {
        None
    } else {
        Some(output)
    }
}

fn open_definition<'a>(
    line: &str,
    line_number: usize,
    mut tokens: impl Iterator<Item = &'a str>,
    macros: &HashMap<String, Vec<String>>,
) -> Result<String, Error> {
    let name = tokens.next().ok_or_else(|| Error::MissingMacroName { line_number, line: line.to_string() })?;
    if tokens.next().is_some() {
        return Err(Error::TrailingTokensInHeader { line_number, line: line.to_string() });
    }

    let name_span = name_span(line, name);
    if is_reserved_word(name) {
        return Err(Error::InvalidMacroName { name: name.to_string(), line_number, line: line.to_string(), span: name_span });
    }
    if macros.contains_key(name) {
        return Err(Error::DuplicateMacroName { name: name.to_string(), line_number, line: line.to_string(), span: name_span });
    }
    Ok(name.to_string())
}

/// Locate `name`'s byte span within `line` (the second whitespace-delimited token), for
/// underlining the offending word in a diagnostic.
fn name_span(line: &str, name: &str) -> TokenSpan {
    let start = line.rfind(name).unwrap_or(0);
    TokenSpan::new(start, start + name.len())
}

fn report(error: Error) {
    logging::error(error.to_string());
}

/// A non-fatal diagnostic raised while expanding one file's macros. Any instance of this type
/// aborts the whole expansion for that file.
#[derive(Debug)]
pub enum Error {
    MissingMacroName { line_number: usize, line: String },
    TrailingTokensInHeader { line_number: usize, line: String },
    InvalidMacroName { name: String, line_number: usize, line: String, span: TokenSpan },
    DuplicateMacroName { name: String, line_number: usize, line: String, span: TokenSpan },
    NestedMacroDefinition { line_number: usize, line: String },
    StrayMcroend { line_number: usize, line: String },
    TrailingTokensInFooter { line_number: usize, line: String },
    UnterminatedMacroDefinition { line_number: usize },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, context, span): (String, Option<(&str, usize)>, Option<TokenSpan>) = match self {
            Error::MissingMacroName { line_number, line } => (
                format!("macro definition at line {line_number} is missing a name"),
                Some((line, *line_number)), None,
            ),
            Error::TrailingTokensInHeader { line_number, line } => (
                format!("macro definition at line {line_number} has extra tokens after the name"),
                Some((line, *line_number)), None,
            ),
            Error::InvalidMacroName { name, line_number, line, span } => (
                format!("\"{name}\" is not a valid macro name, at line {line_number}"),
                Some((line, *line_number)), Some(*span),
            ),
            Error::DuplicateMacroName { name, line_number, line, span } => (
                format!("macro \"{name}\" is already defined, at line {line_number}"),
                Some((line, *line_number)), Some(*span),
            ),
            Error::NestedMacroDefinition { line_number, line } => (
                format!("nested macro definitions are not allowed, at line {line_number}"),
                Some((line, *line_number)), None,
            ),
            Error::StrayMcroend { line_number, line } => (
                format!("\"mcroend\" without a matching \"mcro\", at line {line_number}"),
                Some((line, *line_number)), None,
            ),
            Error::TrailingTokensInFooter { line_number, line } => (
                format!("\"mcroend\" at line {line_number} has extra tokens after it"),
                Some((line, *line_number)), None,
            ),
            Error::UnterminatedMacroDefinition { line_number } => (
                format!("file ended at line {line_number} while still inside a macro definition"),
                None, None,
            ),
        };

        writeln!(f, "{message}")?;
        if let Some((line, line_number)) = context {
            write!(f, "{line_number}\t{line}")?;
            if let Some(span) = span {
                write!(f, "\n\t{}", logging::underline_spans(line, &[span.as_tuple()]).green())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn expands_a_simple_invocation() {
        let source = lines("mcro GREET\nmov r1, r2\nmcroend\nGREET\nstop");
        let expanded = expand(&source).unwrap();
        assert_eq!(expanded, vec!["mov r1, r2".to_string(), "stop".to_string()]);
    }

    #[test]
    fn non_invocation_lines_pass_through_unchanged() {
        let source = lines("mov r1, r2\nstop");
        let expanded = expand(&source).unwrap();
        assert_eq!(expanded, source);
    }

    #[test]
    fn comments_and_blank_lines_survive_outside_a_definition() {
        let source = lines("; a comment\n\nstop");
        let expanded = expand(&source).unwrap();
        assert_eq!(expanded, source);
    }

    #[test]
    fn comments_and_blank_lines_are_dropped_inside_a_definition() {
        let source = lines("mcro M\nmov r1, r2\n; ignored\n\nmcroend\nM");
        let expanded = expand(&source).unwrap();
        assert_eq!(expanded, vec!["mov r1, r2".to_string()]);
    }

    #[test]
    fn rejects_reserved_word_as_macro_name() {
        let source = lines("mcro stop\nmov r1, r2\nmcroend");
        assert!(expand(&source).is_none());
    }

    #[test]
    fn rejects_duplicate_macro_name() {
        let source = lines("mcro M\nmcroend\nmcro M\nmcroend");
        assert!(expand(&source).is_none());
    }

    #[test]
    fn rejects_nested_macro_definitions() {
        let source = lines("mcro OUTER\nmcro INNER\nmcroend\nmcroend");
        assert!(expand(&source).is_none());
    }

    #[test]
    fn rejects_stray_mcroend() {
        let source = lines("mov r1, r2\nmcroend");
        assert!(expand(&source).is_none());
    }

    #[test]
    fn rejects_unterminated_definition() {
        let source = lines("mcro M\nmov r1, r2");
        assert!(expand(&source).is_none());
    }

    #[test]
    fn rejects_trailing_tokens_on_header_and_footer() {
        assert!(expand(&lines("mcro M extra\nmcroend")).is_none());
        assert!(expand(&lines("mcro M\nmcroend extra")).is_none());
    }

    #[test]
    fn idempotent_on_input_with_no_macro_keywords() {
        let source = lines("mov r1, r2\nLOOP: add #1, r3\nstop");
        let once = expand(&source).unwrap();
        let twice = expand(&once).unwrap();
        assert_eq!(once, twice);
    }
}
