//! `.data`, `.string`, `.entry`, and `.extern` directive parsing.
//!
//! Each function here only validates and extracts what the directive's own line carries; the
//! orchestrator in the parent module is the one that knows what a directive result means for the
//! symbol table or the data image (whether a preceding label becomes a `Data` symbol, whether an
//! `.entry` name must already exist, and so on).

use super::statement::Statement;
use super::Error;

/// Parse a `.data` directive's comma-separated integer list into data words.
pub fn parse_data(statement: &Statement) -> Result<Vec<i32>, Error> {
    let mut words = Vec::with_capacity(statement.operand_count());
    for i in 0..statement.operand_count() {
        let token = statement.operand(i);
        let value: i32 = token.parse().map_err(|_| Error::InvalidDataElement {
            token: token.to_string(),
            line_number: statement.line_number(),
            line: statement.line().to_string(),
            span: statement.operand_span(i),
        })?;
        words.push(value);
    }
    Ok(words)
}

/// Parse a `.string` directive's quoted literal into data words, zero-terminated.
///
/// Takes the raw text following the `.string` token (not yet comma-tokenized — a string literal
/// may itself contain commas, so it is handled separately from the generic operand list).
pub fn parse_string_literal(rest: &str, line_number: usize, line: &str) -> Result<Vec<i32>, Error> {
    let trimmed = rest.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return Err(Error::MissingStringLiteral { line_number, line: line.to_string() });
    }
    let literal = &trimmed[1..trimmed.len() - 1];
    let mut words: Vec<i32> = literal.chars().map(|c| c as i32).collect();
    words.push(0);
    Ok(words)
}

/// Validate a `.extern` or `.entry` directive's single operand: exactly one name, not reserved.
pub fn directive_name<'a>(statement: &Statement<'a>) -> Result<&'a str, Error> {
    if statement.operand_count() != 1 {
        return Err(Error::WrongOperandCount {
            mnemonic: statement.mnemonic().to_string(),
            found: statement.operand_count(),
            expected: 1,
            line_number: statement.line_number(),
            line: statement.line().to_string(),
        });
    }
    let name = statement.operand(0);
    if super::opcodes::is_reserved_word(name) {
        return Err(Error::ReservedWordAsName {
            name: name.to_string(),
            line_number: statement.line_number(),
            line: statement.line().to_string(),
            span: statement.operand_span(0),
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::statement::tokenize;

    #[test]
    fn parses_signed_data_list() {
        let stmt = tokenize(".data 3, -1, 42", 1).unwrap().unwrap();
        let words = parse_data(&stmt).unwrap();
        assert_eq!(words, vec![3, -1, 42]);
    }

    #[test]
    fn rejects_non_numeric_data_element() {
        let stmt = tokenize(".data 3, x", 1).unwrap().unwrap();
        assert!(parse_data(&stmt).is_err());
    }

    #[test]
    fn string_literal_is_zero_terminated() {
        let words = parse_string_literal(" \"hi\"", 1, ".string \"hi\"").unwrap();
        assert_eq!(words, vec!['h' as i32, 'i' as i32, 0]);
    }

    #[test]
    fn string_literal_requires_quotes() {
        assert!(parse_string_literal(" hi", 1, ".string hi").is_err());
    }

    #[test]
    fn directive_name_rejects_reserved_word() {
        let stmt = tokenize(".extern stop", 1).unwrap().unwrap();
        assert!(directive_name(&stmt).is_err());
    }
}
