//! Tokenizing one logical instruction line: splitting the opcode from its comma-separated
//! operands while keeping each token's byte span so diagnostics can underline the offending text.

/// A span of text in the source line. Used to neatly underline errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    start: usize,
    end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> TokenSpan {
        TokenSpan { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn as_tuple(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// An instruction line, already split into its mnemonic and operand tokens.
#[derive(Debug, Clone)]
pub struct Statement<'a> {
    mnemonic: &'a str,
    mnemonic_span: TokenSpan,
    operands: Vec<&'a str>,
    operand_spans: Vec<TokenSpan>,
    line_number: usize,
    line: &'a str,
}

impl<'a> Statement<'a> {
    pub fn mnemonic(&self) -> &'a str {
        self.mnemonic
    }

    pub fn mnemonic_span(&self) -> TokenSpan {
        self.mnemonic_span
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    pub fn operand(&self, index: usize) -> &'a str {
        self.operands[index]
    }

    pub fn operand_span(&self, index: usize) -> TokenSpan {
        self.operand_spans[index]
    }

    pub fn operand_spans(&self) -> &[TokenSpan] {
        &self.operand_spans
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn line(&self) -> &'a str {
        self.line
    }
}

/// A malformed comma-separated list: a trailing comma, or two commas with nothing but whitespace
/// between them. Both `.data`/`.string` literal lists and instruction operand lists are rejected
/// uniformly under this rule (see design notes).
#[derive(Debug, Clone, Copy)]
pub enum CommaListError {
    TrailingComma { span: TokenSpan },
    EmptyElement { span: TokenSpan },
}

/// Split `s` on commas, trimming whitespace from each element while keeping its byte span
/// relative to the start of `s`. Elements are never empty on success: a blank element (from a
/// leading, trailing, or doubled comma) is rejected before it can reach the caller.
pub fn split_comma_list(s: &str) -> Result<Vec<(&str, TokenSpan)>, CommaListError> {
    let mut elements = Vec::new();
    let mut offset = 0usize;
    let parts: Vec<&str> = s.split(',').collect();
    let last_index = parts.len().saturating_sub(1);

    for (i, part) in parts.iter().enumerate() {
        let part_start = offset;
        offset += part.len() + 1; // +1 for the comma that followed (absent after the last part)

        let leading_ws = part.len() - part.trim_start().len();
        let trimmed = part.trim();
        let start = part_start + leading_ws;
        let end = start + trimmed.len();
        let span = TokenSpan::new(start, end);

        if trimmed.is_empty() {
            if i == last_index && parts.len() > 1 {
                // Blank text after the final comma: a trailing comma. Anchor the diagnostic on
                // that comma itself, one byte before this (empty) span.
                let comma_at = part_start.saturating_sub(1);
                return Err(CommaListError::TrailingComma { span: TokenSpan::new(comma_at, comma_at + 1) });
            }
            return Err(CommaListError::EmptyElement { span });
        }

        elements.push((trimmed, span));
    }

    Ok(elements)
}

/// Split a line's remainder (after the mnemonic) into its operand tokens.
fn split_operands(rest: &str, rest_offset: usize) -> Result<(Vec<&str>, Vec<TokenSpan>), CommaListError> {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let leading_ws = rest.len() - rest.trim_start().len();
    let elements = split_comma_list(trimmed)?;
    let mut operands = Vec::with_capacity(elements.len());
    let mut spans = Vec::with_capacity(elements.len());
    for (text, span) in elements {
        operands.push(text);
        spans.push(TokenSpan::new(
            rest_offset + leading_ws + span.start(),
            rest_offset + leading_ws + span.end(),
        ));
    }
    Ok((operands, spans))
}

/// Tokenize one instruction line into a [`Statement`]. `line` must already have its label prefix
/// (if any) stripped. Returns `None` if the line is empty (nothing to tokenize).
pub fn tokenize(line: &'_ str, line_number: usize) -> Option<Result<Statement<'_>, CommaListError>> {
    let trimmed_start = line.len() - line.trim_start().len();
    let after_leading_ws = &line[trimmed_start..];
    if after_leading_ws.is_empty() {
        return None;
    }

    let mnemonic_len = after_leading_ws.find(char::is_whitespace).unwrap_or(after_leading_ws.len());
    let mnemonic = &after_leading_ws[..mnemonic_len];
    let mnemonic_span = TokenSpan::new(trimmed_start, trimmed_start + mnemonic_len);
    let rest = &after_leading_ws[mnemonic_len..];
    let rest_offset = trimmed_start + mnemonic_len;

    Some(split_operands(rest, rest_offset).map(|(operands, operand_spans)| Statement {
        mnemonic,
        mnemonic_span,
        operands,
        operand_spans,
        line_number,
        line,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_two_operands() {
        let stmt = tokenize("add #7, r1", 1).unwrap().unwrap();
        assert_eq!(stmt.mnemonic(), "add");
        assert_eq!(stmt.operand_count(), 2);
        assert_eq!(stmt.operand(0), "#7");
        assert_eq!(stmt.operand(1), "r1");
    }

    #[test]
    fn zero_operand_mnemonic() {
        let stmt = tokenize("stop", 1).unwrap().unwrap();
        assert_eq!(stmt.mnemonic(), "stop");
        assert_eq!(stmt.operand_count(), 0);
    }

    #[test]
    fn trailing_comma_is_rejected() {
        let result = tokenize("mov r1, r2,", 1).unwrap();
        assert!(matches!(result, Err(CommaListError::TrailingComma { .. })));
    }

    #[test]
    fn consecutive_commas_are_rejected() {
        let result = tokenize("mov r1,, r2", 1).unwrap();
        assert!(matches!(result, Err(CommaListError::EmptyElement { .. })));
    }

    #[test]
    fn operand_spans_point_at_trimmed_token() {
        let stmt = tokenize("mov  r1 ,  r2", 1).unwrap().unwrap();
        let span = stmt.operand_span(1);
        assert_eq!(&stmt.line()[span.start()..span.end()], "r2");
    }
}
