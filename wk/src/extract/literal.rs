//! Parser for list-of-strings literals such as `["paris", 'lagos',]`

use thiserror::Error;

/// Why a list literal could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("expected '[' at offset {0}")]
    ExpectedOpen(usize),

    #[error("expected a quoted string at offset {0}")]
    ExpectedString(usize),

    #[error("expected ',' or ']' at offset {0}")]
    ExpectedSeparator(usize),

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unexpected trailing input at offset {0}")]
    TrailingInput(usize),
}

/// Parse a bracketed list of single- or double-quoted strings
///
/// Accepts backslash escapes and an optional trailing comma. Elements are
/// returned exactly as written; trimming is the caller's concern.
pub fn parse_list_literal(text: &str) -> Result<Vec<String>, LiteralError> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    if !parser.eat('[') {
        return Err(LiteralError::ExpectedOpen(parser.offset()));
    }

    let mut items = Vec::new();
    loop {
        parser.skip_whitespace();
        if parser.eat(']') {
            break;
        }

        items.push(parser.string()?);

        parser.skip_whitespace();
        if parser.eat(',') {
            continue;
        }
        if parser.eat(']') {
            break;
        }
        return Err(LiteralError::ExpectedSeparator(parser.offset()));
    }

    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err(LiteralError::TrailingInput(parser.offset()));
    }
    Ok(items)
}

struct Parser<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.text.len())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let start = self.offset();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(LiteralError::ExpectedString(start)),
        };
        self.chars.next();

        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                c if c == quote => return Ok(value),
                '\n' => break,
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '0')) => value.push('\0'),
                    // Line continuation
                    Some((_, '\n')) => {}
                    Some((_, e @ ('\\' | '\'' | '"'))) => value.push(e),
                    // Unknown escapes keep the backslash
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err(LiteralError::UnterminatedString(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted() {
        assert_eq!(parse_list_literal(r#"["paris", "lagos"]"#).unwrap(), vec!["paris", "lagos"]);
    }

    #[test]
    fn test_single_quoted_with_trailing_comma() {
        assert_eq!(parse_list_literal("['paris', 'lao',]").unwrap(), vec!["paris", "lao"]);
    }

    #[test]
    fn test_mixed_quotes_and_escapes() {
        let parsed = parse_list_literal(r#"['c\'est la vie', "say \"hi\"", 'a\\b']"#).unwrap();
        assert_eq!(parsed, vec!["c'est la vie", "say \"hi\"", "a\\b"]);
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_list_literal("[]").unwrap().is_empty());
        assert!(parse_list_literal("[ \n ]").unwrap().is_empty());
    }

    #[test]
    fn test_multiline_list() {
        let parsed = parse_list_literal("[\n  \"paris\",\n  \"lagos\"\n]").unwrap();
        assert_eq!(parsed, vec!["paris", "lagos"]);
    }

    #[test]
    fn test_unicode_titles() {
        assert_eq!(
            parse_list_literal("['São Paulo', \"Zürich\"]").unwrap(),
            vec!["São Paulo", "Zürich"]
        );
    }

    #[test]
    fn test_rejects_bare_words() {
        assert_eq!(parse_list_literal("[paris, lagos]"), Err(LiteralError::ExpectedString(1)));
    }

    #[test]
    fn test_rejects_non_string_items() {
        assert!(parse_list_literal("['paris', 42]").is_err());
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!(matches!(
            parse_list_literal("['paris' 'lagos']"),
            Err(LiteralError::ExpectedSeparator(_))
        ));
    }

    #[test]
    fn test_rejects_unterminated() {
        assert_eq!(parse_list_literal("['paris]"), Err(LiteralError::UnterminatedString(1)));
    }

    #[test]
    fn test_rejects_trailing_input() {
        assert!(matches!(
            parse_list_literal("['paris'] and more"),
            Err(LiteralError::TrailingInput(_))
        ));
    }

    #[test]
    fn test_rejects_unbracketed() {
        assert_eq!(parse_list_literal("'paris'"), Err(LiteralError::ExpectedOpen(0)));
    }
}
