//! Tokenizer for GraphQL documents.
//!
//! Commas, whitespace, a leading byte-order mark and `#` comments are
//! insignificant and never produce tokens. String tokens carry their
//! unescaped (and, for block strings, dedented) value.

use std::fmt;

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Name,
    Int,
    Float,
    String,
    BlockString,
    /// One of `! $ & ( ) : = @ [ ] { | }`.
    Punct,
    /// `...`
    Spread,
    Eof,
}

/// One token with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Name or number text, punctuator, or the cooked string value.
    pub value: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl Token {
    /// Whether this is the punctuator `c`.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.value.starts_with(c)
    }

    /// Whether this is the name `name` (keywords are plain names).
    pub fn is_name(&self, name: &str) -> bool {
        self.kind == TokenKind::Name && self.value == name
    }

    /// Whether this is a string or block string.
    pub fn is_string(&self) -> bool {
        matches!(self.kind, TokenKind::String | TokenKind::BlockString)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::String | TokenKind::BlockString => f.write_str("string"),
            _ => write!(f, "`{}`", self.value),
        }
    }
}

/// A lexical or grammatical error at a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Split `src` into tokens, ending with a single [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer {
        src,
        chars: src.char_indices().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |(i, _)| *i)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                if self.peek() != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | ',' | '\n' | '\r' | '\u{feff}' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_ignored();
        let (start, line, column) = (self.offset(), self.line, self.column);
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                start,
                end: start,
                line,
                column,
            });
        };

        let (kind, value) = match c {
            '!' | '$' | '&' | '(' | ')' | ':' | '=' | '@' | '[' | ']' | '{' | '|' | '}' => {
                self.bump();
                (TokenKind::Punct, c.to_string())
            }
            '.' => {
                if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                    self.bump();
                    self.bump();
                    self.bump();
                    (TokenKind::Spread, "...".to_string())
                } else {
                    return Err(self.error("unexpected `.`, expected `...`"));
                }
            }
            '"' => {
                if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                    (TokenKind::BlockString, self.block_string()?)
                } else {
                    (TokenKind::String, self.string()?)
                }
            }
            '-' | '0'..='9' => self.number()?,
            c if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                (TokenKind::Name, name)
            }
            other => return Err(self.error(format!("unexpected character `{other}`"))),
        };

        Ok(Token {
            kind,
            value,
            start,
            end: self.offset(),
            line,
            column,
        })
    }

    fn digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            out.push(c);
            self.bump();
            count += 1;
        }
        count
    }

    fn number(&mut self) -> Result<(TokenKind, String), SyntaxError> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        if self.digits(&mut text) == 0 {
            return Err(self.error("expected digit"));
        }
        let mut kind = TokenKind::Int;
        if self.peek() == Some('.') {
            kind = TokenKind::Float;
            text.push('.');
            self.bump();
            if self.digits(&mut text) == 0 {
                return Err(self.error("expected digit after `.`"));
            }
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            kind = TokenKind::Float;
            text.push(e);
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            if self.digits(&mut text) == 0 {
                return Err(self.error("expected exponent digits"));
            }
        }
        if let Some(c) = self.peek()
            && (c == '_' || c == '.' || c.is_ascii_alphabetic())
        {
            return Err(self.error(format!("invalid number, unexpected `{c}`")));
        }
        Ok((kind, text))
    }

    fn string(&mut self) -> Result<String, SyntaxError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n' | '\r') => return Err(self.error("unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => value.push(self.escape()?),
                Some(c) => value.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, SyntaxError> {
        let c = match self.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let high = self.hex4()?;
                if (0xD800..0xDC00).contains(&high)
                    && self.peek() == Some('\\')
                    && self.peek_at(1) == Some('u')
                {
                    self.bump();
                    self.bump();
                    let low = self.hex4()?;
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                    char::from_u32(combined).ok_or_else(|| self.error("invalid surrogate pair"))?
                } else {
                    char::from_u32(high).ok_or_else(|| self.error("invalid unicode escape"))?
                }
            }
            Some(other) => return Err(self.error(format!("invalid escape `\\{other}`"))),
            None => return Err(self.error("unterminated string")),
        };
        Ok(c)
    }

    fn hex4(&mut self) -> Result<u32, SyntaxError> {
        let mut value = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn block_string(&mut self) -> Result<String, SyntaxError> {
        for _ in 0..3 {
            self.bump();
        }
        let mut raw = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated block string")),
                Some('"') if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') => {
                    for _ in 0..3 {
                        self.bump();
                    }
                    return Ok(dedent_block(&raw));
                }
                Some('\\')
                    if self.peek_at(1) == Some('"')
                        && self.peek_at(2) == Some('"')
                        && self.peek_at(3) == Some('"') =>
                {
                    for _ in 0..4 {
                        self.bump();
                    }
                    raw.push_str("\"\"\"");
                }
                Some(c) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
    }
}

/// Block string value: strip the common indentation of all lines but the
/// first, then drop leading and trailing blank lines.
fn dedent_block(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let indent_of = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();
    let common = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|&line| indent_of(line))
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, &line)| {
            if i == 0 {
                line
            } else {
                line.get(common.min(indent_of(line))..).unwrap_or("")
            }
        })
        .collect();
    while out.first().is_some_and(|line| line.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|line| line.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn test_names_punctuators_and_ignored() {
        let tokens = kinds("type Pet { id: ID!, # trailing comment\n tags: [String] }");
        let values: Vec<_> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(
            values,
            vec!["type", "Pet", "{", "id", ":", "ID", "!", "tags", ":", "[", "String", "]", "}", ""]
        );
        assert_eq!(tokens.last().unwrap().0, TokenKind::Eof);
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("0 -12 3.5 1e10 -2.5E-3");
        assert_eq!(tokens[0], (TokenKind::Int, "0".to_string()));
        assert_eq!(tokens[1], (TokenKind::Int, "-12".to_string()));
        assert_eq!(tokens[2], (TokenKind::Float, "3.5".to_string()));
        assert_eq!(tokens[3], (TokenKind::Float, "1e10".to_string()));
        assert_eq!(tokens[4], (TokenKind::Float, "-2.5E-3".to_string()));
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#""a\"b\\c\né""#);
        assert_eq!(tokens[0], (TokenKind::String, "a\"b\\c\n\u{e9}".to_string()));
        let err = tokenize("\"open\nline\"").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_block_string_dedent() {
        let src = "\"\"\"\n    First line\n      indented\n\n    Last \\\"\"\" quote\n  \"\"\"";
        let tokens = kinds(src);
        assert_eq!(
            tokens[0],
            (
                TokenKind::BlockString,
                "First line\n  indented\n\nLast \"\"\" quote".to_string()
            )
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("query {\n  pet\n}").unwrap();
        let pet = &tokens[2];
        assert_eq!((pet.line, pet.column), (2, 3));
        assert_eq!(&"query {\n  pet\n}"[pet.start..pet.end], "pet");
    }

    #[test]
    fn test_spread_and_bad_dot() {
        let tokens = kinds("...Frag");
        assert_eq!(tokens[0].0, TokenKind::Spread);
        assert!(tokenize("..x").is_err());
        assert!(tokenize("?").is_err());
    }
}
