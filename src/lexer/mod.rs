// ABOUTME: Lexer producing a token stream with source locations from script source text

mod keywords;

use crate::error::{Position, SyntaxError};
pub use keywords::RESERVED_WORDS;

/// Every distinct kind of token the lexer can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Identifier(String),
    /// Canonical decimal text (hex/octal literals are normalised at lex time).
    Number(String),
    StringLiteral(String),
    /// Raw, unparsed text between `#` delimiters.
    DateLiteral(String),

    // Keywords
    Dim, Redim, Preserve, Erase, Const,
    Public, Private,
    Sub, Function, Property, Get, Let, Set, End, Class, New, Me,
    If, Then, ElseIf, Else,
    For, Each, In, To, Step, Next,
    Do, Loop, While, Wend, Until,
    Select, Case,
    With,
    Exit,
    On, Error, Resume, Goto,
    Call,
    Option_, Explicit,
    True, False, NothingLit, NullLit, EmptyLit,
    Is, And, Or, Not, Xor, Eqv, Imp, Mod,
    ByVal, ByRef, ParamArray, Default_,
    Rem,

    // Operators / punctuation
    Plus, Minus, Star, Slash, Backslash, Caret, Ampersand,
    LParen, RParen, Comma, Dot, Colon, Semicolon, Bang, LBracket, RBracket,
    Eq, Ne, Lt, Le, Gt, Ge,

    Newline,
    Eof,
    Unknown(char),
}

impl TokenKind {
    /// A short human name used in parser error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(s) => format!("identifier '{s}'"),
            TokenKind::Number(s) => format!("number '{s}'"),
            TokenKind::StringLiteral(s) => format!("string \"{s}\""),
            TokenKind::DateLiteral(s) => format!("date #{s}#"),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Unknown(c) => format!("unexpected character '{c}'"),
            other => format!("{other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    fn position(&self) -> Position {
        Position { line: self.line, column: self.column, offset: self.pos as u32 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s.as_bytes())
    }

    /// Skip spaces, tabs, and line-continuation `_` + CR/LF sequences. Does not skip
    /// newlines themselves — those are significant tokens.
    fn skip_inline_whitespace_and_continuations(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.advance();
                }
                Some(b'_') => {
                    // Only a line continuation if followed (after optional spaces) by a newline.
                    let mut lookahead = self.pos + 1;
                    while matches!(self.src.get(lookahead), Some(b' ') | Some(b'\t') | Some(b'\r')) {
                        lookahead += 1;
                    }
                    if matches!(self.src.get(lookahead), Some(b'\n')) {
                        while self.pos < lookahead {
                            self.advance();
                        }
                        self.advance(); // consume the newline itself
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn read_number(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        let start_pos = self.position();
        if self.starts_with("&H") || self.starts_with("&h") {
            self.advance();
            self.advance();
            let digit_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
            let text = String::from_utf8_lossy(&self.src[digit_start..self.pos]).into_owned();
            let value = i64::from_str_radix(&text, 16)
                .map_err(|_| SyntaxError::InvalidNumber { text: text.clone(), pos: start_pos })?;
            return Ok(value.to_string());
        }
        if self.starts_with("&O") || self.starts_with("&o") {
            self.advance();
            self.advance();
            let digit_start = self.pos;
            while matches!(self.peek(), Some(c) if (b'0'..=b'7').contains(&c)) {
                self.advance();
            }
            let text = String::from_utf8_lossy(&self.src[digit_start..self.pos]).into_owned();
            let value = i64::from_str_radix(&text, 8)
                .map_err(|_| SyntaxError::InvalidNumber { text: text.clone(), pos: start_pos })?;
            return Ok(value.to_string());
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            self.advance();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.advance();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save;
            }
        }

        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let value: f64 = text
            .parse()
            .map_err(|_| SyntaxError::InvalidNumber { text: text.clone(), pos: start_pos })?;
        Ok(crate::value::format_float(value))
    }

    fn read_string(&mut self) -> Result<String, SyntaxError> {
        let start_pos = self.position();
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(SyntaxError::UnterminatedString(start_pos)),
                Some(b'"') => {
                    self.advance();
                    if self.peek() == Some(b'"') {
                        out.push('"');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    let ch_start = self.pos;
                    // Advance one UTF-8 scalar value.
                    let rest = std::str::from_utf8(&self.src[ch_start..]).unwrap_or("");
                    if let Some(c) = rest.chars().next() {
                        for _ in 0..c.len_utf8() {
                            self.advance();
                        }
                        out.push(c);
                    } else {
                        self.advance();
                    }
                }
            }
        }
        Ok(out)
    }

    fn read_date_literal(&mut self) -> Result<String, SyntaxError> {
        let start_pos = self.position();
        self.advance(); // opening #
        let start = self.pos;
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(SyntaxError::UnterminatedDateLiteral(start_pos)),
                Some(b'#') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        self.advance(); // closing #
        Ok(text)
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_inline_whitespace_and_continuations();
        let start = self.position();

        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, span: Span { start, end: start } });
        };

        if c == b'\n' {
            self.advance();
            return Ok(self.finish(TokenKind::Newline, start));
        }

        if c == b'\'' {
            self.skip_comment();
            return self.next_token();
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            let ident = self.read_identifier();
            let lower = ident.to_ascii_lowercase();
            if lower == "rem" {
                self.skip_comment();
                return self.next_token();
            }
            if let Some(kw) = RESERVED_WORDS.get(lower.as_str()) {
                return Ok(self.finish(kw.clone(), start));
            }
            return Ok(self.finish(TokenKind::Identifier(ident), start));
        }

        if c.is_ascii_digit() || (c == b'.' && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit())) {
            let text = self.read_number()?;
            return Ok(self.finish(TokenKind::Number(text), start));
        }

        if c == b'"' {
            let text = self.read_string()?;
            return Ok(self.finish(TokenKind::StringLiteral(text), start));
        }

        if c == b'#' {
            let text = self.read_date_literal()?;
            return Ok(self.finish(TokenKind::DateLiteral(text), start));
        }

        macro_rules! two_char {
            ($second:expr, $both:expr, $single:expr) => {{
                self.advance();
                if self.peek() == Some($second) {
                    self.advance();
                    self.finish($both, start)
                } else {
                    self.finish($single, start)
                }
            }};
        }

        let tok = match c {
            b'+' => { self.advance(); self.finish(TokenKind::Plus, start) }
            b'-' => { self.advance(); self.finish(TokenKind::Minus, start) }
            b'*' => { self.advance(); self.finish(TokenKind::Star, start) }
            b'/' => { self.advance(); self.finish(TokenKind::Slash, start) }
            b'\\' => { self.advance(); self.finish(TokenKind::Backslash, start) }
            b'^' => { self.advance(); self.finish(TokenKind::Caret, start) }
            b'&' => { self.advance(); self.finish(TokenKind::Ampersand, start) }
            b'(' => { self.advance(); self.finish(TokenKind::LParen, start) }
            b')' => { self.advance(); self.finish(TokenKind::RParen, start) }
            b',' => { self.advance(); self.finish(TokenKind::Comma, start) }
            b'.' => { self.advance(); self.finish(TokenKind::Dot, start) }
            b':' => { self.advance(); self.finish(TokenKind::Colon, start) }
            b';' => { self.advance(); self.finish(TokenKind::Semicolon, start) }
            b'!' => { self.advance(); self.finish(TokenKind::Bang, start) }
            b'[' => { self.advance(); self.finish(TokenKind::LBracket, start) }
            b']' => { self.advance(); self.finish(TokenKind::RBracket, start) }
            b'=' => { self.advance(); self.finish(TokenKind::Eq, start) }
            b'<' => two_char!(b'>', TokenKind::Ne, TokenKind::Lt),
            b'>' => { self.advance(); self.finish(TokenKind::Gt, start) }
            other => {
                self.advance();
                self.finish(TokenKind::Unknown(other as char), start)
            }
        };

        // `<=` and `>=` need three-way disambiguation handled separately from `<>`.
        if tok.kind == TokenKind::Lt && self.peek() == Some(b'=') {
            self.advance();
            return Ok(Token { kind: TokenKind::Le, span: Span { start, end: self.position() } });
        }
        if tok.kind == TokenKind::Gt && self.peek() == Some(b'=') {
            self.advance();
            return Ok(Token { kind: TokenKind::Ge, span: Span { start, end: self.position() } });
        }

        Ok(tok)
    }

    fn finish(&self, kind: TokenKind, start: Position) -> Token {
        Token { kind, span: Span { start, end: self.position() } }
    }
}

/// Tokenize an entire source unit, always ending in an `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let is_eof = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if is_eof {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn identifiers_are_case_insensitively_matched_against_keywords() {
        assert_eq!(kinds("If")[0], TokenKind::If);
        assert_eq!(kinds("IF")[0], TokenKind::If);
        assert_eq!(kinds("iF")[0], TokenKind::If);
    }

    #[test]
    fn plain_identifiers_pass_through() {
        assert_eq!(kinds("foo")[0], TokenKind::Identifier("foo".to_string()));
    }

    #[test]
    fn decimal_hex_and_octal_numbers_normalise_to_decimal_text() {
        assert_eq!(kinds("42")[0], TokenKind::Number("42".to_string()));
        assert_eq!(kinds("3.14")[0], TokenKind::Number("3.14".to_string()));
        assert_eq!(kinds("&HFF")[0], TokenKind::Number("255".to_string()));
        assert_eq!(kinds("&O17")[0], TokenKind::Number("15".to_string()));
    }

    #[test]
    fn string_literals_resolve_doubled_quotes() {
        assert_eq!(kinds(r#""say ""hi""""#)[0], TokenKind::StringLiteral(r#"say "hi""#.to_string()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn date_literals_are_passed_through_unparsed() {
        assert_eq!(kinds("#1/1/2020#")[0], TokenKind::DateLiteral("1/1/2020".to_string()));
    }

    #[test]
    fn apostrophe_and_rem_comments_run_to_end_of_line() {
        let toks = kinds("x = 1 ' trailing comment\ny = 2");
        assert!(toks.contains(&TokenKind::Newline));
        assert!(!toks.iter().any(|k| matches!(k, TokenKind::Identifier(s) if s == "trailing")));
    }

    #[test]
    fn line_continuation_hides_the_newline() {
        let toks = kinds("x = 1 + _\n    2");
        assert!(!toks.contains(&TokenKind::Newline));
    }

    #[test]
    fn comparison_operators_are_tokenized_correctly() {
        assert_eq!(kinds("<>"), vec![TokenKind::Ne, TokenKind::Eof]);
        assert_eq!(kinds("<="), vec![TokenKind::Le, TokenKind::Eof]);
        assert_eq!(kinds(">="), vec![TokenKind::Ge, TokenKind::Eof]);
        assert_eq!(kinds("<"), vec![TokenKind::Lt, TokenKind::Eof]);
        assert_eq!(kinds(">"), vec![TokenKind::Gt, TokenKind::Eof]);
    }

    #[test]
    fn unknown_characters_produce_an_unknown_token_rather_than_aborting() {
        let toks = kinds("x = @");
        assert!(toks.iter().any(|k| matches!(k, TokenKind::Unknown('@'))));
    }

    #[test]
    fn every_stream_ends_in_eof() {
        assert_eq!(kinds("").last(), Some(&TokenKind::Eof));
        assert_eq!(kinds("x").last(), Some(&TokenKind::Eof));
    }
}
