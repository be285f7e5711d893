/*!
Tokenization and top-level scanning for player SQL.

Two tools live here:

- [`Lexer`] turns an expression or predicate fragment into [`Token`]s for the
  expression parser.
- [`Scanner`] walks raw statement text with a small state machine (quote state
  plus parenthesis depth) to find clause keywords and separators that sit at the
  top level. Clause segmentation is done on the text with the scanner so that
  subqueries and function arguments are never split.
*/

use crate::questql::sql::error::{SqlError, SqlResult};

/// Token types recognised by the lexer.
///
/// Keywords are not distinguished from identifiers; the expression parser
/// compares identifier text case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Identifier, // names, keywords, `t.col`, `t.*`
    String,     // 'text' or "text"
    Number,     // 42, 3.14
    LeftParen,
    RightParen,
    Comma,
    Asterisk,
    Minus,
    Equal,
    NotEqual, // != or <>
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Semicolon,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Token text; for strings the unescaped contents
    pub value: String,
    /// Byte offset of the first character in the source
    pub position: usize,
    /// Byte offset just past the token
    pub end: usize,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Identifier && self.value.eq_ignore_ascii_case(keyword)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Converts fragment text into tokens.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    pub fn tokenize(mut self) -> SqlResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek(0) {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let start = self.offset();
            let token = match c {
                '\'' | '"' => self.read_string(c)?,
                '`' => self.read_quoted_identifier()?,
                '(' => self.single(TokenType::LeftParen, 1),
                ')' => self.single(TokenType::RightParen, 1),
                ',' => self.single(TokenType::Comma, 1),
                '*' => self.single(TokenType::Asterisk, 1),
                ';' => self.single(TokenType::Semicolon, 1),
                '-' => self.single(TokenType::Minus, 1),
                '=' => {
                    // `==` is accepted as equality
                    let width = if self.peek(1) == Some('=') { 2 } else { 1 };
                    self.single(TokenType::Equal, width)
                }
                '!' if self.peek(1) == Some('=') => self.single(TokenType::NotEqual, 2),
                '<' => match self.peek(1) {
                    Some('=') => self.single(TokenType::LessThanOrEqual, 2),
                    Some('>') => self.single(TokenType::NotEqual, 2),
                    _ => self.single(TokenType::LessThan, 1),
                },
                '>' => match self.peek(1) {
                    Some('=') => self.single(TokenType::GreaterThanOrEqual, 2),
                    _ => self.single(TokenType::GreaterThan, 1),
                },
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.read_number()
                }
                c if is_word_char(c) => self.read_identifier(),
                other => {
                    return Err(SqlError::parse_error(
                        format!("Unexpected character '{}'", other),
                        Some(start),
                    ));
                }
            };
            tokens.push(token);
        }
        let end = self.source.len();
        tokens.push(Token {
            token_type: TokenType::Eof,
            value: String::new(),
            position: end,
            end,
        });
        Ok(tokens)
    }

    fn single(&mut self, token_type: TokenType, width: usize) -> Token {
        let start = self.offset();
        self.pos += width;
        let end = self.offset();
        Token {
            token_type,
            value: self.source[start..end].to_string(),
            position: start,
            end,
        }
    }

    fn read_string(&mut self, quote: char) -> SqlResult<Token> {
        let start = self.offset();
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Err(SqlError::parse_error(
                        "Unterminated string literal",
                        Some(start),
                    ));
                }
                Some(c) if c == quote => {
                    // doubled quote is an escaped quote
                    if self.peek(1) == Some(quote) {
                        value.push(quote);
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Token {
            token_type: TokenType::String,
            value,
            position: start,
            end: self.offset(),
        })
    }

    fn read_quoted_identifier(&mut self) -> SqlResult<Token> {
        let start = self.offset();
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    return Err(SqlError::parse_error(
                        "Unterminated quoted identifier",
                        Some(start),
                    ));
                }
                Some('`') => {
                    self.pos += 1;
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
        Ok(Token {
            token_type: TokenType::Identifier,
            value,
            position: start,
            end: self.offset(),
        })
    }

    fn read_number(&mut self) -> Token {
        let start = self.offset();
        let mut seen_dot = false;
        while let Some(c) = self.peek(0) {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let end = self.offset();
        Token {
            token_type: TokenType::Number,
            value: self.source[start..end].to_string(),
            position: start,
            end,
        }
    }

    /// Reads `name`, `t.name` or `t.*` as one identifier token.
    fn read_identifier(&mut self) -> Token {
        let start = self.offset();
        loop {
            while self.peek(0).is_some_and(is_word_char) {
                self.pos += 1;
            }
            if self.peek(0) == Some('.') {
                match self.peek(1) {
                    Some(n) if is_word_char(n) => {
                        self.pos += 1;
                        continue;
                    }
                    Some('*') => {
                        self.pos += 2;
                    }
                    _ => {}
                }
            }
            break;
        }
        let end = self.offset();
        Token {
            token_type: TokenType::Identifier,
            value: self.source[start..end].to_string(),
            position: start,
            end,
        }
    }
}

/// Lexical state of the top-level scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
}

/// Quote and parenthesis aware scanner over raw statement text.
pub struct Scanner;

impl Scanner {
    /// Visits every character that sits outside quotes, with its paren depth.
    ///
    /// Depth is reported before the character is applied, so an opening
    /// parenthesis at the top level is visited at depth 0.
    fn walk(text: &str, mut visit: impl FnMut(usize, char, usize) -> bool) {
        let mut state = ScanState::Normal;
        let mut depth: usize = 0;
        let mut iter = text.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            match state {
                ScanState::Normal => {
                    match c {
                        '\'' => state = ScanState::SingleQuoted,
                        '"' => state = ScanState::DoubleQuoted,
                        '`' => state = ScanState::Backticked,
                        _ => {}
                    }
                    if !visit(i, c, depth) {
                        return;
                    }
                    match c {
                        '(' => depth += 1,
                        ')' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                }
                ScanState::SingleQuoted | ScanState::DoubleQuoted => {
                    let quote = if state == ScanState::SingleQuoted {
                        '\''
                    } else {
                        '"'
                    };
                    if c == quote {
                        if iter.peek().is_some_and(|(_, n)| *n == quote) {
                            iter.next();
                        } else {
                            state = ScanState::Normal;
                        }
                    }
                }
                ScanState::Backticked => {
                    if c == '`' {
                        state = ScanState::Normal;
                    }
                }
            }
        }
    }

    /// Collapses whitespace runs outside quotes into single spaces and trims.
    pub fn collapse_whitespace(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut state = ScanState::Normal;
        let mut last_space = false;
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match state {
                ScanState::Normal => {
                    if c.is_whitespace() {
                        if !last_space {
                            out.push(' ');
                            last_space = true;
                        }
                        continue;
                    }
                    last_space = false;
                    state = match c {
                        '\'' => ScanState::SingleQuoted,
                        '"' => ScanState::DoubleQuoted,
                        '`' => ScanState::Backticked,
                        _ => ScanState::Normal,
                    };
                    out.push(c);
                }
                ScanState::SingleQuoted | ScanState::DoubleQuoted => {
                    out.push(c);
                    let quote = if state == ScanState::SingleQuoted {
                        '\''
                    } else {
                        '"'
                    };
                    if c == quote {
                        if chars.peek() == Some(&quote) {
                            out.push(quote);
                            chars.next();
                        } else {
                            state = ScanState::Normal;
                        }
                    }
                }
                ScanState::Backticked => {
                    out.push(c);
                    if c == '`' {
                        state = ScanState::Normal;
                    }
                }
            }
        }
        out.trim().to_string()
    }

    /// Finds the first top-level occurrence of `keyword` at or after `from`.
    ///
    /// `keyword` may contain several words (`"GROUP BY"`); any whitespace run
    /// matches the space between them. Matching is case-insensitive and
    /// respects word boundaries. Returns the `(start, end)` byte range.
    pub fn find_keyword(text: &str, keyword: &str, from: usize) -> Option<(usize, usize)> {
        let mut found = None;
        let mut prev: Option<char> = None;
        Self::walk(text, |i, c, depth| {
            let boundary = prev.is_none_or(|p| !is_word_char(p));
            prev = Some(c);
            if i < from || depth > 0 || !boundary {
                return true;
            }
            if let Some(end) = Self::match_words_at(text, i, keyword) {
                found = Some((i, end));
                return false;
            }
            true
        });
        found
    }

    /// All top-level occurrences of `keyword`.
    pub fn find_all_keywords(text: &str, keyword: &str) -> Vec<(usize, usize)> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some((start, end)) = Self::find_keyword(text, keyword, from) {
            found.push((start, end));
            from = end;
        }
        found
    }

    fn match_words_at(text: &str, start: usize, keyword: &str) -> Option<usize> {
        let mut pos = start;
        for (n, word) in keyword.split_whitespace().enumerate() {
            if n > 0 {
                let rest = &text[pos..];
                let skipped = rest.len() - rest.trim_start().len();
                if skipped == 0 {
                    return None;
                }
                pos += skipped;
            }
            let candidate = text.get(pos..pos + word.len())?;
            if !candidate.eq_ignore_ascii_case(word) {
                return None;
            }
            pos += word.len();
        }
        match text[pos..].chars().next() {
            Some(next) if is_word_char(next) => None,
            _ => Some(pos),
        }
    }

    /// Splits on `separator` where it appears at depth 0 outside quotes.
    pub fn split_top_level(text: &str, separator: char) -> Vec<String> {
        let mut parts = Vec::new();
        let mut last = 0;
        Self::walk(text, |i, c, depth| {
            if c == separator && depth == 0 {
                parts.push(text[last..i].trim().to_string());
                last = i + c.len_utf8();
            }
            true
        });
        parts.push(text[last..].trim().to_string());
        parts
    }

    /// Index of the `)` matching the `(` at `open`.
    pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
        let mut found = None;
        Self::walk(&text[open..], |i, c, depth| {
            if c == ')' && depth == 1 {
                found = Some(open + i);
                return false;
            }
            true
        });
        found
    }

    /// `(open, close)` paren positions of every `(SELECT ...)` at any depth,
    /// outermost only; subqueries nested inside another one are skipped.
    pub fn find_subqueries(text: &str) -> Vec<(usize, usize)> {
        let mut openings = Vec::new();
        Self::walk(text, |i, c, _| {
            if c == '(' {
                let rest = &text[i + 1..];
                let offset = rest.len() - rest.trim_start().len();
                if Self::match_words_at(text, i + 1 + offset, "SELECT").is_some() {
                    openings.push(i);
                }
            }
            true
        });

        let mut found: Vec<(usize, usize)> = Vec::new();
        for open in openings {
            if found.last().is_some_and(|(_, close)| open < *close) {
                continue;
            }
            if let Some(close) = Self::matching_paren(text, open) {
                found.push((open, close));
            }
        }
        found
    }

    /// Whether the text has balanced parentheses and closed quotes.
    pub fn is_balanced(text: &str) -> bool {
        let mut depth: i64 = 0;
        let mut single = 0usize;
        let mut double = 0usize;
        for c in text.chars() {
            match c {
                '\'' => single += 1,
                '"' => double += 1,
                '(' if single % 2 == 0 && double % 2 == 0 => depth += 1,
                ')' if single % 2 == 0 && double % 2 == 0 => depth -= 1,
                _ => {}
            }
        }
        depth == 0 && single % 2 == 0 && double % 2 == 0
    }
}
