use crate::error::{PadError, PadResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),

    // Keywords
    Import,
    From,
    Raise,
    Del,
    And,
    Or,
    Not,
    True,
    False,
    None,

    // Operators / punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    /// End of statement: newline or `;`
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: usize,
    pub(crate) col: usize,
}

pub(crate) struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
    /// Open `(`/`[` count; newlines inside brackets are whitespace
    depth: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            col: 0,
            depth: 0,
        }
    }

    /// Whole source as tokens, ending in `Eof`
    pub(crate) fn tokenize(mut self) -> PadResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn is_ident_continue(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_'
    }

    fn token(kind: TokenKind, line: usize, col: usize) -> Token {
        Token { kind, line, col }
    }

    fn lex_number(&mut self, first: char, line: usize, col: usize) -> PadResult<Token> {
        let mut buf = String::new();
        buf.push(first);
        let mut is_float = first == '.';
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                self.bump();
                if ch != '_' {
                    buf.push(ch);
                }
            } else if ch == '.' && !is_float {
                is_float = true;
                buf.push(ch);
                self.bump();
            } else if (ch == 'e' || ch == 'E') && !buf.contains(|c| c == 'e' || c == 'E') {
                is_float = true;
                buf.push(ch);
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    buf.push(sign);
                    self.bump();
                }
            } else {
                break;
            }
        }

        let kind = if is_float {
            buf.parse::<f64>().map(TokenKind::Float).ok()
        } else {
            buf.parse::<i64>().map(TokenKind::Int).ok()
        };
        kind.map(|kind| Self::token(kind, line, col)).ok_or_else(|| {
            PadError::syntax(format!("invalid number literal '{buf}'"), line, col)
        })
    }

    fn lex_identifier(&mut self, first: char, line: usize, col: usize) -> Token {
        let mut buf = String::new();
        buf.push(first);
        while let Some(ch) = self.peek() {
            if Self::is_ident_continue(ch) {
                buf.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        let kind = match buf.as_str() {
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "raise" => TokenKind::Raise,
            "del" => TokenKind::Del,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => TokenKind::Identifier(buf),
        };
        Self::token(kind, line, col)
    }

    fn lex_string(&mut self, quote: char, line: usize, col: usize) -> PadResult<Token> {
        let mut buf = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => buf.push('\n'),
                    Some('t') => buf.push('\t'),
                    Some('r') => buf.push('\r'),
                    Some('0') => buf.push('\0'),
                    Some(ch @ ('\\' | '\'' | '"')) => buf.push(ch),
                    Some(other) => {
                        buf.push('\\');
                        buf.push(other);
                    }
                    None => {
                        return Err(PadError::syntax("unterminated string literal", line, col));
                    }
                },
                Some('\n') | None => {
                    return Err(PadError::syntax("unterminated string literal", line, col));
                }
                Some(ch) => buf.push(ch),
            }
        }
        Ok(Self::token(TokenKind::String(buf), line, col))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            let inside_brackets = self.depth > 0 && ch == '\n';
            if ch == ' ' || ch == '\t' || ch == '\r' || inside_brackets {
                self.bump();
            } else if ch == '\\' {
                // Explicit line continuation
                self.bump();
                self.bump_if('\r');
                self.bump_if('\n');
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    pub(crate) fn next_token(&mut self) -> PadResult<Token> {
        self.skip_whitespace();
        while self.peek() == Some('#') {
            self.skip_comment();
            self.skip_whitespace();
        }
        let line = self.line;
        let col = self.col + 1;

        let Some(ch) = self.bump() else {
            return Ok(Self::token(TokenKind::Eof, line, col));
        };
        let kind = match ch {
            '\n' | ';' => TokenKind::Newline,
            '"' | '\'' => return self.lex_string(ch, line, col),
            c if c.is_ascii_digit() => return self.lex_number(c, line, col),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                return self.lex_number('.', line, col)
            }
            c if Self::is_ident_start(c) => return Ok(self.lex_identifier(c, line, col)),
            '(' => {
                self.depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RParen
            }
            '[' => {
                self.depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.depth = self.depth.saturating_sub(1);
                TokenKind::RBracket
            }
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '=' if self.bump_if('=') => TokenKind::EqEq,
            '=' => TokenKind::Assign,
            '+' if self.bump_if('=') => TokenKind::PlusAssign,
            '+' => TokenKind::Plus,
            '-' if self.bump_if('=') => TokenKind::MinusAssign,
            '-' => TokenKind::Minus,
            '*' if self.bump_if('=') => TokenKind::StarAssign,
            '*' => TokenKind::Star,
            '/' if self.bump_if('/') => TokenKind::DoubleSlash,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '!' if self.bump_if('=') => TokenKind::Ne,
            '<' if self.bump_if('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.bump_if('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            other => {
                return Err(PadError::syntax(
                    format!("unexpected character '{other}'"),
                    line,
                    col,
                ))
            }
        };
        Ok(Self::token(kind, line, col))
    }
}
