use crate::ops::{self, BinaryFn, UnaryFn};

/// Binding tiers of the binary operators, loosest first.
///
/// `Min` and `Max` are sentinels: parsing at `Max` means parsing a primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Min,
    Plus,
    Minus,
    Mult,
    Div,
    Exponent,
    Max,
}

impl Precedence {
    /// The next tighter tier. Saturates at `Max`.
    pub fn next(self) -> Self {
        match self {
            Precedence::Min => Precedence::Plus,
            Precedence::Plus => Precedence::Minus,
            Precedence::Minus => Precedence::Mult,
            Precedence::Mult => Precedence::Div,
            Precedence::Div => Precedence::Exponent,
            Precedence::Exponent | Precedence::Max => Precedence::Max,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TokenKind {
    Eof,
    Constant(f64),
    Variable,
    UnaryOp(UnaryFn),
    BinaryOp(BinaryFn, Precedence),
    LeftParen,
    RightParen,
    Pipe,
    Unknown,
}

impl TokenKind {
    /// Compares kinds only, ignoring payloads.
    pub fn same_kind(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Constant(_) => "constant",
            TokenKind::Variable => "variable",
            TokenKind::UnaryOp(_) => "function",
            TokenKind::BinaryOp(..) => "binary operator",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Pipe => "'|'",
            TokenKind::Unknown => "unrecognized input",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub slice: &'a str,
    pub offset: usize,
    pub kind: TokenKind,
}

impl Token<'_> {
    /// Byte offset one past the token's last character.
    pub fn end(&self) -> usize {
        self.offset + self.slice.len()
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slice)
    }
}

/// Lazily scans tokens and keeps them buffered, so any bounded lookahead is
/// cheap. Once end of input is reached, it is returned forever.
#[derive(Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    rest: &'a str,
    byte: usize,
    tokens: Vec<Token<'a>>,
    current: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source: input,
            rest: input,
            byte: 0,
            tokens: Vec::new(),
            current: 0,
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Token<'a> {
        self.peek_nth(0)
    }

    /// Returns the token `n` positions ahead without consuming anything.
    pub fn peek_nth(&mut self, n: usize) -> Token<'a> {
        while self.tokens.len() <= self.current + n
            && !self.tokens.last().is_some_and(Token::is_eof)
        {
            let token = self.scan();
            self.tokens.push(token);
        }

        let index = (self.current + n).min(self.tokens.len() - 1);
        self.tokens[index]
    }

    /// Consumes and returns the next token. Never advances past end of input.
    pub fn pop(&mut self) -> Token<'a> {
        let token = self.peek();
        if !token.is_eof() {
            self.current += 1;
        }
        token
    }

    fn advance(&mut self, len: usize) -> (&'a str, usize) {
        let offset = self.byte;
        let slice = &self.rest[..len];
        self.rest = &self.rest[len..];
        self.byte += len;
        (slice, offset)
    }

    fn scan(&mut self) -> Token<'a> {
        let trimmed = self.rest.trim_start();
        self.byte += self.rest.len() - trimmed.len();
        self.rest = trimmed;

        let token = self.scan_token();
        tracing::trace!(kind = %token.kind, slice = token.slice, offset = token.offset, "scanned token");
        token
    }

    fn scan_token(&mut self) -> Token<'a> {
        let Some(c) = self.rest.chars().next() else {
            return Token {
                slice: "",
                offset: self.source.len(),
                kind: TokenKind::Eof,
            };
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '|' => TokenKind::Pipe,
            '+' => TokenKind::BinaryOp(ops::add, Precedence::Plus),
            '-' => TokenKind::BinaryOp(ops::minus, Precedence::Minus),
            '*' => TokenKind::BinaryOp(ops::mult, Precedence::Mult),
            '/' => TokenKind::BinaryOp(ops::div, Precedence::Div),
            '^' => TokenKind::BinaryOp(ops::expt, Precedence::Exponent),
            '0'..='9' => return self.scan_number(),
            c if c.is_alphabetic() => return self.scan_word(),
            _ => TokenKind::Unknown,
        };

        let (slice, offset) = self.advance(c.len_utf8());
        Token {
            slice,
            offset,
            kind,
        }
    }

    // digits, then at most one '.' or ',' followed by more digits
    fn scan_number(&mut self) -> Token<'a> {
        let digits = |s: &str| {
            s.find(|c: char| !c.is_ascii_digit())
                .unwrap_or_else(|| s.len())
        };

        let mut len = digits(self.rest);
        if matches!(self.rest[len..].chars().next(), Some('.' | ',')) {
            len += 1;
            len += digits(&self.rest[len..]);
        }

        let (slice, offset) = self.advance(len);
        // digits with at most one '.' always parse ("7." included); overflow gives inf
        let n = slice
            .replace(',', ".")
            .parse::<f64>()
            .expect("scanned numeric literal is a valid float");
        let kind = TokenKind::Constant(n);

        Token {
            slice,
            offset,
            kind,
        }
    }

    fn scan_word(&mut self) -> Token<'a> {
        let len = self
            .rest
            .find(|c: char| !c.is_alphabetic())
            .unwrap_or_else(|| self.rest.len());
        let (slice, offset) = self.advance(len);

        let kind = match slice {
            "pi" => TokenKind::Constant(std::f64::consts::PI),
            "e" => TokenKind::Constant(std::f64::consts::E),
            "t" => TokenKind::Variable,
            word => match ops::function(word) {
                Some(f) => TokenKind::UnaryOp(f),
                None => TokenKind::Unknown,
            },
        };

        Token {
            slice,
            offset,
            kind,
        }
    }
}

/// Yields every token before end of input.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.pop();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}
