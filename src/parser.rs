use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use crate::{
    lexer::{Precedence, Token, TokenKind},
    ops::{self, BinaryFn, UnaryFn},
    Lexer,
};

/// Deepest nesting of groups, `|...|`, function calls and unary signs accepted.
pub const MAX_DEPTH: usize = 128;

#[derive(Diagnostic, Debug, Clone, Error)]
#[error("{message}")]
#[diagnostic(code(exprcalc::parse))]
pub struct ParseError {
    message: String,
    kind: TokenKind,
    text: String,
    #[label("here")]
    span: SourceSpan,
    #[source_code]
    src: String,
    #[help]
    help: Option<String>,
}

impl ParseError {
    fn new(message: String, token: &Token<'_>, source: &str) -> Self {
        let help = match token.slice {
            "." | "," => Some("a number may contain only one decimal marker".to_string()),
            _ => None,
        };

        Self {
            message,
            kind: token.kind,
            text: token.slice.to_string(),
            span: (token.offset, token.slice.len()).into(),
            src: source.to_string(),
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn token_kind(&self) -> TokenKind {
        self.kind
    }

    /// Text of the offending token, empty at end of input.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset where the offending token starts.
    pub fn offset(&self) -> usize {
        self.span.offset()
    }

    pub fn end(&self) -> usize {
        self.span.offset() + self.span.len()
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Constant(f64),
    /// Resolved against a `Context` at evaluation time.
    Variable(String),
    Unary {
        name: String,
        func: UnaryFn,
        operand: Box<Expr>,
    },
    Binary {
        symbol: String,
        func: BinaryFn,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Canonical text form, every binary node fully parenthesized.
    pub fn print(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(n) => write!(f, "{}", ops::format_number(*n)),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Unary { name, operand, .. } => write!(f, "{}({})", name, operand),
            Expr::Binary {
                symbol,
                left,
                right,
                ..
            } => write!(f, "({}{}{})", left, symbol, right),
        }
    }
}

pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source: input,
            lexer: Lexer::new(input),
            depth: 0,
        }
    }

    /// Parses one complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let result = self
            .parse_expression(Precedence::Min)
            .and_then(|expr| self.expect(TokenKind::Eof).map(|_| expr));

        match &result {
            Ok(expr) => tracing::debug!(input = self.source, %expr, "parsed expression"),
            Err(err) => tracing::debug!(input = self.source, offset = err.offset(), %err, "parse failed"),
        }
        result
    }

    fn error(&self, message: String, token: &Token<'_>) -> ParseError {
        ParseError::new(message, token, self.source)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, ParseError> {
        let token = self.lexer.pop();
        if !token.kind.same_kind(&kind) {
            let found = match token.kind {
                TokenKind::Eof => "end of input".to_string(),
                _ => format!("token '{}' ({})", token.slice, token.kind),
            };
            return Err(self.error(format!("unexpected {found}, expected {kind}"), &token));
        }

        Ok(token)
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            let token = self.lexer.peek();
            return Err(self.error("expression nested too deeply".to_string(), &token));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend<T>(&mut self, result: Result<T, ParseError>) -> Result<T, ParseError> {
        self.depth -= 1;
        result
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.descend()?;
        let result = f(self);
        self.ascend(result)
    }

    fn parse_expression(&mut self, prec: Precedence) -> Result<Expr, ParseError> {
        if prec >= Precedence::Max {
            return self.parse_primary();
        }

        let mut operand = self.parse_expression(prec.next())?;
        let mut links = Vec::new();

        loop {
            let token = self.lexer.peek();
            let (symbol, func) = match token.kind {
                TokenKind::BinaryOp(func, p) if p == prec => {
                    self.lexer.pop();
                    (token.slice, func)
                }
                // 7t => 7*t, 2t^3 => 2*(t^3)
                TokenKind::Variable if prec == Precedence::Mult => ("*", ops::mult as BinaryFn),
                _ => break,
            };

            let rhs = self.parse_expression(prec.next())?;
            links.push((std::mem::replace(&mut operand, rhs), symbol, func));
        }

        // same-tier chains group to the right: a-b-c => a-(b-c)
        Ok(links
            .into_iter()
            .rev()
            .fold(operand, |right, (left, symbol, func)| Expr::Binary {
                symbol: symbol.to_string(),
                func,
                left: Box::new(left),
                right: Box::new(right),
            }))
    }

    fn parse_group(&mut self, close: TokenKind) -> Result<Expr, ParseError> {
        self.nested(|parser| {
            let expr = parser.parse_expression(Precedence::Min)?;
            parser.expect(close)?;
            Ok(expr)
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.lexer.peek();

        match token.kind {
            TokenKind::Constant(n) => {
                self.lexer.pop();
                Ok(Expr::Constant(n))
            }
            TokenKind::Variable => {
                self.lexer.pop();
                Ok(Expr::Variable(token.slice.to_string()))
            }
            TokenKind::UnaryOp(func) => {
                self.lexer.pop();
                self.expect(TokenKind::LeftParen)?;
                let operand = self.parse_group(TokenKind::RightParen)?;
                Ok(Expr::Unary {
                    name: token.slice.to_string(),
                    func,
                    operand: Box::new(operand),
                })
            }
            TokenKind::LeftParen => {
                self.lexer.pop();
                self.parse_group(TokenKind::RightParen)
            }
            TokenKind::Pipe => {
                self.lexer.pop();
                let operand = self.parse_group(TokenKind::Pipe)?;
                Ok(Expr::Unary {
                    name: "abs".to_string(),
                    func: f64::abs,
                    operand: Box::new(operand),
                })
            }
            // -3, 1 + -2, +1 + +1
            TokenKind::BinaryOp(..) => {
                self.lexer.pop();
                let func: UnaryFn = match token.slice {
                    "+" => ops::plus,
                    "-" => ops::negate,
                    _ => {
                        return Err(self.error(
                            format!(
                                "misplaced binary operator '{}', expected either '+' or '-'",
                                token.slice
                            ),
                            &token,
                        ))
                    }
                };
                let operand = self.nested(|parser| parser.parse_expression(Precedence::Max))?;
                Ok(Expr::Unary {
                    name: token.slice.to_string(),
                    func,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Eof => Err(self.error("unexpected end of input".to_string(), &token)),
            TokenKind::RightParen | TokenKind::Unknown => {
                Err(self.error(format!("unexpected token '{}'", token.slice), &token))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::Context, evaluator::Evaluator};

    fn parse_input(input: &str) -> Expr {
        let mut parser = Parser::new(input);
        parser.parse().unwrap()
    }

    fn parse_err(input: &str) -> ParseError {
        let mut parser = Parser::new(input);
        match parser.parse() {
            Ok(expr) => panic!("'{input}' parsed as {expr}"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_constant() {
        assert!(matches!(parse_input("1"), Expr::Constant(n) if n == 1.0));
        assert!(matches!(parse_input("(((1)))"), Expr::Constant(n) if n == 1.0));
    }

    #[test]
    fn test_print() {
        assert_eq!(parse_input("1+2").print(), "(1+2)");
        assert_eq!(parse_input("1 + 2 * 3").print(), "(1+(2*3))");
        assert_eq!(parse_input("(1 - 2) + 3").print(), "((1-2)+3)");
        assert_eq!(parse_input("1 - 2 + 3").print(), "((1-2)+3)");
        assert_eq!(parse_input("e + pi").print(), "(2.72+3.14)");
        assert_eq!(parse_input("sin(pi * 180)").print(), "sin((3.14*180))");
        assert_eq!(parse_input("|2 + 4|").print(), "abs((2+4))");
        assert_eq!(parse_input("- - 1").print(), "-(-(1))");
        assert_eq!(parse_input("3,4").print(), "3.4");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(parse_input("3t").print(), "(3*t)");
        assert_eq!(parse_input("3t * 8").print(), "(3*(t*8))");
        assert_eq!(parse_input("8 + -3t").print(), "(8+(-(3)*t))");
        assert_eq!(parse_input("4 + 7t^2").print(), "(4+(7*(t^2)))");
        assert_eq!(parse_input("4 + (2+7t^2+3)").print(), "(4+(2+((7*(t^2))+3)))");
    }

    #[test]
    fn test_same_tier_groups_to_the_right() {
        assert_eq!(parse_input("2^3^2").print(), "(2^(3^2))");
        assert_eq!(parse_input("1 + 2 - 3 * 4 / 5").print(), "(1+(2-(3*(4/5))))");
    }

    #[test]
    fn test_unterminated_groups() {
        let err = parse_err("(1 + 2");
        assert!(matches!(err.token_kind(), TokenKind::Eof));
        assert_eq!(err.offset(), 6);
        assert_eq!(err.message(), "unexpected end of input, expected ')'");

        let err = parse_err("|1 + 4");
        assert_eq!(err.message(), "unexpected end of input, expected '|'");
    }

    #[test]
    fn test_misplaced_operator() {
        let err = parse_err("* 1");
        assert_eq!(err.offset(), 0);
        assert_eq!(err.text(), "*");
        assert!(err.message().starts_with("misplaced binary operator '*'"));
    }

    #[test]
    fn test_trailing_operator() {
        let err = parse_err("1 + ");
        assert_eq!(err.message(), "unexpected end of input");
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn test_unknown_tokens() {
        let err = parse_err("$");
        assert_eq!(err.message(), "unexpected token '$'");
        assert_eq!((err.offset(), err.end()), (0, 1));

        let err = parse_err("2 * foo");
        assert_eq!(err.text(), "foo");
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn test_trailing_tokens() {
        let err = parse_err("1.234.432");
        assert_eq!(err.text(), ".");
        assert_eq!(err.offset(), 5);
        assert!(err.message().contains("expected end of input"));

        let err = parse_err("(1) 2");
        assert_eq!(err.text(), "2");
    }

    #[test]
    fn test_function_requires_parentheses() {
        let err = parse_err("sin 1");
        assert_eq!(err.text(), "1");
        assert!(err.message().ends_with("expected '('"));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_err(&deep).message(), "expression nested too deeply");

        let ok = format!("{}1{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(matches!(parse_input(&ok), Expr::Constant(n) if n == 1.0));

        let signs = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_err(&signs).message(), "expression nested too deeply");
    }

    #[test]
    fn test_long_flat_chains() {
        let ctx = Context::new();

        let sum = parse_input(&vec!["1"; 1000].join("+"));
        assert_eq!(Evaluator::new(&ctx).eval(&sum), Ok(1000.0));

        let products = parse_input(&vec!["2*3"; 130].join("+"));
        assert_eq!(Evaluator::new(&ctx).eval(&products), Ok(780.0));

        let powers = parse_input(&vec!["1"; 500].join("^"));
        assert_eq!(Evaluator::new(&ctx).eval(&powers), Ok(1.0));
    }
}
