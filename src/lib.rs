//! Parses arithmetic expressions such as `4 + 7t^2` or `|sin(pi / 2) - 3|`
//! into a tree, evaluates the tree against variable bindings, and prints it
//! back in a canonical, fully parenthesized form.

pub mod lexer;
pub mod ops;
pub mod parser;
pub mod evaluator;
pub mod env;

pub use lexer::*;
pub use parser::{Expr, ParseError, Parser};
pub use evaluator::{EvalError, Evaluator};
pub use env::Context;

pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    Parser::new(input).parse()
}

pub fn eval_expr(expr: &Expr, ctx: &Context) -> Result<f64, EvalError> {
    let result = Evaluator::new(ctx).eval(expr);
    if let Err(err) = &result {
        tracing::debug!(%expr, %err, "evaluation failed");
    }
    result
}

/// Evaluates with no variables bound.
pub fn eval_expr_default(expr: &Expr) -> Result<f64, EvalError> {
    eval_expr(expr, &Context::new())
}

pub fn print_expr(expr: &Expr) -> String {
    expr.print()
}
