use miette::Diagnostic;
use thiserror::Error;
use crate::{env::Context, parser::Expr};

#[derive(Diagnostic, Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined variable '{name}'")]
    #[diagnostic(
        code(exprcalc::undefined_variable),
        help("bind '{name}' in the context before evaluating")
    )]
    UndefinedVariable { name: String },
}

/// Folds an expression tree to a number. Division by zero and domain errors
/// yield IEEE infinities or NaN rather than errors.
pub struct Evaluator<'c> {
    ctx: &'c Context,
}

impl<'c> Evaluator<'c> {
    pub fn new(ctx: &'c Context) -> Self {
        Self { ctx }
    }

    pub fn eval(&self, expr: &Expr) -> Result<f64, EvalError> {
        match expr {
            Expr::Constant(n) => Ok(*n),
            Expr::Variable(name) => self.ctx.get_variable(name),
            Expr::Unary { func, operand, .. } => Ok(func(self.eval(operand)?)),
            Expr::Binary {
                func, left, right, ..
            } => Ok(func(self.eval(left)?, self.eval(right)?)),
        }
    }
}
