use std::collections::HashMap;
use crate::evaluator::EvalError;

/// Variable bindings consulted during evaluation.
///
/// Not synchronized: sharing one `Context` between threads that mutate it
/// needs external locking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    variables: HashMap<String, f64>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a binding.
    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_variable(&self, name: &str) -> Result<f64, EvalError> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<f64> {
        self.variables.remove(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Context {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (name, value) in iter {
            ctx.set_variable(name, value);
        }
        ctx
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bindings: Vec<_> = self.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));

        let s = bindings
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut ctx = Context::new();
        assert!(!ctx.has_variable("t"));

        ctx.set_variable("t", 2.0);
        assert!(ctx.has_variable("t"));
        assert_eq!(ctx.get_variable("t").unwrap(), 2.0);

        ctx.set_variable("t", 5.0);
        assert_eq!(ctx.get_variable("t").unwrap(), 5.0);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_get_undefined() {
        let ctx = Context::new();
        let err = ctx.get_variable("t").unwrap_err();
        assert_eq!(err.to_string(), "undefined variable 't'");
    }

    #[test]
    fn test_remove() {
        let mut ctx: Context = [("t", 1.0)].into_iter().collect();
        assert_eq!(ctx.remove_variable("t"), Some(1.0));
        assert!(ctx.is_empty());
        assert_eq!(ctx.remove_variable("t"), None);
    }

    #[test]
    fn test_display() {
        let ctx: Context = [("t", 2.0), ("a", 0.5)].into_iter().collect();
        assert_eq!(ctx.to_string(), "{a: 0.5, t: 2}");
        assert_eq!(Context::new().to_string(), "{}");
    }
}
