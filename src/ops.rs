/// A one-argument numeric function stored on unary tokens and nodes.
pub type UnaryFn = fn(f64) -> f64;

/// A two-argument numeric function stored on binary tokens and nodes.
pub type BinaryFn = fn(f64, f64) -> f64;

// Basic arithmetic operations.
pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn minus(a: f64, b: f64) -> f64 {
    a - b
}

pub fn mult(a: f64, b: f64) -> f64 {
    a * b
}

pub fn div(a: f64, b: f64) -> f64 {
    a / b
}

pub fn expt(a: f64, b: f64) -> f64 {
    a.powf(b)
}

/// Unary `+x`, i.e. `0 + x`.
pub fn plus(x: f64) -> f64 {
    add(0.0, x)
}

/// Unary `-x`, i.e. `0 - x`.
pub fn negate(x: f64) -> f64 {
    minus(0.0, x)
}

/// Looks up a named one-argument function. Names are case-sensitive.
pub fn function(name: &str) -> Option<UnaryFn> {
    let f: UnaryFn = match name {
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "log" => f64::log10,
        "ln" => f64::ln,
        "exp" => f64::exp,
        "sqrt" => f64::sqrt,
        "abs" => f64::abs,
        _ => return None,
    };
    Some(f)
}

/// Formats a number with at most two fractional digits, trailing zeros trimmed.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }

    let mut s = format!("{n:.2}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s.remove(0);
    }
    s
}
