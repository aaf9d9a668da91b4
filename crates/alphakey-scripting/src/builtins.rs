//! Built-in constants and math functions for expressions.

use crate::error::ExpressionError;

/// Signature shared by every builtin: arguments already evaluated.
pub type BuiltinFn = fn(&[f64]) -> Result<f64, ExpressionError>;

/// A named function callable from an expression.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
}

/// Golden ratio.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Look up a named constant.
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "PI" => Some(std::f64::consts::PI),
        "E" => Some(std::f64::consts::E),
        "PHI" => Some(PHI),
        _ => None,
    }
}

/// Look up a builtin function by name.
pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

macro_rules! unary {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            arity: 1,
            func: |a| Ok($f(a[0])),
        }
    };
}

macro_rules! binary {
    ($name:literal, $f:expr) => {
        Builtin {
            name: $name,
            arity: 2,
            func: |a| Ok($f(a[0], a[1])),
        }
    };
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Floating remainder, erroring on a zero divisor.
pub fn modulo(a: f64, b: f64) -> Result<f64, ExpressionError> {
    if b == 0.0 {
        return Err(ExpressionError::Eval("modulo by zero".into()));
    }
    Ok(a % b)
}

/// Quotient, erroring on a zero divisor.
pub fn divide(a: f64, b: f64) -> Result<f64, ExpressionError> {
    if b == 0.0 {
        return Err(ExpressionError::Eval("division by zero".into()));
    }
    Ok(a / b)
}

/// linear(t, t_min, t_max, val_min, val_max): clamped linear interpolation.
pub fn linear(t: f64, t_min: f64, t_max: f64, val_min: f64, val_max: f64) -> f64 {
    if t_max <= t_min {
        return val_min;
    }
    let ratio = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    val_min + (val_max - val_min) * ratio
}

/// ease(t, t_min, t_max, val_min, val_max): smoothstep interpolation.
pub fn ease(t: f64, t_min: f64, t_max: f64, val_min: f64, val_max: f64) -> f64 {
    if t_max <= t_min {
        return val_min;
    }
    let ratio = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    let s = ratio * ratio * (3.0 - 2.0 * ratio);
    val_min + (val_max - val_min) * s
}

/// Linear interpolation between two values.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clip `x` into `[lo, hi]`; NaN bounds leave `x` unchanged.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

static BUILTINS: &[Builtin] = &[
    unary!("sin", f64::sin),
    unary!("cos", f64::cos),
    unary!("tan", f64::tan),
    unary!("asin", f64::asin),
    unary!("acos", f64::acos),
    unary!("atan", f64::atan),
    unary!("sinh", f64::sinh),
    unary!("cosh", f64::cosh),
    unary!("tanh", f64::tanh),
    unary!("exp", f64::exp),
    unary!("log", f64::ln),
    unary!("log10", f64::log10),
    unary!("sqrt", f64::sqrt),
    unary!("abs", f64::abs),
    unary!("floor", f64::floor),
    unary!("ceil", f64::ceil),
    unary!("round", f64::round),
    unary!("trunc", f64::trunc),
    binary!("atan2", f64::atan2),
    binary!("min", f64::min),
    binary!("max", f64::max),
    binary!("pow", f64::powf),
    binary!("hypot", f64::hypot),
    binary!("gt", |a: f64, b: f64| truth(a > b)),
    binary!("lt", |a: f64, b: f64| truth(a < b)),
    binary!("gte", |a: f64, b: f64| truth(a >= b)),
    binary!("lte", |a: f64, b: f64| truth(a <= b)),
    binary!("eq", |a: f64, b: f64| truth(a == b)),
    Builtin {
        name: "mod",
        arity: 2,
        func: |a| modulo(a[0], a[1]),
    },
    Builtin {
        name: "clip",
        arity: 3,
        func: |a| Ok(clip(a[0], a[1], a[2])),
    },
    Builtin {
        name: "between",
        arity: 3,
        func: |a| Ok(truth(a[0] >= a[1] && a[0] <= a[2])),
    },
    Builtin {
        name: "lerp",
        arity: 3,
        func: |a| Ok(lerp(a[0], a[1], a[2])),
    },
    Builtin {
        name: "linear",
        arity: 5,
        func: |a| Ok(linear(a[0], a[1], a[2], a[3], a[4])),
    },
    Builtin {
        name: "ease",
        arity: 5,
        func: |a| Ok(ease(a[0], a[1], a[2], a[3], a[4])),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        assert!((linear(0.5, 0.0, 1.0, 0.0, 100.0) - 50.0).abs() < 0.01);
        assert!((linear(2.0, 0.0, 1.0, 0.0, 100.0) - 100.0).abs() < 0.01);
        assert_eq!(linear(0.5, 1.0, 1.0, 3.0, 9.0), 3.0);
    }

    #[test]
    fn test_ease_endpoints() {
        assert!((ease(0.0, 0.0, 1.0, 0.0, 1.0)).abs() < 1e-9);
        assert!((ease(1.0, 0.0, 1.0, 0.0, 1.0) - 1.0).abs() < 1e-9);
        assert!((ease(0.5, 0.0, 1.0, 0.0, 1.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("sin").unwrap().arity, 1);
        assert_eq!(lookup("linear").unwrap().arity, 5);
        assert!(lookup("wiggle").is_none());
    }

    #[test]
    fn test_comparisons() {
        let gt = lookup("gt").unwrap();
        assert_eq!((gt.func)(&[2.0, 1.0]).unwrap(), 1.0);
        assert_eq!((gt.func)(&[f64::NAN, 1.0]).unwrap(), 0.0);
        let between = lookup("between").unwrap();
        assert_eq!((between.func)(&[0.5, 0.0, 1.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_zero_divisors_fail() {
        assert!(divide(1.0, 0.0).is_err());
        assert!(modulo(1.0, 0.0).is_err());
        assert_eq!(modulo(7.0, 4.0).unwrap(), 3.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(constant("PI"), Some(std::f64::consts::PI));
        assert!(constant("pi").is_none());
    }
}
