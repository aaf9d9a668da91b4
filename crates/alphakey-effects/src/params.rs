//! Keying parameters and the `key=value:key=value` option syntax.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParamError;

/// How the `min`/`max` tolerances are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tolerance {
    /// Tolerances are radii in sample units; thresholds are their squares.
    #[default]
    Radius,
    /// Tolerances are already squared distances.
    Squared,
}

impl Tolerance {
    /// Largest legal tolerance value in this mode.
    pub fn max_value(self) -> u32 {
        match self {
            Self::Radius => 255,
            // Largest possible squared chroma distance: 2 * 255^2
            Self::Squared => 130_050,
        }
    }
}

impl FromStr for Tolerance {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, ParamError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radius" => Ok(Self::Radius),
            "squared" => Ok(Self::Squared),
            _ => Err(ParamError::InvalidValue {
                key: "tolerance".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Radius => "radius",
            Self::Squared => "squared",
        })
    }
}

/// Squared-distance thresholds derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Below this the pixel is fully transparent
    pub inner: u32,
    /// At or above this the pixel is fully opaque
    pub outer: u32,
}

/// Parameters for chroma key alpha synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyParams {
    /// Key colour U centre (0-255)
    pub u: u8,
    /// Key colour V centre (0-255)
    pub v: u8,
    /// Inner tolerance
    pub min: u32,
    /// Outer tolerance
    pub max: u32,
    /// Interpretation of `min` and `max`
    pub tolerance: Tolerance,
    /// Alpha-scale expression over `t`; `None` means a constant 1.0
    pub alpha: Option<String>,
    /// Log mean chroma of the centre window per frame
    pub print_uv: bool,
}

/// Keys filled by positional values, in order.
const SHORTHAND: [&str; 5] = ["u", "min", "v", "max", "alpha"];

impl KeyParams {
    /// Defaults overridden by `options`.
    pub fn parse(options: &str) -> Result<Self, ParamError> {
        Self::default().with_overrides(options)
    }

    /// A copy of `self` with `options` applied on top.
    ///
    /// Either every pair applies or the error is returned and nothing
    /// changes.
    pub fn with_overrides(&self, options: &str) -> Result<Self, ParamError> {
        let mut next = self.clone();
        let mut positional = 0;
        let mut named_seen = false;

        for pair in options.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) => {
                    named_seen = true;
                    next.set(key.trim(), value.trim())?;
                }
                None => {
                    if named_seen {
                        return Err(ParamError::Syntax(format!(
                            "positional value '{}' after named option",
                            pair
                        )));
                    }
                    let key = SHORTHAND.get(positional).ok_or_else(|| {
                        ParamError::Syntax(format!("too many positional values at '{}'", pair))
                    })?;
                    next.set(key, pair)?;
                    positional += 1;
                }
            }
        }

        next.validate()?;
        Ok(next)
    }

    /// Set one option by name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ParamError> {
        match key {
            "u" => self.u = parse_int(key, value, 255)? as u8,
            "v" => self.v = parse_int(key, value, 255)? as u8,
            "min" | "uw" => self.min = parse_int(key, value, Tolerance::Squared.max_value())?,
            "max" | "vw" => self.max = parse_int(key, value, Tolerance::Squared.max_value())?,
            "tolerance" => self.tolerance = value.parse()?,
            "alpha" | "a" => {
                self.alpha = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "print_uv" => self.print_uv = parse_bool(key, value)?,
            _ => return Err(ParamError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Check tolerances against the active tolerance mode.
    pub fn validate(&self) -> Result<(), ParamError> {
        let limit = self.tolerance.max_value();
        for (key, value) in [("min", self.min), ("max", self.max)] {
            if value > limit {
                return Err(ParamError::OutOfRange {
                    key: key.into(),
                    value: value as u64,
                    max: limit as u64,
                });
            }
        }
        Ok(())
    }

    /// Inner and outer squared-distance thresholds.
    ///
    /// Records built field by field skip [`validate`](Self::validate), so
    /// oversized radii saturate instead of wrapping.
    pub fn thresholds(&self) -> Thresholds {
        match self.tolerance {
            Tolerance::Radius => Thresholds {
                inner: self.min.saturating_mul(self.min),
                outer: self.max.saturating_mul(self.max),
            },
            Tolerance::Squared => Thresholds {
                inner: self.min,
                outer: self.max,
            },
        }
    }
}

impl fmt::Display for KeyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "u={}:v={}:min={}:max={}:tolerance={}:print_uv={}",
            self.u, self.v, self.min, self.max, self.tolerance, self.print_uv as u8
        )?;
        if let Some(alpha) = &self.alpha {
            write!(f, ":alpha={}", alpha)?;
        }
        Ok(())
    }
}

fn parse_int(key: &str, value: &str, max: u32) -> Result<u32, ParamError> {
    let parsed: u64 = value.parse().map_err(|_| ParamError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })?;
    if parsed > max as u64 {
        return Err(ParamError::OutOfRange {
            key: key.to_string(),
            value: parsed,
            max: max as u64,
        });
    }
    Ok(parsed as u32)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ParamError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ParamError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
