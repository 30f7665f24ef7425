//! Numeric unit algebra for scalar configuration values.
//!
//! Numeric fields may carry a dot-separated unit suffix, e.g. `20.m`,
//! `1.k.g` or `10.m.s^-2`. Each token is a base unit with an optional SI
//! scale prefix and an optional integer power, or one of the rounding-mode
//! tokens `round`, `floor` and `ceil`. All recognized units convert to their
//! SI equivalent, so `90.deg` stores π/2 and `1.bar` stores 100000.

use crate::error::ConfigError;
use crate::value::Scalar;
use std::fmt;
use tracing::warn;

/// Base units and their SI multipliers.
const UNITS: &[(&str, f64)] = &[
    ("m", 1.0),
    ("N", 1.0),
    ("deg", std::f64::consts::PI / 180.0),
    ("s", 1.0),
    ("g", 1e-3),
    ("Pa", 1.0),
    ("bar", 100_000.0),
];

/// SI scale prefixes.
const SCALES: &[(&str, f64)] = &[
    ("M", 1e6),
    ("k", 1e3),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("mu", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
];

/// How to round a float landing on an integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Round,
    Floor,
    Ceil,
}

impl RoundingMode {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "round" => Some(RoundingMode::Round),
            "floor" => Some(RoundingMode::Floor),
            "ceil" => Some(RoundingMode::Ceil),
            _ => None,
        }
    }

    fn apply(self, value: f64) -> f64 {
        match self {
            RoundingMode::Round => value.round(),
            RoundingMode::Floor => value.floor(),
            RoundingMode::Ceil => value.ceil(),
        }
    }
}

/// Structured warning emitted when a float lands on an integer field without
/// an explicit rounding mode. The value is floored and loading proceeds.
///
/// Warnings are returned to the top-level caller alongside the result; the
/// normalizer fills in `path` on the way back up.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundingWarning {
    /// The operation during which the value was encountered, e.g.
    /// `while loading section 'default' of motion::Controller`.
    pub context: String,
    /// Dotted/bracketed path from the section root to the value.
    pub path: String,
    /// The offending value, as written in the input.
    pub value: String,
}

impl fmt::Display for RoundingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {} used for an integer field, but no rounding mode specified; \
             append one of .round, .floor or .ceil, this defaults to .floor",
            self.context, self.value, self.path
        )
    }
}

/// Convert a single `<prefix?><unit>[^<power>]` expression to its SI
/// multiplier.
///
/// A bare prefix token (`k`, `mu`, ...) is accepted as a dimensionless
/// scale, so `1.k.g` composes to 1e3 * 1e-3 = 1.
pub fn convert_unit_to_si(expr: &str) -> Result<f64, ConfigError> {
    let (unit, power) = match expr.split_once('^') {
        Some((unit, power)) => (
            unit,
            power
                .parse::<i32>()
                .map_err(|_| ConfigError::UnknownUnit(expr.to_string()))?,
        ),
        None => (expr, 1),
    };

    if let Some((_, to_si)) = UNITS.iter().find(|(name, _)| *name == unit) {
        return Ok(to_si.powi(power));
    }

    for (prefix, scale) in SCALES {
        if let Some(rest) = unit.strip_prefix(prefix) {
            if rest.is_empty() {
                return Ok(scale.powi(power));
            }
            if let Some((_, to_si)) = UNITS.iter().find(|(name, _)| *name == rest) {
                return Ok((to_si * scale).powi(power));
            }
        }
    }

    Err(ConfigError::UnknownUnit(expr.to_string()))
}

/// Evaluate a raw scalar against a numeric destination.
///
/// Text scalars are parsed as `<float><unit expression>`; a plain integer
/// literal passes through unchanged with no warning. Numeric scalars pass
/// through, coerced to the destination kind. When the result is fractional
/// and the destination is an integer kind, the explicit rounding suffix wins;
/// without one the value is floored and a [`RoundingWarning`] is pushed.
pub fn evaluate_numeric(
    field: &Scalar,
    integer: bool,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
) -> Result<Scalar, ConfigError> {
    let (value, rounding_mode) = match field {
        Scalar::Text(text) => {
            if let Some(plain) = parse_plain_integer(text) {
                // Don't annoy the user with a rounding warning for a value
                // that was an integer to begin with.
                return Ok(Scalar::Int(plain));
            }
            parse_with_units(text)?
        }
        Scalar::Int(value) => {
            return Ok(if integer {
                Scalar::Int(*value)
            } else {
                Scalar::Float(*value as f64)
            });
        }
        Scalar::Float(value) => (*value, None),
        Scalar::Bool(_) => {
            return Err(ConfigError::ConversionFailed {
                path: String::new(),
                cause: "cannot convert a boolean to a numeric field".to_string(),
            });
        }
    };

    if !integer {
        return Ok(Scalar::Float(value));
    }

    let mode = match rounding_mode {
        Some(mode) => mode,
        None => {
            let warning = RoundingWarning {
                context: context.to_string(),
                path: String::new(),
                value: field.to_string(),
            };
            warn!(context, value = %field, "float used for an integer field without a rounding mode, defaulting to floor");
            warnings.push(warning);
            RoundingMode::Floor
        }
    };
    Ok(Scalar::Int(mode.apply(value) as i64))
}

/// Parse a `<float><unit expression>` token, returning the SI-converted
/// value and the explicit rounding mode if one was given.
fn parse_with_units(text: &str) -> Result<(f64, Option<RoundingMode>), ConfigError> {
    let (raw, suffix) = split_float_prefix(text).ok_or_else(|| ConfigError::ConversionFailed {
        path: String::new(),
        cause: format!("'{}' does not look like a numeric field", text),
    })?;

    if suffix.is_empty() {
        return Ok((raw, None));
    }
    let suffix = suffix
        .strip_prefix('.')
        .ok_or_else(|| ConfigError::UnknownUnit(suffix.to_string()))?;

    let mut factor = 1.0;
    let mut rounding_mode = None;
    for token in suffix.split('.') {
        if let Some(mode) = RoundingMode::parse(token) {
            rounding_mode = Some(mode);
        } else {
            factor *= convert_unit_to_si(token)?;
        }
    }
    Ok((raw * factor, rounding_mode))
}

/// Match a full `[+-]?\d+` literal.
fn parse_plain_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Split a leading `[+-]?\d+(\.\d+)?(e[+-]\d+)?` literal off a token,
/// returning the parsed float and the remaining suffix. The fractional dot
/// is only consumed when a digit follows it, so `20.m` parses as `20` with
/// suffix `.m`.
fn split_float_prefix(text: &str) -> Option<(f64, &str)> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end += 2;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    // Exponents require an explicit sign, matching the accepted grammar.
    if end + 2 < bytes.len()
        && bytes[end] == b'e'
        && matches!(bytes[end + 1], b'+' | b'-')
        && bytes[end + 2].is_ascii_digit()
    {
        end += 3;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let value = text[..end].parse().ok()?;
    Some((value, &text[end..]))
}
