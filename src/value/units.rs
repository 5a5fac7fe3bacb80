//! Unit compatibility and conversion tables for Sass numbers.
//!
//! Units are plain string symbols.  Two units are *compatible* when they
//! measure the same dimension (both lengths, both angles, ...); conversion
//! multiplies by the ratio of their canonical factors.  Unknown units are
//! compatible only with themselves.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Dimension a known unit belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum Dimension {
    Length,
    Angle,
    Time,
    Frequency,
    Resolution,
}

/// Canonical factor per known unit: 1 `<unit>` = `factor` canonical units.
///
/// Canonical units are `px`, `deg`, `s`, `Hz` and `dppx`.
static CONVERSIONS: Lazy<HashMap<&'static str, (Dimension, f64)>> = Lazy::new(|| {
    use Dimension::*;

    let mut m = HashMap::new();

    // Lengths, canonical unit: px.
    m.insert("px", (Length, 1.0));
    m.insert("pt", (Length, 96.0 / 72.0));
    m.insert("pc", (Length, 16.0));
    m.insert("in", (Length, 96.0));
    m.insert("cm", (Length, 96.0 / 2.54));
    m.insert("mm", (Length, 96.0 / 25.4));
    m.insert("q", (Length, 96.0 / 101.6));

    // Angles, canonical unit: deg.
    m.insert("deg", (Angle, 1.0));
    m.insert("grad", (Angle, 0.9));
    m.insert("rad", (Angle, 180.0 / std::f64::consts::PI));
    m.insert("turn", (Angle, 360.0));

    // Time, canonical unit: s.
    m.insert("s", (Time, 1.0));
    m.insert("ms", (Time, 0.001));

    // Frequency, canonical unit: Hz.
    m.insert("Hz", (Frequency, 1.0));
    m.insert("kHz", (Frequency, 1000.0));

    // Resolution, canonical unit: dppx.
    m.insert("dppx", (Resolution, 1.0));
    m.insert("dpi", (Resolution, 1.0 / 96.0));
    m.insert("dpcm", (Resolution, 2.54 / 96.0));

    m
});

/// Whether `from` can be converted to `to`.
pub fn compatible(from: &str, to: &str) -> bool {
    conversion_factor(from, to).is_some()
}

/// Multiplier that converts a quantity in `from` units into `to` units.
///
/// Returns `None` for incompatible units.  Identical unknown units convert
/// with factor 1.
pub fn conversion_factor(from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(1.0);
    }

    let (from_dim, from_factor) = CONVERSIONS.get(from)?;
    let (to_dim, to_factor) = CONVERSIONS.get(to)?;

    if from_dim == to_dim {
        Some(from_factor / to_factor)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_within_dimension() {
        assert_eq!(conversion_factor("in", "px"), Some(96.0));
        assert_eq!(conversion_factor("s", "ms"), Some(1000.0));
        assert_eq!(conversion_factor("pt", "pt"), Some(1.0));
    }

    #[test]
    fn rejects_cross_dimension() {
        assert_eq!(conversion_factor("px", "deg"), None);
        assert!(!compatible("s", "px"));
    }

    #[test]
    fn unknown_units_only_match_themselves() {
        assert_eq!(conversion_factor("fib", "fib"), Some(1.0));
        assert_eq!(conversion_factor("fib", "px"), None);
    }
}
