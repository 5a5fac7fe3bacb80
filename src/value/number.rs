//! Sass numbers: a double plus numerator and denominator unit lists.

use std::fmt;

use float_cmp::approx_eq;

use crate::error::ScriptError;
use crate::value::units;

/// Numbers closer than this to an integer are treated as integers.
const INTEGER_EPSILON: f64 = 1e-11;

/// A Sass number.
///
/// `12px` has value 12 and numerator units `["px"]`; `3px/s` (the result of
/// dividing `3px` by `1s`) has numerator `["px"]` and denominator `["s"]`.
///
/// `as_slash` preserves the textual division `a/b` so that legacy
/// `rgba($color, $a/$b)` calls can re-serialize the slash.  Any arithmetic
/// on the number drops it.
#[derive(Debug, Clone)]
pub struct SassNumber {
    pub value: f64,
    pub numerator_units: Vec<String>,
    pub denominator_units: Vec<String>,
    as_slash: Option<Box<(SassNumber, SassNumber)>>,
}

impl SassNumber {
    pub fn unitless(value: f64) -> SassNumber {
        SassNumber {
            value,
            numerator_units: Vec::new(),
            denominator_units: Vec::new(),
            as_slash: None,
        }
    }

    pub fn with_unit(value: f64, unit: impl Into<String>) -> SassNumber {
        SassNumber {
            value,
            numerator_units: vec![unit.into()],
            denominator_units: Vec::new(),
            as_slash: None,
        }
    }

    pub fn new(value: f64, numerator_units: Vec<String>, denominator_units: Vec<String>) -> SassNumber {
        SassNumber {
            value,
            numerator_units,
            denominator_units,
            as_slash: None,
        }
        .simplified()
    }

    pub fn has_units(&self) -> bool {
        !self.numerator_units.is_empty() || !self.denominator_units.is_empty()
    }

    pub fn as_slash(&self) -> Option<&(SassNumber, SassNumber)> {
        self.as_slash.as_deref()
    }

    pub fn with_slash(mut self, numerator: SassNumber, denominator: SassNumber) -> SassNumber {
        self.as_slash = Some(Box::new((numerator, denominator)));
        self
    }

    pub fn without_slash(mut self) -> SassNumber {
        self.as_slash = None;
        self
    }

    pub fn is_int(&self) -> bool {
        (self.value - self.value.round()).abs() < INTEGER_EPSILON
    }

    /// The integer value, if this number is one.
    pub fn as_int(&self) -> Option<i64> {
        if self.is_int() {
            Some(self.value.round() as i64)
        } else {
            None
        }
    }

    pub fn assert_int(&self) -> Result<i64, ScriptError> {
        self.as_int()
            .ok_or_else(|| ScriptError::new(format!("{} is not an int.", self)))
    }

    pub fn assert_no_units(&self, name: &str) -> Result<f64, ScriptError> {
        if self.has_units() {
            Err(ScriptError::new(format!(
                "${}: Expected {} to have no units.",
                name, self
            )))
        } else {
            Ok(self.value)
        }
    }

    /// Converts this number to the given units.
    ///
    /// A unitless operand adopts the target units unchanged; a unitless
    /// target accepts only a unitless number.
    pub fn coerce(
        &self,
        numerator_units: &[String],
        denominator_units: &[String],
    ) -> Result<SassNumber, ScriptError> {
        if self.numerator_units == numerator_units && self.denominator_units == denominator_units {
            return Ok(self.clone().without_slash());
        }

        if !self.has_units() {
            return Ok(SassNumber {
                value: self.value,
                numerator_units: numerator_units.to_vec(),
                denominator_units: denominator_units.to_vec(),
                as_slash: None,
            });
        }

        if numerator_units.is_empty() && denominator_units.is_empty() {
            return Err(self.incompatible(numerator_units, denominator_units));
        }

        let mut value = self.value;
        let mut other_numer: Vec<&String> = numerator_units.iter().collect();
        let mut other_denom: Vec<&String> = denominator_units.iter().collect();

        for unit in &self.numerator_units {
            let pos = other_numer
                .iter()
                .position(|u| units::compatible(unit, u))
                .ok_or_else(|| self.incompatible(numerator_units, denominator_units))?;
            value *= units::conversion_factor(unit, other_numer[pos])
                .expect("position() already checked compatibility");
            other_numer.remove(pos);
        }

        for unit in &self.denominator_units {
            let pos = other_denom
                .iter()
                .position(|u| units::compatible(unit, u))
                .ok_or_else(|| self.incompatible(numerator_units, denominator_units))?;
            value /= units::conversion_factor(unit, other_denom[pos])
                .expect("position() already checked compatibility");
            other_denom.remove(pos);
        }

        if !other_numer.is_empty() || !other_denom.is_empty() {
            return Err(self.incompatible(numerator_units, denominator_units));
        }

        Ok(SassNumber {
            value,
            numerator_units: numerator_units.to_vec(),
            denominator_units: denominator_units.to_vec(),
            as_slash: None,
        })
    }

    fn incompatible(&self, numer: &[String], denom: &[String]) -> ScriptError {
        ScriptError::new(format!(
            "Incompatible units {} and {}.",
            unit_string(&self.numerator_units, &self.denominator_units),
            unit_string(numer, denom)
        ))
    }

    pub fn plus(&self, other: &SassNumber) -> Result<SassNumber, ScriptError> {
        self.combine(other, |a, b| a + b)
    }

    pub fn minus(&self, other: &SassNumber) -> Result<SassNumber, ScriptError> {
        self.combine(other, |a, b| a - b)
    }

    pub fn modulo(&self, other: &SassNumber) -> Result<SassNumber, ScriptError> {
        self.combine(other, |a, b| {
            if b == 0.0 {
                f64::NAN
            } else {
                a - b * (a / b).floor()
            }
        })
    }

    /// Addition-family combination: coerce the right operand to the left's
    /// units, keep the left's units on the result.
    fn combine(
        &self,
        other: &SassNumber,
        op: impl FnOnce(f64, f64) -> f64,
    ) -> Result<SassNumber, ScriptError> {
        let (units_numer, units_denom) = if self.has_units() {
            (&self.numerator_units, &self.denominator_units)
        } else {
            (&other.numerator_units, &other.denominator_units)
        };
        let coerced = other.coerce(units_numer, units_denom)?;

        Ok(SassNumber {
            value: op(self.value, coerced.value),
            numerator_units: units_numer.clone(),
            denominator_units: units_denom.clone(),
            as_slash: None,
        })
    }

    pub fn times(&self, other: &SassNumber) -> SassNumber {
        SassNumber::new(
            self.value * other.value,
            [self.numerator_units.clone(), other.numerator_units.clone()].concat(),
            [
                self.denominator_units.clone(),
                other.denominator_units.clone(),
            ]
            .concat(),
        )
    }

    pub fn divided_by(&self, other: &SassNumber) -> SassNumber {
        SassNumber::new(
            self.value / other.value,
            [
                self.numerator_units.clone(),
                other.denominator_units.clone(),
            ]
            .concat(),
            [self.denominator_units.clone(), other.numerator_units.clone()].concat(),
        )
    }

    pub fn negate(&self) -> SassNumber {
        SassNumber {
            value: -self.value,
            numerator_units: self.numerator_units.clone(),
            denominator_units: self.denominator_units.clone(),
            as_slash: None,
        }
    }

    /// Cancels convertible numerator/denominator unit pairs.
    fn simplified(mut self) -> SassNumber {
        let mut denom = std::mem::take(&mut self.denominator_units);
        let mut numer = Vec::with_capacity(self.numerator_units.len());

        for unit in std::mem::take(&mut self.numerator_units) {
            match denom.iter().position(|d| units::compatible(&unit, d)) {
                Some(pos) => {
                    // conversion_factor() is Some by the position() check
                    self.value *= units::conversion_factor(&unit, &denom[pos]).unwrap();
                    denom.remove(pos);
                }
                None => numer.push(unit),
            }
        }

        self.numerator_units = numer;
        self.denominator_units = denom;
        self
    }

    pub fn compare(&self, other: &SassNumber) -> Result<std::cmp::Ordering, ScriptError> {
        let coerced = other.coerce(&self.numerator_units, &self.denominator_units)?;
        self.value
            .partial_cmp(&coerced.value)
            .ok_or_else(|| ScriptError::new("NaN is not comparable."))
    }

    /// The numeric part, formatted the way Sass serializes numbers: at most
    /// ten decimal digits, no trailing zeros, integers without a point.
    pub fn format_value(&self) -> String {
        format_double(self.value)
    }

    /// The unit suffix for plain-CSS serialization.
    ///
    /// Only a single numerator unit is expressible in CSS; anything else is
    /// a script error at serialization time.
    pub fn css_unit(&self) -> Result<&str, ScriptError> {
        if !self.denominator_units.is_empty() || self.numerator_units.len() > 1 {
            return Err(ScriptError::new(format!(
                "{} isn't a valid CSS value.",
                self
            )));
        }
        Ok(self.numerator_units.first().map(|u| u.as_str()).unwrap_or(""))
    }
}

/// Structural equality with unit coercion: `1in == 96px`.
///
/// The ulps bound keeps equality stable for large magnitudes, where the
/// absolute epsilon alone would be too strict after conversion rounding.
impl PartialEq for SassNumber {
    fn eq(&self, other: &SassNumber) -> bool {
        match other.coerce(&self.numerator_units, &self.denominator_units) {
            Ok(coerced) => approx_eq!(
                f64,
                self.value,
                coerced.value,
                epsilon = INTEGER_EPSILON,
                ulps = 4
            ),
            Err(_) => false,
        }
    }
}

impl fmt::Display for SassNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_value())?;
        if !self.denominator_units.is_empty() {
            write!(
                f,
                "{}",
                unit_string(&self.numerator_units, &self.denominator_units)
            )
        } else {
            for unit in &self.numerator_units {
                write!(f, "{}", unit)?;
            }
            Ok(())
        }
    }
}

fn unit_string(numer: &[String], denom: &[String]) -> String {
    if numer.is_empty() && denom.is_empty() {
        return "no units".to_owned();
    }
    let n = numer.join("*");
    if denom.is_empty() {
        n
    } else if n.is_empty() {
        format!("1/{}", denom.join("*"))
    } else {
        format!("{}/{}", n, denom.join("*"))
    }
}

/// Formats a double with Sass's rounding rules.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if (value - value.round()).abs() < INTEGER_EPSILON {
        // -0.0 serializes as 0
        let rounded = value.round();
        if rounded == 0.0 {
            return "0".to_owned();
        }
        return format!("{}", rounded as i64);
    }

    let mut s = format!("{:.10}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    // strip a leading zero: 0.5 prints as .5 in compressed mode only, so
    // keep it here
    s
}
