//! SassScript operator semantics.
//!
//! Every operation returns a span-less [`ScriptError`] on invalid operands;
//! the evaluator attaches the span of the triggering AST node.

use std::cmp::Ordering;

use crate::error::ScriptError;
use crate::value::{SassString, Value};

impl Value {
    pub fn plus(&self, other: &Value) -> Result<Value, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.plus(b)?)),
            (Value::Color(_), Value::Number(_) | Value::Color(_)) => {
                Err(self.undefined_operation("+", other))
            }
            (Value::String(a), _) => Ok(Value::String(SassString {
                text: format!("{}{}", a.text, unquoted_text(other)?),
                quoted: a.quoted,
            })),
            (_, Value::String(b)) => Ok(Value::String(SassString {
                text: format!("{}{}", self.to_css_string(false)?, b.text),
                quoted: b.quoted,
            })),
            _ => Err(self.undefined_operation("+", other)),
        }
    }

    pub fn minus(&self, other: &Value) -> Result<Value, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.minus(b)?)),
            (Value::Color(_), _) | (_, Value::Color(_)) => {
                Err(self.undefined_operation("-", other))
            }
            _ => Ok(Value::unquoted_string(format!(
                "{}-{}",
                self.to_css_string(false)?,
                other.to_css_string(false)?
            ))),
        }
    }

    pub fn times(&self, other: &Value) -> Result<Value, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.times(b))),
            _ => Err(self.undefined_operation("*", other)),
        }
    }

    /// Plain division.  Slash preservation for literal operands is the
    /// evaluator's concern, not the value model's.
    pub fn divide(&self, other: &Value) -> Result<Value, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.divided_by(b))),
            (Value::Color(_), _) | (_, Value::Color(_)) => {
                Err(self.undefined_operation("/", other))
            }
            _ => Ok(Value::unquoted_string(format!(
                "{}/{}",
                self.to_css_string(false)?,
                other.to_css_string(false)?
            ))),
        }
    }

    pub fn modulo(&self, other: &Value) -> Result<Value, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.modulo(b)?)),
            _ => Err(self.undefined_operation("%", other)),
        }
    }

    pub fn greater_than(&self, other: &Value) -> Result<Value, ScriptError> {
        Ok(Value::Bool(self.numeric_compare(">", other)? == Ordering::Greater))
    }

    pub fn greater_than_or_equals(&self, other: &Value) -> Result<Value, ScriptError> {
        Ok(Value::Bool(
            self.numeric_compare(">=", other)? != Ordering::Less,
        ))
    }

    pub fn less_than(&self, other: &Value) -> Result<Value, ScriptError> {
        Ok(Value::Bool(self.numeric_compare("<", other)? == Ordering::Less))
    }

    pub fn less_than_or_equals(&self, other: &Value) -> Result<Value, ScriptError> {
        Ok(Value::Bool(
            self.numeric_compare("<=", other)? != Ordering::Greater,
        ))
    }

    fn numeric_compare(&self, op: &str, other: &Value) -> Result<Ordering, ScriptError> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.compare(b),
            _ => Err(self.undefined_operation(op, other)),
        }
    }

    /// The `=` operator allowed in plain-CSS contexts (media expressions in
    /// legacy browser hacks): serializes both sides joined with `=`.
    pub fn single_equals(&self, other: &Value) -> Result<Value, ScriptError> {
        Ok(Value::unquoted_string(format!(
            "{}={}",
            self.to_css_string(false)?,
            other.to_css_string(false)?
        )))
    }

    pub fn unary_plus(&self) -> Result<Value, ScriptError> {
        match self {
            Value::Number(n) => Ok(Value::Number(n.clone().without_slash())),
            _ => Ok(Value::unquoted_string(format!(
                "+{}",
                self.to_css_string(false)?
            ))),
        }
    }

    pub fn unary_minus(&self) -> Result<Value, ScriptError> {
        match self {
            Value::Number(n) => Ok(Value::Number(n.negate())),
            Value::Color(_) => Err(ScriptError::new(format!(
                "Undefined operation \"-{}\".",
                self.inspect()
            ))),
            _ => Ok(Value::unquoted_string(format!(
                "-{}",
                self.to_css_string(false)?
            ))),
        }
    }

    pub fn unary_divide(&self) -> Result<Value, ScriptError> {
        Ok(Value::unquoted_string(format!(
            "/{}",
            self.to_css_string(false)?
        )))
    }

    pub fn unary_not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    fn undefined_operation(&self, op: &str, other: &Value) -> ScriptError {
        ScriptError::new(format!(
            "Undefined operation \"{} {} {}\".",
            self.inspect(),
            op,
            other.inspect()
        ))
    }
}

fn unquoted_text(value: &Value) -> Result<String, ScriptError> {
    match value {
        Value::String(s) => Ok(s.text.clone()),
        other => other.to_css_string(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{SassColor, SassNumber};

    fn num(v: f64) -> Value {
        Value::Number(SassNumber::unitless(v))
    }

    fn px(v: f64) -> Value {
        Value::Number(SassNumber::with_unit(v, "px"))
    }

    #[test]
    fn number_addition_with_units() {
        let sum = num(1.0).plus(&px(2.0)).unwrap();
        assert_eq!(sum, px(3.0));
    }

    #[test]
    fn string_concatenation_keeps_left_quoting() {
        let quoted = Value::quoted_string("a");
        let result = quoted.plus(&px(1.0)).unwrap();
        match result {
            Value::String(s) => {
                assert_eq!(s.text, "a1px");
                assert!(s.quoted);
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn value_plus_string_takes_right_quoting() {
        let result = num(1.0).plus(&Value::quoted_string("em")).unwrap();
        match result {
            Value::String(s) => {
                assert_eq!(s.text, "1em");
                assert!(s.quoted);
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn color_arithmetic_is_undefined() {
        let red = Value::Color(SassColor::rgb(255, 0, 0));
        assert!(red.plus(&num(1.0)).is_err());
        assert!(num(1.0).minus(&red).is_err());
        assert!(red.unary_minus().is_err());
    }

    #[test]
    fn color_plus_string_concatenates() {
        let red = Value::Color(SassColor::rgb(255, 0, 0));
        let result = red.plus(&Value::unquoted_string("ish")).unwrap();
        assert_eq!(result, Value::unquoted_string("#ff0000ish"));
    }

    #[test]
    fn minus_joins_non_numbers() {
        let result = Value::unquoted_string("a")
            .minus(&Value::unquoted_string("b"))
            .unwrap();
        assert_eq!(result, Value::unquoted_string("a-b"));
    }

    #[test]
    fn multiplication_requires_numbers() {
        assert!(Value::unquoted_string("a").times(&num(2.0)).is_err());
    }

    #[test]
    fn comparisons_require_numbers() {
        assert_eq!(px(2.0).greater_than(&px(1.0)).unwrap(), Value::Bool(true));
        assert!(Value::unquoted_string("a").less_than(&num(1.0)).is_err());
        // incompatible units fail
        assert!(px(1.0)
            .less_than(&Value::Number(SassNumber::with_unit(1.0, "s")))
            .is_err());
    }

    #[test]
    fn single_equals_serializes() {
        let result = Value::unquoted_string("a")
            .single_equals(&num(1.0))
            .unwrap();
        assert_eq!(result, Value::unquoted_string("a=1"));
    }

    #[test]
    fn not_inverts_truthiness() {
        assert_eq!(Value::Null.unary_not(), Value::Bool(true));
        assert_eq!(num(0.0).unary_not(), Value::Bool(false));
    }
}
