//! The default built-in function registry.
//!
//! Only a small core ships with the evaluator: enough to exercise the
//! callable interface and support the meta-functions the language itself
//! leans on.  `if()`, `call()` and `content-exists()` are not here — they
//! need evaluator state and are dispatched specially.

use std::rc::Rc;

use crate::callable::{BuiltinCallable, BuiltinOverload, BuiltinParameter};
use crate::error::ScriptError;
use crate::value::{SassColor, SassNumber, SassString, Value};

/// The features `feature-exists()` reports as supported.
const FEATURES: &[&str] = &[
    "global-variable-shadowing",
    "extend-selector-pseudoclass",
    "units-level-3",
    "at-error",
    "custom-property",
];

/// Builds the global registry.
pub fn global_functions() -> Vec<BuiltinCallable> {
    vec![
        rgb(),
        rgba(),
        BuiltinCallable::new(
            "red",
            vec![BuiltinParameter::required("color")],
            |mut args| {
                let color = args.remove(0).assert_color(Some("color"))?;
                Ok(Value::Number(SassNumber::unitless(f64::from(color.red()))))
            },
        ),
        BuiltinCallable::new(
            "length",
            vec![BuiltinParameter::required("list")],
            |args| {
                Ok(Value::Number(SassNumber::unitless(
                    args[0].length_as_list() as f64,
                )))
            },
        ),
        BuiltinCallable::new(
            "nth",
            vec![
                BuiltinParameter::required("list"),
                BuiltinParameter::required("n"),
            ],
            |args| {
                let index = args[0].sass_index_to_list_index(&args[1])?;
                Ok(args[0].as_list().swap_remove(index))
            },
        ),
        BuiltinCallable::new(
            "index",
            vec![
                BuiltinParameter::required("list"),
                BuiltinParameter::required("value"),
            ],
            |args| {
                let found = args[0].as_list().iter().position(|e| *e == args[1]);
                Ok(match found {
                    Some(i) => Value::Number(SassNumber::unitless((i + 1) as f64)),
                    None => Value::Null,
                })
            },
        ),
        BuiltinCallable::new(
            "map-get",
            vec![
                BuiltinParameter::required("map"),
                BuiltinParameter::required("key"),
            ],
            |mut args| {
                let key = args.remove(1);
                let map = args.remove(0).assert_map(Some("map"))?;
                Ok(map.get(&key).cloned().unwrap_or(Value::Null))
            },
        ),
        BuiltinCallable::new(
            "map-has-key",
            vec![
                BuiltinParameter::required("map"),
                BuiltinParameter::required("key"),
            ],
            |mut args| {
                let key = args.remove(1);
                let map = args.remove(0).assert_map(Some("map"))?;
                Ok(Value::Bool(map.get(&key).is_some()))
            },
        ),
        BuiltinCallable::new(
            "unit",
            vec![BuiltinParameter::required("number")],
            |mut args| {
                let number = args.remove(0).assert_number(Some("number"))?;
                let unit = number.to_string();
                let unit = unit.trim_start_matches(|c: char| {
                    c.is_ascii_digit() || c == '.' || c == '-'
                });
                Ok(Value::String(SassString::quoted(unit)))
            },
        ),
        BuiltinCallable::new(
            "unitless",
            vec![BuiltinParameter::required("number")],
            |mut args| {
                let number = args.remove(0).assert_number(Some("number"))?;
                Ok(Value::Bool(!number.has_units()))
            },
        ),
        BuiltinCallable::new("quote", vec![BuiltinParameter::required("string")], |mut args| {
            let string = args.remove(0).assert_string(Some("string"))?;
            Ok(Value::String(SassString::quoted(string.text)))
        }),
        BuiltinCallable::new(
            "unquote",
            vec![BuiltinParameter::required("string")],
            |mut args| {
                let string = args.remove(0).assert_string(Some("string"))?;
                Ok(Value::String(SassString::unquoted(string.text)))
            },
        ),
        BuiltinCallable::new(
            "inspect",
            vec![BuiltinParameter::required("value")],
            |args| Ok(Value::String(SassString::unquoted(args[0].inspect()))),
        ),
        BuiltinCallable::new(
            "feature-exists",
            vec![BuiltinParameter::required("feature")],
            |mut args| {
                let feature = args.remove(0).assert_string(Some("feature"))?;
                Ok(Value::Bool(FEATURES.contains(&feature.text.as_str())))
            },
        ),
    ]
}

fn rgb() -> BuiltinCallable {
    BuiltinCallable::new(
        "rgb",
        vec![
            BuiltinParameter::required("red"),
            BuiltinParameter::required("green"),
            BuiltinParameter::required("blue"),
        ],
        |args| build_color(args, None),
    )
}

fn rgba() -> BuiltinCallable {
    BuiltinCallable {
        name: "rgba".to_owned(),
        overloads: vec![
            BuiltinOverload {
                parameters: vec![
                    BuiltinParameter::required("red"),
                    BuiltinParameter::required("green"),
                    BuiltinParameter::required("blue"),
                    BuiltinParameter::required("alpha"),
                ],
                rest: None,
                body: Rc::new(|mut args| {
                    let alpha = args.pop().expect("arity was checked");
                    build_color(args, Some(alpha))
                }),
            },
            BuiltinOverload {
                parameters: vec![
                    BuiltinParameter::required("color"),
                    BuiltinParameter::required("alpha"),
                ],
                rest: None,
                body: Rc::new(|mut args| {
                    let alpha = args.pop().expect("arity was checked");
                    let color = args.remove(0).assert_color(Some("color"))?;
                    let alpha = alpha_value(alpha)?;
                    Ok(Value::Color(SassColor::rgba(
                        color.red(),
                        color.green(),
                        color.blue(),
                        alpha,
                    )))
                }),
            },
        ],
    }
}

fn build_color(args: Vec<Value>, alpha: Option<Value>) -> Result<Value, ScriptError> {
    // the legacy slash form survives: rgba(0, 0, 0, $a/$b) re-emits the
    // division textually
    if let Some(Value::Number(n)) = &alpha {
        if let Some((numerator, denominator)) = n.as_slash() {
            let mut parts = Vec::new();
            for arg in &args {
                parts.push(arg.to_css_string(false)?);
            }
            return Ok(Value::unquoted_string(format!(
                "rgba({}, {}/{})",
                parts.join(", "),
                Value::Number(numerator.clone()).to_css_string(false)?,
                Value::Number(denominator.clone()).to_css_string(false)?,
            )));
        }
    }

    let mut channels = [0u8; 3];
    for (i, arg) in args.into_iter().enumerate() {
        let number = arg.assert_number(Some(["red", "green", "blue"][i]))?;
        channels[i] = number.value.clamp(0.0, 255.0).round() as u8;
    }

    let alpha = match alpha {
        Some(value) => alpha_value(value)?,
        None => 1.0,
    };

    Ok(Value::Color(SassColor::rgba(
        channels[0],
        channels[1],
        channels[2],
        alpha,
    )))
}

fn alpha_value(value: Value) -> Result<f64, ScriptError> {
    let number = value.assert_number(Some("alpha"))?;
    // percentage alphas normalize to 0..1
    if number.numerator_units == vec!["%".to_owned()] {
        Ok((number.value / 100.0).clamp(0.0, 1.0))
    } else {
        Ok(number.value.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        let registry = global_functions();
        let callable = registry.iter().find(|c| c.name == name).unwrap();
        let overload = callable.overload_for(args.len(), &[]).unwrap();
        (overload.body)(args)
    }

    fn num(v: f64) -> Value {
        Value::Number(SassNumber::unitless(v))
    }

    #[test]
    fn rgb_builds_colors() {
        assert_eq!(
            call("rgb", vec![num(255.0), num(0.0), num(0.0)]).unwrap(),
            Value::Color(SassColor::rgb(255, 0, 0))
        );
    }

    #[test]
    fn rgba_selects_overload_by_arity() {
        let from_channels =
            call("rgba", vec![num(255.0), num(0.0), num(0.0), num(0.5)]).unwrap();
        let from_color = call(
            "rgba",
            vec![Value::Color(SassColor::rgb(255, 0, 0)), num(0.5)],
        )
        .unwrap();
        assert_eq!(from_channels, from_color);
    }

    #[test]
    fn rgba_preserves_slash_form() {
        let alpha = SassNumber::unitless(0.5)
            .with_slash(SassNumber::unitless(1.0), SassNumber::unitless(2.0));
        let result = call(
            "rgba",
            vec![num(0.0), num(0.0), num(0.0), Value::Number(alpha)],
        )
        .unwrap();
        assert_eq!(result, Value::unquoted_string("rgba(0, 0, 0, 1/2)"));
    }

    #[test]
    fn list_functions() {
        let list = Value::comma_list(vec![num(1.0), num(2.0), num(3.0)]);
        assert_eq!(call("length", vec![list.clone()]).unwrap(), num(3.0));
        assert_eq!(call("nth", vec![list.clone(), num(2.0)]).unwrap(), num(2.0));
        assert_eq!(call("nth", vec![list.clone(), num(-1.0)]).unwrap(), num(3.0));
        assert_eq!(call("index", vec![list, num(2.0)]).unwrap(), num(2.0));
    }

    #[test]
    fn unit_reports_units() {
        assert_eq!(
            call("unit", vec![Value::Number(SassNumber::with_unit(1.0, "px"))]).unwrap(),
            Value::quoted_string("px")
        );
        assert_eq!(call("unitless", vec![num(1.0)]).unwrap(), Value::Bool(true));
    }
}
