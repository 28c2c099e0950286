//! Typed function attributes

use crate::FunctionError;
use std::fmt;

/// Value of a function attribute
///
/// Attributes configure a function rather than being fitted. Each variant
/// parses its own textual form in [`Attribute::set_from_str`].
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
    Vector(Vec<f64>),
}

impl Attribute {
    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::Int(_) => "int",
            Attribute::Double(_) => "double",
            Attribute::Bool(_) => "bool",
            Attribute::Str(_) => "string",
            Attribute::Vector(_) => "vector",
        }
    }

    /// Replace the value by parsing `text`, keeping the variant
    ///
    /// `name` is only used to build the error.
    pub fn set_from_str(&mut self, name: &str, text: &str) -> Result<(), FunctionError> {
        let text = text.trim();
        let invalid = |kind: &'static str| FunctionError::InvalidAttributeValue {
            attribute: name.to_string(),
            kind,
            value: text.to_string(),
        };

        match self {
            Attribute::Int(value) => *value = text.parse().map_err(|_| invalid("int"))?,
            Attribute::Double(value) => *value = text.parse().map_err(|_| invalid("double"))?,
            Attribute::Bool(value) => {
                *value = match text.to_ascii_lowercase().as_str() {
                    "true" | "1" => true,
                    "false" | "0" => false,
                    _ => return Err(invalid("bool")),
                }
            }
            Attribute::Str(value) => *value = text.to_string(),
            Attribute::Vector(values) => {
                let inner = text
                    .strip_prefix('(')
                    .and_then(|t| t.strip_suffix(')'))
                    .unwrap_or(text);
                *values = inner
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|item| !item.is_empty())
                    .map(|item| item.parse::<f64>().map_err(|_| invalid("vector")))
                    .collect::<Result<_, _>>()?;
            }
        }
        Ok(())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Attribute::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Attribute::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Attribute::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Text accepted back by [`Attribute::set_from_str`] after unquoting;
    /// strings are double-quoted.
    pub fn value_string(&self) -> String {
        match self {
            Attribute::Str(v) => format!("\"{}\"", v),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Int(v) => write!(f, "{}", v),
            Attribute::Double(v) => write!(f, "{}", v),
            Attribute::Bool(v) => write!(f, "{}", v),
            Attribute::Str(v) => write!(f, "{}", v),
            Attribute::Vector(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Store `value` in the slot named `name`, which must hold the same variant.
/// Returns the previous value.
pub(crate) fn replace_typed(
    slots: &mut [(String, Attribute)],
    function: &str,
    name: &str,
    value: Attribute,
) -> Result<Attribute, FunctionError> {
    let slot = slots
        .iter_mut()
        .find(|(n, _)| n == name)
        .map(|(_, slot)| slot)
        .ok_or_else(|| FunctionError::UnknownAttribute {
            function: function.to_string(),
            attribute: name.to_string(),
        })?;
    if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
        return Err(FunctionError::InvalidAttributeValue {
            attribute: name.to_string(),
            kind: slot.type_name(),
            value: value.value_string(),
        });
    }
    Ok(std::mem::replace(slot, value))
}
