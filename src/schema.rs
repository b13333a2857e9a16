//! Form schema for the setup and reconfigure steps, and the checks applied to
//! submitted input before anything touches the network.

use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};

use crate::protocol::{
    CONF_IP_ADDRESS, CONF_SCAN_INTERVAL, DEFAULT_SCAN_INTERVAL, MAX_SCAN_INTERVAL,
    MIN_SCAN_INTERVAL,
};
use crate::types::EntryData;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
}

/// One field of a rendered form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Applied when the field is missing from the submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Pre-filled in the form only; never applied on submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

pub fn user_schema() -> Vec<FormField> {
    vec![
        FormField {
            name: CONF_IP_ADDRESS,
            field_type: FieldType::String,
            required: true,
            default: None,
            suggested_value: None,
            min: None,
            max: None,
        },
        FormField {
            name: CONF_SCAN_INTERVAL,
            field_type: FieldType::Integer,
            required: false,
            default: Some(json!(DEFAULT_SCAN_INTERVAL)),
            suggested_value: None,
            min: Some(MIN_SCAN_INTERVAL),
            max: Some(MAX_SCAN_INTERVAL),
        },
    ]
}

/// Same fields as [`user_schema`], pre-filled with the entry's current values.
pub fn reconfigure_schema(current: &EntryData) -> Vec<FormField> {
    let mut fields = user_schema();
    for field in &mut fields {
        field.suggested_value = match field.name {
            CONF_IP_ADDRESS => Some(json!(current.ip_address)),
            CONF_SCAN_INTERVAL => Some(json!(current.scan_interval)),
            _ => None,
        };
    }
    fields
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputErrorKind {
    NotAnObject,
    Required,
    ExpectedString,
    ExpectedInteger,
    OutOfRange,
    ExtraKey,
}

impl InputErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            InputErrorKind::NotAnObject => "invalid_input",
            InputErrorKind::Required => "required",
            InputErrorKind::ExpectedString => "expected_string",
            InputErrorKind::ExpectedInteger => "expected_integer",
            InputErrorKind::OutOfRange => "out_of_range",
            InputErrorKind::ExtraKey => "extra_key",
        }
    }
}

/// A schema violation on one field. `field` is `"base"` when the submission
/// as a whole is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    pub field: String,
    pub kind: InputErrorKind,
}

impl InputError {
    fn new(field: impl Into<String>, kind: InputErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.kind.code())
    }
}

/// Check a raw form submission and turn it into [`EntryData`].
///
/// `ip_address` must be a string. `scan_interval` is coerced to an integer
/// (numbers are truncated, booleans become 0/1, strings are parsed) and must
/// lie in `[MIN_SCAN_INTERVAL, MAX_SCAN_INTERVAL]`; it defaults to
/// `DEFAULT_SCAN_INTERVAL` when absent. Unknown keys are rejected. All
/// violations are reported together.
pub fn parse_input(input: &Value) -> Result<EntryData> {
    let Some(obj) = input.as_object() else {
        return Err(Error::InvalidInput(vec![InputError::new(
            "base",
            InputErrorKind::NotAnObject,
        )]));
    };

    let mut errors = Vec::new();

    let ip_address = match obj.get(CONF_IP_ADDRESS) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(InputError::new(CONF_IP_ADDRESS, InputErrorKind::ExpectedString));
            None
        }
        None => {
            errors.push(InputError::new(CONF_IP_ADDRESS, InputErrorKind::Required));
            None
        }
    };

    let scan_interval = match obj.get(CONF_SCAN_INTERVAL) {
        None => Some(DEFAULT_SCAN_INTERVAL),
        Some(raw) => match coerce_int(raw) {
            Some(n) if (i64::from(MIN_SCAN_INTERVAL)..=i64::from(MAX_SCAN_INTERVAL))
                .contains(&n) =>
            {
                u32::try_from(n).ok()
            }
            Some(_) => {
                errors.push(InputError::new(CONF_SCAN_INTERVAL, InputErrorKind::OutOfRange));
                None
            }
            None => {
                errors.push(InputError::new(
                    CONF_SCAN_INTERVAL,
                    InputErrorKind::ExpectedInteger,
                ));
                None
            }
        },
    };

    for key in obj.keys() {
        if key != CONF_IP_ADDRESS && key != CONF_SCAN_INTERVAL {
            errors.push(InputError::new(key.as_str(), InputErrorKind::ExtraKey));
        }
    }

    match (ip_address, scan_interval) {
        (Some(ip_address), Some(scan_interval)) if errors.is_empty() => Ok(EntryData {
            ip_address,
            scan_interval,
        }),
        _ => Err(Error::InvalidInput(errors)),
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
