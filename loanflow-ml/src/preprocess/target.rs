//! Mapping between raw target values and numeric class labels.

use crate::error::ErrorKind;
use serde_json::Value;

/// `yes`-like answers map to 1, `no`-like to 0. Numeric labels pass through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetValueMapping;

impl TargetValueMapping {
    pub const YES: f64 = 1.0;
    pub const NO: f64 = 0.0;

    pub fn encode(&self, value: &Value) -> Result<f64, ErrorKind> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ErrorKind::schema(format!("target value `{n}` is not finite"))),
            Value::Bool(b) => Ok(if *b { Self::YES } else { Self::NO }),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" | "true" | "approved" => Ok(Self::YES),
                "no" | "n" | "false" | "rejected" => Ok(Self::NO),
                other => other.parse::<f64>().map_err(|_| {
                    ErrorKind::schema(format!("unrecognised target value `{s}`"))
                }),
            },
            Value::Null => Err(ErrorKind::schema("target value is missing")),
            other => Err(ErrorKind::schema(format!(
                "unrecognised target value `{other}`"
            ))),
        }
    }

    /// Human name of a label, if it is one of the mapped classes.
    pub fn reverse(&self, label: f64) -> Option<&'static str> {
        if label == Self::YES {
            Some("yes")
        } else if label == Self::NO {
            Some("no")
        } else {
            None
        }
    }
}
