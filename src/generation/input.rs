//! Lenient parsing of generation inputs
//!
//! Tempo and key arrive as loosely typed JSON values (numbers, numeric
//! strings, one-element arrays). Tempo must be recoverable; a bad key falls
//! back to C.

use crate::analysis::result::PitchClass;
use crate::error::HarmonyError;
use serde_json::Value;

/// Parse a tempo value
///
/// Accepts a number, a numeric string (integer or float), or a one-element
/// array holding either.
///
/// # Errors
///
/// Returns `HarmonyError::InvalidInput` if the value is missing or cannot be
/// read as a number
///
/// # Example
///
/// ```
/// use harmonybot::generation::input::coerce_tempo;
/// use serde_json::json;
///
/// assert_eq!(coerce_tempo(&json!(128)).unwrap(), 128.0);
/// assert_eq!(coerce_tempo(&json!("99.5")).unwrap(), 99.5);
/// assert_eq!(coerce_tempo(&json!([140])).unwrap(), 140.0);
/// assert!(coerce_tempo(&json!("fast")).is_err());
/// ```
pub fn coerce_tempo(value: &Value) -> Result<f32, HarmonyError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|t| t as f32)
            .ok_or_else(|| HarmonyError::InvalidInput(format!("Invalid tempo: {}", n))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(whole) = trimmed.parse::<i64>() {
                return Ok(whole as f32);
            }
            trimmed
                .parse::<f64>()
                .map(|t| t as f32)
                .map_err(|_| HarmonyError::InvalidInput(format!("Invalid tempo: {:?}", s)))
        }
        Value::Array(items) if items.len() == 1 => coerce_tempo(&items[0]),
        Value::Null => Err(HarmonyError::InvalidInput("Missing tempo".to_string())),
        other => Err(HarmonyError::InvalidInput(format!("Invalid tempo: {}", other))),
    }
}

/// Parse a key index, falling back to C
///
/// Integers (or integer strings) in 0-11 select that pitch class. Anything
/// else, including a missing key, floats and note names, yields C.
pub fn coerce_key(value: Option<&Value>) -> PitchClass {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        log::warn!("No key given, defaulting to C");
        return PitchClass::C;
    };

    let index = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match index
        .and_then(|i| usize::try_from(i).ok())
        .and_then(PitchClass::from_index)
    {
        Some(key) => key,
        None => {
            log::warn!("Invalid key index {}, defaulting to C", value);
            PitchClass::C
        }
    }
}
