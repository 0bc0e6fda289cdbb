//! Deserialization helpers for the terminal's JSON encoding.
//!
//! Responses come from grpcurl, which prints protobuf messages using the
//! proto3 JSON mapping: 64-bit integers are quoted strings, non-finite floats
//! are the strings `"NaN"`, `"Infinity"` and `"-Infinity"`, and fields holding
//! default values are omitted entirely (so every field here is optional).

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Number {
    fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => match s.as_str() {
                "NaN" => Some(f64::NAN),
                "Infinity" => Some(f64::INFINITY),
                "-Infinity" => Some(f64::NEG_INFINITY),
                other => other.parse().ok(),
            },
        }
    }

    fn to_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) => Some(*v),
            // Negative or fractional counters are clamped rather than rejected.
            Self::Float(v) if v.is_finite() => Some(v.max(0.0) as u64),
            Self::Float(_) => None,
            Self::Text(s) => s.parse().ok(),
        }
    }
}

/// A float that accepts numbers or proto3 float strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LenientF64(pub f64);

impl<'de> Deserialize<'de> for LenientF64 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let n = Number::deserialize(d)?;
        n.to_f64()
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom("expected a number"))
    }
}

pub(crate) fn u64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let n = Number::deserialize(d)?;
    n.to_u64()
        .ok_or_else(|| serde::de::Error::custom("expected an unsigned integer"))
}

pub(crate) fn f64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    LenientF64::deserialize(d).map(|v| v.0)
}

pub(crate) fn f64_seq<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    let raw = Vec::<LenientF64>::deserialize(d)?;
    Ok(raw.into_iter().map(|v| v.0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Message {
        #[serde(deserialize_with = "u64_lenient")]
        counter: u64,
        #[serde(deserialize_with = "f64_lenient")]
        value: f64,
        #[serde(default, deserialize_with = "f64_seq")]
        values: Vec<f64>,
    }

    #[test]
    fn test_quoted_u64() {
        let m: Message = serde_json::from_str(r#"{"counter": "18446744073709551615", "value": 1}"#)
            .unwrap();
        assert_eq!(m.counter, u64::MAX);
        assert!(m.values.is_empty());
    }

    #[test]
    fn test_plain_numbers() {
        let m: Message =
            serde_json::from_str(r#"{"counter": 12, "value": 0.5, "values": [1, 0.25]}"#).unwrap();
        assert_eq!(m.counter, 12);
        assert_eq!(m.value, 0.5);
        assert_eq!(m.values, vec![1.0, 0.25]);
    }

    #[test]
    fn test_non_finite_strings() {
        let m: Message = serde_json::from_str(
            r#"{"counter": "1", "value": "NaN", "values": ["Infinity", "-Infinity"]}"#,
        )
        .unwrap();
        assert!(m.value.is_nan());
        assert_eq!(m.values, vec![f64::INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn test_negative_counter_clamps_to_zero() {
        let m: Message = serde_json::from_str(r#"{"counter": -5, "value": 1}"#).unwrap();
        assert_eq!(m.counter, 0);
    }

    #[test]
    fn test_fractional_counter_truncates() {
        let m: Message = serde_json::from_str(r#"{"counter": 7.9, "value": 1}"#).unwrap();
        assert_eq!(m.counter, 7);
    }

    #[test]
    fn test_garbage_rejected() {
        let r: Result<Message, _> = serde_json::from_str(r#"{"counter": "abc", "value": 1}"#);
        assert!(r.is_err());
    }
}
