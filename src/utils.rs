use crate::errors::ModelTextError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Parse a float token, resolving the infinity and NaN spellings first.
///
/// The sentinel checks are case-insensitive substring matches, so `-inf` has
/// to be tested before `inf`. Anything else goes through the regular decimal
/// parser, which is locale independent.
pub fn parse_float_token(token: &str) -> Option<f64> {
    let lower = token.trim().to_ascii_lowercase();
    if lower.contains("-inf") {
        Some(f64::NEG_INFINITY)
    } else if lower.contains("inf") {
        Some(f64::INFINITY)
    } else if lower.contains("nan") {
        Some(f64::NAN)
    } else {
        lower.parse::<f64>().ok()
    }
}

fn invalid_token(token: &str, tree: Option<usize>, field: &str, line: usize) -> ModelTextError {
    ModelTextError::MalformedNumericToken {
        tree,
        line,
        field: field.to_string(),
        token: token.to_string(),
    }
}

/// Parse a single integer (or other `FromStr`) value.
pub fn parse_number<T: FromStr>(
    token: &str,
    tree: Option<usize>,
    field: &str,
    line: usize,
) -> Result<T, ModelTextError> {
    token.trim().parse::<T>().map_err(|_| invalid_token(token, tree, field, line))
}

/// Parse a whitespace separated list of floats.
pub fn parse_float_array(
    value: &str,
    tree: Option<usize>,
    field: &str,
    line: usize,
) -> Result<Vec<f64>, ModelTextError> {
    value
        .split_whitespace()
        .map(|t| parse_float_token(t).ok_or_else(|| invalid_token(t, tree, field, line)))
        .collect()
}

/// Parse a whitespace separated list of integers.
pub fn parse_int_array<T: FromStr>(
    value: &str,
    tree: Option<usize>,
    field: &str,
    line: usize,
) -> Result<Vec<T>, ModelTextError> {
    value
        .split_whitespace()
        .map(|t| parse_number(t, tree, field, line))
        .collect()
}

/// A float that survives json: non-finite values are written with their
/// token spelling (`inf`, `-inf`, `NaN`) instead of `null`.
struct JsonFloat(f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFloatRepr {
    Number(f64),
    Token(String),
}

impl Serialize for JsonFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for JsonFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match JsonFloatRepr::deserialize(deserializer)? {
            JsonFloatRepr::Number(v) => Ok(JsonFloat(v)),
            JsonFloatRepr::Token(t) => parse_float_token(&t)
                .map(JsonFloat)
                .ok_or_else(|| de::Error::custom(format!("invalid float token `{}`", t))),
        }
    }
}

/// Serde adapter for `f64` fields that may hold infinities or NaN.
pub mod json_f64 {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        JsonFloat(*v).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(JsonFloat::deserialize(deserializer)?.0)
    }
}

/// Serde adapter for `f32` fields that may hold infinities or NaN.
pub mod json_f32 {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        JsonFloat(f64::from(*v)).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Ok(JsonFloat::deserialize(deserializer)?.0 as f32)
    }
}

/// Serde adapter for `Vec<f64>` fields that may hold infinities or NaN.
pub mod json_f64_vec {
    use super::JsonFloat;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(v.iter().map(|x| JsonFloat(*x)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Ok(Vec::<JsonFloat>::deserialize(deserializer)?
            .into_iter()
            .map(|f| f.0)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_sentinels() {
        assert_eq!(parse_float_token("-inf"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_token("-INF"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_token("Inf"), Some(f64::INFINITY));
        assert_eq!(parse_float_token("+inf"), Some(f64::INFINITY));
        assert_eq!(parse_float_token("infinity"), Some(f64::INFINITY));
        assert!(parse_float_token("NAN").unwrap().is_nan());
        assert!(parse_float_token("-nan(ind)").unwrap().is_nan());
    }

    #[test]
    fn test_float_numbers() {
        assert_eq!(parse_float_token("1e10"), Some(1e10));
        assert_eq!(parse_float_token("-0.25"), Some(-0.25));
        assert_eq!(parse_float_token("1.0000000180025095e-35"), Some(1.0000000180025095e-35));
        assert_eq!(parse_float_token("1,5"), None);
        assert_eq!(parse_float_token("abc"), None);
    }

    #[test]
    fn test_parse_float_array() {
        let v = parse_float_array("0.5  -inf\t1e-3 nan", Some(0), "threshold", 4).unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 0.5);
        assert_eq!(v[1], f64::NEG_INFINITY);
        assert_eq!(v[2], 1e-3);
        assert!(v[3].is_nan());
        assert!(parse_float_array("", Some(0), "threshold", 4).unwrap().is_empty());
    }

    #[test]
    fn test_parse_float_array_rejects_invalid_values() {
        let err = parse_float_array("1.0 2.0 nope 3.0", Some(2), "leaf_value", 17).unwrap_err();
        match err {
            ModelTextError::MalformedNumericToken { tree, line, field, token } => {
                assert_eq!(tree, Some(2));
                assert_eq!(line, 17);
                assert_eq!(field, "leaf_value");
                assert_eq!(token, "nope");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_json_float() {
        #[derive(Serialize, Deserialize)]
        struct Row {
            #[serde(with = "json_f32")]
            threshold: f32,
            #[serde(with = "json_f64_vec")]
            values: Vec<f64>,
        }
        let row = Row {
            threshold: f32::NEG_INFINITY,
            values: vec![0.5, f64::INFINITY, f64::NAN],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"threshold":"-inf","values":[0.5,"inf","NaN"]}"#);
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back.threshold, f32::NEG_INFINITY);
        assert_eq!(back.values[..2], [0.5, f64::INFINITY]);
        assert!(back.values[2].is_nan());
        assert!(serde_json::from_str::<Row>(r#"{"threshold":"x","values":[]}"#).is_err());
    }

    #[test]
    fn test_parse_int_array() {
        let v: Vec<i32> = parse_int_array("1 -1 -2", Some(0), "left_child", 9).unwrap();
        assert_eq!(v, vec![1, -1, -2]);
        let v: Vec<u32> = parse_int_array("4294967295 0", Some(0), "cat_threshold", 9).unwrap();
        assert_eq!(v, vec![u32::MAX, 0]);
        assert!(parse_int_array::<u32>("-1", Some(0), "decision_type", 9).is_err());
        assert!(parse_int_array::<i32>("1.5", Some(0), "split_feature", 9).is_err());
    }
}
