//! Lenient deserialization of money amounts in request bodies.
//!
//! Web forms often send numbers as strings, so both `12.5` and `"12.5"` are
//! accepted.

use serde::{Deserialize, Deserializer, de};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

/// Deserialize an optional amount from a JSON number or a numeric string.
///
/// Blank strings are treated as missing.
///
/// Use with `#[serde(default, deserialize_with = "amount::deserialize_optional")]`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        Some(RawAmount::Number(amount)) => Ok(Some(amount)),
        Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawAmount::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid amount \"{text}\""))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "super::deserialize_optional")]
        amount: Option<f64>,
    }

    #[test]
    fn accepts_number_and_string() {
        let number: Body = serde_json::from_str(r#"{"amount": 12}"#).unwrap();
        let text: Body = serde_json::from_str(r#"{"amount": " 12.50 "}"#).unwrap();

        assert_eq!(number.amount, Some(12.0));
        assert_eq!(text.amount, Some(12.5));
    }

    #[test]
    fn missing_null_and_blank_are_none() {
        let missing: Body = serde_json::from_str("{}").unwrap();
        let null: Body = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        let blank: Body = serde_json::from_str(r#"{"amount": ""}"#).unwrap();

        assert_eq!(missing.amount, None);
        assert_eq!(null.amount, None);
        assert_eq!(blank.amount, None);
    }

    #[test]
    fn rejects_words() {
        assert!(serde_json::from_str::<Body>(r#"{"amount": "lots"}"#).is_err());
    }
}
