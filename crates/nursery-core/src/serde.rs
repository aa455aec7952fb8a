//! Deserializers for query-string filters.
//!
//! Axum hands query parameters to serde as strings, and `#[serde(flatten)]`
//! forces every field through the string path. These helpers parse the text
//! themselves and treat an empty value (`?class_id=`) as absent.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Accepts `true`/`false`, `1`/`0` and `yes`/`no` in any case.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid boolean value: {}",
                other
            ))),
        },
        None => Ok(None),
    }
}

/// Parses `YYYY-MM-DD`.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)? {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| serde::de::Error::custom("Invalid date format. Use YYYY-MM-DD")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        class_id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        is_active: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_date")]
        date: Option<NaiveDate>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let f: Filters =
            serde_json::from_str(r#"{"class_id":"","is_active":" ","date":""}"#).unwrap();
        assert!(f.class_id.is_none());
        assert!(f.is_active.is_none());
        assert!(f.date.is_none());
    }

    #[test]
    fn test_missing_values_are_none() {
        let f: Filters = serde_json::from_str("{}").unwrap();
        assert!(f.class_id.is_none());
    }

    #[test]
    fn test_parses_values() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"class_id":"{}","is_active":"False","date":"2025-03-14"}}"#,
            id
        );
        let f: Filters = serde_json::from_str(&json).unwrap();
        assert_eq!(f.class_id, Some(id));
        assert_eq!(f.is_active, Some(false));
        assert_eq!(f.date, NaiveDate::from_ymd_opt(2025, 3, 14));
    }

    #[test]
    fn test_rejects_bad_date() {
        let result: Result<Filters, _> = serde_json::from_str(r#"{"date":"14/03/2025"}"#);
        assert!(result.is_err());
    }
}
