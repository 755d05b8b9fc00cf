//! Attribute casting from raw JSON into typed values.

use {
    super::Entity,
    chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc},
    serde_json::Value,
    std::{fmt, sync::Arc},
    uuid::Uuid,
};

/// A hydrated attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Raw(Value),
    Uuid(Uuid),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Enum(String),
    /// Embedded value object
    Object(Box<Entity>),
}

impl AttributeValue {
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            AttributeValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Raw(Value::String(s)) | AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            AttributeValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            AttributeValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            AttributeValue::DateTime(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Raw(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::Raw(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            AttributeValue::Raw(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Entity> {
        match self {
            AttributeValue::Object(entity) => Some(entity),
            _ => None,
        }
    }
}

/// Custom conversion for one attribute.
pub trait AttributeCaster: Send + Sync + fmt::Debug {
    fn cast(&self, value: &Value) -> Result<AttributeValue, String>;
}

/// How a raw attribute is converted during hydration.
#[derive(Debug, Clone)]
pub enum Cast {
    Uuid,
    /// RFC 3339 string or unix timestamp in seconds
    DateTime,
    /// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
    Date,
    Integer,
    Float,
    Boolean,
    /// One of the listed values; an empty list accepts any string
    Enum(Vec<String>),
    /// Embedded map hydrated with the named value-object schema
    ValueObject(String),
    Custom(Arc<dyn AttributeCaster>),
}

impl Cast {
    pub fn enumeration<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cast::Enum(allowed.into_iter().map(Into::into).collect())
    }

    pub fn custom(caster: impl AttributeCaster + 'static) -> Self {
        Cast::Custom(Arc::new(caster))
    }

    /// Convert a scalar value. `ValueObject` needs the model registry and is
    /// handled by the mapper.
    pub(crate) fn apply(&self, value: &Value) -> Result<AttributeValue, String> {
        match self {
            Cast::Uuid => {
                let text = expect_str(value)?;
                Uuid::parse_str(text)
                    .map(AttributeValue::Uuid)
                    .map_err(|e| e.to_string())
            }
            Cast::DateTime => parse_datetime(value).map(AttributeValue::DateTime),
            Cast::Date => {
                let text = expect_str(value)?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
                    .map(AttributeValue::Date)
                    .map_err(|e| e.to_string())
            }
            Cast::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .map(AttributeValue::Integer)
                    .ok_or_else(|| format!("{n} is not an integer")),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map(AttributeValue::Integer)
                    .map_err(|_| format!("`{s}` is not an integer")),
                other => Err(format!("expected an integer, got {other}")),
            },
            Cast::Float => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(AttributeValue::Float)
                    .ok_or_else(|| format!("{n} is not a float")),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map(AttributeValue::Float)
                    .map_err(|_| format!("`{s}` is not a number")),
                other => Err(format!("expected a number, got {other}")),
            },
            Cast::Boolean => match value {
                Value::Bool(b) => Ok(AttributeValue::Boolean(*b)),
                Value::Number(n) if n.as_i64() == Some(0) => Ok(AttributeValue::Boolean(false)),
                Value::Number(n) if n.as_i64() == Some(1) => Ok(AttributeValue::Boolean(true)),
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Ok(AttributeValue::Boolean(true)),
                    "false" | "0" | "no" => Ok(AttributeValue::Boolean(false)),
                    _ => Err(format!("`{s}` is not a boolean")),
                },
                other => Err(format!("expected a boolean, got {other}")),
            },
            Cast::Enum(allowed) => {
                let text = expect_str(value)?;
                if allowed.is_empty() || allowed.iter().any(|a| a == text) {
                    Ok(AttributeValue::Enum(text.to_string()))
                } else {
                    Err(format!("`{text}` is not one of {allowed:?}"))
                }
            }
            Cast::ValueObject(model) => Err(format!("value object `{model}` needs a mapper")),
            Cast::Custom(caster) => caster.cast(value),
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {value}"))
}

fn parse_datetime(value: &Value) -> Result<DateTime<FixedOffset>, String> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).map_err(|e| format!("`{s}`: {e}")),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| format!("{n} is not a valid timestamp")),
        other => Err(format!("expected a timestamp, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn casts_identity_and_time() {
        let id = Cast::Uuid
            .apply(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8"))
            .unwrap();
        assert_eq!(id.as_uuid().unwrap().to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");

        let created = Cast::DateTime.apply(&json!("2024-03-01T10:00:00+02:00")).unwrap();
        assert_eq!(created.as_date(), NaiveDate::from_ymd_opt(2024, 3, 1));

        let epoch = Cast::DateTime.apply(&json!(0)).unwrap();
        assert_eq!(epoch.as_datetime().unwrap().timestamp(), 0);
    }

    #[test]
    fn casts_scalars_from_strings() {
        assert_eq!(Cast::Integer.apply(&json!("42")).unwrap().as_i64(), Some(42));
        assert_eq!(Cast::Float.apply(&json!(1.5)).unwrap().as_f64(), Some(1.5));
        assert_eq!(Cast::Boolean.apply(&json!("no")).unwrap().as_bool(), Some(false));
        assert_eq!(Cast::Boolean.apply(&json!(1)).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn enum_rejects_unknown_values() {
        let status = Cast::enumeration(["ACTIVE", "DISABLED"]);
        assert_eq!(status.apply(&json!("ACTIVE")).unwrap().as_str(), Some("ACTIVE"));
        assert!(status.apply(&json!("PENDING")).is_err());
    }

    #[test]
    fn reports_malformed_input() {
        assert!(Cast::Uuid.apply(&json!("not-a-uuid")).is_err());
        assert!(Cast::Integer.apply(&json!(true)).is_err());
        assert!(Cast::Date.apply(&json!("01/02/2024")).is_err());
    }
}
