//! Entity records as the backend sends them.
//!
//! Records are flat and loosely validated: a malformed timestamp or id on one
//! row must not make the whole collection undecodable.

pub mod product;
pub mod ticket;
pub mod user;

pub use product::{format_price, NewProduct, Product, ProductStatus};
pub use ticket::{Priority, Ticket, TicketStatus};
pub use user::{AccountState, NewUser, Role, SuspensionCommand, User, UserId, UserPatch, UserStatus};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Common surface the projector and table renderer work against.
pub trait Record {
    /// Stable key for a rendered row.
    fn row_key(&self) -> String;

    /// Fields matched by the free-text search, in display order.
    fn search_fields(&self) -> Vec<&str>;

    /// Creation timestamp, if the server sent a usable one.
    fn created(&self) -> Option<DateTime<Utc>>;

    /// Calendar day of creation, taken in UTC.
    fn created_day(&self) -> Option<NaiveDate> {
        self.created().map(|ts| ts.date_naive())
    }
}

/// Render a timestamp the way the tables show dates: `Jul 14, 2024`.
pub fn format_date(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%b %-d, %Y").to_string(),
        None => "-".to_string(),
    }
}

/// Parse RFC 3339, a bare `YYYY-MM-DD`, or `YYYY-MM-DDTHH:MM:SS` without zone.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_timestamp(&s),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

/// Numeric ids sometimes arrive as strings.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Required numeric id; a numeric string is accepted.
pub(crate) fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_u64(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing or non-numeric id"))
}

/// Required string id; a bare number is accepted.
pub(crate) fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unusable id: {}", other))),
    }
}

/// Amounts arrive as numbers or strings like `"15,000.50"`; anything else is 0.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// `null` becomes the default instead of a decode error.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 7, 14, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-07-14T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-07-14T11:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-07-14T10:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-07-14"),
            Some(Utc.with_ymd_and_hms(2024, 7, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("last tuesday"), None);
    }

    #[test]
    fn test_lenient_ids_and_amounts() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "id": "2", "name": "VPS", "price": "15,000.50"
        }))
        .unwrap();
        assert_eq!(p.id, 2);
        assert_eq!(p.price, 15000.5);

        let p: Product = serde_json::from_value(serde_json::json!({"id": 4, "price": "n/a"})).unwrap();
        assert_eq!(p.price, 0.0);
        assert!(serde_json::from_value::<Product>(serde_json::json!({"id": "x"})).is_err());

        let t: Ticket = serde_json::from_value(serde_json::json!({"id": 17})).unwrap();
        assert_eq!(t.id, "17");
        assert!(serde_json::from_value::<Ticket>(serde_json::json!({"id": null})).is_err());
    }

    #[test]
    fn test_created_day_is_utc() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "id": 1, "createdDate": "2024-07-20T23:30:00-01:00"
        }))
        .unwrap();
        assert_eq!(p.created_day(), NaiveDate::from_ymd_opt(2024, 7, 21));
    }

    #[test]
    fn test_format_date() {
        let ts = Utc.with_ymd_and_hms(2024, 7, 4, 23, 59, 0).unwrap();
        assert_eq!(format_date(Some(ts)), "Jul 4, 2024");
        assert_eq!(format_date(None), "-");
    }
}
