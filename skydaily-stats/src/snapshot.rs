//! The fetched statistics document.
//!
//! Only `total_users`, `total_likes` and `last_update_time` are interpreted;
//! every other field is kept verbatim so the archive holds exactly what the
//! endpoint returned.
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const USERS_FIELD: &str = "total_users";
pub const LIKES_FIELD: &str = "total_likes";
pub const UPDATED_FIELD: &str = "last_update_time";

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("stats document is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a whole number: {value}")]
    NotACount { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    document: Map<String, Value>,
    users: i64,
    likes: i64,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Validate a raw document.
    ///
    /// The capture time is the document's own `last_update_time` when it
    /// parses; otherwise `fallback` (the fetch time, or the entry file's
    /// modification time when re-reading an archive).
    pub fn from_document(document: Value, fallback: DateTime<Utc>) -> Result<Self, SnapshotError> {
        let Value::Object(document) = document else {
            return Err(SnapshotError::NotAnObject);
        };
        let users = read_count(&document, USERS_FIELD)?;
        let likes = read_count(&document, LIKES_FIELD)?;
        let captured_at = document
            .get(UPDATED_FIELD)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(fallback);

        Ok(Self {
            document,
            users,
            likes,
            captured_at,
        })
    }

    /// Build a minimal snapshot carrying only the interpreted fields.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use skydaily_stats::Snapshot;
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap();
    /// let snap = Snapshot::new(110, 530, at);
    /// assert_eq!(snap.users(), 110);
    /// assert_eq!(snap.document()["last_update_time"], "2024-11-20T12:00:00Z");
    /// ```
    pub fn new(users: i64, likes: i64, captured_at: DateTime<Utc>) -> Self {
        let mut document = Map::new();
        document.insert(USERS_FIELD.into(), Value::Number(Number::from(users)));
        document.insert(LIKES_FIELD.into(), Value::Number(Number::from(likes)));
        document.insert(
            UPDATED_FIELD.into(),
            Value::String(captured_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        Self {
            document,
            users,
            likes,
            captured_at,
        }
    }

    pub fn users(&self) -> i64 {
        self.users
    }

    pub fn likes(&self) -> i64 {
        self.likes
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Pretty JSON plus a trailing newline. `Map` iterates in key order at
    /// every level, so consecutive entries diff cleanly.
    pub fn to_archive_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(&self.document)?;
        out.push('\n');
        Ok(out)
    }
}

fn read_count(document: &Map<String, Value>, field: &'static str) -> Result<i64, SnapshotError> {
    let value = document
        .get(field)
        .ok_or(SnapshotError::MissingField(field))?;
    let not_a_count = || SnapshotError::NotACount {
        field,
        value: value.to_string(),
    };
    let Value::Number(n) = value else {
        return Err(not_a_count());
    };
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(not_a_count()),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less timestamps are taken as UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 20, 0, 0, 0).unwrap()
    }

    #[test]
    fn reads_counters_and_source_timestamp() {
        let snap = Snapshot::from_document(
            json!({
                "total_users": 21_000_000,
                "total_posts": 900_000_000,
                "total_likes": 3_000_000_000u64,
                "users_growth_rate_per_second": 3.2,
                "last_update_time": "2024-11-20T12:34:56.789Z",
            }),
            fallback(),
        )
        .unwrap();

        assert_eq!(snap.users(), 21_000_000);
        assert_eq!(snap.likes(), 3_000_000_000);
        assert_eq!(
            snap.captured_at(),
            Utc.with_ymd_and_hms(2024, 11, 20, 12, 34, 56).unwrap()
                + chrono::Duration::milliseconds(789)
        );
        assert_eq!(snap.document()["total_posts"], 900_000_000);
    }

    #[test]
    fn whole_floats_count_but_fractions_do_not() {
        let snap =
            Snapshot::from_document(json!({"total_users": 10.0, "total_likes": 4}), fallback())
                .unwrap();
        assert_eq!(snap.users(), 10);

        let err = Snapshot::from_document(json!({"total_users": 10.5, "total_likes": 4}), fallback())
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NotACount { field: USERS_FIELD, .. }));
    }

    #[test]
    fn rejects_missing_and_non_numeric_fields() {
        assert_eq!(
            Snapshot::from_document(json!({"total_users": 1}), fallback()).unwrap_err(),
            SnapshotError::MissingField(LIKES_FIELD)
        );
        assert!(matches!(
            Snapshot::from_document(json!({"total_users": "1", "total_likes": 2}), fallback()),
            Err(SnapshotError::NotACount { .. })
        ));
        assert_eq!(
            Snapshot::from_document(json!([1, 2]), fallback()).unwrap_err(),
            SnapshotError::NotAnObject
        );
    }

    #[test]
    fn unparseable_timestamp_uses_fallback() {
        let snap = Snapshot::from_document(
            json!({"total_users": 1, "total_likes": 2, "last_update_time": "yesterday"}),
            fallback(),
        )
        .unwrap();
        assert_eq!(snap.captured_at(), fallback());

        let naive = Snapshot::from_document(
            json!({"total_users": 1, "total_likes": 2, "last_update_time": "2024-11-20T06:00:00"}),
            fallback(),
        )
        .unwrap();
        assert_eq!(
            naive.captured_at(),
            Utc.with_ymd_and_hms(2024, 11, 20, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn archive_json_sorts_keys_and_ends_with_newline() {
        let snap = Snapshot::from_document(
            json!({"total_users": 1, "b": {"z": 1, "a": 2}, "total_likes": 2}),
            fallback(),
        )
        .unwrap();
        let out = snap.to_archive_json().unwrap();
        assert!(out.ends_with("}\n"));
        let b = out.find("\"b\"").unwrap();
        let users = out.find("\"total_users\"").unwrap();
        let likes = out.find("\"total_likes\"").unwrap();
        assert!(b < likes && likes < users);
        assert!(out.find("\"a\"").unwrap() < out.find("\"z\"").unwrap());
        assert!(out.contains("\n  \"b\": {"));
    }
}
