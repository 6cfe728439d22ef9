//! Response-envelope extraction.
//!
//! The backend wraps payloads inconsistently (`{"user": ...}`, `{"data": ...}`,
//! a bare array, aggregation buckets). Each endpoint lists the shapes it
//! accepts, in priority order; the first one that deserializes wins.

use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::UsersApiError;
use super::model::{UserPage, UserRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Payload under a top-level key.
    Key(&'static str),
    /// The body itself is the payload.
    Bare,
}

impl Envelope {
    fn select<'a>(self, body: &'a Value) -> Option<&'a Value> {
        match self {
            Self::Key(key) => body.get(key),
            Self::Bare => Some(body),
        }
    }

    fn describe(self) -> String {
        match self {
            Self::Key(key) => format!("`{key}`"),
            Self::Bare => "bare body".to_owned(),
        }
    }
}

/// Single-user detail response.
pub const USER_DETAIL: &[Envelope] = &[
    Envelope::Key("user"),
    Envelope::Key("result"),
    Envelope::Key("data"),
];

/// Plan catalogue response.
pub const PLAN_LIST: &[Envelope] = &[
    Envelope::Key("plans"),
    Envelope::Key("data"),
    Envelope::Key("result"),
    Envelope::Bare,
];

/// Try each envelope in order; error when none matches.
pub fn extract<T: DeserializeOwned>(
    body: &Value,
    envelopes: &[Envelope],
) -> Result<T, UsersApiError> {
    for envelope in envelopes {
        let Some(candidate) = envelope.select(body).filter(|v| !v.is_null()) else {
            continue;
        };
        match T::deserialize(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => debug!("envelope {} did not match: {err}", envelope.describe()),
        }
    }

    Err(UsersApiError::UnrecognizedEnvelope {
        tried: envelopes
            .iter()
            .map(|e| e.describe())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Decode the list endpoint's aggregation result:
/// `[{"data": [...], "total": [{"count": n}]}]`.
///
/// Anything unexpected degrades to an empty page. Rows that fail to decode
/// are skipped.
pub fn aggregation_page(body: &Value) -> UserPage {
    let Some(bucket) = body.as_array().and_then(|buckets| buckets.first()) else {
        warn!("user list response has no aggregation bucket; showing an empty page");
        return UserPage::default();
    };

    let (Some(rows), Some(counts)) = (
        bucket.get("data").and_then(Value::as_array),
        bucket.get("total").and_then(Value::as_array),
    ) else {
        warn!("user list bucket lacks `data` or `total` arrays; showing an empty page");
        return UserPage::default();
    };

    // `total` is an empty array when nothing matched.
    let total = match counts.first() {
        None => 0,
        Some(count) => match count.get("count").and_then(Value::as_u64) {
            Some(total) => total,
            None => {
                warn!("user list total has no numeric `count`; showing an empty page");
                return UserPage::default();
            }
        },
    };

    let records = rows
        .iter()
        .filter_map(|row| match UserRecord::deserialize(row) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping malformed user row: {err}");
                None
            }
        })
        .collect();

    UserPage { records, total }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::users::model::Plan;

    #[test]
    fn user_key_wins_over_later_envelopes() {
        let body = json!({
            "user": { "id": "from-user" },
            "data": { "id": "from-data" }
        });
        let record: UserRecord = extract(&body, USER_DETAIL).unwrap();
        assert_eq!(record.id, "from-user");
    }

    #[test]
    fn falls_through_to_data_key() {
        let body = json!({ "data": { "_id": "u7" } });
        let record: UserRecord = extract(&body, USER_DETAIL).unwrap();
        assert_eq!(record.id, "u7");
    }

    #[test]
    fn null_and_mismatched_candidates_are_skipped() {
        let body = json!({ "user": null, "result": "nope", "data": { "id": "u8" } });
        let record: UserRecord = extract(&body, USER_DETAIL).unwrap();
        assert_eq!(record.id, "u8");
    }

    #[test]
    fn no_match_is_an_explicit_error() {
        let body = json!({ "payload": { "id": "u9" } });
        let err = extract::<UserRecord>(&body, USER_DETAIL).unwrap_err();
        assert!(matches!(err, UsersApiError::UnrecognizedEnvelope { .. }));
        assert!(err.to_string().contains("`user`"));
    }

    #[test]
    fn plans_accept_bare_array() {
        let body = json!([{ "_id": "p1", "name": "Gold" }]);
        let plans: Vec<Plan> = extract(&body, PLAN_LIST).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].name, "Gold");
    }

    #[test]
    fn plans_prefer_plans_key() {
        let body = json!({
            "plans": [{ "id": "p1", "name": "Gold" }],
            "data": [{ "id": "p2", "name": "Silver" }]
        });
        let plans: Vec<Plan> = extract(&body, PLAN_LIST).unwrap();
        assert_eq!(plans[0].id, "p1");
    }

    #[test]
    fn aggregation_page_reads_rows_and_count() {
        let body = json!([{
            "data": [{ "id": "a" }, { "id": "b" }],
            "total": [{ "count": 42 }]
        }]);
        let page = aggregation_page(&body);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total, 42);
    }

    #[test]
    fn aggregation_page_degrades_to_empty() {
        assert_eq!(aggregation_page(&json!([])), UserPage::default());
        assert_eq!(aggregation_page(&json!({ "users": [] })), UserPage::default());
    }

    #[test]
    fn aggregation_page_skips_malformed_rows() {
        let body = json!([{
            "data": [{ "id": "a" }, { "name": "no id" }],
            "total": [{ "count": 2 }]
        }]);
        let page = aggregation_page(&body);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn aggregation_page_without_total_is_empty() {
        let rows = json!([{ "id": "a" }, { "id": "b" }]);
        assert_eq!(
            aggregation_page(&json!([{ "data": rows.clone() }])),
            UserPage::default()
        );
        assert_eq!(
            aggregation_page(&json!([{ "data": rows.clone(), "total": 2 }])),
            UserPage::default()
        );
        assert_eq!(
            aggregation_page(&json!([{ "data": rows, "total": [{ "n": 2 }] }])),
            UserPage::default()
        );
        assert_eq!(
            aggregation_page(&json!([{ "total": [{ "count": 2 }] }])),
            UserPage::default()
        );
    }

    #[test]
    fn empty_total_means_nothing_matched() {
        let page = aggregation_page(&json!([{ "data": [], "total": [] }]));
        assert_eq!(page, UserPage::default());
    }
}
