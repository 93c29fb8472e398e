//! Stored item codec
//!
//! The service stores each entry as a schemaless item:
//!
//! ```text
//! { "PK": "<owner>", "SK": "HELF#<ISO timestamp>#<TYPE>", "Type": "<TYPE>", "Data": { ... } }
//! ```
//!
//! Decoding turns such an item into a [`HealthEntry`] or a [`DecodeSkip`].
//! List endpoints use [`decode_batch`], which drops skipped items so one
//! corrupt record never hides the rest.
//!
//! The payload schema is chosen by the type tag embedded in the sort key.
//! The top-level `Type` must be a known tag but is not compared with it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{CreateEntryRequest, EntryData, EntryType, HealthEntry, ValidationError};

/// Prefix carried by the first sort key segment
pub const SORT_KEY_PREFIX: &str = "HELF";

/// Sort key segment delimiter
pub const SORT_KEY_DELIMITER: char = '#';

/// Why a stored item was left out of the decoded results
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeSkip {
    #[error("item is not an object")]
    NotAnObject,

    #[error("missing or non-string PK")]
    MissingPartitionKey,

    #[error("missing or non-string SK")]
    MissingSortKey,

    #[error("Type is missing or not a known entry type")]
    InvalidType,

    #[error("Data is missing")]
    MissingData,

    #[error("malformed sort key '{0}'")]
    MalformedSortKey(String),

    #[error("{entry_type} payload rejected: {source}")]
    InvalidPayload {
        entry_type: EntryType,
        #[source]
        source: ValidationError,
    },
}

/// Timestamp and type decoded from a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<'a> {
    pub timestamp: &'a str,
    pub entry_type: EntryType,
}

/// Split a sort key into its timestamp and type tag.
///
/// Requires at least three segments, a first segment starting with
/// [`SORT_KEY_PREFIX`], a non-empty timestamp and a known type tag.
/// Segments past the third are ignored.
pub fn parse_sort_key(sk: &str) -> Option<SortKey<'_>> {
    let mut parts = sk.split(SORT_KEY_DELIMITER);
    let prefix = parts.next()?;
    let timestamp = parts.next()?;
    let tag = parts.next()?;

    if !prefix.starts_with(SORT_KEY_PREFIX) || timestamp.is_empty() || tag.is_empty() {
        return None;
    }

    Some(SortKey {
        timestamp,
        entry_type: EntryType::from_tag(tag)?,
    })
}

/// Build a sort key the way the service does
pub fn build_sort_key(timestamp: &str, entry_type: EntryType) -> String {
    format!("{SORT_KEY_PREFIX}{SORT_KEY_DELIMITER}{timestamp}{SORT_KEY_DELIMITER}{entry_type}")
}

/// Decode one stored item
pub fn decode_entry(raw: &Value) -> Result<HealthEntry, DecodeSkip> {
    let item = raw.as_object().ok_or(DecodeSkip::NotAnObject)?;

    let pk = item
        .get("PK")
        .and_then(Value::as_str)
        .ok_or(DecodeSkip::MissingPartitionKey)?;
    let sk = item
        .get("SK")
        .and_then(Value::as_str)
        .ok_or(DecodeSkip::MissingSortKey)?;
    let declared = item
        .get("Type")
        .and_then(Value::as_str)
        .and_then(EntryType::from_tag)
        .ok_or(DecodeSkip::InvalidType)?;
    let payload = item.get("Data").ok_or(DecodeSkip::MissingData)?;

    let key = parse_sort_key(sk).ok_or_else(|| DecodeSkip::MalformedSortKey(sk.to_string()))?;

    if declared != key.entry_type {
        tracing::debug!(
            sk,
            declared = %declared,
            "Type disagrees with sort key, using sort key"
        );
    }

    let data = EntryData::from_value(key.entry_type, payload).map_err(|source| {
        DecodeSkip::InvalidPayload {
            entry_type: key.entry_type,
            source,
        }
    })?;

    Ok(HealthEntry {
        pk: pk.to_string(),
        sk: sk.to_string(),
        timestamp: key.timestamp.to_string(),
        data,
    })
}

/// Decode a list of stored items, keeping input order and dropping items
/// that fail to decode
pub fn decode_batch<'a, I>(items: I) -> Vec<HealthEntry>
where
    I: IntoIterator<Item = &'a Value>,
{
    items
        .into_iter()
        .filter_map(|raw| match decode_entry(raw) {
            Ok(entry) => Some(entry),
            Err(skip) => {
                tracing::debug!(reason = %skip, "Skipping stored item");
                None
            }
        })
        .collect()
}

/// Validate a payload and build the body of a create request.
///
/// The service derives the sort key from `timestamp` and `type`.
pub fn encode_create_request(
    data: EntryData,
    timestamp: DateTime<Utc>,
) -> Result<CreateEntryRequest, ValidationError> {
    let data = data.validate()?;

    Ok(CreateEntryRequest {
        timestamp: format_timestamp(timestamp),
        entry_type: data.entry_type(),
        data,
    })
}

/// Render an instant as ISO-8601 UTC with millisecond precision
/// (`2024-01-02T03:04:05.000Z`)
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build a stored item the way the service would persist `data` at
/// `timestamp`. Useful for fixtures and for replaying exports.
pub fn stored_item(pk: &str, timestamp: &str, data: &EntryData) -> Value {
    let entry_type = data.entry_type();
    json!({
        "PK": pk,
        "SK": build_sort_key(timestamp, entry_type),
        "Type": entry_type,
        "Data": data,
    })
}
