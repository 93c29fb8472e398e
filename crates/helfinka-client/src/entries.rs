//! Entries API
//!
//! Listing decodes leniently: malformed stored items are dropped from the
//! result and counted, never surfaced as errors.

use chrono::{DateTime, Utc};
use helfinka_types::{
    decode_batch, encode_create_request, DateRange, DeleteEntryQuery, EntriesResponse, EntryData,
    EntryType, HealthEntry,
};
use reqwest::Method;
use tracing::instrument;

use crate::metrics::{record_decode_skips, Api};
use crate::{HttpClient, Result};

/// Client for the diary endpoints
#[derive(Debug, Clone)]
pub struct EntriesApi {
    client: HttpClient,
}

impl EntriesApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// All entries recorded within `range`, in service order
    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, range: &DateRange) -> Result<Vec<HealthEntry>> {
        let builder = self
            .client
            .request(Method::GET, self.client.config().entries_url("/entries"))
            .query(&range.query());

        let response: EntriesResponse = self
            .client
            .fetch_json(Api::Entries, "list_entries", builder)
            .await?;
        Ok(decode_items("list_entries", &response))
    }

    /// Entries of one type within `range`
    #[instrument(skip(self), level = "debug")]
    pub async fn list_by_type(
        &self,
        entry_type: EntryType,
        range: &DateRange,
    ) -> Result<Vec<HealthEntry>> {
        let path = format!("/stats/{}", entry_type.as_str());
        let builder = self
            .client
            .request(Method::GET, self.client.config().entries_url(&path))
            .query(&range.query());

        let response: EntriesResponse = self
            .client
            .fetch_json(Api::Entries, "list_by_type", builder)
            .await?;
        Ok(decode_items("list_by_type", &response))
    }

    /// Record a new entry observed at `timestamp`.
    ///
    /// The payload is validated first; an invalid payload never reaches the
    /// network.
    #[instrument(skip(self, data), fields(entry_type = %data.entry_type()), level = "debug")]
    pub async fn create(&self, data: EntryData, timestamp: DateTime<Utc>) -> Result<()> {
        let body = encode_create_request(data, timestamp)?;
        let builder = self
            .client
            .request(Method::POST, self.client.config().entries_url("/entries"))
            .json(&body);

        self.client
            .fetch_empty(Api::Entries, "create_entry", builder)
            .await
    }

    /// Delete the entry identified by its timestamp and type
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, timestamp: &str, entry_type: EntryType) -> Result<()> {
        let query = DeleteEntryQuery {
            timestamp: timestamp.to_string(),
            entry_type,
        };
        let builder = self
            .client
            .request(Method::DELETE, self.client.config().entries_url("/entries"))
            .query(&query);

        self.client
            .fetch_empty(Api::Entries, "delete_entry", builder)
            .await
    }

    /// Delete a previously listed entry
    pub async fn delete_entry(&self, entry: &HealthEntry) -> Result<()> {
        self.delete(&entry.timestamp, entry.entry_type()).await
    }
}

fn decode_items(operation: &'static str, response: &EntriesResponse) -> Vec<HealthEntry> {
    let entries = decode_batch(&response.items);
    let skipped = response.items.len() - entries.len();
    if skipped > 0 {
        tracing::debug!(operation, skipped, "Dropped undecodable items");
    }
    record_decode_skips(operation, skipped);
    entries
}
