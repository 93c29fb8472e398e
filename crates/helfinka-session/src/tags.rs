//! Note tag history and suggestions

use std::sync::Arc;

use crate::KeyValueStore;

/// Storage key of the tag history
pub const NOTE_TAGS_STORAGE_KEY: &str = "helfinka_note_tags";

/// Tags offered before the user has any history of their own
pub const SEEDED_TAGS: [&str; 17] = [
    "HEADACHE",
    "NAUSEA",
    "DIZZINESS",
    "CHEST_PAIN",
    "SHORTNESS_OF_BREATH",
    "FATIGUE",
    "FEVER",
    "COUGH",
    "GI_ISSUE",
    "INSOMNIA",
    "LOW_MOOD",
    "ANXIETY",
    "STRESS",
    "ALLERGY",
    "EXERCISE",
    "DIET",
    "MEDICATION_SIDE_EFFECT",
];

/// Tags the user has attached to notes before, persisted as a JSON array
#[derive(Clone)]
pub struct NoteTagHistory {
    storage: Arc<dyn KeyValueStore>,
}

impl NoteTagHistory {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Stored tags, uppercased. Non-string elements and blanks are dropped;
    /// an unreadable record is empty.
    pub fn load(&self) -> Vec<String> {
        let raw = match self.storage.get(NOTE_TAGS_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read note tag history");
                return Vec::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed note tag history");
                return Vec::new();
            }
        };

        values
            .iter()
            .filter_map(|value| value.as_str())
            .map(canonical)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Replace the history, uppercased and de-duplicated in first-seen order
    pub fn save<S: AsRef<str>>(&self, tags: &[S]) {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags.iter().map(|tag| canonical(tag.as_ref())) {
            if !tag.is_empty() && !unique.contains(&tag) {
                unique.push(tag);
            }
        }

        let raw = match serde_json::to_string(&unique) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize note tag history");
                return;
            }
        };
        if let Err(e) = self.storage.set(NOTE_TAGS_STORAGE_KEY, &raw) {
            tracing::warn!(error = %e, "Failed to persist note tag history");
        }
    }

    /// Add the tags of a saved note to the front of the history
    pub fn record<S: AsRef<str>>(&self, tags: &[S]) {
        let mut merged: Vec<String> = tags.iter().map(|tag| tag.as_ref().to_string()).collect();
        merged.extend(self.load());
        self.save(&merged);
    }

    /// History first, then the seed list, without duplicates or tags that
    /// are already selected
    pub fn suggestions<S: AsRef<str>>(&self, selected: &[S]) -> Vec<String> {
        let selected: Vec<String> = selected.iter().map(|tag| canonical(tag.as_ref())).collect();

        let history = self.load();
        let candidates = history
            .iter()
            .map(String::as_str)
            .chain(SEEDED_TAGS.iter().copied());

        let mut result: Vec<String> = Vec::new();
        for tag in candidates.map(canonical) {
            if tag.is_empty() || selected.contains(&tag) || result.contains(&tag) {
                continue;
            }
            result.push(tag);
        }
        result
    }
}

impl std::fmt::Debug for NoteTagHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteTagHistory").finish_non_exhaustive()
    }
}

fn canonical(tag: &str) -> String {
    tag.trim().to_uppercase()
}
