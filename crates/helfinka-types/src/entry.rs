//! Health entry types
//!
//! An entry is one recorded observation. Its payload shape is fixed by its
//! [`EntryType`]; [`EntryData`] carries exactly one payload variant so a
//! blood pressure reading can never be paired with a note payload.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// Closed set of entry types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    /// Blood pressure and heart rate
    Bp,
    /// Body weight
    Weight,
    /// Medication prescribed or stopped
    Med,
    /// Free-text note with tags
    Note,
}

impl EntryType {
    /// All entry types, in display order
    pub const ALL: [EntryType; 4] = [Self::Bp, Self::Weight, Self::Med, Self::Note];

    /// Wire tag for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bp => "BP",
            Self::Weight => "WEIGHT",
            Self::Med => "MED",
            Self::Note => "NOTE",
        }
    }

    /// Parse a wire tag. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            ValidationError::new("type", format!("unknown entry type '{s}'"))
        })
    }
}

// Length limits (in characters, after trimming)
pub const MAX_BP_CONTEXT_LEN: usize = 200;
pub const MAX_MED_NAME_LEN: usize = 200;
pub const MAX_MED_DOSAGE_LEN: usize = 100;
pub const MAX_MED_FREQUENCY_LEN: usize = 200;

/// Blood pressure reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BpData {
    #[serde(deserialize_with = "integral")]
    pub systolic: i32,
    #[serde(deserialize_with = "integral")]
    pub diastolic: i32,
    #[serde(deserialize_with = "integral")]
    pub heart_rate: i32,
    /// Optional free-text context ("after run", "morning")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl BpData {
    /// Check ranges and trim the context
    pub fn validate(self) -> Result<Self, ValidationError> {
        check_range("systolic", self.systolic, 40, 300)?;
        check_range("diastolic", self.diastolic, 20, 200)?;
        check_range("heartRate", self.heart_rate, 20, 250)?;

        let context = match self.context {
            Some(context) => {
                let trimmed = context.trim().to_string();
                check_max_len("context", &trimmed, MAX_BP_CONTEXT_LEN)?;
                Some(trimmed)
            }
            None => None,
        };

        Ok(Self {
            systolic: self.systolic,
            diastolic: self.diastolic,
            heart_rate: self.heart_rate,
            context,
        })
    }
}

/// Weight unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kg => write!(f, "kg"),
            Self::Lb => write!(f, "lb"),
        }
    }
}

impl std::str::FromStr for WeightUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(Self::Kg),
            "lb" => Ok(Self::Lb),
            _ => Err(ValidationError::new("unit", "must be kg or lb")),
        }
    }
}

/// Body weight measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightData {
    pub value: f64,
    /// Defaults to kilograms when the stored payload omits it
    #[serde(default)]
    pub unit: WeightUnit,
}

impl WeightData {
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !self.value.is_finite() || !(0.0..=1000.0).contains(&self.value) {
            return Err(ValidationError::out_of_range("value", 0, 1000));
        }
        Ok(self)
    }
}

/// Whether a medication was started or stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MedAction {
    Prescribed,
    Stopped,
}

impl std::fmt::Display for MedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prescribed => write!(f, "PRESCRIBED"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl std::str::FromStr for MedAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRESCRIBED" => Ok(Self::Prescribed),
            "STOPPED" => Ok(Self::Stopped),
            _ => Err(ValidationError::new("action", "must be PRESCRIBED or STOPPED")),
        }
    }
}

/// Medication change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedData {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub action: MedAction,
}

impl MedData {
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", &self.name, MAX_MED_NAME_LEN)?,
            dosage: required_text("dosage", &self.dosage, MAX_MED_DOSAGE_LEN)?,
            frequency: required_text("frequency", &self.frequency, MAX_MED_FREQUENCY_LEN)?,
            action: self.action,
        })
    }
}

/// Free-text note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteData {
    pub fn validate(self) -> Result<Self, ValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::required("text"));
        }

        let tags = self
            .tags
            .iter()
            .map(|tag| {
                let tag = tag.trim();
                if tag.is_empty() {
                    Err(ValidationError::new("tags", "tags must not be empty"))
                } else {
                    Ok(tag.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            text: text.to_string(),
            tags,
        })
    }
}

/// Payload of an entry, one variant per [`EntryType`].
///
/// Serializes as the bare payload object, which is what the `data` field
/// of a stored item and of a create request contain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryData {
    Bp(BpData),
    Weight(WeightData),
    Med(MedData),
    Note(NoteData),
}

impl EntryData {
    /// The type this payload belongs to
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::Bp(_) => EntryType::Bp,
            Self::Weight(_) => EntryType::Weight,
            Self::Med(_) => EntryType::Med,
            Self::Note(_) => EntryType::Note,
        }
    }

    /// Validate the payload, applying trimming and defaults
    pub fn validate(self) -> Result<Self, ValidationError> {
        Ok(match self {
            Self::Bp(data) => Self::Bp(data.validate()?),
            Self::Weight(data) => Self::Weight(data.validate()?),
            Self::Med(data) => Self::Med(data.validate()?),
            Self::Note(data) => Self::Note(data.validate()?),
        })
    }

    /// Parse and validate an untyped payload against the schema of `entry_type`
    pub fn from_value(entry_type: EntryType, value: &Value) -> Result<Self, ValidationError> {
        let data = match entry_type {
            EntryType::Bp => Self::Bp(parse_payload(value)?),
            EntryType::Weight => Self::Weight(parse_payload(value)?),
            EntryType::Med => Self::Med(parse_payload(value)?),
            EntryType::Note => Self::Note(parse_payload(value)?),
        };
        data.validate()
    }
}

impl From<BpData> for EntryData {
    fn from(data: BpData) -> Self {
        Self::Bp(data)
    }
}

impl From<WeightData> for EntryData {
    fn from(data: WeightData) -> Self {
        Self::Weight(data)
    }
}

impl From<MedData> for EntryData {
    fn from(data: MedData) -> Self {
        Self::Med(data)
    }
}

impl From<NoteData> for EntryData {
    fn from(data: NoteData) -> Self {
        Self::Note(data)
    }
}

/// A decoded health entry.
///
/// Only ever produced by decoding a stored item; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthEntry {
    /// Partition key, round-tripped untouched
    pub pk: String,
    /// Sort key exactly as stored
    pub sk: String,
    /// ISO-8601 UTC timestamp taken from the sort key
    pub timestamp: String,
    /// Typed payload
    pub data: EntryData,
}

impl HealthEntry {
    /// Entry type, as decoded from the sort key
    pub fn entry_type(&self) -> EntryType {
        self.data.entry_type()
    }

    /// Parsed timestamp, if the sort key carried a valid RFC 3339 instant
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| ValidationError::new("data", e.to_string()))
}

fn check_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::out_of_range(field, min, max))
    }
}

fn check_max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }
    Ok(())
}

fn required_text(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    check_max_len(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Accept JSON integers and integral floats (`120.0`), reject everything else
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(D::Error::custom(format!("expected an integer, got {value}")));
    }
    Ok(value as i32)
}
