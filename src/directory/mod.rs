// People Directory - the external service that owns person identities
//
// - `PeopleDirectory`: transport-agnostic interface (one call = one request)
// - `DirectoryClient`: search fallback, retry on rate limits, idempotent writes
// - `PlanningCenterClient`: the HTTP implementation

pub mod client;
pub mod http;
pub mod retry;

pub use client::DirectoryClient;
pub use http::PlanningCenterClient;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;

use crate::error::DirectoryError;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A person as the directory knows them. Also the resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Person {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Person attribute a given name can be matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GivenNameField {
    FirstName,
    GivenName,
    Nickname,
}

impl GivenNameField {
    /// Legal first name before nickname
    pub const FALLBACK_ORDER: [GivenNameField; 3] = [
        GivenNameField::FirstName,
        GivenNameField::GivenName,
        GivenNameField::Nickname,
    ];

    /// Attribute name in the service's `where[...]` filters
    pub fn attribute(&self) -> &'static str {
        match self {
            GivenNameField::FirstName => "first_name",
            GivenNameField::GivenName => "given_name",
            GivenNameField::Nickname => "nickname",
        }
    }
}

/// Result of posting a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    /// The person already has a value for this field definition
    AlreadyExists,
}

/// Payload for creating one custom field value on a person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDatum {
    pub field_definition_id: String,
    pub value: String,
}

impl FieldDatum {
    pub fn new(field_definition_id: impl Into<String>, value: impl Into<String>) -> Self {
        FieldDatum {
            field_definition_id: field_definition_id.into(),
            value: value.into(),
        }
    }

    /// JSON:API document expected by `POST .../field_data`
    pub fn to_payload(&self) -> serde_json::Value {
        json!({
            "data": {
                "type": "FieldDatum",
                "attributes": { "value": self.value },
                "relationships": {
                    "field_definition": {
                        "data": {
                            "type": "FieldDefinition",
                            "id": self.field_definition_id,
                        }
                    }
                }
            }
        })
    }
}

/// Display label → option id for a choice-type field definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    options: HashMap<String, String>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, option_id: impl Into<String>) {
        self.options.insert(label.into(), option_id.into());
    }

    pub fn contains(&self, label: &str) -> bool {
        self.options.contains_key(label)
    }

    pub fn option_id(&self, label: &str) -> Option<&str> {
        self.options.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl<L: Into<String>, I: Into<String>> FromIterator<(L, I)> for OptionMap {
    fn from_iter<T: IntoIterator<Item = (L, I)>>(iter: T) -> Self {
        let mut map = OptionMap::new();
        for (label, id) in iter {
            map.insert(label, id);
        }
        map
    }
}

// ============================================================================
// DIRECTORY INTERFACE
// ============================================================================

/// One method per service request. No retries here - `DirectoryClient`
/// layers those on top.
pub trait PeopleDirectory {
    /// People whose `field` equals `given_value` and whose last name equals
    /// `last_value`
    fn search_people(
        &self,
        field: GivenNameField,
        given_value: &str,
        last_value: &str,
    ) -> Result<Vec<Person>, DirectoryError>;

    /// `DirectoryError::NotFound` when the id is unknown
    fn get_person(&self, id: &str) -> Result<Person, DirectoryError>;

    fn create_field_datum(
        &self,
        person_id: &str,
        datum: &FieldDatum,
    ) -> Result<WriteOutcome, DirectoryError>;

    /// Options configured for a choice-type field definition
    fn field_options(&self, field_definition_id: &str) -> Result<OptionMap, DirectoryError>;
}
