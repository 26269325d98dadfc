// 🌐 Planning Center People - HTTP implementation of `PeopleDirectory`
// JSON:API over HTTPS with basic auth (application id + secret).

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::{FieldDatum, GivenNameField, OptionMap, PeopleDirectory, Person, WriteOutcome};
use crate::config::Credentials;
use crate::error::DirectoryError;

const USER_AGENT: &str = concat!("enrollment-sync/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// JSON:API DOCUMENTS
// ============================================================================

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
    #[serde(default)]
    included: Vec<IncludedResource>,
}

#[derive(Debug, Deserialize)]
struct PersonResource {
    id: String,
    attributes: PersonAttributes,
}

#[derive(Debug, Deserialize)]
struct PersonAttributes {
    #[serde(default)]
    name: String,
}

impl From<PersonResource> for Person {
    fn from(resource: PersonResource) -> Self {
        Person::new(resource.id, resource.attributes.name)
    }
}

#[derive(Debug, Deserialize)]
struct IncludedResource {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    attributes: serde_json::Value,
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct PlanningCenterClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl PlanningCenterClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self, DirectoryError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(PlanningCenterClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/people/v2/{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response = request
            .basic_auth(
                &self.credentials.application_id,
                Some(&self.credentials.secret),
            )
            .send()?;
        Ok(response)
    }

    /// Turn a non-success answer into the matching error
    fn failure(response: Response) -> DirectoryError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .unwrap_or_else(|_| "unable to read response body".to_string());
        DirectoryError::from_status(status, body)
    }
}

/// Query string for a name search
pub(crate) fn search_query(
    field: GivenNameField,
    given_value: &str,
    last_value: &str,
) -> Vec<(String, String)> {
    vec![
        (
            format!("where[{}]", field.attribute()),
            given_value.to_string(),
        ),
        ("where[last_name]".to_string(), last_value.to_string()),
    ]
}

/// Option label → id from a field definition fetched with
/// `include=field_options`
fn options_from_included(included: Vec<IncludedResource>) -> OptionMap {
    included
        .into_iter()
        .filter(|resource| resource.kind == "FieldOption")
        .filter_map(|resource| {
            let label = resource.attributes.get("value")?.as_str()?.to_string();
            Some((label, resource.id))
        })
        .collect()
}

/// Outcome of a field-data POST decided by status alone. `None` means the
/// body is needed to build the error.
fn write_outcome(
    status: StatusCode,
    person_id: &str,
) -> Option<Result<WriteOutcome, DirectoryError>> {
    match status {
        // The service answers 422 when the person already has this value
        StatusCode::UNPROCESSABLE_ENTITY => Some(Ok(WriteOutcome::AlreadyExists)),
        StatusCode::NOT_FOUND => Some(Err(DirectoryError::NotFound {
            id: person_id.to_string(),
        })),
        status if status.is_success() => Some(Ok(WriteOutcome::Created)),
        _ => None,
    }
}

impl PeopleDirectory for PlanningCenterClient {
    fn search_people(
        &self,
        field: GivenNameField,
        given_value: &str,
        last_value: &str,
    ) -> Result<Vec<Person>, DirectoryError> {
        let request = self
            .http
            .get(self.url("people"))
            .query(&search_query(field, given_value, last_value));
        let response = self.send(request)?;

        if !response.status().is_success() {
            return Err(Self::failure(response));
        }

        let document: Document<Vec<PersonResource>> = response.json()?;
        Ok(document.data.into_iter().map(Person::from).collect())
    }

    fn get_person(&self, id: &str) -> Result<Person, DirectoryError> {
        let request = self.http.get(self.url(&format!("people/{}", id)));
        let response = self.send(request)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound { id: id.to_string() });
        }
        if !response.status().is_success() {
            return Err(Self::failure(response));
        }

        let document: Document<PersonResource> = response.json()?;
        Ok(document.data.into())
    }

    fn create_field_datum(
        &self,
        person_id: &str,
        datum: &FieldDatum,
    ) -> Result<WriteOutcome, DirectoryError> {
        let request = self
            .http
            .post(self.url(&format!("people/{}/field_data", person_id)))
            .json(&datum.to_payload());
        let response = self.send(request)?;

        match write_outcome(response.status(), person_id) {
            Some(outcome) => outcome,
            None => Err(Self::failure(response)),
        }
    }

    fn field_options(&self, field_definition_id: &str) -> Result<OptionMap, DirectoryError> {
        let request = self
            .http
            .get(self.url(&format!("field_definitions/{}", field_definition_id)))
            .query(&[("include", "field_options")]);
        let response = self.send(request)?;

        if !response.status().is_success() {
            return Err(Self::failure(response));
        }

        let document: Document<serde_json::Value> = response.json()?;
        Ok(options_from_included(document.included))
    }
}
