// 🔍 Directory Search Client
// Wraps a `PeopleDirectory` with the name-search fallback and the
// rate-limit retry policy. Every call to the service goes through `call`.

use anyhow::Context;
use tracing::debug;

use super::http::PlanningCenterClient;
use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use super::{FieldDatum, GivenNameField, OptionMap, PeopleDirectory, Person, WriteOutcome};
use crate::config::Config;
use crate::error::DirectoryError;
use crate::names::CandidateName;

pub struct DirectoryClient {
    directory: Box<dyn PeopleDirectory>,
    retry: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    strategies: Vec<GivenNameField>,
}

impl DirectoryClient {
    /// Client with the default strategies and a real sleeping retry loop
    pub fn new(directory: Box<dyn PeopleDirectory>, retry: RetryPolicy) -> Self {
        DirectoryClient {
            directory,
            retry,
            sleeper: Box::new(ThreadSleeper),
            strategies: GivenNameField::FALLBACK_ORDER.to_vec(),
        }
    }

    /// Client talking to the configured Planning Center account
    pub fn connect(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let directory = PlanningCenterClient::new(&config.api_base, config.credentials.clone())
            .context("Failed to create directory client")?;
        Ok(DirectoryClient::new(Box::new(directory), config.retry.clone()))
    }

    /// Builder pattern: replace how the retry loop waits
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Builder pattern: replace the given-name search order
    pub fn with_strategies(mut self, strategies: Vec<GivenNameField>) -> Self {
        self.strategies = strategies;
        self
    }

    fn call<T, F>(&self, op: F) -> Result<T, DirectoryError>
    where
        F: FnMut() -> Result<T, DirectoryError>,
    {
        self.retry.run(self.sleeper.as_ref(), op)
    }

    /// Find people matching a candidate name.
    ///
    /// Strategies are tried in order, each combined with an exact last-name
    /// filter. The first non-empty result wins; if every strategy comes back
    /// empty, the last (empty) result is the answer.
    pub fn search_by_name(&self, candidate: &CandidateName) -> Result<Vec<Person>, DirectoryError> {
        let mut matches = Vec::new();

        for field in &self.strategies {
            matches = self.call(|| {
                self.directory
                    .search_people(*field, &candidate.first, &candidate.last)
            })?;

            debug!(
                "Search {} by {}: {} match(es)",
                candidate,
                field.attribute(),
                matches.len()
            );

            if !matches.is_empty() {
                break;
            }
        }

        Ok(matches)
    }

    /// Look up one person by id
    pub fn get_person(&self, person_id: &str) -> Result<Person, DirectoryError> {
        self.call(|| self.directory.get_person(person_id))
    }

    /// Write one field value. A value that is already recorded comes back as
    /// `WriteOutcome::AlreadyExists`, not as an error.
    pub fn write_field(
        &self,
        person_id: &str,
        field_definition_id: &str,
        value: &str,
    ) -> Result<WriteOutcome, DirectoryError> {
        let datum = FieldDatum::new(field_definition_id, value);
        self.call(|| self.directory.create_field_datum(person_id, &datum))
    }

    /// Option labels for a choice-type field definition
    pub fn field_options(&self, field_definition_id: &str) -> Result<OptionMap, DirectoryError> {
        self.call(|| self.directory.field_options(field_definition_id))
    }
}
