// In-memory stand-ins for the directory service and the operator.
// Both hand out cheap clones sharing one state so tests can inspect what
// happened after the client or resolver has taken ownership.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use crate::directory::{
    DirectoryClient, FieldDatum, GivenNameField, OptionMap, PeopleDirectory, Person, RetryPolicy,
    Sleeper, WriteOutcome,
};
use crate::error::{DirectoryError, ResolveError};
use crate::resolver::{Disambiguator, MatchContext};

// ============================================================================
// SCRIPTED DIRECTORY
// ============================================================================

type SearchKey = (GivenNameField, String, String);

#[derive(Default)]
struct DirectoryState {
    people: HashMap<String, Person>,
    searches: HashMap<SearchKey, Vec<Person>>,
    options: HashMap<String, OptionMap>,
    failures: VecDeque<DirectoryError>,
    search_calls: Vec<SearchKey>,
    get_calls: Vec<String>,
    written: Vec<(String, FieldDatum)>,
    attempts: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedDirectory {
    state: Rc<RefCell<DirectoryState>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Person returned by `get_person`
    pub fn with_person(self, id: &str, name: &str) -> Self {
        self.state
            .borrow_mut()
            .people
            .insert(id.to_string(), Person::new(id, name));
        self
    }

    /// Result of one search; unscripted searches come back empty
    pub fn with_search(
        self,
        field: GivenNameField,
        given: &str,
        last: &str,
        people: Vec<Person>,
    ) -> Self {
        self.state
            .borrow_mut()
            .searches
            .insert((field, given.to_string(), last.to_string()), people);
        self
    }

    pub fn with_options(self, field_definition_id: &str, options: OptionMap) -> Self {
        self.state
            .borrow_mut()
            .options
            .insert(field_definition_id.to_string(), options);
        self
    }

    /// Make the next call fail with `err`; queued failures are served first
    pub fn fail_next(self, err: DirectoryError) -> Self {
        self.state.borrow_mut().failures.push_back(err);
        self
    }

    pub fn search_calls(&self) -> Vec<SearchKey> {
        self.state.borrow().search_calls.clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.state.borrow().get_calls.clone()
    }

    pub fn written(&self) -> Vec<(String, FieldDatum)> {
        self.state.borrow().written.clone()
    }

    /// Every call made, including the ones that failed
    pub fn attempts(&self) -> usize {
        self.state.borrow().attempts
    }

    fn begin_call(&self) -> Result<(), DirectoryError> {
        let mut state = self.state.borrow_mut();
        state.attempts += 1;
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl PeopleDirectory for ScriptedDirectory {
    fn search_people(
        &self,
        field: GivenNameField,
        given_value: &str,
        last_value: &str,
    ) -> Result<Vec<Person>, DirectoryError> {
        self.begin_call()?;
        let key = (field, given_value.to_string(), last_value.to_string());
        let mut state = self.state.borrow_mut();
        state.search_calls.push(key.clone());
        Ok(state.searches.get(&key).cloned().unwrap_or_default())
    }

    fn get_person(&self, id: &str) -> Result<Person, DirectoryError> {
        self.begin_call()?;
        let mut state = self.state.borrow_mut();
        state.get_calls.push(id.to_string());
        state
            .people
            .get(id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound { id: id.to_string() })
    }

    fn create_field_datum(
        &self,
        person_id: &str,
        datum: &FieldDatum,
    ) -> Result<WriteOutcome, DirectoryError> {
        self.begin_call()?;
        let mut state = self.state.borrow_mut();
        let exists = state.written.iter().any(|(id, existing)| {
            id == person_id && existing.field_definition_id == datum.field_definition_id
        });
        if exists {
            return Ok(WriteOutcome::AlreadyExists);
        }
        state.written.push((person_id.to_string(), datum.clone()));
        Ok(WriteOutcome::Created)
    }

    fn field_options(&self, field_definition_id: &str) -> Result<OptionMap, DirectoryError> {
        self.begin_call()?;
        self.state
            .borrow()
            .options
            .get(field_definition_id)
            .cloned()
            .ok_or_else(|| DirectoryError::Client {
                status: 404,
                message: format!("no field definition {}", field_definition_id),
            })
    }
}

/// Retry loop that never actually waits
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _delay: Duration) {}
}

/// Client over a scripted directory: instant retries, capped so a broken
/// test fails instead of spinning
pub fn scripted_client(directory: &ScriptedDirectory) -> DirectoryClient {
    DirectoryClient::new(
        Box::new(directory.clone()),
        RetryPolicy::new(Duration::ZERO, Some(10)),
    )
    .with_sleeper(Box::new(NoSleep))
}

// ============================================================================
// SCRIPTED OPERATOR
// ============================================================================

#[derive(Default)]
pub struct ScriptedDisambiguator {
    choices: VecDeque<usize>,
    ids: VecDeque<String>,
    pub choice_prompts: Vec<(MatchContext, Vec<Person>)>,
    pub id_prompts: Vec<MatchContext>,
}

impl ScriptedDisambiguator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choosing(mut self, index: usize) -> Self {
        self.choices.push_back(index);
        self
    }

    pub fn supplying(mut self, id: &str) -> Self {
        self.ids.push_back(id.to_string());
        self
    }

    pub fn prompts(&self) -> usize {
        self.choice_prompts.len() + self.id_prompts.len()
    }
}

impl Disambiguator for ScriptedDisambiguator {
    fn choose_match(
        &mut self,
        context: &MatchContext,
        candidates: &[Person],
    ) -> Result<usize, ResolveError> {
        self.choice_prompts
            .push((context.clone(), candidates.to_vec()));
        self.choices.pop_front().ok_or(ResolveError::InputClosed)
    }

    fn supply_person_id(&mut self, context: &MatchContext) -> Result<String, ResolveError> {
        self.id_prompts.push(context.clone());
        self.ids.pop_front().ok_or(ResolveError::InputClosed)
    }
}
