// 🎯 Match Resolver - one search result set in, exactly one person out
// Decided purely on how many people the search returned:
//   1  → taken as is
//   0  → operator supplies a directory id, which is fetched
//   N  → operator picks one of the N by index
// There is no scoring or nickname weighting; ambiguous cases go to a human.

use std::fmt;
use tracing::info;

use crate::directory::{DirectoryClient, Person};
use crate::error::ResolveError;
use crate::names::CandidateName;
use crate::session::{SessionLabel, Track};

// ============================================================================
// CONTEXT & OPERATOR INTERFACE
// ============================================================================

/// What the operator is shown when asked to help. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    pub candidate: CandidateName,
    pub session: Option<SessionLabel>,
    pub track: Option<Track>,
}

impl MatchContext {
    pub fn new(candidate: CandidateName) -> Self {
        MatchContext {
            candidate,
            session: None,
            track: None,
        }
    }

    /// Builder pattern: roster position the name came from
    pub fn in_class(mut self, session: Option<SessionLabel>, track: Track) -> Self {
        self.session = session;
        self.track = Some(track);
        self
    }
}

impl fmt::Display for MatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidate)?;
        match (&self.session, &self.track) {
            (Some(session), Some(track)) => write!(f, " ({} {})", session, track),
            (None, Some(track)) => write!(f, " (no session {})", track),
            _ => Ok(()),
        }
    }
}

/// A human who can settle what the search could not
pub trait Disambiguator {
    /// Zero-based index into `candidates`
    fn choose_match(
        &mut self,
        context: &MatchContext,
        candidates: &[Person],
    ) -> Result<usize, ResolveError>;

    /// Directory id of the person the search missed
    fn supply_person_id(&mut self, context: &MatchContext) -> Result<String, ResolveError>;
}

// ============================================================================
// ARITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Unique(Person),
    Empty,
    Multiple(Vec<Person>),
}

impl MatchOutcome {
    pub fn classify(mut matches: Vec<Person>) -> Self {
        match matches.len() {
            0 => MatchOutcome::Empty,
            1 => MatchOutcome::Unique(matches.remove(0)),
            _ => MatchOutcome::Multiple(matches),
        }
    }
}

/// Pick `index` out of `candidates`, rejecting anything out of range
pub fn select(mut candidates: Vec<Person>, index: usize) -> Result<Person, ResolveError> {
    if index >= candidates.len() {
        return Err(ResolveError::InvalidSelection {
            index,
            count: candidates.len(),
        });
    }
    Ok(candidates.swap_remove(index))
}

// ============================================================================
// RESOLVE
// ============================================================================

/// Reduce a search result to one person, asking the operator when needed.
pub fn resolve(
    client: &DirectoryClient,
    matches: Vec<Person>,
    context: &MatchContext,
    disambiguator: &mut dyn Disambiguator,
) -> Result<Person, ResolveError> {
    match MatchOutcome::classify(matches) {
        MatchOutcome::Unique(person) => Ok(person),

        MatchOutcome::Empty => {
            let id = disambiguator.supply_person_id(context)?;
            let person = client.get_person(id.trim())?;
            info!("Resolved {} manually to {}", context, person);
            Ok(person)
        }

        MatchOutcome::Multiple(candidates) => {
            let index = disambiguator.choose_match(context, &candidates)?;
            let person = select(candidates, index)?;
            info!("Resolved {} by selection to {}", context, person);
            Ok(person)
        }
    }
}
