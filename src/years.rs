// 🗓️ Year Sync - interactive start/end year entry for couples
// Repeats until input closes:
//   search two people by "first last" → ask start/end year → write both
// Same search fallback as the roster extraction; no search result means the
// operator types the name again.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::info;

use crate::config::YearFields;
use crate::console::Console;
use crate::directory::{DirectoryClient, Person, WriteOutcome};
use crate::names::CandidateName;
use crate::resolver::{select, MatchOutcome};

/// People entered together share the same years
const COUPLE_SIZE: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearSyncSummary {
    pub couples: usize,
    pub written: usize,
    pub skipped_existing: usize,
}

/// Blank means "skip this field"; anything else must be a 4-digit year.
pub fn parse_year(input: &str) -> Option<Option<String>> {
    let input = input.trim();
    if input.is_empty() {
        return Some(None);
    }
    if input.len() == 4 && input.chars().all(|c| c.is_ascii_digit()) {
        return Some(Some(input.to_string()));
    }
    None
}

/// Prompt until one person is settled. `None` once input closes.
pub fn find_person<R: BufRead, W: Write>(
    client: &DirectoryClient,
    console: &mut Console<R, W>,
) -> Result<Option<Person>> {
    loop {
        let line = match console.ask_value("Enter first and last name to search")? {
            Some(line) => line,
            None => return Ok(None),
        };

        let candidate = match CandidateName::from_words(&line) {
            Some(candidate) => candidate,
            None => {
                console.say("Please enter both a first and a last name.")?;
                continue;
            }
        };

        let matches = client
            .search_by_name(&candidate)
            .with_context(|| format!("Search for {} failed", candidate))?;

        match MatchOutcome::classify(matches) {
            MatchOutcome::Unique(person) => return Ok(Some(person)),
            MatchOutcome::Multiple(candidates) => {
                let options: Vec<String> = candidates.iter().map(|p| p.to_string()).collect();
                let index = console.ask_choice(
                    "Found matching ids, please enter the index of the one you want:",
                    &options,
                )?;
                return Ok(Some(select(candidates, index)?));
            }
            MatchOutcome::Empty => {
                console.say("No search results found. Please try again.")?;
            }
        }
    }
}

/// Prompt until a valid (or blank) year is given. Outer `None` once input
/// closes.
fn ask_year<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    prompt: &str,
) -> Result<Option<Option<String>>> {
    loop {
        let line = match console.ask_value(prompt)? {
            Some(line) => line,
            None => return Ok(None),
        };
        match parse_year(&line) {
            Some(year) => return Ok(Some(year)),
            None => console.say("Years look like 2019. Leave blank to skip.")?,
        }
    }
}

fn write_year(
    client: &DirectoryClient,
    person: &Person,
    field_definition_id: &str,
    year: &str,
    summary: &mut YearSyncSummary,
) -> Result<()> {
    let outcome = client
        .write_field(&person.id, field_definition_id, year)
        .with_context(|| format!("Failed to write year for {}", person))?;
    match outcome {
        WriteOutcome::Created => summary.written += 1,
        WriteOutcome::AlreadyExists => {
            info!("Year {} already entered for {}", year, person);
            summary.skipped_existing += 1;
        }
    }
    Ok(())
}

/// One couple: two searches, two years, up to four writes.
/// `false` once input closes before the couple is complete.
pub fn sync_couple<R: BufRead, W: Write>(
    client: &DirectoryClient,
    fields: &YearFields,
    console: &mut Console<R, W>,
    summary: &mut YearSyncSummary,
) -> Result<bool> {
    let mut people = Vec::with_capacity(COUPLE_SIZE);
    while people.len() < COUPLE_SIZE {
        match find_person(client, console)? {
            Some(person) => people.push(person),
            None => return Ok(false),
        }
    }

    let start_year = match ask_year(console, "Enter start year")? {
        Some(year) => year,
        None => return Ok(false),
    };
    let end_year = match ask_year(console, "Enter end year")? {
        Some(year) => year,
        None => return Ok(false),
    };

    for person in &people {
        if let Some(year) = &start_year {
            write_year(client, person, &fields.start_year, year, summary)?;
        }
        if let Some(year) = &end_year {
            write_year(client, person, &fields.end_year, year, summary)?;
        }
        console.say(&format!("Person {} updated.", person.id))?;
    }

    summary.couples += 1;
    Ok(true)
}

/// Loop over couples until the operator closes input (Ctrl+D / Ctrl+C).
pub fn run_year_sync<R: BufRead, W: Write>(
    client: &DirectoryClient,
    fields: &YearFields,
    console: &mut Console<R, W>,
) -> Result<YearSyncSummary> {
    let mut summary = YearSyncSummary::default();
    while sync_couple(client, fields, console, &mut summary)? {}
    Ok(summary)
}
