// 📋 Roster Extraction - spreadsheet rows → resolved enrollment records
// Each row carries two column groups (one per track). For every track:
//   names cell → session header check → couple names → search → resolve
// The mentors cell rides along untouched; it is written later as free text.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::directory::DirectoryClient;
use crate::error::ResolveError;
use crate::names::extract_names;
use crate::resolver::{resolve, Disambiguator, MatchContext};
use crate::session::{SessionLabel, SessionTracker, Track};

// ============================================================================
// ENROLLMENT RECORD
// ============================================================================

/// One resolved person in one class. Serialized as a row of the
/// intermediate file; `source_name` stays in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Name as written in the spreadsheet
    #[serde(skip)]
    pub source_name: String,

    /// Name as the directory knows the person
    #[serde(rename = "name")]
    pub person_name: String,

    pub person_id: String,

    /// Empty for rows above the first session header
    pub session: Option<SessionLabel>,

    pub track: Track,

    /// Raw mentors cell, empty when the cell was blank
    pub mentors: String,
}

// ============================================================================
// COLUMN LAYOUT
// ============================================================================

/// Zero-based columns of one track's group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackColumns {
    pub names: usize,
    pub mentors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub sdoe: TrackColumns,
    pub mrmrs: TrackColumns,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            sdoe: TrackColumns { names: 1, mentors: 2 },
            mrmrs: TrackColumns { names: 6, mentors: 7 },
        }
    }
}

impl ColumnLayout {
    pub fn columns(&self, track: Track) -> TrackColumns {
        match track {
            Track::Sdoe => self.sdoe,
            Track::MrMrs => self.mrmrs,
        }
    }
}

/// Non-blank cell at `index`
fn cell(row: &StringRecord, index: usize) -> Option<&str> {
    row.get(index).filter(|value| !value.trim().is_empty())
}

// ============================================================================
// ROW PROCESSING
// ============================================================================

/// Per-track session state carried from row to row
#[derive(Debug, Clone, Default)]
pub struct RosterState {
    pub sdoe: SessionTracker,
    pub mrmrs: SessionTracker,
}

impl RosterState {
    fn take(&mut self, track: Track) -> SessionTracker {
        match track {
            Track::Sdoe => std::mem::take(&mut self.sdoe),
            Track::MrMrs => std::mem::take(&mut self.mrmrs),
        }
    }

    fn put(&mut self, track: Track, tracker: SessionTracker) {
        match track {
            Track::Sdoe => self.sdoe = tracker,
            Track::MrMrs => self.mrmrs = tracker,
        }
    }
}

/// Process one track of one row.
///
/// A blank names cell leaves the tracker alone and yields nothing. Otherwise
/// the cell may move the session forward and every name in it becomes a
/// record, resolved against the directory.
pub fn process_track(
    row: &StringRecord,
    columns: TrackColumns,
    track: Track,
    tracker: SessionTracker,
    client: &DirectoryClient,
    disambiguator: &mut dyn Disambiguator,
) -> Result<(SessionTracker, Vec<EnrollmentRecord>), ResolveError> {
    let names_cell = match cell(row, columns.names) {
        Some(text) => text,
        None => return Ok((tracker, Vec::new())),
    };
    let mentors = cell(row, columns.mentors)
        .map(str::trim)
        .unwrap_or("")
        .to_string();

    let tracker = tracker.observe(names_cell);
    let session = tracker.current().cloned();

    let mut records = Vec::new();
    for candidate in extract_names(names_cell) {
        let matches = client.search_by_name(&candidate)?;
        let context = MatchContext::new(candidate.clone()).in_class(session.clone(), track);
        let person = resolve(client, matches, &context, disambiguator)?;

        debug!("{} → {}", context, person);

        records.push(EnrollmentRecord {
            source_name: candidate.to_string(),
            person_name: person.name,
            person_id: person.id,
            session: session.clone(),
            track,
            mentors: mentors.clone(),
        });
    }

    Ok((tracker, records))
}

/// Walk every row in order, track A then track B, collecting records.
pub fn extract_roster<I>(
    rows: I,
    layout: &ColumnLayout,
    client: &DirectoryClient,
    disambiguator: &mut dyn Disambiguator,
) -> Result<Vec<EnrollmentRecord>>
where
    I: IntoIterator<Item = StringRecord>,
{
    let mut state = RosterState::default();
    let mut output = Vec::new();

    for (line, row) in rows.into_iter().enumerate() {
        for track in Track::ALL {
            let tracker = state.take(track);
            let (tracker, records) = process_track(
                &row,
                layout.columns(track),
                track,
                tracker,
                client,
                disambiguator,
            )
            .with_context(|| format!("Failed to process {} on spreadsheet line {}", track, line + 1))?;

            state.put(track, tracker);
            output.extend(records);
        }
    }

    info!("Extracted {} enrollment records", output.len());
    Ok(output)
}

/// Records per track, for the end-of-run summary
pub fn count_by_track(records: &[EnrollmentRecord]) -> Vec<(Track, usize)> {
    Track::ALL
        .iter()
        .map(|track| {
            let count = records.iter().filter(|r| r.track == *track).count();
            (*track, count)
        })
        .collect()
}

// ============================================================================
// FILE I/O
// ============================================================================

/// Raw spreadsheet export: no header row, ragged rows allowed
pub fn read_spreadsheet(path: &Path) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open spreadsheet: {}", path.display()))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 1, path.display())
        })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Column order of the intermediate file
pub const RECORD_HEADER: [&str; 5] = ["name", "person_id", "session", "track", "mentors"];

/// Write the intermediate file, header row included even when empty
pub fn write_records(path: &Path, records: &[EnrollmentRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    writer
        .write_record(RECORD_HEADER)
        .context("Failed to write header row")?;

    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write record for {}", record.person_name))?;
    }
    writer.flush().context("Failed to flush output file")?;

    Ok(())
}

/// Read back the intermediate file written by `write_records`
pub fn load_records(path: &Path) -> Result<Vec<EnrollmentRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open records file: {}", path.display()))?;

    let mut records = Vec::new();
    for (line_num, result) in reader.deserialize().enumerate() {
        let record: EnrollmentRecord = result.with_context(|| {
            format!("Failed to read record on line {} of {}", line_num + 2, path.display())
        })?;
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
