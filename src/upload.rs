// 📤 Write-back - intermediate records → custom field values
// Two stages:
//   1. Pre-flight: every session and mentor label must be a known option.
//      One bad row aborts the run before anything is written.
//   2. Commit: sanity-check each person, then write mentors and session.
//      Values already on file are skipped, so a re-run picks up where an
//      interrupted one stopped.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::UploadFields;
use crate::directory::{DirectoryClient, OptionMap, WriteOutcome};
use crate::error::UploadError;
use crate::roster::EnrollmentRecord;
use crate::session::Track;

// ============================================================================
// OPTION MAPS
// ============================================================================

/// Known labels for the three choice fields
#[derive(Debug, Clone, Default)]
pub struct OptionMaps {
    pub mentors: OptionMap,
    pub sdoe_sessions: OptionMap,
    pub mrmrs_sessions: OptionMap,
}

impl OptionMaps {
    /// Fetch the options of each field definition from the directory
    pub fn load(client: &DirectoryClient, fields: &UploadFields) -> Result<Self> {
        let mentors = client
            .field_options(&fields.mentor)
            .context("Failed to load mentor options")?;
        let sdoe_sessions = client
            .field_options(&fields.sdoe_session)
            .context("Failed to load SDOE session options")?;
        let mrmrs_sessions = client
            .field_options(&fields.mrmrs_session)
            .context("Failed to load MR&MRS session options")?;

        info!(
            "Loaded {} mentor, {} SDOE session and {} MR&MRS session options",
            mentors.len(),
            sdoe_sessions.len(),
            mrmrs_sessions.len()
        );

        Ok(OptionMaps {
            mentors,
            sdoe_sessions,
            mrmrs_sessions,
        })
    }

    pub fn sessions(&self, track: Track) -> &OptionMap {
        match track {
            Track::Sdoe => &self.sdoe_sessions,
            Track::MrMrs => &self.mrmrs_sessions,
        }
    }
}

// ============================================================================
// PRE-FLIGHT
// ============================================================================

/// Check one record's labels. Blank mentors are allowed, a missing session
/// is not.
pub fn validate_record(record: &EnrollmentRecord, maps: &OptionMaps) -> Result<(), UploadError> {
    if !record.mentors.is_empty() && !maps.mentors.contains(&record.mentors) {
        return Err(UploadError::UnknownMentor {
            name: record.person_name.clone(),
            mentors: record.mentors.clone(),
        });
    }

    let session = record.session.as_ref().map(|s| s.as_str()).unwrap_or("");
    if !maps.sessions(record.track).contains(session) {
        return Err(UploadError::UnknownSession {
            name: record.person_name.clone(),
            session: session.to_string(),
        });
    }

    Ok(())
}

/// First invalid record stops validation
pub fn validate_records(records: &[EnrollmentRecord], maps: &OptionMaps) -> Result<(), UploadError> {
    records
        .iter()
        .try_for_each(|record| validate_record(record, maps))
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processed: usize,
    pub mentors_written: usize,
    pub sessions_written: usize,
    pub skipped_existing: usize,
    pub sanity_failures: usize,
}

impl UploadReport {
    fn start() -> Self {
        UploadReport {
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            mentors_written: 0,
            sessions_written: 0,
            skipped_existing: 0,
            sanity_failures: 0,
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
    }
}

// ============================================================================
// COMMIT
// ============================================================================

fn session_field<'a>(fields: &'a UploadFields, track: Track) -> &'a str {
    match track {
        Track::Sdoe => &fields.sdoe_session,
        Track::MrMrs => &fields.mrmrs_session,
    }
}

/// Validate everything, then write mentors and session for every record.
pub fn upload_records(
    client: &DirectoryClient,
    records: &[EnrollmentRecord],
    fields: &UploadFields,
    maps: &OptionMaps,
) -> Result<UploadReport> {
    validate_records(records, maps)?;

    let mut report = UploadReport::start();

    for record in records {
        let who = format!("{}, {}", record.person_name, record.person_id);

        // Sanity check only: a miss is reported, the writes still go ahead
        if let Err(err) = client.get_person(&record.person_id) {
            warn!("Sanity check failed. Couldn't find {}: {}", who, err);
            report.sanity_failures += 1;
        }

        if !record.mentors.is_empty() {
            let outcome = client
                .write_field(&record.person_id, &fields.mentor, &record.mentors)
                .with_context(|| format!("Failed to write mentors for {}", who))?;
            match outcome {
                WriteOutcome::Created => report.mentors_written += 1,
                WriteOutcome::AlreadyExists => {
                    info!("Mentors already entered for {}.", who);
                    report.skipped_existing += 1;
                }
            }
        }

        let session = record.session.as_ref().map(|s| s.as_str()).unwrap_or("");
        let outcome = client
            .write_field(
                &record.person_id,
                session_field(fields, record.track),
                session,
            )
            .with_context(|| format!("Failed to write class for {}", who))?;
        match outcome {
            WriteOutcome::Created => report.sessions_written += 1,
            WriteOutcome::AlreadyExists => {
                info!("Class already entered for {}.", who);
                report.skipped_existing += 1;
            }
        }

        report.processed += 1;
        info!("Processed {}", report.processed);
    }

    Ok(report.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::session::SessionLabel;
    use crate::testing::{scripted_client, ScriptedDirectory};

    fn fields() -> UploadFields {
        UploadFields {
            mentor: "100".to_string(),
            sdoe_session: "200".to_string(),
            mrmrs_session: "300".to_string(),
        }
    }

    fn maps() -> OptionMaps {
        OptionMaps {
            mentors: vec![("Alice", "1")].into_iter().collect(),
            sdoe_sessions: vec![("2023 Fall", "2")].into_iter().collect(),
            mrmrs_sessions: vec![("2024 Spring", "3")].into_iter().collect(),
        }
    }

    fn record(id: &str, session: Option<&str>, track: Track, mentors: &str) -> EnrollmentRecord {
        EnrollmentRecord {
            source_name: String::new(),
            person_name: format!("Person {}", id),
            person_id: id.to_string(),
            session: session.map(SessionLabel::new),
            track,
            mentors: mentors.to_string(),
        }
    }

    #[test]
    fn test_valid_records_pass() {
        let records = vec![
            record("1", Some("2023 Fall"), Track::Sdoe, "Alice"),
            record("2", Some("2024 Spring"), Track::MrMrs, ""),
        ];
        assert_eq!(validate_records(&records, &maps()), Ok(()));
    }

    #[test]
    fn test_unknown_mentor_names_row() {
        let records = vec![record("1", Some("2023 Fall"), Track::Sdoe, "Mallory")];
        assert_eq!(
            validate_records(&records, &maps()),
            Err(UploadError::UnknownMentor {
                name: "Person 1".to_string(),
                mentors: "Mallory".to_string(),
            })
        );
    }

    #[test]
    fn test_session_checked_against_its_own_track() {
        let records = vec![record("1", Some("2024 Spring"), Track::Sdoe, "")];
        assert!(matches!(
            validate_records(&records, &maps()),
            Err(UploadError::UnknownSession { .. })
        ));
    }

    #[test]
    fn test_missing_session_is_invalid() {
        let records = vec![record("1", None, Track::MrMrs, "")];
        assert_eq!(
            validate_records(&records, &maps()),
            Err(UploadError::UnknownSession {
                name: "Person 1".to_string(),
                session: String::new(),
            })
        );
    }

    #[test]
    fn test_invalid_row_aborts_before_any_write() {
        let directory = ScriptedDirectory::new().with_person("1", "Person 1");
        let client = scripted_client(&directory);
        let records = vec![
            record("1", Some("2023 Fall"), Track::Sdoe, "Alice"),
            record("2", Some("1999 Fall"), Track::Sdoe, ""),
        ];

        let err = upload_records(&client, &records, &fields(), &maps()).unwrap_err();

        assert!(err.downcast_ref::<UploadError>().is_some());
        assert_eq!(directory.attempts(), 0);
    }

    #[test]
    fn test_upload_writes_mentors_and_session() {
        let directory = ScriptedDirectory::new()
            .with_person("1", "Person 1")
            .with_person("2", "Person 2");
        let client = scripted_client(&directory);
        let records = vec![
            record("1", Some("2023 Fall"), Track::Sdoe, "Alice"),
            record("2", Some("2024 Spring"), Track::MrMrs, ""),
        ];

        let report = upload_records(&client, &records, &fields(), &maps()).unwrap();

        let written: Vec<(String, String, String)> = directory
            .written()
            .into_iter()
            .map(|(id, d)| (id, d.field_definition_id, d.value))
            .collect();
        assert_eq!(
            written,
            vec![
                ("1".to_string(), "100".to_string(), "Alice".to_string()),
                ("1".to_string(), "200".to_string(), "2023 Fall".to_string()),
                ("2".to_string(), "300".to_string(), "2024 Spring".to_string()),
            ]
        );
        assert_eq!(report.processed, 2);
        assert_eq!(report.mentors_written, 1);
        assert_eq!(report.sessions_written, 2);
        assert_eq!(report.skipped_existing, 0);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_rerun_skips_existing_values() {
        let directory = ScriptedDirectory::new().with_person("1", "Person 1");
        let client = scripted_client(&directory);
        let records = vec![record("1", Some("2023 Fall"), Track::Sdoe, "Alice")];

        upload_records(&client, &records, &fields(), &maps()).unwrap();
        let report = upload_records(&client, &records, &fields(), &maps()).unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped_existing, 2);
        assert_eq!(report.mentors_written, 0);
        assert_eq!(directory.written().len(), 2);
    }

    #[test]
    fn test_sanity_check_miss_is_not_fatal() {
        let directory = ScriptedDirectory::new();
        let client = scripted_client(&directory);
        let records = vec![record("9", Some("2023 Fall"), Track::Sdoe, "")];

        let report = upload_records(&client, &records, &fields(), &maps()).unwrap();

        assert_eq!(report.sanity_failures, 1);
        assert_eq!(report.sessions_written, 1);
    }

    #[test]
    fn test_service_error_on_write_halts_upload() {
        let directory = ScriptedDirectory::new()
            // sanity check lookup: logged and skipped
            .fail_next(DirectoryError::Client {
                status: 500,
                message: "lookup down".to_string(),
            })
            // session write: fatal
            .fail_next(DirectoryError::Client {
                status: 500,
                message: "boom".to_string(),
            });
        let client = scripted_client(&directory);
        let records = vec![
            record("1", Some("2023 Fall"), Track::Sdoe, ""),
            record("2", Some("2023 Fall"), Track::Sdoe, ""),
        ];

        let err = upload_records(&client, &records, &fields(), &maps()).unwrap_err();

        assert!(err.to_string().contains("Person 1"));
        assert_eq!(directory.attempts(), 2);
        assert!(directory.written().is_empty());
    }

    #[test]
    fn test_load_option_maps() {
        let directory = ScriptedDirectory::new()
            .with_options("100", vec![("Alice", "1")].into_iter().collect())
            .with_options("200", vec![("2023 Fall", "2")].into_iter().collect())
            .with_options("300", OptionMap::new());
        let client = scripted_client(&directory);

        let maps = OptionMaps::load(&client, &fields()).unwrap();

        assert!(maps.mentors.contains("Alice"));
        assert!(maps.sessions(Track::Sdoe).contains("2023 Fall"));
        assert!(maps.sessions(Track::MrMrs).is_empty());
    }
}
