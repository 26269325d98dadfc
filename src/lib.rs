// Enrollment Sync - Core Library
// Class rosters → directory identities → custom field values

pub mod config;
pub mod console;
pub mod directory;
pub mod error;
pub mod names;
pub mod resolver;
pub mod roster;
pub mod session;
pub mod upload;
pub mod years;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, Credentials, FieldIds, UploadFields, YearFields, DEFAULT_API_BASE};
pub use console::{Console, ConsoleDisambiguator};
pub use directory::{
    DirectoryClient, FieldDatum, GivenNameField, OptionMap, PeopleDirectory, Person,
    PlanningCenterClient, RetryPolicy, Sleeper, ThreadSleeper, WriteOutcome,
};
pub use error::{ConfigError, DirectoryError, ResolveError, UploadError};
pub use names::{extract_names, parse_session_header, CandidateName, NameExtractor};
pub use resolver::{resolve, Disambiguator, MatchContext, MatchOutcome};
pub use roster::{
    count_by_track, extract_roster, load_records, process_track, read_spreadsheet,
    write_records, ColumnLayout, EnrollmentRecord, TrackColumns, RECORD_HEADER,
};
pub use session::{SessionLabel, SessionTracker, Track};
pub use upload::{upload_records, validate_records, OptionMaps, UploadReport};
pub use years::{run_year_sync, YearSyncSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
