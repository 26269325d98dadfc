// ⚙️ Configuration - credentials, field definition ids, retry policy
// Values are gathered by the CLI (flags or environment / .env) and checked
// here before anything talks to the directory.

use std::fmt;
use std::time::Duration;

use crate::directory::RetryPolicy;
use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://api.planningcenteronline.com";

/// Basic-auth pair for the directory service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub application_id: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(application_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials {
            application_id: application_id.into(),
            secret: secret.into(),
        }
    }
}

// Keep the secret out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("application_id", &self.application_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Custom field definitions the tool writes to. Each command only needs
/// some of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIds {
    pub mentor: Option<String>,
    pub sdoe_session: Option<String>,
    pub mrmrs_session: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

/// Field ids required by the write-back phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFields {
    pub mentor: String,
    pub sdoe_session: String,
    pub mrmrs_session: String,
}

/// Field ids required by the year sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearFields {
    pub start_year: String,
    pub end_year: String,
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

impl FieldIds {
    pub fn upload_fields(&self) -> Result<UploadFields, ConfigError> {
        Ok(UploadFields {
            mentor: required(&self.mentor, "MENTOR_FIELD")?,
            sdoe_session: required(&self.sdoe_session, "SDOE_SESSION_FIELD")?,
            mrmrs_session: required(&self.mrmrs_session, "MRMRS_SESSION_FIELD")?,
        })
    }

    pub fn year_fields(&self) -> Result<YearFields, ConfigError> {
        Ok(YearFields {
            start_year: required(&self.start_year, "START_YEAR_FIELD")?,
            end_year: required(&self.end_year, "END_YEAR_FIELD")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub credentials: Credentials,
    pub fields: FieldIds,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn new(api_base: impl Into<String>, credentials: Credentials) -> Self {
        Config {
            api_base: api_base.into(),
            credentials,
            fields: FieldIds::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Builder pattern: field definition ids
    pub fn with_fields(mut self, fields: FieldIds) -> Self {
        self.fields = fields;
        self
    }

    /// Builder pattern: retry delay and optional cap
    pub fn with_retry(mut self, delay_ms: u64, max_retries: Option<u32>) -> Self {
        self.retry = RetryPolicy::new(Duration::from_millis(delay_ms), max_retries);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Empty("PCO_API_BASE"));
        }
        if self.credentials.application_id.trim().is_empty() {
            return Err(ConfigError::Empty("PCO_AUTH_TOKEN"));
        }
        if self.credentials.secret.trim().is_empty() {
            return Err(ConfigError::Empty("PCO_AUTH_SECRET"));
        }
        Ok(())
    }
}
