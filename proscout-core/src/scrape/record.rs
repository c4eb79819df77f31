use std::fmt;

use serde::{Serialize, Serializer};

/// Login credentials for the current run only. Never persisted; the Debug
/// impl redacts the password so it cannot leak through logs.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One URL to scrape. Targets are processed in input order; duplicates are
/// scraped independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileTarget(pub String);

impl ProfileTarget {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileTarget {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProfileTarget {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Success,
    Timeout,
    Error(String),
}

impl RecordStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RecordStatus::Success)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Success => f.write_str("success"),
            RecordStatus::Timeout => f.write_str("timeout"),
            RecordStatus::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

impl Serialize for RecordStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// The result of one profile attempt. Always fully populated; a field that
/// could not be extracted is an empty string, never a missing column.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub profile_url: String,
    pub name: String,
    pub headline: String,
    pub location: String,
    pub about: String,
    pub status: RecordStatus,
}

impl ProfileRecord {
    pub fn empty(url: &str) -> Self {
        Self {
            profile_url: url.to_string(),
            name: String::new(),
            headline: String::new(),
            location: String::new(),
            about: String::new(),
            status: RecordStatus::Success,
        }
    }

    /// Record for a profile whose page never loaded; all fields stay empty.
    pub fn unreachable(url: &str, status: RecordStatus) -> Self {
        Self {
            status,
            ..Self::empty(url)
        }
    }
}
