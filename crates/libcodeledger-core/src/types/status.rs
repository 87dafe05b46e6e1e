use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Lifecycle status of a file record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Active,
    Deprecated,
    IssuesFound,
}

impl FileStatus {
    pub const ALL: [FileStatus; 3] = [FileStatus::Active, FileStatus::Deprecated, FileStatus::IssuesFound];

    /// Display label used in views and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Active => "Active",
            FileStatus::Deprecated => "Deprecated",
            FileStatus::IssuesFound => "Issues Found",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = LedgerError;

    /// Accepts the display label or any case/separator variant of it
    /// ("Issues Found", "issues-found", "issues_found").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "active" => Ok(FileStatus::Active),
            "deprecated" => Ok(FileStatus::Deprecated),
            "issuesfound" => Ok(FileStatus::IssuesFound),
            _ => Err(LedgerError::InvalidArgs(format!("unknown status '{}'", s))),
        }
    }
}

/// Priority label of a reported issue. No ordering is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(LedgerError::InvalidArgs(format!("unknown severity '{}'", s))),
        }
    }
}

/// Status of a reported issue.
///
/// Every issue is recorded as `Open` and no transition exists yet. A
/// close/reopen toggle would add a variant here plus a store operation that
/// reassigns it; until then the enum stays closed to a single state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IssueStatus {
    #[default]
    Open,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
