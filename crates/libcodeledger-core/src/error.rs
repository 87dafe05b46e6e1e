use thiserror::Error;

/// Main error type for codeledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("file name must not be empty")]
    EmptyName,

    #[error("file already exists: {0}")]
    DuplicateName(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LedgerError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::EmptyName => "empty_name",
            LedgerError::DuplicateName(_) => "duplicate_name",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::RenderFailure(_) => "render_failure",
            LedgerError::InvalidArgs(_) => "invalid_args",
            LedgerError::Io(_) => "io_error",
            LedgerError::Json(_) => "internal_error",
            LedgerError::TomlParse(_) => "invalid_config",
            LedgerError::TomlSerialize(_) => "internal_error",
        }
    }

    /// Get the process exit code for errors that end the program
    pub fn exit_code(&self) -> i32 {
        match self {
            LedgerError::EmptyName | LedgerError::InvalidArgs(_) | LedgerError::TomlParse(_) => 2,
            LedgerError::NotFound(_) => 3,
            LedgerError::DuplicateName(_) => 4,
            LedgerError::Io(_) => 5,
            LedgerError::RenderFailure(_) => 6,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            LedgerError::EmptyName => vec!["Pass a file name, e.g. 'add app1.py'"],
            LedgerError::DuplicateName(_) => vec![
                "Run 'files' to see existing files",
                "Use 'select <name>' to work with the existing file",
            ],
            LedgerError::NotFound(msg) => {
                if msg.contains("File") {
                    vec!["Run 'files' to see available files", "Or 'add <name>' to create it"]
                } else {
                    vec![]
                }
            }
            LedgerError::InvalidArgs(msg) => {
                if msg.contains("status") {
                    vec!["Valid statuses: active, deprecated, issues-found"]
                } else if msg.contains("severity") {
                    vec!["Valid severities: low, medium, high, critical"]
                } else {
                    vec!["Run 'help' to list session commands"]
                }
            }
            LedgerError::RenderFailure(msg) if msg.contains("encode") => {
                vec!["Use 'report --format md' for text outside Latin-1"]
            }
            LedgerError::TomlParse(_) => vec!["Check the config file against the documented keys"],
            _ => vec![],
        }
    }

    /// Create a NotFound error for a file name
    pub fn file_not_found(name: &str) -> Self {
        LedgerError::NotFound(format!("File '{}' not found", name))
    }
}
