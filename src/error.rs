// Error taxonomy for a comparison run.
//
// Configuration and precondition failures abort the run before any oracle
// call is made. Oracle and parse failures are per-pair: the comparator turns
// them into a score of 0 plus a warning and keeps going.

use thiserror::Error;

/// Startup failure: the selected oracle backend is missing something it needs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{var} not set. Add it to your .env file.\nSee .env.example for the required variables.")]
    MissingVar { var: &'static str },

    #[error("Unknown MATCHER_BACKEND '{0}' (expected 'chat' or 'direct')")]
    UnknownBackend(String),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

/// Input rejected before the batch starts.
#[derive(Error, Debug)]
pub enum PreconditionError {
    #[error("{source_name} must contain a '{column}' column")]
    MissingColumn {
        source_name: String,
        column: &'static str,
    },

    #[error("Unsupported file type for {0} (expected .xlsx, .xls, .ods, .csv or .tsv)")]
    UnsupportedFormat(String),

    #[error("{0} does not contain any worksheets")]
    NoWorksheet(String),

    #[error("{0} is empty")]
    Empty(String),

    #[error("Unable to read {source_name}: {message}")]
    Unreadable {
        source_name: String,
        message: String,
    },
}

/// The oracle could not produce a reply for one pair.
#[derive(Error, Debug, Clone)]
pub enum OracleError {
    #[error("Oracle request failed: {0}")]
    Transport(String),

    #[error("Oracle returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle response was malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Transport(err.to_string())
    }
}

/// The oracle replied, but no score could be read out of the reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreParseError {
    #[error("no digits in oracle reply {0:?}")]
    NoDigits(String),

    #[error("digits in oracle reply {0:?} do not fit in a score")]
    Overflow(String),
}

/// Why a single pair was scored 0.
#[derive(Error, Debug, Clone)]
pub enum PairError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Parse(#[from] ScoreParseError),
}
