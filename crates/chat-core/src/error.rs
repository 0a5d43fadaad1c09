use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure to read an export. No output is produced when this occurs.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read export {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export does not contain a conversation list")]
    MissingConversationList,
}

/// A malformed field on a single conversation or message.
///
/// Recovered inside the loader: the offending unit is left out of the
/// aggregates that need the field and loading continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldParseError {
    #[error("timestamp is missing")]
    MissingTimestamp,

    #[error("timestamp is not a valid point in time: {0}")]
    InvalidTimestamp(String),

    #[error("author role is missing")]
    MissingRole,

    #[error("message is not an object: {0}")]
    MalformedMessage(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("UTC offset out of range: {0} minutes")]
    InvalidOffset(i32),
}
