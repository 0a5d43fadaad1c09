pub mod config;
pub mod error;
pub mod export;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{ConfigError, FieldParseError, LoadError};
pub use export::{load_export, parse_export, LoadReport, LoadedExport};
pub use types::{Conversation, Message, Role, UNKNOWN_MODEL};
