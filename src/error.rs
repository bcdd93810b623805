//! Error types for pdcache
//!
//! All modules use `PdCacheResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdcache operations
pub type PdCacheResult<T> = Result<T, PdCacheError>;

/// Process exit code used when a freshly created volume still needs populating
pub const EXIT_NOT_POPULATED: u8 = 3;

/// A named step of the acquisition and release workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckExistence,
    Create,
    Attach,
    FormatAndMount,
    Load,
    Save,
    Unmount,
    Detach,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckExistence => "check-existence",
            Self::Create => "create",
            Self::Attach => "attach",
            Self::FormatAndMount => "format-and-mount",
            Self::Load => "load",
            Self::Save => "save",
            Self::Unmount => "unmount",
            Self::Detach => "detach",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors that can occur in pdcache
#[derive(Error, Debug)]
pub enum PdCacheError {
    // Naming errors
    #[error("Image ID {id:?} is too short: at least {required} characters are required")]
    ImageIdTooShort { id: String, required: usize },

    #[error("Image ID {id:?} is not usable as a volume name: {reason}")]
    InvalidImageId { id: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command \"{command}\" exited with {}: {output}", exit_status(.code))]
    CommandExit {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Command \"{command}\" timed out after {secs}s")]
    CommandTimeout { command: String, secs: u64 },

    // Workflow errors
    #[error("{step} failed: {source}")]
    StepFailed {
        step: Step,
        #[source]
        source: Box<PdCacheError>,
    },

    #[error("Volume {volume} was created but does not contain image {image} yet")]
    NotPopulated { volume: String, image: String },

    #[error("Could not determine local instance name: {0}")]
    Hostname(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "signal".to_string(),
    }
}

impl PdCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap an error with the workflow step that produced it
    pub fn at_step(step: Step, source: PdCacheError) -> Self {
        Self::StepFailed {
            step,
            source: Box::new(source),
        }
    }

    /// The step that failed, if this error came out of a workflow
    pub fn failed_step(&self) -> Option<Step> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Whether this is the empty-cache signal from the create path
    pub fn is_not_populated(&self) -> bool {
        matches!(self, Self::NotPopulated { .. })
    }

    /// Exit code the CLI should report for this error
    pub fn exit_code(&self) -> u8 {
        if self.is_not_populated() {
            EXIT_NOT_POPULATED
        } else {
            1
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotPopulated { .. } => {
                Some("Populate the volume with: pdcache release <image>")
            }
            Self::ImageIdTooShort { .. } => Some("Pass the full image ID: docker inspect --format '{{.Id}}' <image>"),
            Self::CommandTimeout { .. } => Some("Raise exec.timeout_secs or set it to 0 to disable"),
            Self::StepFailed { source, .. } => source.hint(),
            _ => None,
        }
    }
}
