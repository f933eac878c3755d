/// Result type alias for keysweep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for keysweep operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// External command execution errors
    #[error("{}", format_command_error(.command, .message, .exit_code))]
    CommandExecution {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// Invalid search pattern, reported to the operator; matching yields
    /// empty for that call
    #[error("invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Cache or purge call on an entity kind without an identity contract.
    /// Programmer error, propagated as a hard failure.
    #[error("unsupported entity kind '{kind}' for operation '{operation}'")]
    UnsupportedEntity { kind: String, operation: String },

    /// YAML parse errors from external tool output
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// File system operations
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    pub fn command(command: impl Into<String>, message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Error::CommandExecution {
            command: command.into(),
            message: message.into(),
            exit_code,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_entity(kind: impl Into<String>, operation: impl Into<String>) -> Self {
        Error::UnsupportedEntity {
            kind: kind.into(),
            operation: operation.into(),
        }
    }
}

fn format_command_error(command: &str, message: &str, exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("command '{command}' failed with exit code {code}: {message}"),
        None => format!("command '{command}' failed: {message}"),
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::Yaml {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io {
            message: error.to_string(),
            source: error,
        }
    }
}
