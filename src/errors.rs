use thiserror::Error;

/// GPTifier errors
///
/// The `Display` text of each variant is what the user sees on stderr, so the
/// wording is part of the command line contract.
#[derive(Debug, Error)]
pub enum GptError {
    /// A flag or argument failed validation before any request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("Failed to convert '{input}' to {target}")]
    Conversion { input: String, target: &'static str },
    #[error("Could not open file '{path}'")]
    ReadFile { path: String },
    #[error("Unable to open '{path}'")]
    WriteFile { path: String },
    #[error("{name} environment variable not set")]
    MissingCredential { name: &'static str },
    #[error("Could not determine which model to use")]
    NoModel,
    #[error("Configuration error: {0}")]
    Config(String),
    /// The request never produced an HTTP response.
    #[error("Failed to reach {url}: {reason}")]
    Transport { url: String, reason: String },
    /// Non-2xx response; `message` is the provider's own text.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// 2xx response that nonetheless carries an `error` object.
    #[error("{message}")]
    Embedded { message: String, raw: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Failed to unpack response: {0}")]
    Unpack(String),
    /// The response parsed but its shape was not what the endpoint promises.
    #[error("{0}")]
    Malformed(String),
    #[error("One or more failures occurred when deleting {0}")]
    BatchDelete(&'static str),
    #[error("Cannot proceed")]
    CannotProceed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GptError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        GptError::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_cli_contract() {
        let err = GptError::Conversion {
            input: "foobar".to_string(),
            target: "float",
        };
        assert_eq!(err.to_string(), "Failed to convert 'foobar' to float");

        let err = GptError::WriteFile {
            path: "/tmp/a/b/c".to_string(),
        };
        assert_eq!(err.to_string(), "Unable to open '/tmp/a/b/c'");

        let err = GptError::BatchDelete("files");
        assert_eq!(
            err.to_string(),
            "One or more failures occurred when deleting files"
        );
    }

    #[test]
    fn api_errors_pass_message_through() {
        let err = GptError::Api {
            status: 404,
            message: "The model `foobar` does not exist or you do not have access to it."
                .to_string(),
        };
        assert_eq!(
            err.to_string(),
            "The model `foobar` does not exist or you do not have access to it."
        );
    }
}
