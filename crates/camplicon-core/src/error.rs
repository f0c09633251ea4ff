use thiserror::Error;

/// Failure kinds shared by every stage of a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data that cannot be used as given (bad k-mer, unparseable file, empty directory).
    #[error("malformed input '{input}': {reason}")]
    MalformedInput { input: String, reason: String },
    /// An external collaborator is missing, exited non-zero or produced unreadable output.
    #[error("external tool '{tool}' failed on '{input}': {reason}")]
    ExternalToolFailure {
        tool: String,
        input: String,
        reason: String,
    },
    /// Every candidate was filtered out at some stage.
    #[error("no viable candidates: {0}")]
    NoViableCandidates(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("run cancelled")]
    Cancelled,
    #[error("cannot write '{path}': {reason}")]
    Output { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn tool(
        tool: impl Into<String>,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::ExternalToolFailure {
            tool: tool.into(),
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }

    pub fn output(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Output {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
