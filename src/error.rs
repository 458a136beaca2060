use thiserror::Error;

/// Failures outside the alignment itself. Alignment outcomes, including
/// "no match", are reported as [`crate::Decision`]s instead.
#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("failed to {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("bad JSON in {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Raised by collaborators such as a [`crate::Transcriber`].
    #[error("{context} failed: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid aligner configuration: {message}")]
    InvalidInput { message: String },
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord {
        line: usize,
        reason: &'static str,
        /// The offending line as read.
        raw: String,
    },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn malformed_record(line: usize, reason: &'static str, raw: &str) -> Self {
        Self::MalformedRecord {
            line,
            reason,
            raw: raw.to_string(),
        }
    }
}
