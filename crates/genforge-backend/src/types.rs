//! Backend call types.

/// What an adapter hands back before extraction.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// Model text, possibly wrapping a fenced block.
    Text(String),
    /// Decoded binary content (e.g. PNG bytes).
    Binary(Vec<u8>),
}

/// Why an adapter call did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Connection failure, non-2xx status, or malformed envelope.
    Transport(String),
    /// The service answered but the content cannot be used.
    Unusable(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(d) => write!(f, "transport: {}", d),
            Self::Unusable(d) => write!(f, "unusable output: {}", d),
        }
    }
}

/// Result of one deadline-bounded backend attempt. Consumed by the selector,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    Success(Vec<u8>),
    Timeout,
    TransportError(String),
    UnusableOutput(String),
}

impl BackendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short label for logs and health output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Timeout => "timeout",
            Self::TransportError(_) => "transport_error",
            Self::UnusableOutput(_) => "unusable_output",
        }
    }
}

/// What a caller expects a text payload to contain. Decides which fenced
/// block is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// Application source: JavaScript-family blocks are preferred.
    Code,
    /// Free text such as an enhanced prompt: any block, else the raw text.
    Prose,
}
