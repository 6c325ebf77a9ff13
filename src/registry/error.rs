//! Admission error types

/// Error type for admission decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// The registry already holds the configured maximum of sessions
    AtCapacity {
        /// The configured session cap
        capacity: usize,
    },
}

impl std::fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdmissionError::AtCapacity { capacity } => {
                write!(f, "session limit reached ({} active)", capacity)
            }
        }
    }
}

impl std::error::Error for AdmissionError {}
