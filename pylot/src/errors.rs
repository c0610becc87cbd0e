use thiserror::Error;

#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Input simulation failed: {0}")]
    Input(String),

    #[error("No navigation candidates recognized in the overview")]
    NoCandidates,

    #[error("Report delivery failed: {0}")]
    Report(String),
}

impl PilotError {
    /// Whether the navigation loop may absorb this error and retry the cycle.
    ///
    /// Only configuration errors are fatal.
    pub fn is_transient(&self) -> bool {
        !matches!(self, PilotError::Config(_))
    }
}
