//! Domain error types.

/// Top-level error type for voltarget.
#[derive(Debug, thiserror::Error)]
pub enum VoltargetError {
    #[error("price data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient data for {stage}: have {have} points, need {need}")]
    InsufficientData {
        stage: &'static str,
        have: usize,
        need: usize,
    },

    #[error("invalid series index: {reason}")]
    InvalidIndex { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VoltargetError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        VoltargetError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&VoltargetError> for std::process::ExitCode {
    fn from(err: &VoltargetError) -> Self {
        let code: u8 = match err {
            VoltargetError::Io(_) | VoltargetError::Csv(_) => 1,
            VoltargetError::ConfigParse { .. }
            | VoltargetError::ConfigMissing { .. }
            | VoltargetError::ConfigInvalid { .. } => 2,
            VoltargetError::DataUnavailable { .. } => 3,
            VoltargetError::InsufficientData { .. } | VoltargetError::InvalidIndex { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
