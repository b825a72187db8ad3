//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
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

    #[error("price data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("oracle failure: {reason}")]
    Oracle { reason: String },

    #[error("insufficient data: have {snapshots} snapshots, need {minimum}")]
    InsufficientData { snapshots: usize, minimum: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        SigtraderError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn oracle(reason: impl Into<String>) -> Self {
        SigtraderError::Oracle {
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::DataUnavailable { .. } => 5,
            SigtraderError::Oracle { .. } => 6,
            SigtraderError::InsufficientData { .. } => 7,
        };
        std::process::ExitCode::from(code)
    }
}
