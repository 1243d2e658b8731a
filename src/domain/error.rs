//! Domain error types.

/// Top-level error type for portmetrics.
///
/// Numerically undefined statistics (single-observation volatility, a Sharpe
/// ratio over zero volatility, a contribution share over a zero total) are
/// never errors: they surface as `None` in the corresponding output field.
#[derive(Debug, thiserror::Error)]
pub enum PortmetricsError {
    #[error("data error: {reason}")]
    Data { reason: String },

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

    #[error("invalid table: {reason}")]
    InvalidTable { reason: String },

    #[error("invalid allocation: {reason}")]
    InvalidAllocation { reason: String },

    #[error("insufficient valid rows: have {found}, need at least {minimum}")]
    InsufficientValidRows { found: usize, minimum: usize },

    #[error("no valid rows: no date has data for every allocated ticker")]
    NoValidRows,

    #[error("no valid price series were returned")]
    NoValidTickers,

    #[error("only {valid} ticker(s) returned valid data, need at least {minimum}")]
    InsufficientTickers { valid: usize, minimum: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PortmetricsError {
    pub(crate) fn invalid_table(reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_allocation(reason: impl Into<String>) -> Self {
        Self::InvalidAllocation {
            reason: reason.into(),
        }
    }
}

impl From<&PortmetricsError> for std::process::ExitCode {
    fn from(err: &PortmetricsError) -> Self {
        let code: u8 = match err {
            PortmetricsError::Io(_) | PortmetricsError::Report { .. } => 1,
            PortmetricsError::ConfigParse { .. }
            | PortmetricsError::ConfigMissing { .. }
            | PortmetricsError::ConfigInvalid { .. } => 2,
            PortmetricsError::Data { .. } => 3,
            PortmetricsError::InvalidTable { .. } | PortmetricsError::InvalidAllocation { .. } => 4,
            PortmetricsError::InsufficientValidRows { .. }
            | PortmetricsError::NoValidRows
            | PortmetricsError::NoValidTickers
            | PortmetricsError::InsufficientTickers { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_rows_message_names_counts() {
        let err = PortmetricsError::InsufficientValidRows {
            found: 2,
            minimum: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient valid rows: have 2, need at least 3"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::other("disk gone");
        let err: PortmetricsError = io.into();
        assert!(matches!(err, PortmetricsError::Io(_)));
    }

    #[test]
    fn exit_codes_group_by_family() {
        use std::process::ExitCode;
        let cases = [
            (PortmetricsError::NoValidRows, ExitCode::from(5)),
            (
                PortmetricsError::ConfigMissing {
                    section: "data".into(),
                    key: "start_date".into(),
                },
                ExitCode::from(2),
            ),
            (PortmetricsError::invalid_allocation("x"), ExitCode::from(4)),
        ];
        for (err, expected) in cases {
            assert_eq!(ExitCode::from(&err), expected);
        }
    }
}
