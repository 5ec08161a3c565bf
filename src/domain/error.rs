//! Domain error types.
//!
//! Run-level failures are [`SigtraderError`] and always propagate to the caller.
//! Per-condition failures are [`ConditionError`] and are recovered by the signal
//! aggregator, which drops the condition and records a warning.

/// A parse error with position information for expression and indicator parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    ///
    /// `position` is a byte offset; the caret is indented by characters.
    pub fn display_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position)
            .map_or(self.position, |prefix| prefix.chars().count());
        let caret = " ".repeat(column) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Why a single buy/sell condition could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown column '{name}'")]
    MissingColumn { name: String },

    #[error("type error: {reason}")]
    TypeMismatch { reason: String },
}

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

    #[error("invalid indicator '{input}': {source}")]
    IndicatorParse {
        input: String,
        #[source]
        source: ParseError,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("bars out of order at row {row}: {timestamp} does not follow {previous}")]
    UnorderedBars {
        row: usize,
        timestamp: chrono::NaiveDateTime,
        previous: chrono::NaiveDateTime,
    },

    #[error("column '{name}' has {len} values, table has {rows} rows")]
    ColumnLength {
        name: String,
        len: usize,
        rows: usize,
    },

    #[error("no usable bars: {rows} rows loaded, none left after removing undefined leading rows")]
    EmptyInput { rows: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_)
            | SigtraderError::Data { .. }
            | SigtraderError::UnorderedBars { .. }
            | SigtraderError::ColumnLength { .. } => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::IndicatorParse { .. } => 4,
            SigtraderError::EmptyInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
