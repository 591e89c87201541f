use crate::value::FlagValue;

/// Alias for `Result<T, ZwError>`.
pub type ZwResult<T> = Result<T, ZwError>;

/// Errors raised by flag stores and graph (de)serialization.
#[derive(Debug, thiserror::Error)]
pub enum ZwError {
    /// Arithmetic was requested on a flag whose value is not a number.
    #[error("flag \"{key}\" is not numeric: {value}")]
    NotNumeric {
        /// The effective flag key.
        key: String,
        /// The value found in the store.
        value: FlagValue,
    },

    /// An increment or decrement amount is not a number.
    #[error("invalid amount for flag \"{key}\": {amount}")]
    InvalidAmount {
        /// The effective flag key.
        key: String,
        /// The offending amount.
        amount: FlagValue,
    },

    /// Integer arithmetic on a flag overflowed.
    #[error("arithmetic overflow on flag \"{0}\"")]
    Overflow(String),

    /// A dialogue graph or save state could not be parsed or written.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
