use crate::config::ConfigError;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a symbol was left out of every emitted stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    #[error("{count} results; at most a value and an error are supported")]
    TooManyResults { count: usize },

    #[error("second result `{found}` is not the failure indicator")]
    SecondResultNotError { found: String },

    #[error("failure indicator must be the last result")]
    ErrorNotLast,

    #[error("parameter `{param}` has the failure-indicator type")]
    ErrorParameter { param: String },

    #[error("parameter `{param}` has function type `{ty}`")]
    FunctionParameter { param: String, ty: String },

    #[error("result has function type `{ty}`")]
    FunctionResult { ty: String },

    /// The type is known but has no boundary representation in this position.
    #[error("{kind} type `{ty}` cannot cross the boundary here")]
    Unsupported { ty: String, kind: String },

    #[error("unresolved type `{ty}`")]
    Unresolved { ty: String },

    #[error("constant value `{value}` is not a valid `{ty}` literal")]
    InvalidConstant { value: String, ty: String },

    #[error("name `{name}` is already emitted in the same namespace")]
    NameCollision { name: String },
}

/// A skipped symbol together with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub symbol: String,
    pub reason: SkipReason,
}

impl Diagnostic {
    pub fn new(symbol: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            symbol: symbol.into(),
            reason,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped {}: {}", self.symbol, self.reason)
    }
}

/// Errors that abort generation.
#[derive(Debug, Error)]
pub enum GenError {
    /// A symbol reached emission without a zero value for early returns.
    #[error("internal error: type `{symbol}` has no zero value")]
    MissingZeroValue { symbol: String },

    /// A boundary symbol reached emission without its conversion data.
    #[error("internal error: type `{symbol}` used by `{func}` has no boundary representation")]
    MissingConversion { func: String, symbol: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
