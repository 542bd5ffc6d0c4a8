//! Error handling for enumeration, storage and detection.
//!
//! A single error type covers the failure modes of a sweep: bad input to the
//! enumerator, candidate store failures, transport failures when calling the
//! availability API and configuration problems.

use std::fmt;

/// Main error type for domain-sweep operations.
#[derive(Debug, Clone)]
pub enum DomainSweepError {
    /// Requested label length is outside the supported range
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },

    /// Alphabet is empty or contains repeated characters
    InvalidAlphabet {
        reason: String,
    },

    /// Could not open the candidate store; fatal for the current run
    StoreConnection {
        path: String,
        message: String,
    },

    /// A statement against the candidate store failed
    StoreError {
        operation: String,
        message: String,
    },

    /// Connection, timeout or body read failure talking to the check API
    TransportError {
        domain: String,
        message: String,
    },

    /// Configuration errors (invalid settings, unreadable files)
    ConfigError {
        message: String,
    },

    /// File I/O errors (script export, config files)
    FileError {
        path: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DomainSweepError {
    /// Create a new invalid length error.
    pub fn invalid_length(length: usize, min: usize, max: usize) -> Self {
        Self::InvalidLength { length, min, max }
    }

    /// Create a new invalid alphabet error.
    pub fn invalid_alphabet<R: Into<String>>(reason: R) -> Self {
        Self::InvalidAlphabet {
            reason: reason.into(),
        }
    }

    /// Create a new store connection error.
    pub fn store_connection<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::StoreConnection {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new store statement error.
    pub fn store<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::StoreError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error.
    pub fn transport<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::TransportError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreConnection { .. })
    }
}

impl fmt::Display for DomainSweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { length, min, max } => {
                write!(
                    f,
                    "Invalid label length {}: must be between {} and {}",
                    length, min, max
                )
            }
            Self::InvalidAlphabet { reason } => write!(f, "Invalid alphabet: {}", reason),
            Self::StoreConnection { path, message } => {
                write!(f, "Cannot open candidate store '{}': {}", path, message)
            }
            Self::StoreError { operation, message } => {
                write!(f, "Store error during {}: {}", operation, message)
            }
            Self::TransportError { domain, message } => {
                write!(f, "Transport error for '{}': {}", domain, message)
            }
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DomainSweepError {}

impl From<reqwest::Error> for DomainSweepError {
    fn from(err: reqwest::Error) -> Self {
        let domain = err
            .url()
            .and_then(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == "domain")
                    .map(|(_, v)| v.into_owned())
            })
            .unwrap_or_default();

        if err.is_timeout() {
            Self::transport(domain, format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::transport(domain, format!("connection failed: {}", err))
        } else {
            Self::transport(domain, format!("request failed: {}", err))
        }
    }
}

impl From<rusqlite::Error> for DomainSweepError {
    fn from(err: rusqlite::Error) -> Self {
        Self::store("statement", err.to_string())
    }
}

impl From<std::io::Error> for DomainSweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
