use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving this node's place in the cluster.
///
/// None of these are retryable: every input is static configuration, so a
/// failure means the node cannot take part and should abort startup.
#[derive(Error, Debug)]
pub enum RosterError {
    /// An environment variable is missing or could not be parsed.
    #[error("configuration error: `{var}` {reason}")]
    Config { var: &'static str, reason: String },

    /// The local hostname could not be turned into an address.
    #[error("could not resolve local address: {0}")]
    Resolution(String),

    /// The local address has no line in the roster.
    #[error("local address {address} not found in roster")]
    NotFound { address: String },

    /// The roster is too short to hold the reserved slots.
    #[error("roster has {lines} line(s), at least {required} required")]
    EmptyRoster { lines: usize, required: usize },

    /// The roster file could not be read.
    #[error("failed to read roster `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A roster line is not of the form `address:port`.
    #[error("malformed roster entry on line {line}: `{content}`")]
    MalformedEntry { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, RosterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RosterError::Config {
            var: "PROCS_PER_NODE",
            reason: "is not set".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration error: `PROCS_PER_NODE` is not set"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = RosterError::Io {
            path: PathBuf::from("/nope/cad"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert!(err.to_string().contains("/nope/cad"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
