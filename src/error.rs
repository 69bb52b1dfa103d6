#![forbid(unsafe_code)]

//! Error taxonomy shared across the fetch and enrichment layers.

use thiserror::Error;

/// Failure talking to the metadata provider. Surfaced by every fetching
/// operation; only the comment sampler downgrades it to a diagnostic.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, or timeout trouble before a response arrived.
    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The daily or per-minute API quota is exhausted.
    #[error("API quota exceeded")]
    QuotaExceeded,

    /// Non-success HTTP status with the provider's stated reason.
    #[error("API error {status} from {endpoint}: {reason}")]
    Api {
        status: u16,
        endpoint: String,
        reason: String,
    },

    /// The response arrived but did not have the expected shape.
    #[error("malformed response from {endpoint}: {message}")]
    Malformed { endpoint: String, message: String },
}

/// A duration string that does not match the `PT[nH][nM][nS]` grammar the
/// provider emits. Never silently decoded as zero.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid ISO-8601 duration {input:?}")]
pub struct DurationParseError {
    pub input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_name_the_endpoint() {
        let err = FetchError::Api {
            status: 404,
            endpoint: "videos".into(),
            reason: "notFound".into(),
        };
        assert_eq!(err.to_string(), "API error 404 from videos: notFound");

        let err = FetchError::Transport {
            endpoint: "channels".into(),
            message: "connection refused".into(),
        };
        assert!(err.to_string().contains("channels"));
    }

    #[test]
    fn duration_error_quotes_the_input() {
        let err = DurationParseError {
            input: "5 minutes".into(),
        };
        assert_eq!(err.to_string(), "invalid ISO-8601 duration \"5 minutes\"");
    }
}
