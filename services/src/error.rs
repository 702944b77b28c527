use db::PersistenceError;
use reqwest::StatusCode;

/// The metrics source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The payload cannot be turned into a sample at all.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("metrics document is not a JSON object")]
    NotAnObject,

    #[error("metrics document has no usable hostname")]
    MissingHostname,
}

/// Any failure inside one ingestion cycle, tagged with the stage it came from.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("could not store metrics for {hostname}: {source}")]
    Persistence {
        hostname: String,
        #[source]
        source: PersistenceError,
    },
}

impl IngestError {
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Fetch(_) => "fetch",
            IngestError::Normalization(_) => "normalize",
            IngestError::Persistence { .. } => "persist",
        }
    }

    pub fn hostname(&self) -> Option<&str> {
        match self {
            IngestError::Persistence { hostname, .. } => Some(hostname),
            _ => None,
        }
    }
}
