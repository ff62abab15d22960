use thiserror::Error;

/// Failure of a single intermediary attempt, or of the whole chain.
///
/// Everything except `Exhausted` and `NoEndpoints` is recovered inside the
/// fetcher by advancing to the next endpoint.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("envelope unusable: {0}")]
    Envelope(String),

    #[error("payload unusable: {0}")]
    Payload(String),

    #[error("feed contained no albums")]
    EmptyFeed,

    #[error("proxy chain is empty")]
    NoEndpoints,

    #[error("all {attempts} endpoints failed, last error: {last}")]
    Exhausted {
        attempts: usize,
        last: Box<FeedError>,
    },
}

impl FeedError {
    /// True for errors that end the chain rather than a single attempt.
    pub fn is_retrieval_exhaustion(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::NoEndpoints)
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
