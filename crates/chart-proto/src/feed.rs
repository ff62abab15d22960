//! FeedFetcher: walks the proxy chain until one intermediary yields albums.

use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::album::{Album, FeedDocument};
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::proxy::{ProxyChain, ProxyKind, ResolvedEndpoint};

/// Outer document returned by enveloping intermediaries.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    contents: Option<serde_json::Value>,
}

pub struct FeedFetcher {
    client: Client,
    chain: ProxyChain,
}

impl FeedFetcher {
    pub fn new(client: Client, chain: ProxyChain) -> Self {
        Self { client, chain }
    }

    /// Build the shared client from config: per-attempt timeout, connect
    /// timeout and user agent.
    pub fn from_config(config: &FeedConfig) -> FeedResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .timeout(config.attempt_timeout())
            .build()?;
        Ok(Self::new(client, config.proxy_chain()))
    }

    pub fn chain(&self) -> &ProxyChain {
        &self.chain
    }

    /// Try each endpoint in order, one at a time. Returns the first parsed
    /// album list, or `Exhausted` carrying the last attempt's error.
    pub async fn fetch_catalog(&self) -> FeedResult<Vec<Album>> {
        if self.chain.is_empty() {
            error!("[feed] No intermediaries configured");
            return Err(FeedError::NoEndpoints);
        }

        info!(
            "[feed] Fetching chart via {} intermediaries: target={}",
            self.chain.len(),
            self.chain.target()
        );

        // Lazy: an attempt only runs when the previous one has been consumed.
        let this = self;
        let attempts = stream::iter(self.chain.attempts()).then(move |endpoint| async move {
            let outcome = this.attempt(&endpoint).await;
            (endpoint, outcome)
        });
        futures_util::pin_mut!(attempts);

        let mut tried = 0usize;
        let mut last_error = None;
        while let Some((endpoint, outcome)) = attempts.next().await {
            tried += 1;
            match outcome {
                Ok(albums) => {
                    info!(
                        "[feed] Endpoint #{} ({}) returned {} albums",
                        endpoint.index,
                        endpoint.kind.label(),
                        albums.len()
                    );
                    return Ok(albums);
                }
                Err(e) => {
                    warn!(
                        "[feed] Endpoint #{} ({}) failed: {}",
                        endpoint.index,
                        endpoint.kind.label(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.unwrap_or(FeedError::NoEndpoints);
        error!("[feed] All {} intermediaries failed", tried);
        Err(FeedError::Exhausted {
            attempts: tried,
            last: Box::new(last),
        })
    }

    async fn attempt(&self, endpoint: &ResolvedEndpoint) -> FeedResult<Vec<Album>> {
        debug!("[proxy] GET {}", endpoint.url);
        let response = self
            .client
            .get(&endpoint.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status,
                url: endpoint.url.clone(),
            });
        }

        let body = response.text().await?;
        debug!("[proxy] #{} body: {} bytes", endpoint.index, body.len());
        parse_body(endpoint.kind, &body)
    }
}

/// Per-kind parse strategy.
pub fn parse_body(kind: ProxyKind, body: &str) -> FeedResult<Vec<Album>> {
    match kind {
        ProxyKind::Enveloping => parse_enveloping(body),
        ProxyKind::Transparent => parse_transparent(body),
    }
}

/// Outer `{ "contents": "<json>" }`, then the target document inside it.
pub fn parse_enveloping(body: &str) -> FeedResult<Vec<Album>> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FeedError::Envelope(e.to_string()))?;
    match envelope.contents {
        Some(serde_json::Value::String(inner)) => parse_transparent(&inner),
        Some(other) => Err(FeedError::Envelope(format!(
            "contents is not a string: {}",
            json_type(&other)
        ))),
        None => Err(FeedError::Envelope("missing contents".to_string())),
    }
}

/// Body is the target document.
pub fn parse_transparent(body: &str) -> FeedResult<Vec<Album>> {
    let doc: FeedDocument =
        serde_json::from_str(body).map_err(|e| FeedError::Payload(e.to_string()))?;
    let albums = doc.into_albums();
    if albums.is_empty() {
        return Err(FeedError::EmptyFeed);
    }
    Ok(albums)
}

fn json_type(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPED: &str = r##"{"contents": "{\"feed\":{\"results\":[{\"id\":\"x1\",\"name\":\"N\",\"artistName\":\"Ar\",\"artworkUrl100\":\"u\",\"genres\":[{\"name\":\"Pop\"}],\"url\":\"#\"}]}}"}"##;

    #[test]
    fn test_enveloping_double_parse() {
        let albums = parse_enveloping(ENVELOPED).unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].id, "x1");
        assert_eq!(albums[0].genres, vec!["Pop".to_string()]);
        assert_eq!(albums[0].url, "#");
    }

    #[test]
    fn test_enveloping_rejects_bare_target() {
        // a transparent-style body sent through the enveloping strategy
        let body = r#"{"feed":{"results":[]}}"#;
        assert!(matches!(parse_enveloping(body), Err(FeedError::Envelope(_))));
    }

    #[test]
    fn test_enveloping_rejects_non_string_contents() {
        let body = r#"{"contents": {"feed": {"results": []}}}"#;
        let err = parse_enveloping(body).unwrap_err();
        assert!(err.to_string().contains("object"));

        let body = r#"{"contents": null, "status": {"http_code": 403}}"#;
        assert!(matches!(parse_enveloping(body), Err(FeedError::Envelope(_))));
    }

    #[test]
    fn test_enveloping_inner_garbage_is_payload_error() {
        let body = r#"{"contents": "<html>rate limited</html>"}"#;
        assert!(matches!(parse_enveloping(body), Err(FeedError::Payload(_))));
    }

    #[test]
    fn test_transparent_requires_feed_results() {
        assert!(matches!(
            parse_transparent(r#"{"results": []}"#),
            Err(FeedError::Payload(_))
        ));
        assert!(matches!(
            parse_transparent("not json"),
            Err(FeedError::Payload(_))
        ));
    }

    #[test]
    fn test_transparent_empty_results_is_failure() {
        assert!(matches!(
            parse_transparent(r#"{"feed":{"results":[]}}"#),
            Err(FeedError::EmptyFeed)
        ));
    }

    #[test]
    fn test_parse_body_dispatches_on_kind() {
        let inner = r#"{"feed":{"results":[{"id":"a","name":"n","artistName":"ar","artworkUrl100":"u","genres":[],"url":"l"}]}}"#;
        assert_eq!(parse_body(ProxyKind::Transparent, inner).unwrap()[0].id, "a");
        assert!(parse_body(ProxyKind::Enveloping, inner).is_err());
        assert_eq!(parse_body(ProxyKind::Enveloping, ENVELOPED).unwrap()[0].id, "x1");
    }

    #[tokio::test]
    async fn test_empty_chain_is_no_endpoints() {
        let fetcher = FeedFetcher::new(Client::new(), ProxyChain::new("http://x", vec![]));
        let err = fetcher.fetch_catalog().await.unwrap_err();
        assert!(matches!(err, FeedError::NoEndpoints));
        assert!(err.is_retrieval_exhaustion());
    }
}
