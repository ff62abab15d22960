//! Ordered list of cross-origin intermediaries wrapping the chart URL.
//!
//! Each entry is data: a [`ProxyKind`] naming the response convention and a
//! URL template. Adding an intermediary never needs new code, only a new entry.

use serde::{Deserialize, Serialize};

/// Replaced by the target URL as-is.
pub const URL_PLACEHOLDER: &str = "{url}";
/// Replaced by the percent-encoded target URL.
pub const URL_ENCODED_PLACEHOLDER: &str = "{url_encoded}";

/// Response convention of an intermediary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    /// `{ "contents": "<target JSON as a string>" }`, parsed twice.
    Enveloping,
    /// Body is the target response itself.
    Transparent,
}

impl ProxyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Enveloping => "enveloping",
            Self::Transparent => "transparent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub kind: ProxyKind,
    pub template: String,
}

impl ProxyEndpoint {
    pub fn enveloping(template: impl Into<String>) -> Self {
        Self {
            kind: ProxyKind::Enveloping,
            template: template.into(),
        }
    }

    pub fn transparent(template: impl Into<String>) -> Self {
        Self {
            kind: ProxyKind::Transparent,
            template: template.into(),
        }
    }

    /// Fill the template with `target`. Templates without any placeholder
    /// get the encoded target appended.
    pub fn resolve(&self, target: &str) -> String {
        let has_raw = self.template.contains(URL_PLACEHOLDER);
        let has_encoded = self.template.contains(URL_ENCODED_PLACEHOLDER);
        if !has_raw && !has_encoded {
            return format!("{}{}", self.template, urlencoding::encode(target));
        }
        self.template
            .replace(URL_ENCODED_PLACEHOLDER, &urlencoding::encode(target))
            .replace(URL_PLACEHOLDER, target)
    }
}

/// A concrete URL to try, with its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub index: usize,
    pub kind: ProxyKind,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ProxyChain {
    target: String,
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyChain {
    pub fn new(target: impl Into<String>, endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            target: target.into(),
            endpoints,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in evaluation order, each wrapping the same target.
    pub fn attempts(&self) -> impl Iterator<Item = ResolvedEndpoint> + '_ {
        self.endpoints
            .iter()
            .enumerate()
            .map(move |(index, ep)| ResolvedEndpoint {
                index,
                kind: ep.kind,
                url: ep.resolve(&self.target),
            })
    }
}
