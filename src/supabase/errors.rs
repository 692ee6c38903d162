//! Error types for the Supabase REST client.

use std::error::Error;

/// Every way a probe can fail, from session construction to response parsing.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidCredential,
    #[error("request failed: {}", cause_chain(.0))]
    Transport(#[from] reqwest::Error),
    #[error("not authorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("query failed ({status}): {message}")]
    Query { status: u16, message: String },
    #[error("malformed response from {url}: {}", summary(.source))]
    MalformedResponse {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ProbeError {
    /// Short stable name for the variant, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint { .. } => "invalid_endpoint",
            Self::InvalidCredential => "invalid_credential",
            Self::Transport(_) => "transport",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Query { .. } => "query",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// `err` followed by each of its sources, joined with `: ` on one line.
///
/// reqwest only names the request in its own message; the reason (DNS,
/// refused connection, TLS, timeout) lives further down the chain.
pub fn cause_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        // Some layers repeat their source's message verbatim.
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        current = cause.source();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First line of a parse failure: path and mismatch, without the snippet.
fn summary(err: &anyhow::Error) -> String {
    err.to_string().lines().next().unwrap_or_default().to_string()
}
