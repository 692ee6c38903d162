//! HTTP client for the Supabase REST (PostgREST) API.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::Url;

use crate::probe::TableReader;
use crate::supabase::errors::ProbeError;
use crate::supabase::json::parse_json_with_context;
use crate::supabase::models::{Credential, PostgrestError, Query, Row};

/// Selects slower than this are logged as a warning.
const SLOW_SELECT: Duration = Duration::from_secs(2);

/// Raw error bodies (HTML gateway pages etc.) are cut to this many characters.
const MAX_ERROR_BODY: usize = 200;

const APIKEY: &str = "apikey";

/// A session bound to one project endpoint and API key.
///
/// Construction only prepares the underlying HTTP client; no request is made
/// until [`SupabaseClient::select`] is called.
pub struct SupabaseClient {
    http: reqwest::Client,
    rest_base: Url,
}

impl SupabaseClient {
    pub fn new(
        endpoint: &str,
        credential: &Credential,
        timeout: Option<Duration>,
    ) -> Result<Self, ProbeError> {
        let rest_base = rest_base(endpoint)?;

        let key = credential.expose();
        let mut apikey = HeaderValue::from_str(key).map_err(|_| ProbeError::InvalidCredential)?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ProbeError::InvalidCredential)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(APIKEY), apikey);
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        debug!(rest_base = %rest_base, timeout = ?timeout, "Supabase session prepared");
        Ok(Self { http, rest_base })
    }

    /// Base URL every table path is joined onto, e.g. `https://ref.supabase.co/rest/v1`.
    pub fn rest_base(&self) -> &Url {
        &self.rest_base
    }

    /// Full request URL for a query: `{rest_base}/{table}?select=...[&limit=...]`.
    pub fn table_url(&self, query: &Query) -> Result<Url, ProbeError> {
        let mut url = self.rest_base.clone();
        url.path_segments_mut()
            .map_err(|_| ProbeError::InvalidEndpoint {
                url: self.rest_base.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .push(&query.table);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &query.columns);
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        Ok(url)
    }

    /// Run a read-only select and decode the returned rows.
    pub async fn select(&self, query: &Query) -> Result<Vec<Row>, ProbeError> {
        let url = self.table_url(query)?;
        let start = Instant::now();

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let elapsed = start.elapsed();
        if elapsed > SLOW_SELECT {
            warn!(table = %query.table, duration = ?elapsed, "slow table select");
        }
        trace!(
            table = %query.table,
            status = status.as_u16(),
            bytes = body.len(),
            duration = ?elapsed,
            "select completed"
        );

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        parse_json_with_context(&body).map_err(|source| ProbeError::MalformedResponse {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TableReader for SupabaseClient {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, ProbeError> {
        SupabaseClient::select(self, query).await
    }
}

/// Parse the project endpoint and append the REST prefix, keeping any sub-path.
fn rest_base(endpoint: &str) -> Result<Url, ProbeError> {
    let invalid = |reason: String| ProbeError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["rest", "v1"]);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Turn a non-2xx response into a classified error with a one-line message.
fn error_for_status(status: StatusCode, body: &str) -> ProbeError {
    let message = match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            debug!(
                status = status.as_u16(),
                code = ?err.code,
                details = ?err.details,
                "PostgREST error body"
            );
            match err.hint.filter(|h| !h.trim().is_empty()) {
                Some(hint) => format!("{} (hint: {hint})", err.message),
                None => err.message,
            }
        }
        Err(_) if !body.trim().is_empty() => truncate_chars(body.trim(), MAX_ERROR_BODY),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string(),
    };
    let message = message.split_whitespace().collect::<Vec<_>>().join(" ");
    let unauthorized = status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;
    let status = status.as_u16();

    if unauthorized {
        ProbeError::Unauthorized { status, message }
    } else {
        ProbeError::Query { status, message }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> SupabaseClient {
        SupabaseClient::new(endpoint, &Credential::new("anon-key"), None).unwrap()
    }

    #[test]
    fn test_rest_base_plain_host() {
        let c = client("https://oxizvwxyblaaacaojzzd.supabase.co");
        assert_eq!(
            c.rest_base().as_str(),
            "https://oxizvwxyblaaacaojzzd.supabase.co/rest/v1"
        );
    }

    #[test]
    fn test_rest_base_keeps_subpath() {
        let c = client("http://localhost:54321/proxy/");
        assert_eq!(c.rest_base().as_str(), "http://localhost:54321/proxy/rest/v1");
    }

    #[test]
    fn test_table_url_select_all() {
        let c = client("https://example.supabase.co");
        let url = c.table_url(&Query::select_all("categories")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.supabase.co/rest/v1/categories?select=*"
        );
    }

    #[test]
    fn test_table_url_with_limit_and_columns() {
        let c = client("https://example.supabase.co");
        let query = Query::select_all("events").columns("id").limit(Some(1));
        let url = c.table_url(&query).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.supabase.co/rest/v1/events?select=id&limit=1"
        );
    }

    #[test]
    fn test_malformed_endpoint_is_rejected() {
        let err = SupabaseClient::new("not a url", &Credential::new("k"), None)
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::InvalidEndpoint { .. }));

        let err = SupabaseClient::new("mailto:someone@example.com", &Credential::new("k"), None)
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_credential_with_newline_is_rejected() {
        let err = SupabaseClient::new("https://example.invalid", &Credential::new("bad\ntoken"), None)
            .err()
            .unwrap();
        assert!(matches!(err, ProbeError::InvalidCredential));
    }

    #[test]
    fn test_error_for_status_unauthorized() {
        let body = r#"{"message":"Invalid API key","hint":"Double check your Supabase `anon` or `service_role` API key."}"#;
        match error_for_status(StatusCode::UNAUTHORIZED, body) {
            ProbeError::Unauthorized { status, message } => {
                assert_eq!(status, 401);
                assert!(message.starts_with("Invalid API key (hint: "));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_query() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public.categories\" does not exist"}"#;
        match error_for_status(StatusCode::NOT_FOUND, body) {
            ProbeError::Query { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "relation \"public.categories\" does not exist");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_raw_body() {
        let body = "<html>\n<body>Bad Gateway</body>\n</html>";
        match error_for_status(StatusCode::BAD_GATEWAY, body) {
            ProbeError::Query { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "<html> <body>Bad Gateway</body> </html>");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_empty_body() {
        let err = error_for_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.to_string(), "query failed (503): Service Unavailable");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("ação", 2), "aç...");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
