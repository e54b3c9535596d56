//! HTTP transport shared by every data source
//!
//! Sources talk to the network only through the `Transport` trait, so the
//! cache-gated steps can be exercised against a stub in tests.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Base URL for the ChEMBL REST API
pub const CHEMBL_BASE_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

/// Open Targets Platform GraphQL endpoint
pub const OPEN_TARGETS_GRAPHQL_URL: &str = "https://api.platform.opentargets.org/api/v4/graphql";

/// Base URL for the NCATS Inxight Drugs API
pub const NCATS_BASE_URL: &str = "https://drugs.ncats.io/api/v1";

/// Errors that can occur when fetching a remote resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Could not build a request URL
    #[error("Invalid URL {0}")]
    InvalidUrl(String),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// A list that must have at least one element was empty
    #[error("No results for {0}")]
    EmptyResult(String),

    /// GraphQL endpoint reported errors and no data
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),
}

/// Endpoint roots for each data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub chembl: String,
    pub open_targets: String,
    pub ncats: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            chembl: CHEMBL_BASE_URL.to_string(),
            open_targets: OPEN_TARGETS_GRAPHQL_URL.to_string(),
            ncats: NCATS_BASE_URL.to_string(),
        }
    }
}

/// Performs raw HTTP exchanges and returns response bodies
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body of a successful response
    async fn get(&self, url: &Url) -> Result<String, FetchError>;

    /// POST `body` as JSON to `url` and return the body of a successful response
    async fn post_json(&self, url: &Url, body: &Value) -> Result<String, FetchError>;
}

/// reqwest-backed transport used outside of tests
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport identifying itself by crate name and version
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn into_text(response: reqwest::Response) -> Result<String, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: response.url().to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        Self::into_text(response).await
    }

    async fn post_json(&self, url: &Url, body: &Value) -> Result<String, FetchError> {
        debug!(%url, "POST");
        let response = self.client.post(url.clone()).json(body).send().await?;
        Self::into_text(response).await
    }
}

/// Joins `base` and `path` and appends URL-encoded query parameters
pub fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    url.map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// GET `url` and parse the body as JSON
pub async fn get_json(transport: &dyn Transport, url: &Url) -> Result<Value, FetchError> {
    let text = transport.get(url).await?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned-response transport for exercising sources offline

    use super::*;
    use std::sync::Mutex;

    /// Answers requests from a list of `(fragment, body)` pairs
    ///
    /// A GET matches when the fragment occurs in the URL; a POST matches when
    /// it occurs in the serialized request body. Unmatched requests get a 404.
    #[derive(Debug, Default)]
    pub struct StubTransport {
        gets: Vec<(String, String)>,
        posts: Vec<(String, String)>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_get(mut self, fragment: &str, body: impl Into<String>) -> Self {
            self.gets.push((fragment.to_string(), body.into()));
            self
        }

        pub fn on_post(mut self, fragment: &str, body: impl Into<String>) -> Self {
            self.posts.push((fragment.to_string(), body.into()));
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn answer(
            &self,
            routes: &[(String, String)],
            url: &Url,
            haystack: &str,
        ) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            routes
                .iter()
                .find(|(fragment, _)| haystack.contains(fragment.as_str()))
                .map(|(_, body)| body.clone())
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, url: &Url) -> Result<String, FetchError> {
            self.answer(&self.gets, url, url.as_str())
        }

        async fn post_json(&self, url: &Url, body: &Value) -> Result<String, FetchError> {
            self.answer(&self.posts, url, &body.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StubTransport;
    use super::*;

    #[test]
    fn test_endpoints_default() {
        let endpoints = Endpoints::default();
        assert!(endpoints.chembl.contains("ebi.ac.uk/chembl"));
        assert!(endpoints.open_targets.ends_with("/graphql"));
        assert!(endpoints.ncats.contains("drugs.ncats.io"));
    }

    #[test]
    fn test_build_url_encodes_params() {
        let url = build_url(
            CHEMBL_BASE_URL,
            "target.json",
            &[("organism__exact", "Homo sapiens"), ("only", "organism,target_chembl_id")],
        )
        .unwrap();

        assert!(url.as_str().starts_with("https://www.ebi.ac.uk/chembl/api/data/target.json?"));
        assert!(url.as_str().contains("organism__exact=Homo+sapiens"));
        assert!(url.as_str().contains("only=organism%2Ctarget_chembl_id"));
    }

    #[test]
    fn test_build_url_without_params_has_no_query() {
        let url = build_url("https://example.org/api/", "/image/CHEMBL714.svg", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/image/CHEMBL714.svg");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_build_url_keeps_parenthesized_path() {
        let url = build_url(NCATS_BASE_URL, "substances(QF8SVZ843E)", &[("view", "full")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://drugs.ncats.io/api/v1/substances(QF8SVZ843E)?view=full"
        );
    }

    #[test]
    fn test_build_url_invalid_base() {
        let result = build_url("not a url", "x", &[]);
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_get_json_parses_body() {
        let stub = StubTransport::new().on_get("/thing", r#"{"ok": true}"#);
        let url = Url::parse("https://example.org/thing").unwrap();

        let value = get_json(&stub, &url).await.unwrap();

        assert_eq!(value, serde_json::json!({"ok": true}));
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        let stub = StubTransport::new().on_get("/thing", "not json");
        let url = Url::parse("https://example.org/thing").unwrap();

        let result = get_json(&stub, &url).await;

        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unmatched_request_is_status_error() {
        let stub = StubTransport::new();
        let url = Url::parse("https://example.org/missing").unwrap();

        let err = get_json(&stub, &url).await.unwrap_err();

        assert!(err.to_string().contains("404"));
    }
}
