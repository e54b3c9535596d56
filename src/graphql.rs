//! Open Targets GraphQL client
//!
//! Posts a query document plus variables to the Platform endpoint and hands
//! back the `data` member of the response.

use reqwest::Url;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::client::{FetchError, Transport};

/// A named, static GraphQL query with fixed variables
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDefinition {
    /// Identifier used in the output file name
    pub name: &'static str,
    /// Free-text description of what the query is for
    pub purpose: &'static str,
    /// GraphQL variables, keyed by variable name
    pub variables: Value,
    /// The GraphQL document
    pub query_string: &'static str,
}

/// Document written for each example or gget query
#[derive(Debug, Serialize)]
pub struct QueryResult<'a> {
    pub purpose: &'a str,
    pub variables: &'a Value,
    pub data: Value,
}

/// Client for one GraphQL endpoint
pub struct GraphQlClient<'a> {
    transport: &'a dyn Transport,
    url: Url,
}

impl<'a> GraphQlClient<'a> {
    pub fn new(transport: &'a dyn Transport, endpoint: &str) -> Result<Self, FetchError> {
        let url = Url::parse(endpoint)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        Ok(Self { transport, url })
    }

    /// Runs `query_string` with `variables` and returns the response's `data`
    ///
    /// # Returns
    /// * `Ok(Value)` - The `data` member, which may be `null` when the API returned neither
    ///   data nor errors
    /// * `Err(FetchError::GraphQl)` - If `data` is absent or null and the response carries errors
    /// * `Err(FetchError::MissingField)` - If the response has no `data` member at all
    pub async fn query(&self, query_string: &str, variables: &Value) -> Result<Value, FetchError> {
        let body = json!({ "query": query_string, "variables": variables });
        let text = self.transport.post_json(&self.url, &body).await?;
        let response: Value = serde_json::from_str(&text)?;
        extract_data(response)
    }

    /// Runs a stored query and wraps the result with its purpose and variables
    pub async fn run<'q>(
        &self,
        definition: &'q QueryDefinition,
    ) -> Result<QueryResult<'q>, FetchError> {
        let data = self
            .query(definition.query_string, &definition.variables)
            .await?;
        Ok(QueryResult {
            purpose: definition.purpose,
            variables: &definition.variables,
            data,
        })
    }
}

/// Pulls `data` out of a GraphQL response body
fn extract_data(mut response: Value) -> Result<Value, FetchError> {
    let errors = error_messages(&response);
    match response.get_mut("data").map(Value::take) {
        Some(Value::Null) | None if !errors.is_empty() => {
            Err(FetchError::GraphQl(errors.join("; ")))
        }
        None => Err(FetchError::MissingField("data".to_string())),
        Some(data) => {
            if !errors.is_empty() {
                warn!("GraphQL response carried errors: {}", errors.join("; "));
            }
            Ok(data)
        }
    }
}

fn error_messages(response: &Value) -> Vec<String> {
    response
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(String::from)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}
