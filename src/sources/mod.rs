//! Data sources
//!
//! Each source turns one resolved entity into a handful of cache-gated
//! fetch steps and returns what each step did.

pub mod chembl;
pub mod gget;
pub mod ncats;
pub mod open_targets;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::cache::{CacheError, CacheManager};
use crate::client::{self, Endpoints, FetchError, Transport};
use crate::graphql::GraphQlClient;
use crate::resolve::ResolveError;

pub use chembl::ChemblRequest;
pub use gget::GgetRequest;
pub use ncats::NcatsRequest;
pub use open_targets::OpenTargetsRequest;

/// Errors that abort a source run
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A base64 field could not be decoded
    #[error("Failed to decode base64 field: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Decoded bytes were not UTF-8
    #[error("Decoded field is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A local document could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A local document could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Shared handles every source needs
#[derive(Clone, Copy)]
pub struct SourceContext<'a> {
    pub transport: &'a dyn Transport,
    pub cache: &'a CacheManager,
    pub endpoints: &'a Endpoints,
}

impl<'a> SourceContext<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        cache: &'a CacheManager,
        endpoints: &'a Endpoints,
    ) -> Self {
        Self {
            transport,
            cache,
            endpoints,
        }
    }

    /// GET `url` and parse the body as JSON
    pub async fn get_json(&self, url: &Url) -> Result<Value, SourceError> {
        Ok(client::get_json(self.transport, url).await?)
    }

    /// GraphQL client for the Open Targets endpoint
    pub fn open_targets(&self) -> Result<GraphQlClient<'a>, SourceError> {
        Ok(GraphQlClient::new(self.transport, &self.endpoints.open_targets)?)
    }
}
