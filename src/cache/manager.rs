//! Cache manager for persisting raw API responses to disk
//!
//! Provides a `CacheManager` that gates each fetch on the existence of its
//! output file and writes fetched documents as 4-space indented JSON.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when reading or writing cache files
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to serialize the document
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Identifies one cache file by entity name and source tag
///
/// The file name is always `<entity>-<tag>.<extension>`, so a fixed entity
/// and tag map to the same path on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    entity: String,
    tag: String,
    extension: &'static str,
}

impl CacheKey {
    /// Key for a JSON document
    pub fn json(entity: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            tag: tag.into(),
            extension: "json",
        }
    }

    /// Key for an SVG image
    pub fn svg(entity: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            tag: tag.into(),
            extension: "svg",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.{}", self.entity, self.tag, self.extension)
    }
}

/// Whether a gated step touched the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The file already existed and was left alone
    Hit,
    /// The file was (re)written during this run
    Fetched,
}

/// Result of one cache-gated step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub path: PathBuf,
    pub status: CacheStatus,
}

/// Manages the results directory holding cached responses
///
/// An existing file is authoritative: there is no expiry, checksum or
/// revalidation. Only `force` causes an existing file to be refetched and
/// overwritten.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where result files are stored
    cache_dir: PathBuf,
    /// Refetch even when a file exists
    force: bool,
}

impl CacheManager {
    /// Creates a CacheManager writing into `cache_dir`
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            force: false,
        }
    }

    /// Sets whether existing files are refetched
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// Returns the path of the file for the given key
    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// True when the file exists and no refresh was requested
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        !self.force && self.path(key).exists()
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| CacheError::io(&self.cache_dir, e))
    }

    /// Writes `data` as JSON indented with four spaces
    ///
    /// # Returns
    /// * `Ok(PathBuf)` with the written path
    /// * `Err` if directory creation, serialization or the write fails
    pub fn write_json<T: Serialize>(
        &self,
        key: &CacheKey,
        data: &T,
    ) -> Result<PathBuf, CacheError> {
        let json = to_pretty_json(data)?;
        self.write_bytes(key, &json)
    }

    /// Writes text content verbatim
    pub fn write_text(&self, key: &CacheKey, text: &str) -> Result<PathBuf, CacheError> {
        self.write_bytes(key, text.as_bytes())
    }

    fn write_bytes(&self, key: &CacheKey, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        self.ensure_dir()?;
        let path = self.path(key);
        fs::write(&path, bytes).map_err(|e| CacheError::io(&path, e))?;
        Ok(path)
    }

    /// Runs `fetch` and writes its result, unless the file is already cached
    ///
    /// # Arguments
    /// * `key` - Cache file to produce
    /// * `label` - Human-readable description used in log lines (e.g., "ChEMBL data for ADRB2")
    /// * `fetch` - Performs the network work; only called on a miss
    pub async fn fetch_json<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        label: &str,
        fetch: F,
    ) -> Result<CacheOutcome, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let path = self.path(key);
        if self.is_cached(key) {
            debug!(path = %path.display(), "Using cached {}", label);
            return Ok(CacheOutcome {
                path,
                status: CacheStatus::Hit,
            });
        }

        let start = Instant::now();
        info!("Getting {}", label);
        let data = fetch().await?;
        let path = self.write_json(key, &data)?;
        info!("Got {} in {:.2} seconds", label, start.elapsed().as_secs_f64());

        Ok(CacheOutcome {
            path,
            status: CacheStatus::Fetched,
        })
    }

    /// Like `fetch_json`, for responses stored as plain text
    pub async fn fetch_text<E, F, Fut>(
        &self,
        key: &CacheKey,
        label: &str,
        fetch: F,
    ) -> Result<CacheOutcome, E>
    where
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let path = self.path(key);
        if self.is_cached(key) {
            debug!(path = %path.display(), "Using cached {}", label);
            return Ok(CacheOutcome {
                path,
                status: CacheStatus::Hit,
            });
        }

        let start = Instant::now();
        info!("Getting {}", label);
        let text = fetch().await?;
        let path = self.write_text(key, &text)?;
        info!("Got {} in {:.2} seconds", label, start.elapsed().as_secs_f64());

        Ok(CacheOutcome {
            path,
            status: CacheStatus::Fetched,
        })
    }

    /// Copies a file already on disk into the cache
    ///
    /// A missing source is an error.
    pub fn copy_file(&self, source: &Path, key: &CacheKey) -> Result<CacheOutcome, CacheError> {
        let path = self.path(key);
        if self.is_cached(key) {
            debug!(path = %path.display(), "Using cached copy of {}", source.display());
            return Ok(CacheOutcome {
                path,
                status: CacheStatus::Hit,
            });
        }

        info!("Copying {} to {}", source.display(), path.display());
        self.ensure_dir()?;
        fs::copy(source, &path).map_err(|e| CacheError::io(source, e))?;

        Ok(CacheOutcome {
            path,
            status: CacheStatus::Fetched,
        })
    }
}

/// Serializes with a four-space indent
pub fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn create_test_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    fn read_json(cache: &CacheManager, key: &CacheKey) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(cache.path(key)).unwrap()).unwrap()
    }

    #[test]
    fn test_key_file_name_is_entity_dash_tag() {
        assert_eq!(CacheKey::json("ADRB2", "chembl").file_name(), "ADRB2-chembl.json");
        assert_eq!(
            CacheKey::svg("ALBUTEROL", "chembl").file_name(),
            "ALBUTEROL-chembl.svg"
        );
        assert_eq!(
            CacheKey::json("open-targets", "example-associatedTargets").file_name(),
            "open-targets-example-associatedTargets.json"
        );
    }

    #[test]
    fn test_path_is_deterministic() {
        let (cache, temp_dir) = create_test_cache();
        let key = CacheKey::json("KCNK3", "open-targets-target");

        let first = cache.path(&key);
        let second = cache.path(&CacheKey::json("KCNK3", "open-targets-target"));

        assert_eq!(first, second);
        assert_eq!(first, temp_dir.path().join("KCNK3-open-targets-target.json"));
    }

    #[test]
    fn test_write_json_uses_four_space_indent() {
        let (cache, temp_dir) = create_test_cache();
        let key = CacheKey::json("test", "indent");

        cache
            .write_json(&key, &json!({"outer": {"inner": 1}}))
            .expect("Write should succeed");

        let content = fs::read_to_string(temp_dir.path().join("test-indent.json")).unwrap();
        assert_eq!(content, "{\n    \"outer\": {\n        \"inner\": 1\n    }\n}");
    }

    #[test]
    fn test_write_json_preserves_key_order() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::json("test", "order");
        let data: serde_json::Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();

        let path = cache.write_json(&key, &data).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let zeta = content.find("zeta").unwrap();
        let alpha = content.find("alpha").unwrap();
        let mid = content.find("mid").unwrap();
        assert!(zeta < alpha && alpha < mid, "Key order should be kept: {}", content);
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("results");
        let cache = CacheManager::with_dir(nested_path.clone());

        cache
            .write_json(&CacheKey::json("nested", "key"), &json!([1, 2]))
            .expect("Write should succeed");

        assert!(nested_path.join("nested-key.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_json_writes_on_miss() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::json("ADRB2", "test");

        let outcome = cache
            .fetch_json(&key, "test data", || async {
                Ok::<_, CacheError>(json!({"id": "ENSG00000169252"}))
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, CacheStatus::Fetched);
        assert_eq!(read_json(&cache, &key), json!({"id": "ENSG00000169252"}));
    }

    #[tokio::test]
    async fn test_fetch_json_skips_existing_file() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::json("ADRB2", "test");
        cache.write_json(&key, &json!({"cached": true})).unwrap();
        let calls = Cell::new(0);

        let outcome = cache
            .fetch_json(&key, "test data", || async {
                calls.set(calls.get() + 1);
                Ok::<_, CacheError>(json!({"cached": false}))
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, CacheStatus::Hit);
        assert_eq!(calls.get(), 0, "Fetch should not run on a cache hit");
        assert_eq!(read_json(&cache, &key), json!({"cached": true}));
    }

    #[tokio::test]
    async fn test_fetch_json_force_overwrites_existing_file() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::json("ADRB2", "test");
        cache.write_json(&key, &json!({"version": 1})).unwrap();
        let cache = cache.with_force(true);

        let outcome = cache
            .fetch_json(&key, "test data", || async {
                Ok::<_, CacheError>(json!({"version": 2}))
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, CacheStatus::Fetched);
        assert_eq!(read_json(&cache, &key), json!({"version": 2}));
    }

    #[tokio::test]
    async fn test_fetch_json_failure_leaves_no_file() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::json("ADRB2", "failing");

        let result = cache
            .fetch_json(&key, "failing data", || async {
                Err::<serde_json::Value, _>(CacheError::io(
                    Path::new("remote"),
                    io::Error::new(io::ErrorKind::Other, "boom"),
                ))
            })
            .await;

        assert!(result.is_err());
        assert!(!cache.path(&key).exists());
    }

    #[tokio::test]
    async fn test_fetch_text_writes_verbatim() {
        let (cache, _temp_dir) = create_test_cache();
        let key = CacheKey::svg("ALBUTEROL", "chembl");

        cache
            .fetch_text(&key, "image", || async {
                Ok::<_, CacheError>("<svg></svg>".to_string())
            })
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(cache.path(&key)).unwrap(), "<svg></svg>");
    }

    #[test]
    fn test_copy_file_copies_and_then_hits() {
        let (cache, temp_dir) = create_test_cache();
        let source = temp_dir.path().join("source.json");
        fs::write(&source, "{\"a\": 1}").unwrap();
        let key = CacheKey::json("ALBUTEROL", "ncats-figshare");

        let first = cache.copy_file(&source, &key).unwrap();
        let second = cache.copy_file(&source, &key).unwrap();

        assert_eq!(first.status, CacheStatus::Fetched);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(fs::read_to_string(first.path).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_copy_file_missing_source_is_error() {
        let (cache, temp_dir) = create_test_cache();
        let source = temp_dir.path().join("does-not-exist.json");

        let result = cache.copy_file(&source, &CacheKey::json("X", "copy"));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("does-not-exist.json"));
    }
}
