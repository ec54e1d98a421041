//! File-backed cache of raw OpenAPI documents

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::error::{IntrospectionError, IntrospectionResult};

/// Stores one pretty-printed JSON document per API base URL
///
/// Files are named `schema_{hash}.json` where `hash` is the first eight hex
/// characters of the SHA-256 of the base URL. A file is fresh while its
/// modification time is younger than the TTL.
#[derive(Debug, Clone)]
pub struct SchemaFileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl SchemaFileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a base URL
    pub fn path_for(&self, base_url: &str) -> PathBuf {
        let digest = format!("{:x}", Sha256::digest(base_url.as_bytes()));
        self.dir.join(format!("schema_{}.json", &digest[..8]))
    }

    /// Fresh cached document, if any
    ///
    /// Missing, expired and unreadable files all count as a miss.
    pub fn load(&self, base_url: &str) -> Option<Value> {
        let path = self.path_for(base_url);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            tracing::debug!("Cache file expired: {}", path.display());
            return None;
        }

        let loaded = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));
        match loaded {
            Ok(spec) => {
                tracing::debug!("Loaded schema from cache file: {}", path.display());
                Some(spec)
            }
            Err(e) => {
                tracing::warn!("Error loading cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write a document, creating the cache directory when needed
    pub fn save(&self, base_url: &str, spec: &Value) -> IntrospectionResult<PathBuf> {
        let path = self.path_for(base_url);
        let cache_error = |message: String| IntrospectionError::Cache {
            path: path.clone(),
            message,
        };

        fs::create_dir_all(&self.dir).map_err(|e| cache_error(e.to_string()))?;
        let text = serde_json::to_string_pretty(spec).map_err(|e| cache_error(e.to_string()))?;
        fs::write(&path, text).map_err(|e| cache_error(e.to_string()))?;

        tracing::debug!("Saved schema to cache file: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_name_is_stable_hash() {
        let cache = SchemaFileCache::new("/tmp/c", Duration::from_secs(60));
        let a = cache.path_for("https://api.example.com");
        let b = cache.path_for("https://api.example.com");
        let c = cache.path_for("https://other.example.com");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("schema_") && name.ends_with(".json"));
        assert_eq!(name.len(), "schema_".len() + 8 + ".json".len());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = SchemaFileCache::new(dir.path().join("nested"), Duration::from_secs(3600));
        let spec = json!({"info": {"title": "ERP"}});

        assert!(cache.load("https://erp").is_none());
        let path = cache.save("https://erp", &spec).unwrap();
        assert!(fs::read_to_string(path).unwrap().contains("\n  \"info\""));
        assert_eq!(cache.load("https://erp"), Some(spec));
    }

    #[test]
    fn test_zero_ttl_is_always_stale() {
        let dir = TempDir::new().unwrap();
        let cache = SchemaFileCache::new(dir.path(), Duration::ZERO);
        cache.save("https://erp", &json!({})).unwrap();
        assert!(cache.load("https://erp").is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = SchemaFileCache::new(dir.path(), Duration::from_secs(3600));
        fs::write(cache.path_for("https://erp"), "{not json").unwrap();
        assert!(cache.load("https://erp").is_none());
    }
}
