//! Store contract and construction
//!
//! One store instance pins one backend, one storage mode and one embedding
//! model for its whole lifetime. Load and clear must be serialized relative
//! to search by the owning process; concurrent read-only searches on a
//! loaded store are safe.

use crate::artifact::{FLAT_DOCS_FILE, FLAT_INDEX_FILE, HNSW_DB_FILE};
use crate::flat_store::FlatListingStore;
use crate::hnsw_store::HnswListingStore;
use fincabot_core::{Error, Listing, ListingMatch, Result, TextEmbedder};
use std::path::{Path, PathBuf};

/// Where a store keeps its index, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// In-process only; gone when the process exits.
    Volatile,
    /// Persisted under the given directory. The store owns the directory
    /// exclusively; it is not safe to share across processes.
    Durable(PathBuf),
}

impl StorageMode {
    #[inline]
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, StorageMode::Durable(_))
    }

    /// Resolve the storage mode. Precedence: explicit override, then the
    /// environment, then probing the data directory for an existing
    /// artifact (present means durable).
    pub fn resolve(
        explicit: Option<&str>,
        env: Option<&str>,
        data_dir: &Path,
        backend: BackendKind,
    ) -> Result<Self> {
        match explicit.or(env) {
            Some("memory") => Ok(StorageMode::Volatile),
            Some("disk") => Ok(StorageMode::Durable(data_dir.to_path_buf())),
            Some(other) => Err(Error::InvalidConfig(format!(
                "unknown storage mode: {other} (expected memory or disk)"
            ))),
            None => {
                if backend.artifacts_present(data_dir) {
                    Ok(StorageMode::Durable(data_dir.to_path_buf()))
                } else {
                    Ok(StorageMode::Volatile)
                }
            }
        }
    }
}

/// Index backend variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hnsw,
    Flat,
}

impl BackendKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hnsw" => Ok(BackendKind::Hnsw),
            "flat" => Ok(BackendKind::Flat),
            other => Err(Error::InvalidConfig(format!(
                "unknown backend: {other} (expected hnsw or flat)"
            ))),
        }
    }

    /// True when the backend's durable artifacts all exist under `dir`.
    #[must_use]
    pub fn artifacts_present(&self, dir: &Path) -> bool {
        match self {
            BackendKind::Hnsw => dir.join(HNSW_DB_FILE).exists(),
            BackendKind::Flat => {
                dir.join(FLAT_INDEX_FILE).exists() && dir.join(FLAT_DOCS_FILE).exists()
            }
        }
    }
}

/// Capability surface of a listing store.
pub trait ListingStore: Send + Sync {
    /// True iff there is no discoverable data: the durable artifact(s) are
    /// absent, or a volatile store has never been populated. A `false`
    /// result means an index exists - not that it is fresh or complete.
    fn needs_loading(&self) -> bool;

    /// Replace all prior content with `listings`.
    ///
    /// An empty set is refused so a broken parser upstream cannot silently
    /// produce an empty index. The replace is not atomic: a crash between
    /// discarding the old artifacts and writing the new ones leaves the
    /// store observably empty on the next [`needs_loading`] check.
    ///
    /// [`needs_loading`]: ListingStore::needs_loading
    fn load(&self, listings: &[Listing]) -> Result<()>;

    /// Discard all content, returning to the empty state. Safe to call on
    /// an already-empty store.
    fn clear(&self) -> Result<()>;

    /// Retrieve the `top_k` most relevant listings for a free-text query.
    ///
    /// The query is embedded with the model pinned at construction.
    /// Returns an empty list - never an error - when the store holds no
    /// data, when fewer than `top_k` documents exist (what is available is
    /// returned), or when the backend faults internally (the fault is
    /// logged). Scores are higher-is-better for both backends.
    fn search(&self, query: &str, top_k: usize) -> Vec<ListingMatch>;

    /// Number of documents currently indexed.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier of the embedding model pinned to this store.
    fn model_name(&self) -> &str;
}

/// Construction-time store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub mode: StorageMode,
    pub embed_model: String,
}

/// Build the configured store variant.
pub fn create_store(config: &StoreConfig) -> Result<Box<dyn ListingStore>> {
    let embedder = TextEmbedder::new(&config.embed_model)?;
    match config.backend {
        BackendKind::Hnsw => Ok(Box::new(HnswListingStore::new(
            embedder,
            config.mode.clone(),
        )?)),
        BackendKind::Flat => Ok(Box::new(FlatListingStore::new(
            embedder,
            config.mode.clone(),
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(BackendKind::parse("hnsw").unwrap(), BackendKind::Hnsw);
        assert_eq!(BackendKind::parse("flat").unwrap(), BackendKind::Flat);
        assert!(BackendKind::parse("ivf").is_err());
    }

    #[test]
    fn test_mode_explicit_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mode = StorageMode::resolve(
            Some("memory"),
            Some("disk"),
            dir.path(),
            BackendKind::Hnsw,
        )
        .unwrap();
        assert_eq!(mode, StorageMode::Volatile);
    }

    #[test]
    fn test_mode_environment_beats_probing() {
        let dir = tempfile::tempdir().unwrap();
        let mode =
            StorageMode::resolve(None, Some("disk"), dir.path(), BackendKind::Hnsw).unwrap();
        assert_eq!(mode, StorageMode::Durable(dir.path().to_path_buf()));
    }

    #[test]
    fn test_mode_probes_for_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mode = StorageMode::resolve(None, None, dir.path(), BackendKind::Hnsw).unwrap();
        assert_eq!(mode, StorageMode::Volatile);

        std::fs::write(dir.path().join(HNSW_DB_FILE), b"").unwrap();
        let mode = StorageMode::resolve(None, None, dir.path(), BackendKind::Hnsw).unwrap();
        assert!(mode.is_durable());
    }

    #[test]
    fn test_flat_probe_requires_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FLAT_INDEX_FILE), b"").unwrap();
        assert!(!BackendKind::Flat.artifacts_present(dir.path()));

        std::fs::write(dir.path().join(FLAT_DOCS_FILE), b"").unwrap();
        assert!(BackendKind::Flat.artifacts_present(dir.path()));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StorageMode::resolve(Some("cloud"), None, dir.path(), BackendKind::Flat).is_err());
    }
}
