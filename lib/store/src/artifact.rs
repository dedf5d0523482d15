//! Persisted index artifacts
//!
//! Durable stores rewrite their artifacts wholesale on every `load` - never
//! patched in place. Writes go through a temp file and an atomic rename so a
//! torn write cannot masquerade as a valid database. Every artifact records
//! the embedding model and dimensionality it was built with; reuse under a
//! different model is refused.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use fincabot_core::{Error, Listing, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Database file of the approximate-index store. Its presence is the sole
/// freshness signal for that backend.
pub const HNSW_DB_FILE: &str = "listings.db";

/// Index artifact of the flat store: vectors and ids.
pub const FLAT_INDEX_FILE: &str = "index.bin";

/// Side-table artifact of the flat store: the full listing records. Both
/// flat artifacts must exist for the store to count as loaded.
pub const FLAT_DOCS_FILE: &str = "listings.bin";

/// One indexed document of the approximate store: the embedded vector plus
/// the flat scalar attribute map it is reconstructed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub attributes: BTreeMap<String, String>,
}

/// On-disk snapshot of the approximate-index store.
#[derive(Debug, Serialize, Deserialize)]
pub struct HnswArtifact {
    pub model: String,
    pub dim: usize,
    pub entries: Vec<DocEntry>,
}

/// On-disk index of the flat store.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatIndexArtifact {
    pub model: String,
    pub dim: usize,
    pub ids: Vec<String>,
    pub vectors: Vec<Vec<f32>>,
}

/// On-disk side table of the flat store.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlatDocsArtifact {
    pub listings: Vec<Listing>,
}

/// Serialize and atomically replace the artifact at `path`.
pub fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| file.write_all(&data))
        .map_err(|e| Error::Artifact(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

/// Read and deserialize the artifact at `path`.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read(path)?;
    bincode::deserialize(&data)
        .map_err(|e| Error::Artifact(format!("failed to read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HNSW_DB_FILE);

        let artifact = HnswArtifact {
            model: "trigram-en-256".to_string(),
            dim: 256,
            entries: vec![DocEntry {
                id: "1".to_string(),
                vector: vec![0.5; 256],
                attributes: BTreeMap::from([("town".to_string(), "Guardamar".to_string())]),
            }],
        };

        write(&path, &artifact).unwrap();
        let restored: HnswArtifact = read(&path).unwrap();
        assert_eq!(restored.model, "trigram-en-256");
        assert_eq!(restored.entries.len(), 1);
        assert_eq!(restored.entries[0].attributes["town"], "Guardamar");
    }

    #[test]
    fn test_corrupt_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HNSW_DB_FILE);
        std::fs::write(&path, b"not an artifact").unwrap();

        assert!(read::<HnswArtifact>(&path).is_err());
    }
}
