//! Flat-index listing store
//!
//! Exact nearest neighbor by brute-force L2 scan. The index stores ids and
//! vectors only; full listings live in an id-keyed side table, so matches
//! are reconstructed losslessly by lookup. Durable mode writes two sibling
//! artifacts - the index and the side table - and both must exist for the
//! store to count as loaded.
//!
//! The native metric is an unbounded L2 distance; it is converted to a
//! similarity in (0, 1] via `1 / (1 + distance)` before leaving the store,
//! so callers see higher-is-better like the approximate backend.

use crate::artifact::{self, FlatDocsArtifact, FlatIndexArtifact, FLAT_DOCS_FILE, FLAT_INDEX_FILE};
use crate::store::{ListingStore, StorageMode};
use fincabot_core::{vector, Error, Listing, ListingMatch, Result, TextEmbedder};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

struct Inner {
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    listings: HashMap<String, Listing>,
    populated: bool,
}

pub struct FlatListingStore {
    embedder: TextEmbedder,
    mode: StorageMode,
    inner: RwLock<Inner>,
}

impl FlatListingStore {
    pub fn new(embedder: TextEmbedder, mode: StorageMode) -> Result<Self> {
        if let StorageMode::Durable(dir) = &mode {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            embedder,
            mode,
            inner: RwLock::new(Inner {
                ids: Vec::new(),
                vectors: Vec::new(),
                listings: HashMap::new(),
                populated: false,
            }),
        })
    }

    fn paths(&self) -> Option<(PathBuf, PathBuf)> {
        match &self.mode {
            StorageMode::Durable(dir) => {
                Some((dir.join(FLAT_INDEX_FILE), dir.join(FLAT_DOCS_FILE)))
            }
            StorageMode::Volatile => None,
        }
    }

    fn verify_index(&self, persisted: &FlatIndexArtifact) -> Result<()> {
        if persisted.dim != self.embedder.dim() {
            return Err(Error::DimensionMismatch {
                expected: persisted.dim,
                actual: self.embedder.dim(),
            });
        }
        if persisted.model != self.embedder.model_name() {
            return Err(Error::Artifact(format!(
                "persisted index was built with model {}, store is pinned to {}",
                persisted.model,
                self.embedder.model_name()
            )));
        }
        Ok(())
    }

    fn ensure_open(&self, inner: &mut Inner) -> Result<()> {
        if inner.populated {
            return Ok(());
        }
        let Some((index_path, docs_path)) = self.paths() else {
            return Ok(());
        };
        if !index_path.exists() || !docs_path.exists() {
            return Ok(());
        }

        let index: FlatIndexArtifact = artifact::read(&index_path)?;
        self.verify_index(&index)?;
        let docs: FlatDocsArtifact = artifact::read(&docs_path)?;

        info!("Reopened flat index with {} documents", index.ids.len());
        inner.ids = index.ids;
        inner.vectors = index.vectors;
        inner.listings = docs
            .listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();
        inner.populated = true;
        Ok(())
    }
}

impl ListingStore for FlatListingStore {
    fn needs_loading(&self) -> bool {
        match &self.mode {
            StorageMode::Durable(dir) => {
                !dir.join(FLAT_INDEX_FILE).exists() || !dir.join(FLAT_DOCS_FILE).exists()
            }
            StorageMode::Volatile => !self.inner.read().populated,
        }
    }

    fn load(&self, listings: &[Listing]) -> Result<()> {
        if listings.is_empty() {
            return Err(Error::EmptyLoad);
        }

        if let Some((index_path, _)) = self.paths() {
            if index_path.exists() {
                match artifact::read::<FlatIndexArtifact>(&index_path) {
                    Ok(existing) => self.verify_index(&existing)?,
                    Err(e) => warn!("Replacing unreadable flat index: {e}"),
                }
            }
        }

        let ids: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();
        let vectors: Vec<Vec<f32>> = listings
            .iter()
            .map(|l| self.embedder.embed(&l.to_embedding_text()).as_slice().to_vec())
            .collect();
        let table: HashMap<String, Listing> = listings
            .iter()
            .map(|l| (l.id.clone(), l.clone()))
            .collect();

        // Discard both artifacts, then write index before side table; with
        // either file missing the store reads as needing a load.
        if let Some((index_path, docs_path)) = self.paths() {
            for path in [&index_path, &docs_path] {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
            artifact::write(
                &index_path,
                &FlatIndexArtifact {
                    model: self.embedder.model_name().to_string(),
                    dim: self.embedder.dim(),
                    ids: ids.clone(),
                    vectors: vectors.clone(),
                },
            )?;
            artifact::write(
                &docs_path,
                &FlatDocsArtifact {
                    listings: listings.to_vec(),
                },
            )?;
        }

        let count = ids.len();
        let mut inner = self.inner.write();
        inner.ids = ids;
        inner.vectors = vectors;
        inner.listings = table;
        inner.populated = true;
        info!("Indexed {count} listings (flat, {})", self.embedder.model_name());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Some((index_path, docs_path)) = self.paths() {
            for path in [index_path, docs_path] {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
            }
        }
        let mut inner = self.inner.write();
        inner.ids.clear();
        inner.vectors.clear();
        inner.listings.clear();
        inner.populated = false;
        Ok(())
    }

    fn search(&self, query: &str, top_k: usize) -> Vec<ListingMatch> {
        if top_k == 0 {
            return Vec::new();
        }

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Err(e) = self.ensure_open(inner) {
            error!("Search unavailable, cannot open flat index: {e}");
            return Vec::new();
        }
        if inner.ids.is_empty() {
            return Vec::new();
        }

        let query_vector = self.embedder.embed(query);
        let mut scored: Vec<(usize, f32)> = inner
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, vector::l2(query_vector.as_slice(), v)))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .filter_map(|(i, distance)| {
                let id = inner.ids.get(i)?;
                let listing = inner.listings.get(id)?.clone();
                Some(ListingMatch {
                    listing,
                    score: 1.0 / (1.0 + distance),
                })
            })
            .collect()
    }

    fn len(&self) -> usize {
        let mut inner = self.inner.write();
        if self.ensure_open(&mut inner).is_err() {
            return 0;
        }
        inner.ids.len()
    }

    fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fincabot_core::{PriceFrequency, DEFAULT_MODEL};
    use std::collections::BTreeMap;

    fn listing(id: &str, beds: u32, town: &str, price: f64) -> Listing {
        Listing {
            id: id.to_string(),
            reference: format!("R-{id}"),
            price,
            currency: "EUR".to_string(),
            price_freq: PriceFrequency::Sale,
            property_type: "Apartment".to_string(),
            town: town.to_string(),
            country: "Spain".to_string(),
            beds: Some(beds),
            baths: Some(1),
            descriptions: BTreeMap::from([(
                "es".to_string(),
                format!("Piso de {beds} dormitorios en {town}"),
            )]),
            name: format!("{town} apartment"),
            ..Listing::default()
        }
    }

    fn volatile_store() -> FlatListingStore {
        FlatListingStore::new(
            TextEmbedder::new(DEFAULT_MODEL).unwrap(),
            StorageMode::Volatile,
        )
        .unwrap()
    }

    #[test]
    fn test_lifecycle_volatile() {
        let store = volatile_store();
        assert!(store.needs_loading());

        store
            .load(&[listing("1", 2, "Guardamar", 140_000.0)])
            .unwrap();
        assert!(!store.needs_loading());

        store.clear().unwrap();
        assert!(store.needs_loading());
        store.clear().unwrap();
    }

    #[test]
    fn test_empty_load_is_refused() {
        let store = volatile_store();
        assert!(matches!(store.load(&[]), Err(Error::EmptyLoad)));
    }

    #[test]
    fn test_search_before_load_is_empty() {
        let store = volatile_store();
        assert!(store.search("villa with pool", 5).is_empty());
    }

    #[test]
    fn test_similarity_is_bounded_and_descending() {
        let store = volatile_store();
        store
            .load(&[
                listing("1", 2, "Guardamar", 140_000.0),
                listing("2", 3, "Torrevieja", 200_000.0),
                listing("3", 4, "Orihuela", 300_000.0),
            ])
            .unwrap();

        let matches = store.search("2 bedroom apartment Guardamar", 3);
        assert_eq!(matches.len(), 3);
        for m in &matches {
            assert!(m.score > 0.0 && m.score <= 1.0);
        }
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_matches_come_from_the_side_table() {
        let store = volatile_store();
        let mut original = listing("1", 2, "Guardamar", 140_000.0);
        // Secondary languages survive here: the side table keeps the full
        // record, nothing goes through the flattening codec.
        original
            .descriptions
            .insert("en".to_string(), "Two bed flat in Guardamar".to_string());
        store.load(std::slice::from_ref(&original)).unwrap();

        let matches = store.search("2 bedroom apartment Guardamar", 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].listing, original);
    }

    #[test]
    fn test_top_k_caps_results() {
        let store = volatile_store();
        store
            .load(&[
                listing("1", 2, "Guardamar", 140_000.0),
                listing("2", 3, "Torrevieja", 200_000.0),
            ])
            .unwrap();

        assert_eq!(store.search("apartment", 1).len(), 1);
        assert_eq!(store.search("apartment", 10).len(), 2);
    }
}
