//! Approximate-index listing store
//!
//! Every indexed document carries its flat attribute map, and matches are
//! reconstructed from those attributes through the codec - self-contained
//! but lossy per the codec conventions. The durable artifact is a single
//! database file whose presence is the sole freshness signal; a store
//! reopened over an existing file serves searches without an explicit
//! rebuild. The in-memory graph is built lazily on first search.

use crate::artifact::{self, DocEntry, HnswArtifact, HNSW_DB_FILE};
use crate::filter::AttributeFilter;
use crate::hnsw::HnswIndex;
use crate::store::{ListingStore, StorageMode};
use fincabot_core::{codec, Error, Listing, ListingMatch, Result, TextEmbedder};
use parking_lot::RwLock;
use std::path::PathBuf;
use tracing::{error, info, warn};

const MAX_CONNECTIONS: usize = 16;
const MAX_LAYERS: usize = 3;

struct Inner {
    docs: Vec<DocEntry>,
    /// Built on first search from `docs`; dropped on load/clear.
    index: Option<HnswIndex>,
    populated: bool,
}

pub struct HnswListingStore {
    embedder: TextEmbedder,
    mode: StorageMode,
    inner: RwLock<Inner>,
}

impl HnswListingStore {
    /// Directory creation failure is fatal: without the directory the store
    /// cannot guarantee exclusive ownership of its persistence path.
    pub fn new(embedder: TextEmbedder, mode: StorageMode) -> Result<Self> {
        if let StorageMode::Durable(dir) = &mode {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            embedder,
            mode,
            inner: RwLock::new(Inner {
                docs: Vec::new(),
                index: None,
                populated: false,
            }),
        })
    }

    fn db_path(&self) -> Option<PathBuf> {
        match &self.mode {
            StorageMode::Durable(dir) => Some(dir.join(HNSW_DB_FILE)),
            StorageMode::Volatile => None,
        }
    }

    fn verify_artifact(&self, persisted: &HnswArtifact) -> Result<()> {
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

    /// Pull a persisted database into memory if one exists and the store
    /// has not been populated in-process yet.
    fn ensure_open(&self, inner: &mut Inner) -> Result<()> {
        if inner.populated {
            return Ok(());
        }
        let Some(path) = self.db_path() else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let persisted: HnswArtifact = artifact::read(&path)?;
        self.verify_artifact(&persisted)?;
        info!(
            "Reopened listing database with {} documents",
            persisted.entries.len()
        );
        inner.docs = persisted.entries;
        inner.index = None;
        inner.populated = true;
        Ok(())
    }

    fn ensure_index(&self, inner: &mut Inner) {
        if inner.index.is_some() {
            return;
        }
        let mut index = HnswIndex::new(self.embedder.dim(), MAX_CONNECTIONS, MAX_LAYERS);
        for entry in &inner.docs {
            index.insert(&entry.vector);
        }
        inner.index = Some(index);
    }

    /// Search constrained by document attributes. The filter applies to the
    /// retrieved candidates, mirroring the unfiltered ranking.
    pub fn search_filtered(
        &self,
        query: &str,
        top_k: usize,
        filter: &AttributeFilter,
    ) -> Vec<ListingMatch> {
        self.search_impl(query, top_k, Some(filter))
    }

    fn search_impl(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&AttributeFilter>,
    ) -> Vec<ListingMatch> {
        if top_k == 0 {
            return Vec::new();
        }

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Err(e) = self.ensure_open(inner) {
            error!("Search unavailable, cannot open listing database: {e}");
            return Vec::new();
        }
        if inner.docs.is_empty() {
            return Vec::new();
        }
        self.ensure_index(inner);
        let Some(index) = inner.index.as_mut() else {
            return Vec::new();
        };

        let query_vector = self.embedder.embed(query);
        let hits = index.search(query_vector.as_slice(), top_k);
        hits.into_iter()
            .filter_map(|(doc_idx, score)| {
                let entry = inner.docs.get(doc_idx)?;
                if let Some(filter) = filter {
                    if !filter.matches(&entry.attributes) {
                        return None;
                    }
                }
                Some(ListingMatch {
                    listing: codec::decode(&entry.attributes),
                    score,
                })
            })
            .collect()
    }
}

impl ListingStore for HnswListingStore {
    fn needs_loading(&self) -> bool {
        match &self.mode {
            StorageMode::Durable(dir) => !dir.join(HNSW_DB_FILE).exists(),
            StorageMode::Volatile => !self.inner.read().populated,
        }
    }

    fn load(&self, listings: &[Listing]) -> Result<()> {
        if listings.is_empty() {
            return Err(Error::EmptyLoad);
        }

        // Never rebuild over an index pinned to a different model; an
        // unreadable file is simply replaced.
        if let Some(path) = self.db_path() {
            if path.exists() {
                match artifact::read::<HnswArtifact>(&path) {
                    Ok(existing) => self.verify_artifact(&existing)?,
                    Err(e) => warn!("Replacing unreadable listing database: {e}"),
                }
            }
        }

        let entries: Vec<DocEntry> = listings
            .iter()
            .map(|listing| {
                let document = codec::encode(listing);
                let vector = self.embedder.embed(&document.text);
                DocEntry {
                    id: listing.id.clone(),
                    vector: vector.as_slice().to_vec(),
                    attributes: document.attributes,
                }
            })
            .collect();

        // Discard-then-write: a crash in between leaves the store empty,
        // observable on the next needs_loading check.
        if let Some(path) = self.db_path() {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            let persisted = HnswArtifact {
                model: self.embedder.model_name().to_string(),
                dim: self.embedder.dim(),
                entries: entries.clone(),
            };
            artifact::write(&path, &persisted)?;
        }

        let count = entries.len();
        let mut inner = self.inner.write();
        inner.docs = entries;
        inner.index = None;
        inner.populated = true;
        info!("Indexed {count} listings (hnsw, {})", self.embedder.model_name());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Some(path) = self.db_path() {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        let mut inner = self.inner.write();
        inner.docs.clear();
        inner.index = None;
        inner.populated = false;
        Ok(())
    }

    fn search(&self, query: &str, top_k: usize) -> Vec<ListingMatch> {
        self.search_impl(query, top_k, None)
    }

    fn len(&self) -> usize {
        let mut inner = self.inner.write();
        if self.ensure_open(&mut inner).is_err() {
            return 0;
        }
        inner.docs.len()
    }

    fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}
