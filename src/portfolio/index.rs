use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::embedder::{Embedder, cosine_similarity};

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to access index file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("index file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("index was built with embedder {stored}, but {active} is active")]
    IncompatibleEmbedder { stored: String, active: String },
    #[error("entry {0} already exists in the index")]
    DuplicateId(Uuid),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    id: Uuid,
    document: String,
    #[serde(default)]
    metadata: Metadata,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    embedder: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<StoredEntry>,
}

/// A new document to add to a [`Collection`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub id: Uuid,
    pub document: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: Uuid,
    pub document: String,
    pub metadata: Metadata,
    /// Cosine distance (`1 - similarity`); lower is closer.
    pub distance: f32,
}

/// A named, on-disk collection of embedded documents.
///
/// The whole collection lives in `<dir>/<name>.json` and is mirrored in
/// memory; every write rewrites the file atomically. Search is brute-force
/// cosine distance, which is plenty for a hand-maintained portfolio table.
pub struct Collection<E: Embedder> {
    path: PathBuf,
    embedder: E,
    file: CollectionFile,
}

impl<E: Embedder> Collection<E> {
    /// Opens the collection, creating the directory (but not yet the file)
    /// when absent.
    pub fn open(dir: &Path, name: &str, embedder: E) -> Result<Self, IndexError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| IndexError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            info!("created index directory: {}", dir.display());
        }

        let path = dir.join(format!("{}.json", name));
        let file = if path.exists() {
            let raw = fs::read(&path).map_err(|source| IndexError::Io {
                path: path.clone(),
                source,
            })?;
            let file: CollectionFile =
                serde_json::from_slice(&raw).map_err(|source| IndexError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            debug!(
                "opened collection '{}' with {} entries from {}",
                file.name,
                file.entries.len(),
                path.display()
            );
            file
        } else {
            debug!("collection '{}' does not exist yet, starting empty", name);
            CollectionFile {
                name: name.to_string(),
                embedder: embedder.name().to_string(),
                dimension: embedder.dimension(),
                created_at: Utc::now(),
                entries: Vec::new(),
            }
        };

        let collection = Self {
            path,
            embedder,
            file,
        };
        if let Err(e) = collection.check_embedder() {
            warn!("{}; queries against this index will fail until it is rebuilt", e);
        }

        Ok(collection)
    }

    pub fn count(&self) -> usize {
        self.file.entries.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entries` and writes the collection to disk. On any error the
    /// collection is left exactly as it was.
    pub fn add(&mut self, entries: Vec<NewEntry>) -> Result<(), IndexError> {
        self.check_embedder()?;

        let mut staged: Vec<StoredEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            let taken = self.file.entries.iter().chain(&staged).any(|e| e.id == entry.id);
            if taken {
                return Err(IndexError::DuplicateId(entry.id));
            }
            let embedding = self.embedder.embed(&entry.document);
            staged.push(StoredEntry {
                id: entry.id,
                document: entry.document,
                metadata: entry.metadata,
                embedding,
            });
        }

        let old_len = self.file.entries.len();
        self.file.entries.extend(staged);
        if let Err(e) = self.persist() {
            self.file.entries.truncate(old_len);
            return Err(e);
        }
        Ok(())
    }

    /// Returns up to `n_results` entries closest to `query_text`, nearest
    /// first. Equal distances keep insertion order.
    pub fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<QueryHit>, IndexError> {
        self.check_embedder()?;

        let query = self.embedder.embed(query_text);
        let mut hits: Vec<QueryHit> = self
            .file
            .entries
            .iter()
            .map(|entry| QueryHit {
                id: entry.id,
                document: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance: 1.0 - cosine_similarity(&query, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(n_results);
        Ok(hits)
    }

    fn check_embedder(&self) -> Result<(), IndexError> {
        if self.file.embedder != self.embedder.name()
            || self.file.dimension != self.embedder.dimension()
        {
            return Err(IndexError::IncompatibleEmbedder {
                stored: format!("{}/{}", self.file.embedder, self.file.dimension),
                active: format!("{}/{}", self.embedder.name(), self.embedder.dimension()),
            });
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), IndexError> {
        let bytes = serde_json::to_vec(&self.file).map_err(|source| IndexError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|source| IndexError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| IndexError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "persisted {} entries to {}",
            self.file.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::embedder::HashEmbedder;

    fn entry(document: &str, link: Option<&str>) -> NewEntry {
        NewEntry {
            id: Uuid::new_v4(),
            document: document.to_string(),
            metadata: link
                .map(|l| Metadata::from([("links".to_string(), l.to_string())]))
                .unwrap_or_default(),
        }
    }

    #[test]
    fn new_collection_is_empty_and_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("vectorstore");

        let collection = Collection::open(&index_dir, "portfolio", HashEmbedder::default()).unwrap();

        assert_eq!(collection.count(), 0);
        assert!(index_dir.is_dir());
        assert!(!collection.path().exists());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection =
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();
        collection
            .add(vec![entry("Rust, Tokio", Some("https://a")), entry("Go", None)])
            .unwrap();

        let reopened = Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();

        assert_eq!(reopened.count(), 2);
        let hits = reopened.query("tokio", 1).unwrap();
        assert_eq!(hits[0].document, "Rust, Tokio");
        assert_eq!(hits[0].metadata.get("links").map(String::as_str), Some("https://a"));
    }

    #[test]
    fn query_orders_by_distance_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection =
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();
        collection
            .add(vec![
                entry("React, Node.js", None),
                entry("Python, Django, PostgreSQL", None),
                entry("Python", None),
            ])
            .unwrap();

        let hits = collection.query("python", 2).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, "Python");
        assert_eq!(hits[1].document, "Python, Django, PostgreSQL");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection =
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();
        let first = entry("Rust", None);
        let dup = NewEntry {
            document: "Go".into(),
            ..first.clone()
        };

        collection.add(vec![first]).unwrap();

        assert!(matches!(
            collection.add(vec![dup]),
            Err(IndexError::DuplicateId(_))
        ));
    }

    #[test]
    fn duplicate_inside_a_batch_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection =
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();
        collection.add(vec![entry("Python", None)]).unwrap();

        let first = entry("Rust", None);
        let dup = NewEntry {
            document: "Go".into(),
            ..first.clone()
        };

        assert!(matches!(
            collection.add(vec![first, entry("Kotlin", None), dup]),
            Err(IndexError::DuplicateId(_))
        ));
        assert_eq!(collection.count(), 1);
        assert_eq!(
            Collection::open(dir.path(), "portfolio", HashEmbedder::default())
                .unwrap()
                .count(),
            1
        );
    }

    #[test]
    fn failed_write_leaves_collection_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("portfolio.json.tmp");
        fs::create_dir(&tmp).unwrap();
        let mut collection =
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()).unwrap();

        match collection.add(vec![entry("Rust", None)]) {
            Err(IndexError::Io { path, .. }) => assert_eq!(path, tmp),
            other => panic!("expected an io error, got {:?}", other),
        }
        assert_eq!(collection.count(), 0);
        assert!(!collection.path().exists());

        fs::remove_dir(&tmp).unwrap();
        collection.add(vec![entry("Rust", None)]).unwrap();

        assert_eq!(collection.count(), 1);
        assert_eq!(
            Collection::open(dir.path(), "portfolio", HashEmbedder::default())
                .unwrap()
                .count(),
            1
        );
    }

    #[test]
    fn queries_fail_against_index_from_another_embedder() {
        let dir = tempfile::tempdir().unwrap();
        let mut collection = Collection::open(dir.path(), "portfolio", HashEmbedder::new(64)).unwrap();
        collection.add(vec![entry("Rust", None)]).unwrap();

        let reopened = Collection::open(dir.path(), "portfolio", HashEmbedder::new(128)).unwrap();

        assert_eq!(reopened.count(), 1);
        assert!(matches!(
            reopened.query("rust", 2),
            Err(IndexError::IncompatibleEmbedder { .. })
        ));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("portfolio.json"), b"{not json").unwrap();

        assert!(matches!(
            Collection::open(dir.path(), "portfolio", HashEmbedder::default()),
            Err(IndexError::Corrupt { .. })
        ));
    }
}
