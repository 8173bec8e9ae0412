use std::path::{Path, PathBuf};

use log::{debug, error, info};
use thiserror::Error;
use uuid::Uuid;

use super::embedder::{Embedder, HashEmbedder};
use super::index::{Collection, IndexError, Metadata, NewEntry};
use crate::models::portfolio::PortfolioRow;
use crate::utils::config::PortfolioConfig;

/// How many portfolio links are offered per job posting.
pub const MAX_LINKS: usize = 2;

/// Placeholder for a matched entry that carries no link metadata.
pub const NO_LINK: &str = "No link available";

const LINK_KEY: &str = "links";

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("failed to read portfolio source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Where the shell gets portfolio links from.
pub trait LinkSource {
    /// Makes sure the backing index is populated; returns how many entries
    /// were inserted by this call.
    fn ensure_loaded(&mut self) -> Result<usize, PortfolioError>;

    /// Never fails: problems are logged and yield no links.
    fn links_for(&self, skills: &[String]) -> Vec<String>;
}

/// Past projects, searchable by technology stack.
///
/// The index is filled at most once: as soon as it holds a single entry,
/// [`Portfolio::load`] leaves it alone. Edits to the source CSV are therefore
/// ignored until the index directory is removed by hand.
pub struct Portfolio<E: Embedder = HashEmbedder> {
    rows: Vec<PortfolioRow>,
    collection: Collection<E>,
}

impl Portfolio<HashEmbedder> {
    pub fn new(config: &PortfolioConfig) -> Result<Self, PortfolioError> {
        let rows = PortfolioRow::read_csv(&config.source).map_err(|source| {
            PortfolioError::Source {
                path: config.source.clone(),
                source,
            }
        })?;
        info!(
            "read {} portfolio rows from {}",
            rows.len(),
            config.source.display()
        );

        Self::with_embedder(
            rows,
            &config.index_path,
            &config.collection,
            HashEmbedder::default(),
        )
    }
}

impl<E: Embedder> Portfolio<E> {
    pub fn with_embedder(
        rows: Vec<PortfolioRow>,
        index_dir: &Path,
        collection: &str,
        embedder: E,
    ) -> Result<Self, PortfolioError> {
        let collection = Collection::open(index_dir, collection, embedder)?;
        debug!("portfolio index at {}", collection.path().display());

        Ok(Self { rows, collection })
    }

    pub fn count(&self) -> usize {
        self.collection.count()
    }

    pub fn load(&mut self) -> Result<usize, PortfolioError> {
        if self.collection.count() > 0 {
            debug!(
                "portfolio index already holds {} entries, skipping load",
                self.collection.count()
            );
            return Ok(0);
        }

        let entries: Vec<NewEntry> = self
            .rows
            .iter()
            .map(|row| NewEntry {
                id: Uuid::new_v4(),
                document: row.tech_stack.clone(),
                metadata: Metadata::from([(LINK_KEY.to_string(), row.link.clone())]),
            })
            .collect();
        let inserted = entries.len();

        self.collection.add(entries)?;
        info!("loaded {} portfolio entries into the index", inserted);

        Ok(inserted)
    }

    /// Links of the [`MAX_LINKS`] entries closest to `skills`, nearest first.
    pub fn query_links(&self, skills: &[String]) -> Vec<String> {
        match self.try_query_links(skills) {
            Ok(links) => links,
            Err(e) => {
                error!("error in querying portfolio: {}", e);
                Vec::new()
            }
        }
    }

    fn try_query_links(&self, skills: &[String]) -> Result<Vec<String>, IndexError> {
        let query = skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if query.is_empty() {
            debug!("no skills to match against the portfolio");
            return Ok(Vec::new());
        }

        let hits = self.collection.query(&query, MAX_LINKS)?;
        debug!("portfolio query '{}' returned {:?}", query, hits);

        Ok(hits
            .into_iter()
            .map(|hit| {
                hit.metadata
                    .get(LINK_KEY)
                    .cloned()
                    .unwrap_or_else(|| NO_LINK.to_string())
            })
            .collect())
    }
}

impl<E: Embedder> LinkSource for Portfolio<E> {
    fn ensure_loaded(&mut self) -> Result<usize, PortfolioError> {
        self.load()
    }

    fn links_for(&self, skills: &[String]) -> Vec<String> {
        self.query_links(skills)
    }
}
