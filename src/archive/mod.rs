//! Archive stores: where multi-generation run archives come from.
//!
//! An [`Archive`] is one optimization run (one seed of one run variant):
//! an ordered mapping from NFE to the [`Population`] archived at that point.
//! The [`ArchiveStore`] trait abstracts over where archives live.
//!
//! # Available backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`TarballStore`] | A directory of `.tar.gz` bundles, one `<nfe>.csv` member per generation |
//! | [`MemoryStore`] | Archives held in memory behind a read-write lock |
//!
//! # Implementing a custom backend
//!
//! Implement [`list`](ArchiveStore::list) and [`load`](ArchiveStore::load);
//! [`find`](ArchiveStore::find) has a prefix-matching default.
//!
//! ```
//! use hvconv::archive::{Archive, ArchiveStore, MemoryStore};
//! use hvconv::{Objectives, Population};
//!
//! let objectives = Objectives::builder().minimize("a", 0.1).build().unwrap();
//! let mut archive = Archive::new();
//! archive.insert(100, Population::from_objective_rows(&objectives, vec![vec![0.5]]).unwrap());
//!
//! let store = MemoryStore::new();
//! store.insert("UTILITARIAN_100_1.tar.gz", archive);
//! assert_eq!(store.find("UTILITARIAN_100").unwrap().len(), 1);
//! ```

use std::collections::BTreeMap;

mod memory;
mod tarball;

pub use memory::MemoryStore;
pub use tarball::{TarballStore, read_bundle};

use crate::config::Objectives;
use crate::error::{Error, Result};
use crate::population::Population;

/// Generations of one run, ordered by NFE.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Archive {
    generations: BTreeMap<u64, Population>,
}

impl Archive {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the generation at `nfe`, returning any previous one.
    pub fn insert(&mut self, nfe: u64, generation: Population) -> Option<Population> {
        self.generations.insert(nfe, generation)
    }

    /// The generation archived at `nfe`.
    #[must_use]
    pub fn get(&self, nfe: u64) -> Option<&Population> {
        self.generations.get(&nfe)
    }

    /// Number of generations, including NFE 0 if present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Whether the archive holds no generations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Generations in ascending NFE order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Population)> {
        self.generations.iter().map(|(&nfe, g)| (nfe, g))
    }

    /// NFE keys in ascending order.
    #[must_use]
    pub fn nfes(&self) -> Vec<u64> {
        self.generations.keys().copied().collect()
    }

    /// Generations that are scored: every NFE except 0.
    pub fn scored_generations(&self) -> impl Iterator<Item = (u64, &Population)> {
        self.iter().filter(|&(nfe, _)| nfe != 0)
    }

    /// The generation with the largest NFE.
    #[must_use]
    pub fn final_generation(&self) -> Option<(u64, &Population)> {
        self.generations.iter().next_back().map(|(&nfe, g)| (nfe, g))
    }

    /// All generations concatenated in NFE order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnMismatch`] if generations disagree on their
    /// column count.
    pub fn pooled(&self) -> Result<Population> {
        let labels: Vec<String> = self.generations.keys().map(|nfe| format!("nfe {nfe}")).collect();
        Population::concat(
            labels
                .iter()
                .map(String::as_str)
                .zip(self.generations.values()),
        )
    }

    /// Check every generation against the objective count.
    pub(crate) fn check_dims(&self, objectives: &Objectives) -> Result<()> {
        for generation in self.generations.values() {
            crate::population::check_vectors(generation.objective_values(), objectives.len())?;
        }
        Ok(())
    }
}

impl FromIterator<(u64, Population)> for Archive {
    fn from_iter<I: IntoIterator<Item = (u64, Population)>>(iter: I) -> Self {
        Self {
            generations: iter.into_iter().collect(),
        }
    }
}

/// Trait for locating and loading run archives.
///
/// Implementations must be `Send + Sync` so a store can be shared with the
/// worker pool's threads.
pub trait ArchiveStore: Send + Sync {
    /// Names of every archive in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing location cannot be listed.
    fn list(&self) -> Result<Vec<String>>;

    /// Load one archive, parsing its trailing columns as `objectives`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingData`] if `name` does not exist, plus any
    /// read or parse error.
    fn load(&self, name: &str, objectives: &Objectives) -> Result<Archive>;

    /// Names starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`list`](Self::list).
    fn find(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect())
    }
}

pub(crate) fn missing(name: &str) -> Error {
    Error::MissingData {
        variant: name.to_owned(),
        pattern: name.to_owned(),
    }
}
