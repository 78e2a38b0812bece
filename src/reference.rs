//! Global reference sets: the epsilon non-dominated union of the final
//! generations of every seed of a run variant.
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use hvconv::archive::Archive;
//! use hvconv::reference::ReferenceSetBuilder;
//! use hvconv::{Objectives, Population};
//!
//! let objectives = Objectives::builder()
//!     .minimize("a", 0.01)
//!     .minimize("b", 0.01)
//!     .build()
//!     .unwrap();
//! let seed = |rows: Vec<Vec<f64>>| -> Archive {
//!     [(1000, Population::from_objective_rows(&objectives, rows).unwrap())]
//!         .into_iter()
//!         .collect()
//! };
//!
//! let mut seeds = BTreeMap::new();
//! seeds.insert("seed_1".to_string(), seed(vec![vec![1.0, 5.0], vec![3.0, 6.0]]));
//! seeds.insert("seed_2".to_string(), seed(vec![vec![2.0, 4.0]]));
//!
//! let reference = ReferenceSetBuilder::new(objectives.clone()).build(&seeds).unwrap();
//! assert_eq!(reference.objective_values(), &[vec![1.0, 5.0], vec![2.0, 4.0]]);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::archive::{Archive, ArchiveStore};
use crate::config::Objectives;
use crate::error::{Error, Result};
use crate::pareto::eps_sort_indices;
use crate::population::{Population, ReferenceSet};

/// Suffix appended to a variant name to name its reference-set file.
pub const REFERENCE_SET_SUFFIX: &str = "_reference_set.csv";

/// Reference-set file for a variant: `{output_dir}/{variant}_reference_set.csv`.
#[must_use]
pub fn reference_set_path(output_dir: &Path, variant: &str) -> PathBuf {
    output_dir.join(format!("{variant}{REFERENCE_SET_SUFFIX}"))
}

/// Builds reference sets for one objective configuration.
#[derive(Clone, Debug)]
pub struct ReferenceSetBuilder {
    objectives: Objectives,
}

impl ReferenceSetBuilder {
    /// Builder sorting with the epsilons and directions of `objectives`.
    #[must_use]
    pub fn new(objectives: Objectives) -> Self {
        Self { objectives }
    }

    /// The objectives used for parsing and sorting.
    #[must_use]
    pub fn objectives(&self) -> &Objectives {
        &self.objectives
    }

    /// Reference set of the given seeds.
    ///
    /// The final generation of every seed is pooled, seeds in key order and
    /// rows in their original order, then epsilon-sorted. Every pooled row
    /// whose objective vector exactly equals a survivor is kept, so
    /// duplicate solutions from different seeds all appear in the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Archive`] if a seed has no generations,
    /// [`Error::ColumnMismatch`] if seeds disagree on their columns, and
    /// any sorting error.
    pub fn build(&self, seed_archives: &BTreeMap<String, Archive>) -> Result<ReferenceSet> {
        let mut finals = Vec::with_capacity(seed_archives.len());
        for (seed, archive) in seed_archives {
            let (_, generation) = archive
                .final_generation()
                .ok_or_else(|| Error::Archive(format!("seed '{seed}' has no generations")))?;
            trace_debug!(seed = %seed, rows = generation.len(), "final generation");
            finals.push((seed.as_str(), generation));
        }
        let pooled = Population::concat(finals)?;

        let survivors = eps_sort_indices(
            pooled.objective_values(),
            self.objectives.epsilons(),
            self.objectives.directions(),
        )?;
        let keys: HashSet<Vec<u64>> = survivors
            .iter()
            .map(|&i| bit_key(&pooled.objective_values()[i]))
            .collect();
        let rows: Vec<usize> = pooled
            .objective_values()
            .iter()
            .enumerate()
            .filter(|(_, v)| keys.contains(&bit_key(v)))
            .map(|(i, _)| i)
            .collect();

        trace_info!(pooled = pooled.len(), kept = rows.len(), "reference set built");
        Ok(pooled.select(&rows))
    }

    /// Reference set of every archive in `store` named `{variant}_{nfe}*`,
    /// taken as seeds in file-name order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingData`] when nothing matches, plus any load or
    /// [`build`](Self::build) error.
    pub fn build_variant(&self, store: &dyn ArchiveStore, variant: &str, nfe: &str) -> Result<ReferenceSet> {
        let pattern = format!("{variant}_{nfe}");
        let names = store.find(&pattern)?;
        if names.is_empty() {
            return Err(Error::MissingData {
                variant: variant.to_owned(),
                pattern,
            });
        }
        let mut seeds = BTreeMap::new();
        for name in names {
            let archive = store.load(&name, &self.objectives)?;
            seeds.insert(name, archive);
        }
        self.build(&seeds)
    }

    /// Build every variant, saving each to
    /// [`reference_set_path`] when `output_dir` is given (replacing any
    /// previous file).
    ///
    /// Variants without a matching archive are logged and left out of the
    /// result; the others are still built.
    ///
    /// # Errors
    ///
    /// Returns the first error other than [`Error::MissingData`].
    pub fn build_variants<S: AsRef<str>>(
        &self,
        store: &dyn ArchiveStore,
        variants: &[S],
        nfe: &str,
        output_dir: Option<&Path>,
    ) -> Result<BTreeMap<String, ReferenceSet>> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("reference_sets", nfe, variants = variants.len()).entered();

        let mut sets = BTreeMap::new();
        for variant in variants {
            let variant = variant.as_ref();
            let set = match self.build_variant(store, variant, nfe) {
                Ok(set) => set,
                Err(e) if e.is_missing_data() => {
                    trace_warn!(variant, error = %e, "skipping variant");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(dir) = output_dir {
                let path = reference_set_path(dir, variant);
                set.save_csv(&path)?;
                trace_info!(variant, path = %path.display(), "reference set saved");
            }
            sets.insert(variant.to_owned(), set);
        }
        Ok(sets)
    }
}

/// Exact-match key; adding `0.0` folds `-0.0` onto `0.0`.
fn bit_key(v: &[f64]) -> Vec<u64> {
    v.iter().map(|&x| (x + 0.0).to_bits()).collect()
}
