//! Per-generation hypervolume of archived runs.
//!
//! The [`ConvergenceDriver`] turns one run [`Archive`] into a [`ScoreTable`]:
//!
//! 1. fit a [`Scaler`] once, on the chosen [`ReferenceBasis`];
//! 2. derive the reference point once, from the scaled basis;
//! 3. scale every generation except NFE 0;
//! 4. score the generations on the [`WorkerPool`], one task per generation,
//!    pairing results with their NFE by position.
//!
//! Batches of run files share one driver, and therefore one pool. A run
//! file that fails is reported and the batch moves on.
//!
//! ```
//! use hvconv::archive::Archive;
//! use hvconv::convergence::{ConvergenceDriver, ReferenceBasis, WorkerPool};
//! use hvconv::{Objectives, Population};
//!
//! let objectives = Objectives::builder()
//!     .minimize("a", 0.1)
//!     .minimize("b", 0.1)
//!     .build()
//!     .unwrap();
//! let generation = |rows: Vec<Vec<f64>>| Population::from_objective_rows(&objectives, rows).unwrap();
//!
//! let archive: Archive = [
//!     (0, generation(vec![vec![1.0, 1.0]])),
//!     (100, generation(vec![vec![0.5, 0.5]])),
//!     (200, generation(vec![vec![0.5, 0.5], vec![0.0, 0.9]])),
//! ]
//! .into_iter()
//! .collect();
//!
//! let driver = ConvergenceDriver::with_pool(objectives.clone(), WorkerPool::with_threads(2).unwrap());
//! let scores = driver.run(&archive, &ReferenceBasis::Pooled).unwrap();
//! assert_eq!(scores.len(), 2);
//! assert!(scores.get(200).unwrap() >= scores.get(100).unwrap());
//! ```

mod engine;
mod pool;
mod score;

use std::path::Path;

pub use engine::HypervolumeEngine;
pub use pool::WorkerPool;
pub use score::{SCORE_FILE_SUFFIX, Score, ScoreTable, score_file_path};

use crate::archive::{Archive, ArchiveStore};
use crate::config::Objectives;
use crate::error::{Error, Result};
use crate::population::{Population, ReferenceSet};
use crate::scaler::Scaler;

/// What the scaler is fitted on.
#[derive(Clone, Debug, PartialEq)]
pub enum ReferenceBasis {
    /// Every generation of the run itself, NFE 0 included, pooled together.
    Pooled,
    /// A fixed reference set shared by all runs being compared.
    ReferenceSet(ReferenceSet),
}

impl ReferenceBasis {
    /// Load a persisted reference set as the basis.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or a parse error if the file cannot be read.
    pub fn load(path: impl AsRef<Path>, objectives: &Objectives) -> Result<Self> {
        Ok(Self::ReferenceSet(Population::load_csv(path, objectives)?))
    }
}

/// Outcome of a batch of run files.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Run files scored successfully, in processing order.
    pub completed: Vec<(String, ScoreTable)>,
    /// Run files that failed, with their error.
    pub failed: Vec<(String, Error)>,
}

impl BatchReport {
    /// Whether every run file was scored.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Scores runs generation by generation on a shared worker pool.
#[derive(Debug)]
pub struct ConvergenceDriver {
    objectives: Objectives,
    pool: WorkerPool,
}

impl ConvergenceDriver {
    /// Driver with a pool sized to the machine.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot start.
    pub fn new(objectives: Objectives) -> Result<Self> {
        Ok(Self::with_pool(objectives, WorkerPool::new()?))
    }

    /// Driver using an existing pool.
    #[must_use]
    pub fn with_pool(objectives: Objectives, pool: WorkerPool) -> Self {
        Self { objectives, pool }
    }

    /// The objectives every run is parsed and scored with.
    #[must_use]
    pub fn objectives(&self) -> &Objectives {
        &self.objectives
    }

    /// The shared worker pool.
    #[must_use]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Fit the scaler and build the engine for one run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyBasis`] if the basis has no rows, or a
    /// dimension error if it does not match the objectives.
    pub fn prepare(&self, archive: &Archive, basis: &ReferenceBasis) -> Result<(Scaler, HypervolumeEngine)> {
        let scaler = match basis {
            ReferenceBasis::Pooled => Scaler::fit(archive.pooled()?.objective_values())?,
            ReferenceBasis::ReferenceSet(set) => Scaler::fit(set.objective_values())?,
        };
        if scaler.dims() != self.objectives.len() {
            return Err(Error::DimensionMismatch {
                expected: self.objectives.len(),
                got: scaler.dims(),
                row: 0,
            });
        }
        let engine = HypervolumeEngine::from_scaler(&scaler, &self.objectives)?;
        Ok((scaler, engine))
    }

    /// Score every generation of `archive` except NFE 0.
    ///
    /// # Errors
    ///
    /// Returns the first error from fitting, scaling or any scoring task;
    /// no partial table is returned.
    pub fn run(&self, archive: &Archive, basis: &ReferenceBasis) -> Result<ScoreTable> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("convergence_run", generations = archive.len()).entered();

        archive.check_dims(&self.objectives)?;
        let (scaler, engine) = self.prepare(archive, basis)?;

        let mut nfes = Vec::with_capacity(archive.len());
        let mut generations = Vec::with_capacity(archive.len());
        for (nfe, generation) in archive.scored_generations() {
            nfes.push(nfe);
            generations.push(scaler.transform(generation.objective_values())?);
        }
        trace_debug!(reference_point = ?engine.reference_point(), tasks = nfes.len(), "dispatching");

        let values = self.pool.map_ordered(&generations, |g| engine.score(g))?;
        let table = ScoreTable::from_pairs(&nfes, &values);
        trace_info!(summary = %table, "run scored");
        Ok(table)
    }

    /// Load a run file, score it and, when `output_dir` is given, write
    /// `{output_dir}/{stem}_hv.csv`.
    ///
    /// # Errors
    ///
    /// Propagates load, scoring and write errors.
    pub fn run_file(
        &self,
        store: &dyn ArchiveStore,
        name: &str,
        basis: &ReferenceBasis,
        output_dir: Option<&Path>,
    ) -> Result<ScoreTable> {
        let archive = store.load(name, &self.objectives)?;
        let table = self.run(&archive, basis)?;
        if let Some(dir) = output_dir {
            let path = score_file_path(dir, name);
            table.export_csv(&path)?;
            trace_info!(path = %path.display(), "scores saved");
        }
        Ok(table)
    }

    /// Score several run files in order, reusing this driver's pool.
    ///
    /// A failing file is recorded in [`BatchReport::failed`] and the batch
    /// continues with the next one.
    pub fn run_batch<S: AsRef<str>>(
        &self,
        store: &dyn ArchiveStore,
        names: &[S],
        basis: &ReferenceBasis,
        output_dir: Option<&Path>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for name in names {
            let name = name.as_ref();
            match self.run_file(store, name, basis, output_dir) {
                Ok(table) => report.completed.push((name.to_owned(), table)),
                Err(e) => {
                    trace_warn!(file = name, error = %e, "run file failed");
                    report.failed.push((name.to_owned(), e));
                }
            }
        }
        report
    }
}
