#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]
#![allow(clippy::module_name_repetitions)]

//! Convergence metrics for multi-objective evolutionary search runs.
//!
//! Given the archived populations of several optimization runs (one per
//! random seed, for each run variant), this crate builds a global
//! epsilon-non-dominated reference set and scores every generation of every
//! run with a normalized hypervolume, in parallel across generations.
//!
//! # Getting Started
//!
//! ```
//! use hvconv::prelude::*;
//!
//! let objectives = Objectives::builder()
//!     .minimize("a", 0.1)
//!     .minimize("b", 0.1)
//!     .build()
//!     .unwrap();
//!
//! let g1 = vec![vec![0.2, 0.8], vec![0.5, 0.5]];
//! let mut g2 = g1.clone();
//! g2.push(vec![0.1, 0.1]);
//!
//! // Fit once on a basis spanning [0, 1]^2; the reference corner is (1, 1).
//! let scaler = Scaler::fit(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
//! let engine = HypervolumeEngine::from_scaler(&scaler, &objectives).unwrap();
//!
//! let hv1 = engine.score(&scaler.transform(&g1).unwrap()).unwrap();
//! let hv2 = engine.score(&scaler.transform(&g2).unwrap()).unwrap();
//! assert!(hv2 > hv1);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Objectives`] | Checked ordering of objective names, directions and epsilons. |
//! | [`Population`] | One generation (or a reference set): raw rows plus parsed objective vectors. |
//! | [`Archive`](archive::Archive) | All generations of one run, keyed by NFE. |
//! | [`ArchiveStore`](archive::ArchiveStore) | Where archives come from: `.tar.gz` bundles or memory. |
//! | [`ReferenceSetBuilder`](reference::ReferenceSetBuilder) | Epsilon non-dominated union of the final generations of all seeds. |
//! | [`Scaler`] | Min-max normalization fitted once per run. |
//! | [`ConvergenceDriver`](convergence::ConvergenceDriver) | Per-generation hypervolume on a shared worker pool. |
//!
//! # Where optimization direction is used
//!
//! Scaling ignores direction. The epsilon sorter compares boxes in each
//! objective's own sense, and the hypervolume engine picks the reference
//! corner per direction (the scaled maximum for minimized objectives, the
//! scaled minimum for maximized ones) before measuring in minimization
//! space.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public types and [`RunConfig`] JSON files | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key points | off |
//! | `cli` | The `hvconv` binary (enables `serde` and `tracing`) | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod archive;
mod config;
pub mod convergence;
mod error;
pub mod pareto;
mod population;
pub mod reference;
mod scaler;
mod types;

#[cfg(feature = "serde")]
pub use config::RunConfig;
pub use config::{Objectives, ObjectivesBuilder};
pub use error::{Error, Result};
pub use population::{Population, ReferenceSet};
pub use scaler::Scaler;
pub use types::Direction;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use hvconv::prelude::*;
/// ```
pub mod prelude {
    pub use crate::archive::{Archive, ArchiveStore, MemoryStore, TarballStore};
    #[cfg(feature = "serde")]
    pub use crate::config::RunConfig;
    pub use crate::config::Objectives;
    pub use crate::convergence::{
        BatchReport, ConvergenceDriver, HypervolumeEngine, ReferenceBasis, Score, ScoreTable,
        WorkerPool,
    };
    pub use crate::error::{Error, Result};
    pub use crate::pareto::{eps_sort, eps_sort_indices, hypervolume};
    pub use crate::population::{Population, ReferenceSet};
    pub use crate::reference::ReferenceSetBuilder;
    pub use crate::scaler::Scaler;
    pub use crate::types::Direction;
}
