//! Directory of gzipped tar bundles, one per run.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::{Archive, ArchiveStore, missing};
use crate::config::Objectives;
use crate::error::{Error, Result};
use crate::population::Population;

const BUNDLE_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

/// Archive store backed by a directory of `.tar.gz` bundles.
///
/// Each bundle holds one CSV member per generation, named `<nfe>.csv`
/// (any directory prefix inside the bundle is ignored).
///
/// ```no_run
/// use hvconv::archive::{ArchiveStore, TarballStore};
/// use hvconv::Objectives;
///
/// let objectives = Objectives::builder().minimize("welfare", 0.1).build().unwrap();
/// let store = TarballStore::new("data/archives");
/// for name in store.find("UTILITARIAN_150000").unwrap() {
///     let archive = store.load(&name, &objectives).unwrap();
///     println!("{name}: {} generations", archive.len());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct TarballStore {
    root: PathBuf,
}

impl TarballStore {
    /// Creates a store reading bundles from `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory holding the bundles.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveStore for TarballStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if BUNDLE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str, objectives: &Objectives) -> Result<Archive> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(missing(name));
        }
        read_bundle(&path, objectives)
    }
}

/// Read one `.tar.gz` bundle into an [`Archive`].
///
/// Members not ending in `.csv`, and hidden members, are skipped. Every
/// CSV member's file stem must be its NFE.
///
/// # Errors
///
/// Returns [`Error::Io`] for unreadable or corrupt bundles,
/// [`Error::Archive`] for a non-numeric or duplicate NFE, and any
/// [`Population::from_csv`] error for a malformed member.
pub fn read_bundle(path: &Path, objectives: &Objectives) -> Result<Archive> {
    let file = File::open(path)?;
    let mut bundle = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut archive = Archive::new();

    for entry in bundle.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let member = entry.path()?.into_owned();
        if member.extension().and_then(OsStr::to_str) != Some("csv") {
            continue;
        }
        let Some(stem) = member.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        if stem.starts_with('.') {
            continue;
        }
        let nfe: u64 = stem.parse().map_err(|_| {
            Error::Archive(format!(
                "{}: member '{}' is not named after an NFE",
                path.display(),
                member.display()
            ))
        })?;

        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        let source_name = format!("{}:{}", path.display(), member.display());
        let generation = Population::from_csv(&source_name, &text, objectives)?;

        if archive.insert(nfe, generation).is_some() {
            return Err(Error::Archive(format!(
                "{}: NFE {nfe} appears more than once",
                path.display()
            )));
        }
    }

    trace_debug!(path = %path.display(), generations = archive.len(), "bundle loaded");
    Ok(archive)
}
