use core::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Suffix appended to an archive's stem to name its score file.
pub const SCORE_FILE_SUFFIX: &str = "_hv.csv";

/// Hypervolume of one generation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Score {
    /// Number of function evaluations at this generation.
    pub nfe: u64,
    /// Normalized hypervolume.
    pub hypervolume: f64,
}

/// Scores of one run, in ascending NFE order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreTable {
    scores: Vec<Score>,
}

impl ScoreTable {
    /// Pair NFEs with values by position.
    ///
    /// # Panics
    ///
    /// Panics if the two slices differ in length.
    #[must_use]
    pub(crate) fn from_pairs(nfes: &[u64], values: &[f64]) -> Self {
        assert_eq!(nfes.len(), values.len(), "one value per NFE");
        Self {
            scores: nfes
                .iter()
                .zip(values)
                .map(|(&nfe, &hypervolume)| Score { nfe, hypervolume })
                .collect(),
        }
    }

    /// Scores in ascending NFE order.
    #[must_use]
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    /// Hypervolume at `nfe`, if scored.
    #[must_use]
    pub fn get(&self, nfe: u64) -> Option<f64> {
        self.scores
            .binary_search_by_key(&nfe, |s| s.nfe)
            .ok()
            .map(|i| self.scores[i].hypervolume)
    }

    /// The score with the largest NFE.
    #[must_use]
    pub fn last(&self) -> Option<Score> {
        self.scores.last().copied()
    }

    /// Number of scored generations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Write as CSV with columns `nfe`, `hypervolume`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn to_csv(&self, mut writer: impl Write) -> std::io::Result<()> {
        writeln!(writer, "nfe,hypervolume")?;
        for s in &self.scores {
            writeln!(writer, "{},{}", s.nfe, s.hypervolume)?;
        }
        writer.flush()
    }

    /// Export to a CSV file at the given path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be
    /// created or written.
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv(BufWriter::new(file))?;
        Ok(())
    }

    /// Return a human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.scores.first(), self.scores.last()) {
            (Some(first), Some(last)) => format!(
                "{n} generations | NFE {a}..={b} | hypervolume {ha:.6} -> {hb:.6}",
                n = self.scores.len(),
                a = first.nfe,
                b = last.nfe,
                ha = first.hypervolume,
                hb = last.hypervolume,
            ),
            _ => "0 generations".to_string(),
        }
    }
}

impl FromIterator<Score> for ScoreTable {
    /// Collect scores in any order; the table keeps them sorted by NFE.
    fn from_iter<I: IntoIterator<Item = Score>>(iter: I) -> Self {
        let mut scores: Vec<Score> = iter.into_iter().collect();
        scores.sort_by_key(|s| s.nfe);
        Self { scores }
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Score file for an archive: `{output_dir}/{stem}_hv.csv`, where `stem` is
/// the archive's file name up to its first `.`.
///
/// ```
/// use std::path::Path;
/// use hvconv::convergence::score_file_path;
///
/// let path = score_file_path(Path::new("out"), "PRIORITARIAN_150000_521475.tar.gz");
/// assert_eq!(path, Path::new("out/PRIORITARIAN_150000_521475_hv.csv"));
/// ```
#[must_use]
pub fn score_file_path(output_dir: &Path, archive_name: &str) -> PathBuf {
    let file_name = Path::new(archive_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(archive_name);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    output_dir.join(format!("{stem}{SCORE_FILE_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_two_columns() {
        let table = ScoreTable::from_pairs(&[100, 200], &[0.25, 0.5]);
        let mut buf = Vec::new();
        table.to_csv(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "nfe,hypervolume\n100,0.25\n200,0.5\n"
        );
    }

    #[test]
    fn lookup_by_nfe() {
        let table = ScoreTable::from_pairs(&[100, 200, 300], &[0.1, 0.2, 0.3]);
        assert_eq!(table.get(200), Some(0.2));
        assert_eq!(table.get(250), None);
        assert_eq!(table.last().map(|s| s.nfe), Some(300));
    }

    #[test]
    fn summary_mentions_range() {
        let table = ScoreTable::from_pairs(&[100, 200], &[0.25, 0.5]);
        let summary = table.summary();
        assert!(summary.contains("2 generations"));
        assert!(summary.contains("100..=200"));
        assert_eq!(ScoreTable::default().to_string(), "0 generations");
    }

    #[test]
    fn collected_scores_are_sorted_by_nfe() {
        let table: ScoreTable = [
            Score { nfe: 300, hypervolume: 0.3 },
            Score { nfe: 100, hypervolume: 0.1 },
            Score { nfe: 200, hypervolume: 0.2 },
        ]
        .into_iter()
        .collect();
        assert_eq!(table, ScoreTable::from_pairs(&[100, 200, 300], &[0.1, 0.2, 0.3]));
        assert_eq!(table.get(100), Some(0.1));
    }

    #[test]
    fn score_file_strips_every_extension() {
        let path = score_file_path(Path::new("/tmp/out"), "dir/UTIL_100_7.tar.gz");
        assert_eq!(path, PathBuf::from("/tmp/out/UTIL_100_7_hv.csv"));
    }
}
