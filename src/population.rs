//! Tabular populations: one generation of an archive, or a reference set.
//!
//! A [`Population`] keeps every source column as raw text so rows can be
//! written back unchanged, and caches the trailing objective columns as
//! parsed objective vectors. The trailing-column rule is positional: the
//! last `N` columns are the objectives, in the order of the run's
//! [`Objectives`], whatever their header says. Those headers are renamed to
//! the objective names on load.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::Objectives;
use crate::error::{Error, Result};

/// Header pandas writes for an unnamed index column.
const PANDAS_INDEX_HEADER: &str = "Unnamed: 0";

/// A table of solutions whose trailing columns are objective values.
#[derive(Clone, Debug, PartialEq)]
pub struct Population {
    columns: Vec<String>,
    fields: Vec<Vec<String>>,
    objectives: Vec<Vec<f64>>,
}

/// A reference set has the same shape as any other population.
pub type ReferenceSet = Population;

impl Population {
    /// Build a population holding only objective columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] for a row of the wrong length and
    /// [`Error::NonFinite`] for NaN or infinite values.
    pub fn from_objective_rows(objectives: &Objectives, rows: Vec<Vec<f64>>) -> Result<Self> {
        check_vectors(&rows, objectives.len())?;
        let columns = objectives.names().into_iter().map(str::to_owned).collect();
        let fields = rows
            .iter()
            .map(|row| row.iter().map(f64::to_string).collect())
            .collect();
        Ok(Self {
            columns,
            fields,
            objectives: rows,
        })
    }

    /// Build a population from a header and raw rows, parsing the trailing
    /// objective columns.
    ///
    /// A leading pandas index column (empty header or `Unnamed: 0`) is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for short or ragged rows and non-numeric
    /// objective cells, and [`Error::NonFinite`] for NaN or infinite values.
    pub fn from_records(
        source_name: &str,
        mut columns: Vec<String>,
        mut fields: Vec<Vec<String>>,
        objectives: &Objectives,
    ) -> Result<Self> {
        let parse_err = |line: usize, reason: String| Error::Parse {
            source_name: source_name.to_owned(),
            line,
            reason,
        };

        let n = objectives.len();
        if columns
            .first()
            .is_some_and(|c| c.is_empty() || c == PANDAS_INDEX_HEADER)
            && columns.len() > n
        {
            columns.remove(0);
            for row in &mut fields {
                if !row.is_empty() {
                    row.remove(0);
                }
            }
        }

        if columns.len() < n {
            return Err(parse_err(
                1,
                format!("expected at least {n} columns, found {}", columns.len()),
            ));
        }
        let offset = columns.len() - n;
        for (col, name) in columns[offset..].iter_mut().zip(objectives.names()) {
            name.clone_into(col);
        }

        let mut values = Vec::with_capacity(fields.len());
        for (row_idx, row) in fields.iter().enumerate() {
            // +2: 1-based and the header line.
            let line = row_idx + 2;
            if row.len() != columns.len() {
                return Err(parse_err(
                    line,
                    format!("expected {} fields, found {}", columns.len(), row.len()),
                ));
            }
            let parsed = row[offset..]
                .iter()
                .map(|cell| {
                    cell.trim()
                        .parse::<f64>()
                        .map_err(|_| parse_err(line, format!("objective value '{cell}' is not a number")))
                })
                .collect::<Result<Vec<f64>>>()?;
            values.push(parsed);
        }
        check_vectors(&values, n)?;

        Ok(Self {
            columns,
            fields,
            objectives: values,
        })
    }

    /// Parse CSV text. See [`from_records`](Self::from_records).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed CSV, plus the errors of
    /// [`from_records`](Self::from_records).
    pub fn from_csv(source_name: &str, text: &str, objectives: &Objectives) -> Result<Self> {
        let mut records = parse_csv(text).map_err(|(line, reason)| Error::Parse {
            source_name: source_name.to_owned(),
            line,
            reason,
        })?;
        if records.is_empty() {
            return Err(Error::Parse {
                source_name: source_name.to_owned(),
                line: 1,
                reason: "missing header".into(),
            });
        }
        let header = records.remove(0);
        Self::from_records(source_name, header, records, objectives)
    }

    /// Read a CSV file, for example a persisted reference set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, plus the errors of
    /// [`from_csv`](Self::from_csv).
    pub fn load_csv(path: impl AsRef<Path>, objectives: &Objectives) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_csv(&path.display().to_string(), &text, objectives)
    }

    /// Concatenate populations row-wise, in the given order.
    ///
    /// The first population's header is kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnMismatch`] if the column counts differ.
    pub fn concat<'a, I>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a Population)>,
    {
        let mut out: Option<Population> = None;
        for (name, part) in parts {
            match out.as_mut() {
                None => out = Some(part.clone()),
                Some(acc) => {
                    if acc.columns.len() != part.columns.len() {
                        return Err(Error::ColumnMismatch {
                            source_name: name.to_owned(),
                            expected: acc.columns.len(),
                            got: part.columns.len(),
                        });
                    }
                    acc.fields.extend(part.fields.iter().cloned());
                    acc.objectives.extend(part.objectives.iter().cloned());
                }
            }
        }
        Ok(out.unwrap_or_else(Self::empty))
    }

    fn empty() -> Self {
        Self {
            columns: Vec::new(),
            fields: Vec::new(),
            objectives: Vec::new(),
        }
    }

    /// Keep only the rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            fields: indices.iter().map(|&i| self.fields[i].clone()).collect(),
            objectives: indices.iter().map(|&i| self.objectives[i].clone()).collect(),
        }
    }

    /// Column names, with objective columns renamed.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw text of every row, all columns.
    #[must_use]
    pub fn fields(&self) -> &[Vec<String>] {
        &self.fields
    }

    /// Parsed objective vectors, one per row.
    #[must_use]
    pub fn objective_values(&self) -> &[Vec<f64>] {
        &self.objectives
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objectives.len()
    }

    /// Whether the population has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }

    /// Write as CSV with a header and no index column.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn write_csv(&self, mut writer: impl Write) -> std::io::Result<()> {
        write_record(&mut writer, &self.columns)?;
        for row in &self.fields {
            write_record(&mut writer, row)?;
        }
        writer.flush()
    }

    /// Write to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(BufWriter::new(file))?;
        Ok(())
    }
}

/// Check that every vector has `dims` finite coordinates.
pub(crate) fn check_vectors(vectors: &[Vec<f64>], dims: usize) -> Result<()> {
    for (row, v) in vectors.iter().enumerate() {
        if v.len() != dims {
            return Err(Error::DimensionMismatch {
                expected: dims,
                got: v.len(),
                row,
            });
        }
        if let Some((column, &value)) = v.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(Error::NonFinite { row, column, value });
        }
    }
    Ok(())
}

fn write_record(writer: &mut impl Write, record: &[String]) -> std::io::Result<()> {
    for (i, field) in record.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(csv_escape(field).as_bytes())?;
    }
    writer.write_all(b"\n")
}

/// Escape a string for CSV output. If the value contains a comma, quote, or
/// newline, wrap it in double-quotes and double any embedded quotes.
pub(crate) fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split CSV text into records. Quoted fields may contain commas, doubled
/// quotes and newlines. Blank lines are skipped.
///
/// Errors carry the 1-based line number where the problem was found.
fn parse_csv(text: &str) -> core::result::Result<Vec<Vec<String>>, (usize, String)> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
            }
            '"' => return Err((line, "unexpected quote inside unquoted field".into())),
            ',' => {
                record.push(core::mem::take(&mut field));
                quoted_field = false;
            }
            '\r' => {}
            '\n' => {
                if !(record.is_empty() && field.is_empty() && !quoted_field) {
                    record.push(core::mem::take(&mut field));
                    records.push(core::mem::take(&mut record));
                }
                quoted_field = false;
                line += 1;
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err((line, "unterminated quoted field".into()));
    }
    if !(record.is_empty() && field.is_empty() && !quoted_field) {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}
