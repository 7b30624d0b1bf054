//! Flat per-dataset history files, one row per date key.
//!
//! A new row replaces any row with the same key, the table is re-sorted by
//! key, and the whole file is rewritten with a normalised column order:
//! leading columns, metric columns, then `Update_Time`.

pub mod row;

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use tempfile::NamedTempFile;

pub use row::{Field, HistoryRow, RunStamp};

pub const UPDATE_TIME: &str = "Update_Time";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Describes where a dataset lives and how its columns are ordered.
pub struct Layout {
    pub file_name: &'static str,
    pub key: &'static str,
    pub leading: &'static [&'static str],
}

pub const WEATHER: Layout = Layout {
    file_name: "history_weather.csv",
    key: "Date",
    leading: &["Date"],
};

pub const HDD: Layout = Layout {
    file_name: "history_hdd.csv",
    key: "Run_Date",
    leading: &["Run_Date", "Source_Date"],
};

pub const STORAGE: Layout = Layout {
    file_name: "history_storage.csv",
    key: "Run_Date",
    leading: &["Run_Date", "Report_Date"],
};

#[derive(Debug, Clone)]
pub struct HistoryFile {
    layout: Layout,
    columns: Vec<String>,
    rows: Vec<HistoryRow>,
}

impl HistoryFile {
    pub fn new(layout: Layout) -> Self {
        HistoryFile {
            layout,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Loads a history file. A missing file is an empty history.
    pub fn load(path: &Path, layout: Layout) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(layout));
        }

        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Self::from_reader(file, layout).with_context(|| format!("Failed to read {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, layout: Layout) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        if headers.is_empty() {
            return Ok(Self::new(layout));
        }
        if !headers.iter().any(|h| h == layout.key) {
            bail!("History has no `{}` column", layout.key);
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row = HistoryRow::new();
            for (column, cell) in headers.iter().zip(record.iter()) {
                row.set(column, Field::parse(cell));
            }
            rows.push(row);
        }

        Ok(HistoryFile {
            layout,
            columns: headers,
            rows,
        })
    }

    /// Inserts `row`, replacing any row with the same key. Returns true if a
    /// row was replaced.
    pub fn upsert(&mut self, row: HistoryRow) -> Result<bool> {
        let key_column = self.layout.key;
        let key = row
            .text(key_column)
            .ok_or_else(|| anyhow!("Row has no `{}` value", key_column))?;

        let before = self.rows.len();
        self.rows
            .retain(|r| r.text(key_column).as_deref() != Some(key.as_str()));
        let replaced = self.rows.len() != before;

        for column in row.columns() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.to_string());
            }
        }

        self.rows.push(row);
        self.rows.sort_by_key(|r| r.text(key_column));
        self.normalise_columns();

        Ok(replaced)
    }

    fn normalise_columns(&mut self) {
        let leading = self.layout.leading;

        let mut ordered: Vec<String> = leading.iter().map(|c| c.to_string()).collect();
        ordered.extend(
            self.columns
                .iter()
                .filter(|c| !leading.contains(&c.as_str()) && c.as_str() != UPDATE_TIME)
                .cloned(),
        );
        ordered.push(UPDATE_TIME.to_string());

        self.columns = ordered;
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;

        for row in &self.rows {
            wtr.write_record(
                self.columns
                    .iter()
                    .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default()),
            )?;
        }
        wtr.flush()?;

        Ok(())
    }

    /// Rewrites the whole file via a sibling temporary file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        self.write_to(&mut tmp)?;
        tmp.persist(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    /// The row with the greatest key.
    pub fn latest(&self) -> Option<&HistoryRow> {
        let key_column = self.layout.key;
        self.rows.iter().max_by_key(|r| r.text(key_column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// -- Tests -------------------------------------------------------------------
