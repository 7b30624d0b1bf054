pub mod climate;
pub mod hdd;
pub mod storage;
pub mod summary;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use log::info;

pub use climate::climate;
pub use hdd::hdd;
pub use storage::storage;
pub use summary::summary;

use crate::history::{HistoryFile, HistoryRow, Layout};

/// What a collector run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved {
        path: PathBuf,
        key: String,
        replaced: bool,
    },
    Skipped(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Saved {
                path,
                key,
                replaced: true,
            } => write!(f, "Row {} replaced in `{}`", key, path.display()),
            Outcome::Saved { path, key, .. } => {
                write!(f, "Row {} saved to `{}`", key, path.display())
            }
            Outcome::Skipped(reason) => write!(f, "Skipped: {}", reason),
        }
    }
}

pub fn history_path(data_dir: &Path, layout: &Layout) -> PathBuf {
    data_dir.join(layout.file_name)
}

/// Upserts `row` into the dataset's history file and rewrites it.
pub fn save_row(data_dir: &Path, layout: Layout, row: HistoryRow) -> Result<Outcome> {
    let path = history_path(data_dir, &layout);
    let key = row.text(layout.key).unwrap_or_default();

    let mut history = HistoryFile::load(&path, layout)?;
    if history.is_empty() {
        info!("Initialising {}", path.display());
    }

    let replaced = history.upsert(row)?;
    if replaced {
        info!("Replacing existing row for {}", key);
    }
    history.save(&path)?;
    info!(
        "{} rows, {} columns in {}",
        history.len(),
        history.columns().len(),
        path.display()
    );

    Ok(Outcome::Saved {
        path,
        key,
        replaced,
    })
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use tempfile::TempDir;

    use super::*;
    use crate::history::{UPDATE_TIME, WEATHER};

    #[test]
    fn should_report_replacement() {
        let dir = TempDir::new().unwrap();
        let row = HistoryRow::new()
            .with("Date", "2025-11-20")
            .with(UPDATE_TIME, "2025-11-20 09:00:00");

        let first = save_row(dir.path(), WEATHER, row.clone()).unwrap();
        let second = save_row(dir.path(), WEATHER, row).unwrap();

        let path = dir.path().join("history_weather.csv");
        assert_eq!(
            first,
            Outcome::Saved {
                path: path.clone(),
                key: "2025-11-20".to_string(),
                replaced: false
            }
        );
        assert_eq!(
            second,
            Outcome::Saved {
                path,
                key: "2025-11-20".to_string(),
                replaced: true
            }
        );
    }

    #[test]
    fn should_display_skip_reason() {
        let outcome = Outcome::Skipped("no data".to_string());
        assert_eq!(outcome.to_string(), "Skipped: no data");
    }
}
