//! Collects the EIA weekly storage report into `history_storage.csv`, one
//! row per run date.

use anyhow::Result;
use log::{error, info};

use crate::{
    cli::{create_spinner, Settings},
    download::{self, fetch_text},
    history::{RunStamp, STORAGE},
    reading::storage::{self, StorageRegion, StorageReport},
};

use super::{save_row, Outcome};

const URL: &str = "https://ir.eia.gov/ngs/wngsr.json";

pub async fn storage(settings: &Settings) -> Result<Outcome> {
    let stamp = RunStamp::now();

    let report = match fetch_report(settings).await {
        Ok(report) => report,
        Err(e) => {
            error!("Storage report unavailable: {:#}", e);
            return Ok(Outcome::Skipped("storage report unavailable".to_string()));
        }
    };

    collect(settings, &report, &stamp)
}

async fn fetch_report(settings: &Settings) -> Result<StorageReport> {
    let client = download::client(settings.timeout)?;

    let bar = create_spinner(format!("Downloading {}...", download::file_name(URL)));
    let text = fetch_text(&client, URL).await;
    bar.finish_with_message("Storage report downloaded");

    storage::parse(&text?)
}

fn collect(settings: &Settings, report: &StorageReport, stamp: &RunStamp) -> Result<Outcome> {
    if !report.is_usable() {
        error!("Storage report has no report date or no known regions");
        return Ok(Outcome::Skipped("no storage data".to_string()));
    }

    info!(
        "Report date {} (week ago {}, year ago {})",
        report.report_date.as_deref().unwrap_or_default(),
        report.week_ago_date.as_deref().unwrap_or("unknown"),
        report.year_ago_date.as_deref().unwrap_or("unknown")
    );
    if let Some(total) = report.regions.get(&StorageRegion::Total) {
        info!(
            "Total stock {:?} Bcf, year ago {:?} Bcf",
            total.stock, total.year_ago
        );
    }

    save_row(&settings.data_dir, STORAGE, report.to_row(stamp))
}

// -- Tests -------------------------------------------------------------------
