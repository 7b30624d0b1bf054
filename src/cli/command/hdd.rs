//! Collects the weekly gas-customer-weighted heating degree days into
//! `history_hdd.csv`, one row per run date.

use anyhow::Result;
use log::{error, info, warn};

use crate::{
    cli::{create_spinner, Settings},
    download::{self, fetch_text},
    history::{RunStamp, HDD},
    reading::hdd::{self, HddReport, Region},
};

use super::{save_row, Outcome};

const URL: &str =
    "https://www.cpc.ncep.noaa.gov/products/analysis_monitoring/cdus/degree_days/wsahddy.txt";

pub async fn hdd(settings: &Settings) -> Result<Outcome> {
    let stamp = RunStamp::now();

    let report = match fetch_report(settings).await {
        Ok(report) => report,
        Err(e) => {
            error!("Degree day report unavailable: {:#}", e);
            return Ok(Outcome::Skipped("degree day report unavailable".to_string()));
        }
    };

    collect(settings, &report, &stamp)
}

async fn fetch_report(settings: &Settings) -> Result<HddReport> {
    let client = download::client(settings.timeout)?;

    let bar = create_spinner(format!("Downloading {}...", download::file_name(URL)));
    let text = fetch_text(&client, URL).await;
    bar.finish_with_message("Degree day report downloaded");

    hdd::parse(&text?)
}

fn collect(settings: &Settings, report: &HddReport, stamp: &RunStamp) -> Result<Outcome> {
    info!("Source date {}", report.source_date_label());

    if report.is_empty() {
        error!("No gas-weighted regions found in the degree day report");
        return Ok(Outcome::Skipped("no degree day regions found".to_string()));
    }

    for region in Region::ALL {
        match report.regions.get(&region) {
            Some(dd) => info!(
                "{:<16} actual {:>4} | vs norm {:>4} | vs last year {:>4}",
                region.display_name(),
                dd.actual,
                dd.dev_norm,
                dd.dev_year
            ),
            None => warn!("{} missing from the degree day report", region.display_name()),
        }
    }

    save_row(&settings.data_dir, HDD, report.to_row(stamp))
}

// -- Tests -------------------------------------------------------------------
