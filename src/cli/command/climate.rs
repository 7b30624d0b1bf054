//! Collects the GEFS AO, NAO and PNA ensemble forecasts into
//! `history_weather.csv`, one row per forecast date.

use anyhow::Result;
use futures::future::join_all;
use log::{error, info, warn};
use reqwest::Client;

use crate::{
    cli::{create_spinner, Settings},
    download::{self, fetch_text},
    history::{RunStamp, WEATHER},
    reading::climate::{self, Index, IndexForecast},
};

use super::{save_row, Outcome};

pub async fn climate(settings: &Settings) -> Result<Outcome> {
    let client = download::client(settings.timeout)?;
    let forecasts = fetch_forecasts(&client).await;

    collect(settings, &forecasts, &RunStamp::now())
}

fn source_url(index: Index) -> &'static str {
    match index {
        Index::Ao => "https://ftp.cpc.ncep.noaa.gov/cwlinks/norm.daily.ao.gefs.z1000.120days.csv",
        Index::Nao => "https://ftp.cpc.ncep.noaa.gov/cwlinks/norm.daily.nao.gefs.z500.120days.csv",
        Index::Pna => "https://ftp.cpc.ncep.noaa.gov/cwlinks/norm.daily.pna.gefs.z500.120days.csv",
    }
}

/// Fetches the three feeds concurrently. Failed feeds are logged and left out.
async fn fetch_forecasts(client: &Client) -> Vec<IndexForecast> {
    let bar = create_spinner("Downloading teleconnection indices...".to_string());
    let results = join_all(Index::ALL.map(|index| fetch_forecast(client, index))).await;
    bar.finish_with_message("Teleconnection indices downloaded");

    let mut forecasts = Vec::new();
    for (index, result) in Index::ALL.into_iter().zip(results) {
        match result {
            Ok(forecast) => {
                info!(
                    "{:<3} | {} | Obs {:?} | D7 {:?} | D10 {:?} | D14 {:?}",
                    index.label(),
                    forecast.date(),
                    forecast.obs,
                    forecast.day7,
                    forecast.day10,
                    forecast.day14
                );
                forecasts.push(forecast);
            }
            Err(e) => error!("{} download failed: {:#}", index.label(), e),
        }
    }

    forecasts
}

async fn fetch_forecast(client: &Client, index: Index) -> Result<IndexForecast> {
    let text = fetch_text(client, source_url(index)).await?;
    climate::parse(index, &text)
}

fn collect(settings: &Settings, forecasts: &[IndexForecast], stamp: &RunStamp) -> Result<Outcome> {
    let Some(row) = climate::to_row(forecasts, stamp) else {
        error!("Every index download failed");
        return Ok(Outcome::Skipped("no teleconnection data".to_string()));
    };

    let date = row.text(WEATHER.key).unwrap_or_default();
    info!("Forecast date {}", date);

    for index in Index::ALL {
        let present = forecasts
            .iter()
            .any(|f| f.index == index && f.date().format("%Y-%m-%d").to_string() == date);
        if !present {
            warn!("{} data missing for {}", index.label(), date);
        }
    }

    save_row(&settings.data_dir, WEATHER, row)
}

// -- Tests -------------------------------------------------------------------
