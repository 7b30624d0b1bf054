//! EIA weekly natural gas storage report (`wngsr.json`).

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::history::{HistoryRow, RunStamp, UPDATE_TIME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StorageRegion {
    Total,
    East,
    Midwest,
    SouthCentral,
}

impl StorageRegion {
    pub const ALL: [StorageRegion; 4] = [
        StorageRegion::Total,
        StorageRegion::East,
        StorageRegion::Midwest,
        StorageRegion::SouthCentral,
    ];

    /// Lower-case prefix of the series name.
    pub fn series_prefix(&self) -> &'static str {
        match self {
            StorageRegion::Total => "total lower 48",
            StorageRegion::East => "east",
            StorageRegion::Midwest => "midwest",
            StorageRegion::SouthCentral => "south central",
        }
    }

    /// Column prefix in the history file.
    pub fn prefix(&self) -> &'static str {
        match self {
            StorageRegion::Total => "Total",
            StorageRegion::East => "East",
            StorageRegion::Midwest => "Midwest",
            StorageRegion::SouthCentral => "SouthCentral",
        }
    }

    fn from_series_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| name.starts_with(r.series_prefix()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// Working gas in storage for one region, in Bcf.
pub struct RegionStorage {
    pub stock: Option<f64>,
    pub net_change: Option<f64>,
    pub year_ago: Option<f64>,
    pub five_year_avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageReport {
    pub report_date: Option<String>,
    pub week_ago_date: Option<String>,
    pub year_ago_date: Option<String>,
    pub regions: BTreeMap<StorageRegion, RegionStorage>,
}

impl StorageReport {
    /// A report is usable once it has a date and at least one region.
    pub fn is_usable(&self) -> bool {
        self.report_date.is_some() && !self.regions.is_empty()
    }

    /// Builds the storage history row. Regions missing from the report are null.
    pub fn to_row(&self, stamp: &RunStamp) -> HistoryRow {
        let mut row = HistoryRow::new()
            .with("Run_Date", stamp.run_date())
            .with("Report_Date", self.report_date.clone().unwrap_or_default());

        for region in StorageRegion::ALL {
            let r = self.regions.get(&region).copied().unwrap_or_default();
            let prefix = region.prefix();
            row.set(&format!("{}_Stock", prefix), r.stock);
            row.set(&format!("{}_Net_Change", prefix), r.net_change);
            row.set(&format!("{}_Year_Ago", prefix), r.year_ago);
            row.set(&format!("{}_5Yr_Avg", prefix), r.five_year_avg);
        }

        row.with(UPDATE_TIME, stamp.update_time())
    }
}

#[derive(Debug, Deserialize)]
struct RawReport {
    current_week: Option<String>,
    week_ago: Option<String>,
    year_ago: Option<String>,
    #[serde(default)]
    series: Vec<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct RawSeries {
    #[serde(default)]
    name: String,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    calculated: HashMap<String, Value>,
}

impl RawSeries {
    /// Value of the data point dated `date`.
    fn value_at(&self, date: Option<&str>) -> Option<f64> {
        let date = date?;
        self.data.iter().find_map(|point| match point.as_slice() {
            [Value::String(d), value, ..] if d == date => number(value),
            _ => None,
        })
    }

    fn calculated(&self, key: &str) -> Option<f64> {
        self.calculated.get(key).and_then(number)
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings.
fn number(value: &Value) -> Option<f64> {
    let v: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };

    v.filter(|v| v.is_finite())
}

/// Parses the report. A body that is not JSON is an error; missing series or
/// fields are left empty.
pub fn parse(text: &str) -> Result<StorageReport> {
    let text = text.trim_start_matches('\u{feff}');
    let raw: RawReport = serde_json::from_str(text).context("Malformed storage report")?;

    let mut regions = BTreeMap::new();
    for series in &raw.series {
        let Some(region) = StorageRegion::from_series_name(&series.name) else {
            continue;
        };

        let year_ago = series
            .value_at(raw.year_ago.as_deref())
            .or_else(|| series.calculated("year_ago"));

        regions.insert(
            region,
            RegionStorage {
                stock: series.value_at(raw.current_week.as_deref()),
                net_change: series.calculated("net_change"),
                year_ago,
                five_year_avg: series.calculated("5yr-avg"),
            },
        );
    }

    Ok(StorageReport {
        report_date: raw.current_week,
        week_ago_date: raw.week_ago,
        year_ago_date: raw.year_ago,
        regions,
    })
}

// -- Tests -------------------------------------------------------------------
