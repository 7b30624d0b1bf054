//! CPC weekly heating degree day report.
//!
//! See https://www.cpc.ncep.noaa.gov/products/analysis_monitoring/cdus/degree_days/
//! for the report layout. Only the gas-customer-weighted section is read.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use crate::history::{HistoryRow, RunStamp, UPDATE_TIME};

const SECTION_HEADER: &str = "GAS HOME HEATING CUSTOMER WEIGHTED";
const SOURCE_DATE_PATTERN: &str =
    r"LAST DATE OF DATA COLLECTION PERIOD IS\s+(\w+)\s+(\d+),\s+(\d{4})";
pub const UNKNOWN_DATE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Region {
    NewEngland,
    MiddleAtlantic,
    EastNorthCentral,
    UnitedStates,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::NewEngland,
        Region::MiddleAtlantic,
        Region::EastNorthCentral,
        Region::UnitedStates,
    ];

    /// Text identifying the region's line in the report.
    pub fn keyword(&self) -> &'static str {
        match self {
            Region::NewEngland => "NEW ENGLAND",
            Region::MiddleAtlantic => "MIDDLE ATLANTIC",
            Region::EastNorthCentral => "E N CENTRAL",
            Region::UnitedStates => "UNITED STATES",
        }
    }

    /// Column prefix in the history file.
    pub fn prefix(&self) -> &'static str {
        match self {
            Region::NewEngland => "NE",
            Region::MiddleAtlantic => "MA",
            Region::EastNorthCentral => "MW",
            Region::UnitedStates => "US",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Region::NewEngland => "New England",
            Region::MiddleAtlantic => "Mid-Atlantic",
            Region::EastNorthCentral => "Midwest",
            Region::UnitedStates => "US Total",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeDays {
    pub actual: i32,
    pub dev_norm: i32,
    pub dev_year: i32,
    pub seasonal_total: Option<i32>,
}

impl DegreeDays {
    fn from_numbers(numbers: &[i32]) -> Option<Self> {
        match numbers {
            [actual, dev_norm, dev_year, rest @ ..] => Some(DegreeDays {
                actual: *actual,
                dev_norm: *dev_norm,
                dev_year: *dev_year,
                seasonal_total: rest.first().copied(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HddReport {
    pub source_date: Option<NaiveDate>,
    pub regions: BTreeMap<Region, DegreeDays>,
}

impl HddReport {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn source_date_label(&self) -> String {
        self.source_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    }

    /// Builds the HDD history row. Regions missing from the report are null.
    pub fn to_row(&self, stamp: &RunStamp) -> HistoryRow {
        let mut row = HistoryRow::new()
            .with("Run_Date", stamp.run_date())
            .with("Source_Date", self.source_date_label());

        for region in Region::ALL {
            let dd = self.regions.get(&region);
            let prefix = region.prefix();
            row.set(&format!("{}_Actual", prefix), dd.map(|d| d.actual));
            row.set(&format!("{}_Dev_Norm", prefix), dd.map(|d| d.dev_norm));
            row.set(&format!("{}_Dev_Year", prefix), dd.map(|d| d.dev_year));
            row.set(
                &format!("{}_Seas_Total", prefix),
                dd.and_then(|d| d.seasonal_total),
            );
        }

        row.with(UPDATE_TIME, stamp.update_time())
    }
}

/// Parses the report text. Missing pieces are left out rather than failing.
pub fn parse(text: &str) -> Result<HddReport> {
    let numbers = Regex::new(r"-?\d+")?;

    let mut report = HddReport {
        source_date: source_date(text)?,
        regions: BTreeMap::new(),
    };

    let Some(start) = text.find(SECTION_HEADER) else {
        return Ok(report);
    };
    let section = &text[start + SECTION_HEADER.len()..];

    // the header line itself carries no region data
    for line in section.lines().skip(1) {
        for region in Region::ALL {
            if report.regions.contains_key(&region) || !line.contains(region.keyword()) {
                continue;
            }

            // one unreadable token would shift every later column
            let values: Option<Vec<i32>> = numbers
                .find_iter(line)
                .map(|m| m.as_str().parse::<i32>().ok())
                .collect();

            if let Some(dd) = values.as_deref().and_then(DegreeDays::from_numbers) {
                report.regions.insert(region, dd);
            }
        }

        if report.regions.len() == Region::ALL.len() {
            break;
        }
    }

    Ok(report)
}

/// Reads "LAST DATE OF DATA COLLECTION PERIOD IS NOV 22, 2025".
fn source_date(text: &str) -> Result<Option<NaiveDate>> {
    let pattern = RegexBuilder::new(SOURCE_DATE_PATTERN)
        .case_insensitive(true)
        .build()?;

    let date = pattern.captures(text).and_then(|caps| {
        let joined = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
        NaiveDate::parse_from_str(&joined, "%b %d %Y").ok()
    });

    Ok(date)
}

// -- Tests -------------------------------------------------------------------
