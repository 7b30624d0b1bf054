//! GEFS teleconnection index feeds.
//!
//! Each feed is a CSV of ensemble forecasts with one row per issue time,
//! ensemble member and lead (days). The most recent issue time is averaged
//! across members to give the ensemble mean at each lead.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};

use crate::history::{HistoryRow, RunStamp, UPDATE_TIME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Index {
    Ao,
    Nao,
    Pna,
}

impl Index {
    pub const ALL: [Index; 3] = [Index::Ao, Index::Nao, Index::Pna];

    pub fn label(&self) -> &'static str {
        match self {
            Index::Ao => "AO",
            Index::Nao => "NAO",
            Index::Pna => "PNA",
        }
    }

    /// Name of the value column in the feed.
    pub fn value_column(&self) -> String {
        format!("{}_index", self.label().to_lowercase())
    }
}

/// Leads kept from each feed, with their history column suffix.
pub const LEADS: [(i64, &str); 4] = [(0, "Obs"), (7, "Day7"), (10, "Day10"), (14, "Day14")];

#[derive(Debug, Clone, PartialEq)]
pub struct IndexForecast {
    pub index: Index,
    pub issued: NaiveDateTime,
    pub obs: Option<f64>,
    pub day7: Option<f64>,
    pub day10: Option<f64>,
    pub day14: Option<f64>,
}

impl IndexForecast {
    pub fn date(&self) -> NaiveDate {
        self.issued.date()
    }

    fn at_lead(&self, lead: i64) -> Option<f64> {
        match lead {
            0 => self.obs,
            7 => self.day7,
            10 => self.day10,
            14 => self.day14,
            _ => None,
        }
    }
}

/// Parses one index feed into the ensemble mean of its latest issue time.
pub fn parse(index: Index, text: &str) -> Result<IndexForecast> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("{} feed has no `{}` column", index.label(), name))
    };
    let time_col = column("time")?;
    let lead_col = column("lead")?;
    let value_col = column(&index.value_column())?;

    let mut issued: Option<NaiveDateTime> = None;
    let mut samples: Vec<(NaiveDateTime, i64, f64)> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let raw_time = record.get(time_col).unwrap_or_default();
        let time = parse_time(raw_time)
            .ok_or_else(|| anyhow!("Unreadable time `{}` in {} feed", raw_time, index.label()))?;
        issued = issued.max(Some(time));

        let lead = record.get(lead_col).and_then(parse_lead);
        let value = record
            .get(value_col)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite());

        if let (Some(lead), Some(value)) = (lead, value) {
            samples.push((time, lead, value));
        }
    }

    // an issue with no valid values yet still dates the forecast
    let issued = issued.ok_or_else(|| anyhow!("{} feed has no data", index.label()))?;

    let means = ensemble_means(
        samples
            .iter()
            .filter(|(time, _, _)| *time == issued)
            .map(|(_, lead, value)| (*lead, *value)),
    );

    Ok(IndexForecast {
        index,
        issued,
        obs: means.get(&0).copied(),
        day7: means.get(&7).copied(),
        day10: means.get(&10).copied(),
        day14: means.get(&14).copied(),
    })
}

/// Mean value per lead.
pub fn ensemble_means(samples: impl Iterator<Item = (i64, f64)>) -> BTreeMap<i64, f64> {
    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (lead, value) in samples {
        let entry = sums.entry(lead).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(lead, (sum, count))| (lead, sum / count as f64))
        .collect()
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_lead(s: &str) -> Option<i64> {
    let lead = s.trim().parse::<f64>().ok()?;
    if lead.fract() == 0.0 {
        Some(lead as i64)
    } else {
        None
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Builds the weather history row from whichever forecasts arrived.
///
/// The row is dated by the first forecast in index order. A forecast issued
/// on a different date contributes nulls. Returns `None` when nothing
/// arrived.
pub fn to_row(forecasts: &[IndexForecast], stamp: &RunStamp) -> Option<HistoryRow> {
    let target = Index::ALL
        .iter()
        .find_map(|index| forecasts.iter().find(|f| f.index == *index))?
        .date();

    let mut row = HistoryRow::new().with("Date", target.format("%Y-%m-%d").to_string());

    for index in Index::ALL {
        let forecast = forecasts
            .iter()
            .find(|f| f.index == index && f.date() == target);

        for (lead, suffix) in LEADS {
            let value = forecast.and_then(|f| f.at_lead(lead)).map(round4);
            row.set(&format!("{}_{}", index.label(), suffix), value);
        }
    }

    Some(row.with(UPDATE_TIME, stamp.update_time()))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::history::Field;

    const AO_FEED: &str = "\
time,ens,lead,ao_index
2025-11-19,1,0,-1.0
2025-11-19,1,7,-1.0
2025-11-20,1,0,-0.5
2025-11-20,2,0,-1.5
2025-11-20,1,7,0.25
2025-11-20,2,7,0.75
2025-11-20,1,10,1.0
2025-11-20,2,10,
2025-11-20,3,10,NaN
2025-11-20,1,14,2.00004
2025-11-20,2,14,2.0
";

    fn stamp() -> RunStamp {
        RunStamp::at(
            NaiveDate::from_ymd_opt(2025, 11, 20)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    fn forecast(index: Index, date: &str, obs: f64) -> IndexForecast {
        IndexForecast {
            index,
            issued: parse_time(date).unwrap(),
            obs: Some(obs),
            day7: Some(obs + 0.1),
            day10: None,
            day14: Some(obs - 0.1),
        }
    }

    #[test]
    fn should_average_latest_issue_across_members() {
        let f = parse(Index::Ao, AO_FEED).unwrap();

        assert_eq!(f.date(), NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        assert_eq!(f.obs, Some(-1.0));
        assert_eq!(f.day7, Some(0.5));
        assert_eq!(f.day10, Some(1.0));
        assert!((f.day14.unwrap() - 2.00002).abs() < 1e-9);
    }

    #[test]
    fn should_leave_missing_leads_null() {
        let feed = "time,lead,nao_index\n2025-11-20 00:00:00,0,0.3\n";
        let f = parse(Index::Nao, feed).unwrap();

        assert_eq!(f.obs, Some(0.3));
        assert_eq!(f.day7, None);
        assert_eq!(f.day14, None);
    }

    #[test]
    fn should_fail_without_value_column() {
        let feed = "time,lead,ao_index\n2025-11-20,0,0.3\n";
        assert!(parse(Index::Pna, feed).is_err());
    }

    #[test]
    fn should_date_newest_issue_even_without_values() {
        let feed = "time,lead,ao_index\n2025-11-19,0,-1.0\n2025-11-20,0,NaN\n2025-11-20,7,\n";
        let f = parse(Index::Ao, feed).unwrap();

        assert_eq!(f.date(), NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        assert_eq!(f.obs, None);
        assert_eq!(f.day7, None);
        assert_eq!(f.day14, None);
    }

    #[test]
    fn should_fail_on_empty_feed() {
        assert!(parse(Index::Ao, "time,lead,ao_index\n").is_err());
    }

    #[test]
    fn should_name_value_columns() {
        assert_eq!(Index::Ao.value_column(), "ao_index");
        assert_eq!(Index::Pna.value_column(), "pna_index");
    }

    #[test]
    fn should_build_row_with_rounded_floats() {
        let f = parse(Index::Ao, AO_FEED).unwrap();
        let row = to_row(&[f], &stamp()).unwrap();

        assert_eq!(row.text("Date"), Some("2025-11-20".to_string()));
        assert_eq!(row.get("AO_Day14"), Some(&Field::Float(2.0)));
        assert_eq!(row.get("NAO_Obs"), Some(&Field::Null));
        assert_eq!(row.text("Update_Time"), Some("2025-11-20 09:30:00".to_string()));
        assert_eq!(row.columns().count(), 14);
    }

    #[test]
    fn should_null_forecasts_from_other_dates() {
        let forecasts = vec![
            forecast(Index::Pna, "2025-11-19", 0.4),
            forecast(Index::Nao, "2025-11-20", -0.2),
        ];
        let row = to_row(&forecasts, &stamp()).unwrap();

        assert_eq!(row.text("Date"), Some("2025-11-20".to_string()));
        assert_eq!(row.get("NAO_Obs"), Some(&Field::Float(-0.2)));
        assert_eq!(row.get("NAO_Day10"), Some(&Field::Null));
        assert_eq!(row.get("PNA_Obs"), Some(&Field::Null));
        assert_eq!(row.get("AO_Day7"), Some(&Field::Null));
    }

    #[test]
    fn should_skip_row_when_nothing_arrived() {
        assert!(to_row(&[], &stamp()).is_none());
    }
}
