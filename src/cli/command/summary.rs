//! Prints the latest row of each history file, with the sign conventions a
//! gas trader reads them by. Presentation only.

use std::fmt::{self, Write};

use anyhow::Result;

use crate::{
    cli::Settings,
    history::{HistoryFile, HistoryRow, Layout, HDD, STORAGE, WEATHER},
    reading::{
        climate::{Index, LEADS},
        hdd::Region,
        storage::StorageRegion,
    },
};

use super::history_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Bullish => write!(f, "bullish (cold)"),
            Signal::Bearish => write!(f, "bearish (mild)"),
            Signal::Neutral => write!(f, "neutral"),
        }
    }
}

/// Negative AO and NAO, and positive PNA, favour cold in the eastern US.
pub fn index_signal(index: Index, value: Option<f64>) -> Signal {
    let Some(value) = value else {
        return Signal::Neutral;
    };
    if value == 0.0 {
        return Signal::Neutral;
    }

    let cold_when_negative = matches!(index, Index::Ao | Index::Nao);
    if (value < 0.0) == cold_when_negative {
        Signal::Bullish
    } else {
        Signal::Bearish
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    StrongBuy,
    StrongSell,
    Mixed,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::StrongBuy => write!(f, "Strong Buy (deep cold)"),
            Regime::StrongSell => write!(f, "Strong Sell (mild winter)"),
            Regime::Mixed => write!(f, "Neutral (mixed signals)"),
        }
    }
}

pub fn regime(signals: &[Signal]) -> Regime {
    if signals.is_empty() {
        Regime::Mixed
    } else if signals.iter().all(|s| *s == Signal::Bullish) {
        Regime::StrongBuy
    } else if signals.iter().all(|s| *s == Signal::Bearish) {
        Regime::StrongSell
    } else {
        Regime::Mixed
    }
}

pub fn summary(settings: &Settings) -> Result<String> {
    let mut out = String::new();

    let weather = latest(settings, WEATHER)?;
    write_weather(&mut out, weather.as_ref())?;
    writeln!(out)?;

    let hdd = latest(settings, HDD)?;
    write_hdd(&mut out, hdd.as_ref())?;
    writeln!(out)?;

    let storage = latest(settings, STORAGE)?;
    write_storage(&mut out, storage.as_ref())?;

    Ok(out)
}

fn latest(settings: &Settings, layout: Layout) -> Result<Option<HistoryRow>> {
    let history = HistoryFile::load(&history_path(&settings.data_dir, &layout), layout)?;
    Ok(history.latest().cloned())
}

fn number(row: &HistoryRow, column: &str) -> Option<f64> {
    row.get(column).and_then(|v| v.as_f64())
}

fn fmt_number(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.*}", decimals, v))
}

fn fmt_signed(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:+}", v))
}

fn arrow(v: f64) -> &'static str {
    if v > 0.0 {
        "▲"
    } else if v < 0.0 {
        "▼"
    } else {
        "-"
    }
}

/// Percent difference of `current` from `reference`.
pub fn pct_diff(current: Option<f64>, reference: Option<f64>) -> Option<f64> {
    match (current, reference) {
        (Some(c), Some(r)) if r != 0.0 => Some((c - r) / r * 100.0),
        _ => None,
    }
}

fn write_weather(out: &mut String, row: Option<&HistoryRow>) -> fmt::Result {
    let Some(row) = row else {
        return writeln!(out, "Teleconnections: no data");
    };

    writeln!(
        out,
        "Teleconnections ({})",
        row.text(WEATHER.key).unwrap_or_default()
    )?;

    let mut signals = Vec::new();
    for index in Index::ALL {
        let values: Vec<String> = LEADS
            .iter()
            .map(|(_, suffix)| {
                let v = number(row, &format!("{}_{}", index.label(), suffix));
                format!("{} {:>7}", suffix, fmt_number(v, 2))
            })
            .collect();

        let signal = index_signal(index, number(row, &format!("{}_Obs", index.label())));
        signals.push(signal);

        writeln!(
            out,
            "  {:<4} {}  {}",
            index.label(),
            values.join("  "),
            signal
        )?;
    }

    writeln!(out, "  Regime: {}", regime(&signals))
}

fn write_hdd(out: &mut String, row: Option<&HistoryRow>) -> fmt::Result {
    let Some(row) = row else {
        return writeln!(out, "Heating degree days: no data");
    };

    writeln!(
        out,
        "Heating degree days (run {}, source {})",
        row.text(HDD.key).unwrap_or_default(),
        row.text("Source_Date").unwrap_or_default()
    )?;

    for region in Region::ALL {
        let prefix = region.prefix();
        let actual = number(row, &format!("{}_Actual", prefix));
        let dev_norm = number(row, &format!("{}_Dev_Norm", prefix));
        let dev_year = number(row, &format!("{}_Dev_Year", prefix));

        writeln!(
            out,
            "  {:<14} actual {:>5}  vs norm {:>5}  vs year {} {}",
            region.display_name(),
            fmt_number(actual, 0),
            fmt_signed(dev_norm),
            dev_year.map_or("-", arrow),
            fmt_signed(dev_year)
        )?;
    }

    Ok(())
}

fn write_storage(out: &mut String, row: Option<&HistoryRow>) -> fmt::Result {
    let Some(row) = row else {
        return writeln!(out, "Storage: no data");
    };

    writeln!(
        out,
        "Storage, Bcf (report {})",
        row.text("Report_Date").unwrap_or_default()
    )?;

    for region in StorageRegion::ALL {
        let prefix = region.prefix();
        let stock = number(row, &format!("{}_Stock", prefix));
        let net_change = number(row, &format!("{}_Net_Change", prefix));
        let year_ago = number(row, &format!("{}_Year_Ago", prefix));
        let five_year = number(row, &format!("{}_5Yr_Avg", prefix));

        writeln!(
            out,
            "  {:<13} stock {:>6}  net {:>5}  year ago {:>6} ({:>6}%)  5yr avg {:>6} ({:>6}%)",
            prefix,
            fmt_number(stock, 0),
            fmt_signed(net_change),
            fmt_number(year_ago, 0),
            fmt_number(pct_diff(stock, year_ago), 1),
            fmt_number(five_year, 0),
            fmt_number(pct_diff(stock, five_year), 1)
        )?;
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::{cli::command::save_row, history::UPDATE_TIME};

    fn settings(dir: &TempDir) -> Settings {
        Settings {
            data_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn should_map_index_signs() {
        assert_eq!(index_signal(Index::Ao, Some(-1.2)), Signal::Bullish);
        assert_eq!(index_signal(Index::Nao, Some(0.4)), Signal::Bearish);
        assert_eq!(index_signal(Index::Pna, Some(0.9)), Signal::Bullish);
        assert_eq!(index_signal(Index::Pna, Some(-0.9)), Signal::Bearish);
        assert_eq!(index_signal(Index::Ao, Some(0.0)), Signal::Neutral);
        assert_eq!(index_signal(Index::Ao, None), Signal::Neutral);
    }

    #[test]
    fn should_derive_regime() {
        use Signal::*;

        assert_eq!(regime(&[Bullish, Bullish, Bullish]), Regime::StrongBuy);
        assert_eq!(regime(&[Bearish, Bearish, Bearish]), Regime::StrongSell);
        assert_eq!(regime(&[Bullish, Bearish, Bullish]), Regime::Mixed);
        assert_eq!(regime(&[Bullish, Neutral, Bullish]), Regime::Mixed);
        assert_eq!(regime(&[]), Regime::Mixed);
    }

    #[test]
    fn should_compute_percent_difference() {
        let pct = pct_diff(Some(3923.0), Some(3805.0)).unwrap();
        assert!((pct - 3.1011).abs() < 1e-3);
        assert_eq!(pct_diff(Some(1.0), Some(0.0)), None);
        assert_eq!(pct_diff(None, Some(1.0)), None);
    }

    #[test]
    fn should_report_missing_histories() {
        let dir = TempDir::new().unwrap();
        let text = summary(&settings(&dir)).unwrap();

        assert!(text.contains("Teleconnections: no data"));
        assert!(text.contains("Heating degree days: no data"));
        assert!(text.contains("Storage: no data"));
    }

    #[test]
    fn should_render_latest_rows() {
        let dir = TempDir::new().unwrap();

        for (date, ao) in [("2025-11-21", -1.5), ("2025-11-20", 2.0)] {
            let row = HistoryRow::new()
                .with("Date", date)
                .with("AO_Obs", Some(ao))
                .with("NAO_Obs", Some(-0.5))
                .with("PNA_Obs", Some(0.7))
                .with(UPDATE_TIME, format!("{} 09:00:00", date));
            save_row(dir.path(), WEATHER, row).unwrap();
        }

        let hdd = HistoryRow::new()
            .with("Run_Date", "2025-11-24")
            .with("Source_Date", "2025-11-22")
            .with("NE_Actual", Some(215))
            .with("NE_Dev_Norm", Some(12))
            .with("NE_Dev_Year", Some(-18))
            .with(UPDATE_TIME, "2025-11-24 06:00:00");
        save_row(dir.path(), HDD, hdd).unwrap();

        let text = summary(&settings(&dir)).unwrap();

        assert!(text.contains("Teleconnections (2025-11-21)"));
        assert!(text.contains("Regime: Strong Buy (deep cold)"));
        assert!(text.contains("vs year ▼ -18"));
        assert!(text.contains("source 2025-11-22"));
        assert!(text.contains("Storage: no data"));
    }
}
