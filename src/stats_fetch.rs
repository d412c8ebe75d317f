use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::http_client::http_client;
use crate::mvp_labels::mvp_player_id;
use crate::table::{Column, StatTable};
use crate::trainer::{SEASON_FILE_PREFIX, season_file_tag};

const DEFAULT_STATS_BASE_URL: &str = "https://stats.nba.com/stats";
const MIN_GAMES: f64 = 15.0;
const INTER_SEASON_DELAY: Duration = Duration::from_secs(1);

pub const DEFAULT_START_YEAR: i32 = 1996;
pub const DEFAULT_END_YEAR: i32 = 2025;

#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub data_dir: PathBuf,
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub rows_written: usize,
    pub errors: Vec<String>,
}

/// Fetch and store one CSV per season in `start_year..end_year`. A failed
/// season is recorded and the loop moves on; this is the only place in the
/// pipeline with partial-failure tolerance.
pub fn update_season_data(data_dir: &Path, start_year: i32, end_year: i32) -> Result<UpdateSummary> {
    if start_year >= end_year {
        return Err(anyhow!(
            "start year {start_year} must precede end year {end_year}"
        ));
    }
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    let mut summary = UpdateSummary {
        data_dir: data_dir.to_path_buf(),
        seasons_total: 0,
        seasons_succeeded: 0,
        rows_written: 0,
        errors: Vec::new(),
    };

    for year in start_year..end_year {
        let season = season_label(year);
        summary.seasons_total += 1;
        println!("Processing season: {season}");
        match fetch_and_store_season(&season, data_dir) {
            Ok(rows) => {
                summary.seasons_succeeded += 1;
                summary.rows_written += rows;
            }
            Err(err) => {
                eprintln!("[WARN] season {season}: {err:#}");
                summary.errors.push(format!("season {season}: {err:#}"));
            }
        }
        std::thread::sleep(INTER_SEASON_DELAY);
    }

    println!(
        "Data update complete: {}/{} seasons, {} rows",
        summary.seasons_succeeded, summary.seasons_total, summary.rows_written
    );
    Ok(summary)
}

/// "1996" → "1996-97", handling the century rollover.
pub fn season_label(start_year: i32) -> String {
    format!("{start_year}-{:02}", (start_year + 1) % 100)
}

fn fetch_and_store_season(season: &str, data_dir: &Path) -> Result<usize> {
    let mut table = fetch_season_stats(season)?;
    table = filter_min_games(&table);
    if table.n_rows() == 0 {
        return Err(anyhow!("no players with {MIN_GAMES}+ games"));
    }

    table.push_text(
        "SEASON",
        std::iter::repeat_n(season.to_string(), table.n_rows()).collect(),
    )?;
    label_mvp(&mut table, season)?;

    let path = data_dir.join(format!("{SEASON_FILE_PREFIX}{}.csv", season_file_tag(season)));
    table.write_csv_path(&path)?;
    println!("Saved {} rows to {}", table.n_rows(), path.display());
    Ok(table.n_rows())
}

fn fetch_season_stats(season: &str) -> Result<StatTable> {
    let base =
        std::env::var("NBA_STATS_BASE_URL").unwrap_or_else(|_| DEFAULT_STATS_BASE_URL.to_string());
    let client = http_client()?;
    let response = client
        .get(format!("{base}/leaguedashplayerstats"))
        .query(&[
            ("Season", season),
            ("SeasonType", "Regular Season"),
            ("PerMode", "PerGame"),
            ("MeasureType", "Base"),
            ("LeagueID", "00"),
        ])
        .send()
        .with_context(|| format!("request season stats for {season}"))?
        .error_for_status()
        .with_context(|| format!("season stats status for {season}"))?;
    let payload: Value = response
        .json()
        .with_context(|| format!("decode season stats json for {season}"))?;
    parse_stats_payload(&payload)
}

/// Decode the stats endpoint payload: `resultSets[0]` carries parallel
/// `headers` and `rowSet` arrays.
pub fn parse_stats_payload(payload: &Value) -> Result<StatTable> {
    let result_set = payload
        .get("resultSets")
        .and_then(|v| v.as_array())
        .and_then(|sets| sets.first())
        .ok_or_else(|| anyhow!("payload has no resultSets"))?;

    let headers: Vec<String> = result_set
        .get("headers")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("result set has no headers"))?
        .iter()
        .filter_map(|h| h.as_str().map(|s| s.to_string()))
        .collect();
    let rows = result_set
        .get("rowSet")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("result set has no rowSet"))?;

    let mut columns: Vec<(bool, Vec<f64>, Vec<String>)> =
        vec![(true, Vec::new(), Vec::new()); headers.len()];
    for row in rows {
        let cells = row
            .as_array()
            .ok_or_else(|| anyhow!("rowSet entry is not an array"))?;
        for (idx, slot) in columns.iter_mut().enumerate() {
            let cell = cells.get(idx).unwrap_or(&Value::Null);
            match cell {
                Value::Number(n) => {
                    slot.1.push(n.as_f64().unwrap_or(0.0));
                    slot.2.push(n.to_string());
                }
                Value::Null => {
                    slot.1.push(0.0);
                    slot.2.push(String::new());
                }
                Value::String(s) => {
                    slot.0 = false;
                    slot.2.push(s.clone());
                }
                other => {
                    slot.0 = false;
                    slot.2.push(other.to_string());
                }
            }
        }
    }

    let mut out = Vec::with_capacity(headers.len());
    for (name, (numeric, nums, texts)) in headers.into_iter().zip(columns) {
        let column = if numeric {
            Column::Numeric(nums)
        } else {
            Column::Text(texts)
        };
        out.push((name, column));
    }
    StatTable::from_columns(out)
}

fn filter_min_games(table: &StatTable) -> StatTable {
    let Some(gp) = table.numeric("GP") else {
        return table.clone();
    };
    let keep: Vec<usize> = (0..table.n_rows()).filter(|&i| gp[i] >= MIN_GAMES).collect();
    table.select_rows(&keep)
}

/// Append the MVP label column. A season whose mapped MVP id matches no row
/// is rejected rather than silently labeling nobody; a season with no
/// mapping at all (the current one) labels every row 0.
fn label_mvp(table: &mut StatTable, season: &str) -> Result<()> {
    let player_ids = table
        .numeric("PLAYER_ID")
        .ok_or_else(|| anyhow!("season payload has no PLAYER_ID column"))?;
    let labels: Vec<f64> = match mvp_player_id(season) {
        Some(mvp_id) => {
            let labels: Vec<f64> = player_ids
                .iter()
                .map(|&id| if id == f64::from(mvp_id) { 1.0 } else { 0.0 })
                .collect();
            if !labels.contains(&1.0) {
                return Err(anyhow!(
                    "MVP player id {mvp_id} not present in fetched rows for {season}"
                ));
            }
            labels
        }
        None => vec![0.0; player_ids.len()],
    };
    table.push_numeric("MVP", labels)
}

#[cfg(test)]
mod tests {
    use super::{parse_stats_payload, season_label};
    use crate::table::Column;

    #[test]
    fn season_labels_handle_century_rollover() {
        assert_eq!(season_label(1996), "1996-97");
        assert_eq!(season_label(1999), "1999-00");
        assert_eq!(season_label(2024), "2024-25");
    }

    #[test]
    fn payload_parses_into_typed_columns() {
        let payload = serde_json::json!({
            "resultSets": [{
                "headers": ["PLAYER_ID", "PLAYER_NAME", "GP", "PTS"],
                "rowSet": [
                    [2544, "LeBron James", 70, 25.7],
                    [203999, "Nikola Jokic", 79, 26.4]
                ]
            }]
        });
        let table = parse_stats_payload(&payload).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.numeric("PTS"), Some(&[25.7, 26.4][..]));
        assert_eq!(table.numeric("PLAYER_ID"), Some(&[2544.0, 203999.0][..]));
        match table.column("PLAYER_NAME").unwrap() {
            Column::Text(names) => assert_eq!(names[1], "Nikola Jokic"),
            Column::Numeric(_) => panic!("names must be text"),
        }
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let payload = serde_json::json!({"resultSets": []});
        assert!(parse_stats_payload(&payload).is_err());
    }
}
