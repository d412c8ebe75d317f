use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::artifacts::TrainedArtifacts;
use crate::columns::design_matrix;
use crate::features::engineer_features;
use crate::table::StatTable;
use crate::trainer::{SEASON_FILE_PREFIX, season_file_tag};

/// One scored row, keyed the way the season CSVs key players.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub player_name: String,
    pub player_id: String,
    pub team_abbreviation: String,
    pub season: String,
    pub probability: f64,
    pub predicted_mvp: u8,
}

pub fn resolve_season_csv(data_dir: &Path, season: &str) -> PathBuf {
    data_dir.join(format!(
        "{SEASON_FILE_PREFIX}{}.csv",
        season_file_tag(season)
    ))
}

/// Score every row of a raw season table against loaded artifacts: engineer,
/// reindex to the frozen feature list, predict, rank by probability
/// descending. Predicted-MVP is 1 iff probability strictly exceeds the
/// threshold.
pub fn score_table(table: &StatTable, artifacts: &TrainedArtifacts) -> Result<Vec<Prediction>> {
    let engineered = engineer_features(table).context("engineer features for scoring")?;
    let matrix = design_matrix(&engineered, &artifacts.feature_list);

    let mut predictions: Vec<Prediction> = matrix
        .iter()
        .enumerate()
        .map(|(row, features)| {
            let probability = artifacts.model.predict_proba(features);
            Prediction {
                player_name: engineered.display("PLAYER_NAME", row),
                player_id: engineered.display("PLAYER_ID", row),
                team_abbreviation: engineered.display("TEAM_ABBREVIATION", row),
                season: engineered.display("SEASON", row),
                probability,
                predicted_mvp: u8::from(probability > artifacts.threshold),
            }
        })
        .collect();
    predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    Ok(predictions)
}

/// Predict from a season CSV on disk.
pub fn run_prediction(csv_path: &Path, artifacts: &TrainedArtifacts) -> Result<Vec<Prediction>> {
    let table = StatTable::from_csv_path(csv_path)
        .with_context(|| format!("load season table {}", csv_path.display()))?;
    score_table(&table, artifacts)
}

pub fn print_top_candidates(predictions: &[Prediction], limit: usize) {
    println!("\nTop {limit} MVP candidates:");
    println!(
        "{:<26} {:>10} {:>5} {:>8} {:>8} {:>4}",
        "PLAYER", "ID", "TEAM", "SEASON", "PROB", "MVP"
    );
    for p in predictions.iter().take(limit) {
        println!(
            "{:<26} {:>10} {:>5} {:>8} {:>8.4} {:>4}",
            p.player_name, p.player_id, p.team_abbreviation, p.season, p.probability,
            p.predicted_mvp
        );
    }
}

/// Machine-readable output: the full ranked table as CSV.
pub fn write_predictions_csv(predictions: &[Prediction], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create predictions csv {}", path.display()))?;
    writer
        .write_record([
            "PLAYER_NAME",
            "PLAYER_ID",
            "TEAM_ABBREVIATION",
            "SEASON",
            "MVP_PROB",
            "PREDICTED_MVP",
        ])
        .context("write predictions header")?;
    for p in predictions {
        writer
            .write_record([
                p.player_name.as_str(),
                p.player_id.as_str(),
                p.team_abbreviation.as_str(),
                p.season.as_str(),
                &format!("{:.6}", p.probability),
                &p.predicted_mvp.to_string(),
            ])
            .context("write prediction row")?;
    }
    writer.flush().context("flush predictions csv")?;
    Ok(())
}
