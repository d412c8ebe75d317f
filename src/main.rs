use std::path::PathBuf;

use anyhow::{Result, anyhow};

use mvp_radar::artifacts::ArtifactStore;
use mvp_radar::predictor;
use mvp_radar::stats_fetch::{self, DEFAULT_END_YEAR, DEFAULT_START_YEAR};
use mvp_radar::trainer::{self, DEFAULT_TARGET_SEASON, TrainOptions};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mode = parse_value_arg("--mode")
        .ok_or_else(|| anyhow!("usage: mvp_radar --mode train|predict|update-data [options]"))?;
    let data_dir = parse_value_arg("--data")
        .or_else(|| env_path("MVP_DATA_DIR"))
        .unwrap_or_else(|| "data".to_string());
    let model_dir = parse_value_arg("--model-dir")
        .or_else(|| env_path("MVP_MODEL_DIR"))
        .unwrap_or_else(|| "model".to_string());
    let store = ArtifactStore::new(&model_dir);

    match mode.as_str() {
        "train" => {
            let mut opts = TrainOptions::new(&data_dir);
            if let Some(season) = parse_value_arg("--season") {
                opts.target_season = season;
            }
            let report = trainer::train(&opts, &store)?;
            println!(
                "Trained on {} rows ({} MVP) from {} season files, {} features, scale_pos_weight {:.1}",
                report.rows,
                report.positives,
                report.season_files,
                report.feature_count,
                report.scale_pos_weight
            );
        }
        "predict" => {
            let season =
                parse_value_arg("--season").unwrap_or_else(|| DEFAULT_TARGET_SEASON.to_string());
            let csv_path = parse_value_arg("--csv")
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    predictor::resolve_season_csv(&PathBuf::from(&data_dir), &season)
                });

            let artifacts = store.load()?;
            let predictions = predictor::run_prediction(&csv_path, &artifacts)?;
            predictor::print_top_candidates(&predictions, 10);
            if let Some(out) = parse_value_arg("--out") {
                predictor::write_predictions_csv(&predictions, &PathBuf::from(&out))?;
                println!("\nPredictions written to: {out}");
            }
        }
        "update-data" => {
            let start_year = parse_year_arg("--start-year").unwrap_or(DEFAULT_START_YEAR);
            let end_year = parse_year_arg("--end-year").unwrap_or(DEFAULT_END_YEAR);
            let summary =
                stats_fetch::update_season_data(&PathBuf::from(&data_dir), start_year, end_year)?;
            if !summary.errors.is_empty() {
                println!("Seasons with errors: {}", summary.errors.len());
                for err in summary.errors.iter().take(6) {
                    println!(" - {err}");
                }
            }
        }
        other => {
            return Err(anyhow!(
                "unknown mode {other}; expected train, predict or update-data"
            ));
        }
    }

    Ok(())
}

fn parse_value_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_year_arg(name: &str) -> Option<i32> {
    parse_value_arg(name).and_then(|raw| raw.parse::<i32>().ok())
}

fn env_path(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
