use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::artifacts::ArtifactStore;
use crate::columns::{ColumnPolicy, design_matrix};
use crate::features::engineer_features;
use crate::gbdt::{GbdtModel, GbdtParams};
use crate::metrics::{balanced_threshold, classification_report, precision_recall_curve};
use crate::table::StatTable;

pub const SEASON_FILE_PREFIX: &str = "nba_player_stats_";
pub const DEFAULT_TARGET_SEASON: &str = "2024-25";
const TEST_FRACTION: f64 = 0.25;
const SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub data_dir: PathBuf,
    /// The season being predicted; its file is excluded from training.
    pub target_season: String,
    pub params: GbdtParams,
}

impl TrainOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            target_season: DEFAULT_TARGET_SEASON.to_string(),
            params: GbdtParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    pub rows: usize,
    pub positives: usize,
    pub feature_count: usize,
    pub season_files: usize,
    pub threshold: f64,
    pub scale_pos_weight: f64,
    pub report: String,
}

/// Season CSVs eligible for training: `nba_player_stats_*.csv` under the data
/// dir, sorted by name, minus the target season's file.
pub fn season_files(data_dir: &Path, target_season: &str) -> Result<Vec<PathBuf>> {
    let exclude_tag = season_file_tag(target_season);
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("read data dir {}", data_dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context("read data dir entry")?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(SEASON_FILE_PREFIX)
            && name.ends_with(".csv")
            && !name.contains(&exclude_tag)
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn season_file_tag(season: &str) -> String {
    season.replace('-', "_")
}

/// Load and stack every eligible season into one training table.
pub fn assemble_training_table(data_dir: &Path, target_season: &str) -> Result<StatTable> {
    let files = season_files(data_dir, target_season)?;
    if files.is_empty() {
        return Err(anyhow!(
            "no season files under {} (expected {SEASON_FILE_PREFIX}*.csv)",
            data_dir.display()
        ));
    }
    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        tables.push(StatTable::from_csv_path(path)?);
    }
    StatTable::concat(&tables)
}

/// Stratified train/test partition with a fixed seed. Each class is shuffled
/// separately and contributes `round(n * fraction)` held-out rows, at least
/// one when the class is non-empty, so the rare positive class always
/// reaches the test side.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [0u8, 1u8] {
        let mut idx: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if idx.is_empty() {
            continue;
        }
        idx.shuffle(&mut rng);
        let n_test = ((idx.len() as f64 * test_fraction).round() as usize)
            .clamp(1, idx.len().saturating_sub(1).max(1));
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Full training run: assemble, engineer, fit, calibrate the balanced
/// threshold, persist the three artifacts, and print the diagnostic report.
pub fn train(opts: &TrainOptions, store: &ArtifactStore) -> Result<TrainReport> {
    let raw = assemble_training_table(&opts.data_dir, &opts.target_season)?;
    let n_files = season_files(&opts.data_dir, &opts.target_season)?.len();
    let table = engineer_features(&raw)?;
    if table.n_rows() == 0 {
        return Err(anyhow!("training table is empty"));
    }

    let mvp = table
        .numeric("MVP")
        .ok_or_else(|| anyhow!("training data has no MVP label column"))?;
    let labels: Vec<u8> = mvp.iter().map(|&v| u8::from(v > 0.5)).collect();
    let positives = labels.iter().filter(|&&y| y == 1).count();
    if positives == 0 {
        return Err(anyhow!(
            "training data contains no MVP-labeled rows; refusing to fit a degenerate model"
        ));
    }

    let policy = ColumnPolicy::standard();
    let feature_list = policy.feature_list(&table);
    if feature_list.is_empty() {
        return Err(anyhow!("column policy left no feature columns"));
    }
    let matrix = design_matrix(&table, &feature_list);

    let (train_idx, test_idx) = stratified_split(&labels, TEST_FRACTION, SPLIT_SEED);
    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| matrix[i].clone()).collect();
    let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
    let x_test: Vec<Vec<f64>> = test_idx.iter().map(|&i| matrix[i].clone()).collect();
    let y_test: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();

    let test_pos = y_test.iter().filter(|&&y| y == 1).count();
    if test_pos == 0 {
        return Err(anyhow!(
            "test partition has no positive labels; threshold calibration is impossible"
        ));
    }
    let train_pos = y_train.iter().filter(|&&y| y == 1).count();
    let train_neg = y_train.len() - train_pos;
    if train_pos == 0 {
        return Err(anyhow!("train partition has no positive labels"));
    }

    let mut params = opts.params;
    params.scale_pos_weight = train_neg as f64 / train_pos as f64;
    let model = GbdtModel::fit(&x_train, &y_train, &params)?;

    let probs = model.predict_proba_matrix(&x_test);
    let curve = precision_recall_curve(&y_test, &probs);
    let threshold = balanced_threshold(&curve)
        .ok_or_else(|| anyhow!("precision/recall curve is degenerate"))?;
    let preds: Vec<u8> = probs.iter().map(|&p| u8::from(p > threshold)).collect();
    let report = classification_report(&y_test, &preds);

    store.save(&model, &feature_list, threshold)?;

    println!("Balanced threshold: {threshold:.4}");
    println!("- Classification report at balanced precision/recall -");
    print!("{report}");
    println!("Artifacts saved to: {}", store.dir().display());

    Ok(TrainReport {
        rows: table.n_rows(),
        positives,
        feature_count: feature_list.len(),
        season_files: n_files,
        threshold,
        scale_pos_weight: params.scale_pos_weight,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::{season_file_tag, stratified_split};

    #[test]
    fn split_is_stratified_and_reproducible() {
        let labels: Vec<u8> = (0..40).map(|i| u8::from(i % 10 == 0)).collect();
        let (train_a, test_a) = stratified_split(&labels, 0.25, 42);
        let (train_b, test_b) = stratified_split(&labels, 0.25, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(train_a.len() + test_a.len(), labels.len());

        let test_pos = test_a.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(test_pos, 1); // round(4 * 0.25)
        let overlap = train_a.iter().any(|i| test_a.contains(i));
        assert!(!overlap);
    }

    #[test]
    fn single_positive_still_reaches_test_side() {
        let mut labels = vec![0u8; 20];
        labels[7] = 1;
        let (_, test) = stratified_split(&labels, 0.25, 42);
        assert!(test.contains(&7));
    }

    #[test]
    fn season_tag_swaps_dash_for_underscore() {
        assert_eq!(season_file_tag("2024-25"), "2024_25");
    }
}
