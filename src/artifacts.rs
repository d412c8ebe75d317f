use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::gbdt::GbdtModel;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

const MODEL_FILE: &str = "mvp_model.json";
const FEATURES_FILE: &str = "features.json";
const THRESHOLD_FILE: &str = "threshold.json";
const MODEL_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelFile {
    version: u32,
    generated_at: String,
    model: GbdtModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThresholdFile {
    threshold: f64,
}

/// The three training outputs, loaded once and passed by reference into
/// scoring. Never re-read ad hoc from fixed paths.
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub model: GbdtModel,
    pub feature_list: Vec<String>,
    pub threshold: f64,
}

/// Filesystem home of the three artifacts. Write-once at training time,
/// read-many at prediction time; writes go through tmp+rename.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn features_path(&self) -> PathBuf {
        self.dir.join(FEATURES_FILE)
    }

    pub fn threshold_path(&self) -> PathBuf {
        self.dir.join(THRESHOLD_FILE)
    }

    pub fn save(&self, model: &GbdtModel, feature_list: &[String], threshold: f64) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create model dir {}", self.dir.display()))?;

        let model_file = ModelFile {
            version: MODEL_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            model: model.clone(),
        };
        write_atomic(
            &self.model_path(),
            &serde_json::to_string(&model_file).context("serialize model")?,
        )?;
        write_atomic(
            &self.features_path(),
            &serde_json::to_string(feature_list).context("serialize feature list")?,
        )?;
        write_atomic(
            &self.threshold_path(),
            &serde_json::to_string(&ThresholdFile { threshold }).context("serialize threshold")?,
        )?;
        Ok(())
    }

    /// Reload all three artifacts. Model and feature list are required; a
    /// missing or malformed threshold file falls back to 0.5.
    pub fn load(&self) -> Result<TrainedArtifacts> {
        let model_path = self.model_path();
        let raw = fs::read_to_string(&model_path)
            .with_context(|| format!("model artifact not found at {}", model_path.display()))?;
        let model_file: ModelFile =
            serde_json::from_str(&raw).context("parse model artifact")?;
        if model_file.version != MODEL_VERSION {
            return Err(anyhow!(
                "model artifact version {} is not supported",
                model_file.version
            ));
        }
        let model = model_file.model;
        model.validate().context("validate model artifact")?;

        let features_path = self.features_path();
        let raw = fs::read_to_string(&features_path).with_context(|| {
            format!(
                "feature list artifact not found at {}",
                features_path.display()
            )
        })?;
        let feature_list: Vec<String> =
            serde_json::from_str(&raw).context("parse feature list artifact")?;
        if feature_list.len() != model.feature_count {
            return Err(anyhow!(
                "feature list carries {} columns, model expects {}",
                feature_list.len(),
                model.feature_count
            ));
        }

        Ok(TrainedArtifacts {
            model,
            feature_list,
            threshold: self.load_threshold(),
        })
    }

    pub fn load_threshold(&self) -> f64 {
        let Ok(raw) = fs::read_to_string(self.threshold_path()) else {
            return DEFAULT_THRESHOLD;
        };
        serde_json::from_str::<ThresholdFile>(&raw)
            .map(|f| f.threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}
