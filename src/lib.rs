//! NBA MVP prediction pipeline: season stats in, ranked MVP probabilities
//! out. Batch-only; each run loads its own input, fits or scores in memory,
//! and writes artifacts at the end.

pub mod artifacts;
pub mod columns;
pub mod features;
pub mod gbdt;
pub mod http_client;
pub mod metrics;
pub mod mvp_labels;
pub mod predictor;
pub mod stats_fetch;
pub mod table;
pub mod trainer;
