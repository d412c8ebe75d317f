use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use mvp_radar::features::engineer_features;
use mvp_radar::gbdt::{GbdtModel, GbdtParams};
use mvp_radar::table::StatTable;

fn league_sized_table(rows: usize) -> StatTable {
    let mut table = StatTable::new();
    let col = |f: fn(usize) -> f64| (0..rows).map(f).collect::<Vec<f64>>();
    table.push_numeric("FGM", col(|i| 4.0 + (i % 9) as f64)).unwrap();
    table.push_numeric("MIN", col(|i| 18.0 + (i % 20) as f64)).unwrap();
    table.push_numeric("AST", col(|i| (i % 11) as f64)).unwrap();
    table.push_numeric("TOV", col(|i| 1.0 + (i % 4) as f64)).unwrap();
    table.push_numeric("PTS", col(|i| 8.0 + (i % 25) as f64)).unwrap();
    table.push_numeric("W", col(|i| 20.0 + (i % 40) as f64)).unwrap();
    table.push_numeric("REB", col(|i| 2.0 + (i % 12) as f64)).unwrap();
    table.push_numeric("STL", col(|i| (i % 3) as f64)).unwrap();
    table.push_numeric("BLK", col(|i| (i % 2) as f64)).unwrap();
    table
}

fn bench_feature_engineering(c: &mut Criterion) {
    let table = league_sized_table(550);
    c.bench_function("engineer_features_550_rows", |b| {
        b.iter(|| {
            let out = engineer_features(black_box(&table)).unwrap();
            black_box(out.n_columns());
        })
    });
}

fn bench_model_scoring(c: &mut Criterion) {
    let x: Vec<Vec<f64>> = (0..550)
        .map(|i| (0..12).map(|f| ((i * 7 + f * 3) % 40) as f64).collect())
        .collect();
    let y: Vec<u8> = (0..550).map(|i| u8::from(i % 70 == 0)).collect();
    let params = GbdtParams {
        scale_pos_weight: 60.0,
        ..GbdtParams::default()
    };
    let model = GbdtModel::fit(&x, &y, &params).unwrap();

    c.bench_function("gbdt_score_550_rows", |b| {
        b.iter(|| {
            let probs = model.predict_proba_matrix(black_box(&x));
            black_box(probs.len());
        })
    });
}

criterion_group!(benches, bench_feature_engineering, bench_model_scoring);
criterion_main!(benches);
