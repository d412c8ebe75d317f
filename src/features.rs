use anyhow::{Result, anyhow};

use crate::table::StatTable;

/// Raw stat columns the engineered metrics are computed from. Any of these
/// missing is a data error, not something scoring can recover from.
pub const REQUIRED_COLUMNS: [&str; 9] =
    ["FGM", "MIN", "AST", "TOV", "PTS", "W", "REB", "STL", "BLK"];

const PTS_PER_WIN_EPS: f64 = 1e-5;

/// Append the four derived metrics to a season table. The input columns are
/// left untouched; returns a new table.
///
/// - FGM_PER_MIN: field goals per minute, MIN of zero falls back to a
///   divisor of 1 so a DNP row degrades to raw FGM instead of infinity.
/// - USAGE_PROXY: AST + TOV.
/// - PTS_PER_WIN: PTS / (W + 1e-5), epsilon keeps winless teams finite.
/// - DOMINANCE_SCORE: fixed linear weighting of the box-score line.
pub fn engineer_features(table: &StatTable) -> Result<StatTable> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| table.numeric(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(anyhow!(
            "missing required stat columns: {}",
            missing.join(", ")
        ));
    }

    let fgm = table.numeric("FGM").unwrap_or_default();
    let min = table.numeric("MIN").unwrap_or_default();
    let ast = table.numeric("AST").unwrap_or_default();
    let tov = table.numeric("TOV").unwrap_or_default();
    let pts = table.numeric("PTS").unwrap_or_default();
    let wins = table.numeric("W").unwrap_or_default();
    let reb = table.numeric("REB").unwrap_or_default();
    let stl = table.numeric("STL").unwrap_or_default();
    let blk = table.numeric("BLK").unwrap_or_default();

    let n = table.n_rows();
    let mut fgm_per_min = Vec::with_capacity(n);
    let mut usage_proxy = Vec::with_capacity(n);
    let mut pts_per_win = Vec::with_capacity(n);
    let mut dominance = Vec::with_capacity(n);
    for i in 0..n {
        let divisor = if min[i] == 0.0 { 1.0 } else { min[i] };
        fgm_per_min.push(fgm[i] / divisor);
        usage_proxy.push(ast[i] + tov[i]);
        pts_per_win.push(pts[i] / (wins[i] + PTS_PER_WIN_EPS));
        dominance.push(
            pts[i] + 1.2 * reb[i] + 1.5 * ast[i] + 3.0 * stl[i] + 3.0 * blk[i] - 2.0 * tov[i],
        );
    }

    let mut out = table.clone();
    out.push_numeric("FGM_PER_MIN", fgm_per_min)?;
    out.push_numeric("USAGE_PROXY", usage_proxy)?;
    out.push_numeric("PTS_PER_WIN", pts_per_win)?;
    out.push_numeric("DOMINANCE_SCORE", dominance)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::engineer_features;
    use crate::table::StatTable;

    fn season_row(min: f64) -> StatTable {
        let mut table = StatTable::new();
        table.push_numeric("FGM", vec![10.0]).unwrap();
        table.push_numeric("MIN", vec![min]).unwrap();
        table.push_numeric("AST", vec![8.0]).unwrap();
        table.push_numeric("TOV", vec![3.0]).unwrap();
        table.push_numeric("PTS", vec![27.0]).unwrap();
        table.push_numeric("W", vec![50.0]).unwrap();
        table.push_numeric("REB", vec![7.0]).unwrap();
        table.push_numeric("STL", vec![1.5]).unwrap();
        table.push_numeric("BLK", vec![0.5]).unwrap();
        table
    }

    #[test]
    fn fgm_per_min_falls_back_to_fgm_when_minutes_are_zero() {
        let engineered = engineer_features(&season_row(0.0)).unwrap();
        assert_eq!(engineered.numeric("FGM_PER_MIN"), Some(&[10.0][..]));

        let engineered = engineer_features(&season_row(32.0)).unwrap();
        assert_eq!(engineered.numeric("FGM_PER_MIN"), Some(&[10.0 / 32.0][..]));
    }

    #[test]
    fn dominance_score_matches_hand_computed_row() {
        let engineered = engineer_features(&season_row(32.0)).unwrap();
        // 27 + 1.2*7 + 1.5*8 + 3*1.5 + 3*0.5 - 2*3 = 47.4
        let got = engineered.numeric("DOMINANCE_SCORE").unwrap()[0];
        assert!((got - 47.4).abs() < 1e-9);
        assert_eq!(engineered.numeric("USAGE_PROXY"), Some(&[11.0][..]));
    }

    #[test]
    fn missing_column_is_fatal_and_named() {
        let full = season_row(30.0);
        let mut without = StatTable::new();
        for name in full.column_names() {
            if name == "STL" {
                continue;
            }
            without
                .push_numeric(name, full.numeric(name).unwrap().to_vec())
                .unwrap();
        }
        let err = engineer_features(&without).unwrap_err();
        assert!(err.to_string().contains("STL"));
    }

    #[test]
    fn input_table_is_unchanged() {
        let table = season_row(32.0);
        let before = table.n_columns();
        let _ = engineer_features(&table).unwrap();
        assert_eq!(table.n_columns(), before);
        assert!(!table.has_column("DOMINANCE_SCORE"));
    }
}
