use crate::table::StatTable;

/// Identity and label columns, never part of the design matrix.
pub const IDENTITY_COLUMNS: [&str; 6] = [
    "PLAYER_ID",
    "PLAYER_NAME",
    "TEAM_ID",
    "TEAM_ABBREVIATION",
    "SEASON",
    "MVP",
];

/// Statistics excluded by prior empirical analysis. Exact, case-sensitive.
pub const LOW_IMPACT_COLUMNS: [&str; 14] = [
    "FTA",
    "REB",
    "FG3A",
    "FG3M",
    "BLKA",
    "FGA",
    "PF",
    "W_PCT",
    "DREB_RANK",
    "FTA_RANK",
    "STL",
    "FTM",
    "PTS",
    "BLKA_RANK",
];

const FANTASY_MARKER: &str = "FANTASY";

/// Ordered exclude rules deciding which engineered columns become model
/// features. Evaluated once against the engineered table at training time;
/// the resulting feature list is persisted and replayed verbatim at
/// prediction time, so the rules themselves never run on serving data.
#[derive(Debug, Clone)]
pub struct ColumnPolicy {
    drop_exact: Vec<String>,
    drop_substrings: Vec<String>,
}

impl ColumnPolicy {
    /// The fixed policy: identity/label drops, the low-impact list, and any
    /// column whose name contains "FANTASY" case-insensitively.
    pub fn standard() -> Self {
        Self {
            drop_exact: IDENTITY_COLUMNS
                .iter()
                .chain(LOW_IMPACT_COLUMNS.iter())
                .map(|s| s.to_string())
                .collect(),
            drop_substrings: vec![FANTASY_MARKER.to_string()],
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        if self.drop_exact.iter().any(|d| d == name) {
            return true;
        }
        let upper = name.to_uppercase();
        self.drop_substrings.iter().any(|m| upper.contains(m))
    }

    /// Numeric, non-excluded columns of an engineered table, in table order.
    /// This is the feature list frozen at training time.
    pub fn feature_list(&self, table: &StatTable) -> Vec<String> {
        table
            .column_names()
            .iter()
            .filter(|name| !self.is_excluded(name))
            .filter(|name| table.numeric(name).is_some())
            .cloned()
            .collect()
    }
}

/// Reindex an engineered table to a frozen feature list, row-major. A column
/// absent (or non-numeric) in the table fills 0.0, extra columns are dropped;
/// this is the train/serve schema-parity mechanism.
pub fn design_matrix(table: &StatTable, feature_list: &[String]) -> Vec<Vec<f64>> {
    let columns: Vec<Option<&[f64]>> = feature_list
        .iter()
        .map(|name| table.numeric(name))
        .collect();
    (0..table.n_rows())
        .map(|row| {
            columns
                .iter()
                .map(|col| col.map(|v| v[row]).unwrap_or(0.0))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ColumnPolicy, LOW_IMPACT_COLUMNS, design_matrix};
    use crate::table::StatTable;

    fn sample() -> StatTable {
        let mut table = StatTable::new();
        table.push_numeric("PLAYER_ID", vec![1.0, 2.0]).unwrap();
        table
            .push_text("PLAYER_NAME", vec!["A".to_string(), "B".to_string()])
            .unwrap();
        table.push_numeric("PTS", vec![30.0, 10.0]).unwrap();
        table.push_numeric("AST", vec![9.0, 2.0]).unwrap();
        table
            .push_numeric("NBA_FANTASY_PTS", vec![55.0, 20.0])
            .unwrap();
        table
            .push_numeric("FantasY_Pts_Rank", vec![1.0, 2.0])
            .unwrap();
        table.push_numeric("MVP", vec![1.0, 0.0]).unwrap();
        table
    }

    #[test]
    fn feature_list_excludes_identity_low_impact_and_fantasy() {
        let policy = ColumnPolicy::standard();
        let features = policy.feature_list(&sample());
        assert_eq!(features, vec!["AST".to_string()]);
        for name in LOW_IMPACT_COLUMNS {
            assert!(!features.iter().any(|f| f == name));
        }
    }

    #[test]
    fn fantasy_match_is_case_insensitive() {
        let policy = ColumnPolicy::standard();
        assert!(policy.is_excluded("NBA_FANTASY_PTS"));
        assert!(policy.is_excluded("nba_fantasy_pts_rank"));
        assert!(!policy.is_excluded("AST"));
    }

    #[test]
    fn reindex_is_idempotent_on_aligned_table() {
        let policy = ColumnPolicy::standard();
        let table = sample();
        let features = policy.feature_list(&table);
        let once = design_matrix(&table, &features);
        // Rebuild a table holding exactly the aligned columns and reindex it
        // again: the matrix must not change.
        let mut aligned = StatTable::new();
        for (idx, name) in features.iter().enumerate() {
            aligned
                .push_numeric(name, once.iter().map(|row| row[idx]).collect())
                .unwrap();
        }
        assert_eq!(design_matrix(&aligned, &features), once);
    }

    #[test]
    fn reindex_fills_missing_with_zero_and_keeps_others() {
        let table = sample();
        let features = vec!["AST".to_string(), "DOMINANCE_SCORE".to_string()];
        let matrix = design_matrix(&table, &features);
        assert_eq!(matrix, vec![vec![9.0, 0.0], vec![2.0, 0.0]]);
    }
}
