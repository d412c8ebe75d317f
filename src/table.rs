use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

/// A single column of a stat table. A column is numeric when every non-empty
/// cell parses as `f64`; empty cells inside a numeric column read as 0.0.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rectangular per-player per-season table with ordered, named columns.
///
/// The column order is the CSV header order; engineered columns append at the
/// end. Lookup is linear, tables here carry a few dozen columns at most.
#[derive(Debug, Clone, Default)]
pub struct StatTable {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl StatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut table = StatTable::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    /// Load a season CSV. All cells are read as text first; each column is
    /// then classified numeric or text from its contents.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("open csv {}", path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("read csv header {}", path.display()))?
            .clone();
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for record in reader.records() {
            let record = record.with_context(|| format!("read csv row {}", path.display()))?;
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(record.get(idx).unwrap_or("").trim().to_string());
            }
        }

        let mut table = StatTable::new();
        for (name, raw) in names.into_iter().zip(cells) {
            table.push_column(name, classify(raw))?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index_of(name).map(|idx| &self.columns[idx])
    }

    /// Values of a numeric column; `None` when absent or text.
    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        match self.column(name)? {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    /// One cell rendered for output. Numeric cells print like integers when
    /// they are whole (PLAYER_ID et al).
    pub fn display(&self, name: &str, row: usize) -> String {
        match self.column(name) {
            Some(Column::Numeric(v)) => v
                .get(row)
                .map(|x| {
                    if x.fract() == 0.0 && x.abs() < 1e15 {
                        format!("{}", *x as i64)
                    } else {
                        format!("{x}")
                    }
                })
                .unwrap_or_default(),
            Some(Column::Text(v)) => v.get(row).cloned().unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn push_column(&mut self, name: String, column: Column) -> Result<()> {
        if self.has_column(&name) {
            return Err(anyhow!("duplicate column {name}"));
        }
        if self.names.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(anyhow!(
                "column {name} has {} rows, table has {}",
                column.len(),
                self.rows
            ));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    pub fn push_numeric(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.push_column(name.to_string(), Column::Numeric(values))
    }

    pub fn push_text(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        self.push_column(name.to_string(), Column::Text(values))
    }

    /// New table keeping only the given row indices, all columns unchanged.
    pub fn select_rows(&self, keep: &[usize]) -> StatTable {
        let columns = self
            .columns
            .iter()
            .map(|column| match column {
                Column::Numeric(v) => {
                    Column::Numeric(keep.iter().map(|&i| v[i]).collect())
                }
                Column::Text(v) => {
                    Column::Text(keep.iter().map(|&i| v[i].clone()).collect())
                }
            })
            .collect();
        StatTable {
            names: self.names.clone(),
            columns,
            rows: keep.len(),
        }
    }

    /// Stack tables row-wise, aligning columns by name. Column order is the
    /// order of first appearance. A column absent from one input fills 0.0
    /// (numeric) or "" (text); a column that is text anywhere is text
    /// everywhere.
    pub fn concat(tables: &[StatTable]) -> Result<StatTable> {
        let mut names: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut text_names: HashSet<String> = HashSet::new();
        for table in tables {
            for (name, column) in table.names.iter().zip(&table.columns) {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
                if matches!(column, Column::Text(_)) {
                    text_names.insert(name.clone());
                }
            }
        }

        let total_rows: usize = tables.iter().map(|t| t.rows).sum();
        let mut out = StatTable::new();
        for name in names {
            let column = if text_names.contains(&name) {
                let mut values = Vec::with_capacity(total_rows);
                for table in tables {
                    match table.column(&name) {
                        Some(Column::Text(v)) => values.extend(v.iter().cloned()),
                        Some(Column::Numeric(v)) => {
                            values.extend(v.iter().map(|x| format!("{x}")))
                        }
                        None => values.extend(std::iter::repeat_n(String::new(), table.rows)),
                    }
                }
                Column::Text(values)
            } else {
                let mut values = Vec::with_capacity(total_rows);
                for table in tables {
                    match table.numeric(&name) {
                        Some(v) => values.extend_from_slice(v),
                        None => values.extend(std::iter::repeat_n(0.0, table.rows)),
                    }
                }
                Column::Numeric(values)
            };
            out.push_column(name, column)?;
        }
        out.rows = total_rows;
        Ok(out)
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("create csv {}", path.display()))?;
        writer
            .write_record(&self.names)
            .context("write csv header")?;
        for row in 0..self.rows {
            let record: Vec<String> = self
                .names
                .iter()
                .map(|name| self.display(name, row))
                .collect();
            writer.write_record(&record).context("write csv row")?;
        }
        writer.flush().context("flush csv")?;
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

fn classify(raw: Vec<String>) -> Column {
    let mut any_value = false;
    let mut all_numeric = true;
    for cell in &raw {
        if cell.is_empty() {
            continue;
        }
        any_value = true;
        if cell.parse::<f64>().is_err() {
            all_numeric = false;
            break;
        }
    }
    if any_value && all_numeric {
        Column::Numeric(
            raw.iter()
                .map(|cell| cell.parse::<f64>().unwrap_or(0.0))
                .collect(),
        )
    } else {
        Column::Text(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, StatTable};

    fn two_col() -> StatTable {
        StatTable::from_columns(vec![
            ("PTS".to_string(), Column::Numeric(vec![30.0, 12.5])),
            (
                "PLAYER_NAME".to_string(),
                Column::Text(vec!["A".to_string(), "B".to_string()]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn numeric_lookup_distinguishes_text() {
        let table = two_col();
        assert_eq!(table.numeric("PTS"), Some(&[30.0, 12.5][..]));
        assert!(table.numeric("PLAYER_NAME").is_none());
        assert!(table.numeric("REB").is_none());
    }

    #[test]
    fn concat_fills_missing_numeric_with_zero() {
        let a = two_col();
        let b = StatTable::from_columns(vec![
            ("PTS".to_string(), Column::Numeric(vec![7.0])),
            ("REB".to_string(), Column::Numeric(vec![11.0])),
        ])
        .unwrap();
        let merged = StatTable::concat(&[a, b]).unwrap();
        assert_eq!(merged.n_rows(), 3);
        assert_eq!(merged.numeric("PTS"), Some(&[30.0, 12.5, 7.0][..]));
        assert_eq!(merged.numeric("REB"), Some(&[0.0, 0.0, 11.0][..]));
        match merged.column("PLAYER_NAME").unwrap() {
            Column::Text(v) => assert_eq!(v[2], ""),
            Column::Numeric(_) => panic!("identity column must stay text"),
        }
    }

    #[test]
    fn display_renders_whole_numbers_without_fraction() {
        let table = StatTable::from_columns(vec![(
            "PLAYER_ID".to_string(),
            Column::Numeric(vec![2544.0, 0.5]),
        )])
        .unwrap();
        assert_eq!(table.display("PLAYER_ID", 0), "2544");
        assert_eq!(table.display("PLAYER_ID", 1), "0.5");
    }

    #[test]
    fn select_rows_keeps_order() {
        let table = two_col();
        let picked = table.select_rows(&[1]);
        assert_eq!(picked.n_rows(), 1);
        assert_eq!(picked.numeric("PTS"), Some(&[12.5][..]));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut table = two_col();
        assert!(table.push_numeric("PTS", vec![0.0, 0.0]).is_err());
    }
}
