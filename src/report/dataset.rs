use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::security::helpers::sanitize_sheet_name;

/// A tabular result: ordered column names and rows of scalar values.
///
/// This is the shape handed to the spreadsheet exporter and returned by the
/// JSON API as `{columns: [...], rows: [[...]]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(columns: &[&str]) -> Self {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with empty strings, long ones truncated
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::String(String::new()));
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of a row by column name
    pub fn value<'a>(&self, row: &'a [Value], column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| row.get(i))
    }

    /// Add a derived column at the end; source cells are left untouched
    pub fn append_column(&mut self, name: &str, values: Vec<Value>) {
        self.columns.push(name.to_string());
        let mut values = values.into_iter();
        for row in self.rows.iter_mut() {
            row.push(values.next().unwrap_or(Value::String(String::new())));
        }
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Remove the named columns. Names that are not present are ignored.
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();

        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(c, k)| if *k { Some(c) } else { None })
            .collect();

        for row in self.rows.iter_mut() {
            *row = std::mem::take(row)
                .into_iter()
                .zip(keep.iter())
                .filter_map(|(v, k)| if *k { Some(v) } else { None })
                .collect();
        }
    }

    /// Drop rows equal to an earlier row; first occurrence order is kept
    pub fn dedup(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        self.rows.retain(|row| {
            let key = serde_json::to_string(row).unwrap_or_default();
            seen.insert(key)
        });
    }

    pub fn move_column_to_front(&mut self, name: &str) {
        let Some(index) = self.column_index(name) else {
            return;
        };
        if index == 0 {
            return;
        }
        let column = self.columns.remove(index);
        self.columns.insert(0, column);
        for row in self.rows.iter_mut() {
            if index < row.len() {
                let value = row.remove(index);
                row.insert(0, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(flatten)]
    pub data: Dataset,
}

/// Named datasets for the external workbook exporter, one sheet each
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub profile: String,
    pub generated_at: DateTime<Utc>,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(profile: &str) -> Self {
        Workbook {
            profile: profile.to_string(),
            generated_at: Utc::now(),
            sheets: Vec::new(),
        }
    }

    /// Add a sheet under an exporter-safe name
    pub fn add_sheet(&mut self, name: &str, data: Dataset) {
        self.sheets.push(Sheet {
            name: sanitize_sheet_name(name),
            data,
        });
    }

    pub fn sheet(&self, name: &str) -> Option<&Dataset> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.data)
    }

    /// Suggested download name, e.g. `prod_sg_detail_inventory_26_10_17.xlsx`
    pub fn file_name(&self, report: &str) -> String {
        format!(
            "{}_{}_{}.xlsx",
            self.profile,
            report,
            self.generated_at.format("%y_%m_%d")
        )
    }
}
